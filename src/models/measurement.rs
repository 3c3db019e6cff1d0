use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

/// One reading of one pollutant at one station on one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Measurement {
    #[validate(length(equal = 3))]
    pub station: String,

    #[validate(length(equal = 2))]
    pub pollutant: String,

    pub year: String,

    #[validate(length(equal = 2))]
    pub month: String,

    pub day: String,

    pub value: Option<f64>,

    pub date: NaiveDate,
}

impl Measurement {
    /// Build a measurement whose year/month/day strings are derived from `date`.
    pub fn new(
        station: impl Into<String>,
        pollutant: impl Into<String>,
        date: NaiveDate,
        value: Option<f64>,
    ) -> Self {
        Self {
            station: station.into(),
            pollutant: pollutant.into(),
            year: date.year().to_string(),
            month: format!("{:02}", date.month()),
            day: format!("{:02}", date.day()),
            value,
            date,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.value.is_none()
    }

    fn sort_key(&self) -> (NaiveDate, &str, &str) {
        (self.date, self.pollutant.as_str(), self.station.as_str())
    }
}

/// The canonical long-form table, ordered by (date, pollutant, station).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeasurementTable {
    records: Vec<Measurement>,
}

impl MeasurementTable {
    /// Builds the table, stable-sorting the records into canonical order.
    pub fn new(mut records: Vec<Measurement>) -> Self {
        records.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Self { records }
    }

    pub fn records(&self) -> &[Measurement] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Measurement> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_sorted(&self) -> bool {
        self.records
            .windows(2)
            .all(|pair| pair[0].sort_key() <= pair[1].sort_key())
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        // Sorted by date first, so the ends of the table are the extremes
        match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }

    pub fn stations(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.station.as_str()).collect()
    }

    pub fn pollutants(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.pollutant.as_str()).collect()
    }

    pub fn missing_values(&self) -> usize {
        self.records.iter().filter(|r| r.is_missing()).count()
    }
}

impl<'a> IntoIterator for &'a MeasurementTable {
    type Item = &'a Measurement;
    type IntoIter = std::slice::Iter<'a, Measurement>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// A measurement paired with the display name of one of its codes.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledMeasurement<'a> {
    pub measurement: &'a Measurement,
    pub display_name: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_measurement_from_date() {
        let m = Measurement::new("050", "12", date(2018, 3, 5), Some(41.0));

        assert_eq!(m.year, "2018");
        assert_eq!(m.month, "03");
        assert_eq!(m.day, "05");
        assert!(!m.is_missing());
        assert!(m.validate().is_ok());
    }

    #[test]
    fn test_unpadded_codes_fail_validation() {
        let m = Measurement::new("50", "12", date(2018, 3, 5), None);
        assert!(m.validate().is_err());
        assert!(m.is_missing());
    }

    #[test]
    fn test_table_is_sorted_on_construction() {
        let table = MeasurementTable::new(vec![
            Measurement::new("050", "12", date(2018, 3, 2), Some(1.0)),
            Measurement::new("050", "08", date(2018, 3, 2), Some(2.0)),
            Measurement::new("017", "12", date(2018, 3, 2), Some(3.0)),
            Measurement::new("017", "08", date(2018, 3, 1), Some(4.0)),
        ]);

        assert!(table.is_sorted());
        let order: Vec<(&str, &str)> = table
            .iter()
            .map(|m| (m.pollutant.as_str(), m.station.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("08", "017"), ("08", "050"), ("12", "017"), ("12", "050")]
        );
        assert_eq!(
            table.date_range(),
            Some((date(2018, 3, 1), date(2018, 3, 2)))
        );
        assert_eq!(table.stations().len(), 2);
        assert_eq!(table.pollutants().len(), 2);
    }

    #[test]
    fn test_empty_table() {
        let table = MeasurementTable::default();
        assert!(table.is_empty());
        assert!(table.is_sorted());
        assert_eq!(table.date_range(), None);
        assert_eq!(table.missing_values(), 0);
    }
}
