use crate::error::Result;
use crate::models::{CodeKind, LabelledMeasurement, Measurement, MeasurementTable};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// One line of a chart: a display name and its points in x order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedSeries<X> {
    pub name: String,
    pub points: Vec<(X, Option<f64>)>,
}

impl<X: Copy> NamedSeries<X> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }

    /// Maximal runs of present values; a missing value breaks the line.
    pub fn segments(&self) -> Vec<Vec<(X, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();

        for (x, value) in &self.points {
            match value {
                Some(v) if v.is_finite() => current.push((*x, *v)),
                _ => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }

        segments
    }

    pub fn present_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points
            .iter()
            .filter_map(|(_, v)| *v)
            .filter(|v| v.is_finite())
    }
}

/// Pair every row of the table with the display name of its `kind` code.
///
/// Returns a new collection; the table itself is left untouched. Fails on
/// the first code missing from the reference table.
pub fn label_table(
    table: &MeasurementTable,
    kind: CodeKind,
) -> Result<Vec<LabelledMeasurement<'_>>> {
    table
        .iter()
        .map(|measurement| {
            Ok(LabelledMeasurement {
                measurement,
                display_name: kind.display_name(kind.code_of(measurement))?,
            })
        })
        .collect()
}

/// Group labelled rows by display name (ascending) into date series, keeping
/// table order inside each group.
pub fn date_series_by_name<'a, F>(
    labelled: &[LabelledMeasurement<'a>],
    keep: F,
) -> Vec<NamedSeries<NaiveDate>>
where
    F: Fn(&Measurement) -> bool,
{
    let mut groups: BTreeMap<&str, NamedSeries<NaiveDate>> = BTreeMap::new();

    for row in labelled.iter().filter(|row| keep(row.measurement)) {
        groups
            .entry(row.display_name)
            .or_insert_with(|| NamedSeries::new(row.display_name))
            .points
            .push((row.measurement.date, row.measurement.value));
    }

    groups.into_values().collect()
}

/// Arithmetic mean of the present values; NaN when none are present.
pub fn mean_of_present<I>(values: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0f64, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use pretty_assertions::assert_eq;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 3, d).unwrap()
    }

    #[test]
    fn test_label_table_returns_copy() {
        let table = MeasurementTable::new(vec![
            Measurement::new("050", "12", date(1), Some(1.0)),
            Measurement::new("017", "08", date(1), Some(2.0)),
        ]);
        let before = table.clone();

        let labelled = label_table(&table, CodeKind::Pollutant).unwrap();
        assert_eq!(labelled.len(), 2);
        assert_eq!(labelled[0].display_name, "Dióxido de Nitrógeno");
        assert_eq!(labelled[1].display_name, "Óxidos de Nitrógeno");

        let by_station = label_table(&table, CodeKind::Station).unwrap();
        assert_eq!(by_station[0].display_name, "Villaverde Alto");

        assert_eq!(table, before);
    }

    #[test]
    fn test_label_table_fails_on_unknown_code() {
        let table = MeasurementTable::new(vec![
            Measurement::new("050", "12", date(1), Some(1.0)),
            Measurement::new("050", "99", date(2), Some(2.0)),
        ]);

        let err = label_table(&table, CodeKind::Pollutant).unwrap_err();
        assert!(matches!(err, ProcessingError::UnknownPollutant { .. }));
    }

    #[test]
    fn test_date_series_by_name() {
        let table = MeasurementTable::new(vec![
            Measurement::new("050", "12", date(1), Some(1.0)),
            Measurement::new("050", "08", date(1), Some(2.0)),
            Measurement::new("050", "12", date(2), None),
            Measurement::new("017", "12", date(2), Some(9.0)),
        ]);
        let labelled = label_table(&table, CodeKind::Pollutant).unwrap();

        let series = date_series_by_name(&labelled, |m| m.station == "050");

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "Dióxido de Nitrógeno");
        assert_eq!(series[0].points, vec![(date(1), Some(2.0))]);
        assert_eq!(series[1].name, "Óxidos de Nitrógeno");
        assert_eq!(series[1].points, vec![(date(1), Some(1.0)), (date(2), None)]);
    }

    #[test]
    fn test_segments_break_on_missing() {
        let mut series = NamedSeries::new("x");
        series.points = vec![
            (1, Some(1.0)),
            (2, Some(2.0)),
            (3, None),
            (4, Some(4.0)),
            (5, Some(f64::NAN)),
        ];

        assert_eq!(
            series.segments(),
            vec![vec![(1, 1.0), (2, 2.0)], vec![(4, 4.0)]]
        );
        assert_eq!(series.present_values().count(), 3);
    }

    #[test]
    fn test_mean_of_present() {
        assert_eq!(mean_of_present(vec![Some(1.0), None, Some(2.0)]), 1.5);
        assert!(mean_of_present(vec![None, None]).is_nan());
        assert!(mean_of_present(Vec::<Option<f64>>::new()).is_nan());
    }
}
