use crate::models::reference::{is_known_pollutant, is_known_station};
use crate::models::{Measurement, MeasurementTable, MeltedRow, WideTable};
use crate::utils::constants::{
    COMPOSITE_DATE_FORMAT, MONTH_WIDTH, POLLUTANT_CODE_WIDTH, STATION_CODE_WIDTH,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};
use validator::Validate;

/// Counts collected while turning the wide export into the canonical table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReshapeReport {
    pub raw_rows: usize,
    pub day_columns: usize,
    pub melted_rows: usize,
    pub dropped_invalid_dates: usize,
    pub missing_values: usize,
    pub output_rows: usize,
    /// Rows whose codes exceed their fixed width after padding
    pub malformed_codes: usize,
    pub unknown_pollutants: BTreeSet<String>,
    pub unknown_stations: BTreeSet<String>,
}

impl ReshapeReport {
    fn record(&mut self, measurement: &Measurement) {
        if measurement.is_missing() {
            self.missing_values += 1;
        }
        if measurement.validate().is_err() {
            self.malformed_codes += 1;
        }
        if !is_known_pollutant(&measurement.pollutant) {
            self.unknown_pollutants.insert(measurement.pollutant.clone());
        }
        if !is_known_station(&measurement.station) {
            self.unknown_stations.insert(measurement.station.clone());
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "=== Reshape Report ===\n\
            Raw Rows: {}\n\
            Day Columns: {}\n\
            Melted Rows: {}\n\
            Dropped (invalid date): {}\n\
            Missing Values: {}\n\
            Output Rows: {}\n\
            Malformed Codes: {}\n\
            Unknown Pollutants: {}\n\
            Unknown Stations: {}",
            self.raw_rows,
            self.day_columns,
            self.melted_rows,
            self.dropped_invalid_dates,
            self.missing_values,
            self.output_rows,
            self.malformed_codes,
            list_codes(&self.unknown_pollutants),
            list_codes(&self.unknown_stations)
        )
    }
}

fn list_codes(codes: &BTreeSet<String>) -> String {
    if codes.is_empty() {
        "none".to_string()
    } else {
        codes.iter().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Melts the wide export into one measurement per station/pollutant/day.
pub struct Reshaper;

impl Reshaper {
    pub fn new() -> Self {
        Self
    }

    /// Produce the canonical table. Rows whose day/month/year is not a real
    /// calendar date are dropped and only counted.
    pub fn reshape(&self, wide: &WideTable) -> (MeasurementTable, ReshapeReport) {
        let melted = self.melt(wide);

        let mut report = ReshapeReport {
            raw_rows: wide.len(),
            day_columns: wide.day_columns.len(),
            melted_rows: melted.len(),
            ..Default::default()
        };

        let mut measurements = Vec::with_capacity(melted.len());
        for row in melted {
            match self.normalize(row) {
                Some(measurement) => {
                    report.record(&measurement);
                    measurements.push(measurement);
                }
                None => report.dropped_invalid_dates += 1,
            }
        }

        let table = MeasurementTable::new(measurements);
        report.output_rows = table.len();

        if !report.unknown_pollutants.is_empty() || !report.unknown_stations.is_empty() {
            warn!(
                pollutants = ?report.unknown_pollutants,
                stations = ?report.unknown_stations,
                "Table contains codes missing from the reference tables"
            );
        }

        info!(
            melted = report.melted_rows,
            dropped = report.dropped_invalid_dates,
            output = report.output_rows,
            "Reshaped emissions table to long form"
        );

        (table, report)
    }

    /// Unpivot every wide record on its day columns: rows × day columns.
    pub fn melt(&self, wide: &WideTable) -> Vec<MeltedRow> {
        let mut melted = Vec::with_capacity(wide.len() * wide.day_columns.len());

        for record in &wide.records {
            for (label, value) in wide.day_columns.iter().zip(record.values.iter()) {
                melted.push(MeltedRow {
                    station: record.station.clone(),
                    pollutant: record.pollutant.clone(),
                    year: record.year.clone(),
                    month: record.month.clone(),
                    day_column: label.clone(),
                    value: *value,
                });
            }
        }

        melted
    }

    fn normalize(&self, row: MeltedRow) -> Option<Measurement> {
        let day = day_number(&row.day_column);
        let station = zero_pad(&coerce_code(&row.station), STATION_CODE_WIDTH);
        let pollutant = zero_pad(&coerce_code(&row.pollutant), POLLUTANT_CODE_WIDTH);
        let month = zero_pad(&coerce_code(&row.month), MONTH_WIDTH);
        let year = coerce_code(&row.year);

        let Some(date) = parse_composite_date(&day, &month, &year) else {
            debug!(
                station = %station,
                pollutant = %pollutant,
                "Dropping row with invalid date {}/{}/{}",
                day,
                month,
                year
            );
            return None;
        };

        Some(Measurement {
            station,
            pollutant,
            year,
            month,
            day,
            value: row.value,
            date,
        })
    }
}

impl Default for Reshaper {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip the leading non-numeric marker of a day column ("D05" -> "05").
pub fn day_number(label: &str) -> String {
    label
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .to_string()
}

/// Render an identifier cell as text. Integer cells take their canonical
/// integer form ("008" -> "8"), other text is only trimmed.
pub fn coerce_code(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(number) => number.to_string(),
        Err(_) => trimmed.to_string(),
    }
}

/// Left-pad with '0' up to `width` characters. Never truncates.
pub fn zero_pad(value: &str, width: usize) -> String {
    format!("{:0>width$}", value, width = width)
}

/// Parse the composite `day/month/year` date, `None` when it is not a real date.
pub fn parse_composite_date(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    let composite = format!("{}/{}/{}", day, month, year);
    NaiveDate::parse_from_str(&composite, COMPOSITE_DATE_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WideRecord;
    use pretty_assertions::assert_eq;

    fn day_columns(n: usize) -> Vec<String> {
        (1..=n).map(|d| format!("D{:02}", d)).collect()
    }

    fn april_table() -> WideTable {
        // April has 30 days, so D31 never forms a valid date
        WideTable::new(
            day_columns(31),
            vec![
                WideRecord::new("50", "12", "2018", "4", vec![Some(1.0); 31]),
                WideRecord::new("8", "8", "2018", "4", vec![Some(2.0); 31]),
            ],
        )
    }

    #[test]
    fn test_zero_pad() {
        assert_eq!(zero_pad("8", 3), "008");
        assert_eq!(zero_pad("50", 3), "050");
        assert_eq!(zero_pad("1", 2), "01");
        assert_eq!(zero_pad("1234", 3), "1234");
    }

    #[test]
    fn test_zero_pad_is_idempotent() {
        for (code, width) in [("050", 3), ("12", 2), ("03", 2), ("7", 3)] {
            let once = zero_pad(code, width);
            assert_eq!(zero_pad(&once, width), once);
        }
        assert_eq!(zero_pad("050", 3), "050");
        assert_eq!(zero_pad("12", 2), "12");
    }

    #[test]
    fn test_coerce_code() {
        assert_eq!(coerce_code("008"), "8");
        assert_eq!(coerce_code(" 12 "), "12");
        assert_eq!(coerce_code("AB"), "AB");
    }

    #[test]
    fn test_day_number() {
        assert_eq!(day_number("D05"), "05");
        assert_eq!(day_number("D31"), "31");
        assert_eq!(day_number("DIA7"), "7");
    }

    #[test]
    fn test_parse_composite_date() {
        assert_eq!(
            parse_composite_date("29", "02", "2016"),
            NaiveDate::from_ymd_opt(2016, 2, 29)
        );
        assert_eq!(parse_composite_date("29", "02", "2018"), None);
        assert_eq!(parse_composite_date("31", "04", "2018"), None);
    }

    #[test]
    fn test_melt_row_count() {
        let reshaper = Reshaper::new();
        let wide = april_table();

        let melted = reshaper.melt(&wide);
        assert_eq!(melted.len(), wide.len() * wide.day_columns.len());
        assert_eq!(melted[0].day_column, "D01");
        assert_eq!(melted[30].day_column, "D31");
        assert_eq!(melted[31].station, "8");
    }

    #[test]
    fn test_reshape_drops_invalid_dates() {
        let reshaper = Reshaper::new();
        let (table, report) = reshaper.reshape(&april_table());

        assert_eq!(report.melted_rows, 62);
        assert_eq!(report.dropped_invalid_dates, 2);
        assert_eq!(report.output_rows, 60);
        assert_eq!(table.len(), 60);
        assert!(table.iter().all(|m| m.day != "31"));
    }

    #[test]
    fn test_reshape_normalizes_and_sorts() {
        let reshaper = Reshaper::new();
        let (table, _) = reshaper.reshape(&april_table());

        assert!(table.is_sorted());
        let first = &table.records()[0];
        assert_eq!(first.station, "008");
        assert_eq!(first.pollutant, "08");
        assert_eq!(first.month, "04");
        assert_eq!(first.day, "01");
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2018, 4, 1).unwrap());

        let second = &table.records()[1];
        assert_eq!(second.station, "050");
        assert_eq!(second.pollutant, "12");
    }

    #[test]
    fn test_reshape_counts_missing_values() {
        let wide = WideTable::new(
            day_columns(3),
            vec![WideRecord::new("4", "1", "2019", "1", vec![None, Some(3.0), None])],
        );
        let (table, report) = Reshaper::new().reshape(&wide);

        assert_eq!(report.missing_values, 2);
        assert_eq!(table.missing_values(), 2);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_reshape_reports_unknown_and_malformed_codes() {
        let wide = WideTable::new(
            day_columns(2),
            vec![
                WideRecord::new("50", "12", "2018", "3", vec![Some(1.0), Some(2.0)]),
                WideRecord::new("50", "99", "2018", "3", vec![Some(1.0), None]),
                WideRecord::new("1234", "12", "2018", "3", vec![Some(4.0), Some(5.0)]),
            ],
        );
        let (table, report) = Reshaper::new().reshape(&wide);

        assert_eq!(table.len(), 6);
        assert_eq!(report.malformed_codes, 2);
        assert_eq!(
            report.unknown_pollutants.iter().collect::<Vec<_>>(),
            vec!["99"]
        );
        assert_eq!(
            report.unknown_stations.iter().collect::<Vec<_>>(),
            vec!["1234"]
        );

        let summary = report.summary();
        assert!(summary.contains("Unknown Pollutants: 99"));
        assert!(summary.contains("Unknown Stations: 1234"));
    }

    #[test]
    fn test_clean_table_reports_no_unknown_codes() {
        let (_, report) = Reshaper::new().reshape(&april_table());

        assert_eq!(report.malformed_codes, 0);
        assert!(report.unknown_pollutants.is_empty());
        assert!(report.unknown_stations.is_empty());
        assert!(report.summary().contains("Unknown Stations: none"));
    }
}
