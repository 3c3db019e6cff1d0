use serde::Serialize;

/// One row of the published export: a station/pollutant/month with one
/// value per day column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WideRecord {
    pub station: String,
    pub pollutant: String,
    pub year: String,
    pub month: String,
    pub values: Vec<Option<f64>>,
}

impl WideRecord {
    pub fn new(
        station: impl Into<String>,
        pollutant: impl Into<String>,
        year: impl Into<String>,
        month: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Self {
        Self {
            station: station.into(),
            pollutant: pollutant.into(),
            year: year.into(),
            month: month.into(),
            values,
        }
    }
}

/// The wide-form table as read from disk. Every record carries exactly one
/// value per entry of `day_columns`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WideTable {
    pub day_columns: Vec<String>,
    pub records: Vec<WideRecord>,
}

impl WideTable {
    pub fn new(day_columns: Vec<String>, records: Vec<WideRecord>) -> Self {
        Self {
            day_columns,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A wide record unpivoted on one day column, before any normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct MeltedRow {
    pub station: String,
    pub pollutant: String,
    pub year: String,
    pub month: String,
    pub day_column: String,
    pub value: Option<f64>,
}
