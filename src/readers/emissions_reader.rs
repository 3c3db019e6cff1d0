use crate::error::{ProcessingError, Result};
use crate::models::{WideRecord, WideTable};
use crate::utils::constants::{
    DEFAULT_DAY_PREFIX, MONTH_COLUMN, POLLUTANT_COLUMN, STATION_COLUMN, YEAR_COLUMN,
};
use csv::{ReaderBuilder, StringRecord, Trim};
use encoding_rs::{Encoding, UTF_8};
use std::path::Path;
use tracing::{debug, info, warn};

/// Reads the wide-form emissions export (one row per station/pollutant/month,
/// one column per day).
pub struct EmissionsReader {
    delimiter: u8,
    encoding: &'static Encoding,
    day_prefix: String,
}

/// Positions of the identifier and day columns within a header row.
#[derive(Debug, Clone, PartialEq)]
struct ColumnLayout {
    station: usize,
    pollutant: usize,
    year: usize,
    month: usize,
    days: Vec<(usize, String)>,
}

impl EmissionsReader {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            encoding: UTF_8,
            day_prefix: DEFAULT_DAY_PREFIX.to_string(),
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Select the input encoding by WHATWG label ("utf-8", "windows-1252", ...)
    pub fn with_encoding(mut self, label: &str) -> Result<Self> {
        self.encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
            ProcessingError::Config(format!("Unsupported encoding: {}", label))
        })?;
        Ok(self)
    }

    pub fn with_day_prefix(mut self, prefix: &str) -> Self {
        self.day_prefix = prefix.to_string();
        self
    }

    /// Read the wide-form table from a CSV file
    pub fn read_wide(&self, path: &Path) -> Result<WideTable> {
        let bytes = std::fs::read(path)?;
        let (text, actual_encoding, had_errors) = self.encoding.decode(&bytes);
        if had_errors {
            warn!(
                path = %path.display(),
                encoding = actual_encoding.name(),
                "Input contained byte sequences invalid for the encoding; replaced"
            );
        }

        let table = self.read_wide_from_str(&text)?;
        info!(
            path = %path.display(),
            rows = table.len(),
            day_columns = table.day_columns.len(),
            "Read wide-form emissions table"
        );
        Ok(table)
    }

    /// Read the wide-form table from already decoded CSV text
    pub fn read_wide_from_str(&self, text: &str) -> Result<WideTable> {
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let layout = self.parse_header(&headers)?;

        let mut records = Vec::new();
        for record_result in reader.records() {
            let record = record_result?;
            records.push(self.parse_record(&record, &layout)?);
        }

        let day_columns = layout.days.into_iter().map(|(_, label)| label).collect();
        Ok(WideTable::new(day_columns, records))
    }

    fn parse_header(&self, headers: &StringRecord) -> Result<ColumnLayout> {
        let position = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| ProcessingError::MissingColumn(name.to_string()))
        };

        let station = position(STATION_COLUMN)?;
        let pollutant = position(POLLUTANT_COLUMN)?;
        let year = position(YEAR_COLUMN)?;
        let month = position(MONTH_COLUMN)?;

        let mut days = Vec::new();
        for (index, header) in headers.iter().enumerate() {
            if [station, pollutant, year, month].contains(&index) {
                continue;
            }
            if self.is_day_column(header) {
                days.push((index, header.to_string()));
            } else {
                debug!(column = header, "Ignoring non-day column");
            }
        }

        if days.is_empty() {
            return Err(ProcessingError::InvalidFormat(format!(
                "No day columns with prefix '{}' found in header",
                self.day_prefix
            )));
        }

        Ok(ColumnLayout {
            station,
            pollutant,
            year,
            month,
            days,
        })
    }

    fn is_day_column(&self, header: &str) -> bool {
        header
            .strip_prefix(self.day_prefix.as_str())
            .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
    }

    fn parse_record(&self, record: &StringRecord, layout: &ColumnLayout) -> Result<WideRecord> {
        let field = |index: usize, name: &str| -> Result<String> {
            record.get(index).map(str::to_string).ok_or_else(|| {
                ProcessingError::InvalidFormat(format!(
                    "Row {} has no value for column {}",
                    record.position().map_or(0, |p| p.line()),
                    name
                ))
            })
        };

        let values = layout
            .days
            .iter()
            .map(|(index, _)| record.get(*index).and_then(parse_value))
            .collect();

        Ok(WideRecord::new(
            field(layout.station, STATION_COLUMN)?,
            field(layout.pollutant, POLLUTANT_COLUMN)?,
            field(layout.year, YEAR_COLUMN)?,
            field(layout.month, MONTH_COLUMN)?,
            values,
        ))
    }
}

impl Default for EmissionsReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a day cell; empty or non-numeric cells are missing values.
fn parse_value(cell: &str) -> Option<f64> {
    if cell.is_empty() {
        return None;
    }
    cell.parse::<f64>().ok().filter(|v| !v.is_nan())
}
