use crate::error::{ProcessingError, Result};
use crate::models::{Measurement, MeasurementTable};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Days from 0001-01-01 (CE day 1) to 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(parquet::basic::ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Write the canonical table to a Parquet file
    pub fn write_table(&self, table: &MeasurementTable, path: &Path) -> Result<()> {
        self.write_table_batched(table, path, table.len().max(1))
    }

    /// Write the canonical table in batches for memory efficiency
    pub fn write_table_batched(
        &self,
        table: &MeasurementTable,
        path: &Path,
        batch_size: usize,
    ) -> Result<()> {
        if table.is_empty() {
            return Ok(());
        }

        let schema = self.create_schema();
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        for chunk in table.records().chunks(batch_size.max(1)) {
            let batch = self.records_to_batch(chunk, schema.clone())?;
            writer.write(&batch)?;
        }

        writer.close()?;
        info!(path = %path.display(), rows = table.len(), "Wrote Parquet file");
        Ok(())
    }

    /// Arrow schema of the canonical long-form table
    fn create_schema(&self) -> Arc<Schema> {
        let fields = vec![
            Field::new("station", DataType::Utf8, false),
            Field::new("pollutant", DataType::Utf8, false),
            Field::new("year", DataType::Utf8, false),
            Field::new("month", DataType::Utf8, false),
            Field::new("day", DataType::Utf8, false),
            Field::new("date", DataType::Date32, false),
            Field::new("value", DataType::Float64, true),
        ];

        Arc::new(Schema::new(fields))
    }

    fn records_to_batch(
        &self,
        records: &[Measurement],
        schema: Arc<Schema>,
    ) -> Result<RecordBatch> {
        let stations: Vec<&str> = records.iter().map(|r| r.station.as_str()).collect();
        let pollutants: Vec<&str> = records.iter().map(|r| r.pollutant.as_str()).collect();
        let years: Vec<&str> = records.iter().map(|r| r.year.as_str()).collect();
        let months: Vec<&str> = records.iter().map(|r| r.month.as_str()).collect();
        let days: Vec<&str> = records.iter().map(|r| r.day.as_str()).collect();
        let dates: Vec<i32> = records
            .iter()
            .map(|r| r.date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
            .collect();
        let values: Vec<Option<f64>> = records.iter().map(|r| r.value).collect();

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(stations)),
                Arc::new(StringArray::from(pollutants)),
                Arc::new(StringArray::from(years)),
                Arc::new(StringArray::from(months)),
                Arc::new(StringArray::from(days)),
                Arc::new(Date32Array::from(dates)),
                Arc::new(Float64Array::from(values)),
            ],
        )?;

        Ok(batch)
    }

    /// Read up to `limit` measurements back from a Parquet file
    pub fn read_sample_records(&self, path: &Path, limit: usize) -> Result<Vec<Measurement>> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(path)?;
        let parquet_reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(limit.clamp(1, 8192))
            .build()?;

        let mut records = Vec::new();

        for batch_result in parquet_reader {
            let batch = batch_result?;

            let stations = typed_column::<StringArray>(&batch, "station")?;
            let pollutants = typed_column::<StringArray>(&batch, "pollutant")?;
            let years = typed_column::<StringArray>(&batch, "year")?;
            let months = typed_column::<StringArray>(&batch, "month")?;
            let days = typed_column::<StringArray>(&batch, "day")?;
            let dates = typed_column::<Date32Array>(&batch, "date")?;
            let values = typed_column::<Float64Array>(&batch, "value")?;

            for i in 0..batch.num_rows() {
                if records.len() >= limit {
                    return Ok(records);
                }

                let date = NaiveDate::from_num_days_from_ce_opt(
                    dates.value(i) + UNIX_EPOCH_DAYS_FROM_CE,
                )
                .ok_or_else(|| {
                    ProcessingError::InvalidFormat(format!("Invalid date value {}", dates.value(i)))
                })?;

                records.push(Measurement {
                    station: stations.value(i).to_string(),
                    pollutant: pollutants.value(i).to_string(),
                    year: years.value(i).to_string(),
                    month: months.value(i).to_string(),
                    day: days.value(i).to_string(),
                    value: if values.is_null(i) {
                        None
                    } else {
                        Some(values.value(i))
                    },
                    date,
                });
            }
        }

        Ok(records)
    }

    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let file_metadata = metadata.file_metadata();
        let row_groups = metadata.num_row_groups();
        let total_rows = file_metadata.num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let mut row_group_sizes = Vec::new();
        for i in 0..row_groups {
            let rg_metadata = metadata.row_group(i);
            row_group_sizes.push(rg_metadata.num_rows());
        }

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression: self.compression,
        })
    }
}

/// Look a column up by name and downcast it to its expected array type
fn typed_column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .ok_or_else(|| ProcessingError::MissingColumn(name.to_string()))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Invalid {} column type", name)))
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0, // Convert to MB
            self.compression,
            self.total_rows as f64 / self.row_groups.max(1) as f64
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    fn sample_table() -> MeasurementTable {
        MeasurementTable::new(vec![
            Measurement::new("050", "12", NaiveDate::from_ymd_opt(2018, 3, 1).unwrap(), Some(41.0)),
            Measurement::new("050", "08", NaiveDate::from_ymd_opt(2018, 3, 1).unwrap(), None),
            Measurement::new("017", "12", NaiveDate::from_ymd_opt(2018, 3, 2).unwrap(), Some(7.5)),
        ])
    }

    #[test]
    fn test_write_empty_table() {
        let writer = ParquetWriter::new();
        let temp_file = NamedTempFile::new().unwrap();

        let result = writer.write_table(&MeasurementTable::default(), temp_file.path());
        assert!(result.is_ok());
    }

    #[test]
    fn test_write_and_read_back() -> Result<()> {
        let writer = ParquetWriter::new().with_row_group_size(2);
        let temp_file = NamedTempFile::new()?;
        let table = sample_table();

        writer.write_table_batched(&table, temp_file.path(), 2)?;

        let info = writer.get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 3);
        assert_eq!(info.row_group_sizes, vec![2, 1]);

        let records = writer.read_sample_records(temp_file.path(), 10)?;
        assert_eq!(records, table.records().to_vec());

        let limited = writer.read_sample_records(temp_file.path(), 1)?;
        assert_eq!(limited.len(), 1);

        Ok(())
    }

    #[test]
    fn test_read_foreign_file_is_an_error() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        let schema = Arc::new(Schema::new(vec![Field::new(
            "station",
            DataType::Utf8,
            false,
        )]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(StringArray::from(vec!["050"]))],
        )?;

        let mut writer = ArrowWriter::try_new(temp_file.reopen()?, schema, None)?;
        writer.write(&batch)?;
        writer.close()?;

        let result = ParquetWriter::new().read_sample_records(temp_file.path(), 5);
        assert!(matches!(
            result,
            Err(ProcessingError::MissingColumn(ref name)) if name == "pollutant"
        ));
        Ok(())
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        let compressions = ["snappy", "gzip", "lz4", "zstd", "none"];

        for compression in &compressions {
            let writer = ParquetWriter::new().with_compression(compression)?;
            let temp_file = NamedTempFile::new()?;

            let result = writer.write_table(&sample_table(), temp_file.path());
            assert!(result.is_ok(), "Failed with compression: {}", compression);
        }

        assert!(ParquetWriter::new().with_compression("brotli-9000").is_err());
        Ok(())
    }
}
