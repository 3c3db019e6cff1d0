pub mod chart_writer;
pub mod parquet_writer;

pub use chart_writer::ChartWriter;
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};
