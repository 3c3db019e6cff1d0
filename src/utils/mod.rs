pub mod constants;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use filename::{evolution_chart_filename, generate_default_parquet_filename, trend_chart_filename};
pub use progress::ProgressReporter;
