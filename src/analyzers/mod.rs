pub mod emissions_analyzer;
pub mod series;

pub use emissions_analyzer::{EmissionsAnalyzer, Period, TrendTable};
pub use series::{label_table, NamedSeries};
