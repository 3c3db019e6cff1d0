pub mod measurement;
pub mod raw;
pub mod reference;

pub use measurement::{LabelledMeasurement, Measurement, MeasurementTable};
pub use raw::{MeltedRow, WideRecord, WideTable};
pub use reference::{pollutant_name, station_name, CodeKind};
