pub mod emissions_reader;

pub use emissions_reader::EmissionsReader;
