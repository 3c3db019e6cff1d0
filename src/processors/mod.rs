pub mod reshaper;

pub use reshaper::{zero_pad, ReshapeReport, Reshaper};
