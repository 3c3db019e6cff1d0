//! Layered runtime settings.
//!
//! Built-in defaults, then an optional TOML file, then `EMISSIONS_*`
//! environment variables (nested keys separated by `__`, e.g.
//! `EMISSIONS_CHART__WIDTH`). Command-line overrides are applied by the
//! caller before [`Settings::validate`] runs.

use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    DEFAULT_CHART_HEIGHT, DEFAULT_CHART_WIDTH, DEFAULT_CONFIG_FILE, DEFAULT_DAY_PREFIX,
    DEFAULT_DELIMITER, DEFAULT_ENCODING, DEFAULT_INPUT_PATH, DEFAULT_OUTPUT_DIR,
    DEFAULT_PLOT_FRACTION, ENV_PREFIX,
};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    pub input_path: PathBuf,

    pub output_dir: PathBuf,

    #[validate(custom(function = "validate_delimiter"))]
    pub delimiter: String,

    #[validate(length(min = 1))]
    pub encoding: String,

    #[validate(length(min = 1))]
    pub day_prefix: String,

    #[validate(nested)]
    pub chart: ChartSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ChartSettings {
    #[validate(range(min = 200, max = 8000))]
    pub width: u32,

    #[validate(range(min = 200, max = 8000))]
    pub height: u32,

    /// Share of the image width given to the plot; the legend gets the rest
    #[validate(range(min = 0.1, max = 1.0))]
    pub plot_fraction: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            delimiter: DEFAULT_DELIMITER.to_string(),
            encoding: DEFAULT_ENCODING.to_string(),
            day_prefix: DEFAULT_DAY_PREFIX.to_string(),
            chart: ChartSettings::default(),
        }
    }
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_CHART_WIDTH,
            height: DEFAULT_CHART_HEIGHT,
            plot_fraction: DEFAULT_PLOT_FRACTION,
        }
    }
}

impl Settings {
    /// Load settings from every layer. An explicit `config_file` must exist;
    /// the default `madrid-emissions.toml` is optional.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let file_source = match config_file {
            Some(path) => File::from(path.to_path_buf()).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(file_source)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        debug!(?settings, "Loaded settings");
        Ok(settings)
    }

    /// The delimiter as the single byte the CSV reader expects
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(ProcessingError::Config(format!(
                "Delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            ))),
        }
    }

    /// Validate every field, mapping failures into the crate error
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        Ok(())
    }
}

fn validate_delimiter(delimiter: &str) -> std::result::Result<(), ValidationError> {
    if delimiter.len() == 1 && delimiter.is_ascii() {
        Ok(())
    } else {
        Err(ValidationError::new("single_ascii_char"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.check().is_ok());
        assert_eq!(settings.delimiter_byte().unwrap(), b',');
        assert_eq!(settings.output_dir, PathBuf::from("img"));
        assert_eq!(settings.chart.width, 1024);
    }

    #[test]
    fn test_load_from_toml_file() -> Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(
            file,
            "input_path = \"data/2018.csv\"\ndelimiter = \";\"\n\n[chart]\nwidth = 1600"
        )?;

        let settings = Settings::load(Some(file.path()))?;

        assert_eq!(settings.input_path, PathBuf::from("data/2018.csv"));
        assert_eq!(settings.delimiter_byte()?, b';');
        assert_eq!(settings.chart.width, 1600);
        assert_eq!(settings.chart.height, 768);
        assert_eq!(settings.encoding, "utf-8");
        Ok(())
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let result = Settings::load(Some(Path::new("/nonexistent/madrid-emissions.toml")));
        assert!(matches!(result, Err(ProcessingError::Settings(_))));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut settings = Settings::default();
        settings.delimiter = ";;".to_string();
        assert!(matches!(
            settings.check(),
            Err(ProcessingError::Validation(_))
        ));
        assert!(settings.delimiter_byte().is_err());

        let mut settings = Settings::default();
        settings.chart.plot_fraction = 0.0;
        assert!(settings.check().is_err());

        let mut settings = Settings::default();
        settings.chart.width = 50;
        assert!(settings.check().is_err());
    }
}
