/// Identifier columns of the wide-form export
pub const STATION_COLUMN: &str = "ESTACION";
pub const POLLUTANT_COLUMN: &str = "MAGNITUD";
pub const YEAR_COLUMN: &str = "ANO";
pub const MONTH_COLUMN: &str = "MES";

/// Prefix of the per-day value columns (D01..D31)
pub const DEFAULT_DAY_PREFIX: &str = "D";

/// Fixed code widths
pub const STATION_CODE_WIDTH: usize = 3;
pub const POLLUTANT_CODE_WIDTH: usize = 2;
pub const MONTH_WIDTH: usize = 2;

/// Composite date built from day/month/year
pub const COMPOSITE_DATE_FORMAT: &str = "%d/%m/%Y";

/// Date format accepted for range bounds and used in file names
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// File and directory defaults
pub const DEFAULT_INPUT_PATH: &str = "datos/datos-emisiones.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "img";
pub const DEFAULT_CONFIG_FILE: &str = "madrid-emissions.toml";
pub const ENV_PREFIX: &str = "EMISSIONS";

/// Input decoding defaults
pub const DEFAULT_DELIMITER: &str = ",";
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Chart defaults
pub const DEFAULT_CHART_WIDTH: u32 = 1024;
pub const DEFAULT_CHART_HEIGHT: u32 = 768;
pub const DEFAULT_PLOT_FRACTION: f64 = 0.7;

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
