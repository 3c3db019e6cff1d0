use crate::utils::constants::{COMPRESSION_SNAPPY, DEFAULT_CHUNK_SIZE, ISO_DATE_FORMAT};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "madrid-emissions")]
#[command(about = "Reshape, query and chart Madrid air-quality measurements")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Settings file [default: madrid-emissions.toml]")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Wide-format emissions CSV")]
    pub input: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Directory for rendered charts")]
    pub output_dir: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, help = "Print results as JSON")]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the first rows of the canonical table
    Show {
        #[arg(short, long, default_value = "5")]
        sample: usize,
    },

    /// Values recorded by a station for a pollutant
    Values {
        #[arg(short, long)]
        station: String,

        #[arg(short, long)]
        pollutant: String,
    },

    /// Mean of every pollutant at a station during a month
    StationMeans {
        #[arg(short, long)]
        month: String,

        #[arg(short, long)]
        station: String,
    },

    /// Mean of a pollutant at every station during a month
    PollutantMeans {
        #[arg(short, long)]
        month: String,

        #[arg(short, long)]
        pollutant: String,
    },

    /// Chart every pollutant measured at a station over a date range
    StationChart {
        #[arg(short, long)]
        station: String,

        #[arg(long, value_parser = parse_date, help = "First day (YYYY-MM-DD)")]
        start: NaiveDate,

        #[arg(long, value_parser = parse_date, help = "Last day, inclusive (YYYY-MM-DD)")]
        end: NaiveDate,
    },

    /// Chart a pollutant at every station over a date range
    PollutantChart {
        #[arg(short, long)]
        pollutant: String,

        #[arg(long, value_parser = parse_date, help = "First day (YYYY-MM-DD)")]
        start: NaiveDate,

        #[arg(long, value_parser = parse_date, help = "Last day, inclusive (YYYY-MM-DD)")]
        end: NaiveDate,
    },

    /// Chart the monthly mean of a pollutant per station
    TrendChart {
        #[arg(short, long)]
        pollutant: String,
    },

    /// Export the canonical table to Parquet
    Export {
        #[arg(
            short = 'f',
            long,
            help = "Output Parquet file path [default: output/madrid-emissions-{YYMMDD}.parquet]"
        )]
        output_file: Option<PathBuf>,

        #[arg(long, default_value = COMPRESSION_SNAPPY)]
        compression: String,

        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },

    /// Reshape report and code coverage for the input file
    Info,

    /// Display information about an exported Parquet file
    Inspect {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "10")]
        sample: usize,
    },

    /// Run the fixed walkthrough of queries and charts
    Demo,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, ISO_DATE_FORMAT)
        .map_err(|e| format!("invalid date '{}': {}", value, e))
}
