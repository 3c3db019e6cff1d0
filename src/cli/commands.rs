use crate::analyzers::EmissionsAnalyzer;
use crate::cli::args::{Cli, Commands};
use crate::config::Settings;
use crate::error::Result;
use crate::models::{pollutant_name, station_name, Measurement, MeasurementTable};
use crate::processors::reshaper::coerce_code;
use crate::processors::{zero_pad, ReshapeReport, Reshaper};
use crate::readers::EmissionsReader;
use crate::utils::constants::{MONTH_WIDTH, POLLUTANT_CODE_WIDTH, STATION_CODE_WIDTH};
use crate::utils::filename::generate_default_parquet_filename;
use crate::utils::progress::ProgressReporter;
use crate::writers::{ChartWriter, ParquetWriter};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn run(cli: Cli) -> Result<()> {
    let settings = resolve_settings(&cli)?;
    let json = cli.json;

    match cli.command {
        Commands::Show { sample } => {
            let (table, _) = load_table(&settings, json)?;
            let head: Vec<&Measurement> = table.iter().take(sample).collect();

            if json {
                print_json(&head)?;
            } else {
                print_head(&head, table.len());
            }
        }

        Commands::Values { station, pollutant } => {
            let (table, _) = load_table(&settings, json)?;
            let station = normalize_code(&station, STATION_CODE_WIDTH);
            let pollutant = normalize_code(&pollutant, POLLUTANT_CODE_WIDTH);

            let values =
                EmissionsAnalyzer::new(&table).values_for_station_and_pollutant(&station, &pollutant);

            if json {
                print_json(&values)?;
            } else {
                print_values(&station, &pollutant, &values);
            }
        }

        Commands::StationMeans { month, station } => {
            let (table, _) = load_table(&settings, json)?;
            let month = normalize_code(&month, MONTH_WIDTH);
            let station = normalize_code(&station, STATION_CODE_WIDTH);

            let means = EmissionsAnalyzer::new(&table).monthly_means_by_station(&month, &station)?;

            if json {
                print_json(&means)?;
            } else {
                let heading = format!(
                    "Monthly means at station {} ({}) for month {}:",
                    station,
                    station_name(&station).unwrap_or("unknown station"),
                    month
                );
                print_means(&heading, &means);
            }
        }

        Commands::PollutantMeans { month, pollutant } => {
            let (table, _) = load_table(&settings, json)?;
            let month = normalize_code(&month, MONTH_WIDTH);
            let pollutant = normalize_code(&pollutant, POLLUTANT_CODE_WIDTH);

            let means =
                EmissionsAnalyzer::new(&table).monthly_means_by_pollutant(&month, &pollutant)?;

            if json {
                print_json(&means)?;
            } else {
                let heading = format!(
                    "Monthly means of {} ({}) for month {}:",
                    pollutant,
                    pollutant_name(&pollutant).unwrap_or("unknown pollutant"),
                    month
                );
                print_means(&heading, &means);
            }
        }

        Commands::StationChart {
            station,
            start,
            end,
        } => {
            let (table, _) = load_table(&settings, json)?;
            let station = normalize_code(&station, STATION_CODE_WIDTH);
            let path = render(&settings, json, "Rendering station chart...", |writer| {
                writer.station_evolution(&table, &station, start, end)
            })?;
            report_chart(&path, json)?;
        }

        Commands::PollutantChart {
            pollutant,
            start,
            end,
        } => {
            let (table, _) = load_table(&settings, json)?;
            let pollutant = normalize_code(&pollutant, POLLUTANT_CODE_WIDTH);
            let path = render(&settings, json, "Rendering pollutant chart...", |writer| {
                writer.pollutant_evolution(&table, &pollutant, start, end)
            })?;
            report_chart(&path, json)?;
        }

        Commands::TrendChart { pollutant } => {
            let (table, _) = load_table(&settings, json)?;
            let pollutant = normalize_code(&pollutant, POLLUTANT_CODE_WIDTH);
            let path = render(&settings, json, "Rendering trend chart...", |writer| {
                writer.pollutant_monthly_trend(&table, &pollutant)
            })?;
            report_chart(&path, json)?;
        }

        Commands::Export {
            output_file,
            compression,
            chunk_size,
        } => {
            let (table, _) = load_table(&settings, json)?;

            if table.is_empty() {
                println!("No records to write");
                return Ok(());
            }

            let output_file = output_file.unwrap_or_else(generate_default_parquet_filename);
            let writer = ParquetWriter::new().with_compression(&compression)?;

            if let Some(parent) = output_file.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }

            println!(
                "Writing {} records to {}...",
                table.len(),
                output_file.display()
            );
            writer.write_table_batched(&table, &output_file, chunk_size)?;

            let file_info = writer.get_file_info(&output_file)?;
            println!("\n{}", file_info.summary());
            println!("Export complete!");
        }

        Commands::Info => {
            let (table, reshape_report) = load_table(&settings, json)?;

            if json {
                print_json(&InfoSummary::new(&table, &reshape_report))?;
            } else {
                println!("Input file: {}", settings.input_path.display());
                println!("\n{}", reshape_report.summary());
                if let Some((first, last)) = table.date_range() {
                    println!("Date Range: {} to {}", first, last);
                }
            }
        }

        Commands::Inspect { file, sample } => {
            println!("Analyzing Parquet file: {}", file.display());

            let writer = ParquetWriter::new();
            let file_info = writer.get_file_info(&file)?;
            println!("\n{}", file_info.summary());

            if sample > 0 {
                println!("\nSample Records (showing up to {} records):", sample);
                match writer.read_sample_records(&file, sample) {
                    Ok(records) => {
                        for (i, record) in records.iter().enumerate() {
                            println!("{}. {}", i + 1, format_row(record));
                        }
                    }
                    Err(e) => println!("Error reading sample data: {}", e),
                }
            }
        }

        Commands::Demo => run_demo(&settings)?,
    }

    Ok(())
}

/// Command-line codes follow the loader rule, so "8", "08" and "008" agree
fn normalize_code(code: &str, width: usize) -> String {
    zero_pad(&coerce_code(code), width)
}

/// Layer the CLI overrides on top of the file/environment settings
fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;

    if let Some(input) = &cli.input {
        settings.input_path = input.clone();
    }
    if let Some(output_dir) = &cli.output_dir {
        settings.output_dir = output_dir.clone();
    }

    settings.check()?;
    Ok(settings)
}

/// Read and reshape the configured input into the canonical table
pub fn load_table(settings: &Settings, silent: bool) -> Result<(MeasurementTable, ReshapeReport)> {
    let progress = ProgressReporter::new_spinner(
        &format!("Reading {}...", settings.input_path.display()),
        silent,
    );

    let reader = EmissionsReader::new()
        .with_delimiter(settings.delimiter_byte()?)
        .with_encoding(&settings.encoding)?
        .with_day_prefix(&settings.day_prefix);
    let wide = reader.read_wide(&settings.input_path)?;

    progress.set_message("Reshaping measurements...");
    let (table, report) = Reshaper::new().reshape(&wide);

    progress.finish_with_message(&format!("Loaded {} measurements", table.len()));
    info!(
        rows = table.len(),
        dropped = report.dropped_invalid_dates,
        "Canonical table ready"
    );
    Ok((table, report))
}

fn chart_writer(settings: &Settings) -> ChartWriter {
    ChartWriter::new(settings.output_dir.clone())
        .with_size(settings.chart.width, settings.chart.height)
        .with_plot_fraction(settings.chart.plot_fraction)
}

fn render<F>(settings: &Settings, silent: bool, message: &str, draw: F) -> Result<PathBuf>
where
    F: FnOnce(&ChartWriter) -> Result<PathBuf>,
{
    let progress = ProgressReporter::new_spinner(message, silent);
    let path = draw(&chart_writer(settings))?;
    progress.finish_with_message(&format!("Saved {}", path.display()));
    Ok(path)
}

fn report_chart(path: &Path, json: bool) -> Result<()> {
    if json {
        print_json(&BTreeMap::from([("chart", path.display().to_string())]))
    } else {
        println!("Chart written to {}", path.display());
        Ok(())
    }
}

/// The fixed walkthrough: table head, three queries, three charts
fn run_demo(settings: &Settings) -> Result<()> {
    let (table, report) = load_table(settings, false)?;
    let analyzer = EmissionsAnalyzer::new(&table);
    let start = demo_date(2018, 3, 1)?;
    let end = demo_date(2018, 6, 30)?;

    println!("{}\n", report.summary());

    let head: Vec<&Measurement> = table.iter().take(5).collect();
    print_head(&head, table.len());

    println!();
    print_values("050", "12", &analyzer.values_for_station_and_pollutant("050", "12"));

    println!();
    print_means(
        "Monthly means at station 050 for month 03:",
        &analyzer.monthly_means_by_station("03", "050")?,
    );

    println!();
    print_means(
        "Monthly means of pollutant 12 for month 12:",
        &analyzer.monthly_means_by_pollutant("12", "12")?,
    );

    let writer = chart_writer(settings);
    println!();
    for path in [
        writer.station_evolution(&table, "017", start, end)?,
        writer.pollutant_evolution(&table, "12", start, end)?,
        writer.pollutant_monthly_trend(&table, "12")?,
    ] {
        println!("Chart written to {}", path.display());
    }

    Ok(())
}

fn demo_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        crate::error::ProcessingError::InvalidFormat(format!(
            "invalid date {}-{}-{}",
            year, month, day
        ))
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}", v),
        _ => "NaN".to_string(),
    }
}

fn format_row(record: &Measurement) -> String {
    format!(
        "{}  station={} pollutant={} year={} month={} day={} value={}",
        record.date,
        record.station,
        record.pollutant,
        record.year,
        record.month,
        record.day,
        format_value(record.value)
    )
}

fn print_head(head: &[&Measurement], total: usize) {
    println!("First {} of {} measurements:", head.len(), total);
    for record in head {
        println!("  {}", format_row(record));
    }
}

fn print_values(station: &str, pollutant: &str, values: &[Option<f64>]) {
    println!(
        "{} values for station {} / pollutant {}:",
        values.len(),
        station,
        pollutant
    );
    let rendered: Vec<String> = values.iter().map(|v| format_value(*v)).collect();
    println!("  [{}]", rendered.join(", "));
}

fn print_means(heading: &str, means: &BTreeMap<String, f64>) {
    println!("{}", heading);
    if means.is_empty() {
        println!("  (no measurements)");
    }
    for (name, mean) in means {
        println!("  {:<35} {}", name, format_value(Some(*mean)));
    }
}

#[derive(Serialize)]
struct InfoSummary<'a> {
    reshape: &'a ReshapeReport,
    first_date: Option<NaiveDate>,
    last_date: Option<NaiveDate>,
    stations: Vec<&'a str>,
    pollutants: Vec<&'a str>,
}

impl<'a> InfoSummary<'a> {
    fn new(table: &'a MeasurementTable, reshape: &'a ReshapeReport) -> Self {
        let range = table.date_range();
        Self {
            reshape,
            first_date: range.map(|(first, _)| first),
            last_date: range.map(|(_, last)| last),
            stations: table.stations().into_iter().collect(),
            pollutants: table.pollutants().into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("8", STATION_CODE_WIDTH), "008");
        assert_eq!(normalize_code("0050", STATION_CODE_WIDTH), "050");
        assert_eq!(normalize_code("12", POLLUTANT_CODE_WIDTH), "12");
        assert_eq!(normalize_code("3", MONTH_WIDTH), "03");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(Some(41.456)), "41.46");
        assert_eq!(format_value(None), "NaN");
        assert_eq!(format_value(Some(f64::NAN)), "NaN");
    }

    #[test]
    fn test_format_row() {
        let record = Measurement::new(
            "050",
            "12",
            NaiveDate::from_ymd_opt(2018, 3, 1).unwrap(),
            Some(7.0),
        );
        assert_eq!(
            format_row(&record),
            "2018-03-01  station=050 pollutant=12 year=2018 month=03 day=01 value=7.00"
        );
    }
}
