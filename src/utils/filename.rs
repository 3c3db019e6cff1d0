use crate::utils::constants::ISO_DATE_FORMAT;
use chrono::{Datelike, Local, NaiveDate};
use std::path::PathBuf;

/// Generate default Parquet filename with format: madrid-emissions-{YYMMDD}.parquet
pub fn generate_default_parquet_filename() -> PathBuf {
    let now = Local::now();
    let year = now.year() % 100; // Get last 2 digits of year
    let month = now.month();
    let day = now.day();

    let filename = format!("madrid-emissions-{:02}{:02}{:02}.parquet", year, month, day);
    PathBuf::from("output").join(filename)
}

/// File name of an evolution chart: {code}-{start}_{end}.png
pub fn evolution_chart_filename(code: &str, start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "{}-{}_{}.png",
        code,
        start.format(ISO_DATE_FORMAT),
        end.format(ISO_DATE_FORMAT)
    )
}

/// File name of a monthly mean trend chart: {display name}.png
pub fn trend_chart_filename(display_name: &str) -> String {
    let safe: String = display_name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '-' } else { c })
        .collect();
    format!("{}.png", safe)
}
