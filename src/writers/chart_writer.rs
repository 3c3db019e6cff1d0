use crate::analyzers::{EmissionsAnalyzer, NamedSeries};
use crate::error::{ProcessingError, Result};
use crate::models::{pollutant_name, MeasurementTable};
use crate::utils::constants::{
    DEFAULT_CHART_HEIGHT, DEFAULT_CHART_WIDTH, DEFAULT_PLOT_FRACTION, ISO_DATE_FORMAT,
};
use crate::utils::filename::{evolution_chart_filename, trend_chart_filename};
use chrono::{Duration, Local, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

const LEGEND_LINE_HEIGHT: i32 = 20;
const LEGEND_SWATCH_WIDTH: i32 = 24;

fn chart_error<E: std::fmt::Display>(e: E) -> ProcessingError {
    ProcessingError::Chart(e.to_string())
}

/// Renders line charts of the canonical table to PNG files.
///
/// The plot occupies the left `plot_fraction` of the image; the legend is
/// drawn outside it, vertically centred in the remaining strip.
pub struct ChartWriter {
    output_dir: PathBuf,
    width: u32,
    height: u32,
    plot_fraction: f64,
}

impl ChartWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            width: DEFAULT_CHART_WIDTH,
            height: DEFAULT_CHART_HEIGHT,
            plot_fraction: DEFAULT_PLOT_FRACTION,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_plot_fraction(mut self, plot_fraction: f64) -> Self {
        self.plot_fraction = plot_fraction.clamp(0.1, 1.0);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Evolution of every pollutant measured at `station` between `start`
    /// and `end` (both inclusive). Writes `{station}-{start}_{end}.png`.
    pub fn station_evolution(
        &self,
        table: &MeasurementTable,
        station: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PathBuf> {
        let series = EmissionsAnalyzer::new(table).station_evolution(station, start, end)?;
        let path = self
            .output_dir
            .join(evolution_chart_filename(station, start, end));
        let title = format!(
            "Station {}: {} to {}",
            station,
            start.format(ISO_DATE_FORMAT),
            end.format(ISO_DATE_FORMAT)
        );

        self.render_date_chart(&path, &title, &series, (start, end), ISO_DATE_FORMAT)?;
        Ok(path)
    }

    /// Evolution of `pollutant` at every station between `start` and `end`
    /// (both inclusive). Writes `{pollutant}-{start}_{end}.png`.
    pub fn pollutant_evolution(
        &self,
        table: &MeasurementTable,
        pollutant: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PathBuf> {
        let series = EmissionsAnalyzer::new(table).pollutant_evolution(pollutant, start, end)?;
        let path = self
            .output_dir
            .join(evolution_chart_filename(pollutant, start, end));
        let title = format!(
            "{}: {} to {}",
            pollutant_name(pollutant).unwrap_or(pollutant),
            start.format(ISO_DATE_FORMAT),
            end.format(ISO_DATE_FORMAT)
        );

        self.render_date_chart(&path, &title, &series, (start, end), ISO_DATE_FORMAT)?;
        Ok(path)
    }

    /// Monthly mean of `pollutant` per station over the whole table.
    /// Writes `{pollutant display name}.png`.
    pub fn pollutant_monthly_trend(
        &self,
        table: &MeasurementTable,
        pollutant: &str,
    ) -> Result<PathBuf> {
        let name = pollutant_name(pollutant)?;
        let trend = EmissionsAnalyzer::new(table).monthly_mean_trend(pollutant)?;
        let path = self.output_dir.join(trend_chart_filename(name));

        let first_days: Vec<NaiveDate> =
            trend.periods.iter().filter_map(|p| p.first_day()).collect();
        let x_range = match (first_days.first(), first_days.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => {
                let today = Local::now().date_naive();
                (today, today)
            }
        };

        let title = format!("{}: monthly mean by station", name);
        self.render_date_chart(&path, &title, &trend.to_series(), x_range, "%Y-%m")?;
        Ok(path)
    }

    fn render_date_chart(
        &self,
        path: &Path,
        title: &str,
        series: &[NamedSeries<NaiveDate>],
        (start, end): (NaiveDate, NaiveDate),
        date_format: &str,
    ) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir)?;

        let x_end = if end > start {
            end
        } else {
            start + Duration::days(1)
        };
        let (y_min, y_max) = value_bounds(series);

        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let plot_width = (self.width as f64 * self.plot_fraction).round() as i32;
        let (plot_area, legend_area) = root.split_horizontally(plot_width);

        let mut chart = ChartBuilder::on(&plot_area)
            .caption(title, ("sans-serif", 22))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(55)
            .build_cartesian_2d(start..x_end, y_min..y_max)
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .x_labels(6)
            .x_label_formatter(&|d: &NaiveDate| d.format(date_format).to_string())
            .y_label_formatter(&|v: &f64| format!("{:.0}", v))
            .draw()
            .map_err(chart_error)?;

        for (idx, s) in series.iter().enumerate() {
            let style = Palette99::pick(idx).to_rgba().stroke_width(2);
            for segment in s.segments() {
                chart
                    .draw_series(LineSeries::new(segment, style))
                    .map_err(chart_error)?;
            }
        }

        let names: Vec<&str> = series.iter().map(|s| s.name.as_str()).collect();
        draw_legend(&legend_area, &names)?;

        root.present().map_err(chart_error)?;
        info!(path = %path.display(), series = series.len(), "Wrote chart");
        Ok(())
    }
}

/// Draw the legend entries centred vertically, left aligned in `area`.
fn draw_legend<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, names: &[&str]) -> Result<()> {
    let (_, height) = area.dim_in_pixel();
    let total_height = LEGEND_LINE_HEIGHT * names.len() as i32;
    let mut y = (height as i32 - total_height) / 2 + LEGEND_LINE_HEIGHT / 2;

    for (idx, name) in names.iter().enumerate() {
        let style = Palette99::pick(idx).to_rgba().stroke_width(2);
        area.draw(&PathElement::new(
            vec![(10, y), (10 + LEGEND_SWATCH_WIDTH, y)],
            style,
        ))
        .map_err(chart_error)?;
        area.draw(&Text::new(
            name.to_string(),
            (16 + LEGEND_SWATCH_WIDTH, y - 7),
            ("sans-serif", 14).into_font(),
        ))
        .map_err(chart_error)?;
        y += LEGEND_LINE_HEIGHT;
    }

    Ok(())
}

/// Y axis bounds covering every present value, padded by 5%.
fn value_bounds(series: &[NamedSeries<NaiveDate>]) -> (f64, f64) {
    let (min, max) = series
        .iter()
        .flat_map(|s| s.present_values())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    if (max - min).abs() < f64::EPSILON {
        return (min - 1.0, max + 1.0);
    }

    let padding = (max - min) * 0.05;
    (min - padding, max + padding)
}
