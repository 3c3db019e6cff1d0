use crate::analyzers::series::{date_series_by_name, label_table, mean_of_present, NamedSeries};
use crate::error::Result;
use crate::models::{pollutant_name, station_name, CodeKind, Measurement, MeasurementTable};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// A (year, month) bucket of the monthly trend.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Period {
    pub year: String,
    pub month: String,
}

impl Period {
    pub fn first_day(&self) -> Option<NaiveDate> {
        let year = self.year.parse::<i32>().ok()?;
        let month = self.month.parse::<u32>().ok()?;
        NaiveDate::from_ymd_opt(year, month, 1)
    }

    pub fn label(&self) -> String {
        format!("{}-{}", self.year, self.month)
    }
}

/// Monthly means of one pollutant, one column per station display name,
/// aligned on the sorted periods. `None` marks a period without data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendTable {
    pub periods: Vec<Period>,
    pub columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl TrendTable {
    /// Chart series with each period placed on its first day.
    pub fn to_series(&self) -> Vec<NamedSeries<NaiveDate>> {
        self.columns
            .iter()
            .map(|(name, values)| NamedSeries {
                name: name.clone(),
                points: self
                    .periods
                    .iter()
                    .zip(values)
                    .filter_map(|(period, value)| period.first_day().map(|d| (d, *value)))
                    .collect(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// Read-only queries over the canonical table.
pub struct EmissionsAnalyzer<'a> {
    table: &'a MeasurementTable,
}

impl<'a> EmissionsAnalyzer<'a> {
    pub fn new(table: &'a MeasurementTable) -> Self {
        Self { table }
    }

    fn select<F>(&self, keep: F) -> impl Iterator<Item = &'a Measurement>
    where
        F: Fn(&Measurement) -> bool,
    {
        self.table.iter().filter(move |m| keep(m))
    }

    /// Values recorded by a station for a pollutant, in date order.
    /// Empty when the combination does not occur.
    pub fn values_for_station_and_pollutant(
        &self,
        station: &str,
        pollutant: &str,
    ) -> Vec<Option<f64>> {
        self.select(|m| m.station == station && m.pollutant == pollutant)
            .map(|m| m.value)
            .collect()
    }

    /// Mean of every pollutant measured at a station during a month,
    /// keyed by pollutant display name.
    pub fn monthly_means_by_station(
        &self,
        month: &str,
        station: &str,
    ) -> Result<BTreeMap<String, f64>> {
        let groups = group_values(
            self.select(|m| m.month == month && m.station == station),
            |m| m.pollutant.as_str(),
        );

        let mut means = BTreeMap::new();
        for (code, values) in groups {
            means.insert(pollutant_name(code)?.to_string(), mean_of_present(values));
        }

        debug!(month, station, groups = means.len(), "Computed monthly means by station");
        Ok(means)
    }

    /// Mean of a pollutant at every station during a month, keyed by
    /// station display name. Stations sharing a display name collapse onto
    /// one key, the higher code winning.
    pub fn monthly_means_by_pollutant(
        &self,
        month: &str,
        pollutant: &str,
    ) -> Result<BTreeMap<String, f64>> {
        let groups = group_values(
            self.select(|m| m.month == month && m.pollutant == pollutant),
            |m| m.station.as_str(),
        );

        let mut means = BTreeMap::new();
        for (code, values) in groups {
            means.insert(station_name(code)?.to_string(), mean_of_present(values));
        }

        debug!(month, pollutant, groups = means.len(), "Computed monthly means by pollutant");
        Ok(means)
    }

    /// Monthly mean of a pollutant per station display name over every
    /// (year, month) present for that pollutant.
    pub fn monthly_mean_trend(&self, pollutant: &str) -> Result<TrendTable> {
        let labelled = label_table(self.table, CodeKind::Station)?;

        let mut groups: BTreeMap<(Period, &str), Vec<Option<f64>>> = BTreeMap::new();
        for row in labelled
            .iter()
            .filter(|row| row.measurement.pollutant == pollutant)
        {
            let period = Period {
                year: row.measurement.year.clone(),
                month: row.measurement.month.clone(),
            };
            groups
                .entry((period, row.display_name))
                .or_default()
                .push(row.measurement.value);
        }

        let periods: Vec<Period> = groups
            .keys()
            .map(|(period, _)| period.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let period_index: BTreeMap<&Period, usize> =
            periods.iter().enumerate().map(|(i, p)| (p, i)).collect();

        let mut columns: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();
        for ((period, name), values) in &groups {
            let mean = mean_of_present(values.iter().copied());
            let column = columns
                .entry(name.to_string())
                .or_insert_with(|| vec![None; periods.len()]);
            column[period_index[period]] = Some(mean).filter(|m| !m.is_nan());
        }

        Ok(TrendTable { periods, columns })
    }

    /// Per-pollutant date series of one station within `[start, end]`.
    pub fn station_evolution(
        &self,
        station: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NamedSeries<NaiveDate>>> {
        let labelled = label_table(self.table, CodeKind::Pollutant)?;
        Ok(date_series_by_name(&labelled, |m| {
            m.station == station && m.date >= start && m.date <= end
        }))
    }

    /// Per-station date series of one pollutant within `[start, end]`.
    pub fn pollutant_evolution(
        &self,
        pollutant: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NamedSeries<NaiveDate>>> {
        let labelled = label_table(self.table, CodeKind::Station)?;
        Ok(date_series_by_name(&labelled, |m| {
            m.pollutant == pollutant && m.date >= start && m.date <= end
        }))
    }
}

fn group_values<'a, I, K>(rows: I, key: K) -> BTreeMap<&'a str, Vec<Option<f64>>>
where
    I: Iterator<Item = &'a Measurement>,
    K: Fn(&'a Measurement) -> &'a str,
{
    let mut groups: BTreeMap<&'a str, Vec<Option<f64>>> = BTreeMap::new();
    for row in rows {
        groups.entry(key(row)).or_default().push(row.value);
    }
    groups
}
