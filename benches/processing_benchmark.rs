use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use madrid_emissions::analyzers::EmissionsAnalyzer;
use madrid_emissions::models::{WideRecord, WideTable};
use madrid_emissions::processors::Reshaper;
use madrid_emissions::readers::EmissionsReader;

const STATIONS: [&str; 6] = ["4", "8", "17", "35", "50", "60"];
const POLLUTANTS: [&str; 4] = ["1", "8", "12", "14"];

// One wide row per station/pollutant/month, 31 day columns each
fn create_wide_table(months: u32) -> WideTable {
    let day_columns: Vec<String> = (1..=31).map(|d| format!("D{:02}", d)).collect();
    let mut records = Vec::new();

    for month in 1..=months {
        for (s, station) in STATIONS.iter().enumerate() {
            for (p, pollutant) in POLLUTANTS.iter().enumerate() {
                let values = (1..=31)
                    .map(|day| {
                        if day % 11 == 0 {
                            None
                        } else {
                            Some((s * 7 + p * 3 + day) as f64 * 0.5)
                        }
                    })
                    .collect();
                records.push(WideRecord::new(
                    *station,
                    *pollutant,
                    "2018",
                    month.to_string(),
                    values,
                ));
            }
        }
    }

    WideTable::new(day_columns, records)
}

fn create_csv(months: u32) -> String {
    let wide = create_wide_table(months);
    let mut csv = format!("ESTACION,MAGNITUD,ANO,MES,{}\n", wide.day_columns.join(","));

    for record in &wide.records {
        let cells: Vec<String> = record
            .values
            .iter()
            .map(|v| v.map(|v| v.to_string()).unwrap_or_default())
            .collect();
        csv.push_str(&format!(
            "{},{},{},{},{}\n",
            record.station,
            record.pollutant,
            record.year,
            record.month,
            cells.join(",")
        ));
    }

    csv
}

fn benchmark_read_csv(c: &mut Criterion) {
    let csv = create_csv(12);
    let reader = EmissionsReader::new();

    c.bench_function("read_wide_csv", |b| {
        b.iter(|| {
            let table = reader.read_wide_from_str(black_box(&csv));
            black_box(table.map(|t| t.len()).unwrap_or(0))
        })
    });
}

fn benchmark_reshape(c: &mut Criterion) {
    let wide = create_wide_table(12);

    c.bench_function("reshape_year", |b| {
        b.iter(|| {
            let (table, report) = Reshaper::new().reshape(black_box(&wide));
            black_box((table.len(), report.dropped_invalid_dates))
        })
    });
}

fn benchmark_queries(c: &mut Criterion) {
    let (table, _) = Reshaper::new().reshape(&create_wide_table(12));

    c.bench_function("monthly_means_by_pollutant", |b| {
        b.iter(|| {
            let analyzer = EmissionsAnalyzer::new(&table);
            black_box(analyzer.monthly_means_by_pollutant("03", "12").map(|m| m.len()))
        })
    });

    c.bench_function("monthly_mean_trend", |b| {
        b.iter(|| {
            let analyzer = EmissionsAnalyzer::new(&table);
            black_box(analyzer.monthly_mean_trend("12").map(|t| t.periods.len()))
        })
    });
}

fn benchmark_varying_data_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("reshape_by_months");

    for &months in &[1u32, 3, 6, 12] {
        let wide = create_wide_table(months);
        group.bench_with_input(BenchmarkId::new("months", months), &wide, |b, wide| {
            b.iter(|| black_box(Reshaper::new().reshape(wide).0.len()))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_read_csv,
    benchmark_reshape,
    benchmark_queries,
    benchmark_varying_data_sizes
);
criterion_main!(benches);
