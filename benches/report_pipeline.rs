/// Report pipeline benchmarks
///
/// Measures ingest, aggregation and full report assembly over synthetic
/// fault logs of increasing size.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use faultrank::aggregate::aggregate;
use faultrank::config::{ColumnNames, ReportConfig};
use faultrank::ingest::read_records;
use faultrank::pipeline::{build_report, run};
use faultrank::record::FaultRecord;
use std::time::Duration;

const DESCRIPTIONS: [&str; 8] = [
    "Overheat",
    "Jam",
    "Leak",
    "Door open",
    "Low air pressure",
    "Emergency stop",
    "Sensor fault",
    "Belt misaligned",
];

fn synthetic_records(rows: usize) -> Vec<FaultRecord> {
    (0..rows)
        .filter_map(|i| {
            FaultRecord::new(
                format!("M{}", i % 25),
                format!("S{}", i % 6),
                format!("C{}", i % 11),
                DESCRIPTIONS[i % DESCRIPTIONS.len()],
                ((i * 37) % 1000) as f64 + 0.5,
                (i % 17) as u64,
            )
            .ok()
        })
        .collect()
}

fn synthetic_csv(rows: usize) -> String {
    let mut csv = String::from(
        "D_MachineName,D_StateDesc,D_MsgCode,D_MsgDesc,T_TotalDuration,T_TotalOccur\n",
    );
    for record in synthetic_records(rows) {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            record.machine,
            record.station_state,
            record.fault_code,
            record.fault_description,
            record.total_duration,
            record.total_occurrences
        ));
    }
    csv
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");
    group.measurement_time(Duration::from_secs(5));

    for rows in [1_000, 10_000, 100_000].iter() {
        let records = synthetic_records(*rows);
        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &records, |b, records| {
            b.iter(|| black_box(aggregate(records)));
        });
    }

    group.finish();
}

fn bench_build_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_report");
    group.measurement_time(Duration::from_secs(5));
    let config = ReportConfig::default();

    for rows in [1_000, 10_000, 100_000].iter() {
        let records = synthetic_records(*rows);
        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &records, |b, records| {
            b.iter(|| black_box(build_report(records, &config)));
        });
    }

    group.finish();
}

fn bench_ingest_and_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest_and_run");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(30);
    let config = ReportConfig::default();
    let columns = ColumnNames::default();

    let csv = synthetic_csv(50_000);
    group.throughput(Throughput::Bytes(csv.len() as u64));
    group.bench_function("csv_50k_rows", |b| {
        b.iter(|| {
            let outcome = read_records(csv.as_bytes(), &columns);
            black_box(outcome.and_then(|outcome| run(outcome, &config)))
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_aggregate,
    bench_build_report,
    bench_ingest_and_run
);
criterion_main!(benches);
