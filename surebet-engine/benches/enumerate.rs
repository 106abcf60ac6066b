use chrono::Utc;
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rust_decimal_macros::dec;
use surebet_engine::{CombinationEnumerator, DetectionPipeline, EngineConfig};
use surebet_instrument::{OddsSnapshot, Selection, SelectionRecord, SnapshotRecord};

const OUTCOMES: [&str; 3] = ["Home", "Draw", "Away"];

/// Every bookmaker quotes every outcome of a 1X2 market.
fn wide_market(bookmakers: usize) -> Vec<(String, f64, String)> {
    (0..bookmakers)
        .flat_map(|bookmaker| {
            OUTCOMES.iter().enumerate().map(move |(i, outcome)| {
                let odds = 2.0 + i as f64 + bookmaker as f64 * 0.01;
                (outcome.to_string(), odds, format!("book-{bookmaker:02}"))
            })
        })
        .collect()
}

fn bench_enumerate(c: &mut Criterion) {
    let mut group = c.benchmark_group("enumerate_1x2");

    for bookmakers in [4, 8, 12, 24] {
        let snapshot = OddsSnapshot::new(
            "evt",
            "1X2",
            wide_market(bookmakers)
                .into_iter()
                .map(|(outcome, odds, bookmaker)| Selection::new(outcome, odds, bookmaker).unwrap())
                .collect(),
            Utc::now(),
        )
        .unwrap();
        let enumerator = CombinationEnumerator::default();

        group.bench_with_input(BenchmarkId::from_parameter(bookmakers), &snapshot, |b, snapshot| {
            b.iter(|| enumerator.enumerate(black_box(snapshot)).count())
        });
    }

    group.finish();
}

fn bench_cycle(c: &mut Criterion) {
    let records = (0..64)
        .map(|event| {
            SnapshotRecord::new(
                format!("evt-{event}"),
                "1X2",
                wide_market(6)
                    .into_iter()
                    .map(|(outcome, odds, bookmaker)| SelectionRecord::new(outcome, odds, bookmaker))
                    .collect(),
                Utc::now(),
            )
        })
        .collect::<Vec<_>>();
    let pipeline = DetectionPipeline::new(EngineConfig::default()).unwrap();

    c.bench_function("cycle_64_markets", |b| {
        b.iter(|| pipeline.run(black_box(records.clone()), dec!(1000)).unwrap().len())
    });
}

criterion_group!(benches, bench_enumerate, bench_cycle);
criterion_main!(benches);
