//! Row reconstruction and flattening benchmark

use poll_position::artifact::{decode_payload, reconstruct_rows, Column};
use poll_position::ingester::flatten_all;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};

fn create_columns(rows: usize) -> Vec<Column> {
    let names = ["season", "week", "poll", "school", "rank", "points", "mascot"];
    names
        .iter()
        .enumerate()
        .map(|(i, name)| Column {
            name: name.to_string(),
            // Every other column is short so null-filling is exercised
            values: (0..rows - (i % 2) * rows / 4)
                .map(|r| json!(r as i64 * 7 + i as i64))
                .collect(),
        })
        .collect()
}

fn create_rankings(weeks: usize) -> Vec<Value> {
    (0..weeks)
        .map(|week| {
            let ranks: Vec<Value> = (1..=25)
                .map(|rank| {
                    json!({
                        "rank": rank,
                        "school": format!("School {rank}"),
                        "conference": "SEC",
                        "firstPlaceVotes": 0,
                        "points": 1600 - rank * 50,
                    })
                })
                .collect();
            json!({
                "season": 2024,
                "seasonType": "regular",
                "week": week + 1,
                "polls": [
                    {"poll": "AP Top 25", "ranks": ranks.clone()},
                    {"poll": "Coaches Poll", "ranks": ranks},
                ],
            })
        })
        .collect()
}

fn benchmark_reconstruct(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruct_rows");

    for rows in [100, 1_000, 10_000] {
        let columns = create_columns(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &columns, |b, columns| {
            b.iter(|| black_box(reconstruct_rows(black_box(columns))));
        });
    }

    group.finish();
}

fn benchmark_decode_payload(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_payload");

    let bytes = serde_json::to_vec(&json!({"columns": create_columns(10_000)})).unwrap();
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("10k_rows", |b| {
        b.iter(|| black_box(decode_payload(black_box(&bytes)).unwrap()));
    });

    group.finish();
}

fn benchmark_flatten(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("flatten_all");
    let seasons = create_rankings(16);
    group.throughput(Throughput::Elements((16 * 2 * 25) as u64));

    group.bench_function("16_weeks", |b| {
        b.to_async(&rt).iter_batched(
            || seasons.clone(),
            |seasons| async move {
                black_box(flatten_all(seasons).await.unwrap());
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_reconstruct,
    benchmark_decode_payload,
    benchmark_flatten,
);

criterion_main!(benches);
