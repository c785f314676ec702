//! Benchmarks for filter parsing and SQL binding.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use serde::Deserialize;
use strata::query::{
    Condition, DatabaseType, Filter, IntCondition, NamedParams, StringCondition, Where, and,
    bind_named, rebind, where_clause,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct VideoFilter {
    id: IntCondition,
    title: StringCondition,
    owner: StringCondition,
}

impl Filter for VideoFilter {
    fn parse(&self, params: &mut NamedParams) -> String {
        and([
            self.id.parse(params, "video.id"),
            self.title.parse(params, "video.title"),
            self.owner.parse(params, "video.owner"),
        ])
    }
}

fn request_filter() -> Where<VideoFilter> {
    serde_json::from_str(
        r#"{
            "condition": "OR",
            "filters": [
                {"id": {"gt": 10, "lte": 500}},
                {"title": {"contains": "intro", "ne": "draft"}},
                {"owner": {"in": ["ada", "grace", "ken"]}}
            ]
        }"#,
    )
    .unwrap()
}

fn wide_filter(count: usize) -> Where<VideoFilter> {
    Where::any((0..count).map(|i| VideoFilter {
        id: serde_json::from_value(serde_json::json!({ "eq": i as i64 + 1 })).unwrap(),
        ..VideoFilter::default()
    }))
}

fn bench_filter_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_parse");

    let filter = request_filter();
    group.bench_function("request_body", |b| {
        b.iter(|| {
            let mut params = NamedParams::new();
            black_box(filter.parse(&mut params))
        })
    });

    group.bench_function("deserialize_and_parse", |b| {
        b.iter(|| {
            let filter = request_filter();
            let mut params = NamedParams::new();
            black_box(where_clause(filter.parse(&mut params)))
        })
    });

    for size in [5usize, 20, 100] {
        let filter = wide_filter(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("or_width", size), &filter, |b, filter| {
            b.iter(|| {
                let mut params = NamedParams::new();
                black_box(filter.parse(&mut params))
            })
        });
    }

    group.finish();
}

fn bench_binding(c: &mut Criterion) {
    let mut group = c.benchmark_group("binding");

    let filter = request_filter();
    let mut params = NamedParams::new();
    let sql = format!(
        "SELECT id, title FROM video {}",
        where_clause(filter.parse(&mut params))
    );

    group.bench_function("bind_named", |b| {
        b.iter(|| black_box(bind_named(&sql, &params)))
    });

    let (positional, _) = bind_named(&sql, &params);
    group.bench_function("rebind_postgres", |b| {
        b.iter(|| black_box(rebind(&positional, DatabaseType::PostgreSQL)))
    });
    group.bench_function("rebind_sqlite", |b| {
        b.iter(|| black_box(rebind(&positional, DatabaseType::SQLite)))
    });

    for size in [10usize, 100, 1000] {
        let ids: Vec<i64> = (0..size as i64).collect();
        let params = NamedParams::new().with("ids", ids);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("expand_list", size), &params, |b, params| {
            b.iter(|| black_box(bind_named("SELECT id FROM video WHERE id IN (:ids)", params)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_filter_parse, bench_binding);
criterion_main!(benches);
