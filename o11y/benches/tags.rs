use criterion::{black_box, criterion_group, criterion_main, Criterion};
use o11y::tags::{map_to_tags, to_tag};
use o11y::Value;

// Run this benchmark with:
// cargo bench --bench tags

fn criterion_benchmark(c: &mut Criterion) {
    map_small_record(c);
    truncate_long_string(c);
    summarize_long_array(c);
}

fn map_small_record(c: &mut Criterion) {
    c.bench_function("map_small_record", |b| {
        b.iter(|| {
            map_to_tags(black_box([
                ("http.method", Value::from("GET")),
                ("http.status_code", Value::from(200)),
                ("retry", Value::from(false)),
                ("user", Value::Null),
            ]))
        })
    });
}

fn truncate_long_string(c: &mut Criterion) {
    let value = Value::from("x".repeat(512));
    c.bench_function("truncate_long_string", |b| {
        b.iter(|| to_tag(black_box(&value)))
    });
}

fn summarize_long_array(c: &mut Criterion) {
    let value = Value::Array((0..100).map(Value::from).collect());
    c.bench_function("summarize_long_array", |b| {
        b.iter(|| to_tag(black_box(&value)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
