//! Performance benchmarks for a3s-output
//!
//! Run with: cargo bench

use a3s_output::{
    resolve_subject, Event, JsonCodec, MemoryConnector, Output, OutputClient, PayloadCodec,
    Priority, DEFAULT_SUBJECT_TEMPLATE,
};
use criterion::{criterion_group, criterion_main, Criterion};

fn alert() -> Event {
    Event::new(
        Priority::Critical,
        "Terminal shell in container",
        "A shell was spawned in a container with an attached terminal",
    )
    .with_field("container.id", serde_json::json!("3ad9a8b1c2d4"))
    .with_field("proc.cmdline", serde_json::json!("bash -i"))
    .with_field("user.name", serde_json::json!("root"))
    .with_tag("container")
    .with_tag("shell")
}

fn bench_subject_resolution(c: &mut Criterion) {
    let event = alert();

    c.bench_function("resolve_subject default", |b| {
        b.iter(|| resolve_subject(DEFAULT_SUBJECT_TEMPLATE, &event));
    });

    c.bench_function("resolve_subject custom", |b| {
        b.iter(|| resolve_subject("security.<priority>.<rule>.<priority>", &event));
    });
}

fn bench_encoding(c: &mut Criterion) {
    let event = alert();

    c.bench_function("JsonCodec encode", |b| {
        b.iter(|| JsonCodec.encode(&event).unwrap());
    });
}

fn bench_memory_publish(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let output = OutputClient::builder("memory", "memory://bench", MemoryConnector::new()).build();
    let event = alert();

    c.bench_function("OutputClient publish (memory)", |b| {
        b.to_async(&rt).iter(|| async {
            output.publish(&event).await;
        });
    });
}

criterion_group!(
    benches,
    bench_subject_resolution,
    bench_encoding,
    bench_memory_publish
);
criterion_main!(benches);
