//! # WS-Eventing Delivery Benchmarks
//!
//! | Path | Claim | Target |
//! |------|-------|--------|
//! | Filter parsing | Linear in filter length | < 50µs for 100 actions |
//! | Topic lookup | Independent of unrelated subscriptions | < 10µs |
//! | Subscribe + Unsubscribe | Full sink ↔ source round trip | < 1ms |

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use wse_01_event_source::service::validation::parse_action_filter;
use wse_01_event_source::{EventSource, EventSourceConfig};
use wse_02_event_sink::{EventSink, EventSinkConfig, NotificationCallback};
use wse_transport::InMemoryTransport;
use wse_types::Filter;

struct Discard;

#[async_trait]
impl NotificationCallback for Discard {
    async fn on_notification(&self, _: &str, _: &str, _: serde_json::Value) {}
}

fn action(i: usize) -> String {
    format!("http://example.org/bench/Event{i}")
}

fn setup() -> (Arc<EventSource>, Arc<EventSink>) {
    let transport = Arc::new(InMemoryTransport::new());
    let source = EventSource::new(EventSourceConfig::default(), transport.clone()).unwrap();
    source.bind().unwrap();
    let sink = EventSink::new(transport, EventSinkConfig::default()).unwrap();
    (source, sink)
}

// ============================================================================
// Filter parsing
// ============================================================================

fn bench_parse_action_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter-parsing");
    let offered = BTreeSet::new();

    for size in [1usize, 10, 100] {
        let filter = Filter::actions((0..size).map(action));
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("parse_action_filter", size), &filter, |b, filter| {
            b.iter(|| black_box(parse_action_filter(Some(filter), &offered).unwrap()))
        });
    }
    group.finish();
}

// ============================================================================
// Topic index
// ============================================================================

fn bench_subscribers_of(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("topic-index");

    for subscriptions in [10usize, 100, 1000] {
        let (source, sink) = setup();
        rt.block_on(async {
            for i in 0..subscriptions {
                sink.subscribe_actions(&source.address(), [action(i % 10)], None, Arc::new(Discard))
                    .await
                    .unwrap();
            }
        });

        let target = action(0);
        group.bench_with_input(
            BenchmarkId::new("subscribers_of", subscriptions),
            &subscriptions,
            |b, _| b.iter(|| black_box(source.registry().subscribers_of(&target).len())),
        );
    }
    group.finish();
}

// ============================================================================
// Round trip
// ============================================================================

fn bench_subscribe_unsubscribe(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("round-trip");
    group.measurement_time(Duration::from_secs(5));

    let (source, sink) = setup();
    let address = source.address();
    let target = action(0);

    group.bench_function("subscribe_unsubscribe", |b| {
        b.to_async(&rt).iter(|| async {
            let (id, _) = sink
                .subscribe_actions(&address, [target.as_str()], None, Arc::new(Discard))
                .await
                .unwrap();
            sink.unsubscribe(&id).await.unwrap();
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_parse_action_filter,
    bench_subscribers_of,
    bench_subscribe_unsubscribe
);
criterion_main!(benches);
