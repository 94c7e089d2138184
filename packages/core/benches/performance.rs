//! Performance benchmarks for RuleGraph core operations
//!
//! Run with: `cargo bench -p rulegraph-core`
//!
//! These benchmarks measure critical path performance:
//! - Linking through the relationship engine (in-memory and JSON directory)
//! - Cascade delete, which scans every node for references
//! - Store → canvas conversion and re-application of a canvas

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rulegraph_core::config::{GraphConfig, LayoutConfig};
use rulegraph_core::models::{NodeKind, PayloadMap};
use rulegraph_core::services::{CanonicalConverter, NodeStore, RelationshipEngine};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

/// Build `listeners` neighborhoods of one condition and three events each
fn populate(engine: &RelationshipEngine, listeners: usize) -> Vec<String> {
    let store = engine.store();
    let mut listener_ids = Vec::with_capacity(listeners);

    for i in 0..listeners {
        let payload = |value: serde_json::Value| -> PayloadMap {
            value.as_object().cloned().unwrap()
        };
        let condition = store
            .create(NodeKind::Condition, payload(json!({"name": format!("c{}", i), "threshold": 0.5})))
            .unwrap();
        let listener = store
            .create(NodeKind::Listener, payload(json!({"name": format!("l{}", i), "type": "object"})))
            .unwrap();
        engine.link(&condition, &listener).unwrap();

        for j in 0..3 {
            let event = store
                .create(NodeKind::Event, payload(json!({"action": format!("e{}-{}", i, j)})))
                .unwrap();
            engine.link(&listener, &event).unwrap();
        }
        listener_ids.push(listener);
    }

    listener_ids
}

fn in_memory_engine() -> RelationshipEngine {
    RelationshipEngine::new(Arc::new(NodeStore::in_memory()))
}

fn bench_link(c: &mut Criterion) {
    c.bench_function("link_listener_to_event_in_memory", |b| {
        let engine = in_memory_engine();
        let listener = engine.store().create(NodeKind::Listener, PayloadMap::new()).unwrap();
        b.iter(|| {
            let event = engine.store().create(NodeKind::Event, PayloadMap::new()).unwrap();
            black_box(engine.link(&listener, &event).unwrap());
        });
    });

    c.bench_function("link_listener_to_event_json_dir", |b| {
        let temp_dir = TempDir::new().unwrap();
        let config = GraphConfig::with_data_dir(temp_dir.path());
        let store = Arc::new(NodeStore::open_dir(temp_dir.path().join("nodes"), &config).unwrap());
        let engine = RelationshipEngine::new(store);
        let listener = engine.store().create(NodeKind::Listener, PayloadMap::new()).unwrap();
        b.iter(|| {
            let event = engine.store().create(NodeKind::Event, PayloadMap::new()).unwrap();
            black_box(engine.link(&listener, &event).unwrap());
        });
    });
}

fn bench_cascade_delete(c: &mut Criterion) {
    c.bench_function("delete_listener_among_500_nodes", |b| {
        b.iter_batched(
            || {
                let engine = in_memory_engine();
                let listeners = populate(&engine, 100);
                (engine, listeners)
            },
            |(engine, listeners)| {
                black_box(engine.store().delete(&listeners[50]).unwrap());
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_canvas(c: &mut Criterion) {
    let engine = in_memory_engine();
    populate(&engine, 100);
    let converter = CanonicalConverter::new(engine, LayoutConfig::default());

    c.bench_function("to_visual_100_listeners", |b| {
        b.iter(|| black_box(converter.to_visual().unwrap()));
    });

    let canvas = converter.to_visual().unwrap();
    c.bench_function("from_visual_100_listeners", |b| {
        b.iter(|| black_box(converter.from_visual(&canvas).unwrap()));
    });
}

criterion_group!(benches, bench_link, bench_cascade_delete, bench_canvas);
criterion_main!(benches);
