//! Transition throughput benchmarks.
//!
//! Measures one full `set_state` + `post_loading_complete` cycle with a
//! loading screen, with and without lifecycle mirroring on the bus, and with
//! a growing number of bus subscribers.
//!
//! Run with: `cargo bench --bench transition_benchmarks`

use std::rc::Rc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use stagehand_bus::prelude::*;
use stagehand_state::prelude::*;
use stagehand_state::signal::{END, POST_END, PRE_START, START};

struct Plain;
impl State for Plain {}

fn setup(config: StateManagerConfig, subscribers: usize) -> (StateManager, StateHandle, StateHandle) {
    let bus = Rc::new(LocalBus::new());
    for i in 0..subscribers {
        let topic = [PRE_START, START, END, POST_END][i % 4].clone();
        bus.subscribe(Subscription::new(topic, |n| {
            black_box(n);
        }));
    }
    let manager = StateManager::with_config(bus, config);
    manager
        .set_loading_state(Some(StateHandle::new("loading", Plain)))
        .expect("manager starts idle");
    (manager, StateHandle::new("menu", Plain), StateHandle::new("level", Plain))
}

fn bench_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("transition_cycle");

    for (label, publish) in [("mirrored", true), ("hooks_only", false)] {
        let (manager, menu, level) = setup(
            StateManagerConfig {
                publish_lifecycle_signals: publish,
            },
            0,
        );
        group.bench_function(label, |b| {
            let mut flip = false;
            b.iter(|| {
                let target = if flip { menu.clone() } else { level.clone() };
                flip = !flip;
                manager.set_state(Some(target)).expect("idle");
                manager.post_loading_complete().expect("loading");
            });
        });
    }

    group.finish();
}

fn bench_subscribers(c: &mut Criterion) {
    let mut group = c.benchmark_group("transition_cycle_subscribers");

    for subscribers in [1usize, 16, 128] {
        let (manager, menu, level) = setup(StateManagerConfig::default(), subscribers);
        group.bench_with_input(
            BenchmarkId::from_parameter(subscribers),
            &subscribers,
            |b, _| {
                let mut flip = false;
                b.iter(|| {
                    let target = if flip { menu.clone() } else { level.clone() };
                    flip = !flip;
                    manager.set_state(Some(target)).expect("idle");
                    manager.post_loading_complete().expect("loading");
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_cycle, bench_subscribers);
criterion_main!(benches);
