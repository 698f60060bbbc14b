//! Benchmarks for overlay folding and transform stepping.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

use keel_core::component::OverlayValueStorage;
use keel_core::event::ObservableValue;
use keel_core::host::Heartbeat;
use keel_core::key::Key;
use keel_core::transform::{transforms, Node, TransformProps, TransformService};

fn bench_overlay(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlay");

    for effects in [4_i64, 32, 256] {
        group.bench_with_input(BenchmarkId::new("and_update", effects), &effects, |b, &effects| {
            let storage = OverlayValueStorage::new(true);
            for index in 0..effects {
                storage.and(Key::from(format!("slot{index}")).at(effects - index), Some(true));
            }

            let mut flip = false;
            b.iter(|| {
                flip = !flip;
                storage.and("toggle", Some(flip));
                black_box(storage.get())
            });
        });

        group.bench_with_input(
            BenchmarkId::new("observable_fanout", effects),
            &effects,
            |b, &effects| {
                let upstream = ObservableValue::new(0_i64);
                let storages: Vec<OverlayValueStorage<i64>> = (0..effects)
                    .map(|index| {
                        let storage = OverlayValueStorage::new(0);
                        storage.overlay("upstream", upstream.clone());
                        storage.effect(Key::from("offset").at(1), move |value| value + index);
                        storage
                    })
                    .collect();

                let mut value = 0;
                b.iter(|| {
                    value += 1;
                    upstream.set(value);
                    black_box(storages.len())
                });
            },
        );
    }

    group.finish();
}

fn bench_transforms(c: &mut Criterion) {
    c.bench_function("transforms/tick_64_tweens", |b| {
        b.iter_batched(
            || {
                let heartbeat = Heartbeat::new();
                let service = TransformService::new(heartbeat.clone());
                for index in 0..64 {
                    let node = Node::gui().into_ref();
                    transforms::create()
                        .fade_out(&node, TransformProps::QUAD_OUT_02.with_duration(10.0))
                        .run(&service, format!("node{index}"), false);
                }
                (heartbeat, service)
            },
            |(heartbeat, service)| {
                for _ in 0..16 {
                    heartbeat.tick(1.0 / 60.0);
                }
                black_box(service.running_count())
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_overlay, bench_transforms);
criterion_main!(benches);
