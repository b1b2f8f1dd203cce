use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use slice_scheduler::batch::run_batch;
use slice_scheduler::packet::PacketRef;
use slice_scheduler::scheduler::ready_queue::{ReadyEntry, ReadyQueue};
use slice_scheduler::{evaluate, Scenario, Scheduler, SchedulerConfig, SliceSpec};

/// Synthetic load: `slices` slices with staggered deadlines, each sending `packets` packets of
/// varying size on a fixed inter-arrival time.
fn synthetic_scenario(slices: usize, packets: usize) -> Scenario {
    let slices = (0..slices)
        .map(|slice| SliceSpec {
            bandwidth_gbps: 0.5 + slice as f64 * 0.25,
            max_delay_ns: 2_000 + slice as u64 * 1_500,
            packets: (0..packets)
                .map(|i| {
                    let arrival = (i as u64) * 400 + slice as u64 * 37;
                    let size = 1_000 + ((i * 7919 + slice * 104_729) % 8_000) as u64;
                    (arrival, size)
                })
                .collect(),
        })
        .collect();
    Scenario {
        port_bandwidth_gbps: 40.0,
        slices,
    }
}

fn bench_scheduler(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler");
    let config = SchedulerConfig::default();

    for &(slices, packets) in &[(4, 250), (16, 250), (64, 100)] {
        let scenario = synthetic_scenario(slices, packets);
        group.bench_with_input(
            BenchmarkId::new("run", format!("{slices}x{packets}")),
            &scenario,
            |b, scenario| {
                b.iter(|| {
                    let scheduler = Scheduler::from_scenario(black_box(scenario), &config).unwrap();
                    black_box(scheduler.run());
                });
            },
        );
    }

    group.bench_function("evaluate_16x250", |b| {
        let scenario = synthetic_scenario(16, 250);
        b.iter(|| {
            black_box(evaluate(black_box(&scenario), &config).unwrap());
        });
    });
    group.finish();
}

fn bench_ready_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("ready_queue");

    group.bench_function("push_pop_1000", |b| {
        let entries: Vec<ReadyEntry> = (0..1000)
            .map(|i| ReadyEntry {
                priority: ((i * 31) % 97) as f64 / 10.0,
                arrival_time: (i % 50) as u64,
                id: PacketRef {
                    slice: i % 8,
                    packet: i,
                },
            })
            .collect();

        b.iter(|| {
            let mut queue = ReadyQueue::new();
            queue.extend(entries.iter().copied());
            while let Some(entry) = queue.pop() {
                black_box(entry);
            }
        });
    });
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    group.sample_size(20);
    let config = SchedulerConfig::default();
    let scenarios: Vec<Scenario> = (0..8).map(|i| synthetic_scenario(8 + i, 200)).collect();

    for workers in [1, 4] {
        group.bench_with_input(BenchmarkId::new("workers", workers), &workers, |b, &workers| {
            b.iter(|| black_box(run_batch(scenarios.clone(), &config, workers).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_scheduler, bench_ready_queue, bench_batch);
criterion_main!(benches);
