//! # Token Ledger Benchmarks
//!
//! Hot paths of the engine:
//!
//! | Path | What is measured |
//! |------|------------------|
//! | `can_transfer` | Read-locked validation, no hooks installed |
//! | `transfer` | Validation, write locks, event emission |
//! | `repartition` | Two-book ordered locking |
//! | `balance_of` | Consistent snapshot across all books |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shared_types::{Identity, PartitionId, Role};
use std::sync::Arc;
use std::time::Duration;
use token_engine::{
    repartition_data, AtomicLogicalClock, EventSink, NullEventSink, PartitionSeed, TokenApi,
    TokenConfig, TokenEngine,
};

const ADMIN: Identity = Identity::new([0xAD; 20]);
const ALICE: Identity = Identity::new([0xA1; 20]);
const BOB: Identity = Identity::new([0xB0; 20]);

fn partition(i: usize) -> PartitionId {
    PartitionId::from_label(&format!("tranche-{i}"))
}

/// Engine with `partitions` books, Alice funded with a large balance in each.
fn engine(partitions: usize) -> TokenEngine {
    let config = TokenConfig {
        partitions: (0..partitions)
            .map(|i| PartitionSeed {
                id: partition(i),
                cap: Some(u64::MAX as u128),
            })
            .collect(),
        ..TokenConfig::with_admin(ADMIN)
    };
    let sink: Arc<dyn EventSink> = Arc::new(NullEventSink);
    let engine = match TokenEngine::bootstrap(&config, Arc::new(AtomicLogicalClock::new()), sink) {
        Ok(engine) => engine,
        Err(e) => panic!("bootstrap failed: {e}"),
    };
    engine.add_role(ADMIN, Role::Minter, ADMIN).unwrap();
    for i in 0..partitions {
        engine
            .issue_by_partition(ADMIN, partition(i), ALICE, u32::MAX as u128, &[])
            .unwrap();
    }
    engine
}

fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation");
    group.measurement_time(Duration::from_secs(5));
    let engine = engine(1);
    let p = partition(0);

    group.bench_function("can_transfer_success", |b| {
        b.iter(|| black_box(engine.can_transfer_by_partition(ALICE, p, BOB, 1, &[])))
    });
    group.bench_function("can_transfer_insufficient", |b| {
        b.iter(|| black_box(engine.can_transfer_by_partition(BOB, p, ALICE, 1, &[])))
    });

    group.finish();
}

fn bench_transfers(c: &mut Criterion) {
    let mut group = c.benchmark_group("transfers");
    group.measurement_time(Duration::from_secs(5));
    let engine = engine(2);
    let (source, target) = (partition(0), partition(1));
    let to_target = repartition_data(target);

    group.throughput(Throughput::Elements(1));
    group.bench_function("transfer", |b| {
        b.iter(|| {
            black_box(
                engine
                    .transfer_by_partition(ALICE, source, BOB, 1, &[])
                    .is_ok(),
            )
        })
    });
    group.bench_function("repartition", |b| {
        b.iter(|| {
            black_box(
                engine
                    .transfer_by_partition(ALICE, source, ALICE, 1, &to_target)
                    .is_ok(),
            )
        })
    });

    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");

    for partitions in [1usize, 16, 128] {
        let engine = engine(partitions);
        group.bench_with_input(
            BenchmarkId::new("balance_of", partitions),
            &engine,
            |b, engine| b.iter(|| black_box(engine.balance_of(ALICE))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_validation, bench_transfers, bench_queries);
criterion_main!(benches);
