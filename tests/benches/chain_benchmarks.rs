//! # Delegate-Chain Benchmarks
//!
//! | Group | Measures |
//! |-------|----------|
//! | dc-01 Producer Schedule | scheduled producer lookup |
//! | dc-02 Header State | next header state plus signature |
//! | dc-04 Block Scheduler | partitioning a full queue |
//! | dc-05 Controller | producing a block of transfers |
//! | shared-crypto | Merkle roots |

#![allow(clippy::excessive_nesting)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dc_01_producer_schedule::ProducerRotation;
use dc_02_block_header_state::BlockHeaderState;
use dc_04_block_scheduler::{BlockScheduler, PendingTransaction, SchedulerConfig, SchedulingAlgorithm};
use dc_05_controller::{ChainConfig, GenesisConfig};
use dc_tests::fixtures::{account, transfer, TestNet};
use rand::Rng;
use shared_crypto::{merkle_root, sha256, IncrementalMerkle};
use shared_types::BlockTimestamp;
use std::sync::Arc;
use std::time::Duration;

fn random_transfers(count: usize, accounts: u8) -> Vec<PendingTransaction> {
    let mut rng = rand::thread_rng();
    (0..count as u64)
        .map(|nonce| {
            let from = account(rng.gen_range(0..accounts));
            PendingTransaction::new(Arc::new(transfer(from, nonce)))
        })
        .collect()
}

// ============================================================================
// dc-01: Producer Schedule
// ============================================================================

fn bench_scheduled_producer(c: &mut Criterion) {
    let mut group = c.benchmark_group("dc-01-producer-schedule");
    let genesis = GenesisConfig::devnet(21, "bench").build().expect("genesis");
    let rotation = ProducerRotation::default();
    let mut slot = 0u32;

    group.bench_function("get_scheduled_producer", |b| {
        b.iter(|| {
            slot = slot.wrapping_add(1);
            let t = BlockTimestamp::from_slot(slot);
            black_box(rotation.get_scheduled_producer(&genesis.initial_schedule, t).is_ok())
        })
    });

    group.finish();
}

// ============================================================================
// dc-02: Block Header State
// ============================================================================

fn bench_header_state_transition(c: &mut Criterion) {
    let mut group = c.benchmark_group("dc-02-header-state");
    group.measurement_time(Duration::from_secs(10));

    let config = GenesisConfig::devnet(21, "bench");
    let genesis = config.build().expect("genesis");
    let root = BlockHeaderState::genesis(
        ChainConfig::default().consensus_params(),
        genesis.initial_schedule.clone(),
        genesis.initial_timestamp,
        genesis.chain_id,
    )
    .expect("genesis header state");

    let keys: Vec<_> = genesis
        .initial_schedule
        .producers
        .iter()
        .map(|p| (p.producer_name, config.producer_private_key(p.producer_name).expect("key")))
        .collect();

    group.bench_function("generate_next", |b| {
        b.iter(|| black_box(root.generate_next(None).is_ok()))
    });

    group.bench_function("generate_next_and_sign", |b| {
        b.iter(|| {
            let mut next = root.generate_next(None).expect("next");
            let producer = next.producer();
            if let Some((_, key)) = keys.iter().find(|(name, _)| *name == producer) {
                next.sign_with_key(key).expect("sign");
            }
            black_box(next.id)
        })
    });

    group.finish();
}

// ============================================================================
// dc-04: Block Scheduler
// ============================================================================

fn bench_block_scheduler(c: &mut Criterion) {
    let mut group = c.benchmark_group("dc-04-block-scheduler");
    group.measurement_time(Duration::from_secs(10));

    let algorithms = [
        ("threading", SchedulingAlgorithm::ByThreadingConflicts),
        ("cycling", SchedulingAlgorithm::ByCyclingConflicts),
        ("single_thread", SchedulingAlgorithm::InSingleThread),
    ];

    for size in [100usize, 1000] {
        let batch = random_transfers(size, 26);
        group.throughput(Throughput::Elements(size as u64));

        for (label, algorithm) in algorithms {
            let scheduler = BlockScheduler::new(SchedulerConfig {
                algorithm,
                ..SchedulerConfig::default()
            })
            .expect("scheduler");

            group.bench_with_input(BenchmarkId::new(label, size), &batch, |b, batch| {
                b.iter(|| black_box(scheduler.schedule(batch.clone()).cycles.len()))
            });
        }
    }

    group.finish();
}

// ============================================================================
// dc-05: Controller
// ============================================================================

fn bench_block_production(c: &mut Criterion) {
    let mut group = c.benchmark_group("dc-05-controller");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    for size in [10u64, 100] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("produce_block", size), &size, |b, &size| {
            let net = TestNet::new(1);
            let mut node = net.open_node();
            let mut nonce = 0u64;
            b.iter(|| {
                for _ in 0..size {
                    nonce += 1;
                    let from = account((nonce % 26) as u8);
                    let _ = node.controller.push_transaction(transfer(from, nonce));
                }
                black_box(net.produce(&mut node).block_num())
            })
        });
    }

    group.finish();
}

// ============================================================================
// shared-crypto: Merkle
// ============================================================================

fn bench_merkle(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared-crypto-merkle");

    for size in [16usize, 256, 4096] {
        let mut rng = rand::thread_rng();
        let leaves: Vec<_> = (0..size)
            .map(|_| sha256(rng.gen::<[u8; 32]>()))
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("merkle_root", size), &leaves, |b, leaves| {
            b.iter(|| black_box(merkle_root(leaves.clone())))
        });
        group.bench_with_input(BenchmarkId::new("incremental_append", size), &leaves, |b, leaves| {
            b.iter(|| {
                let mut tree = IncrementalMerkle::new();
                for leaf in leaves {
                    tree.append(*leaf);
                }
                black_box(tree.root())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_scheduled_producer,
    bench_header_state_transition,
    bench_block_scheduler,
    bench_block_production,
    bench_merkle,
);
criterion_main!(benches);
