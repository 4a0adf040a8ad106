//! # Transaction Hub Benchmarks
//!
//! | Path | Cost driver |
//! |------|-------------|
//! | `classify` | per-transaction, pure |
//! | `reclassify_all` | every best-chain change, O(pool) |
//! | `evict_expired` | every irreversible block, O(evicted) |
//! | `submit` | batched prefix lookup plus one persist per transaction |

#![allow(clippy::excessive_nesting)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared_types::{ref_block_prefix, RefBlockPrefix, Transaction};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tx_hub::{
    classify, InMemoryChainView, InMemoryTransactionStore, NoOpPublisher, PoolState,
    RefBlockStatus, TransactionReceipt, TxHub, TxHubApi, TxHubConfig,
};

const WINDOW: u64 = 64;

fn random_tx(rng: &mut StdRng, ref_block_number: u64, prefix: RefBlockPrefix) -> Transaction {
    Transaction {
        from: rng.gen(),
        to: rng.gen(),
        method_name: "Transfer".to_string(),
        params: rng.gen::<[u8; 16]>().to_vec(),
        ref_block_number,
        ref_block_prefix: prefix,
        signature: [0u8; 64],
    }
}

/// A pool of `size` receipts referencing heights 1..=128, plus the canonical
/// prefix at each height.
fn build_pool(size: usize) -> (PoolState, HashMap<u64, Option<RefBlockPrefix>>) {
    let mut rng = StdRng::seed_from_u64(42);
    let prefixes: HashMap<u64, Option<RefBlockPrefix>> =
        (1..=128).map(|h| (h, Some(rng.gen()))).collect();
    let mut pool = PoolState::new();
    for _ in 0..size {
        let height = rng.gen_range(1..=128);
        let prefix = match rng.gen_bool(0.8) {
            true => prefixes[&height].unwrap_or_default(),
            false => rng.gen(),
        };
        let mut receipt = TransactionReceipt::new(random_tx(&mut rng, height, prefix));
        receipt.ref_block_status = RefBlockStatus::Valid;
        pool.insert(receipt);
    }
    (pool, prefixes)
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("tx-hub-classify");
    let prefix = [1, 2, 3, 4];

    group.bench_function("valid", |b| {
        b.iter(|| classify(black_box(100), prefix, Some(prefix), black_box(120), WINDOW))
    });
    group.bench_function("expired", |b| {
        b.iter(|| classify(black_box(100), prefix, Some(prefix), black_box(200), WINDOW))
    });

    group.finish();
}

fn bench_reclassify_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("tx-hub-reclassify");
    group.measurement_time(Duration::from_secs(10));

    for size in [1_000, 10_000] {
        let (mut pool, prefixes) = build_pool(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("reclassify_all", size), &size, |b, _| {
            let mut best_height = 128;
            b.iter(|| {
                // Alternate heights so statuses keep moving.
                best_height = if best_height == 128 { 160 } else { 128 };
                let summary = pool.reclassify_all(|receipt| {
                    let canonical = prefixes
                        .get(&receipt.ref_block_number())
                        .copied()
                        .flatten();
                    classify(
                        receipt.ref_block_number(),
                        receipt.ref_block_prefix(),
                        canonical,
                        best_height,
                        WINDOW,
                    )
                });
                black_box(summary)
            })
        });
    }

    group.finish();
}

fn bench_evict_expired(c: &mut Criterion) {
    let mut group = c.benchmark_group("tx-hub-evict");

    group.bench_function("evict_half_of_10k", |b| {
        b.iter_batched(
            || {
                let (mut pool, prefixes) = build_pool(10_000);
                pool.reclassify_all(|receipt| {
                    classify(
                        receipt.ref_block_number(),
                        receipt.ref_block_prefix(),
                        prefixes[&receipt.ref_block_number()],
                        160,
                        WINDOW,
                    )
                });
                pool
            },
            |mut pool| black_box(pool.evict_expired_at_or_below(64).len()),
            criterion::BatchSize::LargeInput,
        )
    });

    group.finish();
}

fn bench_submit(c: &mut Criterion) {
    let mut group = c.benchmark_group("tx-hub-submit");
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let config = TxHubConfig::for_testing().with_expiry_window(WINDOW);

    for batch in [10, 100] {
        group.throughput(Throughput::Elements(batch as u64));
        group.bench_with_input(BenchmarkId::new("batch", batch), &batch, |b, &batch| {
            let mut rng = StdRng::seed_from_u64(batch as u64);
            b.iter_batched(
                || {
                    let view = Arc::new(InMemoryChainView::new(config.chain_id));
                    let chain = view.append_chain([0u8; 32], 32, 0);
                    let head = view.set_best_head(chain[31]).unwrap();
                    let hub = TxHub::new(
                        config.clone(),
                        Arc::clone(&view),
                        Arc::new(InMemoryTransactionStore::new()),
                        Arc::new(NoOpPublisher),
                    )
                    .unwrap();
                    runtime
                        .block_on(hub.handle_best_chain_found(config.chain_id, head.hash, head.height))
                        .unwrap();
                    let txs: Vec<_> = (0..batch)
                        .map(|_| {
                            let height = rng.gen_range(1..=32u64);
                            let prefix = ref_block_prefix(&chain[height as usize - 1]);
                            random_tx(&mut rng, height, prefix)
                        })
                        .collect();
                    (hub, txs)
                },
                |(hub, txs)| {
                    runtime
                        .block_on(hub.handle_transactions_received(config.chain_id, txs))
                        .unwrap();
                    black_box(hub.get_validated_transaction_count())
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_classify,
    bench_reclassify_all,
    bench_evict_expired,
    bench_submit
);
criterion_main!(benches);
