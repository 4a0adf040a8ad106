//! # Bus-Driven Hub Flows
//!
//! Each test starts a `TestNode`, publishes chain events on the bus and
//! observes the hub through its query surface and its `TransactionAccepted`
//! output.
//!
//! The event loop handles events one at a time in arrival order, so waiting
//! for a later `BestChainFound` to take effect also proves every earlier
//! event has been handled.

use crate::fixtures::{create_tx, wait_until, TestNode};
use shared_bus::{ChainEvent, EventFilter, EventTopic, Subscription};
use shared_types::{ref_block_prefix, Hash, Transaction};
use std::sync::Arc;
use tx_hub::{RefBlockStatus, TxHubApi, TxHubConfig};

const ZERO: Hash = [0u8; 32];

fn accepted_subscription(node: &TestNode) -> Subscription {
    node.bus
        .subscribe(EventFilter::topics(vec![EventTopic::TransactionPool]))
}

fn drain_accepted(subscription: &mut Subscription) -> Vec<Transaction> {
    let mut accepted = Vec::new();
    while let Ok(Some(event)) = subscription.try_recv() {
        if let ChainEvent::TransactionAccepted { transaction, .. } = event {
            accepted.push(transaction);
        }
    }
    accepted
}

fn status_of(node: &TestNode, tx: &Transaction) -> Option<RefBlockStatus> {
    node.hub
        .get_transaction_receipt(&tx.hash())
        .map(|r| r.ref_block_status)
}

async fn wait_for_status(node: &TestNode, tx: &Transaction, status: RefBlockStatus) {
    let hub = Arc::clone(&node.hub);
    let id = tx.hash();
    wait_until(move || {
        hub.get_transaction_receipt(&id)
            .is_some_and(|r| r.ref_block_status == status)
    })
    .await;
}

async fn wait_for_count(node: &TestNode, count: usize) {
    let hub = Arc::clone(&node.hub);
    wait_until(move || hub.get_all_transaction_count() == count).await;
}

/// Extends the best chain by one block. Once the hub has adopted it,
/// everything published before it has been handled too.
async fn barrier(node: &TestNode, salt: u64) -> Hash {
    let tip = node.view.best_head().hash;
    node.extend_best_chain(tip, 1, salt).await[0]
}

// =============================================================================
// Lifecycle
// =============================================================================

/// Window 5: a transaction referencing block 10 is future at height 9,
/// valid at 10, expired at 15 and evicted once block 12 is irreversible.
#[tokio::test]
async fn test_reference_block_lifecycle() {
    let node = TestNode::start(TxHubConfig::for_testing());
    let chain = node.extend_best_chain(ZERO, 9, 0).await;
    assert_eq!(node.hub.best_chain().height, 9);

    // Block 10 exists in the tree but is not on the best chain yet.
    let block_10 = node.view.append_block(chain[8], Vec::new(), 0);
    let tx = create_tx(1, 10, ref_block_prefix(&block_10.hash()));

    node.submit(vec![tx.clone()]).await;
    wait_for_status(&node, &tx, RefBlockStatus::FutureRefBlock).await;

    let head_10 = node.view.set_best_head(block_10.hash()).unwrap();
    node.announce_head(head_10).await;
    wait_for_status(&node, &tx, RefBlockStatus::Valid).await;

    let above = node.extend_best_chain(block_10.hash(), 5, 0).await;
    assert_eq!(node.hub.best_chain().height, 15);
    assert_eq!(status_of(&node, &tx), Some(RefBlockStatus::Expired));

    // Irreversible below the reference height keeps it.
    node.announce_irreversible(chain[8], 9).await;
    barrier(&node, 0).await;
    assert_eq!(node.hub.best_chain().height, 16);
    assert_eq!(node.hub.get_all_transaction_count(), 1);

    node.announce_irreversible(above[1], 12).await;
    wait_for_count(&node, 0).await;
    assert!(node.hub.check_partition());

    node.shutdown().await;
}

#[tokio::test]
async fn test_block_accepted_commits_pooled_transactions() {
    let node = TestNode::start(TxHubConfig::for_testing());
    let chain = node.extend_best_chain(ZERO, 3, 0).await;
    let prefix = ref_block_prefix(&chain[2]);

    let committed = create_tx(1, 3, prefix);
    let kept = create_tx(2, 3, prefix);
    node.submit(vec![committed.clone(), kept.clone()]).await;
    wait_for_count(&node, 2).await;

    let block = node
        .view
        .append_block(chain[2], vec![committed.hash()], 0);
    node.publish(ChainEvent::BlockAccepted {
        chain_id: node.chain_id(),
        block_header: block.header.clone(),
    })
    .await;

    wait_for_count(&node, 1).await;
    assert!(status_of(&node, &committed).is_none());
    assert_eq!(status_of(&node, &kept), Some(RefBlockStatus::Valid));
    // Persisted transactions stay in the store after leaving the pool.
    assert!(node.store.contains(&committed.hash()));

    node.shutdown().await;
}

#[tokio::test]
async fn test_unknown_block_accepted_leaves_pool_and_loop_running() {
    let node = TestNode::start(TxHubConfig::for_testing());
    let chain = node.extend_best_chain(ZERO, 2, 0).await;
    let tx = create_tx(1, 2, ref_block_prefix(&chain[1]));
    node.submit(vec![tx.clone()]).await;
    wait_for_count(&node, 1).await;

    // A header the chain view has never stored.
    let mut header = node.view.append_block(chain[1], Vec::new(), 0).header;
    header.time = 99;
    node.publish(ChainEvent::BlockAccepted {
        chain_id: node.chain_id(),
        block_header: header,
    })
    .await;

    let next = node.extend_best_chain(chain[1], 1, 0).await;
    assert_eq!(node.hub.best_chain().hash, next[0]);
    assert_eq!(node.hub.get_all_transaction_count(), 1);

    node.shutdown().await;
}

// =============================================================================
// Notifications
// =============================================================================

#[tokio::test]
async fn test_accepted_notification_exactly_once() {
    let node = TestNode::start(TxHubConfig::for_testing());
    let mut accepted = accepted_subscription(&node);
    let chain = node.extend_best_chain(ZERO, 3, 0).await;
    let prefix = ref_block_prefix(&chain[2]);

    let valid = create_tx(1, 3, prefix);
    let invalid = create_tx(2, 3, [0xFF; 4]);
    node.submit(vec![valid.clone(), invalid.clone()]).await;
    wait_for_count(&node, 2).await;

    // Resubmission is a no-op.
    node.submit(vec![valid.clone()]).await;

    // Reorg away and back: the transaction becomes valid again silently.
    let fork = node.extend_best_chain(chain[1], 2, 7).await;
    assert_eq!(status_of(&node, &valid), Some(RefBlockStatus::Invalid));
    let back = node.extend_best_chain(chain[2], 2, 0).await;
    assert_eq!(node.hub.best_chain().hash, back[1]);
    assert_eq!(status_of(&node, &valid), Some(RefBlockStatus::Valid));
    assert_ne!(fork[1], back[1]);

    let announced = drain_accepted(&mut accepted);
    assert_eq!(announced, vec![valid]);

    node.shutdown().await;
}

#[tokio::test]
async fn test_future_transaction_turning_valid_is_not_announced() {
    let node = TestNode::start(TxHubConfig::for_testing());
    let mut accepted = accepted_subscription(&node);
    let chain = node.extend_best_chain(ZERO, 2, 0).await;
    let block_3 = node.view.append_block(chain[1], Vec::new(), 0);

    let tx = create_tx(1, 3, ref_block_prefix(&block_3.hash()));
    node.submit(vec![tx.clone()]).await;
    wait_for_status(&node, &tx, RefBlockStatus::FutureRefBlock).await;

    let head = node.view.set_best_head(block_3.hash()).unwrap();
    node.announce_head(head).await;
    wait_for_status(&node, &tx, RefBlockStatus::Valid).await;

    assert!(drain_accepted(&mut accepted).is_empty());

    node.shutdown().await;
}

/// A batch of acceptances larger than the bus ring must not push the
/// lifecycle events queued behind it out of the hub's queue.
#[tokio::test]
async fn test_backlog_larger_than_bus_capacity() {
    let config = TxHubConfig::for_testing();
    let node = TestNode::start(config.clone());
    let mut accepted = accepted_subscription(&node);
    let chain = node.extend_best_chain(ZERO, 3, 0).await;
    let prefix = ref_block_prefix(&chain[2]);

    let batch = config.event_channel_capacity * 4;
    let txs: Vec<Transaction> = (0..batch as u64).map(|seed| create_tx(seed, 3, prefix)).collect();
    let commit = node.view.append_block(chain[2], vec![txs[0].hash()], 0);
    let next = node.view.append_chain(commit.hash(), 1, 0)[0];
    let head = node.view.set_best_head(next).unwrap();

    // All three go out before the hub has handled the first one.
    node.submit(txs.clone()).await;
    node.publish(ChainEvent::BlockAccepted {
        chain_id: node.chain_id(),
        block_header: commit.header.clone(),
    })
    .await;
    node.announce_head(head).await;
    node.wait_for_head(head).await;

    assert!(status_of(&node, &txs[0]).is_none());
    assert_eq!(node.hub.get_all_transaction_count(), batch - 1);
    let set = node.hub.get_executable_transaction_set().await;
    assert_eq!(set.previous_block_hash, next);
    assert_eq!(set.len(), batch - 1);

    // A slow broadcast listener is the one that lags, not the hub.
    assert!(drain_accepted(&mut accepted).len() < batch);

    node.shutdown().await;
}

// =============================================================================
// Reorganizations
// =============================================================================

#[tokio::test]
async fn test_reorg_reclassifies_by_branch() {
    let node = TestNode::start(TxHubConfig::for_testing());
    let main = node.extend_best_chain(ZERO, 4, 0).await;
    let fork = node.view.append_chain(main[1], 3, 1);

    let on_main = create_tx(1, 3, ref_block_prefix(&main[2]));
    let on_fork = create_tx(2, 3, ref_block_prefix(&fork[0]));
    let common = create_tx(3, 2, ref_block_prefix(&main[1]));
    node.submit(vec![on_main.clone(), on_fork.clone(), common.clone()])
        .await;
    wait_for_count(&node, 3).await;
    assert_eq!(status_of(&node, &on_main), Some(RefBlockStatus::Valid));
    assert_eq!(status_of(&node, &on_fork), Some(RefBlockStatus::Invalid));

    // The fork overtakes.
    let fork_tip = node.view.set_best_head(fork[2]).unwrap();
    node.announce_head(fork_tip).await;
    node.wait_for_head(fork_tip).await;

    assert_eq!(status_of(&node, &on_main), Some(RefBlockStatus::Invalid));
    assert_eq!(status_of(&node, &on_fork), Some(RefBlockStatus::Valid));
    assert_eq!(status_of(&node, &common), Some(RefBlockStatus::Valid));
    assert!(node.hub.check_partition());

    node.shutdown().await;
}

#[tokio::test]
async fn test_lookup_failure_during_reorg_keeps_classification() {
    let node = TestNode::start(TxHubConfig::for_testing());
    let main = node.extend_best_chain(ZERO, 3, 0).await;
    let fork = node.view.append_chain(main[0], 3, 1);
    let tx = create_tx(1, 3, ref_block_prefix(&main[2]));
    node.submit(vec![tx.clone()]).await;
    wait_for_status(&node, &tx, RefBlockStatus::Valid).await;

    // Handled in line with the event loop; the hub serializes mutations.
    node.view.set_unavailable(true);
    let outcome = node.hub.handle_best_chain_found(node.chain_id(), fork[2], 4).await;
    assert!(outcome.is_ok());
    assert_eq!(node.hub.best_chain().hash, main[2]);
    assert_eq!(status_of(&node, &tx), Some(RefBlockStatus::Valid));

    // Recovery: the next announcement is handled normally.
    node.view.set_unavailable(false);
    let tip = node.extend_best_chain(main[2], 1, 0).await;

    assert_eq!(node.hub.best_chain().hash, tip[0]);
    assert_eq!(status_of(&node, &tx), Some(RefBlockStatus::Valid));

    node.shutdown().await;
}

// =============================================================================
// Executable set
// =============================================================================

#[tokio::test]
async fn test_executable_set_waits_for_best_chain_event() {
    let node = TestNode::start(TxHubConfig::for_testing());
    let chain = node.extend_best_chain(ZERO, 2, 0).await;
    let tx = create_tx(1, 2, ref_block_prefix(&chain[1]));
    node.submit(vec![tx.clone()]).await;
    wait_for_status(&node, &tx, RefBlockStatus::Valid).await;

    let set = node.hub.get_executable_transaction_set().await;
    assert_eq!(set.previous_block_hash, chain[1]);
    assert_eq!(set.transactions, vec![tx.clone()]);

    // The chain view moves ahead before the hub hears about it.
    let next = node.view.append_chain(chain[1], 1, 0);
    let head = node.view.set_best_head(next[0]).unwrap();
    let stale = node.hub.get_executable_transaction_set().await;
    assert!(stale.is_empty());
    assert_eq!(stale.previous_block_hash, chain[1]);

    node.announce_head(head).await;
    node.wait_for_head(head).await;
    let fresh = node.hub.get_executable_transaction_set().await;
    assert_eq!(fresh.previous_block_hash, next[0]);
    assert_eq!(fresh.previous_block_height, 3);
    assert_eq!(fresh.transactions, vec![tx]);

    node.shutdown().await;
}

#[tokio::test]
async fn test_limited_executable_set() {
    let node = TestNode::start(TxHubConfig::for_testing());
    let chain = node.extend_best_chain(ZERO, 2, 0).await;
    let prefix = ref_block_prefix(&chain[1]);
    node.submit((0..10).map(|seed| create_tx(seed, 2, prefix)).collect())
        .await;
    wait_for_count(&node, 10).await;

    assert_eq!(node.hub.get_executable_transaction_set_limited(4).await.len(), 4);
    assert_eq!(node.hub.get_executable_transaction_set_limited(0).await.len(), 0);
    assert_eq!(node.hub.get_executable_transaction_set().await.len(), 10);

    node.shutdown().await;
}

// =============================================================================
// Chain isolation and concurrency
// =============================================================================

#[tokio::test]
async fn test_foreign_chain_events_are_ignored() {
    let node = TestNode::start(TxHubConfig::for_testing());
    let chain = node.extend_best_chain(ZERO, 2, 0).await;
    let foreign = node.chain_id() + 1;

    node.publish(ChainEvent::TransactionsReceived {
        chain_id: foreign,
        transactions: vec![create_tx(1, 2, ref_block_prefix(&chain[1]))],
    })
    .await;
    node.publish(ChainEvent::BestChainFound {
        chain_id: foreign,
        block_hash: [0x42; 32],
        block_height: 100,
    })
    .await;
    node.publish(ChainEvent::NewIrreversibleBlockFound {
        chain_id: foreign,
        block_hash: [0x42; 32],
        block_height: 100,
    })
    .await;
    let tip = barrier(&node, 0).await;

    assert_eq!(node.hub.get_all_transaction_count(), 0);
    assert_eq!(node.hub.best_chain().hash, tip);
    assert_eq!(node.hub.best_chain().height, 3);
    assert!(node.store.is_empty());

    node.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_see_consistent_status() {
    let node = TestNode::start(TxHubConfig::for_testing());
    let mut tip = node.extend_best_chain(ZERO, 3, 0).await[2];

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let hub = Arc::clone(&node.hub);
            tokio::spawn(async move {
                for _ in 0..200 {
                    let status = hub.get_status();
                    assert_eq!(
                        status.all_transactions,
                        status.valid + status.invalid + status.future + status.expired
                    );
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    for round in 0..10u64 {
        let prefix = ref_block_prefix(&tip);
        let height = node.hub.best_chain().height;
        node.submit((0..5).map(|i| create_tx(round * 5 + i, height, prefix)).collect())
            .await;
        tip = node.extend_best_chain(tip, 1, round).await[0];
    }

    for reader in readers {
        reader.await.unwrap();
    }
    assert!(node.hub.check_partition());
    assert_eq!(node.hub.get_all_transaction_count(), 50);

    node.shutdown().await;
}
