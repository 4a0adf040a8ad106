//! # Core Chain Entities
//!
//! Defines the chain primitives the transaction hub and its collaborators
//! exchange.
//!
//! ## Clusters
//!
//! - **Identity**: `Hash`, `ChainId`, `BlockHeight`, `TransactionId`
//! - **Transactions**: `Transaction` with its reference-block binding
//! - **Blocks**: `BlockHeader`, `BlockBody`, `Block`
//! - **Chain view**: `ChainHead`, `ExecutableTransactionSet`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha2::{Digest, Sha256};

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 32-byte SHA-256 hash.
pub type Hash = [u8; 32];

/// Identifier of the chain a node (and a pool instance) serves.
pub type ChainId = i32;

/// Height of a block in the chain.
pub type BlockHeight = u64;

/// Content-derived transaction identifier.
pub type TransactionId = Hash;

/// Leading bytes of a reference block hash, carried by every transaction.
pub type RefBlockPrefix = [u8; REF_BLOCK_PREFIX_LEN];

/// A 20-byte account address.
pub type Address = [u8; 20];

/// A 64-byte signature.
pub type Signature = [u8; 64];

/// Height of the genesis block.
pub const GENESIS_BLOCK_HEIGHT: BlockHeight = 1;

/// Number of leading hash bytes kept in a [`RefBlockPrefix`].
pub const REF_BLOCK_PREFIX_LEN: usize = 4;

/// Returns the reference prefix of a block hash.
#[must_use]
pub fn ref_block_prefix(hash: &Hash) -> RefBlockPrefix {
    let mut prefix = [0u8; REF_BLOCK_PREFIX_LEN];
    prefix.copy_from_slice(&hash[..REF_BLOCK_PREFIX_LEN]);
    prefix
}

/// Short hex rendering of a hash for log fields.
#[must_use]
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..8])
}

// =============================================================================
// CLUSTER B: TRANSACTIONS
// =============================================================================

/// A transaction as authored by its sender.
///
/// `ref_block_number` and `ref_block_prefix` bind the transaction to a
/// block the sender saw as a recent ancestor. The pool only treats the
/// transaction as executable while that block is canonical and recent.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender address.
    pub from: Address,
    /// Target contract address.
    pub to: Address,
    /// Contract method to invoke.
    pub method_name: String,
    /// Encoded call parameters.
    pub params: Vec<u8>,
    /// Height of the reference block.
    pub ref_block_number: BlockHeight,
    /// Prefix of the reference block hash.
    pub ref_block_prefix: RefBlockPrefix,
    /// Sender's signature over the transaction.
    #[serde_as(as = "Bytes")]
    pub signature: Signature,
}

impl Transaction {
    /// Compute the transaction id.
    ///
    /// The signature is excluded, so re-signing does not change the id.
    pub fn hash(&self) -> TransactionId {
        let mut hasher = Sha256::new();
        hasher.update(self.from);
        hasher.update(self.to);
        hasher.update((self.method_name.len() as u64).to_le_bytes());
        hasher.update(self.method_name.as_bytes());
        hasher.update((self.params.len() as u64).to_le_bytes());
        hasher.update(&self.params);
        hasher.update(self.ref_block_number.to_le_bytes());
        hasher.update(self.ref_block_prefix);
        hasher.finalize().into()
    }

    /// Height at and beyond which the transaction can no longer be included.
    pub fn expiry_block_number(&self, expiry_window: u64) -> BlockHeight {
        self.ref_block_number.saturating_add(expiry_window)
    }
}

// =============================================================================
// CLUSTER C: BLOCKS
// =============================================================================

/// The header of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Chain this block belongs to.
    pub chain_id: ChainId,
    /// Block height in the chain.
    pub height: BlockHeight,
    /// Hash of the parent block.
    pub previous_block_hash: Hash,
    /// Merkle root of the transaction ids in the body.
    pub merkle_root: Hash,
    /// Unix timestamp (seconds) when the block was produced.
    pub time: u64,
}

impl BlockHeader {
    /// Compute the block hash.
    pub fn hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.chain_id.to_le_bytes());
        hasher.update(self.height.to_le_bytes());
        hasher.update(self.previous_block_hash);
        hasher.update(self.merkle_root);
        hasher.update(self.time.to_le_bytes());
        hasher.finalize().into()
    }
}

/// Block body: the ids of the transactions committed by the block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockBody {
    /// Committed transaction ids, in execution order.
    pub transaction_ids: Vec<TransactionId>,
}

/// A block as returned by the chain view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    pub header: BlockHeader,
    pub body: BlockBody,
}

impl Block {
    /// Hash of the block (its header hash).
    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    /// Height of the block.
    pub fn height(&self) -> BlockHeight {
        self.header.height
    }

    /// Ids of the transactions the block commits.
    pub fn transaction_ids(&self) -> &[TransactionId] {
        &self.body.transaction_ids
    }
}

// =============================================================================
// CLUSTER D: CHAIN VIEW
// =============================================================================

/// Best-chain head as seen by a component at some point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainHead {
    pub hash: Hash,
    pub height: BlockHeight,
}

impl ChainHead {
    pub fn new(hash: Hash, height: BlockHeight) -> Self {
        Self { hash, height }
    }

    /// Head before any block is known: zero hash just below genesis.
    pub fn initial() -> Self {
        Self {
            hash: Hash::default(),
            height: GENESIS_BLOCK_HEIGHT - 1,
        }
    }
}

impl Default for ChainHead {
    fn default() -> Self {
        Self::initial()
    }
}

/// Transactions a block producer may include on top of `previous_block_hash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutableTransactionSet {
    pub chain_id: ChainId,
    pub previous_block_hash: Hash,
    pub previous_block_height: BlockHeight,
    pub transactions: Vec<Transaction>,
}

impl ExecutableTransactionSet {
    /// A set with no transactions on top of `head`.
    pub fn empty(chain_id: ChainId, head: ChainHead) -> Self {
        Self {
            chain_id,
            previous_block_hash: head.hash,
            previous_block_height: head.height,
            transactions: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }
}
