//! Transaction receipts and state-root hashing.
//!
//! A receipt summarizes one accepted transaction: its sequence number,
//! how many deferred effects were applied, and the chain state root after
//! commit. Roots are SHA-256 over deterministically encoded state, so two
//! chains that processed the same transactions report identical roots -
//! and a rolled-back transaction leaves the root untouched, which is how
//! the atomicity tests prove all-or-nothing execution.

use ssz_rs::prelude::*;
use sha2::{Digest, Sha256};

/// Compute the SHA-256 hash of the given bytes.
///
/// Returns a 32-byte array suitable for use as a state root.
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();

    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Receipt for one accepted transaction.
///
/// ## Example
///
/// ```
/// use dexpool::types::TxReceipt;
///
/// let receipt = TxReceipt::new(1, 2, [0u8; 32]);
/// assert_eq!(receipt.tx_id, 1);
/// assert_eq!(receipt.effects_applied, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct TxReceipt {
    /// Transaction sequence number (assigned by the chain).
    pub tx_id: u64,

    /// Number of deferred effects drained from the outbound queue.
    pub effects_applied: u64,

    /// Chain state root after the transaction committed.
    pub state_root: [u8; 32],
}

impl TxReceipt {
    /// Create a new receipt.
    pub fn new(tx_id: u64, effects_applied: u64, state_root: [u8; 32]) -> Self {
        Self {
            tx_id,
            effects_applied,
            state_root,
        }
    }

    /// Get the state root as a hex string.
    pub fn state_root_hex(&self) -> String {
        hex::encode(self.state_root)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
