//! Pool state: reserves, shares, votes, delegation.
//!
//! ## Architecture
//!
//! One `PoolState` per deployed exchange, exclusively owned and mutated
//! by that exchange's operations:
//!
//! - **Reserve ledger**: the settlement/token reserve pair plus the
//!   cached product invariant
//! - **Share ledger**: provider -> share count, with the running total
//! - **Delegation tracker**: provider -> nominated candidate, candidate
//!   -> aggregate vote weight, and the currently delegated validator
//!
//! ## Invariants
//!
//! After every accepted operation:
//!
//! 1. `invariant == settlement_reserve * token_reserve` (u128 product)
//! 2. `total_shares == sum(shares)`
//! 3. `sum(votes) == total_shares` once any provider exists
//! 4. reserves and `total_shares` are zero together or positive together
//!
//! [`PoolState::verify_consistency`] checks all four; the test suites
//! call it after every accepted operation.

use std::collections::HashMap;

use ssz_rs::prelude::*;

use crate::types::{hash_bytes, Address, ValidatorKey};

// ============================================================================
// Snapshot
// ============================================================================

/// Scalar snapshot of a pool, SSZ-encoded for state-root hashing.
///
/// The u128 invariant is split into little-endian halves because SSZ
/// basic types stop at u64.
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct PoolSnapshot {
    pub fee_rate: u64,
    pub tez_pool: u64,
    pub token_pool: u64,
    pub total_shares: u64,
    pub invariant_lo: u64,
    pub invariant_hi: u64,
}

// ============================================================================
// PoolState
// ============================================================================

/// Full persistent state of one exchange pool.
#[derive(Debug, Clone)]
pub struct PoolState {
    /// Fee divisor applied to every swap input; fixed at creation.
    pub fee_rate: u64,

    /// Settlement-asset reserve, in mutez.
    pub tez_pool: u64,

    /// Token-asset reserve, in token units.
    pub token_pool: u64,

    /// Cached product of the two reserves; zero iff no shares exist.
    pub invariant: u128,

    /// Sum of all provider shares.
    pub total_shares: u64,

    /// Address of the token ledger this pool trades against.
    pub token_address: Address,

    /// Address of the trusted registry; fixed at creation.
    pub registry_address: Address,

    /// Provider -> share count. Missing entry means zero shares.
    shares: HashMap<Address, u64>,

    /// Provider -> currently nominated candidate.
    candidates: HashMap<Address, ValidatorKey>,

    /// Candidate -> aggregate share-backed vote weight.
    votes: HashMap<ValidatorKey, u64>,

    /// The validator currently receiving the pool's delegation.
    pub delegated: ValidatorKey,
}

impl PoolState {
    /// Create the empty (uninitialized) state for a new pool.
    pub fn new(
        fee_rate: u64,
        token_address: Address,
        registry_address: Address,
        delegated: ValidatorKey,
    ) -> Self {
        Self {
            fee_rate,
            tez_pool: 0,
            token_pool: 0,
            invariant: 0,
            total_shares: 0,
            token_address,
            registry_address,
            shares: HashMap::new(),
            candidates: HashMap::new(),
            votes: HashMap::new(),
            delegated,
        }
    }

    // ========================================================================
    // Share ledger
    // ========================================================================

    /// Share count held by `provider` (zero if absent).
    #[inline]
    pub fn share_of(&self, provider: Address) -> u64 {
        self.shares.get(&provider).copied().unwrap_or(0)
    }

    /// Overwrite a provider's share count.
    #[inline]
    pub fn set_share(&mut self, provider: Address, value: u64) {
        self.shares.insert(provider, value);
    }

    /// Number of providers with a recorded entry (including zeroed ones).
    #[inline]
    pub fn provider_count(&self) -> usize {
        self.shares.len()
    }

    // ========================================================================
    // Delegation tracker
    // ========================================================================

    /// The candidate `provider` currently nominates, if any.
    #[inline]
    pub fn candidate_of(&self, provider: Address) -> Option<ValidatorKey> {
        self.candidates.get(&provider).copied()
    }

    /// Record `provider`'s nomination.
    #[inline]
    pub fn set_candidate(&mut self, provider: Address, candidate: ValidatorKey) {
        self.candidates.insert(provider, candidate);
    }

    /// Aggregate vote weight behind `candidate` (zero if absent).
    #[inline]
    pub fn votes_for(&self, candidate: ValidatorKey) -> u64 {
        self.votes.get(&candidate).copied().unwrap_or(0)
    }

    /// Overwrite a candidate's vote weight.
    #[inline]
    pub fn set_votes(&mut self, candidate: ValidatorKey, value: u64) {
        self.votes.insert(candidate, value);
    }

    // ========================================================================
    // Invariant maintenance
    // ========================================================================

    /// Recompute the cached invariant from the current reserves.
    #[inline]
    pub fn recompute_invariant(&mut self) {
        self.invariant = self.tez_pool as u128 * self.token_pool as u128;
    }

    /// Reset the invariant to zero (full divestment).
    #[inline]
    pub fn reset_invariant(&mut self) {
        self.invariant = 0;
    }

    /// True while the pool has never been initialized (or was drained).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.total_shares == 0
    }

    // ========================================================================
    // Snapshots and state roots
    // ========================================================================

    /// Scalar snapshot of the pool for deterministic encoding.
    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            fee_rate: self.fee_rate,
            tez_pool: self.tez_pool,
            token_pool: self.token_pool,
            total_shares: self.total_shares,
            invariant_lo: self.invariant as u64,
            invariant_hi: (self.invariant >> 64) as u64,
        }
    }

    /// SHA-256 root over the snapshot plus every map entry in sorted
    /// order. Two pools with identical state produce identical roots
    /// regardless of map iteration order.
    pub fn state_root(&self) -> [u8; 32] {
        let mut bytes = ssz_rs::serialize(&self.snapshot()).unwrap_or_default();

        let mut shares: Vec<_> = self.shares.iter().collect();
        shares.sort();
        for (addr, count) in shares {
            bytes.extend_from_slice(&addr.0.to_le_bytes());
            bytes.extend_from_slice(&count.to_le_bytes());
        }

        let mut candidates: Vec<_> = self.candidates.iter().collect();
        candidates.sort();
        for (addr, key) in candidates {
            bytes.extend_from_slice(&addr.0.to_le_bytes());
            bytes.extend_from_slice(&key.0.to_le_bytes());
        }

        let mut votes: Vec<_> = self.votes.iter().collect();
        votes.sort();
        for (key, weight) in votes {
            bytes.extend_from_slice(&key.0.to_le_bytes());
            bytes.extend_from_slice(&weight.to_le_bytes());
        }

        bytes.extend_from_slice(&self.delegated.0.to_le_bytes());

        hash_bytes(&bytes)
    }

    // ========================================================================
    // Consistency checks (test support)
    // ========================================================================

    /// Check the four structural invariants. Returns the first violation
    /// as a description, or `Ok(())`.
    pub fn verify_consistency(&self) -> std::result::Result<(), String> {
        let product = self.tez_pool as u128 * self.token_pool as u128;
        if self.invariant != product {
            return Err(format!(
                "cached invariant {} != reserve product {}",
                self.invariant, product
            ));
        }

        let share_sum: u64 = self.shares.values().sum();
        if share_sum != self.total_shares {
            return Err(format!(
                "share sum {} != total_shares {}",
                share_sum, self.total_shares
            ));
        }

        if self.total_shares > 0 {
            let vote_sum: u64 = self.votes.values().sum();
            if vote_sum != self.total_shares {
                return Err(format!(
                    "vote sum {} != total_shares {}",
                    vote_sum, self.total_shares
                ));
            }
        }

        let tez_zero = self.tez_pool == 0;
        let token_zero = self.token_pool == 0;
        let shares_zero = self.total_shares == 0;
        if tez_zero != token_zero || token_zero != shares_zero {
            return Err(format!(
                "drained-state mismatch: tez={} token={} shares={}",
                self.tez_pool, self.token_pool, self.total_shares
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
