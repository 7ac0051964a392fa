//! # DexPool
//!
//! Deterministic automated-market-making exchange engine.
//!
//! ## Architecture
//!
//! The engine consists of:
//! - **Types**: Core data structures (Address, Effect, TxReceipt)
//! - **Pool**: Constant-product pricing, share/delegation ledgers, and
//!   the swap entry points
//! - **Registry**: Token <-> exchange resolution for two-hop swaps
//! - **Token**: Fungible-token ledger with allowance-gated transfers
//! - **Engine**: Chain that owns all contracts and executes
//!   transactions atomically
//!
//! ## Design Principles
//!
//! 1. **Determinism**: All operations produce identical results for identical inputs
//! 2. **No Floating Point**: Reserves and amounts are integers; the
//!    native asset is denominated in mutez (10^6 per whole unit)
//! 3. **Deferred Effects**: Pools commit locally and return effect
//!    descriptors; the chain applies them FIFO and rolls everything
//!    back on any failure
//! 4. **Synchronous Execution**: One transaction at a time, no async

// ============================================================================
// Module declarations
// ============================================================================

/// Core data types: Address, ValidatorKey, Effect, TxReceipt
pub mod types;

/// Typed error taxonomy shared by every contract
pub mod error;

/// Pool: pricing engine, state ledgers, swap entry points
pub mod pool;

/// Registry: token <-> exchange resolution
pub mod registry;

/// Fungible-token ledger
pub mod token;

/// Chain: contract ownership and atomic transaction execution
pub mod engine;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use error::{Error, Result};
pub use types::{Address, Effect, TxReceipt, ValidatorKey};
pub use pool::{Env, Exchange, PoolState, Quote};
pub use registry::Registry;
pub use token::TokenLedger;
pub use engine::{Chain, Operation, Transaction};
