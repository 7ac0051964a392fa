//! Core data types for the exchange engine.
//!
//! ## Types
//!
//! - [`Address`] / [`ValidatorKey`]: account and validator identities
//! - [`Effect`]: deferred cross-contract call descriptors
//! - [`TxReceipt`]: accepted-transaction summary with a state root
//!
//! ## Fixed-Point Arithmetic
//!
//! Settlement amounts are `u64` mutez (scaled by 10^6, see [`amount`]);
//! token amounts are plain integer units. All pool math floors toward
//! zero and widens intermediates to `u128` - no floating point anywhere.

mod account;
mod effect;
mod receipt;
pub mod amount;

// Re-export all types at module level
pub use account::{Address, ValidatorKey};
pub use effect::Effect;
pub use receipt::{hash_bytes, TxReceipt};
