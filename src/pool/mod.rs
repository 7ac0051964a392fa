//! Pool module: pricing engine, state ledgers, and the swap orchestrator.
//!
//! ## Architecture
//!
//! A pool is split into three layers:
//!
//! - [`pricing`]: pure constant-product-with-fee math over a reserve pair
//! - [`PoolState`]: the reserve, share, and delegation ledgers with their
//!   structural invariants
//! - [`Exchange`]: entry points that validate caller intent, invoke the
//!   pricing engine, commit state, and emit deferred effects
//!
//! ## Example
//!
//! ```
//! use dexpool::pool::{Exchange, Env};
//! use dexpool::types::{Address, ValidatorKey};
//!
//! let mut pool = Exchange::new(Address(3), 500, Address(2), Address(1), ValidatorKey(1));
//!
//! // One-time initialization: 1 tez against 2000 tokens.
//! let env = Env::new(Address(10), 1_000_000);
//! pool.initialize(&env, 2_000, ValidatorKey(1)).unwrap();
//!
//! assert_eq!(pool.state.invariant, 2_000_000_000);
//! assert_eq!(pool.state.total_shares, 1_000);
//! ```

pub mod exchange;
pub mod pricing;
pub mod state;

pub use exchange::{Env, Exchange, INITIAL_SHARES};
pub use pricing::Quote;
pub use state::{PoolSnapshot, PoolState};
