//! Error taxonomy for the exchange engine.
//!
//! Every failure is a fail-fast rejection: the enclosing transaction is
//! discarded in full, including any deferred calls already queued. There
//! are no warnings and no partial commits - an operation is either
//! accepted whole or void.
//!
//! Variants fall into four classes:
//!
//! 1. **Precondition violations**: zero amounts, wrong initialization state
//! 2. **Bound violations**: output below the caller's stated minimum
//! 3. **Authorization violations**: untrusted re-entry, non-owner mint/burn
//! 4. **Invariant-impossible states**: output exceeding the backing reserve

use thiserror::Error;

use crate::types::Address;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All rejection reasons surfaced by pools, the registry, the token
/// ledger and the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    // ------------------------------------------------------------------
    // Precondition violations
    // ------------------------------------------------------------------
    /// The pool already holds reserves and shares.
    #[error("pool is already initialized")]
    AlreadyInitialized,

    /// The pool has no shares outstanding (or its priced leg is empty).
    #[error("pool is not initialized")]
    NotInitialized,

    /// An amount parameter that must be positive was zero.
    #[error("amount must be positive")]
    ZeroAmount,

    /// The initial settlement deposit fell outside the open interval
    /// accepted by `initialize`.
    #[error("initial deposit of {amount} mutez is out of range")]
    DepositOutOfRange { amount: u64 },

    /// The initial token deposit was at or below the minimum.
    #[error("initial token amount {amount} is too small")]
    TokenAmountTooSmall { amount: u64 },

    /// The fee rate divisor must be positive.
    #[error("fee rate must be positive")]
    InvalidFeeRate,

    /// An input so large the reserve or share arithmetic would wrap.
    #[error("amount too large for pool arithmetic")]
    AmountOverflow,

    // ------------------------------------------------------------------
    // Bound violations
    // ------------------------------------------------------------------
    /// The computed output fell below the caller's stated minimum.
    #[error("computed output {amount_out} is below the requested minimum {min_out}")]
    SlippageExceeded { amount_out: u64, min_out: u64 },

    /// The attached deposit cannot buy even a single share.
    #[error("deposit of {amount} is below the price of one share ({tez_per_share})")]
    BelowSharePrice { amount: u64, tez_per_share: u64 },

    /// Fewer shares would be purchased than the caller required.
    #[error("{purchased} shares purchased, below the requested minimum {min_shares}")]
    TooFewShares { purchased: u64, min_shares: u64 },

    /// The caller's share balance does not strictly exceed the burn.
    #[error("share balance {balance} is too low to burn {burned}")]
    InsufficientShares { balance: u64, burned: u64 },

    // ------------------------------------------------------------------
    // Authorization violations
    // ------------------------------------------------------------------
    /// The guarded re-entry operation was called by someone other than
    /// the trusted registry.
    #[error("caller {caller} is not the trusted registry")]
    UnauthorizedCaller { caller: Address },

    /// A third party tried to spend without sufficient allowance.
    #[error("spender {spender} is not allowed to move these tokens")]
    NotAllowed { spender: Address },

    /// Mint/burn attempted by a non-owner.
    #[error("caller {caller} is not the token owner")]
    NotOwner { caller: Address },

    // ------------------------------------------------------------------
    // Invariant-impossible states
    // ------------------------------------------------------------------
    /// The computed output would drain more than the backing reserve.
    #[error("output {amount_out} exceeds the available reserve {reserve}")]
    InsufficientReserve { amount_out: u64, reserve: u64 },

    /// The pool's reserve-to-share ratio cannot price a share.
    #[error("pool reserves are too thin to price liquidity")]
    InsufficientLiquidity,

    // ------------------------------------------------------------------
    // Collaborator failures
    // ------------------------------------------------------------------
    /// A balance (native or token) is too low for the requested move.
    #[error("balance {balance} is too low for the required {required}")]
    InsufficientBalance { balance: u64, required: u64 },

    /// The token has no registered exchange.
    #[error("token {token} is not registered")]
    TokenNotRegistered { token: Address },

    /// Token or exchange address already present in the registry.
    #[error("token or exchange is already registered")]
    AlreadyRegistered,

    /// The address does not resolve to a deployed contract.
    #[error("no contract deployed at {address}")]
    UnknownContract { address: Address },
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::SlippageExceeded { amount_out: 20, min_out: 21 };
        assert_eq!(
            err.to_string(),
            "computed output 20 is below the requested minimum 21"
        );
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(Error::AlreadyInitialized, Error::AlreadyInitialized);
        assert_ne!(
            Error::ZeroAmount,
            Error::InsufficientShares { balance: 1, burned: 2 }
        );
    }

    #[test]
    fn test_error_carries_addresses() {
        let err = Error::UnauthorizedCaller { caller: Address(9) };
        assert!(err.to_string().contains("addr#0000009"));
    }
}
