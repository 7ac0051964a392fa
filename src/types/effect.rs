//! Deferred cross-contract call descriptors.
//!
//! A pool operation never calls another contract in-line. It mutates its
//! own state first and returns a list of [`Effect`]s; the chain appends
//! them to the transaction's outbound queue and drains the queue FIFO
//! after the local commit. If any queued effect fails, the whole
//! transaction (local mutations included) is rolled back.
//!
//! This mirrors the message-passing model of the host chain: the queue is
//! the only form of "suspension" an operation has.

use crate::types::{Address, ValidatorKey};

/// A deferred external call emitted by a pool operation.
///
/// The emitting contract is tracked by the chain alongside each queued
/// effect; `NativeSend` debits the emitter, `TokenTransfer` runs with the
/// emitter as the ledger caller (so allowance rules apply to third-party
/// pulls exactly as they would on-chain).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Move `value` tokens on the ledger at `token`, from `from` to `to`.
    ///
    /// When the emitter is not `from`, the ledger checks the emitter's
    /// allowance - this is how a pool pulls deposits into custody.
    TokenTransfer {
        token: Address,
        from: Address,
        to: Address,
        value: u64,
    },

    /// Send `amount` mutez from the emitter's custody to `to`.
    NativeSend { to: Address, amount: u64 },

    /// Hand the second leg of a token-to-token swap to the registry.
    ///
    /// Carries the settlement leg as attached value; the registry resolves
    /// `token_out` to its exchange and forwards the call into that
    /// exchange's guarded re-entry operation.
    RegistryForward {
        token_out: Address,
        recipient: Address,
        min_tokens_out: u64,
        amount: u64,
    },

    /// Point the emitter's baking delegation at `validator`.
    SetDelegate { validator: ValidatorKey },
}

impl Effect {
    /// True if this effect moves value (tokens or native asset).
    pub fn moves_value(&self) -> bool {
        !matches!(self, Effect::SetDelegate { .. })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_moves_value() {
        let transfer = Effect::TokenTransfer {
            token: Address(1),
            from: Address(2),
            to: Address(3),
            value: 10,
        };
        assert!(transfer.moves_value());

        let send = Effect::NativeSend { to: Address(3), amount: 10 };
        assert!(send.moves_value());

        let forward = Effect::RegistryForward {
            token_out: Address(4),
            recipient: Address(3),
            min_tokens_out: 1,
            amount: 10,
        };
        assert!(forward.moves_value());

        let delegate = Effect::SetDelegate { validator: ValidatorKey(1) };
        assert!(!delegate.moves_value());
    }
}
