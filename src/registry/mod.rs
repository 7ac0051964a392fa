//! Exchange registry: token <-> exchange address resolution.
//!
//! The registry is the glue for token-to-token swaps: a pool that only
//! knows the *target token's* address hands the settlement leg to the
//! registry, which resolves the token to its exchange and forwards the
//! call (value attached) into that exchange's guarded re-entry
//! operation. Pools trust the registry's address, never each other's.
//!
//! Registration is append-only and bidirectional: a token maps to
//! exactly one exchange and vice versa, and duplicates on either side
//! are rejected.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::Address;

/// Token <-> exchange registration bookkeeping.
#[derive(Debug, Clone)]
pub struct Registry {
    /// The registry's own address; pools check re-entry calls against it.
    pub address: Address,

    /// Registration order, oldest last (new tokens are pushed in front).
    token_list: Vec<Address>,

    token_to_exchange: HashMap<Address, Address>,
    exchange_to_token: HashMap<Address, Address>,
}

impl Registry {
    /// Create an empty registry at `address`.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            token_list: Vec::new(),
            token_to_exchange: HashMap::new(),
            exchange_to_token: HashMap::new(),
        }
    }

    /// Register a token/exchange pair.
    ///
    /// Fails if the token or the exchange is already registered on
    /// either side of the mapping.
    pub fn launch_exchange(&mut self, token: Address, exchange: Address) -> Result<()> {
        if self.token_to_exchange.contains_key(&token)
            || self.exchange_to_token.contains_key(&exchange)
        {
            return Err(Error::AlreadyRegistered);
        }

        self.token_list.insert(0, token);
        self.token_to_exchange.insert(token, exchange);
        self.exchange_to_token.insert(exchange, token);
        Ok(())
    }

    /// Resolve a token to its exchange.
    ///
    /// Typed found/not-found result; the caller propagates the failure
    /// instead of unwrapping a missing entry.
    pub fn lookup(&self, token: Address) -> Result<Address> {
        self.token_to_exchange
            .get(&token)
            .copied()
            .ok_or(Error::TokenNotRegistered { token })
    }

    /// The token an exchange trades, if registered.
    pub fn token_of(&self, exchange: Address) -> Option<Address> {
        self.exchange_to_token.get(&exchange).copied()
    }

    /// Number of registered token/exchange pairs.
    pub fn len(&self) -> usize {
        self.token_list.len()
    }

    /// True if nothing has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.token_list.is_empty()
    }

    /// Registered tokens, newest first.
    pub fn tokens(&self) -> &[Address] {
        &self.token_list
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
