//! Transaction engine: contract ownership and atomic execution.
//!
//! ## Design Principles
//!
//! 1. **Determinism**: the same transaction sequence always produces the
//!    same state roots
//! 2. **Single-threaded per chain**: each transaction runs to completion
//!    (or fails entirely) before the next is observed
//! 3. **Deferred calls, not blocking calls**: a pool operation commits
//!    its local state and returns effect descriptors; the chain drains
//!    the queue FIFO afterwards
//! 4. **All-or-nothing**: a failure anywhere in the chain of effects -
//!    including inside a pool re-entered through the registry - rolls
//!    back every contract touched by the transaction
//!
//! ## Execution Model
//!
//! ```text
//! execute(tx)
//!   ├─ snapshot chain state
//!   ├─ move attached value: sender -> target custody
//!   ├─ dispatch entry point on the target pool  -> effects
//!   └─ drain queue FIFO:
//!        TokenTransfer   -> token ledger (allowance rules apply)
//!        NativeSend      -> emitter custody -> recipient
//!        RegistryForward -> registry lookup -> destination pool
//!                           re-entry -> more effects appended
//!        SetDelegate     -> delegation table
//!   any Err => restore snapshot, surface the error
//! ```

use std::collections::{HashMap, VecDeque};

use slab::Slab;

use crate::error::{Error, Result};
use crate::pool::{Env, Exchange, PoolState};
use crate::registry::Registry;
use crate::token::TokenLedger;
use crate::types::{hash_bytes, Address, Effect, TxReceipt, ValidatorKey};

// ============================================================================
// Transactions
// ============================================================================

/// One entry-point invocation on a deployed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    InitializeExchange { token_amount: u64, candidate: ValidatorKey },
    TezToTokenPayment { recipient: Address, min_tokens_out: u64 },
    TezToTokenSwap { min_tokens_out: u64 },
    TokenToTezPayment { recipient: Address, tokens_in: u64, min_tez_out: u64 },
    TokenToTezSwap { tokens_in: u64, min_tez_out: u64 },
    TokenToTokenPayment {
        recipient: Address,
        tokens_in: u64,
        min_tokens_out: u64,
        token_out: Address,
    },
    TokenToTokenSwap { tokens_in: u64, min_tokens_out: u64, token_out: Address },
    InvestLiquidity { candidate: ValidatorKey, min_shares: u64 },
    DivestLiquidity { shares_burned: u64, min_tez: u64, min_tokens: u64 },
}

/// A signed call: who, where, how much attached value, and what.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    pub sender: Address,
    pub target: Address,
    /// Native value attached to the call, in mutez.
    pub amount: u64,
    pub op: Operation,
}

impl Transaction {
    /// Convenience constructor.
    pub fn new(sender: Address, target: Address, amount: u64, op: Operation) -> Self {
        Self { sender, target, amount, op }
    }
}

// ============================================================================
// Chain
// ============================================================================

/// Owns every contract and account, and executes transactions atomically.
///
/// ## Example
///
/// ```
/// use dexpool::engine::{Chain, Operation, Transaction};
/// use dexpool::types::ValidatorKey;
///
/// let mut chain = Chain::new();
/// let admin = chain.create_account(10_000_000);
/// let token = chain.deploy_token(admin, 1_000_000);
/// let pool = chain.deploy_exchange(500, token, ValidatorKey(1)).unwrap();
///
/// chain.approve_token(token, admin, pool, 2_000).unwrap();
/// let receipt = chain
///     .execute(Transaction::new(
///         admin,
///         pool,
///         1_000_000,
///         Operation::InitializeExchange { token_amount: 2_000, candidate: ValidatorKey(1) },
///     ))
///     .unwrap();
///
/// assert_eq!(receipt.tx_id, 1);
/// assert_eq!(chain.pool_state(pool).unwrap().invariant, 2_000_000_000);
/// ```
#[derive(Debug, Clone)]
pub struct Chain {
    next_address: u64,
    next_tx_id: u64,

    /// Native-asset balances, accounts and contracts alike (mutez).
    native: HashMap<Address, u64>,

    /// Token address -> its ledger.
    tokens: HashMap<Address, TokenLedger>,

    /// The one trusted registry.
    registry: Registry,

    /// Pre-allocated storage for deployed exchanges.
    pools: Slab<Exchange>,

    /// Exchange address -> slab key, for O(1) dispatch.
    pool_index: HashMap<Address, usize>,

    /// Contract -> validator its delegation currently points at.
    delegates: HashMap<Address, ValidatorKey>,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain {
    /// Create an empty chain; the registry is deployed at the first
    /// address.
    pub fn new() -> Self {
        let mut chain = Self {
            next_address: 1,
            next_tx_id: 1,
            native: HashMap::new(),
            tokens: HashMap::new(),
            registry: Registry::new(Address(0)),
            pools: Slab::new(),
            pool_index: HashMap::new(),
            delegates: HashMap::new(),
        };
        let registry_address = chain.fresh_address();
        chain.registry = Registry::new(registry_address);
        chain.native.insert(registry_address, 0);
        chain
    }

    fn fresh_address(&mut self) -> Address {
        let addr = Address(self.next_address);
        self.next_address += 1;
        addr
    }

    // ========================================================================
    // Deployment
    // ========================================================================

    /// Create a user account holding `initial_native` mutez.
    pub fn create_account(&mut self, initial_native: u64) -> Address {
        let addr = self.fresh_address();
        self.native.insert(addr, initial_native);
        addr
    }

    /// Deploy a token ledger; the full supply is credited to `owner`.
    pub fn deploy_token(&mut self, owner: Address, total_supply: u64) -> Address {
        let addr = self.fresh_address();
        self.tokens.insert(addr, TokenLedger::new(owner, total_supply));
        addr
    }

    /// Deploy an exchange for `token` and register the pair.
    ///
    /// Fails if `fee_rate` is zero, `token` is not a deployed ledger, or
    /// the token already has an exchange.
    pub fn deploy_exchange(
        &mut self,
        fee_rate: u64,
        token: Address,
        delegate: ValidatorKey,
    ) -> Result<Address> {
        if fee_rate == 0 {
            return Err(Error::InvalidFeeRate);
        }
        if !self.tokens.contains_key(&token) {
            return Err(Error::UnknownContract { address: token });
        }

        let addr = self.fresh_address();
        self.registry.launch_exchange(token, addr)?;

        let pool = Exchange::new(addr, fee_rate, token, self.registry.address, delegate);
        let key = self.pools.insert(pool);
        self.pool_index.insert(addr, key);
        self.native.insert(addr, 0);
        Ok(addr)
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Native balance of any account or contract (mutez).
    pub fn native_balance(&self, address: Address) -> u64 {
        self.native.get(&address).copied().unwrap_or(0)
    }

    /// The ledger deployed at `token`, if any.
    pub fn token(&self, token: Address) -> Option<&TokenLedger> {
        self.tokens.get(&token)
    }

    /// The state of the pool deployed at `exchange`, if any.
    pub fn pool_state(&self, exchange: Address) -> Option<&PoolState> {
        let key = *self.pool_index.get(&exchange)?;
        Some(&self.pools[key].state)
    }

    /// The trusted registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Where a contract's delegation currently points.
    pub fn delegate_of(&self, contract: Address) -> Option<ValidatorKey> {
        self.delegates.get(&contract).copied()
    }

    /// Number of deployed exchanges.
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    // ========================================================================
    // Direct collaborator calls (no deferred effects involved)
    // ========================================================================

    /// Authorize `spender` on the ledger at `token`.
    pub fn approve_token(
        &mut self,
        token: Address,
        sender: Address,
        spender: Address,
        value: u64,
    ) -> Result<()> {
        let ledger = self
            .tokens
            .get_mut(&token)
            .ok_or(Error::UnknownContract { address: token })?;
        ledger.approve(sender, spender, value);
        Ok(())
    }

    /// Move tokens out of the sender's own balance.
    pub fn transfer_token(
        &mut self,
        token: Address,
        sender: Address,
        to: Address,
        value: u64,
    ) -> Result<()> {
        let ledger = self
            .tokens
            .get_mut(&token)
            .ok_or(Error::UnknownContract { address: token })?;
        ledger.transfer(sender, sender, to, value)
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Execute one transaction atomically.
    ///
    /// On success, returns a receipt carrying the post-commit state
    /// root. On failure, every contract touched is restored to its
    /// pre-transaction state and the error is surfaced unchanged.
    pub fn execute(&mut self, tx: Transaction) -> Result<TxReceipt> {
        let snapshot = self.clone();

        match self.apply(&tx) {
            Ok(effects_applied) => {
                let tx_id = self.next_tx_id;
                self.next_tx_id += 1;
                Ok(TxReceipt::new(tx_id, effects_applied, self.state_root()))
            }
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    /// Run the entry point and drain the deferred-effect queue.
    /// Returns the number of effects applied.
    fn apply(&mut self, tx: &Transaction) -> Result<u64> {
        // Attached value moves into the target's custody up front, the
        // way the host chain credits a contract before its code runs.
        self.debit_native(tx.sender, tx.amount)?;
        self.credit_native(tx.target, tx.amount);

        let key = *self
            .pool_index
            .get(&tx.target)
            .ok_or(Error::UnknownContract { address: tx.target })?;
        let env = Env::new(tx.sender, tx.amount);
        let effects = dispatch(&mut self.pools[key], &env, &tx.op)?;

        let mut queue: VecDeque<(Address, Effect)> =
            effects.into_iter().map(|e| (tx.target, e)).collect();
        let mut applied = 0u64;

        while let Some((source, effect)) = queue.pop_front() {
            applied += 1;
            match effect {
                Effect::TokenTransfer { token, from, to, value } => {
                    let ledger = self
                        .tokens
                        .get_mut(&token)
                        .ok_or(Error::UnknownContract { address: token })?;
                    // The emitting contract is the ledger caller, so
                    // allowance rules bind third-party pulls.
                    ledger.transfer(source, from, to, value)?;
                }
                Effect::NativeSend { to, amount } => {
                    self.debit_native(source, amount)?;
                    self.credit_native(to, amount);
                }
                Effect::RegistryForward { token_out, recipient, min_tokens_out, amount } => {
                    let registry_address = self.registry.address;
                    self.debit_native(source, amount)?;
                    self.credit_native(registry_address, amount);

                    let destination = self.registry.lookup(token_out)?;
                    let dest_key = *self
                        .pool_index
                        .get(&destination)
                        .ok_or(Error::UnknownContract { address: destination })?;

                    self.debit_native(registry_address, amount)?;
                    self.credit_native(destination, amount);

                    let reentry_env = Env::new(registry_address, amount);
                    let more = self.pools[dest_key].receive_from_registry(
                        &reentry_env,
                        recipient,
                        min_tokens_out,
                    )?;
                    for effect in more {
                        queue.push_back((destination, effect));
                    }
                }
                Effect::SetDelegate { validator } => {
                    self.delegates.insert(source, validator);
                }
            }
        }

        Ok(applied)
    }

    fn debit_native(&mut self, from: Address, amount: u64) -> Result<()> {
        let balance = self.native_balance(from);
        if amount > balance {
            return Err(Error::InsufficientBalance { balance, required: amount });
        }
        self.native.insert(from, balance - amount);
        Ok(())
    }

    fn credit_native(&mut self, to: Address, amount: u64) {
        *self.native.entry(to).or_insert(0) += amount;
    }

    // ========================================================================
    // State root
    // ========================================================================

    /// SHA-256 root over every pool, native balance, token ledger and
    /// delegation entry, in sorted order. Identical chains produce
    /// identical roots; a rolled-back transaction leaves it unchanged.
    pub fn state_root(&self) -> [u8; 32] {
        let mut bytes = Vec::new();

        let mut pool_addrs: Vec<Address> = self.pool_index.keys().copied().collect();
        pool_addrs.sort();
        for addr in pool_addrs {
            let key = self.pool_index[&addr];
            bytes.extend_from_slice(&addr.0.to_le_bytes());
            bytes.extend_from_slice(&self.pools[key].state.state_root());
        }

        let mut natives: Vec<(Address, u64)> =
            self.native.iter().map(|(a, b)| (*a, *b)).collect();
        natives.sort();
        for (addr, balance) in natives {
            bytes.extend_from_slice(&addr.0.to_le_bytes());
            bytes.extend_from_slice(&balance.to_le_bytes());
        }

        let mut token_addrs: Vec<Address> = self.tokens.keys().copied().collect();
        token_addrs.sort();
        for addr in token_addrs {
            let ledger = &self.tokens[&addr];
            bytes.extend_from_slice(&addr.0.to_le_bytes());
            bytes.extend_from_slice(&ledger.total_supply().to_le_bytes());
            bytes.extend_from_slice(&ledger.digest());
        }

        let mut delegates: Vec<(Address, ValidatorKey)> =
            self.delegates.iter().map(|(a, k)| (*a, *k)).collect();
        delegates.sort();
        for (addr, key) in delegates {
            bytes.extend_from_slice(&addr.0.to_le_bytes());
            bytes.extend_from_slice(&key.0.to_le_bytes());
        }

        hash_bytes(&bytes)
    }
}

/// Route an operation to the matching entry point.
fn dispatch(pool: &mut Exchange, env: &Env, op: &Operation) -> Result<Vec<Effect>> {
    match *op {
        Operation::InitializeExchange { token_amount, candidate } => {
            pool.initialize(env, token_amount, candidate)
        }
        Operation::TezToTokenPayment { recipient, min_tokens_out } => {
            pool.tez_to_token_payment(env, recipient, min_tokens_out)
        }
        Operation::TezToTokenSwap { min_tokens_out } => {
            pool.tez_to_token_swap(env, min_tokens_out)
        }
        Operation::TokenToTezPayment { recipient, tokens_in, min_tez_out } => {
            pool.token_to_tez_payment(env, recipient, tokens_in, min_tez_out)
        }
        Operation::TokenToTezSwap { tokens_in, min_tez_out } => {
            pool.token_to_tez_swap(env, tokens_in, min_tez_out)
        }
        Operation::TokenToTokenPayment { recipient, tokens_in, min_tokens_out, token_out } => {
            pool.token_to_token_payment(env, recipient, tokens_in, min_tokens_out, token_out)
        }
        Operation::TokenToTokenSwap { tokens_in, min_tokens_out, token_out } => {
            pool.token_to_token_swap(env, tokens_in, min_tokens_out, token_out)
        }
        Operation::InvestLiquidity { candidate, min_shares } => {
            pool.invest_liquidity(env, candidate, min_shares)
        }
        Operation::DivestLiquidity { shares_burned, min_tez, min_tokens } => {
            pool.divest_liquidity(env, shares_burned, min_tez, min_tokens)
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
