//! Exchange entry points: swaps, liquidity, delegation.
//!
//! ## Execution Contract
//!
//! Every entry point takes an [`Env`] (who called, how much native value
//! was attached) and returns the deferred [`Effect`]s to run after the
//! local commit. Guards run before any mutation: a rejected operation
//! leaves the pool byte-identical to how it found it. The chain rolls
//! back the commit too if any *deferred* effect later fails, so callers
//! observe all-or-nothing execution across every contract touched.
//!
//! ## Entry Points
//!
//! | Operation | Direction | Notes |
//! |-----------|-----------|-------|
//! | `initialize` | - | one-time, mints the first 1000 shares |
//! | `tez_to_token_payment` / `_swap` | settlement -> token | input = attached value |
//! | `token_to_tez_payment` / `_swap` | token -> settlement | pulls tokens from the caller |
//! | `token_to_token_payment` / `_swap` | token -> token | two-phase via the registry |
//! | `receive_from_registry` | settlement -> token | guarded re-entry, registry only |
//! | `invest_liquidity` | - | buys shares, updates votes, may switch delegate |
//! | `divest_liquidity` | - | burns shares pro-rata, never switches delegate |

use crate::error::{Error, Result};
use crate::pool::pricing;
use crate::pool::state::PoolState;
use crate::types::{Address, Effect, ValidatorKey};

// ============================================================================
// Constants
// ============================================================================

/// Shares minted to the first provider by `initialize`.
pub const INITIAL_SHARES: u64 = 1_000;

/// `initialize` rejects deposits at or below this (mutez, exclusive).
pub const MIN_INITIAL_DEPOSIT: u64 = 1;

/// `initialize` rejects deposits at or above this (mutez, exclusive).
pub const MAX_INITIAL_DEPOSIT: u64 = 500_000_000 * crate::types::amount::MUTEZ_SCALE;

/// `initialize` rejects token deposits at or below this (exclusive).
pub const MIN_INITIAL_TOKENS: u64 = 10;

// ============================================================================
// Env
// ============================================================================

/// Ambient context of one entry-point call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Env {
    /// The calling account or contract.
    pub sender: Address,

    /// Native value attached to the call, in mutez. Already credited to
    /// the pool's custody by the chain before dispatch.
    pub amount: u64,
}

impl Env {
    /// Convenience constructor.
    pub fn new(sender: Address, amount: u64) -> Self {
        Self { sender, amount }
    }
}

// ============================================================================
// Exchange
// ============================================================================

/// One deployed pool: its address plus its persistent state.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// This pool's own address (custodian of reserves).
    pub address: Address,

    /// Persistent pool state.
    pub state: PoolState,
}

impl Exchange {
    /// Create an empty pool. `fee_rate` is the fee divisor and must be
    /// positive; `delegated` seeds the delegation pointer until the
    /// first provider nominates a candidate.
    pub fn new(
        address: Address,
        fee_rate: u64,
        token_address: Address,
        registry_address: Address,
        delegated: ValidatorKey,
    ) -> Self {
        Self {
            address,
            state: PoolState::new(fee_rate, token_address, registry_address, delegated),
        }
    }

    // ========================================================================
    // Initialization
    // ========================================================================

    /// One-time transition from empty to active.
    ///
    /// Mints exactly [`INITIAL_SHARES`] to the caller, records their
    /// candidate with the full vote weight, sets the delegate, and pulls
    /// `token_amount` tokens into custody.
    pub fn initialize(
        &mut self,
        env: &Env,
        token_amount: u64,
        candidate: ValidatorKey,
    ) -> Result<Vec<Effect>> {
        if self.state.invariant != 0 || self.state.total_shares != 0 {
            return Err(Error::AlreadyInitialized);
        }
        if env.amount <= MIN_INITIAL_DEPOSIT || env.amount >= MAX_INITIAL_DEPOSIT {
            return Err(Error::DepositOutOfRange { amount: env.amount });
        }
        if token_amount <= MIN_INITIAL_TOKENS {
            return Err(Error::TokenAmountTooSmall { amount: token_amount });
        }

        self.state.tez_pool = env.amount;
        self.state.token_pool = token_amount;
        self.state.recompute_invariant();
        self.state.set_share(env.sender, INITIAL_SHARES);
        self.state.total_shares = INITIAL_SHARES;

        self.state.set_candidate(env.sender, candidate);
        self.state.set_votes(candidate, INITIAL_SHARES);
        self.state.delegated = candidate;

        Ok(vec![
            Effect::TokenTransfer {
                token: self.state.token_address,
                from: env.sender,
                to: self.address,
                value: token_amount,
            },
            Effect::SetDelegate { validator: candidate },
        ])
    }

    // ========================================================================
    // Single-hop swaps: settlement -> token
    // ========================================================================

    /// Settlement -> token, output to an explicit recipient.
    pub fn tez_to_token_payment(
        &mut self,
        env: &Env,
        recipient: Address,
        min_tokens_out: u64,
    ) -> Result<Vec<Effect>> {
        self.tez_to_token(recipient, env.amount, min_tokens_out)
    }

    /// Settlement -> token, output back to the caller.
    pub fn tez_to_token_swap(&mut self, env: &Env, min_tokens_out: u64) -> Result<Vec<Effect>> {
        self.tez_to_token(env.sender, env.amount, min_tokens_out)
    }

    /// Shared settlement -> token leg. `tez_in` has already been
    /// credited to pool custody by the chain.
    fn tez_to_token(
        &mut self,
        recipient: Address,
        tez_in: u64,
        min_tokens_out: u64,
    ) -> Result<Vec<Effect>> {
        if tez_in == 0 || min_tokens_out == 0 {
            return Err(Error::ZeroAmount);
        }
        if self.state.tez_pool.checked_add(tez_in).is_none() {
            return Err(Error::AmountOverflow);
        }

        let q = pricing::quote(
            self.state.tez_pool,
            self.state.token_pool,
            self.state.invariant,
            tez_in,
            self.state.fee_rate,
        )
        .ok_or(Error::NotInitialized)?;

        if q.amount_out < min_tokens_out {
            return Err(Error::SlippageExceeded {
                amount_out: q.amount_out,
                min_out: min_tokens_out,
            });
        }
        // Inclusive bound: an output equal to the reserve passes, which
        // can leave the pool one-sided while shares remain (see DESIGN.md).
        if q.amount_out > self.state.token_pool {
            return Err(Error::InsufficientReserve {
                amount_out: q.amount_out,
                reserve: self.state.token_pool,
            });
        }

        self.state.tez_pool = q.new_reserve_in;
        self.state.token_pool = q.new_reserve_out;
        self.state.recompute_invariant();

        Ok(vec![Effect::TokenTransfer {
            token: self.state.token_address,
            from: self.address,
            to: recipient,
            value: q.amount_out,
        }])
    }

    // ========================================================================
    // Single-hop swaps: token -> settlement
    // ========================================================================

    /// Token -> settlement, output to an explicit recipient.
    pub fn token_to_tez_payment(
        &mut self,
        env: &Env,
        recipient: Address,
        tokens_in: u64,
        min_tez_out: u64,
    ) -> Result<Vec<Effect>> {
        self.token_to_tez(env.sender, recipient, tokens_in, min_tez_out)
    }

    /// Token -> settlement, output back to the caller.
    pub fn token_to_tez_swap(
        &mut self,
        env: &Env,
        tokens_in: u64,
        min_tez_out: u64,
    ) -> Result<Vec<Effect>> {
        self.token_to_tez(env.sender, env.sender, tokens_in, min_tez_out)
    }

    /// Shared token -> settlement leg. Pulls `tokens_in` from `buyer`
    /// into custody, then sends the priced settlement leg to `recipient`.
    fn token_to_tez(
        &mut self,
        buyer: Address,
        recipient: Address,
        tokens_in: u64,
        min_tez_out: u64,
    ) -> Result<Vec<Effect>> {
        if tokens_in == 0 || min_tez_out == 0 {
            return Err(Error::ZeroAmount);
        }
        if self.state.token_pool.checked_add(tokens_in).is_none() {
            return Err(Error::AmountOverflow);
        }

        let q = pricing::quote(
            self.state.token_pool,
            self.state.tez_pool,
            self.state.invariant,
            tokens_in,
            self.state.fee_rate,
        )
        .ok_or(Error::NotInitialized)?;

        if q.amount_out < min_tez_out {
            return Err(Error::SlippageExceeded {
                amount_out: q.amount_out,
                min_out: min_tez_out,
            });
        }
        // Inclusive bound: an output equal to the reserve passes, which
        // can leave the pool one-sided while shares remain (see DESIGN.md).
        if q.amount_out > self.state.tez_pool {
            return Err(Error::InsufficientReserve {
                amount_out: q.amount_out,
                reserve: self.state.tez_pool,
            });
        }

        self.state.token_pool = q.new_reserve_in;
        self.state.tez_pool = q.new_reserve_out;
        self.state.recompute_invariant();

        Ok(vec![
            Effect::TokenTransfer {
                token: self.state.token_address,
                from: buyer,
                to: self.address,
                value: tokens_in,
            },
            Effect::NativeSend {
                to: recipient,
                amount: q.amount_out,
            },
        ])
    }

    // ========================================================================
    // Two-hop swaps: token -> token via the registry
    // ========================================================================

    /// Token -> token, output to an explicit recipient.
    pub fn token_to_token_payment(
        &mut self,
        env: &Env,
        recipient: Address,
        tokens_in: u64,
        min_tokens_out: u64,
        token_out: Address,
    ) -> Result<Vec<Effect>> {
        self.token_to_token_out(env.sender, recipient, tokens_in, min_tokens_out, token_out)
    }

    /// Token -> token, output back to the caller.
    pub fn token_to_token_swap(
        &mut self,
        env: &Env,
        tokens_in: u64,
        min_tokens_out: u64,
        token_out: Address,
    ) -> Result<Vec<Effect>> {
        self.token_to_token_out(env.sender, env.sender, tokens_in, min_tokens_out, token_out)
    }

    /// Phase 1 of a token -> token swap: run the token -> settlement leg
    /// locally, then hand the settlement output to the registry, which
    /// resolves `token_out` and re-enters the destination pool.
    ///
    /// The caller's `min_tokens_out` is *not* checked here; it travels
    /// with the forward and is enforced by the destination pool's leg.
    /// If that check fails, this pool's commit rolls back with it.
    fn token_to_token_out(
        &mut self,
        buyer: Address,
        recipient: Address,
        tokens_in: u64,
        min_tokens_out: u64,
        token_out: Address,
    ) -> Result<Vec<Effect>> {
        if tokens_in == 0 || min_tokens_out == 0 {
            return Err(Error::ZeroAmount);
        }
        if self.state.token_pool.checked_add(tokens_in).is_none() {
            return Err(Error::AmountOverflow);
        }

        let q = pricing::quote(
            self.state.token_pool,
            self.state.tez_pool,
            self.state.invariant,
            tokens_in,
            self.state.fee_rate,
        )
        .ok_or(Error::NotInitialized)?;

        // Inclusive bound: an output equal to the reserve passes, which
        // can leave the pool one-sided while shares remain (see DESIGN.md).
        if q.amount_out > self.state.tez_pool {
            return Err(Error::InsufficientReserve {
                amount_out: q.amount_out,
                reserve: self.state.tez_pool,
            });
        }

        self.state.token_pool = q.new_reserve_in;
        self.state.tez_pool = q.new_reserve_out;
        self.state.recompute_invariant();

        Ok(vec![
            Effect::TokenTransfer {
                token: self.state.token_address,
                from: buyer,
                to: self.address,
                value: tokens_in,
            },
            Effect::RegistryForward {
                token_out,
                recipient,
                min_tokens_out,
                amount: q.amount_out,
            },
        ])
    }

    /// Phase 3 of a token -> token swap: guarded re-entry.
    ///
    /// Accepts the call only from the trusted registry, then behaves as
    /// an ordinary settlement -> token swap of the attached value.
    pub fn receive_from_registry(
        &mut self,
        env: &Env,
        recipient: Address,
        min_tokens_out: u64,
    ) -> Result<Vec<Effect>> {
        if env.sender != self.state.registry_address {
            return Err(Error::UnauthorizedCaller { caller: env.sender });
        }
        self.tez_to_token(recipient, env.amount, min_tokens_out)
    }

    // ========================================================================
    // Liquidity provisioning
    // ========================================================================

    /// Buy shares with the attached settlement deposit.
    ///
    /// Shares are priced at the current settlement-per-share floor; the
    /// matching token amount is pulled from the caller. The caller's
    /// vote weight moves to `candidate`, and the pool's delegate
    /// switches if the candidate's total meets or exceeds the
    /// incumbent's.
    pub fn invest_liquidity(
        &mut self,
        env: &Env,
        candidate: ValidatorKey,
        min_shares: u64,
    ) -> Result<Vec<Effect>> {
        if env.amount == 0 || min_shares == 0 {
            return Err(Error::ZeroAmount);
        }
        if self.state.total_shares == 0 {
            return Err(Error::NotInitialized);
        }

        let tez_per_share = self.state.tez_pool / self.state.total_shares;
        if tez_per_share == 0 {
            // Reserve-to-share ratio floored to nothing; no price exists.
            return Err(Error::InsufficientLiquidity);
        }
        if env.amount < tez_per_share {
            return Err(Error::BelowSharePrice {
                amount: env.amount,
                tez_per_share,
            });
        }

        let shares_purchased = env.amount / tez_per_share;
        if shares_purchased < min_shares {
            return Err(Error::TooFewShares {
                purchased: shares_purchased,
                min_shares,
            });
        }

        let tokens_per_share = self.state.token_pool / self.state.total_shares;
        let tokens_required = shares_purchased
            .checked_mul(tokens_per_share)
            .ok_or(Error::AmountOverflow)?;

        // Compute every post-state value before mutating anything, so an
        // overflowing deposit is rejected with the pool untouched.
        let prior_share = self.state.share_of(env.sender);
        let new_share = prior_share
            .checked_add(shares_purchased)
            .ok_or(Error::AmountOverflow)?;
        let new_tez_pool = self.state.tez_pool
            .checked_add(env.amount)
            .ok_or(Error::AmountOverflow)?;
        let new_token_pool = self.state.token_pool
            .checked_add(tokens_required)
            .ok_or(Error::AmountOverflow)?;
        let new_total_shares = self.state.total_shares
            .checked_add(shares_purchased)
            .ok_or(Error::AmountOverflow)?;

        self.state.set_share(env.sender, new_share);
        self.state.tez_pool = new_tez_pool;
        self.state.token_pool = new_token_pool;
        self.state.recompute_invariant();
        self.state.total_shares = new_total_shares;

        // Move the caller's pre-purchase weight off their old candidate
        // before crediting the new one.
        if let Some(old) = self.state.candidate_of(env.sender) {
            let prev = self.state.votes_for(old);
            self.state.set_votes(old, prev.abs_diff(prior_share));
        }
        self.state.set_candidate(env.sender, candidate);
        let new_votes = self.state.votes_for(candidate) + prior_share + shares_purchased;
        self.state.set_votes(candidate, new_votes);

        let mut effects = vec![Effect::TokenTransfer {
            token: self.state.token_address,
            from: env.sender,
            to: self.address,
            value: tokens_required,
        }];

        // The incumbent's total is read after the old-candidate
        // subtraction above; ties go to the new candidate.
        let incumbent_votes = self.state.votes_for(self.state.delegated);
        if incumbent_votes <= new_votes {
            self.state.delegated = candidate;
            effects.push(Effect::SetDelegate { validator: candidate });
        }

        Ok(effects)
    }

    /// Burn shares and withdraw both legs pro-rata.
    ///
    /// The caller's balance must *strictly* exceed `shares_burned`: a
    /// provider can never burn their last share. Divestment reduces the
    /// caller's candidate's vote weight but never switches the delegate.
    pub fn divest_liquidity(
        &mut self,
        env: &Env,
        shares_burned: u64,
        min_tez: u64,
        min_tokens: u64,
    ) -> Result<Vec<Effect>> {
        if shares_burned == 0 {
            return Err(Error::ZeroAmount);
        }

        let share = self.state.share_of(env.sender);
        if share <= shares_burned {
            return Err(Error::InsufficientShares {
                balance: share,
                burned: shares_burned,
            });
        }

        let tez_per_share = self.state.tez_pool / self.state.total_shares;
        let tokens_per_share = self.state.token_pool / self.state.total_shares;
        let tez_divested = tez_per_share * shares_burned;
        let tokens_divested = tokens_per_share * shares_burned;

        if tez_divested < min_tez {
            return Err(Error::SlippageExceeded {
                amount_out: tez_divested,
                min_out: min_tez,
            });
        }
        if tokens_divested < min_tokens {
            return Err(Error::SlippageExceeded {
                amount_out: tokens_divested,
                min_out: min_tokens,
            });
        }

        self.state.set_share(env.sender, share.abs_diff(shares_burned));
        self.state.total_shares -= shares_burned;
        self.state.tez_pool -= tez_divested;
        self.state.token_pool -= tokens_divested;
        if self.state.total_shares == 0 {
            self.state.reset_invariant();
        } else {
            self.state.recompute_invariant();
        }

        if let Some(candidate) = self.state.candidate_of(env.sender) {
            let prev = self.state.votes_for(candidate);
            self.state.set_votes(candidate, prev.abs_diff(shares_burned));
        }

        Ok(vec![
            Effect::TokenTransfer {
                token: self.state.token_address,
                from: self.address,
                to: env.sender,
                value: tokens_divested,
            },
            Effect::NativeSend {
                to: env.sender,
                amount: tez_divested,
            },
        ])
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
