//! Constant-product pricing with fee capture.
//!
//! ## Pricing Model
//!
//! A swap of `amount_in` against reserves `(reserve_in, reserve_out)`
//! deposits the full input into the input-side reserve but prices the
//! output against the input minus the fee:
//!
//! ```text
//! fee            = amount_in / fee_rate                 (floor)
//! new_reserve_in = reserve_in + amount_in
//! priced_in      = new_reserve_in - fee
//! new_reserve_out = invariant / priced_in               (floor)
//! amount_out     = reserve_out - new_reserve_out
//! ```
//!
//! The fee is excluded from the priced leg but still lands in the
//! reserve, which pushes the reserve product upward as fees accumulate;
//! that drift is the protocol's entire fee-capture mechanism. A single
//! swap can still land the recomputed product slightly below the prior
//! invariant, because `invariant / priced_in` floors; the shortfall is
//! bounded by `new_reserve_in`.
//!
//! ## Rounding and Sign Policy
//!
//! All divisions floor toward zero. Subtractions that are mathematically
//! non-negative while the cached invariant holds are computed with
//! `abs_diff`, matching the source system's observable outputs. If the
//! invariant ever drifted, `abs_diff` would mask the negative difference
//! instead of failing; this is a known latent quirk kept for
//! compatibility (see DESIGN.md), not a feature.

/// Result of pricing a single-hop swap. Nothing is mutated; the
/// orchestrator decides whether to commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    /// Units leaving the output-side reserve.
    pub amount_out: u64,

    /// Input-side reserve after the swap (full input deposited).
    pub new_reserve_in: u64,

    /// Output-side reserve after the swap.
    pub new_reserve_out: u64,

    /// Fee retained by the pool, in input-side units.
    pub fee: u64,
}

/// Price a single-hop swap against the given reserves.
///
/// `invariant` is the pool's cached reserve product; it is the canonical
/// quantity this computation divides, not the product of the arguments.
///
/// Returns `None` when the priced input leg would be empty (an
/// uninitialized or fully drained pool) or when the input would push the
/// input-side reserve past `u64::MAX`; the caller must reject either
/// case - there is no meaningful price to quote. The orchestrator
/// screens the overflow case up front so it surfaces as a typed
/// rejection rather than a mislabeled one.
///
/// # Example
///
/// The reference scenario: reserves 1_000_000 / 2_000, fee rate 500,
/// swapping 10_000 settlement units.
///
/// ```
/// use dexpool::pool::pricing::quote;
///
/// let q = quote(1_000_000, 2_000, 2_000_000_000, 10_000, 500).unwrap();
/// assert_eq!(q.fee, 20);
/// assert_eq!(q.new_reserve_in, 1_010_000);
/// assert_eq!(q.new_reserve_out, 1_980);
/// assert_eq!(q.amount_out, 20);
/// ```
pub fn quote(
    reserve_in: u64,
    reserve_out: u64,
    invariant: u128,
    amount_in: u64,
    fee_rate: u64,
) -> Option<Quote> {
    let fee = amount_in / fee_rate;
    let new_reserve_in = reserve_in.checked_add(amount_in)?;

    // fee <= amount_in, so this is an ordinary subtraction whenever the
    // pool holds any input-side reserve.
    let priced_in = new_reserve_in.abs_diff(fee) as u128;
    if priced_in == 0 {
        return None;
    }

    let new_reserve_out = (invariant / priced_in) as u64;
    let amount_out = reserve_out.abs_diff(new_reserve_out);

    Some(Quote {
        amount_out,
        new_reserve_in,
        new_reserve_out,
        fee,
    })
}

// ============================================================================
// Unit Tests
// ============================================================================
