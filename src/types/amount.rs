//! Fixed-point settlement-amount utilities.
//!
//! ## Overview
//!
//! All settlement-asset amounts are stored as `u64` in the smallest unit
//! (mutez), scaled by 10^6. Token amounts are plain integer units with no
//! scaling. Pool math never touches floating point; products are widened
//! to `u128` and every division floors toward zero.
//!
//! ## Why Fixed-Point?
//!
//! Floating-point arithmetic can produce different results on different
//! hardware, breaking determinism. Fixed-point ensures identical results
//! everywhere.
//!
//! ## Examples
//!
//! ```
//! use dexpool::types::amount::{to_mutez, from_mutez, tez};
//!
//! assert_eq!(to_mutez("1.5"), Some(1_500_000));
//! assert_eq!(from_mutez(1_500_000), "1.500000");
//! assert_eq!(tez(3), 3_000_000);
//! ```

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Scaling factor for the settlement asset: 10^6 mutez per whole unit.
pub const MUTEZ_SCALE: u64 = 1_000_000;

/// Maximum whole-unit value that can be safely represented.
///
/// u64::MAX / MUTEZ_SCALE ≈ 18.4 trillion whole units.
pub const MAX_VALUE: u64 = u64::MAX / MUTEZ_SCALE;

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert a whole-unit count to mutez.
///
/// # Example
///
/// ```
/// use dexpool::types::amount::tez;
///
/// assert_eq!(tez(1), 1_000_000);
/// assert_eq!(tez(500), 500_000_000);
/// ```
#[inline]
pub const fn tez(whole: u64) -> u64 {
    whole * MUTEZ_SCALE
}

/// Convert a decimal string to mutez.
///
/// # Returns
///
/// * `Some(u64)` - the fixed-point representation
/// * `None` - if parsing fails, the value is negative, or out of range
///
/// # Example
///
/// ```
/// use dexpool::types::amount::to_mutez;
///
/// assert_eq!(to_mutez("1.0"), Some(1_000_000));
/// assert_eq!(to_mutez("0.000001"), Some(1));
/// assert_eq!(to_mutez("-1"), None);
/// ```
pub fn to_mutez(s: &str) -> Option<u64> {
    let decimal = Decimal::from_str(s).ok()?;
    decimal_to_mutez(decimal)
}

/// Convert a `Decimal` to mutez.
///
/// Returns `None` if the value is negative or out of range.
pub fn decimal_to_mutez(d: Decimal) -> Option<u64> {
    if d.is_sign_negative() {
        return None;
    }

    let scaled = d.checked_mul(Decimal::from(MUTEZ_SCALE))?;
    let rounded = scaled.round_dp(0);
    rounded.to_u64()
}

/// Convert mutez to a `Decimal` in whole units.
pub fn mutez_to_decimal(value: u64) -> Decimal {
    Decimal::from(value) / Decimal::from(MUTEZ_SCALE)
}

/// Convert mutez to a string with 6 decimal places.
///
/// # Example
///
/// ```
/// use dexpool::types::amount::from_mutez;
///
/// assert_eq!(from_mutez(1_000_000), "1.000000");
/// assert_eq!(from_mutez(1), "0.000001");
/// ```
pub fn from_mutez(value: u64) -> String {
    let decimal = mutez_to_decimal(value);
    format!("{:.6}", decimal)
}

/// Convert mutez to a human-readable string (trailing zeros trimmed).
///
/// # Example
///
/// ```
/// use dexpool::types::amount::from_mutez_trimmed;
///
/// assert_eq!(from_mutez_trimmed(1_000_000), "1");
/// assert_eq!(from_mutez_trimmed(1_500_000), "1.5");
/// ```
pub fn from_mutez_trimmed(value: u64) -> String {
    let decimal = mutez_to_decimal(value);
    format!("{}", decimal.normalize())
}

// ============================================================================
// Unit Tests
// ============================================================================
