//! Account and validator identities.
//!
//! Contracts and user accounts share one flat address space. Validator
//! identities (the key hashes nominated for delegation) live in their own
//! space and never collide with addresses.
//!
//! Both are thin wrappers over `u64` so they stay `Copy`, hashable and
//! cheap to compare, while keeping the two spaces apart at the type level.

use std::fmt;

// ============================================================================
// Address
// ============================================================================

/// Address of an account or contract.
///
/// Addresses are assigned sequentially by the chain; `Address(0)` is never
/// handed out and can serve as a sentinel in tests.
///
/// # Example
///
/// ```
/// use dexpool::types::Address;
///
/// let a = Address(7);
/// assert_eq!(format!("{}", a), "addr#0000007");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub u64);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "addr#{:07}", self.0)
    }
}

// ============================================================================
// ValidatorKey
// ============================================================================

/// Identity of a validator (delegation candidate).
///
/// Liquidity providers nominate a `ValidatorKey` with every liquidity
/// change; the pool delegates to whichever candidate holds the most
/// share-backed votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ValidatorKey(pub u64);

impl fmt::Display for ValidatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validator#{:07}", self.0)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display() {
        assert_eq!(Address(1).to_string(), "addr#0000001");
        assert_eq!(Address(1234567).to_string(), "addr#1234567");
    }

    #[test]
    fn test_validator_display() {
        assert_eq!(ValidatorKey(42).to_string(), "validator#0000042");
    }

    #[test]
    fn test_address_ordering() {
        let mut v = vec![Address(3), Address(1), Address(2)];
        v.sort();
        assert_eq!(v, vec![Address(1), Address(2), Address(3)]);
    }

    #[test]
    fn test_distinct_spaces() {
        // Same raw value, different types; must not be interchangeable.
        let a = Address(5);
        let k = ValidatorKey(5);
        assert_eq!(a.0, k.0);
    }
}
