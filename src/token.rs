//! Fungible-token ledger collaborator.
//!
//! Pools never hold token balances themselves; they instruct the
//! token's ledger to move value via deferred [`Effect::TokenTransfer`]
//! calls. The ledger enforces the two rules the pools rely on:
//!
//! - a transfer fails if it exceeds the source balance
//! - a third party (a pool pulling a deposit) needs an allowance from
//!   the source, which is debited as it is spent
//!
//! Minting and burning are owner-only.
//!
//! [`Effect::TokenTransfer`]: crate::types::Effect::TokenTransfer

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{hash_bytes, Address};

/// Per-holder record: balance plus spender allowances.
#[derive(Debug, Clone, Default)]
pub struct TokenAccount {
    pub balance: u64,
    pub allowances: HashMap<Address, u64>,
}

/// One fungible-token ledger.
#[derive(Debug, Clone)]
pub struct TokenLedger {
    owner: Address,
    total_supply: u64,
    accounts: HashMap<Address, TokenAccount>,
}

impl TokenLedger {
    /// Create a ledger crediting the full initial supply to `owner`.
    pub fn new(owner: Address, total_supply: u64) -> Self {
        let mut accounts = HashMap::new();
        accounts.insert(
            owner,
            TokenAccount { balance: total_supply, allowances: HashMap::new() },
        );
        Self { owner, total_supply, accounts }
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Balance held by `account` (zero if absent).
    pub fn balance_of(&self, account: Address) -> u64 {
        self.accounts.get(&account).map_or(0, |a| a.balance)
    }

    /// Amount `spender` may still move out of `owner`'s account.
    pub fn allowance(&self, owner: Address, spender: Address) -> u64 {
        self.accounts
            .get(&owner)
            .and_then(|a| a.allowances.get(&spender).copied())
            .unwrap_or(0)
    }

    /// Total units in circulation.
    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    /// The minting/burning authority.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// SHA-256 digest over every balance and allowance, in sorted
    /// order. Zero entries are skipped, so ledgers that agree on every
    /// observable balance and allowance produce equal digests.
    pub fn digest(&self) -> [u8; 32] {
        let mut bytes = Vec::new();

        let mut holders: Vec<Address> = self.accounts.keys().copied().collect();
        holders.sort();
        for holder in holders {
            let account = &self.accounts[&holder];
            if account.balance > 0 {
                bytes.extend_from_slice(&holder.0.to_le_bytes());
                bytes.extend_from_slice(&account.balance.to_le_bytes());
            }

            let mut spenders: Vec<(Address, u64)> = account
                .allowances
                .iter()
                .filter(|(_, v)| **v > 0)
                .map(|(s, v)| (*s, *v))
                .collect();
            spenders.sort();
            for (spender, allowed) in spenders {
                bytes.extend_from_slice(&holder.0.to_le_bytes());
                bytes.extend_from_slice(&spender.0.to_le_bytes());
                bytes.extend_from_slice(&allowed.to_le_bytes());
            }
        }

        hash_bytes(&bytes)
    }

    // ========================================================================
    // Transfers
    // ========================================================================

    /// Move `value` from `from` to `to` on behalf of `sender`.
    ///
    /// When `sender != from`, the sender's allowance must cover `value`
    /// and is debited by it. A self-transfer only checks the balance.
    pub fn transfer(
        &mut self,
        sender: Address,
        from: Address,
        to: Address,
        value: u64,
    ) -> Result<()> {
        let third_party = sender != from;
        if third_party && from != to {
            let allowed = self.allowance(from, sender);
            if allowed < value {
                return Err(Error::NotAllowed { spender: sender });
            }
        }

        let balance = self.balance_of(from);
        if value > balance {
            return Err(Error::InsufficientBalance { balance, required: value });
        }

        if from == to {
            return Ok(());
        }

        {
            let src = self.accounts.entry(from).or_default();
            src.balance -= value;
            if third_party {
                if let Some(allowed) = src.allowances.get_mut(&sender) {
                    *allowed -= value;
                }
            }
        }
        self.accounts.entry(to).or_default().balance += value;

        Ok(())
    }

    /// Authorize `spender` to move up to `value` from the sender's
    /// account. The grant is capped at the sender's current balance;
    /// self-approval is a no-op.
    pub fn approve(&mut self, sender: Address, spender: Address, value: u64) {
        if sender == spender {
            return;
        }
        let balance = self.balance_of(sender);
        let granted = value.min(balance);
        self.accounts
            .entry(sender)
            .or_default()
            .allowances
            .insert(spender, granted);
    }

    // ========================================================================
    // Supply management (owner only)
    // ========================================================================

    /// Mint `value` new units to the owner's account.
    pub fn mint(&mut self, sender: Address, value: u64) -> Result<()> {
        if sender != self.owner {
            return Err(Error::NotOwner { caller: sender });
        }
        self.accounts.entry(self.owner).or_default().balance += value;
        self.total_supply += value;
        Ok(())
    }

    /// Burn `value` units from the owner's account.
    pub fn burn(&mut self, sender: Address, value: u64) -> Result<()> {
        if sender != self.owner {
            return Err(Error::NotOwner { caller: sender });
        }
        let balance = self.balance_of(self.owner);
        if value > balance {
            return Err(Error::InsufficientBalance { balance, required: value });
        }
        self.accounts.entry(self.owner).or_default().balance -= value;
        self.total_supply -= value;
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: Address = Address(10);
    const ALICE: Address = Address(11);
    const BOB: Address = Address(12);

    #[test]
    fn test_initial_supply_to_owner() {
        let ledger = TokenLedger::new(ADMIN, 100);
        assert_eq!(ledger.balance_of(ADMIN), 100);
        assert_eq!(ledger.total_supply(), 100);
        assert_eq!(ledger.balance_of(ALICE), 0);
    }

    #[test]
    fn test_direct_transfer() {
        let mut ledger = TokenLedger::new(ADMIN, 100);
        ledger.transfer(ADMIN, ADMIN, ALICE, 30).unwrap();

        assert_eq!(ledger.balance_of(ADMIN), 70);
        assert_eq!(ledger.balance_of(ALICE), 30);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut ledger = TokenLedger::new(ADMIN, 100);
        assert_eq!(
            ledger.transfer(ADMIN, ADMIN, ALICE, 101).unwrap_err(),
            Error::InsufficientBalance { balance: 100, required: 101 }
        );
    }

    #[test]
    fn test_third_party_needs_allowance() {
        let mut ledger = TokenLedger::new(ADMIN, 100);

        assert_eq!(
            ledger.transfer(BOB, ADMIN, ALICE, 10).unwrap_err(),
            Error::NotAllowed { spender: BOB }
        );

        ledger.approve(ADMIN, BOB, 10);
        ledger.transfer(BOB, ADMIN, ALICE, 10).unwrap();

        assert_eq!(ledger.balance_of(ALICE), 10);
        // Allowance debited as spent.
        assert_eq!(ledger.allowance(ADMIN, BOB), 0);
        assert_eq!(
            ledger.transfer(BOB, ADMIN, ALICE, 1).unwrap_err(),
            Error::NotAllowed { spender: BOB }
        );
    }

    #[test]
    fn test_approve_capped_at_balance() {
        let mut ledger = TokenLedger::new(ADMIN, 100);
        ledger.approve(ADMIN, BOB, 1_000);
        assert_eq!(ledger.allowance(ADMIN, BOB), 100);
    }

    #[test]
    fn test_self_transfer_is_noop() {
        let mut ledger = TokenLedger::new(ADMIN, 100);
        ledger.transfer(ADMIN, ADMIN, ADMIN, 50).unwrap();
        assert_eq!(ledger.balance_of(ADMIN), 100);
    }

    #[test]
    fn test_digest_tracks_state() {
        let mut ledger = TokenLedger::new(ADMIN, 100);
        let before = ledger.digest();

        ledger.transfer(ADMIN, ADMIN, ALICE, 30).unwrap();
        assert_ne!(ledger.digest(), before);

        ledger.transfer(ALICE, ALICE, ADMIN, 30).unwrap();
        assert_eq!(ledger.digest(), before);
    }

    #[test]
    fn test_mint_owner_only() {
        let mut ledger = TokenLedger::new(ADMIN, 100);

        assert_eq!(
            ledger.mint(ALICE, 10).unwrap_err(),
            Error::NotOwner { caller: ALICE }
        );

        ledger.mint(ADMIN, 20).unwrap();
        assert_eq!(ledger.balance_of(ADMIN), 120);
        assert_eq!(ledger.total_supply(), 120);
    }

    #[test]
    fn test_burn_owner_only_and_bounded() {
        let mut ledger = TokenLedger::new(ADMIN, 100);

        assert_eq!(
            ledger.burn(ALICE, 10).unwrap_err(),
            Error::NotOwner { caller: ALICE }
        );
        assert_eq!(
            ledger.burn(ADMIN, 101).unwrap_err(),
            Error::InsufficientBalance { balance: 100, required: 101 }
        );

        ledger.burn(ADMIN, 40).unwrap();
        assert_eq!(ledger.balance_of(ADMIN), 60);
        assert_eq!(ledger.total_supply(), 60);
    }
}
