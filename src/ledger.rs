//! Position ledger.
//!
//! Per-user collateral balances and minted debt. The ledger is the only code
//! that mutates positions, and only the engine can reach its mutators. Amounts
//! are unsigned and every subtraction is checked, so a balance can never go
//! below zero.
//!
//! Each mutation records the previous value in a journal. The engine takes a
//! checkpoint when a call starts and unwinds to it if the call fails, so a
//! reverted call leaves no trace in any position.

use crate::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub collateral: BTreeMap<Address, U256>,
    pub debt: U256,
}

impl Position {
    pub fn collateral_of(&self, asset: Address) -> U256 {
        self.collateral.get(&asset).copied().unwrap_or(U256::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        self.debt.is_zero() && self.collateral.values().all(|v| v.is_zero())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Insufficient collateral: requested {requested}, available {available}")]
    InsufficientCollateral { requested: U256, available: U256 },

    #[error("Insufficient debt: requested {requested}, outstanding {outstanding}")]
    InsufficientDebt { requested: U256, outstanding: U256 },

    #[error("Balance overflow")]
    Overflow,
}

#[derive(Debug, Clone)]
enum JournalEntry {
    Collateral { user: Address, asset: Address, previous: U256 },
    Debt { user: Address, previous: U256 },
}

/// Opaque marker returned by [`PositionLedger::checkpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerCheckpoint(usize);

#[derive(Debug, Clone, Default)]
pub struct PositionLedger {
    positions: HashMap<Address, Position>,
    journal: Vec<JournalEntry>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, user: Address) -> Option<&Position> {
        self.positions.get(&user)
    }

    pub fn collateral_of(&self, user: Address, asset: Address) -> U256 {
        self.positions
            .get(&user)
            .map(|p| p.collateral_of(asset))
            .unwrap_or(U256::ZERO)
    }

    pub fn debt_of(&self, user: Address) -> U256 {
        self.positions.get(&user).map(|p| p.debt).unwrap_or(U256::ZERO)
    }

    pub fn users(&self) -> impl Iterator<Item = &Address> {
        self.positions.keys()
    }

    /// Adds `amount` to the user's balance of `asset`, returning the new balance.
    pub(crate) fn deposit(&mut self, user: Address, asset: Address, amount: U256) -> Result<U256, LedgerError> {
        let previous = self.collateral_of(user, asset);
        let updated = previous.checked_add(amount).ok_or(LedgerError::Overflow)?;
        self.set_collateral(user, asset, previous, updated);
        Ok(updated)
    }

    /// Removes `amount` of `asset` from the user, returning what remains.
    pub(crate) fn withdraw(&mut self, user: Address, asset: Address, amount: U256) -> Result<U256, LedgerError> {
        let previous = self.collateral_of(user, asset);
        let updated = previous
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientCollateral {
                requested: amount,
                available: previous,
            })?;
        self.set_collateral(user, asset, previous, updated);
        Ok(updated)
    }

    pub(crate) fn increase_debt(&mut self, user: Address, amount: U256) -> Result<U256, LedgerError> {
        let previous = self.debt_of(user);
        let updated = previous.checked_add(amount).ok_or(LedgerError::Overflow)?;
        self.set_debt(user, previous, updated);
        Ok(updated)
    }

    pub(crate) fn decrease_debt(&mut self, user: Address, amount: U256) -> Result<U256, LedgerError> {
        let previous = self.debt_of(user);
        let updated = previous
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientDebt {
                requested: amount,
                outstanding: previous,
            })?;
        self.set_debt(user, previous, updated);
        Ok(updated)
    }

    pub(crate) fn checkpoint(&self) -> LedgerCheckpoint {
        LedgerCheckpoint(self.journal.len())
    }

    /// Restores every value written since `checkpoint`, newest first.
    pub(crate) fn revert_to(&mut self, checkpoint: LedgerCheckpoint) {
        while self.journal.len() > checkpoint.0 {
            let Some(entry) = self.journal.pop() else {
                break;
            };
            match entry {
                JournalEntry::Collateral { user, asset, previous } => {
                    let position = self.positions.entry(user).or_default();
                    if previous.is_zero() {
                        position.collateral.remove(&asset);
                    } else {
                        position.collateral.insert(asset, previous);
                    }
                }
                JournalEntry::Debt { user, previous } => {
                    self.positions.entry(user).or_default().debt = previous;
                }
            }
        }
        self.positions.retain(|_, p| !p.is_empty());
    }

    /// Drops the journal once the outermost call has succeeded.
    pub(crate) fn commit(&mut self) {
        self.journal.clear();
    }

    fn set_collateral(&mut self, user: Address, asset: Address, previous: U256, updated: U256) {
        self.journal.push(JournalEntry::Collateral { user, asset, previous });
        let position = self.positions.entry(user).or_default();
        if updated.is_zero() {
            position.collateral.remove(&asset);
        } else {
            position.collateral.insert(asset, updated);
        }
        self.prune(user);
    }

    fn set_debt(&mut self, user: Address, previous: U256, updated: U256) {
        self.journal.push(JournalEntry::Debt { user, previous });
        self.positions.entry(user).or_default().debt = updated;
        self.prune(user);
    }

    // fully exited positions leave no entry behind
    fn prune(&mut self, user: Address) {
        if self.positions.get(&user).is_some_and(Position::is_empty) {
            self.positions.remove(&user);
        }
    }
}
