//! Reentrancy lock and call preconditions.

use super::results::EngineError;
use crate::types::U256;
use std::cell::Cell;

/// Single non-reentrant lock held for the whole of a mutating call.
#[derive(Debug, Default)]
pub(super) struct ReentrancyLock {
    entered: Cell<bool>,
}

impl ReentrancyLock {
    pub(super) fn acquire(&self) -> Result<LockGuard<'_>, EngineError> {
        if self.entered.replace(true) {
            return Err(EngineError::Reentrancy);
        }
        Ok(LockGuard { lock: self })
    }

    pub(super) fn is_held(&self) -> bool {
        self.entered.get()
    }
}

/// Releases the lock on drop, error paths included.
pub(super) struct LockGuard<'a> {
    lock: &'a ReentrancyLock,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        self.lock.entered.set(false);
    }
}

pub(super) fn require_more_than_zero(amount: U256) -> Result<(), EngineError> {
    if amount.is_zero() {
        Err(EngineError::NeedsMoreThanZero)
    } else {
        Ok(())
    }
}
