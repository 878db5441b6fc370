//! Collateral deposits and redemptions.

use super::core::Engine;
use super::guard::require_more_than_zero;
use super::results::EngineError;
use crate::events::{CollateralDepositedEvent, CollateralRedeemedEvent, EventPayload};
use crate::host::{Host, HostError};
use crate::types::{Address, U256};

impl<H: Host> Engine<H> {
    /// Pulls `amount` of `asset` from the caller into the engine. Deposits only
    /// improve solvency, so no health check runs.
    pub fn deposit_collateral(&self, caller: Address, asset: Address, amount: U256) -> Result<(), EngineError> {
        self.transact("deposit_collateral", || self.deposit_collateral_inner(caller, asset, amount))
    }

    /// Sends `amount` of `asset` back to the caller. The caller must stay healthy.
    pub fn redeem_collateral(&self, caller: Address, asset: Address, amount: U256) -> Result<(), EngineError> {
        self.transact("redeem_collateral", || {
            self.redeem_collateral_inner(asset, amount, caller, caller)?;
            self.assert_healthy(caller)
        })
    }

    pub(super) fn deposit_collateral_inner(
        &self,
        user: Address,
        asset: Address,
        amount: U256,
    ) -> Result<(), EngineError> {
        require_more_than_zero(amount)?;
        self.registry.ensure_supported(asset)?;

        self.ledger.borrow_mut().deposit(user, asset, amount)?;
        self.emit_event(EventPayload::CollateralDeposited(CollateralDepositedEvent {
            user,
            asset,
            amount,
        }));

        let transferred = self.host.transfer_from(asset, self.address, user, self.address, amount);
        self.expect_transfer(asset, transferred)
    }

    /// Moves collateral out of `from`'s position and sends the tokens to `to`.
    /// Callers run their own health checks afterwards.
    pub(super) fn redeem_collateral_inner(
        &self,
        asset: Address,
        amount: U256,
        from: Address,
        to: Address,
    ) -> Result<(), EngineError> {
        require_more_than_zero(amount)?;

        self.ledger.borrow_mut().withdraw(from, asset, amount)?;
        self.emit_event(EventPayload::CollateralRedeemed(CollateralRedeemedEvent {
            redeemed_from: from,
            redeemed_to: to,
            asset,
            amount,
        }));

        let transferred = self.host.transfer(asset, self.address, to, amount);
        self.expect_transfer(asset, transferred)
    }

    // a token returning false and a token erroring out are the same failure
    pub(super) fn expect_transfer(
        &self,
        token: Address,
        outcome: Result<bool, HostError>,
    ) -> Result<(), EngineError> {
        match outcome {
            Ok(true) => Ok(()),
            Ok(false) => Err(EngineError::TransferFailed { token }),
            Err(err) => {
                tracing::debug!(token = %token, error = %err, "token transfer reverted");
                Err(EngineError::TransferFailed { token })
            }
        }
    }
}
