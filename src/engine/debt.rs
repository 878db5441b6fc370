//! Minting and burning debt, plus the one-call combinations with collateral.

use super::core::Engine;
use super::guard::require_more_than_zero;
use super::results::EngineError;
use crate::events::{DebtBurnedEvent, DebtMintedEvent, EventPayload};
use crate::host::Host;
use crate::types::{Address, U256};

impl<H: Host> Engine<H> {
    /// Mints `amount` of debt token to the caller against their collateral.
    pub fn mint_debt(&self, caller: Address, amount: U256) -> Result<(), EngineError> {
        self.transact("mint_debt", || self.mint_debt_inner(caller, amount))
    }

    /// Repays `amount` of the caller's debt with debt token they hold.
    pub fn burn_debt(&self, caller: Address, amount: U256) -> Result<(), EngineError> {
        self.transact("burn_debt", || {
            self.burn_debt_inner(amount, caller, caller)?;
            // burning cannot lower a health factor; checked anyway
            self.assert_healthy(caller)
        })
    }

    pub fn deposit_collateral_and_mint_dsc(
        &self,
        caller: Address,
        asset: Address,
        collateral_amount: U256,
        amount_to_mint: U256,
    ) -> Result<(), EngineError> {
        self.transact("deposit_collateral_and_mint_dsc", || {
            self.deposit_collateral_inner(caller, asset, collateral_amount)?;
            self.mint_debt_inner(caller, amount_to_mint)
        })
    }

    /// Burns first so the redemption's health check sees the reduced debt.
    pub fn redeem_collateral_for_dsc(
        &self,
        caller: Address,
        asset: Address,
        collateral_amount: U256,
        amount_to_burn: U256,
    ) -> Result<(), EngineError> {
        self.transact("redeem_collateral_for_dsc", || {
            self.burn_debt_inner(amount_to_burn, caller, caller)?;
            self.redeem_collateral_inner(asset, collateral_amount, caller, caller)?;
            self.assert_healthy(caller)
        })
    }

    pub(super) fn mint_debt_inner(&self, user: Address, amount: U256) -> Result<(), EngineError> {
        require_more_than_zero(amount)?;

        let total_debt = self.ledger.borrow_mut().increase_debt(user, amount)?;
        // solvency before the external mint
        self.assert_healthy(user)?;

        match self.host.mint(self.debt_token, self.address, user, amount)? {
            true => {
                self.emit_event(EventPayload::DebtMinted(DebtMintedEvent {
                    user,
                    amount,
                    total_debt,
                }));
                Ok(())
            }
            false => Err(EngineError::MintFailed),
        }
    }

    /// Clears `amount` of `on_behalf_of`'s debt using tokens pulled from `payer`.
    pub(super) fn burn_debt_inner(&self, amount: U256, on_behalf_of: Address, payer: Address) -> Result<(), EngineError> {
        require_more_than_zero(amount)?;

        let remaining_debt = self.ledger.borrow_mut().decrease_debt(on_behalf_of, amount)?;

        let pulled = self
            .host
            .transfer_from(self.debt_token, self.address, payer, self.address, amount);
        self.expect_transfer(self.debt_token, pulled)?;
        self.host.burn(self.debt_token, self.address, amount)?;

        self.emit_event(EventPayload::DebtBurned(DebtBurnedEvent {
            on_behalf_of,
            paid_by: payer,
            amount,
            remaining_debt,
        }));
        Ok(())
    }
}
