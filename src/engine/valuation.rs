//! Collateral valuation and the solvency check.
//!
//! Read-only. Every pass walks all registered assets and reads a fresh price
//! for each, so one stale feed blocks every valuation.

use super::core::Engine;
use super::results::{AccountInformation, EngineError};
use crate::health::{calculate_health_factor, HealthFactor};
use crate::host::Host;
use crate::oracle::PriceObservation;
use crate::types::{Address, U256};
use crate::units::checked_add;

impl<H: Host> Engine<H> {
    pub(super) fn observe_price(&self, asset: Address) -> Result<PriceObservation, EngineError> {
        let feed_address = self
            .registry
            .price_feed(asset)
            .ok_or(EngineError::NotAllowedToken(asset))?;
        let feed = self.host.price_feed(feed_address)?;
        Ok(self.oracle.observe(feed.as_ref(), self.host.now())?)
    }

    pub(super) fn usd_value(&self, asset: Address, amount: U256) -> Result<U256, EngineError> {
        Ok(self.observe_price(asset)?.usd_value(amount)?)
    }

    pub(super) fn asset_amount_for_usd(&self, asset: Address, usd_amount: U256) -> Result<U256, EngineError> {
        Ok(self.observe_price(asset)?.asset_amount_for_usd(usd_amount)?)
    }

    pub(super) fn collateral_value_usd(&self, user: Address) -> Result<U256, EngineError> {
        let mut total = U256::ZERO;
        for supported in self.registry.assets() {
            let amount = self.ledger.borrow().collateral_of(user, supported.asset);
            let value = self.usd_value(supported.asset, amount)?;
            total = checked_add(total, value)?;
        }
        Ok(total)
    }

    pub(super) fn account_information(&self, user: Address) -> Result<AccountInformation, EngineError> {
        let total_debt = self.ledger.borrow().debt_of(user);
        let collateral_value_usd = self.collateral_value_usd(user)?;
        Ok(AccountInformation {
            total_debt,
            collateral_value_usd,
        })
    }

    pub(super) fn health_factor(&self, user: Address) -> Result<HealthFactor, EngineError> {
        let info = self.account_information(user)?;
        Ok(calculate_health_factor(info.total_debt, info.collateral_value_usd)?)
    }

    pub(super) fn assert_healthy(&self, user: Address) -> Result<(), EngineError> {
        let health_factor = self.health_factor(user)?;
        if !health_factor.is_healthy() {
            return Err(EngineError::HealthFactorBroken(health_factor));
        }
        Ok(())
    }
}
