//! Read-only queries. None of these take the reentrancy lock, so observers
//! (a collaborator mid-callback included) can always read.

use super::core::Engine;
use super::results::{AccountInformation, AccountSnapshot, EngineError};
use crate::health::{
    self, HealthFactor, LIQUIDATION_BONUS, LIQUIDATION_PRECISION, LIQUIDATION_THRESHOLD, MIN_HEALTH_FACTOR,
};
use crate::host::Host;
use crate::types::{Address, U256};
use crate::units::{ADDITIONAL_FEED_PRECISION, PRECISION};

impl<H: Host> Engine<H> {
    pub fn get_account_information(&self, user: Address) -> Result<AccountInformation, EngineError> {
        self.account_information(user)
    }

    pub fn get_account_collateral_value(&self, user: Address) -> Result<U256, EngineError> {
        self.collateral_value_usd(user)
    }

    pub fn get_usd_value(&self, asset: Address, amount: U256) -> Result<U256, EngineError> {
        self.usd_value(asset, amount)
    }

    pub fn get_token_amount_from_usd(&self, asset: Address, usd_amount: U256) -> Result<U256, EngineError> {
        self.asset_amount_for_usd(asset, usd_amount)
    }

    pub fn get_health_factor(&self, user: Address) -> Result<HealthFactor, EngineError> {
        self.health_factor(user)
    }

    /// Health factor a position with these totals would have.
    pub fn calculate_health_factor(
        &self,
        total_debt: U256,
        collateral_value_usd: U256,
    ) -> Result<HealthFactor, EngineError> {
        Ok(health::calculate_health_factor(total_debt, collateral_value_usd)?)
    }

    pub fn get_collateral_tokens(&self) -> Vec<Address> {
        self.registry.tokens()
    }

    pub fn get_collateral_token_price_feed(&self, asset: Address) -> Option<Address> {
        self.registry.price_feed(asset)
    }

    pub fn get_collateral_balance_of_user(&self, user: Address, asset: Address) -> U256 {
        self.ledger.borrow().collateral_of(user, asset)
    }

    pub fn get_debt_of_user(&self, user: Address) -> U256 {
        self.ledger.borrow().debt_of(user)
    }

    pub fn get_debt_token(&self) -> Address {
        self.debt_token
    }

    pub fn get_precision(&self) -> U256 {
        PRECISION
    }

    pub fn get_additional_feed_precision(&self) -> U256 {
        ADDITIONAL_FEED_PRECISION
    }

    pub fn get_liquidation_threshold(&self) -> U256 {
        LIQUIDATION_THRESHOLD
    }

    pub fn get_liquidation_bonus(&self) -> U256 {
        LIQUIDATION_BONUS
    }

    pub fn get_liquidation_precision(&self) -> U256 {
        LIQUIDATION_PRECISION
    }

    pub fn get_min_health_factor(&self) -> U256 {
        MIN_HEALTH_FACTOR
    }

    pub fn get_staleness_timeout(&self) -> u64 {
        self.oracle.staleness_timeout_secs()
    }

    pub fn account_snapshot(&self, user: Address) -> Result<AccountSnapshot, EngineError> {
        let info = self.account_information(user)?;
        let health_factor = health::calculate_health_factor(info.total_debt, info.collateral_value_usd)?;
        let collateral = self
            .registry
            .tokens()
            .into_iter()
            .map(|asset| (asset, self.get_collateral_balance_of_user(user, asset)))
            .filter(|(_, amount)| !amount.is_zero())
            .collect();

        Ok(AccountSnapshot {
            user,
            total_debt: info.total_debt,
            collateral_value_usd: info.collateral_value_usd,
            health_factor,
            collateral,
        })
    }

    /// True while a mutating call is in progress.
    pub fn is_locked(&self) -> bool {
        self.lock.is_held()
    }
}
