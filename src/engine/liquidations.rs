//! Liquidation of undercollateralized positions.
//!
//! A third party repays part or all of an unhealthy user's debt and receives
//! the equivalent collateral plus a 10% bonus. The call must leave the user's
//! health factor strictly higher than it found it.

use super::core::Engine;
use super::guard::require_more_than_zero;
use super::results::{EngineError, LiquidationResult};
use crate::events::{EventPayload, PositionLiquidatedEvent};
use crate::health::liquidation_bonus;
use crate::host::Host;
use crate::types::{Address, U256};
use crate::units::checked_add;

impl<H: Host> Engine<H> {
    /// Covers `debt_to_cover` of `user`'s debt with the caller's debt token and
    /// seizes the matching `asset` collateral plus the bonus.
    pub fn liquidate(
        &self,
        caller: Address,
        asset: Address,
        user: Address,
        debt_to_cover: U256,
    ) -> Result<LiquidationResult, EngineError> {
        self.transact("liquidate", || {
            require_more_than_zero(debt_to_cover)?;
            self.registry.ensure_supported(asset)?;

            let starting_health_factor = self.health_factor(user)?;
            if starting_health_factor.is_healthy() {
                return Err(EngineError::HealthFactorOk);
            }

            let collateral_for_debt = self.asset_amount_for_usd(asset, debt_to_cover)?;
            let bonus_collateral = liquidation_bonus(collateral_for_debt)?;
            let total_collateral = checked_add(collateral_for_debt, bonus_collateral)?;

            self.redeem_collateral_inner(asset, total_collateral, user, caller)?;
            self.burn_debt_inner(debt_to_cover, user, caller)?;

            let ending_health_factor = self.health_factor(user)?;
            if ending_health_factor <= starting_health_factor {
                return Err(EngineError::HealthFactorNotImproved);
            }
            // the liquidator's own position is untouched above
            self.assert_healthy(caller)?;

            tracing::warn!(
                user = %user,
                liquidator = %caller,
                asset = %asset,
                debt_covered = %debt_to_cover,
                collateral_seized = %total_collateral,
                starting = %starting_health_factor,
                ending = %ending_health_factor,
                "position liquidated"
            );

            self.emit_event(EventPayload::PositionLiquidated(PositionLiquidatedEvent {
                user,
                liquidator: caller,
                asset,
                debt_covered: debt_to_cover,
                collateral_seized: total_collateral,
                starting_health_factor,
                ending_health_factor,
            }));

            Ok(LiquidationResult {
                user,
                liquidator: caller,
                asset,
                debt_covered: debt_to_cover,
                collateral_for_debt,
                bonus_collateral,
                starting_health_factor,
                ending_health_factor,
            })
        })
    }

    /// Whether `user` is currently open to liquidation.
    pub fn is_liquidatable(&self, user: Address) -> Result<bool, EngineError> {
        Ok(!self.health_factor(user)?.is_healthy())
    }
}
