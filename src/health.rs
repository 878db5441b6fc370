//! Health factor math.
//!
//! A position stays open only while half of its collateral value still covers
//! the debt, i.e. collateral is at least 200% of debt. The health factor is
//! that ratio in 18-decimal fixed point; 1e18 is the floor.

use crate::types::U256;
use crate::units::{self, mul_div, Overflow, PRECISION};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Share of collateral value counted toward solvency, over LIQUIDATION_PRECISION.
pub const LIQUIDATION_THRESHOLD: U256 = U256::from_limbs([50, 0, 0, 0]);
/// Liquidator bonus in percent of the seized collateral.
pub const LIQUIDATION_BONUS: U256 = U256::from_limbs([10, 0, 0, 0]);
pub const LIQUIDATION_PRECISION: U256 = U256::from_limbs([100, 0, 0, 0]);
pub const MIN_HEALTH_FACTOR: U256 = PRECISION;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HealthFactor(U256);

impl HealthFactor {
    /// A position without debt. Compares above every finite ratio.
    pub const INFINITE: HealthFactor = HealthFactor(U256::MAX);
    pub const MIN: HealthFactor = HealthFactor(MIN_HEALTH_FACTOR);

    pub fn new(value: U256) -> Self {
        Self(value)
    }

    pub fn value(&self) -> U256 {
        self.0
    }

    pub fn is_infinite(&self) -> bool {
        self.0 == U256::MAX
    }

    pub fn is_healthy(&self) -> bool {
        self.0 >= MIN_HEALTH_FACTOR
    }

    /// Human-readable ratio, `None` for the no-debt sentinel.
    pub fn to_decimal(&self) -> Option<Decimal> {
        if self.is_infinite() {
            None
        } else {
            units::to_decimal(self.0)
        }
    }
}

impl fmt::Display for HealthFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal() {
            Some(d) => write!(f, "{}", d),
            None if self.is_infinite() => write!(f, "inf"),
            None => write!(f, "{}e-18", self.0),
        }
    }
}

/// `(collateral * 50 / 100) * 1e18 / debt`. Zero debt is unconditionally
/// solvent and reported as [`HealthFactor::INFINITE`] without dividing.
pub fn calculate_health_factor(total_debt: U256, collateral_value_usd: U256) -> Result<HealthFactor, Overflow> {
    if total_debt.is_zero() {
        return Ok(HealthFactor::INFINITE);
    }
    let adjusted = mul_div(collateral_value_usd, LIQUIDATION_THRESHOLD, LIQUIDATION_PRECISION)?;
    Ok(HealthFactor(mul_div(adjusted, PRECISION, total_debt)?))
}

/// Collateral owed to a liquidator on top of the covered amount.
pub fn liquidation_bonus(collateral_amount: U256) -> Result<U256, Overflow> {
    mul_div(collateral_amount, LIQUIDATION_BONUS, LIQUIDATION_PRECISION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::wad;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_debt_is_infinite() {
        let hf = calculate_health_factor(U256::ZERO, wad(1000)).unwrap();
        assert!(hf.is_infinite());
        assert!(hf.is_healthy());
        assert_eq!(hf.to_string(), "inf");

        let hf = calculate_health_factor(U256::ZERO, U256::ZERO).unwrap();
        assert_eq!(hf, HealthFactor::INFINITE);
    }

    #[test]
    fn exactly_200_percent_is_the_floor() {
        // $20,000 collateral against $10,000 debt
        let hf = calculate_health_factor(wad(10_000), wad(20_000)).unwrap();
        assert_eq!(hf, HealthFactor::MIN);
        assert!(hf.is_healthy());

        let hf = calculate_health_factor(wad(10_000) + U256::from(1), wad(20_000)).unwrap();
        assert!(!hf.is_healthy());
    }

    #[test]
    fn ratio_matches_reference_values() {
        // $1,000 collateral, $100 debt: 5.0
        let hf = calculate_health_factor(wad(100), wad(1000)).unwrap();
        assert_eq!(hf.value(), wad(5));
        assert_eq!(hf.to_decimal(), Some(dec!(5)));

        // $180 collateral, $100 debt: 0.9
        let hf = calculate_health_factor(wad(100), wad(180)).unwrap();
        assert_eq!(hf.to_decimal(), Some(dec!(0.9)));
        assert!(!hf.is_healthy());
    }

    #[test]
    fn bonus_is_ten_percent() {
        assert_eq!(liquidation_bonus(wad(5)).unwrap(), U256::from(500_000_000_000_000_000u64));
        assert_eq!(liquidation_bonus(U256::from(9)).unwrap(), U256::ZERO);
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(calculate_health_factor(U256::from(1), U256::MAX), Err(Overflow));
    }
}
