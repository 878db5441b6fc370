//! Fixed-point helpers.
//!
//! Every amount the engine touches is an 18-decimal unsigned integer ("wad").
//! Division truncates toward zero and every product is checked, so a value
//! either fits or the operation aborts with [`Overflow`]. `Decimal` conversion
//! exists for display only; no engine math runs through it.

use crate::types::U256;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// 1e18, the scale of token amounts, USD values and health factors.
pub const PRECISION: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);
/// 1e8, the scale of the USD feeds in use.
pub const FEED_PRECISION: U256 = U256::from_limbs([100_000_000, 0, 0, 0]);
/// Lifts an 8-decimal feed answer to 18 decimals.
pub const ADDITIONAL_FEED_PRECISION: U256 = U256::from_limbs([10_000_000_000, 0, 0, 0]);

pub const WAD_DECIMALS: u8 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("arithmetic overflow")]
pub struct Overflow;

/// `a * b / denominator`, truncating. Fails on overflow or a zero denominator.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, Overflow> {
    a.checked_mul(b)
        .and_then(|product| product.checked_div(denominator))
        .ok_or(Overflow)
}

pub fn checked_add(a: U256, b: U256) -> Result<U256, Overflow> {
    a.checked_add(b).ok_or(Overflow)
}

/// 10^exp as U256.
pub fn pow10(exp: u8) -> U256 {
    U256::from(10u8).pow(U256::from(exp))
}

/// Whole units to wad: `wad(15)` is 15e18.
pub fn wad(units: u64) -> U256 {
    U256::from(units) * PRECISION
}

/// Parses a human decimal into wad, truncating digits past the 18th.
/// Negative or oversized inputs yield `None`.
pub fn from_decimal(value: Decimal) -> Option<U256> {
    if value.is_sign_negative() {
        return None;
    }
    let whole = value.trunc().to_u128()?;
    let fraction = value.fract();
    let scale = Decimal::from(1_000_000_000_000_000_000u64);
    let fraction_wad = (fraction * scale).trunc().to_u128()?;
    U256::from(whole)
        .checked_mul(PRECISION)?
        .checked_add(U256::from(fraction_wad))
}

/// Renders a wad as a `Decimal` for logs and reports. `None` once the value
/// outgrows the 96-bit mantissa.
pub fn to_decimal(value: U256) -> Option<Decimal> {
    let raw = u128::try_from(value).ok()?;
    let raw = i128::try_from(raw).ok()?;
    Decimal::try_from_i128_with_scale(raw, WAD_DECIMALS as u32)
        .ok()
        .map(|d| d.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn constants_line_up() {
        assert_eq!(PRECISION, pow10(18));
        assert_eq!(FEED_PRECISION, pow10(8));
        assert_eq!(ADDITIONAL_FEED_PRECISION * FEED_PRECISION, PRECISION);
    }

    #[test]
    fn mul_div_truncates() {
        assert_eq!(mul_div(U256::from(10), U256::from(1), U256::from(3)), Ok(U256::from(3)));
        assert_eq!(mul_div(U256::from(1), U256::from(1), U256::ZERO), Err(Overflow));
        assert_eq!(mul_div(U256::MAX, U256::from(2), U256::from(1)), Err(Overflow));
    }

    #[test]
    fn decimal_round_trip() {
        let v = from_decimal(dec!(0.05)).unwrap();
        assert_eq!(v, U256::from(50_000_000_000_000_000u64));
        assert_eq!(to_decimal(v), Some(dec!(0.05)));
        assert_eq!(to_decimal(wad(60_000)), Some(dec!(60000)));
    }

    #[test]
    fn decimal_rejects_out_of_range() {
        assert_eq!(from_decimal(dec!(-1)), None);
        assert_eq!(to_decimal(U256::MAX), None);
    }
}
