// 9.0 oracle.rs: price feed integration. the engine never trusts a price older than
// the staleness timeout. a stalled feed freezes every valuation instead of letting
// minting run on stale collateral values.

use crate::types::{Timestamp, I256, U256};
use crate::units::{self, mul_div, Overflow, PRECISION, WAD_DECIMALS};
use serde::{Deserialize, Serialize};

/// Three hours. Feeds heartbeat well inside this window.
pub const STALENESS_TIMEOUT_SECS: u64 = 3 * 60 * 60;

/// Raw answer of an aggregator round, as `latestRoundData` reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundData {
    pub round_id: u128,
    pub answer: I256,
    pub started_at: Timestamp,
    pub updated_at: Timestamp,
    pub answered_in_round: u128,
}

/// An external USD price source for one collateral asset.
pub trait PriceFeed {
    fn latest_round_data(&self) -> RoundData;

    /// Decimals of `answer`. 8 for the USD feeds in use.
    fn decimals(&self) -> u8;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("Stale price: updated at {updated_at}, now {now}, timeout {timeout_secs}s")]
    StalePrice {
        updated_at: Timestamp,
        now: Timestamp,
        timeout_secs: u64,
    },

    #[error("Invalid oracle answer {0}")]
    InvalidPrice(I256),

    #[error("Unsupported feed precision: {0} decimals")]
    UnsupportedFeedDecimals(u8),

    #[error("Arithmetic overflow in price conversion")]
    MathOverflow,
}

impl From<Overflow> for OracleError {
    fn from(_: Overflow) -> Self {
        OracleError::MathOverflow
    }
}

/// 9.1: a validated, fresh price. `price` keeps the feed's native precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub price: U256,
    pub decimals: u8,
    pub observed_at: Timestamp,
}

impl PriceObservation {
    /// Price lifted to 18 decimals.
    pub fn scaled_price(&self) -> Result<U256, OracleError> {
        let lift_decimals = WAD_DECIMALS
            .checked_sub(self.decimals)
            .ok_or(OracleError::UnsupportedFeedDecimals(self.decimals))?;
        let lift = units::pow10(lift_decimals);
        self.price.checked_mul(lift).ok_or(OracleError::MathOverflow)
    }

    /// USD value (18 decimals) of `amount` wei of the asset.
    pub fn usd_value(&self, amount: U256) -> Result<U256, OracleError> {
        Ok(mul_div(self.scaled_price()?, amount, PRECISION)?)
    }

    /// Asset amount worth `usd_amount`. Inverse of [`usd_value`](Self::usd_value)
    /// up to truncation.
    pub fn asset_amount_for_usd(&self, usd_amount: U256) -> Result<U256, OracleError> {
        Ok(mul_div(usd_amount, PRECISION, self.scaled_price()?)?)
    }
}

/// 9.2: reads feeds and fails closed on anything it cannot trust.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleAdapter {
    staleness_timeout_secs: u64,
}

impl Default for OracleAdapter {
    fn default() -> Self {
        Self::new(STALENESS_TIMEOUT_SECS)
    }
}

impl OracleAdapter {
    pub fn new(staleness_timeout_secs: u64) -> Self {
        Self { staleness_timeout_secs }
    }

    pub fn staleness_timeout_secs(&self) -> u64 {
        self.staleness_timeout_secs
    }

    pub fn observe(&self, feed: &dyn PriceFeed, now: Timestamp) -> Result<PriceObservation, OracleError> {
        let round = feed.latest_round_data();
        let decimals = feed.decimals();

        if now.seconds_since(round.updated_at) > self.staleness_timeout_secs {
            return Err(OracleError::StalePrice {
                updated_at: round.updated_at,
                now,
                timeout_secs: self.staleness_timeout_secs,
            });
        }

        if decimals > WAD_DECIMALS {
            return Err(OracleError::UnsupportedFeedDecimals(decimals));
        }

        if round.answer <= I256::ZERO {
            return Err(OracleError::InvalidPrice(round.answer));
        }

        tracing::trace!(
            answer = %round.answer,
            decimals,
            updated_at = %round.updated_at,
            "oracle read"
        );

        Ok(PriceObservation {
            price: round.answer.into_raw(),
            decimals,
            observed_at: round.updated_at,
        })
    }
}
