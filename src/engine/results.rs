// 8.0.2: result types and errors for engine operations.

use super::config::ConfigError;
use crate::health::HealthFactor;
use crate::host::HostError;
use crate::ledger::LedgerError;
use crate::oracle::OracleError;
use crate::registry::RegistryError;
use crate::types::{Address, U256};
use crate::units::Overflow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationResult {
    pub user: Address,
    pub liquidator: Address,
    pub asset: Address,
    pub debt_covered: U256,
    /// Collateral the covered debt is worth at the current price.
    pub collateral_for_debt: U256,
    pub bonus_collateral: U256,
    pub starting_health_factor: HealthFactor,
    pub ending_health_factor: HealthFactor,
}

impl LiquidationResult {
    pub fn collateral_seized(&self) -> U256 {
        self.collateral_for_debt + self.bonus_collateral
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInformation {
    pub total_debt: U256,
    pub collateral_value_usd: U256,
}

/// Everything an observer needs to render a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub user: Address,
    pub total_debt: U256,
    pub collateral_value_usd: U256,
    pub health_factor: HealthFactor,
    pub collateral: BTreeMap<Address, U256>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Amount must be more than zero")]
    NeedsMoreThanZero,

    #[error("Token {0} is not allowed as collateral")]
    NotAllowedToken(Address),

    #[error("Collateral token and price feed lists differ in length: {tokens} tokens, {feeds} feeds")]
    LengthMismatch { tokens: usize, feeds: usize },

    #[error("Collateral asset {0} registered twice")]
    DuplicateCollateral(Address),

    #[error("Transfer of token {token} failed")]
    TransferFailed { token: Address },

    #[error("Mint failed")]
    MintFailed,

    #[error("Health factor broken: {0}")]
    HealthFactorBroken(HealthFactor),

    #[error("Health factor ok, position cannot be liquidated")]
    HealthFactorOk,

    #[error("Health factor not improved by liquidation")]
    HealthFactorNotImproved,

    #[error("Reentrant call rejected")]
    Reentrancy,

    #[error("Arithmetic overflow")]
    MathOverflow,

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    pub fn is_stale_price(&self) -> bool {
        matches!(self, EngineError::Oracle(OracleError::StalePrice { .. }))
    }
}

impl From<RegistryError> for EngineError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::LengthMismatch { tokens, feeds } => EngineError::LengthMismatch { tokens, feeds },
            RegistryError::DuplicateCollateral(asset) => EngineError::DuplicateCollateral(asset),
            RegistryError::NotAllowedToken(asset) => EngineError::NotAllowedToken(asset),
        }
    }
}

impl From<Overflow> for EngineError {
    fn from(_: Overflow) -> Self {
        EngineError::MathOverflow
    }
}
