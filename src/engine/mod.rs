// 8.0: core engine. coordinates collateral deposits and redemptions, debt minting and
// burning, and liquidations. every mutating call runs under one reentrancy lock and
// either commits in full or leaves no trace.

mod collateral;
mod config;
mod core;
mod debt;
mod guard;
mod liquidations;
mod results;
mod valuation;
mod views;

pub use config::{ConfigError, EngineConfig};
pub use self::core::Engine;
pub use results::{AccountInformation, AccountSnapshot, EngineError, LiquidationResult};
