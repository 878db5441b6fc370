// dsc-core: overcollateralized stablecoin engine.
// solvency-first architecture: no call may leave a debtor below the 200% floor.
// single-threaded and deterministic; collaborators sit behind the Host trait.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: Address, U256, I256, Timestamp
//   2.x  units.rs: 18-decimal fixed point, checked mul/div, display conversion
//   3.x  registry.rs: collateral asset -> price feed, fixed at construction
//   4.x  ledger.rs: per-user collateral and debt, journaled for rollback
//   5.x  health.rs: health factor, liquidation threshold and bonus
//   8.x  engine/: deposit, redeem, mint, burn, liquidate, queries
//   9.x  oracle.rs: feed reads with staleness protection
//   9.1  host.rs: collaborator seam (tokens, feeds, clock)
//   9.3  chain.rs: in-memory host (mocked)
//   11.x events.rs: state transition events for audit

// core modules
pub mod engine;
pub mod health;
pub mod ledger;
pub mod registry;
pub mod types;
pub mod units;

// integration modules
pub mod chain;
pub mod events;
pub mod host;
pub mod oracle;

// re exports for convenience
pub use chain::{usd_answer, ChainCheckpoint, InMemoryChain, MockAggregator};
pub use engine::*;
pub use events::*;
pub use health::{calculate_health_factor, HealthFactor, MIN_HEALTH_FACTOR};
pub use host::{Host, HostError};
pub use ledger::{LedgerError, Position, PositionLedger};
pub use oracle::{OracleAdapter, OracleError, PriceFeed, PriceObservation, RoundData, STALENESS_TIMEOUT_SECS};
pub use registry::{CollateralRegistry, RegistryError, SupportedAsset};
pub use types::*;
pub use units::{from_decimal, to_decimal, wad, PRECISION};
