// 8.0 engine/core.rs: main engine. holds the registry, the position ledger and the
// event log, and runs every mutating call as one all-or-nothing transaction.

use super::config::EngineConfig;
use super::guard::ReentrancyLock;
use super::results::EngineError;
use crate::events::{Event, EventLog, EventPayload};
use crate::host::Host;
use crate::ledger::PositionLedger;
use crate::oracle::OracleAdapter;
use crate::registry::CollateralRegistry;
use crate::types::{Address, Timestamp};
use std::cell::RefCell;

/** 8.1: main engine struct. all state lives here */
pub struct Engine<H: Host> {
    pub(super) config: EngineConfig,
    pub(super) address: Address,
    pub(super) debt_token: Address,
    pub(super) host: H,
    pub(super) registry: CollateralRegistry,
    pub(super) oracle: OracleAdapter,
    pub(super) ledger: RefCell<PositionLedger>,
    pub(super) events: RefCell<EventLog>,
    // raised during the current call, committed only if it succeeds
    pub(super) pending_events: RefCell<Vec<EventPayload>>,
    pub(super) lock: ReentrancyLock,
}

impl<H: Host> Engine<H> {
    /// Builds the engine at `address`. `token_addresses[i]` is priced by
    /// `price_feed_addresses[i]`; the lists must match in length.
    pub fn new(
        config: EngineConfig,
        address: Address,
        host: H,
        token_addresses: &[Address],
        price_feed_addresses: &[Address],
        debt_token: Address,
    ) -> Result<Self, EngineError> {
        let registry = CollateralRegistry::new(token_addresses, price_feed_addresses)?;
        config.validate()?;

        tracing::info!(
            engine = %address,
            debt_token = %debt_token,
            collateral_assets = registry.len(),
            "engine constructed"
        );

        Ok(Self {
            oracle: OracleAdapter::new(config.staleness_timeout_secs),
            events: RefCell::new(EventLog::new(config.max_events)),
            config,
            address,
            debt_token,
            host,
            registry,
            ledger: RefCell::new(PositionLedger::new()),
            pending_events: RefCell::new(Vec::new()),
            lock: ReentrancyLock::default(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn time(&self) -> Timestamp {
        self.host.now()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().events().to_vec()
    }

    pub fn recent_events(&self, count: usize) -> Vec<Event> {
        self.events.borrow().recent(count).to_vec()
    }

    /// Runs `op` under the reentrancy lock. On error every ledger write, every
    /// host-side token movement and every event raised inside `op` is undone.
    pub(super) fn transact<T>(
        &self,
        operation: &'static str,
        op: impl FnOnce() -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let _guard = self.lock.acquire()?;

        let ledger_checkpoint = self.ledger.borrow().checkpoint();
        let host_checkpoint = self.host.checkpoint();

        match op() {
            Ok(value) => {
                self.ledger.borrow_mut().commit();
                self.host.commit(host_checkpoint);
                let now = self.host.now();
                let pending: Vec<EventPayload> = self.pending_events.borrow_mut().drain(..).collect();
                let mut log = self.events.borrow_mut();
                for payload in pending {
                    log.append(now, payload);
                }
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(operation, error = %err, "operation reverted");
                let mut ledger = self.ledger.borrow_mut();
                ledger.revert_to(ledger_checkpoint);
                ledger.commit();
                self.host.revert_to(host_checkpoint);
                self.pending_events.borrow_mut().clear();
                Err(err)
            }
        }
    }

    pub(super) fn emit_event(&self, payload: EventPayload) {
        self.pending_events.borrow_mut().push(payload);
    }
}
