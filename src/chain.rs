// 9.3 chain.rs: MOCKED. in-memory host with ERC20-style tokens, aggregator feeds and a
// settable clock. backs the tests and the simulation binary; a deployment plugs in a
// Host that talks to real contracts instead.

use crate::host::{Host, HostError};
use crate::oracle::{PriceFeed, RoundData};
use crate::types::{Address, Timestamp, I256, U256};
use crate::units::FEED_PRECISION;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Settable aggregator, one per asset. Rounds advance on every update.
#[derive(Debug)]
pub struct MockAggregator {
    decimals: u8,
    round: Cell<RoundData>,
}

impl MockAggregator {
    pub fn new(decimals: u8, answer: I256, updated_at: Timestamp) -> Self {
        Self {
            decimals,
            round: Cell::new(RoundData {
                round_id: 1,
                answer,
                started_at: updated_at,
                updated_at,
                answered_in_round: 1,
            }),
        }
    }

    pub fn update_answer(&self, answer: I256, updated_at: Timestamp) {
        let round_id = self.round.get().round_id + 1;
        self.round.set(RoundData {
            round_id,
            answer,
            started_at: updated_at,
            updated_at,
            answered_in_round: round_id,
        });
    }

    /// Overwrites the round as reported, stale timestamps included.
    pub fn update_round_data(&self, round: RoundData) {
        self.round.set(round);
    }
}

impl PriceFeed for MockAggregator {
    fn latest_round_data(&self) -> RoundData {
        self.round.get()
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }
}

/// 8-decimal answer for a whole-dollar price.
pub fn usd_answer(usd_per_unit: u64) -> I256 {
    I256::from_raw(U256::from(usd_per_unit) * FEED_PRECISION)
}

#[derive(Debug, Clone, Default)]
struct TokenState {
    symbol: String,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    total_supply: U256,
    // Some(owner) for the debt token; only the owner mints and burns
    minter: Option<Address>,
    transfers_fail: bool,
    mints_fail: bool,
}

impl TokenState {
    fn balance(&self, owner: Address) -> U256 {
        self.balances.get(&owner).copied().unwrap_or(U256::ZERO)
    }

    fn ensure_minter(&self, token: Address, caller: Address) -> Result<(), HostError> {
        if self.minter == Some(caller) {
            Ok(())
        } else {
            Err(HostError::NotMinter { token, caller })
        }
    }
}

/// Prior value of one piece of token state, recorded while a checkpoint is open.
#[derive(Debug, Clone)]
enum ChainEntry {
    Balance { token: Address, owner: Address, previous: Option<U256> },
    Allowance { token: Address, owner: Address, spender: Address, previous: Option<U256> },
    Supply { token: Address, previous: U256 },
}

/// Journal position returned by [`Host::checkpoint`]. Every checkpoint must
/// end in either `revert_to` or `commit`.
#[derive(Debug)]
pub struct ChainCheckpoint(usize);

#[derive(Debug)]
pub struct InMemoryChain {
    clock: Cell<Timestamp>,
    tokens: RefCell<HashMap<Address, TokenState>>,
    feeds: RefCell<HashMap<Address, Rc<MockAggregator>>>,
    // balances, allowances and supplies only; flags and ownership are not journaled
    journal: RefCell<Vec<ChainEntry>>,
    open_checkpoints: Cell<usize>,
}

impl InMemoryChain {
    pub fn new(start: Timestamp) -> Self {
        Self {
            clock: Cell::new(start),
            tokens: RefCell::new(HashMap::new()),
            feeds: RefCell::new(HashMap::new()),
            journal: RefCell::new(Vec::new()),
            open_checkpoints: Cell::new(0),
        }
    }

    pub fn with_system_time() -> Self {
        Self::new(Timestamp::now())
    }

    pub fn set_time(&self, timestamp: Timestamp) {
        self.clock.set(timestamp);
    }

    pub fn advance_time(&self, secs: u64) {
        self.clock.set(self.clock.get().plus_secs(secs));
    }

    pub fn deploy_token(&self, token: Address, symbol: &str) {
        self.tokens.borrow_mut().insert(
            token,
            TokenState {
                symbol: symbol.to_string(),
                ..Default::default()
            },
        );
    }

    /// Debt token: only `owner` may mint or burn it.
    pub fn deploy_debt_token(&self, token: Address, symbol: &str, owner: Address) {
        self.tokens.borrow_mut().insert(
            token,
            TokenState {
                symbol: symbol.to_string(),
                minter: Some(owner),
                ..Default::default()
            },
        );
    }

    pub fn transfer_ownership(&self, token: Address, caller: Address, new_owner: Address) -> Result<(), HostError> {
        if new_owner == Address::ZERO {
            return Err(HostError::ZeroAddress);
        }
        let mut tokens = self.tokens.borrow_mut();
        let state = tokens.get_mut(&token).ok_or(HostError::UnknownToken(token))?;
        state.ensure_minter(token, caller)?;
        state.minter = Some(new_owner);
        Ok(())
    }

    pub fn owner_of(&self, token: Address) -> Option<Address> {
        self.tokens.borrow().get(&token).and_then(|s| s.minter)
    }

    /// Test faucet for collateral tokens. Tokens with a minter refuse it.
    pub fn faucet(&self, token: Address, to: Address, amount: U256) -> Result<(), HostError> {
        let mut tokens = self.tokens.borrow_mut();
        let state = tokens.get_mut(&token).ok_or(HostError::UnknownToken(token))?;
        if state.minter.is_some() {
            return Err(HostError::NotMinter { token, caller: Address::ZERO });
        }
        self.credit(state, token, to, amount)
    }

    pub fn approve(&self, token: Address, owner: Address, spender: Address, amount: U256) -> Result<(), HostError> {
        let mut tokens = self.tokens.borrow_mut();
        let state = tokens.get_mut(&token).ok_or(HostError::UnknownToken(token))?;
        self.set_allowance(state, token, owner, spender, amount);
        Ok(())
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.tokens
            .borrow()
            .get(&token)
            .and_then(|s| s.allowances.get(&(owner, spender)).copied())
            .unwrap_or(U256::ZERO)
    }

    pub fn total_supply(&self, token: Address) -> U256 {
        self.tokens
            .borrow()
            .get(&token)
            .map(|s| s.total_supply)
            .unwrap_or(U256::ZERO)
    }

    pub fn symbol(&self, token: Address) -> Option<String> {
        self.tokens.borrow().get(&token).map(|s| s.symbol.clone())
    }

    /// Makes `token` report failure (`false`) on every transfer.
    pub fn set_transfers_fail(&self, token: Address, fail: bool) {
        if let Some(state) = self.tokens.borrow_mut().get_mut(&token) {
            state.transfers_fail = fail;
        }
    }

    /// Makes `token` report failure (`false`) on every mint.
    pub fn set_mints_fail(&self, token: Address, fail: bool) {
        if let Some(state) = self.tokens.borrow_mut().get_mut(&token) {
            state.mints_fail = fail;
        }
    }

    pub fn add_feed(&self, feed: Address, decimals: u8, answer: I256) -> Rc<MockAggregator> {
        let aggregator = Rc::new(MockAggregator::new(decimals, answer, self.clock.get()));
        self.feeds.borrow_mut().insert(feed, Rc::clone(&aggregator));
        aggregator
    }

    /// 8-decimal USD feed priced in whole dollars.
    pub fn add_usd_feed(&self, feed: Address, usd_per_unit: u64) -> Rc<MockAggregator> {
        self.add_feed(feed, 8, usd_answer(usd_per_unit))
    }

    pub fn feed(&self, feed: Address) -> Option<Rc<MockAggregator>> {
        self.feeds.borrow().get(&feed).cloned()
    }

    /// Publishes a new answer stamped with the current chain time.
    pub fn set_price(&self, feed: Address, answer: I256) -> Result<(), HostError> {
        let aggregator = self.feed(feed).ok_or(HostError::UnknownFeed(feed))?;
        aggregator.update_answer(answer, self.clock.get());
        Ok(())
    }

    pub fn set_usd_price(&self, feed: Address, usd_per_unit: u64) -> Result<(), HostError> {
        self.set_price(feed, usd_answer(usd_per_unit))
    }

    fn record(&self, entry: ChainEntry) {
        if self.open_checkpoints.get() > 0 {
            self.journal.borrow_mut().push(entry);
        }
    }

    fn set_balance(&self, state: &mut TokenState, token: Address, owner: Address, value: U256) {
        self.record(ChainEntry::Balance {
            token,
            owner,
            previous: state.balances.get(&owner).copied(),
        });
        state.balances.insert(owner, value);
    }

    fn set_allowance(&self, state: &mut TokenState, token: Address, owner: Address, spender: Address, value: U256) {
        self.record(ChainEntry::Allowance {
            token,
            owner,
            spender,
            previous: state.allowances.get(&(owner, spender)).copied(),
        });
        state.allowances.insert((owner, spender), value);
    }

    fn set_supply(&self, state: &mut TokenState, token: Address, value: U256) {
        self.record(ChainEntry::Supply {
            token,
            previous: state.total_supply,
        });
        state.total_supply = value;
    }

    fn move_balance(
        &self,
        state: &mut TokenState,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), HostError> {
        let available = state.balance(from);
        if available < amount {
            return Err(HostError::InsufficientBalance {
                token,
                owner: from,
                requested: amount,
                available,
            });
        }
        self.set_balance(state, token, from, available - amount);
        let credited = state.balance(to).checked_add(amount).ok_or(HostError::Overflow)?;
        self.set_balance(state, token, to, credited);
        Ok(())
    }

    fn credit(&self, state: &mut TokenState, token: Address, to: Address, amount: U256) -> Result<(), HostError> {
        let supply = state.total_supply.checked_add(amount).ok_or(HostError::Overflow)?;
        let credited = state.balance(to).checked_add(amount).ok_or(HostError::Overflow)?;
        self.set_supply(state, token, supply);
        self.set_balance(state, token, to, credited);
        Ok(())
    }

    fn close_checkpoint(&self) {
        let open = self.open_checkpoints.get().saturating_sub(1);
        self.open_checkpoints.set(open);
        if open == 0 {
            self.journal.borrow_mut().clear();
        }
    }
}

impl Host for InMemoryChain {
    type Checkpoint = ChainCheckpoint;

    fn now(&self) -> Timestamp {
        self.clock.get()
    }

    fn price_feed(&self, feed: Address) -> Result<Rc<dyn PriceFeed>, HostError> {
        let aggregator: Rc<dyn PriceFeed> = self.feed(feed).ok_or(HostError::UnknownFeed(feed))?;
        Ok(aggregator)
    }

    fn transfer_from(
        &self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<bool, HostError> {
        let mut tokens = self.tokens.borrow_mut();
        let state = tokens.get_mut(&token).ok_or(HostError::UnknownToken(token))?;
        if state.transfers_fail {
            return Ok(false);
        }

        let allowed = state.allowances.get(&(from, spender)).copied().unwrap_or(U256::ZERO);
        if allowed < amount {
            return Err(HostError::InsufficientAllowance {
                token,
                owner: from,
                spender,
                requested: amount,
                allowed,
            });
        }

        self.move_balance(state, token, from, to, amount)?;
        // unlimited approvals are never drawn down
        if allowed != U256::MAX {
            self.set_allowance(state, token, from, spender, allowed - amount);
        }
        Ok(true)
    }

    fn transfer(&self, token: Address, sender: Address, to: Address, amount: U256) -> Result<bool, HostError> {
        let mut tokens = self.tokens.borrow_mut();
        let state = tokens.get_mut(&token).ok_or(HostError::UnknownToken(token))?;
        if state.transfers_fail {
            return Ok(false);
        }
        self.move_balance(state, token, sender, to, amount)?;
        Ok(true)
    }

    fn mint(&self, token: Address, minter: Address, to: Address, amount: U256) -> Result<bool, HostError> {
        let mut tokens = self.tokens.borrow_mut();
        let state = tokens.get_mut(&token).ok_or(HostError::UnknownToken(token))?;
        state.ensure_minter(token, minter)?;
        if to == Address::ZERO {
            return Err(HostError::ZeroAddress);
        }
        if amount.is_zero() {
            return Err(HostError::ZeroAmount);
        }
        if state.mints_fail {
            return Ok(false);
        }

        self.credit(state, token, to, amount)?;
        Ok(true)
    }

    fn burn(&self, token: Address, burner: Address, amount: U256) -> Result<(), HostError> {
        let mut tokens = self.tokens.borrow_mut();
        let state = tokens.get_mut(&token).ok_or(HostError::UnknownToken(token))?;
        state.ensure_minter(token, burner)?;
        if amount.is_zero() {
            return Err(HostError::ZeroAmount);
        }

        let available = state.balance(burner);
        if available < amount {
            return Err(HostError::BurnAmountExceedsBalance {
                requested: amount,
                available,
            });
        }
        self.set_balance(state, token, burner, available - amount);
        let supply = state.total_supply - amount;
        self.set_supply(state, token, supply);
        Ok(())
    }

    fn balance_of(&self, token: Address, owner: Address) -> Result<U256, HostError> {
        self.tokens
            .borrow()
            .get(&token)
            .map(|s| s.balance(owner))
            .ok_or(HostError::UnknownToken(token))
    }

    fn checkpoint(&self) -> ChainCheckpoint {
        self.open_checkpoints.set(self.open_checkpoints.get() + 1);
        ChainCheckpoint(self.journal.borrow().len())
    }

    /// Undoes every balance, allowance and supply write since `checkpoint`, newest first.
    fn revert_to(&self, checkpoint: ChainCheckpoint) {
        let mut tokens = self.tokens.borrow_mut();
        let mut journal = self.journal.borrow_mut();
        while journal.len() > checkpoint.0 {
            let Some(entry) = journal.pop() else {
                break;
            };
            match entry {
                ChainEntry::Balance { token, owner, previous } => {
                    if let Some(state) = tokens.get_mut(&token) {
                        match previous {
                            Some(value) => state.balances.insert(owner, value),
                            None => state.balances.remove(&owner),
                        };
                    }
                }
                ChainEntry::Allowance { token, owner, spender, previous } => {
                    if let Some(state) = tokens.get_mut(&token) {
                        match previous {
                            Some(value) => state.allowances.insert((owner, spender), value),
                            None => state.allowances.remove(&(owner, spender)),
                        };
                    }
                }
                ChainEntry::Supply { token, previous } => {
                    if let Some(state) = tokens.get_mut(&token) {
                        state.total_supply = previous;
                    }
                }
            }
        }
        drop(journal);
        drop(tokens);
        self.close_checkpoint();
    }

    fn commit(&self, _checkpoint: ChainCheckpoint) {
        self.close_checkpoint();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::wad;

    const WETH: Address = Address::repeat_byte(0x01);
    const DSC: Address = Address::repeat_byte(0xd5);
    const ENGINE: Address = Address::repeat_byte(0xee);
    const ALICE: Address = Address::repeat_byte(0xa1);
    const BOB: Address = Address::repeat_byte(0xb2);

    fn chain() -> InMemoryChain {
        let chain = InMemoryChain::new(Timestamp::from_secs(1_000));
        chain.deploy_token(WETH, "WETH");
        chain.deploy_debt_token(DSC, "DSC", ENGINE);
        chain
    }

    #[test]
    fn transfer_from_needs_allowance() {
        let chain = chain();
        chain.faucet(WETH, ALICE, wad(10)).unwrap();

        let result = chain.transfer_from(WETH, ENGINE, ALICE, ENGINE, wad(1));
        assert!(matches!(result, Err(HostError::InsufficientAllowance { .. })));

        chain.approve(WETH, ALICE, ENGINE, wad(4)).unwrap();
        assert_eq!(chain.transfer_from(WETH, ENGINE, ALICE, ENGINE, wad(3)), Ok(true));
        assert_eq!(chain.balance_of(WETH, ENGINE).unwrap(), wad(3));
        assert_eq!(chain.allowance(WETH, ALICE, ENGINE), wad(1));
    }

    #[test]
    fn only_owner_mints_and_burns_debt_token() {
        let chain = chain();

        let result = chain.mint(DSC, ALICE, ALICE, wad(1));
        assert_eq!(result, Err(HostError::NotMinter { token: DSC, caller: ALICE }));

        assert_eq!(chain.mint(DSC, ENGINE, ALICE, wad(5)), Ok(true));
        assert_eq!(chain.total_supply(DSC), wad(5));

        chain.transfer(DSC, ALICE, ENGINE, wad(2)).unwrap();
        assert!(matches!(chain.burn(DSC, ALICE, wad(1)), Err(HostError::NotMinter { .. })));
        chain.burn(DSC, ENGINE, wad(2)).unwrap();
        assert_eq!(chain.total_supply(DSC), wad(3));
    }

    #[test]
    fn burn_beyond_balance_rejected() {
        let chain = chain();
        let result = chain.burn(DSC, ENGINE, wad(1));
        assert!(matches!(result, Err(HostError::BurnAmountExceedsBalance { .. })));
    }

    #[test]
    fn ownership_moves_authority() {
        let chain = chain();
        chain.transfer_ownership(DSC, ENGINE, BOB).unwrap();

        assert_eq!(chain.owner_of(DSC), Some(BOB));
        assert!(chain.mint(DSC, ENGINE, ALICE, wad(1)).is_err());
        assert_eq!(chain.mint(DSC, BOB, ALICE, wad(1)), Ok(true));
        assert!(chain.transfer_ownership(DSC, ENGINE, ALICE).is_err());
    }

    #[test]
    fn faucet_refuses_debt_token() {
        let chain = chain();
        assert!(chain.faucet(DSC, ALICE, wad(1)).is_err());
    }

    #[test]
    fn failing_token_reports_false() {
        let chain = chain();
        chain.faucet(WETH, ALICE, wad(1)).unwrap();
        chain.set_transfers_fail(WETH, true);

        assert_eq!(chain.transfer(WETH, ALICE, BOB, wad(1)), Ok(false));
        assert_eq!(chain.balance_of(WETH, ALICE).unwrap(), wad(1));
    }

    #[test]
    fn checkpoint_restores_balances() {
        let chain = chain();
        chain.faucet(WETH, ALICE, wad(5)).unwrap();

        let checkpoint = chain.checkpoint();
        chain.transfer(WETH, ALICE, BOB, wad(2)).unwrap();
        chain.mint(DSC, ENGINE, BOB, wad(9)).unwrap();
        chain.revert_to(checkpoint);

        assert_eq!(chain.balance_of(WETH, ALICE).unwrap(), wad(5));
        assert_eq!(chain.balance_of(WETH, BOB).unwrap(), U256::ZERO);
        assert_eq!(chain.total_supply(DSC), U256::ZERO);
    }

    #[test]
    fn revert_restores_allowances_and_removes_new_holders() {
        let chain = chain();
        chain.faucet(WETH, ALICE, wad(5)).unwrap();
        chain.approve(WETH, ALICE, ENGINE, wad(3)).unwrap();

        let checkpoint = chain.checkpoint();
        chain.transfer_from(WETH, ENGINE, ALICE, BOB, wad(2)).unwrap();
        assert_eq!(chain.allowance(WETH, ALICE, ENGINE), wad(1));
        chain.revert_to(checkpoint);

        assert_eq!(chain.allowance(WETH, ALICE, ENGINE), wad(3));
        assert_eq!(chain.balance_of(WETH, ALICE).unwrap(), wad(5));
        assert!(!chain.tokens.borrow()[&WETH].balances.contains_key(&BOB));
        assert!(chain.journal.borrow().is_empty());
    }

    #[test]
    fn commit_keeps_changes_and_releases_the_journal() {
        let chain = chain();
        chain.faucet(WETH, ALICE, wad(5)).unwrap();
        // writes outside a checkpoint are not journaled
        assert!(chain.journal.borrow().is_empty());

        let outer = chain.checkpoint();
        chain.transfer(WETH, ALICE, BOB, wad(1)).unwrap();
        let inner = chain.checkpoint();
        chain.mint(DSC, ENGINE, BOB, wad(2)).unwrap();
        chain.commit(inner);
        assert!(!chain.journal.borrow().is_empty());

        chain.revert_to(outer);
        assert_eq!(chain.balance_of(WETH, BOB).unwrap(), U256::ZERO);
        assert_eq!(chain.total_supply(DSC), U256::ZERO);

        let checkpoint = chain.checkpoint();
        chain.transfer(WETH, ALICE, BOB, wad(1)).unwrap();
        chain.commit(checkpoint);
        assert_eq!(chain.balance_of(WETH, BOB).unwrap(), wad(1));
        assert!(chain.journal.borrow().is_empty());
    }

    #[test]
    fn price_updates_are_stamped_with_chain_time() {
        let chain = chain();
        let feed_address = Address::repeat_byte(0xf1);
        chain.add_usd_feed(feed_address, 2000);

        chain.advance_time(60);
        chain.set_usd_price(feed_address, 1800).unwrap();

        let round = chain.price_feed(feed_address).unwrap().latest_round_data();
        assert_eq!(round.answer, usd_answer(1800));
        assert_eq!(round.updated_at, Timestamp::from_secs(1_060));
        assert_eq!(round.round_id, 2);
    }
}
