//! Collaborator seam.
//!
//! Everything the engine does not own sits behind [`Host`]: the clock, the
//! price feeds, and the token contracts (collateral assets and the debt token).
//! Methods take `&self` because collaborators own their state; a collaborator
//! is therefore free to call back into the engine mid-operation, which the
//! engine's reentrancy lock rejects.
//!
//! A host must also be able to roll its own state back. The engine checkpoints
//! the host when a mutating call starts, then reverts it when the call fails
//! or commits it when the call succeeds, so token movements never outlive a
//! rejected operation.

use crate::oracle::PriceFeed;
use crate::types::{Address, Timestamp, U256};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("Unknown token {0}")]
    UnknownToken(Address),

    #[error("Unknown price feed {0}")]
    UnknownFeed(Address),

    #[error("Insufficient balance of {token} for {owner}: requested {requested}, available {available}")]
    InsufficientBalance {
        token: Address,
        owner: Address,
        requested: U256,
        available: U256,
    },

    #[error("Insufficient allowance of {token}: {spender} may move {allowed} from {owner}, requested {requested}")]
    InsufficientAllowance {
        token: Address,
        owner: Address,
        spender: Address,
        requested: U256,
        allowed: U256,
    },

    #[error("{caller} is not the minter of {token}")]
    NotMinter { token: Address, caller: Address },

    #[error("Amount must be more than zero")]
    ZeroAmount,

    #[error("Zero address is not a valid recipient")]
    ZeroAddress,

    #[error("Burn amount {requested} exceeds balance {available}")]
    BurnAmountExceedsBalance { requested: U256, available: U256 },

    #[error("Token supply overflow")]
    Overflow,
}

pub trait Host {
    type Checkpoint;

    fn now(&self) -> Timestamp;

    fn price_feed(&self, feed: Address) -> Result<Rc<dyn PriceFeed>, HostError>;

    /// `spender` moves `amount` of `token` from `from` to `to` under an allowance.
    /// `Ok(false)` is a token that reported failure without reverting.
    fn transfer_from(
        &self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<bool, HostError>;

    /// `sender` moves `amount` of its own `token` balance to `to`.
    fn transfer(&self, token: Address, sender: Address, to: Address, amount: U256) -> Result<bool, HostError>;

    /// Mints `token` to `to`. Only the token's minter may call this.
    fn mint(&self, token: Address, minter: Address, to: Address, amount: U256) -> Result<bool, HostError>;

    /// Burns `amount` of `burner`'s own balance. Only the token's minter may call this.
    fn burn(&self, token: Address, burner: Address, amount: U256) -> Result<(), HostError>;

    fn balance_of(&self, token: Address, owner: Address) -> Result<U256, HostError>;

    fn checkpoint(&self) -> Self::Checkpoint;

    /// Undoes every state change made since `checkpoint` was taken.
    fn revert_to(&self, checkpoint: Self::Checkpoint);

    /// Keeps the changes made since `checkpoint`.
    fn commit(&self, checkpoint: Self::Checkpoint);
}
