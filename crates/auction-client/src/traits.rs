//! Trait definitions for external system boundaries.
//!
//! The engine only talks to the auction contract and to the identity provider
//! through these traits so that it can be unit tested with mocks.

use {
    alloy::primitives::{Address, TxHash, U256},
    futures::stream::BoxStream,
    std::sync::Arc,
    thiserror::Error,
};

/// Who currently leads the auction and with how much.
///
/// Both values describe a single fact and are therefore only ever replaced
/// together.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HighestBid {
    /// Amount in wei.
    pub amount: U256,
    /// The zero address while nobody has bid yet.
    pub bidder: Address,
}

/// The state changing operations whose confirmation the engine waits for.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    Bid,
    Withdrawal,
}

/// Decoded confirmation event emitted by the auction contract.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AuctionEvent {
    Bid { bidder: Address, amount: U256 },
    Withdrawal { beneficiary: Address, amount: U256 },
}

impl AuctionEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Bid { .. } => EventKind::Bid,
            Self::Withdrawal { .. } => EventKind::Withdrawal,
        }
    }
}

/// An event together with the transaction that emitted it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Confirmation {
    pub event: AuctionEvent,
    /// Missing for logs of pending blocks.
    pub transaction: Option<TxHash>,
}

pub type Confirmations = BoxStream<'static, Result<Confirmation, GatewayError>>;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The node could not be reached or failed to process the request.
    #[error("node error: {0:#}")]
    Node(anyhow::Error),
    /// The contract reverted or returned data that could not be decoded.
    #[error("contract error: {0:#}")]
    Contract(anyhow::Error),
}

/// Abstracts the reads, submissions and event subscriptions of the auction
/// contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AuctionGateway: Send + Sync {
    /// Address that deployed the auction and may withdraw its proceeds.
    async fn owner(&self) -> Result<Address, GatewayError>;

    /// Current highest bid.
    async fn highest_bid(&self) -> Result<HighestBid, GatewayError>;

    /// Amount in wei the contract has on record for `bidder`.
    async fn bid_of(&self, bidder: Address) -> Result<U256, GatewayError>;

    /// Sends a bid carrying `value` wei. Resolves as soon as the node
    /// accepted the transaction, not once it got mined.
    async fn make_bid(&self, value: U256) -> Result<TxHash, GatewayError>;

    /// Sends the owner's withdrawal. Resolves as soon as the node accepted
    /// the transaction.
    async fn withdraw(&self) -> Result<TxHash, GatewayError>;

    /// Subscribes to confirmation events of the given kind emitted from now
    /// on. Dropping the stream ends the subscription.
    async fn confirmations(&self, kind: EventKind) -> Result<Confirmations, GatewayError>;
}

/// Hands out contract handles bound to the identity's current signing
/// capability.
///
/// Handles are meant to be used for a single operation and dropped
/// afterwards since the capability can change at any time.
#[cfg_attr(test, mockall::automock)]
pub trait Ledger: Send + Sync {
    fn gateway(&self) -> Result<Arc<dyn AuctionGateway>, GatewayError>;
}

/// Abstracts the wallet that decides which account the client acts for.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Asks for access to the accounts of the user. The first account is the
    /// active one.
    async fn request_accounts(&self) -> anyhow::Result<Vec<Address>>;

    /// Yields the new active account whenever the user switches accounts.
    fn account_changes(&self) -> BoxStream<'static, Address>;
}
