use {super::state::Field, crate::traits::GatewayError, thiserror::Error};

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("identity provider unavailable: {0:#}")]
    Unavailable(anyhow::Error),
    #[error("identity provider returned no accounts")]
    NoAccounts,
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("no account connected")]
    NotConnected,
    #[error("failed to get contract handle for {field:?}: {source}")]
    Ledger {
        field: Field,
        #[source]
        source: GatewayError,
    },
    #[error("failed to read {field:?}: {source}")]
    Gateway {
        field: Field,
        #[source]
        source: GatewayError,
    },
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("invalid amount: {0:#}")]
    InvalidAmount(anyhow::Error),
    #[error("no account connected")]
    NotConnected,
    #[error("only the auction owner can withdraw")]
    NotOwner,
    #[error("another submission is still outstanding")]
    Busy,
    #[error("failed to get contract handle: {0}")]
    Ledger(GatewayError),
    #[error("failed to subscribe to confirmations: {0}")]
    Subscription(GatewayError),
    #[error("submission rejected: {0}")]
    Rejected(GatewayError),
}

impl SubmissionError {
    /// Label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "invalid_amount",
            Self::NotConnected => "not_connected",
            Self::NotOwner => "not_owner",
            Self::Busy => "busy",
            Self::Ledger(_) => "ledger",
            Self::Subscription(_) => "subscription",
            Self::Rejected(_) => "rejected",
        }
    }
}
