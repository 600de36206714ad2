use {
    crate::traits::{EventKind, HighestBid},
    alloy::primitives::{Address, TxHash, U256},
};

/// Local view of the auction as last reported by the ledger.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Snapshot {
    pub highest_bid: HighestBid,
    /// Zero while disconnected.
    pub my_bid: U256,
    /// Established once per account.
    pub is_owner: bool,
}

/// Where the session currently is in its connect/submit/confirm cycle.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Phase {
    #[default]
    Disconnected,
    Idle,
    /// A request was handed to the node but not accepted yet.
    Submitting(EventKind),
    /// The node accepted the request; waiting for the contract event.
    AwaitingConfirmation {
        kind: EventKind,
        transaction: TxHash,
    },
}

impl Phase {
    /// Returns `true` while a submission is in flight and new submissions
    /// are refused.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Submitting(_) | Self::AwaitingConfirmation { .. }
        )
    }
}

/// Everything the presentation layer gets to observe.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct State {
    pub account: Option<Address>,
    pub snapshot: Snapshot,
    pub phase: Phase,
}

impl State {
    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    /// Fresh session for `account` with all fields at their defaults.
    pub(super) fn connected(account: Address) -> Self {
        Self {
            account: Some(account),
            snapshot: Snapshot::default(),
            phase: Phase::Idle,
        }
    }
}

/// Snapshot fields, each written by exactly one refresh operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    HighestBid,
    MyBid,
    Ownership,
}

impl Field {
    fn index(self) -> usize {
        match self {
            Self::HighestBid => 0,
            Self::MyBid => 1,
            Self::Ownership => 2,
        }
    }
}

/// Identifies one issued read so its result can be discarded once a newer
/// read of the same field or a new account session exists.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) struct Ticket {
    pub field: Field,
    session: u64,
    sequence: u64,
}

/// Bookkeeping of issued reads.
#[derive(Debug, Default)]
pub(super) struct Requests {
    session: u64,
    latest: [u64; 3],
    /// Set by the first successful ownership read of the session.
    pub ownership_resolved: bool,
}

impl Requests {
    pub fn issue(&mut self, field: Field) -> Ticket {
        let latest = &mut self.latest[field.index()];
        *latest += 1;
        Ticket {
            field,
            session: self.session,
            sequence: *latest,
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.session == self.session && ticket.sequence == self.latest[ticket.field.index()]
    }

    /// Identifies the current account session.
    pub fn session(&self) -> u64 {
        self.session
    }

    /// Invalidates all outstanding reads.
    pub fn new_session(&mut self) {
        self.session += 1;
        self.ownership_resolved = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_reads_supersede_older_ones() {
        let mut requests = Requests::default();
        let first = requests.issue(Field::HighestBid);
        let other_field = requests.issue(Field::MyBid);
        let second = requests.issue(Field::HighestBid);

        assert!(!requests.is_current(&first));
        assert!(requests.is_current(&second));
        assert!(requests.is_current(&other_field));
    }

    #[test]
    fn new_session_invalidates_everything() {
        let mut requests = Requests::default();
        let ticket = requests.issue(Field::Ownership);
        requests.ownership_resolved = true;

        requests.new_session();

        assert!(!requests.is_current(&ticket));
        assert!(!requests.ownership_resolved);
        let fresh = requests.issue(Field::Ownership);
        assert!(requests.is_current(&fresh));
        assert_ne!(requests.session(), 0);
    }
}
