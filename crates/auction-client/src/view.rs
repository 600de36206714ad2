//! What a front end shows for a given session state.

use {
    crate::engine::State,
    alloy::primitives::Address,
    number::conversions::format_ether_significant,
    std::fmt::{self, Display, Formatter},
};

/// Significant digits amounts are displayed with by default.
pub const DEFAULT_PRECISION: u64 = 4;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct View {
    /// Lower case hex, empty while disconnected.
    pub account: String,
    pub my_bid: String,
    pub highest_bid: String,
    pub highest_bidder: BidderLabel,
    /// The owner can't bid on their own auction.
    pub can_bid: bool,
    pub can_withdraw: bool,
    /// A submission is waiting to be accepted or confirmed.
    pub busy: bool,
}

impl View {
    pub fn new(state: &State, precision: u64) -> Self {
        let snapshot = &state.snapshot;
        let connected = state.is_connected();
        let highest_bidder = match (snapshot.highest_bid.bidder, state.account) {
            (bidder, _) if bidder == Address::ZERO => BidderLabel::Nobody,
            (bidder, Some(account)) if bidder == account => BidderLabel::Me,
            (bidder, _) => BidderLabel::Other(bidder),
        };
        Self {
            account: state
                .account
                .map(const_hex::encode_prefixed)
                .unwrap_or_default(),
            my_bid: format_ether_significant(snapshot.my_bid, precision),
            highest_bid: format_ether_significant(snapshot.highest_bid.amount, precision),
            highest_bidder,
            can_bid: connected && !snapshot.is_owner,
            can_withdraw: connected && snapshot.is_owner,
            busy: state.phase.is_busy(),
        }
    }
}

impl Display for View {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Connected Account: {}", self.account)?;
        writeln!(f, "My Bid: {}", self.my_bid)?;
        writeln!(f, "Auction Highest Bid Amount: {}", self.highest_bid)?;
        write!(f, "Auction Highest Bidder: {}", self.highest_bidder)?;
        if self.busy {
            write!(f, "\nWaiting for confirmation...")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BidderLabel {
    /// Nobody bid yet.
    Nobody,
    /// The connected account leads.
    Me,
    Other(Address),
}

impl Display for BidderLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nobody => f.write_str("null"),
            Self::Me => f.write_str("Me"),
            Self::Other(bidder) => f.write_str(&const_hex::encode_prefixed(bidder)),
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            engine::{Phase, Snapshot},
            traits::{EventKind, HighestBid},
        },
        alloy::primitives::{TxHash, address},
        number::units::EthUnit,
    };

    const ALICE: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const BOB: Address = address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8");

    fn connected(account: Address, snapshot: Snapshot) -> State {
        State {
            account: Some(account),
            snapshot,
            phase: Phase::Idle,
        }
    }

    #[test]
    fn disconnected() {
        let view = View::new(&State::default(), DEFAULT_PRECISION);

        assert_eq!(view.account, "");
        assert_eq!(view.my_bid, "0.000");
        assert_eq!(view.highest_bidder, BidderLabel::Nobody);
        assert!(!view.can_bid);
        assert!(!view.can_withdraw);
        assert!(!view.busy);
    }

    #[test]
    fn zero_address_bidder_renders_as_null() {
        let state = connected(
            ALICE,
            Snapshot {
                highest_bid: HighestBid {
                    amount: 2_500u64.milli_eth(),
                    bidder: Address::ZERO,
                },
                ..Default::default()
            },
        );

        let view = View::new(&state, DEFAULT_PRECISION);

        assert_eq!(view.highest_bid, "2.500");
        assert_eq!(view.highest_bidder.to_string(), "null");
    }

    #[test]
    fn own_bid_renders_as_me() {
        let state = connected(
            ALICE,
            Snapshot {
                highest_bid: HighestBid {
                    amount: 1u64.eth(),
                    bidder: ALICE,
                },
                my_bid: 1u64.eth(),
                is_owner: false,
            },
        );

        let view = View::new(&state, DEFAULT_PRECISION);

        assert_eq!(view.my_bid, "1.000");
        assert_eq!(view.highest_bidder.to_string(), "Me");
        assert_eq!(
            view.to_string(),
            "Connected Account: 0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266\n\
             My Bid: 1.000\n\
             Auction Highest Bid Amount: 1.000\n\
             Auction Highest Bidder: Me"
        );
    }

    #[test]
    fn other_bidder_renders_as_address() {
        let state = connected(
            ALICE,
            Snapshot {
                highest_bid: HighestBid {
                    amount: 3_100u64.milli_eth(),
                    bidder: BOB,
                },
                ..Default::default()
            },
        );

        let view = View::new(&state, 2);

        assert_eq!(view.highest_bid, "3.1");
        assert_eq!(
            view.highest_bidder.to_string(),
            "0x70997970c51812dc3a010c7d01b50e0d17dc79c8"
        );
    }

    #[test]
    fn affordances_follow_ownership() {
        let owner = View::new(
            &connected(
                ALICE,
                Snapshot {
                    is_owner: true,
                    ..Default::default()
                },
            ),
            DEFAULT_PRECISION,
        );
        assert!(owner.can_withdraw);
        assert!(!owner.can_bid);

        let mut state = connected(BOB, Snapshot::default());
        state.phase = Phase::AwaitingConfirmation {
            kind: EventKind::Bid,
            transaction: TxHash::repeat_byte(1),
        };
        let bidder = View::new(&state, DEFAULT_PRECISION);
        assert!(bidder.can_bid);
        assert!(!bidder.can_withdraw);
        assert!(bidder.busy);
    }
}
