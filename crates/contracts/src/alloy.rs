//! Bindings of the on-chain auction the client synchronizes with.

// Generate the main bindings in a private module. That allows us to re-export
// all items in our own module while also adding some items ourselves.
#[allow(non_snake_case)]
mod AuctionPrivate {
    alloy::sol!(
        #[allow(missing_docs)]
        #[sol(rpc)]
        contract Auction {
            /// Emitted once a bid has been accepted.
            event LogBid(address indexed bidder, uint256 amount);

            /// Emitted once the owner withdrew the proceeds.
            event LogWithdrawal(address indexed beneficiary, uint256 amount);

            function getOwner() external view returns (address);

            function fetchHighestBid() external view returns (uint256 bidAmount, address bidder);

            function bids(address bidder) external view returns (uint256);

            function makeBid() external payable;

            function withdraw() external returns (bool);
        }
    );
}

#[allow(non_snake_case)]
pub mod Auction {
    use alloy::providers::DynProvider;

    pub use super::AuctionPrivate::*;

    pub type Instance = Auction::AuctionInstance<DynProvider>;
}
