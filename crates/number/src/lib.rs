//! Amount handling for the ledger's native asset.
//!
//! Amounts are carried around as [`alloy::primitives::U256`] base units (wei)
//! and only converted to decimal ether at the edges of the system.
pub mod conversions;
pub mod u256_ext;
pub mod units;
