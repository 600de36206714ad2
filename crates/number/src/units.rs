use alloy::primitives::{U256, utils::Unit};

pub trait EthUnit: std::marker::Sized {
    /// Returns the current wei amount.
    fn wei(self) -> U256;

    /// Returns the current Gwei amount as wei (i.e. 1e9 wei).
    fn gwei(self) -> U256 {
        self.wei() * Unit::GWEI.wei()
    }

    /// Returns the current milli-ether amount as wei (i.e. 1e15 wei).
    fn milli_eth(self) -> U256 {
        self.wei() * Unit::PWEI.wei()
    }

    /// Returns the current Eth amount as wei (i.e. 1e18 wei).
    fn eth(self) -> U256 {
        self.wei() * Unit::ETHER.wei()
    }
}

impl EthUnit for u64 {
    fn wei(self) -> U256 {
        U256::from(self)
    }
}

impl EthUnit for u128 {
    fn wei(self) -> U256 {
        U256::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_to_wei() {
        assert_eq!(1u64.gwei(), U256::from(1_000_000_000u64));
        assert_eq!(2_500u64.milli_eth(), U256::from(2_500_000_000_000_000_000u128));
        assert_eq!(3u128.eth(), U256::from(3_000_000_000_000_000_000u128));
    }
}
