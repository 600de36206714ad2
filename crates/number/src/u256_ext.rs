//! Extension trait for converting U256 from and to arbitrary precision
//! integers.

use {
    alloy::primitives::U256,
    anyhow::Result,
    num::{BigInt, BigUint},
};

/// Extension trait for U256 to add big integer conversions.
pub trait U256Ext: Sized {
    /// Convert to BigInt.
    fn to_big_int(&self) -> BigInt;

    /// Convert to BigUint.
    fn to_big_uint(&self) -> BigUint;

    /// Create from BigInt. Fails for negative or too large values.
    fn from_big_int(input: &BigInt) -> Result<Self>;

    /// Create from BigUint. Fails for values that need more than 256 bits.
    fn from_big_uint(input: &BigUint) -> Result<Self>;
}

impl U256Ext for U256 {
    fn to_big_int(&self) -> BigInt {
        BigInt::from_biguint(num::bigint::Sign::Plus, self.to_big_uint())
    }

    fn to_big_uint(&self) -> BigUint {
        BigUint::from_bytes_be(self.to_be_bytes::<32>().as_slice())
    }

    fn from_big_int(input: &BigInt) -> Result<Self> {
        anyhow::ensure!(input.sign() != num::bigint::Sign::Minus, "negative");
        Self::from_big_uint(input.magnitude())
    }

    fn from_big_uint(input: &BigUint) -> Result<Self> {
        let bytes = input.to_bytes_be();
        anyhow::ensure!(bytes.len() <= 32, "too large");
        Ok(U256::from_be_slice(&bytes))
    }
}

#[cfg(test)]
mod tests {
    use {super::*, num::One, std::str::FromStr};

    #[test]
    fn big_int_round_trip() {
        for value in [U256::ZERO, U256::from(1), U256::from(1337), U256::MAX] {
            assert_eq!(U256::from_big_int(&value.to_big_int()).unwrap(), value);
        }
    }

    #[test]
    fn rejects_out_of_range_big_ints() {
        let max = BigInt::from_str(
            "115792089237316195423570985008687907853269984665640564039457584007913129639935",
        )
        .unwrap();
        assert_eq!(U256::from_big_int(&max).unwrap(), U256::MAX);
        assert!(U256::from_big_int(&(max + BigInt::one())).is_err());
        assert!(U256::from_big_int(&BigInt::from(-1)).is_err());
    }
}
