use {
    crate::u256_ext::U256Ext,
    alloy::primitives::U256,
    anyhow::{Context, Result, ensure},
    bigdecimal::{BigDecimal, num_bigint::ToBigInt},
    std::str::FromStr,
};

/// Number of decimals between wei and ether.
pub const ETHER_DECIMALS: i64 = 18;

/// Exact decimal ether value of a wei amount.
pub fn base_to_decimal(amount: U256) -> BigDecimal {
    BigDecimal::new(amount.to_big_int(), ETHER_DECIMALS)
}

/// Converts a decimal ether value into wei.
///
/// Fails instead of rounding if the value is more precise than one wei, and
/// fails for negative values or values that don't fit into 256 bits.
pub fn decimal_to_base(amount: &BigDecimal) -> Result<U256> {
    let (digits, scale) = amount.as_bigint_and_exponent();
    let wei = BigDecimal::new(digits, scale - ETHER_DECIMALS);
    ensure!(
        wei.is_integer(),
        "{amount} has more than {ETHER_DECIMALS} decimals"
    );
    let wei = wei.to_bigint().context("not an integer")?;
    U256::from_big_int(&wei)
}

/// Parses a human entered ether amount like `1`, `0.25` or `1.000000000000000001`.
///
/// Only plain decimal notation is accepted: no sign, no exponent, no
/// separators.
pub fn parse_ether(input: &str) -> Result<U256> {
    let input = input.trim();
    let (integer, fraction) = match input.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (input, None),
    };
    let is_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    ensure!(
        is_digits(integer) && fraction.is_none_or(is_digits),
        "{input:?} is not a decimal number"
    );
    let amount = BigDecimal::from_str(input).context("invalid decimal")?;
    decimal_to_base(&amount)
}

/// Ether representation of a wei amount rounded to the given number of
/// significant digits, e.g. `2.500` for 2.5 ether and `0.000` for nothing
/// with 4 digits.
pub fn format_ether_significant(amount: U256, digits: u64) -> String {
    let digits = digits.max(1);
    if amount.is_zero() {
        let fraction = usize::try_from(digits - 1).unwrap_or_default();
        return match fraction {
            0 => "0".to_string(),
            _ => format!("0.{}", "0".repeat(fraction)),
        };
    }
    let rounded = base_to_decimal(amount).with_prec(digits);
    plain_string(&rounded)
}

/// Formats a non-negative decimal without ever switching to exponential
/// notation.
fn plain_string(value: &BigDecimal) -> String {
    let (digits, scale) = value.as_bigint_and_exponent();
    let digits = digits.to_string();
    if scale <= 0 {
        return format!("{digits}{}", "0".repeat(scale.unsigned_abs() as usize));
    }
    let scale = scale.unsigned_abs() as usize;
    let digits = format!("{digits:0>width$}", width = scale + 1);
    let (integer, fraction) = digits.split_at(digits.len() - scale);
    format!("{integer}.{fraction}")
}

#[cfg(test)]
mod tests {
    use {super::*, crate::units::EthUnit};

    #[test]
    fn decimal_round_trip() {
        let amounts = [
            U256::ZERO,
            U256::from(1),
            1u64.gwei(),
            2_500u64.milli_eth(),
            1_000_000u64.eth(),
            U256::MAX,
        ];
        for amount in amounts {
            assert_eq!(decimal_to_base(&base_to_decimal(amount)).unwrap(), amount);
        }
    }

    #[test]
    fn parses_plain_decimals() {
        assert_eq!(parse_ether("1").unwrap(), 1u64.eth());
        assert_eq!(parse_ether("1.0").unwrap(), 1u64.eth());
        assert_eq!(parse_ether(" 2.5 ").unwrap(), 2_500u64.milli_eth());
        assert_eq!(parse_ether("0.000000000000000001").unwrap(), U256::from(1));
        assert_eq!(parse_ether("0").unwrap(), U256::ZERO);
    }

    #[test]
    fn rejects_malformed_or_lossy_input() {
        for input in [
            "",
            ".",
            ".5",
            "1.",
            "-1",
            "+1",
            "1e18",
            "1,5",
            "abc",
            "0.0000000000000000001",
        ] {
            assert!(parse_ether(input).is_err(), "{input:?} should be rejected");
        }
        assert!(parse_ether(&U256::MAX.to_string()).is_err());
    }

    #[test]
    fn formats_significant_digits() {
        assert_eq!(format_ether_significant(U256::ZERO, 4), "0.000");
        assert_eq!(format_ether_significant(U256::ZERO, 1), "0");
        assert_eq!(format_ether_significant(2_500u64.milli_eth(), 4), "2.500");
        assert_eq!(format_ether_significant(3_100u64.milli_eth(), 4), "3.100");
        assert_eq!(format_ether_significant(1_000_000u64.eth(), 4), "1000000");
    }
}
