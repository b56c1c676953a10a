//! Decimal amount conversion
//!
//! Amounts are typed by users as decimal strings ("1.5") and carried on
//! chain as integers in the token's smallest unit.

use evmkey_crypto::{codec, U256};
use num_bigint::BigUint;
use num_traits::{pow, Zero};
use thiserror::Error;

/// Decimals of the native currency (1 ether = 10^18 wei)
pub const ETHER_DECIMALS: u8 = 18;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("Amount is empty")]
    Empty,
    #[error("Invalid amount '{0}'")]
    InvalidNumber(String),
    #[error("Amount has more than {max} fractional digits")]
    TooManyDecimals { max: u8 },
    #[error("Amount does not fit in 256 bits")]
    Overflow,
}

fn ten_pow(exp: u8) -> BigUint {
    pow(BigUint::from(10u8), exp as usize)
}

/// Parse a non-negative decimal string into base units: `"1.5"` with 6
/// decimals is `1_500_000`.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, UnitsError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (int_part, frac_part) = match amount.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (amount, ""),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty())
        || !all_digits(int_part)
        || !all_digits(frac_part)
    {
        return Err(UnitsError::InvalidNumber(amount.to_string()));
    }
    if frac_part.len() > decimals as usize {
        return Err(UnitsError::TooManyDecimals { max: decimals });
    }

    let mut digits = String::with_capacity(int_part.len() + decimals as usize);
    digits.push_str(int_part);
    digits.push_str(frac_part);
    for _ in frac_part.len()..decimals as usize {
        digits.push('0');
    }

    let value = if digits.is_empty() {
        BigUint::zero()
    } else {
        BigUint::parse_bytes(digits.as_bytes(), 10)
            .ok_or_else(|| UnitsError::InvalidNumber(amount.to_string()))?
    };
    codec::check_u256(&value).map_err(|_| UnitsError::Overflow)?;
    Ok(value)
}

/// Ether string to wei
pub fn to_wei(ether: &str) -> Result<U256, UnitsError> {
    parse_units(ether, ETHER_DECIMALS)
}

/// Render base units as a decimal string with exactly `precision`
/// fractional digits, rounding half up.
pub fn format_units(value: &U256, decimals: u8, precision: u8) -> String {
    let scaled = if precision >= decimals {
        value * ten_pow(precision - decimals)
    } else {
        let divisor = ten_pow(decimals - precision);
        let quotient = value / &divisor;
        let remainder = value % &divisor;
        if remainder * 2u8 >= divisor {
            quotient + 1u8
        } else {
            quotient
        }
    };

    if precision == 0 {
        return scaled.to_string();
    }

    let unit = ten_pow(precision);
    let whole = &scaled / &unit;
    let frac = &scaled % &unit;
    format!(
        "{}.{:0>width$}",
        whole,
        frac.to_string(),
        width = precision as usize
    )
}

/// Wei as ether
pub fn format_ether(wei: &U256, precision: u8) -> String {
    format_units(wei, ETHER_DECIMALS, precision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_wei() {
        assert_eq!(to_wei("1").unwrap(), U256::from(10u64.pow(18)));
        assert_eq!(to_wei("0.5").unwrap(), U256::from(5 * 10u64.pow(17)));
        assert_eq!(to_wei("0.000000000000000001").unwrap(), U256::from(1u8));
        assert_eq!(to_wei(" 2. ").unwrap(), U256::from(2 * 10u64.pow(18)));
        assert_eq!(to_wei(".25").unwrap(), U256::from(25 * 10u64.pow(16)));
        assert_eq!(to_wei("0").unwrap(), U256::zero());
    }

    #[test]
    fn test_parse_units_token_decimals() {
        assert_eq!(parse_units("1.5", 6).unwrap(), U256::from(1_500_000u32));
        assert_eq!(parse_units("42", 0).unwrap(), U256::from(42u8));
        assert_eq!(parse_units("0", 0).unwrap(), U256::zero());
    }

    #[test]
    fn test_parse_units_rejects() {
        assert_eq!(parse_units("", 18), Err(UnitsError::Empty));
        assert_eq!(parse_units("   ", 18), Err(UnitsError::Empty));
        assert!(matches!(parse_units("-1", 18), Err(UnitsError::InvalidNumber(_))));
        assert!(matches!(parse_units("+1", 18), Err(UnitsError::InvalidNumber(_))));
        assert!(matches!(parse_units("1.2.3", 18), Err(UnitsError::InvalidNumber(_))));
        assert!(matches!(parse_units("1e18", 18), Err(UnitsError::InvalidNumber(_))));
        assert!(matches!(parse_units(".", 18), Err(UnitsError::InvalidNumber(_))));
        assert_eq!(
            parse_units("1.1234567", 6),
            Err(UnitsError::TooManyDecimals { max: 6 })
        );
    }

    #[test]
    fn test_parse_units_overflow() {
        let max = codec::u256_max().to_string();
        assert_eq!(parse_units(&max, 0).unwrap(), codec::u256_max());
        assert_eq!(parse_units(&max, 1), Err(UnitsError::Overflow));
    }

    #[test]
    fn test_format_units_rounds_half_up() {
        assert_eq!(format_units(&U256::from(1_234_550u32), 6, 4), "1.2346");
        assert_eq!(format_units(&U256::from(1_234_549u32), 6, 4), "1.2345");
        assert_eq!(format_units(&U256::from(999_950u32), 6, 4), "1.0000");
        assert_eq!(format_units(&U256::zero(), 18, 4), "0.0000");
    }

    #[test]
    fn test_format_units_pads_and_scales() {
        assert_eq!(format_units(&U256::from(5u8), 0, 2), "5.00");
        assert_eq!(format_units(&U256::from(15u8), 1, 0), "2");
        assert_eq!(format_units(&U256::from(1u8), 2, 4), "0.0100");
        assert_eq!(format_ether(&to_wei("1.5").unwrap(), 4), "1.5000");
    }

    #[test]
    fn test_parse_format_round_trip() {
        for amount in ["0.0001", "12.3456", "1000000.0000"] {
            let wei = to_wei(amount).unwrap();
            assert_eq!(format_ether(&wei, 4), amount);
        }
    }
}
