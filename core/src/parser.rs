use alloy::primitives::{Address, U256};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ParserError {
    #[error("Invalid address in `{field}`: {details}")]
    InvalidAddress { field: String, details: String },

    #[error("Invalid amount in `{field}`: {details}")]
    InvalidAmount { field: String, details: String },
}

/// Parse a 0x-prefixed, 20-byte hex account address.
///
/// Mixed-case input is accepted without enforcing the EIP-55 checksum.
pub fn parse_address(field: &str, value: &str) -> Result<Address, ParserError> {
    let value = value.trim();
    let invalid = |details: &str| ParserError::InvalidAddress {
        field: field.to_string(),
        details: details.to_string(),
    };

    if value.is_empty() {
        return Err(invalid("address is empty"));
    }
    let Some(hex_part) = strip_hex_prefix(value) else {
        return Err(invalid("address must start with 0x"));
    };

    Address::from_str(hex_part)
        .map_err(|e| invalid(&format!("expected 40 hex digits, found `{hex_part}` ({e})")))
}

fn strip_hex_prefix(value: &str) -> Option<&str> {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
}

/// Parse a non-negative integer amount in the token's smallest unit.
///
/// Decimal digits are the normal form; `0x` / `0X` hex is accepted as well. The value
/// must fit in 256 bits.
pub fn parse_amount(field: &str, value: &str) -> Result<U256, ParserError> {
    let value = value.trim();
    let invalid = |details: String| ParserError::InvalidAmount {
        field: field.to_string(),
        details,
    };

    if value.is_empty() {
        return Err(invalid("amount is empty".to_string()));
    }
    if value.starts_with('-') {
        return Err(invalid("amount must not be negative".to_string()));
    }

    if let Some(hex_part) = strip_hex_prefix(value) {
        if hex_part.is_empty() || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid(format!("`{value}` is not a hex integer")));
        }
        return U256::from_str_radix(hex_part, 16)
            .map_err(|_| invalid("amount exceeds 256 bits".to_string()));
    }

    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid(format!("`{value}` is not a whole number")));
    }
    U256::from_str(value).map_err(|_| invalid("amount exceeds 256 bits".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

    #[test]
    fn test_parse_address_mixed_and_lower_case() {
        let checksummed = parse_address("to", ALICE).unwrap();
        let lower = parse_address("to", &ALICE.to_lowercase()).unwrap();
        assert_eq!(checksummed, lower);
        assert_eq!(checksummed.to_string(), ALICE);
    }

    #[test]
    fn test_parse_address_trims_whitespace() {
        assert!(parse_address("to", &format!("  {ALICE} ")).is_ok());
    }

    #[test]
    fn test_parse_address_missing_prefix() {
        let err = parse_address("from", &ALICE[2..]).unwrap_err();
        match err {
            ParserError::InvalidAddress { field, details } => {
                assert_eq!(field, "from");
                assert!(details.contains("0x"));
            }
            _ => panic!("Expected InvalidAddress error"),
        }
    }

    #[test]
    fn test_parse_address_wrong_length() {
        let err = parse_address("spender", "0x1234").unwrap_err();
        assert!(err.to_string().contains("40 hex digits"));
        assert!(err.to_string().contains("spender"));
    }

    #[test]
    fn test_parse_address_non_hex() {
        let bad = format!("0x{}", "zz".repeat(20));
        let err = parse_address("owner", &bad).unwrap_err();
        assert!(matches!(err, ParserError::InvalidAddress { ref field, .. } if field == "owner"));
        assert!(err.to_string().contains("40 hex digits"));
    }

    #[test]
    fn test_parse_address_empty() {
        assert!(parse_address("account", "").is_err());
    }

    #[test]
    fn test_parse_amount_decimal() {
        assert_eq!(parse_amount("amount", "100").unwrap(), U256::from(100));
        assert_eq!(parse_amount("amount", "0").unwrap(), U256::ZERO);
    }

    #[test]
    fn test_parse_amount_preserves_large_values() {
        // 1e6 tokens with 18 decimals, beyond u64.
        let amount = parse_amount("amount", "1000000000000000000000000").unwrap();
        assert_eq!(amount.to_string(), "1000000000000000000000000");
    }

    #[test]
    fn test_parse_amount_max_u256() {
        let max = U256::MAX.to_string();
        assert_eq!(parse_amount("amount", &max).unwrap(), U256::MAX);
    }

    #[test]
    fn test_parse_amount_overflow() {
        // U256::MAX + 1
        let too_big = "115792089237316195423570985008687907853269984665640564039457584007913129639936";
        let err = parse_amount("amount", too_big).unwrap_err();
        assert!(err.to_string().contains("256 bits"));
    }

    #[test]
    fn test_parse_amount_hex() {
        assert_eq!(parse_amount("amount", "0xff").unwrap(), U256::from(255));
        assert!(parse_amount("amount", "0x").is_err());
        assert!(parse_amount("amount", "0xgg").is_err());
    }

    #[test]
    fn test_parse_amount_upper_case_prefix() {
        assert_eq!(parse_amount("amount", "0XFF").unwrap(), U256::from(255));
        assert_eq!(parse_amount("amount", "0Xff").unwrap(), U256::from(255));
    }

    #[test]
    fn test_parse_address_upper_case_prefix() {
        let upper = format!("0X{}", &ALICE[2..]);
        assert_eq!(
            parse_address("to", &upper).unwrap(),
            parse_address("to", ALICE).unwrap()
        );
    }

    #[test]
    fn test_parse_amount_rejects_negative_and_fractional() {
        assert!(parse_amount("amount", "-1")
            .unwrap_err()
            .to_string()
            .contains("negative"));
        assert!(parse_amount("amount", "1.5")
            .unwrap_err()
            .to_string()
            .contains("whole number"));
        assert!(parse_amount("amount", "1e18").is_err());
        assert!(parse_amount("amount", "").is_err());
    }
}
