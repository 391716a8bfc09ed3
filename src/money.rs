//! Money validation
//!
//! All amounts are `rust_decimal::Decimal` end to end and persist as
//! NUMERIC(18,4). Every amount that enters the service goes through this
//! module; no floating point anywhere.
//!
//! Limits: strictly positive, at most 4 fractional digits, at most 14
//! integral digits (so the value fits the column).

use crate::error::LedgerError;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Fractional digits of the NUMERIC(18,4) monetary columns.
pub const MONEY_SCALE: u32 = 4;

/// Integral digits that fit next to the 4 fractional ones.
pub const MONEY_INTEGRAL_DIGITS: u32 = 14;

/// Parse a client-facing amount string.
///
/// Amounts travel as strings in JSON to avoid float precision loss.
pub fn parse_amount(raw: &str) -> Result<Decimal, LedgerError> {
    let amount = Decimal::from_str(raw.trim())
        .map_err(|_| LedgerError::Validation(format!("invalid amount: {}", raw)))?;
    validate_amount(amount)
}

/// Validate an amount for use in a movement.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::Validation(
            "amount must be greater than zero".to_string(),
        ));
    }

    // normalize() strips trailing zeros so "1.5000" passes the scale check
    let normalized = amount.normalize();
    if normalized.scale() > MONEY_SCALE {
        return Err(LedgerError::Validation(format!(
            "amount has more than {} fractional digits",
            MONEY_SCALE
        )));
    }

    let limit = Decimal::from(10u64.pow(MONEY_INTEGRAL_DIGITS));
    if normalized >= limit {
        return Err(LedgerError::Validation(
            "amount exceeds the maximum representable value".to_string(),
        ));
    }

    Ok(normalized)
}

/// Validate a caller-supplied idempotency key (non-empty, at most 255 chars).
pub fn validate_idempotency_key(key: &str) -> Result<(), LedgerError> {
    if key.is_empty() {
        return Err(LedgerError::Validation(
            "idempotency key must not be empty".to_string(),
        ));
    }
    if key.len() > 255 {
        return Err(LedgerError::Validation(
            "idempotency key exceeds 255 characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_amounts() {
        assert_eq!(parse_amount("500").unwrap(), Decimal::from(500));
        assert_eq!(
            parse_amount("123.45").unwrap(),
            Decimal::from_str("123.45").unwrap()
        );
        // Trailing zeros beyond scale 4 are fine once normalized
        assert_eq!(
            parse_amount("1.50000").unwrap(),
            Decimal::from_str("1.5").unwrap()
        );
    }

    #[test]
    fn test_rejects_non_positive() {
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("-5").is_err());
        assert!(parse_amount("0.0000").is_err());
    }

    #[test]
    fn test_rejects_excess_scale() {
        assert!(parse_amount("1.00001").is_err());
        assert!(parse_amount("0.12345").is_err());
        assert!(parse_amount("0.1234").is_ok());
    }

    #[test]
    fn test_rejects_oversized_magnitude() {
        // 10^14 does not fit NUMERIC(18,4)
        assert!(parse_amount("100000000000000").is_err());
        assert!(parse_amount("99999999999999.9999").is_ok());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("12a.3").is_err());
        assert!(parse_amount("1e5").is_err());
    }

    #[test]
    fn test_idempotency_key_limits() {
        assert!(validate_idempotency_key("k1").is_ok());
        assert!(validate_idempotency_key("").is_err());
        assert!(validate_idempotency_key(&"x".repeat(255)).is_ok());
        assert!(validate_idempotency_key(&"x".repeat(256)).is_err());
    }
}
