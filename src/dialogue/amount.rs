//! Amount parsing for the transfer flow

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountError {
    #[error("not a numeric amount")]
    NotANumber,

    #[error("amount must be greater than zero")]
    NotPositive,
}

/// Parse a user-typed amount. Accepts a leading rupee sign and thousands
/// separators: `"₹1,500.50"` parses to `1500.50`.
pub fn parse_amount(text: &str) -> Result<Decimal, AmountError> {
    let cleaned = text.replace('₹', "").replace(',', "");
    let amount = Decimal::from_str(cleaned.trim()).map_err(|_| AmountError::NotANumber)?;

    if amount <= Decimal::ZERO {
        return Err(AmountError::NotPositive);
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_and_formatted_amounts() {
        assert_eq!(parse_amount("1500"), Ok(Decimal::new(1500, 0)));
        assert_eq!(parse_amount("₹1,500.50"), Ok(Decimal::new(150_050, 2)));
        assert_eq!(parse_amount("  2,000 "), Ok(Decimal::new(2000, 0)));
        assert_eq!(parse_amount("₹ 75"), Ok(Decimal::new(75, 0)));
    }

    #[test]
    fn test_rejects_non_positive() {
        assert_eq!(parse_amount("0"), Err(AmountError::NotPositive));
        assert_eq!(parse_amount("-5"), Err(AmountError::NotPositive));
        assert_eq!(parse_amount("0.00"), Err(AmountError::NotPositive));
    }

    #[test]
    fn test_rejects_non_numeric() {
        assert_eq!(parse_amount("abc"), Err(AmountError::NotANumber));
        assert_eq!(parse_amount(""), Err(AmountError::NotANumber));
        assert_eq!(parse_amount("₹"), Err(AmountError::NotANumber));
        assert_eq!(parse_amount("12abc"), Err(AmountError::NotANumber));
        assert_eq!(parse_amount("five hundred"), Err(AmountError::NotANumber));
    }
}
