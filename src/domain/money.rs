use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

/// Money is an exact decimal; the ledger carries a single implicit currency.
/// Whatever scale the caller used is kept, so "50.00" stays "50.00" when shown.
pub type Amount = Decimal;

/// Parse a user-supplied decimal string into an amount.
/// Example: "50" -> 50, "12.5" -> 12.5, " -3.00 " -> -3.00
pub fn parse_amount(input: &str) -> Result<Amount, ParseAmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseAmountError::Empty);
    }

    // Decimal::from_str accepts "_" separators; a typed amount never should
    if !input
        .chars()
        .all(|c| c.is_ascii_digit() || c == '.' || c == '-' || c == '+')
    {
        return Err(ParseAmountError::InvalidFormat(input.to_string()));
    }

    Decimal::from_str(input).map_err(|_| ParseAmountError::InvalidFormat(input.to_string()))
}

/// An addition or subtraction left the representable decimal range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountOverflow;

impl fmt::Display for AmountOverflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "amount out of range (limit {})", Amount::MAX)
    }
}

impl std::error::Error for AmountOverflow {}

pub fn checked_add(lhs: Amount, rhs: Amount) -> Result<Amount, AmountOverflow> {
    lhs.checked_add(rhs).ok_or(AmountOverflow)
}

pub fn checked_sub(lhs: Amount, rhs: Amount) -> Result<Amount, AmountOverflow> {
    lhs.checked_sub(rhs).ok_or(AmountOverflow)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    Empty,
    InvalidFormat(String),
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::Empty => write!(f, "amount is empty"),
            ParseAmountError::InvalidFormat(raw) => write!(f, "invalid amount '{}'", raw),
        }
    }
}

impl std::error::Error for ParseAmountError {}
