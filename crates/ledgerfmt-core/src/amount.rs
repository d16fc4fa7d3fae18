//! Amount type representing a decimal number with an optional commodity.
//!
//! An [`Amount`] is the smallest unit of value a report row can carry. The
//! number is an arbitrary-precision [`Decimal`]; the commodity is free text
//! (`$`, `EUR`, `AAPL`) and may be empty for a bare number.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use thiserror::Error;

/// Symbols written in front of the number rather than after it.
const PREFIX_SYMBOLS: &[&str] = &["$", "€", "£", "¥"];

/// Error returned by amount parsing and checked arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// The text could not be read as an amount.
    #[error("invalid amount: {0:?}")]
    Parse(String),
    /// Division by a zero amount.
    #[error("division by zero")]
    DivideByZero,
    /// The result does not fit in a decimal.
    #[error("arithmetic overflow")]
    Overflow,
    /// A multi-commodity balance was scaled by a commoditized amount.
    #[error("cannot scale a multi-commodity balance by {0:?}")]
    MultiCommodity(String),
    /// Two different commodities were combined in a single-commodity operation.
    #[error("cannot combine {left:?} with {right:?}")]
    CommodityMismatch {
        /// Commodity of the left operand.
        left: String,
        /// Commodity of the right operand.
        right: String,
    },
}

/// An amount is a quantity paired with a commodity.
///
/// # Examples
///
/// ```
/// use ledgerfmt_core::Amount;
/// use rust_decimal_macros::dec;
///
/// let amount = Amount::new(dec!(100.00), "$");
/// assert_eq!(amount.to_string(), "$100.00");
///
/// let shares: Amount = "10 AAPL".parse().unwrap();
/// assert_eq!(shares.number, dec!(10));
/// assert_eq!(shares.commodity, "AAPL");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Amount {
    /// The decimal quantity
    pub number: Decimal,
    /// The commodity symbol; empty for a bare number
    pub commodity: String,
}

impl Amount {
    /// Create a new amount.
    #[must_use]
    pub fn new(number: Decimal, commodity: impl Into<String>) -> Self {
        Self {
            number,
            commodity: commodity.into(),
        }
    }

    /// Create an amount with no commodity.
    #[must_use]
    pub const fn bare(number: Decimal) -> Self {
        Self {
            number,
            commodity: String::new(),
        }
    }

    /// Create a zero amount in the given commodity.
    #[must_use]
    pub fn zero(commodity: impl Into<String>) -> Self {
        Self::new(Decimal::ZERO, commodity)
    }

    /// Check if the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.number.is_zero()
    }

    /// Check if the amount has no commodity.
    #[must_use]
    pub fn is_bare(&self) -> bool {
        self.commodity.is_empty()
    }

    /// Check if the amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.number.is_sign_negative() && !self.number.is_zero()
    }

    /// Get the absolute value of this amount.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self::new(self.number.abs(), self.commodity.clone())
    }

    /// Add two amounts, letting a bare number adopt the other commodity.
    pub fn checked_add(&self, other: &Self) -> Result<Self, AmountError> {
        let commodity = self.common_commodity(other)?;
        let number = self
            .number
            .checked_add(other.number)
            .ok_or(AmountError::Overflow)?;
        Ok(Self::new(number, commodity))
    }

    /// Subtract two amounts, letting a bare number adopt the other commodity.
    pub fn checked_sub(&self, other: &Self) -> Result<Self, AmountError> {
        self.checked_add(&-other)
    }

    /// Multiply two amounts.
    ///
    /// The result carries the left commodity, or the right one when the left
    /// side is bare.
    pub fn checked_mul(&self, other: &Self) -> Result<Self, AmountError> {
        let number = self
            .number
            .checked_mul(other.number)
            .ok_or(AmountError::Overflow)?;
        Ok(Self::new(number, self.product_commodity(other)))
    }

    /// Divide two amounts.
    ///
    /// A unit price is `cost / quantity`: `$1500 / 10 AAPL` gives `$150`.
    pub fn checked_div(&self, other: &Self) -> Result<Self, AmountError> {
        if other.is_zero() {
            return Err(AmountError::DivideByZero);
        }
        let number = self
            .number
            .checked_div(other.number)
            .ok_or(AmountError::Overflow)?;
        Ok(Self::new(number.normalize(), self.product_commodity(other)))
    }

    fn common_commodity(&self, other: &Self) -> Result<String, AmountError> {
        if self.commodity == other.commodity || other.is_bare() {
            Ok(self.commodity.clone())
        } else if self.is_bare() {
            Ok(other.commodity.clone())
        } else {
            Err(AmountError::CommodityMismatch {
                left: self.commodity.clone(),
                right: other.commodity.clone(),
            })
        }
    }

    fn product_commodity(&self, other: &Self) -> String {
        if self.is_bare() {
            other.commodity.clone()
        } else {
            self.commodity.clone()
        }
    }

    fn is_prefix_commodity(&self) -> bool {
        PREFIX_SYMBOLS.contains(&self.commodity.as_str())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bare() {
            write!(f, "{}", self.number)
        } else if self.is_prefix_commodity() {
            write!(f, "{}{}", self.commodity, self.number)
        } else {
            write!(f, "{} {}", self.number, self.commodity)
        }
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parse `$12.50`, `-$12.50`, `12.50 EUR`, `12.50EUR` or a bare `100`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AmountError::Parse(s.to_string());
        let mut text = s.trim();

        let mut negative = false;
        if let Some(rest) = text.strip_prefix('-') {
            if !rest.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
                negative = true;
                text = rest.trim_start();
            }
        }

        let number_start = text
            .find(|c: char| c.is_ascii_digit() || c == '-' || c == '.')
            .ok_or_else(invalid)?;
        let prefix = text[..number_start].trim();
        let rest = &text[number_start..];
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '-' || c == '.' || c == ','))
            .unwrap_or(rest.len());
        let suffix = rest[number_len..].trim();

        let commodity = match (prefix.is_empty(), suffix.is_empty()) {
            (true, _) => suffix,
            (false, true) => prefix,
            (false, false) => return Err(invalid()),
        };
        if commodity.contains(char::is_whitespace) {
            return Err(invalid());
        }

        let digits = rest[..number_len].replace(',', "");
        let mut number = Decimal::from_str(&digits).map_err(|_| invalid())?;
        if negative {
            number = -number;
        }
        Ok(Self::new(number, commodity))
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.to_string()
    }
}

impl TryFrom<String> for Amount {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// Arithmetic operations on references

impl Add for &Amount {
    type Output = Amount;

    fn add(self, other: &Amount) -> Amount {
        debug_assert_eq!(
            self.commodity, other.commodity,
            "Cannot add amounts with different commodities"
        );
        Amount::new(self.number + other.number, self.commodity.clone())
    }
}

impl Sub for &Amount {
    type Output = Amount;

    fn sub(self, other: &Amount) -> Amount {
        debug_assert_eq!(
            self.commodity, other.commodity,
            "Cannot subtract amounts with different commodities"
        );
        Amount::new(self.number - other.number, self.commodity.clone())
    }
}

impl Neg for &Amount {
    type Output = Amount;

    fn neg(self) -> Amount {
        // Keep zero unsigned so it never prints as "-0".
        let number = if self.number.is_zero() {
            Decimal::ZERO
        } else {
            -self.number
        };
        Amount::new(number, self.commodity.clone())
    }
}

// Arithmetic operations on owned values

impl Add for Amount {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        &self + &other
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        &self - &other
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self {
        -&self
    }
}

impl AddAssign<&Self> for Amount {
    fn add_assign(&mut self, other: &Self) {
        debug_assert_eq!(
            self.commodity, other.commodity,
            "Cannot add amounts with different commodities"
        );
        self.number += other.number;
    }
}

impl SubAssign<&Self> for Amount {
    fn sub_assign(&mut self, other: &Self) {
        debug_assert_eq!(
            self.commodity, other.commodity,
            "Cannot subtract amounts with different commodities"
        );
        self.number -= other.number;
    }
}
