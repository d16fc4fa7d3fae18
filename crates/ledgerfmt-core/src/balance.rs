//! Multi-commodity balance.
//!
//! A [`Balance`] holds at most one [`Amount`] per commodity. It is what value
//! and total expressions compute for a report row, and it knows how to lay
//! itself out in a fixed-width column.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt::{self, Write};
use std::ops::Neg;

use crate::amount::{Amount, AmountError};

/// A sum of amounts in possibly many commodities.
///
/// Buckets are kept ordered by commodity and zero buckets are dropped, so an
/// empty balance is the only representation of zero.
///
/// # Example
///
/// ```
/// use ledgerfmt_core::{Amount, Balance};
/// use rust_decimal_macros::dec;
///
/// let mut balance = Balance::new();
/// balance.add_amount(&Amount::new(dec!(10), "$"))?;
/// balance.add_amount(&Amount::new(dec!(3), "EUR"))?;
/// balance.add_amount(&Amount::new(dec!(-10), "$"))?;
///
/// assert_eq!(balance.len(), 1);
/// assert_eq!(balance.single_amount(), Some(&Amount::new(dec!(3), "EUR")));
/// # Ok::<(), ledgerfmt_core::AmountError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    amounts: BTreeMap<String, Amount>,
}

impl Balance {
    /// Create an empty (zero) balance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether every bucket is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amounts.is_empty()
    }

    /// Number of non-zero commodity buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    /// Same as [`Balance::is_zero`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    /// Iterate over the buckets in commodity order.
    pub fn amounts(&self) -> impl Iterator<Item = &Amount> {
        self.amounts.values()
    }

    /// Get the amount held in one commodity.
    #[must_use]
    pub fn amount(&self, commodity: &str) -> Option<&Amount> {
        self.amounts.get(commodity)
    }

    /// Get the only bucket, if there is exactly one.
    #[must_use]
    pub fn single_amount(&self) -> Option<&Amount> {
        if self.amounts.len() == 1 {
            self.amounts.values().next()
        } else {
            None
        }
    }

    /// Build a balance from a sequence of amounts.
    ///
    /// # Errors
    ///
    /// Fails with [`AmountError::Overflow`] when a bucket overflows.
    pub fn from_amounts<I>(amounts: I) -> Result<Self, AmountError>
    where
        I: IntoIterator,
        I::Item: Borrow<Amount>,
    {
        let mut balance = Self::new();
        for amount in amounts {
            balance.add_amount(amount.borrow())?;
        }
        Ok(balance)
    }

    /// Add an amount into its commodity bucket.
    ///
    /// # Errors
    ///
    /// Fails with [`AmountError::Overflow`] when the bucket overflows; the
    /// balance is left unchanged.
    pub fn add_amount(&mut self, amount: &Amount) -> Result<(), AmountError> {
        if amount.is_zero() {
            return Ok(());
        }
        let Some(bucket) = self.amounts.get_mut(&amount.commodity) else {
            self.amounts
                .insert(amount.commodity.clone(), amount.clone());
            return Ok(());
        };
        bucket.number = bucket
            .number
            .checked_add(amount.number)
            .ok_or(AmountError::Overflow)?;
        if bucket.is_zero() {
            self.amounts.remove(&amount.commodity);
        }
        Ok(())
    }

    /// Subtract an amount from its commodity bucket.
    ///
    /// # Errors
    ///
    /// Same as [`Balance::add_amount`].
    pub fn sub_amount(&mut self, amount: &Amount) -> Result<(), AmountError> {
        self.add_amount(&-amount)
    }

    /// Add every bucket of another balance.
    ///
    /// # Errors
    ///
    /// Fails with [`AmountError::Overflow`] when a bucket overflows.
    pub fn merge(&mut self, other: &Self) -> Result<(), AmountError> {
        for amount in other.amounts() {
            self.add_amount(amount)?;
        }
        Ok(())
    }

    /// Sum of two balances.
    ///
    /// # Errors
    ///
    /// Fails with [`AmountError::Overflow`] when a bucket overflows.
    pub fn checked_add(&self, other: &Self) -> Result<Self, AmountError> {
        let mut sum = self.clone();
        sum.merge(other)?;
        Ok(sum)
    }

    /// Difference of two balances.
    ///
    /// # Errors
    ///
    /// Fails with [`AmountError::Overflow`] when a bucket overflows.
    pub fn checked_sub(&self, other: &Self) -> Result<Self, AmountError> {
        self.checked_add(&-other)
    }

    /// Multiply by an amount.
    ///
    /// A bare amount scales every bucket. A commoditized amount is only
    /// accepted when this balance has at most one bucket.
    pub fn checked_mul(&self, factor: &Amount) -> Result<Self, AmountError> {
        self.scale(factor, Amount::checked_mul)
    }

    /// Divide by an amount, with the same commodity rules as
    /// [`Balance::checked_mul`].
    pub fn checked_div(&self, divisor: &Amount) -> Result<Self, AmountError> {
        if divisor.is_zero() {
            return Err(AmountError::DivideByZero);
        }
        self.scale(divisor, Amount::checked_div)
    }

    fn scale(
        &self,
        operand: &Amount,
        op: fn(&Amount, &Amount) -> Result<Amount, AmountError>,
    ) -> Result<Self, AmountError> {
        if !operand.is_bare() && self.amounts.len() > 1 {
            return Err(AmountError::MultiCommodity(operand.to_string()));
        }
        let mut result = Self::new();
        for amount in self.amounts() {
            result.add_amount(&op(amount, operand)?)?;
        }
        Ok(result)
    }

    /// Render the balance as right-justified column text.
    ///
    /// Each bucket goes on its own line. The first line is padded to
    /// `first_width` columns and every later line to `latter_width`, so a
    /// multi-commodity value lines up under the column it started in. A
    /// zero balance renders as `0`.
    #[must_use]
    pub fn to_text(&self, first_width: usize, latter_width: usize) -> String {
        if self.amounts.is_empty() {
            return format!("{:>first_width$}", "0");
        }

        let mut out = String::new();
        for (i, amount) in self.amounts.values().enumerate() {
            let text = amount.to_string();
            if i == 0 {
                let _ = write!(out, "{text:>first_width$}");
            } else {
                out.push('\n');
                let _ = write!(out, "{text:>latter_width$}");
            }
        }
        out
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        let mut amounts = BTreeMap::new();
        if !amount.is_zero() {
            amounts.insert(amount.commodity.clone(), amount);
        }
        Self { amounts }
    }
}

impl Neg for &Balance {
    type Output = Balance;

    fn neg(self) -> Balance {
        let amounts = self
            .amounts
            .iter()
            .map(|(commodity, amount)| (commodity.clone(), -amount))
            .collect();
        Balance { amounts }
    }
}

impl Neg for Balance {
    type Output = Self;

    fn neg(self) -> Self {
        -&self
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.amounts.is_empty() {
            return write!(f, "0");
        }
        for (i, amount) in self.amounts.values().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{amount}")?;
        }
        Ok(())
    }
}
