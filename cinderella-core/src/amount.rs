use std::convert::TryFrom;
use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;
use typed_builder::TypedBuilder;

use super::Currency;

/// Number of decimal places amounts are quantized to when built from statement data.
pub const AMOUNT_SCALE: u32 = 2;

/// A number of units of a certain commodity.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, TypedBuilder)]
pub struct Amount<'a> {
    /// The value of the amount.
    pub num: Decimal,

    /// The commodity of the amount.
    #[builder(setter(into))]
    pub currency: Currency<'a>,
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum AmountError {
    #[error("can not add \"{rhs}\" to \"{lhs}\", currency mismatch")]
    CurrencyMismatch { lhs: String, rhs: String },
    #[error("amount is missing its number or its currency")]
    Incomplete,
}

impl<'a> Amount<'a> {
    pub fn new<C: Into<Currency<'a>>>(num: Decimal, currency: C) -> Self {
        Amount {
            num,
            currency: currency.into(),
        }
    }

    /// Builds an amount rounded to [`AMOUNT_SCALE`] decimal places, e.g. `12.5` becomes `12.50`.
    pub fn quantized<C: Into<Currency<'a>>>(num: Decimal, currency: C) -> Self {
        Amount::new(quantize(num), currency)
    }

    /// Adds two amounts of the same commodity.
    pub fn checked_add(&self, other: &Amount<'_>) -> Result<Amount<'a>, AmountError> {
        if self.currency != other.currency {
            return Err(AmountError::CurrencyMismatch {
                lhs: self.to_string(),
                rhs: other.to_string(),
            });
        }
        Ok(Amount {
            num: self.num + other.num,
            currency: self.currency.clone(),
        })
    }

    /// In-place variant of [`Amount::checked_add`]. On error `self` is left untouched.
    pub fn try_add_assign(&mut self, other: &Amount<'_>) -> Result<(), AmountError> {
        *self = self.checked_add(other)?;
        Ok(())
    }
}

pub(crate) fn quantize(num: Decimal) -> Decimal {
    let mut num = num.round_dp(AMOUNT_SCALE);
    num.rescale(AMOUNT_SCALE);
    num
}

impl fmt::Display for Amount<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.num, self.currency)
    }
}

/// An amount that may have missing units and/or commodity.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, TypedBuilder)]
pub struct IncompleteAmount<'a> {
    /// The (optional) value of the amount.
    #[builder(default)]
    pub num: Option<Decimal>,

    /// The (optional) commodity of the amount.
    #[builder(default)]
    pub currency: Option<Currency<'a>>,
}

impl IncompleteAmount<'_> {
    pub fn is_empty(&self) -> bool {
        self.num.is_none() && self.currency.is_none()
    }
}

impl<'a> TryFrom<IncompleteAmount<'a>> for Amount<'a> {
    type Error = AmountError;

    fn try_from(val: IncompleteAmount<'a>) -> Result<Self, Self::Error> {
        match val {
            IncompleteAmount {
                num: Some(num),
                currency: Some(currency),
            } => Ok(Amount { num, currency }),
            _ => Err(AmountError::Incomplete),
        }
    }
}

impl<'a> From<Amount<'a>> for IncompleteAmount<'a> {
    fn from(val: Amount<'a>) -> Self {
        IncompleteAmount {
            num: Some(val.num),
            currency: Some(val.currency),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantized() {
        let amount = Amount::quantized(Decimal::new(125, 1), "TWD");
        assert_eq!(amount.to_string(), "12.50 TWD");

        let amount = Amount::quantized(Decimal::new(12345, 3), "TWD");
        assert_eq!(amount.to_string(), "12.34 TWD");
    }

    #[test]
    fn test_checked_add() {
        let lhs = Amount::new(Decimal::new(100, 0), "TWD");
        let rhs = Amount::new(Decimal::new(-25, 0), "TWD");
        assert_eq!(lhs.checked_add(&rhs), Ok(Amount::new(Decimal::new(75, 0), "TWD")));
    }

    #[test]
    fn test_currency_mismatch() {
        let mut lhs = Amount::new(Decimal::new(100, 0), "TWD");
        let rhs = Amount::new(Decimal::new(3, 0), "USD");
        let err = lhs.try_add_assign(&rhs).unwrap_err();
        assert_eq!(
            err.to_string(),
            "can not add \"3 USD\" to \"100 TWD\", currency mismatch"
        );
        assert_eq!(lhs, Amount::new(Decimal::new(100, 0), "TWD"));
    }

    #[test]
    fn test_incomplete_amount_conversion() {
        let incomplete = IncompleteAmount::builder().num(Some(Decimal::ONE)).build();
        assert_eq!(Amount::try_from(incomplete), Err(AmountError::Incomplete));

        let complete: IncompleteAmount = Amount::new(Decimal::ONE, "EUR").into();
        assert_eq!(
            Amount::try_from(complete),
            Ok(Amount::new(Decimal::ONE, "EUR"))
        );
    }
}
