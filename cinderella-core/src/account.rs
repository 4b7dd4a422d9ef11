use typed_builder::TypedBuilder;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::account_types::AccountType;

/// Represents an account.
///
/// Beancount accumulates commodities in accounts.  An account name is a
/// colon-separated list of capitalized words which begin with a letter, and whose first word must
/// be one of the five acceptable account types.
///
/// Some example accounts:
///
/// ```text
/// Assets:US:BofA:Checking
/// Liabilities:CA:RBC:CreditCard
/// Equity:Retained-Earnings
/// Income:US:Acme:Salary
/// Expenses:Food:Groceries
/// ```
///
/// <https://docs.google.com/document/d/1wAMVrKIA2qtRGmoVDSUBJGmYZSygUaR0uOMW1GV3YE0/edit#heading=h.17ry42rqbuiu>
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, TypedBuilder)]
pub struct Account<'a> {
    /// Type of the account.
    pub ty: AccountType,

    /// Parts of the account following the account type.
    #[builder(default)]
    pub parts: Vec<Cow<'a, str>>,
}

impl<'a> Account<'a> {
    pub fn new<I, S>(ty: AccountType, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'a, str>>,
    {
        Account {
            ty,
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum AccountParseError {
    #[error("unknown account type in {0:?}")]
    UnknownType(String),
    #[error("account {0:?} has an empty name component")]
    EmptyComponent(String),
    #[error("account {0:?} needs at least one component after its type")]
    MissingComponents(String),
}

impl FromStr for Account<'static> {
    type Err = AccountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut pieces = s.split(':');
        let ty = pieces
            .next()
            .and_then(|root| root.parse::<AccountType>().ok())
            .ok_or_else(|| AccountParseError::UnknownType(s.to_string()))?;
        let parts = pieces
            .map(|p| {
                if p.is_empty() {
                    Err(AccountParseError::EmptyComponent(s.to_string()))
                } else {
                    Ok(Cow::Owned(p.to_string()))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        if parts.is_empty() {
            return Err(AccountParseError::MissingComponents(s.to_string()));
        }
        Ok(Account { ty, parts })
    }
}

impl fmt::Display for Account<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ty.default_name())?;
        for part in &self.parts {
            write!(f, ":{}", part)?;
        }
        Ok(())
    }
}
