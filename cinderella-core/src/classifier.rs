//! Picking the counter account of imported transactions.
//!
//! Statements usually carry one posting per transaction, the side of the account the statement
//! belongs to.  The classifier searches each transaction for keywords and appends the posting
//! that balances it against the matching account.

use std::collections::HashMap;
use std::iter;

use regex::Regex;
use thiserror::Error;
use tracing::debug;
use typed_builder::TypedBuilder;

use super::account::{Account, AccountParseError};
use super::account_types::AccountType;
use super::amount::IncompleteAmount;
use super::dedup::Statement;
use super::directives::Directive;
use super::flags::Flag;
use super::posting::Posting;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("invalid account in mapping")]
    Account(#[from] AccountParseError),
    #[error("invalid keyword pattern")]
    Keyword(#[from] regex::Error),
}

/// Accounts paired with the keywords that select them, tried in insertion order.
#[derive(Clone, Debug, Default)]
pub struct Mapping {
    rules: Vec<(Account<'static>, Vec<Regex>)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `account`, selected when any of `keywords` (regular expressions) matches.
    pub fn with_rule<S: AsRef<str>>(
        mut self,
        account: &str,
        keywords: &[S],
    ) -> Result<Self, ClassifierError> {
        let account = account.parse()?;
        let keywords = keywords
            .iter()
            .map(|keyword| Regex::new(keyword.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        self.rules.push((account, keywords));
        Ok(self)
    }

    fn find_account(&self, entry: &Directive<'_>) -> Option<&Account<'static>> {
        self.rules
            .iter()
            .find(|(_, keywords)| entry.find_keywords(keywords))
            .map(|(account, _)| account)
    }
}

#[derive(Clone, Debug, TypedBuilder)]
pub struct Classifier {
    /// Counter account of transactions no keyword matched.
    #[builder(default = Account::new(AccountType::Expenses, vec!["Other"]))]
    pub default_expense_account: Account<'static>,

    /// Account absorbing the rounding left over by currency conversions.
    #[builder(default = Account::new(AccountType::Income, vec!["PnL", "ConversionDiffs"]))]
    pub conversion_diff_account: Account<'static>,

    /// Mapping consulted for every statement.
    #[builder(default)]
    pub general: Mapping,

    /// Mappings for a single statement source; they win over `general`.
    #[builder(default)]
    pub sources: HashMap<String, Mapping>,
}

impl Default for Classifier {
    fn default() -> Self {
        Classifier::builder().build()
    }
}

impl Classifier {
    /// Appends a counter posting to every single-posting transaction of `statement`.
    ///
    /// Transactions flagged [`Flag::Conversions`] get an interpolated posting to the conversion
    /// diff account instead.  Transactions that already have two or more postings are left
    /// alone.
    pub fn classify(&self, statement: &mut Statement<'_>) {
        let source = self.sources.get(&statement.source);
        for entry in &mut statement.entries {
            let posting = match self.counter_posting(entry, source) {
                Some(posting) => posting,
                None => continue,
            };
            debug!(
                source = %statement.source,
                account = %posting.account,
                "classified entry"
            );
            if let Some(txn) = entry.transaction_mut() {
                txn.push_posting(posting);
            }
        }
    }

    fn counter_posting<'a>(
        &self,
        entry: &Directive<'a>,
        source: Option<&Mapping>,
    ) -> Option<Posting<'a>> {
        let txn = entry.transaction()?;
        if txn.flag == Flag::Conversions {
            return Some(Posting::interpolated(self.conversion_diff_account.clone()));
        }
        let first = match txn.postings.as_slice() {
            [first] => first,
            _ => return None,
        };

        let account = source
            .into_iter()
            .chain(iter::once(&self.general))
            .find_map(|mapping| mapping.find_account(entry))
            .unwrap_or(&self.default_expense_account)
            .clone();

        // With a price the counter side is in another currency; leave it to Beancount.
        let posting = match (&first.price, &first.units) {
            (
                None,
                IncompleteAmount {
                    num: Some(num),
                    currency: Some(currency),
                },
            ) => Posting::simple(account, -*num, currency.clone()),
            _ => Posting::interpolated(account),
        };
        Some(posting)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::amount::Amount;
    use crate::dedup::StatementKind;
    use crate::directives::Transaction;
    use crate::Date;

    fn card_entry(title: &str, amount: i64) -> Directive<'static> {
        let txn = Transaction::builder()
            .narration(title.to_string())
            .postings(vec![Posting::simple(
                account("Liabilities:CreditCard"),
                Decimal::new(amount, 0),
                "TWD",
            )])
            .build();
        Directive::builder()
            .date(Date::from_ymd(2022, 12, 1).unwrap())
            .content(txn)
            .build()
    }

    fn statement(source: &str, entries: Vec<Directive<'static>>) -> Statement<'static> {
        Statement::builder()
            .source(source)
            .kind(StatementKind::CreditCard)
            .entries(entries)
            .build()
    }

    fn account(name: &str) -> Account<'static> {
        name.parse().unwrap()
    }

    fn counter(statement: &Statement<'static>, index: usize) -> Posting<'static> {
        let postings = &statement.entries[index].transaction().unwrap().postings;
        assert_eq!(postings.len(), 2);
        postings[1].clone()
    }

    fn classifier() -> Classifier {
        Classifier::builder()
            .general(
                Mapping::new()
                    .with_rule("Expenses:Food", &["Lunch", "^Dinner"])
                    .unwrap()
                    .with_rule("Expenses:Transport", &["MRT", "Taxi"])
                    .unwrap(),
            )
            .build()
    }

    #[test]
    fn test_keyword_selects_account() {
        let mut statement = statement(
            "card",
            vec![card_entry("Lunch at noon", -120), card_entry("MRT top-up", -500)],
        );
        classifier().classify(&mut statement);

        assert_eq!(
            counter(&statement, 0),
            Posting::simple(account("Expenses:Food"), Decimal::new(120, 0), "TWD")
        );
        assert_eq!(counter(&statement, 1).account, account("Expenses:Transport"));
    }

    #[test]
    fn test_keyword_in_comment() {
        let mut entry = card_entry("POS 0042", -80);
        entry.add_comment("Taxi to the airport");
        let mut statement = statement("card", vec![entry]);
        classifier().classify(&mut statement);

        assert_eq!(counter(&statement, 0).account, account("Expenses:Transport"));
    }

    #[test]
    fn test_source_mapping_wins() {
        let mut classifier = classifier();
        classifier.sources.insert(
            "esun".to_string(),
            Mapping::new().with_rule("Expenses:Office", &["Lunch"]).unwrap(),
        );

        let mut esun = statement("esun", vec![card_entry("Lunch meeting", -300)]);
        let mut other = statement("ctbc", vec![card_entry("Lunch meeting", -300)]);
        classifier.classify(&mut esun);
        classifier.classify(&mut other);

        assert_eq!(counter(&esun, 0).account, account("Expenses:Office"));
        assert_eq!(counter(&other, 0).account, account("Expenses:Food"));
    }

    #[test]
    fn test_unmatched_falls_back_to_default_expense() {
        let mut statement = statement("card", vec![card_entry("Bookstore", -450)]);
        classifier().classify(&mut statement);

        assert_eq!(
            counter(&statement, 0),
            Posting::simple(account("Expenses:Other"), Decimal::new(450, 0), "TWD")
        );
    }

    #[test]
    fn test_conversions_get_diff_posting() {
        let mut entry = card_entry("FX", -100);
        entry.transaction_mut().unwrap().flag = Flag::Conversions;
        let mut statement = statement("card", vec![entry]);
        classifier().classify(&mut statement);

        assert_eq!(
            counter(&statement, 0),
            Posting::interpolated(account("Income:PnL:ConversionDiffs"))
        );
    }

    #[test]
    fn test_priced_posting_gets_interpolated_counter() {
        let mut entry = card_entry("Lunch in Tokyo", -1000);
        entry.transaction_mut().unwrap().postings[0].price =
            Some(Amount::new(Decimal::new(22, 2), "TWD").into());
        let mut statement = statement("card", vec![entry]);
        classifier().classify(&mut statement);

        assert_eq!(
            counter(&statement, 0),
            Posting::interpolated(account("Expenses:Food"))
        );
    }

    #[test]
    fn test_balanced_and_non_transaction_entries_are_left_alone() {
        let mut balanced = card_entry("Lunch", -120);
        balanced
            .transaction_mut()
            .unwrap()
            .push_posting(Posting::interpolated(account("Assets:Cash")));
        let marker = Directive::dated(Date::from_ymd(2022, 12, 1).unwrap());

        let mut statement = statement("card", vec![balanced.clone(), marker.clone()]);
        classifier().classify(&mut statement);

        assert_eq!(statement.entries, vec![balanced, marker]);
    }

    #[test]
    fn test_invalid_rules_are_rejected() {
        assert!(matches!(
            Mapping::new().with_rule("Expenses:Food", &["(unclosed"]),
            Err(ClassifierError::Keyword(_))
        ));
        assert!(matches!(
            Mapping::new().with_rule("Food", &["Lunch"]),
            Err(ClassifierError::Account(_))
        ));
    }
}
