use std::borrow::Cow;

use regex::Regex;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use thiserror::Error;
use typed_builder::TypedBuilder;

use super::account::Account;
use super::amount::{quantize, Amount, AmountError};
use super::flags::Flag;
use super::metadata::{Link, Meta, MetaValue, Tag};
use super::posting::Posting;
use super::{Currency, Date};

/// A single dated entry of a ledger.
///
/// Every directive carries the same envelope (date, metadata, tags and links); what kind of
/// directive it is lives in [`DirectiveContent`].  A directive with [`DirectiveContent::Empty`]
/// is only a dated marker and carries no accounting information.
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct Directive<'a> {
    /// Date of the directive.
    #[builder(default, setter(strip_option))]
    pub date: Option<Date>,

    /// Metadata attached to the directive.
    #[builder(default)]
    pub meta: Meta<'a>,

    /// Tags associated with the directive, without the leading `#`.
    #[builder(default)]
    pub tags: Vec<Tag<'a>>,

    /// Links associated with the directive, without the leading `^`.
    #[builder(default)]
    pub links: Vec<Link<'a>>,

    #[builder(default, setter(into))]
    pub content: DirectiveContent<'a>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DirectiveContent<'a> {
    Empty,
    Open(Open<'a>),
    Close(Close<'a>),
    Balance(Balance<'a>),
    Commodity(Commodity<'a>),
    Custom(Custom<'a>),
    Document(Document<'a>),
    Event(Event<'a>),
    Note(Note<'a>),
    Pad(Pad<'a>),
    Price(Price<'a>),
    Query(Query<'a>),
    Transaction(Transaction<'a>),
}

impl Default for DirectiveContent<'_> {
    fn default() -> Self {
        DirectiveContent::Empty
    }
}

impl DirectiveContent<'_> {
    /// The Beancount keyword of this kind of directive.
    pub fn keyword(&self) -> &'static str {
        use DirectiveContent::*;
        match self {
            Empty => "empty",
            Open(_) => "open",
            Close(_) => "close",
            Balance(_) => "balance",
            Commodity(_) => "commodity",
            Custom(_) => "custom",
            Document(_) => "document",
            Event(_) => "event",
            Note(_) => "note",
            Pad(_) => "pad",
            Price(_) => "price",
            Query(_) => "query",
            Transaction(_) => "transaction",
        }
    }
}

macro_rules! content_from {
    ( $( $ty:ident ),* ) => {
        $(
            impl<'a> From<$ty<'a>> for DirectiveContent<'a> {
                fn from(content: $ty<'a>) -> Self {
                    DirectiveContent::$ty(content)
                }
            }
        )*
    };
}

content_from!(
    Open,
    Close,
    Balance,
    Commodity,
    Custom,
    Document,
    Event,
    Note,
    Pad,
    Price,
    Query,
    Transaction
);

/// What to do when a comment is inserted under a key that is already taken.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OnExistence {
    /// Keep the existing value and drop the new one.
    Skip,
    /// Keep the existing value and store the new one under a key derived from the old key.
    Rename,
    /// Overwrite the existing value.
    Replace,
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum TransactionError {
    #[error("transaction has no posting at index {0}")]
    NoSuchPosting(usize),
    #[error(transparent)]
    Amount(#[from] AmountError),
}

impl<'a> Directive<'a> {
    /// A directive that only marks a date.
    pub fn dated(date: Date) -> Self {
        Directive::builder().date(date).build()
    }

    pub fn transaction(&self) -> Option<&Transaction<'a>> {
        match &self.content {
            DirectiveContent::Transaction(txn) => Some(txn),
            _ => None,
        }
    }

    pub fn transaction_mut(&mut self) -> Option<&mut Transaction<'a>> {
        match &mut self.content {
            DirectiveContent::Transaction(txn) => Some(txn),
            _ => None,
        }
    }

    /// Stores `value` under `key`, resolving key clashes according to `on_existence`.
    pub fn insert_comment<K, V>(&mut self, key: K, value: V, on_existence: OnExistence)
    where
        K: Into<Cow<'a, str>>,
        V: Into<MetaValue<'a>>,
    {
        let key = key.into();
        let value = value.into();
        if self.meta.contains_key(&key) {
            match on_existence {
                OnExistence::Skip => return,
                OnExistence::Rename => {
                    self.meta.insert(Cow::Owned(renamed_key(&key)), value);
                    return;
                }
                OnExistence::Replace => {}
            }
        }
        self.meta.insert(key, value);
    }

    /// Appends a free-form comment, keyed `;1`, `;2`, ... in insertion order.
    pub fn add_comment<V: Into<MetaValue<'a>>>(&mut self, value: V) {
        let key = format!(";{}", self.meta.len() + 1);
        self.meta.insert(Cow::Owned(key), value.into());
    }

    /// Folds `source` into this directive: its metadata is inserted with `on_existence`, and
    /// when `merge_postings` is set and both sides are transactions, its postings are appended.
    pub fn merge(
        &mut self,
        source: Directive<'a>,
        on_existence: OnExistence,
        merge_postings: bool,
    ) {
        let Directive { meta, content, .. } = source;
        for (key, value) in meta {
            self.insert_comment(key, value, on_existence);
        }
        if merge_postings {
            if let (Some(dest), DirectiveContent::Transaction(src)) =
                (self.transaction_mut(), content)
            {
                dest.postings.extend(src.postings);
            }
        }
    }

    /// Whether `keyword` matches the narration, a comment on the directive, or a comment on
    /// any of its postings.
    pub fn find_keyword(&self, keyword: &Regex) -> bool {
        let in_meta = |meta: &Meta<'_>| {
            meta.values()
                .filter_map(MetaValue::as_text)
                .any(|text| keyword.is_match(text))
        };

        if in_meta(&self.meta) {
            return true;
        }
        match self.transaction() {
            Some(txn) => {
                keyword.is_match(&txn.narration) || txn.postings.iter().any(|p| in_meta(&p.meta))
            }
            None => false,
        }
    }

    pub fn find_keywords(&self, keywords: &[Regex]) -> bool {
        keywords.iter().any(|keyword| self.find_keyword(keyword))
    }
}

/// First five hex digits of the key's SHA-256.  Comment keys keep their leading `;` so the
/// renamed entry is still written as a comment.
fn renamed_key(key: &str) -> String {
    let digest = hex::encode(Sha256::digest(key.as_bytes()));
    if key.starts_with(';') {
        format!(";{}", &digest[..5])
    } else {
        digest[..5].to_string()
    }
}

/// Represents a `balance` directive, which is a way for you to input your statement balance into
/// the flow of transactions.
///
/// ```text
/// 2014-08-09 balance Assets:Cash     562.00 USD
/// ```
///
/// <https://docs.google.com/document/d/1wAMVrKIA2qtRGmoVDSUBJGmYZSygUaR0uOMW1GV3YE0/edit#heading=h.l0pvgeniwvq8>
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct Balance<'a> {
    /// Account to check the balance of.
    pub account: Account<'a>,

    /// Amount to balance.
    pub amount: Amount<'a>,

    /// Tolerance allowed when checking the balance (`100 ~ 1 EUR`).
    #[builder(default)]
    pub tolerance: Option<Decimal>,
}

/// Represents a `close` directive.  This directive signifies the closing of an account.
///
/// ```text
/// 2016-11-28 close Liabilities:CreditCard:CapitalOne
/// ```
///
/// <https://docs.google.com/document/d/1wAMVrKIA2qtRGmoVDSUBJGmYZSygUaR0uOMW1GV3YE0/edit#heading=h.wf248e8stnac>
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct Close<'a> {
    /// Account being closed.
    pub account: Account<'a>,
}

/// Represents a `commodity` directive, used to attach metadata to a commodity.
///
/// ```text
/// 1867-01-01 commodity CAD
///     name: "Canadian Dollar"
/// ```
///
/// <https://docs.google.com/document/d/1wAMVrKIA2qtRGmoVDSUBJGmYZSygUaR0uOMW1GV3YE0/edit#heading=h.a3si01ejc035>
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct Commodity<'a> {
    /// Commodity name.
    #[builder(setter(into))]
    pub currency: Currency<'a>,
}

/// Represents a `custom` directive, a generic directive for prototyping new features.
///
/// ```text
/// 2014-07-09 custom "budget" Expenses:Food "monthly" 400.00 USD
/// ```
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct Custom<'a> {
    /// Type name of the custom directive.
    #[builder(setter(into))]
    pub name: Cow<'a, str>,

    /// Arguments to the directive.
    #[builder(default)]
    pub args: Vec<MetaValue<'a>>,
}

/// Represents a `document` directive, which links an external file to an account.
///
/// ```text
/// 2013-11-03 document Liabilities:CreditCard "/home/joe/stmts/apr-2014.pdf"
/// ```
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct Document<'a> {
    pub account: Account<'a>,

    #[builder(setter(into))]
    pub path: Cow<'a, str>,
}

/// Represents an `event` directive, used to track the value of some variable over time.
///
/// ```text
/// 2014-07-09 event "location" "Paris, France"
/// ```
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct Event<'a> {
    #[builder(setter(into))]
    pub name: Cow<'a, str>,

    #[builder(setter(into))]
    pub description: Cow<'a, str>,
}

/// Represents a `note` directive, a dated comment on the journal of an account.
///
/// ```text
/// 2013-11-03 note Liabilities:CreditCard "Called about fraudulent card."
/// ```
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct Note<'a> {
    pub account: Account<'a>,

    #[builder(setter(into))]
    pub comment: Cow<'a, str>,
}

/// Booking method of an account, given as the last argument of an `open` directive.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Booking {
    Strict,
    None,
    Average,
    Fifo,
    Lifo,
}

impl Booking {
    pub fn keyword(self) -> &'static str {
        match self {
            Booking::Strict => "STRICT",
            Booking::None => "NONE",
            Booking::Average => "AVERAGE",
            Booking::Fifo => "FIFO",
            Booking::Lifo => "LIFO",
        }
    }
}

/// Represents an `open` directive.  This directive signifies the opening of an account.
///
/// ```text
/// 2014-05-01 open Liabilities:CreditCard:CapitalOne     USD
/// ```
///
/// <https://docs.google.com/document/d/1wAMVrKIA2qtRGmoVDSUBJGmYZSygUaR0uOMW1GV3YE0/edit#heading=h.omdgvaikswd0>
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct Open<'a> {
    /// Account being opened.
    pub account: Account<'a>,

    /// Commodities allowed for the opened account.
    #[builder(default)]
    pub currencies: Vec<Currency<'a>>,

    #[builder(default)]
    pub booking: Option<Booking>,
}

/// Represents a `pad` directive, which inserts the transaction needed for the next balance
/// assertion to succeed.
///
/// ```text
/// 2014-06-01 pad Assets:BofA:Checking Equity:Opening-Balances
/// ```
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct Pad<'a> {
    /// Account to pad into.
    pub pad_to_account: Account<'a>,

    /// Account to pad from.
    pub pad_from_account: Account<'a>,
}

/// Represents a `price` directive, which establishes the rate of exchange between one commodity
/// and another.
///
/// ```text
/// 2014-07-09 price HOOL  579.18 USD
/// ```
///
/// <https://docs.google.com/document/d/1wAMVrKIA2qtRGmoVDSUBJGmYZSygUaR0uOMW1GV3YE0/edit#heading=h.f78ym1dxtemh>
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct Price<'a> {
    /// The commodity being priced.
    #[builder(setter(into))]
    pub currency: Currency<'a>,

    /// What one unit of the commodity is worth.
    pub amount: Amount<'a>,
}

/// Represents a `query` directive, a named query stored alongside the transactions.
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct Query<'a> {
    #[builder(setter(into))]
    pub name: Cow<'a, str>,

    #[builder(setter(into))]
    pub query_string: Cow<'a, str>,
}

/// Represents a `txn` (or `*` or `!`) directive.
///
/// The date, tags, links and metadata of a transaction live on its [`Directive`].
///
/// ```text
/// 2014-05-05 * "Cafe Mogador" "Lamb tagine with wine"
///     Liabilities:CreditCard:CapitalOne         -37.45 USD
///     Expenses:Restaurant
/// ```
///
/// <https://docs.google.com/document/d/1wAMVrKIA2qtRGmoVDSUBJGmYZSygUaR0uOMW1GV3YE0/edit#heading=h.up4dj751q84w>
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct Transaction<'a> {
    #[builder(default)]
    pub flag: Flag<'a>,

    #[builder(default, setter(strip_option, into))]
    pub payee: Option<Cow<'a, str>>,

    #[builder(setter(into))]
    pub narration: Cow<'a, str>,

    #[builder(default)]
    pub postings: Vec<Posting<'a>>,
}

impl<'a> Transaction<'a> {
    /// Appends a posting and returns its index.
    pub fn push_posting(&mut self, posting: Posting<'a>) -> usize {
        self.postings.push(posting);
        self.postings.len() - 1
    }

    fn posting_mut(&mut self, index: usize) -> Result<&mut Posting<'a>, TransactionError> {
        self.postings
            .get_mut(index)
            .ok_or(TransactionError::NoSuchPosting(index))
    }

    /// Appends a comment to the posting at `index`, keyed like [`Directive::add_comment`].
    pub fn add_posting_comment<V: Into<MetaValue<'a>>>(
        &mut self,
        index: usize,
        value: V,
    ) -> Result<(), TransactionError> {
        let posting = self.posting_mut(index)?;
        let key = format!(";{}", posting.meta.len() + 1);
        posting.meta.insert(Cow::Owned(key), value.into());
        Ok(())
    }

    /// Adds `amount` to the units of the posting at `index`.  The currencies must match; the
    /// result is quantized like any other statement amount.
    pub fn add_posting_amount(
        &mut self,
        index: usize,
        amount: &Amount<'_>,
    ) -> Result<(), TransactionError> {
        let posting = self.posting_mut(index)?;
        let units = match (&posting.units.num, &posting.units.currency) {
            (Some(num), Some(currency)) => Amount::new(*num, currency.clone()),
            _ => return Err(AmountError::Incomplete.into()),
        };
        let mut sum = units.checked_add(amount)?;
        sum.num = quantize(sum.num);
        posting.units = sum.into();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cash() -> Account<'static> {
        "Assets:Cash".parse().unwrap()
    }

    fn lunch() -> Directive<'static> {
        let txn = Transaction::builder()
            .narration("Lunch")
            .postings(vec![Posting::simple(cash(), Decimal::new(-120, 0), "TWD")])
            .build();
        Directive::builder()
            .date(Date::from_ymd(2022, 12, 1).unwrap())
            .content(txn)
            .build()
    }

    #[test]
    fn test_dated_directive_is_empty() {
        let directive = Directive::dated(Date::from_ymd(2022, 12, 1).unwrap());
        assert_eq!(directive.content, DirectiveContent::Empty);
        assert!(directive.tags.is_empty());
        assert!(directive.links.is_empty());
        assert!(directive.meta.is_empty());
    }

    #[test]
    fn test_insert_comment_on_existence() {
        let mut directive = lunch();
        directive.insert_comment("source", "bank", OnExistence::Replace);

        directive.insert_comment("source", "skipped", OnExistence::Skip);
        assert_eq!(directive.meta["source"], MetaValue::from("bank"));

        directive.insert_comment("source", "receipt", OnExistence::Replace);
        assert_eq!(directive.meta["source"], MetaValue::from("receipt"));

        directive.insert_comment("source", "renamed", OnExistence::Rename);
        assert_eq!(directive.meta["source"], MetaValue::from("receipt"));
        assert_eq!(directive.meta[renamed_key("source").as_str()], MetaValue::from("renamed"));
        assert_eq!(renamed_key("source").len(), 5);
    }

    #[test]
    fn test_renamed_comment_stays_a_comment() {
        let mut directive = lunch();
        directive.add_comment("bank");
        directive.insert_comment(";1", "receipt", OnExistence::Rename);

        let renamed = renamed_key(";1");
        assert!(renamed.starts_with(';'));
        assert_eq!(renamed.len(), 6);
        assert_eq!(directive.meta[";1"], MetaValue::from("bank"));
        assert_eq!(directive.meta[renamed.as_str()], MetaValue::from("receipt"));
    }

    #[test]
    fn test_add_comment_numbers_keys() {
        let mut directive = lunch();
        directive.add_comment("first");
        directive.add_comment("second");
        assert_eq!(directive.meta[";1"], MetaValue::from("first"));
        assert_eq!(directive.meta[";2"], MetaValue::from("second"));
    }

    #[test]
    fn test_merge() {
        let mut dest = lunch();
        dest.insert_comment("Source1", "kept", OnExistence::Replace);
        let mut source = lunch();
        source.insert_comment("Source2", "merged", OnExistence::Replace);

        dest.merge(source.clone(), OnExistence::Rename, false);
        assert_eq!(dest.meta.len(), 2);
        assert_eq!(dest.transaction().unwrap().postings.len(), 1);

        dest.merge(source, OnExistence::Skip, true);
        assert_eq!(dest.meta.len(), 2);
        assert_eq!(dest.transaction().unwrap().postings.len(), 2);
    }

    #[test]
    fn test_find_keyword() {
        let mut directive = lunch();
        directive
            .transaction_mut()
            .unwrap()
            .add_posting_comment(0, "paid with LINE Pay")
            .unwrap();

        assert!(directive.find_keyword(&Regex::new("^Lun").unwrap()));
        assert!(directive.find_keyword(&Regex::new("LINE").unwrap()));
        assert!(!directive.find_keyword(&Regex::new("Dinner").unwrap()));
        assert!(directive.find_keywords(&[
            Regex::new("Dinner").unwrap(),
            Regex::new("Pay$").unwrap()
        ]));
    }

    #[test]
    fn test_add_posting_amount() {
        let mut directive = lunch();
        let txn = directive.transaction_mut().unwrap();

        txn.add_posting_amount(0, &Amount::new(Decimal::new(20, 0), "TWD"))
            .unwrap();
        assert_eq!(
            txn.postings[0].units,
            Amount::new(Decimal::new(-10000, 2), "TWD").into()
        );

        assert_eq!(
            txn.add_posting_amount(3, &Amount::new(Decimal::ONE, "TWD")),
            Err(TransactionError::NoSuchPosting(3))
        );
        assert!(matches!(
            txn.add_posting_amount(0, &Amount::new(Decimal::ONE, "USD")),
            Err(TransactionError::Amount(AmountError::CurrencyMismatch { .. }))
        ));

        let index = txn.push_posting(Posting::interpolated("Expenses:Food".parse().unwrap()));
        assert_eq!(index, 1);
        assert_eq!(
            txn.add_posting_amount(1, &Amount::new(Decimal::ONE, "TWD")),
            Err(TransactionError::Amount(AmountError::Incomplete))
        );
    }
}
