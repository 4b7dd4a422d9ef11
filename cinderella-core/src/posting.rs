use rust_decimal::Decimal;
use typed_builder::TypedBuilder;

use super::account::Account;
use super::amount::{Amount, IncompleteAmount};
use super::flags::Flag;
use super::metadata::Meta;
use super::position::CostSpec;
use super::Currency;

/// Represents a transaction posting.  Postings represent a single amount being deposited to or
/// withdrawn from an account.
///
/// Postings can have optionally have either a cost or a price.  A posting with a price might look
/// like this, where the price is the amount and commodity following the `@`:
///
/// ```text
/// 2012-11-03 * "Transfer to account in Canada"
///     Assets:MyBank:Checking            -400.00 USD @ 1.09 CAD
///     Assets:FR:SocGen:Checking          436.01 CAD
/// ```
///
/// <https://docs.google.com/document/d/1wAMVrKIA2qtRGmoVDSUBJGmYZSygUaR0uOMW1GV3YE0/edit#heading=h.mtqrwt24wnzs>
#[derive(Clone, Debug, Eq, PartialEq, Hash, TypedBuilder)]
pub struct Posting<'a> {
    /// Account being posted to.
    pub account: Account<'a>,

    /// The amount being posted.  Left empty for the posting Beancount should interpolate.
    #[builder(default)]
    pub units: IncompleteAmount<'a>,

    /// The cost of this posting.
    #[builder(default)]
    pub cost: Option<CostSpec<'a>>,

    /// The price of this posting.
    #[builder(default)]
    pub price: Option<IncompleteAmount<'a>>,

    #[builder(default)]
    pub flag: Option<Flag<'a>>,

    #[builder(default)]
    pub meta: Meta<'a>,
}

impl<'a> Posting<'a> {
    /// A posting of a quantized amount with nothing else attached.
    pub fn simple<C: Into<Currency<'a>>>(account: Account<'a>, num: Decimal, currency: C) -> Self {
        Posting::builder()
            .account(account)
            .units(Amount::quantized(num, currency).into())
            .build()
    }

    /// A posting without units, left for Beancount to fill in.
    pub fn interpolated(account: Account<'a>) -> Self {
        Posting::builder().account(account).build()
    }
}
