use rust_decimal::Decimal;
use typed_builder::TypedBuilder;

use super::{Currency, Date};

/// Represents a "cost", which typically belongs to a [Posting](struct.Posting.html).
///
/// Either a per-unit (`{500.00 USD}`) or a total (`{{1000.00 USD}}`) number may be given;
/// when both are present the total wins.
///
/// <https://docs.google.com/document/d/1wAMVrKIA2qtRGmoVDSUBJGmYZSygUaR0uOMW1GV3YE0/edit#heading=h.mtqrwt24wnzs>
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, TypedBuilder)]
pub struct CostSpec<'a> {
    #[builder(default)]
    pub number_per: Option<Decimal>,
    #[builder(default)]
    pub number_total: Option<Decimal>,
    /// The type of commodity for this cost.
    #[builder(default)]
    pub currency: Option<Currency<'a>>,
    /// The date of the at-cost.
    #[builder(default)]
    pub date: Option<Date>,
    /// The label of the cost.
    #[builder(default)]
    pub label: Option<std::borrow::Cow<'a, str>>,
}
