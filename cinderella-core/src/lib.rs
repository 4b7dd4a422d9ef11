use std::borrow::Cow;
use std::sync::Arc;

use typed_builder::TypedBuilder;

pub use account::{Account, AccountParseError};
pub use account_types::AccountType;
pub use amount::{Amount, AmountError, IncompleteAmount};
pub use date::Date;
pub use directives::*;
pub use flags::Flag;
pub use options::{Options, ProcessingInfo};
pub use position::CostSpec;
pub use posting::Posting;

pub mod account;
pub mod account_types;
pub mod amount;
pub mod classifier;
mod date;
pub mod dedup;
pub mod directives;
pub mod flags;
pub mod metadata;
pub mod options;
pub mod position;
pub mod posting;

/// Represents the complete ledger consisting of a number of directives.
///
/// The ledger owns its directives; options and processing info are shared handles that other
/// ledgers (or the caller) may hold as well.
#[derive(Clone, Debug, Default, PartialEq, Eq, TypedBuilder)]
pub struct Ledger<'a> {
    #[builder(default)]
    pub directives: Vec<Directive<'a>>,

    #[builder(default)]
    pub options: Arc<Options>,

    #[builder(default)]
    pub info: Arc<ProcessingInfo>,
}

impl<'a> Ledger<'a> {
    /// Moves `directive` into the ledger, after any directive already in it.
    pub fn push(&mut self, directive: Directive<'a>) {
        self.directives.push(directive);
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

pub type Currency<'a> = Cow<'a, str>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_order() {
        let mut ledger = Ledger::default();
        assert!(ledger.is_empty());

        let first = Directive::dated(Date::from_ymd(2022, 12, 1).unwrap());
        let second = Directive::dated(Date::from_ymd(2022, 11, 1).unwrap());
        ledger.push(first.clone());
        ledger.push(second.clone());

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.directives, vec![first, second]);
    }

    #[test]
    fn test_options_are_shared() {
        let options = Arc::new(Options::builder().title("Shared").build());
        let info = Arc::new(ProcessingInfo::default());
        let ledger = Ledger::builder()
            .options(Arc::clone(&options))
            .info(Arc::clone(&info))
            .build();

        assert!(Arc::ptr_eq(&ledger.options, &options));
        assert_eq!(Arc::strong_count(&options), 2);
        assert_eq!(ledger.options.title.as_deref(), Some("Shared"));
    }
}
