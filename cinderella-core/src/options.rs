use std::collections::BTreeMap;
use std::path::PathBuf;

use typed_builder::TypedBuilder;

use super::account_types::AccountType;

/// Configuration global to a ledger, i.e. what Beancount sets through `option` lines.
///
/// A ledger only ever sees its options through a shared handle, so a single `Options` value
/// can back any number of ledgers.
///
/// <https://docs.google.com/document/d/1wAMVrKIA2qtRGmoVDSUBJGmYZSygUaR0uOMW1GV3YE0/edit#heading=h.e2iyrfrmstl>
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct Options {
    /// Title of the ledger.
    #[builder(default, setter(strip_option, into))]
    pub title: Option<String>,

    /// Currencies reported on in their own columns.
    #[builder(default)]
    pub operating_currencies: Vec<String>,

    #[builder(default = default_root_names())]
    root_names: BTreeMap<AccountType, String>,
}

fn default_root_names() -> BTreeMap<AccountType, String> {
    AccountType::ALL
        .iter()
        .map(|ty| (*ty, ty.default_name().to_string()))
        .collect()
}

impl Default for Options {
    fn default() -> Self {
        Options::builder().build()
    }
}

impl Options {
    /// Name used for the root of accounts of type `ty`.
    pub fn root_name(&self, ty: AccountType) -> &str {
        self.root_names
            .get(&ty)
            .map(String::as_str)
            .unwrap_or_else(|| ty.default_name())
    }

    pub fn set_root_name<S: Into<String>>(&mut self, ty: AccountType, name: S) {
        self.root_names.insert(ty, name.into());
    }

    /// Root names that differ from the Beancount defaults, in account type order.
    pub fn renamed_roots(&self) -> impl Iterator<Item = (AccountType, &str)> + '_ {
        self.root_names
            .iter()
            .filter(|(ty, name)| ty.default_name() != name.as_str())
            .map(|(ty, name)| (*ty, name.as_str()))
    }
}

/// Information about how a ledger came to be: the file it was read from, the files that file
/// included, and a hash of the input.
#[derive(Clone, Debug, Default, Eq, PartialEq, TypedBuilder)]
pub struct ProcessingInfo {
    #[builder(default, setter(strip_option, into))]
    pub filename: Option<PathBuf>,

    #[builder(default)]
    pub includes: Vec<PathBuf>,

    #[builder(default, setter(strip_option, into))]
    pub input_hash: Option<String>,
}
