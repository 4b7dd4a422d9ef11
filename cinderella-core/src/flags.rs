use std::borrow::Cow;
use std::fmt;

/// Flag on a transaction or a posting.
///
/// Besides the usual `*` and `!`, Beancount reserves a handful of single letters for
/// automatically generated entries; the ones produced while importing statements are listed
/// here.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Flag<'a> {
    Okay,
    Warning,
    Transfer,
    Conversions,
    Merging,
    Other(Cow<'a, str>),
}

impl Default for Flag<'_> {
    fn default() -> Self {
        Flag::Okay
    }
}

impl<'a> From<&'a str> for Flag<'a> {
    fn from(s: &'a str) -> Self {
        Cow::from(s).into()
    }
}

impl From<String> for Flag<'_> {
    fn from(s: String) -> Self {
        Cow::from(s).into()
    }
}

impl<'a> From<Cow<'a, str>> for Flag<'a> {
    fn from(s: Cow<'a, str>) -> Self {
        match &*s {
            "*" | "txn" => Flag::Okay,
            "!" => Flag::Warning,
            "T" => Flag::Transfer,
            "C" => Flag::Conversions,
            "M" => Flag::Merging,
            _ => Flag::Other(s),
        }
    }
}

impl fmt::Display for Flag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::Okay => f.write_str("*"),
            Flag::Warning => f.write_str("!"),
            Flag::Transfer => f.write_str("T"),
            Flag::Conversions => f.write_str("C"),
            Flag::Merging => f.write_str("M"),
            Flag::Other(s) => f.write_str(s),
        }
    }
}
