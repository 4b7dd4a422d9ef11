use std::path::PathBuf;

use typed_builder::TypedBuilder;

/// Where the ledger is written when nothing else is configured.
pub const DEFAULT_OUTPUT: &str = "/tmp/gg";

/// Settings for one run of the writer.
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct Settings {
    /// File the ledger is written to.  It is created if missing and truncated otherwise.
    #[builder(default = PathBuf::from(DEFAULT_OUTPUT), setter(into))]
    pub output: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings::builder().build()
    }
}
