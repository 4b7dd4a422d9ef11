//! Builds a small in-memory ledger and writes it out as Beancount text.
//!
//! The same routine backs two binaries: `cinderella` writes a ledger holding one dated
//! directive, `cinderella-empty` writes a ledger with no directives at all.

use std::sync::Arc;

use anyhow::{Context, Result};
use cinderella_core::{Date, Directive, Ledger, Options, ProcessingInfo};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

pub use settings::{Settings, DEFAULT_OUTPUT};

pub mod settings;

/// (year, month, day) of the directive written by the dated variant.
pub const DIRECTIVE_DATE: (i32, u32, u32) = (2022, 12, 1);

/// Which ledger a run produces.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Variant {
    /// A ledger without directives.
    Empty,
    /// A ledger with one directive carrying this date.
    Dated(Date),
}

impl Variant {
    /// The dated variant, dated [`DIRECTIVE_DATE`].
    pub fn dated_default() -> Result<Self> {
        let (year, month, day) = DIRECTIVE_DATE;
        let date = Date::from_ymd(year, month, day)
            .with_context(|| format!("{}-{}-{} is not a calendar date", year, month, day))?;
        Ok(Variant::Dated(date))
    }
}

/// Builds the ledger for `variant`, sharing `options` and `info` with the caller.
pub fn build_ledger(
    variant: Variant,
    options: Arc<Options>,
    info: Arc<ProcessingInfo>,
) -> Ledger<'static> {
    let mut ledger = Ledger::builder().options(options).info(info).build();
    if let Variant::Dated(date) = variant {
        ledger.push(Directive::dated(date));
    }
    ledger
}

/// Builds the ledger for `variant` and writes it to the configured output.
pub fn run(settings: &Settings, variant: Variant) -> Result<()> {
    debug!(?settings, ?variant, "cinderella settings");

    let options = Arc::new(Options::default());
    let info = Arc::new(ProcessingInfo::default());
    let ledger = build_ledger(variant, Arc::clone(&options), Arc::clone(&info));

    info!(output = %settings.output.display(), directives = ledger.len(), "writing ledger");
    cinderella_render::write_to_text(&ledger, &settings.output)
        .with_context(|| format!("failed to write ledger to {}", settings.output.display()))?;
    Ok(())
}

/// Logs a failed run and maps it to the process exit status.
pub fn exit_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            error!("{:#}", err);
            1
        }
    }
}

/// Installs the global `tracing` subscriber, filtered by `RUST_LOG`.
pub fn init_logging() -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install the log subscriber")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinderella_core::DirectiveContent;

    #[test]
    fn test_empty_variant() {
        let ledger = build_ledger(
            Variant::Empty,
            Arc::new(Options::default()),
            Arc::new(ProcessingInfo::default()),
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_dated_variant() {
        let options = Arc::new(Options::default());
        let info = Arc::new(ProcessingInfo::default());
        let variant = Variant::dated_default().unwrap();
        let ledger = build_ledger(variant, Arc::clone(&options), Arc::clone(&info));

        assert_eq!(ledger.len(), 1);
        let directive = &ledger.directives[0];
        assert_eq!(directive.date, Date::from_ymd(2022, 12, 1));
        assert_eq!(directive.content, DirectiveContent::Empty);
        assert!(directive.tags.is_empty() && directive.links.is_empty());

        assert!(Arc::ptr_eq(&ledger.options, &options));
        assert!(Arc::ptr_eq(&ledger.info, &info));
    }
}
