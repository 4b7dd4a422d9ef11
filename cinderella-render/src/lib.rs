use cinderella_core::metadata::{Meta, MetaValue};
use cinderella_core::*;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{io, io::BufWriter, io::Write};
use thiserror::Error;
use tracing::debug;


const META_INDENT: &str = "  ";
const POSTING_INDENT: &str = "  ";
const POSTING_META_INDENT: &str = "    ";
const MARKER_META_INDENT: &str = ";   ";

/// Renders ledgers as Beancount text.  Account roots are named after the options it was
/// built with.
#[derive(Clone, Eq, PartialEq, Default, Debug)]
pub struct BasicRenderer {
    options: Arc<Options>,
}

impl BasicRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Arc<Options>) -> Self {
        BasicRenderer { options }
    }
}

/// Renders `ledger` using its own options.
pub fn render<W: Write>(w: &mut W, ledger: &Ledger<'_>) -> Result<(), RenderError> {
    BasicRenderer::with_options(Arc::clone(&ledger.options)).render(ledger, w)
}

/// Writes `ledger` as text to `path`, replacing whatever the file held before.
pub fn write_to_text<P: AsRef<Path>>(ledger: &Ledger<'_>, path: P) -> Result<(), RenderError> {
    let path = path.as_ref();
    let mut w = BufWriter::new(create(path)?);
    render(&mut w, ledger)?;
    w.flush()?;
    debug!(path = %path.display(), directives = ledger.len(), "wrote ledger");
    Ok(())
}

/// Writes one `open` directive dated `date` per distinct account, in account order.
pub fn write_account_openings<P: AsRef<Path>>(
    accounts: &[Account<'_>],
    date: Date,
    path: P,
) -> Result<(), RenderError> {
    let path = path.as_ref();
    let mut w = BufWriter::new(create(path)?);
    let renderer = BasicRenderer::new();
    let accounts: BTreeSet<&Account<'_>> = accounts.iter().collect();
    for account in &accounts {
        let open = Directive::builder()
            .date(date)
            .content(Open::builder().account((*account).clone()).build())
            .build();
        renderer.render(&open, &mut w)?;
    }
    w.flush()?;
    debug!(path = %path.display(), accounts = accounts.len(), "wrote account openings");
    Ok(())
}

fn create(path: &Path) -> Result<File, RenderError> {
    File::create(path).map_err(|source| RenderError::Create {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("an io error occurred")]
    Io(#[from] io::Error),
    #[error("could not create {}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not render {kind} directive without a date")]
    MissingDate { kind: &'static str },
}

pub trait Renderer<T, W: Write> {
    type Error;
    fn render(&self, renderable: T, write: &mut W) -> Result<(), Self::Error>;
}

impl<'a, W: Write> Renderer<&'a Ledger<'_>, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, ledger: &'a Ledger<'_>, write: &mut W) -> Result<(), Self::Error> {
        let mut header: Vec<u8> = Vec::new();
        self.render(&*ledger.info, &mut header)?;
        self.render(&*ledger.options, &mut header)?;
        if !header.is_empty() {
            write.write_all(&header)?;
            writeln!(write)?;
        }
        for directive in &ledger.directives {
            self.render(directive, write)?;
            writeln!(write)?;
        }
        Ok(())
    }
}

impl<'a, W: Write> Renderer<&'a ProcessingInfo, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, info: &'a ProcessingInfo, w: &mut W) -> Result<(), Self::Error> {
        if let Some(filename) = &info.filename {
            writeln!(w, ";; source: {}", filename.display())?;
        }
        if let Some(hash) = &info.input_hash {
            writeln!(w, ";; input hash: {}", hash)?;
        }
        for include in &info.includes {
            write!(w, "include ")?;
            write_quoted(w, &include.to_string_lossy())?;
            writeln!(w)?;
        }
        Ok(())
    }
}

impl<'a, W: Write> Renderer<&'a Options, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, options: &'a Options, w: &mut W) -> Result<(), Self::Error> {
        if let Some(title) = &options.title {
            render_option(w, "title", title)?;
        }
        for currency in &options.operating_currencies {
            render_option(w, "operating_currency", currency)?;
        }
        for (ty, name) in options.renamed_roots() {
            render_option(w, ty.option_name(), name)?;
        }
        Ok(())
    }
}

fn render_option<W: Write>(w: &mut W, name: &str, value: &str) -> Result<(), RenderError> {
    write!(w, "option ")?;
    write_quoted(w, name)?;
    write!(w, " ")?;
    write_quoted(w, value)?;
    writeln!(w)?;
    Ok(())
}

impl<'a, W: Write> Renderer<&'a Directive<'_>, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, directive: &'a Directive<'_>, w: &mut W) -> Result<(), Self::Error> {
        use DirectiveContent::*;
        if let Empty = directive.content {
            return self.render_marker(directive, w);
        }

        let date = directive.date.ok_or(RenderError::MissingDate {
            kind: directive.content.keyword(),
        })?;
        write!(w, "{} ", date)?;
        match &directive.content {
            Open(open) => self.render(open, w)?,
            Close(close) => self.render(close, w)?,
            Balance(balance) => self.render(balance, w)?,
            Commodity(commodity) => self.render(commodity, w)?,
            Custom(custom) => self.render(custom, w)?,
            Document(document) => self.render(document, w)?,
            Event(event) => self.render(event, w)?,
            Note(note) => self.render(note, w)?,
            Pad(pad) => self.render(pad, w)?,
            Price(price) => self.render(price, w)?,
            Query(query) => self.render(query, w)?,
            Transaction(transaction) => self.render(transaction, w)?,
            Empty => {}
        }
        render_tags_links(w, directive)?;
        writeln!(w)?;
        render_key_value(self, w, &directive.meta, META_INDENT)?;
        if let Transaction(transaction) = &directive.content {
            for posting in &transaction.postings {
                self.render(posting, w)?;
            }
        }
        Ok(())
    }
}

impl BasicRenderer {
    /// A directive without content is written as a comment so the output stays loadable.
    fn render_marker<W: Write>(
        &self,
        directive: &Directive<'_>,
        w: &mut W,
    ) -> Result<(), RenderError> {
        match directive.date {
            Some(date) => write!(w, "; {}", date)?,
            None => write!(w, "; undated")?,
        }
        render_tags_links(w, directive)?;
        writeln!(w)?;
        render_key_value(self, w, &directive.meta, MARKER_META_INDENT)
    }
}

fn render_tags_links<W: Write>(w: &mut W, directive: &Directive<'_>) -> Result<(), RenderError> {
    for tag in &directive.tags {
        write!(w, " #{}", tag)?;
    }
    for link in &directive.links {
        write!(w, " ^{}", link)?;
    }
    Ok(())
}

fn render_key_value<W: Write>(
    renderer: &BasicRenderer,
    w: &mut W,
    kv: &Meta<'_>,
    indent: &str,
) -> Result<(), RenderError> {
    for (key, value) in kv {
        if key.starts_with(';') || is_metadata_key(key) {
            write!(w, "{}{}: ", indent, key)?;
        } else {
            write!(w, "{}; {}: ", indent, key)?;
        }
        renderer.render(value, w)?;
        writeln!(w)?;
    }
    Ok(())
}

/// Beancount metadata keys start with a lowercase letter followed by letters, digits, `-`
/// or `_`.  Anything else is written out as a comment.
fn is_metadata_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        }
        _ => false,
    }
}

fn write_quoted<W: Write>(w: &mut W, s: &str) -> Result<(), RenderError> {
    write!(w, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))?;
    Ok(())
}

impl<'a, W: Write> Renderer<&'a MetaValue<'_>, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, mv: &'a MetaValue<'_>, w: &mut W) -> Result<(), Self::Error> {
        match mv {
            MetaValue::Account(account) => self.render(account, w)?,
            MetaValue::Amount(amount) => self.render(amount, w)?,
            MetaValue::Bool(b) => write!(w, "{}", if *b { "TRUE" } else { "FALSE" })?,
            MetaValue::Currency(curr) => write!(w, "{}", curr)?,
            MetaValue::Date(date) => write!(w, "{}", date)?,
            MetaValue::Number(num) => write!(w, "{}", num)?,
            MetaValue::Tag(t) => write!(w, "#{}", t)?,
            MetaValue::Text(t) => write_quoted(w, t)?,
        }
        Ok(())
    }
}

impl<'a, W: Write> Renderer<&'a Open<'_>, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, open: &'a Open<'_>, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "open ")?;
        self.render(&open.account, w)?;
        if !open.currencies.is_empty() {
            write!(w, " {}", open.currencies.join(","))?;
        }
        if let Some(booking) = open.booking {
            write!(w, " ")?;
            write_quoted(w, booking.keyword())?;
        }
        Ok(())
    }
}

impl<'a, W: Write> Renderer<&'a Close<'_>, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, close: &'a Close<'_>, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "close ")?;
        self.render(&close.account, w)
    }
}

impl<'a, W: Write> Renderer<&'a Account<'_>, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, account: &'a Account<'_>, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "{}", self.options.root_name(account.ty))?;
        for part in &account.parts {
            write!(w, ":{}", part)?;
        }
        Ok(())
    }
}

impl<'a, W: Write> Renderer<&'a Balance<'_>, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, balance: &'a Balance<'_>, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "balance ")?;
        self.render(&balance.account, w)?;
        write!(w, "  {}", balance.amount.num)?;
        if let Some(tolerance) = &balance.tolerance {
            write!(w, " ~ {}", tolerance)?;
        }
        write!(w, " {}", balance.amount.currency)?;
        Ok(())
    }
}

impl<'a, W: Write> Renderer<&'a Amount<'_>, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, amount: &'a Amount<'_>, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "{} {}", amount.num, amount.currency)?;
        Ok(())
    }
}

impl<'a, W: Write> Renderer<&'a Commodity<'_>, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, commodity: &'a Commodity<'_>, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "commodity {}", commodity.currency)?;
        Ok(())
    }
}

impl<'a, W: Write> Renderer<&'a Custom<'_>, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, custom: &'a Custom<'_>, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "custom ")?;
        write_quoted(w, &custom.name)?;
        for arg in &custom.args {
            write!(w, " ")?;
            self.render(arg, w)?;
        }
        Ok(())
    }
}

impl<'a, W: Write> Renderer<&'a Document<'_>, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, document: &'a Document<'_>, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "document ")?;
        self.render(&document.account, w)?;
        write!(w, " ")?;
        write_quoted(w, &document.path)
    }
}

impl<'a, W: Write> Renderer<&'a Event<'_>, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, event: &'a Event<'_>, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "event ")?;
        write_quoted(w, &event.name)?;
        write!(w, " ")?;
        write_quoted(w, &event.description)
    }
}

impl<'a, W: Write> Renderer<&'a Note<'_>, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, note: &'a Note<'_>, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "note ")?;
        self.render(&note.account, w)?;
        write!(w, " ")?;
        write_quoted(w, &note.comment)
    }
}

impl<'a, W: Write> Renderer<&'a Pad<'_>, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, pad: &'a Pad<'_>, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "pad ")?;
        self.render(&pad.pad_to_account, w)?;
        write!(w, " ")?;
        self.render(&pad.pad_from_account, w)
    }
}

impl<'a, W: Write> Renderer<&'a Price<'_>, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, price: &'a Price<'_>, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "price {} ", price.currency)?;
        self.render(&price.amount, w)
    }
}

impl<'a, W: Write> Renderer<&'a Query<'_>, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, query: &'a Query<'_>, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "query ")?;
        write_quoted(w, &query.name)?;
        write!(w, " ")?;
        write_quoted(w, &query.query_string)
    }
}

impl<'a, W: Write> Renderer<&'a Transaction<'_>, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, transaction: &'a Transaction<'_>, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "{}", transaction.flag)?;
        if let Some(payee) = &transaction.payee {
            write!(w, " ")?;
            write_quoted(w, payee)?;
        }
        write!(w, " ")?;
        write_quoted(w, &transaction.narration)
    }
}

impl<'a, W: Write> Renderer<&'a Posting<'_>, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, posting: &'a Posting<'_>, w: &mut W) -> Result<(), Self::Error> {
        write!(w, "{}", POSTING_INDENT)?;
        if let Some(flag) = &posting.flag {
            write!(w, "{} ", flag)?;
        }
        self.render(&posting.account, w)?;
        if !posting.units.is_empty() {
            write!(w, "  ")?;
            self.render(&posting.units, w)?;
        }
        if let Some(cost) = &posting.cost {
            write!(w, " ")?;
            self.render(cost, w)?;
        }
        if let Some(price) = &posting.price {
            write!(w, " @ ")?;
            self.render(price, w)?;
        }
        writeln!(w)?;
        render_key_value(self, w, &posting.meta, POSTING_META_INDENT)
    }
}

impl<'a, W: Write> Renderer<&'a CostSpec<'_>, W> for BasicRenderer {
    type Error = RenderError;
    fn render(&self, cost: &'a CostSpec<'_>, w: &mut W) -> Result<(), Self::Error> {
        let double_brackets = cost.number_total.is_some();
        if double_brackets {
            write!(w, "{{{{")?;
        } else {
            write!(w, "{{")?;
        }
        let mut first = true;

        if let (Some(cost), Some(currency)) =
            (&cost.number_total.or(cost.number_per), &cost.currency)
        {
            write!(w, "{} {}", cost, currency)?;
            first = false;
        }

        if let Some(date) = &cost.date {
            if !first {
                write!(w, ", ")?;
            }
            write!(w, "{}", date)?;
            first = false;
        }

        if let Some(label) = &cost.label {
            if !first {
                write!(w, ", ")?;
            }
            write_quoted(w, label)?;
        }

        if double_brackets {
            write!(w, "}}}}")?;
        } else {
            write!(w, "}}")?;
        }
        Ok(())
    }
}

impl<'a, W: Write> Renderer<&'a IncompleteAmount<'_>, W> for BasicRenderer {
    type Error = RenderError;
    fn render(
        &self,
        incomplete_amount: &'a IncompleteAmount<'_>,
        w: &mut W,
    ) -> Result<(), Self::Error> {
        match (&incomplete_amount.num, &incomplete_amount.currency) {
            (Some(num), Some(currency)) => write!(w, "{} {}", num, currency),
            (None, Some(currency)) => write!(w, "{}", currency),
            (Some(num), None) => write!(w, "{}", num),
            _ => Ok(()),
        }?;
        Ok(())
    }
}
