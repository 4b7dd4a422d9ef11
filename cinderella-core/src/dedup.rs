//! Removing transactions that show up in more than one statement.
//!
//! The same purchase is typically reported by the bank, by the credit card issuer and by the
//! e-invoice platform, often a day or two apart.  Statements are processed left to right:
//! entries of earlier statements win, and later duplicates are dropped (or merged into the
//! entry they duplicate).

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use tracing::debug;
use typed_builder::TypedBuilder;

use super::account::Account;
use super::amount::IncompleteAmount;
use super::directives::{Directive, OnExistence};
use super::posting::Posting;
use super::Date;

/// Where a statement came from.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum StatementKind {
    Invalid,
    Ignored,
    Custom,
    Bank,
    CreditCard,
    Receipt,
    Stock,
}

/// The directives imported from one source, e.g. one bank's CSV export.
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct Statement<'a> {
    #[builder(setter(into))]
    pub source: String,

    pub kind: StatementKind,

    #[builder(default)]
    pub entries: Vec<Directive<'a>>,
}

impl<'a> Statement<'a> {
    pub fn push(&mut self, entry: Directive<'a>) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Debug, TypedBuilder)]
pub struct DedupOptions {
    /// How many days apart two entries may be and still count as duplicates.
    #[builder(default)]
    pub tolerance_days: i64,

    /// Never treat two entries of the same source as duplicates.
    #[builder(default = true)]
    pub ignore_same_source: bool,

    /// Merge a dropped duplicate into the entry it duplicates.
    #[builder(default)]
    pub merge_duplicates: bool,

    /// When merging, also carry over the postings of the duplicate.
    #[builder(default)]
    pub merge_postings: bool,

    /// Only look at statements of these kinds; empty means all statements.
    #[builder(default)]
    pub statement_kinds: Vec<StatementKind>,
}

impl Default for DedupOptions {
    fn default() -> Self {
        DedupOptions::builder().build()
    }
}

/// Day offsets to probe for a tolerance of `n` days, nearest first: `[0, 1, -1, ..., n, -n]`.
pub fn lookback_offsets(n: i64) -> Vec<i64> {
    if n < 0 {
        return Vec::new();
    }
    let mut offsets = vec![0];
    for i in 1..=n {
        offsets.push(i);
        offsets.push(-i);
    }
    offsets
}

struct Record {
    statement: usize,
    entry: usize,
    found_dup: bool,
}

/// Drops duplicated entries across `statements`, in place.
///
/// `key` computes the identity of an entry as seen `offset` days away from its own date;
/// entries it returns `None` for are always kept.  `distinct` can veto a match between an
/// earlier entry and the current one.  Each kept entry absorbs at most one duplicate.
pub fn dedup<'a, K, F, D>(
    statements: &mut [Statement<'a>],
    key: F,
    distinct: D,
    options: &DedupOptions,
)
where
    K: Hash + Eq,
    F: Fn(&Directive<'a>, i64) -> Option<K>,
    D: Fn(&Directive<'a>, &Directive<'a>) -> bool,
{
    let offsets = lookback_offsets(options.tolerance_days);
    let mut records: HashMap<K, Vec<Record>> = HashMap::new();

    for current in 0..statements.len() {
        if !options.statement_kinds.is_empty()
            && !options.statement_kinds.contains(&statements[current].kind)
        {
            continue;
        }

        let entries = std::mem::take(&mut statements[current].entries);
        let mut unique: Vec<Directive<'a>> = Vec::with_capacity(entries.len());

        for entry in entries {
            let mut matched = None;
            'probe: for offset in &offsets {
                let probe = match key(&entry, *offset) {
                    Some(probe) => probe,
                    None => continue,
                };
                for record in records.get_mut(&probe).into_iter().flatten() {
                    if record.found_dup {
                        continue;
                    }
                    if options.ignore_same_source
                        && statements[record.statement].source == statements[current].source
                    {
                        continue;
                    }
                    let earlier = if record.statement == current {
                        &unique[record.entry]
                    } else {
                        &statements[record.statement].entries[record.entry]
                    };
                    if distinct(earlier, &entry) {
                        continue;
                    }
                    record.found_dup = true;
                    matched = Some((record.statement, record.entry));
                    break 'probe;
                }
            }

            match matched {
                Some((statement, index)) => {
                    debug!(
                        source = %statements[current].source,
                        kept_in = %statements[statement].source,
                        "dropping duplicated entry"
                    );
                    if options.merge_duplicates {
                        let kept = if statement == current {
                            &mut unique[index]
                        } else {
                            &mut statements[statement].entries[index]
                        };
                        kept.merge(entry, OnExistence::Rename, options.merge_postings);
                    }
                }
                None => {
                    if let Some(own_key) = key(&entry, 0) {
                        records.entry(own_key).or_default().push(Record {
                            statement: current,
                            entry: unique.len(),
                            found_dup: false,
                        });
                    }
                    unique.push(entry);
                }
            }
        }

        statements[current].entries = unique;
    }
}

fn shifted_date(entry: &Directive<'_>, offset: i64) -> Option<Date> {
    entry.date?.shifted(offset)
}

fn first_posting<'e, 'a>(entry: &'e Directive<'a>) -> Option<&'e Posting<'a>> {
    entry.transaction()?.postings.first()
}

fn first_units<'e, 'a>(entry: &'e Directive<'a>) -> Option<&'e IncompleteAmount<'a>> {
    first_posting(entry).map(|p| &p.units)
}

/// Entries with the same date, title and first posting amount are duplicates.
pub fn dedup_by_title_and_amount(statements: &mut [Statement<'_>], tolerance_days: i64) {
    let options = DedupOptions::builder().tolerance_days(tolerance_days).build();
    dedup(
        statements,
        |entry, offset| {
            let narration = entry.transaction()?.narration.clone();
            Some((shifted_date(entry, offset)?, first_units(entry)?.clone(), narration))
        },
        |_, _| false,
        &options,
    );
}

/// Entries with the same date and first posting amount are merged into the first of them.
pub fn merge_same_date_amount(statements: &mut [Statement<'_>], tolerance_days: i64) {
    let options = DedupOptions::builder()
        .tolerance_days(tolerance_days)
        .merge_duplicates(true)
        .build();
    dedup(
        statements,
        |entry, offset| Some((shifted_date(entry, offset)?, first_units(entry)?.clone())),
        |_, _| false,
        &options,
    );
}

/// A transfer between two banks shows up once in each bank's statement, with the same
/// postings in a different order.  Entries whose first postings are identical are separate
/// transfers rather than two views of one.
pub fn dedup_bank_transfer(statements: &mut [Statement<'_>], tolerance_days: i64) {
    let options = DedupOptions::builder()
        .tolerance_days(tolerance_days)
        .ignore_same_source(false)
        .statement_kinds(vec![StatementKind::Bank])
        .build();
    dedup(
        statements,
        |entry, offset| {
            let postings: BTreeSet<(Account<'_>, IncompleteAmount<'_>)> = entry
                .transaction()?
                .postings
                .iter()
                .map(|p| (p.account.clone(), p.units.clone()))
                .collect();
            Some((shifted_date(entry, offset)?, postings))
        },
        |lhs, rhs| first_posting(lhs) == first_posting(rhs),
        &options,
    );
}
