//! Sorting and rollups over token-usage records.
//!
//! Everything here is a pure function of its inputs: sorting returns a new
//! `Vec` and leaves the caller's rows alone, and rollups are recomputed from
//! the raw records every time they are asked for.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::error::CoreError;
use crate::models::token_count::TokenTotals;
use crate::models::usage::{AggregateRow, Grouping, UsageField, UsageRecord};

// ── Sort state ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// Orient an ascending comparison. Reversing `Equal` is still `Equal`,
    /// so a stable sort keeps ties in input order in both directions.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(CoreError::InvalidDirection(other.to_string())),
        }
    }
}

/// Sort field and direction of one table. `field: None` means no sort has
/// been applied and rows keep their fetch order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub field: Option<UsageField>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(field: UsageField, direction: SortDirection) -> Self {
        Self {
            field: Some(field),
            direction,
        }
    }

    /// Column-header click: the same field flips direction, a different
    /// field starts ascending.
    pub fn toggle(self, requested: UsageField) -> Self {
        if self.field == Some(requested) {
            Self {
                field: self.field,
                direction: self.direction.flipped(),
            }
        } else {
            Self::new(requested, SortDirection::Asc)
        }
    }
}

/// Parses `field` or `field:asc` / `field:desc`.
impl FromStr for SortState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match s.split_once(':') {
            Some((field, direction)) => (field, direction.trim().parse()?),
            None => (s, SortDirection::Asc),
        };
        Ok(Self::new(field.trim().parse()?, direction))
    }
}

impl fmt::Display for SortState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            Some(field) => write!(f, "{field}:{}", self.direction.as_str()),
            None => f.write_str("unsorted"),
        }
    }
}

// ── Sorting ──────────────────────────────────────────────────────────────────

/// A field value as seen by the comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Count(u64),
}

/// A row of one of the usage tables.
pub trait UsageRow {
    /// Value of `field` on this row, or `None` when the row has no such
    /// column (e.g. `username` on a per-feature rollup).
    fn field_value(&self, field: UsageField) -> Option<FieldValue<'_>>;
}

impl UsageRow for UsageRecord {
    fn field_value(&self, field: UsageField) -> Option<FieldValue<'_>> {
        Some(match field {
            UsageField::Username => FieldValue::Text(&self.username),
            UsageField::Feature => FieldValue::Text(&self.feature),
            UsageField::InputTokens => FieldValue::Count(self.input_tokens),
            UsageField::OutputTokens => FieldValue::Count(self.output_tokens),
            UsageField::TotalTokens => FieldValue::Count(self.total_tokens),
            UsageField::Timestamp => FieldValue::Text(&self.timestamp),
        })
    }
}

impl UsageRow for AggregateRow {
    fn field_value(&self, field: UsageField) -> Option<FieldValue<'_>> {
        match field {
            UsageField::InputTokens => Some(FieldValue::Count(self.tokens.input_tokens)),
            UsageField::OutputTokens => Some(FieldValue::Count(self.tokens.output_tokens)),
            UsageField::TotalTokens => Some(FieldValue::Count(self.tokens.total_tokens)),
            key if key == self.grouping.field() => Some(FieldValue::Text(&self.key)),
            _ => None,
        }
    }
}

/// Return `rows` ordered by `state`, leaving the input untouched.
///
/// With no sort field the rows come back in their original order. The sort
/// is stable: rows with equal keys keep their relative input order whichever
/// direction is requested.
pub fn sort_rows<R: UsageRow + Clone>(rows: &[R], state: SortState) -> Vec<R> {
    let mut sorted = rows.to_vec();
    if let Some(field) = state.field {
        sorted.sort_by(|a, b| {
            state
                .direction
                .apply(compare_values(a.field_value(field), b.field_value(field)))
        });
    }
    sorted
}

fn compare_values(a: Option<FieldValue<'_>>, b: Option<FieldValue<'_>>) -> Ordering {
    match (a, b) {
        (Some(FieldValue::Text(a)), Some(FieldValue::Text(b))) => collate(a, b),
        (Some(FieldValue::Count(a)), Some(FieldValue::Count(b))) => a.cmp(&b),
        (Some(FieldValue::Count(_)), Some(FieldValue::Text(_))) => Ordering::Less,
        (Some(FieldValue::Text(_)), Some(FieldValue::Count(_))) => Ordering::Greater,
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
    }
}

/// Locale-style text comparison.
///
/// Levels, in order: base characters ignoring case and accents, then
/// accents, then case (lowercase first), then raw code points so that
/// distinct strings never compare equal. At the first level whitespace and
/// punctuation sort before digits, and digits before letters.
pub fn collate(a: &str, b: &str) -> Ordering {
    base_keys(a)
        .cmp(base_keys(b))
        .then_with(|| accented_letters(a).cmp(accented_letters(b)))
        .then_with(|| case_bits(a).cmp(case_bits(b)))
        .then_with(|| a.cmp(b))
}

fn base_keys(s: &str) -> impl Iterator<Item = (CharClass, char)> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| (CharClass::of(c), c))
}

/// ASCII punctuation that collates with the symbols rather than the
/// punctuation.
const ASCII_SYMBOLS: &str = "$+<=>^`|~";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CharClass {
    Space,
    Punctuation,
    Symbol,
    Digit,
    Letter,
}

impl CharClass {
    fn of(c: char) -> Self {
        if c.is_whitespace() {
            CharClass::Space
        } else if c.is_numeric() {
            CharClass::Digit
        } else if c.is_alphabetic() {
            CharClass::Letter
        } else if c.is_ascii_punctuation() && !ASCII_SYMBOLS.contains(c) {
            CharClass::Punctuation
        } else {
            CharClass::Symbol
        }
    }
}

fn accented_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd().flat_map(char::to_lowercase)
}

fn case_bits(s: &str) -> impl Iterator<Item = bool> + '_ {
    s.chars().map(char::is_uppercase)
}

// ── Rollups ──────────────────────────────────────────────────────────────────

/// Sum token counts per key, in first-occurrence order of each key.
///
/// Keys are compared by exact equality. Empty input yields an empty `Vec`.
pub fn group_totals<K, F>(records: &[UsageRecord], mut key_fn: F) -> Vec<(K, TokenTotals)>
where
    K: Eq + Hash + Clone,
    F: FnMut(&UsageRecord) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, TokenTotals)> = Vec::new();

    for record in records {
        let key = key_fn(record);
        let slot = match slots.entry(key) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                groups.push((entry.key().clone(), TokenTotals::default()));
                *entry.insert(groups.len() - 1)
            }
        };
        groups[slot].1 += record.tokens();
    }

    groups
}

/// Per-feature or per-user rollup of `records`.
pub fn aggregate_by(records: &[UsageRecord], grouping: Grouping) -> Vec<AggregateRow> {
    group_totals(records, |record| grouping.key_of(record).to_string())
        .into_iter()
        .map(|(key, tokens)| AggregateRow {
            grouping,
            key,
            tokens,
        })
        .collect()
}

/// Sum of every record's counts. Empty input yields zeros.
pub fn total_usage(records: &[UsageRecord]) -> TokenTotals {
    records.iter().map(UsageRecord::tokens).sum()
}
