use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

pub const FIELD_SEPARATOR: char = '\t';

/// Number of fields a record is read from: two vertices and the payload.
pub const RECORD_FIELDS: usize = 3;

/// What to do with a record carrying more than [`RECORD_FIELDS`] fields.
#[derive(clap::ValueEnum, Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ExtraColumns {
    /// Fail like any other malformed record.
    #[default]
    Reject,
    /// Keep the first three fields and discard the rest.
    Drop,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedRecord {
    #[error("expected {expected} tab-separated fields, found {0}", expected = RECORD_FIELDS)]
    TooFewFields(usize),
    #[error(
        "expected {expected} tab-separated fields, found {0} (use --extra-columns drop to discard the rest)",
        expected = RECORD_FIELDS
    )]
    TooManyFields(usize),
}

/// An undirected edge with its vertices in lexicographic order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalEdge {
    low: String,
    high: String,
    payload: String,
}

impl CanonicalEdge {
    pub fn new(a: &str, b: &str, payload: &str) -> CanonicalEdge {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        CanonicalEdge {
            low: low.to_owned(),
            high: high.to_owned(),
            payload: payload.to_owned(),
        }
    }

    /// Parses one record whose line terminator has already been removed.
    pub fn parse(line: &str, extra: ExtraColumns) -> Result<CanonicalEdge, MalformedRecord> {
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        if fields.len() < RECORD_FIELDS {
            return Err(MalformedRecord::TooFewFields(fields.len()));
        }
        if fields.len() > RECORD_FIELDS && extra == ExtraColumns::Reject {
            return Err(MalformedRecord::TooManyFields(fields.len()));
        }
        Ok(CanonicalEdge::new(fields[0], fields[1], fields[2]))
    }

    /// The vertex pair, smaller identifier first.
    pub fn vertices(&self) -> (&str, &str) {
        (&self.low, &self.high)
    }

    /// Everything in the third field, taken verbatim.
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

impl fmt::Display for CanonicalEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.low,
            self.high,
            self.payload,
            sep = FIELD_SEPARATOR
        )
    }
}

/// Unique canonical edges, keyed and ordered by their serialized line.
///
/// Keys keep the trailing newline, so a payload byte below `\n` sorts ahead
/// of the bare payload.
#[derive(Debug, Default)]
pub struct EdgeSet {
    lines: BTreeSet<String>,
}

impl EdgeSet {
    pub fn new() -> EdgeSet {
        EdgeSet {
            lines: BTreeSet::new(),
        }
    }

    /// Returns `false` when the edge was already present.
    pub fn insert(&mut self, edge: &CanonicalEdge) -> bool {
        self.lines.insert(format!("{}\n", edge))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// `true` when no record has been inserted.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Serialized lines in order, without their terminator.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| &line[..line.len() - 1])
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub read: u64,
    pub unique: u64,
}

impl std::ops::AddAssign for NormalizeStats {
    fn add_assign(&mut self, other: NormalizeStats) {
        self.read += other.read;
        self.unique += other.unique;
    }
}
