//! Record model for STEP data-section entities
//!
//! A record is one `#id = KEYWORD(...);` block from the DATA section.
//! The body is kept verbatim; only the identifier, the entity keyword
//! and the outgoing references are extracted from it.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use thiserror::Error;

/// Identifier of a record within a single file (`#42` -> 42).
pub type RecordId = u64;

/// Every `#<digits>` reference token in a record body.
///
/// Shared with the renumberer so extraction and rewriting can never
/// disagree on what counts as a reference.
pub(crate) static REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#(\d+)\b").expect("reference pattern is valid"));

/// Leading `#<digits> =` assignment that opens every record.
static HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*#(\d+)\s*=").expect("header pattern is valid"));

/// First uppercase keyword after the `=`, e.g. `CARTESIAN_POINT`.
static KIND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"=\s*([A-Z0-9_]+)\s*[(\s]").expect("kind pattern is valid"));

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("Malformed record header: {0}...")]
    MalformedHeader(String),
}

/// One entity record from the DATA section
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Identifier from the record's own `#id =` assignment
    pub id: RecordId,

    /// Entity keyword, or empty when no keyword was recognized
    pub kind: String,

    /// Verbatim block text, internal newlines included
    pub body: String,

    /// 0-based position of the block in the source data section
    pub origin: usize,
}

impl Record {
    /// Parses a raw record block.
    ///
    /// Fails when the block does not open with a `#<digits> =`
    /// assignment. A missing entity keyword is not an error; the
    /// record simply gets the empty kind.
    pub fn parse(block: &str, origin: usize) -> Result<Self, RecordError> {
        let id = HEADER_RE
            .captures(block)
            .and_then(|caps| caps[1].parse().ok())
            .ok_or_else(|| RecordError::MalformedHeader(snippet(block)))?;

        let kind = KIND_RE
            .captures(block)
            .map(|caps| caps[1].to_string())
            .unwrap_or_default();

        Ok(Self {
            id,
            kind,
            body: block.to_string(),
            origin,
        })
    }

    /// Distinct identifiers this record references.
    ///
    /// Self-references are dropped; duplicate occurrences collapse.
    /// Every literal occurrence still gets rewritten on renumbering.
    pub fn references(&self) -> BTreeSet<RecordId> {
        REF_RE
            .captures_iter(&self.body)
            .filter_map(|caps| caps[1].parse::<RecordId>().ok())
            .filter(|&rid| rid != self.id)
            .collect()
    }
}

/// First line of a block, truncated for error messages
fn snippet(block: &str) -> String {
    block.lines().next().unwrap_or_default().chars().take(60).collect()
}
