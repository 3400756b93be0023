//! Dense re-identification of scheduled records
//!
//! Assigns `#1..#N` in scheduled order and rewrites every literal
//! reference occurrence through the mapping. Bodies stay byte-equal
//! apart from the substituted identifiers.

use std::collections::HashMap;
use thiserror::Error;

use super::record::{Record, RecordId, REF_RE};

#[derive(Debug, Error, PartialEq)]
pub enum RenumberError {
    /// A reference with no assigned mapping. Unreachable when the
    /// graph was built from the same records; hitting it means the
    /// input references an identifier that is never defined.
    #[error("Reference #{0} has no assigned mapping")]
    DanglingReference(String),
}

/// Rewrites the given records with identifiers 1..=N in order.
///
/// Returns the new block texts; the records themselves are untouched.
pub fn renumber(records: &[&Record]) -> Result<Vec<String>, RenumberError> {
    let mapping: HashMap<RecordId, RecordId> = records
        .iter()
        .enumerate()
        .map(|(i, rec)| (rec.id, i as RecordId + 1))
        .collect();

    records
        .iter()
        .map(|rec| rewrite(&rec.body, &mapping))
        .collect()
}

/// Replaces every `#digits` token in `body` through the mapping
fn rewrite(body: &str, mapping: &HashMap<RecordId, RecordId>) -> Result<String, RenumberError> {
    let mut out = String::with_capacity(body.len());
    let mut last = 0;

    for m in REF_RE.find_iter(body) {
        let digits = &m.as_str()[1..];
        let new = digits
            .parse::<RecordId>()
            .ok()
            .and_then(|old| mapping.get(&old))
            .ok_or_else(|| RenumberError::DanglingReference(digits.to_string()))?;

        out.push_str(&body[last..m.start()]);
        out.push('#');
        out.push_str(&new.to_string());
        last = m.end();
    }

    out.push_str(&body[last..]);
    Ok(out)
}
