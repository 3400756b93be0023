//! STEP Part 21 file regions
//!
//! A file is header lines up to and including `DATA;`, the record
//! blocks of the data section, and footer lines from `ENDSEC;` on.
//! Lines keep their terminators throughout so reassembly is
//! byte-faithful; nothing outside the data section is ever rewritten.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

/// Opens the data section (the line itself belongs to the header)
const DATA_START: &str = "DATA;";

/// Closes the data section (the line itself belongs to the footer)
const DATA_END: &str = "ENDSEC;";

#[derive(Debug, Error, PartialEq)]
pub enum DocumentError {
    #[error("Missing ENDSEC; terminator for the DATA section")]
    MissingDataEnd,

    #[error("Unterminated record before ENDSEC;")]
    UnterminatedRecord,
}

/// One STEP file split into its three regions
#[derive(Debug, PartialEq)]
pub struct Document {
    /// Lines up to and including the `DATA;` sentinel
    pub header: Vec<String>,

    /// Raw record blocks in source order; a block may span lines
    pub blocks: Vec<String>,

    /// Lines from the `ENDSEC;` sentinel to end of file
    pub footer: Vec<String>,
}

impl Document {
    /// Splits file content into header, record blocks and footer
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        enum State {
            Header,
            Data,
            Footer,
        }

        let mut state = State::Header;
        let mut header = Vec::new();
        let mut data = Vec::new();
        let mut footer = Vec::new();

        for line in text.split_inclusive('\n') {
            match state {
                State::Header => {
                    header.push(line.to_string());
                    if is_sentinel(line, DATA_START) {
                        state = State::Data;
                    }
                }
                State::Data => {
                    if is_sentinel(line, DATA_END) {
                        footer.push(line.to_string());
                        state = State::Footer;
                    } else {
                        data.push(line);
                    }
                }
                State::Footer => footer.push(line.to_string()),
            }
        }

        if !matches!(state, State::Footer) {
            return Err(DocumentError::MissingDataEnd);
        }

        Ok(Self {
            header,
            blocks: collect_blocks(&data)?,
            footer,
        })
    }

    /// Reads and splits a file, decoding invalid UTF-8 lossily
    pub fn read(path: &Path) -> Result<Self> {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let text = String::from_utf8_lossy(&bytes);

        Self::parse(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Reassembles file content around replacement record blocks
    pub fn assemble(&self, blocks: &[String]) -> String {
        let mut out = String::new();
        for line in &self.header {
            out.push_str(line);
        }
        for block in blocks {
            out.push_str(block);
        }
        for line in &self.footer {
            out.push_str(line);
        }
        out
    }
}

/// Groups data lines into `;`-terminated record blocks
fn collect_blocks(lines: &[&str]) -> Result<Vec<String>, DocumentError> {
    let mut blocks = Vec::new();
    let mut pending = String::new();

    for line in lines {
        pending.push_str(line);
        if line.contains(';') {
            blocks.push(std::mem::take(&mut pending));
        }
    }

    if !pending.is_empty() {
        return Err(DocumentError::UnterminatedRecord);
    }

    Ok(blocks)
}

/// Sentinel match: trimmed, case-folded line equality
fn is_sentinel(line: &str, sentinel: &str) -> bool {
    line.trim().eq_ignore_ascii_case(sentinel)
}
