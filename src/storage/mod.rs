//! # Storage Layer
//!
//! On-disk handling of STEP Part 21 files.
//!
//! The exchange format is foreign and must round-trip byte-exactly:
//! header and footer regions are carried verbatim, record blocks are
//! carried verbatim apart from identifier renumbering, and no line is
//! ever reflowed. Everything here works on terminator-preserving
//! lines for that reason.
//!
//! ## Key Types
//!
//! - [`Document`] - One file split into header, record blocks, footer
//! - [`DocumentError`] - Sectioning and tokenizing failures

mod document;

pub use document::{Document, DocumentError};
