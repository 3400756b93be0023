//! stepsort - Dependency-aware reordering for STEP CAD files
//!
//! STEP (ISO 10303-21) files define geometry as a flat list of
//! numbered records that reference each other freely, forward
//! references included. stepsort rewrites the DATA section so every
//! record appears before its first use, optionally clusters records
//! of the same entity kind, and optionally renumbers everything to a
//! dense `#1..#N` sequence. Header and footer bytes pass through
//! untouched.

pub mod cli;
pub mod domain;
pub mod storage;

pub use domain::{DependencyGraph, GroupMode, Record, RecordId, Schedule};
pub use storage::Document;
