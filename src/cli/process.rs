//! Per-file pipeline and batch plumbing
//!
//! One file at a time: read, split, parse, build the graph, schedule,
//! optionally renumber, reassemble, write. Output is written only
//! after the whole in-memory transformation succeeded, so a failed
//! file never leaves a partial result behind.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use walkdir::WalkDir;

use crate::domain::{self, DependencyGraph, GroupMode, Record, RecordId};
use crate::storage::Document;

/// Recognized data-file extensions for directory scans
const EXTENSIONS: [&str; 2] = ["step", "stp"];

/// Knobs for one processing run
#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub group: GroupMode,
    pub renumber: bool,
}

/// Outcome of one successfully processed file
#[derive(Debug, Serialize)]
pub struct FileReport {
    /// Number of records in the data section
    pub records: usize,

    /// Identifiers whose dependencies never resolved (cycle members
    /// and references to undefined records); empty on clean files
    pub cycles: Vec<RecordId>,
}

/// Where processed files go
#[derive(Debug)]
pub enum Destination {
    /// Overwrite each source file
    InPlace,

    /// Mirror each file's path relative to the input root under a
    /// target directory
    MirrorInto(PathBuf),

    /// Explicit single-file target
    Single(PathBuf),

    /// Sibling file with `_sorted` appended to the stem
    SortedSibling,
}

impl Destination {
    /// Resolves the output path for one source file
    pub fn resolve(&self, src: &Path, root: &Path) -> Result<PathBuf> {
        match self {
            Destination::InPlace => Ok(src.to_path_buf()),
            Destination::Single(path) => Ok(path.clone()),
            Destination::MirrorInto(dir) => {
                let rel = src.strip_prefix(root).with_context(|| {
                    format!(
                        "{} is not under the input root {}",
                        src.display(),
                        root.display()
                    )
                })?;
                Ok(dir.join(rel))
            }
            Destination::SortedSibling => Ok(sorted_sibling(src)),
        }
    }
}

/// `model.step` -> `model_sorted.step`
fn sorted_sibling(src: &Path) -> PathBuf {
    let stem = src
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let name = match src.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_sorted.{ext}"),
        None => format!("{stem}_sorted"),
    };

    src.with_file_name(name)
}

/// Returns true for the `.step` / `.stp` extensions, any case
pub fn is_step_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| EXTENSIONS.iter().any(|want| ext.eq_ignore_ascii_case(want)))
}

/// All STEP files under `root`, in stable directory order
pub fn discover(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_step_file(p))
        .collect()
}

/// Transforms `src` and writes the result to `dst`
pub fn process_file(src: &Path, dst: &Path, opts: Options) -> Result<FileReport> {
    let doc = Document::read(src)?;

    let records = doc
        .blocks
        .iter()
        .enumerate()
        .map(|(origin, block)| Record::parse(block, origin))
        .collect::<Result<Vec<_>, _>>()?;

    let graph = DependencyGraph::from_records(&records);
    let sched = domain::schedule(&records, &graph, opts.group);

    // The schedule only ever holds ids parsed from these records
    let by_id: HashMap<RecordId, &Record> = records.iter().map(|r| (r.id, r)).collect();
    let ordered: Vec<&Record> = sched
        .order
        .iter()
        .filter_map(|id| by_id.get(id).copied())
        .collect();

    let blocks: Vec<String> = if opts.renumber {
        domain::renumber(&ordered)?
    } else {
        ordered.iter().map(|rec| rec.body.clone()).collect()
    };

    let content = doc.assemble(&blocks);

    if let Some(parent) = dst.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    fs::write(dst, content).with_context(|| format!("Failed to write {}", dst.display()))?;

    Ok(FileReport {
        records: records.len(),
        cycles: sched.leftovers,
    })
}
