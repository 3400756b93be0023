//! Priority-driven topological scheduling of records
//!
//! Kahn's algorithm over the dependency graph, with the ready set
//! shaped by the grouping policy. All three policies share the same
//! traversal skeleton; only the ready-set structure differs.
//!
//! Tie-breaking is total: ready candidates compare by dependency
//! depth, then (soft mode) a continuation penalty, then original file
//! position. The same input therefore always yields the same order.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use super::graph::DependencyGraph;
use super::record::{Record, RecordId};

/// How aggressively same-kind records are clustered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum GroupMode {
    /// Pure dependency order, no clustering
    None,
    /// Prefer continuing the current kind when a candidate is ready
    Soft,
    /// Drain each kind completely before switching to the next
    #[default]
    Strict,
}

/// Result of scheduling one file's records
#[derive(Debug)]
pub struct Schedule {
    /// Every record id exactly once: the dependency-valid order,
    /// followed by the leftovers in original file order
    pub order: Vec<RecordId>,

    /// Records whose dependencies never fully resolved: cycle members
    /// and records stranded behind undefined references
    pub leftovers: Vec<RecordId>,
}

impl Schedule {
    /// Returns true if the input contained unresolved cycles
    pub fn has_cycles(&self) -> bool {
        !self.leftovers.is_empty()
    }
}

/// Ready set for the Kahn traversal, one variant per policy.
///
/// Heap keys are `Reverse`-wrapped so BinaryHeap pops the minimum.
enum ReadySet<'a> {
    /// `none` and `soft`: a single heap keyed
    /// (depth, continuation penalty, origin)
    Single {
        heap: BinaryHeap<Reverse<(usize, u8, usize, RecordId)>>,
        bias: bool,
        last_kind: Option<&'a str>,
    },
    /// `strict`: one heap per kind keyed (depth, origin); the current
    /// kind is drained before the next one is picked
    PerKind {
        heaps: HashMap<&'a str, BinaryHeap<Reverse<(usize, usize, RecordId)>>>,
        current: Option<&'a str>,
    },
}

impl<'a> ReadySet<'a> {
    fn new(mode: GroupMode) -> Self {
        match mode {
            GroupMode::Strict => ReadySet::PerKind {
                heaps: HashMap::new(),
                current: None,
            },
            _ => ReadySet::Single {
                heap: BinaryHeap::new(),
                bias: mode == GroupMode::Soft,
                last_kind: None,
            },
        }
    }

    fn push(&mut self, rec: &'a Record, depth: usize) {
        match self {
            ReadySet::Single {
                heap,
                bias,
                last_kind,
            } => {
                // Penalty is judged against the kind current at the
                // moment the record becomes ready
                let same = *bias && *last_kind == Some(rec.kind.as_str());
                let penalty = if same { 0 } else { 1 };
                heap.push(Reverse((depth, penalty, rec.origin, rec.id)));
            }
            ReadySet::PerKind { heaps, .. } => {
                heaps
                    .entry(rec.kind.as_str())
                    .or_default()
                    .push(Reverse((depth, rec.origin, rec.id)));
            }
        }
    }

    fn pop(&mut self) -> Option<RecordId> {
        match self {
            ReadySet::Single { heap, .. } => heap.pop().map(|Reverse((_, _, _, id))| id),
            ReadySet::PerKind { heaps, current } => {
                let kind = match current.filter(|k| heaps.contains_key(*k)) {
                    Some(kind) => kind,
                    None => {
                        // Switch to the kind whose best candidate has
                        // the smallest (depth, origin)
                        let kind = heaps
                            .iter()
                            .filter_map(|(k, h)| {
                                h.peek().map(|Reverse((d, o, _))| ((*d, *o), *k))
                            })
                            .min()
                            .map(|(_, k)| k)?;
                        *current = Some(kind);
                        kind
                    }
                };

                let heap = heaps.get_mut(kind)?;
                let Reverse((_, _, id)) = heap.pop()?;
                if heap.is_empty() {
                    heaps.remove(kind);
                }
                Some(id)
            }
        }
    }

    fn emitted(&mut self, kind: &'a str) {
        if let ReadySet::Single { last_kind, .. } = self {
            *last_kind = Some(kind);
        }
    }
}

/// Orders records so that dependencies precede dependents.
///
/// Records whose unresolved count never reaches zero are appended in
/// ascending origin order and reported in `leftovers`; callers should
/// surface them as a cycle warning, not a failure.
pub fn schedule(records: &[Record], graph: &DependencyGraph, mode: GroupMode) -> Schedule {
    let depths = graph.depths();
    let by_id: HashMap<RecordId, &Record> = records.iter().map(|r| (r.id, r)).collect();
    let mut unresolved: HashMap<RecordId, usize> = records
        .iter()
        .map(|r| (r.id, graph.unresolved_count(r.id)))
        .collect();

    let mut ready = ReadySet::new(mode);
    for rec in records {
        if unresolved[&rec.id] == 0 {
            ready.push(rec, depths.get(&rec.id).copied().unwrap_or(0));
        }
    }

    let mut order = Vec::with_capacity(records.len());
    while let Some(id) = ready.pop() {
        order.push(id);

        if let Some(&rec) = by_id.get(&id) {
            ready.emitted(rec.kind.as_str());
        }

        for dependent in graph.dependents(id) {
            if let Some(count) = unresolved.get_mut(&dependent) {
                *count -= 1;
                if *count == 0 {
                    if let Some(&rec) = by_id.get(&dependent) {
                        ready.push(rec, depths.get(&dependent).copied().unwrap_or(0));
                    }
                }
            }
        }
    }

    // Cycle members and phantom-blocked records, original file order
    let leftovers: Vec<RecordId> = records
        .iter()
        .filter(|r| unresolved.get(&r.id).is_some_and(|&c| c > 0))
        .map(|r| r.id)
        .collect();

    order.extend(&leftovers);
    Schedule { order, leftovers }
}
