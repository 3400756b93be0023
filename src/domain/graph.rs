//! Dependency graph over the records of one file
//!
//! Edges run dependency -> dependent, so Kahn seeding and release use
//! petgraph's directed neighbor queries directly. Uses petgraph for
//! graph operations.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

use super::record::{Record, RecordId};

/// Dependency graph of one file's records
///
/// A reference to an identifier with no defining record still gets a
/// node (a phantom). Phantoms are never scheduled, which strands
/// their dependents in the leftover set exactly like cycle members.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// The underlying directed graph
    graph: DiGraph<RecordId, ()>,

    /// Map from RecordId to node index
    node_map: HashMap<RecordId, NodeIndex>,
}

impl DependencyGraph {
    /// Builds the graph from parsed records
    pub fn from_records(records: &[Record]) -> Self {
        let mut graph = Self::default();

        // First pass: one node per defined record
        for rec in records {
            graph.add_node(rec.id);
        }

        // Second pass: edges, creating phantom nodes as needed
        for rec in records {
            for dep in rec.references() {
                graph.add_node(dep);
                graph.add_edge(dep, rec.id);
            }
        }

        graph
    }

    fn add_node(&mut self, id: RecordId) {
        if !self.node_map.contains_key(&id) {
            let idx = self.graph.add_node(id);
            self.node_map.insert(id, idx);
        }
    }

    /// Adds a dependency edge: `dependent` depends on `dep`
    fn add_edge(&mut self, dep: RecordId, dependent: RecordId) {
        if let (Some(&a), Some(&b)) = (self.node_map.get(&dep), self.node_map.get(&dependent)) {
            // update_edge collapses duplicate references to one edge
            self.graph.update_edge(a, b, ());
        }
    }

    /// Returns the records `id` depends on
    pub fn dependencies(&self, id: RecordId) -> Vec<RecordId> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Returns the records that depend on `id`
    pub fn dependents(&self, id: RecordId) -> Vec<RecordId> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: RecordId, dir: Direction) -> Vec<RecordId> {
        let idx = match self.node_map.get(&id) {
            Some(idx) => *idx,
            None => return vec![],
        };

        self.graph
            .neighbors_directed(idx, dir)
            .filter_map(|n| self.graph.node_weight(n).copied())
            .collect()
    }

    /// Number of dependencies `id` is still waiting on at build time
    pub fn unresolved_count(&self, id: RecordId) -> usize {
        self.node_map
            .get(&id)
            .map(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Returns true if the graph contains the record
    pub fn contains(&self, id: RecordId) -> bool {
        self.node_map.contains_key(&id)
    }

    /// Returns the number of nodes, phantoms included
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    /// Longest dependency-chain length per node, leaves at 0.
    ///
    /// Iterative DFS with unvisited/in-progress/done marks: a
    /// dependency that is still in progress is on the current path,
    /// i.e. part of a cycle, and contributes 0 instead of recursing
    /// forever.
    pub fn depths(&self) -> HashMap<RecordId, usize> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            InProgress,
            Done,
        }

        let mut marks: HashMap<NodeIndex, Mark> = HashMap::new();
        let mut depth: HashMap<NodeIndex, usize> = HashMap::new();

        for &start in self.node_map.values() {
            if marks.contains_key(&start) {
                continue;
            }

            let mut stack = vec![start];
            while let Some(&node) = stack.last() {
                match marks.get(&node).copied() {
                    None => {
                        marks.insert(node, Mark::InProgress);
                        for dep in self.graph.neighbors_directed(node, Direction::Incoming) {
                            if !marks.contains_key(&dep) {
                                stack.push(dep);
                            }
                        }
                    }
                    Some(Mark::InProgress) => {
                        let max_dep = self
                            .graph
                            .neighbors_directed(node, Direction::Incoming)
                            .map(|dep| depth.get(&dep).copied().unwrap_or(0))
                            .max();
                        depth.insert(node, max_dep.map(|d| d + 1).unwrap_or(0));
                        marks.insert(node, Mark::Done);
                        stack.pop();
                    }
                    Some(Mark::Done) => {
                        stack.pop();
                    }
                }
            }
        }

        depth
            .into_iter()
            .filter_map(|(idx, d)| self.graph.node_weight(idx).map(|&id| (id, d)))
            .collect()
    }
}
