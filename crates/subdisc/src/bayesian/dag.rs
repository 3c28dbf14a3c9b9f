//! Directed acyclic graph over the target variables.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SubdiscError};

/// Largest number of nodes a [`Dag`] can hold.
pub const MAX_NODES: usize = 64;

/// A Bayesian network structure, stored as one parent bitmask per node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dag {
    names: Vec<String>,
    parents: Vec<u64>,
}

impl Dag {
    /// Graph without edges.
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.len() > MAX_NODES {
            return Err(SubdiscError::InvalidConfig(format!(
                "a network can have at most {} nodes, got {}",
                MAX_NODES,
                names.len()
            )));
        }
        let parents = vec![0; names.len()];
        Ok(Self { names, parents })
    }

    pub fn size(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn parent_mask(&self, node: usize) -> u64 {
        self.parents[node]
    }

    pub fn parents(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        let mask = self.parents[node];
        (0..self.size()).filter(move |&p| mask & (1 << p) != 0)
    }

    pub fn parent_count(&self, node: usize) -> usize {
        self.parents[node].count_ones() as usize
    }

    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.parents[to] & (1 << from) != 0
    }

    /// All edges as `(from, to)`, ordered by target then source.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        (0..self.size())
            .flat_map(|to| self.parents(to).map(move |from| (from, to)))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.parents.iter().map(|m| m.count_ones() as usize).sum()
    }

    /// Whether a directed path leads from `from` to `to`.
    pub fn has_path(&self, from: usize, to: usize) -> bool {
        if from == to {
            return true;
        }
        let mut visited: u64 = 1 << from;
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            for child in 0..self.size() {
                if self.has_edge(node, child) && visited & (1 << child) == 0 {
                    if child == to {
                        return true;
                    }
                    visited |= 1 << child;
                    stack.push(child);
                }
            }
        }
        false
    }

    /// Add `from -> to` unless it would create a cycle. Returns whether it was added.
    pub fn add_edge(&mut self, from: usize, to: usize) -> bool {
        if from == to || self.has_edge(from, to) || self.has_path(to, from) {
            return false;
        }
        self.parents[to] |= 1 << from;
        true
    }

    pub fn remove_edge(&mut self, from: usize, to: usize) -> bool {
        let present = self.has_edge(from, to);
        self.parents[to] &= !(1 << from);
        present
    }

    /// Turn `from -> to` into `to -> from` unless that would create a cycle.
    pub fn reverse_edge(&mut self, from: usize, to: usize) -> bool {
        if !self.remove_edge(from, to) {
            return false;
        }
        if self.has_path(from, to) {
            self.parents[to] |= 1 << from;
            return false;
        }
        self.parents[from] |= 1 << to;
        true
    }

    /// Number of node pairs whose connection differs between the graphs.
    ///
    /// Each unordered pair is in one of three states: unconnected, or an
    /// edge in either direction. Both graphs must have the same size.
    pub fn edit_distance(&self, other: &Dag) -> usize {
        let n = self.size().min(other.size());
        let mut distance = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                let mine = (self.has_edge(i, j), self.has_edge(j, i));
                let theirs = (other.has_edge(i, j), other.has_edge(j, i));
                if mine != theirs {
                    distance += 1;
                }
            }
        }
        distance
    }

    /// Edit distance divided by the number of node pairs.
    pub fn normalized_edit_distance(&self, other: &Dag) -> f64 {
        let n = self.size().min(other.size());
        if n < 2 {
            return 0.0;
        }
        self.edit_distance(other) as f64 / (n * (n - 1) / 2) as f64
    }
}

impl fmt::Display for Dag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let edges = self.edges();
        if edges.is_empty() {
            return f.write_str("(no edges)");
        }
        for (i, (from, to)) in edges.into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} -> {}", self.names[from], self.names[to])?;
        }
        Ok(())
    }
}
