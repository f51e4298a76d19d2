//! Symmetric adjacency state for skeleton search.
//!
//! [`Adjacency`] records which variables are still possibly adjacent. It is
//! symmetric at every observable point: edges are only ever inserted or
//! removed as whole pairs, so `y ∈ adj(x) ⇔ x ∈ adj(y)` cannot be broken
//! from outside.
//!
//! Neighbor sets are `BTreeSet<VarId>`, which keeps neighbor iteration in
//! input order. That order is part of the search's determinism contract.

use std::collections::{BTreeMap, BTreeSet};

use crate::search::errors::SearchError;
use crate::search::variable::{VarId, Variable, VariableIndex};

/// Undirected "possibly adjacent" relation over a fixed set of variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjacency {
    index: VariableIndex,
    neighbors: Vec<BTreeSet<VarId>>,
}

impl Adjacency {
    /// An adjacency over `vars` with no edges.
    pub fn empty(vars: &[Variable]) -> Result<Self, SearchError> {
        let index = VariableIndex::new(vars)?;
        let neighbors = vec![BTreeSet::new(); index.len()];
        Ok(Self { index, neighbors })
    }

    /// The complete graph over `vars`.
    pub fn complete(vars: &[Variable]) -> Result<Self, SearchError> {
        let mut adj = Self::empty(vars)?;
        let n = adj.index.len() as u32;
        for (i, set) in adj.neighbors.iter_mut().enumerate() {
            set.extend((0..n).filter(|&j| j as usize != i).map(VarId));
        }
        Ok(adj)
    }

    /// An adjacency over `vars` holding exactly the listed undirected edges.
    ///
    /// Fails on self-loops and on endpoints outside `vars`. Listing an edge
    /// twice, in either orientation, is harmless.
    pub fn from_edges<'a, I>(vars: &[Variable], edges: I) -> Result<Self, SearchError>
    where
        I: IntoIterator<Item = (&'a Variable, &'a Variable)>,
    {
        let mut adj = Self::empty(vars)?;
        for (x, y) in edges {
            let a = adj.index.require(x)?;
            let b = adj.index.require(y)?;
            if a == b {
                return Err(SearchError::InvalidAdjacency(format!(
                    "self-loop on '{}'",
                    x
                )));
            }
            adj.insert_ids(a, b);
        }
        Ok(adj)
    }

    /// An adjacency built from explicit neighbor lists.
    ///
    /// Unlike [`from_edges`](Self::from_edges) the lists must already be
    /// symmetric; an asymmetric entry is reported rather than repaired.
    pub fn from_neighbor_map(
        vars: &[Variable],
        map: &BTreeMap<Variable, BTreeSet<Variable>>,
    ) -> Result<Self, SearchError> {
        let mut adj = Self::empty(vars)?;
        for (x, ys) in map {
            let a = adj.index.require(x)?;
            for y in ys {
                let b = adj.index.require(y)?;
                if a == b {
                    return Err(SearchError::InvalidAdjacency(format!(
                        "self-loop on '{}'",
                        x
                    )));
                }
                let mirrored = map.get(y).map(|back| back.contains(x)).unwrap_or(false);
                if !mirrored {
                    return Err(SearchError::InvalidAdjacency(format!(
                        "'{}' lists '{}' as a neighbor but not the reverse",
                        x, y
                    )));
                }
                adj.insert_ids(a, b);
            }
        }
        Ok(adj)
    }

    /// Variables in input order.
    pub fn variables(&self) -> &[Variable] {
        self.index.variables()
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Are `x` and `y` currently adjacent? Unknown variables are never
    /// adjacent to anything.
    pub fn is_adjacent(&self, x: &Variable, y: &Variable) -> bool {
        match (self.index.id(x), self.index.id(y)) {
            (Some(a), Some(b)) => self.is_adjacent_ids(a, b),
            _ => false,
        }
    }

    /// Neighbors of `x` in input order (empty for unknown variables).
    pub fn neighbors(&self, x: &Variable) -> Vec<Variable> {
        self.index
            .id(x)
            .map(|a| {
                self.neighbors[a.index()]
                    .iter()
                    .map(|&b| self.index.var(b).clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of neighbors of `x`.
    pub fn degree(&self, x: &Variable) -> usize {
        self.index
            .id(x)
            .map(|a| self.neighbors[a.index()].len())
            .unwrap_or(0)
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(BTreeSet::len).sum::<usize>() / 2
    }

    /// All undirected edges, each once, ordered by the input position of the
    /// first endpoint and then of the second.
    pub fn edges(&self) -> Vec<(Variable, Variable)> {
        let mut out = Vec::with_capacity(self.edge_count());
        for a in self.index.ids() {
            for &b in self.neighbors[a.index()].range(VarId(a.0 + 1)..) {
                out.push((self.index.var(a).clone(), self.index.var(b).clone()));
            }
        }
        out
    }

    /// Removes the undirected edge `x`-`y`. Returns whether it was present.
    pub fn remove_edge(&mut self, x: &Variable, y: &Variable) -> Result<bool, SearchError> {
        let a = self.index.require(x)?;
        let b = self.index.require(y)?;
        Ok(self.remove_ids(a, b))
    }

    /// The largest `|adj(x)| - 1` over all variables, floored at 0.
    ///
    /// A depth-`d` pass can only remove further edges while some variable
    /// has more than `d` other neighbors to condition on.
    pub fn free_degree(&self) -> usize {
        self.neighbors
            .iter()
            .map(|set| set.len().saturating_sub(1))
            .max()
            .unwrap_or(0)
    }

    /// Largest neighbor count over all variables.
    pub fn max_degree(&self) -> usize {
        self.neighbors.iter().map(BTreeSet::len).max().unwrap_or(0)
    }

    /// Checks the symmetry invariant. Always true for values built through
    /// this type's API; exposed for property tests.
    pub fn is_symmetric(&self) -> bool {
        self.neighbors.iter().enumerate().all(|(a, set)| {
            set.iter()
                .all(|b| self.neighbors[b.index()].contains(&VarId(a as u32)))
        })
    }

    /// True if every edge of `self` is also an edge of `other` and both
    /// range over the same variables.
    pub fn is_subgraph_of(&self, other: &Adjacency) -> bool {
        self.index == other.index
            && self
                .neighbors
                .iter()
                .zip(&other.neighbors)
                .all(|(mine, theirs)| mine.is_subset(theirs))
    }

    pub(crate) fn variable_index(&self) -> &VariableIndex {
        &self.index
    }

    pub(crate) fn neighbor_ids(&self, a: VarId) -> &BTreeSet<VarId> {
        &self.neighbors[a.index()]
    }

    pub(crate) fn is_adjacent_ids(&self, a: VarId, b: VarId) -> bool {
        self.neighbors[a.index()].contains(&b)
    }

    pub(crate) fn insert_ids(&mut self, a: VarId, b: VarId) {
        self.neighbors[a.index()].insert(b);
        self.neighbors[b.index()].insert(a);
    }

    /// Atomic pairwise removal.
    pub(crate) fn remove_ids(&mut self, a: VarId, b: VarId) -> bool {
        let removed = self.neighbors[a.index()].remove(&b);
        self.neighbors[b.index()].remove(&a);
        removed
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Adjacency {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut s = serializer.serialize_struct("Adjacency", 2)?;
        s.serialize_field("variables", self.variables())?;
        s.serialize_field("edges", &self.edges())?;
        s.end()
    }
}
