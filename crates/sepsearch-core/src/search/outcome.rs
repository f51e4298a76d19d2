//! Search results and diagnostics.

use crate::search::adjacency::Adjacency;
use crate::search::sepset::SepsetMap;
use crate::search::variable::Variable;

/// One committed oracle call.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct IndependenceFact {
    pub x: Variable,
    pub y: Variable,
    pub z: Vec<Variable>,
    pub p_value: f64,
    pub independent: bool,
    /// Depth of the pass that made the call.
    pub depth: usize,
}

/// Counters for a single depth pass.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DepthStats {
    pub depth: usize,
    /// Oracle calls made by the committed pass.
    pub tests: usize,
    /// Oracle calls that returned an error (counted as dependent).
    pub failed_tests: usize,
    /// Adjacent pairs skipped because knowledge requires the edge.
    pub protected_pairs: usize,
    /// Edges removed by this pass.
    pub removed: usize,
    /// Free degree after the pass.
    pub free_degree: usize,
    /// Oracle calls made by the FDR probe pass, if any.
    pub probe_tests: usize,
    /// Alpha installed for the committed pass by the FDR stage.
    pub fdr_cutoff: Option<f64>,
}

/// Counters for a whole search.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SearchStats {
    pub tests: usize,
    pub failed_tests: usize,
    pub protected_pairs: usize,
    pub edges_removed: usize,
    /// Initial edges dropped because knowledge forbids them both ways.
    pub forbidden_removed: usize,
    /// Later, different separating sets discarded for an already separated
    /// pair.
    pub sepset_conflicts: usize,
    /// Per-depth breakdown, in visiting order.
    pub depths: Vec<DepthStats>,
}

impl SearchStats {
    /// Deepest depth a pass ran at, if any pass ran.
    pub fn max_depth_visited(&self) -> Option<usize> {
        self.depths.last().map(|d| d.depth)
    }

    pub(crate) fn absorb(&mut self, depth: &DepthStats) {
        self.tests += depth.tests;
        self.failed_tests += depth.failed_tests;
        self.protected_pairs += depth.protected_pairs;
        self.edges_removed += depth.removed;
        self.depths.push(depth.clone());
    }
}

/// Result of a skeleton search.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SearchOutcome {
    pub adjacency: Adjacency,
    pub sepsets: SepsetMap,
    pub stats: SearchStats,
    /// Committed oracle calls, in call order. Empty unless fact recording
    /// was enabled.
    pub facts: Vec<IndependenceFact>,
}

impl SearchOutcome {
    /// Undirected edges that survived, each once.
    pub fn edges(&self) -> Vec<(Variable, Variable)> {
        self.adjacency.edges()
    }

    pub fn is_adjacent(&self, x: &Variable, y: &Variable) -> bool {
        self.adjacency.is_adjacent(x, y)
    }

    /// Separating set recorded for `{x, y}`.
    pub fn sepset(&self, x: &Variable, y: &Variable) -> Option<&[Variable]> {
        self.sepsets.get(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_absorb_depth_counters() {
        let mut stats = SearchStats::default();
        assert_eq!(stats.max_depth_visited(), None);
        stats.absorb(&DepthStats {
            depth: 0,
            tests: 6,
            removed: 2,
            ..DepthStats::default()
        });
        stats.absorb(&DepthStats {
            depth: 1,
            tests: 4,
            failed_tests: 1,
            protected_pairs: 1,
            removed: 1,
            ..DepthStats::default()
        });
        assert_eq!(stats.tests, 10);
        assert_eq!(stats.edges_removed, 3);
        assert_eq!(stats.failed_tests, 1);
        assert_eq!(stats.protected_pairs, 1);
        assert_eq!(stats.max_depth_visited(), Some(1));
    }
}
