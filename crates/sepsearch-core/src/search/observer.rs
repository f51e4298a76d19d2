//! Search observers.
//!
//! The search never logs on its own. Everything worth reporting is passed to
//! a [`SearchObserver`] supplied by the caller:
//! - [`NoopObserver`]: default, ignores everything
//! - [`RecordingObserver`]: keeps events and per-depth adjacency snapshots
//! - `TracingObserver` (feature `tracing`): forwards events to `tracing`
//!
//! Events describe committed work only. The FDR probe pass is silent apart
//! from the cutoff it produces.

use crate::search::adjacency::Adjacency;
use crate::search::errors::OracleError;
use crate::search::outcome::{DepthStats, IndependenceFact, SearchStats};
use crate::search::variable::Variable;

/// Callbacks invoked while a search runs. Every method defaults to a no-op.
#[allow(unused_variables)]
pub trait SearchObserver {
    /// `oracle` is the oracle's [`name`](crate::IndependenceOracle::name).
    fn search_started(&mut self, oracle: &str, variables: usize, max_depth: usize) {}

    fn depth_started(&mut self, depth: usize, free_degree: usize) {}

    fn test_performed(&mut self, fact: &IndependenceFact) {}

    /// An oracle call failed; the pair is kept as dependent.
    fn test_failed(&mut self, x: &Variable, y: &Variable, z: &[Variable], error: &OracleError) {}

    /// A pair was not tested because knowledge requires its edge.
    fn edge_protected(&mut self, x: &Variable, y: &Variable) {}

    fn edge_removed(&mut self, x: &Variable, y: &Variable, sepset: &[Variable], depth: usize) {}

    /// A second, different separating set was found for an already
    /// separated pair. `kept` stays recorded.
    fn sepset_conflict(
        &mut self,
        x: &Variable,
        y: &Variable,
        kept: &[Variable],
        rejected: &[Variable],
    ) {
    }

    fn fdr_cutoff(&mut self, depth: usize, nominal: f64, cutoff: f64, batch_size: usize) {}

    fn depth_finished(&mut self, stats: &DepthStats, adjacency: &Adjacency) {}

    fn search_finished(&mut self, stats: &SearchStats) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {}

/// A recorded search event.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    Started {
        oracle: String,
        variables: usize,
        max_depth: usize,
    },
    DepthStarted {
        depth: usize,
        free_degree: usize,
    },
    Tested(IndependenceFact),
    TestFailed {
        x: Variable,
        y: Variable,
        z: Vec<Variable>,
        error: OracleError,
    },
    Protected {
        x: Variable,
        y: Variable,
    },
    Removed {
        x: Variable,
        y: Variable,
        sepset: Vec<Variable>,
        depth: usize,
    },
    SepsetConflict {
        x: Variable,
        y: Variable,
    },
    FdrCutoff {
        depth: usize,
        nominal: f64,
        cutoff: f64,
        batch_size: usize,
    },
    DepthFinished(DepthStats),
}

/// Observer that keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    pub events: Vec<SearchEvent>,
    /// Adjacency after each depth pass, in depth order.
    pub snapshots: Vec<Adjacency>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded removals as `(x, y, sepset)`.
    pub fn removals(&self) -> impl Iterator<Item = (&Variable, &Variable, &[Variable])> {
        self.events.iter().filter_map(|e| match e {
            SearchEvent::Removed { x, y, sepset, .. } => Some((x, y, sepset.as_slice())),
            _ => None,
        })
    }

    pub fn failures(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SearchEvent::TestFailed { .. }))
            .count()
    }
}

impl SearchObserver for RecordingObserver {
    fn search_started(&mut self, oracle: &str, variables: usize, max_depth: usize) {
        self.events.push(SearchEvent::Started {
            oracle: oracle.to_string(),
            variables,
            max_depth,
        });
    }

    fn depth_started(&mut self, depth: usize, free_degree: usize) {
        self.events.push(SearchEvent::DepthStarted { depth, free_degree });
    }

    fn test_performed(&mut self, fact: &IndependenceFact) {
        self.events.push(SearchEvent::Tested(fact.clone()));
    }

    fn test_failed(&mut self, x: &Variable, y: &Variable, z: &[Variable], error: &OracleError) {
        self.events.push(SearchEvent::TestFailed {
            x: x.clone(),
            y: y.clone(),
            z: z.to_vec(),
            error: error.clone(),
        });
    }

    fn edge_protected(&mut self, x: &Variable, y: &Variable) {
        self.events.push(SearchEvent::Protected {
            x: x.clone(),
            y: y.clone(),
        });
    }

    fn edge_removed(&mut self, x: &Variable, y: &Variable, sepset: &[Variable], depth: usize) {
        self.events.push(SearchEvent::Removed {
            x: x.clone(),
            y: y.clone(),
            sepset: sepset.to_vec(),
            depth,
        });
    }

    fn sepset_conflict(
        &mut self,
        x: &Variable,
        y: &Variable,
        _kept: &[Variable],
        _rejected: &[Variable],
    ) {
        self.events.push(SearchEvent::SepsetConflict {
            x: x.clone(),
            y: y.clone(),
        });
    }

    fn fdr_cutoff(&mut self, depth: usize, nominal: f64, cutoff: f64, batch_size: usize) {
        self.events.push(SearchEvent::FdrCutoff {
            depth,
            nominal,
            cutoff,
            batch_size,
        });
    }

    fn depth_finished(&mut self, stats: &DepthStats, adjacency: &Adjacency) {
        self.events.push(SearchEvent::DepthFinished(stats.clone()));
        self.snapshots.push(adjacency.clone());
    }
}

/// Observer that forwards events to `tracing`.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

#[cfg(feature = "tracing")]
fn names(vars: &[Variable]) -> Vec<&str> {
    vars.iter().map(Variable::name).collect()
}

#[cfg(feature = "tracing")]
impl SearchObserver for TracingObserver {
    fn search_started(&mut self, oracle: &str, variables: usize, max_depth: usize) {
        tracing::info!(oracle, variables, max_depth, "skeleton search started");
    }

    fn depth_started(&mut self, depth: usize, free_degree: usize) {
        tracing::debug!(depth, free_degree, "depth pass started");
    }

    fn test_performed(&mut self, fact: &IndependenceFact) {
        tracing::debug!(
            x = fact.x.name(),
            y = fact.y.name(),
            z = ?names(&fact.z),
            p = fact.p_value,
            independent = fact.independent,
            "independence test"
        );
    }

    fn test_failed(&mut self, x: &Variable, y: &Variable, z: &[Variable], error: &OracleError) {
        tracing::warn!(
            x = x.name(),
            y = y.name(),
            z = ?names(z),
            %error,
            "independence test failed; keeping edge"
        );
    }

    fn edge_protected(&mut self, x: &Variable, y: &Variable) {
        tracing::debug!(x = x.name(), y = y.name(), "required edge not tested");
    }

    fn edge_removed(&mut self, x: &Variable, y: &Variable, sepset: &[Variable], depth: usize) {
        tracing::debug!(
            x = x.name(),
            y = y.name(),
            sepset = ?names(sepset),
            depth,
            "edge removed"
        );
    }

    fn sepset_conflict(
        &mut self,
        x: &Variable,
        y: &Variable,
        kept: &[Variable],
        rejected: &[Variable],
    ) {
        tracing::warn!(
            x = x.name(),
            y = y.name(),
            kept = ?names(kept),
            rejected = ?names(rejected),
            "conflicting separating set ignored"
        );
    }

    fn fdr_cutoff(&mut self, depth: usize, nominal: f64, cutoff: f64, batch_size: usize) {
        tracing::debug!(depth, nominal, cutoff, batch_size, "fdr cutoff");
    }

    fn depth_finished(&mut self, stats: &DepthStats, _adjacency: &Adjacency) {
        tracing::debug!(
            depth = stats.depth,
            tests = stats.tests,
            removed = stats.removed,
            free_degree = stats.free_degree,
            "depth pass finished"
        );
    }

    fn search_finished(&mut self, stats: &SearchStats) {
        tracing::info!(
            tests = stats.tests,
            failed = stats.failed_tests,
            removed = stats.edges_removed,
            "skeleton search finished"
        );
    }
}
