//! # sepsearch
//!
//! Constraint-based skeleton search. Given variables and a conditional
//! independence oracle, [`SkeletonSearch`] removes every edge of the
//! complete graph whose endpoints some conditioning set separates, and
//! records that set.

pub mod oracle;
pub mod search;

// Re-export commonly used types
pub use oracle::{IndependenceOracle, IndependenceResult};
pub use search::adjacency::Adjacency;
pub use search::config::{Depth, FdrConfig, FdrDependence, PassMode, SearchConfig};
pub use search::errors::{OracleError, SearchError};
pub use search::knowledge::Knowledge;
pub use search::observer::{NoopObserver, RecordingObserver, SearchEvent, SearchObserver};
#[cfg(feature = "tracing")]
pub use search::observer::TracingObserver;
pub use search::outcome::{DepthStats, IndependenceFact, SearchOutcome, SearchStats};
pub use search::sepset::SepsetMap;
pub use search::skeleton::SkeletonSearch;
pub use search::variable::{variables, Variable};

/// Runs a search over `variables` with `config` and no knowledge.
///
/// This is a convenience wrapper around [`SkeletonSearch`].
pub fn search_skeleton<O>(
    variables: &[Variable],
    oracle: &mut O,
    config: SearchConfig,
) -> Result<SearchOutcome, SearchError>
where
    O: IndependenceOracle + ?Sized,
{
    SkeletonSearch::new(variables)?
        .with_config(config)
        .search(oracle)
}
