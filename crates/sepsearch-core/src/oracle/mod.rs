//! Conditional-independence oracles.
//!
//! The search is written against [`IndependenceOracle`] only. This module
//! provides:
//! - **lookup**: table-driven oracle with deterministic verdicts and failure
//!   injection, for tests and replaying recorded decisions
//! - **fisher_z**: Gaussian partial-correlation test over a covariance matrix
//! - **dsep**: exact d-separation oracle over a known DAG
//! - **numeric**: shared numeric helpers (normal tail, matrix inversion)

pub mod dsep;
pub mod fisher_z;
pub mod lookup;
pub mod numeric;

use crate::search::errors::{OracleError, SearchError};
use crate::search::variable::Variable;

pub use dsep::DSeparationOracle;
pub use fisher_z::FisherZOracle;
pub use lookup::LookupOracle;

/// Verdict of one independence test.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndependenceResult {
    /// Whether `x ⊥ y | Z` was accepted at the oracle's current alpha.
    pub independent: bool,
    /// The p-value that produced the verdict.
    pub p_value: f64,
}

impl IndependenceResult {
    /// Verdict for `p_value` under the usual "independent iff p > alpha" rule.
    pub fn from_p_value(p_value: f64, alpha: f64) -> Self {
        Self {
            independent: p_value > alpha,
            p_value,
        }
    }
}

/// A statistical test answering "is `x` independent of `y` given `z`?".
///
/// Queries take `&self`: an oracle must not depend on mutable state while a
/// pass is running, so that pair tests can be dispatched in parallel. The
/// significance threshold is the only mutable knob, and the search changes
/// it only between passes.
pub trait IndependenceOracle: Send + Sync {
    /// Tests `x ⊥ y | z`.
    ///
    /// An `Err` means the test itself failed (singular matrix, too few
    /// samples, ...). The search treats such pairs as dependent.
    fn is_independent(
        &self,
        x: &Variable,
        y: &Variable,
        z: &[Variable],
    ) -> Result<IndependenceResult, OracleError>;

    /// Current significance threshold.
    fn alpha(&self) -> f64;

    /// Replaces the significance threshold.
    ///
    /// Implementations accept any value in `[0, 1]`; the FDR stage may
    /// legitimately drive the cutoff to either end.
    fn set_alpha(&mut self, alpha: f64) -> Result<(), SearchError>;

    /// Short human-readable name, reported to
    /// [`SearchObserver::search_started`](crate::SearchObserver::search_started).
    fn name(&self) -> &str {
        "oracle"
    }
}

/// Validates a threshold passed to [`IndependenceOracle::set_alpha`].
pub fn check_oracle_alpha(alpha: f64) -> Result<f64, SearchError> {
    if alpha.is_finite() && (0.0..=1.0).contains(&alpha) {
        Ok(alpha)
    } else {
        Err(SearchError::InvalidAlpha(alpha))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_boundary_is_exclusive() {
        assert!(!IndependenceResult::from_p_value(0.05, 0.05).independent);
        assert!(IndependenceResult::from_p_value(0.0501, 0.05).independent);
    }

    #[test]
    fn oracle_alpha_accepts_closed_unit_interval() {
        assert_eq!(check_oracle_alpha(0.0), Ok(0.0));
        assert_eq!(check_oracle_alpha(1.0), Ok(1.0));
        assert!(check_oracle_alpha(1.5).is_err());
        assert!(check_oracle_alpha(f64::NAN).is_err());
    }
}
