//! Error types for skeleton search.

use thiserror::Error;

/// Errors raised while configuring or starting a search.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in the future without breaking changes.
///
/// Only configuration problems surface here. Statistical anomalies inside a
/// single independence test are reported as [`OracleError`] to the controller,
/// which treats the pair as dependent and keeps going.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// Maximum depth below the `-1` "unbounded" sentinel.
    #[error("invalid depth {0}: must be >= 0, or -1 for unbounded")]
    InvalidDepth(i64),

    /// Level out of range. Nominal and FDR levels must lie in (0, 1);
    /// oracle thresholds set by the FDR stage in [0, 1].
    #[error("invalid significance level {0}: out of range")]
    InvalidAlpha(f64),

    /// A variable referenced by an input is not part of the search.
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    /// Two search variables share the same name.
    #[error("duplicate variable '{0}'")]
    DuplicateVariable(String),

    /// A supplied initial adjacency violates an adjacency invariant.
    #[error("invalid adjacency: {0}")]
    InvalidAdjacency(String),

    /// Data handed to an oracle constructor is malformed.
    #[error("invalid oracle data: {0}")]
    InvalidData(String),

    /// Background knowledge contradicts itself.
    #[error("knowledge conflict: {0}")]
    KnowledgeConflict(String),
}

/// Errors raised by an independence oracle for one `(x, y, Z)` query.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OracleError {
    /// The covariance submatrix over `{x, y} ∪ Z` could not be inverted.
    #[error("singular covariance matrix over {0} variables")]
    SingularMatrix(usize),

    /// Too few samples for the size of the conditioning set.
    #[error("insufficient samples: n = {samples}, conditioning set size = {conditioning}")]
    InsufficientSamples { samples: usize, conditioning: usize },

    /// The oracle has no data for a variable.
    #[error("oracle does not know variable '{0}'")]
    UnknownVariable(String),

    /// Numerical failure (NaN/Inf statistic, correlation outside [-1, 1]).
    #[error("numerical error: {0}")]
    Numerical(String),

    /// The query is not supported by this oracle.
    #[error("unsupported query: {0}")]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_offending_values() {
        assert_eq!(
            SearchError::InvalidDepth(-3).to_string(),
            "invalid depth -3: must be >= 0, or -1 for unbounded"
        );
        assert!(SearchError::UnknownVariable("X9".into())
            .to_string()
            .contains("X9"));
        let err = OracleError::InsufficientSamples {
            samples: 5,
            conditioning: 3,
        };
        assert!(err.to_string().contains("n = 5"));
    }
}
