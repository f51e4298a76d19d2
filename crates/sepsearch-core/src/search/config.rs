//! Search configuration.
//!
//! All validation happens when a value is constructed or set, so a
//! [`SearchConfig`] that exists is always usable.

use crate::search::errors::SearchError;

/// Upper bound used for [`Depth::Unbounded`].
pub const UNBOUNDED_DEPTH_LIMIT: usize = 1000;

/// Raw depth value meaning "unbounded".
pub const UNBOUNDED_DEPTH_SENTINEL: i64 = -1;

/// Maximum conditioning-set size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Depth {
    /// Stop after the pass at this depth.
    Bounded(usize),
    /// Run until the free-degree condition stops the search.
    #[default]
    Unbounded,
}

impl Depth {
    /// Converts the conventional integer form: `-1` is unbounded, anything
    /// below is rejected.
    pub fn from_raw(raw: i64) -> Result<Self, SearchError> {
        match raw {
            UNBOUNDED_DEPTH_SENTINEL => Ok(Depth::Unbounded),
            d if d >= 0 => Ok(Depth::Bounded(d as usize)),
            d => Err(SearchError::InvalidDepth(d)),
        }
    }

    /// The largest depth the search will visit.
    pub fn limit(self) -> usize {
        match self {
            Depth::Bounded(d) => d,
            Depth::Unbounded => UNBOUNDED_DEPTH_LIMIT,
        }
    }
}

/// How a depth pass observes its own removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PassMode {
    /// Removals take effect immediately; later pairs in the same pass see a
    /// smaller neighbor pool.
    #[default]
    Sequential,
    /// Every pair in a pass sees the adjacency as it was when the pass
    /// started. Removals are applied afterwards, first in visiting order
    /// winning. Required for parallel dispatch.
    Stable,
}

/// Dependence assumption behind the FDR cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FdrDependence {
    /// Independent or positively dependent tests (Benjamini-Hochberg).
    #[default]
    Independent,
    /// Arbitrary dependence (Benjamini-Yekutieli).
    Arbitrary,
}

/// False-discovery-rate correction settings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FdrConfig {
    level: Option<f64>,
    dependence: FdrDependence,
}

impl FdrConfig {
    /// FDR at the oracle's own alpha, assuming independent tests.
    pub fn new() -> Self {
        Self::default()
    }

    /// Nominal FDR level, strictly between 0 and 1.
    pub fn with_level(mut self, level: f64) -> Result<Self, SearchError> {
        self.level = Some(check_level(level)?);
        Ok(self)
    }

    pub fn with_dependence(mut self, dependence: FdrDependence) -> Self {
        self.dependence = dependence;
        self
    }

    /// Explicit level, if one was set.
    pub fn level(&self) -> Option<f64> {
        self.level
    }

    pub fn dependence(&self) -> FdrDependence {
        self.dependence
    }
}

/// Validates a nominal significance or FDR level.
pub fn check_level(level: f64) -> Result<f64, SearchError> {
    if level.is_finite() && level > 0.0 && level < 1.0 {
        Ok(level)
    } else {
        Err(SearchError::InvalidAlpha(level))
    }
}

/// Settings for one skeleton search.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchConfig {
    depth: Depth,
    fdr: Option<FdrConfig>,
    pass_mode: PassMode,
    record_facts: bool,
}

impl SearchConfig {
    /// Unbounded depth, no FDR, sequential passes, no fact log.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_depth(mut self, depth: Depth) -> Self {
        self.depth = depth;
        self
    }

    /// Sets the depth from its integer form (`-1` = unbounded).
    pub fn with_raw_depth(self, raw: i64) -> Result<Self, SearchError> {
        Ok(self.with_depth(Depth::from_raw(raw)?))
    }

    /// Enables the FDR correction stage.
    pub fn with_fdr(mut self, fdr: FdrConfig) -> Self {
        self.fdr = Some(fdr);
        self
    }

    pub fn without_fdr(mut self) -> Self {
        self.fdr = None;
        self
    }

    pub fn with_pass_mode(mut self, mode: PassMode) -> Self {
        self.pass_mode = mode;
        self
    }

    /// Keeps every committed oracle call in the outcome.
    pub fn with_record_facts(mut self, record: bool) -> Self {
        self.record_facts = record;
        self
    }

    pub fn depth(&self) -> Depth {
        self.depth
    }

    pub fn fdr(&self) -> Option<&FdrConfig> {
        self.fdr.as_ref()
    }

    pub fn pass_mode(&self) -> PassMode {
        self.pass_mode
    }

    pub fn record_facts(&self) -> bool {
        self.record_facts
    }
}
