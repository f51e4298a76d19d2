//! Table-driven independence oracle.
//!
//! Facts are keyed by the unordered pair `{x, y}` and the *sorted*
//! conditioning set, so lookups do not depend on the order in which the
//! search happens to list `Z`. Unlisted facts get the default p-value
//! (0.0 unless changed), which reads as "dependent" at any alpha.

use std::sync::atomic::{AtomicUsize, Ordering};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::oracle::{check_oracle_alpha, IndependenceOracle, IndependenceResult};
use crate::search::errors::{OracleError, SearchError};
use crate::search::variable::Variable;

type FactKey = (Variable, Variable, Vec<Variable>);

fn pair(x: &Variable, y: &Variable) -> (Variable, Variable) {
    if x <= y {
        (x.clone(), y.clone())
    } else {
        (y.clone(), x.clone())
    }
}

fn fact_key(x: &Variable, y: &Variable, z: &[Variable]) -> FactKey {
    let (a, b) = pair(x, y);
    let mut z = z.to_vec();
    z.sort();
    (a, b, z)
}

/// Oracle answering from a fixed table of p-values.
#[derive(Debug)]
pub struct LookupOracle {
    alpha: f64,
    default_p_value: f64,
    facts: FxHashMap<FactKey, f64>,
    failing_pairs: FxHashSet<(Variable, Variable)>,
    calls: AtomicUsize,
}

impl Clone for LookupOracle {
    fn clone(&self) -> Self {
        Self {
            alpha: self.alpha,
            default_p_value: self.default_p_value,
            facts: self.facts.clone(),
            failing_pairs: self.failing_pairs.clone(),
            calls: AtomicUsize::new(self.calls.load(Ordering::Relaxed)),
        }
    }
}

impl LookupOracle {
    /// Empty table: everything dependent.
    pub fn new(alpha: f64) -> Result<Self, SearchError> {
        Ok(Self {
            alpha: check_oracle_alpha(alpha)?,
            default_p_value: 0.0,
            facts: FxHashMap::default(),
            failing_pairs: FxHashSet::default(),
            calls: AtomicUsize::new(0),
        })
    }

    /// p-value returned for facts missing from the table.
    pub fn with_default_p_value(mut self, p_value: f64) -> Result<Self, SearchError> {
        self.default_p_value = check_oracle_alpha(p_value)?;
        Ok(self)
    }

    /// Records the p-value for `x ⊥ y | z`.
    pub fn set_p_value(
        &mut self,
        x: &Variable,
        y: &Variable,
        z: &[Variable],
        p_value: f64,
    ) -> Result<&mut Self, SearchError> {
        let p = check_oracle_alpha(p_value)?;
        self.facts.insert(fact_key(x, y, z), p);
        Ok(self)
    }

    /// Marks `x ⊥ y | z` as independent at every alpha below 1.
    pub fn set_independent(&mut self, x: &Variable, y: &Variable, z: &[Variable]) -> &mut Self {
        self.facts.insert(fact_key(x, y, z), 1.0);
        self
    }

    /// Makes every query on `{x, y}` fail with a numerical error.
    pub fn fail_pair(&mut self, x: &Variable, y: &Variable) -> &mut Self {
        self.failing_pairs.insert(pair(x, y));
        self
    }

    /// Number of queries answered (or failed) so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl IndependenceOracle for LookupOracle {
    fn is_independent(
        &self,
        x: &Variable,
        y: &Variable,
        z: &[Variable],
    ) -> Result<IndependenceResult, OracleError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.failing_pairs.contains(&pair(x, y)) {
            return Err(OracleError::Numerical(format!(
                "injected failure for {x} and {y}"
            )));
        }
        let p = self
            .facts
            .get(&fact_key(x, y, z))
            .copied()
            .unwrap_or(self.default_p_value);
        Ok(IndependenceResult::from_p_value(p, self.alpha))
    }

    fn alpha(&self) -> f64 {
        self.alpha
    }

    fn set_alpha(&mut self, alpha: f64) -> Result<(), SearchError> {
        self.alpha = check_oracle_alpha(alpha)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "lookup"
    }
}
