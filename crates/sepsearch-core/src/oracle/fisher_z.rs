//! Fisher-Z partial-correlation test for Gaussian data.
//!
//! For a query `x ⊥ y | Z` the oracle inverts the covariance submatrix over
//! `{x, y} ∪ Z` (the precision matrix `P`) and reads the partial correlation
//!
//! ```text
//! r = -P[x][y] / sqrt(P[x][x] * P[y][y])
//! ```
//!
//! The statistic `sqrt(n - |Z| - 3) * atanh(r)` is standard normal under the
//! null, giving a two-sided p-value. The pair is independent iff `p > alpha`.

use rustc_hash::FxHashMap;

use crate::oracle::numeric::{covariance, invert, two_sided_normal_p};
use crate::oracle::{check_oracle_alpha, IndependenceOracle, IndependenceResult};
use crate::search::errors::{OracleError, SearchError};
use crate::search::variable::Variable;

/// Gaussian conditional-independence test over a fixed covariance matrix.
#[derive(Debug, Clone)]
pub struct FisherZOracle {
    alpha: f64,
    sample_size: usize,
    columns: FxHashMap<Variable, usize>,
    covariance: Vec<Vec<f64>>,
}

impl FisherZOracle {
    /// Builds the oracle from a covariance (or correlation) matrix whose
    /// rows and columns follow `vars`.
    pub fn from_covariance(
        vars: &[Variable],
        covariance: Vec<Vec<f64>>,
        sample_size: usize,
        alpha: f64,
    ) -> Result<Self, SearchError> {
        let alpha = check_oracle_alpha(alpha)?;
        let p = vars.len();
        if covariance.len() != p || covariance.iter().any(|row| row.len() != p) {
            return Err(SearchError::InvalidData(format!(
                "covariance matrix must be {p}x{p} to match the variables"
            )));
        }
        if covariance.iter().flatten().any(|v| !v.is_finite()) {
            return Err(SearchError::InvalidData(
                "covariance matrix contains non-finite entries".into(),
            ));
        }

        let mut columns = FxHashMap::default();
        for (i, v) in vars.iter().enumerate() {
            if columns.insert(v.clone(), i).is_some() {
                return Err(SearchError::DuplicateVariable(v.name().to_string()));
            }
        }

        Ok(Self {
            alpha,
            sample_size,
            columns,
            covariance,
        })
    }

    /// Builds the oracle from raw samples, `rows[sample][variable]`.
    pub fn from_samples(
        vars: &[Variable],
        rows: &[Vec<f64>],
        alpha: f64,
    ) -> Result<Self, SearchError> {
        if rows.len() < 2 {
            return Err(SearchError::InvalidData(format!(
                "need at least 2 samples, got {}",
                rows.len()
            )));
        }
        if let Some(bad) = rows.iter().position(|r| r.len() != vars.len()) {
            return Err(SearchError::InvalidData(format!(
                "sample {bad} has {} values, expected {}",
                rows[bad].len(),
                vars.len()
            )));
        }
        Self::from_covariance(vars, covariance(rows), rows.len(), alpha)
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    fn column(&self, v: &Variable) -> Result<usize, OracleError> {
        self.columns
            .get(v)
            .copied()
            .ok_or_else(|| OracleError::UnknownVariable(v.name().to_string()))
    }

    /// Partial correlation of `x` and `y` given `z`.
    pub fn partial_correlation(
        &self,
        x: &Variable,
        y: &Variable,
        z: &[Variable],
    ) -> Result<f64, OracleError> {
        let mut cols = Vec::with_capacity(z.len() + 2);
        cols.push(self.column(x)?);
        cols.push(self.column(y)?);
        for v in z {
            cols.push(self.column(v)?);
        }

        let sub: Vec<Vec<f64>> = cols
            .iter()
            .map(|&i| cols.iter().map(|&j| self.covariance[i][j]).collect())
            .collect();
        let precision = invert(&sub).ok_or(OracleError::SingularMatrix(cols.len()))?;

        let denom = (precision[0][0] * precision[1][1]).sqrt();
        let r = -precision[0][1] / denom;
        if !r.is_finite() {
            return Err(OracleError::Numerical(format!(
                "partial correlation of {x} and {y} is not finite"
            )));
        }
        Ok(r.clamp(-1.0, 1.0))
    }
}

impl IndependenceOracle for FisherZOracle {
    fn is_independent(
        &self,
        x: &Variable,
        y: &Variable,
        z: &[Variable],
    ) -> Result<IndependenceResult, OracleError> {
        if self.sample_size <= z.len() + 3 {
            return Err(OracleError::InsufficientSamples {
                samples: self.sample_size,
                conditioning: z.len(),
            });
        }

        let r = self.partial_correlation(x, y, z)?;
        let p_value = if r.abs() >= 1.0 {
            0.0
        } else {
            let dof = (self.sample_size - z.len() - 3) as f64;
            two_sided_normal_p(dof.sqrt() * r.atanh())
        };

        Ok(IndependenceResult::from_p_value(p_value, self.alpha))
    }

    fn alpha(&self) -> f64 {
        self.alpha
    }

    fn set_alpha(&mut self, alpha: f64) -> Result<(), SearchError> {
        self.alpha = check_oracle_alpha(alpha)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "fisher-z"
    }
}
