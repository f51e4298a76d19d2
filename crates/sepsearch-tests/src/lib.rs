//! Shared fixtures for the sepsearch integration and property tests.
//!
//! - [`Dag`]: a small directed acyclic graph with its d-separation oracle
//!   and true skeleton
//! - [`ScrambledOracle`]: an arbitrary but deterministic oracle for
//!   invariants that must hold whatever the oracle says
//! - proptest strategies over both

use std::hash::{Hash, Hasher};

use proptest::prelude::*;
use rustc_hash::FxHasher;
use sepsearch_core::oracle::{check_oracle_alpha, DSeparationOracle};
use sepsearch_core::{
    variables, Adjacency, IndependenceOracle, IndependenceResult, OracleError, SearchError,
    Variable,
};

/// The four variables used by most scenario tests.
pub fn abcd() -> Vec<Variable> {
    variables(["A", "B", "C", "D"])
}

/// Variables `X0, X1, ...`.
pub fn numbered(n: usize) -> Vec<Variable> {
    variables((0..n).map(|i| format!("X{i}")))
}

/// A DAG over numbered variables. Edges point from lower to higher index.
#[derive(Debug, Clone)]
pub struct Dag {
    pub vars: Vec<Variable>,
    pub edges: Vec<(usize, usize)>,
}

impl Dag {
    pub fn new(vars: Vec<Variable>, edges: Vec<(usize, usize)>) -> Self {
        Self { vars, edges }
    }

    /// `X0 -> X1 -> ... -> X(n-1)`.
    pub fn chain(n: usize) -> Self {
        Self::new(numbered(n), (1..n).map(|i| (i - 1, i)).collect())
    }

    fn edge_refs(&self) -> impl Iterator<Item = (&Variable, &Variable)> {
        self.edges.iter().map(|&(a, b)| (&self.vars[a], &self.vars[b]))
    }

    pub fn oracle(&self) -> DSeparationOracle {
        DSeparationOracle::new(&self.vars, self.edge_refs()).expect("fixture DAG is acyclic")
    }

    /// The undirected skeleton of the DAG.
    pub fn skeleton(&self) -> Adjacency {
        Adjacency::from_edges(&self.vars, self.edge_refs()).expect("fixture edges are valid")
    }
}

/// Random DAG with `2..=max_vars` variables; each forward pair is an edge
/// with probability `density`.
pub fn arb_dag(max_vars: usize, density: f64) -> impl Strategy<Value = Dag> {
    (2..=max_vars)
        .prop_flat_map(move |n| {
            let pairs = n * (n - 1) / 2;
            (
                Just(n),
                proptest::collection::vec(proptest::bool::weighted(density), pairs),
            )
        })
        .prop_map(|(n, mask)| {
            let forward = (0..n).flat_map(|i| ((i + 1)..n).map(move |j| (i, j)));
            let edges = forward
                .zip(mask)
                .filter_map(|(pair, keep)| keep.then_some(pair))
                .collect();
            Dag::new(numbered(n), edges)
        })
}

/// Oracle whose p-values are a fixed hash of the query.
///
/// Queries are keyed by unordered pair and conditioning set, so both
/// orientations of a test agree. A share of queries fails outright.
#[derive(Debug, Clone)]
pub struct ScrambledOracle {
    seed: u64,
    alpha: f64,
    failure_rate: u64,
}

impl ScrambledOracle {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            alpha: 0.05,
            failure_rate: 0,
        }
    }

    /// Roughly one query in `one_in` fails.
    pub fn failing_one_in(mut self, one_in: u64) -> Self {
        self.failure_rate = one_in;
        self
    }

    fn hash(&self, x: &Variable, y: &Variable, z: &[Variable]) -> u64 {
        let (a, b) = if x <= y { (x, y) } else { (y, x) };
        let mut z: Vec<&Variable> = z.iter().collect();
        z.sort();
        let mut h = FxHasher::default();
        self.seed.hash(&mut h);
        a.hash(&mut h);
        b.hash(&mut h);
        z.hash(&mut h);
        h.finish()
    }
}

impl IndependenceOracle for ScrambledOracle {
    fn is_independent(
        &self,
        x: &Variable,
        y: &Variable,
        z: &[Variable],
    ) -> Result<IndependenceResult, OracleError> {
        let h = self.hash(x, y, z);
        if self.failure_rate > 0 && (h >> 32) % self.failure_rate == 0 {
            return Err(OracleError::Numerical("scrambled failure".into()));
        }
        let p_value = (h % 10_000) as f64 / 10_000.0;
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
        "scrambled"
    }
}

/// Covariance matrix of a linear Gaussian model with unit edge weights and
/// unit noise, for variables in topological order.
pub fn linear_gaussian_covariance(dag: &Dag) -> Vec<Vec<f64>> {
    let n = dag.vars.len();
    // x = B x + e  =>  Cov = (I - B)^-1 (I - B)^-T, computed column by column
    // in topological order.
    let mut cov = vec![vec![0.0; n]; n];
    for j in 0..n {
        let parents: Vec<usize> = dag
            .edges
            .iter()
            .filter(|&&(_, c)| c == j)
            .map(|&(p, _)| p)
            .collect();
        for i in 0..j {
            let c: f64 = parents.iter().map(|&p| cov[i][p]).sum();
            cov[i][j] = c;
            cov[j][i] = c;
        }
        let var: f64 = 1.0
            + parents
                .iter()
                .map(|&p| parents.iter().map(|&q| cov[p][q]).sum::<f64>())
                .sum::<f64>();
        cov[j][j] = var;
    }
    cov
}
