//! One depth pass over the adjacent pairs.
//!
//! A pass visits every ordered adjacent pair `(x, y)` in input order and
//! looks for a size-`d` subset of `x`'s admissible neighbors that separates
//! `x` from `y`. Passes never touch the observer or the sepset map; they
//! return one [`PairOutcome`] per committed pair and the controller replays
//! them in order.
//!
//! ## Pass modes
//!
//! - **Sequential**: a removal is visible to every later pair of the same
//!   pass, so later pairs draw from smaller neighbor pools.
//! - **Stable**: every pair reads the adjacency as it was when the pass
//!   started. A pair already removed earlier in the pass is skipped, so when
//!   both orientations separate, the first in visiting order wins.
//!
//! ## Feature gating
//!
//! With the `parallel` feature, stable passes evaluate all pairs on rayon
//! against the shared snapshot and merge the results in visiting order.
//! Outcomes of pairs that the merge finds already removed are discarded, so
//! the committed result is identical to the single-threaded stable pass.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::oracle::{IndependenceOracle, IndependenceResult};
use crate::search::adjacency::Adjacency;
use crate::search::combinations::Combinations;
use crate::search::config::PassMode;
use crate::search::errors::OracleError;
use crate::search::knowledge::ResolvedKnowledge;
use crate::search::variable::{VarId, Variable};

/// One oracle call made for a pair.
#[derive(Debug, Clone)]
pub(crate) struct TestRecord {
    pub z: Vec<Variable>,
    pub result: Result<IndependenceResult, OracleError>,
}

impl TestRecord {
    fn independent(&self) -> bool {
        matches!(&self.result, Ok(r) if r.independent)
    }
}

/// What happened to one ordered pair during a pass.
#[derive(Debug, Clone)]
pub(crate) struct PairOutcome {
    pub x: VarId,
    pub y: VarId,
    /// Knowledge requires the edge; no test was made.
    pub protected: bool,
    /// Calls in the order they were made. When `separated` is set, the last
    /// call is the one that separated the pair.
    pub tests: Vec<TestRecord>,
    pub separated: bool,
}

impl PairOutcome {
    fn new(x: VarId, y: VarId) -> Self {
        Self {
            x,
            y,
            protected: false,
            tests: Vec::new(),
            separated: false,
        }
    }

    /// The separating set, if the pair was separated.
    pub fn sepset(&self) -> Option<&[Variable]> {
        if self.separated {
            self.tests.last().map(|t| t.z.as_slice())
        } else {
            None
        }
    }

    /// p-values of the calls that succeeded.
    pub fn p_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.tests
            .iter()
            .filter_map(|t| t.result.as_ref().ok().map(|r| r.p_value))
    }
}

/// Ordered pairs a pass at `depth` may visit, taken from `adjacency` before
/// the pass starts.
///
/// At depth 0 every pair faces the same (empty) conditioning set from both
/// sides, so each unordered pair is listed once.
fn candidate_pairs(adjacency: &Adjacency, depth: usize) -> Vec<(VarId, VarId)> {
    let mut pairs = Vec::new();
    for x in adjacency.variable_index().ids() {
        pairs.extend(
            adjacency
                .neighbor_ids(x)
                .iter()
                .filter(|&&y| depth > 0 || y > x)
                .map(|&y| (x, y)),
        );
    }
    pairs
}

/// Tests one ordered pair against every size-`depth` subset of `x`'s
/// admissible neighbors in `adjacency`, stopping at the first separating set.
pub(crate) fn test_pair<O>(
    oracle: &O,
    knowledge: &ResolvedKnowledge,
    adjacency: &Adjacency,
    x: VarId,
    y: VarId,
    depth: usize,
) -> PairOutcome
where
    O: IndependenceOracle + ?Sized,
{
    let mut outcome = PairOutcome::new(x, y);
    if !knowledge.no_edge_required(x, y) {
        outcome.protected = true;
        return outcome;
    }

    let pool: SmallVec<[VarId; 16]> = adjacency
        .neighbor_ids(x)
        .iter()
        .copied()
        .filter(|&z| z != y && knowledge.is_possible_parent(z, x))
        .collect();
    if pool.len() < depth {
        return outcome;
    }

    let index = adjacency.variable_index();
    let (vx, vy) = (index.var(x), index.var(y));
    let mut subsets = Combinations::new(pool.len(), depth);
    while let Some(choice) = subsets.advance() {
        let z: Vec<Variable> = choice.iter().map(|&i| index.var(pool[i]).clone()).collect();
        let result = oracle.is_independent(vx, vy, &z);
        let record = TestRecord { z, result };
        let independent = record.independent();
        outcome.tests.push(record);
        if independent {
            outcome.separated = true;
            break;
        }
    }
    outcome
}

/// Runs one pass at `depth`, removing separated edges from `adjacency`.
///
/// Returns the committed pair outcomes in visiting order.
pub(crate) fn run_pass<O>(
    oracle: &O,
    knowledge: &ResolvedKnowledge,
    adjacency: &mut Adjacency,
    depth: usize,
    mode: PassMode,
) -> Vec<PairOutcome>
where
    O: IndependenceOracle + ?Sized,
{
    let pairs = candidate_pairs(adjacency, depth);
    match mode {
        PassMode::Sequential => {
            let mut committed = Vec::with_capacity(pairs.len());
            for (x, y) in pairs {
                if !adjacency.is_adjacent_ids(x, y) {
                    continue;
                }
                let outcome = test_pair(oracle, knowledge, adjacency, x, y, depth);
                commit(adjacency, outcome, &mut committed);
            }
            committed
        }
        PassMode::Stable => stable_pass(oracle, knowledge, adjacency, &pairs, depth),
    }
}

fn commit(adjacency: &mut Adjacency, outcome: PairOutcome, committed: &mut Vec<PairOutcome>) {
    if outcome.separated {
        adjacency.remove_ids(outcome.x, outcome.y);
    }
    committed.push(outcome);
}

#[cfg(not(feature = "parallel"))]
fn stable_pass<O>(
    oracle: &O,
    knowledge: &ResolvedKnowledge,
    adjacency: &mut Adjacency,
    pairs: &[(VarId, VarId)],
    depth: usize,
) -> Vec<PairOutcome>
where
    O: IndependenceOracle + ?Sized,
{
    let snapshot = adjacency.clone();
    let mut committed = Vec::with_capacity(pairs.len());
    for &(x, y) in pairs {
        if !adjacency.is_adjacent_ids(x, y) {
            continue;
        }
        let outcome = test_pair(oracle, knowledge, &snapshot, x, y, depth);
        commit(adjacency, outcome, &mut committed);
    }
    committed
}

#[cfg(feature = "parallel")]
fn stable_pass<O>(
    oracle: &O,
    knowledge: &ResolvedKnowledge,
    adjacency: &mut Adjacency,
    pairs: &[(VarId, VarId)],
    depth: usize,
) -> Vec<PairOutcome>
where
    O: IndependenceOracle + ?Sized,
{
    let snapshot = adjacency.clone();

    // Every pair reads only the snapshot, so evaluation order is free.
    let evaluated: Vec<PairOutcome> = pairs
        .par_iter()
        .map(|&(x, y)| test_pair(oracle, knowledge, &snapshot, x, y, depth))
        .collect();

    let mut committed = Vec::with_capacity(evaluated.len());
    for outcome in evaluated {
        if !adjacency.is_adjacent_ids(outcome.x, outcome.y) {
            continue;
        }
        commit(adjacency, outcome, &mut committed);
    }
    committed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::LookupOracle;
    use crate::search::knowledge::Knowledge;
    use crate::search::variable::variables;

    fn setup(names: &[&str]) -> (Vec<Variable>, Adjacency, ResolvedKnowledge) {
        let vars = variables(names.iter().copied());
        let adj = Adjacency::complete(&vars).unwrap();
        let knowledge = Knowledge::new().resolve(adj.variable_index());
        (vars, adj, knowledge)
    }

    #[test]
    fn depth_zero_lists_each_pair_once() {
        let (_, adj, _) = setup(&["A", "B", "C"]);
        assert_eq!(candidate_pairs(&adj, 0).len(), 3);
        assert_eq!(candidate_pairs(&adj, 1).len(), 6);
    }

    #[test]
    fn first_separating_subset_wins() {
        let (vars, adj, knowledge) = setup(&["A", "B", "C", "D"]);
        let mut oracle = LookupOracle::new(0.05).unwrap();
        oracle
            .set_independent(&vars[0], &vars[1], &[vars[2].clone()])
            .set_independent(&vars[0], &vars[1], &[vars[3].clone()]);

        let outcome = test_pair(&oracle, &knowledge, &adj, VarId(0), VarId(1), 1);
        assert!(outcome.separated);
        assert_eq!(outcome.tests.len(), 1);
        assert_eq!(outcome.sepset(), Some(&vars[2..3]));
    }

    #[test]
    fn small_pool_makes_no_calls() {
        let (_, adj, knowledge) = setup(&["A", "B", "C"]);
        let oracle = LookupOracle::new(0.05).unwrap();
        let outcome = test_pair(&oracle, &knowledge, &adj, VarId(0), VarId(1), 2);
        assert!(outcome.tests.is_empty());
        assert!(!outcome.separated);
        assert_eq!(oracle.call_count(), 0);
    }

    #[test]
    fn required_pairs_are_never_tested() {
        let vars = variables(["A", "B", "C"]);
        let adj = Adjacency::complete(&vars).unwrap();
        let mut k = Knowledge::new();
        k.require("B", "A").unwrap();
        let knowledge = k.resolve(adj.variable_index());
        let oracle = LookupOracle::new(0.05).unwrap();

        let outcome = test_pair(&oracle, &knowledge, &adj, VarId(0), VarId(1), 0);
        assert!(outcome.protected);
        assert_eq!(oracle.call_count(), 0);
    }

    #[test]
    fn forbidden_parents_leave_the_pool() {
        let vars = variables(["A", "B", "C"]);
        let adj = Adjacency::complete(&vars).unwrap();
        let mut k = Knowledge::new();
        k.forbid("C", "A").unwrap();
        let knowledge = k.resolve(adj.variable_index());
        let mut oracle = LookupOracle::new(0.05).unwrap();
        oracle.set_independent(&vars[0], &vars[1], &[vars[2].clone()]);

        // From A's side C is not admissible, so {C} is never tried.
        let from_a = test_pair(&oracle, &knowledge, &adj, VarId(0), VarId(1), 1);
        assert!(from_a.tests.is_empty());
        let from_b = test_pair(&oracle, &knowledge, &adj, VarId(1), VarId(0), 1);
        assert!(from_b.separated);
    }

    /// A-C and A-D separate given B; C-D separates only given A.
    fn shielded_fixture() -> (Vec<Variable>, Adjacency, ResolvedKnowledge, LookupOracle) {
        let (vars, adj, knowledge) = setup(&["A", "B", "C", "D"]);
        let mut oracle = LookupOracle::new(0.05).unwrap();
        oracle
            .set_independent(&vars[0], &vars[2], &[vars[1].clone()])
            .set_independent(&vars[0], &vars[3], &[vars[1].clone()])
            .set_independent(&vars[2], &vars[3], &[vars[0].clone()]);
        (vars, adj, knowledge, oracle)
    }

    #[test]
    fn sequential_removals_shrink_later_pools() {
        let (vars, mut adj, knowledge, oracle) = shielded_fixture();
        run_pass(&oracle, &knowledge, &mut adj, 1, PassMode::Sequential);
        assert!(!adj.is_adjacent(&vars[0], &vars[2]));
        assert!(!adj.is_adjacent(&vars[0], &vars[3]));
        // A left both pools before C-D was visited.
        assert!(adj.is_adjacent(&vars[2], &vars[3]));
    }

    #[test]
    fn stable_pass_reads_the_snapshot() {
        let (vars, mut adj, knowledge, oracle) = shielded_fixture();
        let outcomes = run_pass(&oracle, &knowledge, &mut adj, 1, PassMode::Stable);
        assert!(!adj.is_adjacent(&vars[0], &vars[2]));
        assert!(!adj.is_adjacent(&vars[0], &vars[3]));
        assert!(!adj.is_adjacent(&vars[2], &vars[3]));
        let cd = outcomes
            .iter()
            .find(|o| o.x == VarId(2) && o.y == VarId(3))
            .unwrap();
        assert_eq!(cd.sepset(), Some(&vars[0..1]));
        // (C, A) was skipped once (A, C) had removed the edge.
        assert!(outcomes.iter().all(|o| !(o.x == VarId(2) && o.y == VarId(0))));
        assert!(adj.is_symmetric());
    }
}
