//! Exact d-separation oracle over a known DAG.
//!
//! Answers `x ⊥ y | Z` by graph reachability instead of statistics, so it is
//! the reference oracle for checking that the search recovers the true
//! skeleton. The reported p-value is 1.0 for d-separated pairs and 0.0
//! otherwise; alpha is stored but cannot change a verdict.
//!
//! Reachability follows the active-trail ("Bayes ball") rules:
//! - a trail may pass a non-collider only if it is not in `Z`;
//! - a trail may pass a collider only if it is in `Z` or has a descendant
//!   in `Z`.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::oracle::{check_oracle_alpha, IndependenceOracle, IndependenceResult};
use crate::search::errors::{OracleError, SearchError};
use crate::search::variable::Variable;

/// Direction a trail enters a node from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Entry {
    /// Arrived from a child, moving against edge direction.
    FromChild,
    /// Arrived from a parent, moving along edge direction.
    FromParent,
}

/// d-separation oracle for a fixed DAG.
#[derive(Debug, Clone)]
pub struct DSeparationOracle {
    alpha: f64,
    ids: FxHashMap<Variable, usize>,
    parents: Vec<Vec<usize>>,
    children: Vec<Vec<usize>>,
}

impl DSeparationOracle {
    /// Builds the oracle from `vars` and directed `(parent, child)` edges.
    ///
    /// Fails on unknown endpoints, self-loops and directed cycles.
    pub fn new<'a, I>(vars: &[Variable], edges: I) -> Result<Self, SearchError>
    where
        I: IntoIterator<Item = (&'a Variable, &'a Variable)>,
    {
        let mut ids = FxHashMap::default();
        for (i, v) in vars.iter().enumerate() {
            if ids.insert(v.clone(), i).is_some() {
                return Err(SearchError::DuplicateVariable(v.name().to_string()));
            }
        }

        let n = vars.len();
        let mut parents = vec![Vec::new(); n];
        let mut children = vec![Vec::new(); n];
        for (from, to) in edges {
            let a = *ids
                .get(from)
                .ok_or_else(|| SearchError::UnknownVariable(from.name().to_string()))?;
            let b = *ids
                .get(to)
                .ok_or_else(|| SearchError::UnknownVariable(to.name().to_string()))?;
            if a == b {
                return Err(SearchError::InvalidData(format!("self-loop on '{from}'")));
            }
            if !children[a].contains(&b) {
                children[a].push(b);
                parents[b].push(a);
            }
        }

        let oracle = Self {
            alpha: 0.05,
            ids,
            parents,
            children,
        };
        if !oracle.is_acyclic() {
            return Err(SearchError::InvalidData("graph has a directed cycle".into()));
        }
        Ok(oracle)
    }

    /// Sets the stored alpha (builder style).
    pub fn with_alpha(mut self, alpha: f64) -> Result<Self, SearchError> {
        self.alpha = check_oracle_alpha(alpha)?;
        Ok(self)
    }

    fn is_acyclic(&self) -> bool {
        // Kahn's algorithm.
        let n = self.parents.len();
        let mut indegree: Vec<usize> = self.parents.iter().map(Vec::len).collect();
        let mut queue: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut seen = 0;
        while let Some(v) = queue.pop_front() {
            seen += 1;
            for &c in &self.children[v] {
                indegree[c] -= 1;
                if indegree[c] == 0 {
                    queue.push_back(c);
                }
            }
        }
        seen == n
    }

    fn id(&self, v: &Variable) -> Result<usize, OracleError> {
        self.ids
            .get(v)
            .copied()
            .ok_or_else(|| OracleError::UnknownVariable(v.name().to_string()))
    }

    /// Is there an active trail between `x` and `y` given `z`?
    pub fn is_d_connected(
        &self,
        x: &Variable,
        y: &Variable,
        z: &[Variable],
    ) -> Result<bool, OracleError> {
        let source = self.id(x)?;
        let target = self.id(y)?;
        let observed: FxHashSet<usize> = z.iter().map(|v| self.id(v)).collect::<Result<_, _>>()?;
        if observed.contains(&source) || observed.contains(&target) {
            return Ok(false);
        }

        // Z together with its ancestors: the nodes through which a collider
        // can be activated.
        let mut activating: FxHashSet<usize> = observed.clone();
        let mut stack: Vec<usize> = observed.iter().copied().collect();
        while let Some(v) = stack.pop() {
            for &p in &self.parents[v] {
                if activating.insert(p) {
                    stack.push(p);
                }
            }
        }

        let mut visited: FxHashSet<(usize, Entry)> = FxHashSet::default();
        let mut queue: VecDeque<(usize, Entry)> = VecDeque::new();
        queue.push_back((source, Entry::FromChild));

        while let Some((v, entry)) = queue.pop_front() {
            if !visited.insert((v, entry)) {
                continue;
            }
            let blocked = observed.contains(&v);
            if v == target && !blocked {
                return Ok(true);
            }
            match entry {
                Entry::FromChild => {
                    if !blocked {
                        for &p in &self.parents[v] {
                            queue.push_back((p, Entry::FromChild));
                        }
                        for &c in &self.children[v] {
                            queue.push_back((c, Entry::FromParent));
                        }
                    }
                }
                Entry::FromParent => {
                    if !blocked {
                        for &c in &self.children[v] {
                            queue.push_back((c, Entry::FromParent));
                        }
                    }
                    if activating.contains(&v) {
                        for &p in &self.parents[v] {
                            queue.push_back((p, Entry::FromChild));
                        }
                    }
                }
            }
        }
        Ok(false)
    }
}

impl IndependenceOracle for DSeparationOracle {
    fn is_independent(
        &self,
        x: &Variable,
        y: &Variable,
        z: &[Variable],
    ) -> Result<IndependenceResult, OracleError> {
        let connected = self.is_d_connected(x, y, z)?;
        Ok(IndependenceResult {
            independent: !connected,
            p_value: if connected { 0.0 } else { 1.0 },
        })
    }

    fn alpha(&self) -> f64 {
        self.alpha
    }

    fn set_alpha(&mut self, alpha: f64) -> Result<(), SearchError> {
        self.alpha = check_oracle_alpha(alpha)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "d-separation"
    }
}
