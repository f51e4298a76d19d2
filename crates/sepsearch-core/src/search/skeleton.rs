//! Depth-iteration controller.
//!
//! [`SkeletonSearch`] starts from the complete graph (or a supplied initial
//! adjacency) and runs passes at depth 0, 1, 2, ... Each pass tries to
//! separate every adjacent pair with conditioning sets of exactly that size.
//! The search stops after the pass at depth `d` once no variable has more
//! than `d` other neighbors to condition on, or when the configured maximum
//! depth is reached.
//!
//! ## FDR stage
//!
//! With FDR enabled every depth runs twice:
//! 1. a probe pass on a copy of the adjacency at the nominal level, which
//!    only collects p-values;
//! 2. the committed pass, with the oracle's alpha set to the FDR cutoff of
//!    the probe's p-values.
//!
//! The oracle's alpha is restored before `search` returns.

use crate::oracle::IndependenceOracle;
use crate::search::adjacency::Adjacency;
use crate::search::config::{FdrConfig, SearchConfig};
use crate::search::errors::SearchError;
use crate::search::fdr::fdr_cutoff;
use crate::search::knowledge::{Knowledge, ResolvedKnowledge};
use crate::search::observer::{NoopObserver, SearchObserver};
use crate::search::outcome::{DepthStats, IndependenceFact, SearchOutcome, SearchStats};
use crate::search::pass::{run_pass, PairOutcome};
use crate::search::sepset::{SepsetInsert, SepsetMap};
use crate::search::variable::{VarId, Variable, VariableIndex};

/// A configured skeleton search over a fixed set of variables.
///
/// The search value is not consumed by [`search`](Self::search), so one
/// configuration can be run against several oracles.
#[derive(Debug, Clone)]
pub struct SkeletonSearch {
    variables: Vec<Variable>,
    knowledge: Knowledge,
    initial: Option<Adjacency>,
    config: SearchConfig,
}

impl SkeletonSearch {
    /// A search over `variables` with default configuration and no
    /// knowledge. Fails on duplicate names.
    pub fn new(variables: &[Variable]) -> Result<Self, SearchError> {
        VariableIndex::new(variables)?;
        Ok(Self {
            variables: variables.to_vec(),
            knowledge: Knowledge::new(),
            initial: None,
            config: SearchConfig::default(),
        })
    }

    pub fn with_knowledge(mut self, knowledge: Knowledge) -> Self {
        self.knowledge = knowledge;
        self
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Starts from `adjacency` instead of the complete graph.
    ///
    /// Edges are matched by variable name. Every variable of `adjacency`
    /// must be a search variable; search variables it does not mention start
    /// isolated.
    pub fn with_initial_adjacency(mut self, adjacency: &Adjacency) -> Result<Self, SearchError> {
        let mut remapped = Adjacency::empty(&self.variables)?;
        let index = remapped.variable_index().clone();
        for var in adjacency.variables() {
            if index.id(var).is_none() {
                return Err(SearchError::InvalidAdjacency(format!(
                    "initial adjacency mentions '{}', which is not a search variable",
                    var
                )));
            }
        }
        for (x, y) in adjacency.edges() {
            remapped.insert_ids(index.require(&x)?, index.require(&y)?);
        }
        self.initial = Some(remapped);
        Ok(self)
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn knowledge(&self) -> &Knowledge {
        &self.knowledge
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Runs the search without an observer.
    pub fn search<O>(&self, oracle: &mut O) -> Result<SearchOutcome, SearchError>
    where
        O: IndependenceOracle + ?Sized,
    {
        self.search_with_observer(oracle, &mut NoopObserver)
    }

    /// Runs the search, reporting progress to `observer`.
    ///
    /// Oracle failures never surface here: the affected pair is kept as
    /// dependent and the failure is reported to the observer. An `Err` means
    /// the oracle rejected an alpha set by the FDR stage.
    pub fn search_with_observer<O>(
        &self,
        oracle: &mut O,
        observer: &mut dyn SearchObserver,
    ) -> Result<SearchOutcome, SearchError>
    where
        O: IndependenceOracle + ?Sized,
    {
        let adjacency = match &self.initial {
            Some(initial) => initial.clone(),
            None => Adjacency::complete(&self.variables)?,
        };
        let knowledge = self.knowledge.resolve(adjacency.variable_index());
        let original_alpha = oracle.alpha();
        let fdr = self
            .config
            .fdr()
            .map(|f| (*f, f.level().unwrap_or(original_alpha)));

        let mut run = Run {
            config: &self.config,
            knowledge: &knowledge,
            oracle,
            observer,
            adjacency,
            sepsets: SepsetMap::new(),
            stats: SearchStats::default(),
            facts: Vec::new(),
        };
        run.drop_forbidden_edges();
        let result = run.depths(fdr);

        let Run {
            oracle,
            observer,
            adjacency,
            sepsets,
            stats,
            facts,
            ..
        } = run;
        if fdr.is_some() {
            oracle.set_alpha(original_alpha)?;
        }
        result?;

        observer.search_finished(&stats);
        Ok(SearchOutcome {
            adjacency,
            sepsets,
            stats,
            facts,
        })
    }
}

/// State owned by one call to `search`.
struct Run<'a, 'o, O: ?Sized> {
    config: &'a SearchConfig,
    knowledge: &'a ResolvedKnowledge,
    oracle: &'a mut O,
    observer: &'a mut (dyn SearchObserver + 'o),
    adjacency: Adjacency,
    sepsets: SepsetMap,
    stats: SearchStats,
    facts: Vec<IndependenceFact>,
}

impl<O> Run<'_, '_, O>
where
    O: IndependenceOracle + ?Sized,
{
    /// Edges forbidden in both directions can never exist.
    fn drop_forbidden_edges(&mut self) {
        let adjacency = &self.adjacency;
        let knowledge = self.knowledge;
        let doomed: Vec<(VarId, VarId)> = adjacency
            .variable_index()
            .ids()
            .flat_map(move |x| {
                adjacency
                    .neighbor_ids(x)
                    .range(VarId(x.0 + 1)..)
                    .filter(move |&&y| knowledge.is_forbidden_both_ways(x, y))
                    .map(move |&y| (x, y))
            })
            .collect();
        for &(x, y) in &doomed {
            self.adjacency.remove_ids(x, y);
        }
        self.stats.forbidden_removed = doomed.len();
    }

    fn depths(&mut self, fdr: Option<(FdrConfig, f64)>) -> Result<(), SearchError> {
        let limit = self.config.depth().limit();
        self.observer.search_started(self.oracle.name(), self.adjacency.len(), limit);

        for depth in 0..=limit {
            self.observer.depth_started(depth, self.adjacency.free_degree());
            let mut stats = DepthStats {
                depth,
                ..DepthStats::default()
            };

            if let Some((fdr, nominal)) = fdr {
                let alpha = self.probe(depth, &fdr, nominal, &mut stats)?;
                self.oracle.set_alpha(alpha)?;
            }

            let outcomes = run_pass(
                &*self.oracle,
                self.knowledge,
                &mut self.adjacency,
                depth,
                self.config.pass_mode(),
            );
            self.commit(outcomes, depth, &mut stats);

            stats.free_degree = self.adjacency.free_degree();
            self.observer.depth_finished(&stats, &self.adjacency);
            self.stats.absorb(&stats);
            if stats.free_degree <= depth {
                break;
            }
        }
        Ok(())
    }

    /// Runs the probe pass for `depth` and returns the alpha to commit with.
    fn probe(
        &mut self,
        depth: usize,
        fdr: &FdrConfig,
        nominal: f64,
        stats: &mut DepthStats,
    ) -> Result<f64, SearchError> {
        self.oracle.set_alpha(nominal)?;
        let mut scratch = self.adjacency.clone();
        let outcomes = run_pass(
            &*self.oracle,
            self.knowledge,
            &mut scratch,
            depth,
            self.config.pass_mode(),
        );

        stats.probe_tests = outcomes.iter().map(|o| o.tests.len()).sum();
        let p_values: Vec<f64> = outcomes.iter().flat_map(PairOutcome::p_values).collect();
        match fdr_cutoff(nominal, &p_values, fdr.dependence()) {
            Some(cutoff) => {
                self.observer.fdr_cutoff(depth, nominal, cutoff, p_values.len());
                stats.fdr_cutoff = Some(cutoff);
                Ok(cutoff)
            }
            None => Ok(nominal),
        }
    }

    /// Replays committed pair outcomes into the sepsets, counters, fact log
    /// and observer.
    fn commit(&mut self, outcomes: Vec<PairOutcome>, depth: usize, stats: &mut DepthStats) {
        for outcome in outcomes {
            let index = self.adjacency.variable_index();
            let x = index.var(outcome.x).clone();
            let y = index.var(outcome.y).clone();

            if outcome.protected {
                stats.protected_pairs += 1;
                self.observer.edge_protected(&x, &y);
                continue;
            }

            for test in &outcome.tests {
                stats.tests += 1;
                match &test.result {
                    Ok(result) => {
                        let fact = IndependenceFact {
                            x: x.clone(),
                            y: y.clone(),
                            z: test.z.clone(),
                            p_value: result.p_value,
                            independent: result.independent,
                            depth,
                        };
                        self.observer.test_performed(&fact);
                        if self.config.record_facts() {
                            self.facts.push(fact);
                        }
                    }
                    Err(error) => {
                        stats.failed_tests += 1;
                        self.observer.test_failed(&x, &y, &test.z, error);
                    }
                }
            }

            if let Some(sepset) = outcome.sepset() {
                stats.removed += 1;
                if let SepsetInsert::Conflict { existing } =
                    self.sepsets.insert(&x, &y, sepset.to_vec())
                {
                    self.stats.sepset_conflicts += 1;
                    self.observer.sepset_conflict(&x, &y, &existing, sepset);
                }
                self.observer.edge_removed(&x, &y, sepset, depth);
            }
        }
    }
}
