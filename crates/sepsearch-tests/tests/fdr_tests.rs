//! False-discovery-rate stage.

use sepsearch_core::oracle::LookupOracle;
use sepsearch_core::{
    Depth, FdrConfig, FdrDependence, IndependenceOracle, RecordingObserver, SearchConfig,
    SearchEvent, SkeletonSearch,
};
use sepsearch_tests::{abcd, Dag, ScrambledOracle};

/// Depth-0 p-values: A-B 0.9, C-D 0.03, B-D 0.012, everything else 0.0.
fn depth_zero_oracle() -> LookupOracle {
    let vars = abcd();
    let mut oracle = LookupOracle::new(0.05).unwrap();
    oracle
        .set_p_value(&vars[0], &vars[1], &[], 0.9)
        .unwrap()
        .set_p_value(&vars[2], &vars[3], &[], 0.03)
        .unwrap()
        .set_p_value(&vars[1], &vars[3], &[], 0.012)
        .unwrap();
    oracle
}

fn depth_zero(fdr: FdrConfig) -> SearchConfig {
    SearchConfig::new()
        .with_depth(Depth::Bounded(0))
        .with_fdr(fdr)
}

#[test]
fn benjamini_hochberg_cutoff_drives_the_committed_pass() {
    let vars = abcd();
    let mut oracle = depth_zero_oracle();
    let outcome = SkeletonSearch::new(&vars)
        .unwrap()
        .with_config(depth_zero(FdrConfig::new()))
        .search(&mut oracle)
        .unwrap();

    // Sorted: 0, 0, 0, 0.012, 0.03, 0.9 with rank thresholds k * 0.05 / 6.
    // Rank 5 needs 0.03 <= 0.0417: passes, so the cutoff is 0.03.
    assert_eq!(outcome.stats.depths[0].fdr_cutoff, Some(0.03));
    assert!(outcome.is_adjacent(&vars[2], &vars[3]));
    assert!(outcome.is_adjacent(&vars[1], &vars[3]));
    assert!(!outcome.is_adjacent(&vars[0], &vars[1]));
}

#[test]
fn benjamini_yekutieli_is_stricter() {
    let vars = abcd();
    let mut oracle = depth_zero_oracle();
    let fdr = FdrConfig::new().with_dependence(FdrDependence::Arbitrary);
    let outcome = SkeletonSearch::new(&vars)
        .unwrap()
        .with_config(depth_zero(fdr))
        .search(&mut oracle)
        .unwrap();

    // H(6) = 2.45: rank 4 needs 0.012 <= 4 * 0.05 / 14.7 = 0.0136, rank 5
    // needs 0.03 <= 0.0170 and fails. Cutoff 0.012 drops C-D.
    assert_eq!(outcome.stats.depths[0].fdr_cutoff, Some(0.012));
    assert!(!outcome.is_adjacent(&vars[2], &vars[3]));
    assert!(outcome.is_adjacent(&vars[1], &vars[3]));
}

#[test]
fn explicit_level_overrides_oracle_alpha() {
    let vars = abcd();
    let mut oracle = depth_zero_oracle();
    let fdr = FdrConfig::new().with_level(0.01).unwrap();
    let outcome = SkeletonSearch::new(&vars)
        .unwrap()
        .with_config(depth_zero(fdr))
        .search(&mut oracle)
        .unwrap();

    // Rank thresholds k * 0.01 / 6: only the three zeros pass.
    assert_eq!(outcome.stats.depths[0].fdr_cutoff, Some(0.0));
    assert_eq!(outcome.edges().len(), 3);
    assert_eq!(oracle.alpha(), 0.05);
}

#[test]
fn probe_pass_is_silent() {
    let vars = abcd();
    let mut oracle = depth_zero_oracle();
    let mut recorder = RecordingObserver::new();
    let outcome = SkeletonSearch::new(&vars)
        .unwrap()
        .with_config(depth_zero(FdrConfig::new()))
        .search_with_observer(&mut oracle, &mut recorder)
        .unwrap();

    let tested = recorder
        .events
        .iter()
        .filter(|e| matches!(e, SearchEvent::Tested(_)))
        .count();
    assert_eq!(tested, outcome.stats.tests);
    assert_eq!(outcome.stats.depths[0].probe_tests, 6);
    assert_eq!(oracle.call_count(), 12);
}

#[test]
fn empty_batch_keeps_the_nominal_level() {
    // A single variable has no pairs, so the probe collects nothing.
    let vars = sepsearch_core::variables(["A"]);
    let mut oracle = LookupOracle::new(0.05).unwrap();
    let outcome = SkeletonSearch::new(&vars)
        .unwrap()
        .with_config(SearchConfig::new().with_fdr(FdrConfig::new()))
        .search(&mut oracle)
        .unwrap();
    assert_eq!(outcome.stats.depths[0].fdr_cutoff, None);
    assert_eq!(oracle.alpha(), 0.05);
}

#[test]
fn fdr_search_terminates_and_restores_alpha() {
    let dag = Dag::chain(6);
    let mut oracle = ScrambledOracle::new(7).failing_one_in(11);
    let outcome = SkeletonSearch::new(&dag.vars)
        .unwrap()
        .with_config(SearchConfig::new().with_fdr(FdrConfig::new()))
        .search(&mut oracle)
        .unwrap();

    assert!(outcome.adjacency.is_symmetric());
    assert!(outcome.stats.depths.len() <= dag.vars.len());
    assert_eq!(oracle.alpha(), 0.05);
}
