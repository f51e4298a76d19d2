//! Serialization of configuration and outcomes (`serde` feature).

#![cfg(feature = "serde")]

use sepsearch_core::oracle::LookupOracle;
use sepsearch_core::{Depth, FdrConfig, PassMode, SearchConfig, SkeletonSearch};
use sepsearch_tests::abcd;

#[test]
fn config_round_trips_through_json() {
    let config = SearchConfig::new()
        .with_depth(Depth::Bounded(3))
        .with_fdr(FdrConfig::new().with_level(0.1).unwrap())
        .with_pass_mode(PassMode::Stable);
    let json = serde_json::to_string(&config).unwrap();
    let back: SearchConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}

#[test]
fn outcome_serializes_names_and_sepsets() {
    let vars = abcd();
    let mut oracle = LookupOracle::new(0.05).unwrap();
    oracle.set_independent(&vars[0], &vars[1], &[vars[2].clone()]);
    let outcome = SkeletonSearch::new(&vars)
        .unwrap()
        .with_config(SearchConfig::new().with_record_facts(true))
        .search(&mut oracle)
        .unwrap();

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["adjacency"]["variables"], serde_json::json!(["A", "B", "C", "D"]));
    assert_eq!(value["adjacency"]["edges"].as_array().unwrap().len(), 5);
    assert_eq!(
        value["sepsets"],
        serde_json::json!([{ "x": "A", "y": "B", "sepset": ["C"] }])
    );
    assert_eq!(value["stats"]["edges_removed"], 1);
    assert!(value["facts"].as_array().unwrap().len() >= 1);
}
