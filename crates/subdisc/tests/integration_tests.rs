//! Integration tests for subgroup discovery and validation.
//!
//! These tests run the search end to end on small DataFrames built with
//! `df!`, converted through `Table::from_dataframe`.

use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::time::Instant;
use subdisc::validation::{empirical_p_value, regression_test};
use subdisc::{
    Bayesian, BinaryTable, QualityMeasureKind, SearchParameters, SearchStrategy, Subgroup,
    SubgroupDiscovery, SubgroupSet, Table, TargetConcept, Validation, ValidationMethod,
};

// ============================================================================
// Helper Functions
// ============================================================================

/// 100 rows: 50 red with 30 positives, 50 blue with 10 positives.
fn color_table() -> Table {
    let colors: Vec<&str> = (0..100).map(|i| if i < 50 { "red" } else { "blue" }).collect();
    let positives: Vec<bool> = (0..100).map(|i| i < 30 || (50..60).contains(&i)).collect();
    let df = df!(
        "color" => colors,
        "y" => positives,
    )
    .unwrap();
    Table::from_dataframe("colors", &df).unwrap()
}

/// 120 rows with nominal, numeric and binary descriptors and a binary target.
fn mixed_table() -> Table {
    let n = 120;
    let shapes: Vec<&str> = (0..n).map(|i| ["circle", "square", "star"][i % 3]).collect();
    let sizes: Vec<f64> = (0..n).map(|i| (i % 40) as f64).collect();
    let flags: Vec<bool> = (0..n).map(|i| i % 4 == 0).collect();
    let targets: Vec<bool> = (0..n).map(|i| i % 3 == 0 || i % 40 >= 30).collect();
    let df = df!(
        "shape" => shapes,
        "size" => sizes,
        "flag" => flags,
        "target" => targets,
    )
    .unwrap();
    Table::from_dataframe("mixed", &df).unwrap()
}

fn nominal_target(table: &Table, column: &str, value: &str) -> TargetConcept {
    TargetConcept::SingleNominal {
        target: table.column_index(column).unwrap(),
        value: value.to_string(),
    }
}

fn mine(params: &SearchParameters, table: &Table) -> SubgroupSet {
    let mut discovery = SubgroupDiscovery::new(params, table).unwrap();
    discovery.mine(Instant::now()).unwrap();
    discovery.into_result()
}

// ============================================================================
// Search Tests
// ============================================================================

#[test]
fn test_color_red_is_the_most_accurate_subgroup() {
    let table = color_table();
    let params = SearchParameters::builder(nominal_target(&table, "y", "1"))
        .quality_measure(QualityMeasureKind::Accuracy)
        .build()
        .unwrap();

    let result = mine(&params, &table);
    let best = result.get(0).unwrap();

    assert_eq!(best.conditions().to_string(), "color = 'red'");
    assert_eq!(best.coverage(), 50);
    assert!((best.quality() - 0.6).abs() < 1e-12);
    assert_eq!(best.id(), Some(1));
}

#[test]
fn test_color_red_wracc() {
    let table = color_table();
    let params = SearchParameters::builder(nominal_target(&table, "y", "1"))
        .quality_measure(QualityMeasureKind::WrAcc)
        .build()
        .unwrap();

    let result = mine(&params, &table);
    // blue has negative WRAcc and stays below the 0.0 minimum
    assert_eq!(result.len(), 1);
    assert!((result.best_score().unwrap() - 0.1).abs() < 1e-12);
}

#[test]
fn test_result_invariants_hold_for_every_strategy() {
    let table = mixed_table();
    for strategy in [
        SearchStrategy::Beam,
        SearchStrategy::BestFirst,
        SearchStrategy::BreadthFirst,
        SearchStrategy::DepthFirst,
    ] {
        let params = SearchParameters::builder(nominal_target(&table, "target", "true"))
            .search_depth(2)
            .minimum_coverage(8)
            .maximum_subgroups(25)
            .strategy(strategy)
            .strategy_width(10)
            .build()
            .unwrap();
        let result = mine(&params, &table);

        assert!(!result.is_empty(), "{:?} found nothing", strategy);
        assert!(result.len() <= 25);

        let mut member_sets = HashSet::new();
        let mut previous = f64::INFINITY;
        for subgroup in &result {
            assert!(subgroup.coverage() >= 8);
            assert!((1..=2).contains(&subgroup.depth()));
            assert!(!subgroup.conditions().uses_attribute(3));
            assert_eq!(
                &table.evaluate_list(subgroup.conditions()).unwrap(),
                subgroup.members()
            );
            assert!(member_sets.insert(subgroup.members().clone()));
            assert!(subgroup.quality() <= previous);
            assert!(subgroup.quality() > 0.0);
            previous = subgroup.quality();
        }
    }
}

#[test]
fn test_root_subgroup_covers_the_table() {
    let table = mixed_table();
    let root = Subgroup::root(table.row_count());
    assert_eq!(root.coverage(), 120);
    assert_eq!(root.depth(), 0);
    assert_eq!(&table.all_rows(), root.members());
}

#[test]
fn test_unsupported_target_fails_before_search() {
    let table = mixed_table();
    let params = SearchParameters::builder(TargetConcept::MultiBinaryClassification {
        targets: vec![2, 3],
    })
    .build()
    .unwrap();
    let error = SubgroupDiscovery::new(&params, &table).err().unwrap();
    assert_eq!(error.error_code(), "UNSUPPORTED_TARGET");
}

#[test]
fn test_multi_label_subgroups_carry_networks() {
    let n = 100;
    let halves: Vec<&str> = (0..n).map(|i| if i < 50 { "first" } else { "second" }).collect();
    let a: Vec<bool> = (0..n).map(|i| i % 2 == 0).collect();
    let b: Vec<bool> = (0..n)
        .map(|i| if i < 50 { i % 2 == 0 } else { (i / 2) % 2 == 0 })
        .collect();
    let df = df!("half" => halves, "a" => a, "b" => b).unwrap();
    let table = Table::from_dataframe("labels", &df).unwrap();

    let params = SearchParameters::builder(TargetConcept::MultiLabel {
        targets: vec![1, 2],
    })
    .quality_measure(QualityMeasureKind::Weed)
    .minimum_coverage(10)
    .build()
    .unwrap();

    let result = mine(&params, &table);
    assert!(!result.is_empty());
    for subgroup in &result {
        let model = subgroup.model().unwrap();
        assert_eq!(model.size(), 2);
        assert!(subgroup.quality().is_finite());
    }
}

// ============================================================================
// Bayesian Scoring Tests
// ============================================================================

#[test]
fn test_bdeu_prefers_correlated_columns() {
    let n = 60;
    let a: Vec<bool> = (0..n).map(|i| i % 2 == 0).collect();
    let copy = a.clone();
    let unrelated: Vec<bool> = (0..n).map(|i| (i / 2) % 2 == 0).collect();
    let df = df!("a" => a, "copy" => copy, "unrelated" => unrelated).unwrap();
    let table = Table::from_dataframe("bits", &df).unwrap();

    let correlated = BinaryTable::from_table(&table, &[0, 1]).unwrap();
    let independent = BinaryTable::from_table(&table, &[0, 2]).unwrap();
    assert!(independent.bdeu() < correlated.bdeu());

    let mut bayesian = Bayesian::new(&correlated).unwrap();
    assert_eq!(bayesian.climb().edge_count(), 1);

    let mut bayesian = Bayesian::new(&independent).unwrap();
    assert_eq!(bayesian.climb().edge_count(), 0);
}

// ============================================================================
// Validation Tests
// ============================================================================

#[test]
fn test_random_subsets_converge_to_base_rate() {
    let mut table = color_table();
    let params = SearchParameters::builder(nominal_target(&table, "y", "1"))
        .quality_measure(QualityMeasureKind::Accuracy)
        .minimum_coverage(10)
        .build()
        .unwrap();

    let samples = Validation::with_seed(&params, &mut table, 42)
        .qualities(ValidationMethod::RandomSubsets, 1000)
        .unwrap();

    assert_eq!(samples.len(), 1000);
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    assert!((mean - 0.4).abs() < 0.02, "mean {mean}");
}

#[test]
fn test_empirical_p_value_against_fixed_samples() {
    let table = color_table();
    let params = SearchParameters::builder(nominal_target(&table, "y", "1"))
        .quality_measure(QualityMeasureKind::Accuracy)
        .build()
        .unwrap();
    let result = mine(&params, &table);

    let mut samples = vec![0.3; 95];
    samples.extend([0.7; 4]);
    let p_value = empirical_p_value(&samples, &result).unwrap();
    assert!((p_value - 4.0 / 99.0).abs() < 1e-12);

    let scores = regression_test(&samples, &result).unwrap();
    assert!(scores.top1.is_finite());
    assert_eq!(scores.top10, None);
}

#[test]
fn test_swap_randomization_leaves_table_unchanged() {
    let mut table = mixed_table();
    let original = table.clone();
    let params = SearchParameters::builder(nominal_target(&table, "target", "true"))
        .minimum_coverage(5)
        .build()
        .unwrap();

    let samples = Validation::with_seed(&params, &mut table, 17)
        .qualities(ValidationMethod::SwapRandomization, 10)
        .unwrap();

    assert_eq!(samples.len(), 10);
    assert_eq!(table, original);
}

#[test]
fn test_validation_report_attaches_p_values() {
    let mut table = color_table();
    let params = SearchParameters::builder(nominal_target(&table, "y", "1"))
        .quality_measure(QualityMeasureKind::WrAcc)
        .minimum_coverage(5)
        .build()
        .unwrap();
    let mut result = mine(&params, &table);

    let report = Validation::with_seed(&params, &mut table, 8)
        .validate(ValidationMethod::RandomDescriptions, 50, &mut result)
        .unwrap();

    assert_eq!(report.method, ValidationMethod::RandomDescriptions);
    assert_eq!(report.samples.len(), 50);
    assert!(result.iter().all(|s| s.p_value().is_some()));

    let json = serde_json::to_value(result.get(0).unwrap().summary()).unwrap();
    assert_eq!(json["coverage"], 50);
    assert!(json.get("p_value").is_some());
}
