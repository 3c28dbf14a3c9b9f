//! Randomized significance testing of search results.
//!
//! Each method draws `R` baseline quality samples from data in which any
//! real relation between descriptors and target is destroyed or ignored.
//! The samples are then compared with the qualities the search found.

mod statistics;
mod swap;

pub use statistics::{
    RegressionTestScores, assign_normal_p_values, empirical_p_value, regression_test,
};
pub use swap::MAX_SWAP_RETRIES;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::subscriber::NoSubscriber;
use tracing::{debug, info};

use crate::condition::{Condition, ConditionList, ConditionValue, Operator};
use crate::config::SearchParameters;
use crate::error::{Result, SubdiscError};
use crate::search::{Evaluator, SubgroupDiscovery, SubgroupSet};
use crate::table::{AttributeType, Table};
use crate::target::TargetType;

/// Draws per sample before random description sampling gives up.
pub const MAX_DESCRIPTION_ATTEMPTS: usize = 1000;

/// How baseline qualities are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMethod {
    /// Score uniformly drawn row sets.
    RandomSubsets,
    /// Score random conjunctions over the descriptive attributes.
    RandomDescriptions,
    /// Permute the target columns and mine again.
    SwapRandomization,
}

impl fmt::Display for ValidationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RandomSubsets => "random subsets",
            Self::RandomDescriptions => "random descriptions",
            Self::SwapRandomization => "swap randomization",
        };
        f.write_str(name)
    }
}

/// Outcome of validating one result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub method: ValidationMethod,
    pub samples: Vec<f64>,
    pub empirical_p_value: f64,
    pub regression: RegressionTestScores,
}

/// Validation runs for one configuration and table.
///
/// The table is borrowed mutably because swap randomization permutes the
/// target columns in place; they are restored before any method returns.
pub struct Validation<'t> {
    params: &'t SearchParameters,
    table: &'t mut Table,
    rng: StdRng,
}

impl<'t> Validation<'t> {
    /// Seeded from `params.random_seed`, or from entropy when unset.
    pub fn new(params: &'t SearchParameters, table: &'t mut Table) -> Self {
        let rng = match params.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { params, table, rng }
    }

    pub fn with_seed(params: &'t SearchParameters, table: &'t mut Table, seed: u64) -> Self {
        Self {
            params,
            table,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draw `repetitions` baseline quality samples.
    pub fn qualities(&mut self, method: ValidationMethod, repetitions: usize) -> Result<Vec<f64>> {
        self.params.validate()?;
        if self.params.target.target_type() == TargetType::MultiBinaryClassification {
            return Err(SubdiscError::UnsupportedTarget(
                TargetType::MultiBinaryClassification,
                "validation",
            ));
        }

        let begin = Instant::now();
        info!("Validating with {} ({} repetitions)", method, repetitions);
        let samples = match method {
            ValidationMethod::RandomSubsets => self.random_subsets(repetitions)?,
            ValidationMethod::RandomDescriptions => self.random_descriptions(repetitions)?,
            ValidationMethod::SwapRandomization => self.swap_randomization(repetitions)?,
        };
        info!(
            "Drew {} baseline samples in {:.2?}",
            samples.len(),
            begin.elapsed()
        );
        Ok(samples)
    }

    /// Draw samples, then attach normal p-values to `result` and compute the
    /// empirical p-value and regression test scores.
    pub fn validate(
        &mut self,
        method: ValidationMethod,
        repetitions: usize,
        result: &mut SubgroupSet,
    ) -> Result<ValidationReport> {
        let samples = self.qualities(method, repetitions)?;
        let empirical_p_value = empirical_p_value(&samples, result)?;
        let regression = regression_test(&samples, result)?;
        assign_normal_p_values(&samples, result)?;
        Ok(ValidationReport {
            method,
            samples,
            empirical_p_value,
            regression,
        })
    }

    fn random_subsets(&mut self, repetitions: usize) -> Result<Vec<f64>> {
        let table: &Table = &*self.table;
        let rows = table.row_count();
        let minimum = self.params.minimum_coverage;
        if minimum >= rows {
            return Err(SubdiscError::InvalidConfig(format!(
                "minimum coverage {minimum} leaves no random subset size below {rows} rows"
            )));
        }

        let evaluator = Evaluator::new(table, self.params)?;
        (0..repetitions)
            .map(|_| {
                let size = self.rng.gen_range(minimum..rows);
                let members = table.random_subgroup(size, &mut self.rng);
                Ok(evaluator.evaluate(&members)?.quality)
            })
            .collect()
    }

    fn random_descriptions(&mut self, repetitions: usize) -> Result<Vec<f64>> {
        let table: &Table = &*self.table;
        let attributes: Vec<usize> = (0..table.column_count())
            .filter(|&i| !self.params.target.is_target_attribute(i))
            .collect();
        if attributes.is_empty() {
            return Err(SubdiscError::InvalidConfig(
                "no descriptive attributes to build random descriptions from".to_string(),
            ));
        }

        let evaluator = Evaluator::new(table, self.params)?;
        let rows = table.row_count();
        let minimum = self.params.minimum_coverage;
        let mut samples = Vec::with_capacity(repetitions);
        for _ in 0..repetitions {
            let mut found = None;
            for _ in 0..MAX_DESCRIPTION_ATTEMPTS {
                let conditions =
                    random_conditions(table, &attributes, self.params.search_depth, &mut self.rng)?;
                let members = table.evaluate_list(&conditions)?;
                let coverage = members.count_ones(..);
                if coverage >= minimum && coverage < rows {
                    debug!("Random description '{}' covers {}", conditions, coverage);
                    found = Some(evaluator.evaluate(&members)?.quality);
                    break;
                }
            }
            match found {
                Some(quality) => samples.push(quality),
                None => {
                    return Err(SubdiscError::RandomDescriptionExhausted {
                        minimum,
                        rows,
                        attempts: MAX_DESCRIPTION_ATTEMPTS,
                    });
                }
            }
        }
        Ok(samples)
    }

    fn swap_randomization(&mut self, repetitions: usize) -> Result<Vec<f64>> {
        let params = self.params;
        params.target.validate(&*self.table)?;

        swap::run_swap_repetitions(
            &mut *self.table,
            &params.target,
            repetitions,
            &mut self.rng,
            |table| {
                tracing::subscriber::with_default(NoSubscriber::default(), || -> Result<Option<f64>> {
                    let mut discovery = SubgroupDiscovery::new(params, table)?;
                    discovery.mine(Instant::now())?;
                    Ok(discovery.result().best_score())
                })
            },
        )
    }
}

/// A conjunction of `1..=max_depth` conditions over distinct attributes.
///
/// Numeric thresholds are drawn uniformly from the middle half of the
/// column's range.
fn random_conditions<R: Rng + ?Sized>(
    table: &Table,
    attributes: &[usize],
    max_depth: usize,
    rng: &mut R,
) -> Result<ConditionList> {
    let depth = rng.gen_range(1..=max_depth).min(attributes.len());
    let mut conditions = ConditionList::new();

    for pick in rand::seq::index::sample(rng, attributes.len(), depth) {
        let column = table.column_checked(attributes[pick])?;
        let attribute = column.attribute().clone();
        let condition = match column.attribute_type() {
            AttributeType::Binary => {
                Condition::new(attribute, Operator::Equals, ConditionValue::Binary(rng.r#gen()))?
            }
            AttributeType::Nominal => {
                let domain = column.domain();
                if domain.is_empty() {
                    continue;
                }
                let value = domain[rng.gen_range(0..domain.len())].clone();
                Condition::new(attribute, Operator::Equals, value)?
            }
            AttributeType::Numeric | AttributeType::Ordinal => {
                let (Some(min), Some(max)) = (column.min(), column.max()) else {
                    continue;
                };
                let operator = if rng.gen_bool(0.5) {
                    Operator::LessThanOrEqual
                } else {
                    Operator::GreaterThanOrEqual
                };
                let range = max - min;
                let threshold = min + range / 4.0 + range * rng.r#gen::<f32>() / 2.0;
                Condition::new(attribute, operator, ConditionValue::Numeric(threshold))?
            }
        };
        conditions.add(condition);
    }
    Ok(conditions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::QualityMeasureKind;
    use crate::table::Column;
    use crate::target::TargetConcept;
    use pretty_assertions::assert_eq;

    fn table() -> Table {
        let n = 60;
        Table::new(
            "t",
            vec![
                Column::new_nominal(
                    "color",
                    (0..n)
                        .map(|i| ["red", "green", "blue"][i % 3].to_string())
                        .collect(),
                ),
                Column::new_numeric("x", (0..n).map(|i| i as f32).collect()),
                Column::new_binary("flag", (0..n).map(|i| i % 4 == 0).collect()),
                Column::new_binary("y", (0..n).map(|i| i >= 40).collect()),
            ],
        )
        .unwrap()
    }

    fn params(depth: usize) -> SearchParameters {
        SearchParameters::builder(TargetConcept::SingleNominal {
            target: 3,
            value: "1".to_string(),
        })
        .quality_measure(QualityMeasureKind::WrAcc)
        .search_depth(depth)
        .minimum_coverage(5)
        .build()
        .unwrap()
    }

    #[test]
    fn test_random_subsets_are_seeded() {
        let params = params(1);
        let mut t = table();
        let first = Validation::with_seed(&params, &mut t, 7)
            .qualities(ValidationMethod::RandomSubsets, 20)
            .unwrap();
        let second = Validation::with_seed(&params, &mut t, 7)
            .qualities(ValidationMethod::RandomSubsets, 20)
            .unwrap();
        assert_eq!(first.len(), 20);
        assert_eq!(first, second);
    }

    #[test]
    fn test_random_subsets_need_room_below_row_count() {
        let params = SearchParameters::builder(TargetConcept::SingleNominal {
            target: 3,
            value: "1".to_string(),
        })
        .minimum_coverage(60)
        .build()
        .unwrap();
        let mut t = table();
        let error = Validation::with_seed(&params, &mut t, 1)
            .qualities(ValidationMethod::RandomSubsets, 5)
            .unwrap_err();
        assert_eq!(error.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_random_conditions_respect_depth_and_targets() {
        let t = table();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let conditions = random_conditions(&t, &[0, 1, 2], 2, &mut rng).unwrap();
            assert!((1..=2).contains(&conditions.len()));
            assert!(!conditions.uses_attribute(3));
            for condition in &conditions {
                if let ConditionValue::Numeric(threshold) = condition.value() {
                    assert!((14.75..=44.25).contains(threshold));
                }
            }
        }
    }

    #[test]
    fn test_random_descriptions() {
        let params = params(2);
        let mut t = table();
        let samples = Validation::with_seed(&params, &mut t, 5)
            .qualities(ValidationMethod::RandomDescriptions, 25)
            .unwrap();
        assert_eq!(samples.len(), 25);
        assert!(samples.iter().all(|q| q.is_finite()));
    }

    #[test]
    fn test_swap_randomization_restores_table() {
        let params = params(1);
        let mut t = table();
        let original = t.clone();
        let samples = Validation::with_seed(&params, &mut t, 9)
            .qualities(ValidationMethod::SwapRandomization, 5)
            .unwrap();
        assert_eq!(samples.len(), 5);
        assert_eq!(t, original);
    }

    #[test]
    fn test_validate_attaches_p_values() {
        let params = params(1);
        let mut t = table();
        let mut result = {
            let mut discovery = SubgroupDiscovery::new(&params, &t).unwrap();
            discovery.mine(Instant::now()).unwrap();
            discovery.into_result()
        };
        assert!(!result.is_empty());

        let report = Validation::with_seed(&params, &mut t, 2)
            .validate(ValidationMethod::RandomSubsets, 30, &mut result)
            .unwrap();
        assert_eq!(report.samples.len(), 30);
        assert!((0.0..=1.0).contains(&report.empirical_p_value));
        assert!(result.iter().all(|s| s.p_value().is_some()));
    }

    #[test]
    fn test_multi_binary_classification_is_rejected() {
        let params = SearchParameters::builder(TargetConcept::MultiBinaryClassification {
            targets: vec![2, 3],
        })
        .build()
        .unwrap();
        let mut t = table();
        let error = Validation::with_seed(&params, &mut t, 1)
            .qualities(ValidationMethod::SwapRandomization, 3)
            .unwrap_err();
        assert_eq!(error.error_code(), "UNSUPPORTED_TARGET");
    }
}
