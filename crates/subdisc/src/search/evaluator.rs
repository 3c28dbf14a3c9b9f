//! Scoring of member sets, dispatched over the target concept.

use fixedbitset::FixedBitSet;
use tracing::debug;

use crate::bayesian::{Bayesian, BinaryTable, Dag};
use crate::config::SearchParameters;
use crate::error::{Result, SubdiscError};
use crate::quality::{
    BivariateAccumulator, CorrelationMeasure, MultiLabelMeasure, NominalMeasure, NumericMeasure,
    NumericStatistics, RegressionMeasure,
};
use crate::table::Table;
use crate::target::{TargetConcept, TargetType};

/// Outcome of scoring one member set.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub quality: f64,
    /// Network learned for the members, for multi-label targets.
    pub model: Option<Dag>,
}

/// Quality function for one target, holding copies of the target columns
/// and the population statistics the measure compares against.
#[derive(Debug, Clone)]
pub enum Evaluator {
    Nominal {
        positives: FixedBitSet,
        measure: NominalMeasure,
    },
    Numeric {
        values: Vec<f32>,
        measure: NumericMeasure,
    },
    Correlation {
        primary: Vec<f32>,
        secondary: Vec<f32>,
        measure: CorrelationMeasure,
    },
    Regression {
        primary: Vec<f32>,
        secondary: Vec<f32>,
        measure: RegressionMeasure,
    },
    MultiLabel {
        labels: BinaryTable,
        measure: MultiLabelMeasure,
    },
}

impl Evaluator {
    /// Build the evaluator for the configured target.
    ///
    /// Fails for targets that cannot be scored, before any search starts.
    pub fn new(table: &Table, params: &SearchParameters) -> Result<Self> {
        let target = &params.target;
        if target.target_type() == TargetType::MultiBinaryClassification {
            return Err(SubdiscError::UnsupportedTarget(
                TargetType::MultiBinaryClassification,
                "subgroup evaluation",
            ));
        }
        target.validate(table)?;

        let kind = params.quality_measure;
        let evaluator = match target {
            TargetConcept::SingleNominal { target, value } => {
                let column = table.column_checked(*target)?;
                let positives = column.equal_rows(&column.value_from_str(value)?);
                let measure =
                    NominalMeasure::new(kind, table.row_count(), positives.count_ones(..));
                debug!(
                    "Target '{}' = '{}': {} positives, base rate {:.4}",
                    column.name(),
                    value,
                    positives.count_ones(..),
                    measure.base_rate()
                );
                Self::Nominal { positives, measure }
            }
            TargetConcept::SingleNumeric { target } | TargetConcept::SingleOrdinal { target } => {
                let values = numeric_column(table, *target)?;
                let population = NumericStatistics::from_values(values.iter().copied());
                Self::Numeric {
                    values,
                    measure: NumericMeasure::new(kind, population),
                }
            }
            TargetConcept::DoubleCorrelation { primary, secondary } => {
                let primary = numeric_column(table, *primary)?;
                let secondary = numeric_column(table, *secondary)?;
                let measure = CorrelationMeasure::new(kind, &primary, &secondary);
                Self::Correlation {
                    primary,
                    secondary,
                    measure,
                }
            }
            TargetConcept::DoubleRegression { primary, secondary } => {
                let primary = numeric_column(table, *primary)?;
                let secondary = numeric_column(table, *secondary)?;
                let measure = RegressionMeasure::new(kind, &primary, &secondary);
                Self::Regression {
                    primary,
                    secondary,
                    measure,
                }
            }
            TargetConcept::MultiLabel { targets } => {
                let labels = BinaryTable::from_table(table, targets)?;
                let mut bayesian = Bayesian::new(&labels)?;
                bayesian.climb();
                let population = bayesian.into_dag();
                debug!("Population network: {}", population);
                let measure = MultiLabelMeasure::new(
                    kind,
                    population,
                    table.row_count(),
                    params.alpha,
                    params.beta,
                );
                Self::MultiLabel { labels, measure }
            }
            TargetConcept::MultiBinaryClassification { .. } => {
                return Err(SubdiscError::UnsupportedTarget(
                    TargetType::MultiBinaryClassification,
                    "subgroup evaluation",
                ));
            }
        };

        Ok(evaluator)
    }

    /// Score a member set.
    pub fn evaluate(&self, members: &FixedBitSet) -> Result<Evaluation> {
        let coverage = members.count_ones(..);
        let quality = match self {
            Self::Nominal { positives, measure } => {
                let count_head_body = positives.intersection_count(members);
                measure.calculate(count_head_body, coverage)
            }
            Self::Numeric { values, measure } => {
                let stats = NumericStatistics::from_values(members.ones().map(|r| values[r]));
                measure.calculate(&stats)
            }
            Self::Correlation {
                primary,
                secondary,
                measure,
            } => measure.calculate(&accumulate(primary, secondary, members)),
            Self::Regression {
                primary,
                secondary,
                measure,
            } => measure.calculate(&accumulate(primary, secondary, members)),
            Self::MultiLabel { labels, measure } => {
                let selected = labels.select_rows(members);
                let mut bayesian = Bayesian::new(&selected)?;
                bayesian.climb();
                let model = bayesian.into_dag();
                let quality = measure.calculate(coverage, &model);
                return Ok(Evaluation {
                    quality,
                    model: Some(model),
                });
            }
        };

        Ok(Evaluation {
            quality,
            model: None,
        })
    }

    pub fn target_type(&self) -> TargetType {
        match self {
            Self::Nominal { .. } => TargetType::SingleNominal,
            Self::Numeric { .. } => TargetType::SingleNumeric,
            Self::Correlation { .. } => TargetType::DoubleCorrelation,
            Self::Regression { .. } => TargetType::DoubleRegression,
            Self::MultiLabel { .. } => TargetType::MultiLabel,
        }
    }

    /// Binary target columns, for multi-label targets.
    pub fn labels(&self) -> Option<&BinaryTable> {
        match self {
            Self::MultiLabel { labels, .. } => Some(labels),
            _ => None,
        }
    }

    pub(crate) fn multi_label_measure(&self) -> Option<&MultiLabelMeasure> {
        match self {
            Self::MultiLabel { measure, .. } => Some(measure),
            _ => None,
        }
    }
}

fn numeric_column(table: &Table, index: usize) -> Result<Vec<f32>> {
    let column = table.column_checked(index)?;
    column
        .numeric_values()
        .map(<[f32]>::to_vec)
        .ok_or_else(|| SubdiscError::AttributeTypeMismatch {
            column: column.name().to_string(),
            expected: "numeric".to_string(),
            actual: column.attribute_type().to_string(),
        })
}

fn accumulate(primary: &[f32], secondary: &[f32], members: &FixedBitSet) -> BivariateAccumulator {
    let mut accumulator = BivariateAccumulator::new();
    for row in members.ones() {
        accumulator.add(primary[row], secondary[row]);
    }
    accumulator
}
