//! Target concepts: what a subgroup is compared against.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SubdiscError};
use crate::table::{AttributeType, Table};

/// Kind of target concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetType {
    SingleNominal,
    SingleNumeric,
    SingleOrdinal,
    DoubleCorrelation,
    DoubleRegression,
    MultiLabel,
    MultiBinaryClassification,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleNominal => "single-nominal",
            Self::SingleNumeric => "single-numeric",
            Self::SingleOrdinal => "single-ordinal",
            Self::DoubleCorrelation => "double-correlation",
            Self::DoubleRegression => "double-regression",
            Self::MultiLabel => "multi-label",
            Self::MultiBinaryClassification => "multi-binary-classification",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The target of a search, referring to columns by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TargetConcept {
    /// Rows where a column equals a value are the positives.
    SingleNominal { target: usize, value: String },
    SingleNumeric { target: usize },
    SingleOrdinal { target: usize },
    DoubleCorrelation { primary: usize, secondary: usize },
    DoubleRegression { primary: usize, secondary: usize },
    /// Binary columns modelled jointly as a Bayesian network.
    MultiLabel { targets: Vec<usize> },
    MultiBinaryClassification { targets: Vec<usize> },
}

impl TargetConcept {
    pub fn target_type(&self) -> TargetType {
        match self {
            Self::SingleNominal { .. } => TargetType::SingleNominal,
            Self::SingleNumeric { .. } => TargetType::SingleNumeric,
            Self::SingleOrdinal { .. } => TargetType::SingleOrdinal,
            Self::DoubleCorrelation { .. } => TargetType::DoubleCorrelation,
            Self::DoubleRegression { .. } => TargetType::DoubleRegression,
            Self::MultiLabel { .. } => TargetType::MultiLabel,
            Self::MultiBinaryClassification { .. } => TargetType::MultiBinaryClassification,
        }
    }

    /// Indices of every column the target reads.
    pub fn target_indices(&self) -> Vec<usize> {
        match self {
            Self::SingleNominal { target, .. }
            | Self::SingleNumeric { target }
            | Self::SingleOrdinal { target } => vec![*target],
            Self::DoubleCorrelation { primary, secondary }
            | Self::DoubleRegression { primary, secondary } => vec![*primary, *secondary],
            Self::MultiLabel { targets } | Self::MultiBinaryClassification { targets } => {
                targets.clone()
            }
        }
    }

    /// Target attributes are never used in descriptions.
    pub fn is_target_attribute(&self, index: usize) -> bool {
        self.target_indices().contains(&index)
    }

    /// Check that the referenced columns exist and have usable types.
    pub fn validate(&self, table: &Table) -> Result<()> {
        let indices = self.target_indices();
        if indices.is_empty() {
            return Err(SubdiscError::InvalidConfig(
                "target concept has no target columns".to_string(),
            ));
        }

        for index in indices {
            let column = table.column_checked(index)?;
            let attribute_type = column.attribute_type();
            let expected = match self {
                Self::SingleNominal { value, .. } => {
                    column.value_from_str(value)?;
                    continue;
                }
                Self::SingleNumeric { .. }
                | Self::DoubleCorrelation { .. }
                | Self::DoubleRegression { .. } => AttributeType::Numeric,
                Self::SingleOrdinal { .. } => AttributeType::Ordinal,
                Self::MultiLabel { .. } | Self::MultiBinaryClassification { .. } => {
                    AttributeType::Binary
                }
            };

            let compatible = match expected {
                AttributeType::Numeric | AttributeType::Ordinal => attribute_type.is_numeric_like(),
                other => attribute_type == other,
            };
            if !compatible {
                return Err(SubdiscError::AttributeTypeMismatch {
                    column: column.name().to_string(),
                    expected: expected.to_string(),
                    actual: attribute_type.to_string(),
                });
            }
        }
        Ok(())
    }
}
