//! Atomic attribute predicates and their conjunctions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, SubdiscError};
use crate::table::{Attribute, AttributeType};

/// Comparison operator of a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    LessThanOrEqual,
    GreaterThanOrEqual,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThanOrEqual => ">=",
        }
    }

    /// Operators that can be applied to an attribute of the given type.
    pub fn allowed_for(attribute_type: AttributeType) -> &'static [Operator] {
        match attribute_type {
            AttributeType::Nominal | AttributeType::Binary => &[Operator::Equals],
            AttributeType::Numeric | AttributeType::Ordinal => {
                &[Operator::LessThanOrEqual, Operator::GreaterThanOrEqual]
            }
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Right-hand side of a [`Condition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Binary(bool),
    Numeric(f32),
    Nominal(String),
}

impl ConditionValue {
    fn matches_type(&self, attribute_type: AttributeType) -> bool {
        matches!(
            (self, attribute_type),
            (Self::Nominal(_), AttributeType::Nominal)
                | (Self::Numeric(_), AttributeType::Numeric | AttributeType::Ordinal)
                | (Self::Binary(_), AttributeType::Binary)
        )
    }
}

impl fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary(value) => f.write_str(if *value { "1" } else { "0" }),
            Self::Numeric(value) => write!(f, "{}", value),
            Self::Nominal(value) => write!(f, "'{}'", value),
        }
    }
}

/// A predicate `attribute operator value` over one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    attribute: Attribute,
    operator: Operator,
    value: ConditionValue,
}

impl Condition {
    /// Create a condition, checking that operator and value fit the attribute type.
    pub fn new(attribute: Attribute, operator: Operator, value: ConditionValue) -> Result<Self> {
        let attribute_type = attribute.attribute_type();
        if !Operator::allowed_for(attribute_type).contains(&operator) {
            return Err(SubdiscError::InvalidConfig(format!(
                "operator '{}' cannot be applied to {} attribute '{}'",
                operator,
                attribute_type,
                attribute.name()
            )));
        }
        if !value.matches_type(attribute_type) {
            return Err(SubdiscError::AttributeTypeMismatch {
                column: attribute.name().to_string(),
                expected: attribute_type.to_string(),
                actual: format!("{:?}", value),
            });
        }

        Ok(Self {
            attribute,
            operator,
            value,
        })
    }

    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &ConditionValue {
        &self.value
    }

    /// Test a numeric value against this condition.
    #[inline]
    pub(crate) fn holds_numeric(&self, value: f32) -> bool {
        match (&self.value, self.operator) {
            (ConditionValue::Numeric(threshold), Operator::LessThanOrEqual) => value <= *threshold,
            (ConditionValue::Numeric(threshold), Operator::GreaterThanOrEqual) => {
                value >= *threshold
            }
            (ConditionValue::Numeric(threshold), Operator::Equals) => value == *threshold,
            _ => false,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.attribute.name_or_short(),
            self.operator,
            self.value
        )
    }
}

/// Ordered conjunction of conditions. Order only affects display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionList {
    conditions: Vec<Condition>,
}

impl ConditionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    /// Copy of this list extended with one more condition.
    pub fn with(&self, condition: Condition) -> Self {
        let mut conditions = Vec::with_capacity(self.conditions.len() + 1);
        conditions.extend(self.conditions.iter().cloned());
        conditions.push(condition);
        Self { conditions }
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Condition> {
        self.conditions.iter()
    }

    /// Whether any condition is on the attribute with this index.
    pub fn uses_attribute(&self, index: usize) -> bool {
        self.conditions.iter().any(|c| c.attribute.index() == index)
    }
}

impl<'a> IntoIterator for &'a ConditionList {
    type Item = &'a Condition;
    type IntoIter = std::slice::Iter<'a, Condition>;

    fn into_iter(self) -> Self::IntoIter {
        self.conditions.iter()
    }
}

impl FromIterator<Condition> for ConditionList {
    fn from_iter<I: IntoIterator<Item = Condition>>(iter: I) -> Self {
        Self {
            conditions: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ConditionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conditions.is_empty() {
            return f.write_str("(empty)");
        }
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{}", condition)?;
        }
        Ok(())
    }
}
