//! Typed column storage.

use fixedbitset::FixedBitSet;
use std::collections::BTreeSet;

use crate::condition::{Condition, ConditionValue, Operator};
use crate::error::{Result, SubdiscError};

use super::{Attribute, AttributeType};

/// Values of a column. Ordinal columns are stored as numbers.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Nominal(Vec<String>),
    Numeric(Vec<f32>),
    Binary(FixedBitSet),
}

impl ColumnData {
    fn len(&self) -> usize {
        match self {
            Self::Nominal(values) => values.len(),
            Self::Numeric(values) => values.len(),
            Self::Binary(bits) => bits.len(),
        }
    }
}

/// A fixed-length sequence of values of one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    attribute: Attribute,
    data: ColumnData,
}

impl Column {
    pub fn new_nominal(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            attribute: Attribute::new(name, AttributeType::Nominal, 0),
            data: ColumnData::Nominal(values),
        }
    }

    pub fn new_numeric(name: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            attribute: Attribute::new(name, AttributeType::Numeric, 0),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn new_ordinal(name: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            attribute: Attribute::new(name, AttributeType::Ordinal, 0),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn new_binary(name: impl Into<String>, values: Vec<bool>) -> Self {
        let mut bits = FixedBitSet::with_capacity(values.len());
        for (row, value) in values.into_iter().enumerate() {
            bits.set(row, value);
        }
        Self {
            attribute: Attribute::new(name, AttributeType::Binary, 0),
            data: ColumnData::Binary(bits),
        }
    }

    /// Attach an abbreviated display name.
    pub fn with_short_name(mut self, short_name: impl Into<String>) -> Self {
        self.attribute = self.attribute.with_short_name(short_name);
        self
    }

    pub fn attribute(&self) -> &Attribute {
        &self.attribute
    }

    pub fn attribute_type(&self) -> AttributeType {
        self.attribute.attribute_type()
    }

    pub fn name(&self) -> &str {
        self.attribute.name()
    }

    pub fn index(&self) -> usize {
        self.attribute.index()
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.attribute.set_index(index);
    }

    /// Numeric values, for numeric and ordinal columns.
    pub fn numeric_values(&self) -> Option<&[f32]> {
        match &self.data {
            ColumnData::Numeric(values) => Some(values),
            _ => None,
        }
    }

    /// Row bits, for binary columns.
    pub fn binary_values(&self) -> Option<&FixedBitSet> {
        match &self.data {
            ColumnData::Binary(bits) => Some(bits),
            _ => None,
        }
    }

    /// Value of a row as a float. Binary values read as `0.0`/`1.0`.
    pub fn float_at(&self, row: usize) -> Option<f32> {
        match &self.data {
            ColumnData::Numeric(values) => values.get(row).copied(),
            ColumnData::Binary(bits) => {
                (row < bits.len()).then(|| if bits.contains(row) { 1.0 } else { 0.0 })
            }
            ColumnData::Nominal(_) => None,
        }
    }

    pub fn binary_at(&self, row: usize) -> Option<bool> {
        match &self.data {
            ColumnData::Binary(bits) => (row < bits.len()).then(|| bits.contains(row)),
            _ => None,
        }
    }

    pub fn string_at(&self, row: usize) -> Option<String> {
        match &self.data {
            ColumnData::Nominal(values) => values.get(row).cloned(),
            ColumnData::Numeric(values) => values.get(row).map(|v| v.to_string()),
            ColumnData::Binary(bits) => (row < bits.len())
                .then(|| if bits.contains(row) { "1" } else { "0" }.to_string()),
        }
    }

    /// Distinct values in ascending order.
    pub fn domain(&self) -> Vec<ConditionValue> {
        match &self.data {
            ColumnData::Nominal(values) => values
                .iter()
                .map(String::as_str)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(|v| ConditionValue::Nominal(v.to_string()))
                .collect(),
            ColumnData::Numeric(values) => sorted_unique(values.iter().copied())
                .into_iter()
                .map(ConditionValue::Numeric)
                .collect(),
            ColumnData::Binary(bits) => {
                let ones = bits.count_ones(..);
                let mut domain = Vec::with_capacity(2);
                if ones < bits.len() {
                    domain.push(ConditionValue::Binary(false));
                }
                if ones > 0 {
                    domain.push(ConditionValue::Binary(true));
                }
                domain
            }
        }
    }

    pub fn min(&self) -> Option<f32> {
        self.numeric_values()?
            .iter()
            .copied()
            .min_by(|a, b| a.total_cmp(b))
    }

    pub fn max(&self) -> Option<f32> {
        self.numeric_values()?
            .iter()
            .copied()
            .max_by(|a, b| a.total_cmp(b))
    }

    /// Mean of a numeric column, or the fraction of ones of a binary column.
    pub fn average(&self) -> Option<f64> {
        match &self.data {
            ColumnData::Numeric(values) if !values.is_empty() => {
                Some(values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64)
            }
            ColumnData::Binary(bits) if !bits.is_empty() => {
                Some(bits.count_ones(..) as f64 / bits.len() as f64)
            }
            _ => None,
        }
    }

    /// Number of rows holding the given value.
    pub fn count_values(&self, value: &str) -> usize {
        match self.value_from_str(value) {
            Ok(parsed) => self.equal_rows(&parsed).count_ones(..),
            Err(_) => 0,
        }
    }

    /// Parse a textual value into a condition value of this column's type.
    pub fn value_from_str(&self, value: &str) -> Result<ConditionValue> {
        let attribute_type = self.attribute_type();
        let parsed = match attribute_type {
            AttributeType::Nominal => Some(ConditionValue::Nominal(value.to_string())),
            AttributeType::Numeric | AttributeType::Ordinal => {
                value.trim().parse::<f32>().ok().map(ConditionValue::Numeric)
            }
            AttributeType::Binary => AttributeType::parse_binary(value).map(ConditionValue::Binary),
        };

        parsed.ok_or_else(|| SubdiscError::AttributeTypeMismatch {
            column: self.name().to_string(),
            expected: attribute_type.to_string(),
            actual: format!("'{}'", value),
        })
    }

    /// Rows satisfying a condition on this column.
    pub fn evaluate(&self, condition: &Condition) -> Result<FixedBitSet> {
        if condition.attribute().index() != self.index()
            || condition.attribute().attribute_type() != self.attribute_type()
        {
            return Err(SubdiscError::AttributeTypeMismatch {
                column: self.name().to_string(),
                expected: format!("{} ({})", self.attribute(), self.attribute_type()),
                actual: format!(
                    "{} ({})",
                    condition.attribute(),
                    condition.attribute().attribute_type()
                ),
            });
        }

        match (&self.data, condition.operator()) {
            (ColumnData::Numeric(values), Operator::LessThanOrEqual | Operator::GreaterThanOrEqual) => {
                let mut bits = FixedBitSet::with_capacity(values.len());
                for (row, &value) in values.iter().enumerate() {
                    if condition.holds_numeric(value) {
                        bits.insert(row);
                    }
                }
                Ok(bits)
            }
            _ => Ok(self.equal_rows(condition.value())),
        }
    }

    /// Rows holding exactly `value`.
    pub(crate) fn equal_rows(&self, value: &ConditionValue) -> FixedBitSet {
        let mut bits = FixedBitSet::with_capacity(self.len());
        match (&self.data, value) {
            (ColumnData::Nominal(values), ConditionValue::Nominal(target)) => {
                for (row, v) in values.iter().enumerate() {
                    if v == target {
                        bits.insert(row);
                    }
                }
            }
            (ColumnData::Numeric(values), ConditionValue::Numeric(target)) => {
                for (row, v) in values.iter().enumerate() {
                    if v == target {
                        bits.insert(row);
                    }
                }
            }
            (ColumnData::Binary(ones), ConditionValue::Binary(target)) => {
                bits.union_with(ones);
                if !target {
                    bits.toggle_range(..);
                }
            }
            _ => {}
        }
        bits
    }

    /// Reorder rows so that row `i` takes the value of row `order[i]`.
    pub(crate) fn permute(&mut self, order: &[usize]) {
        debug_assert_eq!(order.len(), self.len());
        self.data = match &self.data {
            ColumnData::Nominal(values) => {
                ColumnData::Nominal(order.iter().map(|&i| values[i].clone()).collect())
            }
            ColumnData::Numeric(values) => {
                ColumnData::Numeric(order.iter().map(|&i| values[i]).collect())
            }
            ColumnData::Binary(bits) => {
                let mut permuted = FixedBitSet::with_capacity(bits.len());
                for (row, &source) in order.iter().enumerate() {
                    permuted.set(row, bits.contains(source));
                }
                ColumnData::Binary(permuted)
            }
        };
    }

    /// Change the attribute type, converting the stored values.
    ///
    /// Fails without modifying the column when a value cannot be represented
    /// in the new type. Missing-value tokens convert to the new type's default.
    pub fn set_type(&mut self, attribute_type: AttributeType) -> Result<()> {
        let current = self.attribute_type();
        if current == attribute_type {
            return Ok(());
        }

        let converted = match (&self.data, attribute_type) {
            (ColumnData::Numeric(_), AttributeType::Numeric | AttributeType::Ordinal) => None,
            (ColumnData::Nominal(values), AttributeType::Numeric | AttributeType::Ordinal) => {
                let parsed = values
                    .iter()
                    .map(|v| self.parse_float(v, current))
                    .collect::<Result<Vec<_>>>()?;
                Some(ColumnData::Numeric(parsed))
            }
            (ColumnData::Nominal(values), AttributeType::Binary) => {
                let mut bits = FixedBitSet::with_capacity(values.len());
                for (row, value) in values.iter().enumerate() {
                    bits.set(row, self.parse_bool(value, current)?);
                }
                Some(ColumnData::Binary(bits))
            }
            (ColumnData::Numeric(values), AttributeType::Binary) => {
                let mut bits = FixedBitSet::with_capacity(values.len());
                for (row, &value) in values.iter().enumerate() {
                    if value != 0.0 && value != 1.0 {
                        return Err(self.conversion_error(attribute_type, &value.to_string()));
                    }
                    bits.set(row, value == 1.0);
                }
                Some(ColumnData::Binary(bits))
            }
            (ColumnData::Binary(bits), AttributeType::Numeric | AttributeType::Ordinal) => Some(
                ColumnData::Numeric((0..bits.len()).map(|r| bits.contains(r) as u8 as f32).collect()),
            ),
            (_, AttributeType::Nominal) => Some(ColumnData::Nominal(
                (0..self.len()).filter_map(|row| self.string_at(row)).collect(),
            )),
            (ColumnData::Binary(_), AttributeType::Binary) => None,
        };

        if let Some(data) = converted {
            self.data = data;
        }
        self.attribute.set_type(attribute_type);
        Ok(())
    }

    fn parse_float(&self, value: &str, from: AttributeType) -> Result<f32> {
        if value == from.default_missing_value() {
            return Ok(0.0);
        }
        value
            .trim()
            .parse::<f32>()
            .map_err(|_| self.conversion_error(AttributeType::Numeric, value))
    }

    fn parse_bool(&self, value: &str, from: AttributeType) -> Result<bool> {
        if value == from.default_missing_value() {
            return Ok(false);
        }
        AttributeType::parse_binary(value)
            .ok_or_else(|| self.conversion_error(AttributeType::Binary, value))
    }

    fn conversion_error(&self, target: AttributeType, value: &str) -> SubdiscError {
        SubdiscError::AttributeTypeMismatch {
            column: self.name().to_string(),
            expected: target.to_string(),
            actual: format!("value '{}'", value),
        }
    }
}

/// Sort ascending and drop repeated values.
pub(crate) fn sorted_unique(values: impl IntoIterator<Item = f32>) -> Vec<f32> {
    let mut values: Vec<f32> = values.into_iter().collect();
    values.sort_by(|a, b| a.total_cmp(b));
    values.dedup();
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn colors() -> Column {
        Column::new_nominal(
            "color",
            ["red", "blue", "red", "green", "?"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    #[test]
    fn test_nominal_domain_is_sorted_and_distinct() {
        let domain = colors().domain();
        let names: Vec<String> = domain.iter().map(|v| v.to_string()).collect();
        assert_eq!(names, vec!["'?'", "'blue'", "'green'", "'red'"]);
    }

    #[test]
    fn test_numeric_statistics() {
        let column = Column::new_numeric("age", vec![30.0, 10.0, 20.0, 20.0]);
        assert_eq!(column.min(), Some(10.0));
        assert_eq!(column.max(), Some(30.0));
        assert_eq!(column.average(), Some(20.0));
        assert_eq!(column.count_values("20"), 2);
        assert_eq!(column.float_at(1), Some(10.0));
        assert_eq!(column.float_at(9), None);
    }

    #[test]
    fn test_binary_column_accessors() {
        let column = Column::new_binary("smoker", vec![true, false, true, true]);
        assert_eq!(column.average(), Some(0.75));
        assert_eq!(column.count_values("1"), 3);
        assert_eq!(column.count_values("no"), 1);
        assert_eq!(column.float_at(1), Some(0.0));
        assert_eq!(
            column.domain(),
            vec![ConditionValue::Binary(false), ConditionValue::Binary(true)]
        );
    }

    #[test]
    fn test_evaluate_binary_equals_false() {
        let column = Column::new_binary("smoker", vec![true, false, true, false]);
        let condition = Condition::new(
            column.attribute().clone(),
            Operator::Equals,
            ConditionValue::Binary(false),
        )
        .unwrap();
        let rows: Vec<usize> = column.evaluate(&condition).unwrap().ones().collect();
        assert_eq!(rows, vec![1, 3]);
    }

    #[test]
    fn test_evaluate_rejects_foreign_condition() {
        let column = colors();
        let other = Attribute::new("color", AttributeType::Nominal, 4);
        let condition =
            Condition::new(other, Operator::Equals, ConditionValue::Nominal("red".into())).unwrap();
        assert!(column.evaluate(&condition).is_err());
    }

    #[test]
    fn test_permute_reorders_rows() {
        let mut column = Column::new_numeric("x", vec![1.0, 2.0, 3.0]);
        column.permute(&[2, 0, 1]);
        assert_eq!(column.numeric_values().unwrap(), &[3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_set_type_nominal_to_numeric() {
        let mut column = Column::new_nominal(
            "dose",
            vec!["1.5".to_string(), "?".to_string(), "3".to_string()],
        );
        column.set_type(AttributeType::Numeric).unwrap();
        assert_eq!(column.attribute_type(), AttributeType::Numeric);
        assert_eq!(column.numeric_values().unwrap(), &[1.5, 0.0, 3.0]);
    }

    #[test]
    fn test_set_type_rejects_unrepresentable_values() {
        let mut column = colors();
        let before = column.clone();
        assert!(column.set_type(AttributeType::Binary).is_err());
        assert_eq!(column, before);
    }

    #[test]
    fn test_set_type_numeric_to_ordinal_keeps_values() {
        let mut column = Column::new_numeric("grade", vec![1.0, 2.0]);
        column.set_type(AttributeType::Ordinal).unwrap();
        assert_eq!(column.attribute_type(), AttributeType::Ordinal);
        assert_eq!(column.numeric_values().unwrap(), &[1.0, 2.0]);
    }
}
