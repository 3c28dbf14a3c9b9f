//! In-memory data table and the query surface used by search and validation.

mod attribute;
mod column;
mod convert;

pub use attribute::{Attribute, AttributeType};
pub use column::{Column, ColumnData};
pub use convert::{attribute_type_for, is_numeric_dtype};

pub(crate) use column::sorted_unique;

use fixedbitset::FixedBitSet;
use rand::Rng;
use rand::seq::SliceRandom;
use static_assertions::assert_impl_all;
use tracing::debug;

use crate::condition::{Condition, ConditionList, ConditionValue};
use crate::error::{Result, SubdiscError};
use crate::target::TargetConcept;

/// A named set of equally long typed columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    row_count: usize,
}

assert_impl_all!(Table: Send, Sync);
assert_impl_all!(Column: Send, Sync);

impl Table {
    /// Create a table. Column indices are assigned by position.
    pub fn new(name: impl Into<String>, mut columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        for (index, column) in columns.iter_mut().enumerate() {
            if column.len() != row_count {
                return Err(SubdiscError::RowCountMismatch {
                    column: column.name().to_string(),
                    expected: row_count,
                    actual: column.len(),
                });
            }
            column.set_index(index);
        }

        let name = name.into();
        debug!(
            "Table '{}' with {} rows and {} columns",
            name,
            row_count,
            columns.len()
        );

        Ok(Self {
            name,
            columns,
            row_count,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Column at an index, or an error naming the valid range.
    pub fn column_checked(&self, index: usize) -> Result<&Column> {
        self.columns
            .get(index)
            .ok_or(SubdiscError::ColumnIndexOutOfRange {
                index,
                count: self.columns.len(),
            })
    }

    /// Index of the column with this name.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| SubdiscError::ColumnNotFound(name.to_string()))
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.columns.iter().map(Column::attribute)
    }

    /// Change the type of a column, converting its values.
    pub fn set_attribute_type(&mut self, index: usize, attribute_type: AttributeType) -> Result<()> {
        let count = self.columns.len();
        self.columns
            .get_mut(index)
            .ok_or(SubdiscError::ColumnIndexOutOfRange { index, count })?
            .set_type(attribute_type)
    }

    /// Bitset with every row set.
    pub fn all_rows(&self) -> FixedBitSet {
        let mut rows = FixedBitSet::with_capacity(self.row_count);
        rows.insert_range(..);
        rows
    }

    pub fn evaluate(&self, condition: &Condition) -> Result<FixedBitSet> {
        self.column_checked(condition.attribute().index())?
            .evaluate(condition)
    }

    /// Rows satisfying every condition of the list.
    pub fn evaluate_list(&self, conditions: &ConditionList) -> Result<FixedBitSet> {
        let mut members = self.all_rows();
        for condition in conditions {
            members.intersect_with(&self.evaluate(condition)?);
        }
        Ok(members)
    }

    fn member_values(&self, attribute: usize, members: &FixedBitSet) -> Result<Vec<f32>> {
        let column = self.column_checked(attribute)?;
        let values = column
            .numeric_values()
            .ok_or_else(|| SubdiscError::AttributeTypeMismatch {
                column: column.name().to_string(),
                expected: AttributeType::Numeric.to_string(),
                actual: column.attribute_type().to_string(),
            })?;
        Ok(members.ones().map(|row| values[row]).collect())
    }

    /// Distinct values of a numeric column among the members, ascending.
    pub fn unique_numeric_domain(&self, attribute: usize, members: &FixedBitSet) -> Result<Vec<f32>> {
        Ok(sorted_unique(self.member_values(attribute, members)?))
    }

    /// `count` equal-frequency split points over the member values, ascending.
    ///
    /// Points may repeat when values are tied; callers skip duplicates.
    pub fn split_points(
        &self,
        attribute: usize,
        members: &FixedBitSet,
        count: usize,
    ) -> Result<Vec<f32>> {
        let mut values = self.member_values(attribute, members)?;
        if values.is_empty() {
            return Ok(Vec::new());
        }
        values.sort_by(|a, b| a.total_cmp(b));

        let size = values.len();
        Ok((0..count)
            .map(|j| values[((j + 1) * size / (count + 1)).min(size - 1)])
            .collect())
    }

    /// Distinct values of a column over the whole table.
    pub fn domain(&self, attribute: usize) -> Result<Vec<ConditionValue>> {
        Ok(self.column_checked(attribute)?.domain())
    }

    /// Apply one random row permutation to every target column.
    ///
    /// All target columns share the permutation, so relations between
    /// targets survive while their link to the descriptors is broken.
    pub fn swap_randomize_target<R: Rng + ?Sized>(
        &mut self,
        target: &TargetConcept,
        rng: &mut R,
    ) -> Result<()> {
        let mut order: Vec<usize> = (0..self.row_count).collect();
        order.shuffle(rng);

        for index in target.target_indices() {
            let count = self.columns.len();
            self.columns
                .get_mut(index)
                .ok_or(SubdiscError::ColumnIndexOutOfRange { index, count })?
                .permute(&order);
        }
        Ok(())
    }

    /// Uniformly drawn set of `size` distinct rows.
    pub fn random_subgroup<R: Rng + ?Sized>(&self, size: usize, rng: &mut R) -> FixedBitSet {
        let size = size.min(self.row_count);
        let mut members = FixedBitSet::with_capacity(self.row_count);
        for row in rand::seq::index::sample(rng, self.row_count, size) {
            members.insert(row);
        }
        members
    }

    /// Swap a column for another one, returning the previous column.
    pub(crate) fn replace_column(&mut self, index: usize, mut column: Column) -> Result<Column> {
        let count = self.columns.len();
        if column.len() != self.row_count {
            return Err(SubdiscError::RowCountMismatch {
                column: column.name().to_string(),
                expected: self.row_count,
                actual: column.len(),
            });
        }
        let slot = self
            .columns
            .get_mut(index)
            .ok_or(SubdiscError::ColumnIndexOutOfRange { index, count })?;
        column.set_index(index);
        Ok(std::mem::replace(slot, column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Operator;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sample_table() -> Table {
        Table::new(
            "sample",
            vec![
                Column::new_nominal(
                    "color",
                    ["red", "blue", "red", "green", "red", "blue"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                ),
                Column::new_numeric("size", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
                Column::new_binary("label", vec![true, false, true, false, false, true]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_ragged_columns() {
        let result = Table::new(
            "ragged",
            vec![
                Column::new_numeric("a", vec![1.0, 2.0]),
                Column::new_numeric("b", vec![1.0]),
            ],
        );
        assert!(matches!(
            result,
            Err(SubdiscError::RowCountMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_column_lookup() {
        let table = sample_table();
        assert_eq!(table.column_index("size").unwrap(), 1);
        assert!(table.column_index("weight").is_err());
        assert!(table.column(3).is_none());
    }

    #[test]
    fn test_evaluate_list_intersects_conditions() {
        let table = sample_table();
        let color = table.column(0).unwrap().attribute().clone();
        let size = table.column(1).unwrap().attribute().clone();

        let conditions: ConditionList = vec![
            Condition::new(color, Operator::Equals, ConditionValue::Nominal("red".into())).unwrap(),
            Condition::new(size, Operator::GreaterThanOrEqual, ConditionValue::Numeric(3.0)).unwrap(),
        ]
        .into_iter()
        .collect();

        let members: Vec<usize> = table.evaluate_list(&conditions).unwrap().ones().collect();
        assert_eq!(members, vec![2, 4]);
        assert_eq!(table.evaluate_list(&ConditionList::new()).unwrap().count_ones(..), 6);
    }

    #[test]
    fn test_numeric_domain_restricted_to_members() {
        let table = sample_table();
        let mut members = FixedBitSet::with_capacity(6);
        members.insert(5);
        members.insert(1);
        assert_eq!(table.unique_numeric_domain(1, &members).unwrap(), vec![2.0, 6.0]);
        assert!(table.unique_numeric_domain(0, &members).is_err());
    }

    #[test]
    fn test_split_points_equal_frequency() {
        let table = sample_table();
        let points = table.split_points(1, &table.all_rows(), 2).unwrap();
        assert_eq!(points, vec![3.0, 5.0]);
    }

    #[test]
    fn test_swap_randomize_permutes_targets_only() {
        let mut table = sample_table();
        let original = table.clone();
        let target = TargetConcept::SingleNominal {
            target: 2,
            value: "1".to_string(),
        };
        let mut rng = StdRng::seed_from_u64(7);
        table.swap_randomize_target(&target, &mut rng).unwrap();

        assert_eq!(table.column(0), original.column(0));
        assert_eq!(table.column(1), original.column(1));
        let label = table.column(2).unwrap().binary_values().unwrap();
        assert_eq!(label.count_ones(..), 3);
    }

    #[test]
    fn test_random_subgroup_size() {
        let table = sample_table();
        let mut rng = StdRng::seed_from_u64(11);
        let members = table.random_subgroup(4, &mut rng);
        assert_eq!(members.len(), 6);
        assert_eq!(members.count_ones(..), 4);
    }

    #[test]
    fn test_replace_column_returns_previous() {
        let mut table = sample_table();
        let replacement = Column::new_numeric("size", vec![0.0; 6]);
        let previous = table.replace_column(1, replacement).unwrap();
        assert_eq!(previous.numeric_values().unwrap()[5], 6.0);
        assert_eq!(table.column(1).unwrap().max(), Some(0.0));
        assert!(table.replace_column(1, Column::new_numeric("x", vec![1.0])).is_err());
    }
}
