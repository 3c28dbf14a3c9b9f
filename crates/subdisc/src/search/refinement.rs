//! One-condition extensions of a subgroup.

use crate::condition::{Condition, ConditionValue, Operator};
use crate::error::Result;
use crate::subgroup::Subgroup;
use crate::table::{Attribute, Table};
use crate::target::TargetConcept;

/// A way to extend a subgroup's description by one condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Refinement {
    /// `attribute = value` for a nominal or binary attribute.
    Equals {
        attribute: Attribute,
        value: ConditionValue,
    },
    /// A numeric threshold, resolved from the parent's members when evaluated.
    Numeric {
        attribute: Attribute,
        operator: Operator,
    },
}

impl Refinement {
    pub fn attribute(&self) -> &Attribute {
        match self {
            Self::Equals { attribute, .. } | Self::Numeric { attribute, .. } => attribute,
        }
    }

    /// The condition for an equality refinement.
    pub fn condition(&self) -> Option<Result<Condition>> {
        match self {
            Self::Equals { attribute, value } => Some(Condition::new(
                attribute.clone(),
                Operator::Equals,
                value.clone(),
            )),
            Self::Numeric { .. } => None,
        }
    }

    /// The condition for a numeric refinement at a resolved threshold.
    pub fn condition_at(&self, threshold: f32) -> Result<Condition> {
        let operator = match self {
            Self::Numeric { operator, .. } => *operator,
            Self::Equals { .. } => Operator::Equals,
        };
        Condition::new(
            self.attribute().clone(),
            operator,
            ConditionValue::Numeric(threshold),
        )
    }
}

/// All legal refinements of one subgroup.
///
/// Target attributes and attributes already in the description are skipped.
/// Nominal and binary attributes contribute one refinement per value of
/// their whole-table domain; numeric and ordinal attributes one per operator.
#[derive(Debug, Clone, Default)]
pub struct RefinementList {
    refinements: Vec<Refinement>,
}

impl RefinementList {
    pub fn new(table: &Table, subgroup: &Subgroup, target: &TargetConcept) -> Self {
        let domains: Vec<Vec<ConditionValue>> = table
            .columns()
            .iter()
            .map(|c| {
                if c.attribute_type().is_numeric_like() {
                    Vec::new()
                } else {
                    c.domain()
                }
            })
            .collect();
        Self::with_domains(table, subgroup, target, &domains)
    }

    /// Like [`RefinementList::new`], with whole-table domains computed up front.
    pub fn with_domains(
        table: &Table,
        subgroup: &Subgroup,
        target: &TargetConcept,
        domains: &[Vec<ConditionValue>],
    ) -> Self {
        let mut refinements = Vec::new();

        for attribute in table.attributes() {
            let index = attribute.index();
            if target.is_target_attribute(index) || subgroup.conditions().uses_attribute(index) {
                continue;
            }

            if attribute.attribute_type().is_numeric_like() {
                for &operator in Operator::allowed_for(attribute.attribute_type()) {
                    refinements.push(Refinement::Numeric {
                        attribute: attribute.clone(),
                        operator,
                    });
                }
            } else if let Some(domain) = domains.get(index) {
                refinements.extend(domain.iter().map(|value| Refinement::Equals {
                    attribute: attribute.clone(),
                    value: value.clone(),
                }));
            }
        }

        Self { refinements }
    }

    pub fn len(&self) -> usize {
        self.refinements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refinements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Refinement> {
        self.refinements.iter()
    }
}

impl<'a> IntoIterator for &'a RefinementList {
    type Item = &'a Refinement;
    type IntoIter = std::slice::Iter<'a, Refinement>;

    fn into_iter(self) -> Self::IntoIter {
        self.refinements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionList;
    use crate::table::Column;

    fn table() -> Table {
        Table::new(
            "t",
            vec![
                Column::new_nominal("color", vec!["red".into(), "blue".into(), "red".into()]),
                Column::new_numeric("size", vec![1.0, 2.0, 3.0]),
                Column::new_binary("flag", vec![true, false, true]),
                Column::new_binary("label", vec![false, false, true]),
            ],
        )
        .unwrap()
    }

    fn target() -> TargetConcept {
        TargetConcept::SingleNominal {
            target: 3,
            value: "1".to_string(),
        }
    }

    #[test]
    fn test_root_refinements_skip_target() {
        let table = table();
        let root = Subgroup::root(table.row_count());
        let list = RefinementList::new(&table, &root, &target());

        // 2 colors + 2 operators + 2 flag values
        assert_eq!(list.len(), 6);
        assert!(list.iter().all(|r| r.attribute().index() != 3));
        assert_eq!(
            list.iter()
                .filter(|r| matches!(r, Refinement::Numeric { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_used_attributes_are_skipped() {
        let table = table();
        let color = table.column(0).unwrap().attribute().clone();
        let condition =
            Condition::new(color, Operator::Equals, ConditionValue::Nominal("red".into())).unwrap();
        let conditions = ConditionList::new().with(condition);
        let members = table.evaluate_list(&conditions).unwrap();
        let subgroup = Subgroup::new(conditions, members);

        let list = RefinementList::new(&table, &subgroup, &target());
        assert_eq!(list.len(), 4);
        assert!(list.iter().all(|r| r.attribute().index() != 0));
    }

    #[test]
    fn test_refinement_conditions() {
        let table = table();
        let size = table.column(1).unwrap().attribute().clone();
        let refinement = Refinement::Numeric {
            attribute: size,
            operator: Operator::GreaterThanOrEqual,
        };
        assert!(refinement.condition().is_none());
        let condition = refinement.condition_at(2.0).unwrap();
        assert_eq!(condition.to_string(), "size >= 2");
    }
}
