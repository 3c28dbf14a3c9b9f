//! Subgroups: a description, the rows it covers, and its score.

use fixedbitset::FixedBitSet;
use serde::Serialize;

use crate::bayesian::Dag;
use crate::condition::ConditionList;

/// A described subset of the table.
///
/// The description and members never change after construction. Quality,
/// p-value, model and display ID are filled in as the search and the
/// validation progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Subgroup {
    conditions: ConditionList,
    members: FixedBitSet,
    coverage: usize,
    quality: f64,
    p_value: Option<f64>,
    model: Option<Dag>,
    id: Option<usize>,
}

impl Subgroup {
    pub fn new(conditions: ConditionList, members: FixedBitSet) -> Self {
        let coverage = members.count_ones(..);
        Self {
            conditions,
            members,
            coverage,
            quality: 0.0,
            p_value: None,
            model: None,
            id: None,
        }
    }

    /// The subgroup without conditions, covering every row.
    pub fn root(row_count: usize) -> Self {
        let mut members = FixedBitSet::with_capacity(row_count);
        members.insert_range(..);
        Self::new(ConditionList::new(), members)
    }

    pub fn conditions(&self) -> &ConditionList {
        &self.conditions
    }

    pub fn members(&self) -> &FixedBitSet {
        &self.members
    }

    pub fn coverage(&self) -> usize {
        self.coverage
    }

    pub fn depth(&self) -> usize {
        self.conditions.len()
    }

    pub fn quality(&self) -> f64 {
        self.quality
    }

    pub fn p_value(&self) -> Option<f64> {
        self.p_value
    }

    pub fn model(&self) -> Option<&Dag> {
        self.model.as_ref()
    }

    pub fn id(&self) -> Option<usize> {
        self.id
    }

    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = quality;
        self
    }

    /// Attach the network learned for this subgroup.
    pub fn attach_model(&mut self, model: Dag) {
        self.model = Some(model);
    }

    pub fn set_p_value(&mut self, p_value: f64) {
        self.p_value = Some(p_value);
    }

    /// Only post-processing re-scores subgroups that are already in a set.
    pub(crate) fn set_quality(&mut self, quality: f64) {
        self.quality = quality;
    }

    pub(crate) fn set_id(&mut self, id: usize) {
        self.id = Some(id);
    }

    pub(crate) fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn summary(&self) -> SubgroupSummary {
        SubgroupSummary {
            id: self.id,
            depth: self.depth(),
            coverage: self.coverage,
            quality: self.quality,
            p_value: self.p_value,
            conditions: self.conditions.to_string(),
            model: self.model.as_ref().map(Dag::to_string),
        }
    }
}

/// One row of a result table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubgroupSummary {
    pub id: Option<usize>,
    pub depth: usize,
    pub coverage: usize,
    pub quality: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_value: Option<f64>,
    pub conditions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}
