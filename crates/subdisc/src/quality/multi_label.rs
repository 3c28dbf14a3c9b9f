//! Measures comparing a subgroup's learned network with the population's.

use crate::bayesian::Dag;

use super::{FamilyKind, QualityMeasureKind, entropy, family_kind};

family_kind! {
    /// Measures comparing a subgroup's network with the population's.
    MultiLabelKind: MultiLabel, default Weed, [
        Weed,
        EditDistance,
    ]
}

/// A multi-label measure bound to the population network.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiLabelMeasure {
    kind: MultiLabelKind,
    population: Dag,
    total_rows: usize,
    alpha: f64,
    beta: f64,
}

impl MultiLabelMeasure {
    /// A measure of another family is replaced by WEED.
    pub fn new(
        kind: QualityMeasureKind,
        population: Dag,
        total_rows: usize,
        alpha: f64,
        beta: f64,
    ) -> Self {
        Self {
            kind: MultiLabelKind::resolve(kind),
            population,
            total_rows,
            alpha,
            beta,
        }
    }

    pub fn population(&self) -> &Dag {
        &self.population
    }

    pub fn calculate(&self, coverage: usize, local: &Dag) -> f64 {
        match self.kind {
            MultiLabelKind::EditDistance => local.edit_distance(&self.population) as f64,
            MultiLabelKind::Weed => self.weed(coverage, local, &self.population),
        }
    }

    /// Weighted entropy edit distance between two networks.
    ///
    /// `H(coverage / N)^alpha * ED^beta`, with `ED` the edit distance
    /// normalized by the number of node pairs. The entropy term favours
    /// subgroups covering about half the data.
    pub fn weed(&self, coverage: usize, local: &Dag, global: &Dag) -> f64 {
        if self.total_rows == 0 {
            return 0.0;
        }
        let share = coverage as f64 / self.total_rows as f64;
        let distance = local.normalized_edit_distance(global);
        entropy(share).powf(self.alpha) * distance.powf(self.beta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dags() -> (Dag, Dag) {
        let names: Vec<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
        let global = Dag::new(names.clone()).unwrap();
        let mut local = Dag::new(names).unwrap();
        local.add_edge(0, 1);
        (global, local)
    }

    #[test]
    fn test_weed_at_half_coverage() {
        let (global, local) = dags();
        let measure = MultiLabelMeasure::new(QualityMeasureKind::Weed, global, 100, 1.0, 1.0);
        // entropy 1 at half coverage, one of three pairs differs
        assert!((measure.calculate(50, &local) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_weed_vanishes_for_identical_networks_or_full_coverage() {
        let (global, local) = dags();
        let measure =
            MultiLabelMeasure::new(QualityMeasureKind::Weed, global.clone(), 100, 1.0, 1.0);
        assert_eq!(measure.calculate(50, &global), 0.0);
        assert_eq!(measure.calculate(100, &local), 0.0);
    }

    #[test]
    fn test_edit_distance_measure() {
        let (global, local) = dags();
        let measure =
            MultiLabelMeasure::new(QualityMeasureKind::EditDistance, global, 100, 1.0, 1.0);
        assert_eq!(measure.calculate(10, &local), 1.0);
    }
}
