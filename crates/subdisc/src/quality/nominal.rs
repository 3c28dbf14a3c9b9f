//! Measures for a single nominal target, computed from a 2x2 contingency table.

use super::{FamilyKind, QualityMeasureKind, entropy, family_kind, ratio};

family_kind! {
    /// Measures scoring a single nominal target.
    NominalKind: Nominal, default WrAcc, [
        WrAcc,
        Accuracy,
        Purity,
        Correlation,
        ChiSquared,
        InformationGain,
        Binomial,
        Jaccard,
        Coverage,
        Specificity,
        Sensitivity,
        Lift,
    ]
}

/// A nominal measure bound to the population's row and positive counts.
///
/// `calculate` receives the number of positives inside the subgroup
/// (`count_head_body`) and the subgroup size (`coverage`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NominalMeasure {
    kind: NominalKind,
    total_rows: f64,
    total_positives: f64,
}

impl NominalMeasure {
    /// A measure of another family is replaced by WRAcc.
    pub fn new(kind: QualityMeasureKind, total_rows: usize, total_positives: usize) -> Self {
        Self {
            kind: NominalKind::resolve(kind),
            total_rows: total_rows as f64,
            total_positives: total_positives as f64,
        }
    }

    pub fn kind(&self) -> QualityMeasureKind {
        self.kind.into()
    }

    /// Fraction of positives in the population.
    pub fn base_rate(&self) -> f64 {
        ratio(self.total_positives, self.total_rows)
    }

    pub fn calculate(&self, count_head_body: usize, coverage: usize) -> f64 {
        let n = self.total_rows;
        let p = self.total_positives;
        let hb = count_head_body as f64;
        let b = coverage as f64;

        // remaining cells of the contingency table
        let h_not_b = p - hb;
        let not_h_b = b - hb;
        let not_h_not_b = n - p - not_h_b;

        match self.kind {
            NominalKind::WrAcc => ratio(hb, n) - ratio(p, n) * ratio(b, n),
            NominalKind::Accuracy => ratio(hb, b),
            NominalKind::Purity => {
                let precision = ratio(hb, b);
                precision.max(1.0 - precision)
            }
            NominalKind::Correlation => {
                let denominator = (p * (n - p) * b * (n - b)).sqrt();
                ratio(hb * not_h_not_b - h_not_b * not_h_b, denominator)
            }
            NominalKind::ChiSquared => {
                let numerator = hb * not_h_not_b - h_not_b * not_h_b;
                ratio(n * numerator * numerator, p * (n - p) * b * (n - b))
            }
            NominalKind::InformationGain => {
                let split = ratio(b, n) * entropy(ratio(hb, b))
                    + ratio(n - b, n) * entropy(ratio(h_not_b, n - b));
                entropy(ratio(p, n)) - split
            }
            NominalKind::Binomial => {
                ratio(b, n).sqrt() * (ratio(hb, b) - ratio(p, n))
            }
            NominalKind::Jaccard => ratio(hb, b + h_not_b),
            NominalKind::Coverage => b,
            NominalKind::Specificity => ratio(not_h_not_b, n - p),
            NominalKind::Sensitivity => ratio(hb, p),
            NominalKind::Lift => ratio(ratio(hb, b), ratio(p, n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn measure(kind: NominalKind) -> NominalMeasure {
        // 100 rows, 40 positives
        NominalMeasure::new(kind.into(), 100, 40)
    }

    #[test]
    fn test_wracc_and_accuracy() {
        // subgroup of 50 rows with 30 positives
        assert!((measure(NominalKind::WrAcc).calculate(30, 50) - 0.1).abs() < EPS);
        assert!((measure(NominalKind::Accuracy).calculate(30, 50) - 0.6).abs() < EPS);
        assert!((measure(NominalKind::Lift).calculate(30, 50) - 1.5).abs() < EPS);
    }

    #[test]
    fn test_population_scores_zero_deviation() {
        for kind in [
            NominalKind::WrAcc,
            NominalKind::Correlation,
            NominalKind::ChiSquared,
            NominalKind::InformationGain,
            NominalKind::Binomial,
        ] {
            assert!(measure(kind).calculate(40, 100).abs() < EPS, "{:?}", kind);
        }
    }

    #[test]
    fn test_chi_squared_is_n_phi_squared() {
        let phi = measure(NominalKind::Correlation).calculate(30, 50);
        let chi = measure(NominalKind::ChiSquared).calculate(30, 50);
        assert!((chi - 100.0 * phi * phi).abs() < 1e-6);
        assert!(phi > 0.0);
    }

    #[test]
    fn test_confusion_matrix_measures() {
        assert!((measure(NominalKind::Sensitivity).calculate(30, 50) - 0.75).abs() < EPS);
        // 20 negatives inside, 60 negatives in total
        assert!(
            (measure(NominalKind::Specificity).calculate(30, 50) - 40.0 / 60.0).abs() < EPS
        );
        assert!((measure(NominalKind::Jaccard).calculate(30, 50) - 0.5).abs() < EPS);
        assert!((measure(NominalKind::Purity).calculate(10, 50) - 0.8).abs() < EPS);
        assert_eq!(measure(NominalKind::Coverage).calculate(30, 50), 50.0);
    }

    #[test]
    fn test_empty_subgroup_does_not_divide_by_zero() {
        assert_eq!(measure(NominalKind::Accuracy).calculate(0, 0), 0.0);
        assert_eq!(measure(NominalKind::Correlation).calculate(0, 0), 0.0);
    }

    #[test]
    fn test_measure_of_another_family_scores_as_wracc() {
        let foreign = NominalMeasure::new(QualityMeasureKind::Average, 100, 40);
        assert_eq!(foreign.kind(), QualityMeasureKind::WrAcc);
        assert!((foreign.calculate(30, 50) - 0.1).abs() < EPS);
    }
}
