//! Measures for a single numeric or ordinal target.

use super::{FamilyKind, QualityMeasureKind, family_kind, ratio};

family_kind! {
    /// Measures scoring a single numeric or ordinal target.
    NumericKind: Numeric, default ZScore, [
        Average,
        InverseAverage,
        ZScore,
        InverseZScore,
        AbsZScore,
        TTest,
        InverseTTest,
        AbsTTest,
        MedianMad,
    ]
}

/// Summary of target values inside a subgroup.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumericStatistics {
    pub coverage: usize,
    pub sum: f64,
    /// Sum of squared deviations from the mean.
    pub ssd: f64,
    pub median: f64,
    /// Median absolute deviation from the median.
    pub mad: f64,
}

impl NumericStatistics {
    pub fn from_values(values: impl IntoIterator<Item = f32>) -> Self {
        let mut values: Vec<f64> = values.into_iter().map(f64::from).collect();
        if values.is_empty() {
            return Self::default();
        }

        let coverage = values.len();
        let sum: f64 = values.iter().sum();
        let mean = sum / coverage as f64;
        let ssd = values.iter().map(|v| (v - mean).powi(2)).sum();

        values.sort_by(|a, b| a.total_cmp(b));
        let median = sorted_median(&values);
        let mut deviations: Vec<f64> = values.iter().map(|v| (v - median).abs()).collect();
        deviations.sort_by(|a, b| a.total_cmp(b));
        let mad = sorted_median(&deviations);

        Self {
            coverage,
            sum,
            ssd,
            median,
            mad,
        }
    }

    pub fn mean(&self) -> f64 {
        ratio(self.sum, self.coverage as f64)
    }

    /// Sample standard deviation; zero below two values.
    pub fn std_dev(&self) -> f64 {
        if self.coverage < 2 {
            return 0.0;
        }
        (self.ssd / (self.coverage - 1) as f64).sqrt()
    }
}

fn sorted_median(values: &[f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        0.0
    } else if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

/// A numeric measure bound to the population statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericMeasure {
    kind: NumericKind,
    population: NumericStatistics,
}

impl NumericMeasure {
    /// A measure of another family is replaced by the z-score.
    pub fn new(kind: QualityMeasureKind, population: NumericStatistics) -> Self {
        Self {
            kind: NumericKind::resolve(kind),
            population,
        }
    }

    pub fn kind(&self) -> QualityMeasureKind {
        self.kind.into()
    }

    pub fn population(&self) -> &NumericStatistics {
        &self.population
    }

    pub fn calculate(&self, stats: &NumericStatistics) -> f64 {
        let n = stats.coverage as f64;
        if stats.coverage == 0 {
            return 0.0;
        }
        let shift = stats.mean() - self.population.mean();

        match self.kind {
            NumericKind::Average => stats.mean(),
            NumericKind::InverseAverage => -stats.mean(),
            NumericKind::ZScore => self.z_score(n, shift),
            NumericKind::InverseZScore => -self.z_score(n, shift),
            NumericKind::AbsZScore => self.z_score(n, shift).abs(),
            NumericKind::TTest => t_score(stats, shift),
            NumericKind::InverseTTest => -t_score(stats, shift),
            NumericKind::AbsTTest => t_score(stats, shift).abs(),
            NumericKind::MedianMad => {
                n.sqrt() * ratio(stats.median - self.population.median, self.population.mad)
            }
        }
    }

    fn z_score(&self, n: f64, shift: f64) -> f64 {
        n.sqrt() * ratio(shift, self.population.std_dev())
    }
}

fn t_score(stats: &NumericStatistics, shift: f64) -> f64 {
    (stats.coverage as f64).sqrt() * ratio(shift, stats.std_dev())
}
