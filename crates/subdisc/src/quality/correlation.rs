//! Measures over a pair of numeric targets.
//!
//! Both families share [`BivariateAccumulator`]: running sums that give the
//! Pearson correlation and the least-squares line of the observations added
//! so far. Because the sums are additive, the statistics of a subgroup's
//! complement follow from the population sums without a second pass.

use super::{FamilyKind, QualityMeasureKind, family_kind, ratio};

family_kind! {
    /// Measures of the correlation between two numeric targets.
    CorrelationKind: Correlation, default CorrelationR, [
        CorrelationR,
        InverseR,
        AbsR,
        CorrelationDistance,
    ]
}

family_kind! {
    /// Measures comparing regression lines of two numeric targets.
    RegressionKind: Regression, default SlopeDifference, [
        SlopeDifference,
        InterceptDifference,
    ]
}

/// Running sums over `(x, y)` observations.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BivariateAccumulator {
    count: f64,
    sum_x: f64,
    sum_y: f64,
    sum_xx: f64,
    sum_yy: f64,
    sum_xy: f64,
}

impl BivariateAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate paired columns, up to the shorter length.
    pub fn from_columns(x: &[f32], y: &[f32]) -> Self {
        let mut accumulator = Self::new();
        for (&x, &y) in x.iter().zip(y) {
            accumulator.add(x, y);
        }
        accumulator
    }

    #[inline]
    pub fn add(&mut self, x: f32, y: f32) {
        let (x, y) = (f64::from(x), f64::from(y));
        self.count += 1.0;
        self.sum_x += x;
        self.sum_y += y;
        self.sum_xx += x * x;
        self.sum_yy += y * y;
        self.sum_xy += x * y;
    }

    pub fn count(&self) -> usize {
        self.count as usize
    }

    /// Sums of the observations in `self` but not in `part`.
    pub fn minus(&self, part: &Self) -> Self {
        Self {
            count: self.count - part.count,
            sum_x: self.sum_x - part.sum_x,
            sum_y: self.sum_y - part.sum_y,
            sum_xx: self.sum_xx - part.sum_xx,
            sum_yy: self.sum_yy - part.sum_yy,
            sum_xy: self.sum_xy - part.sum_xy,
        }
    }

    fn sxx(&self) -> f64 {
        self.sum_xx - ratio(self.sum_x * self.sum_x, self.count)
    }

    fn syy(&self) -> f64 {
        self.sum_yy - ratio(self.sum_y * self.sum_y, self.count)
    }

    fn sxy(&self) -> f64 {
        self.sum_xy - ratio(self.sum_x * self.sum_y, self.count)
    }

    /// Pearson correlation; zero without spread or below two observations.
    pub fn correlation(&self) -> f64 {
        if self.count < 2.0 {
            return 0.0;
        }
        let denominator = (self.sxx() * self.syy()).sqrt();
        if !denominator.is_finite() || denominator <= f64::EPSILON {
            return 0.0;
        }
        (self.sxy() / denominator).clamp(-1.0, 1.0)
    }

    /// Slope of the least-squares line of `y` on `x`.
    pub fn slope(&self) -> f64 {
        if self.count < 2.0 {
            return 0.0;
        }
        ratio(self.sxy(), self.sxx())
    }

    pub fn intercept(&self) -> f64 {
        if self.count < 1.0 {
            return 0.0;
        }
        (self.sum_y - self.slope() * self.sum_x) / self.count
    }
}

/// Correlation measures, holding the population sums.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationMeasure {
    kind: CorrelationKind,
    population: BivariateAccumulator,
}

impl CorrelationMeasure {
    /// A measure of another family is replaced by `r`.
    pub fn new(kind: QualityMeasureKind, primary: &[f32], secondary: &[f32]) -> Self {
        Self {
            kind: CorrelationKind::resolve(kind),
            population: BivariateAccumulator::from_columns(primary, secondary),
        }
    }

    pub fn population(&self) -> &BivariateAccumulator {
        &self.population
    }

    pub fn calculate(&self, subgroup: &BivariateAccumulator) -> f64 {
        let r = subgroup.correlation();
        match self.kind {
            CorrelationKind::CorrelationR => r,
            CorrelationKind::InverseR => -r,
            CorrelationKind::AbsR => r.abs(),
            CorrelationKind::CorrelationDistance => {
                let complement = self.population.minus(subgroup);
                (r - complement.correlation()).abs()
            }
        }
    }
}

/// Regression measures, comparing the subgroup's line with its complement's.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionMeasure {
    kind: RegressionKind,
    population: BivariateAccumulator,
}

impl RegressionMeasure {
    /// A measure of another family is replaced by the slope difference.
    pub fn new(kind: QualityMeasureKind, primary: &[f32], secondary: &[f32]) -> Self {
        Self {
            kind: RegressionKind::resolve(kind),
            population: BivariateAccumulator::from_columns(primary, secondary),
        }
    }

    pub fn population(&self) -> &BivariateAccumulator {
        &self.population
    }

    pub fn calculate(&self, subgroup: &BivariateAccumulator) -> f64 {
        let complement = self.population.minus(subgroup);
        match self.kind {
            RegressionKind::SlopeDifference => (subgroup.slope() - complement.slope()).abs(),
            RegressionKind::InterceptDifference => {
                (subgroup.intercept() - complement.intercept()).abs()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_perfect_correlation_and_line() {
        let acc = BivariateAccumulator::from_columns(&[1.0, 2.0, 3.0, 4.0], &[3.0, 5.0, 7.0, 9.0]);
        assert!((acc.correlation() - 1.0).abs() < EPS);
        assert!((acc.slope() - 2.0).abs() < EPS);
        assert!((acc.intercept() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_degenerate_inputs() {
        let single = BivariateAccumulator::from_columns(&[1.0], &[2.0]);
        assert_eq!(single.correlation(), 0.0);
        assert_eq!(single.slope(), 0.0);

        let flat = BivariateAccumulator::from_columns(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]);
        assert_eq!(flat.correlation(), 0.0);
    }

    #[test]
    fn test_complement_by_subtraction() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [2.0, 4.0, 6.0, 6.0, 4.0, 2.0];
        let all = BivariateAccumulator::from_columns(&x, &y);
        let head = BivariateAccumulator::from_columns(&x[..3], &y[..3]);
        let tail = BivariateAccumulator::from_columns(&x[3..], &y[3..]);
        let complement = all.minus(&head);

        assert_eq!(complement.count(), 3);
        assert!((complement.slope() - tail.slope()).abs() < EPS);
        assert!((complement.correlation() - tail.correlation()).abs() < EPS);
    }

    #[test]
    fn test_correlation_measures() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [2.0, 4.0, 6.0, 6.0, 4.0, 2.0];
        let head = BivariateAccumulator::from_columns(&x[..3], &y[..3]);

        let r = CorrelationMeasure::new(QualityMeasureKind::CorrelationR, &x, &y).calculate(&head);
        let inverse = CorrelationMeasure::new(QualityMeasureKind::InverseR, &x, &y).calculate(&head);
        let distance =
            CorrelationMeasure::new(QualityMeasureKind::CorrelationDistance, &x, &y).calculate(&head);

        assert!((r - 1.0).abs() < EPS);
        assert!((inverse + 1.0).abs() < EPS);
        assert!((distance - 2.0).abs() < EPS);
    }

    #[test]
    fn test_regression_slope_difference() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [2.0, 4.0, 6.0, 6.0, 4.0, 2.0];
        let head = BivariateAccumulator::from_columns(&x[..3], &y[..3]);

        let measure = RegressionMeasure::new(QualityMeasureKind::SlopeDifference, &x, &y);
        assert!((measure.calculate(&head) - 4.0).abs() < EPS);
    }

    #[test]
    fn test_measures_of_another_family_use_the_family_default() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [2.0, 4.0, 6.0, 6.0, 4.0, 2.0];
        let head = BivariateAccumulator::from_columns(&x[..3], &y[..3]);

        let r = CorrelationMeasure::new(QualityMeasureKind::SlopeDifference, &x, &y);
        assert!((r.calculate(&head) - 1.0).abs() < EPS);

        let slope = RegressionMeasure::new(QualityMeasureKind::AbsR, &x, &y);
        assert!((slope.calculate(&head) - 4.0).abs() < EPS);
    }
}
