//! Significance statistics over baseline quality samples.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::{debug, info};

use crate::error::{Result, SubdiscError};
use crate::search::SubgroupSet;

/// Fraction of baseline samples strictly above the best subgroup's quality.
pub fn empirical_p_value(samples: &[f64], result: &SubgroupSet) -> Result<f64> {
    let top = result.best_score().ok_or(SubdiscError::EmptySubgroupSet)?;
    if samples.is_empty() {
        return Err(SubdiscError::NoBaselineSamples);
    }

    let exceeding = samples.iter().filter(|&&q| q > top).count();
    let p_value = exceeding as f64 / samples.len() as f64;
    info!("Empirical p-value: {p_value} ({exceeding} of {} samples)", samples.len());
    Ok(p_value)
}

/// Regression test scores for the best subgroup and the top ten.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionTestScores {
    pub top1: f64,
    /// Only computed when the result holds at least ten subgroups.
    pub top10: Option<f64>,
}

/// Regression test for K = 1 and, when available, K = 10.
pub fn regression_test(samples: &[f64], result: &SubgroupSet) -> Result<RegressionTestScores> {
    if samples.is_empty() {
        return Err(SubdiscError::NoBaselineSamples);
    }
    let top1 = result.top_k_average(1).ok_or(SubdiscError::EmptySubgroupSet)?;

    let scores = RegressionTestScores {
        top1: regression_score(samples, top1),
        top10: result
            .top_k_average(10)
            .map(|top10| regression_score(samples, top10)),
    };
    info!("Regression test scores: {:?}", scores);
    Ok(scores)
}

/// Fit a least-squares line through the sorted, normalized samples placed at
/// `x = i / R` plus the observed point at `x = 1`, and return how far the
/// observed value lies above the line at `x = 1`.
fn regression_score(samples: &[f64], observed: f64) -> f64 {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let count = sorted.len();

    let min = sorted[0].min(observed);
    let max = sorted[count - 1].max(observed);
    let range = max - min;
    let normalize = |q: f64| if range > 0.0 { (q - min) / range } else { 0.0 };

    let ys: Vec<f64> = sorted.iter().copied().map(normalize).collect();
    let observed = normalize(observed);
    let y_bar = (ys.iter().sum::<f64>() + observed) / (count + 1) as f64;

    let x_bar = 0.5;
    let mut xx = 0.25;
    let mut xy = 0.5 * (observed - y_bar);
    for (i, y) in ys.iter().enumerate() {
        let x = i as f64 / count as f64;
        xx += (x - x_bar) * (x - x_bar);
        xy += (x - x_bar) * (y - y_bar);
    }

    let slope = xy / xx;
    let intercept = y_bar - slope * x_bar;
    debug!("Fitted regression line: y = {slope} * x + {intercept}");
    observed - slope - intercept
}

/// Attach `p = 1 - Φ(quality)` to every subgroup, with Φ the normal
/// distribution fitted to the samples (mean and population deviation).
pub fn assign_normal_p_values(samples: &[f64], result: &mut SubgroupSet) -> Result<()> {
    if samples.is_empty() {
        return Err(SubdiscError::NoBaselineSamples);
    }

    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|q| (q - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();
    debug!("Baseline distribution: mean {mean:.6}, sd {std_dev:.6}");

    if std_dev > 0.0 {
        let normal = Normal::new(mean, std_dev)
            .map_err(|e| SubdiscError::Internal(format!("normal distribution: {e}")))?;
        for subgroup in result.iter_mut() {
            let p_value = 1.0 - normal.cdf(subgroup.quality());
            subgroup.set_p_value(p_value);
        }
    } else {
        // point mass at the mean
        for subgroup in result.iter_mut() {
            let p_value = if subgroup.quality() < mean { 1.0 } else { 0.0 };
            subgroup.set_p_value(p_value);
        }
    }
    Ok(())
}
