//! Search configuration.
//!
//! [`SearchParameters`] is immutable once built. Use
//! [`SearchParameters::builder()`] to create one; the builder fills in
//! defaults and validates the result.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::warn;

use crate::quality::{MeasureFamily, QualityMeasureKind};
use crate::target::TargetConcept;

/// Default maximum number of conditions in a description.
pub const DEFAULT_SEARCH_DEPTH: usize = 1;
/// Default minimum number of rows a subgroup must cover.
pub const DEFAULT_MINIMUM_COVERAGE: usize = 2;
/// Default size of the result set.
pub const DEFAULT_MAXIMUM_SUBGROUPS: usize = 1000;
/// Default wall-clock budget in minutes.
pub const DEFAULT_MAXIMUM_TIME_MINUTES: f64 = 1.0;
/// Default beam width.
pub const DEFAULT_STRATEGY_WIDTH: usize = 100;
/// Default number of bins for [`NumericStrategy::Bins`].
pub const DEFAULT_NR_BINS: usize = 8;
/// Default number of networks per side in multi-label post-processing.
pub const DEFAULT_POST_PROCESSING_COUNT: usize = 20;

/// Order in which candidates leave the search frontier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Level by level, keeping the best `strategy_width` candidates per level
    #[default]
    Beam,
    /// Highest quality first
    BestFirst,
    /// Shallowest first, in insertion order
    BreadthFirst,
    /// Most recently inserted first
    DepthFirst,
}

/// How thresholds are chosen for numeric refinements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NumericStrategy {
    /// Every distinct value among the parent's members
    All,
    /// `nr_bins - 1` equal-frequency split points
    #[default]
    Bins,
    /// Like `All`, but only the best threshold is kept
    Best,
}

/// Configuration of one search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParameters {
    /// What subgroups are compared against.
    pub target: TargetConcept,

    /// Scoring function. Must belong to the target's measure family.
    pub quality_measure: QualityMeasureKind,

    /// Subgroups must score strictly above this to enter the result set.
    /// Default: 0.0
    pub quality_measure_minimum: f64,

    /// Maximum number of conditions in a description.
    /// Default: 1
    pub search_depth: usize,

    /// Minimum number of covered rows.
    /// Default: 2
    pub minimum_coverage: usize,

    /// Capacity of the result set.
    /// Default: 1000
    pub maximum_subgroups: usize,

    /// Wall-clock budget in minutes.
    /// Default: 1.0
    pub maximum_time_minutes: f64,

    /// Default: Beam
    pub strategy: SearchStrategy,

    /// Frontier bound for beam and best-first search.
    /// Default: 100
    pub strategy_width: usize,

    /// Default: Bins
    pub numeric_strategy: NumericStrategy,

    /// Number of bins for [`NumericStrategy::Bins`].
    /// Default: 8
    pub nr_bins: usize,

    /// Weight of the entropy term in WEED.
    /// Default: 1.0
    pub alpha: f64,

    /// Weight of the edit distance term in WEED.
    /// Default: 1.0
    pub beta: f64,

    /// Networks learned per side when re-scoring multi-label results.
    /// Zero disables post-processing.
    /// Default: 20
    pub post_processing_count: usize,

    /// Seed for validation sampling and randomized hill climbing.
    /// Default: None (seeded from entropy)
    pub random_seed: Option<u64>,
}

impl SearchParameters {
    /// Create a new configuration builder for a target.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let params = SearchParameters::builder(TargetConcept::SingleNumeric { target: 3 })
    ///     .search_depth(2)
    ///     .build()?;
    /// ```
    pub fn builder(target: TargetConcept) -> SearchParametersBuilder {
        SearchParametersBuilder {
            target,
            ..Default::default()
        }
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (field, value) in [
            ("search_depth", self.search_depth),
            ("minimum_coverage", self.minimum_coverage),
            ("maximum_subgroups", self.maximum_subgroups),
            ("strategy_width", self.strategy_width),
        ] {
            if value == 0 {
                return Err(ConfigValidationError::ZeroValue(field));
            }
        }

        if self.nr_bins < 2 {
            return Err(ConfigValidationError::InvalidBins(self.nr_bins));
        }

        if !self.maximum_time_minutes.is_finite() || self.maximum_time_minutes <= 0.0 {
            return Err(ConfigValidationError::InvalidTimeLimit(
                self.maximum_time_minutes,
            ));
        }

        for (field, value) in [("alpha", self.alpha), ("beta", self.beta)] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigValidationError::InvalidWeight { field, value });
            }
        }

        if self.quality_measure_minimum.is_nan() {
            return Err(ConfigValidationError::InvalidMinimum);
        }

        Ok(())
    }

    /// Deadline of a run started at `begin`.
    ///
    /// Returns `None` when the budget is too large to be represented as an
    /// [`Instant`]; such a run is bounded only by the search space.
    pub fn deadline(&self, begin: Instant) -> Option<Instant> {
        Duration::try_from_secs_f64(self.maximum_time_minutes * 60.0)
            .ok()
            .and_then(|budget| begin.checked_add(budget))
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid value for '{0}': must be at least 1")]
    ZeroValue(&'static str),

    #[error("Invalid number of bins: {0} (must be at least 2)")]
    InvalidBins(usize),

    #[error("Invalid time limit: {0} minutes (must be positive)")]
    InvalidTimeLimit(f64),

    #[error("Invalid weight for '{field}': {value} (must be a non-negative number)")]
    InvalidWeight { field: &'static str, value: f64 },

    #[error("Invalid quality measure minimum: NaN")]
    InvalidMinimum,
}

/// Builder for [`SearchParameters`] with fluent API.
#[derive(Debug)]
pub struct SearchParametersBuilder {
    target: TargetConcept,
    quality_measure: Option<QualityMeasureKind>,
    quality_measure_minimum: Option<f64>,
    search_depth: Option<usize>,
    minimum_coverage: Option<usize>,
    maximum_subgroups: Option<usize>,
    maximum_time_minutes: Option<f64>,
    strategy: Option<SearchStrategy>,
    strategy_width: Option<usize>,
    numeric_strategy: Option<NumericStrategy>,
    nr_bins: Option<usize>,
    alpha: Option<f64>,
    beta: Option<f64>,
    post_processing_count: Option<usize>,
    random_seed: Option<u64>,
}

impl Default for SearchParametersBuilder {
    fn default() -> Self {
        Self {
            target: TargetConcept::SingleNominal {
                target: 0,
                value: "1".to_string(),
            },
            quality_measure: None,
            quality_measure_minimum: None,
            search_depth: None,
            minimum_coverage: None,
            maximum_subgroups: None,
            maximum_time_minutes: None,
            strategy: None,
            strategy_width: None,
            numeric_strategy: None,
            nr_bins: None,
            alpha: None,
            beta: None,
            post_processing_count: None,
            random_seed: None,
        }
    }
}

impl SearchParametersBuilder {
    /// Set the quality measure.
    ///
    /// A measure outside the target's family is replaced by the family
    /// default when the configuration is built.
    pub fn quality_measure(mut self, measure: QualityMeasureKind) -> Self {
        self.quality_measure = Some(measure);
        self
    }

    pub fn quality_measure_minimum(mut self, minimum: f64) -> Self {
        self.quality_measure_minimum = Some(minimum);
        self
    }

    pub fn search_depth(mut self, depth: usize) -> Self {
        self.search_depth = Some(depth);
        self
    }

    pub fn minimum_coverage(mut self, coverage: usize) -> Self {
        self.minimum_coverage = Some(coverage);
        self
    }

    pub fn maximum_subgroups(mut self, count: usize) -> Self {
        self.maximum_subgroups = Some(count);
        self
    }

    pub fn maximum_time_minutes(mut self, minutes: f64) -> Self {
        self.maximum_time_minutes = Some(minutes);
        self
    }

    pub fn strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Set the beam width.
    pub fn strategy_width(mut self, width: usize) -> Self {
        self.strategy_width = Some(width);
        self
    }

    pub fn numeric_strategy(mut self, strategy: NumericStrategy) -> Self {
        self.numeric_strategy = Some(strategy);
        self
    }

    pub fn nr_bins(mut self, bins: usize) -> Self {
        self.nr_bins = Some(bins);
        self
    }

    /// Set the WEED weights.
    pub fn weed_weights(mut self, alpha: f64, beta: f64) -> Self {
        self.alpha = Some(alpha);
        self.beta = Some(beta);
        self
    }

    pub fn post_processing_count(mut self, count: usize) -> Self {
        self.post_processing_count = Some(count);
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Build the configuration.
    ///
    /// Returns validated `SearchParameters` or an error if validation fails.
    pub fn build(self) -> Result<SearchParameters, ConfigValidationError> {
        let target_type = self.target.target_type();
        let family = MeasureFamily::for_target(target_type);

        let quality_measure = match (self.quality_measure, family) {
            (Some(measure), Some(family)) if measure.family() != family => {
                let fallback = family.default_measure();
                warn!(
                    "Quality measure '{}' does not apply to {} targets, using '{}'",
                    measure.name(),
                    target_type,
                    fallback.name()
                );
                fallback
            }
            (Some(measure), _) => measure,
            (None, Some(family)) => family.default_measure(),
            (None, None) => QualityMeasureKind::default(),
        };

        let params = SearchParameters {
            target: self.target,
            quality_measure,
            quality_measure_minimum: self.quality_measure_minimum.unwrap_or(0.0),
            search_depth: self.search_depth.unwrap_or(DEFAULT_SEARCH_DEPTH),
            minimum_coverage: self.minimum_coverage.unwrap_or(DEFAULT_MINIMUM_COVERAGE),
            maximum_subgroups: self.maximum_subgroups.unwrap_or(DEFAULT_MAXIMUM_SUBGROUPS),
            maximum_time_minutes: self
                .maximum_time_minutes
                .unwrap_or(DEFAULT_MAXIMUM_TIME_MINUTES),
            strategy: self.strategy.unwrap_or_default(),
            strategy_width: self.strategy_width.unwrap_or(DEFAULT_STRATEGY_WIDTH),
            numeric_strategy: self.numeric_strategy.unwrap_or_default(),
            nr_bins: self.nr_bins.unwrap_or(DEFAULT_NR_BINS),
            alpha: self.alpha.unwrap_or(1.0),
            beta: self.beta.unwrap_or(1.0),
            post_processing_count: self
                .post_processing_count
                .unwrap_or(DEFAULT_POST_PROCESSING_COUNT),
            random_seed: self.random_seed,
        };

        params.validate()?;
        Ok(params)
    }
}
