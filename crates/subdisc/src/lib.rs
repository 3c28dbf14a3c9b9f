//! Exploratory subgroup discovery.
//!
//! Given a [`Table`] and a [`TargetConcept`], the search engine walks the
//! lattice of conjunctive attribute conditions looking for subgroups whose
//! target distribution deviates most from the population, and the validation
//! engine compares what it found against randomized baselines.
//!
//! # Overview
//!
//! - **Table**: typed columns ([`Column`]) with the query surface the search
//!   needs: condition evaluation, domains, split points, swap randomization.
//! - **Search**: [`SubgroupDiscovery`] pops candidates from a
//!   [`CandidateQueue`], refines them, scores every child through the
//!   [`Evaluator`] for the target type and keeps the best in a bounded
//!   [`SubgroupSet`].
//! - **Bayesian networks**: multi-label targets are scored by learning a
//!   [`Dag`] per subgroup with BDeu hill climbing over a [`BinaryTable`].
//! - **Validation**: [`Validation`] draws baseline quality samples (random
//!   subsets, random descriptions, swap randomization) and derives empirical
//!   p-values and regression test scores.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use subdisc::{SearchParameters, SubgroupDiscovery, Table, TargetConcept, QualityMeasureKind};
//! use std::time::Instant;
//!
//! let table = Table::from_dataframe("patients", &df)?;
//! let target = TargetConcept::SingleNominal {
//!     target: table.column_index("diagnosis")?,
//!     value: "positive".to_string(),
//! };
//!
//! let params = SearchParameters::builder(target)
//!     .quality_measure(QualityMeasureKind::WrAcc)
//!     .search_depth(2)
//!     .minimum_coverage(10)
//!     .build()?;
//!
//! let mut discovery = SubgroupDiscovery::new(&params, &table)?;
//! discovery.mine(Instant::now())?;
//!
//! for subgroup in discovery.result() {
//!     println!("{} {:.4} {}", subgroup.coverage(), subgroup.quality(), subgroup.conditions());
//! }
//! ```
//!
//! # Validation
//!
//! ```rust,ignore
//! use subdisc::{Validation, ValidationMethod, validation};
//!
//! let result = discovery.into_result();
//! let samples = Validation::new(&params, &mut table)
//!     .qualities(ValidationMethod::SwapRandomization, 100)?;
//!
//! let p_value = validation::empirical_p_value(&samples, &result)?;
//! let scores = validation::regression_test(&samples, &result)?;
//! ```

pub mod bayesian;
pub mod condition;
pub mod config;
pub mod error;
pub mod quality;
pub mod search;
pub mod subgroup;
pub mod table;
pub mod target;
pub mod validation;

// Re-exports for convenient access
pub use bayesian::{Bayesian, BinaryTable, Dag};
pub use condition::{Condition, ConditionList, ConditionValue, Operator};
pub use config::{
    ConfigValidationError, NumericStrategy, SearchParameters, SearchParametersBuilder,
    SearchStrategy,
};
pub use error::{Result as SubdiscResult, ResultExt, SubdiscError};
pub use quality::{MeasureFamily, QualityMeasureKind};
pub use search::{
    Candidate, CandidateQueue, Evaluation, Evaluator, Refinement, RefinementList,
    SubgroupDiscovery, SubgroupSet,
};
pub use subgroup::{Subgroup, SubgroupSummary};
pub use table::{Attribute, AttributeType, Column, Table};
pub use target::{TargetConcept, TargetType};
pub use validation::{RegressionTestScores, Validation, ValidationMethod, ValidationReport};
