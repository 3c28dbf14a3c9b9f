//! Subgroup search: refinement, frontier, scoring and result collection.

mod candidate;
mod discovery;
mod evaluator;
pub mod postprocess;
mod refinement;
mod subgroup_set;

pub use candidate::{Candidate, CandidateQueue};
pub use discovery::SubgroupDiscovery;
pub use evaluator::{Evaluation, Evaluator};
pub use refinement::{Refinement, RefinementList};
pub use subgroup_set::SubgroupSet;
