//! Bayesian network structure learning for multi-label targets.

mod binary_table;
mod dag;
mod network;

pub use binary_table::{BinaryTable, MAX_CONTINGENCY_COLUMNS, log_gamma};
pub use dag::{Dag, MAX_NODES};
pub use network::{Bayesian, MAX_PARENTS};
