//! Cleaning stages.
//!
//! Validation removes invalid students; pruning then removes every
//! container left empty, innermost level first.

pub mod pruner;
pub mod validator;

pub use pruner::prune;
pub use validator::Validator;
