//! Analysis modules.
//!
//! Flattening turns the cleaned tree into rows; aggregation reduces the
//! rows to grouped averages.

pub mod aggregator;
pub mod flattener;

pub use aggregator::*;
pub use flattener::{expected_row_count, flatten};
