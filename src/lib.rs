//! Hierclean
//!
//! Cleans a nested continent → country → university → faculty →
//! department → student dataset and reports on what is left.
//!
//! The pipeline is a pure in-memory library call:
//!
//! 1. [`cleaning::Validator`] removes students with a missing name or a
//!    missing / out-of-range `calc` or `algebra` score.
//! 2. [`cleaning::prune`] removes containers left empty, innermost first.
//! 3. [`analysis::flatten`] emits one [`models::FlatRow`] per student.
//! 4. [`analysis::aggregator`] computes grouped means and the best department.
//!
//! ```no_run
//! use hierclean::pipeline::{run, PipelineOptions};
//! use hierclean::store::loader;
//!
//! let mut store = loader::sample();
//! let outcome = run(&mut store, &PipelineOptions::default())?;
//! println!("{}", outcome.analytics.best_department.name);
//! # Ok::<(), hierclean::error::PipelineError>(())
//! ```

pub mod analysis;
pub mod cleaning;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod store;

pub use error::{PipelineError, PipelineResult};
pub use store::HierarchyStore;
