//! Runner module
//!
//! Parallel test execution: unit discovery, the worker pool, per-test
//! results, and the run summary.

pub mod runner;
pub mod types;

pub use runner::*;
pub use types::*;
