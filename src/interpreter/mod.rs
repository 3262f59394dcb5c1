//! Interpreter module
//!
//! The tree-walking execution engine: values, environments, control-flow
//! signals, expression evaluation, and command dispatch.

pub mod errors;
pub mod evaluator;
pub mod executor;
pub mod interpolate;
pub mod types;

pub use errors::*;
pub use executor::*;
pub use interpolate::*;
pub use types::*;
