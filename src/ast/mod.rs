//! AST module
//!
//! Node types produced by the parser and consumed by the execution engine.

pub mod types;

pub use types::*;
