//! Commands module
//!
//! The browser command vocabulary, per-command grammar rules, and the
//! factory that assembles and dispatches runnable commands.

pub mod factory;
pub mod types;

pub use factory::*;
pub use types::*;
