//! Browser module
//!
//! The async browser boundary, the sync session adapter the execution
//! engine drives, and the in-memory fake used for tests and offline runs.

pub mod fake;
pub mod session;
pub mod types;

pub use fake::*;
pub use session::*;
pub use types::*;
