//! Parser module
//!
//! Recursive descent parser with collected diagnostics and
//! statement-boundary recovery.

pub mod command_parser;
pub mod expression_parser;
pub mod parser;
pub mod types;

pub use parser::{parse, Parser};
pub use types::{ParseError, ParseResult};
