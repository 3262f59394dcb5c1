//! Lexer module
//!
//! Turns source text into an EOF-terminated token stream.

pub mod lexer;

pub use lexer::*;
