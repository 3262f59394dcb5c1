//! Parser Types and Constants
//!
//! Shared types and limits used across parser modules.

use std::fmt;

use crate::ast::types::ScriptNode;
use crate::lexer::lexer::Token;

// Parser limits to prevent hangs and resource exhaustion
pub const MAX_INPUT_SIZE: usize = 1_000_000; // 1MB max input
pub const MAX_TOKENS: usize = 100_000;
pub const MAX_PARSE_ITERATIONS: usize = 1_000_000;
pub const MAX_PARSER_DEPTH: usize = 200;

/// A grammar violation, pointing at the offending token or "at end".
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub token: Option<Token>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "syntax error at {}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ParseError {}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            token: None,
        }
    }

    pub fn with_token(message: impl Into<String>, token: Token) -> Self {
        let (line, column) = (token.line, token.column);
        Self {
            message: message.into(),
            line,
            column,
            token: Some(token),
        }
    }
}

/// The outcome of parsing one source file.
///
/// Parsing collects per-statement diagnostics instead of failing on the
/// first error: a malformed top-level statement is recorded and skipped,
/// and parsing resumes at the next statement boundary. A lex error yields
/// an empty script with a single diagnostic.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub script: ScriptNode,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Collapse to the first error, for callers that want fail-fast behavior.
    pub fn into_result(self) -> Result<ScriptNode, ParseError> {
        match self.errors.into_iter().next() {
            Some(err) => Err(err),
            None => Ok(self.script),
        }
    }
}
