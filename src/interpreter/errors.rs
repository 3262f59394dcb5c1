//! Runtime Error Types
//!
//! Two layers: `EvalError` for faults raised by expression evaluation and
//! statement semantics, and `RuntimeError` as the umbrella the engine
//! returns, folding in browser-command faults and assertion mismatches.

use thiserror::Error;

use crate::browser::types::{AssertionFailure, CommandError};

/// A fault raised while evaluating expressions or enforcing statement
/// semantics. Every variant carries the source line it was raised on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("line {line}: undefined variable '{name}'")]
    UndefinedVariable { name: String, line: usize },

    #[error("line {line}: undefined function '{name}'")]
    UndefinedFunction { name: String, line: usize },

    #[error("line {line}: function '{name}' expects {expected} argument(s), got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
        line: usize,
    },

    #[error("line {line}: division by zero")]
    DivisionByZero { line: usize },

    #[error("line {line}: {message}")]
    TypeMismatch { message: String, line: usize },
}

impl EvalError {
    pub fn type_mismatch(message: impl Into<String>, line: usize) -> Self {
        Self::TypeMismatch {
            message: message.into(),
            line,
        }
    }
}

/// Any fault that stops a running script.
#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    #[error(transparent)]
    Eval(#[from] EvalError),

    /// A browser command failed (infrastructure fault, not a mismatch).
    #[error("line {line}: {source}")]
    Command {
        source: CommandError,
        line: usize,
    },

    /// An assertion command observed an expected-vs-actual mismatch.
    #[error("line {line}: {source}")]
    Assertion {
        source: AssertionFailure,
        line: usize,
    },

    /// An execution limit was hit (call depth, loop iterations).
    #[error("line {line}: {message}")]
    Limit { message: String, line: usize },

    /// A `test` block failed; wraps the underlying fault's message.
    #[error("test '{name}' failed: {message}")]
    TestFailed {
        name: String,
        message: String,
        /// True when the failure was an assertion mismatch rather than an
        /// infrastructure or language fault.
        assertion: bool,
    },
}

impl RuntimeError {
    pub fn command(source: CommandError, line: usize) -> Self {
        Self::Command { source, line }
    }

    pub fn assertion(source: AssertionFailure, line: usize) -> Self {
        Self::Assertion { source, line }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_line() {
        let e = EvalError::UndefinedVariable {
            name: "x".into(),
            line: 7,
        };
        assert_eq!(e.to_string(), "line 7: undefined variable 'x'");

        let e = RuntimeError::from(EvalError::DivisionByZero { line: 3 });
        assert_eq!(e.to_string(), "line 3: division by zero");
    }

    #[test]
    fn test_assertion_message() {
        let e = RuntimeError::assertion(
            AssertionFailure {
                subject: "id \"msg\"".into(),
                expected: "Welcome".into(),
                actual: "Error".into(),
            },
            12,
        );
        assert_eq!(
            e.to_string(),
            "line 12: assertion failed for id \"msg\": expected 'Welcome', actual 'Error'"
        );
    }
}
