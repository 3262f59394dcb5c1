//! webscript - a browser-test scenario language
//!
//! This library provides the full pipeline for `.ws` scenario scripts:
//! lexing, parsing with collected diagnostics, a tree-walking execution
//! engine dispatching browser commands through a pluggable session
//! boundary, and a parallel test runner.

pub mod ast;
pub mod browser;
pub mod commands;
pub mod config;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod runner;

pub use browser::fake::FakeBrowser;
pub use browser::session::SyncSession;
pub use browser::types::{AssertionFailure, Browser, CommandError};
pub use commands::types::{CommandType, Locator, LocatorType, Session};
pub use config::Config;
pub use interpreter::errors::{EvalError, RuntimeError};
pub use interpreter::executor::{run_source, Executor};
pub use interpreter::types::{ControlSignal, Environment, ExecutionLimits, Value};
pub use parser::{parse, ParseError, ParseResult, Parser};
pub use runner::runner::{FakeSessionFactory, Runner, RunnerOptions, SessionFactory};
pub use runner::types::{RunSummary, RunnerError, TestResult, TestStatus};
