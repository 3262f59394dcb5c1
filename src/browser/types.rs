//! Browser Boundary Types
//!
//! Core types and traits for the browser-session boundary. The execution
//! engine never drives a browser directly; it goes through the async
//! `Browser` trait (implemented by real drivers, or by the in-memory
//! `FakeBrowser`) via the sync `Session` adapter.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::commands::types::Locator;

/// Failures surfaced by the browser layer while executing a command.
///
/// These are infrastructure faults; an expected-vs-actual mismatch is an
/// [`AssertionFailure`] instead.
#[derive(Error, Debug, Clone)]
pub enum CommandError {
    #[error("element not found: {locator}")]
    ElementNotFound { locator: String },

    #[error("timed out after {waited_ms}ms waiting for {condition}")]
    Timeout { condition: String, waited_ms: u64 },

    #[error("invalid locator: {reason}")]
    InvalidLocator { reason: String },

    #[error("stale element reference: {locator}")]
    StaleElement { locator: String },

    #[error("no window with handle '{handle}'")]
    NoSuchWindow { handle: String },

    #[error("{command} expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        command: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid argument for {command}: {reason}")]
    InvalidArgument {
        command: &'static str,
        reason: String,
    },

    #[error("browser session lost: {reason}")]
    SessionLost { reason: String },

    #[error("{message}")]
    Other { message: String },
}

/// An expected-vs-actual mismatch produced by an assertion command.
#[derive(Error, Debug, Clone)]
#[error("assertion failed for {subject}: expected '{expected}', actual '{actual}'")]
pub struct AssertionFailure {
    /// What was asserted on (a locator description or "url").
    pub subject: String,
    pub expected: String,
    pub actual: String,
}

/// A browser session.
///
/// Implementations use interior mutability; one session must not be shared
/// between concurrently running tests.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), CommandError>;
    async fn back(&self) -> Result<(), CommandError>;
    async fn forward(&self) -> Result<(), CommandError>;
    async fn refresh(&self) -> Result<(), CommandError>;

    async fn click(&self, locator: &Locator) -> Result<(), CommandError>;
    async fn double_click(&self, locator: &Locator) -> Result<(), CommandError>;
    async fn right_click(&self, locator: &Locator) -> Result<(), CommandError>;
    async fn hover(&self, locator: &Locator) -> Result<(), CommandError>;
    async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), CommandError>;
    async fn clear(&self, locator: &Locator) -> Result<(), CommandError>;
    async fn select_option(&self, locator: &Locator, option: &str) -> Result<(), CommandError>;

    async fn text_of(&self, locator: &Locator) -> Result<String, CommandError>;
    async fn is_visible(&self, locator: &Locator) -> Result<bool, CommandError>;
    async fn current_url(&self) -> Result<String, CommandError>;

    async fn switch_to_window(&self, handle: &str) -> Result<(), CommandError>;
    async fn open_tab(&self, url: &str) -> Result<(), CommandError>;
    async fn close_tab(&self) -> Result<(), CommandError>;

    /// Block until the located element is present and visible, up to `timeout`.
    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<(), CommandError>;

    /// Emit a log line from the running script.
    async fn emit_log(&self, message: &str);

    /// Capture a failure artifact (screenshot) for a failed test.
    async fn capture_screenshot(&self, test_name: &str) -> Result<(), CommandError>;
}
