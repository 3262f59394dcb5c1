//! Sync Session Adapter
//!
//! Bridges the async `Browser` trait to the sync `Session` trait the
//! execution engine drives. Uses `tokio::task::block_in_place` + `block_on`
//! to execute async operations synchronously.

use std::sync::Arc;
use std::time::Duration;

use crate::browser::types::{Browser, CommandError};
use crate::commands::types::{Locator, Session};

/// Adapter that wraps an async [`Browser`] and provides a sync interface.
pub struct SyncSession {
    inner: Arc<dyn Browser>,
    handle: tokio::runtime::Handle,
}

impl SyncSession {
    /// Create a new adapter wrapping the given browser.
    ///
    /// `handle` is the tokio runtime handle async operations run on; the
    /// calling thread must belong to a multi-thread runtime.
    pub fn new(browser: Arc<dyn Browser>, handle: tokio::runtime::Handle) -> Self {
        Self {
            inner: browser,
            handle,
        }
    }

    /// Execute an async operation synchronously using block_in_place.
    fn block_on<F, T>(&self, f: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        tokio::task::block_in_place(|| self.handle.block_on(f))
    }
}

impl Session for SyncSession {
    fn navigate(&mut self, url: &str) -> Result<(), CommandError> {
        self.block_on(self.inner.navigate(url))
    }

    fn back(&mut self) -> Result<(), CommandError> {
        self.block_on(self.inner.back())
    }

    fn forward(&mut self) -> Result<(), CommandError> {
        self.block_on(self.inner.forward())
    }

    fn refresh(&mut self) -> Result<(), CommandError> {
        self.block_on(self.inner.refresh())
    }

    fn click(&mut self, locator: &Locator) -> Result<(), CommandError> {
        self.block_on(self.inner.click(locator))
    }

    fn double_click(&mut self, locator: &Locator) -> Result<(), CommandError> {
        self.block_on(self.inner.double_click(locator))
    }

    fn right_click(&mut self, locator: &Locator) -> Result<(), CommandError> {
        self.block_on(self.inner.right_click(locator))
    }

    fn hover(&mut self, locator: &Locator) -> Result<(), CommandError> {
        self.block_on(self.inner.hover(locator))
    }

    fn type_text(&mut self, locator: &Locator, text: &str) -> Result<(), CommandError> {
        self.block_on(self.inner.type_text(locator, text))
    }

    fn clear(&mut self, locator: &Locator) -> Result<(), CommandError> {
        self.block_on(self.inner.clear(locator))
    }

    fn select_option(&mut self, locator: &Locator, option: &str) -> Result<(), CommandError> {
        self.block_on(self.inner.select_option(locator, option))
    }

    fn text_of(&mut self, locator: &Locator) -> Result<String, CommandError> {
        self.block_on(self.inner.text_of(locator))
    }

    fn is_visible(&mut self, locator: &Locator) -> Result<bool, CommandError> {
        self.block_on(self.inner.is_visible(locator))
    }

    fn current_url(&mut self) -> Result<String, CommandError> {
        self.block_on(self.inner.current_url())
    }

    fn switch_to_window(&mut self, handle: &str) -> Result<(), CommandError> {
        self.block_on(self.inner.switch_to_window(handle))
    }

    fn open_tab(&mut self, url: &str) -> Result<(), CommandError> {
        self.block_on(self.inner.open_tab(url))
    }

    fn close_tab(&mut self) -> Result<(), CommandError> {
        self.block_on(self.inner.close_tab())
    }

    fn wait_for(&mut self, locator: &Locator, timeout: Duration) -> Result<(), CommandError> {
        self.block_on(self.inner.wait_for(locator, timeout))
    }

    fn emit_log(&mut self, message: &str) {
        self.block_on(self.inner.emit_log(message));
    }

    fn capture_failure_artifact(&mut self, test_name: &str) {
        // Artifact capture failures must never mask the test failure.
        let _ = self.block_on(self.inner.capture_screenshot(test_name));
    }
}
