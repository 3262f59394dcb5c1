//! In-Memory Fake Browser
//!
//! A deterministic [`Browser`] implementation backed by an in-memory page
//! model. Scripts interact with elements registered up front; every
//! interaction is recorded in a journal so tests can assert on the exact
//! sequence of browser operations.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::browser::types::{Browser, CommandError};
use crate::commands::types::{Locator, LocatorType};

/// One element in the fake page model.
#[derive(Debug, Clone)]
struct Element {
    text: String,
    value: String,
    visible: bool,
}

#[derive(Debug, Default)]
struct FakeState {
    elements: HashMap<(LocatorType, String), Element>,
    windows: Vec<String>,
    current_window: usize,
    current_url: String,
    back_stack: Vec<String>,
    forward_stack: Vec<String>,
    journal: Vec<String>,
    logs: Vec<String>,
    screenshots: Vec<String>,
}

/// An in-memory browser for tests and offline runs.
pub struct FakeBrowser {
    state: Mutex<FakeState>,
}

impl Default for FakeBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBrowser {
    pub fn new() -> Self {
        let mut state = FakeState::default();
        state.windows.push("main".to_string());
        Self {
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        // A poisoned lock only means a test thread panicked mid-update.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register an element in the page model.
    pub fn add_element(&self, locator_type: LocatorType, selector: &str, text: &str, visible: bool) {
        self.state().elements.insert(
            (locator_type, selector.to_string()),
            Element {
                text: text.to_string(),
                value: String::new(),
                visible,
            },
        );
    }

    pub fn set_text(&self, locator_type: LocatorType, selector: &str, text: &str) {
        if let Some(el) = self.state().elements.get_mut(&(locator_type, selector.to_string())) {
            el.text = text.to_string();
        }
    }

    pub fn set_visible(&self, locator_type: LocatorType, selector: &str, visible: bool) {
        if let Some(el) = self.state().elements.get_mut(&(locator_type, selector.to_string())) {
            el.visible = visible;
        }
    }

    /// The typed/selected value of an element, if it exists.
    pub fn value_of(&self, locator_type: LocatorType, selector: &str) -> Option<String> {
        self.state()
            .elements
            .get(&(locator_type, selector.to_string()))
            .map(|el| el.value.clone())
    }

    /// The recorded interaction journal, in order.
    pub fn journal(&self) -> Vec<String> {
        self.state().journal.clone()
    }

    pub fn logs(&self) -> Vec<String> {
        self.state().logs.clone()
    }

    /// Test names a failure screenshot was captured for.
    pub fn screenshots(&self) -> Vec<String> {
        self.state().screenshots.clone()
    }

    fn with_element<T>(
        &self,
        locator: &Locator,
        action: &str,
        f: impl FnOnce(&mut Element) -> T,
    ) -> Result<T, CommandError> {
        let mut state = self.state();
        let key = (locator.locator_type, locator.value.clone());
        match state.elements.get(&key) {
            Some(el) if el.visible => {}
            Some(_) | None => {
                return Err(CommandError::ElementNotFound {
                    locator: locator.to_string(),
                });
            }
        }
        state.journal.push(format!("{} {}", action, locator));
        let el = state
            .elements
            .get_mut(&key)
            .ok_or_else(|| CommandError::ElementNotFound {
                locator: locator.to_string(),
            })?;
        Ok(f(el))
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn navigate(&self, url: &str) -> Result<(), CommandError> {
        let mut state = self.state();
        if !state.current_url.is_empty() {
            let previous = state.current_url.clone();
            state.back_stack.push(previous);
        }
        state.forward_stack.clear();
        state.current_url = url.to_string();
        state.journal.push(format!("open \"{}\"", url));
        Ok(())
    }

    async fn back(&self) -> Result<(), CommandError> {
        let mut state = self.state();
        let previous = state.back_stack.pop().ok_or_else(|| CommandError::Other {
            message: "no earlier page in history".to_string(),
        })?;
        let current = std::mem::replace(&mut state.current_url, previous);
        state.forward_stack.push(current);
        state.journal.push("back".to_string());
        Ok(())
    }

    async fn forward(&self) -> Result<(), CommandError> {
        let mut state = self.state();
        let next = state.forward_stack.pop().ok_or_else(|| CommandError::Other {
            message: "no later page in history".to_string(),
        })?;
        let current = std::mem::replace(&mut state.current_url, next);
        state.back_stack.push(current);
        state.journal.push("forward".to_string());
        Ok(())
    }

    async fn refresh(&self) -> Result<(), CommandError> {
        let mut state = self.state();
        state.journal.push("refresh".to_string());
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> Result<(), CommandError> {
        self.with_element(locator, "click", |_| ())
    }

    async fn double_click(&self, locator: &Locator) -> Result<(), CommandError> {
        self.with_element(locator, "doubleClick", |_| ())
    }

    async fn right_click(&self, locator: &Locator) -> Result<(), CommandError> {
        self.with_element(locator, "rightClick", |_| ())
    }

    async fn hover(&self, locator: &Locator) -> Result<(), CommandError> {
        self.with_element(locator, "hover", |_| ())
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<(), CommandError> {
        self.with_element(locator, "type", |el| el.value.push_str(text))
    }

    async fn clear(&self, locator: &Locator) -> Result<(), CommandError> {
        self.with_element(locator, "clear", |el| el.value.clear())
    }

    async fn select_option(&self, locator: &Locator, option: &str) -> Result<(), CommandError> {
        self.with_element(locator, "select", |el| el.value = option.to_string())
    }

    async fn text_of(&self, locator: &Locator) -> Result<String, CommandError> {
        let state = self.state();
        let key = (locator.locator_type, locator.value.clone());
        match state.elements.get(&key) {
            Some(el) => Ok(el.text.clone()),
            None => Err(CommandError::ElementNotFound {
                locator: locator.to_string(),
            }),
        }
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool, CommandError> {
        let state = self.state();
        let key = (locator.locator_type, locator.value.clone());
        // A missing element reads as not visible, so visibility assertions
        // report a mismatch instead of an infrastructure fault.
        Ok(state.elements.get(&key).map(|el| el.visible).unwrap_or(false))
    }

    async fn current_url(&self) -> Result<String, CommandError> {
        Ok(self.state().current_url.clone())
    }

    async fn switch_to_window(&self, handle: &str) -> Result<(), CommandError> {
        let mut state = self.state();
        match state.windows.iter().position(|w| w == handle) {
            Some(idx) => {
                state.current_window = idx;
                state.journal.push(format!("switchToWindow \"{}\"", handle));
                Ok(())
            }
            None => Err(CommandError::NoSuchWindow {
                handle: handle.to_string(),
            }),
        }
    }

    async fn open_tab(&self, url: &str) -> Result<(), CommandError> {
        let mut state = self.state();
        let handle = format!("tab-{}", state.windows.len());
        state.windows.push(handle.clone());
        state.current_window = state.windows.len() - 1;
        state.current_url = url.to_string();
        state.journal.push(format!("openTab \"{}\"", url));
        Ok(())
    }

    async fn close_tab(&self) -> Result<(), CommandError> {
        let mut state = self.state();
        if state.windows.len() <= 1 {
            return Err(CommandError::SessionLost {
                reason: "closed the last tab".to_string(),
            });
        }
        let idx = state.current_window;
        state.windows.remove(idx);
        state.current_window = 0;
        state.journal.push("closeTab".to_string());
        Ok(())
    }

    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<(), CommandError> {
        let started = std::time::Instant::now();
        loop {
            {
                let state = self.state();
                let key = (locator.locator_type, locator.value.clone());
                if state.elements.get(&key).map(|el| el.visible).unwrap_or(false) {
                    return Ok(());
                }
            }
            if started.elapsed() >= timeout {
                return Err(CommandError::Timeout {
                    condition: locator.to_string(),
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn emit_log(&self, message: &str) {
        self.state().logs.push(message.to_string());
    }

    async fn capture_screenshot(&self, test_name: &str) -> Result<(), CommandError> {
        self.state().screenshots.push(test_name.to_string());
        Ok(())
    }
}
