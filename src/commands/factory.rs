//! Command Factory and Dispatch
//!
//! Builds a concrete [`BrowserCommand`] from an evaluated argument list,
//! enforcing per-command arity, then dispatches it through the sync
//! [`Session`] boundary. Assertions compare observed browser state against
//! the expected argument and surface mismatches as [`AssertionFailure`]s.

use std::collections::HashMap;
use std::time::Duration;

use crate::browser::types::{AssertionFailure, CommandError};
use crate::commands::types::{CommandType, Locator, LocatorType, Session};
use crate::interpreter::errors::RuntimeError;

/// Default ceiling for `wait` when no `timeout` argument is given.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

/// One fully-resolved browser command, ready to run.
#[derive(Debug, Clone)]
pub struct BrowserCommand {
    pub command: CommandType,
    pub locator: Option<Locator>,
    /// Positional arguments; when a locator is present its value is `args[0]`.
    pub args: Vec<String>,
    pub timeout: Duration,
    pub line: usize,
}

/// Validate arity and assemble a [`BrowserCommand`].
///
/// The parser already enforced locator presence; arity can still be wrong
/// (`click id "a" "b"`) and is rejected here.
pub fn create_command(
    command: CommandType,
    locator_type: Option<LocatorType>,
    args: Vec<String>,
    named_args: &HashMap<String, String>,
    line: usize,
) -> Result<BrowserCommand, CommandError> {
    let spec = command.spec();
    if args.len() != spec.arity {
        return Err(CommandError::ArgumentCount {
            command: command.as_str(),
            expected: spec.arity,
            actual: args.len(),
        });
    }

    let locator = match locator_type {
        Some(locator_type) => Some(Locator {
            locator_type,
            value: args
                .first()
                .cloned()
                .unwrap_or_default(),
        }),
        None => None,
    };

    let mut timeout = DEFAULT_WAIT_TIMEOUT;
    for (name, raw) in named_args {
        match (command, name.as_str()) {
            (CommandType::Wait, "timeout") => timeout = parse_timeout(command, raw)?,
            _ => {
                return Err(CommandError::InvalidArgument {
                    command: command.as_str(),
                    reason: format!("unknown argument '{}'", name),
                });
            }
        }
    }

    Ok(BrowserCommand {
        command,
        locator,
        args,
        timeout,
        line,
    })
}

fn parse_timeout(command: CommandType, raw: &str) -> Result<Duration, CommandError> {
    match raw.parse::<f64>() {
        Ok(secs) if secs > 0.0 => Ok(Duration::from_secs_f64(secs)),
        _ => Err(CommandError::InvalidArgument {
            command: command.as_str(),
            reason: format!("timeout must be a positive number of seconds, got '{}'", raw),
        }),
    }
}

impl BrowserCommand {
    /// Dispatch this command against a session.
    pub fn run(&self, session: &mut dyn Session) -> Result<(), RuntimeError> {
        use CommandType::*;

        let outcome = match self.command {
            Open => session.navigate(&self.args[0]),
            Back => session.back(),
            Forward => session.forward(),
            Refresh => session.refresh(),
            SwitchToWindow => session.switch_to_window(&self.args[0]),
            OpenTab => session.open_tab(&self.args[0]),
            CloseTab => session.close_tab(),

            Click => session.click(self.locator()?),
            DoubleClick => session.double_click(self.locator()?),
            RightClick => session.right_click(self.locator()?),
            Hover => session.hover(self.locator()?),
            Clear => session.clear(self.locator()?),
            Type => session.type_text(self.locator()?, &self.args[1]),
            Select => session.select_option(self.locator()?, &self.args[1]),

            Wait => {
                let locator = self.locator()?;
                session.wait_for(locator, self.timeout)
            }

            Log => {
                session.emit_log(&self.args[0]);
                Ok(())
            }

            AssertText => return self.run_assert_text(session),
            AssertVisible => return self.run_assert_visible(session),
            AssertUrl => return self.run_assert_url(session),
        };

        outcome.map_err(|source| RuntimeError::command(source, self.line))
    }

    fn locator(&self) -> Result<&Locator, RuntimeError> {
        self.locator.as_ref().ok_or_else(|| {
            RuntimeError::command(
                CommandError::InvalidLocator {
                    reason: format!("'{}' is missing its locator", self.command),
                },
                self.line,
            )
        })
    }

    fn run_assert_text(&self, session: &mut dyn Session) -> Result<(), RuntimeError> {
        let locator = self.locator()?;
        let actual = session
            .text_of(locator)
            .map_err(|source| RuntimeError::command(source, self.line))?;
        let expected = &self.args[1];
        if &actual != expected {
            return Err(RuntimeError::assertion(
                AssertionFailure {
                    subject: locator.to_string(),
                    expected: expected.clone(),
                    actual,
                },
                self.line,
            ));
        }
        Ok(())
    }

    fn run_assert_visible(&self, session: &mut dyn Session) -> Result<(), RuntimeError> {
        let locator = self.locator()?;
        let visible = session
            .is_visible(locator)
            .map_err(|source| RuntimeError::command(source, self.line))?;
        if !visible {
            return Err(RuntimeError::assertion(
                AssertionFailure {
                    subject: locator.to_string(),
                    expected: "visible".to_string(),
                    actual: "hidden".to_string(),
                },
                self.line,
            ));
        }
        Ok(())
    }

    fn run_assert_url(&self, session: &mut dyn Session) -> Result<(), RuntimeError> {
        let actual = session
            .current_url()
            .map_err(|source| RuntimeError::command(source, self.line))?;
        let expected = &self.args[0];
        if &actual != expected {
            return Err(RuntimeError::assertion(
                AssertionFailure {
                    subject: "url".to_string(),
                    expected: expected.clone(),
                    actual,
                },
                self.line,
            ));
        }
        Ok(())
    }
}
