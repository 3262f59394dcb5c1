//! Command Types and Tables
//!
//! The fixed vocabulary of browser commands and locator types, the
//! per-command grammar rules (positional arity, locator required or
//! forbidden), and the sync `Session` boundary the execution engine
//! drives commands through.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::browser::types::CommandError;

/// The reserved browser commands of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandType {
    // Interaction
    Click,
    DoubleClick,
    RightClick,
    Hover,
    Type,
    Clear,
    Select,
    // Assertions
    AssertText,
    AssertVisible,
    AssertUrl,
    // Navigation
    Open,
    Back,
    Forward,
    Refresh,
    SwitchToWindow,
    OpenTab,
    CloseTab,
    // Utility
    Log,
    Wait,
}

impl CommandType {
    /// Canonical (camelCase) spelling, as used in scripts and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::DoubleClick => "doubleClick",
            Self::RightClick => "rightClick",
            Self::Hover => "hover",
            Self::Type => "type",
            Self::Clear => "clear",
            Self::Select => "select",
            Self::AssertText => "assertText",
            Self::AssertVisible => "assertVisible",
            Self::AssertUrl => "assertURL",
            Self::Open => "open",
            Self::Back => "back",
            Self::Forward => "forward",
            Self::Refresh => "refresh",
            Self::SwitchToWindow => "switchToWindow",
            Self::OpenTab => "openTab",
            Self::CloseTab => "closeTab",
            Self::Log => "log",
            Self::Wait => "wait",
        }
    }

    /// Look up a command name. Lookups are case-insensitive; table keys are
    /// registered lowercase so `doubleClick` and `doubleclick` both resolve.
    pub fn lookup(name: &str) -> Option<CommandType> {
        COMMAND_TABLE.get(name.to_lowercase().as_str()).copied()
    }

    /// Grammar rules for this command.
    pub fn spec(&self) -> &'static CommandSpec {
        // Every command is registered in the spec table.
        &COMMAND_SPECS[self]
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Locator-type keywords: how a target element is identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocatorType {
    Id,
    Css,
    XPath,
    Name,
    Class,
    Link,
    PartialLink,
    Tag,
}

impl LocatorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Css => "css",
            Self::XPath => "xpath",
            Self::Name => "name",
            Self::Class => "class",
            Self::Link => "link",
            Self::PartialLink => "partialLink",
            Self::Tag => "tag",
        }
    }

    /// Case-insensitive lookup against the locator keyword table.
    pub fn lookup(name: &str) -> Option<LocatorType> {
        LOCATOR_TABLE.get(name.to_lowercase().as_str()).copied()
    }
}

impl fmt::Display for LocatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A (type, value) pair identifying a target element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub locator_type: LocatorType,
    pub value: String,
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.locator_type, self.value)
    }
}

/// Whether a command's grammar takes a locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorRule {
    Required,
    Forbidden,
}

/// Grammar rules for one command: fixed positional arity and locator rule.
///
/// The locator's value expression counts as a positional argument, so
/// `click id "go"` has arity 1.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub arity: usize,
    pub locator: LocatorRule,
}

lazy_static! {
    /// Command names, keyed by lowercased canonical spelling.
    static ref COMMAND_TABLE: HashMap<String, CommandType> = {
        let mut m = HashMap::new();
        for cmd in ALL_COMMANDS {
            m.insert(cmd.as_str().to_lowercase(), *cmd);
        }
        m
    };

    /// Locator keywords, keyed lowercase.
    static ref LOCATOR_TABLE: HashMap<&'static str, LocatorType> = {
        let mut m = HashMap::new();
        m.insert("id", LocatorType::Id);
        m.insert("css", LocatorType::Css);
        m.insert("xpath", LocatorType::XPath);
        m.insert("name", LocatorType::Name);
        m.insert("class", LocatorType::Class);
        m.insert("link", LocatorType::Link);
        m.insert("partiallink", LocatorType::PartialLink);
        m.insert("tag", LocatorType::Tag);
        m
    };

    /// Per-command grammar rules.
    static ref COMMAND_SPECS: HashMap<CommandType, CommandSpec> = {
        use CommandType::*;
        use LocatorRule::*;
        let mut m = HashMap::new();
        // Element interactions: the selector is the single positional arg.
        for cmd in [Click, DoubleClick, RightClick, Hover, Clear] {
            m.insert(cmd, CommandSpec { arity: 1, locator: Required });
        }
        // selector + payload
        m.insert(Type, CommandSpec { arity: 2, locator: Required });
        m.insert(Select, CommandSpec { arity: 2, locator: Required });
        // Assertions
        m.insert(AssertText, CommandSpec { arity: 2, locator: Required });
        m.insert(AssertVisible, CommandSpec { arity: 1, locator: Required });
        m.insert(AssertUrl, CommandSpec { arity: 1, locator: Forbidden });
        // Navigation
        m.insert(Open, CommandSpec { arity: 1, locator: Forbidden });
        m.insert(Back, CommandSpec { arity: 0, locator: Forbidden });
        m.insert(Forward, CommandSpec { arity: 0, locator: Forbidden });
        m.insert(Refresh, CommandSpec { arity: 0, locator: Forbidden });
        m.insert(SwitchToWindow, CommandSpec { arity: 1, locator: Forbidden });
        m.insert(OpenTab, CommandSpec { arity: 1, locator: Forbidden });
        m.insert(CloseTab, CommandSpec { arity: 0, locator: Forbidden });
        // Utility
        m.insert(Log, CommandSpec { arity: 1, locator: Forbidden });
        // wait blocks on the located element; optional `timeout = secs`.
        m.insert(Wait, CommandSpec { arity: 1, locator: Required });
        m
    };
}

/// All commands, for table registration.
const ALL_COMMANDS: &[CommandType] = &[
    CommandType::Click,
    CommandType::DoubleClick,
    CommandType::RightClick,
    CommandType::Hover,
    CommandType::Type,
    CommandType::Clear,
    CommandType::Select,
    CommandType::AssertText,
    CommandType::AssertVisible,
    CommandType::AssertUrl,
    CommandType::Open,
    CommandType::Back,
    CommandType::Forward,
    CommandType::Refresh,
    CommandType::SwitchToWindow,
    CommandType::OpenTab,
    CommandType::CloseTab,
    CommandType::Log,
    CommandType::Wait,
];

/// Sync command boundary driven by the statement executor.
///
/// Mirrors the async `Browser` trait method-for-method; `SyncSession`
/// bridges the two. Test code can implement this directly.
pub trait Session {
    fn navigate(&mut self, url: &str) -> Result<(), CommandError>;
    fn back(&mut self) -> Result<(), CommandError>;
    fn forward(&mut self) -> Result<(), CommandError>;
    fn refresh(&mut self) -> Result<(), CommandError>;

    fn click(&mut self, locator: &Locator) -> Result<(), CommandError>;
    fn double_click(&mut self, locator: &Locator) -> Result<(), CommandError>;
    fn right_click(&mut self, locator: &Locator) -> Result<(), CommandError>;
    fn hover(&mut self, locator: &Locator) -> Result<(), CommandError>;
    fn type_text(&mut self, locator: &Locator, text: &str) -> Result<(), CommandError>;
    fn clear(&mut self, locator: &Locator) -> Result<(), CommandError>;
    fn select_option(&mut self, locator: &Locator, option: &str) -> Result<(), CommandError>;

    fn text_of(&mut self, locator: &Locator) -> Result<String, CommandError>;
    fn is_visible(&mut self, locator: &Locator) -> Result<bool, CommandError>;
    fn current_url(&mut self) -> Result<String, CommandError>;

    fn switch_to_window(&mut self, handle: &str) -> Result<(), CommandError>;
    fn open_tab(&mut self, url: &str) -> Result<(), CommandError>;
    fn close_tab(&mut self) -> Result<(), CommandError>;

    fn wait_for(&mut self, locator: &Locator, timeout: Duration) -> Result<(), CommandError>;

    fn emit_log(&mut self, message: &str);

    /// Fire-and-forget: failures here must never mask the test failure.
    fn capture_failure_artifact(&mut self, test_name: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_lookup_is_case_insensitive() {
        assert_eq!(CommandType::lookup("click"), Some(CommandType::Click));
        assert_eq!(CommandType::lookup("doubleClick"), Some(CommandType::DoubleClick));
        assert_eq!(CommandType::lookup("DOUBLECLICK"), Some(CommandType::DoubleClick));
        assert_eq!(CommandType::lookup("assertURL"), Some(CommandType::AssertUrl));
        assert_eq!(CommandType::lookup("notacommand"), None);
    }

    #[test]
    fn test_locator_lookup() {
        assert_eq!(LocatorType::lookup("id"), Some(LocatorType::Id));
        assert_eq!(LocatorType::lookup("partialLink"), Some(LocatorType::PartialLink));
        assert_eq!(LocatorType::lookup("XPATH"), Some(LocatorType::XPath));
        assert_eq!(LocatorType::lookup("href"), None);
    }

    #[test]
    fn test_every_command_has_a_spec() {
        for cmd in ALL_COMMANDS {
            let spec = cmd.spec();
            assert!(spec.arity <= 2, "{} arity {}", cmd, spec.arity);
        }
    }

    #[test]
    fn test_spec_rules() {
        assert_eq!(CommandType::Click.spec().arity, 1);
        assert_eq!(CommandType::Click.spec().locator, LocatorRule::Required);
        assert_eq!(CommandType::Type.spec().arity, 2);
        assert_eq!(CommandType::Open.spec().locator, LocatorRule::Forbidden);
        assert_eq!(CommandType::Wait.spec().locator, LocatorRule::Required);
        assert_eq!(CommandType::Back.spec().arity, 0);
    }
}
