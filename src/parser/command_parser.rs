//! Command Statement Parser
//!
//! Parses browser command statements: a reserved command word followed by a
//! mixed argument list terminated by `;`. Within the list:
//! - a locator-type keyword captures the locator; its value expression is a
//!   positional argument
//! - `name = expr` pairs are named arguments
//! - anything else is a positional argument
//!
//! Locator presence is validated here, at parse time: commands that require
//! a locator fail without one, commands that forbid one fail with one.

use crate::ast::types::{Stmt, StmtKind};
use crate::commands::types::LocatorRule;
use crate::lexer::lexer::TokenType;
use crate::parser::parser::Parser;
use crate::parser::types::ParseError;

impl Parser {
    pub(crate) fn parse_command_statement(&mut self) -> Result<Stmt, ParseError> {
        let command_token = self.advance();
        let command = match command_token.command {
            Some(command) => command,
            None => {
                return Err(ParseError::with_token(
                    "internal: command token without command type",
                    command_token,
                ));
            }
        };

        let mut locator_type = None;
        let mut args = Vec::new();
        let mut named_args = Vec::new();

        while !self.check(TokenType::Semicolon) && !self.check(TokenType::Eof) {
            self.check_iteration_limit()?;

            if self.check(TokenType::Locator) {
                let locator_token = self.advance();
                if locator_type.is_some() {
                    return Err(ParseError::with_token(
                        format!("duplicate locator in '{}' command", command),
                        locator_token,
                    ));
                }
                locator_type = locator_token.locator;
                // The locator value is a positional argument.
                args.push(self.parse_expression()?);
            } else if self.check(TokenType::Identifier)
                && self.peek(1).token_type == TokenType::Assign
            {
                let name = self.advance().value;
                self.advance(); // '='
                named_args.push((name, self.parse_expression()?));
            } else {
                args.push(self.parse_expression()?);
            }
        }

        self.expect(TokenType::Semicolon, &format!("after '{}' command", command))?;

        // Contextual validation happens at parse time, not execution time.
        let spec = command.spec();
        match spec.locator {
            LocatorRule::Required if locator_type.is_none() => {
                return Err(ParseError::new(
                    format!("'{}' requires a locator (e.g. id \"...\")", command),
                    command_token.line,
                    command_token.column,
                ));
            }
            LocatorRule::Forbidden if locator_type.is_some() => {
                return Err(ParseError::new(
                    format!("'{}' does not take a locator", command),
                    command_token.line,
                    command_token.column,
                ));
            }
            _ => {}
        }

        Ok(Stmt::new(
            StmtKind::Command {
                command,
                locator_type,
                args,
                named_args,
            },
            command_token.line,
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::types::{ExprKind, LiteralNode, StmtKind};
    use crate::commands::types::{CommandType, LocatorType};
    use crate::parser::parse;

    #[test]
    fn test_click_with_id_locator() {
        let result = parse("test \"T\" { click id \"go\"; }");
        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
        let body = match &result.script.statements[0].kind {
            StmtKind::Test { name, body } => {
                assert_eq!(name, "T");
                body
            }
            other => panic!("expected test block, got {:?}", other),
        };
        match &body[0].kind {
            StmtKind::Command { command, locator_type, args, named_args } => {
                assert_eq!(*command, CommandType::Click);
                assert_eq!(*locator_type, Some(LocatorType::Id));
                assert_eq!(args.len(), 1);
                assert!(matches!(
                    &args[0].kind,
                    ExprKind::Literal(LiteralNode::Str(s)) if s == "go"
                ));
                assert!(named_args.is_empty());
            }
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn test_type_has_locator_and_payload() {
        let result = parse("type css \"#user\" \"alice\";");
        assert!(result.errors.is_empty());
        match &result.script.statements[0].kind {
            StmtKind::Command { command, locator_type, args, .. } => {
                assert_eq!(*command, CommandType::Type);
                assert_eq!(*locator_type, Some(LocatorType::Css));
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn test_named_argument() {
        let result = parse("wait id \"spinner\" timeout = 5;");
        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
        match &result.script.statements[0].kind {
            StmtKind::Command { named_args, .. } => {
                assert_eq!(named_args.len(), 1);
                assert_eq!(named_args[0].0, "timeout");
            }
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_locator_is_a_parse_error() {
        let result = parse("wait;");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("requires a locator"));

        let result = parse("click \"go\";");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("requires a locator"));
    }

    #[test]
    fn test_forbidden_locator_is_a_parse_error() {
        let result = parse("open id \"x\";");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("does not take a locator"));
    }

    #[test]
    fn test_duplicate_locator() {
        let result = parse("click id \"a\" css \"b\";");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("duplicate locator"));
    }

    #[test]
    fn test_navigation_without_locator() {
        let result = parse("open \"http://example.com\"; back; refresh;");
        assert!(result.errors.is_empty());
        assert_eq!(result.script.statements.len(), 3);
    }

    #[test]
    fn test_argument_expressions_are_full_expressions() {
        let result = parse("log \"attempt \" + (1 + 1);");
        assert!(result.errors.is_empty());
        match &result.script.statements[0].kind {
            StmtKind::Command { args, .. } => {
                assert_eq!(args.len(), 1);
                assert!(matches!(args[0].kind, ExprKind::Binary { .. }));
            }
            other => panic!("expected command, got {:?}", other),
        }
    }

    #[test]
    fn test_recovery_after_bad_command() {
        let result = parse("wait;\nset x = 1;\nopen id \"y\";\nset y = 2;");
        assert_eq!(result.errors.len(), 2);
        // The two good declarations survive.
        assert_eq!(result.script.statements.len(), 2);
    }
}
