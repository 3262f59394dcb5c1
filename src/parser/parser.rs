//! Recursive Descent Parser for Test Scenario Scripts
//!
//! Consumes tokens from the lexer and produces an AST.
//!
//! Grammar (simplified):
//!   script       ::= declaration*
//!   declaration  ::= function | var | import | export | test | statement
//!   statement    ::= if | while | for | return | block | command | expr ';'
//!   command      ::= COMMAND (LOCATOR expr | NAME '=' expr | expr)* ';'
//!
//! Parsing collects diagnostics: a malformed declaration is recorded and the
//! parser synchronizes at the next statement boundary, so one bad statement
//! does not abort the whole file.

use crate::ast::types::{ExportTarget, ForClauses, ScriptNode, Stmt, StmtKind};
use crate::lexer::lexer::{tokenize, Literal, Token, TokenType};
use crate::parser::types::{
    ParseError, ParseResult, MAX_INPUT_SIZE, MAX_PARSER_DEPTH, MAX_PARSE_ITERATIONS, MAX_TOKENS,
};

/// Main parser struct.
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    pub(crate) parse_iterations: usize,
    pub(crate) depth: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            tokens: Vec::new(),
            pos: 0,
            parse_iterations: 0,
            depth: 0,
        }
    }

    /// Parse a source string into a script plus collected diagnostics.
    pub fn parse(&mut self, input: &str) -> ParseResult {
        if input.len() > MAX_INPUT_SIZE {
            return ParseResult {
                script: ScriptNode::empty(),
                errors: vec![ParseError::new(
                    format!(
                        "input too large: {} bytes exceeds limit of {}",
                        input.len(),
                        MAX_INPUT_SIZE
                    ),
                    1,
                    1,
                )],
            };
        }

        let tokens = match tokenize(input) {
            Ok(tokens) => tokens,
            Err(e) => {
                return ParseResult {
                    script: ScriptNode::empty(),
                    errors: vec![ParseError::new(e.message, e.line, e.column)],
                };
            }
        };

        if tokens.len() > MAX_TOKENS {
            return ParseResult {
                script: ScriptNode::empty(),
                errors: vec![ParseError::new(
                    format!("too many tokens: {} exceeds limit of {}", tokens.len(), MAX_TOKENS),
                    1,
                    1,
                )],
            };
        }

        self.tokens = tokens;
        self.pos = 0;
        self.parse_iterations = 0;
        self.depth = 0;

        let mut statements = Vec::new();
        let mut errors = Vec::new();

        while !self.check(TokenType::Eof) {
            let start_pos = self.pos;
            match self.parse_declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    errors.push(e);
                    // Guarantee progress when the offending token was never
                    // consumed, then skip to the next statement boundary.
                    if self.pos == start_pos {
                        self.advance();
                    }
                    self.synchronize();
                }
            }
        }

        ParseResult {
            script: ScriptNode::new(statements),
            errors,
        }
    }

    // ===========================================================================
    // HELPER METHODS
    // ===========================================================================

    pub(crate) fn current(&self) -> &Token {
        // The stream is EOF-terminated, so pos never runs past the end.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn check(&self, token_type: TokenType) -> bool {
        self.current().token_type == token_type
    }

    pub(crate) fn match_token(&mut self, token_type: TokenType) -> bool {
        if self.check(token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, token_type: TokenType, context: &str) -> Result<Token, ParseError> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!("expected '{}' {}", token_type.as_str(), context)))
        }
    }

    /// Like [`Self::expect`] for identifiers, but also accepts locator
    /// keywords (`id`, `name`, `css`, ...): those carry meaning only inside
    /// a command's argument list and are ordinary names everywhere else.
    pub(crate) fn expect_identifier(&mut self, context: &str) -> Result<Token, ParseError> {
        if self.check(TokenType::Identifier) || self.check(TokenType::Locator) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!(
                "expected '{}' {}",
                TokenType::Identifier.as_str(),
                context
            )))
        }
    }

    /// Build an error pointing at the current token (or "at end").
    pub(crate) fn error_here(&self, message: impl Into<String>) -> ParseError {
        let token = self.current().clone();
        let message = message.into();
        let full = if token.token_type == TokenType::Eof {
            format!("{}, found end of input", message)
        } else {
            format!("{}, found '{}'", message, token.value)
        };
        ParseError::with_token(full, token)
    }

    pub(crate) fn check_iteration_limit(&mut self) -> Result<(), ParseError> {
        self.parse_iterations += 1;
        if self.parse_iterations > MAX_PARSE_ITERATIONS {
            return Err(ParseError::new(
                "maximum parse iterations exceeded (possible infinite loop)",
                self.current().line,
                self.current().column,
            ));
        }
        Ok(())
    }

    pub(crate) fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_PARSER_DEPTH {
            return Err(ParseError::new(
                "maximum nesting depth exceeded",
                self.current().line,
                self.current().column,
            ));
        }
        Ok(())
    }

    pub(crate) fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Advance to the next statement boundary after an error: just past a
    /// `;`, or up to the next declaration/statement keyword. An error raised
    /// after a statement was fully consumed leaves us already at a boundary.
    fn synchronize(&mut self) {
        while !self.check(TokenType::Eof) {
            if self.previous().token_type == TokenType::Semicolon {
                return;
            }
            match self.current().token_type {
                TokenType::Function
                | TokenType::Set
                | TokenType::If
                | TokenType::While
                | TokenType::For
                | TokenType::Return
                | TokenType::Break
                | TokenType::Continue
                | TokenType::Test
                | TokenType::Import
                | TokenType::Export
                | TokenType::Command => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ===========================================================================
    // DECLARATIONS
    // ===========================================================================

    fn parse_declaration(&mut self) -> Result<Stmt, ParseError> {
        self.check_iteration_limit()?;
        match self.current().token_type {
            TokenType::Function => self.parse_function(),
            TokenType::Set => self.parse_var(),
            TokenType::Import => self.parse_import(),
            TokenType::Export => self.parse_export(),
            TokenType::Test => self.parse_test(),
            _ => self.parse_statement(),
        }
    }

    /// `function name(param, ...) { body }`
    fn parse_function(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        let name = self.expect_identifier("after 'function'")?.value;
        self.expect(TokenType::LParen, "after function name")?;

        let mut params = Vec::new();
        if !self.check(TokenType::RParen) {
            loop {
                self.check_iteration_limit()?;
                let param = self.expect_identifier("in parameter list")?;
                params.push(param.value);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenType::RParen, "after parameters")?;
        let body = self.parse_block()?;

        Ok(Stmt::new(StmtKind::Function { name, params, body }, keyword.line))
    }

    /// `set name [= initializer];`
    fn parse_var(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        let name = self.expect_identifier("after 'set'")?.value;

        let initializer = if self.match_token(TokenType::Assign) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(TokenType::Semicolon, "after variable declaration")?;

        Ok(Stmt::new(StmtKind::Var { name, initializer }, keyword.line))
    }

    /// `import "path" [as alias];`
    fn parse_import(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        let path_token = self.expect(TokenType::Str, "after 'import'")?;
        let path = match path_token.literal {
            Some(Literal::Str(s)) => s,
            _ => path_token.value,
        };

        let alias = if self.match_token(TokenType::As) {
            Some(self.expect_identifier("after 'as'")?.value)
        } else {
            None
        };
        self.expect(TokenType::Semicolon, "after import")?;

        Ok(Stmt::new(StmtKind::Import { path, alias }, keyword.line))
    }

    /// `export name;` or `export all;`
    fn parse_export(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        let name = self.expect_identifier("after 'export'")?;
        let target = if name.value.eq_ignore_ascii_case("all") {
            ExportTarget::All
        } else {
            ExportTarget::Name(name.value)
        };
        self.expect(TokenType::Semicolon, "after export")?;

        Ok(Stmt::new(StmtKind::Export(target), keyword.line))
    }

    /// `test "name" { body }`
    fn parse_test(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        let name_token = self.expect(TokenType::Str, "after 'test'")?;
        let name = match name_token.literal {
            Some(Literal::Str(s)) => s,
            _ => name_token.value,
        };
        let body = self.parse_block()?;

        Ok(Stmt::new(StmtKind::Test { name, body }, keyword.line))
    }

    // ===========================================================================
    // STATEMENTS
    // ===========================================================================

    pub(crate) fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        self.enter()?;
        let result = match self.current().token_type {
            TokenType::If => self.parse_if(),
            TokenType::While => self.parse_while(),
            TokenType::For => self.parse_for(),
            TokenType::Return => self.parse_return(),
            TokenType::Break => {
                let keyword = self.advance();
                self.expect(TokenType::Semicolon, "after 'break'")?;
                Ok(Stmt::new(StmtKind::Break, keyword.line))
            }
            TokenType::Continue => {
                let keyword = self.advance();
                self.expect(TokenType::Semicolon, "after 'continue'")?;
                Ok(Stmt::new(StmtKind::Continue, keyword.line))
            }
            TokenType::LBrace => {
                let line = self.current().line;
                let body = self.parse_block()?;
                Ok(Stmt::new(StmtKind::Block(body), line))
            }
            TokenType::Command => self.parse_command_statement(),
            _ => {
                let expr = self.parse_expression()?;
                let line = expr.line;
                self.expect(TokenType::Semicolon, "after expression")?;
                Ok(Stmt::new(StmtKind::Expression(expr), line))
            }
        };
        self.exit();
        result
    }

    /// `{ statement* }`
    pub(crate) fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.expect(TokenType::LBrace, "to open block")?;
        let mut statements = Vec::new();
        while !self.check(TokenType::RBrace) && !self.check(TokenType::Eof) {
            self.check_iteration_limit()?;
            statements.push(self.parse_declaration()?);
        }
        self.expect(TokenType::RBrace, "to close block")?;
        Ok(statements)
    }

    /// `if expr { ... } [else { ... }]`; `else if` chains nest naturally.
    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        let condition = self.parse_expression()?;
        let then_body = self.parse_block()?;

        let else_body = if self.match_token(TokenType::Else) {
            if self.check(TokenType::If) {
                let nested = self.parse_statement()?;
                Some(vec![nested])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::If { condition, then_body, else_body },
            keyword.line,
        ))
    }

    /// `while expr { ... }`
    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        let condition = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Stmt::new(StmtKind::While { condition, body }, keyword.line))
    }

    /// `for name in range { ... }` or `for (init; cond; incr) { ... }`
    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();

        let clauses = if self.match_token(TokenType::LParen) {
            // C-style header
            let init = if self.match_token(TokenType::Semicolon) {
                None
            } else if self.check(TokenType::Set) {
                Some(Box::new(self.parse_var()?))
            } else {
                let expr = self.parse_expression()?;
                let line = expr.line;
                self.expect(TokenType::Semicolon, "after for-loop initializer")?;
                Some(Box::new(Stmt::new(StmtKind::Expression(expr), line)))
            };

            let condition = if self.check(TokenType::Semicolon) {
                None
            } else {
                Some(self.parse_expression()?)
            };
            self.expect(TokenType::Semicolon, "after for-loop condition")?;

            let increment = if self.check(TokenType::RParen) {
                None
            } else {
                Some(self.parse_expression()?)
            };
            self.expect(TokenType::RParen, "after for-loop clauses")?;

            ForClauses::CStyle { init, condition, increment }
        } else {
            let variable = self.expect_identifier("after 'for'")?.value;
            self.expect(TokenType::In, "after loop variable")?;
            let range = self.parse_expression()?;
            ForClauses::Range { variable, range }
        };

        let body = self.parse_block()?;
        Ok(Stmt::new(StmtKind::For { clauses, body }, keyword.line))
    }

    /// `return [expr];`
    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.advance();
        let value = if self.check(TokenType::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenType::Semicolon, "after return")?;
        Ok(Stmt::new(StmtKind::Return(value), keyword.line))
    }
}

/// Parse a script with collected diagnostics.
pub fn parse(input: &str) -> ParseResult {
    Parser::new().parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===========================================================================
    // LOCATOR WORDS OUTSIDE COMMANDS
    // ===========================================================================

    #[test]
    fn test_locator_words_are_ordinary_names() {
        let result = parse("function greet(name) { return name; } set id = 1; greet(id);");
        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
        match &result.script.statements[0].kind {
            StmtKind::Function { params, .. } => assert_eq!(params, &["name".to_string()]),
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_locator_word_as_assignment_and_loop_variable() {
        let result = parse("set css = \"a\"; css = css + \"b\"; css++;\nfor tag in 1..2 { }");
        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
        assert_eq!(result.script.statements.len(), 4);
    }

    #[test]
    fn test_locator_word_still_reserved_in_command_arguments() {
        let result = parse("click id \"go\";");
        assert!(result.errors.is_empty());
        match &result.script.statements[0].kind {
            StmtKind::Command { locator_type, .. } => assert!(locator_type.is_some()),
            other => panic!("expected command, got {:?}", other),
        }
    }
}
