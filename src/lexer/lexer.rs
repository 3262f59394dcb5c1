//! Lexer for Test Scenario Scripts
//!
//! The lexer tokenizes source text into a stream of tokens the parser
//! consumes. It handles:
//! - Compound operators via one-character lookahead
//! - Line and block comments (line/column tracked through newlines)
//! - Single- and double-quoted strings with escape sequences
//! - Numbers with optional fraction and scientific-notation exponent
//! - Case-normalized keyword, command, and locator lookup
//!
//! The token stream is always terminated with an EOF token.

use lazy_static::lazy_static;
use std::collections::HashMap;

use crate::commands::types::{CommandType, LocatorType};

/// Token types produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Eof,

    // Punctuation
    Semicolon, // ;
    Comma,     // ,
    LBrace,    // {
    RBrace,    // }
    LParen,    // (
    RParen,    // )

    // Operators
    Plus,        // +
    Minus,       // -
    Star,        // *
    Slash,       // /
    Percent,     // %
    Bang,        // !
    Assign,      // =
    PlusAssign,  // +=
    MinusAssign, // -=
    StarAssign,  // *=
    SlashAssign, // /=
    PlusPlus,    // ++
    MinusMinus,  // --
    EqEq,        // ==
    BangEq,      // !=
    Less,        // <
    LessEq,      // <=
    Greater,     // >
    GreaterEq,   // >=
    AndAnd,      // &&
    OrOr,        // ||
    Dot,         // .
    DotDot,      // ..

    // Literals
    Number,
    Str,
    True,
    False,
    Null,

    // Keywords
    If,
    Else,
    For,
    While,
    In,
    As,
    Import,
    Export,
    Set,
    Function,
    Return,
    Break,
    Continue,
    Test,

    // Domain words
    Command, // reserved command name; Token::command holds which one
    Locator, // locator-type keyword; Token::locator holds which one

    Identifier,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eof => "EOF",
            Self::Semicolon => ";",
            Self::Comma => ",",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Bang => "!",
            Self::Assign => "=",
            Self::PlusAssign => "+=",
            Self::MinusAssign => "-=",
            Self::StarAssign => "*=",
            Self::SlashAssign => "/=",
            Self::PlusPlus => "++",
            Self::MinusMinus => "--",
            Self::EqEq => "==",
            Self::BangEq => "!=",
            Self::Less => "<",
            Self::LessEq => "<=",
            Self::Greater => ">",
            Self::GreaterEq => ">=",
            Self::AndAnd => "&&",
            Self::OrOr => "||",
            Self::Dot => ".",
            Self::DotDot => "..",
            Self::Number => "NUMBER",
            Self::Str => "STRING",
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
            Self::If => "if",
            Self::Else => "else",
            Self::For => "for",
            Self::While => "while",
            Self::In => "in",
            Self::As => "as",
            Self::Import => "import",
            Self::Export => "export",
            Self::Set => "set",
            Self::Function => "function",
            Self::Return => "return",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::Test => "test",
            Self::Command => "COMMAND",
            Self::Locator => "LOCATOR",
            Self::Identifier => "IDENTIFIER",
        }
    }
}

/// Literal payload for number and string tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
}

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    /// The source text of the token (canonical name for commands/locators).
    pub value: String,
    pub literal: Option<Literal>,
    /// Which command, when `token_type` is `Command`.
    pub command: Option<CommandType>,
    /// Which locator type, when `token_type` is `Locator`.
    pub locator: Option<LocatorType>,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(token_type: TokenType, value: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            token_type,
            value: value.into(),
            literal: None,
            command: None,
            locator: None,
            line,
            column,
        }
    }
}

/// Error thrown when the lexer encounters invalid input.
#[derive(Debug, Clone)]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for LexerError {}

impl LexerError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

lazy_static! {
    /// Reserved words, keyed lowercase.
    static ref KEYWORDS: HashMap<&'static str, TokenType> = {
        let mut m = HashMap::new();
        m.insert("if", TokenType::If);
        m.insert("else", TokenType::Else);
        m.insert("for", TokenType::For);
        m.insert("while", TokenType::While);
        m.insert("in", TokenType::In);
        m.insert("as", TokenType::As);
        m.insert("import", TokenType::Import);
        m.insert("export", TokenType::Export);
        m.insert("set", TokenType::Set);
        m.insert("function", TokenType::Function);
        m.insert("return", TokenType::Return);
        m.insert("break", TokenType::Break);
        m.insert("continue", TokenType::Continue);
        m.insert("test", TokenType::Test);
        m.insert("true", TokenType::True);
        m.insert("false", TokenType::False);
        m.insert("null", TokenType::Null);
        m
    };
}

/// Lexer state over one source text.
pub struct Lexer {
    input: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire input. Consumes the lexer; not restartable.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexerError> {
        while self.pos < self.input.len() {
            self.scan_token()?;
        }
        self.tokens
            .push(Token::new(TokenType::Eof, "", self.line, self.column));
        Ok(self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), LexerError> {
        let start_line = self.line;
        let start_column = self.column;
        let c = self.advance();

        match c {
            ' ' | '\t' | '\r' | '\n' => {}

            ';' => self.push(TokenType::Semicolon, ";", start_line, start_column),
            ',' => self.push(TokenType::Comma, ",", start_line, start_column),
            '{' => self.push(TokenType::LBrace, "{", start_line, start_column),
            '}' => self.push(TokenType::RBrace, "}", start_line, start_column),
            '(' => self.push(TokenType::LParen, "(", start_line, start_column),
            ')' => self.push(TokenType::RParen, ")", start_line, start_column),
            '%' => self.push(TokenType::Percent, "%", start_line, start_column),

            '+' => {
                if self.match_char('+') {
                    self.push(TokenType::PlusPlus, "++", start_line, start_column);
                } else if self.match_char('=') {
                    self.push(TokenType::PlusAssign, "+=", start_line, start_column);
                } else {
                    self.push(TokenType::Plus, "+", start_line, start_column);
                }
            }
            '-' => {
                if self.match_char('-') {
                    self.push(TokenType::MinusMinus, "--", start_line, start_column);
                } else if self.match_char('=') {
                    self.push(TokenType::MinusAssign, "-=", start_line, start_column);
                } else {
                    self.push(TokenType::Minus, "-", start_line, start_column);
                }
            }
            '*' => {
                if self.match_char('=') {
                    self.push(TokenType::StarAssign, "*=", start_line, start_column);
                } else {
                    self.push(TokenType::Star, "*", start_line, start_column);
                }
            }
            '/' => {
                if self.match_char('/') {
                    // Line comment
                    while self.peek() != '\n' && self.pos < self.input.len() {
                        self.advance();
                    }
                } else if self.match_char('*') {
                    self.block_comment(start_line, start_column)?;
                } else if self.match_char('=') {
                    self.push(TokenType::SlashAssign, "/=", start_line, start_column);
                } else {
                    self.push(TokenType::Slash, "/", start_line, start_column);
                }
            }
            '!' => {
                if self.match_char('=') {
                    self.push(TokenType::BangEq, "!=", start_line, start_column);
                } else {
                    self.push(TokenType::Bang, "!", start_line, start_column);
                }
            }
            '=' => {
                if self.match_char('=') {
                    self.push(TokenType::EqEq, "==", start_line, start_column);
                } else {
                    self.push(TokenType::Assign, "=", start_line, start_column);
                }
            }
            '<' => {
                if self.match_char('=') {
                    self.push(TokenType::LessEq, "<=", start_line, start_column);
                } else {
                    self.push(TokenType::Less, "<", start_line, start_column);
                }
            }
            '>' => {
                if self.match_char('=') {
                    self.push(TokenType::GreaterEq, ">=", start_line, start_column);
                } else {
                    self.push(TokenType::Greater, ">", start_line, start_column);
                }
            }
            '&' => {
                if self.match_char('&') {
                    self.push(TokenType::AndAnd, "&&", start_line, start_column);
                } else {
                    return Err(LexerError::new("unexpected character '&'", start_line, start_column));
                }
            }
            '|' => {
                if self.match_char('|') {
                    self.push(TokenType::OrOr, "||", start_line, start_column);
                } else {
                    return Err(LexerError::new("unexpected character '|'", start_line, start_column));
                }
            }
            '.' => {
                if self.match_char('.') {
                    self.push(TokenType::DotDot, "..", start_line, start_column);
                } else {
                    self.push(TokenType::Dot, ".", start_line, start_column);
                }
            }

            '"' | '\'' => self.string(c, start_line, start_column)?,

            '0'..='9' => self.number(start_line, start_column)?,

            c if c.is_ascii_alphabetic() || c == '_' => {
                self.identifier(c, start_line, start_column)
            }

            other => {
                return Err(LexerError::new(
                    format!("unexpected character '{}'", other),
                    start_line,
                    start_column,
                ));
            }
        }
        Ok(())
    }

    /// Skip a `/* ... */` comment, tracking line/column through newlines.
    fn block_comment(&mut self, start_line: usize, start_column: usize) -> Result<(), LexerError> {
        while self.pos < self.input.len() {
            if self.peek() == '*' && self.peek_next() == '/' {
                self.advance();
                self.advance();
                return Ok(());
            }
            self.advance();
        }
        Err(LexerError::new("unterminated block comment", start_line, start_column))
    }

    /// Scan a string literal opened with `quote`, decoding escape sequences.
    fn string(&mut self, quote: char, start_line: usize, start_column: usize) -> Result<(), LexerError> {
        let mut value = String::new();

        loop {
            if self.pos >= self.input.len() {
                return Err(LexerError::new("unterminated string", start_line, start_column));
            }
            let c = self.advance();
            if c == quote {
                break;
            }
            if c == '\\' {
                if self.pos >= self.input.len() {
                    return Err(LexerError::new("unterminated string", start_line, start_column));
                }
                let esc_line = self.line;
                let esc_column = self.column;
                let e = self.advance();
                match e {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    'b' => value.push('\u{0008}'),
                    'f' => value.push('\u{000C}'),
                    '\\' => value.push('\\'),
                    c if c == quote => value.push(quote),
                    other => {
                        return Err(LexerError::new(
                            format!("invalid escape sequence '\\{}'", other),
                            esc_line,
                            esc_column,
                        ));
                    }
                }
            } else {
                value.push(c);
            }
        }

        let mut token = Token::new(TokenType::Str, value.clone(), start_line, start_column);
        token.literal = Some(Literal::Str(value));
        self.tokens.push(token);
        Ok(())
    }

    /// Scan a numeric literal: digits, optional fraction, optional exponent
    /// with optional sign and at least one digit.
    fn number(&mut self, start_line: usize, start_column: usize) -> Result<(), LexerError> {
        let start = self.pos - 1;
        let mut is_float = false;

        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // A '.' only starts a fraction when followed by a digit; `1..3` is a
        // range, not a malformed float.
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_float = true;
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        if self.peek() == 'e' || self.peek() == 'E' {
            is_float = true;
            self.advance();
            if self.peek() == '+' || self.peek() == '-' {
                self.advance();
            }
            if !self.peek().is_ascii_digit() {
                return Err(LexerError::new(
                    "malformed number: exponent has no digits",
                    self.line,
                    self.column,
                ));
            }
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text: String = self.input[start..self.pos].iter().collect();
        let literal = if is_float {
            let parsed = text.parse::<f64>().map_err(|_| {
                LexerError::new(format!("malformed number '{}'", text), start_line, start_column)
            })?;
            Literal::Float(parsed)
        } else {
            match text.parse::<i64>() {
                Ok(i) => Literal::Int(i),
                // Integers beyond i64 degrade to floating point.
                Err(_) => Literal::Float(text.parse::<f64>().map_err(|_| {
                    LexerError::new(format!("malformed number '{}'", text), start_line, start_column)
                })?),
            }
        };

        let mut token = Token::new(TokenType::Number, text, start_line, start_column);
        token.literal = Some(literal);
        self.tokens.push(token);
        Ok(())
    }

    /// Scan an identifier and classify it: keyword, command name, locator
    /// keyword, or generic identifier. Table lookups are case-normalized.
    fn identifier(&mut self, first: char, start_line: usize, start_column: usize) {
        let mut text = String::new();
        text.push(first);
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            text.push(self.advance());
        }

        let lower = text.to_lowercase();
        if let Some(&keyword) = KEYWORDS.get(lower.as_str()) {
            self.push(keyword, text, start_line, start_column);
        } else if let Some(command) = CommandType::lookup(&lower) {
            let mut token = Token::new(TokenType::Command, command.as_str(), start_line, start_column);
            token.command = Some(command);
            self.tokens.push(token);
        } else if let Some(locator) = LocatorType::lookup(&lower) {
            let mut token = Token::new(TokenType::Locator, locator.as_str(), start_line, start_column);
            token.locator = Some(locator);
            self.tokens.push(token);
        } else {
            self.push(TokenType::Identifier, text, start_line, start_column);
        }
    }

    fn push(&mut self, token_type: TokenType, value: impl Into<String>, line: usize, column: usize) {
        self.tokens.push(Token::new(token_type, value, line, column));
    }

    fn advance(&mut self) -> char {
        let c = self.input[self.pos];
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.pos < self.input.len() && self.input[self.pos] == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek(&self) -> char {
        if self.pos < self.input.len() {
            self.input[self.pos]
        } else {
            '\0'
        }
    }

    fn peek_next(&self) -> char {
        if self.pos + 1 < self.input.len() {
            self.input[self.pos + 1]
        } else {
            '\0'
        }
    }
}

/// Tokenize a source string.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexerError> {
    Lexer::new(input).tokenize()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenType> {
        tokenize(input).unwrap().iter().map(|t| t.token_type).collect()
    }

    #[test]
    fn test_stream_ends_with_eof() {
        let tokens = tokenize("").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_type, TokenType::Eof);

        let tokens = tokenize("set x = 1;").unwrap();
        assert_eq!(tokens.last().unwrap().token_type, TokenType::Eof);
    }

    #[test]
    fn test_compound_operators() {
        assert_eq!(
            kinds("+ ++ += - -- -= * *= / /= == != <= >= < > && || = !"),
            vec![
                TokenType::Plus,
                TokenType::PlusPlus,
                TokenType::PlusAssign,
                TokenType::Minus,
                TokenType::MinusMinus,
                TokenType::MinusAssign,
                TokenType::Star,
                TokenType::StarAssign,
                TokenType::Slash,
                TokenType::SlashAssign,
                TokenType::EqEq,
                TokenType::BangEq,
                TokenType::LessEq,
                TokenType::GreaterEq,
                TokenType::Less,
                TokenType::Greater,
                TokenType::AndAnd,
                TokenType::OrOr,
                TokenType::Assign,
                TokenType::Bang,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(kinds("// whole line\nset"), vec![TokenType::Set, TokenType::Eof]);
        assert_eq!(kinds("set /* inline */ x"), vec![TokenType::Set, TokenType::Identifier, TokenType::Eof]);
    }

    #[test]
    fn test_block_comment_tracks_lines() {
        let tokens = tokenize("/* a\n b\n c */ set").unwrap();
        assert_eq!(tokens[0].token_type, TokenType::Set);
        assert_eq!(tokens[0].line, 3);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let err = tokenize("/* never closed").unwrap_err();
        assert!(err.message.contains("unterminated block comment"));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_string_escapes() {
        let tokens = tokenize(r#""a\nb\t\\\"q""#).unwrap();
        assert_eq!(tokens[0].literal, Some(Literal::Str("a\nb\t\\\"q".to_string())));
    }

    #[test]
    fn test_single_quoted_string() {
        let tokens = tokenize(r"'it\'s'").unwrap();
        assert_eq!(tokens[0].literal, Some(Literal::Str("it's".to_string())));
    }

    #[test]
    fn test_unterminated_string_at_end_of_input() {
        let err = tokenize(r#"open "http://example.com"#).unwrap_err();
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn test_invalid_escape() {
        let err = tokenize(r#""bad \q escape""#).unwrap_err();
        assert!(err.message.contains("invalid escape"));
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("42 3.25 1e3 2.5E-2 7e+1").unwrap();
        assert_eq!(tokens[0].literal, Some(Literal::Int(42)));
        assert_eq!(tokens[1].literal, Some(Literal::Float(3.25)));
        assert_eq!(tokens[2].literal, Some(Literal::Float(1000.0)));
        assert_eq!(tokens[3].literal, Some(Literal::Float(0.025)));
        assert_eq!(tokens[4].literal, Some(Literal::Float(70.0)));
    }

    #[test]
    fn test_malformed_exponent() {
        assert!(tokenize("1e").is_err());
        assert!(tokenize("1e+").is_err());
        assert!(tokenize("3.5e-;").is_err());
    }

    #[test]
    fn test_range_is_not_a_float() {
        assert_eq!(
            kinds("1..3"),
            vec![TokenType::Number, TokenType::DotDot, TokenType::Number, TokenType::Eof]
        );
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("set total = null;"),
            vec![
                TokenType::Set,
                TokenType::Identifier,
                TokenType::Assign,
                TokenType::Null,
                TokenType::Semicolon,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn test_command_and_locator_words() {
        let tokens = tokenize("click id \"go\";").unwrap();
        assert_eq!(tokens[0].token_type, TokenType::Command);
        assert_eq!(tokens[0].command, Some(CommandType::Click));
        assert_eq!(tokens[1].token_type, TokenType::Locator);
        assert_eq!(tokens[1].locator, Some(LocatorType::Id));
    }

    #[test]
    fn test_command_lookup_ignores_case() {
        let tokens = tokenize("DoubleClick XPATH \"//a\";").unwrap();
        assert_eq!(tokens[0].command, Some(CommandType::DoubleClick));
        assert_eq!(tokens[0].value, "doubleClick");
        assert_eq!(tokens[1].locator, Some(LocatorType::XPath));
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("set x;\nset y;").unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[3].line, tokens[3].column), (2, 1));
        assert_eq!((tokens[4].line, tokens[4].column), (2, 5));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("set x = 1 @ 2;").unwrap_err();
        assert!(err.message.contains("unexpected character '@'"));
        assert_eq!(err.line, 1);
        assert_eq!(err.column, 11);
    }

    #[test]
    fn test_deterministic() {
        let a = tokenize("test \"T\" { click id \"go\"; }").unwrap();
        let b = tokenize("test \"T\" { click id \"go\"; }").unwrap();
        assert_eq!(a, b);
    }
}
