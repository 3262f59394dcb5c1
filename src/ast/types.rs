//! AST Node Types
//!
//! The parsed, structured representation of a script. Nodes are created
//! once per parse and are immutable afterwards; every node carries the
//! source line it started on.

use crate::commands::types::{CommandType, LocatorType};

/// A literal value as written in source.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralNode {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Less => "<",
            Self::LessEq => "<=",
            Self::Greater => ">",
            Self::GreaterEq => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Assignment operators: plain `=` and the compound forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixOp {
    Increment,
    Decrement,
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: usize,
}

impl Expr {
    pub fn new(kind: ExprKind, line: usize) -> Self {
        Self { kind, line }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(LiteralNode),
    Variable(String),
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Short-circuit `&&` / `||`.
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
    Assign {
        name: String,
        op: AssignOp,
        value: Box<Expr>,
    },
    /// Postfix `++`/`--` on a named variable; yields the pre-mutation value.
    Postfix {
        name: String,
        op: PostfixOp,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    /// Inclusive range `start..end`.
    Range {
        start: Box<Expr>,
        end: Box<Expr>,
    },
    Grouping(Box<Expr>),
    /// Property access `object.member`. Parsed but not evaluated;
    /// placeholder for future object support.
    Get {
        object: Box<Expr>,
        member: String,
    },
}

/// A statement node.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
}

impl Stmt {
    pub fn new(kind: StmtKind, line: usize) -> Self {
        Self { kind, line }
    }
}

/// The loop header of a `for` statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ForClauses {
    /// `for name in start..end { ... }`
    Range { variable: String, range: Expr },
    /// `for (init; condition; increment) { ... }`
    CStyle {
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        increment: Option<Expr>,
    },
}

/// The target of an `export` declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportTarget {
    Name(String),
    All,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `set name [= initializer];`
    Var {
        name: String,
        initializer: Option<Expr>,
    },
    Function {
        name: String,
        params: Vec<String>,
        body: Vec<Stmt>,
    },
    If {
        condition: Expr,
        then_body: Vec<Stmt>,
        else_body: Option<Vec<Stmt>>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    For {
        clauses: ForClauses,
        body: Vec<Stmt>,
    },
    Import {
        path: String,
        alias: Option<String>,
    },
    Export(ExportTarget),
    /// A browser command statement.
    Command {
        command: CommandType,
        locator_type: Option<LocatorType>,
        args: Vec<Expr>,
        named_args: Vec<(String, Expr)>,
    },
    Block(Vec<Stmt>),
    Expression(Expr),
    Return(Option<Expr>),
    Break,
    Continue,
    /// A named root scenario.
    Test {
        name: String,
        body: Vec<Stmt>,
    },
}

/// Root node: the ordered top-level statements of one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptNode {
    pub statements: Vec<Stmt>,
}

impl ScriptNode {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }

    pub fn empty() -> Self {
        Self { statements: Vec::new() }
    }

    /// Names of the `test` blocks declared at the top level, in source order.
    pub fn test_names(&self) -> Vec<String> {
        self.statements
            .iter()
            .filter_map(|s| match &s.kind {
                StmtKind::Test { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}
