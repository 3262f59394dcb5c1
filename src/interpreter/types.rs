//! Interpreter State Types
//!
//! Runtime values, the variable environment, control-flow signals, and the
//! mutable state threaded through script execution.

use std::collections::HashMap;
use std::fmt;

use crate::ast::types::Stmt;

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Null,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Bool(_) => "bool",
            Self::Null => "null",
        }
    }

    /// Truthiness: null and numeric zero are falsy; any string is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Str(_) => true,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    /// Numeric value widened to f64, if numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Str(s) => write!(f, "{}", s),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Null => write!(f, "null"),
        }
    }
}

/// Control-flow signal returned by statement execution.
///
/// `Breaking` and `Continuing` are consumed by the innermost enclosing loop;
/// `Returning` unwinds to the enclosing function call (or script top level).
#[derive(Debug, Clone, PartialEq)]
pub enum ControlSignal {
    Normal,
    Returning(Value),
    Breaking,
    Continuing,
}

/// A user-defined function, registered at declaration.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

/// The flat variable environment of one running script.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or redeclare) a variable.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Reassign an existing variable. Returns false if it was never declared.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

/// Bindings published by `export`, snapshotted at the moment of the
/// declaration.
#[derive(Debug, Clone, Default)]
pub struct ExportSet {
    pub values: HashMap<String, Value>,
    pub functions: HashMap<String, FunctionDecl>,
}

/// Hard limits on a single script run.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionLimits {
    pub max_call_depth: usize,
    pub max_loop_iterations: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            max_call_depth: 64,
            max_loop_iterations: 1_000_000,
        }
    }
}

/// Mutable state of one script run.
#[derive(Debug, Clone, Default)]
pub struct InterpreterState {
    pub env: Environment,
    pub functions: HashMap<String, FunctionDecl>,
    /// Imported module handles: alias -> path. Resolution of module contents
    /// happens outside the engine.
    pub modules: HashMap<String, String>,
    pub exports: ExportSet,
    pub call_depth: usize,
}

impl InterpreterState {
    pub fn new() -> Self {
        Self::default()
    }
}
