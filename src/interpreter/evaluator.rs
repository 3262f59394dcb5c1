//! Expression Evaluator
//!
//! Evaluates AST expressions to runtime values. Numeric promotion rules:
//! - int (+,-,*,%) int stays int; any float operand promotes to float
//! - `/` always produces a float; a zero divisor is an error
//! - `+` concatenates when either operand is a string

use crate::ast::types::{
    AssignOp, BinaryOp, Expr, ExprKind, LiteralNode, LogicalOp, PostfixOp, UnaryOp,
};
use crate::interpreter::errors::{EvalError, RuntimeError};
use crate::interpreter::executor::Executor;
use crate::interpreter::types::Value;

impl Executor<'_> {
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(literal_value(literal)),

            ExprKind::Variable(name) => match self.state.env.get(name) {
                Some(value) => Ok(value.clone()),
                None => Err(EvalError::UndefinedVariable {
                    name: name.clone(),
                    line: expr.line,
                }
                .into()),
            },

            ExprKind::Grouping(inner) => self.evaluate(inner),

            ExprKind::Binary { left, op, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                apply_binary(left, *op, right, expr.line).map_err(Into::into)
            }

            ExprKind::Unary { op, operand } => {
                let value = self.evaluate(operand)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                    UnaryOp::Negate => match value {
                        Value::Int(i) => Ok(Value::Int(i.wrapping_neg())),
                        Value::Float(f) => Ok(Value::Float(-f)),
                        other => Err(EvalError::type_mismatch(
                            format!("cannot negate {}", other.type_name()),
                            expr.line,
                        )
                        .into()),
                    },
                }
            }

            ExprKind::Logical { left, op, right } => {
                let left = self.evaluate(left)?.is_truthy();
                match op {
                    LogicalOp::And => {
                        if !left {
                            return Ok(Value::Bool(false));
                        }
                    }
                    LogicalOp::Or => {
                        if left {
                            return Ok(Value::Bool(true));
                        }
                    }
                }
                Ok(Value::Bool(self.evaluate(right)?.is_truthy()))
            }

            ExprKind::Assign { name, op, value } => self.evaluate_assign(name, *op, value, expr.line),

            ExprKind::Postfix { name, op } => self.evaluate_postfix(name, *op, expr.line),

            ExprKind::Call { callee, args } => {
                let mut arg_values = Vec::with_capacity(args.len());
                for arg in args {
                    arg_values.push(self.evaluate(arg)?);
                }
                self.call_function(callee, arg_values, expr.line)
            }

            ExprKind::Range { .. } => Err(EvalError::type_mismatch(
                "a range is only valid as a for-in loop header",
                expr.line,
            )
            .into()),

            ExprKind::Get { .. } => Err(EvalError::type_mismatch(
                "property access is not supported",
                expr.line,
            )
            .into()),
        }
    }

    fn evaluate_assign(
        &mut self,
        name: &str,
        op: AssignOp,
        value: &Expr,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        let rhs = self.evaluate(value)?;

        let new_value = match op {
            AssignOp::Assign => rhs,
            compound => {
                let current = match self.state.env.get(name) {
                    Some(value) => value.clone(),
                    None => {
                        return Err(EvalError::UndefinedVariable {
                            name: name.to_string(),
                            line,
                        }
                        .into());
                    }
                };
                let binary_op = match compound {
                    AssignOp::AddAssign => BinaryOp::Add,
                    AssignOp::SubAssign => BinaryOp::Sub,
                    AssignOp::MulAssign => BinaryOp::Mul,
                    AssignOp::DivAssign => BinaryOp::Div,
                    AssignOp::Assign => unreachable!("plain assignment handled above"),
                };
                apply_binary(current, binary_op, rhs, line)?
            }
        };

        if !self.state.env.assign(name, new_value.clone()) {
            return Err(EvalError::UndefinedVariable {
                name: name.to_string(),
                line,
            }
            .into());
        }
        Ok(new_value)
    }

    fn evaluate_postfix(
        &mut self,
        name: &str,
        op: PostfixOp,
        line: usize,
    ) -> Result<Value, RuntimeError> {
        let current = match self.state.env.get(name) {
            Some(value) => value.clone(),
            None => {
                return Err(EvalError::UndefinedVariable {
                    name: name.to_string(),
                    line,
                }
                .into());
            }
        };

        let delta: i64 = match op {
            PostfixOp::Increment => 1,
            PostfixOp::Decrement => -1,
        };
        let updated = match &current {
            Value::Int(i) => Value::Int(i.wrapping_add(delta)),
            Value::Float(f) => Value::Float(f + delta as f64),
            other => {
                return Err(EvalError::type_mismatch(
                    format!("cannot increment {}", other.type_name()),
                    line,
                )
                .into());
            }
        };
        self.state.env.assign(name, updated);
        // Postfix yields the pre-mutation value.
        Ok(current)
    }
}

fn literal_value(literal: &LiteralNode) -> Value {
    match literal {
        LiteralNode::Int(i) => Value::Int(*i),
        LiteralNode::Float(f) => Value::Float(*f),
        LiteralNode::Str(s) => Value::Str(s.clone()),
        LiteralNode::Bool(b) => Value::Bool(*b),
        LiteralNode::Null => Value::Null,
    }
}

/// Apply a binary operator to two values.
pub(crate) fn apply_binary(
    left: Value,
    op: BinaryOp,
    right: Value,
    line: usize,
) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Add => {
            // String concatenation wins when either side is a string.
            if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) {
                return Ok(Value::Str(format!("{}{}", left, right)));
            }
            numeric_op(left, right, op, line, i64::wrapping_add, |a, b| a + b)
        }
        BinaryOp::Sub => numeric_op(left, right, op, line, i64::wrapping_sub, |a, b| a - b),
        BinaryOp::Mul => numeric_op(left, right, op, line, i64::wrapping_mul, |a, b| a * b),

        BinaryOp::Div => {
            let (a, b) = numeric_pair(&left, &right, op, line)?;
            if b == 0.0 {
                return Err(EvalError::DivisionByZero { line });
            }
            // Division always produces a float.
            Ok(Value::Float(a / b))
        }

        BinaryOp::Mod => {
            if let (Value::Int(a), Value::Int(b)) = (&left, &right) {
                if *b == 0 {
                    return Err(EvalError::DivisionByZero { line });
                }
                return Ok(Value::Int(a.wrapping_rem(*b)));
            }
            let (a, b) = numeric_pair(&left, &right, op, line)?;
            if b == 0.0 {
                return Err(EvalError::DivisionByZero { line });
            }
            Ok(Value::Float(a % b))
        }

        BinaryOp::Eq => Ok(Value::Bool(values_equal(&left, &right))),
        BinaryOp::NotEq => Ok(Value::Bool(!values_equal(&left, &right))),

        BinaryOp::Less | BinaryOp::LessEq | BinaryOp::Greater | BinaryOp::GreaterEq => {
            let (a, b) = numeric_pair(&left, &right, op, line)?;
            let result = match op {
                BinaryOp::Less => a < b,
                BinaryOp::LessEq => a <= b,
                BinaryOp::Greater => a > b,
                _ => a >= b,
            };
            Ok(Value::Bool(result))
        }
    }
}

fn numeric_op(
    left: Value,
    right: Value,
    op: BinaryOp,
    line: usize,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(*a, *b))),
        _ => {
            let (a, b) = numeric_pair(&left, &right, op, line)?;
            Ok(Value::Float(float_op(a, b)))
        }
    }
}

fn numeric_pair(
    left: &Value,
    right: &Value,
    op: BinaryOp,
    line: usize,
) -> Result<(f64, f64), EvalError> {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(EvalError::type_mismatch(
            format!(
                "'{}' needs numeric operands, got {} and {}",
                op.as_str(),
                left.type_name(),
                right.type_name()
            ),
            line,
        )),
    }
}

/// Equality across value kinds: ints and floats compare numerically, null
/// equals only null, mismatched kinds are unequal.
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===========================================================================
    // BINARY OPERATOR SEMANTICS
    // ===========================================================================

    #[test]
    fn test_int_arithmetic_stays_int() {
        assert_eq!(
            apply_binary(Value::Int(1), BinaryOp::Add, Value::Int(1), 1),
            Ok(Value::Int(2))
        );
        assert_eq!(
            apply_binary(Value::Int(3), BinaryOp::Mul, Value::Int(4), 1),
            Ok(Value::Int(12))
        );
    }

    #[test]
    fn test_float_operand_promotes() {
        assert_eq!(
            apply_binary(Value::Int(1), BinaryOp::Add, Value::Float(0.5), 1),
            Ok(Value::Float(1.5))
        );
    }

    #[test]
    fn test_division_is_always_float() {
        assert_eq!(
            apply_binary(Value::Int(1), BinaryOp::Div, Value::Int(2), 1),
            Ok(Value::Float(0.5))
        );
        assert_eq!(
            apply_binary(Value::Int(4), BinaryOp::Div, Value::Int(2), 1),
            Ok(Value::Float(2.0))
        );
    }

    #[test]
    fn test_division_by_zero() {
        let err = apply_binary(Value::Int(5), BinaryOp::Div, Value::Int(0), 9).unwrap_err();
        assert!(matches!(err, EvalError::DivisionByZero { line: 9 }));
        let err = apply_binary(Value::Float(1.0), BinaryOp::Div, Value::Float(0.0), 2).unwrap_err();
        assert!(matches!(err, EvalError::DivisionByZero { .. }));
    }

    #[test]
    fn test_string_concat_on_either_side() {
        assert_eq!(
            apply_binary(Value::Str("n=".into()), BinaryOp::Add, Value::Int(3), 1),
            Ok(Value::Str("n=3".into()))
        );
        assert_eq!(
            apply_binary(Value::Int(3), BinaryOp::Add, Value::Str("!".into()), 1),
            Ok(Value::Str("3!".into()))
        );
    }

    #[test]
    fn test_string_minus_is_an_error() {
        let err = apply_binary(Value::Str("a".into()), BinaryOp::Sub, Value::Int(1), 4).unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { .. }));
    }

    #[test]
    fn test_equality_rules() {
        assert_eq!(
            apply_binary(Value::Int(1), BinaryOp::Eq, Value::Float(1.0), 1),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            apply_binary(Value::Null, BinaryOp::Eq, Value::Null, 1),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            apply_binary(Value::Null, BinaryOp::Eq, Value::Int(0), 1),
            Ok(Value::Bool(false))
        );
        assert_eq!(
            apply_binary(Value::Str("1".into()), BinaryOp::Eq, Value::Int(1), 1),
            Ok(Value::Bool(false))
        );
    }

    #[test]
    fn test_comparison_needs_numbers() {
        assert_eq!(
            apply_binary(Value::Int(1), BinaryOp::Less, Value::Float(1.5), 1),
            Ok(Value::Bool(true))
        );
        let err =
            apply_binary(Value::Str("a".into()), BinaryOp::Less, Value::Str("b".into()), 1)
                .unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { .. }));
    }

    #[test]
    fn test_modulo() {
        assert_eq!(
            apply_binary(Value::Int(7), BinaryOp::Mod, Value::Int(3), 1),
            Ok(Value::Int(1))
        );
        let err = apply_binary(Value::Int(7), BinaryOp::Mod, Value::Int(0), 1).unwrap_err();
        assert!(matches!(err, EvalError::DivisionByZero { .. }));
    }
}
