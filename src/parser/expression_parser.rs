//! Expression Parser
//!
//! Precedence climbing for the expression grammar, lowest to highest:
//! assignment → range → logical-or → logical-and → equality → comparison →
//! term → factor → unary → postfix/call/member → primary.

use crate::ast::types::{
    AssignOp, BinaryOp, Expr, ExprKind, LiteralNode, LogicalOp, PostfixOp, UnaryOp,
};
use crate::lexer::lexer::{Literal, TokenType};
use crate::parser::parser::Parser;
use crate::parser::types::ParseError;

impl Parser {
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.enter()?;
        let result = self.parse_assignment();
        self.exit();
        result
    }

    /// Assignment is right-associative and requires a plain variable target.
    fn parse_assignment(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_range()?;

        let op = match self.current().token_type {
            TokenType::Assign => Some(AssignOp::Assign),
            TokenType::PlusAssign => Some(AssignOp::AddAssign),
            TokenType::MinusAssign => Some(AssignOp::SubAssign),
            TokenType::StarAssign => Some(AssignOp::MulAssign),
            TokenType::SlashAssign => Some(AssignOp::DivAssign),
            _ => None,
        };

        if let Some(op) = op {
            let op_token = self.advance();
            let value = self.parse_assignment()?;
            return match expr.kind {
                ExprKind::Variable(name) => Ok(Expr::new(
                    ExprKind::Assign {
                        name,
                        op,
                        value: Box::new(value),
                    },
                    expr.line,
                )),
                _ => Err(ParseError::with_token("invalid assignment target", op_token)),
            };
        }

        Ok(expr)
    }

    /// `start..end` (inclusive), consumed by range-based `for`.
    fn parse_range(&mut self) -> Result<Expr, ParseError> {
        let start = self.parse_or()?;
        if self.match_token(TokenType::DotDot) {
            let end = self.parse_or()?;
            let line = start.line;
            return Ok(Expr::new(
                ExprKind::Range {
                    start: Box::new(start),
                    end: Box::new(end),
                },
                line,
            ));
        }
        Ok(start)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_and()?;
        while self.match_token(TokenType::OrOr) {
            self.check_iteration_limit()?;
            let right = self.parse_and()?;
            let line = expr.line;
            expr = Expr::new(
                ExprKind::Logical {
                    left: Box::new(expr),
                    op: LogicalOp::Or,
                    right: Box::new(right),
                },
                line,
            );
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_equality()?;
        while self.match_token(TokenType::AndAnd) {
            self.check_iteration_limit()?;
            let right = self.parse_equality()?;
            let line = expr.line;
            expr = Expr::new(
                ExprKind::Logical {
                    left: Box::new(expr),
                    op: LogicalOp::And,
                    right: Box::new(right),
                },
                line,
            );
        }
        Ok(expr)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_comparison()?;
        loop {
            let op = match self.current().token_type {
                TokenType::EqEq => BinaryOp::Eq,
                TokenType::BangEq => BinaryOp::NotEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            let line = expr.line;
            expr = Expr::new(
                ExprKind::Binary {
                    left: Box::new(expr),
                    op,
                    right: Box::new(right),
                },
                line,
            );
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_term()?;
        loop {
            let op = match self.current().token_type {
                TokenType::Less => BinaryOp::Less,
                TokenType::LessEq => BinaryOp::LessEq,
                TokenType::Greater => BinaryOp::Greater,
                TokenType::GreaterEq => BinaryOp::GreaterEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_term()?;
            let line = expr.line;
            expr = Expr::new(
                ExprKind::Binary {
                    left: Box::new(expr),
                    op,
                    right: Box::new(right),
                },
                line,
            );
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_factor()?;
        loop {
            let op = match self.current().token_type {
                TokenType::Plus => BinaryOp::Add,
                TokenType::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_factor()?;
            let line = expr.line;
            expr = Expr::new(
                ExprKind::Binary {
                    left: Box::new(expr),
                    op,
                    right: Box::new(right),
                },
                line,
            );
        }
        Ok(expr)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.current().token_type {
                TokenType::Star => BinaryOp::Mul,
                TokenType::Slash => BinaryOp::Div,
                TokenType::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            let line = expr.line;
            expr = Expr::new(
                ExprKind::Binary {
                    left: Box::new(expr),
                    op,
                    right: Box::new(right),
                },
                line,
            );
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.current().token_type {
            TokenType::Bang => Some(UnaryOp::Not),
            TokenType::Minus => Some(UnaryOp::Negate),
            _ => None,
        };
        if let Some(op) = op {
            let token = self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                token.line,
            ));
        }
        self.parse_postfix()
    }

    /// Calls, member access, and postfix `++`/`--`.
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            self.check_iteration_limit()?;
            match self.current().token_type {
                TokenType::LParen => {
                    let callee = match &expr.kind {
                        ExprKind::Variable(name) => name.clone(),
                        _ => return Err(self.error_here("only named functions can be called")),
                    };
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(TokenType::RParen) {
                        loop {
                            args.push(self.parse_expression()?);
                            if !self.match_token(TokenType::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenType::RParen, "after arguments")?;
                    let line = expr.line;
                    expr = Expr::new(ExprKind::Call { callee, args }, line);
                }
                TokenType::Dot => {
                    self.advance();
                    let member = self.expect_identifier("after '.'")?.value;
                    let line = expr.line;
                    expr = Expr::new(
                        ExprKind::Get {
                            object: Box::new(expr),
                            member,
                        },
                        line,
                    );
                }
                TokenType::PlusPlus | TokenType::MinusMinus => {
                    let op = if self.check(TokenType::PlusPlus) {
                        PostfixOp::Increment
                    } else {
                        PostfixOp::Decrement
                    };
                    let token = self.advance();
                    let name = match expr.kind {
                        ExprKind::Variable(name) => name,
                        _ => {
                            return Err(ParseError::with_token(
                                format!("'{}' requires a variable operand", token.value),
                                token,
                            ));
                        }
                    };
                    expr = Expr::new(ExprKind::Postfix { name, op }, expr.line);
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.current().clone();
        match token.token_type {
            TokenType::Number => {
                self.advance();
                let literal = match token.literal {
                    Some(Literal::Int(i)) => LiteralNode::Int(i),
                    Some(Literal::Float(f)) => LiteralNode::Float(f),
                    _ => return Err(ParseError::with_token("number token without value", token)),
                };
                Ok(Expr::new(ExprKind::Literal(literal), token.line))
            }
            TokenType::Str => {
                self.advance();
                let value = match token.literal {
                    Some(Literal::Str(s)) => s,
                    _ => token.value.clone(),
                };
                Ok(Expr::new(ExprKind::Literal(LiteralNode::Str(value)), token.line))
            }
            TokenType::True => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(LiteralNode::Bool(true)), token.line))
            }
            TokenType::False => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(LiteralNode::Bool(false)), token.line))
            }
            TokenType::Null => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(LiteralNode::Null), token.line))
            }
            // Locator keywords are plain variable names outside a command's
            // argument list.
            TokenType::Identifier | TokenType::Locator => {
                self.advance();
                Ok(Expr::new(ExprKind::Variable(token.value.clone()), token.line))
            }
            TokenType::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenType::RParen, "after expression")?;
                Ok(Expr::new(ExprKind::Grouping(Box::new(inner)), token.line))
            }
            _ => Err(self.error_here("expected expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::{Stmt, StmtKind};

    fn parse_expr(source: &str) -> Expr {
        let result = crate::parser::parse(&format!("{};", source));
        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
        match result.script.statements.into_iter().next() {
            Some(Stmt { kind: StmtKind::Expression(expr), .. }) => expr,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_mul_over_add() {
        let expr = parse_expr("1 + 2 * 3");
        match expr.kind {
            ExprKind::Binary { op: BinaryOp::Add, right, .. } => match right.kind {
                ExprKind::Binary { op: BinaryOp::Mul, .. } => {}
                other => panic!("expected Mul on the right, got {:?}", other),
            },
            other => panic!("expected Add at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_comparison_over_equality() {
        let expr = parse_expr("1 < 2 == true");
        match expr.kind {
            ExprKind::Binary { op: BinaryOp::Eq, left, .. } => match left.kind {
                ExprKind::Binary { op: BinaryOp::Less, .. } => {}
                other => panic!("expected Less under Eq, got {:?}", other),
            },
            other => panic!("expected Eq at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_logical_layering() {
        let expr = parse_expr("a == 1 && b == 2 || c == 3");
        match expr.kind {
            ExprKind::Logical { op: LogicalOp::Or, left, .. } => match left.kind {
                ExprKind::Logical { op: LogicalOp::And, .. } => {}
                other => panic!("expected And under Or, got {:?}", other),
            },
            other => panic!("expected Or at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_right_associative() {
        let expr = parse_expr("a = b = 1");
        match expr.kind {
            ExprKind::Assign { name, value, .. } => {
                assert_eq!(name, "a");
                assert!(matches!(value.kind, ExprKind::Assign { .. }));
            }
            other => panic!("expected Assign, got {:?}", other),
        }
    }

    #[test]
    fn test_compound_assignment() {
        let expr = parse_expr("total += 2");
        assert!(matches!(
            expr.kind,
            ExprKind::Assign { op: AssignOp::AddAssign, .. }
        ));
    }

    #[test]
    fn test_invalid_assignment_target() {
        let result = crate::parser::parse("1 + 2 = 3;");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("invalid assignment target"));
    }

    #[test]
    fn test_postfix_increment() {
        let expr = parse_expr("i++");
        assert!(matches!(
            expr.kind,
            ExprKind::Postfix { op: PostfixOp::Increment, .. }
        ));
    }

    #[test]
    fn test_postfix_requires_variable() {
        let result = crate::parser::parse("5++;");
        assert!(!result.errors.is_empty());
        assert!(result.errors[0].message.contains("requires a variable operand"));
    }

    #[test]
    fn test_call_with_args() {
        let expr = parse_expr("sum(1, 2 + 3)");
        match expr.kind {
            ExprKind::Call { callee, args } => {
                assert_eq!(callee, "sum");
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected Call, got {:?}", other),
        }
    }

    #[test]
    fn test_member_access_is_parsed() {
        let expr = parse_expr("page.title");
        match expr.kind {
            ExprKind::Get { member, .. } => assert_eq!(member, "title"),
            other => panic!("expected Get, got {:?}", other),
        }
    }

    #[test]
    fn test_range() {
        let expr = parse_expr("1..5");
        assert!(matches!(expr.kind, ExprKind::Range { .. }));
    }

    #[test]
    fn test_grouping() {
        let expr = parse_expr("(1 + 2) * 3");
        match expr.kind {
            ExprKind::Binary { op: BinaryOp::Mul, left, .. } => {
                assert!(matches!(left.kind, ExprKind::Grouping(_)));
            }
            other => panic!("expected Mul at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_nesting() {
        let expr = parse_expr("!!ok");
        match expr.kind {
            ExprKind::Unary { op: UnaryOp::Not, operand } => {
                assert!(matches!(operand.kind, ExprKind::Unary { op: UnaryOp::Not, .. }));
            }
            other => panic!("expected Not, got {:?}", other),
        }
    }

    #[test]
    fn test_expected_expression_at_end() {
        let result = crate::parser::parse("set x = ;");
        assert!(!result.errors.is_empty());
        assert!(result.errors[0].message.contains("expected expression"));
    }
}
