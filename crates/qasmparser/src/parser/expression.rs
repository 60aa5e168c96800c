//! Expression parsing for QASM3.

use super::tree::ExprNode;
use super::{Parser, SyntaxResult};
use crate::ast::{BinaryOp, UnaryOp};
use crate::error::ParseError;
use crate::lexer::Token;

impl Parser<'_, '_, '_> {
    /// Parse an expression.
    pub(super) fn parse_expression(&mut self) -> SyntaxResult<ExprNode> {
        self.parse_binary_expr(0)
    }

    /// Parse binary expression with precedence climbing.
    ///
    /// Every operator folded into `left` nests it one level deeper.
    fn parse_binary_expr(&mut self, min_prec: u8) -> SyntaxResult<ExprNode> {
        let start = self.pos;
        self.descend()?;
        let mut levels = 1;
        let mut left = self.parse_unary_expr()?;

        while let Some(op) = self.peek_binary_op() {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.descend()?;
            levels += 1;
            self.advance(); // consume operator

            let next_min = if op.is_right_assoc() { prec } else { prec + 1 };
            let right = self.parse_binary_expr(next_min)?;
            left = ExprNode::Binary {
                op,
                lhs: Box::new(left),
                rhs: Box::new(right),
                range: self.range_from(start),
            };
        }

        self.ascend(levels);
        Ok(left)
    }

    /// Parse unary expression. The operand extends over any `**` chain.
    fn parse_unary_expr(&mut self) -> SyntaxResult<ExprNode> {
        let op = match self.peek() {
            Token::Minus => UnaryOp::Neg,
            Token::Not => UnaryOp::Not,
            Token::Tilde => UnaryOp::BitNot,
            _ => return self.parse_postfix(),
        };
        let start = self.advance();
        let operand = self.parse_binary_expr(UnaryOp::PRECEDENCE)?;
        Ok(ExprNode::Unary {
            op,
            operand: Box::new(operand),
            range: self.range_from(start),
        })
    }

    /// Parse a primary expression followed by any number of `[index]` suffixes.
    pub(super) fn parse_postfix(&mut self) -> SyntaxResult<ExprNode> {
        let start = self.pos;
        let mut levels = 0;
        let mut expr = self.parse_primary_expr()?;

        while self.check(&Token::LBracket) {
            self.descend()?;
            levels += 1;
            self.advance();
            let index = self.parse_index()?;
            self.expect(&Token::RBracket)?;
            expr = ExprNode::Index {
                base: Box::new(expr),
                index: Box::new(index),
                range: self.range_from(start),
            };
        }

        self.ascend(levels);
        Ok(expr)
    }

    /// Parse primary expression.
    fn parse_primary_expr(&mut self) -> SyntaxResult<ExprNode> {
        match self.peek() {
            Token::IntLiteral(_)
            | Token::FloatLiteral(_)
            | Token::True
            | Token::False
            | Token::Pi
            | Token::Tau
            | Token::Euler
            | Token::HardwareQubit(_) => Ok(ExprNode::Atom(self.advance())),
            Token::Identifier => {
                let name = self.advance();
                // Check for function call
                if self.consume(&Token::LParen) {
                    let args = self.parse_expression_list(&Token::RParen)?;
                    self.expect(&Token::RParen)?;
                    Ok(ExprNode::Call {
                        name,
                        args,
                        range: self.range_from(name),
                    })
                } else {
                    Ok(ExprNode::Atom(name))
                }
            }
            Token::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&Token::RParen)?;
                Ok(ExprNode::Group(Box::new(inner)))
            }
            Token::Measure => {
                let start = self.advance();
                let operand = self.parse_operand()?;
                Ok(ExprNode::Measure {
                    operand: Box::new(operand),
                    range: self.range_from(start),
                })
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Parse the contents of `[...]`: an expression or a range
    /// `start:end` / `start:step:end` with optional bounds.
    fn parse_index(&mut self) -> SyntaxResult<ExprNode> {
        let start = self.pos;
        let first = if self.check(&Token::Colon) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        if !self.check(&Token::Colon) {
            if let Some(expr) = first {
                return Ok(expr);
            }
        }

        let mut bounds = vec![first];
        while self.check(&Token::Colon) {
            if bounds.len() == 3 {
                return Err(ParseError::syntax(
                    "range takes at most three components",
                    self.current().span,
                ));
            }
            self.advance();
            let bound = if matches!(self.peek(), Token::Colon | Token::RBracket | Token::Comma) {
                None
            } else {
                Some(self.parse_expression()?)
            };
            bounds.push(bound);
        }

        let has_step = bounds.len() == 3;
        let mut parts = bounds.into_iter().map(|b| b.map(Box::new));
        let a = parts.next().flatten();
        let b = parts.next().flatten();
        let c = parts.next().flatten();
        let (start_bound, step, end) = if has_step { (a, b, c) } else { (a, None, b) };

        Ok(ExprNode::Range {
            start: start_bound,
            step,
            end,
            range: self.range_from(start),
        })
    }

    /// Peek at binary operator.
    fn peek_binary_op(&self) -> Option<BinaryOp> {
        match self.peek() {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            Token::Percent => Some(BinaryOp::Mod),
            Token::Power => Some(BinaryOp::Pow),
            Token::EqEq => Some(BinaryOp::Eq),
            Token::NotEq => Some(BinaryOp::NotEq),
            Token::Lt => Some(BinaryOp::Lt),
            Token::LtEq => Some(BinaryOp::LtEq),
            Token::Gt => Some(BinaryOp::Gt),
            Token::GtEq => Some(BinaryOp::GtEq),
            Token::And => Some(BinaryOp::And),
            Token::Or => Some(BinaryOp::Or),
            Token::Ampersand => Some(BinaryOp::BitAnd),
            Token::Pipe => Some(BinaryOp::BitOr),
            Token::Caret => Some(BinaryOp::BitXor),
            Token::LShift => Some(BinaryOp::LShift),
            Token::RShift => Some(BinaryOp::RShift),
            _ => None,
        }
    }

    /// Parse expression list up to (not including) `close`.
    pub(super) fn parse_expression_list(&mut self, close: &Token) -> SyntaxResult<Vec<ExprNode>> {
        if self.check(close) {
            return Ok(vec![]);
        }
        let mut exprs = vec![self.parse_expression()?];
        while self.consume(&Token::Comma) {
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{BinaryOp, Expression, Statement, UnaryOp};
    use crate::frontend::QasmParser;

    /// Parse `x = <expr>;` and return the right-hand side.
    fn expr(source: &str) -> Expression {
        let program = QasmParser::new()
            .parse_str(&format!("x = {source};"))
            .unwrap();
        match program.statements.into_iter().next() {
            Some(Statement::Assignment(a)) => a.value,
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    fn binary(e: &Expression) -> (BinaryOp, &Expression, &Expression) {
        match e {
            Expression::Binary(b) => (b.op, &b.lhs, &b.rhs),
            other => panic!("expected binary expression, got {other:?}"),
        }
    }

    #[test]
    fn test_precedence() {
        let e = expr("1 + 2 * 3");
        let (op, lhs, rhs) = binary(&e);
        assert_eq!(op, BinaryOp::Add);
        assert_eq!(lhs.as_int(), Some(1));
        assert_eq!(binary(rhs).0, BinaryOp::Mul);
    }

    #[test]
    fn test_left_associative() {
        let e = expr("8 - 4 - 2");
        let (op, lhs, rhs) = binary(&e);
        assert_eq!(op, BinaryOp::Sub);
        assert_eq!(binary(lhs).0, BinaryOp::Sub);
        assert_eq!(rhs.as_int(), Some(2));
    }

    #[test]
    fn test_power_is_right_associative() {
        let e = expr("2 ** 3 ** 2");
        let (op, lhs, rhs) = binary(&e);
        assert_eq!(op, BinaryOp::Pow);
        assert_eq!(lhs.as_int(), Some(2));
        assert_eq!(binary(rhs).0, BinaryOp::Pow);
        assert_eq!(e.as_f64(), Some(512.0));
    }

    #[test]
    fn test_unary_minus_covers_power() {
        let e = expr("-2 ** 2");
        let Expression::Unary(u) = &e else {
            panic!("expected unary, got {e:?}");
        };
        assert_eq!(u.op, UnaryOp::Neg);
        assert_eq!(binary(&u.operand).0, BinaryOp::Pow);
        assert_eq!(e.as_f64(), Some(-4.0));
    }

    #[test]
    fn test_unary_binds_tighter_than_product() {
        let e = expr("-a * b");
        let (op, lhs, _) = binary(&e);
        assert_eq!(op, BinaryOp::Mul);
        assert!(matches!(lhs, Expression::Unary(_)));
    }

    #[test]
    fn test_grouping_span_includes_parens() {
        let e = expr("(1 + 2) * 3");
        let (op, lhs, _) = binary(&e);
        assert_eq!(op, BinaryOp::Mul);
        assert_eq!(binary(lhs).0, BinaryOp::Add);
        assert_eq!(e.span().start.column, 5);
        assert_eq!(lhs.span().start.column, 6);
    }

    #[test]
    fn test_call_and_constants() {
        let e = expr("sin(pi / 4) + euler");
        let (_, lhs, rhs) = binary(&e);
        let Expression::Call(call) = lhs else {
            panic!("expected call, got {lhs:?}");
        };
        assert_eq!(call.name, "sin");
        assert_eq!(call.args.len(), 1);
        assert!(matches!(rhs, Expression::Constant(_)));
    }

    #[test]
    fn test_ranges() {
        let e = expr("q[0:1:4]");
        let Expression::Index(ix) = &e else {
            panic!("expected index, got {e:?}");
        };
        let Expression::Range(r) = ix.index.as_ref() else {
            panic!("expected range");
        };
        assert_eq!(r.start.as_ref().and_then(|s| s.as_int()), Some(0));
        assert_eq!(r.step.as_ref().and_then(|s| s.as_int()), Some(1));
        assert_eq!(r.end.as_ref().and_then(|s| s.as_int()), Some(4));

        let e = expr("q[:2]");
        let Expression::Index(ix) = &e else {
            panic!("expected index");
        };
        let Expression::Range(r) = ix.index.as_ref() else {
            panic!("expected range");
        };
        assert!(r.start.is_none());
        assert!(r.step.is_none());
        assert_eq!(r.end.as_ref().and_then(|s| s.as_int()), Some(2));
    }

    #[test]
    fn test_measure_rvalue() {
        let program = QasmParser::new().parse_str("bit c = measure $0;").unwrap();
        let Statement::ClassicalDeclaration(decl) = &program.statements[0] else {
            panic!("expected classical declaration");
        };
        let Some(Expression::Measure(m)) = &decl.initializer else {
            panic!("expected measure initializer");
        };
        assert!(matches!(m.operand.as_ref(), Expression::HardwareQubit(q) if q.index == 0));
    }

    #[test]
    fn test_too_many_range_parts() {
        let result = QasmParser::new().parse_with_diagnostics("h q[0:1:2:3];\n");
        assert_eq!(result.diagnostics().len(), 1);
    }
}
