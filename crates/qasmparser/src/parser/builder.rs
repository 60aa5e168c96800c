//! Syntax-tree-to-AST building for QASM3.

use tracing::trace;

use super::tree::{ExprNode, ModifierNode, StmtNode, SyntaxTree, TokenRange};
use crate::ast::{
    Assignment, Barrier, BinaryExpression, BoolLiteral, CallExpression, ClassicalDeclaration,
    Comment, CommentKind, Constant, ConstantKind, Expression, FloatLiteral, GateCall,
    GateDefinition, GateModifier, HardwareQubit, Identifier, Include, IndexExpression, IntLiteral,
    MeasureExpression, Measurement, OpaqueStatement, Program, QuantumDeclaration, RangeExpression,
    Reset, Statement, UnaryExpression, Unrecognized, Version,
};
use crate::lexer::{SpannedToken, Token, TokenStream};
use crate::span::{Position, Span};

/// Build the public AST from a syntax tree.
pub(crate) fn build_program(
    source: &str,
    stream: &TokenStream<'_>,
    tree: SyntaxTree,
    include_comments: bool,
) -> Program {
    let mut builder = Builder::new(source, &stream.tokens);
    let program = builder.build(tree, &stream.comments, include_comments);
    trace!(nodes = builder.nodes, "built AST");
    program
}

/// Resolves token indices to text, values and spans.
struct Builder<'t, 'src> {
    source: &'src str,
    tokens: &'t [SpannedToken<'src>],
    /// Number of AST nodes produced.
    nodes: usize,
}

impl<'t, 'src> Builder<'t, 'src> {
    fn new(source: &'src str, tokens: &'t [SpannedToken<'src>]) -> Self {
        Self {
            source,
            tokens,
            nodes: 0,
        }
    }

    fn build(
        &mut self,
        tree: SyntaxTree,
        comments: &[SpannedToken<'_>],
        include_comments: bool,
    ) -> Program {
        let mut version = None;
        let mut statements = Vec::with_capacity(tree.statements.len());

        for stmt in tree.statements {
            match stmt {
                StmtNode::Version { number, range } => {
                    self.nodes += 1;
                    version = Some(Version {
                        number: self.text(number).to_string(),
                        span: self.span(range),
                    });
                }
                other => statements.push(self.statement(other)),
            }
        }

        let comments = if include_comments {
            comments.iter().map(|c| self.comment(c)).collect()
        } else {
            Vec::new()
        };

        let end = self
            .tokens
            .last()
            .map_or(Position::START, |eof| eof.span.end);

        self.nodes += 1;
        Program {
            version,
            statements,
            comments,
            span: Span::new(Position::START, end),
        }
    }

    fn text(&self, index: usize) -> &'src str {
        self.tokens[index].text
    }

    fn span(&self, range: TokenRange) -> Span {
        self.tokens[range.first]
            .span
            .cover(self.tokens[range.last].span)
    }

    fn comment(&mut self, token: &SpannedToken<'_>) -> Comment {
        self.nodes += 1;
        Comment {
            text: token.text.to_string(),
            kind: if token.token == Token::BlockComment {
                CommentKind::Block
            } else {
                CommentKind::Line
            },
            span: token.span,
        }
    }

    fn statement(&mut self, stmt: StmtNode) -> Statement {
        self.nodes += 1;
        match stmt {
            StmtNode::Version { range, .. } | StmtNode::Skipped { range } => {
                Statement::Unrecognized(Unrecognized {
                    span: self.span(range),
                })
            }
            StmtNode::Include { path, range } => Statement::Include(Include {
                path: unquote(self.text(path)).to_string(),
                span: self.span(range),
            }),
            StmtNode::QuantumDecl {
                keyword,
                name,
                size,
                range,
            } => Statement::QuantumDeclaration(QuantumDeclaration {
                type_name: self.text(keyword).to_string(),
                name: self.text(name).to_string(),
                size: size.map(|e| self.expression(e)),
                span: self.span(range),
            }),
            StmtNode::ClassicalDecl {
                modifier,
                keyword,
                name,
                size,
                init,
                range,
            } => Statement::ClassicalDeclaration(ClassicalDeclaration {
                modifier,
                type_name: self.text(keyword).to_string(),
                name: self.text(name).to_string(),
                size: size.map(|e| self.expression(e)),
                initializer: init.map(|e| self.expression(e)),
                span: self.span(range),
            }),
            StmtNode::GateCall {
                modifiers,
                name,
                params,
                operands,
                range,
            } => Statement::GateCall(GateCall {
                name: self.text(name).to_string(),
                modifiers: modifiers.into_iter().map(|m| self.modifier(m)).collect(),
                parameters: self.expressions(params),
                operands: self.expressions(operands),
                span: self.span(range),
            }),
            StmtNode::Measure {
                source,
                target,
                range,
            } => Statement::Measurement(Measurement {
                source: self.expression(source),
                target: target.map(|e| self.expression(e)),
                span: self.span(range),
            }),
            StmtNode::Reset { operand, range } => Statement::Reset(Reset {
                operand: self.expression(operand),
                span: self.span(range),
            }),
            StmtNode::Barrier { operands, range } => Statement::Barrier(Barrier {
                operands: self.expressions(operands),
                span: self.span(range),
            }),
            StmtNode::Assign {
                target,
                op,
                value,
                range,
            } => Statement::Assignment(Assignment {
                target: self.expression(target),
                op,
                value: self.expression(value),
                span: self.span(range),
            }),
            StmtNode::GateDef {
                name,
                params,
                qubits,
                body,
                range,
            } => Statement::GateDefinition(GateDefinition {
                name: self.text(name).to_string(),
                params: params.iter().map(|&i| self.text(i).to_string()).collect(),
                qubits: qubits.iter().map(|&i| self.text(i).to_string()).collect(),
                body: body.into_iter().map(|s| self.statement(s)).collect(),
                span: self.span(range),
            }),
            StmtNode::Opaque { kind, range } => {
                let span = self.span(range);
                Statement::Opaque(OpaqueStatement {
                    kind,
                    text: self.source[span.range()].to_string(),
                    span,
                })
            }
        }
    }

    fn modifier(&mut self, node: ModifierNode) -> GateModifier {
        self.nodes += 1;
        GateModifier {
            kind: node.kind,
            argument: node.argument.map(|e| self.expression(e)),
            span: self.span(node.range),
        }
    }

    fn expressions(&mut self, nodes: Vec<ExprNode>) -> Vec<Expression> {
        nodes.into_iter().map(|e| self.expression(e)).collect()
    }

    fn boxed(&mut self, node: ExprNode) -> Box<Expression> {
        Box::new(self.expression(node))
    }

    fn expression(&mut self, node: ExprNode) -> Expression {
        // Grouping parentheses do not produce a node of their own.
        if !matches!(node, ExprNode::Group(_)) {
            self.nodes += 1;
        }

        match node {
            ExprNode::Atom(index) => self.atom(index),
            ExprNode::Group(inner) => self.expression(*inner),
            ExprNode::Unary { op, operand, range } => Expression::Unary(UnaryExpression {
                op,
                operand: self.boxed(*operand),
                span: self.span(range),
            }),
            ExprNode::Binary {
                op,
                lhs,
                rhs,
                range,
            } => Expression::Binary(BinaryExpression {
                op,
                lhs: self.boxed(*lhs),
                rhs: self.boxed(*rhs),
                span: self.span(range),
            }),
            ExprNode::Index { base, index, range } => Expression::Index(IndexExpression {
                base: self.boxed(*base),
                index: self.boxed(*index),
                span: self.span(range),
            }),
            ExprNode::Range {
                start,
                step,
                end,
                range,
            } => Expression::Range(RangeExpression {
                start: start.map(|e| self.boxed(*e)),
                step: step.map(|e| self.boxed(*e)),
                end: end.map(|e| self.boxed(*e)),
                span: self.span(range),
            }),
            ExprNode::Call { name, args, range } => Expression::Call(CallExpression {
                name: self.text(name).to_string(),
                args: self.expressions(args),
                span: self.span(range),
            }),
            ExprNode::Measure { operand, range } => Expression::Measure(MeasureExpression {
                operand: self.boxed(*operand),
                span: self.span(range),
            }),
        }
    }

    /// Resolve a single-token expression to its typed value.
    fn atom(&self, at: usize) -> Expression {
        let token = &self.tokens[at];
        let span = token.span;
        match token.token {
            Token::IntLiteral(value) => Expression::Int(IntLiteral { value, span }),
            Token::FloatLiteral(value) => Expression::Float(FloatLiteral { value, span }),
            Token::True => Expression::Bool(BoolLiteral { value: true, span }),
            Token::False => Expression::Bool(BoolLiteral { value: false, span }),
            Token::Pi => constant(ConstantKind::Pi, span),
            Token::Tau => constant(ConstantKind::Tau, span),
            Token::Euler => constant(ConstantKind::Euler, span),
            Token::HardwareQubit(index) => Expression::HardwareQubit(HardwareQubit { index, span }),
            _ => Expression::Identifier(Identifier {
                name: token.text.to_string(),
                span,
            }),
        }
    }
}

fn constant(constant: ConstantKind, span: Span) -> Expression {
    Expression::Constant(Constant { constant, span })
}

/// Strip the surrounding quotes from a string literal.
fn unquote(text: &str) -> &str {
    let inner = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .or_else(|| text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')));
    inner.unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"stdgates.inc\""), "stdgates.inc");
        assert_eq!(unquote("'a.inc'"), "a.inc");
        assert_eq!(unquote("bare"), "bare");
    }
}
