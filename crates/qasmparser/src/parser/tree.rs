//! Concrete parse structure.
//!
//! Nodes refer to the token stream by index; resolving text, values and spans
//! is left to the builder.

use crate::ast::{AssignOp, BinaryOp, DeclarationModifier, ModifierKind, OpaqueKind, UnaryOp};

/// Inclusive range of token indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TokenRange {
    pub first: usize,
    pub last: usize,
}

impl TokenRange {
    pub fn new(first: usize, last: usize) -> Self {
        debug_assert!(first <= last, "empty token range");
        Self { first, last }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct SyntaxTree {
    pub statements: Vec<StmtNode>,
}

#[derive(Debug, Clone)]
pub(crate) enum StmtNode {
    Version {
        number: usize,
        range: TokenRange,
    },
    Include {
        path: usize,
        range: TokenRange,
    },
    QuantumDecl {
        keyword: usize,
        name: usize,
        size: Option<ExprNode>,
        range: TokenRange,
    },
    ClassicalDecl {
        modifier: Option<DeclarationModifier>,
        keyword: usize,
        name: usize,
        size: Option<ExprNode>,
        init: Option<ExprNode>,
        range: TokenRange,
    },
    GateCall {
        modifiers: Vec<ModifierNode>,
        name: usize,
        params: Vec<ExprNode>,
        operands: Vec<ExprNode>,
        range: TokenRange,
    },
    Measure {
        source: ExprNode,
        target: Option<ExprNode>,
        range: TokenRange,
    },
    Reset {
        operand: ExprNode,
        range: TokenRange,
    },
    Barrier {
        operands: Vec<ExprNode>,
        range: TokenRange,
    },
    Assign {
        target: ExprNode,
        op: AssignOp,
        value: ExprNode,
        range: TokenRange,
    },
    GateDef {
        name: usize,
        params: Vec<usize>,
        qubits: Vec<usize>,
        body: Vec<StmtNode>,
        range: TokenRange,
    },
    Opaque {
        kind: OpaqueKind,
        range: TokenRange,
    },
    /// Tokens discarded by error recovery.
    Skipped {
        range: TokenRange,
    },
}

#[cfg(test)]
impl StmtNode {
    pub fn range(&self) -> TokenRange {
        match self {
            StmtNode::Version { range, .. }
            | StmtNode::Include { range, .. }
            | StmtNode::QuantumDecl { range, .. }
            | StmtNode::ClassicalDecl { range, .. }
            | StmtNode::GateCall { range, .. }
            | StmtNode::Measure { range, .. }
            | StmtNode::Reset { range, .. }
            | StmtNode::Barrier { range, .. }
            | StmtNode::Assign { range, .. }
            | StmtNode::GateDef { range, .. }
            | StmtNode::Opaque { range, .. }
            | StmtNode::Skipped { range } => *range,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ModifierNode {
    pub kind: ModifierKind,
    pub argument: Option<ExprNode>,
    pub range: TokenRange,
}

#[derive(Debug, Clone)]
pub(crate) enum ExprNode {
    /// Literal, constant, identifier or hardware qubit.
    Atom(usize),
    /// Parenthesized expression. The enclosing node's range covers the parentheses.
    Group(Box<ExprNode>),
    Unary {
        op: UnaryOp,
        operand: Box<ExprNode>,
        range: TokenRange,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<ExprNode>,
        rhs: Box<ExprNode>,
        range: TokenRange,
    },
    Index {
        base: Box<ExprNode>,
        index: Box<ExprNode>,
        range: TokenRange,
    },
    Range {
        start: Option<Box<ExprNode>>,
        step: Option<Box<ExprNode>>,
        end: Option<Box<ExprNode>>,
        range: TokenRange,
    },
    Call {
        name: usize,
        args: Vec<ExprNode>,
        range: TokenRange,
    },
    Measure {
        operand: Box<ExprNode>,
        range: TokenRange,
    },
}
