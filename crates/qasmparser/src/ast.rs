//! Abstract Syntax Tree for `OpenQASM` 3.
//!
//! Every node carries the [`Span`] of the source text it was built from. The
//! tree is owned and acyclic; nodes never refer back to their parents.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::span::Span;

/// A complete QASM3 program.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    /// Version pragma, when present.
    pub version: Option<Version>,
    /// Top-level statements in source order.
    pub statements: Vec<Statement>,
    /// Comments in source order (empty unless comment collection is enabled).
    pub comments: Vec<Comment>,
    pub span: Span,
}

impl Program {
    /// Version string as written, e.g. `"3.0"`.
    pub fn version_number(&self) -> Option<&str> {
        self.version.as_ref().map(|v| v.number.as_str())
    }
}

/// `OPENQASM 3.0;`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Version number exactly as written.
    pub number: String,
    pub span: Span,
}

impl Version {
    /// Major version component, if it is a valid integer.
    pub fn major(&self) -> Option<u32> {
        self.number.split('.').next()?.parse().ok()
    }
}

/// A source comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Full comment text including delimiters.
    pub text: String,
    pub kind: CommentKind,
    pub span: Span,
}

/// Comment flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentKind {
    Line,
    Block,
}

/// A statement in a QASM3 program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Statement {
    Include(Include),
    QuantumDeclaration(QuantumDeclaration),
    ClassicalDeclaration(ClassicalDeclaration),
    GateCall(GateCall),
    Measurement(Measurement),
    Reset(Reset),
    Barrier(Barrier),
    Assignment(Assignment),
    GateDefinition(GateDefinition),
    /// Control-flow or subroutine construct kept as raw text.
    Opaque(OpaqueStatement),
    /// Source skipped during error recovery.
    Unrecognized(Unrecognized),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Include(s) => s.span,
            Statement::QuantumDeclaration(s) => s.span,
            Statement::ClassicalDeclaration(s) => s.span,
            Statement::GateCall(s) => s.span,
            Statement::Measurement(s) => s.span,
            Statement::Reset(s) => s.span,
            Statement::Barrier(s) => s.span,
            Statement::Assignment(s) => s.span,
            Statement::GateDefinition(s) => s.span,
            Statement::Opaque(s) => s.span,
            Statement::Unrecognized(s) => s.span,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Statement::Include(_) => NodeKind::Include,
            Statement::QuantumDeclaration(_) => NodeKind::QuantumDeclaration,
            Statement::ClassicalDeclaration(_) => NodeKind::ClassicalDeclaration,
            Statement::GateCall(_) => NodeKind::GateCall,
            Statement::Measurement(_) => NodeKind::Measurement,
            Statement::Reset(_) => NodeKind::Reset,
            Statement::Barrier(_) => NodeKind::Barrier,
            Statement::Assignment(_) => NodeKind::Assignment,
            Statement::GateDefinition(_) => NodeKind::GateDefinition,
            Statement::Opaque(_) => NodeKind::OpaqueStatement,
            Statement::Unrecognized(_) => NodeKind::Unrecognized,
        }
    }
}

/// `include "stdgates.inc";`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Include {
    /// Path without quotes.
    pub path: String,
    pub span: Span,
}

/// `qubit[2] q;` or `qreg q[2];`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantumDeclaration {
    /// `qubit` or `qreg`.
    pub type_name: String,
    pub name: String,
    pub size: Option<Expression>,
    pub span: Span,
}

/// `const int[32] n = 4;`, `bit[2] c;`, `creg c[2];`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicalDeclaration {
    pub modifier: Option<DeclarationModifier>,
    /// `bit`, `int`, `uint`, `float`, `angle`, `bool` or `creg`.
    pub type_name: String,
    pub name: String,
    pub size: Option<Expression>,
    pub initializer: Option<Expression>,
    pub span: Span,
}

/// Classical declaration modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationModifier {
    Const,
    Input,
    Output,
}

impl DeclarationModifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationModifier::Const => "const",
            DeclarationModifier::Input => "input",
            DeclarationModifier::Output => "output",
        }
    }
}

/// A gate call: `ctrl @ rx(pi/2) q[0], q[1];`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateCall {
    pub name: String,
    /// Modifiers in source order.
    pub modifiers: Vec<GateModifier>,
    /// Gate parameters (angles, etc.).
    pub parameters: Vec<Expression>,
    /// Qubit operands. Empty only for `gphase`.
    pub operands: Vec<Expression>,
    pub span: Span,
}

/// One gate modifier, e.g. `ctrl(2)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateModifier {
    pub kind: ModifierKind,
    /// Exponent for `pow`, optional control count for `ctrl`/`negctrl`.
    pub argument: Option<Expression>,
    pub span: Span,
}

/// Gate modifier keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierKind {
    Inv,
    Pow,
    Ctrl,
    NegCtrl,
}

impl ModifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModifierKind::Inv => "inv",
            ModifierKind::Pow => "pow",
            ModifierKind::Ctrl => "ctrl",
            ModifierKind::NegCtrl => "negctrl",
        }
    }
}

/// `measure q -> c;`, `c = measure q;` or `measure q;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub source: Expression,
    pub target: Option<Expression>,
    pub span: Span,
}

/// `reset q;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reset {
    pub operand: Expression,
    pub span: Span,
}

/// `barrier q;` (operands may be empty)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Barrier {
    pub operands: Vec<Expression>,
    pub span: Span,
}

/// `c[0] += 1;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub target: Expression,
    pub op: AssignOp,
    pub value: Expression,
    pub span: Span,
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

impl AssignOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
        }
    }
}

/// `gate name(params) qubits { body }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDefinition {
    pub name: String,
    pub params: Vec<String>,
    pub qubits: Vec<String>,
    pub body: Vec<Statement>,
    pub span: Span,
}

/// A construct recognized only by its leading keyword and skipped as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaqueStatement {
    pub kind: OpaqueKind,
    /// Source text of the whole construct.
    pub text: String,
    pub span: Span,
}

/// Leading keyword of an [`OpaqueStatement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpaqueKind {
    If,
    For,
    While,
    Def,
    Return,
    Break,
    Continue,
    End,
}

impl OpaqueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpaqueKind::If => "if",
            OpaqueKind::For => "for",
            OpaqueKind::While => "while",
            OpaqueKind::Def => "def",
            OpaqueKind::Return => "return",
            OpaqueKind::Break => "break",
            OpaqueKind::Continue => "continue",
            OpaqueKind::End => "end",
        }
    }
}

/// Placeholder for source that could not be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unrecognized {
    pub span: Span,
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expression {
    Int(IntLiteral),
    Float(FloatLiteral),
    Bool(BoolLiteral),
    Constant(Constant),
    Identifier(Identifier),
    HardwareQubit(HardwareQubit),
    Unary(UnaryExpression),
    Binary(BinaryExpression),
    Index(IndexExpression),
    Range(RangeExpression),
    Call(CallExpression),
    Measure(MeasureExpression),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntLiteral {
    pub value: u64,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatLiteral {
    pub value: f64,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoolLiteral {
    pub value: bool,
    pub span: Span,
}

/// `pi`, `tau` or `euler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constant {
    pub constant: ConstantKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstantKind {
    Pi,
    Tau,
    Euler,
}

impl ConstantKind {
    pub fn value(&self) -> f64 {
        match self {
            ConstantKind::Pi => std::f64::consts::PI,
            ConstantKind::Tau => std::f64::consts::TAU,
            ConstantKind::Euler => std::f64::consts::E,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConstantKind::Pi => "pi",
            ConstantKind::Tau => "tau",
            ConstantKind::Euler => "euler",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

/// Physical qubit reference: `$3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareQubit {
    pub index: u64,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpression {
    pub op: UnaryOp,
    pub operand: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpression {
    pub op: BinaryOp,
    pub lhs: Box<Expression>,
    pub rhs: Box<Expression>,
    pub span: Span,
}

/// `q[0]`, `q[0:2]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexExpression {
    pub base: Box<Expression>,
    pub index: Box<Expression>,
    pub span: Span,
}

/// `start:end` or `start:step:end`; every bound may be omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeExpression {
    pub start: Option<Box<Expression>>,
    pub step: Option<Box<Expression>>,
    pub end: Option<Box<Expression>>,
    pub span: Span,
}

/// `sin(x)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpression {
    pub name: String,
    pub args: Vec<Expression>,
    pub span: Span,
}

/// `measure q` used as a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureExpression {
    pub operand: Box<Expression>,
    pub span: Span,
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Int(e) => e.span,
            Expression::Float(e) => e.span,
            Expression::Bool(e) => e.span,
            Expression::Constant(e) => e.span,
            Expression::Identifier(e) => e.span,
            Expression::HardwareQubit(e) => e.span,
            Expression::Unary(e) => e.span,
            Expression::Binary(e) => e.span,
            Expression::Index(e) => e.span,
            Expression::Range(e) => e.span,
            Expression::Call(e) => e.span,
            Expression::Measure(e) => e.span,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Expression::Int(_) => NodeKind::IntLiteral,
            Expression::Float(_) => NodeKind::FloatLiteral,
            Expression::Bool(_) => NodeKind::BoolLiteral,
            Expression::Constant(_) => NodeKind::Constant,
            Expression::Identifier(_) => NodeKind::Identifier,
            Expression::HardwareQubit(_) => NodeKind::HardwareQubit,
            Expression::Unary(_) => NodeKind::UnaryExpression,
            Expression::Binary(_) => NodeKind::BinaryExpression,
            Expression::Index(_) => NodeKind::IndexExpression,
            Expression::Range(_) => NodeKind::RangeExpression,
            Expression::Call(_) => NodeKind::CallExpression,
            Expression::Measure(_) => NodeKind::MeasureExpression,
        }
    }

    /// The value of an integer literal.
    pub fn as_int(&self) -> Option<u64> {
        match self {
            Expression::Int(lit) => Some(lit.value),
            _ => None,
        }
    }

    /// The name of a plain identifier.
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Expression::Identifier(id) => Some(&id.name),
            _ => None,
        }
    }

    /// The register name an operand refers to: `q` for both `q` and `q[1]`.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            Expression::Identifier(id) => Some(&id.name),
            Expression::Index(ix) => ix.base.base_name(),
            _ => None,
        }
    }

    /// Try to evaluate as a constant f64.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Expression::Int(lit) => Some(lit.value as f64),
            Expression::Float(lit) => Some(lit.value),
            Expression::Constant(c) => Some(c.constant.value()),
            Expression::Unary(u) => {
                let v = u.operand.as_f64()?;
                match u.op {
                    UnaryOp::Neg => Some(-v),
                    _ => None,
                }
            }
            Expression::Binary(b) => {
                let l = b.lhs.as_f64()?;
                let r = b.rhs.as_f64()?;
                Some(match b.op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Sub => l - r,
                    BinaryOp::Mul => l * r,
                    BinaryOp::Div => l / r,
                    BinaryOp::Mod => l % r,
                    BinaryOp::Pow => l.powf(r),
                    _ => return None,
                })
            }
            _ => None,
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
    /// `~x`
    BitNot,
}

impl UnaryOp {
    /// Binding power of every prefix operator; below `**` and above `*`.
    pub const PRECEDENCE: u8 = 11;

    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    LShift,
    RShift,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

impl BinaryOp {
    /// Binding power; higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::BitOr => 3,
            BinaryOp::BitXor => 4,
            BinaryOp::BitAnd => 5,
            BinaryOp::Eq | BinaryOp::NotEq => 6,
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => 7,
            BinaryOp::LShift | BinaryOp::RShift => 8,
            BinaryOp::Add | BinaryOp::Sub => 9,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 10,
            BinaryOp::Pow => 12,
        }
    }

    pub fn is_right_assoc(&self) -> bool {
        matches!(self, BinaryOp::Pow)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::LShift => "<<",
            BinaryOp::RShift => ">>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        }
    }
}

/// Stable discriminant for every node variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    Program,
    Version,
    Comment,
    Include,
    QuantumDeclaration,
    ClassicalDeclaration,
    GateCall,
    GateModifier,
    Measurement,
    Reset,
    Barrier,
    Assignment,
    GateDefinition,
    OpaqueStatement,
    Unrecognized,
    IntLiteral,
    FloatLiteral,
    BoolLiteral,
    Constant,
    Identifier,
    HardwareQubit,
    UnaryExpression,
    BinaryExpression,
    IndexExpression,
    RangeExpression,
    CallExpression,
    MeasureExpression,
}

impl NodeKind {
    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::Include
                | NodeKind::QuantumDeclaration
                | NodeKind::ClassicalDeclaration
                | NodeKind::GateCall
                | NodeKind::Measurement
                | NodeKind::Reset
                | NodeKind::Barrier
                | NodeKind::Assignment
                | NodeKind::GateDefinition
                | NodeKind::OpaqueStatement
                | NodeKind::Unrecognized
        )
    }

    pub fn is_expression(&self) -> bool {
        *self >= NodeKind::IntLiteral
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
