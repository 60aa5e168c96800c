//! Generic AST traversal.
//!
//! [`Visitor`] has one method per node variant, each defaulting to a no-op that
//! returns `Output::default()`, so implementations only override the variants
//! they care about. [`walk`] dispatches a [`Node`] to the matching method;
//! wrap a visitor in [`DepthFirst`] to have every descendant visited as well.
//!
//! # Example
//!
//! ```
//! use qasmparser::ast::GateCall;
//! use qasmparser::visit::{walk, DepthFirst, Node, Visitor};
//!
//! #[derive(Default)]
//! struct GateNames(Vec<String>);
//!
//! impl Visitor for GateNames {
//!     type Output = ();
//!
//!     fn visit_gate_call(&mut self, node: &GateCall) {
//!         self.0.push(node.name.clone());
//!     }
//! }
//!
//! let program = qasmparser::parse("qubit[2] q;\nh q[0];\ncx q[0], q[1];\n").unwrap();
//! let mut visitor = DepthFirst::new(GateNames::default());
//! walk(&mut visitor, Some(Node::from(&program)));
//! assert_eq!(visitor.into_inner().0, ["h", "cx"]);
//! ```

use std::fmt;

use crate::ast::{
    Assignment, Barrier, BinaryExpression, BoolLiteral, CallExpression, ClassicalDeclaration,
    Comment, Constant, Expression, FloatLiteral, GateCall, GateDefinition, GateModifier,
    HardwareQubit, Identifier, Include, IndexExpression, IntLiteral, MeasureExpression,
    Measurement, NodeKind, OpaqueStatement, Program, QuantumDeclaration, RangeExpression, Reset,
    Statement, UnaryExpression, Unrecognized, Version,
};
use crate::span::Span;

/// Borrowed handle to any AST node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node<'a> {
    Program(&'a Program),
    Version(&'a Version),
    Comment(&'a Comment),
    Include(&'a Include),
    QuantumDeclaration(&'a QuantumDeclaration),
    ClassicalDeclaration(&'a ClassicalDeclaration),
    GateCall(&'a GateCall),
    GateModifier(&'a GateModifier),
    Measurement(&'a Measurement),
    Reset(&'a Reset),
    Barrier(&'a Barrier),
    Assignment(&'a Assignment),
    GateDefinition(&'a GateDefinition),
    OpaqueStatement(&'a OpaqueStatement),
    Unrecognized(&'a Unrecognized),
    IntLiteral(&'a IntLiteral),
    FloatLiteral(&'a FloatLiteral),
    BoolLiteral(&'a BoolLiteral),
    Constant(&'a Constant),
    Identifier(&'a Identifier),
    HardwareQubit(&'a HardwareQubit),
    UnaryExpression(&'a UnaryExpression),
    BinaryExpression(&'a BinaryExpression),
    IndexExpression(&'a IndexExpression),
    RangeExpression(&'a RangeExpression),
    CallExpression(&'a CallExpression),
    MeasureExpression(&'a MeasureExpression),
}

impl<'a> From<&'a Program> for Node<'a> {
    fn from(program: &'a Program) -> Self {
        Node::Program(program)
    }
}

impl<'a> From<&'a Statement> for Node<'a> {
    fn from(stmt: &'a Statement) -> Self {
        match stmt {
            Statement::Include(s) => Node::Include(s),
            Statement::QuantumDeclaration(s) => Node::QuantumDeclaration(s),
            Statement::ClassicalDeclaration(s) => Node::ClassicalDeclaration(s),
            Statement::GateCall(s) => Node::GateCall(s),
            Statement::Measurement(s) => Node::Measurement(s),
            Statement::Reset(s) => Node::Reset(s),
            Statement::Barrier(s) => Node::Barrier(s),
            Statement::Assignment(s) => Node::Assignment(s),
            Statement::GateDefinition(s) => Node::GateDefinition(s),
            Statement::Opaque(s) => Node::OpaqueStatement(s),
            Statement::Unrecognized(s) => Node::Unrecognized(s),
        }
    }
}

impl<'a> From<&'a Expression> for Node<'a> {
    fn from(expr: &'a Expression) -> Self {
        match expr {
            Expression::Int(e) => Node::IntLiteral(e),
            Expression::Float(e) => Node::FloatLiteral(e),
            Expression::Bool(e) => Node::BoolLiteral(e),
            Expression::Constant(e) => Node::Constant(e),
            Expression::Identifier(e) => Node::Identifier(e),
            Expression::HardwareQubit(e) => Node::HardwareQubit(e),
            Expression::Unary(e) => Node::UnaryExpression(e),
            Expression::Binary(e) => Node::BinaryExpression(e),
            Expression::Index(e) => Node::IndexExpression(e),
            Expression::Range(e) => Node::RangeExpression(e),
            Expression::Call(e) => Node::CallExpression(e),
            Expression::Measure(e) => Node::MeasureExpression(e),
        }
    }
}

impl<'a> Node<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Program(_) => NodeKind::Program,
            Node::Version(_) => NodeKind::Version,
            Node::Comment(_) => NodeKind::Comment,
            Node::Include(_) => NodeKind::Include,
            Node::QuantumDeclaration(_) => NodeKind::QuantumDeclaration,
            Node::ClassicalDeclaration(_) => NodeKind::ClassicalDeclaration,
            Node::GateCall(_) => NodeKind::GateCall,
            Node::GateModifier(_) => NodeKind::GateModifier,
            Node::Measurement(_) => NodeKind::Measurement,
            Node::Reset(_) => NodeKind::Reset,
            Node::Barrier(_) => NodeKind::Barrier,
            Node::Assignment(_) => NodeKind::Assignment,
            Node::GateDefinition(_) => NodeKind::GateDefinition,
            Node::OpaqueStatement(_) => NodeKind::OpaqueStatement,
            Node::Unrecognized(_) => NodeKind::Unrecognized,
            Node::IntLiteral(_) => NodeKind::IntLiteral,
            Node::FloatLiteral(_) => NodeKind::FloatLiteral,
            Node::BoolLiteral(_) => NodeKind::BoolLiteral,
            Node::Constant(_) => NodeKind::Constant,
            Node::Identifier(_) => NodeKind::Identifier,
            Node::HardwareQubit(_) => NodeKind::HardwareQubit,
            Node::UnaryExpression(_) => NodeKind::UnaryExpression,
            Node::BinaryExpression(_) => NodeKind::BinaryExpression,
            Node::IndexExpression(_) => NodeKind::IndexExpression,
            Node::RangeExpression(_) => NodeKind::RangeExpression,
            Node::CallExpression(_) => NodeKind::CallExpression,
            Node::MeasureExpression(_) => NodeKind::MeasureExpression,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Node::Program(n) => n.span,
            Node::Version(n) => n.span,
            Node::Comment(n) => n.span,
            Node::Include(n) => n.span,
            Node::QuantumDeclaration(n) => n.span,
            Node::ClassicalDeclaration(n) => n.span,
            Node::GateCall(n) => n.span,
            Node::GateModifier(n) => n.span,
            Node::Measurement(n) => n.span,
            Node::Reset(n) => n.span,
            Node::Barrier(n) => n.span,
            Node::Assignment(n) => n.span,
            Node::GateDefinition(n) => n.span,
            Node::OpaqueStatement(n) => n.span,
            Node::Unrecognized(n) => n.span,
            Node::IntLiteral(n) => n.span,
            Node::FloatLiteral(n) => n.span,
            Node::BoolLiteral(n) => n.span,
            Node::Constant(n) => n.span,
            Node::Identifier(n) => n.span,
            Node::HardwareQubit(n) => n.span,
            Node::UnaryExpression(n) => n.span,
            Node::BinaryExpression(n) => n.span,
            Node::IndexExpression(n) => n.span,
            Node::RangeExpression(n) => n.span,
            Node::CallExpression(n) => n.span,
            Node::MeasureExpression(n) => n.span,
        }
    }

    /// Owned children in source order.
    pub fn children(&self) -> Vec<Node<'a>> {
        let mut out = Vec::new();
        match *self {
            Node::Program(p) => {
                out.extend(p.version.as_ref().map(Node::Version));

                // Statements and comments interleaved by position.
                let mut comments = p.comments.iter().peekable();
                for stmt in &p.statements {
                    let offset = stmt.span().start.offset;
                    while let Some(c) = comments.next_if(|c| c.span.start.offset < offset) {
                        out.push(Node::Comment(c));
                    }
                    out.push(Node::from(stmt));
                }
                out.extend(comments.map(Node::Comment));
            }
            Node::QuantumDeclaration(d) => {
                out.extend(d.size.as_ref().map(Node::from));
            }
            Node::ClassicalDeclaration(d) => {
                out.extend(d.size.as_ref().map(Node::from));
                out.extend(d.initializer.as_ref().map(Node::from));
            }
            Node::GateCall(g) => {
                out.extend(g.modifiers.iter().map(Node::GateModifier));
                out.extend(g.parameters.iter().map(Node::from));
                out.extend(g.operands.iter().map(Node::from));
            }
            Node::GateModifier(m) => {
                out.extend(m.argument.as_ref().map(Node::from));
            }
            Node::Measurement(m) => {
                // `c = measure q` puts the target first in the source.
                let source = Node::from(&m.source);
                match &m.target {
                    Some(t) if t.span().start.offset < m.source.span().start.offset => {
                        out.push(Node::from(t));
                        out.push(source);
                    }
                    Some(t) => {
                        out.push(source);
                        out.push(Node::from(t));
                    }
                    None => out.push(source),
                }
            }
            Node::Reset(r) => out.push(Node::from(&r.operand)),
            Node::Barrier(b) => out.extend(b.operands.iter().map(Node::from)),
            Node::Assignment(a) => {
                out.push(Node::from(&a.target));
                out.push(Node::from(&a.value));
            }
            Node::GateDefinition(g) => out.extend(g.body.iter().map(Node::from)),
            Node::UnaryExpression(u) => out.push(Node::from(u.operand.as_ref())),
            Node::BinaryExpression(b) => {
                out.push(Node::from(b.lhs.as_ref()));
                out.push(Node::from(b.rhs.as_ref()));
            }
            Node::IndexExpression(ix) => {
                out.push(Node::from(ix.base.as_ref()));
                out.push(Node::from(ix.index.as_ref()));
            }
            Node::RangeExpression(r) => {
                for bound in [&r.start, &r.step, &r.end].into_iter().flatten() {
                    out.push(Node::from(bound.as_ref()));
                }
            }
            Node::CallExpression(c) => out.extend(c.args.iter().map(Node::from)),
            Node::MeasureExpression(m) => out.push(Node::from(m.operand.as_ref())),
            Node::Version(_)
            | Node::Comment(_)
            | Node::Include(_)
            | Node::OpaqueStatement(_)
            | Node::Unrecognized(_)
            | Node::IntLiteral(_)
            | Node::FloatLiteral(_)
            | Node::BoolLiteral(_)
            | Node::Constant(_)
            | Node::Identifier(_)
            | Node::HardwareQubit(_) => {}
        }
        out
    }
}

impl fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())?;
        match self {
            Node::Program(p) => write!(f, " ({} statements)", p.statements.len()),
            Node::Version(v) => write!(f, " {}", v.number),
            Node::Comment(c) => write!(f, " {}", c.text.lines().next().unwrap_or_default()),
            Node::Include(i) => write!(f, " \"{}\"", i.path),
            Node::QuantumDeclaration(d) => write!(f, " {} {}", d.type_name, d.name),
            Node::ClassicalDeclaration(d) => write!(f, " {} {}", d.type_name, d.name),
            Node::GateCall(g) => write!(f, " {}", g.name),
            Node::GateModifier(m) => write!(f, " {}", m.kind.as_str()),
            Node::Assignment(a) => write!(f, " {}", a.op.symbol()),
            Node::GateDefinition(g) => write!(f, " {}", g.name),
            Node::OpaqueStatement(o) => write!(f, " {}", o.kind.as_str()),
            Node::IntLiteral(n) => write!(f, " {}", n.value),
            Node::FloatLiteral(n) => write!(f, " {}", n.value),
            Node::BoolLiteral(n) => write!(f, " {}", n.value),
            Node::Constant(c) => write!(f, " {}", c.constant.as_str()),
            Node::Identifier(i) => write!(f, " {}", i.name),
            Node::HardwareQubit(q) => write!(f, " ${}", q.index),
            Node::UnaryExpression(u) => write!(f, " {}", u.op.symbol()),
            Node::BinaryExpression(b) => write!(f, " {}", b.op.symbol()),
            Node::CallExpression(c) => write!(f, " {}", c.name),
            Node::Measurement(_)
            | Node::Reset(_)
            | Node::Barrier(_)
            | Node::Unrecognized(_)
            | Node::IndexExpression(_)
            | Node::RangeExpression(_)
            | Node::MeasureExpression(_) => Ok(()),
        }
    }
}

/// A visitor over AST nodes.
///
/// Every method defaults to doing nothing and returning `Output::default()`.
pub trait Visitor {
    type Output: Default;

    /// Dispatch `node` to the method for its variant.
    fn visit(&mut self, node: Node<'_>) -> Self::Output {
        match node {
            Node::Program(n) => self.visit_program(n),
            Node::Version(n) => self.visit_version(n),
            Node::Comment(n) => self.visit_comment(n),
            Node::Include(n) => self.visit_include(n),
            Node::QuantumDeclaration(n) => self.visit_quantum_declaration(n),
            Node::ClassicalDeclaration(n) => self.visit_classical_declaration(n),
            Node::GateCall(n) => self.visit_gate_call(n),
            Node::GateModifier(n) => self.visit_gate_modifier(n),
            Node::Measurement(n) => self.visit_measurement(n),
            Node::Reset(n) => self.visit_reset(n),
            Node::Barrier(n) => self.visit_barrier(n),
            Node::Assignment(n) => self.visit_assignment(n),
            Node::GateDefinition(n) => self.visit_gate_definition(n),
            Node::OpaqueStatement(n) => self.visit_opaque_statement(n),
            Node::Unrecognized(n) => self.visit_unrecognized(n),
            Node::IntLiteral(n) => self.visit_int_literal(n),
            Node::FloatLiteral(n) => self.visit_float_literal(n),
            Node::BoolLiteral(n) => self.visit_bool_literal(n),
            Node::Constant(n) => self.visit_constant(n),
            Node::Identifier(n) => self.visit_identifier(n),
            Node::HardwareQubit(n) => self.visit_hardware_qubit(n),
            Node::UnaryExpression(n) => self.visit_unary_expression(n),
            Node::BinaryExpression(n) => self.visit_binary_expression(n),
            Node::IndexExpression(n) => self.visit_index_expression(n),
            Node::RangeExpression(n) => self.visit_range_expression(n),
            Node::CallExpression(n) => self.visit_call_expression(n),
            Node::MeasureExpression(n) => self.visit_measure_expression(n),
        }
    }

    fn visit_program(&mut self, _node: &Program) -> Self::Output {
        Self::Output::default()
    }

    fn visit_version(&mut self, _node: &Version) -> Self::Output {
        Self::Output::default()
    }

    fn visit_comment(&mut self, _node: &Comment) -> Self::Output {
        Self::Output::default()
    }

    fn visit_include(&mut self, _node: &Include) -> Self::Output {
        Self::Output::default()
    }

    fn visit_quantum_declaration(&mut self, _node: &QuantumDeclaration) -> Self::Output {
        Self::Output::default()
    }

    fn visit_classical_declaration(&mut self, _node: &ClassicalDeclaration) -> Self::Output {
        Self::Output::default()
    }

    fn visit_gate_call(&mut self, _node: &GateCall) -> Self::Output {
        Self::Output::default()
    }

    fn visit_gate_modifier(&mut self, _node: &GateModifier) -> Self::Output {
        Self::Output::default()
    }

    fn visit_measurement(&mut self, _node: &Measurement) -> Self::Output {
        Self::Output::default()
    }

    fn visit_reset(&mut self, _node: &Reset) -> Self::Output {
        Self::Output::default()
    }

    fn visit_barrier(&mut self, _node: &Barrier) -> Self::Output {
        Self::Output::default()
    }

    fn visit_assignment(&mut self, _node: &Assignment) -> Self::Output {
        Self::Output::default()
    }

    fn visit_gate_definition(&mut self, _node: &GateDefinition) -> Self::Output {
        Self::Output::default()
    }

    fn visit_opaque_statement(&mut self, _node: &OpaqueStatement) -> Self::Output {
        Self::Output::default()
    }

    fn visit_unrecognized(&mut self, _node: &Unrecognized) -> Self::Output {
        Self::Output::default()
    }

    fn visit_int_literal(&mut self, _node: &IntLiteral) -> Self::Output {
        Self::Output::default()
    }

    fn visit_float_literal(&mut self, _node: &FloatLiteral) -> Self::Output {
        Self::Output::default()
    }

    fn visit_bool_literal(&mut self, _node: &BoolLiteral) -> Self::Output {
        Self::Output::default()
    }

    fn visit_constant(&mut self, _node: &Constant) -> Self::Output {
        Self::Output::default()
    }

    fn visit_identifier(&mut self, _node: &Identifier) -> Self::Output {
        Self::Output::default()
    }

    fn visit_hardware_qubit(&mut self, _node: &HardwareQubit) -> Self::Output {
        Self::Output::default()
    }

    fn visit_unary_expression(&mut self, _node: &UnaryExpression) -> Self::Output {
        Self::Output::default()
    }

    fn visit_binary_expression(&mut self, _node: &BinaryExpression) -> Self::Output {
        Self::Output::default()
    }

    fn visit_index_expression(&mut self, _node: &IndexExpression) -> Self::Output {
        Self::Output::default()
    }

    fn visit_range_expression(&mut self, _node: &RangeExpression) -> Self::Output {
        Self::Output::default()
    }

    fn visit_call_expression(&mut self, _node: &CallExpression) -> Self::Output {
        Self::Output::default()
    }

    fn visit_measure_expression(&mut self, _node: &MeasureExpression) -> Self::Output {
        Self::Output::default()
    }
}

/// A visitor that uses every default.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseVisitor;

impl Visitor for BaseVisitor {
    type Output = ();
}

/// Visits a node and then all of its descendants in source order.
///
/// The result for the starting node is the inner visitor's result for it;
/// results for descendants are discarded.
#[derive(Debug, Clone, Default)]
pub struct DepthFirst<V> {
    inner: V,
}

impl<V: Visitor> DepthFirst<V> {
    pub fn new(inner: V) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &V {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut V {
        &mut self.inner
    }

    pub fn into_inner(self) -> V {
        self.inner
    }
}

impl<V: Visitor> Visitor for DepthFirst<V> {
    type Output = V::Output;

    fn visit(&mut self, node: Node<'_>) -> Self::Output {
        let output = self.inner.visit(node);
        for child in node.children() {
            self.visit(child);
        }
        output
    }
}

/// Dispatch `node` to `visitor`. An absent node yields the empty result.
pub fn walk<V: Visitor + ?Sized>(visitor: &mut V, node: Option<Node<'_>>) -> V::Output {
    match node {
        Some(node) => visitor.visit(node),
        None => V::Output::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::QasmParser;

    #[derive(Default)]
    struct KindLog(Vec<NodeKind>);

    impl Visitor for KindLog {
        type Output = ();

        fn visit(&mut self, node: Node<'_>) {
            self.0.push(node.kind());
        }
    }

    #[derive(Default)]
    struct CountGates;

    impl Visitor for CountGates {
        type Output = usize;

        fn visit_program(&mut self, node: &Program) -> usize {
            node.statements
                .iter()
                .filter(|s| matches!(s, Statement::GateCall(_)))
                .count()
        }
    }

    #[test]
    fn test_walk_none_is_empty() {
        let mut v = CountGates;
        assert_eq!(walk(&mut v, None), 0);
        walk(&mut BaseVisitor, None);
    }

    #[test]
    fn test_walk_dispatches_on_variant() {
        let program = crate::parse("qubit q;\nh q;\nx q;\n").unwrap();
        let mut v = CountGates;
        assert_eq!(walk(&mut v, Some(Node::from(&program))), 2);
        // Unhandled variants fall back to the default.
        assert_eq!(walk(&mut v, Some(Node::from(&program.statements[1]))), 0);
    }

    #[test]
    fn test_depth_first_order() {
        let program = QasmParser::new()
            .parse_str("OPENQASM 3.0;\n// set up\nqubit[2] q;\nrx(pi) q[0];\n")
            .unwrap();
        let mut v = DepthFirst::new(KindLog::default());
        walk(&mut v, Some(Node::from(&program)));

        assert_eq!(
            v.into_inner().0,
            [
                NodeKind::Program,
                NodeKind::Version,
                NodeKind::Comment,
                NodeKind::QuantumDeclaration,
                NodeKind::IntLiteral,
                NodeKind::GateCall,
                NodeKind::Constant,
                NodeKind::IndexExpression,
                NodeKind::Identifier,
                NodeKind::IntLiteral,
            ]
        );
    }

    #[test]
    fn test_depth_first_returns_root_output() {
        let program = crate::parse("qubit q;\nh q;\n").unwrap();
        let mut v = DepthFirst::new(CountGates);
        assert_eq!(walk(&mut v, Some(Node::from(&program))), 1);
    }

    #[test]
    fn test_display_summary() {
        let program = crate::parse("include \"stdgates.inc\";\nqubit q;\n").unwrap();
        let node = Node::from(&program.statements[0]);
        assert_eq!(node.to_string(), "Include \"stdgates.inc\"");
        assert_eq!(Node::from(&program).to_string(), "Program (2 statements)");
    }
}
