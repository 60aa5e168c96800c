//! QASM3 emitter for printing a [`Program`] back to canonical source text.
//!
//! Layout is normalized: one statement per line, four-space indentation inside
//! gate bodies, single spaces around binary operators and parentheses only
//! where precedence requires them. Comments are re-emitted on their own line
//! ahead of the first statement that follows them. Control-flow constructs are
//! printed exactly as they were written.

use std::iter::Peekable;
use std::slice;

use crate::ast::{
    BinaryExpression, ClassicalDeclaration, Comment, Expression, GateCall, GateDefinition,
    Program, QuantumDeclaration, RangeExpression, Statement, UnaryOp,
};
use crate::span::Span;

/// Emit a program as QASM3 source code.
///
/// ```
/// let program = qasmparser::parse("OPENQASM 3.0;\nqubit[2]q;\nrx( pi/2 )q[0];").unwrap();
/// assert_eq!(
///     qasmparser::emit(&program),
///     "OPENQASM 3.0;\nqubit[2] q;\nrx(pi / 2) q[0];\n",
/// );
/// ```
pub fn emit(program: &Program) -> String {
    let mut emitter = Emitter::new(&program.comments);
    emitter.emit_program(program);
    emitter.output
}

/// QASM3 emitter.
struct Emitter<'a> {
    output: String,
    indent: usize,
    comments: Peekable<slice::Iter<'a, Comment>>,
}

impl<'a> Emitter<'a> {
    fn new(comments: &'a [Comment]) -> Self {
        Self {
            output: String::new(),
            indent: 0,
            comments: comments.iter().peekable(),
        }
    }

    fn emit_program(&mut self, program: &Program) {
        if let Some(version) = &program.version {
            self.flush_comments(version.span.start.offset);
            self.writeln(&format!("OPENQASM {};", version.number));
        }

        for stmt in &program.statements {
            self.emit_statement(stmt);
        }

        self.flush_comments(usize::MAX);
    }

    /// Write every pending comment that starts before `offset`.
    fn flush_comments(&mut self, offset: usize) {
        while let Some(comment) = self.comments.next_if(|c| c.span.start.offset < offset) {
            self.writeln(&comment.text);
        }
    }

    /// Drop pending comments that start inside `span`.
    fn skip_comments(&mut self, span: Span) {
        while self
            .comments
            .next_if(|c| span.contains(c.span.start.offset))
            .is_some()
        {}
    }

    fn emit_statement(&mut self, stmt: &Statement) {
        let span = stmt.span();
        self.flush_comments(span.start.offset);

        match stmt {
            Statement::Include(inc) => self.writeln(&format!("include \"{}\";", inc.path)),
            Statement::QuantumDeclaration(decl) => {
                let line = quantum_declaration(decl);
                self.writeln(&line);
            }
            Statement::ClassicalDeclaration(decl) => {
                let line = classical_declaration(decl);
                self.writeln(&line);
            }
            Statement::GateCall(call) => {
                let line = gate_call(call);
                self.writeln(&line);
            }
            Statement::Measurement(m) => {
                let source = expression(&m.source);
                match &m.target {
                    Some(target) => {
                        self.writeln(&format!("{} = measure {source};", expression(target)));
                    }
                    None => self.writeln(&format!("measure {source};")),
                }
            }
            Statement::Reset(r) => self.writeln(&format!("reset {};", expression(&r.operand))),
            Statement::Barrier(b) => {
                if b.operands.is_empty() {
                    self.writeln("barrier;");
                } else {
                    self.writeln(&format!("barrier {};", expression_list(&b.operands)));
                }
            }
            Statement::Assignment(a) => {
                self.writeln(&format!(
                    "{} {} {};",
                    expression(&a.target),
                    a.op.symbol(),
                    expression(&a.value)
                ));
            }
            Statement::GateDefinition(def) => self.emit_gate_definition(def),
            Statement::Opaque(opaque) => {
                // Comments inside the construct are part of its text.
                self.skip_comments(span);
                self.writeln(&opaque.text);
            }
            Statement::Unrecognized(_) => {
                self.skip_comments(span);
                self.writeln(&format!("// unrecognized input at {}", span.start));
            }
        }
    }

    fn emit_gate_definition(&mut self, def: &GateDefinition) {
        let mut header = format!("gate {}", def.name);
        if !def.params.is_empty() {
            header.push_str(&format!("({})", def.params.join(", ")));
        }
        header.push_str(&format!(" {} {{", def.qubits.join(", ")));
        self.writeln(&header);

        self.indent += 1;
        for stmt in &def.body {
            self.emit_statement(stmt);
        }
        self.indent -= 1;

        self.writeln("}");
    }

    fn writeln(&mut self, line: &str) {
        for _ in 0..self.indent {
            self.output.push_str("    ");
        }
        self.output.push_str(line);
        self.output.push('\n');
    }
}

fn quantum_declaration(decl: &QuantumDeclaration) -> String {
    match (&decl.size, decl.type_name.as_str()) {
        (Some(size), "qreg") => format!("qreg {}[{}];", decl.name, expression(size)),
        (Some(size), ty) => format!("{ty}[{}] {};", expression(size), decl.name),
        (None, ty) => format!("{ty} {};", decl.name),
    }
}

fn classical_declaration(decl: &ClassicalDeclaration) -> String {
    let mut line = String::new();
    if let Some(modifier) = decl.modifier {
        line.push_str(modifier.as_str());
        line.push(' ');
    }

    match (&decl.size, decl.type_name.as_str()) {
        (Some(size), "creg") => line.push_str(&format!("creg {}[{}]", decl.name, expression(size))),
        (Some(size), ty) => line.push_str(&format!("{ty}[{}] {}", expression(size), decl.name)),
        (None, ty) => line.push_str(&format!("{ty} {}", decl.name)),
    }

    if let Some(init) = &decl.initializer {
        line.push_str(&format!(" = {}", expression(init)));
    }
    line.push(';');
    line
}

fn gate_call(call: &GateCall) -> String {
    let mut line = String::new();
    for modifier in &call.modifiers {
        line.push_str(modifier.kind.as_str());
        if let Some(arg) = &modifier.argument {
            line.push_str(&format!("({})", expression(arg)));
        }
        line.push_str(" @ ");
    }

    line.push_str(&call.name);
    if !call.parameters.is_empty() {
        line.push_str(&format!("({})", expression_list(&call.parameters)));
    }
    if !call.operands.is_empty() {
        line.push(' ');
        line.push_str(&expression_list(&call.operands));
    }
    line.push(';');
    line
}

fn expression_list(exprs: &[Expression]) -> String {
    exprs.iter().map(expression).collect::<Vec<_>>().join(", ")
}

/// Render an expression with the minimum parentheses needed to reparse it.
fn expression(expr: &Expression) -> String {
    match expr {
        Expression::Int(lit) => lit.value.to_string(),
        // Debug formatting always keeps a decimal point or exponent.
        Expression::Float(lit) => format!("{:?}", lit.value),
        Expression::Bool(lit) => lit.value.to_string(),
        Expression::Constant(c) => c.constant.as_str().to_string(),
        Expression::Identifier(id) => id.name.clone(),
        Expression::HardwareQubit(q) => format!("${}", q.index),
        Expression::Unary(u) => {
            let operand = expression(&u.operand);
            match u.operand.as_ref() {
                Expression::Binary(b) if b.op.precedence() < UnaryOp::PRECEDENCE => {
                    format!("{}({operand})", u.op.symbol())
                }
                _ => format!("{}{operand}", u.op.symbol()),
            }
        }
        Expression::Binary(b) => binary(b),
        Expression::Index(ix) => {
            let base = expression(&ix.base);
            let base = match ix.base.as_ref() {
                Expression::Binary(_) | Expression::Unary(_) | Expression::Measure(_) => {
                    format!("({base})")
                }
                _ => base,
            };
            let index = match ix.index.as_ref() {
                Expression::Range(r) => range(r),
                other => expression(other),
            };
            format!("{base}[{index}]")
        }
        Expression::Range(r) => range(r),
        Expression::Call(call) => format!("{}({})", call.name, expression_list(&call.args)),
        Expression::Measure(m) => format!("measure {}", expression(&m.operand)),
    }
}

fn binary(b: &BinaryExpression) -> String {
    let prec = b.op.precedence();

    let lhs = expression(&b.lhs);
    let lhs_needs_parens = match b.lhs.as_ref() {
        Expression::Binary(inner) => {
            let inner_prec = inner.op.precedence();
            inner_prec < prec || (inner_prec == prec && b.op.is_right_assoc())
        }
        // `-a ** b` reads as `-(a ** b)`.
        Expression::Unary(_) => prec > UnaryOp::PRECEDENCE,
        _ => false,
    };

    let rhs = expression(&b.rhs);
    let rhs_needs_parens = match b.rhs.as_ref() {
        Expression::Binary(inner) => {
            let inner_prec = inner.op.precedence();
            inner_prec < prec || (inner_prec == prec && !b.op.is_right_assoc())
        }
        _ => false,
    };

    let lhs = if lhs_needs_parens { format!("({lhs})") } else { lhs };
    let rhs = if rhs_needs_parens { format!("({rhs})") } else { rhs };
    format!("{lhs} {} {rhs}", b.op.symbol())
}

fn range(r: &RangeExpression) -> String {
    let part = |e: &Option<Box<Expression>>| e.as_deref().map(expression).unwrap_or_default();
    match &r.step {
        Some(step) => format!("{}:{}:{}", part(&r.start), expression(step), part(&r.end)),
        None => format!("{}:{}", part(&r.start), part(&r.end)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::QasmParser;

    fn roundtrip(source: &str) -> String {
        emit(&QasmParser::new().parse_str(source).unwrap())
    }

    #[test]
    fn test_emit_bell() {
        let source = "OPENQASM 3.0;\ninclude \"stdgates.inc\";\nqubit[2] q;\nbit[2] c;\n\
                      h q[0];\ncx q[0], q[1];\nc = measure q;\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn test_emit_legacy_declarations() {
        let source = "qreg q[2];\ncreg c[2];\nmeasure q[0] -> c[0];\n";
        assert_eq!(
            roundtrip(source),
            "qreg q[2];\ncreg c[2];\nc[0] = measure q[0];\n"
        );
    }

    #[test]
    fn test_emit_modifiers_and_declarations() {
        let source = "const int[32] n = 4;\ninv @ ctrl(2) @ pow(0.5) @ x q[0], q[1], q[2];\n\
                      gphase(pi);\nbarrier;\nreset $1;\nc[0] += 1;\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn test_emit_gate_definition_indents_body() {
        let source = "gate rzz(theta) a, b { cx a, b; rz(theta) b; cx a, b; }";
        assert_eq!(
            roundtrip(source),
            "gate rzz(theta) a, b {\n    cx a, b;\n    rz(theta) b;\n    cx a, b;\n}\n"
        );
    }

    #[test]
    fn test_emit_minimal_parentheses() {
        let cases = [
            ("x = (1 + 2) * 3;", "x = (1 + 2) * 3;\n"),
            ("x = 1 + (2 * 3);", "x = 1 + 2 * 3;\n"),
            ("x = 8 - (4 - 2);", "x = 8 - (4 - 2);\n"),
            ("x = (2 ** 3) ** 2;", "x = (2 ** 3) ** 2;\n"),
            ("x = 2 ** 3 ** 2;", "x = 2 ** 3 ** 2;\n"),
            ("x = -(1 + 2);", "x = -(1 + 2);\n"),
            ("x = (-2) ** 2;", "x = (-2) ** 2;\n"),
            ("x = -2 ** 2;", "x = -2 ** 2;\n"),
        ];
        for (source, expected) in cases {
            assert_eq!(roundtrip(source), expected, "source: {source}");
        }
    }

    #[test]
    fn test_emit_floats_stay_floats() {
        assert_eq!(roundtrip("x = 1.;"), "x = 1.0;\n");
        assert_eq!(roundtrip("x = .5;"), "x = 0.5;\n");
        assert_eq!(roundtrip("x = 2e3;"), "x = 2000.0;\n");
    }

    #[test]
    fn test_emit_ranges() {
        assert_eq!(roundtrip("h q[0:2];"), "h q[0:2];\n");
        assert_eq!(roundtrip("h q[:];"), "h q[:];\n");
        assert_eq!(roundtrip("h q[0:2:];"), "h q[0:2:];\n");
    }

    #[test]
    fn test_emit_keeps_comments_in_place() {
        let source = "// header\nqubit q;\n/* before h */\nh q; // trailing\nx q;\n// end\n";
        assert_eq!(
            roundtrip(source),
            "// header\nqubit q;\n/* before h */\nh q;\n// trailing\nx q;\n// end\n"
        );
    }

    #[test]
    fn test_emit_opaque_verbatim() {
        let source = "if (c == 1) {\n  x q; // flip\n} else { h q; }\nreset q;\n";
        assert_eq!(
            roundtrip(source),
            "if (c == 1) {\n  x q; // flip\n} else { h q; }\nreset q;\n"
        );
    }

    #[test]
    fn test_emit_is_idempotent() {
        let source = "OPENQASM 3.0;\nqubit[3]q;gate g(a,b) x,y{rx(a*(b+1)) x;cx x,y;}\n\
                      g(pi/2, -tau) q[0], q[1];";
        let once = roundtrip(source);
        assert_eq!(roundtrip(&once), once);
    }
}
