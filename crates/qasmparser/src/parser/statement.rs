//! Statement parsing for QASM3.

use super::tree::{ExprNode, ModifierNode, StmtNode};
use super::{Parser, SyntaxResult};
use crate::ast::{AssignOp, DeclarationModifier, ModifierKind, OpaqueKind};
use crate::error::ParseError;
use crate::lexer::Token;

impl Parser<'_, '_, '_> {
    /// Parse a statement.
    pub(super) fn parse_statement(&mut self) -> SyntaxResult<StmtNode> {
        match self.peek() {
            Token::OpenQasm => self.parse_version(),
            Token::Include => self.parse_include(),
            Token::Qubit => self.parse_qubit_decl(),
            Token::QReg => self.parse_qreg_decl(),
            Token::CReg => self.parse_creg_decl(None),
            Token::Const | Token::Input | Token::Output => self.parse_modified_decl(),
            t if t.is_classical_type() => self.parse_classical_decl(None),
            Token::Measure => self.parse_measure(),
            Token::Reset => self.parse_reset(),
            Token::Barrier => self.parse_barrier(),
            Token::Gate => self.parse_gate_def(),
            Token::If => self.parse_opaque(OpaqueKind::If),
            Token::For => self.parse_opaque(OpaqueKind::For),
            Token::While => self.parse_opaque(OpaqueKind::While),
            Token::Def => self.parse_opaque(OpaqueKind::Def),
            Token::Return => self.parse_opaque(OpaqueKind::Return),
            Token::Break => self.parse_opaque(OpaqueKind::Break),
            Token::Continue => self.parse_opaque(OpaqueKind::Continue),
            Token::End => self.parse_opaque(OpaqueKind::End),
            Token::Inv | Token::Pow | Token::Ctrl | Token::NegCtrl => self.parse_gate_call(),
            Token::Identifier => self.parse_identifier_statement(),
            Token::Else => Err(ParseError::syntax(
                "'else' without a matching 'if'",
                self.current().span,
            )),
            _ => Err(self.unexpected("statement")),
        }
    }

    /// Parse `OPENQASM <version>;`.
    fn parse_version(&mut self) -> SyntaxResult<StmtNode> {
        let start = self.expect(&Token::OpenQasm)?;
        let number = match self.peek() {
            Token::FloatLiteral(_) | Token::IntLiteral(_) => self.advance(),
            _ => return Err(self.unexpected("version number")),
        };
        self.expect_terminator()?;
        let range = self.range_from(start);

        if self.seen_statement || self.in_block() {
            self.report(
                ParseError::syntax(
                    "version pragma must be the first statement",
                    self.span_of(start),
                )
                .with_context("version pragma"),
            );
            return Ok(StmtNode::Skipped { range });
        }

        if self.strict {
            let text = self.tokens[number].text;
            let major = text.split('.').next().and_then(|m| m.parse::<u32>().ok());
            if major != Some(3) {
                self.report_strict(number, &format!("unsupported OpenQASM version '{text}'"));
            }
        }

        Ok(StmtNode::Version { number, range })
    }

    /// Parse `include "path";`.
    fn parse_include(&mut self) -> SyntaxResult<StmtNode> {
        let start = self.expect(&Token::Include)?;
        let path = self.expect(&Token::StringLiteral)?;
        self.expect_terminator()?;
        Ok(StmtNode::Include {
            path,
            range: self.range_from(start),
        })
    }

    /// Parse `qubit[size]? name;`.
    fn parse_qubit_decl(&mut self) -> SyntaxResult<StmtNode> {
        let keyword = self.expect(&Token::Qubit)?;
        let size = self.parse_designator()?;
        let name = self.expect_identifier()?;
        self.expect_terminator()?;
        Ok(StmtNode::QuantumDecl {
            keyword,
            name,
            size,
            range: self.range_from(keyword),
        })
    }

    /// Parse `qreg name[size]?;`.
    fn parse_qreg_decl(&mut self) -> SyntaxResult<StmtNode> {
        let keyword = self.expect(&Token::QReg)?;
        let name = self.expect_identifier()?;
        let size = self.parse_designator()?;
        self.expect_terminator()?;
        if self.strict {
            self.report_strict(keyword, "'qreg' is OpenQASM 2 syntax; use 'qubit[n]'");
        }
        Ok(StmtNode::QuantumDecl {
            keyword,
            name,
            size,
            range: self.range_from(keyword),
        })
    }

    /// Parse `creg name[size]?;`, optionally after a declaration modifier.
    fn parse_creg_decl(
        &mut self,
        modifier: Option<(DeclarationModifier, usize)>,
    ) -> SyntaxResult<StmtNode> {
        let keyword = self.expect(&Token::CReg)?;
        let name = self.expect_identifier()?;
        let size = self.parse_designator()?;
        self.expect_terminator()?;
        if self.strict {
            self.report_strict(keyword, "'creg' is OpenQASM 2 syntax; use 'bit[n]'");
        }
        Ok(StmtNode::ClassicalDecl {
            modifier: modifier.map(|(m, _)| m),
            keyword,
            name,
            size,
            init: None,
            range: self.range_from(modifier.map_or(keyword, |(_, i)| i)),
        })
    }

    /// Parse a declaration starting with `const`, `input` or `output`.
    fn parse_modified_decl(&mut self) -> SyntaxResult<StmtNode> {
        let modifier = match self.peek() {
            Token::Const => DeclarationModifier::Const,
            Token::Input => DeclarationModifier::Input,
            _ => DeclarationModifier::Output,
        };
        let index = self.advance();

        if self.check(&Token::CReg) {
            self.parse_creg_decl(Some((modifier, index)))
        } else if self.peek().is_classical_type() {
            self.parse_classical_decl(Some((modifier, index)))
        } else {
            Err(self.unexpected("classical type"))
        }
    }

    /// Parse `type[size]? name (= expr)?;`.
    fn parse_classical_decl(
        &mut self,
        modifier: Option<(DeclarationModifier, usize)>,
    ) -> SyntaxResult<StmtNode> {
        if !self.peek().is_classical_type() {
            return Err(self.unexpected("classical type"));
        }
        let keyword = self.advance();
        let size = self.parse_designator()?;
        let name = self.expect_identifier()?;
        let init = if self.consume(&Token::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect_terminator()?;
        Ok(StmtNode::ClassicalDecl {
            modifier: modifier.map(|(m, _)| m),
            keyword,
            name,
            size,
            init,
            range: self.range_from(modifier.map_or(keyword, |(_, i)| i)),
        })
    }

    /// Parse an optional `[expr]` size designator.
    fn parse_designator(&mut self) -> SyntaxResult<Option<ExprNode>> {
        if !self.consume(&Token::LBracket) {
            return Ok(None);
        }
        let size = self.parse_expression()?;
        self.expect(&Token::RBracket)?;
        Ok(Some(size))
    }

    /// Parse `measure q -> c;` or `measure q;`.
    fn parse_measure(&mut self) -> SyntaxResult<StmtNode> {
        let start = self.expect(&Token::Measure)?;
        let source = self.parse_operand()?;

        let mut arrow = None;
        let target = if self.check(&Token::Arrow) {
            arrow = Some(self.advance());
            Some(self.parse_operand()?)
        } else {
            None
        };
        self.expect_terminator()?;

        if let (true, Some(arrow)) = (self.strict, arrow) {
            self.report_strict(
                arrow,
                "arrow measurement is OpenQASM 2 syntax; use 'c = measure q'",
            );
        }
        Ok(StmtNode::Measure {
            source,
            target,
            range: self.range_from(start),
        })
    }

    /// Parse `reset q;`.
    fn parse_reset(&mut self) -> SyntaxResult<StmtNode> {
        let start = self.expect(&Token::Reset)?;
        let operand = self.parse_operand()?;
        self.expect_terminator()?;
        Ok(StmtNode::Reset {
            operand,
            range: self.range_from(start),
        })
    }

    /// Parse `barrier q, r;` or `barrier;`.
    fn parse_barrier(&mut self) -> SyntaxResult<StmtNode> {
        let start = self.expect(&Token::Barrier)?;
        let operands = if self.check(&Token::Semicolon) {
            vec![]
        } else {
            self.parse_operand_list()?
        };
        self.expect_terminator()?;
        Ok(StmtNode::Barrier {
            operands,
            range: self.range_from(start),
        })
    }

    /// Parse gate definition.
    fn parse_gate_def(&mut self) -> SyntaxResult<StmtNode> {
        let start = self.expect(&Token::Gate)?;
        let name = self.expect_identifier()?;

        // Parse parameters
        let params = if self.consume(&Token::LParen) {
            let p = if self.check(&Token::RParen) {
                vec![]
            } else {
                self.parse_identifier_list()?
            };
            self.expect(&Token::RParen)?;
            p
        } else {
            vec![]
        };

        // Parse qubits
        let qubits = self.parse_identifier_list()?;

        let body = self.parse_block()?;

        Ok(StmtNode::GateDef {
            name,
            params,
            qubits,
            body,
            range: self.range_from(start),
        })
    }

    /// Skip a control-flow or subroutine construct as a unit.
    ///
    /// The construct ends at a `;` or a `{ }` block outside any brackets; for
    /// `if`, an `else` directly after either continues it.
    fn parse_opaque(&mut self, kind: OpaqueKind) -> SyntaxResult<StmtNode> {
        let start = self.advance();
        let chains_else = kind == OpaqueKind::If;

        loop {
            match self.peek() {
                Token::Eof => return Err(self.unexpected("';' or '{'")),
                Token::Semicolon => {
                    self.advance();
                    if !(chains_else && self.consume(&Token::Else)) {
                        break;
                    }
                }
                Token::LBrace => {
                    self.skip_balanced();
                    if !(chains_else && self.consume(&Token::Else)) {
                        break;
                    }
                }
                Token::LParen | Token::LBracket => self.skip_balanced(),
                Token::RBrace => return Err(self.unexpected("';' or '{'")),
                _ => {
                    self.advance();
                }
            }
        }

        Ok(StmtNode::Opaque {
            kind,
            range: self.range_from(start),
        })
    }

    /// Parse statement starting with identifier (gate call, assignment or measurement).
    fn parse_identifier_statement(&mut self) -> SyntaxResult<StmtNode> {
        match self.peek_nth(1) {
            Token::LBracket
            | Token::Eq
            | Token::PlusEq
            | Token::MinusEq
            | Token::StarEq
            | Token::SlashEq => self.parse_assignment(),
            _ => self.parse_gate_call(),
        }
    }

    /// Parse `target op value;`; `target = measure q;` becomes a measurement.
    fn parse_assignment(&mut self) -> SyntaxResult<StmtNode> {
        let start = self.pos;
        let target = self.parse_operand()?;

        let op = match self.peek() {
            Token::Eq => AssignOp::Assign,
            Token::PlusEq => AssignOp::AddAssign,
            Token::MinusEq => AssignOp::SubAssign,
            Token::StarEq => AssignOp::MulAssign,
            Token::SlashEq => AssignOp::DivAssign,
            _ => return Err(self.unexpected("assignment operator")),
        };
        self.advance();

        if op == AssignOp::Assign && self.consume(&Token::Measure) {
            let source = self.parse_operand()?;
            self.expect_terminator()?;
            return Ok(StmtNode::Measure {
                source,
                target: Some(target),
                range: self.range_from(start),
            });
        }

        let value = self.parse_expression()?;
        self.expect_terminator()?;
        Ok(StmtNode::Assign {
            target,
            op,
            value,
            range: self.range_from(start),
        })
    }

    /// Parse gate call with optional modifiers.
    fn parse_gate_call(&mut self) -> SyntaxResult<StmtNode> {
        let start = self.pos;

        let mut modifiers = Vec::new();
        while let Some(kind) = self.peek_modifier() {
            modifiers.push(self.parse_modifier(kind)?);
        }

        let name = self.expect_identifier()?;

        // Parse parameters
        let params = if self.consume(&Token::LParen) {
            let p = self.parse_expression_list(&Token::RParen)?;
            self.expect(&Token::RParen)?;
            p
        } else {
            vec![]
        };

        // Parse qubits; only the global phase gate may have none.
        let operands = if self.check(&Token::Semicolon) && self.tokens[name].text == "gphase" {
            vec![]
        } else if self.check(&Token::Semicolon) {
            return Err(self.unexpected("qubit operand"));
        } else {
            self.parse_operand_list()?
        };
        self.expect_terminator()?;

        Ok(StmtNode::GateCall {
            modifiers,
            name,
            params,
            operands,
            range: self.range_from(start),
        })
    }

    fn peek_modifier(&self) -> Option<ModifierKind> {
        match self.peek() {
            Token::Inv => Some(ModifierKind::Inv),
            Token::Pow => Some(ModifierKind::Pow),
            Token::Ctrl => Some(ModifierKind::Ctrl),
            Token::NegCtrl => Some(ModifierKind::NegCtrl),
            _ => None,
        }
    }

    /// Parse one `modifier(arg)? @`.
    fn parse_modifier(&mut self, kind: ModifierKind) -> SyntaxResult<ModifierNode> {
        let start = self.advance();

        let argument = if kind != ModifierKind::Inv && self.consume(&Token::LParen) {
            let arg = self.parse_expression()?;
            self.expect(&Token::RParen)?;
            Some(arg)
        } else if kind == ModifierKind::Pow {
            return Err(self.unexpected("'(' after 'pow'"));
        } else {
            None
        };
        let range = self.range_from(start);

        self.expect(&Token::At)?;
        Ok(ModifierNode {
            kind,
            argument,
            range,
        })
    }

    /// Parse a qubit or bit operand: `q`, `q[0]`, `q[0:2]`, `$1`.
    pub(super) fn parse_operand(&mut self) -> SyntaxResult<ExprNode> {
        match self.peek() {
            Token::Identifier | Token::HardwareQubit(_) => self.parse_postfix(),
            _ => Err(self.unexpected("qubit or bit operand")),
        }
    }

    fn parse_operand_list(&mut self) -> SyntaxResult<Vec<ExprNode>> {
        let mut operands = vec![self.parse_operand()?];
        while self.consume(&Token::Comma) {
            operands.push(self.parse_operand()?);
        }
        Ok(operands)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{AssignOp, ModifierKind, OpaqueKind, Statement};
    use crate::error::ErrorKind;
    use crate::frontend::QasmParser;
    use crate::options::ParseOptions;

    fn parse(source: &str) -> Vec<Statement> {
        QasmParser::new().parse_str(source).unwrap().statements
    }

    #[test]
    fn test_declarations() {
        let stmts = parse(
            "qubit q;\nqreg r[3];\nconst int[32] n = 4;\ncreg c[2];\ninput angle theta;\n",
        );
        assert_eq!(stmts.len(), 5);

        let Statement::QuantumDeclaration(q) = &stmts[1] else {
            panic!("expected quantum declaration");
        };
        assert_eq!(q.type_name, "qreg");
        assert_eq!(q.name, "r");
        assert_eq!(q.size.as_ref().and_then(|e| e.as_int()), Some(3));

        let Statement::ClassicalDeclaration(n) = &stmts[2] else {
            panic!("expected classical declaration");
        };
        assert_eq!(n.type_name, "int");
        assert_eq!(n.modifier.map(|m| m.as_str()), Some("const"));
        assert_eq!(n.initializer.as_ref().and_then(|e| e.as_int()), Some(4));
        assert_eq!(n.span.start.column, 1);

        let Statement::ClassicalDeclaration(c) = &stmts[3] else {
            panic!("expected classical declaration");
        };
        assert_eq!(c.type_name, "creg");
    }

    #[test]
    fn test_measure_forms() {
        let stmts = parse("measure q -> c;\nc[0] = measure q[0];\nmeasure q;\n");
        for stmt in &stmts {
            assert!(matches!(stmt, Statement::Measurement(_)), "{stmt:?}");
        }
        let Statement::Measurement(m) = &stmts[1] else {
            unreachable!()
        };
        assert_eq!(m.target.as_ref().and_then(|t| t.base_name()), Some("c"));
        let Statement::Measurement(bare) = &stmts[2] else {
            unreachable!()
        };
        assert!(bare.target.is_none());
    }

    #[test]
    fn test_gate_call_with_modifiers() {
        let stmts = parse("ctrl(2) @ inv @ pow(0.5) @ rx(pi/2) a, b, c;\n");
        let Statement::GateCall(call) = &stmts[0] else {
            panic!("expected gate call");
        };
        assert_eq!(call.name, "rx");
        let kinds: Vec<_> = call.modifiers.iter().map(|m| m.kind).collect();
        assert_eq!(kinds, [ModifierKind::Ctrl, ModifierKind::Inv, ModifierKind::Pow]);
        assert_eq!(call.modifiers[0].argument.as_ref().and_then(|e| e.as_int()), Some(2));
        assert_eq!(call.parameters.len(), 1);
        assert_eq!(call.operands.len(), 3);
    }

    #[test]
    fn test_gphase_without_operands() {
        let stmts = parse("gphase(pi);\n");
        let Statement::GateCall(call) = &stmts[0] else {
            panic!("expected gate call");
        };
        assert!(call.operands.is_empty());

        let result = QasmParser::new().parse_with_diagnostics("h;\n");
        assert_eq!(result.diagnostics().len(), 1);
    }

    #[test]
    fn test_assignment_ops() {
        let stmts = parse("x = 1;\ny[2] += x * 2;\n");
        let Statement::Assignment(second) = &stmts[1] else {
            panic!("expected assignment");
        };
        assert_eq!(second.op, AssignOp::AddAssign);
        assert_eq!(second.target.base_name(), Some("y"));
    }

    #[test]
    fn test_gate_definition() {
        let stmts = parse("gate cphase(theta) a, b {\n  ctrl @ phase(theta) a, b;\n}\n");
        let Statement::GateDefinition(def) = &stmts[0] else {
            panic!("expected gate definition");
        };
        assert_eq!(def.name, "cphase");
        assert_eq!(def.params, ["theta"]);
        assert_eq!(def.qubits, ["a", "b"]);
        assert_eq!(def.body.len(), 1);
        assert_eq!(def.span.end.line, 3);
    }

    #[test]
    fn test_opaque_control_flow() {
        let source = "if (c == 1) { x q; } else if (c == 2) { y q; } else { z q; }\n\
                      for int i in [0:3] { h q[i]; }\n\
                      while (n > 0) { n -= 1; }\n\
                      def f(qubit a) -> bit { return measure a; }\n\
                      h q;\n";
        let stmts = parse(source);
        let kinds: Vec<_> = stmts
            .iter()
            .filter_map(|s| match s {
                Statement::Opaque(o) => Some(o.kind),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            [OpaqueKind::If, OpaqueKind::For, OpaqueKind::While, OpaqueKind::Def]
        );
        assert!(matches!(stmts[4], Statement::GateCall(_)));

        let Statement::Opaque(first) = &stmts[0] else {
            unreachable!()
        };
        assert!(first.text.starts_with("if (c == 1)"));
        assert!(first.text.ends_with("{ z q; }"));
    }

    #[test]
    fn test_late_version_is_rejected() {
        let result = QasmParser::new().parse_with_diagnostics("qubit q;\nOPENQASM 3.0;\n");
        assert_eq!(result.diagnostics().len(), 1);
        assert!(result.program().version.is_none());
        assert!(matches!(result.program().statements[1], Statement::Unrecognized(_)));
    }

    #[test]
    fn test_strict_mode_flags_legacy_syntax() {
        let parser = QasmParser::with_options(ParseOptions::default().with_strict_mode(true));
        let result = parser
            .parse_with_diagnostics("OPENQASM 2.0;\nqreg q[1];\ncreg c[1];\nmeasure q -> c;\n");

        assert_eq!(result.diagnostics().len(), 4);
        for err in result.diagnostics() {
            assert_eq!(err.kind, ErrorKind::Syntax);
            assert_eq!(err.context.as_deref(), Some("strict mode"));
        }
        assert_eq!(result.program().statements.len(), 3);
        assert_eq!(result.program().version_number(), Some("2.0"));
    }

    #[test]
    fn test_strict_mode_malformed_legacy_statement_reports_once() {
        let parser = QasmParser::with_options(ParseOptions::default().with_strict_mode(true));
        let result = parser.parse_with_diagnostics("qreg 5;\ncreg c[;\nmeasure q -> 5;\n");

        let contexts: Vec<_> = result
            .diagnostics()
            .iter()
            .map(|e| e.context.as_deref())
            .collect();
        assert_eq!(
            contexts,
            [
                Some("quantum declaration"),
                Some("classical declaration"),
                Some("measurement"),
            ]
        );
    }

    #[test]
    fn test_missing_semicolon_same_line_is_skipped() {
        let result = QasmParser::new().parse_with_diagnostics("x q y;\nh q;\n");
        assert_eq!(result.diagnostics().len(), 1);
        let stmts = &result.program().statements;
        assert!(matches!(stmts[0], Statement::Unrecognized(_)));
        assert!(matches!(stmts[1], Statement::GateCall(_)));
    }
}
