//! `OpenQASM` 3 Parser
//!
//! This crate turns `OpenQASM` 3.0 source text into a typed abstract syntax tree
//! with exact source positions, collecting every lexical and syntax error it
//! finds instead of stopping at the first one.
//!
//! The pipeline has three stages, each usable on its own:
//!
//! 1. [`tokenize`] splits text into positioned tokens, setting comments aside.
//! 2. The grammar parser recognizes statements and resynchronizes after errors.
//! 3. The AST builder resolves tokens into the public [`Program`] tree.
//!
//! [`QasmParser`] runs all three with a given set of [`ParseOptions`].
//!
//! # Supported Statements
//!
//! | Statement | Example |
//! |-----------|---------|
//! | Version pragma | `OPENQASM 3.0;` |
//! | Include | `include "stdgates.inc";` |
//! | Qubit declarations | `qubit[5] q;`, `qreg q[5];` |
//! | Classical declarations | `bit[5] c;`, `const int[32] n = 4;` |
//! | Gate calls | `rx(pi/4) q[0];`, `ctrl @ x q[0], q[1];` |
//! | Measurements | `c = measure q;`, `measure q -> c;` |
//! | Reset / barrier | `reset q[0];`, `barrier q;` |
//! | Assignments | `c[0] += 1;` |
//! | Gate definitions | `gate bell a, b { h a; cx a, b; }` |
//! | Control flow, subroutines | kept as opaque text |
//!
//! # Example: Parsing QASM
//!
//! ```rust
//! use qasmparser::{parse, Statement};
//!
//! let qasm = r#"
//!     OPENQASM 3.0;
//!     qubit[2] q;
//!     bit[2] c;
//!     h q[0];
//!     cx q[0], q[1];
//!     c = measure q;
//! "#;
//!
//! let program = parse(qasm).unwrap();
//! assert_eq!(program.version_number(), Some("3.0"));
//! assert!(matches!(program.statements[0], Statement::QuantumDeclaration(_)));
//! ```
//!
//! # Example: Collecting Diagnostics
//!
//! ```rust
//! use qasmparser::QasmParser;
//!
//! let result = QasmParser::new().parse_with_diagnostics("qubit q\nh q;\n");
//! assert!(result.has_errors());
//!
//! let err = result.first_error().unwrap();
//! assert_eq!((err.line(), err.column()), (2, 1));
//!
//! // The statement after the error is still parsed.
//! assert_eq!(result.program().statements.len(), 2);
//! ```
//!
//! # Example: Round-Trip
//!
//! ```rust
//! use qasmparser::{emit, parse};
//!
//! let program = parse("qubit[3] q; h q[0]; cx q[0], q[1];").unwrap();
//! let emitted = emit(&program);
//! assert_eq!(emitted, "qubit[3] q;\nh q[0];\ncx q[0], q[1];\n");
//! assert_eq!(emit(&parse(&emitted).unwrap()), emitted);
//! ```

pub mod ast;
pub mod diagnostics;
mod emitter;
pub mod error;
mod frontend;
pub mod lexer;
pub mod options;
mod parser;
pub mod span;
pub mod visit;

pub use ast::{Expression, NodeKind, Program, Statement};
pub use emitter::emit;
pub use error::{Error, ErrorKind, ParseError, Result};
pub use frontend::{parse, validate, ParseResult, QasmParser};
pub use lexer::{normalize, tokenize, Token};
pub use options::ParseOptions;
pub use span::{Position, Span};
pub use visit::{walk, BaseVisitor, DepthFirst, Node, Visitor};
