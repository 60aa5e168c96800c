//! Stats command implementation.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use console::style;
use qasmparser::ast::{
    Barrier, ClassicalDeclaration, Comment, GateCall, Include, MeasureExpression, Measurement,
    QuantumDeclaration, Reset,
};
use qasmparser::{DepthFirst, Expression, Node, Program, Visitor, walk};
use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::info;

use super::common::{OutputFormat, Session, check_failures, display_name, read_source};

/// Program statistics.
#[derive(Debug, Default, Serialize, PartialEq)]
pub struct Stats {
    pub total_statements: usize,
    pub quantum_declarations: usize,
    pub classical_declarations: usize,
    pub gate_calls: usize,
    pub measurements: usize,
    pub includes: usize,
    pub comments: usize,
    /// Gate names in order of first use.
    pub unique_gates: Vec<String>,
    /// Highest literal qubit index used as an operand.
    pub max_qubit_index: Option<u64>,
    pub version: Option<String>,
}

/// Visitor that accumulates [`Stats`]; run it under [`DepthFirst`].
#[derive(Default)]
struct StatsCollector {
    stats: Stats,
    seen_gates: FxHashSet<String>,
}

impl StatsCollector {
    fn note_operand(&mut self, operand: &Expression) {
        let index = match operand {
            Expression::HardwareQubit(q) => Some(q.index),
            Expression::Index(ix) => ix.index.as_int(),
            _ => None,
        };
        if let Some(index) = index {
            self.stats.max_qubit_index = self.stats.max_qubit_index.max(Some(index));
        }
    }
}

impl Visitor for StatsCollector {
    type Output = ();

    fn visit_program(&mut self, node: &Program) {
        self.stats.total_statements = node.statements.len();
        self.stats.version = node.version_number().map(str::to_string);
    }

    fn visit_comment(&mut self, _node: &Comment) {
        self.stats.comments += 1;
    }

    fn visit_include(&mut self, _node: &Include) {
        self.stats.includes += 1;
    }

    fn visit_quantum_declaration(&mut self, _node: &QuantumDeclaration) {
        self.stats.quantum_declarations += 1;
    }

    fn visit_classical_declaration(&mut self, _node: &ClassicalDeclaration) {
        self.stats.classical_declarations += 1;
    }

    fn visit_gate_call(&mut self, node: &GateCall) {
        self.stats.gate_calls += 1;
        if self.seen_gates.insert(node.name.clone()) {
            self.stats.unique_gates.push(node.name.clone());
        }
        for operand in &node.operands {
            self.note_operand(operand);
        }
    }

    fn visit_measurement(&mut self, node: &Measurement) {
        self.stats.measurements += 1;
        self.note_operand(&node.source);
    }

    fn visit_measure_expression(&mut self, node: &MeasureExpression) {
        self.stats.measurements += 1;
        self.note_operand(&node.operand);
    }

    fn visit_reset(&mut self, node: &Reset) {
        self.note_operand(&node.operand);
    }

    fn visit_barrier(&mut self, node: &Barrier) {
        for operand in &node.operands {
            self.note_operand(operand);
        }
    }
}

/// Gather statistics for a whole program.
pub fn collect(program: &Program) -> Stats {
    let mut visitor = DepthFirst::new(StatsCollector::default());
    walk(&mut visitor, Some(Node::from(program)));
    visitor.into_inner().stats
}

#[derive(Serialize)]
struct FileStats {
    filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    errors: usize,
    #[serde(flatten)]
    stats: Option<Stats>,
}

/// Execute the stats command.
pub fn execute(session: &mut Session, files: &[PathBuf]) -> Result<()> {
    let mut reports = Vec::with_capacity(files.len());

    for path in files {
        let filename = display_name(path);
        info!(file = %filename, "collecting statistics");

        let report = match read_source(path) {
            Ok(source) => {
                let result = session.parser.parse_with_diagnostics(&source);
                FileStats {
                    filename,
                    error: None,
                    errors: result.diagnostics().len(),
                    stats: Some(collect(result.program())),
                }
            }
            Err(e) => FileStats {
                filename,
                error: Some(format!("{e:#}")),
                errors: 0,
                stats: None,
            },
        };
        reports.push(report);
    }

    if session.format == OutputFormat::Json {
        session.write_json(&reports)?;
    } else {
        let out = session.out();
        for report in &reports {
            write_text(out, report)?;
        }
    }

    let failed = reports
        .iter()
        .filter(|r| r.error.is_some() || r.errors > 0)
        .count();
    check_failures(failed, files.len())
}

fn write_text(out: &mut dyn Write, report: &FileStats) -> Result<()> {
    writeln!(out, "{} {}", style("Statistics for").bold(), style(&report.filename).green())?;
    if let Some(error) = &report.error {
        writeln!(out, "  {} {error}", style("✗").red().bold())?;
        return Ok(());
    }
    let Some(stats) = &report.stats else {
        return Ok(());
    };

    let version = stats.version.as_deref().unwrap_or("none");
    let max_index = stats
        .max_qubit_index
        .map_or_else(|| "none".to_string(), |i| i.to_string());
    let gates = if stats.unique_gates.is_empty() {
        "none".to_string()
    } else {
        stats.unique_gates.join(", ")
    };

    writeln!(out, "  Version:                {}", style(version).yellow())?;
    writeln!(out, "  Total statements:       {}", stats.total_statements)?;
    writeln!(out, "  Quantum declarations:   {}", stats.quantum_declarations)?;
    writeln!(out, "  Classical declarations: {}", stats.classical_declarations)?;
    writeln!(out, "  Gate calls:             {}", stats.gate_calls)?;
    writeln!(out, "  Measurements:           {}", stats.measurements)?;
    writeln!(out, "  Includes:               {}", stats.includes)?;
    writeln!(out, "  Comments:               {}", stats.comments)?;
    writeln!(out, "  Unique gates:           {gates}")?;
    writeln!(out, "  Max qubit index:        {max_index}")?;
    if report.errors > 0 {
        writeln!(out, "  {} {}", style("Errors:").red(), report.errors)?;
    }
    Ok(())
}
