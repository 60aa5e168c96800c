//! AST command implementation.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use console::style;
use qasmparser::{Node, ParseError, Program};
use serde::Serialize;
use tracing::info;

use super::common::{OutputFormat, Session, check_failures, display_name, read_source};

/// Children shown per node in compact mode.
const COMPACT_LIMIT: usize = 10;

#[derive(Serialize)]
struct AstReport {
    filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    program: Option<Program>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<ParseError>,
}

/// Execute the ast command.
pub fn execute(
    session: &mut Session,
    files: &[PathBuf],
    depth: Option<usize>,
    compact: bool,
) -> Result<()> {
    let renderer = Renderer {
        tree: session.format == OutputFormat::Tree,
        max_depth: depth,
        compact,
    };
    let mut reports = Vec::with_capacity(files.len());
    let mut failed = 0;

    for path in files {
        let filename = display_name(path);
        info!(file = %filename, "building AST");

        let report = match read_source(path) {
            Ok(source) => {
                let (program, diagnostics) =
                    session.parser.parse_with_diagnostics(&source).into_parts();
                AstReport {
                    filename,
                    error: None,
                    program: Some(program),
                    diagnostics,
                }
            }
            Err(e) => AstReport {
                filename,
                error: Some(format!("{e:#}")),
                program: None,
                diagnostics: Vec::new(),
            },
        };
        if report.error.is_some() || !report.diagnostics.is_empty() {
            failed += 1;
        }

        if session.format == OutputFormat::Json {
            reports.push(report);
            continue;
        }

        let out = session.out();
        if files.len() > 1 {
            writeln!(out, "{}:", style(&report.filename).bold())?;
        }
        if let Some(error) = &report.error {
            writeln!(out, "{} {error}", style("✗").red().bold())?;
            continue;
        }
        if let Some(program) = &report.program {
            renderer.render(out, Node::from(program))?;
        }
        for diag in &report.diagnostics {
            writeln!(out, "{} {diag}", style("error:").red().bold())?;
        }
    }

    if session.format == OutputFormat::Json {
        session.write_json(&reports)?;
    }

    check_failures(failed, files.len())
}

/// Writes a node and its descendants, one per line.
struct Renderer {
    /// Box-drawing connectors instead of plain indentation.
    tree: bool,
    max_depth: Option<usize>,
    compact: bool,
}

impl Renderer {
    fn render(&self, out: &mut dyn Write, root: Node<'_>) -> io::Result<()> {
        writeln!(out, "{}", label(root))?;
        self.render_children(out, root, 1, "")
    }

    fn render_children(
        &self,
        out: &mut dyn Write,
        node: Node<'_>,
        depth: usize,
        prefix: &str,
    ) -> io::Result<()> {
        if self.max_depth.is_some_and(|max| depth > max) {
            return Ok(());
        }

        let children = node.children();
        let shown = if self.compact {
            children.len().min(COMPACT_LIMIT)
        } else {
            children.len()
        };
        let elided = children.len() - shown;

        for (i, child) in children.iter().take(shown).enumerate() {
            let last = i + 1 == shown && elided == 0;
            let (branch, continuation) = self.connectors(last);
            writeln!(out, "{prefix}{branch}{}", label(*child))?;
            self.render_children(out, *child, depth + 1, &format!("{prefix}{continuation}"))?;
        }

        if elided > 0 {
            let (branch, _) = self.connectors(true);
            writeln!(out, "{prefix}{branch}{}", style(format!("... {elided} more")).dim())?;
        }
        Ok(())
    }

    fn connectors(&self, last: bool) -> (&'static str, &'static str) {
        match (self.tree, last) {
            (true, true) => ("└── ", "    "),
            (true, false) => ("├── ", "│   "),
            (false, _) => ("  ", "  "),
        }
    }
}

fn label(node: Node<'_>) -> String {
    format!("{node} {}", style(format!("[{}]", node.span())).dim())
}
