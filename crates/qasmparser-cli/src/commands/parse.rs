//! Parse command implementation.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use console::style;
use qasmparser::ParseResult;
use serde::Serialize;
use tracing::info;

use super::common::{OutputFormat, Session, check_failures, display_name, read_source};

/// One entry of the JSON report.
#[derive(Serialize)]
struct FileReport {
    filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_result: Option<ParseResult>,
}

/// Execute the parse command.
pub fn execute(session: &mut Session, files: &[PathBuf], errors_only: bool) -> Result<()> {
    let mut reports = Vec::with_capacity(files.len());
    let mut failed = 0;

    for path in files {
        let filename = display_name(path);
        info!(file = %filename, "parsing");

        let report = match read_source(path) {
            Ok(source) => FileReport {
                filename,
                error: None,
                parse_result: Some(session.parser.parse_with_diagnostics(&source)),
            },
            Err(e) => FileReport {
                filename,
                error: Some(format!("{e:#}")),
                parse_result: None,
            },
        };

        let ok = report.error.is_none()
            && report.parse_result.as_ref().is_some_and(|r| !r.has_errors());
        if !ok {
            failed += 1;
        }
        if ok && errors_only {
            continue;
        }

        if session.format == OutputFormat::Json {
            reports.push(report);
        } else {
            write_text(session.out(), &report)?;
        }
    }

    if session.format == OutputFormat::Json {
        session.write_json(&reports)?;
    }

    check_failures(failed, files.len())
}

fn write_text(out: &mut dyn Write, report: &FileReport) -> Result<()> {
    if let Some(error) = &report.error {
        writeln!(out, "{} {}: {error}", style("✗").red().bold(), report.filename)?;
        return Ok(());
    }
    let Some(result) = &report.parse_result else {
        return Ok(());
    };

    let program = result.program();
    if result.has_errors() {
        writeln!(
            out,
            "{} {}: {} error(s)",
            style("✗").red().bold(),
            report.filename,
            result.diagnostics().len()
        )?;
        for (i, message) in result.error_messages().iter().enumerate() {
            writeln!(out, "  {}. {message}", i + 1)?;
        }
    } else {
        writeln!(
            out,
            "{} {}: {} statement(s), version {}, {} comment(s)",
            style("✓").green().bold(),
            report.filename,
            program.statements.len(),
            style(program.version_number().unwrap_or("none")).yellow(),
            program.comments.len()
        )?;
    }
    Ok(())
}
