//! Validate command implementation.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use console::style;
use serde::Serialize;
use tracing::info;

use super::common::{OutputFormat, Session, check_failures, display_name, read_source};

#[derive(Serialize)]
struct Validation {
    filename: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Execute the validate command.
pub fn execute(session: &mut Session, files: &[PathBuf]) -> Result<()> {
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let filename = display_name(path);
        info!(file = %filename, "validating");

        let error = match read_source(path) {
            Ok(source) => session.parser.validate(&source).err().map(|e| e.to_string()),
            Err(e) => Some(format!("{e:#}")),
        };
        results.push(Validation {
            filename,
            valid: error.is_none(),
            error,
        });
    }

    if session.format == OutputFormat::Json {
        session.write_json(&results)?;
    } else {
        let verbose = session.verbose > 0;
        let out = session.out();
        for v in &results {
            match &v.error {
                Some(error) => writeln!(out, "{}: {}", v.filename, style(error).red())?,
                None if verbose => {
                    writeln!(out, "{}: {}", v.filename, style("✓ valid").green())?;
                }
                None => {}
            }
        }
    }

    let failed = results.iter().filter(|v| !v.valid).count();
    check_failures(failed, files.len())
}
