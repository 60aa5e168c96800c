//! Format command implementation.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use console::style;
use qasmparser::emit;
use serde::Serialize;
use tracing::{info, warn};

use super::common::{OutputFormat, Session, check_failures, display_name, read_source};

#[derive(Serialize)]
struct Formatted {
    filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    formatted: Option<String>,
}

/// Execute the format command.
///
/// Files with diagnostics are left alone; the output would drop whatever
/// could not be parsed.
pub fn execute(session: &mut Session, files: &[PathBuf]) -> Result<()> {
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let filename = display_name(path);
        info!(file = %filename, "formatting");

        let result = match read_source(path) {
            Ok(source) => {
                let parsed = session.parser.parse_with_diagnostics(&source);
                match parsed.first_error() {
                    Some(first) => {
                        let errors = parsed.diagnostics().len();
                        warn!(file = %filename, errors, "not formatting");
                        Formatted {
                            filename,
                            error: Some(format!(
                                "refusing to format, {errors} error(s); first: {first}"
                            )),
                            formatted: None,
                        }
                    }
                    None => Formatted {
                        filename,
                        error: None,
                        formatted: Some(emit(parsed.program())),
                    },
                }
            }
            Err(e) => Formatted {
                filename,
                error: Some(format!("{e:#}")),
                formatted: None,
            },
        };
        results.push(result);
    }

    if session.format == OutputFormat::Json {
        session.write_json(&results)?;
    } else {
        let out = session.out();
        for result in &results {
            match (&result.formatted, &result.error) {
                (Some(text), _) => write!(out, "{text}")?,
                (None, Some(error)) => {
                    eprintln!("{} {}: {error}", style("✗").red().bold(), result.filename);
                }
                (None, None) => {}
            }
        }
    }

    let failed = results.iter().filter(|r| r.error.is_some()).count();
    check_failures(failed, files.len())
}
