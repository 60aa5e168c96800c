//! Shared helpers for CLI commands.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use qasmparser::QasmParser;
use serde::Serialize;

/// Output rendering selected with `--format`.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
    /// Box-drawing tree (`ast` only; text elsewhere)
    Tree,
}

/// State shared by every command: the configured parser and the output sink.
pub struct Session {
    pub parser: QasmParser,
    pub format: OutputFormat,
    pub verbose: u8,
    out: Box<dyn Write>,
}

impl Session {
    /// Create a session writing to `output`, or stdout when absent.
    pub fn new(
        parser: QasmParser,
        format: OutputFormat,
        verbose: u8,
        output: Option<&Path>,
    ) -> Result<Self> {
        let out: Box<dyn Write> = match output {
            Some(path) => {
                // Keep escape codes out of files.
                console::set_colors_enabled(false);
                let file = File::create(path)
                    .with_context(|| format!("Failed to create output file: {}", path.display()))?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(io::stdout().lock()),
        };

        Ok(Self {
            parser,
            format,
            verbose,
            out,
        })
    }

    /// The output sink.
    pub fn out(&mut self) -> &mut dyn Write {
        &mut self.out
    }

    /// Write `value` as pretty-printed JSON followed by a newline.
    pub fn write_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
        writeln!(self.out, "{json}")?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.out.flush().context("Failed to flush output")
    }
}

/// Read a source file.
pub fn read_source(path: &Path) -> Result<String> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Display form of a path for reports.
pub fn display_name(path: &Path) -> String {
    path.display().to_string()
}

/// Fail when any file in a batch had problems.
pub fn check_failures(failed: usize, total: usize) -> Result<()> {
    if failed > 0 {
        anyhow::bail!("{failed} of {total} file(s) had errors");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_source(&dir.path().join("nope.qasm")).unwrap_err();
        assert!(err.to_string().starts_with("File not found"));
    }

    #[test]
    fn test_check_failures() {
        assert!(check_failures(0, 3).is_ok());
        let err = check_failures(2, 3).unwrap_err();
        assert_eq!(err.to_string(), "2 of 3 file(s) had errors");
    }
}
