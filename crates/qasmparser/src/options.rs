//! Parser configuration.
//!
//! Options can be built in code, loaded from YAML, and overridden from the
//! environment (`QASMPARSER_` prefix). Precedence, lowest to highest:
//! defaults, YAML file, environment, explicit `with_*` calls.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable prefix for option overrides.
pub const ENV_PREFIX: &str = "QASMPARSER_";

/// Options controlling a parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseOptions {
    /// Reject OpenQASM 2 register syntax, arrow measurement and non-3 versions.
    pub strict_mode: bool,

    /// Collect comments into [`Program::comments`](crate::ast::Program::comments).
    pub include_comments: bool,

    /// Resynchronize at statement boundaries after a syntax error.
    pub error_recovery: bool,

    /// Maximum number of diagnostics retained; zero or negative means unbounded.
    pub max_errors: i64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strict_mode: false,
            include_comments: true,
            error_recovery: true,
            max_errors: 100,
        }
    }
}

impl ParseOptions {
    /// Create the default options.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    #[must_use]
    pub fn with_include_comments(mut self, include: bool) -> Self {
        self.include_comments = include;
        self
    }

    #[must_use]
    pub fn with_error_recovery(mut self, recovery: bool) -> Self {
        self.error_recovery = recovery;
        self
    }

    #[must_use]
    pub fn with_max_errors(mut self, max_errors: i64) -> Self {
        self.max_errors = max_errors;
        self
    }

    /// The diagnostic cap as a count, `None` when unbounded.
    pub fn error_limit(&self) -> Option<usize> {
        usize::try_from(self.max_errors).ok().filter(|&n| n > 0)
    }

    /// Parse options from a YAML document. Missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(yaml).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load options from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Apply `QASMPARSER_*` environment overrides.
    ///
    /// Only variables that are set override the current values.
    pub fn merge_env(self) -> Result<Self> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn merge_vars<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = var("STRICT_MODE") {
            self.strict_mode = parse_flag("STRICT_MODE", &v)?;
        }
        if let Some(v) = var("INCLUDE_COMMENTS") {
            self.include_comments = parse_flag("INCLUDE_COMMENTS", &v)?;
        }
        if let Some(v) = var("ERROR_RECOVERY") {
            self.error_recovery = parse_flag("ERROR_RECOVERY", &v)?;
        }
        if let Some(v) = var("MAX_ERRORS") {
            self.max_errors = v.trim().parse().map_err(|_| {
                Error::Config(format!("{ENV_PREFIX}MAX_ERRORS: expected an integer, got '{v}'"))
            })?;
        }

        Ok(self)
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!(
            "{ENV_PREFIX}{name}: expected a boolean, got '{value}'"
        ))),
    }
}
