//! Parser option loading: defaults, then YAML file, then environment, then flags.

use std::path::Path;

use anyhow::{Context, Result};
use qasmparser::ParseOptions;
use tracing::debug;

/// Option overrides given on the command line.
#[derive(Debug, Clone, Default)]
pub struct FlagOverrides {
    pub strict: bool,
    pub max_errors: Option<i64>,
    pub no_comments: bool,
    pub no_recovery: bool,
}

impl FlagOverrides {
    fn apply(&self, mut options: ParseOptions) -> ParseOptions {
        if self.strict {
            options = options.with_strict_mode(true);
        }
        if let Some(max) = self.max_errors {
            options = options.with_max_errors(max);
        }
        if self.no_comments {
            options = options.with_include_comments(false);
        }
        if self.no_recovery {
            options = options.with_error_recovery(false);
        }
        options
    }
}

/// Resolve the effective parser options.
pub fn load_options(config: Option<&Path>, flags: &FlagOverrides) -> Result<ParseOptions> {
    let options = match config {
        Some(path) => ParseOptions::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => ParseOptions::default(),
    };
    let options = options
        .merge_env()
        .context("Invalid parser options in environment")?;
    let options = flags.apply(options);

    debug!(?options, "resolved parser options");
    Ok(options)
}
