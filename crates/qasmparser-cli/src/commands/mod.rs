//! CLI command implementations.

pub mod ast;
pub mod common;
pub mod format;
pub mod parse;
pub mod stats;
pub mod validate;
pub mod version;
