//! Check command - validate Nest source files without executing

use super::report;
use anyhow::{Context, Result};
use nest_config::InterpreterConfig;
use nest_runtime::{Diagnostic, SubInterpreter};
use std::fs;

/// Check a Nest source file without executing it
///
/// Performs lexing, parsing, and binding against a fresh handle, reporting
/// the first error found.
pub fn run(file_path: &str, config: InterpreterConfig, json: bool) -> Result<()> {
    let source = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read source file: {}", file_path))?;

    let nest = SubInterpreter::with_config(config).context("Failed to create interpreter")?;
    match nest.check_source(file_path, &source) {
        Ok(()) => {
            println!("{}: No errors found", file_path);
            Ok(())
        }
        Err(diag) => {
            report(&diag, json, Diagnostic::to_human_string);
            Err(anyhow::anyhow!("Check failed"))
        }
    }
}
