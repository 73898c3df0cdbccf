//! Run command - execute Nest source files

use super::report;
use anyhow::{Context, Result};
use nest_config::InterpreterConfig;
use nest_runtime::{Diagnostic, SubInterpreter};
use tracing::debug;

/// Run a Nest source file
///
/// The file runs as a single attempt on a fresh handle; `print` output goes
/// to stdout and a failure is reported on stderr.
pub fn run(file_path: &str, config: InterpreterConfig, json: bool) -> Result<()> {
    let mut nest = SubInterpreter::with_config(config).context("Failed to create interpreter")?;
    debug!(instance = %nest.id(), file = file_path, "running file");

    match nest.run_file(file_path) {
        Ok(()) => Ok(()),
        Err(diag) => {
            report(&diag, json, Diagnostic::full_text);
            Err(anyhow::anyhow!("Failed to execute {}", file_path))
        }
    }
}
