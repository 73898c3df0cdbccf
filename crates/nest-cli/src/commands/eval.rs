//! Eval command - evaluate one expression

use super::report;
use anyhow::{Context, Result};
use nest_config::InterpreterConfig;
use nest_runtime::{Diagnostic, SubInterpreter};

/// Evaluate a single expression and print its rendered value
pub fn run(expr: &str, config: InterpreterConfig, json: bool) -> Result<()> {
    let mut nest = SubInterpreter::with_config(config).context("Failed to create interpreter")?;

    match nest.eval_expression("<eval>", expr) {
        Ok(value) => {
            println!("{}", value);
            Ok(())
        }
        Err(diag) => {
            report(&diag, json, Diagnostic::full_text);
            Err(anyhow::anyhow!("Failed to evaluate expression"))
        }
    }
}
