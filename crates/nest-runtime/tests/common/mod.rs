//! Shared test utilities
//!
//! Helpers for building handles whose output is captured, and for asserting
//! on attempt outcomes.

#![allow(dead_code)]

use nest_config::InterpreterConfig;
use nest_runtime::{CapturedOutput, Diagnostic, OutputTarget, SubInterpreter};

// Re-export testing utilities
pub use pretty_assertions::{assert_eq, assert_ne};

/// A handle with default limits whose `print` output is captured
pub fn captured() -> (SubInterpreter, CapturedOutput) {
    captured_with(InterpreterConfig::default())
}

/// A handle with the given limits whose `print` output is captured
pub fn captured_with(config: InterpreterConfig) -> (SubInterpreter, CapturedOutput) {
    let output = CapturedOutput::new();
    let nest = SubInterpreter::with_options(config, OutputTarget::Capture(output.clone()))
        .expect("interpreter should be created");
    (nest, output)
}

/// Limits small enough for recursion tests to stay well within the test
/// thread's native stack
pub fn shallow_config() -> InterpreterConfig {
    InterpreterConfig::default().with_max_call_depth(40)
}

/// Assert that an expression renders to `expected`
///
/// # Example
/// ```
/// assert_eval(&mut nest, "1 + 2", "3");
/// ```
pub fn assert_eval(nest: &mut SubInterpreter, source: &str, expected: &str) {
    match nest.eval_expression("test", source) {
        Ok(text) => assert_eq!(text, expected, "source: {}", source),
        Err(diag) => panic!("Expected {:?} from {:?}, got error:\n{}", expected, source, diag),
    }
}

/// Run source that must succeed
pub fn run_ok(nest: &mut SubInterpreter, source: &str) {
    if let Err(diag) = nest.run_source("test", source) {
        panic!("Expected success for {:?}, got:\n{}", source, diag);
    }
}

/// Run source that must fail, returning its diagnostic
pub fn run_err(nest: &mut SubInterpreter, source: &str) -> Diagnostic {
    match nest.run_source("test", source) {
        Ok(()) => panic!("Expected failure for {:?}", source),
        Err(diag) => diag,
    }
}
