//! Transactional execution
//!
//! Every entry point runs one attempt against a [`NestedInstance`]:
//!
//! 1. Take a checkpoint of the interpreter state
//! 2. Lex, parse and bind the new text against the committed namespace
//! 3. Execute (statements) or evaluate (expression)
//! 4. Commit on success and clear the error slot, or restore the checkpoint
//!    and record the diagnostic
//!
//! Nothing escapes an attempt except its `Result`.

use crate::ast::{Expr, Program};
use crate::binder::Binder;
use crate::diagnostic::{line_snippet, Diagnostic};
use crate::instance::NestedInstance;
use crate::interpreter::{Fault, Interpreter};
use crate::lexer::Lexer;
use crate::parser::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

/// Compile and execute statements
pub fn run_source(
    instance: &mut NestedInstance,
    label: &str,
    source: &str,
) -> Result<(), Diagnostic> {
    attempt(instance, label, |interp, label| {
        let program = compile_program(interp, label, source)?;
        interp
            .execute_program(&program, label)
            .map_err(|fault| fault_to_diagnostic(interp, fault, label, source))
    })
}

/// Read a file and execute it, labelled with its path
///
/// An unreadable file fails the attempt like a compile failure.
pub fn run_file(instance: &mut NestedInstance, path: &Path) -> Result<(), Diagnostic> {
    let label = path.display().to_string();
    match std::fs::read_to_string(path) {
        Ok(source) => run_source(instance, &label, &source),
        Err(e) => {
            let diagnostic = Diagnostic::io(&label, &e);
            debug!(instance = %instance.id(), path = %label, "source file unreadable");
            instance.record_failure(diagnostic.clone());
            Err(diagnostic)
        }
    }
}

/// Compile and evaluate a single expression, rendering its value
pub fn eval_expression(
    instance: &mut NestedInstance,
    label: &str,
    source: &str,
) -> Result<String, Diagnostic> {
    attempt(instance, label, |interp, label| {
        let expr = compile_expression(interp, label, source)?;
        interp
            .evaluate(&expr, label)
            .map(|value| value.render())
            .map_err(|fault| fault_to_diagnostic(interp, fault, label, source))
    })
}

/// Compile without executing
///
/// Leaves the namespace and the error slot untouched.
pub fn check_source(instance: &NestedInstance, label: &str, source: &str) -> Result<(), Diagnostic> {
    compile_program(instance.interpreter(), label, source).map(|_| ())
}

/// Run one attempt with commit-or-rollback semantics
fn attempt<T>(
    instance: &mut NestedInstance,
    label: &str,
    run: impl FnOnce(&mut Interpreter, &Arc<str>) -> Result<T, Diagnostic>,
) -> Result<T, Diagnostic> {
    let checkpoint = instance.interpreter().checkpoint();
    let label: Arc<str> = Arc::from(label);

    match run(instance.interpreter_mut(), &label) {
        Ok(value) => {
            instance.clear_error();
            trace!(instance = %instance.id(), label = %label, "attempt committed");
            Ok(value)
        }
        Err(diagnostic) => {
            instance.interpreter_mut().restore(checkpoint);
            debug!(
                instance = %instance.id(),
                label = %label,
                kind = %diagnostic.kind,
                "attempt rolled back"
            );
            instance.record_failure(diagnostic.clone());
            Err(diagnostic)
        }
    }
}

fn compile_program(interp: &Interpreter, label: &str, source: &str) -> Result<Program, Diagnostic> {
    let (tokens, mut diagnostics) = Lexer::new(source).tokenize();
    let (program, parse_diagnostics) = Parser::new(tokens).parse();
    diagnostics.extend(parse_diagnostics);

    if diagnostics.is_empty() {
        diagnostics = Binder::new(interp.symbol_table()).bind(&program);
    }

    match first_diagnostic(diagnostics, label, source) {
        Some(diagnostic) => Err(diagnostic),
        None => Ok(program),
    }
}

fn compile_expression(interp: &Interpreter, label: &str, source: &str) -> Result<Expr, Diagnostic> {
    let (tokens, mut diagnostics) = Lexer::new(source).tokenize();
    let (expr, parse_diagnostics) = Parser::new(tokens).parse_expression_only();
    diagnostics.extend(parse_diagnostics);

    if let (Some(expr), true) = (&expr, diagnostics.is_empty()) {
        diagnostics = Binder::new(interp.symbol_table()).bind_expression(expr);
    }

    match (first_diagnostic(diagnostics, label, source), expr) {
        (Some(diagnostic), _) => Err(diagnostic),
        (None, Some(expr)) => Ok(expr),
        (None, None) => Err(Diagnostic::syntax("Expected expression", crate::span::Span::dummy())
            .with_file(label)),
    }
}

/// The earliest compile diagnostic, labelled and with its source line
fn first_diagnostic(diagnostics: Vec<Diagnostic>, label: &str, source: &str) -> Option<Diagnostic> {
    diagnostics.into_iter().next().map(|diagnostic| {
        let snippet = if diagnostic.snippet.is_empty() {
            line_snippet(source, diagnostic.line)
        } else {
            diagnostic.snippet.clone()
        };
        diagnostic.with_file(label).with_snippet(snippet)
    })
}

fn fault_to_diagnostic(interp: &Interpreter, fault: Fault, label: &str, source: &str) -> Diagnostic {
    let span = fault.error.span();
    let file = fault
        .trace
        .first()
        .map_or_else(|| label.to_string(), |entry| entry.file.clone());
    let snippet = if file == label {
        line_snippet(source, span.line)
    } else {
        String::new()
    };

    Diagnostic::new(fault.error.kind(), fault.error.to_string(), span)
        .with_file(file)
        .with_snippet(snippet)
        .with_trace(fault.trace, interp.config().trace_limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::ErrorKind;
    use crate::instance::{CapturedOutput, OutputTarget};
    use crate::value::Value;
    use nest_config::InterpreterConfig;
    use pretty_assertions::assert_eq;

    fn instance() -> (NestedInstance, CapturedOutput) {
        let capture = CapturedOutput::new();
        let instance = NestedInstance::create(
            InterpreterConfig::default(),
            OutputTarget::Capture(capture.clone()),
        )
        .unwrap();
        (instance, capture)
    }

    #[test]
    fn test_commit_clears_error() {
        let (mut inst, _) = instance();
        assert!(run_source(&mut inst, "a", "let x = ;").is_err());
        assert!(inst.last_error().is_some());
        run_source(&mut inst, "b", "let x = 1;").unwrap();
        assert!(inst.last_error().is_none());
        assert_eq!(inst.interpreter().global("x"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn test_runtime_fault_rolls_back_partial_declarations() {
        let (mut inst, _) = instance();
        run_source(&mut inst, "setup", "var total = 1;").unwrap();

        let err = run_source(
            &mut inst,
            "bad",
            "fn helper() { return 2; }\ntotal = 50;\nlet y = 1 / 0;",
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivisionByZero);
        assert_eq!(err.file, "bad");
        assert_eq!(err.line, 3);
        assert_eq!(err.snippet, "let y = 1 / 0;");

        let interp = inst.interpreter();
        assert_eq!(interp.global("total"), Some(&Value::Number(1.0)));
        assert_eq!(interp.global_names(), vec!["total"]);
    }

    #[test]
    fn test_compile_failure_does_not_run_anything() {
        let (mut inst, out) = instance();
        let err = run_source(&mut inst, "t", "print(1);\nprint(missing);").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Name);
        assert_eq!(err.message, "Undefined name 'missing'");
        assert_eq!(out.contents(), "");
    }

    #[test]
    fn test_eval_expression_renders() {
        let (mut inst, _) = instance();
        assert_eq!(eval_expression(&mut inst, "e", "1 + 1"), Ok("2".to_string()));
        assert_eq!(eval_expression(&mut inst, "e", "null"), Ok(String::new()));
        assert_eq!(eval_expression(&mut inst, "e", "print(\"x\")"), Ok(String::new()));
    }

    #[test]
    fn test_eval_expression_rejects_statements() {
        let (mut inst, _) = instance();
        let err = eval_expression(&mut inst, "e", "let x = 1;").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
        assert!(inst.interpreter().global("x").is_none());
    }

    #[test]
    fn test_fault_in_function_from_earlier_attempt() {
        let (mut inst, _) = instance();
        run_source(&mut inst, "lib", "fn fail(msg) {\n  raise(msg);\n}").unwrap();
        let err = eval_expression(&mut inst, "expr", "fail(\"nope\")").unwrap_err();

        assert_eq!(err.kind, ErrorKind::Raised);
        assert_eq!(err.file, "lib");
        assert_eq!(err.line, 2);
        assert_eq!(err.snippet, "");
        assert_eq!(
            err.full_text(),
            "Error: nope\nTraceback:\n    from lib:2: in fail\n    from expr:1: in __main__\n"
        );
    }

    #[test]
    fn test_trace_limit_applies() {
        let capture = CapturedOutput::new();
        let config = InterpreterConfig::default()
            .with_max_call_depth(20)
            .with_trace_limit(3);
        let mut inst = NestedInstance::create(config, OutputTarget::Capture(capture)).unwrap();
        let err = run_source(&mut inst, "r", "fn f() { return f(); }\nf();").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Recursion);
        assert_eq!(err.trace.len(), 3);
        assert_eq!(err.omitted_frames, 18);
        assert!(err.full_text().ends_with("    ... 18 more frame(s)\n"));
    }

    #[test]
    fn test_missing_file() {
        let (mut inst, _) = instance();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.nest");
        let err = run_file(&mut inst, &path).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Io);
        assert!(err.full_text().starts_with("IoError: Failed to open '"));
        assert_eq!(inst.last_error(), Some(&err));
    }

    #[test]
    fn test_check_source_is_side_effect_free() {
        let (mut inst, out) = instance();
        check_source(&inst, "c", "let z = 1; print(z);").unwrap();
        assert!(inst.interpreter().global("z").is_none());
        assert_eq!(out.contents(), "");

        run_source(&mut inst, "x", "let = ;").unwrap_err();
        let before = inst.last_error().cloned();
        assert!(check_source(&inst, "c", "oops(").is_err());
        assert_eq!(inst.last_error().cloned(), before);
    }
}
