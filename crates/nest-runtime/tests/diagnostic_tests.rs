//! Snapshot tests for diagnostic rendering
//!
//! The full text is what hosts show to users, so its exact shape is pinned.

mod common;

use common::*;
#[allow(unused_imports)]
use common::{assert_eq, assert_ne};
use nest_runtime::{Diagnostic, ErrorKind, DIAG_VERSION};

#[test]
fn test_compile_failure_text() {
    let (mut nest, _) = captured();
    let diag = run_err(&mut nest, "let ok = 1;\nlet broken = ;");
    insta::assert_snapshot!(diag.full_text(), @r###"
SyntaxError: Expected expression, found ';'
    from test:2
"###);
    assert_eq!(diag.message_only(), "Expected expression, found ';'");
}

#[test]
fn test_name_error_text() {
    let (mut nest, _) = captured();
    run_err(&mut nest, "fn f() {\n  return g();\n}");
    insta::assert_snapshot!(nest.error(), @r###"
NameError: Undefined name 'g'
    from test:2
"###);
}

#[test]
fn test_runtime_traceback_text() {
    let (mut nest, _) = captured();
    let source = "fn half(n) {\n  return n / 0;\n}\nfn run() {\n  return half(4);\n}\nrun();";
    run_err(&mut nest, source);
    insta::assert_snapshot!(nest.error(), @r###"
DivisionByZeroError: Attempt to divide by zero
Traceback:
    from test:2: in half
    from test:5: in run
    from test:7: in __main__
"###);
    assert_eq!(nest.error_message(), "Attempt to divide by zero");
}

#[test]
fn test_truncated_traceback_text() {
    let config = shallow_config().with_max_call_depth(5).with_trace_limit(2);
    let (mut nest, _) = captured_with(config);
    run_err(&mut nest, "fn loop_forever() {\n  return loop_forever();\n}\nloop_forever();");
    insta::assert_snapshot!(nest.error(), @r###"
RecursionError: Maximum call depth of 5 exceeded
Traceback:
    from test:2: in loop_forever
    from test:2: in loop_forever
    ... 4 more frame(s)
"###);
}

#[test]
fn test_human_format_points_at_column() {
    let (mut nest, _) = captured();
    let diag = run_err(&mut nest, "let total = 1 + \"two\";");
    insta::assert_snapshot!(diag.to_human_string(), @r###"
error[NE0001]: Cannot apply '+' to number and string
  --> test:1:13
   |
 1 | let total = 1 + "two";
   |             ^
"###);
}

#[test]
fn test_missing_file_text() {
    let (mut nest, _) = captured();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.nest");
    assert!(!nest.parse_file(&path));

    let diag = nest.last_diagnostic().cloned().unwrap();
    assert_eq!(diag.kind, ErrorKind::Io);
    assert_eq!(diag.file, path.display().to_string());
    assert!(nest
        .error()
        .starts_with(&format!("IoError: Failed to open '{}': ", path.display())));
    assert_eq!(nest.error().lines().count(), 1);
}

#[test]
fn test_json_round_trip() {
    let (mut nest, _) = captured();
    let diag = run_err(&mut nest, "fn f() { raise(\"bad\"); }\nf();");

    let json = diag.to_json_string().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["diag_version"], DIAG_VERSION);
    assert_eq!(value["code"], "NE0008");
    assert_eq!(value["trace"][0]["function"], "f");
    assert_eq!(value["trace"][1]["function"], "__main__");
    assert!(value.get("omitted_frames").is_none());

    let back: Diagnostic = serde_json::from_str(&json).unwrap();
    assert_eq!(back, diag);
}
