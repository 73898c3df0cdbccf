//! Running source files through a handle

mod common;

use common::*;
#[allow(unused_imports)]
use common::{assert_eq, assert_ne};
use nest_runtime::ErrorKind;
use std::fs;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_parse_file_commits_declarations() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "lib.nest", "fn greet(name) {\n  return \"hello \" + name;\n}\n");

    let (mut nest, _) = captured();
    assert!(nest.parse_file(&path));
    assert_eq!(nest.error(), "");
    assert_eval(&mut nest, "greet(\"nest\")", "hello nest");
}

#[test]
fn test_file_errors_are_labelled_with_path() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "bad.nest", "let a = 1;\nlet b = a + [];\n");

    let (mut nest, _) = captured();
    let diag = nest.run_file(&path).unwrap_err();
    assert_eq!(diag.kind, ErrorKind::Type);
    assert_eq!(diag.file, path.display().to_string());
    assert_eq!(diag.line, 2);
    assert_eq!(diag.snippet, "let b = a + [];");
    assert!(nest
        .error()
        .contains(&format!("from {}:2: in __main__", path.display())));
    assert!(nest.global("a").is_none());
}

#[test]
fn test_traceback_spans_files() {
    let dir = TempDir::new().unwrap();
    let lib = write(&dir, "lib.nest", "fn check(n) {\n  if (n < 0) {\n    raise(\"negative\");\n  }\n  return n;\n}\n");
    let main = write(&dir, "main.nest", "let x = check(1);\nlet y = check(-1);\n");

    let (mut nest, _) = captured();
    assert!(nest.parse_file(&lib));
    assert!(!nest.parse_file(&main));

    let diag = nest.last_diagnostic().unwrap();
    assert_eq!(diag.file, lib.display().to_string());
    assert_eq!(diag.line, 3);
    assert_eq!(
        diag.trace
            .iter()
            .map(|entry| (entry.function.as_str(), entry.line))
            .collect::<Vec<_>>(),
        vec![("check", 3), ("__main__", 2)]
    );
    assert_eq!(diag.trace[1].file, main.display().to_string());
    assert!(nest.global("x").is_none());
}

#[test]
fn test_unreadable_path_then_recovery() {
    let dir = TempDir::new().unwrap();
    let (mut nest, _) = captured();

    assert!(!nest.parse_file(dir.path().join("missing.nest")));
    assert_eq!(nest.last_diagnostic().unwrap().kind, ErrorKind::Io);

    let path = write(&dir, "ok.nest", "let fine = true;\n");
    assert!(nest.parse_file(&path));
    assert_eq!(nest.error(), "");
}

#[test]
fn test_directory_is_not_a_source_file() {
    let dir = TempDir::new().unwrap();
    let (mut nest, _) = captured();
    assert!(!nest.parse_file(dir.path()));
    assert_eq!(nest.last_diagnostic().unwrap().kind, ErrorKind::Io);
}
