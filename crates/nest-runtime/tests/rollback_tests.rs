//! Property tests for transactional attempts
//!
//! A handle driven by a random mix of committing and failing attempts must
//! always expose exactly the declarations of the committed ones.

mod common;

use common::*;
#[allow(unused_imports)]
use common::{assert_eq, assert_ne};
use nest_runtime::Value;
use proptest::prelude::*;
use std::collections::BTreeMap;

/// How an attempt ends after declaring its bindings
#[derive(Debug, Clone)]
enum Ending {
    Commit,
    /// Fails before anything runs
    CompileError,
    /// Fails after its declarations have executed
    RuntimeFault,
}

#[derive(Debug, Clone)]
struct Attempt {
    /// (slot, value) pairs declared as `var vN = value;`
    declarations: Vec<(u8, i32)>,
    /// Slots of already-declared names to bump with `+= 1`
    bumps: Vec<u8>,
    ending: Ending,
}

fn attempt_strategy() -> impl Strategy<Value = Attempt> {
    (
        prop::collection::vec((0u8..6, -50i32..50), 0..4),
        prop::collection::vec(0u8..6, 0..3),
        prop_oneof![
            2 => Just(Ending::Commit),
            1 => Just(Ending::CompileError),
            1 => Just(Ending::RuntimeFault),
        ],
    )
        .prop_map(|(declarations, bumps, ending)| Attempt {
            declarations,
            bumps,
            ending,
        })
}

fn render(attempt: &Attempt, model: &BTreeMap<String, f64>) -> String {
    let mut source = String::new();
    let mut visible: Vec<String> = model.keys().cloned().collect();

    for (slot, value) in &attempt.declarations {
        let name = format!("v{}", slot);
        source.push_str(&format!("var {} = {};\n", name, value));
        visible.push(name);
    }
    for slot in &attempt.bumps {
        let name = format!("v{}", slot);
        if visible.contains(&name) {
            source.push_str(&format!("{} += 1;\n", name));
        }
    }
    match attempt.ending {
        Ending::Commit => {}
        Ending::CompileError => source.push_str("let = ;\n"),
        Ending::RuntimeFault => source.push_str("raise(\"abort\");\n"),
    }
    source
}

fn apply(attempt: &Attempt, model: &mut BTreeMap<String, f64>) {
    for (slot, value) in &attempt.declarations {
        model.insert(format!("v{}", slot), f64::from(*value));
    }
    for slot in &attempt.bumps {
        if let Some(current) = model.get_mut(&format!("v{}", slot)) {
            *current += 1.0;
        }
    }
}

proptest! {
    #[test]
    fn prop_namespace_equals_committed_attempts(
        attempts in prop::collection::vec(attempt_strategy(), 1..12)
    ) {
        let (mut nest, _) = captured();
        let mut model: BTreeMap<String, f64> = BTreeMap::new();

        for attempt in &attempts {
            let source = render(attempt, &model);
            let committed = nest.parse_string("prop", &source);

            match attempt.ending {
                Ending::Commit => {
                    prop_assert!(committed, "{}\n{}", source, nest.error());
                    prop_assert_eq!(nest.error(), "");
                    apply(attempt, &mut model);
                }
                Ending::CompileError | Ending::RuntimeFault => {
                    prop_assert!(!committed);
                    prop_assert!(!nest.error().is_empty());
                }
            }

            let names: Vec<String> = model.keys().cloned().collect();
            prop_assert_eq!(nest.global_names(), names);
            for (name, value) in &model {
                prop_assert_eq!(nest.global(name), Some(Value::Number(*value)));
            }
        }
    }
}

#[test]
fn test_failed_attempt_restores_mutated_array() {
    let (mut nest, _) = captured();
    run_ok(&mut nest, "var items = [1, 2, 3];");
    run_err(&mut nest, "items[0] = 100;\nitems = push(items, 4);\nraise(\"undo\");");
    assert_eval(&mut nest, "items", "[1, 2, 3]");
}

#[test]
fn test_failed_attempt_discards_functions() {
    let (mut nest, _) = captured();
    let diag = run_err(&mut nest, "fn helper() { return 1; }\nlet x = helper() / 0;");
    assert_eq!(diag.line, 2);
    assert_eq!(nest.parse_expr("after", "helper()"), None);
    assert_eq!(nest.error_message(), "Undefined name 'helper'");
}

#[test]
fn test_failed_redeclaration_keeps_old_binding() {
    let (mut nest, _) = captured();
    run_ok(&mut nest, "let mode = \"old\";");
    run_err(&mut nest, "let mode = \"new\";\nraise(\"no\");");
    assert_eval(&mut nest, "mode", "old");
}

#[test]
fn test_failed_expression_leaves_no_trace() {
    let (mut nest, _) = captured();
    run_ok(&mut nest, "var calls = 0;\nfn tick() { calls += 1; return calls; }");
    assert_eq!(nest.parse_expr("e", "tick() + raise(\"x\")"), None);
    assert_eval(&mut nest, "calls", "0");
    assert_eval(&mut nest, "tick()", "1");
}
