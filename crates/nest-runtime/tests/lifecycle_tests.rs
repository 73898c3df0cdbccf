//! Instance release accounting
//!
//! The live-instance counter is process-wide, so every check lives in a
//! single test in its own test binary.

use nest_config::InterpreterConfig;
use nest_runtime::{live_instances, CapturedOutput, InstanceError, OutputTarget, SubInterpreter};

fn quiet() -> SubInterpreter {
    SubInterpreter::with_options(
        InterpreterConfig::default(),
        OutputTarget::Capture(CapturedOutput::new()),
    )
    .unwrap()
}

#[test]
fn test_instances_released_exactly_once() {
    assert_eq!(live_instances(), 0);

    // Create and drop in a loop
    for _ in 0..50 {
        let mut nest = quiet();
        nest.run_source("loop", "let x = 1;").unwrap();
        assert_eq!(live_instances(), 1);
    }
    assert_eq!(live_instances(), 0);

    // Explicit close
    let nest = quiet();
    assert_eq!(live_instances(), 1);
    nest.close();
    assert_eq!(live_instances(), 0);

    // A fresh handle after churn sees nothing from earlier handles
    let mut fresh = quiet();
    assert!(fresh.global_names().is_empty());
    assert!(fresh.parse_expr("fresh", "x").is_none());

    // Children created from script are owned by the parent's namespace
    fresh
        .run_source("kids", "let a = Interpreter();\nlet b = Interpreter();")
        .unwrap();
    assert_eq!(live_instances(), 3);

    // Children created by a failed attempt are released by the rollback
    fresh
        .run_source("doomed", "let c = Interpreter();\nraise(\"no\");")
        .unwrap_err();
    assert_eq!(live_instances(), 3);

    // Shadowing the binding releases the old child
    fresh.run_source("replace", "let a = 0;").unwrap();
    assert_eq!(live_instances(), 2);

    drop(fresh);
    assert_eq!(live_instances(), 0);

    // Failed construction leaves nothing behind
    let err = SubInterpreter::with_config(InterpreterConfig::default().with_max_call_depth(0))
        .unwrap_err();
    assert!(matches!(err, InstanceError::InvalidConfig(_)));
    let err = SubInterpreter::with_config(
        InterpreterConfig::default().with_max_call_depth(usize::MAX),
    )
    .unwrap_err();
    assert!(matches!(err, InstanceError::AllocationFailure { .. }));
    assert_eq!(live_instances(), 0);
}
