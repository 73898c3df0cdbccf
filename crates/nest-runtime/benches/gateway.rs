//! Gateway attempt benchmarks
//!
//! Measures the cost of one transactional attempt on a handle:
//! - Committing attempts against a small and a large namespace
//! - Rolled-back attempts (compile failure and runtime fault)
//! - Expression evaluation
//! - Handle creation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nest_config::InterpreterConfig;
use nest_runtime::{CapturedOutput, OutputTarget, SubInterpreter};

fn quiet_handle() -> SubInterpreter {
    SubInterpreter::with_options(
        InterpreterConfig::default(),
        OutputTarget::Capture(CapturedOutput::new()),
    )
    .unwrap()
}

/// A handle with `globals` committed bindings
fn populated_handle(globals: usize) -> SubInterpreter {
    let mut nest = quiet_handle();
    let source: String = (0..globals)
        .map(|i| format!("var g{} = {};\n", i, i))
        .collect();
    nest.run_source("setup", &source).unwrap();
    nest
}

fn bench_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("attempt_commit");
    for globals in [0usize, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(globals), &globals, |b, &n| {
            let mut nest = populated_handle(n);
            b.iter(|| {
                nest.run_source("bench", black_box("var counter = 1; counter += 1;"))
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn bench_rollback(c: &mut Criterion) {
    let mut group = c.benchmark_group("attempt_rollback");
    for globals in [0usize, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("runtime_fault", globals), &globals, |b, &n| {
            let mut nest = populated_handle(n);
            b.iter(|| {
                let _ = nest.run_source("bench", black_box("var doomed = 1;\nraise(\"stop\");"));
            });
        });
    }
    group.bench_function("compile_failure", |b| {
        let mut nest = quiet_handle();
        b.iter(|| {
            let _ = nest.run_source("bench", black_box("let = ;"));
        });
    });
    group.finish();
}

fn bench_eval_expression(c: &mut Criterion) {
    c.bench_function("eval_expression_call", |b| {
        let mut nest = quiet_handle();
        nest.run_source(
            "setup",
            "fn fib(n) { if (n <= 1) { return n; } return fib(n - 1) + fib(n - 2); }",
        )
        .unwrap();
        b.iter(|| nest.eval_expression("bench", black_box("fib(15)")).unwrap());
    });
}

fn bench_nested_child(c: &mut Criterion) {
    c.bench_function("nested_child_parse_string", |b| {
        let mut nest = quiet_handle();
        nest.run_source("setup", "let child = Interpreter();").unwrap();
        b.iter(|| {
            nest.run_source(
                "bench",
                black_box("child.parse_string(\"c\", \"let x = 1;\");"),
            )
            .unwrap()
        });
    });
}

fn bench_create(c: &mut Criterion) {
    c.bench_function("handle_create_drop", |b| {
        b.iter(|| black_box(quiet_handle()));
    });
}

criterion_group!(
    benches,
    bench_commit,
    bench_rollback,
    bench_eval_expression,
    bench_nested_child,
    bench_create
);
criterion_main!(benches);
