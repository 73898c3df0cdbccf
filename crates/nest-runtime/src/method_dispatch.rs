//! Method call dispatch (`value.name(args)`)
//!
//! Maps (TypeTag, method_name) to a native method. Only interpreter values
//! carry methods; they mirror the host-facing contract of `SubInterpreter`.

use crate::span::Span;
use crate::value::{RuntimeError, Value};
use serde::{Deserialize, Serialize};
use std::cell::Cell;

/// Deepest chain of nested interpreters that may run inside one another
pub const MAX_INTERPRETER_NESTING: usize = 16;

thread_local! {
    static RUNNING_NESTED: Cell<usize> = const { Cell::new(0) };
}

/// Marks one nested interpreter as running on this thread until dropped
struct NestingGuard;

impl NestingGuard {
    fn enter(span: Span) -> Result<Self, RuntimeError> {
        RUNNING_NESTED.with(|running| {
            if running.get() >= MAX_INTERPRETER_NESTING {
                return Err(RuntimeError::NestingLimit {
                    limit: MAX_INTERPRETER_NESTING,
                    span,
                });
            }
            running.set(running.get() + 1);
            Ok(NestingGuard)
        })
    }
}

impl Drop for NestingGuard {
    fn drop(&mut self) {
        RUNNING_NESTED.with(|running| running.set(running.get() - 1));
    }
}

/// Runtime-stable type tag for method dispatch.
/// Mirrors the types that support method call syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Interpreter,
}

impl TypeTag {
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Interpreter(_) => Some(TypeTag::Interpreter),
            _ => None,
        }
    }
}

/// Methods available on interpreter values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterpreterMethod {
    Error,
    ErrorMessage,
    ParseExpr,
    ParseFile,
    ParseString,
}

impl InterpreterMethod {
    pub fn name(self) -> &'static str {
        match self {
            InterpreterMethod::Error => "error",
            InterpreterMethod::ErrorMessage => "error_message",
            InterpreterMethod::ParseExpr => "parse_expr",
            InterpreterMethod::ParseFile => "parse_file",
            InterpreterMethod::ParseString => "parse_string",
        }
    }

    /// Whether the method runs code in the target interpreter
    pub fn runs_code(self) -> bool {
        !matches!(self, InterpreterMethod::Error | InterpreterMethod::ErrorMessage)
    }

    pub fn arity(self) -> usize {
        match self {
            InterpreterMethod::Error | InterpreterMethod::ErrorMessage => 0,
            InterpreterMethod::ParseFile => 1,
            InterpreterMethod::ParseExpr | InterpreterMethod::ParseString => 2,
        }
    }
}

/// Resolve a method call to its native method.
/// Returns None if the type/method combination is not registered.
pub fn resolve_method(type_tag: TypeTag, method_name: &str) -> Option<InterpreterMethod> {
    match type_tag {
        TypeTag::Interpreter => match method_name {
            "error" => Some(InterpreterMethod::Error),
            "error_message" => Some(InterpreterMethod::ErrorMessage),
            "parse_expr" => Some(InterpreterMethod::ParseExpr),
            "parse_file" => Some(InterpreterMethod::ParseFile),
            "parse_string" => Some(InterpreterMethod::ParseString),
            _ => None,
        },
    }
}

/// Invoke `target.method_name(args)`
pub fn call_method(
    target: &Value,
    method_name: &str,
    args: &[Value],
    span: Span,
) -> Result<Value, RuntimeError> {
    let method = TypeTag::of(target)
        .and_then(|tag| resolve_method(tag, method_name))
        .ok_or_else(|| {
            RuntimeError::type_error(
                format!(
                    "Value of type '{}' has no method '{}'",
                    target.type_name(),
                    method_name
                ),
                span,
            )
        })?;

    if args.len() != method.arity() {
        return Err(RuntimeError::ArgumentCount {
            name: method.name().to_string(),
            expected: method.arity(),
            found: args.len(),
            span,
        });
    }

    let Value::Interpreter(handle) = target else {
        return Err(RuntimeError::type_error("Expected an interpreter", span));
    };
    let mut handle = handle.try_borrow_mut(span)?;
    let _running = if method.runs_code() {
        Some(NestingGuard::enter(span)?)
    } else {
        None
    };

    match method {
        InterpreterMethod::Error => Ok(Value::string(handle.error())),
        InterpreterMethod::ErrorMessage => Ok(Value::string(handle.error_message())),
        InterpreterMethod::ParseExpr => {
            let context = expect_string(&args[0], method, span)?;
            let data = expect_string(&args[1], method, span)?;
            Ok(Value::Option(
                handle
                    .parse_expr(context, data)
                    .map(|text| Box::new(Value::string(text))),
            ))
        }
        InterpreterMethod::ParseFile => {
            let filename = expect_string(&args[0], method, span)?;
            Ok(Value::Bool(handle.parse_file(filename)))
        }
        InterpreterMethod::ParseString => {
            let context = expect_string(&args[0], method, span)?;
            let data = expect_string(&args[1], method, span)?;
            Ok(Value::Bool(handle.parse_string(context, data)))
        }
    }
}

fn expect_string(value: &Value, method: InterpreterMethod, span: Span) -> Result<&str, RuntimeError> {
    match value {
        Value::String(s) => Ok(s.as_str()),
        other => Err(RuntimeError::type_error(
            format!(
                "{}() expects string arguments, got {}",
                method.name(),
                other.type_name()
            ),
            span,
        )),
    }
}
