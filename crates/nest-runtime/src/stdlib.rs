//! Standard library functions
//!
//! Builtins live in a registry that is built once per process and shared
//! read-only by every interpreter instance.

use crate::api::SubInterpreter;
use crate::interpreter::Interpreter;
use crate::span::Span;
use crate::value::{InterpreterRef, RuntimeError, Value, ValueArray};
use nest_config::InterpreterConfig;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Native implementation of a builtin
pub type BuiltinFn = fn(&mut Interpreter, &[Value], Span) -> Result<Value, RuntimeError>;

struct Builtin {
    arity: usize,
    func: BuiltinFn,
}

fn registry() -> &'static HashMap<&'static str, Builtin> {
    static REGISTRY: OnceLock<HashMap<&'static str, Builtin>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let entries: [(&'static str, usize, BuiltinFn); 13] = [
            ("print", 1, print),
            ("str", 1, str),
            ("len", 1, len),
            ("type_of", 1, type_of),
            ("push", 2, push),
            ("range", 1, range),
            ("raise", 1, raise),
            ("Some", 1, some),
            ("None", 0, none),
            ("is_some", 1, is_some),
            ("is_none", 1, is_none),
            ("unwrap", 1, unwrap),
            ("Interpreter", 0, new_interpreter),
        ];
        entries
            .into_iter()
            .map(|(name, arity, func)| (name, Builtin { arity, func }))
            .collect()
    })
}

/// Check if a function name is a builtin
pub fn is_builtin(name: &str) -> bool {
    registry().contains_key(name)
}

/// Names of all builtins, sorted
pub fn builtin_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = registry().keys().copied().collect();
    names.sort_unstable();
    names
}

/// Call a builtin function
///
/// `call_span` is the span of the whole call expression, used for error
/// reporting.
pub fn call_builtin(
    interp: &mut Interpreter,
    name: &str,
    args: &[Value],
    call_span: Span,
) -> Result<Value, RuntimeError> {
    let builtin = registry().get(name).ok_or_else(|| RuntimeError::UndefinedVariable {
        name: name.to_string(),
        span: call_span,
    })?;

    if args.len() != builtin.arity {
        return Err(RuntimeError::ArgumentCount {
            name: name.to_string(),
            expected: builtin.arity,
            found: args.len(),
            span: call_span,
        });
    }

    (builtin.func)(interp, args, call_span)
}

fn print(interp: &mut Interpreter, args: &[Value], span: Span) -> Result<Value, RuntimeError> {
    interp
        .output()
        .write_line(&args[0].to_string())
        .map_err(|e| RuntimeError::Output {
            message: e.to_string(),
            span,
        })?;
    Ok(Value::Null)
}

fn str(_: &mut Interpreter, args: &[Value], _: Span) -> Result<Value, RuntimeError> {
    Ok(Value::string(args[0].to_string()))
}

fn len(_: &mut Interpreter, args: &[Value], span: Span) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
        Value::Array(arr) => Ok(Value::Number(arr.len() as f64)),
        other => Err(RuntimeError::type_error(
            format!("len() expects a string or array, got {}", other.type_name()),
            span,
        )),
    }
}

fn type_of(_: &mut Interpreter, args: &[Value], _: Span) -> Result<Value, RuntimeError> {
    Ok(Value::string(args[0].type_name()))
}

fn push(_: &mut Interpreter, args: &[Value], span: Span) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::Array(arr) => {
            let mut arr = arr.clone();
            arr.push(args[1].clone());
            Ok(Value::Array(arr))
        }
        other => Err(RuntimeError::type_error(
            format!("push() expects an array, got {}", other.type_name()),
            span,
        )),
    }
}

/// Largest whole number an f64 holds exactly
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn range(_: &mut Interpreter, args: &[Value], span: Span) -> Result<Value, RuntimeError> {
    match &args[0] {
        Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 && n.is_finite() => {
            let too_large = || RuntimeError::ArrayTooLarge {
                len: n.to_string(),
                span,
            };
            if *n > MAX_SAFE_INTEGER {
                return Err(too_large());
            }
            let end = *n as usize;
            let mut items = Vec::new();
            items.try_reserve_exact(end).map_err(|_| too_large())?;
            items.extend((0..end).map(|i| Value::Number(i as f64)));
            Ok(Value::Array(ValueArray::from_vec(items)))
        }
        other => Err(RuntimeError::type_error(
            format!("range() expects a non-negative whole number, got {}", other),
            span,
        )),
    }
}

fn raise(_: &mut Interpreter, args: &[Value], span: Span) -> Result<Value, RuntimeError> {
    Err(RuntimeError::Raised {
        message: args[0].to_string(),
        span,
    })
}

fn some(_: &mut Interpreter, args: &[Value], _: Span) -> Result<Value, RuntimeError> {
    Ok(Value::Option(Some(Box::new(args[0].clone()))))
}

fn none(_: &mut Interpreter, _: &[Value], _: Span) -> Result<Value, RuntimeError> {
    Ok(Value::Option(None))
}

fn expect_option<'a>(
    value: &'a Value,
    func: &str,
    span: Span,
) -> Result<&'a Option<Box<Value>>, RuntimeError> {
    match value {
        Value::Option(opt) => Ok(opt),
        other => Err(RuntimeError::type_error(
            format!("{}() requires an option, got {}", func, other.type_name()),
            span,
        )),
    }
}

fn is_some(_: &mut Interpreter, args: &[Value], span: Span) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(expect_option(&args[0], "is_some", span)?.is_some()))
}

fn is_none(_: &mut Interpreter, args: &[Value], span: Span) -> Result<Value, RuntimeError> {
    Ok(Value::Bool(expect_option(&args[0], "is_none", span)?.is_none()))
}

fn unwrap(_: &mut Interpreter, args: &[Value], span: Span) -> Result<Value, RuntimeError> {
    match expect_option(&args[0], "unwrap", span)? {
        Some(value) => Ok((**value).clone()),
        None => Err(RuntimeError::type_error("unwrap() called on None", span)),
    }
}

/// `Interpreter()`: a nested handle with default limits that prints where
/// its creator prints
fn new_interpreter(
    interp: &mut Interpreter,
    _: &[Value],
    span: Span,
) -> Result<Value, RuntimeError> {
    let handle = SubInterpreter::with_options(InterpreterConfig::default(), interp.output().clone())
        .map_err(|e| RuntimeError::InterpreterCreation {
            reason: e.to_string(),
            span,
        })?;
    Ok(Value::Interpreter(InterpreterRef::new(handle)))
}
