//! Runtime value representation
//!
//! - Numbers, Bools, Null: Immediate values
//! - Strings: Heap-allocated, reference-counted (Arc<String>), immutable
//! - Arrays: Copy-on-write (ValueArray wrapping Arc<Vec<Value>>), value semantics
//! - Functions: Shared, immutable declarations
//! - Interpreter: Reference to a nested sub-interpreter (the only reference type)
//!
//! Because everything except `Interpreter` behaves as a value, cloning a
//! namespace yields an independent snapshot of everything reachable from it.

use crate::api::SubInterpreter;
use crate::ast::Block;
use crate::diagnostic::ErrorKind;
use crate::span::Span;
use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use thiserror::Error;

/// Copy-on-write array. Cheap to clone (refcount bump).
/// Mutations on a shared array clone the inner Vec first (Arc::make_mut).
#[derive(Clone, Debug, Default)]
pub struct ValueArray(Arc<Vec<Value>>);

impl ValueArray {
    pub fn new() -> Self {
        ValueArray(Arc::new(Vec::new()))
    }

    pub fn from_vec(v: Vec<Value>) -> Self {
        ValueArray(Arc::new(v))
    }

    /// Read access, no clone needed.
    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    /// Mutating access, triggers CoW if Arc is shared.
    pub fn push(&mut self, value: Value) {
        Arc::make_mut(&mut self.0).push(value);
    }

    pub fn set(&mut self, index: usize, value: Value) -> bool {
        let inner = Arc::make_mut(&mut self.0);
        match inner.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }
}

impl PartialEq for ValueArray {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice() == other.0.as_slice()
    }
}

impl From<Vec<Value>> for ValueArray {
    fn from(v: Vec<Value>) -> Self {
        ValueArray::from_vec(v)
    }
}

impl FromIterator<Value> for ValueArray {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        ValueArray(Arc::new(iter.into_iter().collect()))
    }
}

/// A user-defined function
#[derive(Debug)]
pub struct FunctionDef {
    /// Function name
    pub name: String,
    /// Parameter names
    pub params: Vec<String>,
    /// Function body
    pub body: Block,
    /// Label of the source the function was declared in (for tracebacks)
    pub label: Arc<str>,
}

/// Script-visible reference to a nested sub-interpreter
///
/// Not thread-safe; a nested interpreter belongs to the interpreter that
/// created it.
#[derive(Clone)]
pub struct InterpreterRef(Rc<RefCell<SubInterpreter>>);

impl InterpreterRef {
    pub fn new(handle: SubInterpreter) -> Self {
        InterpreterRef(Rc::new(RefCell::new(handle)))
    }

    /// Borrow the handle for an attempt
    ///
    /// Fails when the handle is already running further up the call stack.
    pub fn try_borrow_mut(&self, span: Span) -> Result<RefMut<'_, SubInterpreter>, RuntimeError> {
        self.0
            .try_borrow_mut()
            .map_err(|_| RuntimeError::InterpreterBusy { span })
    }

    /// Process-unique id of the nested instance, if it is not busy
    fn id(&self) -> Option<u64> {
        self.0.try_borrow().ok().map(|handle| handle.id().get())
    }
}

impl PartialEq for InterpreterRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for InterpreterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "InterpreterRef(#{})", id),
            None => write!(f, "InterpreterRef(<busy>)"),
        }
    }
}

/// Runtime value type
#[derive(Clone)]
pub enum Value {
    /// Numeric value (IEEE 754 double-precision)
    Number(f64),
    /// String value (reference-counted, immutable)
    String(Arc<String>),
    /// Boolean value
    Bool(bool),
    /// Null value
    Null,
    /// Array value (copy-on-write, value semantics)
    Array(ValueArray),
    /// User-defined function
    Function(Arc<FunctionDef>),
    /// Builtin stdlib function (dispatched through the registry by name)
    Builtin(Arc<str>),
    /// Option value (Some(value) or None)
    Option(Option<Box<Value>>),
    /// Nested sub-interpreter
    Interpreter(InterpreterRef),
}

impl Value {
    /// Create a new string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(Arc::new(s.into()))
    }

    /// Create a new array value
    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(ValueArray::from_vec(values))
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::Array(_) => "array",
            Value::Function(_) => "function",
            Value::Builtin(_) => "builtin",
            Value::Option(_) => "option",
            Value::Interpreter(_) => "interpreter",
        }
    }

    /// Check if this value is truthy
    ///
    /// Only `true` is truthy; there are no implicit conversions.
    pub fn is_truthy(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    /// Text produced for a successful expression evaluation
    ///
    /// `null` has no printable form and renders as the empty string.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Rendering inside an array or option, where strings keep their quotes
    fn to_nested_string(&self) -> String {
        match self {
            Value::String(s) => format!("{:?}", s.as_ref()),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Value {
    /// Equality contract:
    ///
    /// Value types compare by content. Functions and interpreters compare by
    /// identity, builtins by name.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Option(a), Value::Option(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Interpreter(a), Value::Interpreter(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                // Whole numbers print without a trailing .0
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{:.0}", n)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s.as_ref()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::Array(arr) => {
                let elements: Vec<String> = arr.iter().map(Value::to_nested_string).collect();
                write!(f, "[{}]", elements.join(", "))
            }
            Value::Function(func) => write!(f, "<fn {}>", func.name),
            Value::Builtin(name) => write!(f, "<builtin {}>", name),
            Value::Option(opt) => match opt {
                Some(val) => write!(f, "Some({})", val.to_nested_string()),
                None => write!(f, "None"),
            },
            Value::Interpreter(handle) => match handle.id() {
                Some(id) => write!(f, "<interpreter #{}>", id),
                None => write!(f, "<interpreter>"),
            },
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({})", n),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Null => write!(f, "Null"),
            Value::Array(arr) => write!(f, "Array({:?})", arr.as_slice()),
            Value::Function(func) => write!(f, "Function({})", func.name),
            Value::Builtin(name) => write!(f, "Builtin({:?})", name),
            Value::Option(opt) => write!(f, "Option({:?})", opt),
            Value::Interpreter(handle) => write!(f, "{:?}", handle),
        }
    }
}

/// Runtime error type with source span information
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    /// Operation applied to values of the wrong type
    #[error("{msg}")]
    TypeError { msg: String, span: Span },
    /// Global read before its declaration ran
    #[error("Undefined name '{name}'")]
    UndefinedVariable { name: String, span: Span },
    /// Write to a binding that is not a `var`
    #[error("Cannot assign to immutable binding '{name}'")]
    ImmutableAssignment { name: String, span: Span },
    /// Arity mismatch
    #[error("{name}() expects {expected} argument(s), got {found}")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },
    /// Division or modulo by zero
    #[error("Attempt to divide by zero")]
    DivideByZero { span: Span },
    /// Array length that cannot be allocated
    #[error("Cannot allocate an array of {len} elements")]
    ArrayTooLarge { len: String, span: Span },
    /// Array index out of bounds
    #[error("Index {index} out of range for array of length {len}")]
    OutOfBounds { index: usize, len: usize, span: Span },
    /// Index that is not a non-negative whole number
    #[error("Index must be a non-negative whole number, got {index}")]
    InvalidIndex { index: String, span: Span },
    /// Call depth above the configured limit
    #[error("Maximum call depth of {limit} exceeded")]
    RecursionLimit { limit: usize, span: Span },
    /// Raised by script code
    #[error("{message}")]
    Raised { message: String, span: Span },
    /// Nested interpreter used while it is already running
    #[error("Interpreter is already running")]
    InterpreterBusy { span: Span },
    /// Too many nested interpreters running inside one another
    #[error("Interpreters nested more than {limit} levels deep")]
    NestingLimit { limit: usize, span: Span },
    /// Nested interpreter could not be created
    #[error("Cannot create interpreter: {reason}")]
    InterpreterCreation { reason: String, span: Span },
    /// Writing program output failed
    #[error("Failed to write output: {message}")]
    Output { message: String, span: Span },
}

impl RuntimeError {
    /// Get the source span for this error
    pub fn span(&self) -> Span {
        match self {
            RuntimeError::TypeError { span, .. }
            | RuntimeError::UndefinedVariable { span, .. }
            | RuntimeError::ImmutableAssignment { span, .. }
            | RuntimeError::ArgumentCount { span, .. }
            | RuntimeError::DivideByZero { span }
            | RuntimeError::OutOfBounds { span, .. }
            | RuntimeError::InvalidIndex { span, .. }
            | RuntimeError::RecursionLimit { span, .. }
            | RuntimeError::Raised { span, .. }
            | RuntimeError::ArrayTooLarge { span, .. }
            | RuntimeError::InterpreterBusy { span }
            | RuntimeError::NestingLimit { span, .. }
            | RuntimeError::InterpreterCreation { span, .. }
            | RuntimeError::Output { span, .. } => *span,
        }
    }

    /// Diagnostic classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::TypeError { .. } => ErrorKind::Type,
            RuntimeError::UndefinedVariable { .. } => ErrorKind::Name,
            RuntimeError::ImmutableAssignment { .. } => ErrorKind::Assign,
            RuntimeError::ArgumentCount { .. } => ErrorKind::Argument,
            RuntimeError::DivideByZero { .. } => ErrorKind::DivisionByZero,
            RuntimeError::OutOfBounds { .. }
            | RuntimeError::InvalidIndex { .. }
            | RuntimeError::ArrayTooLarge { .. } => ErrorKind::Index,
            RuntimeError::RecursionLimit { .. } => ErrorKind::Recursion,
            RuntimeError::Raised { .. } => ErrorKind::Raised,
            RuntimeError::InterpreterBusy { .. }
            | RuntimeError::NestingLimit { .. }
            | RuntimeError::InterpreterCreation { .. } => ErrorKind::Interpreter,
            RuntimeError::Output { .. } => ErrorKind::Io,
        }
    }

    /// Shorthand for a type error
    pub fn type_error(msg: impl Into<String>, span: Span) -> Self {
        RuntimeError::TypeError {
            msg: msg.into(),
            span,
        }
    }
}
