//! AST interpreter (tree-walking)
//!
//! Direct AST evaluation against one instance's private state:
//! - Global namespace of `let`/`var`/`fn` bindings
//! - Block scopes (stack of environments)
//! - Call stack with a configurable depth limit
//!
//! Faults carry the traceback collected while unwinding through calls.
//! A [`Checkpoint`] captures everything an attempt may change so a failed
//! attempt can be undone.

mod expr;
mod stmt;

use crate::ast::{Expr, Item, Program};
use crate::binder::SymbolKind;
use crate::diagnostic::{TraceEntry, MAIN_FRAME};
use crate::instance::OutputTarget;
use crate::span::Span;
use crate::value::{FunctionDef, RuntimeError, Value};
use nest_config::InterpreterConfig;
use std::collections::{HashMap, TryReserveError};
use std::sync::Arc;

/// Control flow signal for handling break, continue, and return
#[derive(Debug, Clone, PartialEq)]
pub(super) enum ControlFlow {
    None,
    Break,
    Continue,
    Return(Value),
}

/// A named slot in a namespace
#[derive(Debug, Clone)]
pub struct Binding {
    pub value: Value,
    pub mutable: bool,
}

impl Binding {
    fn immutable(value: Value) -> Self {
        Self {
            value,
            mutable: false,
        }
    }
}

/// One active script function call
#[derive(Debug)]
pub(super) struct Frame {
    pub(super) function: String,
    pub(super) call_line: usize,
}

/// A runtime error unwinding through the call stack
#[derive(Debug, Clone)]
pub struct Fault {
    pub error: RuntimeError,
    /// Frames unwound so far, innermost first
    pub trace: Vec<TraceEntry>,
    /// Line currently being executed in the frame the fault is passing through
    pub line: usize,
}

impl From<RuntimeError> for Fault {
    fn from(error: RuntimeError) -> Self {
        let line = error.span().line;
        Self {
            error,
            trace: Vec::new(),
            line,
        }
    }
}

pub(super) type EvalResult<T> = Result<T, Fault>;

/// Pre-attempt state of an interpreter
#[derive(Debug)]
pub struct Checkpoint {
    globals: HashMap<String, Binding>,
    frame_depth: usize,
}

/// Interpreter state
pub struct Interpreter {
    /// Global namespace
    pub(super) globals: HashMap<String, Binding>,
    /// Local scopes (stack of environments), empty at top level
    pub(super) locals: Vec<HashMap<String, Binding>>,
    /// Active script calls
    pub(super) frames: Vec<Frame>,
    /// Current control flow state
    pub(super) control_flow: ControlFlow,
    pub(super) config: InterpreterConfig,
    pub(super) output: OutputTarget,
    /// Label of the source currently executing
    pub(super) label: Arc<str>,
}

impl Interpreter {
    /// Create a new interpreter with its call stack reserved up front
    pub fn new(config: InterpreterConfig, output: OutputTarget) -> Result<Self, TryReserveError> {
        let mut frames = Vec::new();
        frames.try_reserve_exact(config.max_call_depth)?;

        Ok(Self {
            globals: HashMap::new(),
            locals: Vec::new(),
            frames,
            control_flow: ControlFlow::None,
            config,
            output,
            label: Arc::from(MAIN_FRAME),
        })
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn output(&self) -> &OutputTarget {
        &self.output
    }

    /// Execute a checked program
    ///
    /// Top-level functions are defined before any statement runs, so
    /// statements may call functions declared further down.
    pub fn execute_program(&mut self, program: &Program, label: &Arc<str>) -> Result<(), Fault> {
        self.label = Arc::clone(label);
        self.control_flow = ControlFlow::None;

        for item in &program.items {
            if let Item::Function(func) = item {
                self.define_function(func, true);
            }
        }

        for item in &program.items {
            if let Item::Statement(stmt) = item {
                if let Err(fault) = self.eval_statement(stmt) {
                    return Err(self.finish_at_top_level(fault));
                }
            }
        }

        self.control_flow = ControlFlow::None;
        Ok(())
    }

    /// Evaluate a checked expression at top level
    pub fn evaluate(&mut self, expr: &Expr, label: &Arc<str>) -> Result<Value, Fault> {
        self.label = Arc::clone(label);
        self.control_flow = ControlFlow::None;
        self.eval_expr(expr)
            .map_err(|fault| self.finish_at_top_level(fault))
    }

    /// Add the outermost traceback entry
    fn finish_at_top_level(&self, mut fault: Fault) -> Fault {
        fault.trace.push(TraceEntry {
            file: self.label.to_string(),
            line: fault.line,
            function: MAIN_FRAME.to_string(),
        });
        fault
    }

    /// Bind a function declaration in the global namespace (top level) or
    /// the innermost scope
    pub(super) fn define_function(&mut self, func: &crate::ast::FunctionDecl, global: bool) {
        let def = FunctionDef {
            name: func.name.name.clone(),
            params: func.params.iter().map(|p| p.name.clone()).collect(),
            body: func.body.clone(),
            label: Arc::clone(&self.label),
        };
        let binding = Binding::immutable(Value::Function(Arc::new(def)));

        match self.locals.last_mut() {
            Some(scope) if !global => {
                scope.insert(func.name.name.clone(), binding);
            }
            _ => {
                self.globals.insert(func.name.name.clone(), binding);
            }
        }
    }

    /// Declare a variable in the innermost scope, or globally at top level
    pub(super) fn declare(&mut self, name: &str, value: Value, mutable: bool) {
        let binding = Binding { value, mutable };
        match self.locals.last_mut() {
            Some(scope) => {
                scope.insert(name.to_string(), binding);
            }
            None => {
                self.globals.insert(name.to_string(), binding);
            }
        }
    }

    /// Get a variable value
    pub(super) fn get_variable(&self, name: &str, span: Span) -> Result<Value, RuntimeError> {
        // Check locals (innermost to outermost)
        for scope in self.locals.iter().rev() {
            if let Some(binding) = scope.get(name) {
                return Ok(binding.value.clone());
            }
        }

        if let Some(binding) = self.globals.get(name) {
            return Ok(binding.value.clone());
        }

        if crate::stdlib::is_builtin(name) {
            return Ok(Value::Builtin(Arc::from(name)));
        }

        Err(RuntimeError::UndefinedVariable {
            name: name.to_string(),
            span,
        })
    }

    /// Set a variable value
    pub(super) fn set_variable(
        &mut self,
        name: &str,
        value: Value,
        span: Span,
    ) -> Result<(), RuntimeError> {
        let binding = self
            .locals
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
            .or_else(|| self.globals.get_mut(name));

        match binding {
            Some(binding) if binding.mutable => {
                binding.value = value;
                Ok(())
            }
            Some(_) => Err(RuntimeError::ImmutableAssignment {
                name: name.to_string(),
                span,
            }),
            None => Err(RuntimeError::UndefinedVariable {
                name: name.to_string(),
                span,
            }),
        }
    }

    /// Call a user-defined function
    pub(super) fn call_function(
        &mut self,
        func: &Arc<FunctionDef>,
        args: Vec<Value>,
        span: Span,
    ) -> EvalResult<Value> {
        if args.len() != func.params.len() {
            return Err(RuntimeError::ArgumentCount {
                name: func.name.clone(),
                expected: func.params.len(),
                found: args.len(),
                span,
            }
            .into());
        }

        if self.frames.len() >= self.config.max_call_depth {
            return Err(RuntimeError::RecursionLimit {
                limit: self.config.max_call_depth,
                span,
            }
            .into());
        }

        // Parameters are ordinary mutable locals
        let scope: HashMap<String, Binding> = func
            .params
            .iter()
            .cloned()
            .zip(args.into_iter().map(|value| Binding {
                value,
                mutable: true,
            }))
            .collect();

        let saved_locals = std::mem::replace(&mut self.locals, vec![scope]);
        self.frames.push(Frame {
            function: func.name.clone(),
            call_line: span.line,
        });

        let result = self.eval_block_statements(&func.body.statements);

        self.frames.pop();
        self.locals = saved_locals;
        let flow = std::mem::replace(&mut self.control_flow, ControlFlow::None);

        match result {
            Ok(()) => Ok(match flow {
                ControlFlow::Return(value) => value,
                _ => Value::Null,
            }),
            Err(mut fault) => {
                fault.trace.push(TraceEntry {
                    file: func.label.to_string(),
                    line: fault.line,
                    function: func.name.clone(),
                });
                fault.line = span.line;
                Err(fault)
            }
        }
    }

    /// Names visible to the binder from previously committed attempts
    pub fn symbol_table(&self) -> HashMap<String, SymbolKind> {
        self.globals
            .iter()
            .map(|(name, binding)| {
                let kind = match binding.value {
                    Value::Function(_) if !binding.mutable => SymbolKind::Function,
                    _ => SymbolKind::Variable {
                        mutable: binding.mutable,
                    },
                };
                (name.clone(), kind)
            })
            .collect()
    }

    /// Capture the state an attempt may change
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            globals: self.globals.clone(),
            frame_depth: self.frames.len(),
        }
    }

    /// Discard everything done since `checkpoint` was taken
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.globals = checkpoint.globals;
        self.frames.truncate(checkpoint.frame_depth);
        self.locals.clear();
        self.control_flow = ControlFlow::None;
    }

    /// Value of a global binding
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name).map(|binding| &binding.value)
    }

    /// Sorted names of all global bindings
    pub fn global_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.globals.keys().cloned().collect();
        names.sort();
        names
    }

    /// Depth of the call stack (zero between attempts)
    pub fn call_depth(&self) -> usize {
        self.frames.len()
    }

    /// Name and call-site line of the innermost active call
    pub fn current_frame(&self) -> Option<(&str, usize)> {
        self.frames
            .last()
            .map(|frame| (frame.function.as_str(), frame.call_line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::Binder;
    use crate::instance::CapturedOutput;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn interpreter_with(config: InterpreterConfig) -> (Interpreter, CapturedOutput) {
        let capture = CapturedOutput::new();
        let interp = Interpreter::new(config, OutputTarget::Capture(capture.clone())).unwrap();
        (interp, capture)
    }

    fn run(interp: &mut Interpreter, source: &str) -> Result<(), Fault> {
        let (tokens, lex_diags) = Lexer::new(source).tokenize();
        assert!(lex_diags.is_empty(), "{:?}", lex_diags);
        let (program, parse_diags) = Parser::new(tokens).parse();
        assert!(parse_diags.is_empty(), "{:?}", parse_diags);
        let bind_diags = Binder::new(interp.symbol_table()).bind(&program);
        assert!(bind_diags.is_empty(), "{:?}", bind_diags);
        interp.execute_program(&program, &Arc::from("test"))
    }

    #[test]
    fn test_globals_and_output() {
        let (mut interp, out) = interpreter_with(InterpreterConfig::default());
        run(&mut interp, "var x = 1; x += 41; print(x);").unwrap();
        assert_eq!(interp.global("x"), Some(&Value::Number(42.0)));
        assert_eq!(out.contents(), "42\n");
    }

    #[test]
    fn test_functions_are_hoisted() {
        let (mut interp, out) = interpreter_with(InterpreterConfig::default());
        run(&mut interp, "print(twice(4));\nfn twice(n) { return n * 2; }").unwrap();
        assert_eq!(out.contents(), "8\n");
    }

    #[test]
    fn test_symbol_table_kinds() {
        let (mut interp, _) = interpreter_with(InterpreterConfig::default());
        run(&mut interp, "let a = 1; var b = 2; fn f() {}").unwrap();
        let symbols = interp.symbol_table();
        assert_eq!(symbols["a"], SymbolKind::Variable { mutable: false });
        assert_eq!(symbols["b"], SymbolKind::Variable { mutable: true });
        assert_eq!(symbols["f"], SymbolKind::Function);
        assert_eq!(interp.global_names(), vec!["a", "b", "f"]);
    }

    #[test]
    fn test_traceback_innermost_first() {
        let (mut interp, _) = interpreter_with(InterpreterConfig::default());
        let source = "fn inner() {\n  return 1 / 0;\n}\nfn outer() {\n  return inner();\n}\nouter();";
        let fault = run(&mut interp, source).unwrap_err();
        assert!(matches!(fault.error, RuntimeError::DivideByZero { .. }));
        let frames: Vec<(&str, usize)> = fault
            .trace
            .iter()
            .map(|t| (t.function.as_str(), t.line))
            .collect();
        assert_eq!(frames, vec![("inner", 2), ("outer", 5), (MAIN_FRAME, 7)]);
        assert_eq!(interp.call_depth(), 0);
    }

    #[test]
    fn test_recursion_limit() {
        let (mut interp, _) = interpreter_with(InterpreterConfig::default().with_max_call_depth(10));
        let fault = run(&mut interp, "fn down(n) { return down(n + 1); }\ndown(0);").unwrap_err();
        assert!(matches!(fault.error, RuntimeError::RecursionLimit { limit: 10, .. }));
        assert_eq!(fault.trace.len(), 11);
        assert_eq!(interp.call_depth(), 0);
    }

    #[test]
    fn test_checkpoint_restore() {
        let (mut interp, _) = interpreter_with(InterpreterConfig::default());
        run(&mut interp, "var kept = [1, 2];").unwrap();
        let checkpoint = interp.checkpoint();
        run(&mut interp, "kept[0] = 9; let added = 1;").unwrap();
        interp.restore(checkpoint);
        assert_eq!(
            interp.global("kept"),
            Some(&Value::array(vec![Value::Number(1.0), Value::Number(2.0)]))
        );
        assert!(interp.global("added").is_none());
    }
}
