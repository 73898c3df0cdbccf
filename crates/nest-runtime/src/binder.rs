//! Name binding and scope resolution
//!
//! The binder runs after parsing and before any code executes. It performs
//! two-pass analysis:
//! 1. Collect all top-level declarations of the attempt (hoisting)
//! 2. Walk every item, resolving names and checking assignments and
//!    control-flow placement
//!
//! Top-level statements see globals in declaration order. Function bodies
//! resolve globals late, so they also see declarations that come after them
//! in the same source.

use crate::ast::*;
use crate::diagnostic::{Diagnostic, ErrorKind};
use crate::span::Span;
use crate::stdlib;
use std::collections::{HashMap, HashSet};

/// What a name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// `let` (immutable) or `var` (mutable) binding
    Variable { mutable: bool },
    /// User-defined function
    Function,
    /// Native builtin
    Builtin,
}

/// Binder for name resolution and scope management
pub struct Binder {
    /// Globals visible to top-level statements, grown in declaration order
    globals: HashMap<String, SymbolKind>,
    /// Globals visible from function bodies (committed plus everything hoisted)
    late_globals: HashMap<String, SymbolKind>,
    /// Block and function scopes, innermost last
    scopes: Vec<HashMap<String, SymbolKind>>,
    in_function: bool,
    loop_depth: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Binder {
    /// Create a binder that sees the given committed globals
    pub fn new(globals: HashMap<String, SymbolKind>) -> Self {
        Self {
            late_globals: globals.clone(),
            globals,
            scopes: Vec::new(),
            in_function: false,
            loop_depth: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Bind a program (two-pass: hoist declarations, then bind everything)
    pub fn bind(&mut self, program: &Program) -> Vec<Diagnostic> {
        // Phase 1: hoisting
        for item in &program.items {
            match item {
                Item::Function(func) => {
                    self.globals.insert(func.name.name.clone(), SymbolKind::Function);
                    self.late_globals
                        .insert(func.name.name.clone(), SymbolKind::Function);
                }
                Item::Statement(Stmt::VarDecl(decl)) => {
                    self.late_globals.insert(
                        decl.name.name.clone(),
                        SymbolKind::Variable {
                            mutable: decl.mutable,
                        },
                    );
                }
                Item::Statement(_) => {}
            }
        }

        // Phase 2: binding
        for item in &program.items {
            match item {
                Item::Function(func) => self.bind_function(func),
                Item::Statement(Stmt::VarDecl(decl)) => {
                    self.bind_expr(&decl.init);
                    self.globals.insert(
                        decl.name.name.clone(),
                        SymbolKind::Variable {
                            mutable: decl.mutable,
                        },
                    );
                }
                Item::Statement(stmt) => self.bind_stmt(stmt),
            }
        }

        std::mem::take(&mut self.diagnostics)
    }

    /// Bind a standalone expression
    pub fn bind_expression(&mut self, expr: &Expr) -> Vec<Diagnostic> {
        self.bind_expr(expr);
        std::mem::take(&mut self.diagnostics)
    }

    fn bind_function(&mut self, func: &FunctionDecl) {
        let mut params = HashMap::new();
        let mut seen = HashSet::new();
        for param in &func.params {
            if !seen.insert(param.name.as_str()) {
                self.error(
                    ErrorKind::Syntax,
                    format!(
                        "Duplicate parameter '{}' in function '{}'",
                        param.name, func.name.name
                    ),
                    param.span,
                );
            }
            params.insert(param.name.clone(), SymbolKind::Variable { mutable: true });
        }

        let saved_scopes = std::mem::replace(&mut self.scopes, vec![params]);
        let saved_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        self.in_function = true;

        self.bind_statements(&func.body.statements);

        self.in_function = false;
        self.loop_depth = saved_loop_depth;
        self.scopes = saved_scopes;
    }

    fn bind_block(&mut self, block: &Block) {
        self.scopes.push(HashMap::new());
        self.bind_statements(&block.statements);
        self.scopes.pop();
    }

    fn bind_statements(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.bind_stmt(stmt);
        }
    }

    fn bind_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl(decl) => {
                self.bind_expr(&decl.init);
                self.declare_local(
                    &decl.name.name,
                    SymbolKind::Variable {
                        mutable: decl.mutable,
                    },
                );
            }
            Stmt::FunctionDecl(func) => {
                self.error(
                    ErrorKind::Syntax,
                    format!("Function '{}' must be declared at top level", func.name.name),
                    func.span,
                );
            }
            Stmt::Assign(assign) => {
                self.bind_target(&assign.target);
                self.bind_expr(&assign.value);
            }
            Stmt::CompoundAssign(assign) => {
                self.bind_target(&assign.target);
                self.bind_expr(&assign.value);
            }
            Stmt::If(stmt) => {
                self.bind_expr(&stmt.cond);
                self.bind_block(&stmt.then_block);
                if let Some(else_block) = &stmt.else_block {
                    self.bind_block(else_block);
                }
            }
            Stmt::While(stmt) => {
                self.bind_expr(&stmt.cond);
                self.loop_depth += 1;
                self.bind_block(&stmt.body);
                self.loop_depth -= 1;
            }
            Stmt::ForIn(stmt) => {
                self.bind_expr(&stmt.iterable);
                self.loop_depth += 1;
                self.scopes.push(HashMap::from([(
                    stmt.variable.name.clone(),
                    SymbolKind::Variable { mutable: false },
                )]));
                self.bind_block(&stmt.body);
                self.scopes.pop();
                self.loop_depth -= 1;
            }
            Stmt::Return(ret) => {
                if !self.in_function {
                    self.error(ErrorKind::Syntax, "'return' outside of a function", ret.span);
                }
                if let Some(value) = &ret.value {
                    self.bind_expr(value);
                }
            }
            Stmt::Break(span) => {
                if self.loop_depth == 0 {
                    self.error(ErrorKind::Syntax, "'break' outside of a loop", *span);
                }
            }
            Stmt::Continue(span) => {
                if self.loop_depth == 0 {
                    self.error(ErrorKind::Syntax, "'continue' outside of a loop", *span);
                }
            }
            Stmt::Block(block) => self.bind_block(block),
            Stmt::Expr(expr_stmt) => self.bind_expr(&expr_stmt.expr),
        }
    }

    fn bind_target(&mut self, target: &AssignTarget) {
        let name = target.name();
        match self.lookup(&name.name) {
            None => self.undefined(name),
            Some(SymbolKind::Variable { mutable: true }) => {}
            Some(SymbolKind::Variable { mutable: false }) => self.error(
                ErrorKind::Assign,
                format!("Cannot assign to immutable binding '{}'", name.name),
                name.span,
            ),
            Some(SymbolKind::Function) => self.error(
                ErrorKind::Assign,
                format!("Cannot assign to function '{}'", name.name),
                name.span,
            ),
            Some(SymbolKind::Builtin) => self.error(
                ErrorKind::Assign,
                format!("Cannot assign to builtin '{}'", name.name),
                name.span,
            ),
        }

        if let AssignTarget::Index { index, .. } = target {
            self.bind_expr(index);
        }
    }

    fn bind_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(..) => {}
            Expr::Identifier(id) => {
                if self.lookup(&id.name).is_none() {
                    self.undefined(id);
                }
            }
            Expr::Unary(unary) => self.bind_expr(&unary.expr),
            Expr::Binary(binary) => {
                self.bind_expr(&binary.left);
                self.bind_expr(&binary.right);
            }
            Expr::Call(call) => {
                self.bind_expr(&call.callee);
                for arg in &call.args {
                    self.bind_expr(arg);
                }
            }
            Expr::Index(index) => {
                self.bind_expr(&index.target);
                self.bind_expr(&index.index);
            }
            Expr::Member(member) => {
                self.bind_expr(&member.target);
                for arg in &member.args {
                    self.bind_expr(arg);
                }
            }
            Expr::ArrayLiteral(array) => {
                for element in &array.elements {
                    self.bind_expr(element);
                }
            }
            Expr::Group(group) => self.bind_expr(&group.expr),
        }
    }

    /// Declare in the innermost scope (or the global table at top level)
    fn declare_local(&mut self, name: &str, kind: SymbolKind) {
        match self.scopes.last_mut() {
            Some(scope) => {
                scope.insert(name.to_string(), kind);
            }
            None => {
                self.globals.insert(name.to_string(), kind);
            }
        }
    }

    fn lookup(&self, name: &str) -> Option<SymbolKind> {
        for scope in self.scopes.iter().rev() {
            if let Some(kind) = scope.get(name) {
                return Some(*kind);
            }
        }

        let globals = if self.in_function {
            &self.late_globals
        } else {
            &self.globals
        };
        if let Some(kind) = globals.get(name) {
            return Some(*kind);
        }

        stdlib::is_builtin(name).then_some(SymbolKind::Builtin)
    }

    fn undefined(&mut self, id: &Identifier) {
        self.error(
            ErrorKind::Name,
            format!("Undefined name '{}'", id.name),
            id.span,
        );
    }

    fn error(&mut self, kind: ErrorKind, message: impl Into<String>, span: Span) {
        self.diagnostics.push(Diagnostic::new(kind, message, span));
    }
}
