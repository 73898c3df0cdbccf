//! Statement execution

use crate::ast::*;
use crate::interpreter::expr::{apply_binary, get_element, to_index};
use crate::interpreter::{Binding, ControlFlow, EvalResult, Interpreter};
use crate::span::Span;
use crate::value::{RuntimeError, Value};
use std::collections::HashMap;

impl Interpreter {
    /// Execute a statement
    pub(super) fn eval_statement(&mut self, stmt: &Stmt) -> EvalResult<()> {
        match stmt {
            Stmt::VarDecl(decl) => {
                let value = self.eval_expr(&decl.init)?;
                self.declare(&decl.name.name, value, decl.mutable);
                Ok(())
            }
            Stmt::FunctionDecl(func) => {
                self.define_function(func, false);
                Ok(())
            }
            Stmt::Assign(assign) => {
                let value = self.eval_expr(&assign.value)?;
                self.assign_to(&assign.target, value)
            }
            Stmt::CompoundAssign(assign) => self.eval_compound_assign(assign),
            Stmt::If(if_stmt) => {
                let cond = self.eval_condition(&if_stmt.cond)?;
                if cond {
                    self.eval_block(&if_stmt.then_block)
                } else if let Some(else_block) = &if_stmt.else_block {
                    self.eval_block(else_block)
                } else {
                    Ok(())
                }
            }
            Stmt::While(while_stmt) => self.eval_while(while_stmt),
            Stmt::ForIn(for_stmt) => self.eval_for_in(for_stmt),
            Stmt::Return(ret) => {
                let value = match &ret.value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Null,
                };
                self.control_flow = ControlFlow::Return(value);
                Ok(())
            }
            Stmt::Break(_) => {
                self.control_flow = ControlFlow::Break;
                Ok(())
            }
            Stmt::Continue(_) => {
                self.control_flow = ControlFlow::Continue;
                Ok(())
            }
            Stmt::Block(block) => self.eval_block(block),
            Stmt::Expr(expr_stmt) => {
                self.eval_expr(&expr_stmt.expr)?;
                Ok(())
            }
        }
    }

    /// Execute a block in a fresh scope
    pub(super) fn eval_block(&mut self, block: &Block) -> EvalResult<()> {
        self.locals.push(HashMap::new());
        let result = self.eval_block_statements(&block.statements);
        self.locals.pop();
        result
    }

    /// Execute statements in the current scope until control flow changes
    pub(super) fn eval_block_statements(&mut self, statements: &[Stmt]) -> EvalResult<()> {
        for stmt in statements {
            self.eval_statement(stmt)?;
            if self.control_flow != ControlFlow::None {
                break;
            }
        }
        Ok(())
    }

    fn eval_condition(&mut self, cond: &Expr) -> EvalResult<bool> {
        match self.eval_expr(cond)? {
            Value::Bool(b) => Ok(b),
            other => Err(RuntimeError::type_error(
                format!("Condition must be bool, got {}", other.type_name()),
                cond.span(),
            )
            .into()),
        }
    }

    fn eval_while(&mut self, while_stmt: &WhileStmt) -> EvalResult<()> {
        while self.eval_condition(&while_stmt.cond)? {
            self.eval_block(&while_stmt.body)?;
            if self.take_loop_exit() {
                break;
            }
        }
        Ok(())
    }

    fn eval_for_in(&mut self, for_stmt: &ForInStmt) -> EvalResult<()> {
        let items: Vec<Value> = match self.eval_expr(&for_stmt.iterable)? {
            Value::Array(arr) => arr.iter().cloned().collect(),
            Value::String(s) => s.chars().map(|c| Value::string(c.to_string())).collect(),
            other => {
                return Err(RuntimeError::type_error(
                    format!("Cannot iterate over a value of type '{}'", other.type_name()),
                    for_stmt.iterable.span(),
                )
                .into())
            }
        };

        for item in items {
            let mut scope = HashMap::new();
            scope.insert(
                for_stmt.variable.name.clone(),
                Binding {
                    value: item,
                    mutable: false,
                },
            );
            self.locals.push(scope);
            let result = self.eval_block(&for_stmt.body);
            self.locals.pop();
            result?;

            if self.take_loop_exit() {
                break;
            }
        }
        Ok(())
    }

    /// Consume a loop-level control flow signal; true when the loop must stop
    fn take_loop_exit(&mut self) -> bool {
        match self.control_flow {
            ControlFlow::Break => {
                self.control_flow = ControlFlow::None;
                true
            }
            ControlFlow::Continue => {
                self.control_flow = ControlFlow::None;
                false
            }
            ControlFlow::Return(_) => true,
            ControlFlow::None => false,
        }
    }

    fn eval_compound_assign(&mut self, assign: &CompoundAssign) -> EvalResult<()> {
        let current = match &assign.target {
            AssignTarget::Name(id) => self.get_variable(&id.name, id.span)?,
            AssignTarget::Index { name, index, span } => {
                let target = self.get_variable(&name.name, name.span)?;
                let idx = self.eval_expr(index)?;
                get_element(&target, &idx, *span)?
            }
        };
        let rhs = self.eval_expr(&assign.value)?;
        let value = apply_binary(assign.op.binary_op(), current, rhs, assign.span)?;
        self.assign_to(&assign.target, value)
    }

    fn assign_to(&mut self, target: &AssignTarget, value: Value) -> EvalResult<()> {
        match target {
            AssignTarget::Name(id) => Ok(self.set_variable(&id.name, value, id.span)?),
            AssignTarget::Index { name, index, span } => {
                let idx = self.eval_expr(index)?;
                let updated = self.with_element(&name.name, name.span, &idx, value, *span)?;
                Ok(self.set_variable(&name.name, updated, name.span)?)
            }
        }
    }

    /// Copy of the array bound to `name` with one element replaced
    fn with_element(
        &self,
        name: &str,
        name_span: Span,
        idx: &Value,
        value: Value,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        match self.get_variable(name, name_span)? {
            Value::Array(mut arr) => {
                let index = to_index(idx, span)?;
                let len = arr.len();
                if arr.set(index, value) {
                    Ok(Value::Array(arr))
                } else {
                    Err(RuntimeError::OutOfBounds { index, len, span })
                }
            }
            other => Err(RuntimeError::type_error(
                format!("Cannot assign by index into a value of type '{}'", other.type_name()),
                span,
            )),
        }
    }
}
