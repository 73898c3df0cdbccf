//! Expression evaluation

use crate::ast::*;
use crate::interpreter::{EvalResult, Interpreter};
use crate::span::Span;
use crate::value::{RuntimeError, Value};

impl Interpreter {
    /// Evaluate an expression
    pub(super) fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Literal(lit, _) => Ok(self.eval_literal(lit)),
            Expr::Identifier(id) => Ok(self.get_variable(&id.name, id.span)?),
            Expr::Binary(binary) => self.eval_binary(binary),
            Expr::Unary(unary) => self.eval_unary(unary),
            Expr::Call(call) => self.eval_call(call),
            Expr::Index(index) => self.eval_index(index),
            Expr::Member(member) => self.eval_member(member),
            Expr::ArrayLiteral(arr) => self.eval_array_literal(arr),
            Expr::Group(group) => self.eval_expr(&group.expr),
        }
    }

    /// Evaluate a literal
    pub(super) fn eval_literal(&self, lit: &Literal) -> Value {
        match lit {
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::string(s.clone()),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Null => Value::Null,
        }
    }

    /// Evaluate a binary expression
    fn eval_binary(&mut self, binary: &BinaryExpr) -> EvalResult<Value> {
        // Short-circuit evaluation for && and ||
        if matches!(binary.op, BinaryOp::And | BinaryOp::Or) {
            let short_circuit = binary.op == BinaryOp::Or;
            let left = self.eval_expr(&binary.left)?;
            let left = expect_bool(binary.op, &left, binary.left.span())?;
            if left == short_circuit {
                return Ok(Value::Bool(left));
            }
            let right = self.eval_expr(&binary.right)?;
            return Ok(Value::Bool(expect_bool(
                binary.op,
                &right,
                binary.right.span(),
            )?));
        }

        let left = self.eval_expr(&binary.left)?;
        let right = self.eval_expr(&binary.right)?;
        Ok(apply_binary(binary.op, left, right, binary.span)?)
    }

    /// Evaluate a unary expression
    fn eval_unary(&mut self, unary: &UnaryExpr) -> EvalResult<Value> {
        let value = self.eval_expr(&unary.expr)?;
        match (unary.op, value) {
            (UnaryOp::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
            (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (UnaryOp::Negate, other) => Err(RuntimeError::type_error(
                format!("Cannot negate a value of type '{}'", other.type_name()),
                unary.span,
            )
            .into()),
            (UnaryOp::Not, other) => Err(RuntimeError::type_error(
                format!("Cannot apply '!' to a value of type '{}'", other.type_name()),
                unary.span,
            )
            .into()),
        }
    }

    /// Evaluate a function call
    pub(super) fn eval_call(&mut self, call: &CallExpr) -> EvalResult<Value> {
        let callee = self.eval_expr(&call.callee)?;
        let args = self.eval_args(&call.args)?;

        match callee {
            Value::Function(func) => self.call_function(&func, args, call.span),
            Value::Builtin(name) => Ok(crate::stdlib::call_builtin(self, &name, &args, call.span)?),
            other => Err(RuntimeError::type_error(
                format!("Value of type '{}' is not callable", other.type_name()),
                call.callee.span(),
            )
            .into()),
        }
    }

    /// Evaluate a method call (`target.name(args)`)
    fn eval_member(&mut self, member: &MemberExpr) -> EvalResult<Value> {
        let target = self.eval_expr(&member.target)?;
        let args = self.eval_args(&member.args)?;
        Ok(crate::method_dispatch::call_method(
            &target,
            &member.member.name,
            &args,
            member.span,
        )?)
    }

    fn eval_args(&mut self, args: &[Expr]) -> EvalResult<Vec<Value>> {
        args.iter().map(|arg| self.eval_expr(arg)).collect()
    }

    /// Evaluate an index expression
    fn eval_index(&mut self, index: &IndexExpr) -> EvalResult<Value> {
        let target = self.eval_expr(&index.target)?;
        let idx = self.eval_expr(&index.index)?;
        Ok(get_element(&target, &idx, index.span)?)
    }

    /// Evaluate an array literal
    fn eval_array_literal(&mut self, arr: &ArrayLiteral) -> EvalResult<Value> {
        let elements = self.eval_args(&arr.elements)?;
        Ok(Value::array(elements))
    }
}

fn expect_bool(op: BinaryOp, value: &Value, span: Span) -> Result<bool, RuntimeError> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(RuntimeError::type_error(
            format!(
                "Operands of '{}' must be bool, got {}",
                op.symbol(),
                other.type_name()
            ),
            span,
        )),
    }
}

/// Apply a non-short-circuiting binary operator
pub(super) fn apply_binary(
    op: BinaryOp,
    left: Value,
    right: Value,
    span: Span,
) -> Result<Value, RuntimeError> {
    match (op, &left, &right) {
        (BinaryOp::Eq, _, _) => Ok(Value::Bool(left == right)),
        (BinaryOp::Ne, _, _) => Ok(Value::Bool(left != right)),

        (BinaryOp::Add, Value::String(a), Value::String(b)) => {
            Ok(Value::string(format!("{}{}", a, b)))
        }
        (BinaryOp::Add, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (BinaryOp::Sub, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
        (BinaryOp::Mul, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
        (BinaryOp::Div | BinaryOp::Mod, Value::Number(_), Value::Number(b)) if *b == 0.0 => {
            Err(RuntimeError::DivideByZero { span })
        }
        (BinaryOp::Div, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
        (BinaryOp::Mod, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a % b)),

        (BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge, _, _) => {
            let ordering = match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
                _ => return Err(operand_error(op, &left, &right, span)),
            };
            let result = match ordering {
                Some(ordering) => match op {
                    BinaryOp::Lt => ordering.is_lt(),
                    BinaryOp::Le => ordering.is_le(),
                    BinaryOp::Gt => ordering.is_gt(),
                    _ => ordering.is_ge(),
                },
                // NaN compares false
                None => false,
            };
            Ok(Value::Bool(result))
        }

        _ => Err(operand_error(op, &left, &right, span)),
    }
}

fn operand_error(op: BinaryOp, left: &Value, right: &Value, span: Span) -> RuntimeError {
    RuntimeError::type_error(
        format!(
            "Cannot apply '{}' to {} and {}",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ),
        span,
    )
}

/// Convert an index value to a position
pub(super) fn to_index(idx: &Value, span: Span) -> Result<usize, RuntimeError> {
    match idx {
        Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 && n.is_finite() => Ok(*n as usize),
        other => Err(RuntimeError::InvalidIndex {
            index: other.to_string(),
            span,
        }),
    }
}

/// Read an array element or a string character
pub(super) fn get_element(target: &Value, idx: &Value, span: Span) -> Result<Value, RuntimeError> {
    match target {
        Value::Array(arr) => {
            let index = to_index(idx, span)?;
            arr.get(index).cloned().ok_or(RuntimeError::OutOfBounds {
                index,
                len: arr.len(),
                span,
            })
        }
        Value::String(s) => {
            let index = to_index(idx, span)?;
            s.chars()
                .nth(index)
                .map(|c| Value::string(c.to_string()))
                .ok_or_else(|| RuntimeError::OutOfBounds {
                    index,
                    len: s.chars().count(),
                    span,
                })
        }
        other => Err(RuntimeError::type_error(
            format!("Cannot index a value of type '{}'", other.type_name()),
            span,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    #[test]
    fn test_arithmetic_and_concat() {
        let span = Span::dummy();
        assert_eq!(apply_binary(BinaryOp::Add, num(1.0), num(2.0), span), Ok(num(3.0)));
        assert_eq!(apply_binary(BinaryOp::Mod, num(7.0), num(4.0), span), Ok(num(3.0)));
        assert_eq!(
            apply_binary(BinaryOp::Add, Value::string("a"), Value::string("b"), span),
            Ok(Value::string("ab"))
        );
    }

    #[test]
    fn test_mixed_operands_are_type_errors() {
        let err = apply_binary(BinaryOp::Add, num(1.0), Value::string("x"), Span::dummy())
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot apply '+' to number and string");
    }

    #[test]
    fn test_division_by_zero() {
        let err = apply_binary(BinaryOp::Div, num(1.0), num(0.0), Span::dummy()).unwrap_err();
        assert!(matches!(err, RuntimeError::DivideByZero { .. }));
        let err = apply_binary(BinaryOp::Mod, num(1.0), num(0.0), Span::dummy()).unwrap_err();
        assert!(matches!(err, RuntimeError::DivideByZero { .. }));
    }

    #[test]
    fn test_equality_across_types() {
        let span = Span::dummy();
        assert_eq!(apply_binary(BinaryOp::Eq, num(1.0), Value::string("1"), span), Ok(Value::Bool(false)));
        assert_eq!(apply_binary(BinaryOp::Ne, Value::Null, Value::Null, span), Ok(Value::Bool(false)));
    }

    #[test]
    fn test_string_comparison() {
        let span = Span::dummy();
        assert_eq!(
            apply_binary(BinaryOp::Lt, Value::string("apple"), Value::string("banana"), span),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn test_indexing() {
        let span = Span::dummy();
        let arr = Value::array(vec![num(10.0), num(20.0)]);
        assert_eq!(get_element(&arr, &num(1.0), span), Ok(num(20.0)));
        assert_eq!(
            get_element(&arr, &num(2.0), span).unwrap_err().to_string(),
            "Index 2 out of range for array of length 2"
        );
        assert!(matches!(
            get_element(&arr, &num(0.5), span),
            Err(RuntimeError::InvalidIndex { .. })
        ));
        assert_eq!(get_element(&Value::string("héllo"), &num(1.0), span), Ok(Value::string("é")));
    }
}
