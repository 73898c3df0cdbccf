//! Expression parsing (Pratt parsing)

use crate::ast::*;
use crate::parser::{Parser, Precedence};
use crate::token::TokenKind;

impl Parser {
    /// Parse an expression
    pub(super) fn parse_expression(&mut self) -> Result<Expr, ()> {
        self.parse_precedence(Precedence::Lowest)
    }

    /// Parse expression with given precedence
    ///
    /// On success `last_depth` holds the depth of the returned tree.
    pub(super) fn parse_precedence(&mut self, precedence: Precedence) -> Result<Expr, ()> {
        self.nested("Expression", |parser| {
            let mut left = parser.parse_prefix()?;

            while precedence < parser.current_precedence() {
                left = parser.parse_infix(left)?;
            }

            Ok(left)
        })
    }

    /// Parse prefix expression
    fn parse_prefix(&mut self) -> Result<Expr, ()> {
        match self.peek().kind {
            TokenKind::Number => self.parse_number(),
            TokenKind::String => self.parse_string(),
            TokenKind::True | TokenKind::False => self.parse_bool(),
            TokenKind::Null => self.parse_null(),
            TokenKind::Identifier => self.parse_identifier(),
            TokenKind::LeftParen => self.parse_group(),
            TokenKind::LeftBracket => self.parse_array_literal(),
            TokenKind::Minus | TokenKind::Bang => self.parse_unary(),
            _ => {
                self.error("Expected expression");
                Err(())
            }
        }
    }

    /// Parse infix expression
    ///
    /// Entered with `last_depth` set to the depth of `left`.
    fn parse_infix(&mut self, left: Expr) -> Result<Expr, ()> {
        match self.peek().kind {
            TokenKind::LeftParen => self.parse_call(left),
            TokenKind::LeftBracket => self.parse_index(left),
            TokenKind::Dot => self.parse_member(left),
            kind if binary_op(kind).is_some() => self.parse_binary(left),
            _ => Ok(left),
        }
    }

    /// Get current token precedence
    pub(super) fn current_precedence(&self) -> Precedence {
        token_precedence(self.peek().kind)
    }

    /// Parse number literal
    fn parse_number(&mut self) -> Result<Expr, ()> {
        let token = self.advance();
        let span = token.span;
        match token.lexeme.parse::<f64>() {
            Ok(value) => {
                self.last_depth = 1;
                Ok(Expr::Literal(Literal::Number(value), span))
            }
            Err(_) => {
                self.error("Invalid number literal");
                Err(())
            }
        }
    }

    /// Parse string literal
    fn parse_string(&mut self) -> Result<Expr, ()> {
        let token = self.advance();
        let expr = Expr::Literal(Literal::String(token.lexeme.clone()), token.span);
        self.last_depth = 1;
        Ok(expr)
    }

    /// Parse boolean literal
    fn parse_bool(&mut self) -> Result<Expr, ()> {
        let token = self.advance();
        let expr = Expr::Literal(Literal::Bool(token.kind == TokenKind::True), token.span);
        self.last_depth = 1;
        Ok(expr)
    }

    /// Parse null literal
    fn parse_null(&mut self) -> Result<Expr, ()> {
        let span = self.advance().span;
        self.last_depth = 1;
        Ok(Expr::Literal(Literal::Null, span))
    }

    /// Parse identifier
    fn parse_identifier(&mut self) -> Result<Expr, ()> {
        let token = self.advance();
        let expr = Expr::Identifier(Identifier {
            name: token.lexeme.clone(),
            span: token.span,
        });
        self.last_depth = 1;
        Ok(expr)
    }

    /// Parse grouped expression
    fn parse_group(&mut self) -> Result<Expr, ()> {
        let start_span = self.consume(TokenKind::LeftParen, "Expected '('")?.span;
        let expr = self.parse_expression()?;
        let inner = self.last_depth;
        let end_span = self.consume(TokenKind::RightParen, "Expected ')'")?.span;
        self.node_depth(inner)?;

        Ok(Expr::Group(GroupExpr {
            expr: Box::new(expr),
            span: start_span.merge(end_span),
        }))
    }

    /// Parse array literal
    fn parse_array_literal(&mut self) -> Result<Expr, ()> {
        let start_span = self.consume(TokenKind::LeftBracket, "Expected '['")?.span;
        let (elements, inner) = self.parse_arguments(TokenKind::RightBracket)?;
        let end_span = self.consume(TokenKind::RightBracket, "Expected ']'")?.span;
        self.node_depth(inner)?;

        Ok(Expr::ArrayLiteral(ArrayLiteral {
            elements,
            span: start_span.merge(end_span),
        }))
    }

    /// Parse unary expression
    fn parse_unary(&mut self) -> Result<Expr, ()> {
        let op_token = self.advance();
        let op_span = op_token.span;
        let op = if op_token.kind == TokenKind::Minus {
            UnaryOp::Negate
        } else {
            UnaryOp::Not
        };

        let operand = self.parse_precedence(Precedence::Unary)?;
        let operand_span = operand.span();
        self.node_depth(self.last_depth)?;

        Ok(Expr::Unary(UnaryExpr {
            op,
            expr: Box::new(operand),
            span: op_span.merge(operand_span),
        }))
    }

    /// Parse binary expression
    fn parse_binary(&mut self, left: Expr) -> Result<Expr, ()> {
        let left_span = left.span();
        let left_depth = self.last_depth;
        let op_kind = self.advance().kind;
        let precedence = token_precedence(op_kind);
        let Some(op) = binary_op(op_kind) else {
            self.error("Expected operator");
            return Err(());
        };

        let right = self.parse_precedence(precedence)?;
        let right_span = right.span();
        self.node_depth(left_depth.max(self.last_depth))?;

        Ok(Expr::Binary(BinaryExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span: left_span.merge(right_span),
        }))
    }

    /// Parse call expression
    fn parse_call(&mut self, callee: Expr) -> Result<Expr, ()> {
        let callee_span = callee.span();
        let callee_depth = self.last_depth;
        self.consume(TokenKind::LeftParen, "Expected '('")?;
        let (args, args_depth) = self.parse_arguments(TokenKind::RightParen)?;
        let end_span = self.consume(TokenKind::RightParen, "Expected ')'")?.span;
        self.node_depth(callee_depth.max(args_depth))?;

        Ok(Expr::Call(CallExpr {
            callee: Box::new(callee),
            args,
            span: callee_span.merge(end_span),
        }))
    }

    /// Parse index expression
    fn parse_index(&mut self, target: Expr) -> Result<Expr, ()> {
        let target_span = target.span();
        let target_depth = self.last_depth;
        self.consume(TokenKind::LeftBracket, "Expected '['")?;
        let index = self.parse_expression()?;
        let index_depth = self.last_depth;
        let end_span = self.consume(TokenKind::RightBracket, "Expected ']'")?.span;
        self.node_depth(target_depth.max(index_depth))?;

        Ok(Expr::Index(IndexExpr {
            target: Box::new(target),
            index: Box::new(index),
            span: target_span.merge(end_span),
        }))
    }

    /// Parse method call: `target.name(args)`
    fn parse_member(&mut self, target: Expr) -> Result<Expr, ()> {
        let target_span = target.span();
        let target_depth = self.last_depth;
        self.consume(TokenKind::Dot, "Expected '.'")?;
        let name_tok = self.consume_identifier("a method name")?;
        let member = Identifier {
            name: name_tok.lexeme.clone(),
            span: name_tok.span,
        };

        self.consume(TokenKind::LeftParen, "Expected '(' after method name")?;
        let (args, args_depth) = self.parse_arguments(TokenKind::RightParen)?;
        let end_span = self.consume(TokenKind::RightParen, "Expected ')'")?.span;
        self.node_depth(target_depth.max(args_depth))?;

        Ok(Expr::Member(MemberExpr {
            target: Box::new(target),
            member,
            args,
            span: target_span.merge(end_span),
        }))
    }

    /// Comma-separated expressions up to (not including) `close`, with the
    /// depth of the deepest one
    fn parse_arguments(&mut self, close: TokenKind) -> Result<(Vec<Expr>, usize), ()> {
        let mut args = Vec::new();
        let mut deepest = 0;

        if !self.check(close) {
            loop {
                args.push(self.parse_expression()?);
                deepest = deepest.max(self.last_depth);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }

        Ok((args, deepest))
    }
}

/// Binding power of an infix token
fn token_precedence(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::PipePipe => Precedence::Or,
        TokenKind::AmpAmp => Precedence::And,
        TokenKind::EqualEqual | TokenKind::BangEqual => Precedence::Equality,
        TokenKind::Less | TokenKind::LessEqual | TokenKind::Greater | TokenKind::GreaterEqual => {
            Precedence::Comparison
        }
        TokenKind::Plus | TokenKind::Minus => Precedence::Term,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Precedence::Factor,
        TokenKind::LeftParen | TokenKind::LeftBracket | TokenKind::Dot => Precedence::Call,
        _ => Precedence::Lowest,
    }
}

/// Binary operator for an infix token
fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::EqualEqual => BinaryOp::Eq,
        TokenKind::BangEqual => BinaryOp::Ne,
        TokenKind::Less => BinaryOp::Lt,
        TokenKind::LessEqual => BinaryOp::Le,
        TokenKind::Greater => BinaryOp::Gt,
        TokenKind::GreaterEqual => BinaryOp::Ge,
        TokenKind::AmpAmp => BinaryOp::And,
        TokenKind::PipePipe => BinaryOp::Or,
        _ => return None,
    };
    Some(op)
}
