//! Statement parsing

use crate::ast::*;
use crate::parser::Parser;
use crate::token::TokenKind;

impl Parser {
    /// Parse a statement
    pub(super) fn parse_statement(&mut self) -> Result<Stmt, ()> {
        match self.peek().kind {
            TokenKind::Let | TokenKind::Var => self.parse_var_decl(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::For => self.parse_for_in_stmt(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::Break => self.parse_break_stmt(),
            TokenKind::Continue => self.parse_continue_stmt(),
            TokenKind::LeftBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Fn => Ok(Stmt::FunctionDecl(self.parse_function()?)),
            _ => self.parse_assign_or_expr_stmt(),
        }
    }

    /// Parse a variable declaration
    pub(super) fn parse_var_decl(&mut self) -> Result<Stmt, ()> {
        let keyword = self.advance();
        let keyword_span = keyword.span;
        let mutable = keyword.kind == TokenKind::Var;

        let name_token = self.consume_identifier("a variable name")?;
        let name = Identifier {
            name: name_token.lexeme.clone(),
            span: name_token.span,
        };

        self.consume(TokenKind::Equal, "Expected '=' in variable declaration")?;
        let init = self.parse_expression()?;
        let end_span = self
            .consume(
                TokenKind::Semicolon,
                "Expected ';' after variable declaration",
            )?
            .span;

        Ok(Stmt::VarDecl(VarDecl {
            mutable,
            name,
            init,
            span: keyword_span.merge(end_span),
        }))
    }

    /// Parse assignment or expression statement
    pub(super) fn parse_assign_or_expr_stmt(&mut self) -> Result<Stmt, ()> {
        let expr = self.parse_expression()?;
        let expr_span = expr.span();

        let op = match self.peek().kind {
            TokenKind::Equal => None,
            TokenKind::PlusEqual => Some(CompoundOp::AddAssign),
            TokenKind::MinusEqual => Some(CompoundOp::SubAssign),
            TokenKind::StarEqual => Some(CompoundOp::MulAssign),
            TokenKind::SlashEqual => Some(CompoundOp::DivAssign),
            _ => {
                let end_span = self
                    .consume(TokenKind::Semicolon, "Expected ';' after expression")?
                    .span;
                return Ok(Stmt::Expr(ExprStmt {
                    expr,
                    span: expr_span.merge(end_span),
                }));
            }
        };

        let target = self.expr_to_assign_target(expr)?;
        self.advance(); // consume the assignment operator
        let value = self.parse_expression()?;
        let end_span = self
            .consume(TokenKind::Semicolon, "Expected ';' after assignment")?
            .span;
        let span = expr_span.merge(end_span);

        Ok(match op {
            None => Stmt::Assign(Assign {
                target,
                value,
                span,
            }),
            Some(op) => Stmt::CompoundAssign(CompoundAssign {
                target,
                op,
                value,
                span,
            }),
        })
    }

    /// Convert an expression to an assignment target
    pub(super) fn expr_to_assign_target(&mut self, expr: Expr) -> Result<AssignTarget, ()> {
        match expr {
            Expr::Identifier(ident) => Ok(AssignTarget::Name(ident)),
            Expr::Index(IndexExpr {
                target,
                index,
                span,
            }) => match *target {
                Expr::Identifier(name) => Ok(AssignTarget::Index { name, index, span }),
                _ => {
                    self.error("Only a named array can be assigned by index");
                    Err(())
                }
            },
            _ => {
                self.error("Invalid assignment target");
                Err(())
            }
        }
    }

    /// Parse if statement
    pub(super) fn parse_if_stmt(&mut self) -> Result<Stmt, ()> {
        let if_span = self.consume(TokenKind::If, "Expected 'if'")?.span;

        self.consume(TokenKind::LeftParen, "Expected '(' after 'if'")?;
        let cond = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after if condition")?;

        let then_block = self.parse_block()?;
        let then_span = then_block.span;

        let else_block = if self.match_token(TokenKind::Else) {
            if self.check(TokenKind::If) {
                let nested = self.nested("Block", Self::parse_if_stmt)?;
                let span = nested.span();
                Some(Block {
                    statements: vec![nested],
                    span,
                })
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };

        let end_span = else_block.as_ref().map_or(then_span, |b| b.span);

        Ok(Stmt::If(IfStmt {
            cond,
            then_block,
            else_block,
            span: if_span.merge(end_span),
        }))
    }

    /// Parse while statement
    pub(super) fn parse_while_stmt(&mut self) -> Result<Stmt, ()> {
        let while_span = self.consume(TokenKind::While, "Expected 'while'")?.span;

        self.consume(TokenKind::LeftParen, "Expected '(' after 'while'")?;
        let cond = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after while condition")?;

        let body = self.parse_block()?;
        let body_span = body.span;

        Ok(Stmt::While(WhileStmt {
            cond,
            body,
            span: while_span.merge(body_span),
        }))
    }

    /// Parse for-in statement: `for item in expr { ... }`
    pub(super) fn parse_for_in_stmt(&mut self) -> Result<Stmt, ()> {
        let for_span = self.consume(TokenKind::For, "Expected 'for'")?.span;

        let var_token = self.consume_identifier("a loop variable name")?;
        let variable = Identifier {
            name: var_token.lexeme.clone(),
            span: var_token.span,
        };

        self.consume(TokenKind::In, "Expected 'in' after loop variable")?;
        let iterable = self.parse_expression()?;
        let body = self.parse_block()?;
        let body_span = body.span;

        Ok(Stmt::ForIn(ForInStmt {
            variable,
            iterable,
            body,
            span: for_span.merge(body_span),
        }))
    }

    /// Parse return statement
    pub(super) fn parse_return_stmt(&mut self) -> Result<Stmt, ()> {
        let return_span = self.consume(TokenKind::Return, "Expected 'return'")?.span;

        let value = if !self.check(TokenKind::Semicolon) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        let end_span = self
            .consume(TokenKind::Semicolon, "Expected ';' after return")?
            .span;

        Ok(Stmt::Return(ReturnStmt {
            value,
            span: return_span.merge(end_span),
        }))
    }

    /// Parse break statement
    pub(super) fn parse_break_stmt(&mut self) -> Result<Stmt, ()> {
        let break_span = self.consume(TokenKind::Break, "Expected 'break'")?.span;
        let end_span = self
            .consume(TokenKind::Semicolon, "Expected ';' after break")?
            .span;
        Ok(Stmt::Break(break_span.merge(end_span)))
    }

    /// Parse continue statement
    pub(super) fn parse_continue_stmt(&mut self) -> Result<Stmt, ()> {
        let continue_span = self
            .consume(TokenKind::Continue, "Expected 'continue'")?
            .span;
        let end_span = self
            .consume(TokenKind::Semicolon, "Expected ';' after continue")?
            .span;
        Ok(Stmt::Continue(continue_span.merge(end_span)))
    }

    /// Parse a block
    pub(super) fn parse_block(&mut self) -> Result<Block, ()> {
        self.nested("Block", Self::parse_block_inner)
    }

    fn parse_block_inner(&mut self) -> Result<Block, ()> {
        let start_span = self.consume(TokenKind::LeftBrace, "Expected '{'")?.span;
        let mut statements = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(_) => self.synchronize(),
            }
        }

        let end_span = self.consume(TokenKind::RightBrace, "Expected '}'")?.span;

        Ok(Block {
            statements,
            span: start_span.merge(end_span),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::diagnostic::Diagnostic;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn parse(source: &str) -> (Vec<Item>, Vec<Diagnostic>) {
        let (tokens, _) = Lexer::new(source).tokenize();
        let (program, diagnostics) = Parser::new(tokens).parse();
        (program.items, diagnostics)
    }

    fn only_stmt(source: &str) -> Stmt {
        let (mut items, diagnostics) = parse(source);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        match items.remove(0) {
            Item::Statement(stmt) => stmt,
            other => panic!("Expected statement, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_assignment_forms() {
        assert!(matches!(only_stmt("x = 1;"), Stmt::Assign(_)));
        match only_stmt("xs[0] += 2;") {
            Stmt::CompoundAssign(assign) => {
                assert_eq!(assign.op, CompoundOp::AddAssign);
                assert_eq!(assign.target.name().name, "xs");
            }
            other => panic!("Expected compound assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_assignment_target() {
        let (_, diagnostics) = parse("f() = 1;");
        assert!(diagnostics[0].message.starts_with("Invalid assignment target"));
    }

    #[test]
    fn test_else_if_chain() {
        match only_stmt("if (a) { } else if (b) { } else { }") {
            Stmt::If(stmt) => {
                let else_block = stmt.else_block.unwrap();
                assert!(matches!(else_block.statements[0], Stmt::If(_)));
            }
            other => panic!("Expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_for_in() {
        match only_stmt("for x in range(3) { print(x); }") {
            Stmt::ForIn(stmt) => {
                assert_eq!(stmt.variable.name, "x");
                assert_eq!(stmt.body.statements.len(), 1);
            }
            other => panic!("Expected for-in, got {:?}", other),
        }
    }

    #[test]
    fn test_bare_block_and_loop_control() {
        match only_stmt("while (true) { break; continue; }") {
            Stmt::While(stmt) => {
                assert!(matches!(stmt.body.statements[0], Stmt::Break(_)));
                assert!(matches!(stmt.body.statements[1], Stmt::Continue(_)));
            }
            other => panic!("Expected while, got {:?}", other),
        }
        assert!(matches!(only_stmt("{ let a = 1; }"), Stmt::Block(_)));
    }

    #[test]
    fn test_missing_semicolon() {
        let (_, diagnostics) = parse("let x = 1\nlet y = 2;");
        assert_eq!(
            diagnostics[0].message,
            "Expected ';' after variable declaration, found 'let'"
        );
        assert_eq!(diagnostics[0].line, 2);
    }

    #[test]
    fn test_unclosed_block() {
        let (_, diagnostics) = parse("invalid syntax {{{");
        assert!(!diagnostics.is_empty());
    }
}
