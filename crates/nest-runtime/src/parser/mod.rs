//! Parsing (tokens to AST)
//!
//! The parser converts a stream of tokens into an Abstract Syntax Tree (AST).
//! Uses Pratt parsing for expressions and recursive descent for statements.

mod expr;
mod stmt;

use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::token::{Token, TokenKind};

/// Deepest block or expression nesting the parser accepts
///
/// Bounds both the parser's own recursion and the depth of every expression
/// tree it produces, so later passes never recurse further than this.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Parser state for building AST from tokens
pub struct Parser {
    pub(super) tokens: Vec<Token>,
    pub(super) current: usize,
    pub(super) diagnostics: Vec<Diagnostic>,
    /// Active recursive productions (blocks, `else if`, expressions)
    pub(super) nesting: usize,
    /// Tree depth of the expression most recently parsed
    pub(super) last_depth: usize,
}

/// Operator precedence levels for Pratt parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) enum Precedence {
    Lowest,
    Or,         // ||
    And,        // &&
    Equality,   // == !=
    Comparison, // < <= > >=
    Term,       // + -
    Factor,     // * / %
    Unary,      // ! -
    Call,       // () [] .
}

impl Parser {
    /// Create a new parser for the given tokens
    ///
    /// The token stream must end with `Eof`, as produced by the lexer.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            diagnostics: Vec::new(),
            nesting: 0,
            last_depth: 0,
        }
    }

    /// Parse tokens into an AST
    pub fn parse(&mut self) -> (Program, Vec<Diagnostic>) {
        let mut items = Vec::new();

        while !self.is_at_end() {
            match self.parse_item() {
                Ok(item) => items.push(item),
                Err(_) => self.synchronize(),
            }
        }

        (Program { items }, std::mem::take(&mut self.diagnostics))
    }

    /// Parse tokens that must form exactly one expression
    ///
    /// A single trailing `;` is tolerated.
    pub fn parse_expression_only(&mut self) -> (Option<Expr>, Vec<Diagnostic>) {
        let expr = match self.parse_expression() {
            Ok(expr) => {
                self.match_token(TokenKind::Semicolon);
                if self.is_at_end() {
                    Some(expr)
                } else {
                    self.error("Expected end of expression");
                    None
                }
            }
            Err(_) => None,
        };

        (expr, std::mem::take(&mut self.diagnostics))
    }

    // === Top-level parsing ===

    /// Parse a top-level item (function or statement)
    fn parse_item(&mut self) -> Result<Item, ()> {
        if self.check(TokenKind::Fn) {
            Ok(Item::Function(self.parse_function()?))
        } else {
            Ok(Item::Statement(self.parse_statement()?))
        }
    }

    /// Parse a function declaration
    pub(super) fn parse_function(&mut self) -> Result<FunctionDecl, ()> {
        let fn_span = self.consume(TokenKind::Fn, "Expected 'fn'")?.span;

        let name_token = self.consume_identifier("a function name")?;
        let name = Identifier {
            name: name_token.lexeme.clone(),
            span: name_token.span,
        };

        self.consume(TokenKind::LeftParen, "Expected '(' after function name")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                let param_tok = self.consume_identifier("a parameter name")?;
                params.push(Identifier {
                    name: param_tok.lexeme.clone(),
                    span: param_tok.span,
                });

                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.consume(TokenKind::RightParen, "Expected ')' after parameters")?;

        let body = self.parse_block()?;
        let end_span = body.span;

        Ok(FunctionDecl {
            name,
            params,
            body,
            span: fn_span.merge(end_span),
        })
    }

    // === Helper methods ===

    /// Advance to next token and return reference to previous
    pub(super) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        &self.tokens[self.current - 1]
    }

    /// Peek at current token
    pub(super) fn peek(&self) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[self.current.min(last)]
    }

    /// Check if current token matches kind
    pub(super) fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    /// Match and consume token if it matches
    pub(super) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume token of given kind or error
    pub(super) fn consume(&mut self, kind: TokenKind, message: &str) -> Result<&Token, ()> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            self.error(message);
            Err(())
        }
    }

    /// Check if at end of token stream
    pub(super) fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len() || self.tokens[self.current].kind == TokenKind::Eof
    }

    /// Record an error at the current token
    ///
    /// Lexer error tokens already carry a diagnostic, so none is added for them.
    pub(super) fn error(&mut self, message: &str) {
        let token = self.peek();
        if token.kind == TokenKind::Error {
            return;
        }
        let span = token.span;
        let found = describe_token(token);
        self.diagnostics
            .push(Diagnostic::syntax(format!("{}, found {}", message, found), span));
    }

    /// Run a recursive production one nesting level deeper
    pub(super) fn nested<T>(
        &mut self,
        what: &str,
        parse: impl FnOnce(&mut Self) -> Result<T, ()>,
    ) -> Result<T, ()> {
        if self.nesting >= MAX_NESTING_DEPTH {
            self.too_deep(what);
            return Err(());
        }
        self.nesting += 1;
        let result = parse(self);
        self.nesting -= 1;
        result
    }

    /// Record the depth of a new expression node built over `children`
    pub(super) fn node_depth(&mut self, children: usize) -> Result<(), ()> {
        let depth = children + 1;
        if depth > MAX_NESTING_DEPTH {
            self.too_deep("Expression");
            return Err(());
        }
        self.last_depth = depth;
        Ok(())
    }

    fn too_deep(&mut self, what: &str) {
        let span = self.peek().span;
        self.diagnostics.push(Diagnostic::syntax(
            format!("{} nested too deeply (limit {})", what, MAX_NESTING_DEPTH),
            span,
        ));
    }

    /// Consume an identifier token with a clearer message for keywords
    pub(super) fn consume_identifier(&mut self, context: &str) -> Result<&Token, ()> {
        let kind = self.peek().kind;

        if kind == TokenKind::Identifier {
            return Ok(self.advance());
        }

        if TokenKind::is_keyword(kind.as_str()).is_some() {
            let message = format!("Cannot use reserved keyword '{}' as {}", kind.as_str(), context);
            let span = self.peek().span;
            self.diagnostics.push(Diagnostic::syntax(message, span));
        } else {
            self.error(&format!("Expected {}", context));
        }
        Err(())
    }

    /// Synchronize after error
    pub(super) fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.tokens[self.current - 1].kind == TokenKind::Semicolon {
                return;
            }

            match self.peek().kind {
                TokenKind::Fn
                | TokenKind::Let
                | TokenKind::Var
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

/// How a token is named in "found ..." messages
fn describe_token(token: &Token) -> String {
    match token.kind {
        TokenKind::Eof => "end of input".to_string(),
        TokenKind::Identifier => format!("identifier '{}'", token.lexeme),
        TokenKind::Number => format!("number {}", token.lexeme),
        TokenKind::String => "string literal".to_string(),
        kind => format!("'{}'", kind.as_str()),
    }
}
