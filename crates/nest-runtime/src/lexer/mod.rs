//! Lexical analysis (tokenization)
//!
//! The lexer converts Nest source code into a stream of tokens with accurate span information.

use crate::diagnostic::{line_snippet, Diagnostic};
use crate::span::Span;
use crate::token::{Token, TokenKind};

mod literals;

/// Lexer state for tokenizing source code
pub struct Lexer {
    /// Original source code
    pub(super) source: String,
    /// Characters of source code
    pub(super) chars: Vec<char>,
    /// Current position in chars
    pub(super) current: usize,
    /// Current line number (1-indexed)
    pub(super) line: usize,
    /// Current column number (1-indexed)
    pub(super) column: usize,
    /// Start position of current token
    pub(super) start_pos: usize,
    /// Start line of current token
    pub(super) start_line: usize,
    /// Start column of current token
    pub(super) start_column: usize,
    /// Collected diagnostics
    pub(super) diagnostics: Vec<Diagnostic>,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let chars: Vec<char> = source.chars().collect();
        Self {
            source,
            chars,
            current: 0,
            line: 1,
            column: 1,
            start_pos: 0,
            start_line: 1,
            start_column: 1,
            diagnostics: Vec::new(),
        }
    }

    /// Tokenize the source code, returning tokens and any diagnostics
    pub fn tokenize(&mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        (tokens, std::mem::take(&mut self.diagnostics))
    }

    /// Scan the next token
    fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        // Mark start of token
        self.start_pos = self.current;
        self.start_line = self.line;
        self.start_column = self.column;

        if self.is_at_end() {
            return self.make_token(TokenKind::Eof, "");
        }

        let c = self.advance();

        match c {
            // Single-character tokens
            '(' => self.make_token(TokenKind::LeftParen, "("),
            ')' => self.make_token(TokenKind::RightParen, ")"),
            '{' => self.make_token(TokenKind::LeftBrace, "{"),
            '}' => self.make_token(TokenKind::RightBrace, "}"),
            '[' => self.make_token(TokenKind::LeftBracket, "["),
            ']' => self.make_token(TokenKind::RightBracket, "]"),
            ';' => self.make_token(TokenKind::Semicolon, ";"),
            ',' => self.make_token(TokenKind::Comma, ","),
            '.' => self.make_token(TokenKind::Dot, "."),
            '%' => self.make_token(TokenKind::Percent, "%"),

            // Operators with potential compound forms
            '+' => self.one_or_two('=', TokenKind::PlusEqual, TokenKind::Plus),
            '-' => self.one_or_two('=', TokenKind::MinusEqual, TokenKind::Minus),
            '*' => self.one_or_two('=', TokenKind::StarEqual, TokenKind::Star),
            '/' => self.one_or_two('=', TokenKind::SlashEqual, TokenKind::Slash),
            '=' => self.one_or_two('=', TokenKind::EqualEqual, TokenKind::Equal),
            '!' => self.one_or_two('=', TokenKind::BangEqual, TokenKind::Bang),
            '<' => self.one_or_two('=', TokenKind::LessEqual, TokenKind::Less),
            '>' => self.one_or_two('=', TokenKind::GreaterEqual, TokenKind::Greater),

            // Logical operators only exist in doubled form
            '&' => {
                if self.match_char('&') {
                    self.make_token(TokenKind::AmpAmp, "&&")
                } else {
                    self.error_token("Unexpected character '&' (did you mean '&&'?)")
                }
            }
            '|' => {
                if self.match_char('|') {
                    self.make_token(TokenKind::PipePipe, "||")
                } else {
                    self.error_token("Unexpected character '|' (did you mean '||'?)")
                }
            }

            // String literals
            '"' => self.string(),

            // Numbers
            c if c.is_ascii_digit() => self.number(),

            // Identifiers and keywords
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),

            // Unexpected character
            _ => self.error_token(&format!("Unexpected character '{}'", c)),
        }
    }

    /// Emit `double` if the next character is `second`, otherwise `single`
    fn one_or_two(&mut self, second: char, double: TokenKind, single: TokenKind) -> Token {
        if self.match_char(second) {
            self.make_token(double, double.as_str())
        } else {
            self.make_token(single, single.as_str())
        }
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                ' ' | '\r' | '\t' => {
                    self.advance();
                }
                '\n' => {
                    self.advance();
                    self.line += 1;
                    self.column = 1;
                }
                '/' if self.peek_next() == Some('/') => {
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    // === Character navigation ===

    /// Advance to next character and return it
    pub(super) fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;
        self.column += 1;
        c
    }

    /// Peek at current character without advancing
    pub(super) fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.current]
        }
    }

    /// Peek at next character (current + 1)
    pub(super) fn peek_next(&self) -> Option<char> {
        self.chars.get(self.current + 1).copied()
    }

    /// Check if current character matches expected, and advance if so
    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.chars[self.current] != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    /// Check if we've reached the end of source
    pub(super) fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    // === Token creation ===

    fn current_span(&self) -> Span {
        Span::new(
            self.start_pos,
            self.current.max(self.start_pos),
            self.start_line,
            self.start_column,
        )
    }

    /// Create a token with the given kind and lexeme
    pub(super) fn make_token(&self, kind: TokenKind, lexeme: &str) -> Token {
        Token::new(kind, lexeme, self.current_span())
    }

    /// Create an error token and record a diagnostic
    pub(super) fn error_token(&mut self, message: &str) -> Token {
        let span = self.current_span();
        let snippet = line_snippet(&self.source, self.start_line);

        self.diagnostics
            .push(Diagnostic::syntax(message, span).with_snippet(snippet));

        Token::new(TokenKind::Error, message, span)
    }

    /// Create an error token for unterminated strings
    pub(super) fn error_unterminated_string(&mut self) -> Token {
        self.error_token("Unterminated string literal")
    }

    /// Create an error token for invalid escape sequences
    pub(super) fn error_invalid_escape(&mut self, escape_char: char) -> Token {
        self.error_token(&format!("Invalid escape sequence '\\{}'", escape_char))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, _) = Lexer::new(source).tokenize();
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_input() {
        let mut lexer = Lexer::new("");
        let (tokens, diagnostics) = lexer.tokenize();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert_eq!(diagnostics.len(), 0);
    }

    #[test]
    fn test_single_char_tokens() {
        assert_eq!(
            kinds("(){}[];,."),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::LeftBracket,
                TokenKind::RightBracket,
                TokenKind::Semicolon,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("+ - * / % ! == != < <= > >= && || = += -= *= /="),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::Bang,
                TokenKind::EqualEqual,
                TokenKind::BangEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::Equal,
                TokenKind::PlusEqual,
                TokenKind::MinusEqual,
                TokenKind::StarEqual,
                TokenKind::SlashEqual,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("let var fn for x in xs _tmp Interpreter"),
            vec![
                TokenKind::Let,
                TokenKind::Var,
                TokenKind::Fn,
                TokenKind::For,
                TokenKind::Identifier,
                TokenKind::In,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_line_comment_skipped() {
        assert_eq!(
            kinds("1 // ignored + 2\n3"),
            vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn test_line_and_column_tracking() {
        let (tokens, _) = Lexer::new("let x = 1;\n  x").tokenize();
        let last = &tokens[tokens.len() - 2];
        assert_eq!(last.lexeme, "x");
        assert_eq!(last.span.line, 2);
        assert_eq!(last.span.column, 3);
    }

    #[test]
    fn test_unexpected_character() {
        let (tokens, diagnostics) = Lexer::new("1 @ 2").tokenize();
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "Unexpected character '@'");
        assert_eq!(diagnostics[0].column, 3);
    }

    #[test]
    fn test_single_ampersand_is_error() {
        let (_, diagnostics) = Lexer::new("a & b").tokenize();
        assert_eq!(diagnostics.len(), 1);
    }
}
