//! Nest Runtime - embeddable, nestable interpreter
//!
//! This library provides the complete Nest runtime including:
//! - Lexical analysis, parsing and binding
//! - A tree-walking interpreter and standard library
//! - Isolated nested instances with transactional execution
//! - The `SubInterpreter` handle and its error surface

/// Nest runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Public API modules
pub mod api;
pub mod ast;
pub mod binder;
pub mod diagnostic;
pub mod gateway;
pub mod instance;
pub mod interpreter;
pub mod lexer;
pub mod method_dispatch;
pub mod parser;
pub mod repl;
pub mod span;
pub mod stdlib;
pub mod token;
pub mod value;

// Re-export commonly used types
pub use api::{ConversionError, FromValue, SubInterpreter};
pub use binder::{Binder, SymbolKind};
pub use diagnostic::{error_codes, Diagnostic, ErrorKind, TraceEntry, DIAG_VERSION};
pub use instance::{live_instances, CapturedOutput, InstanceError, InstanceId, OutputTarget};
pub use interpreter::Interpreter;
pub use lexer::Lexer;
pub use method_dispatch::MAX_INTERPRETER_NESTING;
pub use parser::{Parser, MAX_NESTING_DEPTH};
pub use repl::{ReplCore, ReplResult};
pub use span::Span;
pub use token::{Token, TokenKind};
pub use value::{RuntimeError, Value};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoke() {
        // Smoke test to verify the crate builds and tests run
        assert_eq!(VERSION, "0.1.0");
    }
}
