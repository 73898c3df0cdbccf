//! Diagnostic system for failed attempts
//!
//! Every failure an attempt can produce (lexing, parsing, resolving, running,
//! opening a file) flows through the unified `Diagnostic` type. A nested
//! instance keeps at most one of these in its error slot; `full_text` and
//! `message` are the two views the error surface exposes.

use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic schema version
pub const DIAG_VERSION: u32 = 1;

/// Function name used for top-level code in tracebacks
pub const MAIN_FRAME: &str = "__main__";

/// Classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Lexing or parsing failed, or a construct appears where it is not allowed
    Syntax,
    /// Reference to an unknown name
    Name,
    /// Assignment to something that is not a mutable binding
    Assign,
    /// Operation applied to values of the wrong type
    Type,
    /// Wrong number of arguments
    Argument,
    /// Division or modulo by zero
    DivisionByZero,
    /// Index out of range or not a whole number, or an unallocatable length
    Index,
    /// Call depth limit exceeded
    Recursion,
    /// Raised explicitly by script code
    Raised,
    /// Nested interpreter misuse (reentrant call, nesting too deep, construction failure)
    Interpreter,
    /// Source file could not be read
    Io,
}

impl ErrorKind {
    /// Name shown at the start of the full diagnostic text
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::Name => "NameError",
            ErrorKind::Assign => "AssignError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Argument => "ArgumentError",
            ErrorKind::DivisionByZero => "DivisionByZeroError",
            ErrorKind::Index => "IndexError",
            ErrorKind::Recursion => "RecursionError",
            ErrorKind::Raised => "Error",
            ErrorKind::Interpreter => "InterpreterError",
            ErrorKind::Io => "IoError",
        }
    }

    /// Stable diagnostic code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Syntax => error_codes::SYNTAX_ERROR,
            ErrorKind::Name => error_codes::UNDEFINED_NAME,
            ErrorKind::Assign => error_codes::INVALID_ASSIGNMENT,
            ErrorKind::Type => error_codes::TYPE_ERROR,
            ErrorKind::Argument => error_codes::ARGUMENT_ERROR,
            ErrorKind::DivisionByZero => error_codes::DIVIDE_BY_ZERO,
            ErrorKind::Index => error_codes::INDEX_ERROR,
            ErrorKind::Recursion => error_codes::RECURSION_LIMIT,
            ErrorKind::Raised => error_codes::RAISED,
            ErrorKind::Interpreter => error_codes::INTERPRETER_MISUSE,
            ErrorKind::Io => error_codes::IO_ERROR,
        }
    }

}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One frame of a runtime traceback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Label of the source the frame's code came from
    pub file: String,
    /// Line being executed in that frame (1-based)
    pub line: usize,
    /// Function name, or `__main__` for top-level code
    pub function: String,
}

/// A failed attempt's diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Diagnostic schema version
    pub diag_version: u32,
    /// Failure classification
    pub kind: ErrorKind,
    /// Error code (e.g., "NE0005")
    pub code: String,
    /// Bare message, no kind prefix and no location
    pub message: String,
    /// Source label (file path or caller-supplied context)
    pub file: String,
    /// Line number (1-based, 0 when there is no location)
    pub line: usize,
    /// Column number (1-based, 0 when there is no location)
    pub column: usize,
    /// Source line the failure points at
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub snippet: String,
    /// Runtime traceback, innermost frame first
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub trace: Vec<TraceEntry>,
    /// Frames dropped from `trace` by the trace limit
    #[serde(skip_serializing_if = "is_zero", default)]
    pub omitted_frames: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl Diagnostic {
    /// Create a diagnostic of the given kind at a span
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            diag_version: DIAG_VERSION,
            kind,
            code: kind.code().to_string(),
            message: message.into(),
            file: "<unknown>".to_string(),
            line: span.line,
            column: span.column,
            snippet: String::new(),
            trace: Vec::new(),
            omitted_frames: 0,
        }
    }

    /// Shorthand for a syntax error
    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Syntax, message, span)
    }

    /// Diagnostic for a source file that could not be read
    pub fn io(path: &str, error: &std::io::Error) -> Self {
        Self::new(
            ErrorKind::Io,
            format!("Failed to open '{}': {}", path, error),
            Span::dummy(),
        )
        .with_file(path)
    }

    /// Set the file path / source label
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }

    /// Set the line number
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    /// Set the snippet (source line)
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    /// Attach a traceback, keeping at most `limit` frames
    pub fn with_trace(mut self, mut trace: Vec<TraceEntry>, limit: usize) -> Self {
        if trace.len() > limit {
            self.omitted_frames = trace.len() - limit;
            trace.truncate(limit);
        }
        self.trace = trace;
        self
    }

    /// Whether this diagnostic came from running code (it carries a traceback)
    pub fn is_runtime(&self) -> bool {
        !self.trace.is_empty() || self.omitted_frames > 0
    }

    /// The bare message (the error surface's `error_message`)
    pub fn message_only(&self) -> &str {
        &self.message
    }

    /// Message plus location or traceback (the error surface's `error`)
    pub fn full_text(&self) -> String {
        let mut output = format!("{}: {}\n", self.kind, self.message);

        if self.is_runtime() {
            output.push_str("Traceback:\n");
            for entry in &self.trace {
                output.push_str(&format!(
                    "    from {}:{}: in {}\n",
                    entry.file, entry.line, entry.function
                ));
            }
            if self.omitted_frames > 0 {
                output.push_str(&format!("    ... {} more frame(s)\n", self.omitted_frames));
            }
        } else if self.kind != ErrorKind::Io {
            output.push_str(&format!("    from {}:{}\n", self.file, self.line));
        }

        output
    }

    /// Format with the offending source line underneath (used by `nest check`)
    pub fn to_human_string(&self) -> String {
        let mut output = format!("error[{}]: {}\n", self.code, self.message);

        if self.line > 0 {
            output.push_str(&format!("  --> {}:{}:{}\n", self.file, self.line, self.column));
        }

        if !self.snippet.is_empty() {
            output.push_str("   |\n");
            output.push_str(&format!("{:>2} | {}\n", self.line, self.snippet));
            if self.column > 0 {
                output.push_str(&format!("   | {}^\n", " ".repeat(self.column - 1)));
            }
        }

        output
    }

    /// Format as JSON string
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_text())
    }
}

impl std::error::Error for Diagnostic {}

/// Extract a 1-based line from source text for snippets
pub fn line_snippet(source: &str, line: usize) -> String {
    if line == 0 {
        return String::new();
    }
    source.lines().nth(line - 1).unwrap_or("").to_string()
}

/// Error code registry
pub mod error_codes {
    // NE0xxx - Runtime faults
    pub const TYPE_ERROR: &str = "NE0001";
    pub const ARGUMENT_ERROR: &str = "NE0002";
    pub const DIVIDE_BY_ZERO: &str = "NE0005";
    pub const INDEX_ERROR: &str = "NE0006";
    pub const RECURSION_LIMIT: &str = "NE0007";
    pub const RAISED: &str = "NE0008";
    pub const INTERPRETER_MISUSE: &str = "NE0009";

    // NE1xxx - Compile failures
    pub const SYNTAX_ERROR: &str = "NE1000";
    pub const UNDEFINED_NAME: &str = "NE1001";
    pub const INVALID_ASSIGNMENT: &str = "NE1002";

    // NE9xxx - Host failures
    pub const IO_ERROR: &str = "NE9001";
}
