//! REPL core logic (UI-agnostic)

use crate::api::SubInterpreter;
use crate::diagnostic::Diagnostic;
use crate::instance::InstanceError;
use crate::lexer::Lexer;
use crate::parser::Parser;
use nest_config::InterpreterConfig;

/// Label REPL input is reported under
pub const REPL_LABEL: &str = "<repl>";

/// Outcome of one REPL line
#[derive(Debug, Clone, PartialEq)]
pub enum ReplResult {
    /// An expression produced a value (possibly empty text)
    Value(String),
    /// Statements ran
    Executed,
    /// The attempt failed and was rolled back
    Failed(Diagnostic),
}

/// REPL core state
///
/// Maintains persistent state across multiple eval calls:
/// - Variable and function declarations persist
/// - Errors do not reset state
pub struct ReplCore {
    nest: SubInterpreter,
}

impl ReplCore {
    pub fn new(config: InterpreterConfig) -> Result<Self, InstanceError> {
        Ok(Self {
            nest: SubInterpreter::with_config(config)?,
        })
    }

    /// Wrap an existing handle
    pub fn with_handle(nest: SubInterpreter) -> Self {
        Self { nest }
    }

    /// Evaluate a line of input
    ///
    /// A line that is exactly one expression is evaluated and its value
    /// returned; anything else runs as statements.
    pub fn eval_line(&mut self, input: &str) -> ReplResult {
        let outcome = if is_single_expression(input) {
            self.nest
                .eval_expression(REPL_LABEL, input)
                .map(ReplResult::Value)
        } else {
            self.nest
                .run_source(REPL_LABEL, input)
                .map(|()| ReplResult::Executed)
        };

        outcome.unwrap_or_else(ReplResult::Failed)
    }

    pub fn handle(&self) -> &SubInterpreter {
        &self.nest
    }
}

fn is_single_expression(input: &str) -> bool {
    let (tokens, lex_diags) = Lexer::new(input).tokenize();
    if !lex_diags.is_empty() {
        return false;
    }
    let (expr, diagnostics) = Parser::new(tokens).parse_expression_only();
    expr.is_some() && diagnostics.is_empty()
}
