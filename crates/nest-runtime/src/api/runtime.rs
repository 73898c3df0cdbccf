//! The sub-interpreter handle
//!
//! Provides `SubInterpreter`, which exclusively owns one nested instance.
//! State persists across successful attempts; failed attempts are rolled
//! back and leave their diagnostic on the handle.
//!
//! # Examples
//!
//! ```
//! use nest_runtime::api::SubInterpreter;
//!
//! let mut nest = SubInterpreter::new().unwrap();
//!
//! // Execute code
//! nest.run_source("setup", "let x = 42;").unwrap();
//!
//! // State persists
//! assert_eq!(nest.eval_expression("calc", "x + 1").unwrap(), "43");
//! ```

use crate::api::conversion::{ConversionError, FromValue};
use crate::diagnostic::Diagnostic;
use crate::gateway;
use crate::instance::{InstanceError, InstanceId, NestedInstance, OutputTarget};
use crate::value::Value;
use nest_config::InterpreterConfig;
use std::fmt;
use std::path::Path;

/// Handle owning one isolated interpreter instance
///
/// Dropping the handle (or calling [`SubInterpreter::close`]) releases the
/// instance exactly once. Handles are not `Send`: an instance belongs to the
/// thread that created it.
///
/// # Examples
///
/// ```
/// use nest_runtime::api::SubInterpreter;
///
/// let mut a = SubInterpreter::new().unwrap();
/// let mut b = SubInterpreter::new().unwrap();
///
/// a.run_source("a", "let only_in_a = 1;").unwrap();
/// assert!(b.run_source("b", "only_in_a;").is_err());
/// ```
pub struct SubInterpreter {
    instance: NestedInstance,
}

impl SubInterpreter {
    /// Create a handle with default limits, printing to stdout
    ///
    /// # Examples
    ///
    /// ```
    /// use nest_runtime::api::SubInterpreter;
    ///
    /// let nest = SubInterpreter::new().unwrap();
    /// assert_eq!(nest.error(), "");
    /// ```
    pub fn new() -> Result<Self, InstanceError> {
        Self::with_config(InterpreterConfig::default())
    }

    /// Create a handle with explicit limits
    ///
    /// # Examples
    ///
    /// ```
    /// use nest_config::InterpreterConfig;
    /// use nest_runtime::api::SubInterpreter;
    ///
    /// let config = InterpreterConfig::default().with_max_call_depth(50);
    /// let nest = SubInterpreter::with_config(config).unwrap();
    /// assert_eq!(nest.config().max_call_depth, 50);
    /// ```
    pub fn with_config(config: InterpreterConfig) -> Result<Self, InstanceError> {
        Self::with_options(config, OutputTarget::Stdout)
    }

    /// Create a handle with explicit limits and output target
    ///
    /// # Examples
    ///
    /// ```
    /// use nest_config::InterpreterConfig;
    /// use nest_runtime::api::SubInterpreter;
    /// use nest_runtime::{CapturedOutput, OutputTarget};
    ///
    /// let output = CapturedOutput::new();
    /// let mut nest = SubInterpreter::with_options(
    ///     InterpreterConfig::default(),
    ///     OutputTarget::Capture(output.clone()),
    /// )
    /// .unwrap();
    ///
    /// nest.run_source("hello", "print(\"hi\");").unwrap();
    /// assert_eq!(output.contents(), "hi\n");
    /// ```
    pub fn with_options(
        config: InterpreterConfig,
        output: OutputTarget,
    ) -> Result<Self, InstanceError> {
        Ok(Self {
            instance: NestedInstance::create(config, output)?,
        })
    }

    /// Process-unique identity of the owned instance
    pub fn id(&self) -> InstanceId {
        self.instance.id()
    }

    /// Limits the instance was created with
    pub fn config(&self) -> &InterpreterConfig {
        self.instance.interpreter().config()
    }

    // === Transactional execution ===

    /// Compile and run statements; `label` names the source in diagnostics
    ///
    /// On failure the instance is restored to its state before the call.
    ///
    /// # Examples
    ///
    /// ```
    /// use nest_runtime::api::SubInterpreter;
    ///
    /// let mut nest = SubInterpreter::new().unwrap();
    /// let err = nest.run_source("t", "let a = 1;\nlet b = a / 0;").unwrap_err();
    /// assert_eq!(err.line, 2);
    /// assert!(nest.global("a").is_none());
    /// ```
    pub fn run_source(&mut self, label: &str, source: &str) -> Result<(), Diagnostic> {
        gateway::run_source(&mut self.instance, label, source)
    }

    /// Read and run a file, labelled with its path
    pub fn run_file(&mut self, path: impl AsRef<Path>) -> Result<(), Diagnostic> {
        gateway::run_file(&mut self.instance, path.as_ref())
    }

    /// Evaluate a single expression and render its value
    ///
    /// A value with no printable form (`null`) renders as the empty string.
    ///
    /// # Examples
    ///
    /// ```
    /// use nest_runtime::api::SubInterpreter;
    ///
    /// let mut nest = SubInterpreter::new().unwrap();
    /// assert_eq!(nest.eval_expression("e", "1 + 1").unwrap(), "2");
    /// assert_eq!(nest.eval_expression("e", "null").unwrap(), "");
    /// ```
    pub fn eval_expression(&mut self, label: &str, source: &str) -> Result<String, Diagnostic> {
        gateway::eval_expression(&mut self.instance, label, source)
    }

    /// Compile against the committed namespace without running anything
    ///
    /// Neither the namespace nor the error surface changes.
    pub fn check_source(&self, label: &str, source: &str) -> Result<(), Diagnostic> {
        gateway::check_source(&self.instance, label, source)
    }

    // === Error surface ===

    /// Structured diagnostic of the most recent attempt, if it failed
    pub fn last_diagnostic(&self) -> Option<&Diagnostic> {
        self.instance.last_error()
    }

    /// Full text (message and trace) of the last failure, or empty
    pub fn error(&self) -> String {
        self.instance
            .last_error()
            .map(Diagnostic::full_text)
            .unwrap_or_default()
    }

    /// Bare message of the last failure, or empty
    pub fn error_message(&self) -> String {
        self.instance
            .last_error()
            .map(|diagnostic| diagnostic.message_only().to_string())
            .unwrap_or_default()
    }

    // === Host contract ===

    /// Run `data` labelled `context`; true on success
    pub fn parse_string(&mut self, context: &str, data: &str) -> bool {
        self.run_source(context, data).is_ok()
    }

    /// Run the file at `filename`; true on success
    pub fn parse_file(&mut self, filename: impl AsRef<Path>) -> bool {
        self.run_file(filename).is_ok()
    }

    /// Evaluate `data` labelled `context`; `None` on failure
    pub fn parse_expr(&mut self, context: &str, data: &str) -> Option<String> {
        self.eval_expression(context, data).ok()
    }

    // === Inspection ===

    /// Committed value of a global
    pub fn global(&self, name: &str) -> Option<Value> {
        self.instance.interpreter().global(name).cloned()
    }

    /// Committed value of a global converted to a Rust type
    ///
    /// # Examples
    ///
    /// ```
    /// use nest_runtime::api::SubInterpreter;
    ///
    /// let mut nest = SubInterpreter::new().unwrap();
    /// nest.run_source("s", "let scores = [3, 4];").unwrap();
    /// let scores: Vec<f64> = nest.global_as("scores").unwrap();
    /// assert_eq!(scores, vec![3.0, 4.0]);
    /// ```
    pub fn global_as<T: FromValue>(&self, name: &str) -> Result<T, ConversionError> {
        let value = self
            .instance
            .interpreter()
            .global(name)
            .ok_or_else(|| ConversionError::Missing(name.to_string()))?;
        T::from_value(value)
    }

    /// Sorted names of committed globals
    pub fn global_names(&self) -> Vec<String> {
        self.instance.interpreter().global_names()
    }

    /// Release the instance now
    ///
    /// Consumes the handle, so it cannot be used afterwards.
    pub fn close(self) {
        drop(self);
    }
}

impl fmt::Debug for SubInterpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubInterpreter")
            .field("instance", &self.instance)
            .finish()
    }
}
