//! Nested instance lifecycle
//!
//! A [`NestedInstance`] exclusively owns one [`Interpreter`]: its global
//! namespace, value space and call stack. Instances are created with a
//! validated configuration and released exactly once when dropped.
//!
//! The only process-wide state is a pair of counters used for id allocation
//! and first-use/last-release accounting.

use crate::diagnostic::Diagnostic;
use crate::interpreter::Interpreter;
use nest_config::{ConfigError, InterpreterConfig};
use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use thiserror::Error;
use tracing::{debug, trace};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);
static LIVE_INSTANCES: AtomicUsize = AtomicUsize::new(0);

/// Number of nested instances currently alive in this process
pub fn live_instances() -> usize {
    LIVE_INSTANCES.load(Ordering::SeqCst)
}

/// Process-unique identity of a nested instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    fn next() -> Self {
        InstanceId(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Failure to construct a nested instance
///
/// No handle exists yet when this happens, so it cannot be reported through
/// a diagnostic slot.
#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("Cannot allocate a call stack of {frames} frame(s)")]
    AllocationFailure { frames: usize },

    #[error("Invalid interpreter configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// In-memory sink for program output
///
/// Clones share the same buffer, so a host can keep one clone and hand the
/// other to an interpreter.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput(Rc<RefCell<String>>);

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        self.0.borrow().clone()
    }

    /// Drain the buffer
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    fn push_line(&self, line: &str) {
        let mut buffer = self.0.borrow_mut();
        buffer.push_str(line);
        buffer.push('\n');
    }
}

/// Where `print` output of an instance goes
#[derive(Debug, Clone, Default)]
pub enum OutputTarget {
    #[default]
    Stdout,
    Capture(CapturedOutput),
}

impl OutputTarget {
    pub(crate) fn write_line(&self, line: &str) -> io::Result<()> {
        match self {
            OutputTarget::Stdout => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", line)?;
                stdout.flush()
            }
            OutputTarget::Capture(buffer) => {
                buffer.push_line(line);
                Ok(())
            }
        }
    }
}

/// An exclusively owned interpreter plus its current-error slot
pub struct NestedInstance {
    id: InstanceId,
    interpreter: Interpreter,
    last_error: Option<Diagnostic>,
}

impl NestedInstance {
    /// Allocate a fresh instance
    pub fn create(config: InterpreterConfig, output: OutputTarget) -> Result<Self, InstanceError> {
        config.validate()?;

        let interpreter = Interpreter::new(config, output).map_err(|_| {
            InstanceError::AllocationFailure {
                frames: config.max_call_depth,
            }
        })?;

        let id = InstanceId::next();
        let live = LIVE_INSTANCES.fetch_add(1, Ordering::SeqCst) + 1;
        if live == 1 {
            debug!("first nested instance created");
        }
        debug!(instance = %id, live, max_call_depth = config.max_call_depth, "instance created");

        Ok(Self {
            id,
            interpreter,
            last_error: None,
        })
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub(crate) fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Diagnostic of the most recent failed attempt, if the last attempt failed
    pub fn last_error(&self) -> Option<&Diagnostic> {
        self.last_error.as_ref()
    }

    /// Replace the error slot with a new failure
    pub(crate) fn record_failure(&mut self, diagnostic: Diagnostic) {
        self.last_error = Some(diagnostic);
    }

    pub(crate) fn clear_error(&mut self) {
        self.last_error = None;
    }
}

impl fmt::Debug for NestedInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestedInstance")
            .field("id", &self.id)
            .field("globals", &self.interpreter.global_names().len())
            .field("failed", &self.last_error.is_some())
            .finish()
    }
}

impl Drop for NestedInstance {
    fn drop(&mut self) {
        let remaining = LIVE_INSTANCES.fetch_sub(1, Ordering::SeqCst) - 1;
        trace!(instance = %self.id, remaining, "instance released");
        if remaining == 0 {
            debug!("last nested instance released");
        }
    }
}
