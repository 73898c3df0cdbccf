//! Interpreter limits
//!
//! The resolved settings a nested interpreter instance is created with.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// Default maximum depth of the script call stack
pub const DEFAULT_MAX_CALL_DEPTH: usize = 200;

/// Default number of traceback entries kept in a diagnostic
pub const DEFAULT_TRACE_LIMIT: usize = 32;

/// Fully resolved interpreter configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterConfig {
    /// Maximum number of nested script function calls before a RecursionError
    pub max_call_depth: usize,
    /// Maximum number of frames rendered in a traceback
    pub trace_limit: usize,
}

impl InterpreterConfig {
    /// Builder-style override of the call depth limit
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Builder-style override of the traceback limit
    pub fn with_trace_limit(mut self, limit: usize) -> Self {
        self.trace_limit = limit;
        self
    }

    /// Reject settings no interpreter can run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_call_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "interpreter.max_call_depth".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            trace_limit: DEFAULT_TRACE_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = InterpreterConfig::default();
        assert_eq!(config.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
        assert_eq!(config.trace_limit, DEFAULT_TRACE_LIMIT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_call_depth_rejected() {
        let config = InterpreterConfig::default().with_max_call_depth(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_call_depth"));
    }

    #[test]
    fn test_zero_trace_limit_allowed() {
        let config = InterpreterConfig::default().with_trace_limit(0);
        assert!(config.validate().is_ok());
    }
}
