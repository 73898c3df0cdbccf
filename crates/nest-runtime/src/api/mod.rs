//! Public embedding API for the Nest runtime
//!
//! This module provides the handle a host uses to own and drive a nested
//! interpreter:
//! - Construction with default or explicit limits
//! - Transactional execution of files, source text and expressions
//! - The error surface of the most recent failed attempt
//! - Read-only inspection of committed globals
//!
//! # Examples
//!
//! ```
//! use nest_runtime::api::SubInterpreter;
//!
//! let mut nest = SubInterpreter::new().unwrap();
//!
//! assert!(nest.parse_string("setup", "fn add(a, b) { return a + b; }"));
//! assert_eq!(nest.parse_expr("calc", "add(1, 2)"), Some("3".to_string()));
//!
//! assert!(!nest.parse_string("broken", "invalid syntax {{{"));
//! assert!(!nest.error_message().is_empty());
//! ```

pub mod conversion;
pub mod runtime;

// Re-export main types for convenience
pub use conversion::{ConversionError, FromValue};
pub use runtime::SubInterpreter;
