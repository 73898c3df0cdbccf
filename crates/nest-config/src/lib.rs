//! Nest Configuration System
//!
//! Provides configuration for Nest interpreter instances:
//! - Interpreter limits (`InterpreterConfig`)
//! - Project configuration (nest.toml)
//! - Global user configuration (~/.nest/config.toml)
//! - Configuration precedence and merging
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Built-in defaults (`InterpreterConfig::default()`)
//! 2. Global config (~/.nest/config.toml)
//! 3. Project config (./nest.toml, searched upwards)
//! 4. Environment variables (NEST_*)
//! 5. CLI flags (handled by the caller)
//!
//! # Example
//!
//! ```no_run
//! use nest_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! println!("max call depth: {}", config.interpreter.max_call_depth);
//! ```

pub mod interpreter;
pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use interpreter::InterpreterConfig;
pub use loader::{Config, ConfigLoader};
pub use project::ProjectConfig;
