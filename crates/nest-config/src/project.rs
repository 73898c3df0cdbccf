//! Configuration files (nest.toml, ~/.nest/config.toml)
//!
//! Both files share one schema. Every field is optional so that a file only
//! needs to mention what it overrides.

use crate::interpreter::InterpreterConfig;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration file name
pub const PROJECT_CONFIG_FILE: &str = "nest.toml";

/// Contents of a nest.toml or global config file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Interpreter limits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<InterpreterSection>,
}

/// `[interpreter]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct InterpreterSection {
    /// Maximum script call depth
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_call_depth: Option<usize>,

    /// Maximum traceback entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_limit: Option<usize>,
}

impl ProjectConfig {
    /// Parse configuration from TOML text
    pub fn parse(content: &str, file: &Path) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::TomlParseError {
            file: file.to_path_buf(),
            error: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        Self::parse(&content, path)
    }

    /// Validate the values present in the file
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(section) = &self.interpreter {
            if section.max_call_depth == Some(0) {
                return Err(ConfigError::InvalidValue {
                    field: "interpreter.max_call_depth".to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Get the global config file path (~/.nest/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".nest").join("config.toml"))
    }

    /// Merge another config into this one
    /// Other config takes precedence for values it sets
    pub fn merge(&mut self, other: &ProjectConfig) {
        let Some(theirs) = &other.interpreter else {
            return;
        };
        let ours = self.interpreter.get_or_insert_with(InterpreterSection::default);
        if theirs.max_call_depth.is_some() {
            ours.max_call_depth = theirs.max_call_depth;
        }
        if theirs.trace_limit.is_some() {
            ours.trace_limit = theirs.trace_limit;
        }
    }

    /// Apply the overrides in this file on top of `base`
    pub fn apply_to(&self, mut base: InterpreterConfig) -> InterpreterConfig {
        if let Some(section) = &self.interpreter {
            if let Some(depth) = section.max_call_depth {
                base.max_call_depth = depth;
            }
            if let Some(limit) = section.trace_limit {
                base.trace_limit = limit;
            }
        }
        base
    }
}
