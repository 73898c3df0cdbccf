//! CLI configuration via environment variables
//!
//! Interpreter limits come from nest.toml through `nest-config`; the
//! settings here only affect how the CLI presents things.

use std::env;
use std::path::PathBuf;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Default to JSON diagnostic output (NEST_DIAGNOSTICS=json)
    pub default_json: bool,
    /// Custom history file path (NEST_HISTORY_FILE=/path/to/file)
    pub history_file: Option<PathBuf>,
    /// Disable history by default (NEST_NO_HISTORY=1)
    pub no_history: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            default_json: env::var("NEST_DIAGNOSTICS")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            history_file: env::var("NEST_HISTORY_FILE").ok().map(PathBuf::from),
            no_history: env::var("NEST_NO_HISTORY").is_ok(),
        }
    }

    /// Get the history file path
    ///
    /// Returns:
    /// 1. NEST_HISTORY_FILE if set
    /// 2. ~/.nest/history if home directory exists
    /// 3. None otherwise
    pub fn get_history_path(&self) -> Option<PathBuf> {
        if let Some(ref path) = self.history_file {
            return Some(path.clone());
        }
        dirs::home_dir().map(|home| home.join(".nest").join("history"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
