//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::interpreter::InterpreterConfig;
use crate::project::{ProjectConfig, PROJECT_CONFIG_FILE};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding `interpreter.max_call_depth`
pub const ENV_MAX_CALL_DEPTH: &str = "NEST_MAX_CALL_DEPTH";

/// Environment variable overriding `interpreter.trace_limit`
pub const ENV_TRACE_LIMIT: &str = "NEST_TRACE_LIMIT";

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.nest/config.toml) - lowest priority
/// 2. Project config (./nest.toml) - overrides global
/// 3. Environment variables (NEST_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Explicit global config path (tests point this at a temp dir)
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone)]
pub struct Config {
    /// Resolved interpreter settings
    pub interpreter: InterpreterConfig,

    /// Project root directory (where nest.toml was found)
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Whether a nest.toml was found
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use a specific global config file instead of ~/.nest/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find nest.toml, then merges it over the
    /// global config if one exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = find_project_config(start_dir)?;
        self.resolve(project_root, project_config)
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let project_root = config_path.parent().map(|p| p.to_path_buf());
        self.resolve(project_root, project_config)
    }

    fn resolve(
        &mut self,
        project_root: Option<PathBuf>,
        project_config: ProjectConfig,
    ) -> ConfigResult<Config> {
        let mut merged = self.load_global_config()?;
        merged.merge(&project_config);

        let interpreter = apply_env_overrides(merged.apply_to(InterpreterConfig::default()))?;
        interpreter.validate()?;

        Ok(Config {
            interpreter,
            project_root,
        })
    }

    /// Load global configuration from ~/.nest/config.toml
    fn load_global_config(&mut self) -> ConfigResult<ProjectConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => match ProjectConfig::global_config_path() {
                Ok(path) => {
                    self.global_config_path = Some(path.clone());
                    path
                }
                // No home directory means no global config, not an error
                Err(ConfigError::HomeNotFound) => return Ok(ProjectConfig::default()),
                Err(e) => return Err(e),
            },
        };

        // Global config is optional - if it doesn't exist, return default
        if !path.exists() {
            return Ok(ProjectConfig::default());
        }

        ProjectConfig::load_from_file(&path)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Find project configuration by walking up directory tree
///
/// Returns (project_root, project_config); default config when none is found
fn find_project_config(start_dir: &Path) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(PROJECT_CONFIG_FILE);

        if config_path.exists() {
            let project_config = ProjectConfig::load_from_file(&config_path)?;
            return Ok((Some(current), project_config));
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => return Ok((None, ProjectConfig::default())),
        }
    }
}

/// Apply environment variable overrides
///
/// Environment variables follow the pattern: NEST_<KEY>
fn apply_env_overrides(mut config: InterpreterConfig) -> ConfigResult<InterpreterConfig> {
    if let Ok(depth) = env::var(ENV_MAX_CALL_DEPTH) {
        config.max_call_depth = parse_env_usize(ENV_MAX_CALL_DEPTH, &depth)?;
    }

    if let Ok(limit) = env::var(ENV_TRACE_LIMIT) {
        config.trace_limit = parse_env_usize(ENV_TRACE_LIMIT, &limit)?;
    }

    Ok(config)
}

fn parse_env_usize(name: &str, raw: &str) -> ConfigResult<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|e| ConfigError::InvalidValue {
            field: name.to_string(),
            reason: format!("expected a non-negative integer, got '{}' ({})", raw, e),
        })
}
