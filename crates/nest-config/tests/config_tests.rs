//! Configuration loading and precedence tests

use nest_config::loader::{ENV_MAX_CALL_DEPTH, ENV_TRACE_LIMIT};
use nest_config::{ConfigError, ConfigLoader, InterpreterConfig};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn create_config_file(dir: &Path, content: &str) -> std::path::PathBuf {
    let config_path = dir.join("nest.toml");
    fs::write(&config_path, content).unwrap();
    config_path
}

/// Loader that never reads the real ~/.nest/config.toml
fn isolated_loader(dir: &TempDir) -> ConfigLoader {
    ConfigLoader::new().with_global_config_path(dir.path().join("no-global.toml"))
}

fn clear_env() {
    env::remove_var(ENV_MAX_CALL_DEPTH);
    env::remove_var(ENV_TRACE_LIMIT);
}

// ============================================================================
// Config Loading Tests
// ============================================================================

#[test]
#[serial]
fn test_load_project_config_basic() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    create_config_file(
        temp_dir.path(),
        r#"
[interpreter]
max_call_depth = 50
"#,
    );

    let config = isolated_loader(&temp_dir)
        .load_from_directory(temp_dir.path())
        .unwrap();

    assert!(config.is_project());
    assert_eq!(config.interpreter.max_call_depth, 50);
    assert_eq!(
        config.interpreter.trace_limit,
        InterpreterConfig::default().trace_limit
    );
}

#[test]
#[serial]
fn test_load_when_no_config_exists() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();

    let config = isolated_loader(&temp_dir)
        .load_from_directory(temp_dir.path())
        .unwrap();

    assert!(!config.is_project());
    assert_eq!(config.interpreter, InterpreterConfig::default());
}

#[test]
#[serial]
fn test_load_from_subdirectory_finds_parent() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), "[interpreter]\ntrace_limit = 4\n");
    let nested = temp_dir.path().join("src").join("deep");
    fs::create_dir_all(&nested).unwrap();

    let config = isolated_loader(&temp_dir).load_from_directory(&nested).unwrap();

    assert_eq!(config.project_root.as_deref(), Some(temp_dir.path()));
    assert_eq!(config.interpreter.trace_limit, 4);
}

#[test]
#[serial]
fn test_project_overrides_global() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let global = temp_dir.path().join("global.toml");
    fs::write(&global, "[interpreter]\nmax_call_depth = 10\ntrace_limit = 2\n").unwrap();
    let project = temp_dir.path().join("project");
    fs::create_dir_all(&project).unwrap();
    create_config_file(&project, "[interpreter]\nmax_call_depth = 20\n");

    let config = ConfigLoader::new()
        .with_global_config_path(&global)
        .load_from_directory(&project)
        .unwrap();

    assert_eq!(config.interpreter.max_call_depth, 20);
    assert_eq!(config.interpreter.trace_limit, 2);
}

#[test]
#[serial]
fn test_env_overrides_project() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), "[interpreter]\nmax_call_depth = 20\n");

    env::set_var(ENV_MAX_CALL_DEPTH, "7");
    let result = isolated_loader(&temp_dir).load_from_directory(temp_dir.path());
    clear_env();

    assert_eq!(result.unwrap().interpreter.max_call_depth, 7);
}

#[test]
#[serial]
fn test_invalid_env_value_is_error() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();

    env::set_var(ENV_TRACE_LIMIT, "many");
    let result = isolated_loader(&temp_dir).load_from_directory(temp_dir.path());
    clear_env();

    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
#[serial]
fn test_env_zero_depth_fails_validation() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();

    env::set_var(ENV_MAX_CALL_DEPTH, "0");
    let result = isolated_loader(&temp_dir).load_from_directory(temp_dir.path());
    clear_env();

    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
#[serial]
fn test_load_from_file_missing() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nest.toml");

    let result = isolated_loader(&temp_dir).load_from_file(&missing);

    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
#[serial]
fn test_invalid_toml_reports_file() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    let path = create_config_file(temp_dir.path(), "[interpreter\n");

    let err = isolated_loader(&temp_dir).load_from_file(&path).unwrap_err();

    match err {
        ConfigError::TomlParseError { file, .. } => assert_eq!(file, path),
        other => panic!("Expected TomlParseError, got {:?}", other),
    }
}

#[rstest]
#[case::unknown_section("[runtime]\nmax_call_depth = 3\n")]
#[case::unknown_key("[interpreter]\nmax_depth = 3\n")]
#[case::wrong_type("[interpreter]\ntrace_limit = \"ten\"\n")]
#[case::negative("[interpreter]\nmax_call_depth = -1\n")]
#[serial]
fn test_malformed_project_file_rejected(#[case] content: &str) {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), content);

    let result = isolated_loader(&temp_dir).load_from_directory(temp_dir.path());

    assert!(matches!(result, Err(ConfigError::TomlParseError { .. })));
}

#[test]
#[serial]
fn test_zero_depth_in_file_message() {
    clear_env();
    let temp_dir = TempDir::new().unwrap();
    create_config_file(temp_dir.path(), "[interpreter]\nmax_call_depth = 0\n");

    let err = isolated_loader(&temp_dir)
        .load_from_directory(temp_dir.path())
        .unwrap_err();

    insta::assert_snapshot!(
        err.to_string(),
        @"Invalid value for 'interpreter.max_call_depth': must be at least 1"
    );
}
