//! Configuration loading and precedence tests

use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use verdict_config::{ConfigError, ConfigLoader, ResolvedSettings};

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn loader_without_global(temp: &TempDir) -> ConfigLoader {
    ConfigLoader::with_global_path(temp.path().join("no-global.toml"))
}

// ============================================================================
// Project discovery
// ============================================================================

#[test]
fn test_project_config_found_in_parent() {
    let temp = TempDir::new().unwrap();
    write_file(
        temp.path(),
        "verdict.toml",
        r#"
[run]
filter = "Opening"

[report]
prefix = "chess_test_results"
"#,
    );
    let nested = temp.path().join("tests").join("deep");
    fs::create_dir_all(&nested).unwrap();

    let mut loader = loader_without_global(&temp);
    let config = loader.load_from_directory(&nested).unwrap();
    assert_eq!(config.project_root(), Some(temp.path()));

    let settings = config.resolve();
    assert_eq!(settings.filter.as_deref(), Some("Opening"));
    assert_eq!(settings.report_prefix, "chess_test_results");
}

#[test]
fn test_no_project_config_uses_defaults() {
    let temp = TempDir::new().unwrap();
    let mut loader = loader_without_global(&temp);
    let config = loader.load_from_directory(temp.path()).unwrap();
    assert_eq!(config.resolve(), ResolvedSettings::default());
}

#[test]
fn test_invalid_project_toml_is_an_error() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "verdict.toml", "[report\nprefix = 1");

    let mut loader = loader_without_global(&temp);
    let err = loader.load_from_directory(temp.path()).unwrap_err();
    assert!(matches!(err, ConfigError::TomlParseError { .. }));
    assert!(err.to_string().contains("verdict.toml"));
}

#[test]
fn test_unknown_section_is_rejected() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "verdict.toml", "[engine]\ndepth = 3\n");

    let mut loader = loader_without_global(&temp);
    assert!(loader.load_from_directory(temp.path()).is_err());
}

// ============================================================================
// Precedence
// ============================================================================

#[test]
fn test_project_over_global() {
    let temp = TempDir::new().unwrap();
    let global = write_file(
        temp.path(),
        "global.toml",
        r#"
[report]
prefix = "global"
color = false
save = false
"#,
    );
    let project = temp.path().join("project");
    fs::create_dir_all(&project).unwrap();
    write_file(&project, "verdict.toml", "[report]\nsave = true\n");

    let mut loader = ConfigLoader::with_global_path(global);
    let settings = loader.load_from_directory(&project).unwrap().resolve();
    assert_eq!(settings.report_prefix, "global");
    assert!(!settings.color);
    assert!(settings.save);
}

#[test]
fn test_broken_global_config_is_ignored() {
    let temp = TempDir::new().unwrap();
    let global = write_file(temp.path(), "global.toml", "not toml at all [");

    let mut loader = ConfigLoader::with_global_path(global);
    let settings = loader.load_from_directory(temp.path()).unwrap().resolve();
    assert_eq!(settings, ResolvedSettings::default());
}

#[test]
#[serial]
fn test_environment_over_project() {
    let temp = TempDir::new().unwrap();
    write_file(
        temp.path(),
        "verdict.toml",
        "[run]\nfilter = \"Board\"\n\n[report]\noutput_dir = \"reports\"\n",
    );

    env::set_var("VERDICT_FILTER", "Position");
    env::set_var("VERDICT_NO_SAVE", "1");
    env::remove_var("VERDICT_REPORT_DIR");
    env::remove_var("VERDICT_REPORT_PREFIX");
    env::remove_var("NO_COLOR");

    let mut loader = loader_without_global(&temp);
    let settings = loader.resolve_from_directory(temp.path());

    env::remove_var("VERDICT_FILTER");
    env::remove_var("VERDICT_NO_SAVE");

    let settings = settings.unwrap();
    assert_eq!(settings.filter.as_deref(), Some("Position"));
    assert!(!settings.save);
    assert_eq!(settings.report_dir, temp.path().join("reports"));
}

#[test]
#[serial]
fn test_no_color_env_disables_color() {
    let temp = TempDir::new().unwrap();
    env::set_var("NO_COLOR", "1");
    let settings = loader_without_global(&temp).resolve_from_directory(temp.path());
    env::remove_var("NO_COLOR");

    assert!(!settings.unwrap().color);
}
