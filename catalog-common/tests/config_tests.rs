//! Configuration resolution tests
//!
//! Tests that touch CATALOG_DATABASE / CATALOG_CONFIG are marked #[serial]
//! so they never run in parallel with each other.

use catalog_common::config::{
    config_file_path, resolve_database_path, CatalogConfig, CompiledDefaults, SourceEncoding,
    TomlConfig, CONFIG_ENV_VAR, DATABASE_ENV_VAR,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_compiled_defaults() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(defaults.database_path.ends_with("catalog.db"));
    assert_eq!(defaults.source_path, PathBuf::from("library/books.csv"));
    assert_eq!(defaults.ratings_path, PathBuf::from("library/ratings.csv"));
    assert_eq!(defaults.top_n, 100_000);
    assert_eq!(defaults.connect_timeout_ms, 5000);
    assert_eq!(defaults.page_size, 20);
    assert_eq!(defaults.log_level, "info");
    assert_eq!(defaults.encoding, SourceEncoding::Latin1);
}

#[test]
#[serial]
fn test_database_path_defaults_without_overrides() {
    env::remove_var(DATABASE_ENV_VAR);

    let path = resolve_database_path(None, &TomlConfig::default());
    assert_eq!(path, CompiledDefaults::for_current_platform().database_path);
}

#[test]
#[serial]
fn test_database_path_env_beats_toml() {
    env::set_var(DATABASE_ENV_VAR, "/tmp/catalog-env.db");

    let toml = TomlConfig {
        database_path: Some(PathBuf::from("/tmp/catalog-toml.db")),
        ..Default::default()
    };
    let path = resolve_database_path(None, &toml);

    env::remove_var(DATABASE_ENV_VAR);
    assert_eq!(path, PathBuf::from("/tmp/catalog-env.db"));
}

#[test]
#[serial]
fn test_database_path_cli_beats_env() {
    env::set_var(DATABASE_ENV_VAR, "/tmp/catalog-env.db");

    let path = resolve_database_path(Some(Path::new("/tmp/catalog-cli.db")), &TomlConfig::default());

    env::remove_var(DATABASE_ENV_VAR);
    assert_eq!(path, PathBuf::from("/tmp/catalog-cli.db"));
}

#[test]
#[serial]
fn test_config_file_from_env() {
    env::remove_var(DATABASE_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("config.toml");
    std::fs::write(
        &file,
        "top_n = 10\npage_size = 5\nsource_path = \"data/books.csv\"\n",
    )
    .unwrap();

    env::set_var(CONFIG_ENV_VAR, &file);
    let located = config_file_path();
    let config = CatalogConfig::load();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(located, Some(file));
    assert_eq!(config.top_n, 10);
    assert_eq!(config.page_size, 5);
    assert_eq!(config.source_path, PathBuf::from("data/books.csv"));
    // Untouched keys keep their defaults
    assert_eq!(config.priority_pages, 5);
}

#[test]
#[serial]
fn test_malformed_config_file_falls_back_to_defaults() {
    env::remove_var(DATABASE_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("config.toml");
    std::fs::write(&file, "top_n = [not toml").unwrap();

    env::set_var(CONFIG_ENV_VAR, &file);
    let config = CatalogConfig::load();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(config.top_n, 100_000);
}

#[test]
#[serial]
fn test_missing_config_file_falls_back_to_defaults() {
    env::remove_var(DATABASE_ENV_VAR);
    env::set_var(CONFIG_ENV_VAR, "/nonexistent/catalog/config.toml");
    let config = CatalogConfig::load();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(config, CatalogConfig::resolve(&TomlConfig::default()));
}
