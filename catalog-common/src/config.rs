//! Configuration loading and database path resolution
//!
//! Settings are layered in this priority order:
//! 1. Command-line argument (highest priority, applied by the binaries)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is never an error. A malformed one is logged and ignored.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CATALOG_CONFIG";

/// Environment variable naming the catalog database file
pub const DATABASE_ENV_VAR: &str = "CATALOG_DATABASE";

/// Character encoding of the delimited source files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceEncoding {
    /// ISO-8859-1: every byte is one character, decoding never fails
    #[default]
    Latin1,
    /// UTF-8, invalid sequences replaced
    Utf8,
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub database_path: Option<PathBuf>,
    pub source_path: Option<PathBuf>,
    pub ratings_path: Option<PathBuf>,
    pub top_n: Option<usize>,
    pub connect_timeout_ms: Option<u64>,
    pub page_size: Option<i64>,
    pub priority_pages: Option<i64>,
    pub bind_addr: Option<String>,
    pub log_level: Option<String>,
    pub encoding: Option<SourceEncoding>,
}

impl TomlConfig {
    /// Parse TOML text
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Load the config file from its default location.
    ///
    /// Falls back to an empty config when no file exists or the file is malformed.
    pub fn load_or_default() -> Self {
        let Some(path) = config_file_path() else {
            debug!("No config file found, using defaults");
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                debug!("Loaded config file: {}", path.display());
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Locate the config file: `$CATALOG_CONFIG`, then `<config_dir>/catalog/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir()
        .map(|d| d.join("catalog").join("config.toml"))
        .filter(|p| p.exists())
}

/// Compiled-in defaults
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledDefaults {
    pub database_path: PathBuf,
    pub source_path: PathBuf,
    pub ratings_path: PathBuf,
    pub top_n: usize,
    pub connect_timeout_ms: u64,
    pub page_size: i64,
    pub priority_pages: i64,
    pub bind_addr: String,
    pub log_level: String,
    pub encoding: SourceEncoding,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let database_path = dirs::data_local_dir()
            .map(|d| d.join("catalog").join("catalog.db"))
            .unwrap_or_else(|| PathBuf::from("./catalog_data/catalog.db"));

        Self {
            database_path,
            source_path: PathBuf::from("library/books.csv"),
            ratings_path: PathBuf::from("library/ratings.csv"),
            top_n: 100_000,
            connect_timeout_ms: 5000,
            page_size: 20,
            priority_pages: 5,
            bind_addr: "127.0.0.1:8000".to_string(),
            log_level: "info".to_string(),
            encoding: SourceEncoding::Latin1,
        }
    }
}

/// Fully resolved catalog settings
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    pub database_path: PathBuf,
    pub source_path: PathBuf,
    pub ratings_path: PathBuf,
    pub top_n: usize,
    pub connect_timeout_ms: u64,
    pub page_size: i64,
    pub priority_pages: i64,
    pub bind_addr: String,
    pub log_level: String,
    pub encoding: SourceEncoding,
}

impl CatalogConfig {
    /// Merge a TOML config over the compiled defaults.
    ///
    /// The database path additionally honours `$CATALOG_DATABASE`; command-line
    /// overrides are applied afterwards by the caller.
    pub fn resolve(toml: &TomlConfig) -> Self {
        let defaults = CompiledDefaults::for_current_platform();

        Self {
            database_path: resolve_database_path(None, toml),
            source_path: toml.source_path.clone().unwrap_or(defaults.source_path),
            ratings_path: toml.ratings_path.clone().unwrap_or(defaults.ratings_path),
            top_n: toml.top_n.unwrap_or(defaults.top_n),
            connect_timeout_ms: toml.connect_timeout_ms.unwrap_or(defaults.connect_timeout_ms),
            page_size: toml.page_size.filter(|n| *n > 0).unwrap_or(defaults.page_size),
            priority_pages: toml
                .priority_pages
                .filter(|n| *n >= 0)
                .unwrap_or(defaults.priority_pages),
            bind_addr: toml.bind_addr.clone().unwrap_or(defaults.bind_addr),
            log_level: toml.log_level.clone().unwrap_or(defaults.log_level),
            encoding: toml.encoding.unwrap_or(defaults.encoding),
        }
    }

    /// Load the default config file (if any) and resolve
    pub fn load() -> Self {
        Self::resolve(&TomlConfig::load_or_default())
    }
}

/// Resolve the database path: CLI argument, `$CATALOG_DATABASE`, TOML, compiled default
pub fn resolve_database_path(cli_arg: Option<&Path>, toml: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml.database_path {
        return path.clone();
    }

    CompiledDefaults::for_current_platform().database_path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_toml() {
        let config = TomlConfig::parse(
            r#"
            top_n = 50
            encoding = "utf8"
            bind_addr = "0.0.0.0:9000"
            "#,
        )
        .unwrap();

        assert_eq!(config.top_n, Some(50));
        assert_eq!(config.encoding, Some(SourceEncoding::Utf8));
        assert_eq!(config.bind_addr.as_deref(), Some("0.0.0.0:9000"));
        assert!(config.source_path.is_none());
    }

    #[test]
    fn test_parse_malformed_toml() {
        let result = TomlConfig::parse("top_n = \"many\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_page_size_uses_default() {
        let toml = TomlConfig {
            page_size: Some(0),
            priority_pages: Some(-1),
            ..Default::default()
        };
        let config = CatalogConfig::resolve(&toml);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.priority_pages, 5);
    }

    #[test]
    fn test_cli_argument_wins() {
        let toml = TomlConfig {
            database_path: Some(PathBuf::from("/from/toml.db")),
            ..Default::default()
        };
        let path = resolve_database_path(Some(Path::new("/from/cli.db")), &toml);
        assert_eq!(path, PathBuf::from("/from/cli.db"));
    }
}
