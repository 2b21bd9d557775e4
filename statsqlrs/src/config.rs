//! Configuration system for statsql.
//!
//! Supports TOML-based configuration, with `DATABASE_URL` and `LOG_QUERY`
//! environment variables taking precedence over file values.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dialect::DatabaseKind;
use crate::error::{Result, StatsqlError};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StatsqlConfig {
    pub database: DatabaseConfig,
    pub query: QueryConfig,
    pub pool: PoolConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection string; its scheme selects the dialect.
    pub url: Option<String>,
}

/// Query execution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Log every executed query with its parameters and duration (default: false).
    pub log_queries: bool,
    /// Queries slower than this are logged as warnings (0 = never).
    pub slow_query_ms: u64,
}

/// Connection pooling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum pool size (default: 16).
    pub size: usize,
    /// Statement timeout in milliseconds (default: 30000).
    pub statement_timeout_ms: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            log_queries: false,
            slow_query_ms: 1_000,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            size: 16,
            statement_timeout_ms: 30_000,
        }
    }
}

impl StatsqlConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| StatsqlError::Config(format!("failed to parse config: {e}")))
    }

    /// Load from default locations, then apply environment overrides.
    ///
    /// Search order:
    /// 1. `STATSQL_CONFIG` environment variable
    /// 2. `./statsql.toml` (current directory)
    /// 3. `~/.config/statsql/config.toml` (user config dir)
    /// 4. Built-in defaults
    pub fn load_default() -> Self {
        let mut cfg = Self::load_file_default();
        cfg.apply_env(|name| std::env::var(name).ok());
        cfg
    }

    fn load_file_default() -> Self {
        if let Ok(path) = std::env::var("STATSQL_CONFIG") {
            match Self::from_file(&path) {
                Ok(cfg) => {
                    tracing::info!(path = %path, "loaded config from STATSQL_CONFIG");
                    return cfg;
                }
                Err(e) => tracing::warn!(path = %path, error = %e, "ignoring STATSQL_CONFIG"),
            }
        }

        if let Ok(cfg) = Self::from_file("statsql.toml") {
            tracing::info!("loaded config from ./statsql.toml");
            return cfg;
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("statsql").join("config.toml");
            if let Ok(cfg) = Self::from_file(&user_config) {
                tracing::info!(path = %user_config.display(), "loaded config from user config dir");
                return cfg;
            }
        }

        tracing::debug!("no config file found, using defaults");
        Self::default()
    }

    /// Override file values with `DATABASE_URL` and `LOG_QUERY`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL").filter(|url| !url.is_empty()) {
            self.database.url = Some(url);
        }
        if let Some(flag) = lookup("LOG_QUERY") {
            self.query.log_queries = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
    }

    /// Database family named by the configured URL, if it is a known one.
    pub fn database_kind(&self) -> Option<DatabaseKind> {
        self.database.url.as_deref().and_then(DatabaseKind::from_url)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = StatsqlConfig::default();
        assert!(cfg.database.url.is_none());
        assert!(!cfg.query.log_queries);
        assert_eq!(cfg.query.slow_query_ms, 1_000);
        assert_eq!(cfg.pool.size, 16);
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[database]
url = "mysql://root@localhost:3306/analytics"

[query]
log_queries = true

[pool]
size = 4
"#;
        let cfg = StatsqlConfig::from_toml(toml).unwrap();
        assert_eq!(cfg.database_kind(), Some(DatabaseKind::MySql));
        assert!(cfg.query.log_queries);
        assert_eq!(cfg.query.slow_query_ms, 1_000);
        assert_eq!(cfg.pool.size, 4);
        assert_eq!(cfg.pool.statement_timeout_ms, 30_000);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut cfg =
            StatsqlConfig::from_toml("[database]\nurl = \"mysql://localhost/a\"").unwrap();
        cfg.apply_env(|name| match name {
            "DATABASE_URL" => Some("postgresql://localhost/b".to_string()),
            "LOG_QUERY" => Some("true".to_string()),
            _ => None,
        });
        assert_eq!(cfg.database_kind(), Some(DatabaseKind::Postgres));
        assert!(cfg.query.log_queries);
    }

    #[test]
    fn test_unknown_scheme_has_no_kind() {
        let cfg = StatsqlConfig::from_toml("[database]\nurl = \"sqlite://x.db\"").unwrap();
        assert_eq!(cfg.database_kind(), None);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[query]\nslow_query_ms = 250").unwrap();
        let cfg = StatsqlConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.query.slow_query_ms, 250);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = StatsqlConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, StatsqlError::Io(_)));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = StatsqlConfig::from_toml("[pool\nsize = 1").unwrap_err();
        assert!(matches!(err, StatsqlError::Config(_)));
    }
}
