//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, TswError};

/// Shared table-name prefix used when none is configured.
pub const DEFAULT_TABLE_PREFIX: &str = "wp_";

/// Full tenant_sweep configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub sweep: SweepConfig,
    pub paths: PathsConfig,
}

/// Where the shared multi-tenant schema lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the shared schema database file.
    pub path: PathBuf,
    /// Shared table-name prefix (the primary tenant's bare prefix).
    pub table_prefix: String,
}

/// Sweep behavior knobs that hold across runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SweepConfig {
    /// Always-on exclusion patterns, merged with the built-in defaults
    /// and any `--exclude` flags.
    pub extra_exclusions: Vec<String>,
    /// Emit a progress marker after this many tenants (0 disables).
    pub progress_interval: u64,
}

/// Filesystem paths used by tsw.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("platform.sqlite3"),
            table_prefix: DEFAULT_TABLE_PREFIX.to_string(),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            extra_exclusions: Vec::new(),
            progress_interval: 100,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!("[TSW-CONFIG] WARNING: HOME not set, falling back to /tmp for paths");
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        Self {
            config_file: home_dir.join(".config").join("tsw").join("config.toml"),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path;
    /// defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| TswError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(TswError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(value) = env::var_os("TSW_DATABASE_PATH") {
            self.database.path = PathBuf::from(value);
        }
        if let Ok(value) = env::var("TSW_TABLE_PREFIX") {
            self.database.table_prefix = value;
        }
        if let Ok(value) = env::var("TSW_PROGRESS_INTERVAL") {
            match value.parse() {
                Ok(n) => self.sweep.progress_interval = n,
                Err(_) => {
                    eprintln!("[TSW-CONFIG] WARNING: ignoring invalid TSW_PROGRESS_INTERVAL={value}");
                }
            }
        }
    }

    /// Validate invariants that a config file or env override could break.
    pub fn validate(&self) -> Result<()> {
        if self.database.table_prefix.is_empty() {
            return Err(TswError::InvalidConfig {
                details: "database.table_prefix must not be empty".to_string(),
            });
        }
        if !self
            .database
            .table_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(TswError::InvalidConfig {
                details: format!(
                    "database.table_prefix `{}` may only contain alphanumerics and underscores",
                    self.database.table_prefix
                ),
            });
        }
        Ok(())
    }
}
