//! TSW-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::PathBuf;

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, TswError>;

/// Top-level error type for tenant_sweep.
#[derive(Debug, Error)]
pub enum TswError {
    #[error("[TSW-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[TSW-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[TSW-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[TSW-1101] invalid exclusion pattern `{pattern}`: {details}")]
    InvalidPattern { pattern: String, details: String },

    #[error("[TSW-2001] cannot open database at {path}: {details}")]
    Connection { path: PathBuf, details: String },

    #[error("[TSW-2002] table existence probe failed for {table}: {details}")]
    TableProbe { table: String, details: String },

    #[error("[TSW-2101] query failure scanning tenant {tenant_id}: {details}")]
    Query { tenant_id: u64, details: String },

    #[error("[TSW-2102] tenant registry failure: {details}")]
    Registry { details: String },

    #[error("[TSW-2201] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[TSW-3001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TswError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "TSW-1001",
            Self::MissingConfig { .. } => "TSW-1002",
            Self::ConfigParse { .. } => "TSW-1003",
            Self::InvalidPattern { .. } => "TSW-1101",
            Self::Connection { .. } => "TSW-2001",
            Self::TableProbe { .. } => "TSW-2002",
            Self::Query { .. } => "TSW-2101",
            Self::Registry { .. } => "TSW-2102",
            Self::Serialization { .. } => "TSW-2201",
            Self::Io { .. } => "TSW-3001",
        }
    }

    /// Whether the failure is isolated to one tenant's scan.
    ///
    /// Everything else aborts the run; a per-tenant query failure only
    /// removes that tenant from the match counts.
    #[must_use]
    pub const fn is_per_tenant(&self) -> bool {
        matches!(self, Self::Query { .. })
    }

    /// Convenience constructor for per-tenant query failures.
    #[must_use]
    pub fn query(tenant_id: u64, source: &rusqlite::Error) -> Self {
        Self::Query {
            tenant_id,
            details: source.to_string(),
        }
    }
}

impl From<serde_json::Error> for TswError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for TswError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
