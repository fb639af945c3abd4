//! Per-tenant table-name derivation and existence probing.
//!
//! Every tenant's data lives in separately-prefixed tables within one
//! shared schema. The primary tenant (id 1) uses the bare prefix; every
//! other tenant inserts its id: `wp_posts` vs `wp_7_posts`. Tables can
//! legitimately be missing (partially provisioned tenants), so
//! existence is probed per tenant per run, never cached.

#![allow(missing_docs)]

use rusqlite::Connection;

use crate::core::errors::{Result, TswError};

/// The three per-tenant table names derived from (prefix, tenant id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSet {
    pub content: String,
    pub metadata: String,
    pub configuration: String,
}

impl TableSet {
    /// Derive the table names for one tenant. Pure string construction.
    #[must_use]
    pub fn for_tenant(prefix: &str, tenant_id: u64) -> Self {
        let tenant_prefix = if tenant_id == 1 {
            prefix.to_string()
        } else {
            format!("{prefix}{tenant_id}_")
        };
        Self {
            content: format!("{tenant_prefix}posts"),
            metadata: format!("{tenant_prefix}postmeta"),
            configuration: format!("{tenant_prefix}options"),
        }
    }

    /// Derive names and probe which of them exist in the schema.
    pub fn resolve(conn: &Connection, prefix: &str, tenant_id: u64) -> Result<ResolvedTables> {
        let names = Self::for_tenant(prefix, tenant_id);
        let content = table_exists(conn, &names.content)?;
        let metadata = table_exists(conn, &names.metadata)?;
        let configuration = table_exists(conn, &names.configuration)?;
        Ok(ResolvedTables {
            names,
            content_exists: content,
            metadata_exists: metadata,
            configuration_exists: configuration,
        })
    }
}

/// A tenant's table names plus per-table existence flags, valid for one run.
#[derive(Debug, Clone)]
pub struct ResolvedTables {
    pub names: TableSet,
    pub content_exists: bool,
    pub metadata_exists: bool,
    pub configuration_exists: bool,
}

/// Read-only schema probe: does `table` exist?
///
/// Zero rows is a clean "absent"; a failing probe means the connection
/// itself is gone and is surfaced as a fatal [`TswError::TableProbe`].
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: u64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .map_err(|e| TswError::TableProbe {
            table: table.to_string(),
            details: e.to_string(),
        })?;
    Ok(count > 0)
}
