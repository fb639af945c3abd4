//! Tenant registry: enumeration of subsites sharing the schema.
//!
//! The registry table (`{prefix}blogs`) is the only table that is not
//! per-tenant. Deleted and spam-flagged tenants are filtered out at
//! load time; everything downstream sees only live tenants, in
//! ascending-id order.

#![allow(missing_docs)]

use rusqlite::Connection;
use serde::Serialize;

use crate::core::errors::{Result, TswError};
use crate::registry::tables::table_exists;

/// Configuration key holding a tenant's canonical base URL.
const BASE_URL_KEY: &str = "siteurl";

/// One subsite of the multi-tenant installation. Immutable for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tenant {
    pub id: u64,
    pub domain: String,
    pub path: String,
}

impl Tenant {
    /// Human label used in headers and management hints: `domain` + `path`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}{}", self.domain, self.path)
    }

    /// Resolve the URL scheme by probing this tenant's configuration
    /// table for its canonical base URL. Falls back to `http` when the
    /// table or key is absent, or the stored value is unparseable.
    pub fn resolve_scheme(&self, conn: &Connection, options_table: &str) -> Result<&'static str> {
        if !table_exists(conn, options_table)? {
            return Ok("http");
        }
        let sql = format!(
            "SELECT option_value FROM \"{options_table}\" WHERE option_name = ?1 LIMIT 1"
        );
        let url: Option<String> = conn
            .query_row(&sql, [BASE_URL_KEY], |row| row.get(0))
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(TswError::query(self.id, &other)),
            })?;
        Ok(match url {
            Some(u) if u.starts_with("https://") => "https",
            _ => "http",
        })
    }
}

/// Name of the registry table for a given shared prefix.
#[must_use]
pub fn registry_table(prefix: &str) -> String {
    format!("{prefix}blogs")
}

/// Load all live tenants, ordered by ascending id.
///
/// Deleted and spam tenants are excluded here so no downstream
/// component needs to re-check. A missing registry table is a fatal
/// registry error: without it, there is nothing to scan.
pub fn load_tenants(conn: &Connection, prefix: &str) -> Result<Vec<Tenant>> {
    let table = registry_table(prefix);
    if !table_exists(conn, &table)? {
        return Err(TswError::Registry {
            details: format!("registry table `{table}` not found in schema"),
        });
    }

    let sql = format!(
        "SELECT blog_id, domain, path FROM \"{table}\"
         WHERE deleted = 0 AND spam = 0
         ORDER BY blog_id ASC"
    );
    let mut stmt = conn.prepare(&sql).map_err(|e| TswError::Registry {
        details: e.to_string(),
    })?;
    let tenants = stmt
        .query_map([], |row| {
            Ok(Tenant {
                id: row.get(0)?,
                domain: row.get(1)?,
                path: row.get(2)?,
            })
        })
        .and_then(|rows| rows.collect::<std::result::Result<Vec<_>, _>>())
        .map_err(|e| TswError::Registry {
            details: e.to_string(),
        })?;
    Ok(tenants)
}
