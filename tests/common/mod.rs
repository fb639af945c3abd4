//! Shared fixtures: scratch network databases and CLI invocation helpers.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output};

use rusqlite::Connection;

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_tsw") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "tsw.exe" } else { "tsw" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve tsw binary path for integration test"),
    }
}

pub fn run_cli(args: &[&str]) -> CmdResult {
    let output: Output = Command::new(resolve_bin_path())
        .args(args)
        .env_remove("TSW_DATABASE_PATH")
        .env_remove("TSW_TABLE_PREFIX")
        .env_remove("TSW_PROGRESS_INTERVAL")
        .output()
        .expect("spawn tsw binary");

    CmdResult {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

/// Registry row used by [`build_network`].
pub struct TenantFixture {
    pub id: u64,
    pub domain: &'static str,
    pub path: &'static str,
    /// Whether to provision the three per-tenant tables.
    pub provisioned: bool,
}

/// Create a network database at `path` with the given tenants.
///
/// Provisioned tenants get empty content/metadata/configuration tables;
/// callers insert rows through the returned connection.
pub fn build_network(path: &Path, tenants: &[TenantFixture]) -> Connection {
    let conn = Connection::open(path).expect("create fixture database");
    conn.execute_batch(
        "CREATE TABLE wp_blogs (
            blog_id INTEGER PRIMARY KEY,
            domain TEXT NOT NULL,
            path TEXT NOT NULL,
            deleted INTEGER NOT NULL DEFAULT 0,
            spam INTEGER NOT NULL DEFAULT 0
        );",
    )
    .expect("create registry table");

    for tenant in tenants {
        conn.execute(
            "INSERT INTO wp_blogs (blog_id, domain, path) VALUES (?1, ?2, ?3)",
            rusqlite::params![tenant.id, tenant.domain, tenant.path],
        )
        .expect("insert tenant row");

        if tenant.provisioned {
            let prefix = if tenant.id == 1 {
                "wp_".to_string()
            } else {
                format!("wp_{}_", tenant.id)
            };
            conn.execute_batch(&format!(
                "CREATE TABLE {prefix}posts (
                    ID INTEGER PRIMARY KEY,
                    post_title TEXT NOT NULL DEFAULT '',
                    post_content TEXT NOT NULL DEFAULT '',
                    post_status TEXT NOT NULL DEFAULT 'publish',
                    post_type TEXT NOT NULL DEFAULT 'post',
                    post_parent INTEGER NOT NULL DEFAULT 0
                );
                CREATE TABLE {prefix}postmeta (
                    meta_id INTEGER PRIMARY KEY,
                    post_id INTEGER NOT NULL,
                    meta_key TEXT NOT NULL,
                    meta_value TEXT NOT NULL DEFAULT ''
                );
                CREATE TABLE {prefix}options (
                    option_id INTEGER PRIMARY KEY,
                    option_name TEXT NOT NULL,
                    option_value TEXT NOT NULL DEFAULT ''
                );"
            ))
            .expect("provision tenant tables");
        }
    }

    conn
}
