//! Per-tenant search: content, metadata, and configuration sources.
//!
//! One scanner invocation searches the three tables of a single tenant
//! under the active option set and returns shaped match records in
//! table-scan order (content, then metadata, then configuration;
//! database-native order within each table). Any query failure is
//! returned to the coordinator as a recoverable per-tenant error.

#![allow(missing_docs)]

use rusqlite::Connection;

use crate::core::errors::Result;
use crate::core::errors::TswError;
use crate::registry::tables::ResolvedTables;
use crate::registry::tenants::Tenant;
use crate::scan::record::{MatchKind, MatchRecord, ScanOptions};

/// Content states searched by default. `published_only` narrows this to
/// `publish` alone and makes the revision filter moot.
const DEFAULT_STATUS_LIST: &str = "('publish','private','draft','inherit')";

/// Content rows of this type are revisions of another item.
const REVISION_TYPE: &str = "revision";

/// Searches one tenant's tables under a fixed option set.
pub struct TenantScanner<'a> {
    conn: &'a Connection,
    options: &'a ScanOptions,
}

struct ContentRow {
    id: u64,
    title: String,
    status: String,
    item_type: String,
    parent: u64,
}

struct MetadataRow {
    key: String,
    owner_id: u64,
    owner_title: String,
}

struct ConfigurationRow {
    id: u64,
    key: String,
}

impl<'a> TenantScanner<'a> {
    pub fn new(conn: &'a Connection, options: &'a ScanOptions) -> Self {
        Self { conn, options }
    }

    /// Run all applicable source searches for `tenant` and shape the
    /// results. The scheme probe is deferred until at least one row
    /// matched; a tenant with no matches costs no extra query.
    pub fn scan(&self, tenant: &Tenant, tables: &ResolvedTables) -> Result<Vec<MatchRecord>> {
        let scope = self.options.scope;

        let content = if scope.includes_content() && tables.content_exists {
            self.search_content(tenant, &tables.names.content)?
        } else {
            Vec::new()
        };
        // The metadata query joins the content table; without it there
        // is no owning item to join against, so the source is skipped.
        let metadata = if scope.includes_metadata()
            && tables.metadata_exists
            && tables.content_exists
        {
            self.search_metadata(tenant, &tables.names.metadata, &tables.names.content)?
        } else {
            Vec::new()
        };
        let configuration = if scope.includes_configuration() && tables.configuration_exists {
            self.search_configuration(tenant, &tables.names.configuration)?
        } else {
            Vec::new()
        };

        if content.is_empty() && metadata.is_empty() && configuration.is_empty() {
            return Ok(Vec::new());
        }

        let scheme = tenant.resolve_scheme(self.conn, &tables.names.configuration)?;
        let base = format!("{scheme}://{}", tenant.label());

        let mut records =
            Vec::with_capacity(content.len() + metadata.len() + configuration.len());
        records.extend(content.into_iter().map(|row| shape_content(&base, row)));
        records.extend(
            metadata
                .into_iter()
                .map(|row| shape_metadata(&base, tenant, row)),
        );
        records.extend(
            configuration
                .into_iter()
                .map(|row| shape_configuration(&base, tenant, row)),
        );
        Ok(records)
    }

    /// Substring predicate over one column. Case-insensitive search uses
    /// an escaped LIKE; case-sensitive switches to a binary `instr`
    /// comparison, sidestepping LIKE's default collation.
    fn substring_predicate(&self, column: &str) -> String {
        if self.options.case_sensitive {
            format!("instr({column}, ?1) > 0")
        } else {
            format!("{column} LIKE ?1 ESCAPE '\\'")
        }
    }

    fn term_param(&self) -> String {
        if self.options.case_sensitive {
            self.options.term.clone()
        } else {
            format!("%{}%", escape_like(&self.options.term))
        }
    }

    fn search_content(&self, tenant: &Tenant, table: &str) -> Result<Vec<ContentRow>> {
        let status_filter = if self.options.published_only {
            "post_status = 'publish'".to_string()
        } else if self.options.exclude_revisions {
            format!("post_status IN {DEFAULT_STATUS_LIST} AND post_type <> '{REVISION_TYPE}'")
        } else {
            format!("post_status IN {DEFAULT_STATUS_LIST}")
        };
        let sql = format!(
            "SELECT ID, post_title, post_status, post_type, post_parent
             FROM \"{table}\"
             WHERE {} AND {status_filter}",
            self.substring_predicate("post_content"),
        );

        let run = || -> rusqlite::Result<Vec<ContentRow>> {
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map([self.term_param()], |row| {
                    Ok(ContentRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        status: row.get(2)?,
                        item_type: row.get(3)?,
                        parent: row.get(4)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        };
        run().map_err(|e| TswError::query(tenant.id, &e))
    }

    fn search_metadata(
        &self,
        tenant: &Tenant,
        metadata_table: &str,
        content_table: &str,
    ) -> Result<Vec<MetadataRow>> {
        // Inner join: metadata whose owning item is missing is never returned.
        let sql = format!(
            "SELECT m.meta_key, m.post_id, p.post_title
             FROM \"{metadata_table}\" m
             INNER JOIN \"{content_table}\" p ON p.ID = m.post_id
             WHERE {}",
            self.substring_predicate("m.meta_value"),
        );

        let run = || -> rusqlite::Result<Vec<MetadataRow>> {
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map([self.term_param()], |row| {
                    Ok(MetadataRow {
                        key: row.get(0)?,
                        owner_id: row.get(1)?,
                        owner_title: row.get(2)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        };
        let rows = run().map_err(|e| TswError::query(tenant.id, &e))?;
        // Excluded keys are dropped silently: not counted, not reported.
        Ok(rows
            .into_iter()
            .filter(|row| !self.options.exclusions.contains_match(&row.key))
            .collect())
    }

    fn search_configuration(
        &self,
        tenant: &Tenant,
        table: &str,
    ) -> Result<Vec<ConfigurationRow>> {
        // The term may sit in the value or in the key name itself.
        let sql = format!(
            "SELECT option_id, option_name FROM \"{table}\" WHERE {} OR {}",
            self.substring_predicate("option_value"),
            self.substring_predicate("option_name"),
        );

        let run = || -> rusqlite::Result<Vec<ConfigurationRow>> {
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map([self.term_param()], |row| {
                    Ok(ConfigurationRow {
                        id: row.get(0)?,
                        key: row.get(1)?,
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        };
        let rows = run().map_err(|e| TswError::query(tenant.id, &e))?;
        Ok(rows
            .into_iter()
            .filter(|row| !self.options.exclusions.contains_match(&row.key))
            .collect())
    }
}

fn shape_content(base: &str, row: ContentRow) -> MatchRecord {
    let mut extra = row.status.clone();
    if row.item_type != "post" {
        extra.push(' ');
        extra.push_str(&row.item_type);
    }
    if row.item_type == REVISION_TYPE && row.parent > 0 {
        extra.push_str(&format!(" of item {}", row.parent));
    }
    let title = if row.title.is_empty() {
        "(untitled)".to_string()
    } else {
        row.title
    };
    MatchRecord {
        kind: MatchKind::Content,
        title,
        id: row.id,
        extra: Some(extra),
        link: format!("{base}wp-admin/post.php?post={}&action=edit", row.id),
        hint: None,
    }
}

fn shape_metadata(base: &str, tenant: &Tenant, row: MetadataRow) -> MatchRecord {
    let owner_title = if row.owner_title.is_empty() {
        "(untitled)".to_string()
    } else {
        row.owner_title
    };
    MatchRecord {
        kind: MatchKind::Metadata,
        title: row.key.clone(),
        id: row.owner_id,
        extra: Some(format!("on \"{owner_title}\"")),
        link: format!("{base}wp-admin/post.php?post={}&action=edit", row.owner_id),
        hint: Some(format!(
            "wp post meta get {} '{}' --url={}",
            row.owner_id,
            row.key,
            tenant.label()
        )),
    }
}

fn shape_configuration(base: &str, tenant: &Tenant, row: ConfigurationRow) -> MatchRecord {
    MatchRecord {
        kind: MatchKind::Configuration,
        title: row.key.clone(),
        id: row.id,
        extra: None,
        link: format!("{base}wp-admin/options.php"),
        hint: Some(format!(
            "wp option get '{}' --url={}",
            row.key,
            tenant.label()
        )),
    }
}

/// Escape LIKE wildcards and the escape character itself in a literal term.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tables::TableSet;
    use crate::scan::exclusions::ExclusionSet;
    use crate::scan::record::Scope;

    fn fixture_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE wp_posts (
                ID INTEGER PRIMARY KEY,
                post_title TEXT NOT NULL DEFAULT '',
                post_content TEXT NOT NULL DEFAULT '',
                post_status TEXT NOT NULL DEFAULT 'publish',
                post_type TEXT NOT NULL DEFAULT 'post',
                post_parent INTEGER NOT NULL DEFAULT 0
            );
            CREATE TABLE wp_postmeta (
                meta_id INTEGER PRIMARY KEY,
                post_id INTEGER NOT NULL,
                meta_key TEXT NOT NULL,
                meta_value TEXT NOT NULL DEFAULT ''
            );
            CREATE TABLE wp_options (
                option_id INTEGER PRIMARY KEY,
                option_name TEXT NOT NULL,
                option_value TEXT NOT NULL DEFAULT ''
            );",
        )
        .unwrap();
        conn
    }

    fn tenant_one() -> Tenant {
        Tenant {
            id: 1,
            domain: "a.test".to_string(),
            path: "/".to_string(),
        }
    }

    fn options(term: &str) -> ScanOptions {
        ScanOptions::new(
            term,
            Scope::All,
            false,
            false,
            false,
            ExclusionSet::defaults(),
        )
        .unwrap()
    }

    fn scan_with(conn: &Connection, opts: &ScanOptions) -> Vec<MatchRecord> {
        let tables = TableSet::resolve(conn, "wp_", 1).unwrap();
        TenantScanner::new(conn, opts)
            .scan(&tenant_one(), &tables)
            .unwrap()
    }

    #[test]
    fn content_match_yields_edit_link_and_status() {
        let conn = fixture_conn();
        conn.execute_batch(
            "INSERT INTO wp_posts (ID, post_title, post_content) VALUES
                (10, 'Gallery page', 'see [gallery] below');",
        )
        .unwrap();
        let records = scan_with(&conn, &options("[gallery"));
        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.kind, MatchKind::Content);
        assert_eq!(rec.title, "Gallery page");
        assert_eq!(rec.id, 10);
        assert_eq!(rec.extra.as_deref(), Some("publish"));
        assert_eq!(
            rec.link,
            "http://a.test/wp-admin/post.php?post=10&action=edit"
        );
        assert!(rec.hint.is_none());
    }

    #[test]
    fn like_wildcards_in_term_are_literal() {
        let conn = fixture_conn();
        conn.execute_batch(
            "INSERT INTO wp_posts (ID, post_content) VALUES
                (1, 'contains 100% literal'),
                (2, 'contains 100x literal');",
        )
        .unwrap();
        let records = scan_with(&conn, &options("100%"));
        assert_eq!(records.len(), 1, "% must not act as a LIKE wildcard");
        assert_eq!(records[0].id, 1);
    }

    #[test]
    fn case_sensitivity_switch() {
        let conn = fixture_conn();
        conn.execute_batch(
            "INSERT INTO wp_posts (ID, post_content) VALUES (1, 'OldDomain.example');",
        )
        .unwrap();

        let insensitive = options("olddomain");
        assert_eq!(scan_with(&conn, &insensitive).len(), 1);

        let sensitive = ScanOptions::new(
            "olddomain",
            Scope::All,
            true,
            false,
            false,
            ExclusionSet::defaults(),
        )
        .unwrap();
        assert!(scan_with(&conn, &sensitive).is_empty());

        let sensitive_exact = ScanOptions::new(
            "OldDomain",
            Scope::All,
            true,
            false,
            false,
            ExclusionSet::defaults(),
        )
        .unwrap();
        assert_eq!(scan_with(&conn, &sensitive_exact).len(), 1);
    }

    #[test]
    fn default_status_allow_list_applies() {
        let conn = fixture_conn();
        conn.execute_batch(
            "INSERT INTO wp_posts (ID, post_content, post_status) VALUES
                (1, 'needle', 'publish'),
                (2, 'needle', 'draft'),
                (3, 'needle', 'trash'),
                (4, 'needle', 'pending');",
        )
        .unwrap();
        let records = scan_with(&conn, &options("needle"));
        let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2], "trash/pending are outside the allow-list");
    }

    #[test]
    fn published_only_restricts_to_publish() {
        let conn = fixture_conn();
        conn.execute_batch(
            "INSERT INTO wp_posts (ID, post_content, post_status) VALUES
                (1, 'needle', 'publish'),
                (2, 'needle', 'draft'),
                (3, 'needle', 'private');",
        )
        .unwrap();
        let opts = ScanOptions::new(
            "needle",
            Scope::All,
            false,
            true,
            false,
            ExclusionSet::defaults(),
        )
        .unwrap();
        let records = scan_with(&conn, &opts);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 1);
    }

    #[test]
    fn exclude_revisions_drops_revision_rows() {
        let conn = fixture_conn();
        conn.execute_batch(
            "INSERT INTO wp_posts (ID, post_title, post_content, post_status, post_type, post_parent) VALUES
                (1, 'Page', 'needle', 'publish', 'page', 0),
                (2, '', 'needle', 'inherit', 'revision', 1);",
        )
        .unwrap();

        let with_revisions = scan_with(&conn, &options("needle"));
        assert_eq!(with_revisions.len(), 2);
        let revision = with_revisions.iter().find(|r| r.id == 2).unwrap();
        assert_eq!(
            revision.extra.as_deref(),
            Some("inherit revision of item 1"),
            "revision rows must note their parent item"
        );

        let opts = ScanOptions::new(
            "needle",
            Scope::All,
            false,
            false,
            true,
            ExclusionSet::defaults(),
        )
        .unwrap();
        let without = scan_with(&conn, &opts);
        assert_eq!(without.len(), 1);
        assert_eq!(without[0].id, 1);
    }

    #[test]
    fn metadata_requires_owning_item() {
        let conn = fixture_conn();
        conn.execute_batch(
            "INSERT INTO wp_posts (ID, post_title, post_content) VALUES (5, 'Owner', 'x');
             INSERT INTO wp_postmeta (meta_id, post_id, meta_key, meta_value) VALUES
                (1, 5, 'legacy_shortcode', 'uses needle here'),
                (2, 99, 'orphan_key', 'needle too');",
        )
        .unwrap();
        let records = scan_with(&conn, &options("needle"));
        assert_eq!(records.len(), 1, "orphaned metadata is never returned");
        let rec = &records[0];
        assert_eq!(rec.kind, MatchKind::Metadata);
        assert_eq!(rec.title, "legacy_shortcode");
        assert_eq!(rec.id, 5);
        assert_eq!(rec.extra.as_deref(), Some("on \"Owner\""));
        assert_eq!(
            rec.hint.as_deref(),
            Some("wp post meta get 5 'legacy_shortcode' --url=a.test/")
        );
    }

    #[test]
    fn excluded_metadata_keys_are_dropped_silently() {
        let conn = fixture_conn();
        conn.execute_batch(
            "INSERT INTO wp_posts (ID, post_content) VALUES (5, 'x');
             INSERT INTO wp_postmeta (meta_id, post_id, meta_key, meta_value) VALUES
                (1, 5, 'jetpack_options', 'needle'),
                (2, 5, 'kept_key', 'needle');",
        )
        .unwrap();
        let records = scan_with(&conn, &options("needle"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "kept_key");
    }

    #[test]
    fn configuration_matches_value_or_key() {
        let conn = fixture_conn();
        conn.execute_batch(
            "INSERT INTO wp_options (option_id, option_name, option_value) VALUES
                (1, 'old_plugin_endpoint', 'https://api.example'),
                (2, 'theme_mods', 'needle in value'),
                (3, 'unrelated', 'nothing');",
        )
        .unwrap();

        let by_value = scan_with(&conn, &options("needle"));
        assert_eq!(by_value.len(), 1);
        assert_eq!(by_value[0].title, "theme_mods");
        assert_eq!(by_value[0].link, "http://a.test/wp-admin/options.php");
        assert_eq!(
            by_value[0].hint.as_deref(),
            Some("wp option get 'theme_mods' --url=a.test/")
        );

        let by_key = scan_with(&conn, &options("old_plugin"));
        assert_eq!(by_key.len(), 1);
        assert_eq!(by_key[0].title, "old_plugin_endpoint");
    }

    #[test]
    fn scope_restriction_suppresses_other_sources() {
        let conn = fixture_conn();
        conn.execute_batch(
            "INSERT INTO wp_posts (ID, post_content) VALUES (1, 'needle');
             INSERT INTO wp_postmeta (meta_id, post_id, meta_key, meta_value)
                VALUES (1, 1, 'k', 'needle');
             INSERT INTO wp_options (option_id, option_name, option_value)
                VALUES (1, 'opt', 'needle');",
        )
        .unwrap();

        for (scope, expected_kind) in [
            (Scope::ContentOnly, MatchKind::Content),
            (Scope::MetadataOnly, MatchKind::Metadata),
            (Scope::ConfigurationOnly, MatchKind::Configuration),
        ] {
            let opts = ScanOptions::new(
                "needle",
                scope,
                false,
                false,
                false,
                ExclusionSet::defaults(),
            )
            .unwrap();
            let records = scan_with(&conn, &opts);
            assert_eq!(records.len(), 1, "scope {scope:?}");
            assert_eq!(records[0].kind, expected_kind);
        }
    }

    #[test]
    fn record_order_is_content_then_metadata_then_configuration() {
        let conn = fixture_conn();
        conn.execute_batch(
            "INSERT INTO wp_posts (ID, post_content) VALUES (1, 'needle');
             INSERT INTO wp_postmeta (meta_id, post_id, meta_key, meta_value)
                VALUES (1, 1, 'k', 'needle');
             INSERT INTO wp_options (option_id, option_name, option_value)
                VALUES (1, 'opt', 'needle');",
        )
        .unwrap();
        let records = scan_with(&conn, &options("needle"));
        let kinds: Vec<MatchKind> = records.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                MatchKind::Content,
                MatchKind::Metadata,
                MatchKind::Configuration
            ]
        );
    }

    #[test]
    fn https_scheme_flows_into_links() {
        let conn = fixture_conn();
        conn.execute_batch(
            "INSERT INTO wp_posts (ID, post_content) VALUES (1, 'needle');
             INSERT INTO wp_options (option_id, option_name, option_value)
                VALUES (1, 'siteurl', 'https://a.test');",
        )
        .unwrap();
        let opts = ScanOptions::new(
            "needle",
            Scope::ContentOnly,
            false,
            false,
            false,
            ExclusionSet::defaults(),
        )
        .unwrap();
        let records = scan_with(&conn, &opts);
        assert!(records[0].link.starts_with("https://a.test/"));
    }

    #[test]
    fn metadata_without_content_table_is_skipped_not_an_error() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE wp_postmeta (
                meta_id INTEGER PRIMARY KEY,
                post_id INTEGER NOT NULL,
                meta_key TEXT NOT NULL,
                meta_value TEXT NOT NULL DEFAULT ''
            );
            INSERT INTO wp_postmeta VALUES (1, 1, 'orphan_key', 'needle');",
        )
        .unwrap();
        let opts = options("needle");
        let tables = TableSet::resolve(&conn, "wp_", 1).unwrap();
        let records = TenantScanner::new(&conn, &opts)
            .scan(&tenant_one(), &tables)
            .unwrap();
        assert!(
            records.is_empty(),
            "metadata needs its content table for the owner join"
        );
    }

    #[test]
    fn missing_tables_yield_zero_matches() {
        let conn = Connection::open_in_memory().unwrap();
        let opts = options("needle");
        let tables = TableSet::resolve(&conn, "wp_", 1).unwrap();
        let records = TenantScanner::new(&conn, &opts)
            .scan(&tenant_one(), &tables)
            .unwrap();
        assert!(records.is_empty());
    }
}
