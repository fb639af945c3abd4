//! Run orchestration: the tenant loop, global accounting, and reporting.

#![allow(missing_docs)]

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use rusqlite::Connection;
use serde_json::json;

use crate::core::errors::{Result, TswError};
use crate::registry::tables::TableSet;
use crate::registry::tenants::Tenant;
use crate::report::format;
use crate::scan::record::ScanOptions;
use crate::scan::tenant::TenantScanner;

/// Global counters for one run. Owned exclusively by the coordinator
/// and threaded through return values, never shared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub total_matches: u64,
    pub tenants_with_matches: u64,
    pub tenants_scanned: u64,
}

impl RunTotals {
    /// Percentage of scanned tenants containing at least one match.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn match_rate_pct(&self) -> f64 {
        if self.tenants_scanned == 0 {
            return 0.0;
        }
        self.tenants_with_matches as f64 * 100.0 / self.tenants_scanned as f64
    }
}

/// How per-tenant results are reported while the run progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStyle {
    /// Full per-match detail with links and hints.
    Detail,
    /// One checkmark line per matching tenant, no per-match detail.
    Summary,
    /// One JSON object per matching tenant plus a summary object.
    Json,
}

/// Drives the sequential sweep over all tenants.
///
/// One tenant is fully scanned before the next begins; the only shared
/// resource is the database connection, held for the run's duration.
pub struct ScanCoordinator<'a> {
    conn: &'a Connection,
    prefix: &'a str,
    options: &'a ScanOptions,
    style: ReportStyle,
    progress_interval: u64,
}

impl<'a> ScanCoordinator<'a> {
    pub fn new(
        conn: &'a Connection,
        prefix: &'a str,
        options: &'a ScanOptions,
        style: ReportStyle,
        progress_interval: u64,
    ) -> Self {
        Self {
            conn,
            prefix,
            options,
            style,
            progress_interval,
        }
    }

    /// Sweep `tenants` in the given (ascending-id) order, emitting
    /// incremental reports and a final summary to `sink`.
    ///
    /// A single tenant's query failure is reported inline and never
    /// aborts the run; connection-level failures propagate immediately.
    pub fn run<W: Write>(&self, tenants: &[Tenant], sink: &mut W) -> Result<RunTotals> {
        let started = Instant::now();
        let mut totals = RunTotals::default();
        let scanner = TenantScanner::new(self.conn, self.options);

        for tenant in tenants {
            let tables = TableSet::resolve(self.conn, self.prefix, tenant.id)?;
            match scanner.scan(tenant, &tables) {
                Ok(records) => {
                    totals.tenants_scanned += 1;
                    if !records.is_empty() {
                        totals.tenants_with_matches += 1;
                        totals.total_matches += records.len() as u64;
                        self.emit_tenant_report(sink, tenant, &records)?;
                    }
                }
                Err(err) if err.is_per_tenant() => {
                    // Scanned-with-error: zero matches, run continues.
                    totals.tenants_scanned += 1;
                    self.emit_tenant_error(sink, tenant, &err)?;
                }
                Err(err) => return Err(err),
            }

            if self.style == ReportStyle::Detail
                && self.progress_interval > 0
                && totals.tenants_scanned.is_multiple_of(self.progress_interval)
            {
                emit(sink, &format::progress_marker(totals.tenants_scanned))?;
            }
        }

        self.emit_summary(sink, &totals, started)?;
        Ok(totals)
    }

    fn emit_tenant_report<W: Write>(
        &self,
        sink: &mut W,
        tenant: &Tenant,
        records: &[crate::scan::record::MatchRecord],
    ) -> Result<()> {
        match self.style {
            ReportStyle::Detail => {
                emit(sink, &format::tenant_header(tenant, records.len()))?;
                for record in records {
                    write_all(sink, &format::match_lines(record))?;
                }
                emit(sink, "")
            }
            ReportStyle::Summary => {
                emit(sink, &format::tenant_summary_line(tenant, records.len()))
            }
            ReportStyle::Json => {
                let payload = json!({
                    "tenant": tenant,
                    "match_count": records.len(),
                    "matches": records,
                });
                emit(sink, &serde_json::to_string(&payload)?)
            }
        }
    }

    fn emit_tenant_error<W: Write>(
        &self,
        sink: &mut W,
        tenant: &Tenant,
        err: &TswError,
    ) -> Result<()> {
        match self.style {
            ReportStyle::Json => {
                let payload = json!({
                    "tenant": tenant,
                    "error": err.to_string(),
                    "error_code": err.code(),
                });
                emit(sink, &serde_json::to_string(&payload)?)
            }
            _ => emit(sink, &format::tenant_error_line(tenant, &err.to_string())),
        }
    }

    fn emit_summary<W: Write>(
        &self,
        sink: &mut W,
        totals: &RunTotals,
        started: Instant,
    ) -> Result<()> {
        let elapsed = started.elapsed();
        match self.style {
            ReportStyle::Json => {
                let mut payload = json!({
                    "summary": true,
                    "term": self.options.term,
                    "total_matches": totals.total_matches,
                    "tenants_with_matches": totals.tenants_with_matches,
                    "tenants_scanned": totals.tenants_scanned,
                    "elapsed_ms": u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                    "finished_at": chrono::Utc::now().to_rfc3339(),
                });
                if totals.total_matches > 0 {
                    if let Some(obj) = payload.as_object_mut() {
                        obj.insert(
                            "match_rate_pct".to_string(),
                            json!((totals.match_rate_pct() * 10.0).round() / 10.0),
                        );
                    }
                }
                emit(sink, &serde_json::to_string(&payload)?)
            }
            _ => {
                emit(sink, "")?;
                write_all(
                    sink,
                    &format::summary(&self.options.term, totals, elapsed),
                )
            }
        }
    }
}

fn write_all<W: Write>(sink: &mut W, text: &str) -> Result<()> {
    sink.write_all(text.as_bytes()).map_err(|source| TswError::Io {
        path: PathBuf::from("<sink>"),
        source,
    })
}

fn emit<W: Write>(sink: &mut W, line: &str) -> Result<()> {
    writeln!(sink, "{line}").map_err(|source| TswError::Io {
        path: PathBuf::from("<sink>"),
        source,
    })
}
