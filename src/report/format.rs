//! Result formatting: pure string construction, no I/O.
//!
//! The coordinator owns the output sink; everything here just renders.
//! Color is applied at the CLI layer, keeping the library output stable
//! for tests and `--json` piping.

#![allow(missing_docs)]

use std::time::Duration;

use crate::registry::tenants::Tenant;
use crate::scan::coordinator::RunTotals;
use crate::scan::record::MatchRecord;

/// Header line opening one tenant's detail block.
#[must_use]
pub fn tenant_header(tenant: &Tenant, match_count: usize) -> String {
    let noun = if match_count == 1 { "match" } else { "matches" };
    format!(
        "{} (tenant {}) — {match_count} {noun}",
        tenant.label(),
        tenant.id
    )
}

/// Checkmark-style one-liner for summary mode.
#[must_use]
pub fn tenant_summary_line(tenant: &Tenant, match_count: usize) -> String {
    format!("✓ {} (tenant {}): {match_count}", tenant.label(), tenant.id)
}

/// Render one match record as indented detail lines. Summary mode never
/// calls this; link and hint lines are suppressed entirely there.
#[must_use]
pub fn match_lines(record: &MatchRecord) -> String {
    let mut out = String::new();
    match &record.extra {
        Some(extra) => out.push_str(&format!(
            "  [{}] {} (id {}, {extra})\n",
            record.kind.tag(),
            record.title,
            record.id
        )),
        None => out.push_str(&format!(
            "  [{}] {} (id {})\n",
            record.kind.tag(),
            record.title,
            record.id
        )),
    }
    out.push_str(&format!("        {}\n", record.link));
    if let Some(hint) = &record.hint {
        out.push_str(&format!("        try: {hint}\n"));
    }
    out
}

/// Inline note for a tenant whose scan failed; the run continues.
#[must_use]
pub fn tenant_error_line(tenant: &Tenant, error: &str) -> String {
    format!(
        "! {} (tenant {}): scan failed — {error}",
        tenant.label(),
        tenant.id
    )
}

/// Lightweight progress marker emitted every N tenants.
#[must_use]
pub fn progress_marker(tenants_processed: u64) -> String {
    format!("… {tenants_processed} tenants scanned")
}

/// Final summary block. The match-rate line appears only when there
/// were matches at all; otherwise a "no matches" notice substitutes.
#[must_use]
pub fn summary(term: &str, totals: &RunTotals, elapsed: Duration) -> String {
    let mut out = String::new();
    out.push_str(&format!("Search term: \"{term}\"\n"));
    if totals.total_matches == 0 {
        out.push_str("No matches found across the network.\n");
        out.push_str(&format!("Tenants scanned: {}\n", totals.tenants_scanned));
    } else {
        out.push_str(&format!("Total matches: {}\n", totals.total_matches));
        out.push_str(&format!(
            "Tenants with matches: {}\n",
            totals.tenants_with_matches
        ));
        out.push_str(&format!("Tenants scanned: {}\n", totals.tenants_scanned));
        out.push_str(&format!("Match rate: {:.1}%\n", totals.match_rate_pct()));
    }
    out.push_str(&format!("Elapsed: {:.2}s\n", elapsed.as_secs_f64()));
    out
}
