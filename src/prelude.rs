//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use tenant_sweep::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{Result, TswError};

// Registry
pub use crate::registry::tables::{ResolvedTables, TableSet, table_exists};
pub use crate::registry::tenants::{Tenant, load_tenants};

// Scan
pub use crate::scan::coordinator::{ReportStyle, RunTotals, ScanCoordinator};
pub use crate::scan::exclusions::{ExclusionSet, MatchRule};
pub use crate::scan::record::{MatchKind, MatchRecord, ScanOptions, Scope};
pub use crate::scan::tenant::TenantScanner;
