#![forbid(unsafe_code)]

//! tenant_sweep (tsw): network-wide substring sweep for multi-tenant installs.
//!
//! A read-only diagnostic that searches every tenant subsite's content,
//! metadata, and configuration tables for a literal substring and reports
//! matching locations with direct links and management-command hints.
//! Used to hunt down residual references: old domains, deprecated
//! shortcodes, plugin artifacts.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use tenant_sweep::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use tenant_sweep::scan::coordinator::ScanCoordinator;
//! use tenant_sweep::scan::exclusions::ExclusionSet;
//! ```

pub mod prelude;

pub mod core;
pub mod registry;
pub mod report;
pub mod scan;
