//! Scan engine: exclusion matching, per-tenant search, run orchestration.

pub mod coordinator;
pub mod exclusions;
pub mod record;
pub mod tenant;
