//! Tenant registry: subsite enumeration, table-name derivation, existence probes.

pub mod tables;
pub mod tenants;
