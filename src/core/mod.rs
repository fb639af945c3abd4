//! Core infrastructure: configuration and error taxonomy.

pub mod config;
pub mod errors;
