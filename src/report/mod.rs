//! Human-readable report rendering for sweep results.

pub mod format;
