//! Exclusion patterns: wildcard-to-rule compilation for noise-key suppression.
//!
//! Metadata and configuration tables accumulate machine-written keys
//! (sync queues, transients, edit locks) that match almost any search
//! term by accident. Keys matching an exclusion pattern are dropped
//! silently before a record is emitted or counted.

#![allow(missing_docs)]

use regex::{Regex, RegexBuilder};

use crate::core::errors::{Result, TswError};

/// Built-in noise-key patterns, always active. User patterns are
/// additive and never replace these.
pub const DEFAULT_EXCLUSIONS: [&str; 7] = [
    "_transient_*",
    "_site_transient_*",
    "_edit_lock",
    "_edit_last",
    "jetpack_*",
    "jpsq_sync*",
    "akismet_*",
];

/// One compiled exclusion pattern.
///
/// Wildcard syntax: `*` matches any run of characters (including none),
/// `?` matches exactly one character. Matching is case-insensitive and
/// anchored at both ends; `jpsq_sync*` matches `jpsq_sync_token` but
/// not `xjpsq_sync`.
#[derive(Debug, Clone)]
pub struct MatchRule {
    source: String,
    compiled: Regex,
}

impl MatchRule {
    /// Compile a wildcard pattern into an anchored, case-insensitive rule.
    ///
    /// Every non-wildcard character is escaped before `*`/`?` expansion,
    /// so any pattern string is representable; compilation failure maps
    /// to [`TswError::InvalidPattern`] but should not occur in practice.
    pub fn compile(pattern: &str) -> Result<Self> {
        let mut regex_str = String::with_capacity(pattern.len() * 2 + 2);
        regex_str.push('^');
        for c in pattern.chars() {
            match c {
                '*' => regex_str.push_str(".*"),
                '?' => regex_str.push('.'),
                _ => regex_str.push_str(&regex::escape(&c.to_string())),
            }
        }
        regex_str.push('$');

        let compiled = RegexBuilder::new(&regex_str)
            .case_insensitive(true)
            .build()
            .map_err(|e| TswError::InvalidPattern {
                pattern: pattern.to_string(),
                details: e.to_string(),
            })?;

        Ok(Self {
            source: pattern.to_string(),
            compiled,
        })
    }

    /// The original wildcard string this rule was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether `name` matches this rule in full.
    pub fn is_match(&self, name: &str) -> bool {
        self.compiled.is_match(name)
    }
}

/// The running exclusion set: built-in defaults plus user patterns.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    rules: Vec<MatchRule>,
}

impl ExclusionSet {
    /// The 7 built-in defaults, with no user additions.
    pub fn defaults() -> Self {
        let rules = DEFAULT_EXCLUSIONS
            .iter()
            .map(|p| MatchRule::compile(p))
            .collect::<Result<Vec<_>>>()
            .unwrap_or_else(|e| unreachable!("built-in exclusion failed to compile: {e}"));
        Self { rules }
    }

    /// An empty set (matches nothing). Useful for tests.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append user-supplied patterns. Order carries no precedence; a
    /// name matching any rule is excluded.
    pub fn with_user_patterns<I, S>(mut self, patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            self.rules.push(MatchRule::compile(pattern.as_ref())?);
        }
        Ok(self)
    }

    /// True iff any rule matches `name` in full. Empty set ⇒ false.
    pub fn contains_match(&self, name: &str) -> bool {
        self.rules.iter().any(|rule| rule.is_match(name))
    }

    /// Number of active rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
