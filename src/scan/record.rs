//! Match records and the immutable option set threaded through a run.

#![allow(missing_docs)]

use serde::Serialize;

use crate::core::errors::{Result, TswError};
use crate::scan::exclusions::ExclusionSet;

/// Which table a match came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Content,
    Metadata,
    Configuration,
}

impl MatchKind {
    /// Short tag used in location lines.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Metadata => "meta",
            Self::Configuration => "option",
        }
    }
}

/// One matching location within one tenant. Produced by the scanner,
/// consumed only by the formatter; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub kind: MatchKind,
    /// Content title or metadata/configuration key.
    pub title: String,
    pub id: u64,
    /// Secondary status text (content status/type, revision parent note).
    pub extra: Option<String>,
    /// Canonical link to the matched location.
    pub link: String,
    /// Suggested management-tool command for direct inspection.
    pub hint: Option<String>,
}

/// Which table sources a run searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    #[default]
    All,
    ContentOnly,
    MetadataOnly,
    ConfigurationOnly,
}

impl Scope {
    /// Build a scope from the three restriction flags.
    ///
    /// At most one flag may be set; combined restrictions are rejected
    /// as a configuration error.
    pub fn from_flags(
        content_only: bool,
        metadata_only: bool,
        configuration_only: bool,
    ) -> Result<Self> {
        match (content_only, metadata_only, configuration_only) {
            (false, false, false) => Ok(Self::All),
            (true, false, false) => Ok(Self::ContentOnly),
            (false, true, false) => Ok(Self::MetadataOnly),
            (false, false, true) => Ok(Self::ConfigurationOnly),
            _ => Err(TswError::InvalidConfig {
                details: "at most one of --posts-only, --meta-only, --options-only may be set"
                    .to_string(),
            }),
        }
    }

    pub const fn includes_content(self) -> bool {
        matches!(self, Self::All | Self::ContentOnly)
    }

    pub const fn includes_metadata(self) -> bool {
        matches!(self, Self::All | Self::MetadataOnly)
    }

    pub const fn includes_configuration(self) -> bool {
        matches!(self, Self::All | Self::ConfigurationOnly)
    }
}

/// Immutable option set for one run, built once and passed by reference
/// into every component that needs it.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub term: String,
    pub scope: Scope,
    pub case_sensitive: bool,
    pub published_only: bool,
    pub exclude_revisions: bool,
    pub exclusions: ExclusionSet,
}

impl ScanOptions {
    /// Validate and freeze the option set.
    pub fn new(
        term: impl Into<String>,
        scope: Scope,
        case_sensitive: bool,
        published_only: bool,
        exclude_revisions: bool,
        exclusions: ExclusionSet,
    ) -> Result<Self> {
        let term = term.into();
        if term.is_empty() {
            return Err(TswError::InvalidConfig {
                details: "search term must not be empty".to_string(),
            });
        }
        Ok(Self {
            term,
            scope,
            case_sensitive,
            published_only,
            exclude_revisions,
            exclusions,
        })
    }
}
