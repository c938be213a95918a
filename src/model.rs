use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;

/// Title shown when the source entry carries no name.
pub const UNNAMED_RELEASE: &str = "Release name not provided";
/// Description shown when the source entry carries no body.
pub const EMPTY_BODY: &str = "Release body not provided";

/// Owner/name pair identifying the watched repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Link target for a `#<number>` reference in release notes.
    pub fn pull_url(&self, number: &str) -> String {
        format!(
            "https://github.com/{}/{}/pulls/{}",
            self.owner, self.name, number
        )
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// One release entry as returned by the GitHub API. Everything the feed
/// may omit is optional here.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRelease {
    pub name: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub html_url: String,
    pub body: Option<String>,
    #[serde(default)]
    pub prerelease: bool,
}

/// A release with all fallbacks resolved. Constructed fresh each poll and
/// discarded once announced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub name: String,
    pub published_at: DateTime<Utc>,
    pub html_url: String,
    pub body: String,
    pub prerelease: bool,
}

impl Release {
    /// Resolve a raw feed entry, substituting defaults for absent fields.
    /// `fetched_at` stands in for a missing publish timestamp.
    pub fn from_raw(raw: RawRelease, fetched_at: DateTime<Utc>) -> Self {
        Self {
            name: raw
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| UNNAMED_RELEASE.to_string()),
            published_at: raw.published_at.unwrap_or(fetched_at),
            html_url: raw.html_url,
            body: raw
                .body
                .filter(|b| !b.trim().is_empty())
                .unwrap_or_else(|| EMPTY_BODY.to_string()),
            prerelease: raw.prerelease,
        }
    }
}
