//! Artifact identity: a platform plus an `organization/name` pair.
//!
//! Comparison is case-insensitive (the canonical key), but the originally
//! observed casing is kept because some platforms require exact casing on
//! live lookups.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ResolveError;

/// An external system holding artifact metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Model registry (huggingface.co).
    HuggingFace,
    /// Code host (github.com).
    GitHub,
    /// Paper repository (arxiv.org).
    Arxiv,
    /// Bare `org/name` input whose platform has not been disambiguated yet.
    Unknown,
}

impl Platform {
    /// Infer the platform from a URL host.
    pub fn from_host(host: &str) -> Platform {
        let host = host.to_ascii_lowercase();
        if host.contains("huggingface") {
            Platform::HuggingFace
        } else if host.contains("github") {
            Platform::GitHub
        } else if host.contains("arxiv") {
            Platform::Arxiv
        } else {
            Platform::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::HuggingFace => "huggingface",
            Platform::GitHub => "github",
            Platform::Arxiv => "arxiv",
            Platform::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cross-platform artifact reference.
///
/// Equality and hashing are defined over the canonical key only (the
/// lower-cased `org/name` form). The `organization` and `name` fields keep
/// the original casing for any external call that requires it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactId {
    pub platform: Platform,
    pub organization: String,
    pub name: String,
}

impl ArtifactId {
    pub fn new(platform: Platform, organization: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            platform,
            organization: organization.into(),
            name: name.into(),
        }
    }

    /// Parse a full platform URL or a bare `org/name` token.
    ///
    /// URLs have trailing `.git`, query strings, and fragments stripped from
    /// the name segment and the platform inferred from the host. Bare tokens
    /// get `Platform::Unknown`; the caller disambiguates later. Fails with
    /// `MalformedInput` when fewer than two path segments are present.
    pub fn parse(input: &str) -> Result<ArtifactId, ResolveError> {
        let trimmed = input.trim();
        let malformed = || ResolveError::MalformedInput {
            input: input.to_string(),
        };

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            let url = Url::parse(trimmed).map_err(|_| malformed())?;
            let platform = url.host_str().map(Platform::from_host).unwrap_or(Platform::Unknown);
            let mut segments = url.path().split('/').filter(|s| !s.is_empty());
            let organization = segments.next().ok_or_else(malformed)?.to_string();
            let name = clean_name_segment(segments.next().ok_or_else(malformed)?);
            if organization.is_empty() || name.is_empty() {
                return Err(malformed());
            }
            Ok(ArtifactId::new(platform, organization, name))
        } else {
            let parts: Vec<&str> = trimmed.split('/').collect();
            if parts.len() != 2 {
                return Err(malformed());
            }
            let organization = parts[0].to_string();
            let name = clean_name_segment(parts[1]);
            if organization.is_empty() || name.is_empty() {
                return Err(malformed());
            }
            Ok(ArtifactId::new(Platform::Unknown, organization, name))
        }
    }

    /// Lower-cased `org/name` form, used only for equality and
    /// deduplication, never for live lookups.
    pub fn canonical_key(&self) -> String {
        format!(
            "{}/{}",
            self.organization.to_lowercase(),
            self.name.to_lowercase()
        )
    }

    /// `org/name` in the originally observed casing.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.organization, self.name)
    }

    /// Same identity reinterpreted on another platform.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Filesystem-safe key for the per-artifact store partition.
    pub fn storage_key(&self) -> String {
        self.canonical_key()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

/// Strip query string, fragment, and a trailing `.git` from a name segment.
fn clean_name_segment(raw: &str) -> String {
    let no_query = raw.split('?').next().unwrap_or("");
    let no_fragment = no_query.split('#').next().unwrap_or("");
    no_fragment.trim_end_matches(".git").to_string()
}

impl PartialEq for ArtifactId {
    fn eq(&self, other: &Self) -> bool {
        self.organization.eq_ignore_ascii_case(&other.organization)
            && self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl Eq for ArtifactId {}

impl Hash for ArtifactId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_key().hash(state);
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name())
    }
}
