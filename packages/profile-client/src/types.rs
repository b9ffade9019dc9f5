//! Result types for profile fetching.

use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// How a fetch attempt ended.
///
/// Extraction is best-effort: every variant except `Error` may carry
/// partially populated fields, and callers must not assume completeness
/// for any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    /// Primary profile content found and extracted
    Ok,
    /// Page loaded but the extraction was incomplete
    Partial,
    /// Deadline expired before the primary content appeared
    Timeout,
    /// The target refused the request (bot defense, rate limiting)
    Blocked,
    /// The resource could not be loaded at all
    Error,
}

impl FetchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStatus::Ok => "ok",
            FetchStatus::Partial => "partial",
            FetchStatus::Timeout => "timeout",
            FetchStatus::Blocked => "blocked",
            FetchStatus::Error => "error",
        }
    }
}

/// Best-effort structured data extracted from a profile page.
///
/// All fields are optional; a field that could not be extracted is `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedProfile {
    pub source_url: String,
    pub full_name: Option<String>,
    pub headline: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub about: Option<String>,
    pub fetch_status: FetchStatus,
}

impl FetchedProfile {
    /// An empty profile with the given terminal status.
    pub fn empty(source_url: impl Into<String>, status: FetchStatus) -> Self {
        Self {
            source_url: source_url.into(),
            full_name: None,
            headline: None,
            company: None,
            location: None,
            about: None,
            fetch_status: status,
        }
    }

    /// Convert an internal fetch failure into a boundary profile.
    ///
    /// Blocked and timeout keep their own status so downstream logic can
    /// distinguish "the source pushed back" from "the source is broken".
    pub fn from_failure(source_url: &str, err: &FetchError) -> Self {
        let status = match err {
            FetchError::Timeout => FetchStatus::Timeout,
            FetchError::Blocked { .. } => FetchStatus::Blocked,
            FetchError::Network(_) | FetchError::Unknown(_) => FetchStatus::Error,
        };
        Self::empty(source_url, status)
    }

    /// Whether any structured field was extracted.
    pub fn has_any_field(&self) -> bool {
        self.full_name.is_some()
            || self.headline.is_some()
            || self.company.is_some()
            || self.location.is_some()
            || self.about.is_some()
    }

    /// One-line summary of the extracted fields, for reporting.
    pub fn summary(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(headline) = &self.headline {
            parts.push(headline.clone());
        }
        if let Some(company) = &self.company {
            parts.push(company.clone());
        }
        if let Some(location) = &self.location {
            parts.push(location.clone());
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" | "))
        }
    }
}
