//! Record validation.
//!
//! Pure, never suspends. An invalid record is excluded from the fetch and
//! generate steps but still produces an error outcome, so job progress
//! advances for every submitted row.

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use super::models::{LeadRecord, ValidatedLead};

lazy_static! {
    // local@domain shape; full RFC 5322 is not the goal
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn is_absolute_http_url(value: &str) -> bool {
    Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Validate one record. Returns every violation, not just the first.
pub fn validate(record: &LeadRecord) -> Result<ValidatedLead, Vec<String>> {
    let mut violations = Vec::new();

    let first_name = non_empty(&record.first_name);
    if first_name.is_none() {
        violations.push("first name is required".to_string());
    }
    let last_name = non_empty(&record.last_name);
    if last_name.is_none() {
        violations.push("last name is required".to_string());
    }

    let email = record.email.as_deref().and_then(non_empty);
    if let Some(email) = &email {
        if !EMAIL_RE.is_match(email) {
            violations.push(format!("email '{}' is not a valid address", email));
        }
    }

    let profile_url = record.profile_url.as_deref().and_then(non_empty);
    if let Some(url) = &profile_url {
        if !is_absolute_http_url(url) {
            violations.push(format!("profile URL '{}' is not an absolute URL", url));
        }
    }

    if !violations.is_empty() {
        return Err(violations);
    }

    Ok(ValidatedLead {
        // Presence was checked above
        first_name: first_name.unwrap_or_default(),
        last_name: last_name.unwrap_or_default(),
        email,
        profile_url,
        company: record.company.as_deref().and_then(non_empty),
        title: record.title.as_deref().and_then(non_empty),
        location: record.location.as_deref().and_then(non_empty),
    })
}
