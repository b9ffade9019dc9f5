//! Personalized email generation.
//!
//! The prompt is a pure function of the validated lead and the fetched
//! profile. When the fetch degraded (timeout, blocked, error) the prompt is
//! built from the lead fields alone, so a lost profile never loses the lead.

use std::time::Duration;

use thiserror::Error;

use crate::kernel::traits::BaseAI;
use profile_client::{FetchStatus, FetchedProfile};

use super::models::{GeneratedEmail, ValidatedLead};

const SYSTEM_PROMPT: &str = "You write short, personalized B2B outreach emails. \
    Three sentences maximum, a concrete hook from the prospect's background when \
    one is available, no placeholder brackets, no subject line.";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("generation failed: {0}")]
    Model(String),
}

/// Whether the fetched profile is trustworthy enough to feed the prompt.
fn usable_profile(profile: Option<&FetchedProfile>) -> Option<&FetchedProfile> {
    profile.filter(|p| {
        matches!(p.fetch_status, FetchStatus::Ok | FetchStatus::Partial) && p.has_any_field()
    })
}

/// Build the user prompt. Profile facts are included only when the fetch
/// produced usable fields.
fn build_prompt(lead: &ValidatedLead, profile: Option<&FetchedProfile>) -> String {
    let mut lines = vec![format!("Prospect: {}", lead.identity())];

    if let Some(title) = &lead.title {
        lines.push(format!("Role: {}", title));
    }
    if let Some(company) = &lead.company {
        lines.push(format!("Company: {}", company));
    }
    if let Some(location) = &lead.location {
        lines.push(format!("Location: {}", location));
    }

    if let Some(profile) = usable_profile(profile) {
        if let Some(headline) = &profile.headline {
            lines.push(format!("Profile headline: {}", headline));
        }
        if let Some(company) = &profile.company {
            lines.push(format!("Profile company: {}", company));
        }
        if let Some(about) = &profile.about {
            lines.push(format!("Profile about: {}", about));
        }
    }

    lines.push("Write the outreach email now.".to_string());
    lines.join("\n")
}

/// Generate a personalized email for one lead.
pub async fn generate(
    lead: &ValidatedLead,
    profile: Option<&FetchedProfile>,
    ai: &dyn BaseAI,
    timeout: Duration,
) -> Result<GeneratedEmail, GenerationError> {
    let prompt = build_prompt(lead, profile);

    let body = tokio::time::timeout(timeout, ai.complete(SYSTEM_PROMPT, &prompt))
        .await
        .map_err(|_| GenerationError::Timeout(timeout))?
        .map_err(|e| GenerationError::Model(e.to_string()))?;

    let body = body.trim().to_string();
    if body.is_empty() {
        return Err(GenerationError::Model("model returned no text".to_string()));
    }
    Ok(GeneratedEmail { body })
}
