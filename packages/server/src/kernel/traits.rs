// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Naming convention: Base* for trait names (e.g., BaseAI, BaseProfileFetcher)

use anyhow::Result;
use async_trait::async_trait;
use profile_client::FetchedProfile;

// =============================================================================
// AI Trait (Infrastructure - Generic LLM capabilities)
// =============================================================================

#[async_trait]
pub trait BaseAI: Send + Sync {
    /// Complete a prompt with an LLM (returns raw text response)
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

// =============================================================================
// Profile Fetcher Trait (Infrastructure - external profile scraping)
// =============================================================================

#[async_trait]
pub trait BaseProfileFetcher: Send + Sync {
    /// Fetch a profile page, best effort. Implementations never fail past
    /// this boundary; every failure mode is folded into the returned
    /// profile's `fetch_status`.
    async fn fetch(&self, url: &str) -> FetchedProfile;
}
