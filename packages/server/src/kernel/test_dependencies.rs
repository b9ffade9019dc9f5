// Mock implementations of the kernel traits for tests.
//
// Scripted responses go in through with_* builders; every call is recorded
// so tests can assert on what the engine actually did.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use profile_client::{FetchStatus, FetchedProfile};

use super::traits::{BaseAI, BaseProfileFetcher};

// =============================================================================
// Mock Profile Fetcher
// =============================================================================

pub struct MockProfileFetcher {
    responses: Mutex<HashMap<String, FetchedProfile>>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockProfileFetcher {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Script the profile returned for a specific URL.
    pub fn with_profile(self, url: &str, profile: FetchedProfile) -> Self {
        self.responses.lock().unwrap().insert(url.to_string(), profile);
        self
    }

    /// Script a degraded fetch for a specific URL.
    pub fn with_status(self, url: &str, status: FetchStatus) -> Self {
        let profile = FetchedProfile::empty(url, status);
        self.with_profile(url, profile)
    }

    /// Make every fetch take this long (for concurrency and progress tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URLs fetched, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn was_fetched(&self, url: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|u| u == url)
    }

    /// Highest number of fetches that were ever in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn default_profile(url: &str) -> FetchedProfile {
        let mut profile = FetchedProfile::empty(url, FetchStatus::Ok);
        profile.full_name = Some("Mock Person".to_string());
        profile.headline = Some("Mock headline".to_string());
        profile
    }
}

impl Default for MockProfileFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseProfileFetcher for MockProfileFetcher {
    async fn fetch(&self, url: &str) -> FetchedProfile {
        self.calls.lock().unwrap().push(url.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let scripted = self.responses.lock().unwrap().get(url).cloned();
        scripted.unwrap_or_else(|| Self::default_profile(url))
    }
}

// =============================================================================
// Mock AI
// =============================================================================

pub struct MockAI {
    responses: Mutex<Vec<String>>,
    prompts: Mutex<Vec<String>>,
    fail_with: Option<String>,
    delay: Option<Duration>,
}

impl MockAI {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            fail_with: None,
            delay: None,
        }
    }

    /// Queue a scripted completion; consumed in order, then the default
    /// canned text is returned.
    pub fn with_response(self, response: &str) -> Self {
        self.responses.lock().unwrap().push(response.to_string());
        self
    }

    /// Make every completion fail with this message.
    pub fn failing_with(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    /// Make every completion take this long (for timeout tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// User prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockAI {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseAI for MockAI {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.fail_with {
            return Err(anyhow!("{}", message));
        }

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("Hi, this is a mock personalized email.".to_string())
        } else {
            Ok(responses.remove(0))
        }
    }
}
