//! Profile client implementation of the fetcher trait.

use async_trait::async_trait;
use profile_client::{FetchedProfile, ProfileClient};

use super::traits::BaseProfileFetcher;

#[async_trait]
impl BaseProfileFetcher for ProfileClient {
    async fn fetch(&self, url: &str) -> FetchedProfile {
        ProfileClient::fetch(self, url).await
    }
}
