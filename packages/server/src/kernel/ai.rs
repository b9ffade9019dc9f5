//! OpenAI-backed implementation of the AI trait.

use anyhow::Result;
use async_trait::async_trait;
use openai_client::OpenAIClient;

use super::traits::BaseAI;

pub struct OpenAIAdapter {
    client: OpenAIClient,
}

impl OpenAIAdapter {
    pub fn new(api_key: impl Into<String>, model: Option<String>) -> Self {
        let mut client = OpenAIClient::new(api_key);
        if let Some(model) = model {
            client = client.with_model(model);
        }
        Self { client }
    }
}

#[async_trait]
impl BaseAI for OpenAIAdapter {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let text = self.client.complete_with_system(system, prompt).await?;
        Ok(text)
    }
}
