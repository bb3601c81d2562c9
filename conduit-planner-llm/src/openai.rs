//! OpenAI Chat Completions provider, JSON-object mode.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::extract::extract_json_object;
use crate::provider::LlmProvider;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Requests a `json_object`-mode completion from OpenAI's Chat Completions
/// API at temperature 0.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
    api_url: String,
}

impl OpenAiProvider {
    /// Create a provider for `model` authenticated with `api_key`.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            client: reqwest::Client::new(),
            api_url: CHAT_COMPLETIONS_URL.to_string(),
        }
    }

    /// Override the API URL, for testing against a local stub server.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.model
    }

    async fn request_json(&self, system_prompt: &str, user_prompt: &str) -> Option<Value> {
        let payload = json!({
            "model": self.model,
            "temperature": 0,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body: Value = response.json().await.ok()?;
        let content = body.get("choices")?.get(0)?.get("message")?.get("content")?.as_str()?;
        extract_json_object(content)
    }
}
