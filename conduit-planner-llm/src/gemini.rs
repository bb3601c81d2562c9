//! Gemini `generateContent` provider, JSON mime-type mode.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::extract::extract_json_object;
use crate::provider::LlmProvider;

const GENERATE_CONTENT_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent?key={api_key}";

/// Requests a `responseMimeType: application/json` completion from
/// Gemini's `generateContent` endpoint.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
    url_template: String,
}

impl GeminiProvider {
    /// Create a provider for `model` authenticated with `api_key`.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            client: reqwest::Client::new(),
            url_template: GENERATE_CONTENT_URL.to_string(),
        }
    }

    /// Override the URL template, for testing against a local stub server.
    pub fn with_url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = template.into();
        self
    }

    fn url(&self) -> String {
        self.url_template.replace("{model}", &self.model).replace("{api_key}", &self.api_key)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        &self.model
    }

    async fn request_json(&self, system_prompt: &str, user_prompt: &str) -> Option<Value> {
        let payload = json!({
            "contents": [{"role": "user", "parts": [{"text": format!("{system_prompt}\n\n{user_prompt}")}]}],
            "generationConfig": {"temperature": 0.1, "responseMimeType": "application/json"},
        });

        let response = self.client.post(self.url()).json(&payload).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body: Value = response.json().await.ok()?;
        let parts = body.get("candidates")?.get(0)?.get("content")?.get("parts")?.as_array()?;
        let content: String = parts.iter().filter_map(|part| part.get("text")?.as_str()).collect();
        extract_json_object(&content)
    }
}
