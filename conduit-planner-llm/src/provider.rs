//! The `LlmProvider` capability: one chat-completions-shaped backend.

use async_trait::async_trait;
use serde_json::Value;

/// A backend capable of answering a system/user prompt pair with a JSON
/// object, or `None` on any failure (network error, HTTP ≥ 400, missing
/// credentials, non-JSON response). Implementations never propagate
/// transport errors — from the planner's point of view a failed provider
/// looks identical to a provider that declined to answer.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short identifier recorded in the plan's `llm_provider=…` note, e.g.
    /// `"openai:gpt-4o-mini"` or `"gemini:gemini-1.5-flash"`.
    fn name(&self) -> &str;

    /// Request a completion for `user_prompt` under `system_prompt` and
    /// extract its JSON object (whole-body or the first greedy `{...}`
    /// span). Returns `None` on transport failure, a non-2xx response, or a
    /// response with no extractable JSON object.
    async fn request_json(&self, system_prompt: &str, user_prompt: &str) -> Option<Value>;
}
