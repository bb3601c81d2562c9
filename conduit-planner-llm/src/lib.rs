//! # conduit-planner-llm
//!
//! The LLM-assisted planner: request a JSON plan from a primary provider,
//! fall back to a secondary on any failure, and accept the result only if
//! it stays within the caller's connected services and the tool registry.

#![deny(missing_docs)]

mod extract;
mod gemini;
mod openai;
mod plan;
mod provider;

pub use extract::extract_json_object;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use plan::{request_plan, PlanRequestFailure};
pub use provider::LlmProvider;
