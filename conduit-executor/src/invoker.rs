//! The tool invocation capability (§6): resolves a [`ToolDefinition`],
//! validates and renders its payload, fetches the caller's OAuth token,
//! and makes the HTTP call.

use std::collections::HashMap;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use conduit_registry::{IdempotencyKeyPolicy, ToolDefinition, ToolRegistry};

/// The outcome of one tool invocation, mirroring the `{ok, data, error_code?}`
/// shape every caller (classical executor, DAG `skill` nodes) consumes.
#[derive(Debug, Clone)]
pub struct ToolInvocationOutcome {
    /// Whether the call succeeded.
    pub ok: bool,
    /// Parsed response body on success.
    pub data: Option<Value>,
    /// `{tool}:{mapped_code}[|status=…|code=…|message=…|request_id=…]` on
    /// failure.
    pub error_code: Option<String>,
}

impl ToolInvocationOutcome {
    fn success(data: Value) -> Self {
        Self { ok: true, data: Some(data), error_code: None }
    }

    fn failure(error_code: impl Into<String>) -> Self {
        Self { ok: false, data: None, error_code: Some(error_code.into()) }
    }
}

/// Resolves an access token for `(user_id, provider)`. Implementations
/// back this with whatever token store and decryption the deployment
/// uses; this crate only needs the resolved bearer token.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Return the caller's access token for `provider`, or `None` when
    /// not connected.
    async fn access_token(&self, user_id: &str, provider: &str) -> Option<String>;
}

/// Invokes a named tool with a payload, on behalf of a user.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Invoke `tool_name` with `payload` on behalf of `user_id`.
    async fn invoke(&self, user_id: &str, tool_name: &str, payload: &Value) -> ToolInvocationOutcome;
}

fn path_param_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([a-zA-Z0-9_]+)\}").unwrap())
}

fn extract_path_params(path: &str) -> Vec<String> {
    path_param_pattern().captures_iter(path).map(|c| c[1].to_string()).collect()
}

/// Render `path`'s `{param}` placeholders from `payload`. Missing or
/// empty values fail with `missing_path_param:{key}`.
pub fn build_path(path: &str, payload: &Map<String, Value>) -> Result<String, String> {
    let mut rendered = path.to_string();
    for key in extract_path_params(path) {
        let value = payload.get(&key);
        let text = match value {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Null) | None => return Err(format!("missing_path_param:{key}")),
            Some(other) => {
                let text = match other {
                    Value::String(s) => s.clone(),
                    _ => other.to_string(),
                };
                if text.is_empty() {
                    return Err(format!("missing_path_param:{key}"));
                }
                text
            }
        };
        rendered = rendered.replace(&format!("{{{key}}}"), &text);
    }
    Ok(rendered)
}

/// The remaining payload once path-parameter keys are removed: becomes
/// the request body (non-`GET`) or query string (`GET`).
pub fn strip_path_params(path: &str, payload: &Map<String, Value>) -> Map<String, Value> {
    let used: std::collections::HashSet<String> = extract_path_params(path).into_iter().collect();
    payload.iter().filter(|(k, _)| !used.contains(*k)).map(|(k, v)| (k.clone(), v.clone())).collect()
}

fn validate_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    }
}

/// Validate `payload` against `tool.input_schema`'s `required`/`properties`,
/// returning the bare `VALIDATION_{REQUIRED|TYPE|MIN|MAX|ENUM}:{field}`
/// code on the first violation found.
pub fn validate_payload_by_schema(tool: &ToolDefinition, payload: &Map<String, Value>) -> Result<(), String> {
    let schema = &tool.input_schema;
    let required = schema.get("required").and_then(Value::as_array).cloned().unwrap_or_default();
    let properties = schema.get("properties").and_then(Value::as_object);

    for field in &required {
        let Some(field) = field.as_str() else { continue };
        let missing = payload.get(field).map(Value::is_null).unwrap_or(true);
        if missing {
            return Err(format!("VALIDATION_REQUIRED:{field}"));
        }
    }

    let Some(properties) = properties else { return Ok(()) };
    for (key, value) in payload {
        let Some(spec) = properties.get(key).and_then(Value::as_object) else { continue };
        if let Some(expected_type) = spec.get("type").and_then(Value::as_str) {
            if !validate_type(value, expected_type) {
                return Err(format!("VALIDATION_TYPE:{key}"));
            }
            if expected_type == "integer" {
                if let Some(n) = value.as_i64() {
                    if let Some(min) = spec.get("minimum").and_then(Value::as_i64) {
                        if n < min {
                            return Err(format!("VALIDATION_MIN:{key}"));
                        }
                    }
                    if let Some(max) = spec.get("maximum").and_then(Value::as_i64) {
                        if n > max {
                            return Err(format!("VALIDATION_MAX:{key}"));
                        }
                    }
                }
            }
        }
        if let Some(enum_values) = spec.get("enum").and_then(Value::as_array) {
            if !enum_values.contains(value) {
                return Err(format!("VALIDATION_ENUM:{key}"));
            }
        }
    }
    Ok(())
}

/// `reqwest`-backed [`ToolInvoker`], covering the generic HTTP shape every
/// service in the registry shares: render path, validate payload, fetch a
/// bearer token when the tool needs one, dispatch by method, map
/// `status >= 400` through `error_map`.
pub struct HttpToolInvoker {
    client: reqwest::Client,
    registry: std::sync::Arc<ToolRegistry>,
    tokens: std::sync::Arc<dyn AccessTokenProvider>,
    notion_api_version: String,
}

impl HttpToolInvoker {
    /// Build an invoker over `registry`, resolving tokens through `tokens`.
    pub fn new(registry: std::sync::Arc<ToolRegistry>, tokens: std::sync::Arc<dyn AccessTokenProvider>) -> Self {
        Self {
            client: reqwest::Client::new(),
            registry,
            tokens,
            notion_api_version: "2022-06-28".to_string(),
        }
    }

    async fn headers_for(&self, user_id: &str, tool: &ToolDefinition) -> Result<HashMap<String, String>, String> {
        let mut headers = HashMap::new();
        let provider = match tool.service.as_str() {
            "notion" => Some("notion"),
            "spotify" => Some("spotify"),
            _ if !tool.required_scopes.is_empty() => Some(tool.service.as_str()),
            _ => None,
        };
        if let Some(provider) = provider {
            let Some(token) = self.tokens.access_token(user_id, provider).await else {
                return Err(format!("{provider}_not_connected"));
            };
            headers.insert("Authorization".to_string(), format!("Bearer {token}"));
            if tool.service == "notion" {
                headers.insert("Notion-Version".to_string(), self.notion_api_version.clone());
            }
        }
        Ok(headers)
    }

    fn parse_failure_detail(status: u16, body: &Value, raw_text: &str, request_id_header: Option<&str>) -> String {
        let code = body.get("code").and_then(Value::as_str).unwrap_or("").to_string();
        let message = if body.is_null() {
            raw_text.chars().take(300).collect::<String>()
        } else {
            body.get("message").and_then(Value::as_str).unwrap_or("").to_string()
        };
        let request_id = request_id_header
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| body.get("request_id").and_then(Value::as_str).unwrap_or("").to_string());
        format!("|status={status}|code={code}|message={message}|request_id={request_id}")
    }
}

#[async_trait]
impl ToolInvoker for HttpToolInvoker {
    async fn invoke(&self, user_id: &str, tool_name: &str, payload: &Value) -> ToolInvocationOutcome {
        let tool = match self.registry.get_tool(tool_name) {
            Ok(tool) => tool,
            Err(_) => return ToolInvocationOutcome::failure(format!("unknown_tool:{tool_name}")),
        };
        let payload_object = payload.as_object().cloned().unwrap_or_default();

        if let Err(code) = validate_payload_by_schema(tool, &payload_object) {
            return ToolInvocationOutcome::failure(format!("{tool_name}:{code}"));
        }

        let path = match build_path(&tool.path_template, &payload_object) {
            Ok(path) => path,
            Err(code) => return ToolInvocationOutcome::failure(code),
        };
        let body_or_query = strip_path_params(&tool.path_template, &payload_object);
        let url = format!("{}{}", tool.base_url, path);

        let headers = match self.headers_for(user_id, tool).await {
            Ok(headers) => headers,
            Err(code) => return ToolInvocationOutcome::failure(code),
        };

        let method = tool.http_method.to_uppercase();
        let mut request = match method.as_str() {
            "GET" => self.client.get(&url).query(&body_or_query),
            "DELETE" => self.client.delete(&url),
            other => self.client.request(
                reqwest::Method::from_bytes(other.as_bytes()).unwrap_or(reqwest::Method::POST),
                &url,
            ).json(&body_or_query),
        };
        for (key, value) in &headers {
            request = request.header(key, value);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => return ToolInvocationOutcome::failure(format!("{tool_name}:TOOL_TIMEOUT")),
            Err(_) => return ToolInvocationOutcome::failure(format!("{tool_name}:TOOL_FAILED")),
        };

        let status = response.status();
        let request_id_header = response.headers().get("x-notion-request-id").and_then(|v| v.to_str().ok()).map(str::to_string);
        if status.as_u16() >= 400 {
            let mapped = tool.error_map.get(&status.as_u16().to_string()).cloned().unwrap_or_else(|| "TOOL_FAILED".to_string());
            let raw_text = response.text().await.unwrap_or_default();
            let body: Value = serde_json::from_str(&raw_text).unwrap_or(Value::Null);
            let detail = Self::parse_failure_detail(status.as_u16(), &body, &raw_text, request_id_header.as_deref());
            return ToolInvocationOutcome::failure(format!("{tool_name}:{mapped}{detail}"));
        }

        let raw_text = response.text().await.unwrap_or_default();
        let data = match serde_json::from_str::<Value>(&raw_text) {
            Ok(value) => value,
            Err(_) => serde_json::json!({"raw_text": raw_text}),
        };
        ToolInvocationOutcome::success(data)
    }
}

/// Derive this tool's idempotency key for `payload`, per its
/// [`IdempotencyKeyPolicy`]. `event_id` is the upstream event id captured
/// in the run, used by the `event_id` policy.
pub fn idempotency_key(tool: &ToolDefinition, payload: &Value, event_id: Option<&str>) -> Option<String> {
    match tool.idempotency_key_policy {
        IdempotencyKeyPolicy::None => None,
        IdempotencyKeyPolicy::EventId => event_id.map(str::to_string),
        IdempotencyKeyPolicy::Hash => Some(conduit_core::sha256_hex(payload)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_path_substitutes_and_rejects_missing() {
        let mut payload = Map::new();
        payload.insert("page_id".to_string(), json!("abc123"));
        assert_eq!(build_path("/pages/{page_id}", &payload).unwrap(), "/pages/abc123");

        let empty = Map::new();
        assert_eq!(build_path("/pages/{page_id}", &empty), Err("missing_path_param:page_id".to_string()));
    }

    #[test]
    fn strip_path_params_removes_used_keys_only() {
        let mut payload = Map::new();
        payload.insert("page_id".to_string(), json!("abc"));
        payload.insert("title".to_string(), json!("hi"));
        let body = strip_path_params("/pages/{page_id}", &payload);
        assert!(!body.contains_key("page_id"));
        assert!(body.contains_key("title"));
    }

    #[test]
    fn validate_payload_rejects_missing_required_field() {
        let tool = sample_tool(json!({"required": ["title"], "properties": {"title": {"type": "string"}}}));
        let payload = Map::new();
        assert_eq!(validate_payload_by_schema(&tool, &payload), Err("VALIDATION_REQUIRED:title".to_string()));
    }

    #[test]
    fn validate_payload_rejects_wrong_type() {
        let tool = sample_tool(json!({"properties": {"count": {"type": "integer"}}}));
        let mut payload = Map::new();
        payload.insert("count".to_string(), json!("not a number"));
        assert_eq!(validate_payload_by_schema(&tool, &payload), Err("VALIDATION_TYPE:count".to_string()));
    }

    #[test]
    fn validate_payload_enforces_integer_bounds_and_enum() {
        let tool = sample_tool(json!({
            "properties": {
                "count": {"type": "integer", "minimum": 1, "maximum": 5},
                "mode": {"enum": ["a", "b"]},
            }
        }));
        let mut over = Map::new();
        over.insert("count".to_string(), json!(9));
        assert_eq!(validate_payload_by_schema(&tool, &over), Err("VALIDATION_MAX:count".to_string()));

        let mut bad_enum = Map::new();
        bad_enum.insert("mode".to_string(), json!("z"));
        assert_eq!(validate_payload_by_schema(&tool, &bad_enum), Err("VALIDATION_ENUM:mode".to_string()));
    }

    #[test]
    fn idempotency_key_policies_match_spec() {
        let none_tool = {
            let mut t = sample_tool(json!({}));
            t.idempotency_key_policy = IdempotencyKeyPolicy::None;
            t
        };
        assert_eq!(idempotency_key(&none_tool, &json!({}), Some("evt-1")), None);

        let event_tool = {
            let mut t = sample_tool(json!({}));
            t.idempotency_key_policy = IdempotencyKeyPolicy::EventId;
            t
        };
        assert_eq!(idempotency_key(&event_tool, &json!({}), Some("evt-1")), Some("evt-1".to_string()));

        let hash_tool = {
            let mut t = sample_tool(json!({}));
            t.idempotency_key_policy = IdempotencyKeyPolicy::Hash;
            t
        };
        let key_a = idempotency_key(&hash_tool, &json!({"a": 1}), None).unwrap();
        let key_b = idempotency_key(&hash_tool, &json!({"a": 1}), None).unwrap();
        assert_eq!(key_a, key_b);
    }

    fn sample_tool(input_schema: Value) -> ToolDefinition {
        ToolDefinition {
            service: "notion".to_string(),
            tool_name: "notion_create_page".to_string(),
            description: "create a page".to_string(),
            http_method: "POST".to_string(),
            path_template: "/pages".to_string(),
            base_url: "https://example.test".to_string(),
            adapter_function: "noop".to_string(),
            input_schema,
            required_scopes: Vec::new(),
            idempotency_key_policy: IdempotencyKeyPolicy::None,
            error_map: HashMap::new(),
        }
    }
}
