//! The `command_logs.detail` column: an opaque `k=v` pair string,
//! semicolon-separated, that downstream rollout evaluators grep rather
//! than a normalized side table.

use std::collections::BTreeMap;

/// Accumulates `k=v` pairs in insertion order and renders them as one
/// semicolon-joined string.
#[derive(Debug, Clone, Default)]
pub struct DetailBuilder {
    pairs: Vec<(String, String)>,
}

impl DetailBuilder {
    /// An empty detail string.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key=value`. Later calls with the same key both appear;
    /// callers are responsible for not repeating a key.
    pub fn field(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.pairs.push((key.into(), value.to_string()));
        self
    }

    /// Render as `k1=v1;k2=v2;...`.
    pub fn build(self) -> String {
        self.pairs.into_iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join(";")
    }
}

/// Parse a `detail` string back into a key-value map, last value wins on
/// duplicate keys. Malformed segments (no `=`) are skipped.
pub fn parse_detail(detail: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for segment in detail.split(';') {
        if let Some((key, value)) = segment.split_once('=') {
            map.insert(key.to_string(), value.to_string());
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_parses_round_trip() {
        let detail = DetailBuilder::new()
            .field("services", "notion,linear")
            .field("request_id", "req-1")
            .field("analysis_latency_ms", 142)
            .build();
        assert_eq!(detail, "services=notion,linear;request_id=req-1;analysis_latency_ms=142");
        let parsed = parse_detail(&detail);
        assert_eq!(parsed.get("request_id").map(String::as_str), Some("req-1"));
        assert_eq!(parsed.get("analysis_latency_ms").map(String::as_str), Some("142"));
    }

    #[test]
    fn malformed_segments_are_skipped() {
        let parsed = parse_detail("ok=1;garbage;also=2");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.get("also").map(String::as_str), Some("2"));
    }
}
