use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::{LlmError, LlmResult};

static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json(.*?)(?:```|\z)").expect("valid fence pattern"));

static OBJECT_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid object pattern"));

/// Locate the JSON payload in model output.
///
/// Prefers the body of a ```` ```json ```` fence (an unterminated fence runs
/// to the end), then the span from the first `{` to the last `}`, and
/// finally the whole trimmed text.
pub fn extract_json_text(content: &str) -> &str {
    let content = content.trim();
    if let Some(body) = FENCED_JSON.captures(content).and_then(|caps| caps.get(1)) {
        return body.as_str().trim();
    }
    if let Some(span) = OBJECT_SPAN.find(content) {
        return span.as_str();
    }
    content
}

/// Deserialize the JSON payload embedded in `content`.
pub fn parse_json_response<T: DeserializeOwned>(content: &str) -> LlmResult<T> {
    let json_text = extract_json_text(content);
    serde_json::from_str(json_text).map_err(|err| {
        let preview: String = content.chars().take(200).collect();
        tracing::warn!(event = "llm_json_parse_failed", error = %err, preview = %preview);
        LlmError::InvalidResponse(format!("malformed JSON: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn prefers_fenced_block() {
        let content = "Here you go:\n```json\n{\"a\": 1}\n```\nextra {\"b\": 2}";
        assert_eq!(extract_json_text(content), "{\"a\": 1}");
    }

    #[test]
    fn unterminated_fence_runs_to_end() {
        let content = "```json\n{\"a\": [1, 2]}\n";
        assert_eq!(extract_json_text(content), "{\"a\": [1, 2]}");
    }

    #[test]
    fn falls_back_to_outer_braces() {
        let content = "Sure! {\"a\": {\"b\": 1}} hope that helps";
        assert_eq!(extract_json_text(content), "{\"a\": {\"b\": 1}}");
    }

    #[test]
    fn plain_text_is_returned_trimmed() {
        assert_eq!(extract_json_text("  [1, 2]  "), "[1, 2]");
    }

    #[test]
    fn malformed_json_is_an_invalid_response() {
        let err = parse_json_response::<Value>("```json\n{not json}\n```").expect_err("bad json");
        assert!(matches!(err, LlmError::InvalidResponse(_)));
    }
}
