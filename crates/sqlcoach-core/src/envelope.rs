use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

/// Uniform error payload: `{"error": {"code", "message", "timestamp", ...}}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    /// RFC 3339 UTC timestamp of when the envelope was built.
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorEnvelope {
    pub fn build(
        code: impl Into<String>,
        message: impl Into<String>,
        detail: Option<String>,
        data: Option<Value>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
                detail: detail.filter(|detail| !detail.is_empty()),
                data: data.filter(|data| !is_empty_object(data)),
            },
        }
    }
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(|map| map.is_empty()) || value.is_null()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omits_empty_detail_and_data() {
        let envelope = ErrorEnvelope::build("NO_TABLES", "no tables", Some(String::new()), None);
        let json = serde_json::to_value(&envelope).expect("serialize envelope");
        let body = json["error"].as_object().expect("error object");
        assert_eq!(body["code"], "NO_TABLES");
        assert!(body.contains_key("timestamp"));
        assert!(!body.contains_key("detail"));
        assert!(!body.contains_key("data"));
    }

    #[test]
    fn keeps_detail_and_data() {
        let envelope = ErrorEnvelope::build(
            "DB_TIMEOUT_ERROR",
            "query timed out",
            Some("limit: 5s".to_string()),
            Some(serde_json::json!({ "problem_id": 7 })),
        );
        assert_eq!(envelope.error.detail.as_deref(), Some("limit: 5s"));
        assert_eq!(envelope.error.data, Some(serde_json::json!({ "problem_id": 7 })));
        assert!(envelope.error.timestamp.ends_with('Z'));
    }
}
