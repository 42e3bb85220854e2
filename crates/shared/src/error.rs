use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Body of a non-2xx response. The backend is not uniform here: handler
/// errors arrive as `{"detail": "..."}`, request validation as
/// `{"detail": [{...}]}`, and a few older routes use `{"error": "..."}` or
/// `{"message": "..."}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Best human-readable message the body carries, if any.
    pub fn message(&self) -> Option<String> {
        if let Some(detail) = &self.detail {
            return Some(flatten_detail(detail));
        }
        self.error.clone().or_else(|| self.message.clone())
    }
}

fn flatten_detail(detail: &Value) -> String {
    match detail {
        Value::String(text) => text.clone(),
        Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if msgs.is_empty() {
                detail.to_string()
            } else {
                msgs.join("; ")
            }
        }
        other => other.to_string(),
    }
}

/// A 2xx payload that could not be reduced to the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("upload response did not include a session id")]
    MissingSessionId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_detail_string_is_used_verbatim() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail": "Credenciales incorrectas"}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("Credenciales incorrectas"));
    }

    #[test]
    fn validation_detail_list_collects_msg_fields() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"detail": [
                {"loc": ["body", "email"], "msg": "field required", "type": "value_error"},
                {"loc": ["body", "password"], "msg": "too short", "type": "value_error"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(body.message().as_deref(), Some("field required; too short"));
    }

    #[test]
    fn error_and_message_keys_are_fallbacks() {
        let body: ErrorBody = serde_json::from_str(r#"{"error": "sin permisos"}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("sin permisos"));

        let body: ErrorBody = serde_json::from_str(r#"{"message": "no encontrado"}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("no encontrado"));

        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body.message(), None);
    }
}
