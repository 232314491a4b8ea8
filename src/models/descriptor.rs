//! Model descriptors and catalog payload normalization
//!
//! The gateway answers `GET /models` with either a bare JSON array of
//! descriptors or an object wrapping them under `data`. Both shapes, and
//! everything else, are captured by `CatalogPayload` before being normalized
//! into a list of `ModelDescriptor`s.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Capability string advertising extended reasoning support
pub const REASONING_PARAMETER: &str = "reasoning";

/// One model offered by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    context_length: Option<u64>,
    #[serde(default)]
    supported_parameters: Vec<String>,
}

impl ModelDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            context_length: None,
            supported_parameters: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_context_length(mut self, context_length: u64) -> Self {
        self.context_length = Some(context_length);
        self
    }

    pub fn with_supported_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.supported_parameters.push(parameter.into());
        self
    }

    /// Vendor-defined model id, e.g. `openai/o1`
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn context_length(&self) -> Option<u64> {
        self.context_length
    }

    pub fn supported_parameters(&self) -> &[String] {
        &self.supported_parameters
    }

    pub fn supports_parameter(&self, parameter: &str) -> bool {
        self.supported_parameters.iter().any(|p| p == parameter)
    }

    /// Build a descriptor from one raw catalog entry
    ///
    /// Returns `None` when the entry is not an object or has no non-blank
    /// string `id`. Optional fields of the wrong type are ignored on their own
    /// without discarding the entry.
    pub fn from_value(value: &Value) -> Option<Self> {
        let entry = value.as_object()?;
        let id = entry.get("id")?.as_str()?;
        if id.trim().is_empty() {
            return None;
        }

        let supported_parameters = entry
            .get("supported_parameters")
            .and_then(Value::as_array)
            .map(|params| {
                params
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            id: id.to_string(),
            name: entry.get("name").and_then(Value::as_str).map(str::to_string),
            context_length: entry.get("context_length").and_then(Value::as_u64),
            supported_parameters,
        })
    }
}

/// Shape of a `GET /models` response body
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CatalogPayload {
    /// Bare array of descriptors
    List(Vec<Value>),
    /// Object with a `data` array
    Wrapped { data: Vec<Value> },
    /// Anything else
    Malformed(Value),
}

impl CatalogPayload {
    /// Classify a decoded response body
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Array(entries) => Self::List(entries),
            Value::Object(mut object) => match object.remove("data") {
                Some(Value::Array(entries)) => Self::Wrapped { data: entries },
                Some(other) => {
                    object.insert("data".to_string(), other);
                    Self::Malformed(Value::Object(object))
                }
                None => Self::Malformed(Value::Object(object)),
            },
            other => Self::Malformed(other),
        }
    }

    /// Normalize into descriptors, preserving gateway order
    ///
    /// `Malformed` yields an empty list; invalid entries are dropped.
    pub fn into_descriptors(self) -> Vec<ModelDescriptor> {
        let entries = match self {
            Self::List(entries) | Self::Wrapped { data: entries } => entries,
            Self::Malformed(_) => return Vec::new(),
        };
        entries.iter().filter_map(ModelDescriptor::from_value).collect()
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_reads_all_fields() {
        let descriptor = ModelDescriptor::from_value(&json!({
            "id": "openai/o1",
            "name": "OpenAI: o1",
            "context_length": 200000,
            "supported_parameters": ["reasoning", "max_tokens"]
        }))
        .expect("should parse descriptor");

        assert_eq!(descriptor.id(), "openai/o1");
        assert_eq!(descriptor.name(), Some("OpenAI: o1"));
        assert_eq!(descriptor.context_length(), Some(200_000));
        assert!(descriptor.supports_parameter(REASONING_PARAMETER));
        assert!(!descriptor.supports_parameter("tools"));
    }

    #[test]
    fn test_from_value_rejects_missing_or_unusable_id() {
        assert!(ModelDescriptor::from_value(&json!({"name": "no id"})).is_none());
        assert!(ModelDescriptor::from_value(&json!({"id": 42})).is_none());
        assert!(ModelDescriptor::from_value(&json!({"id": "  "})).is_none());
        assert!(ModelDescriptor::from_value(&json!("openai/o1")).is_none());
        assert!(ModelDescriptor::from_value(&Value::Null).is_none());
    }

    #[test]
    fn test_from_value_ignores_mistyped_optional_fields() {
        let descriptor = ModelDescriptor::from_value(&json!({
            "id": "vendor/model",
            "name": 7,
            "context_length": "large",
            "supported_parameters": ["reasoning", 3, null]
        }))
        .expect("entry with a valid id should be kept");

        assert_eq!(descriptor.name(), None);
        assert_eq!(descriptor.context_length(), None);
        assert_eq!(descriptor.supported_parameters(), ["reasoning".to_string()]);
    }

    #[test]
    fn test_payload_bare_list() {
        let payload = CatalogPayload::from_value(json!([{"id": "a"}, {"id": "b"}]));
        assert!(matches!(payload, CatalogPayload::List(ref entries) if entries.len() == 2));
        let ids: Vec<String> = payload
            .into_descriptors()
            .iter()
            .map(|d| d.id().to_string())
            .collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn test_payload_wrapped_under_data() {
        let payload = CatalogPayload::from_value(json!({"data": [{"id": "a"}, {"bad": true}]}));
        assert!(matches!(payload, CatalogPayload::Wrapped { .. }));
        assert_eq!(payload.into_descriptors(), vec![ModelDescriptor::new("a")]);
    }

    #[test]
    fn test_payload_other_shapes_are_malformed_and_empty() {
        for body in [
            json!({"models": []}),
            json!({"data": "nope"}),
            json!("text"),
            json!(12),
            Value::Null,
        ] {
            let payload = CatalogPayload::from_value(body.clone());
            assert!(payload.is_malformed(), "{} should be malformed", body);
            assert!(payload.into_descriptors().is_empty());
        }
    }

    #[test]
    fn test_payload_keeps_duplicate_ids_in_order() {
        let payload = CatalogPayload::from_value(json!([{"id": "a"}, {"id": "b"}, {"id": "a"}]));
        let ids: Vec<String> = payload
            .into_descriptors()
            .iter()
            .map(|d| d.id().to_string())
            .collect();
        assert_eq!(ids, ["a", "b", "a"]);
    }

    #[test]
    fn test_payload_deserializes_untagged() {
        let payload: CatalogPayload =
            serde_json::from_str(r#"{"data": [{"id": "x"}]}"#).expect("should deserialize");
        assert!(matches!(payload, CatalogPayload::Wrapped { .. }));
    }
}
