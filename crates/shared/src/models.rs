use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One distilled news item: a headline, a short summary, and its supporting
/// links. The same shape is produced by the per-group summarization pass and
/// by the final refinement pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub heading: String,
    pub summary: String,
    pub links: Vec<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("missing or non-string key \"{0}\"")]
    MissingKey(&'static str),
    #[error("\"links\" is not an array")]
    LinksNotArray,
}

impl NewsItem {
    pub fn new(
        heading: impl Into<String>,
        summary: impl Into<String>,
        links: Vec<String>,
    ) -> Self {
        Self {
            heading: heading.into(),
            summary: summary.into(),
            links,
        }
    }

    /// Validate a model-produced JSON value against the record shape.
    ///
    /// `heading` and `summary` must be strings and `links` an array;
    /// non-string entries inside `links` are coerced away rather than
    /// rejecting the whole record.
    pub fn validate(value: &Value) -> Result<Self, ValidationError> {
        let object = value
            .as_object()
            .ok_or(ValidationError::NotAnObject(json_kind(value)))?;

        let heading = object
            .get("heading")
            .and_then(Value::as_str)
            .ok_or(ValidationError::MissingKey("heading"))?;
        let summary = object
            .get("summary")
            .and_then(Value::as_str)
            .ok_or(ValidationError::MissingKey("summary"))?;
        let links = object
            .get("links")
            .ok_or(ValidationError::MissingKey("links"))?
            .as_array()
            .ok_or(ValidationError::LinksNotArray)?;

        let links = links
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();

        Ok(Self::new(heading, summary, links))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Persisted digest document for the audit trail.
#[derive(Debug, Serialize, Deserialize)]
pub struct Digest {
    pub version: String,
    pub created_at: String,
    pub items: Vec<NewsItem>,
}

impl Digest {
    pub fn new(items: Vec<NewsItem>) -> Self {
        Self {
            version: "1.0".to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            items,
        }
    }
}
