//! Event normalization
//!
//! Turns a [`RawEvent`] into a flat [`NormalizedFields`] set. Structured
//! envelopes are copied field by field; free-text lines go through the
//! ordered [pattern table](super::patterns). Normalization is pure and never
//! fails: anything unusable collapses to the placeholder message.

use serde::Serialize;
use serde_json::{Map, Value};

use super::event::{EventData, EventKind, RawEvent};
use super::patterns;
use crate::types::{Progress, PLACEHOLDER_MESSAGE};

/// Field set shared by both inbound shapes.
///
/// `status`, `level` and `activity_type` stay as the words the backend used;
/// the classifier decides what they mean.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedFields {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl NormalizedFields {
    /// The minimal field set used when an event carries nothing usable.
    pub fn placeholder() -> Self {
        Self {
            message: PLACEHOLDER_MESSAGE.to_string(),
            ..Default::default()
        }
    }
}

/// Normalize one inbound event.
pub fn normalize(event: &RawEvent) -> NormalizedFields {
    match event {
        RawEvent::Structured { kind, data } => normalize_structured(*kind, data),
        RawEvent::FreeText(line) => normalize_text(line),
        RawEvent::Malformed => NormalizedFields::placeholder(),
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn normalize_structured(kind: EventKind, data: &EventData) -> NormalizedFields {
    let mut fields = NormalizedFields {
        message: non_empty(&data.message).unwrap_or_else(|| PLACEHOLDER_MESSAGE.to_string()),
        step: non_empty(&data.step),
        progress: data.progress,
        agent: non_empty(&data.agent),
        status: non_empty(&data.status),
        level: non_empty(&data.level),
        activity_type: non_empty(&data.activity_type),
        metadata: data.metadata.clone(),
    };

    if kind == EventKind::Error {
        fields.level.get_or_insert_with(|| "error".to_string());
        fields.status.get_or_insert_with(|| "error".to_string());
    }

    tracing::trace!(kind = kind.as_str(), "Normalized structured event");
    fields
}

fn normalize_text(line: &str) -> NormalizedFields {
    let line = line.trim();
    if line.is_empty() {
        return NormalizedFields::placeholder();
    }

    let (pattern, mut fields) = match patterns::match_line(line) {
        Some((name, fields)) => (Some(name), fields),
        None => (
            None,
            NormalizedFields {
                message: line.to_string(),
                ..Default::default()
            },
        ),
    };

    let metadata = fields.metadata.get_or_insert_with(Map::new);
    metadata.insert("raw".to_string(), Value::String(line.to_string()));
    if let Some(pattern) = pattern {
        metadata.insert("pattern".to_string(), Value::String(pattern.to_string()));
    }

    tracing::trace!(pattern = ?pattern, "Normalized free-text event");
    fields
}
