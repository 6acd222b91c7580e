//! Inbound transport events
//!
//! The live transport delivers two shapes of event: structured envelopes
//! (`{kind, data}`) whose payload already carries activity fields, and
//! free-text log lines that still have to be pattern-matched. [`RawEvent`]
//! makes that distinction explicit before normalization.
//!
//! ## Decoding rules
//!
//! | Frame | Result |
//! |-------|--------|
//! | `{kind: generation_update \| agent_activity \| error, data}` | [`RawEvent::Structured`] |
//! | `{kind: "raw", data: {message}}` | [`RawEvent::FreeText`] |
//! | `{message}` without a discriminator | [`RawEvent::FreeText`] |
//! | JSON string, or a line that is not JSON at all | [`RawEvent::FreeText`] |
//! | anything else | [`RawEvent::Malformed`] |
//!
//! Payload fields are decoded one by one: a field of the wrong type is
//! dropped, the rest of the event survives. A frame that starts with `{` but
//! is not valid JSON is an error; the monitor turns that into a synthesized
//! error record. A line that merely starts with a quote stays free text.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::types::Progress;

/// Discriminator of a structured envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    GenerationUpdate,
    AgentActivity,
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::GenerationUpdate => "generation_update",
            EventKind::AgentActivity => "agent_activity",
            EventKind::Error => "error",
        }
    }

    fn from_discriminator(kind: &str) -> Option<Self> {
        match kind {
            "generation_update" => Some(EventKind::GenerationUpdate),
            "agent_activity" => Some(EventKind::AgentActivity),
            "error" => Some(EventKind::Error),
            _ => None,
        }
    }
}

/// Payload of a structured envelope.
///
/// Every field is optional. A `null` or non-object payload decodes to the
/// empty payload, and a field holding the wrong JSON type is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct EventData {
    pub message: Option<String>,
    pub step: Option<String>,
    pub progress: Option<Progress>,
    pub agent: Option<String>,
    pub status: Option<String>,
    pub level: Option<String>,
    pub activity_type: Option<String>,
    pub metadata: Option<Map<String, Value>>,
}

impl From<Value> for EventData {
    fn from(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return EventData::default();
        };
        EventData {
            message: take_string(&mut map, "message"),
            step: take_string(&mut map, "step"),
            progress: map.get("progress").and_then(progress_from_value),
            agent: take_string(&mut map, "agent"),
            status: take_string(&mut map, "status"),
            level: take_string(&mut map, "level"),
            activity_type: take_string(&mut map, "type"),
            metadata: match map.remove("metadata") {
                Some(Value::Object(metadata)) => Some(metadata),
                _ => None,
            },
        }
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key)? {
        Value::String(s) => Some(s),
        _ => None,
    }
}

/// Numbers (rounded) and numeric strings, optionally with a `%` suffix.
/// Non-finite values are not progress.
fn progress_from_value(value: &Value) -> Option<Progress> {
    let percent = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok()?,
        _ => return None,
    };
    percent
        .is_finite()
        .then(|| Progress::from(percent.round() as i64))
}

/// One event as received from the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEvent {
    /// Envelope whose payload already carries activity fields
    Structured { kind: EventKind, data: EventData },
    /// A log line that must be matched against the pattern table
    FreeText(String),
    /// Neither shape; normalizes to the placeholder record
    Malformed,
}

impl RawEvent {
    /// Convenience constructor for free-text lines.
    pub fn text(line: impl Into<String>) -> Self {
        RawEvent::FreeText(line.into())
    }

    /// Decode an already-parsed JSON value. Never fails.
    pub fn from_value(value: Value) -> Self {
        let mut map = match value {
            Value::String(line) => return RawEvent::FreeText(line),
            Value::Object(map) => map,
            _ => return RawEvent::Malformed,
        };

        let kind = map
            .get("kind")
            .or_else(|| map.get("type"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let Some(kind) = kind else {
            return match map.remove("message") {
                Some(Value::String(line)) => RawEvent::FreeText(line),
                _ => RawEvent::Malformed,
            };
        };

        let data = map.remove("data").unwrap_or(Value::Null);

        match EventKind::from_discriminator(&kind) {
            Some(kind) => RawEvent::Structured {
                kind,
                data: EventData::from(data),
            },
            // "raw" and unknown discriminators carry a log line at best
            None => match data.get("message").and_then(Value::as_str) {
                Some(line) => RawEvent::FreeText(line.to_string()),
                None => RawEvent::Malformed,
            },
        }
    }

    /// Decode one transport frame.
    ///
    /// Frames that do not look like JSON are treated as free-text lines.
    pub fn parse(frame: &str) -> Result<Self> {
        let trimmed = frame.trim();
        if trimmed.is_empty() {
            return Ok(RawEvent::Malformed);
        }
        if trimmed.starts_with('{') {
            let value: Value = serde_json::from_str(trimmed)?;
            return Ok(Self::from_value(value));
        }
        if trimmed.starts_with('"') {
            if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
                return Ok(Self::from_value(value));
            }
        }
        Ok(RawEvent::FreeText(trimmed.to_string()))
    }
}
