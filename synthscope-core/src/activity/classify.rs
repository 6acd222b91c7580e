//! Activity classification
//!
//! Maps [`NormalizedFields`] onto the closed taxonomy. Each output field
//! follows the same precedence: explicit field, then status markers, then a
//! keyword cascade, then a default. Classification never fails; input that
//! matches nothing resolves to `(system, started, info, "System")`.

use serde_json::{Map, Value};

use super::normalize::NormalizedFields;
use super::patterns::{StatusGlyph, AGENT_LABELS, MODEL_NAME};
use crate::types::{
    ActivityDraft, ActivityLevel, ActivityStatus, ActivityType, Progress, DEFAULT_AGENT,
    PLACEHOLDER_MESSAGE,
};

/// Stage keywords, tried in order against the step and then the message.
const STAGE_KEYWORDS: &[(&str, ActivityType)] = &[
    ("initializ", ActivityType::Initialization),
    ("domain", ActivityType::DomainAnalysis),
    ("privacy", ActivityType::PrivacyAssessment),
    ("bias", ActivityType::BiasDetection),
    ("relationship", ActivityType::RelationshipMapping),
    ("validat", ActivityType::QualityValidation),
    ("quality", ActivityType::QualityPlanning),
    ("generating", ActivityType::DataGeneration),
    ("generation", ActivityType::DataGeneration),
    ("assembl", ActivityType::FinalAssembly),
    ("gemini", ActivityType::GeminiCall),
    ("agent response", ActivityType::AgentResponse),
    ("completed", ActivityType::Completion),
];

/// Agent names recognized inside message or step text.
pub fn known_agents() -> impl Iterator<Item = &'static str> {
    AGENT_LABELS.into_iter().chain(std::iter::once(MODEL_NAME))
}

/// Status marker found in the explicit fields or the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Started,
    InProgress,
    Success,
    Failure,
    Warning,
}

impl Marker {
    fn from_status_word(word: &str) -> Option<Self> {
        word.parse::<ActivityStatus>().ok().map(|status| match status {
            ActivityStatus::Started => Marker::Started,
            ActivityStatus::InProgress => Marker::InProgress,
            ActivityStatus::Completed => Marker::Success,
            ActivityStatus::Error => Marker::Failure,
            ActivityStatus::Fallback => Marker::Warning,
        })
    }

    fn from_level_word(word: &str) -> Option<Self> {
        match word.parse::<ActivityLevel>().ok()? {
            ActivityLevel::Info => None,
            ActivityLevel::Success => Some(Marker::Success),
            ActivityLevel::Warning => Some(Marker::Warning),
            ActivityLevel::Error => Some(Marker::Failure),
        }
    }

    fn from_glyph(glyph: StatusGlyph) -> Self {
        match glyph {
            StatusGlyph::Success => Marker::Success,
            StatusGlyph::InProgress => Marker::InProgress,
            StatusGlyph::Failure => Marker::Failure,
            StatusGlyph::Warning => Marker::Warning,
            StatusGlyph::Agent => Marker::Started,
        }
    }

    fn status(self) -> ActivityStatus {
        match self {
            Marker::Started => ActivityStatus::Started,
            Marker::InProgress => ActivityStatus::InProgress,
            Marker::Success => ActivityStatus::Completed,
            Marker::Failure => ActivityStatus::Error,
            Marker::Warning => ActivityStatus::Fallback,
        }
    }

    fn level(self) -> Option<ActivityLevel> {
        match self {
            Marker::Success => Some(ActivityLevel::Success),
            Marker::Failure => Some(ActivityLevel::Error),
            Marker::Warning => Some(ActivityLevel::Warning),
            Marker::Started | Marker::InProgress => None,
        }
    }
}

/// Status word, then level word, then a glyph inside the message.
fn find_marker(fields: &NormalizedFields) -> Option<Marker> {
    fields
        .status
        .as_deref()
        .and_then(Marker::from_status_word)
        .or_else(|| fields.level.as_deref().and_then(Marker::from_level_word))
        .or_else(|| StatusGlyph::find_in(&fields.message).map(Marker::from_glyph))
}

/// Status word or glyph only; used when the level field itself is in question.
fn find_non_level_marker(fields: &NormalizedFields) -> Option<Marker> {
    fields
        .status
        .as_deref()
        .and_then(Marker::from_status_word)
        .or_else(|| StatusGlyph::find_in(&fields.message).map(Marker::from_glyph))
}

fn explicit_level(fields: &NormalizedFields) -> Option<ActivityLevel> {
    fields.level.as_deref().and_then(|l| l.parse().ok())
}

fn has_explicit_error(fields: &NormalizedFields) -> bool {
    fields.progress.is_some_and(|p| p.is_failed())
        || explicit_level(fields) == Some(ActivityLevel::Error)
        || fields.status.as_deref().and_then(Marker::from_status_word) == Some(Marker::Failure)
}

fn keyword_stage(text: &str) -> Option<ActivityType> {
    let text = text.to_lowercase();
    STAGE_KEYWORDS
        .iter()
        .find(|(keyword, _)| text.contains(keyword))
        .map(|(_, stage)| *stage)
}

/// Derive the activity type.
pub fn classify_type(fields: &NormalizedFields) -> ActivityType {
    if let Some(explicit) = fields
        .activity_type
        .as_deref()
        .and_then(|t| t.parse::<ActivityType>().ok())
    {
        return explicit;
    }

    if has_explicit_error(fields) {
        return ActivityType::Error;
    }

    if let Some(stage) = fields
        .step
        .as_deref()
        .and_then(keyword_stage)
        .or_else(|| keyword_stage(&fields.message))
    {
        return stage;
    }

    let message = fields.message.to_lowercase();
    if message.contains("error") || message.contains("failed") {
        return ActivityType::Error;
    }

    ActivityType::System
}

/// Derive the lifecycle status.
pub fn classify_status(fields: &NormalizedFields) -> ActivityStatus {
    match fields.progress {
        Some(Progress::Percent(100)) => return ActivityStatus::Completed,
        Some(Progress::Failed) => return ActivityStatus::Error,
        Some(Progress::Percent(p)) if p > 0 => return ActivityStatus::InProgress,
        _ => {}
    }

    find_marker(fields)
        .map(Marker::status)
        .unwrap_or(ActivityStatus::Started)
}

/// Derive the display level.
pub fn classify_level(fields: &NormalizedFields) -> ActivityLevel {
    if let Some(level) = explicit_level(fields) {
        return level;
    }

    if let Some(level) = find_non_level_marker(fields).and_then(Marker::level) {
        return level;
    }

    match fields.progress {
        Some(p) if p.is_failed() => ActivityLevel::Error,
        Some(p) if p.is_complete() => ActivityLevel::Success,
        _ => ActivityLevel::Info,
    }
}

/// Derive the attributed agent.
pub fn classify_agent(fields: &NormalizedFields) -> String {
    if let Some(agent) = fields
        .agent
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
    {
        return agent.to_string();
    }

    let haystacks = std::iter::once(fields.message.as_str()).chain(fields.step.as_deref());
    for text in haystacks {
        let text = text.to_lowercase();
        if let Some(agent) = known_agents().find(|name| text.contains(&name.to_lowercase())) {
            return agent.to_string();
        }
    }

    DEFAULT_AGENT.to_string()
}

/// Classify a normalized event into a draft record.
pub fn classify(fields: &NormalizedFields) -> ActivityDraft {
    let message = match fields.message.trim() {
        "" => PLACEHOLDER_MESSAGE.to_string(),
        trimmed => trimmed.to_string(),
    };

    let mut metadata = fields.metadata.clone().unwrap_or_default();
    if let Some(step) = &fields.step {
        metadata.insert("step".to_string(), Value::String(step.clone()));
    }

    ActivityDraft {
        activity_type: classify_type(fields),
        status: classify_status(fields),
        level: classify_level(fields),
        message,
        agent: classify_agent(fields),
        progress: fields.progress,
        metadata: (!metadata.is_empty()).then_some(metadata),
    }
}

/// Draft reported when a transport frame could not be decoded at all.
pub fn parse_failure(reason: &str, frame: &str) -> ActivityDraft {
    let mut metadata = Map::new();
    metadata.insert("raw".to_string(), Value::String(frame.to_string()));

    ActivityDraft {
        activity_type: ActivityType::Error,
        status: ActivityStatus::Error,
        level: ActivityLevel::Error,
        message: format!("Failed to parse activity event: {}", reason),
        agent: DEFAULT_AGENT.to_string(),
        progress: None,
        metadata: Some(metadata),
    }
}
