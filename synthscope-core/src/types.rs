//! Core domain types for synthscope
//!
//! These types describe one classified unit of operational telemetry
//! ([`ActivityRecord`]) and the backend health snapshot ([`SystemStatus`]).
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Activity record** | One classified unit of telemetry about the generation process |
//! | **Agent** | The named actor (a processing stage or an AI sub-service) a record is attributed to |
//! | **Progress gauge** | The single current-completion percentage shown alongside the log |
//! | **Transport** | The external live-event channel that supplies inbound events |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Agent label used when nothing identifies the originating actor.
pub const DEFAULT_AGENT: &str = "System";

/// Message used when an event carries no usable text.
pub const PLACEHOLDER_MESSAGE: &str = "Processing...";

// ============================================
// Taxonomy
// ============================================

/// Generation stage an activity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Initialization,
    DomainAnalysis,
    PrivacyAssessment,
    BiasDetection,
    RelationshipMapping,
    QualityPlanning,
    DataGeneration,
    QualityValidation,
    FinalAssembly,
    Completion,
    Error,
    System,
    GeminiCall,
    AgentResponse,
}

impl ActivityType {
    pub const ALL: [ActivityType; 14] = [
        ActivityType::Initialization,
        ActivityType::DomainAnalysis,
        ActivityType::PrivacyAssessment,
        ActivityType::BiasDetection,
        ActivityType::RelationshipMapping,
        ActivityType::QualityPlanning,
        ActivityType::DataGeneration,
        ActivityType::QualityValidation,
        ActivityType::FinalAssembly,
        ActivityType::Completion,
        ActivityType::Error,
        ActivityType::System,
        ActivityType::GeminiCall,
        ActivityType::AgentResponse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Initialization => "initialization",
            ActivityType::DomainAnalysis => "domain_analysis",
            ActivityType::PrivacyAssessment => "privacy_assessment",
            ActivityType::BiasDetection => "bias_detection",
            ActivityType::RelationshipMapping => "relationship_mapping",
            ActivityType::QualityPlanning => "quality_planning",
            ActivityType::DataGeneration => "data_generation",
            ActivityType::QualityValidation => "quality_validation",
            ActivityType::FinalAssembly => "final_assembly",
            ActivityType::Completion => "completion",
            ActivityType::Error => "error",
            ActivityType::System => "system",
            ActivityType::GeminiCall => "gemini_call",
            ActivityType::AgentResponse => "agent_response",
        }
    }
}

impl std::str::FromStr for ActivityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        ActivityType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("unknown activity type: {}", s))
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of the work an activity describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Started,
    InProgress,
    Completed,
    Error,
    /// The backend degraded to a fallback path (warning markers map here)
    Fallback,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Started => "started",
            ActivityStatus::InProgress => "in_progress",
            ActivityStatus::Completed => "completed",
            ActivityStatus::Error => "error",
            ActivityStatus::Fallback => "fallback",
        }
    }
}

impl std::str::FromStr for ActivityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "started" | "start" | "pending" => Ok(ActivityStatus::Started),
            "in_progress" | "in-progress" | "running" | "processing" => {
                Ok(ActivityStatus::InProgress)
            }
            "completed" | "complete" | "success" | "done" | "finished" => {
                Ok(ActivityStatus::Completed)
            }
            "error" | "failed" | "failure" => Ok(ActivityStatus::Error),
            "fallback" | "warning" | "warn" => Ok(ActivityStatus::Fallback),
            _ => Err(format!("unknown activity status: {}", s)),
        }
    }
}

impl std::fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity used for display and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 4] = [
        ActivityLevel::Info,
        ActivityLevel::Success,
        ActivityLevel::Warning,
        ActivityLevel::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Info => "info",
            ActivityLevel::Success => "success",
            ActivityLevel::Warning => "warning",
            ActivityLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for ActivityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(ActivityLevel::Info),
            "success" => Ok(ActivityLevel::Success),
            "warning" | "warn" => Ok(ActivityLevel::Warning),
            "error" => Ok(ActivityLevel::Error),
            _ => Err(format!("unknown activity level: {}", s)),
        }
    }
}

impl std::fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// Progress
// ============================================

/// Completion percentage carried by an activity.
///
/// On the wire this is an integer: `0..=100`, or `-1` for an explicit
/// error signal with no percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Progress {
    Percent(u8),
    Failed,
}

impl Progress {
    /// Percentage, if this is not an error signal
    pub fn percent(&self) -> Option<u8> {
        match self {
            Progress::Percent(p) => Some(*p),
            Progress::Failed => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Progress::Failed)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Progress::Percent(100))
    }
}

impl From<i64> for Progress {
    /// Negative values are error signals; anything above 100 clamps.
    fn from(value: i64) -> Self {
        if value < 0 {
            Progress::Failed
        } else {
            Progress::Percent(value.min(100) as u8)
        }
    }
}

impl From<Progress> for i64 {
    fn from(progress: Progress) -> Self {
        match progress {
            Progress::Percent(p) => p as i64,
            Progress::Failed => -1,
        }
    }
}

// ============================================
// Activity Records
// ============================================

/// A classified activity that has not been inserted into a buffer yet.
///
/// Classification produces drafts; only [`crate::activity::ActivityBuffer`]
/// turns them into [`ActivityRecord`]s by assigning an id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityDraft {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub status: ActivityStatus,
    pub level: ActivityLevel,
    pub message: String,
    pub agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

/// One entry of the activity log. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// `<unix-millis>-<random suffix>`, unique within a buffer's lifetime
    pub id: String,
    /// When the record was classified and inserted
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub status: ActivityStatus,
    pub level: ActivityLevel,
    pub message: String,
    pub agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    /// Passthrough fields (raw text, step label, domain figures)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ActivityRecord {
    pub(crate) fn from_draft(draft: ActivityDraft, id: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            timestamp,
            activity_type: draft.activity_type,
            status: draft.status,
            level: draft.level,
            message: draft.message,
            agent: draft.agent,
            progress: draft.progress,
            metadata: draft.metadata,
        }
    }

    /// Step label stored in metadata, if any
    pub fn step(&self) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|m| m.get("step"))
            .and_then(|v| v.as_str())
    }
}

// ============================================
// System Status
// ============================================

/// State of the backend's AI service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiServiceState {
    Online,
    Offline,
    Starting,
    #[default]
    Unknown,
}

impl AiServiceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiServiceState::Online => "online",
            AiServiceState::Offline => "offline",
            AiServiceState::Starting => "starting",
            AiServiceState::Unknown => "unknown",
        }
    }

    /// Map the backend's free-form service status string
    pub fn from_backend(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "online" | "healthy" | "active" | "ready" => AiServiceState::Online,
            "offline" | "error" | "down" | "unavailable" => AiServiceState::Offline,
            "starting" | "initializing" | "warming_up" => AiServiceState::Starting,
            _ => AiServiceState::Unknown,
        }
    }
}

impl std::fmt::Display for AiServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of backend health. Always replaced wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SystemStatus {
    pub backend_healthy: bool,
    pub backend_latency_ms: u64,
    pub ai_service_state: AiServiceState,
    pub agents_operational: u32,
    pub agents_total: u32,
    pub transport_connected: bool,
}
