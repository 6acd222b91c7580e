//! Free-text log line patterns
//!
//! The backend's log vocabulary is matched by an ordered table. Entries are
//! tried top to bottom and only the first match applies, even when a later
//! entry would also match the same line. The order is load-bearing: changing
//! it changes how existing backend output is classified.
//!
//! | # | Name | Shape |
//! |---|------|-------|
//! | 1 | `bracketed_progress` | `[40%] Domain Analysis: scanning columns` |
//! | 2 | `status_glyph` | `✅ Privacy Agent: score 0.92` |
//! | 3 | `named_service` | `Gemini 2.0 Flash Response: 12 rows` |
//! | 4 | `labeled_agent` | `Bias Detector: no skew found` |
//! | 5 | `error_line` | `Error: connection refused` |
//! | 6 | `completion_line` | `Completed: dataset ready` |

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use super::normalize::NormalizedFields;
use crate::types::Progress;

/// Name of the generation model as it appears in backend logs.
pub const MODEL_NAME: &str = "Gemini";

/// Agent labels the backend writes verbatim at the start of a line.
pub const AGENT_LABELS: [&str; 6] = [
    "Domain Expert",
    "Privacy Agent",
    "Bias Detector",
    "Bias Detection",
    "Quality Agent",
    "Relationship Agent",
];

/// Status glyph prefixing an agent line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusGlyph {
    /// ✅
    Success,
    /// 🔄
    InProgress,
    /// ❌
    Failure,
    /// ⚠️
    Warning,
    /// 🤖
    Agent,
}

impl StatusGlyph {
    const TABLE: [(&'static str, StatusGlyph); 5] = [
        ("✅", StatusGlyph::Success),
        ("🔄", StatusGlyph::InProgress),
        ("❌", StatusGlyph::Failure),
        ("⚠", StatusGlyph::Warning),
        ("🤖", StatusGlyph::Agent),
    ];

    /// Glyph at the start of `text` (a trailing variation selector is allowed)
    pub fn from_prefix(text: &str) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(glyph, _)| text.starts_with(glyph))
            .map(|(_, g)| *g)
    }

    /// First glyph contained anywhere in `text`, by table order
    pub fn find_in(text: &str) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(glyph, _)| text.contains(glyph))
            .map(|(_, g)| *g)
    }

    /// Status word recorded for a line carrying this glyph
    pub fn status_word(&self) -> &'static str {
        match self {
            StatusGlyph::Success => "completed",
            StatusGlyph::InProgress => "in_progress",
            StatusGlyph::Failure => "error",
            StatusGlyph::Warning => "warning",
            StatusGlyph::Agent => "started",
        }
    }
}

type Extractor = fn(&Captures<'_>, &str) -> NormalizedFields;

/// One entry of the ordered pattern table.
pub struct LinePattern {
    pub name: &'static str,
    regex: Regex,
    extract: Extractor,
}

impl LinePattern {
    fn new(name: &'static str, pattern: &str, extract: Extractor) -> Self {
        Self {
            name,
            regex: Regex::new(pattern).unwrap(),
            extract,
        }
    }

    /// Apply this pattern alone, ignoring precedence.
    pub fn apply(&self, line: &str) -> Option<NormalizedFields> {
        self.regex
            .captures(line)
            .map(|caps| (self.extract)(&caps, line))
    }
}

impl std::fmt::Debug for LinePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinePattern")
            .field("name", &self.name)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

static PATTERNS: OnceLock<Vec<LinePattern>> = OnceLock::new();

/// The ordered pattern table.
pub fn pattern_table() -> &'static [LinePattern] {
    PATTERNS.get_or_init(|| {
        let labels = AGENT_LABELS.join("|");
        vec![
            LinePattern::new(
                "bracketed_progress",
                r"(?s)^\[\s*(?P<percent>\d{1,3})\s*%\s*\]\s*(?P<step>[^:]+?)\s*:\s*(?P<rest>.*)$",
                extract_progress,
            ),
            LinePattern::new(
                "status_glyph",
                r"(?s)^(?P<glyph>✅|🔄|❌|⚠\x{FE0F}?|🤖)\s*(?P<agent>[^:]+?)\s*:\s*(?P<rest>.*)$",
                extract_glyph,
            ),
            LinePattern::new(
                "named_service",
                &format!(
                    r"(?s)^(?P<service>{}(?:\s+\d+(?:\.\d+)*)?(?:\s+(?:Flash|Pro|Ultra))?)\s+(?P<qualifier>[A-Za-z][\w ]*?)\s*:\s*(?P<rest>.*)$",
                    MODEL_NAME
                ),
                extract_service,
            ),
            LinePattern::new(
                "labeled_agent",
                &format!(r"(?s)^(?P<agent>{})\s*:\s*(?P<rest>.*)$", labels),
                extract_labeled_agent,
            ),
            LinePattern::new(
                "error_line",
                r"(?s)^(?P<keyword>Error|Failed|Exception)\s*:\s*(?P<rest>.*)$",
                extract_error,
            ),
            LinePattern::new(
                "completion_line",
                r"(?s)^(?P<keyword>Completed|Finished|Done)\s*:\s*(?P<rest>.*)$",
                extract_completion,
            ),
        ]
    })
}

/// Match `line` against the table; returns the winning entry's name and fields.
pub fn match_line(line: &str) -> Option<(&'static str, NormalizedFields)> {
    pattern_table()
        .iter()
        .find_map(|pattern| pattern.apply(line).map(|fields| (pattern.name, fields)))
}

// ============================================
// Extractors
// ============================================

/// Text after the label, or the whole line when nothing follows it.
fn rest_or_line(caps: &Captures<'_>, line: &str) -> String {
    let rest = caps.name("rest").map(|m| m.as_str().trim()).unwrap_or("");
    if rest.is_empty() {
        line.trim().to_string()
    } else {
        rest.to_string()
    }
}

fn capture(caps: &Captures<'_>, name: &str) -> Option<String> {
    caps.name(name)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_progress(caps: &Captures<'_>, line: &str) -> NormalizedFields {
    let progress = caps
        .name("percent")
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .map(Progress::from);
    NormalizedFields {
        message: rest_or_line(caps, line),
        step: capture(caps, "step"),
        progress,
        ..Default::default()
    }
}

fn extract_glyph(caps: &Captures<'_>, line: &str) -> NormalizedFields {
    let status = caps
        .name("glyph")
        .and_then(|m| StatusGlyph::from_prefix(m.as_str()))
        .map(|g| g.status_word().to_string());
    NormalizedFields {
        message: rest_or_line(caps, line),
        agent: capture(caps, "agent"),
        status,
        ..Default::default()
    }
}

fn extract_service(caps: &Captures<'_>, line: &str) -> NormalizedFields {
    let metadata = capture(caps, "qualifier").map(|q| {
        let mut map = Map::new();
        map.insert("qualifier".to_string(), Value::String(q));
        map
    });
    NormalizedFields {
        message: rest_or_line(caps, line),
        agent: capture(caps, "service"),
        metadata,
        ..Default::default()
    }
}

fn extract_labeled_agent(caps: &Captures<'_>, line: &str) -> NormalizedFields {
    NormalizedFields {
        message: rest_or_line(caps, line),
        agent: capture(caps, "agent"),
        ..Default::default()
    }
}

fn extract_error(caps: &Captures<'_>, line: &str) -> NormalizedFields {
    NormalizedFields {
        message: rest_or_line(caps, line),
        level: Some("error".to_string()),
        ..Default::default()
    }
}

fn extract_completion(caps: &Captures<'_>, line: &str) -> NormalizedFields {
    NormalizedFields {
        message: rest_or_line(caps, line),
        level: Some("success".to_string()),
        ..Default::default()
    }
}
