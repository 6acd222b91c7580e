//! Filtered views over the activity log
//!
//! A projection never mutates or reorders records; it only selects them.

use std::collections::HashSet;

use serde::Serialize;

use crate::types::{ActivityLevel, ActivityRecord};

/// Level criterion: everything, or one exact level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LevelFilter {
    #[default]
    All,
    Only(ActivityLevel),
}

impl LevelFilter {
    pub fn matches(&self, level: ActivityLevel) -> bool {
        match self {
            LevelFilter::All => true,
            LevelFilter::Only(wanted) => *wanted == level,
        }
    }
}

impl std::str::FromStr for LevelFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(LevelFilter::All)
        } else {
            s.parse().map(LevelFilter::Only)
        }
    }
}

/// Agent criterion: everything, or one exact agent label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AgentFilter {
    #[default]
    All,
    Only(String),
}

impl AgentFilter {
    pub fn matches(&self, agent: &str) -> bool {
        match self {
            AgentFilter::All => true,
            AgentFilter::Only(wanted) => wanted == agent,
        }
    }
}

impl std::str::FromStr for AgentFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(AgentFilter::All)
        } else {
            Ok(AgentFilter::Only(s.to_string()))
        }
    }
}

/// Combined filter criteria. A record passes only if every criterion holds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    pub level: LevelFilter,
    pub agent: AgentFilter,
    /// Case-insensitive substring of message or agent; empty matches all
    pub search: String,
}

impl ActivityFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: ActivityLevel) -> Self {
        self.level = LevelFilter::Only(level);
        self
    }

    pub fn with_agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = AgentFilter::Only(agent.into());
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// True when no criterion constrains anything.
    pub fn is_empty(&self) -> bool {
        self.level == LevelFilter::All && self.agent == AgentFilter::All && self.search.is_empty()
    }

    pub fn matches(&self, record: &ActivityRecord) -> bool {
        if !self.level.matches(record.level) || !self.agent.matches(&record.agent) {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        needle.is_empty()
            || record.message.to_lowercase().contains(&needle)
            || record.agent.to_lowercase().contains(&needle)
    }

    /// Select matching records, preserving input order.
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a ActivityRecord>
    where
        I: IntoIterator<Item = &'a ActivityRecord>,
    {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// Distinct agent labels in first-seen order.
pub fn agents<'a, I>(records: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a ActivityRecord>,
{
    let mut seen = HashSet::new();
    records
        .into_iter()
        .map(|r| r.agent.as_str())
        .filter(|agent| seen.insert(*agent))
        .collect()
}

/// Record counts per level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActivitySummary {
    pub total: usize,
    pub info: usize,
    pub success: usize,
    pub warning: usize,
    pub error: usize,
}

impl ActivitySummary {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a ActivityRecord>,
    {
        records
            .into_iter()
            .fold(ActivitySummary::default(), |mut summary, record| {
                summary.total += 1;
                match record.level {
                    ActivityLevel::Info => summary.info += 1,
                    ActivityLevel::Success => summary.success += 1,
                    ActivityLevel::Warning => summary.warning += 1,
                    ActivityLevel::Error => summary.error += 1,
                }
                summary
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActivityStatus, ActivityType};
    use chrono::Utc;

    fn record(id: &str, agent: &str, level: ActivityLevel, message: &str) -> ActivityRecord {
        ActivityRecord {
            id: id.to_string(),
            timestamp: Utc::now(),
            activity_type: ActivityType::System,
            status: ActivityStatus::Started,
            level,
            message: message.to_string(),
            agent: agent.to_string(),
            progress: None,
            metadata: None,
        }
    }

    fn sample() -> Vec<ActivityRecord> {
        vec![
            record("4", "Privacy Agent", ActivityLevel::Success, "Privacy score 0.91"),
            record("3", "Bias Detector", ActivityLevel::Warning, "Score skewed by region"),
            record("2", "Privacy Agent", ActivityLevel::Info, "Masking emails"),
            record("1", "System", ActivityLevel::Error, "Backend timeout"),
        ]
    }

    fn ids(records: &[&ActivityRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_empty_filter_passes_everything_in_order() {
        let records = sample();
        let filter = ActivityFilter::new();
        assert!(filter.is_empty());
        assert_eq!(ids(&filter.apply(&records)), vec!["4", "3", "2", "1"]);
    }

    #[test]
    fn test_agent_and_search() {
        let records = sample();
        let filter = ActivityFilter::new()
            .with_agent("Privacy Agent")
            .with_search("score");
        assert_eq!(ids(&filter.apply(&records)), vec!["4"]);
    }

    #[test]
    fn test_level_filter() {
        let records = sample();
        let filter = ActivityFilter::new().with_level(ActivityLevel::Error);
        assert_eq!(ids(&filter.apply(&records)), vec!["1"]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_message_or_agent() {
        let records = sample();
        let filter = ActivityFilter::new().with_search("BIAS");
        assert_eq!(ids(&filter.apply(&records)), vec!["3"]);

        let filter = ActivityFilter::new().with_search("SCORE");
        assert_eq!(ids(&filter.apply(&records)), vec!["4", "3"]);
    }

    #[test]
    fn test_parse_filters() {
        assert_eq!("all".parse::<LevelFilter>().unwrap(), LevelFilter::All);
        assert_eq!(
            "warning".parse::<LevelFilter>().unwrap(),
            LevelFilter::Only(ActivityLevel::Warning)
        );
        assert!("loud".parse::<LevelFilter>().is_err());

        assert_eq!("ALL".parse::<AgentFilter>().unwrap(), AgentFilter::All);
        assert_eq!(
            "Quality Agent".parse::<AgentFilter>().unwrap(),
            AgentFilter::Only("Quality Agent".to_string())
        );
    }

    #[test]
    fn test_agents_first_seen() {
        let records = sample();
        assert_eq!(
            agents(&records),
            vec!["Privacy Agent", "Bias Detector", "System"]
        );
    }

    #[test]
    fn test_summary() {
        let records = sample();
        let summary = ActivitySummary::from_records(&records);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.info, 1);
        assert_eq!(summary.success, 1);
        assert_eq!(summary.warning, 1);
        assert_eq!(summary.error, 1);
    }
}
