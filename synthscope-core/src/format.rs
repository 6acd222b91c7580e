//! Formatting helpers shared by the CLI views.

use crate::types::{ActivityRecord, Progress, SystemStatus};

const BAR_WIDTH: usize = 20;

/// One log line: `HH:MM:SS LEVEL   [agent] message (NN%)`.
pub fn format_record_line(record: &ActivityRecord) -> String {
    let mut line = format!(
        "{} {:<7} [{}] {}",
        record.timestamp.format("%H:%M:%S"),
        record.level.as_str().to_uppercase(),
        record.agent,
        record.message
    );
    match record.progress {
        Some(Progress::Percent(p)) => line.push_str(&format!(" ({}%)", p)),
        Some(Progress::Failed) => line.push_str(" (failed)"),
        None => {}
    }
    line
}

/// Text gauge, e.g. `[#########-----------]  45%`.
pub fn format_progress_bar(percent: u8) -> String {
    let percent = percent.min(100);
    let filled = usize::from(percent) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    )
}

/// Single-line health summary.
pub fn format_status_line(status: &SystemStatus) -> String {
    let backend = if status.backend_healthy {
        format!("healthy ({}ms)", status.backend_latency_ms)
    } else {
        "unhealthy".to_string()
    };
    format!(
        "backend: {} | ai: {} | agents: {}/{} | transport: {}",
        backend,
        status.ai_service_state,
        status.agents_operational,
        status.agents_total,
        if status.transport_connected {
            "connected"
        } else {
            "disconnected"
        }
    )
}
