//! Backend health status
//!
//! A [`StatusPoller`] probes the backend's health endpoint on a fixed
//! interval and publishes [`SystemStatus`](crate::types::SystemStatus)
//! snapshots. It is independent of the activity buffer.
//!
//! ## Usage
//!
//! Configure the backend in `~/.config/synthscope/config.toml`:
//!
//! ```toml
//! [status]
//! base_url = "http://localhost:8000"
//! interval_secs = 30
//! ```

mod poller;
mod probe;

pub use poller::{PollerHandle, StatusPoller, TransportState};
pub use probe::{
    AiServiceHealth, HealthData, HealthProbe, HealthResponse, HttpHealthProbe, ServiceHealth,
};
