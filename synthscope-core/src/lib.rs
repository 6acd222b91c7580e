//! # synthscope-core
//!
//! Core library for synthscope - the activity monitor for a synthetic-data
//! generation backend.
//!
//! This library provides:
//! - Domain types for activity records and backend status
//! - The activity pipeline: event decoding, normalization, classification,
//!   a bounded buffer and filtered projections
//! - Periodic backend health polling
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use synthscope_core::{ActivityFilter, ActivityMonitor, Config};
//!
//! let config = Config::load().expect("failed to load config");
//! let mut monitor = ActivityMonitor::new(&config.monitor);
//!
//! monitor.append_frame("[40%] Domain Analysis: scanning columns");
//! monitor.append_frame("✅ Privacy Agent: privacy score 0.92");
//!
//! let filter = ActivityFilter::new().with_agent("Privacy Agent");
//! for record in monitor.filter(&filter) {
//!     println!("{} {}", record.agent, record.message);
//! }
//! println!("progress: {}%", monitor.current_progress());
//! ```

// Re-export commonly used items at the crate root
pub use activity::{ActivityFilter, ActivityMonitor, RawEvent};
pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod activity;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod status;
pub mod types;
