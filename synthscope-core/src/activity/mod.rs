//! Real-time activity pipeline
//!
//! Turns the backend's operational telemetry into a bounded, ordered
//! activity log.
//!
//! ## Pipeline
//!
//! ```text
//! transport frame → RawEvent → normalize → classify → ActivityBuffer::append
//!                    (event)    (normalize)  (classify)   (buffer)
//! ```
//!
//! - [`event`]: decodes frames into the [`RawEvent`] tagged union
//! - [`patterns`]: the ordered free-text pattern table
//! - [`normalize`](mod@normalize): flattens either shape into [`NormalizedFields`]
//! - [`classify`](mod@classify): maps fields onto the closed taxonomy
//! - [`buffer`]: bounded newest-first store with progress gauge and pause gate
//! - [`projection`]: level/agent/search filtering over the buffer
//! - [`monitor`]: the owned per-session object exposing all of the above

pub mod buffer;
pub mod classify;
pub mod clock;
pub mod event;
pub mod monitor;
pub mod normalize;
pub mod patterns;
pub mod projection;

pub use buffer::ActivityBuffer;
pub use classify::classify;
pub use clock::{Clock, ManualClock, SystemClock};
pub use event::{EventData, EventKind, RawEvent};
pub use monitor::ActivityMonitor;
pub use normalize::{normalize, NormalizedFields};
pub use projection::{ActivityFilter, ActivitySummary, AgentFilter, LevelFilter};
