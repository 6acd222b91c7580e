//! Periodic backend health polling
//!
//! [`StatusPoller::tick`] runs one probe and produces one [`SystemStatus`].
//! [`StatusPoller::spawn`] drives ticks on a tokio interval and publishes each
//! snapshot on a `watch` channel. A failed probe never stops the loop; the
//! next tick simply tries again. Dropping the returned [`PollerHandle`] (or
//! calling [`PollerHandle::shutdown`]) stops the task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::probe::{HealthProbe, HealthResponse};
use crate::config::StatusConfig;
use crate::types::{AiServiceState, SystemStatus};

/// Live-transport connectivity flag, shared between the transport reader
/// and the poller.
#[derive(Debug, Clone, Default)]
pub struct TransportState {
    connected: Arc<AtomicBool>,
}

impl TransportState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

/// Polls a [`HealthProbe`] and keeps the last snapshot.
pub struct StatusPoller<P> {
    probe: P,
    transport: TransportState,
    interval: Duration,
    timeout: Duration,
    agents_total: u32,
    last: SystemStatus,
}

impl<P: HealthProbe> StatusPoller<P> {
    pub fn new(probe: P, transport: TransportState, config: &StatusConfig) -> Self {
        Self {
            probe,
            interval: config.interval(),
            timeout: config.timeout(),
            agents_total: config.agents_total,
            last: SystemStatus {
                agents_total: config.agents_total,
                transport_connected: transport.is_connected(),
                ..Default::default()
            },
            transport,
        }
    }

    /// Last snapshot produced (defaults before the first tick).
    pub fn last(&self) -> &SystemStatus {
        &self.last
    }

    /// Probe once and build a fresh snapshot.
    pub async fn tick(&mut self) -> SystemStatus {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.probe.probe()).await;

        let snapshot = match outcome {
            Ok(Ok(response)) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                tracing::debug!(
                    healthy = response.healthy,
                    latency_ms,
                    "Health probe succeeded"
                );
                self.snapshot_from(&response, latency_ms)
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Health probe failed");
                self.degraded()
            }
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "Health probe timed out");
                self.degraded()
            }
        };

        self.last = snapshot.clone();
        snapshot
    }

    fn snapshot_from(&self, response: &HealthResponse, latency_ms: u64) -> SystemStatus {
        let services = &response.data.services;
        let ai_service_state = services
            .ai
            .status
            .as_deref()
            .map(AiServiceState::from_backend)
            .unwrap_or_default();
        let agents_operational = match services.agents.as_deref() {
            Some(agents) if agents.eq_ignore_ascii_case("active") => self.agents_total,
            _ => 0,
        };

        SystemStatus {
            backend_healthy: response.healthy,
            backend_latency_ms: latency_ms,
            ai_service_state,
            agents_operational,
            agents_total: self.agents_total,
            transport_connected: self.transport.is_connected(),
        }
    }

    /// Unhealthy snapshot keeping the last-known service fields.
    fn degraded(&self) -> SystemStatus {
        SystemStatus {
            backend_healthy: false,
            backend_latency_ms: 0,
            transport_connected: self.transport.is_connected(),
            ..self.last.clone()
        }
    }

    /// Run the poll loop on the current tokio runtime.
    ///
    /// The first probe happens immediately.
    pub fn spawn(self) -> PollerHandle {
        let (tx, rx) = watch::channel(self.last.clone());
        let mut poller = self;

        let task = tokio::spawn(async move {
            tracing::info!(interval = ?poller.interval, "Status poller started");
            let mut ticker = tokio::time::interval(poller.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let snapshot = poller.tick().await;
                if tx.send(snapshot).is_err() {
                    break;
                }
            }
            tracing::info!("Status poller stopped");
        });

        PollerHandle {
            status: rx,
            task: Some(task),
        }
    }
}

/// Owner of a running poll loop.
pub struct PollerHandle {
    status: watch::Receiver<SystemStatus>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// A receiver that always sees the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SystemStatus> {
        self.status.clone()
    }

    /// Latest published snapshot.
    pub fn latest(&self) -> SystemStatus {
        self.status.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop the poll loop. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::info!("Status poller shut down");
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::status::probe::{AiServiceHealth, HealthData, ServiceHealth};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    fn healthy_response() -> HealthResponse {
        HealthResponse {
            healthy: true,
            data: HealthData {
                services: ServiceHealth {
                    ai: AiServiceHealth {
                        status: Some("online".to_string()),
                        model: Some("gemini-2.0-flash".to_string()),
                        quota_preserved: Some(true),
                    },
                    agents: Some("active".to_string()),
                    websockets: Some("active".to_string()),
                },
            },
        }
    }

    /// Replays scripted outcomes; repeats the last one when exhausted.
    struct ScriptedProbe {
        script: Mutex<VecDeque<Result<HealthResponse>>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedProbe {
        fn new(script: Vec<Result<HealthResponse>>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    script: Mutex::new(script.into()),
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl HealthProbe for ScriptedProbe {
        async fn probe(&self) -> Result<HealthResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            match script.pop_front() {
                Some(outcome) => outcome,
                None => Ok(healthy_response()),
            }
        }
    }

    struct HangingProbe;

    #[async_trait]
    impl HealthProbe for HangingProbe {
        async fn probe(&self) -> Result<HealthResponse> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(healthy_response())
        }
    }

    fn config() -> StatusConfig {
        StatusConfig {
            base_url: Some("http://backend".to_string()),
            interval_secs: 30,
            timeout_secs: 5,
            agents_total: 5,
        }
    }

    #[tokio::test]
    async fn test_tick_success() {
        let (probe, _) = ScriptedProbe::new(vec![Ok(healthy_response())]);
        let transport = TransportState::new();
        transport.set_connected(true);
        let mut poller = StatusPoller::new(probe, transport, &config());

        let status = poller.tick().await;
        assert!(status.backend_healthy);
        assert_eq!(status.ai_service_state, AiServiceState::Online);
        assert_eq!(status.agents_operational, 5);
        assert_eq!(status.agents_total, 5);
        assert!(status.transport_connected);
        assert_eq!(poller.last(), &status);
    }

    #[tokio::test]
    async fn test_failure_keeps_last_known_fields() {
        let (probe, _) = ScriptedProbe::new(vec![
            Ok(healthy_response()),
            Err(Error::Probe("connection refused".to_string())),
        ]);
        let transport = TransportState::new();
        let mut poller = StatusPoller::new(probe, transport.clone(), &config());

        poller.tick().await;
        transport.set_connected(true);
        let status = poller.tick().await;

        assert!(!status.backend_healthy);
        assert_eq!(status.backend_latency_ms, 0);
        assert_eq!(status.ai_service_state, AiServiceState::Online);
        assert_eq!(status.agents_operational, 5);
        assert!(status.transport_connected);
    }

    #[tokio::test]
    async fn test_failure_before_any_success_uses_defaults() {
        let (probe, _) = ScriptedProbe::new(vec![Err(Error::Probe("boom".to_string()))]);
        let mut poller = StatusPoller::new(probe, TransportState::new(), &config());

        let status = poller.tick().await;
        assert!(!status.backend_healthy);
        assert_eq!(status.ai_service_state, AiServiceState::Unknown);
        assert_eq!(status.agents_operational, 0);
        assert_eq!(status.agents_total, 5);
    }

    #[tokio::test]
    async fn test_inactive_agents() {
        let mut response = healthy_response();
        response.data.services.agents = Some("degraded".to_string());
        response.data.services.ai.status = Some("starting".to_string());
        let (probe, _) = ScriptedProbe::new(vec![Ok(response)]);
        let mut poller = StatusPoller::new(probe, TransportState::new(), &config());

        let status = poller.tick().await;
        assert_eq!(status.agents_operational, 0);
        assert_eq!(status.ai_service_state, AiServiceState::Starting);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_degrades() {
        let mut poller = StatusPoller::new(HangingProbe, TransportState::new(), &config());
        let status = poller.tick().await;
        assert!(!status.backend_healthy);
        assert_eq!(status.backend_latency_ms, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_snapshot_sees_connected_transport() {
        let (probe, _) = ScriptedProbe::new(vec![Ok(healthy_response())]);
        let transport = TransportState::new();
        transport.set_connected(true);
        let handle = StatusPoller::new(probe, transport, &config()).spawn();
        assert!(handle.latest().transport_connected);

        tokio::time::sleep(Duration::from_secs(1)).await;
        let status = handle.latest();
        assert!(status.backend_healthy);
        assert!(status.transport_connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawned_loop_retries_and_stops() {
        let (probe, calls) = ScriptedProbe::new(vec![
            Err(Error::Probe("down".to_string())),
            Err(Error::Probe("still down".to_string())),
        ]);
        let mut handle = StatusPoller::new(probe, TransportState::new(), &config()).spawn();
        assert!(handle.is_running());

        // Ticks at 0s, 30s and 60s
        tokio::time::sleep(Duration::from_secs(65)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(handle.latest().backend_healthy);

        handle.shutdown();
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(!handle.is_running());
    }
}
