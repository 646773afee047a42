//! Health poller: checks the backend on a cadence chosen by the last result.
//!
//! Healthy results (`ok`, `degraded`) schedule the next check after the slow
//! interval, anything else after the fast one. A trigger (window focus,
//! network back online, tab visible) replaces the pending schedule with an
//! immediate check. There is only ever one pending timer.

use crate::api::Api;
use crate::model::{Health, HealthSnapshot, HealthStatus};
use crate::telemetry::metrics;
use async_trait::async_trait;
use chrono::Utc;
use opentelemetry::KeyValue;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Something that can report backend health. Must not fail.
#[async_trait]
pub trait HealthSource: Send + Sync + 'static {
    async fn check(&self) -> Health;
}

#[async_trait]
impl HealthSource for Api {
    async fn check(&self) -> Health {
        self.get_health().await
    }
}

/// Configuration for the poller cadence.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Delay after an unhealthy or unreachable result.
    pub fast_interval: Duration,
    /// Delay after an `ok` or `degraded` result.
    pub slow_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            fast_interval: Duration::from_secs(5),
            slow_interval: Duration::from_secs(30),
        }
    }
}

/// Delay before the next check, given the status just observed.
pub fn next_delay(status: &HealthStatus, config: &PollerConfig) -> Duration {
    if status.is_healthy() {
        config.slow_interval
    } else {
        config.fast_interval
    }
}

/// External events that demand an immediate re-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The window regained focus.
    Focus,
    /// The network came back online.
    Online,
    /// The tab became visible.
    Visible,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Trigger::Focus => "focus",
            Trigger::Online => "online",
            Trigger::Visible => "visible",
        };
        write!(f, "{s}")
    }
}

/// Poller ready to be started.
pub struct HealthPoller<S: HealthSource> {
    source: Arc<S>,
    config: PollerConfig,
}

impl<S: HealthSource> HealthPoller<S> {
    pub fn new(source: Arc<S>, config: PollerConfig) -> Self {
        Self { source, config }
    }

    /// Start polling on the current tokio runtime. The first check runs
    /// immediately; until it completes the published state is `loading`.
    pub fn spawn(self) -> PollerHandle {
        let (state_tx, state_rx) = watch::channel(HealthSnapshot::loading());
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        let shutdown = Arc::new(Notify::new());
        let torn_down = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn(run(
            self.source,
            self.config,
            state_tx,
            trigger_rx,
            Arc::clone(&shutdown),
            Arc::clone(&torn_down),
        ));

        PollerHandle {
            triggers: trigger_tx,
            state: state_rx,
            shutdown,
            torn_down,
            task,
        }
    }
}

/// Control and observation handle for a running poller.
///
/// Dropping the handle stops the poller after its current step.
pub struct PollerHandle {
    triggers: mpsc::UnboundedSender<Trigger>,
    state: watch::Receiver<HealthSnapshot>,
    shutdown: Arc<Notify>,
    torn_down: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Cancel the pending check and run one now.
    pub fn trigger(&self, trigger: Trigger) {
        // The receiver only goes away once the poller has stopped.
        let _ = self.triggers.send(trigger);
    }

    /// Latest published snapshot.
    pub fn current(&self) -> HealthSnapshot {
        self.state.borrow().clone()
    }

    /// Watch for new snapshots.
    pub fn subscribe(&self) -> watch::Receiver<HealthSnapshot> {
        self.state.clone()
    }

    /// Tear down: cancel the pending check and wait for the loop to exit.
    /// No snapshot is published after this is called.
    pub async fn shutdown(self) {
        self.torn_down.store(true, Ordering::Release);
        self.shutdown.notify_one();
        let _ = self.task.await;
    }
}

async fn run<S: HealthSource>(
    source: Arc<S>,
    config: PollerConfig,
    state: watch::Sender<HealthSnapshot>,
    mut triggers: mpsc::UnboundedReceiver<Trigger>,
    shutdown: Arc<Notify>,
    torn_down: Arc<AtomicBool>,
) {
    info!(
        fast_ms = config.fast_interval.as_millis() as u64,
        slow_ms = config.slow_interval.as_millis() as u64,
        "health poller started"
    );

    loop {
        let health = tokio::select! {
            biased;
            _ = shutdown.notified() => break,
            health = source.check() => health,
        };

        if torn_down.load(Ordering::Acquire) {
            break;
        }

        let delay = next_delay(&health.status, &config);
        metrics::health_checks().add(1, &[KeyValue::new("status", health.status.to_string())]);
        debug!(status = %health.status, next_ms = delay.as_millis() as u64, "health checked");
        state.send_replace(HealthSnapshot::observed(health, Utc::now()));

        tokio::select! {
            biased;
            _ = shutdown.notified() => break,
            trigger = triggers.recv() => match trigger {
                Some(trigger) => {
                    // Coalesce a burst of triggers into one check.
                    while triggers.try_recv().is_ok() {}
                    debug!(%trigger, "immediate health check requested");
                }
                None => break,
            },
            _ = tokio::time::sleep(delay) => {}
        }
    }

    info!("health poller stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_results_poll_slowly() {
        let config = PollerConfig::default();
        assert_eq!(next_delay(&HealthStatus::Ok, &config), Duration::from_secs(30));
        assert_eq!(next_delay(&HealthStatus::Degraded, &config), Duration::from_secs(30));
    }

    #[test]
    fn anything_else_polls_fast() {
        let config = PollerConfig::default();
        for status in [
            HealthStatus::Unreachable,
            HealthStatus::Loading,
            HealthStatus::Other("starting".into()),
        ] {
            assert_eq!(next_delay(&status, &config), Duration::from_secs(5));
        }
    }
}
