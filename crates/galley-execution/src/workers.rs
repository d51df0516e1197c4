//! Background workers that run alongside the intake service.

use galley_application::OrderIntakeService;
use galley_core::config::SessionConfig;
use galley_core::session::{SessionStore, SessionTtl};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Periodically removes idle conversation sessions.
pub struct SessionSweeper {
    store: Arc<SessionStore>,
    ttl: SessionTtl,
    interval: Duration,
}

impl SessionSweeper {
    pub fn new(store: Arc<SessionStore>, ttl: SessionTtl, interval: Duration) -> Self {
        Self {
            store,
            ttl,
            interval,
        }
    }

    pub fn from_config(store: Arc<SessionStore>, config: &SessionConfig) -> Self {
        Self::new(store, config.ttl(), config.sweep_interval())
    }

    /// Runs until `cancel_token` fires. The first sweep happens one
    /// interval after start.
    pub async fn run(self, cancel_token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval() completes its first tick immediately
        ticker.tick().await;

        tracing::debug!(
            interval_ms = self.interval.as_millis() as u64,
            "[SessionSweeper] started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = self.store.sweep(&self.ttl).await;
                    if removed > 0 {
                        tracing::info!(removed, "[SessionSweeper] expired idle sessions");
                    }
                }
                _ = cancel_token.cancelled() => {
                    tracing::debug!("[SessionSweeper] stopped");
                    break;
                }
            }
        }
    }
}

/// Owns the background tasks for one running service.
pub struct Workers {
    cancel_token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
    service: Arc<OrderIntakeService>,
}

impl Workers {
    /// Spawns the session sweeper for `service`.
    pub fn start(service: Arc<OrderIntakeService>, config: &SessionConfig) -> Self {
        let cancel_token = CancellationToken::new();
        let sweeper = SessionSweeper::from_config(service.sessions(), config);
        let handle = tokio::spawn(sweeper.run(cancel_token.clone()));

        Self {
            cancel_token,
            handles: vec![handle],
            service,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.cancel_token.is_cancelled()
    }

    /// Stops every worker and cancels pending delayed notifications.
    pub async fn shutdown(mut self) {
        self.cancel_token.cancel();
        self.service.shutdown();

        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!("[Workers] worker task failed to join: {e}");
            }
        }
        tracing::info!("[Workers] shut down");
    }
}
