//! Periodic sweep moving stale alerts to `EXPIRED`.
//!
//! The scheduler runs as its own Tokio task with its own error boundary: a
//! failed sweep is logged and the next tick runs as usual. The first sweep
//! happens immediately on start. Stopping is explicit through
//! [`ExpirationHandle::shutdown`]; dropping the handle also stops the loop.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::domain::events::{EventTopic, RealtimeEvent};
use crate::domain::ports::{AlertEventPublisher, AlertRepository};
use crate::domain::{AlertId, Error};

/// Default time between sweeps.
pub const DEFAULT_SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// One sweep: bulk-expire due alerts and announce each of them.
pub struct ExpirationSweeper {
    alerts: Arc<dyn AlertRepository>,
    publisher: Arc<dyn AlertEventPublisher>,
    clock: Arc<dyn Clock>,
}

impl ExpirationSweeper {
    pub fn new(
        alerts: Arc<dyn AlertRepository>,
        publisher: Arc<dyn AlertEventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            alerts,
            publisher,
            clock,
        }
    }

    /// Expire every alert due at the current instant.
    ///
    /// Already-expired alerts are not touched again, so running twice in a
    /// row expires nothing the second time.
    pub async fn sweep(&self) -> Result<Vec<AlertId>, Error> {
        let now = self.clock.utc();
        let expired = self.alerts.expire_due(now).await?;
        for id in &expired {
            self.publisher
                .publish(EventTopic::Global, RealtimeEvent::AlertExpired { id: *id });
        }
        if expired.is_empty() {
            debug!("expiration sweep found nothing due");
        } else {
            info!(count = expired.len(), "expired alerts");
        }
        Ok(expired)
    }
}

/// Handle to a running scheduler task.
pub struct ExpirationHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ExpirationHandle {
    /// Signal the loop to stop and wait for it to finish the current sweep.
    pub async fn shutdown(self) {
        if self.stop.send(true).is_err() {
            debug!("expiration scheduler already stopped");
        }
        if let Err(err) = self.task.await {
            warn!(error = %err, "expiration scheduler task ended abnormally");
        }
    }
}

/// Spawn the sweep loop on the current Tokio runtime.
///
/// A zero `period` is treated as one second.
pub fn spawn_expiration_scheduler(
    sweeper: Arc<ExpirationSweeper>,
    period: Duration,
) -> ExpirationHandle {
    let period = period.max(Duration::from_secs(1));
    let (stop, stop_rx) = watch::channel(false);
    let task = tokio::spawn(run(sweeper, period, stop_rx));
    info!(period_secs = period.as_secs(), "expiration scheduler started");
    ExpirationHandle { stop, task }
}

async fn run(sweeper: Arc<ExpirationSweeper>, period: Duration, mut stop: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if let Err(err) = sweeper.sweep().await {
                    error!(error = %err, "alert expiration sweep failed");
                }
            }
        }
    }
    info!("expiration scheduler stopped");
}

#[cfg(test)]
#[path = "expiration_tests.rs"]
mod tests;
