//! Sweep scheduler: clears the spam tracker on a fixed interval.
//!
//! This is the only bound on tracker growth. A user whose fan-out straddles a
//! sweep starts over from zero.
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::tracker::SpamTracker;

pub struct SweepScheduler {
    tracker: Arc<SpamTracker>,
    interval: Duration,
}

impl SweepScheduler {
    pub fn new(tracker: Arc<SpamTracker>, interval: Duration) -> Self {
        Self { tracker, interval }
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped.
    /// The first sweep fires one full interval after start.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = self.interval.as_secs(), "[Sweep] Scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let cleared = self.tracker.reset_all().await;
                    info!(users_cleared = cleared, "[Sweep] Cleared spam tracker");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("[Sweep] Shutdown signalled");
                        break;
                    }
                }
            }
        }

        info!("[Sweep] Scheduler stopped");
    }

    /// Spawn [`run`](Self::run) on the current runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidebot_core::{ChannelId, MessageId, UserId};

    async fn seed(tracker: &SpamTracker, user: u64) {
        tracker
            .observe(UserId::new(user), ChannelId::new(1), MessageId::new(user))
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn clears_tracker_every_interval() {
        let tracker = Arc::new(SpamTracker::new(4));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = SweepScheduler::new(Arc::clone(&tracker), Duration::from_secs(1800))
            .spawn(shutdown_rx);

        seed(&tracker, 1).await;
        seed(&tracker, 2).await;

        // Not yet due.
        time::sleep(Duration::from_secs(1799)).await;
        assert_eq!(tracker.tracked_users().await, 2);

        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(tracker.tracked_users().await, 0);

        // And again on the next period.
        seed(&tracker, 3).await;
        time::sleep(Duration::from_secs(1800)).await;
        assert_eq!(tracker.tracked_users().await, 0);

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_shutdown_sender_dropped() {
        let tracker = Arc::new(SpamTracker::new(4));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle =
            SweepScheduler::new(Arc::clone(&tracker), Duration::from_secs(60)).spawn(shutdown_rx);

        drop(shutdown_tx);
        time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("sweep loop should exit")
            .unwrap();

        // No sweep ran, so seeded state survives.
        seed(&tracker, 1).await;
        time::sleep(Duration::from_secs(120)).await;
        assert_eq!(tracker.tracked_users().await, 1);
    }
}
