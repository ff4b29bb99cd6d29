use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

use sidebot_core::{Component, MessageEvent, ModerationApi, PlatformEvent};

use crate::actuator::{MitigationActuator, PunishResult};
use crate::config::GuardConfig;
use crate::ingest::{EventIngestor, Ingest};
use crate::tracker::{SpamTracker, TriggerDecision};

/// The spam guard component: ingest, track, and hand triggered users off to
/// mitigation without blocking the event loop.
///
/// Mitigations run as tasks owned by the guard. They outlive the event that
/// started them but not the guard: [`drain_mitigations`](Self::drain_mitigations)
/// waits for every one still in flight.
pub struct SpamGuard {
    ingestor: EventIngestor,
    tracker: Arc<SpamTracker>,
    actuator: Arc<MitigationActuator>,
    mitigations: Mutex<JoinSet<PunishResult>>,
}

impl SpamGuard {
    pub fn new(config: &GuardConfig, api: Arc<dyn ModerationApi>) -> Self {
        info!(
            channels_max = config.channels_max,
            mute_secs = config.mute_duration.as_secs(),
            sweep_secs = config.sweep_interval.as_secs(),
            ignore_bot_authors = config.ignore_bot_authors,
            "Spam guard configured"
        );
        Self {
            ingestor: EventIngestor::new(config.ignore_bot_authors),
            tracker: Arc::new(SpamTracker::new(config.channels_max)),
            actuator: Arc::new(MitigationActuator::new(api, config.mute_duration)),
            mitigations: Mutex::new(JoinSet::new()),
        }
    }

    /// Shared tracker, for the sweep scheduler.
    pub fn tracker(&self) -> Arc<SpamTracker> {
        Arc::clone(&self.tracker)
    }

    /// Handle one platform event. Returns `true` if this event pushed its
    /// author over the threshold and a mitigation was started.
    pub async fn handle(&self, event: PlatformEvent) -> bool {
        match event {
            PlatformEvent::Ready { bot_user_id } => {
                self.ingestor.set_bot_user(bot_user_id);
                false
            }
            PlatformEvent::Message(message) => self.handle_message(&message).await,
        }
    }

    /// Mitigations started and not yet collected.
    pub async fn pending_mitigations(&self) -> usize {
        self.mitigations.lock().await.len()
    }

    /// Wait for every in-flight mitigation and return the results of those
    /// that completed. Mitigations started while draining are left for the
    /// next call.
    pub async fn drain_mitigations(&self) -> Vec<PunishResult> {
        let mut pending = std::mem::take(&mut *self.mitigations.lock().await);
        if !pending.is_empty() {
            info!(pending = pending.len(), "Waiting for in-flight mitigations");
        }

        let mut results = Vec::with_capacity(pending.len());
        while let Some(joined) = pending.join_next().await {
            if let Some(result) = collect(joined) {
                results.push(result);
            }
        }
        results
    }

    async fn handle_message(&self, event: &MessageEvent) -> bool {
        let Ingest::Observe(observed) = self.ingestor.ingest(event) else {
            return false;
        };

        let decision = self
            .tracker
            .observe(observed.user_id, observed.channel_id, observed.message_id)
            .await;
        let TriggerDecision::Triggered(snapshot) = decision else {
            return false;
        };

        warn!(
            user_id = %observed.user_id,
            author = %observed.author_name,
            guild_id = %observed.guild_id,
            channels = snapshot.channel_count(),
            "Spammer alert! {} has sent messages to {} different channels recently",
            observed.author_name,
            snapshot.channel_count()
        );

        let actuator = Arc::clone(&self.actuator);
        let guild_id = observed.guild_id;
        let mut mitigations = self.mitigations.lock().await;
        mitigations.spawn(async move {
            let result = actuator.punish(guild_id, &snapshot).await;
            match serde_json::to_string(&result) {
                Ok(json) => debug!(result = %json, "Mitigation result"),
                Err(e) => debug!(error = %e, "Mitigation result not serializable"),
            }
            result
        });

        // Reap finished mitigations so the set only holds live ones.
        while let Some(joined) = mitigations.try_join_next() {
            collect(joined);
        }
        true
    }
}

fn collect(joined: Result<PunishResult, JoinError>) -> Option<PunishResult> {
    match joined {
        Ok(result) => Some(result),
        Err(e) => {
            warn!(error = %e, "Mitigation task did not complete");
            None
        }
    }
}

#[async_trait]
impl Component for SpamGuard {
    fn name(&self) -> &str {
        "spam_guard"
    }

    async fn start(&self, mut rx: mpsc::Receiver<PlatformEvent>) -> Result<()> {
        info!("Spam guard started");

        while let Some(event) = rx.recv().await {
            debug!(kind = event.kind(), "Spam guard received event");
            self.handle(event).await;
        }

        info!("Spam guard channel closed, finishing mitigations");
        let finished = self.drain_mitigations().await;
        info!(finished = finished.len(), "Spam guard stopped");
        Ok(())
    }
}
