//! Mitigation: mute the offender and delete what they posted, channel by
//! channel, best effort.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use sidebot_core::{ChannelId, ChannelKind, GuildId, MessageId, ModerationApi, UserId};

use crate::tracker::UserActivity;

/// What happened to one channel's messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChannelOutcome {
    Deleted { count: usize },
    /// Not a text channel; nothing attempted.
    Skipped,
    Failed { error: String },
}

/// Combined result of one mitigation run.
#[derive(Debug, Clone, Serialize)]
pub struct PunishResult {
    pub incident_id: Uuid,
    pub user_id: UserId,
    pub guild_id: GuildId,
    pub muted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mute_error: Option<String>,
    pub channel_results: BTreeMap<ChannelId, ChannelOutcome>,
}

impl PunishResult {
    pub fn succeeded(&self) -> usize {
        self.count(|o| matches!(o, ChannelOutcome::Deleted { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ChannelOutcome::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ChannelOutcome::Skipped))
    }

    fn count(&self, pred: impl Fn(&ChannelOutcome) -> bool) -> usize {
        self.channel_results.values().filter(|o| pred(o)).count()
    }
}

/// Issues the timeout and the per-channel deletes for a triggered user.
pub struct MitigationActuator {
    api: Arc<dyn ModerationApi>,
    mute_duration: Duration,
}

impl MitigationActuator {
    pub fn new(api: Arc<dyn ModerationApi>, mute_duration: Duration) -> Self {
        Self { api, mute_duration }
    }

    pub fn mute_duration(&self) -> Duration {
        self.mute_duration
    }

    /// Mute the user, then delete every tracked message concurrently per
    /// channel. Never fails as a whole: each sub-operation reports its own
    /// outcome and nothing is retried.
    pub async fn punish(&self, guild_id: GuildId, snapshot: &UserActivity) -> PunishResult {
        let incident_id = Uuid::new_v4();
        let user_id = snapshot.user_id;
        let reason = format!("For spamming {} channels", snapshot.channel_count());

        info!(
            incident = %incident_id,
            user_id = %user_id,
            guild_id = %guild_id,
            channels = snapshot.channel_count(),
            messages = snapshot.message_count(),
            "Starting mitigation"
        );

        let mute_error = match self
            .api
            .timeout_member(guild_id, user_id, self.mute_duration, &reason)
            .await
        {
            Ok(()) => {
                info!(
                    incident = %incident_id,
                    user_id = %user_id,
                    duration_secs = self.mute_duration.as_secs(),
                    "Member timed out"
                );
                None
            }
            Err(e) => {
                warn!(
                    incident = %incident_id,
                    user_id = %user_id,
                    error = %e,
                    kind = e.kind(),
                    "Timeout failed, continuing with deletes"
                );
                Some(e.to_string())
            }
        };

        let mut join_set = JoinSet::new();
        for channel in snapshot.channels() {
            let api = Arc::clone(&self.api);
            let channel_id = channel.channel_id;
            let message_ids = channel.message_ids();
            join_set.spawn(async move {
                let outcome = purge_channel(api.as_ref(), channel_id, &message_ids).await;
                (channel_id, outcome)
            });
        }

        let mut channel_results = BTreeMap::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((channel_id, outcome)) => {
                    log_outcome(incident_id, channel_id, &outcome);
                    channel_results.insert(channel_id, outcome);
                }
                Err(e) => {
                    error!(incident = %incident_id, error = %e, "Delete task panicked");
                }
            }
        }

        // A panicked task never reported its channel; record it as failed.
        for channel in snapshot.channels() {
            channel_results
                .entry(channel.channel_id)
                .or_insert_with(|| ChannelOutcome::Failed {
                    error: "delete task aborted".to_string(),
                });
        }

        let result = PunishResult {
            incident_id,
            user_id,
            guild_id,
            muted: mute_error.is_none(),
            mute_error,
            channel_results,
        };

        info!(
            incident = %incident_id,
            user_id = %user_id,
            muted = result.muted,
            succeeded = result.succeeded(),
            failed = result.failed(),
            skipped = result.skipped(),
            "Mitigation finished"
        );
        result
    }
}

async fn purge_channel(
    api: &dyn ModerationApi,
    channel_id: ChannelId,
    message_ids: &[MessageId],
) -> ChannelOutcome {
    match api.channel_kind(channel_id).await {
        Ok(ChannelKind::Text) => {}
        Ok(ChannelKind::Other) => return ChannelOutcome::Skipped,
        Err(e) => return ChannelOutcome::Failed { error: e.to_string() },
    }

    match api.delete_messages(channel_id, message_ids).await {
        Ok(()) => ChannelOutcome::Deleted {
            count: message_ids.len(),
        },
        Err(e) => ChannelOutcome::Failed { error: e.to_string() },
    }
}

fn log_outcome(incident_id: Uuid, channel_id: ChannelId, outcome: &ChannelOutcome) {
    match outcome {
        ChannelOutcome::Deleted { count } => {
            debug!(incident = %incident_id, channel_id = %channel_id, count, "Messages deleted");
        }
        ChannelOutcome::Skipped => {
            debug!(incident = %incident_id, channel_id = %channel_id, "Not a text channel, skipped");
        }
        ChannelOutcome::Failed { error } => {
            warn!(incident = %incident_id, channel_id = %channel_id, error = %error, "Delete failed");
        }
    }
}
