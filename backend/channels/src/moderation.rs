//! Discord implementation of the guard's moderation primitives.
//!
//! Everything is addressed by raw id, so a channel that has fallen out of the
//! cache can still be purged over HTTP.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serenity::builder::EditMember;
use serenity::cache::Cache;
use serenity::http::{Http, HttpError};
use serenity::model::channel::{Channel, ChannelType};
use serenity::model::id as discord_id;
use serenity::model::Timestamp;
use serenity::Error as SerenityError;
use tracing::debug;

use sidebot_core::{ChannelId, ChannelKind, GuardError, GuildId, MessageId, ModerationApi, UserId};

/// Discord accepts at most this many ids per bulk-delete request.
pub const BULK_DELETE_LIMIT: usize = 100;

pub struct DiscordModeration {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl DiscordModeration {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        Self { http, cache }
    }
}

#[async_trait]
impl ModerationApi for DiscordModeration {
    async fn timeout_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        duration: Duration,
        reason: &str,
    ) -> Result<(), GuardError> {
        let until = timeout_deadline(chrono::Utc::now().timestamp(), duration)?;
        let builder = EditMember::new()
            .disable_communication_until_datetime(until)
            .audit_log_reason(reason);

        discord_id::GuildId::new(guild_id.get())
            .edit_member(&self.http, discord_id::UserId::new(user_id.get()), builder)
            .await
            .map(|_| ())
            .map_err(map_error)
    }

    async fn channel_kind(&self, channel_id: ChannelId) -> Result<ChannelKind, GuardError> {
        let channel = discord_id::ChannelId::new(channel_id.get())
            .to_channel((&self.cache, self.http.as_ref()))
            .await
            .map_err(map_error)?;

        let kind = match channel {
            Channel::Guild(guild_channel)
                if matches!(guild_channel.kind, ChannelType::Text | ChannelType::News) =>
            {
                ChannelKind::Text
            }
            _ => ChannelKind::Other,
        };
        Ok(kind)
    }

    async fn delete_messages(
        &self,
        channel_id: ChannelId,
        message_ids: &[MessageId],
    ) -> Result<(), GuardError> {
        let channel = discord_id::ChannelId::new(channel_id.get());
        let ids: Vec<discord_id::MessageId> = message_ids
            .iter()
            .filter(|id| id.is_valid())
            .map(|id| discord_id::MessageId::new(id.get()))
            .collect();

        // Every chunk is attempted; the first failure is reported.
        let mut first_error = None;
        for chunk in ids.chunks(BULK_DELETE_LIMIT) {
            let sent = match chunk {
                [single] => channel.delete_message(&self.http, *single).await,
                many => channel.delete_messages(&self.http, many).await,
            };
            match sent {
                Ok(()) => debug!(channel_id = %channel_id, count = chunk.len(), "Deleted chunk"),
                Err(e) => {
                    first_error.get_or_insert(map_error(e));
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Absolute "communication disabled until" time for a timeout starting at
/// `now_unix`.
fn timeout_deadline(now_unix: i64, duration: Duration) -> Result<Timestamp, GuardError> {
    let secs = i64::try_from(duration.as_secs())
        .map_err(|_| GuardError::InvalidInput(format!("mute duration too large: {duration:?}")))?;
    Timestamp::from_unix_timestamp(now_unix.saturating_add(secs))
        .map_err(|e| GuardError::InvalidInput(format!("invalid timeout deadline: {e:?}")))
}

fn map_error(err: SerenityError) -> GuardError {
    if let SerenityError::Http(HttpError::UnsuccessfulRequest(response)) = &err {
        return from_status(response.status_code.as_u16(), &response.error.message);
    }
    GuardError::Platform(err.to_string())
}

fn from_status(status: u16, message: &str) -> GuardError {
    match status {
        403 => GuardError::PermissionDenied(message.to_string()),
        404 => GuardError::NotFound(message.to_string()),
        400 => GuardError::InvalidInput(message.to_string()),
        _ => GuardError::Platform(format!("HTTP {status}: {message}")),
    }
}
