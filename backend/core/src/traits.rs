use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::GuardError;
use crate::event::PlatformEvent;
use crate::types::{ChannelId, GuildId, MessageId, UserId};

/// Trait for long-running runtime components fed by the event bus.
///
/// Each component receives events from its channel and runs in its own Tokio task.
#[async_trait]
pub trait Component: Send + Sync + 'static {
    /// Human-readable name of this component.
    fn name(&self) -> &str;

    /// Start the component's event loop, consuming from the given receiver.
    async fn start(&self, rx: mpsc::Receiver<PlatformEvent>) -> Result<()>;
}

/// Whether a channel can hold ordinary text messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Text,
    Other,
}

/// Moderation primitives the guard needs from the chat platform.
///
/// Every call is addressed by id only; implementations must not require a
/// live channel or member handle.
#[async_trait]
pub trait ModerationApi: Send + Sync {
    /// Temporarily mute `user_id` in `guild_id` for `duration`.
    async fn timeout_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        duration: Duration,
        reason: &str,
    ) -> Result<(), GuardError>;

    /// Classify a channel so non-text channels can be skipped.
    async fn channel_kind(&self, channel_id: ChannelId) -> Result<ChannelKind, GuardError>;

    /// Delete the given messages from one channel.
    async fn delete_messages(
        &self,
        channel_id: ChannelId,
        message_ids: &[MessageId],
    ) -> Result<(), GuardError>;
}
