use serde::{Deserialize, Serialize};

use crate::types::{ChannelId, GuildId, MessageId, UserId};

/// Events delivered by a platform adapter to the spam guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlatformEvent {
    /// The gateway session is ready and the bot knows its own identity.
    Ready { bot_user_id: UserId },
    /// An inbound chat message.
    Message(MessageEvent),
}

/// One inbound chat message, as reported by the platform binding.
///
/// Ids are passed through untouched; validating them is the ingestor's job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub author_id: UserId,
    pub author_name: String,
    pub author_is_bot: bool,
}

impl PlatformEvent {
    /// Event label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            PlatformEvent::Ready { .. } => "ready",
            PlatformEvent::Message(_) => "message",
        }
    }
}

impl std::fmt::Display for MessageEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.guild_id {
            Some(guild) => write!(
                f,
                "message {} by {} in {}/{}",
                self.message_id, self.author_id, guild, self.channel_id
            ),
            None => write!(
                f,
                "message {} by {} in {} (no guild)",
                self.message_id, self.author_id, self.channel_id
            ),
        }
    }
}
