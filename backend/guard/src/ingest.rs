//! Event ingestion: filters raw platform messages down to the ones the tracker
//! should see.

use std::sync::OnceLock;

use serde::Serialize;
use tracing::{debug, info, warn};

use sidebot_core::{ChannelId, GuildId, MessageEvent, MessageId, UserId};

/// A message that passed every ingest filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedMessage {
    pub user_id: UserId,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub guild_id: GuildId,
    pub author_name: String,
}

/// Why an inbound message was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// The gateway has not reported the bot's own identity yet.
    NoBotIdentity,
    /// The bot authored the message itself.
    SelfAuthored,
    /// Direct message or otherwise guildless.
    NoGuild,
    /// Another bot authored it and bot authors are ignored.
    BotAuthor,
    /// One of the ids is not a valid snowflake.
    Malformed,
}

/// Result of ingesting one message event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ingest {
    Observe(ObservedMessage),
    Ignore(IgnoreReason),
}

/// Normalizes inbound message events. Never touches tracker state.
pub struct EventIngestor {
    bot_user_id: OnceLock<UserId>,
    ignore_bot_authors: bool,
}

impl EventIngestor {
    pub fn new(ignore_bot_authors: bool) -> Self {
        Self {
            bot_user_id: OnceLock::new(),
            ignore_bot_authors,
        }
    }

    /// Record the bot's own identity. Only the first call has any effect;
    /// reconnects report the same user.
    pub fn set_bot_user(&self, user_id: UserId) {
        if self.bot_user_id.set(user_id).is_ok() {
            info!(bot_user_id = %user_id, "Bot identity known, ingest enabled");
        }
    }

    pub fn bot_user(&self) -> Option<UserId> {
        self.bot_user_id.get().copied()
    }

    pub fn ingest(&self, event: &MessageEvent) -> Ingest {
        let verdict = self.classify(event);
        match &verdict {
            Ingest::Ignore(IgnoreReason::Malformed) => {
                warn!(event = %event, "Dropping malformed message event");
            }
            Ingest::Ignore(reason) => {
                debug!(event = %event, reason = ?reason, "Ignoring message");
            }
            Ingest::Observe(_) => {}
        }
        verdict
    }

    fn classify(&self, event: &MessageEvent) -> Ingest {
        let Some(bot_user_id) = self.bot_user() else {
            return Ingest::Ignore(IgnoreReason::NoBotIdentity);
        };
        if !event.author_id.is_valid()
            || !event.channel_id.is_valid()
            || !event.message_id.is_valid()
        {
            return Ingest::Ignore(IgnoreReason::Malformed);
        }
        if event.author_id == bot_user_id {
            return Ingest::Ignore(IgnoreReason::SelfAuthored);
        }
        let guild_id = match event.guild_id {
            Some(guild) if guild.is_valid() => guild,
            Some(_) => return Ingest::Ignore(IgnoreReason::Malformed),
            None => return Ingest::Ignore(IgnoreReason::NoGuild),
        };
        if self.ignore_bot_authors && event.author_is_bot {
            return Ingest::Ignore(IgnoreReason::BotAuthor);
        }

        Ingest::Observe(ObservedMessage {
            user_id: event.author_id,
            channel_id: event.channel_id,
            message_id: event.message_id,
            guild_id,
            author_name: event.author_name.clone(),
        })
    }
}
