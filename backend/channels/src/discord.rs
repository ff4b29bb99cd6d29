use std::sync::Arc;

use async_trait::async_trait;
use serenity::cache::Cache;
use serenity::client::{Client, Context, EventHandler};
use serenity::gateway::ShardManager;
use serenity::http::Http;
use serenity::model::channel::Message as DiscordMessage;
use serenity::model::gateway::{GatewayIntents, Ready};
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

use sidebot_core::{ChannelId, GuildId, MessageEvent, MessageId, PlatformEvent, UserId};

use crate::moderation::DiscordModeration;
use crate::ChannelAdapter;

struct Handler {
    events_tx: mpsc::Sender<PlatformEvent>,
}

impl Handler {
    async fn forward(&self, event: PlatformEvent) {
        if let Err(e) = self.events_tx.send(event).await {
            warn!(error = %e, "Spam guard is gone, dropping Discord event");
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, _ctx: Context, msg: DiscordMessage) {
        self.forward(PlatformEvent::Message(to_message_event(&msg))).await;
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, id = %ready.user.id, "Connected to Discord");
        self.forward(PlatformEvent::Ready {
            bot_user_id: UserId::new(ready.user.id.get()),
        })
        .await;
    }
}

fn to_message_event(msg: &DiscordMessage) -> MessageEvent {
    MessageEvent {
        message_id: MessageId::new(msg.id.get()),
        channel_id: ChannelId::new(msg.channel_id.get()),
        guild_id: msg.guild_id.map(|guild| GuildId::new(guild.get())),
        author_id: UserId::new(msg.author.id.get()),
        author_name: msg.author.name.clone(),
        author_is_bot: msg.author.bot,
    }
}

/// Discord gateway connection feeding the spam guard.
pub struct DiscordAdapter {
    client: Mutex<Client>,
    http: Arc<Http>,
    cache: Arc<Cache>,
    shard_manager: Arc<ShardManager>,
}

impl DiscordAdapter {
    /// Gateway intents the guard needs: guild metadata for the channel cache
    /// and guild message events. Message content is not required.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES
    }

    /// Build the client. Nothing connects until [`ChannelAdapter::start`].
    pub async fn connect(token: &str, events_tx: mpsc::Sender<PlatformEvent>) -> anyhow::Result<Self> {
        let client = Client::builder(token, Self::intents())
            .event_handler(Handler { events_tx })
            .await?;

        Ok(Self {
            http: Arc::clone(&client.http),
            cache: Arc::clone(&client.cache),
            shard_manager: Arc::clone(&client.shard_manager),
            client: Mutex::new(client),
        })
    }

    /// Moderation API sharing this client's HTTP session and cache.
    pub fn moderation(&self) -> DiscordModeration {
        DiscordModeration::new(Arc::clone(&self.http), Arc::clone(&self.cache))
    }
}

#[async_trait]
impl ChannelAdapter for DiscordAdapter {
    fn name(&self) -> &str {
        "discord"
    }

    async fn start(&self) -> anyhow::Result<()> {
        info!("Starting Discord adapter");

        let mut client = self.client.lock().await;
        if let Err(why) = client.start().await {
            error!("Client error: {:?}", why);
            anyhow::bail!("Discord client error: {:?}", why);
        }

        Ok(())
    }

    async fn shutdown(&self) {
        info!("Shutting down Discord shards");
        self.shard_manager.shutdown_all().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intents_cover_guild_messages_without_content() {
        let intents = DiscordAdapter::intents();
        assert!(intents.contains(GatewayIntents::GUILD_MESSAGES));
        assert!(intents.contains(GatewayIntents::GUILDS));
        assert!(!intents.contains(GatewayIntents::MESSAGE_CONTENT));
    }

    #[tokio::test]
    async fn handler_forwards_events_in_order() {
        let (events_tx, mut rx) = mpsc::channel(4);
        let handler = Handler { events_tx };

        handler
            .forward(PlatformEvent::Ready { bot_user_id: UserId::new(1) })
            .await;
        drop(handler);

        assert_eq!(rx.recv().await.unwrap().kind(), "ready");
        assert!(rx.recv().await.is_none());
    }
}
