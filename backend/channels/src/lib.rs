use async_trait::async_trait;

pub mod discord;
pub mod moderation;

pub use discord::DiscordAdapter;
pub use moderation::{DiscordModeration, BULK_DELETE_LIMIT};

/// All platform adapters implement this trait.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    /// Human-readable adapter name for logging.
    fn name(&self) -> &str;

    /// Run the adapter's gateway connection until it ends or fails.
    async fn start(&self) -> anyhow::Result<()>;

    /// Close the gateway connection.
    async fn shutdown(&self);
}
