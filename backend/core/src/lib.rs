pub mod channel;
pub mod error;
pub mod event;
pub mod traits;
pub mod types;

pub use channel::EventBus;
pub use error::GuardError;
pub use event::{MessageEvent, PlatformEvent};
pub use traits::{ChannelKind, Component, ModerationApi};
pub use types::{ChannelId, GuildId, MessageId, UserId};
