//! Cross-channel spam detection for SideBot.
//!
//! A user who posts in `channels_max` distinct channels within one tracking
//! epoch is muted and has the tracked messages bulk-deleted. The epoch is reset
//! wholesale by the sweep timer.

pub mod actuator;
pub mod config;
pub mod guard;
pub mod ingest;
pub mod sweep;
pub mod tracker;

pub use actuator::{ChannelOutcome, MitigationActuator, PunishResult};
pub use config::{
    GuardConfig, DEFAULT_CHANNELS_MAX, DEFAULT_MUTE_DURATION, DEFAULT_SWEEP_INTERVAL,
};
pub use guard::SpamGuard;
pub use ingest::{EventIngestor, IgnoreReason, Ingest, ObservedMessage};
pub use sweep::SweepScheduler;
pub use tracker::{ChannelActivity, MessageRef, SpamTracker, TriggerDecision, UserActivity};
