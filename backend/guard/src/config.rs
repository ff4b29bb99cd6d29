use std::time::Duration;

/// Default number of distinct channels that triggers mitigation.
pub const DEFAULT_CHANNELS_MAX: usize = 4;

/// Default mute length applied to a detected spammer.
pub const DEFAULT_MUTE_DURATION: Duration = Duration::from_secs(30);

/// Default period between full tracker resets.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Static spam guard policy, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Distinct channels within one epoch at which a user is punished.
    pub channels_max: usize,
    /// How long the offending member is timed out.
    pub mute_duration: Duration,
    /// How often the tracker is cleared.
    pub sweep_interval: Duration,
    /// Drop messages authored by other bots before tracking.
    pub ignore_bot_authors: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            channels_max: DEFAULT_CHANNELS_MAX,
            mute_duration: DEFAULT_MUTE_DURATION,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            ignore_bot_authors: false,
        }
    }
}
