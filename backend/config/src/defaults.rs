//! Config defaults: fills unset fields after loading.

use std::collections::HashMap;

use crate::schema::{DiscordConfig, LoggingConfig, SideBotConfig, SpamGuardConfig};

/// Default distinct-channel threshold, as the guard defines it.
pub const DEFAULT_CHANNELS_MAX: usize = sidebot_guard::DEFAULT_CHANNELS_MAX;

/// Default mute length in seconds.
pub const DEFAULT_MUTE_DURATION_SECS: u64 = sidebot_guard::DEFAULT_MUTE_DURATION.as_secs();

/// Default sweep period in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = sidebot_guard::DEFAULT_SWEEP_INTERVAL.as_secs();

/// Default log filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variables consulted for the bot token, in order.
/// `DTOKEN` is the key older `.env` files use.
pub const TOKEN_ENV_VARS: &[&str] = &["DISCORD_TOKEN", "DTOKEN"];

/// Apply all defaults, reading the token fallback from the process environment.
pub fn apply_all_defaults(config: SideBotConfig) -> SideBotConfig {
    apply_all_defaults_with(config, &std::env::vars().collect())
}

/// Apply all defaults using a provided environment map.
pub fn apply_all_defaults_with(
    config: SideBotConfig,
    env: &HashMap<String, String>,
) -> SideBotConfig {
    let config = apply_discord_defaults(config, env);
    let config = apply_guard_defaults(config);
    apply_logging_defaults(config)
}

/// Fall back to the environment when no token is configured.
fn apply_discord_defaults(mut config: SideBotConfig, env: &HashMap<String, String>) -> SideBotConfig {
    let discord = config.discord.get_or_insert_with(DiscordConfig::default);
    if discord.token.as_deref().map_or(true, str::is_empty) {
        discord.token = TOKEN_ENV_VARS
            .iter()
            .filter_map(|key| env.get(*key))
            .find(|value| !value.is_empty())
            .cloned();
    }
    config
}

fn apply_guard_defaults(mut config: SideBotConfig) -> SideBotConfig {
    let guard = config.spam_guard.get_or_insert_with(SpamGuardConfig::default);
    guard.channels_max.get_or_insert(DEFAULT_CHANNELS_MAX);
    guard.mute_duration_secs.get_or_insert(DEFAULT_MUTE_DURATION_SECS);
    guard.sweep_interval_secs.get_or_insert(DEFAULT_SWEEP_INTERVAL_SECS);
    guard
        .ignore_bot_authors
        .get_or_insert(sidebot_guard::GuardConfig::default().ignore_bot_authors);
    config
}

fn apply_logging_defaults(mut config: SideBotConfig) -> SideBotConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn fills_guard_defaults() {
        let config = apply_all_defaults_with(SideBotConfig::default(), &HashMap::new());
        let guard = config.spam_guard.unwrap();
        assert_eq!(guard.channels_max, Some(4));
        assert_eq!(guard.mute_duration_secs, Some(30));
        assert_eq!(guard.sweep_interval_secs, Some(1800));
        assert_eq!(guard.ignore_bot_authors, Some(false));
        assert_eq!(config.logging.unwrap().level.as_deref(), Some("info"));
    }

    #[test]
    fn file_defaults_match_guard_defaults() {
        let config = apply_all_defaults_with(SideBotConfig::default(), &HashMap::new());
        let guard = config.spam_guard.unwrap();
        let expected = sidebot_guard::GuardConfig::default();
        assert_eq!(guard.channels_max, Some(expected.channels_max));
        assert_eq!(guard.mute_duration_secs, Some(expected.mute_duration.as_secs()));
        assert_eq!(guard.sweep_interval_secs, Some(expected.sweep_interval.as_secs()));
        assert_eq!(guard.ignore_bot_authors, Some(expected.ignore_bot_authors));
    }

    #[test]
    fn keeps_explicit_values() {
        let config = SideBotConfig {
            spam_guard: Some(SpamGuardConfig {
                channels_max: Some(6),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = apply_all_defaults_with(config, &HashMap::new());
        let guard = config.spam_guard.unwrap();
        assert_eq!(guard.channels_max, Some(6));
        assert_eq!(guard.mute_duration_secs, Some(30));
    }

    #[test]
    fn token_falls_back_to_env_in_order() {
        let config = apply_all_defaults_with(
            SideBotConfig::default(),
            &env(&[("DTOKEN", "legacy"), ("DISCORD_TOKEN", "current")]),
        );
        assert_eq!(config.discord.unwrap().token.as_deref(), Some("current"));

        let config =
            apply_all_defaults_with(SideBotConfig::default(), &env(&[("DTOKEN", "legacy")]));
        assert_eq!(config.discord.unwrap().token.as_deref(), Some("legacy"));
    }

    #[test]
    fn configured_token_wins_over_env() {
        let config = SideBotConfig {
            discord: Some(DiscordConfig {
                token: Some("from-file".into()),
            }),
            ..Default::default()
        };
        let config = apply_all_defaults_with(config, &env(&[("DISCORD_TOKEN", "from-env")]));
        assert_eq!(config.discord.unwrap().token.as_deref(), Some("from-file"));
    }
}
