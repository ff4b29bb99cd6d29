//! Maps the loaded file/env config onto the runtime settings the bot uses.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use sidebot_config::defaults::DEFAULT_LOG_LEVEL;
use sidebot_config::SideBotConfig;
use sidebot_guard::GuardConfig;

/// Logger settings, resolved before anything else so that validation
/// problems are reported through the logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub dir: Option<PathBuf>,
}

impl LogSettings {
    pub fn from_config(config: &SideBotConfig) -> Self {
        let logging = config.logging.as_ref();
        Self {
            level: logging
                .and_then(|l| l.level.clone())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            dir: logging.and_then(|l| l.dir.as_ref()).map(PathBuf::from),
        }
    }
}

/// Everything `run` needs to bring the bot up.
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: String,
    pub guard: GuardConfig,
}

impl Settings {
    pub fn from_config(config: &SideBotConfig) -> Result<Self> {
        let token = config
            .discord
            .as_ref()
            .and_then(|d| d.token.as_deref())
            .map(str::trim)
            .unwrap_or_default();
        if token.is_empty() {
            bail!("No Discord bot token configured (discord.token, DISCORD_TOKEN or DTOKEN)");
        }

        let spam = config.spam_guard.clone().unwrap_or_default();
        let defaults = GuardConfig::default();
        let guard = GuardConfig {
            channels_max: spam.channels_max.unwrap_or(defaults.channels_max),
            mute_duration: spam
                .mute_duration_secs
                .map_or(defaults.mute_duration, Duration::from_secs),
            sweep_interval: spam
                .sweep_interval_secs
                .map_or(defaults.sweep_interval, Duration::from_secs),
            ignore_bot_authors: spam
                .ignore_bot_authors
                .unwrap_or(defaults.ignore_bot_authors),
        };

        Ok(Self {
            token: token.to_string(),
            guard,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidebot_config::{DiscordConfig, LoggingConfig, SpamGuardConfig};

    fn with_token(token: &str) -> SideBotConfig {
        SideBotConfig {
            discord: Some(DiscordConfig {
                token: Some(token.to_string()),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn unset_guard_fields_use_defaults() {
        let settings = Settings::from_config(&with_token("abc")).unwrap();
        assert_eq!(settings.token, "abc");
        assert_eq!(settings.guard, GuardConfig::default());
    }

    #[test]
    fn guard_fields_map_to_durations() {
        let config = SideBotConfig {
            spam_guard: Some(SpamGuardConfig {
                channels_max: Some(3),
                mute_duration_secs: Some(600),
                sweep_interval_secs: Some(60),
                ignore_bot_authors: Some(true),
            }),
            ..with_token("abc")
        };
        let guard = Settings::from_config(&config).unwrap().guard;
        assert_eq!(guard.channels_max, 3);
        assert_eq!(guard.mute_duration, Duration::from_secs(600));
        assert_eq!(guard.sweep_interval, Duration::from_secs(60));
        assert!(guard.ignore_bot_authors);
    }

    #[test]
    fn token_is_trimmed_and_required() {
        assert_eq!(Settings::from_config(&with_token(" abc\n")).unwrap().token, "abc");
        assert!(Settings::from_config(&with_token("   ")).is_err());
        assert!(Settings::from_config(&SideBotConfig::default()).is_err());
    }

    #[test]
    fn log_settings_fall_back_to_info_on_console() {
        let log = LogSettings::from_config(&SideBotConfig::default());
        assert_eq!(log.level, "info");
        assert_eq!(log.dir, None);

        let config = SideBotConfig {
            logging: Some(LoggingConfig {
                level: Some("debug".into()),
                dir: Some("/var/log/sidebot".into()),
            }),
            ..Default::default()
        };
        let log = LogSettings::from_config(&config);
        assert_eq!(log.level, "debug");
        assert_eq!(log.dir, Some(PathBuf::from("/var/log/sidebot")));
    }
}
