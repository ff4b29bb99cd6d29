//! Config validation: field-level checks with user-friendly messages.

use crate::schema::SideBotConfig;
use thiserror::Error;

/// Discord refuses member timeouts longer than 28 days.
pub const MAX_DISCORD_TIMEOUT_SECS: u64 = 28 * 24 * 60 * 60;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate a defaulted config and return all errors and warnings.
pub fn validate(config: &SideBotConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_discord(config, &mut report);
    validate_spam_guard(config, &mut report);
    report
}

fn validate_discord(config: &SideBotConfig, report: &mut ValidationReport) {
    let token = config.discord.as_ref().and_then(|d| d.token.as_deref());
    match token {
        None | Some("") => report.error(
            "discord.token",
            "No bot token configured; set discord.token or DISCORD_TOKEN",
        ),
        Some(t) if t.trim() != t => {
            report.warn("discord.token", "Token has surrounding whitespace")
        }
        Some(_) => {}
    }
}

fn validate_spam_guard(config: &SideBotConfig, report: &mut ValidationReport) {
    let Some(guard) = &config.spam_guard else { return };

    match guard.channels_max {
        Some(0) => report.error("spamGuard.channelsMax", "Must be at least 1"),
        Some(1) => report.warn(
            "spamGuard.channelsMax",
            "A threshold of 1 punishes any user's second message",
        ),
        _ => {}
    }

    match guard.mute_duration_secs {
        Some(0) => report.error("spamGuard.muteDurationSecs", "Must be greater than 0"),
        Some(secs) if secs > MAX_DISCORD_TIMEOUT_SECS => report.warn(
            "spamGuard.muteDurationSecs",
            format!("Discord caps timeouts at {MAX_DISCORD_TIMEOUT_SECS}s; the mute will be rejected"),
        ),
        _ => {}
    }

    if guard.sweep_interval_secs == Some(0) {
        report.error("spamGuard.sweepIntervalSecs", "Must be greater than 0");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::apply_all_defaults_with;
    use crate::schema::{DiscordConfig, SpamGuardConfig};
    use std::collections::HashMap;

    fn with_token(guard: SpamGuardConfig) -> SideBotConfig {
        let config = SideBotConfig {
            discord: Some(DiscordConfig {
                token: Some("token".into()),
            }),
            spam_guard: Some(guard),
            ..Default::default()
        };
        apply_all_defaults_with(config, &HashMap::new())
    }

    #[test]
    fn defaults_with_token_are_valid() {
        let report = validate(&with_token(SpamGuardConfig::default()));
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn missing_token_is_an_error() {
        let config = apply_all_defaults_with(SideBotConfig::default(), &HashMap::new());
        let report = validate(&config);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "discord.token");
    }

    #[test]
    fn zero_values_are_errors() {
        let report = validate(&with_token(SpamGuardConfig {
            channels_max: Some(0),
            mute_duration_secs: Some(0),
            sweep_interval_secs: Some(0),
            ignore_bot_authors: None,
        }));
        let paths: Vec<_> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            [
                "spamGuard.channelsMax",
                "spamGuard.muteDurationSecs",
                "spamGuard.sweepIntervalSecs"
            ]
        );
    }

    #[test]
    fn suspicious_values_are_warnings() {
        let report = validate(&with_token(SpamGuardConfig {
            channels_max: Some(1),
            mute_duration_secs: Some(MAX_DISCORD_TIMEOUT_SECS + 1),
            ..Default::default()
        }));
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 2);
    }
}
