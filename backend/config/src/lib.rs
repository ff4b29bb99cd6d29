//! `sidebot-config`: SideBot runtime configuration.
//!
//! Provides:
//! - Typed config schema (Discord connection, spam guard policy, logging)
//! - YAML loading from the config directory
//! - `${ENV_VAR}` substitution
//! - Default value application, including token fallback from the environment
//! - Validation and redaction for `check-config`

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

// Re-export most-used types at crate root.
pub use schema::{DiscordConfig, LoggingConfig, SideBotConfig, SpamGuardConfig};
pub use io::{config_dir, config_file_path, load_config_value};
pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use defaults::{apply_all_defaults, apply_all_defaults_with};
pub use redact::redact;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use std::path::Path;

/// Load, substitute env vars, and apply defaults to a config file.
///
/// Validation is left to the caller so it can be reported after logging is up.
pub async fn load_and_prepare(path: &Path) -> Result<SideBotConfig> {
    let value = load_config_value(path).await?;

    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;

    let config: SideBotConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    Ok(apply_all_defaults(config))
}
