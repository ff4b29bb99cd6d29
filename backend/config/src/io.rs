//! Config file discovery and loading.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the SideBot config directory.
/// Priority: `SIDEBOT_CONFIG_DIR` env > `~/.sidebot/` > `./.sidebot`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SIDEBOT_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".sidebot"),
        None => PathBuf::from(".sidebot"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Read the YAML config as an untyped JSON value tree, ready for env
/// substitution.
///
/// Returns an empty object if the file doesn't exist (first run, env-only
/// setups).
pub async fn load_config_value(path: &Path) -> Result<Value> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(Value::Object(Default::default()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    if raw.trim().is_empty() {
        debug!(path = %path.display(), "Config file is empty; using defaults");
        return Ok(Value::Object(Default::default()));
    }

    let value: Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(match value {
        // A comments-only document parses as null.
        Value::Null => Value::Object(Default::default()),
        other => other,
    })
}
