use thiserror::Error;

/// Top-level error type for platform calls made by the spam guard.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("platform error: {0}")]
    Platform(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GuardError {
    /// Short machine-readable label used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GuardError::PermissionDenied(_) => "permission_denied",
            GuardError::NotFound(_) => "not_found",
            GuardError::Platform(_) => "platform",
            GuardError::InvalidInput(_) => "invalid_input",
            GuardError::Config(_) => "config",
            GuardError::Other(_) => "other",
        }
    }
}
