/// Result type of every fallible setup path.
pub type ChoreoResult<T> = Result<T, ChoreoError>;

/// Errors raised while building a stage. Per-frame paths never fail.
#[derive(thiserror::Error, Debug)]
pub enum ChoreoError {
    /// A configuration value is out of range or inconsistent.
    #[error("validation error: {0}")]
    Validation(String),

    /// A configuration source could not be read.
    #[error("config error: {0}")]
    Config(String),

    /// Malformed clip data: bad durations, tracks or duplicate names.
    #[error("animation error: {0}")]
    Animation(String),

    /// JSON that does not match the expected shape.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChoreoError {
    /// Build a [`ChoreoError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ChoreoError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`ChoreoError::Animation`] value.
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`ChoreoError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for ChoreoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
