use thiserror::Error;

/// Errors that leave the agent core.
///
/// Only `FatalAbort` is raised by the tick loop itself; the remaining
/// variants come from loading configuration or perception input.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Fatal abort: {0}")]
    FatalAbort(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid terrain: {0}")]
    InvalidTerrain(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    pub fn fatal(reason: impl Into<String>) -> Self {
        AgentError::FatalAbort(reason.into())
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, AgentError::FatalAbort(_))
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
