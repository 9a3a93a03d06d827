//! Error types for Secret Santa.

/// Top-level error type for a draw-and-notify run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Draw error: {0}")]
    Draw(#[from] DrawError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("No credential available for sender {sender}")]
    MissingCredential { sender: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid participant input for the draw.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DrawError {
    #[error("At least 2 participants are required, got {count}")]
    TooFewParticipants { count: usize },

    #[error("Duplicate participant name: {name}")]
    DuplicateName { name: String },
}

/// Mail transport errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Transport {transport} unavailable: {reason}")]
    Unavailable { transport: String, reason: String },

    #[error("Transport {transport} could not open a session: {reason}")]
    SessionFailed { transport: String, reason: String },

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Transport {transport} send failed: {reason}")]
    SendFailed { transport: String, reason: String },
}

/// Fatal dispatch errors. Per-recipient failures never surface here.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Fallback transport unusable: {0}")]
    Config(#[from] ConfigError),

    #[error("Fallback session failed: {0}")]
    Session(TransportError),
}

/// Result type alias for Secret Santa.
pub type Result<T> = std::result::Result<T, Error>;
