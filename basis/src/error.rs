use basis_data::error::DataError;
use basis_execution::error::UnindexedClientError;
use thiserror::Error;

/// All top-level errors generated by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("MarketData: {0}")]
    Data(#[from] DataError),

    #[error("Execution on {venue}: {error}")]
    Execution {
        venue: basis_instrument::exchange::ExchangeId,
        error: UnindexedClientError,
    },

    #[error("deadline exceeded during {operation}")]
    Timeout { operation: &'static str },

    #[error("ArbitrageDetection: {0}")]
    Detection(String),

    #[error("insufficient position: {0}")]
    InsufficientPosition(String),

    #[error("Persistence: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Fatal configuration errors. Surface with a non-zero exit, never retried.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ConfigError {
    #[error("missing required key: {0}")]
    MissingKey(&'static str),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("credentials absent for enabled venue: {0}")]
    MissingCredentials(basis_instrument::exchange::ExchangeId),

    #[error("environment variable not set and no default provided: {0}")]
    MissingEnvVar(String),

    #[error("failed to read config file: {0}")]
    Io(String),

    #[error("failed to parse config file: {0}")]
    Parse(String),
}

/// Errors generated by the [`ContextRepository`](crate::persistence::ContextRepository).
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("unsupported context schema version: {0}")]
    UnsupportedSchema(u32),
}
