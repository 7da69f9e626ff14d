//! Error types for scaffold-steward
//!
//! Expected conditions (quota, ownership) are distinct variants from the
//! failures surfaced by the processor, the state service and the store.

/// Main error type for scaffold operations
#[derive(Debug, thiserror::Error)]
pub enum ScaffoldError {
    #[error("Disabled scaffold count {used} reached the allowed limit of {allowed}")]
    QuotaExceeded { used: u64, allowed: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Compile error: {0}")]
    Compile(String),

    #[error("Deploy error: {0}")]
    Deploy(String),

    #[error("Chain operation error: {0}")]
    ChainOperation(String),

    #[error("State tracking error: {0}")]
    Tracking(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScaffoldError {
    /// Whether this is an expected outcome of a request rather than a failure
    /// of one of the collaborating systems
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. } | Self::NotFound(_))
    }
}

impl From<rusqlite::Error> for ScaffoldError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for ScaffoldError {
    fn from(err: serde_json::Error) -> Self {
        Self::Database(format!("JSON error: {}", err))
    }
}

/// Result type alias for scaffold operations
pub type Result<T> = std::result::Result<T, ScaffoldError>;
