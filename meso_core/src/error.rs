//! Error types for the meso_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for meso_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Transport-level HTTP failure (connect, timeout, body decode)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Routine is missing its title or folder reference
    #[error("Invalid routine: {0}")]
    InvalidRoutine(String),

    /// Exercise catalog lookup or validation error
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Program definition error
    #[error("Program error: {0}")]
    Program(String),

    /// Remote service answered with a non-retryable status
    #[error("Remote service returned {status}: {body}")]
    Remote { status: u16, body: String },

    /// Remote service kept answering 429
    #[error("Too many 429 responses; giving up after {attempts} attempts")]
    RateLimitExhausted { attempts: u32 },

    /// Remote body did not have the expected shape
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl Error {
    /// Whether this error only aborts the current remote write.
    ///
    /// Anything else (configuration, invalid routine, local IO) stops the
    /// whole synchronization run.
    pub fn is_write_scoped(&self) -> bool {
        matches!(
            self,
            Error::Http(_)
                | Error::Remote { .. }
                | Error::RateLimitExhausted { .. }
                | Error::UnexpectedResponse(_)
        )
    }
}
