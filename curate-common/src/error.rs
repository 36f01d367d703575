//! Common error types for ichor-curate

use thiserror::Error;

/// Common result type for curation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the curation library and service
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error (wraps walkdir::Error)
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML document could not be parsed
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML document could not be rendered
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Solution detail folder or params file missing or unreadable
    #[error("Solution metadata not found for sample '{sample}' ({solution}): {reason}")]
    MetadataNotFound {
        sample: String,
        solution: String,
        reason: String,
    },

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// True for errors that mean "the thing asked for is not there"
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) | Error::MetadataNotFound { .. } => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            Error::Walk(e) => e
                .io_error()
                .is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound),
            _ => false,
        }
    }
}
