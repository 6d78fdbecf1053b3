//! Common error types for the soundscape mixer

use thiserror::Error;

/// Common result type for soundscape operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the soundscape crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
