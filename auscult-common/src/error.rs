//! Common error types for auscult

use thiserror::Error;

/// Common result type for auscult operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across auscult services
#[derive(Error, Debug)]
pub enum Error {
    /// TOML parse error (wraps toml::de::Error)
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
