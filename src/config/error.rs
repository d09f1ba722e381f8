//! Configuration error types.

use super::IdentityError;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),

    #[error("You have to provide a GITHUB_TOKEN")]
    MissingToken,

    #[error("Invalid commit identity")]
    Identity(#[from] IdentityError),
}
