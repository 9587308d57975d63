//! services/client/src/error.rs
//!
//! Defines the primary error type for the client binary and adapters.

use crate::config::ConfigError;
use campus_forum_core::error::ForumError;

/// The primary error type for the `client` service.
///
/// Port failures reach this type already wrapped in `ForumError`, since every
/// command goes through the forum core.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error returned by the forum core.
    #[error("{0}")]
    Forum(#[from] ForumError),

    /// Represents an error from building the HTTP client.
    #[error("HTTP Error: {0}")]
    Http(#[from] reqwest::Error),
}
