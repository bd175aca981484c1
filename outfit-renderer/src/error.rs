//! Renderer error types.

use outfit_core::CoreError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while loading assets or producing images.
#[derive(Debug, Error)]
pub enum RenderError {
    /// An asset could not be fetched.
    #[error("Failed to load asset {path}: {reason}")]
    Asset {
        /// Asset path relative to the asset root.
        path: String,
        /// Underlying failure.
        reason: String,
    },

    /// Image bytes could not be decoded.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Image could not be encoded.
    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// Invalid renderer configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Catalog or selection error from the core crate.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl RenderError {
    /// Build a [`RenderError::Asset`] for a path.
    #[must_use]
    pub fn asset(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::Asset {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
