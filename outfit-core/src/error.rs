//! Error types for outfit composition.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while building catalogs or persisting history.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Catalog document is malformed or incomplete.
    #[error("Invalid catalog: {0}")]
    Catalog(String),

    /// A part could not be located in the catalog.
    #[error("Part not found: {0}")]
    PartNotFound(String),

    /// An item could not be located within a part.
    #[error("Item '{item}' not found in part '{part}'")]
    ItemNotFound {
        /// Layer key or name of the part that was searched.
        part: String,
        /// Base filename of the missing item.
        item: String,
    },

    /// Fit, checkpoint or catalog (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Checkpoint storage rejected an operation.
    #[error("Storage error: {0}")]
    Storage(String),

    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
