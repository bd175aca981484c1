//! # Outfit Renderer
//!
//! Asynchronous compositor for outfit selections.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  SelectionState  →  resolve  →  plan draws  │
//! ├─────────────────────────────────────────────┤
//! │  fan-out: fetch + decode every image        │
//! │  (AssetSource, ImageCache)                  │
//! ├─────────────────────────────────────────────┤
//! │  fan-in: per-layer surfaces → composite     │
//! │  → OutputSurface / PNG / data URI           │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod asset;
pub mod compositor;
pub mod error;
pub mod export;
pub mod image;
pub mod image_cache;
pub mod loader;
pub mod scheduler;
pub mod surface;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use asset::{AssetSource, FsAssetSource, MemoryAssetSource};
pub use compositor::{Compositor, LayerFailure, RenderOutput};
pub use error::{RenderError, RenderResult};
pub use image_cache::{CacheStats, ImageCache};
pub use loader::{load_catalog, DEFAULT_INDEX_PATH};
pub use scheduler::{Frame, OutputSurface, RenderScheduler};
pub use surface::Surface;

/// Default output width in pixels.
pub const DEFAULT_WIDTH: u32 = 800;

/// Default output height in pixels.
pub const DEFAULT_HEIGHT: u32 = 800;

/// Configuration for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// Directory holding the catalog and images.
    pub asset_root: PathBuf,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl ComposerConfig {
    /// Create a config for an asset root with the default size.
    #[must_use]
    pub fn new(asset_root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: asset_root.into(),
            ..Self::default()
        }
    }

    /// Set the output size.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Config`] if either dimension is zero.
    pub fn validate(&self) -> RenderResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::Config(format!(
                "output size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Outfit renderer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
