//! Asset sources.
//!
//! The compositor and catalog loader read every file through
//! [`AssetSource`], addressed by a path relative to an asset root.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{RenderError, RenderResult};

/// Async byte source for catalog documents and images.
#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Fetch the bytes at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Asset`] if the asset cannot be read.
    async fn fetch(&self, path: &str) -> RenderResult<Vec<u8>>;
}

/// Assets read from a directory on disk.
#[derive(Debug, Clone)]
pub struct FsAssetSource {
    root: PathBuf,
}

impl FsAssetSource {
    /// Serve assets below `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The asset root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl AssetSource for FsAssetSource {
    async fn fetch(&self, path: &str) -> RenderResult<Vec<u8>> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(RenderError::asset(path, "path escapes the asset root"));
        }
        tokio::fs::read(self.root.join(relative))
            .await
            .map_err(|e| RenderError::asset(path, e))
    }
}

/// Assets held in memory, keyed by path.
#[derive(Debug, Default)]
pub struct MemoryAssetSource {
    assets: HashMap<String, Vec<u8>>,
    fetches: AtomicUsize,
}

impl MemoryAssetSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an asset.
    pub fn insert(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(path.into(), bytes);
    }

    /// Builder form of [`MemoryAssetSource::insert`].
    #[must_use]
    pub fn with_asset(mut self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// Number of fetches served or refused so far.
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AssetSource for MemoryAssetSource {
    async fn fetch(&self, path: &str) -> RenderResult<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.assets
            .get(path)
            .cloned()
            .ok_or_else(|| RenderError::asset(path, "not found"))
    }
}
