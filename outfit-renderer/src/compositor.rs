//! Layer compositor.
//!
//! Rendering resolves the selection, plans the draws, then loads every
//! distinct image concurrently. Only after all loads have settled are the
//! images drawn into per-layer surfaces, and those surfaces are composited
//! bottom to top into the output image. A failed load blanks its whole
//! layer and is reported; the other layers still render.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use image::RgbaImage;
use outfit_core::{plan, resolve, Catalog, Resolution, SelectionState, SkippedDraw};

use crate::asset::AssetSource;
use crate::error::RenderResult;
use crate::export;
use crate::image::decode_image;
use crate::image_cache::ImageCache;
use crate::surface::Surface;
use crate::ComposerConfig;

/// A layer left blank because one of its images failed to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerFailure {
    /// Slot index.
    pub layer: usize,
    /// Layer key.
    pub key: String,
    /// Image that failed.
    pub path: String,
    /// Failure description.
    pub reason: String,
}

/// Result of one render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// The composited image.
    pub image: RgbaImage,
    /// Requirement resolution applied before drawing.
    pub resolution: Resolution,
    /// Draws dropped for unknown layer keys.
    pub skipped: Vec<SkippedDraw>,
    /// Layers blanked by load failures.
    pub failures: Vec<LayerFailure>,
}

impl RenderOutput {
    /// Whether every requirement resolved and every layer drew.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.resolution.is_clean() && self.skipped.is_empty() && self.failures.is_empty()
    }

    /// Encode the image as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_png(&self) -> RenderResult<Vec<u8>> {
        export::encode_png(&self.image)
    }

    /// Encode the image as a PNG data URI.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn to_data_uri(&self) -> RenderResult<String> {
        export::to_data_uri(&self.image)
    }
}

/// Renders selections to images.
pub struct Compositor {
    source: Arc<dyn AssetSource>,
    cache: ImageCache,
    config: ComposerConfig,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Compositor {
    /// Create a compositor over an asset source.
    #[must_use]
    pub fn new(source: Arc<dyn AssetSource>, config: ComposerConfig) -> Self {
        Self {
            source,
            cache: ImageCache::new(),
            config,
        }
    }

    /// The image cache.
    #[must_use]
    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Output configuration.
    #[must_use]
    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Load an image through the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the asset cannot be fetched or decoded.
    pub async fn load_image(&self, path: &str) -> RenderResult<Arc<RgbaImage>> {
        if let Some(image) = self.cache.get(path) {
            return Ok(image);
        }
        let bytes = self.source.fetch(path).await?;
        let image = decode_image(&bytes)?;
        Ok(self.cache.insert(path.to_string(), image))
    }

    /// Render a selection.
    pub async fn render(&self, catalog: &Catalog, selection: &SelectionState) -> RenderOutput {
        let resolution = resolve(catalog, selection);
        let stack = plan(catalog, &resolution.state);

        let loads = stack.unique_paths().into_iter().map(|path| async move {
            let result = self.load_image(path).await;
            (path, result)
        });
        let loaded: HashMap<&str, RenderResult<Arc<RgbaImage>>> =
            join_all(loads).await.into_iter().collect();

        let (width, height) = (self.config.width, self.config.height);
        let mut layers: Vec<Option<Surface>> = vec![None; stack.layer_count];
        let mut failed = vec![false; stack.layer_count];
        let mut failures = Vec::new();

        for draw in &stack.draws {
            if failed[draw.layer] {
                continue;
            }
            match loaded.get(draw.path.as_str()) {
                Some(Ok(image)) => layers[draw.layer]
                    .get_or_insert_with(|| Surface::new(width, height))
                    .draw(image, draw.offset, draw.tint),
                Some(Err(e)) => {
                    let key = catalog
                        .layers()
                        .get(draw.layer)
                        .map(|l| l.key.clone())
                        .unwrap_or_default();
                    tracing::warn!("Layer '{key}' left blank: {e}");
                    failed[draw.layer] = true;
                    layers[draw.layer] = None;
                    failures.push(LayerFailure {
                        layer: draw.layer,
                        key,
                        path: draw.path.clone(),
                        reason: e.to_string(),
                    });
                }
                None => {}
            }
        }

        let mut working = Surface::new(width, height);
        for layer in layers.iter().flatten() {
            working.composite(layer);
        }
        tracing::debug!(
            "Rendered {} draws over {} layers ({} failed)",
            stack.draws.len(),
            stack.layer_count,
            failures.len()
        );

        RenderOutput {
            image: working.into_image(),
            resolution,
            skipped: stack.skipped,
            failures,
        }
    }
}
