//! Render scheduling and the published output surface.
//!
//! Every scheduled render gets a generation number. Renders run
//! concurrently and are never cancelled; when one finishes it publishes to
//! the [`OutputSurface`] only if no newer generation has been published
//! already. A slow render of an old selection therefore never overwrites
//! the result of a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use image::RgbaImage;
use outfit_core::{Catalog, SelectionState};
use tokio::task::JoinHandle;

use crate::compositor::Compositor;

/// A published render.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Generation of the render that produced the frame.
    pub generation: u64,
    /// The composited image.
    pub image: Arc<RgbaImage>,
}

/// The externally visible result of the most recent render.
#[derive(Debug, Default)]
pub struct OutputSurface {
    latest: RwLock<Option<Frame>>,
}

impl OutputSurface {
    /// Create an empty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a frame unless a newer generation is already shown.
    ///
    /// Returns whether the frame was published.
    pub fn publish(&self, generation: u64, image: RgbaImage) -> bool {
        let mut latest = self.latest.write().unwrap_or_else(PoisonError::into_inner);
        if latest.as_ref().is_some_and(|frame| frame.generation >= generation) {
            tracing::debug!("Dropping stale render generation {generation}");
            return false;
        }
        *latest = Some(Frame {
            generation,
            image: Arc::new(image),
        });
        true
    }

    /// The most recently published frame.
    #[must_use]
    pub fn latest(&self) -> Option<Frame> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Generation of the shown frame, zero when nothing is shown.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(0, |frame| frame.generation)
    }
}

/// Starts renders and publishes their results in generation order.
#[derive(Debug)]
pub struct RenderScheduler {
    compositor: Arc<Compositor>,
    catalog: Arc<Catalog>,
    output: Arc<OutputSurface>,
    next_generation: AtomicU64,
}

impl RenderScheduler {
    /// Create a scheduler publishing to a fresh output surface.
    #[must_use]
    pub fn new(compositor: Arc<Compositor>, catalog: Arc<Catalog>) -> Self {
        Self {
            compositor,
            catalog,
            output: Arc::new(OutputSurface::new()),
            next_generation: AtomicU64::new(1),
        }
    }

    /// The output surface renders publish to.
    #[must_use]
    pub fn output(&self) -> Arc<OutputSurface> {
        Arc::clone(&self.output)
    }

    fn claim_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst)
    }

    /// Spawn a render of `selection` on the current tokio runtime.
    ///
    /// The handle resolves to whether the render was published.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn schedule(self: &Arc<Self>, selection: SelectionState) -> JoinHandle<bool> {
        let generation = self.claim_generation();
        let scheduler = Arc::clone(self);
        tokio::spawn(async move { scheduler.run(generation, &selection).await })
    }

    /// Render `selection` on the current task and publish it.
    ///
    /// Returns whether the render was published.
    pub async fn render_now(&self, selection: &SelectionState) -> bool {
        let generation = self.claim_generation();
        self.run(generation, selection).await
    }

    async fn run(&self, generation: u64, selection: &SelectionState) -> bool {
        let output = self.compositor.render(&self.catalog, selection).await;
        self.output.publish(generation, output.image)
    }
}
