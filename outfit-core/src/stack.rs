//! Draw planning for the layer stack.
//!
//! [`plan`] turns a resolved selection into the ordered list of image draws
//! the compositor performs. It touches no pixels, so the whole planning
//! step is synchronous and deterministic.

use crate::catalog::{Catalog, PartId};
use crate::color::{parse_hex_token, ColorMode};
use crate::resolver::is_satisfied;
use crate::selection::{Position, SelectionState};

/// One image to draw into a layer slot.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRequest {
    /// Target slot index in [`Catalog::layers`].
    pub layer: usize,
    /// Part the image belongs to.
    pub part: PartId,
    /// Image path relative to the asset root.
    pub path: String,
    /// Offset of the owning part.
    pub offset: Position,
    /// Multiply color for tint-mode parts.
    pub tint: Option<[u8; 4]>,
}

/// A draw that was dropped because its target layer does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDraw {
    /// Part the image belongs to.
    pub part: PartId,
    /// Image path that would have been drawn.
    pub path: String,
    /// Unknown layer key.
    pub layer: String,
}

/// Ordered draws for one render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerStack {
    /// Number of slots, matching [`Catalog::layers`].
    pub layer_count: usize,
    /// Draws in execution order. Draws into the same slot accumulate.
    pub draws: Vec<DrawRequest>,
    /// Draws dropped for unknown layer keys.
    pub skipped: Vec<SkippedDraw>,
}

impl LayerStack {
    /// Distinct image paths in first-use order.
    #[must_use]
    pub fn unique_paths(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.draws
            .iter()
            .map(|draw| draw.path.as_str())
            .filter(|path| seen.insert(*path))
            .collect()
    }
}

/// Plan the draws for a selection.
///
/// The selection is expected to be resolved already. For each owned layer
/// with a selected item, the base image goes to the item's layer override
/// (or the part's own slot) unless the item is hidden, then each layer piece
/// whose condition holds goes to its own slot.
#[must_use]
pub fn plan(catalog: &Catalog, state: &SelectionState) -> LayerStack {
    let mut stack = LayerStack {
        layer_count: catalog.layers().len(),
        ..LayerStack::default()
    };

    for (slot, layer) in catalog.layers().iter().enumerate() {
        let Some(id) = layer.part else {
            continue;
        };
        let (Some(part), Some(index)) = (catalog.part(id), state.item(id)) else {
            continue;
        };
        let Some(item) = part.items.get(index) else {
            continue;
        };

        let token = state.color(id);
        let (suffix, tint) = match part.color_mode {
            ColorMode::Variant if !part.colors.is_empty() && !token.is_empty() => (Some(token), None),
            ColorMode::Tint => (None, parse_hex_token(token)),
            ColorMode::Variant => (None, None),
        };
        let folder = item.folder.as_deref().unwrap_or(&part.folder);
        let offset = state.position(id);
        let mut push = |key: Option<&str>, file: &str| {
            let path = catalog.image_path(folder, file, suffix);
            let target = match key {
                Some(key) => catalog.layer_index(key),
                None => Some(slot),
            };
            match target {
                Some(layer) => stack.draws.push(DrawRequest {
                    layer,
                    part: id,
                    path,
                    offset,
                    tint,
                }),
                None => {
                    let layer = key.unwrap_or_default().to_string();
                    tracing::warn!("Skipping '{path}': layer '{layer}' does not exist");
                    stack.skipped.push(SkippedDraw { part: id, path, layer });
                }
            }
        };

        if !item.hide {
            push(item.layer.as_deref(), &item.item);
        }
        for piece in &item.multilayer {
            if piece
                .requires
                .as_ref()
                .is_some_and(|requirement| !is_satisfied(catalog, state, requirement))
            {
                continue;
            }
            push(Some(&piece.layer), &piece.item);
        }
    }
    stack
}
