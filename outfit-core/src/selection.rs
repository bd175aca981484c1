//! Per-part selection state.
//!
//! A [`SelectionState`] holds, for every part of a catalog, the selected
//! item (or none), the part's offset and its color token. It also records
//! which part is active for movement and color commands. Mutators take the
//! catalog so they can enforce the same rules everywhere: indices must
//! exist, "none" must be allowed, positions stay inside movement bounds and
//! a part's position resets whenever its item changes.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, PartId, NONE_ITEM};
use crate::error::{CoreError, CoreResult};
use crate::fit::{Fit, FitEntry};

/// Pixel offset of a part's images.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal offset, positive to the right.
    pub x: f64,
    /// Vertical offset, positive downward.
    pub y: f64,
}

impl Position {
    /// Create a position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Selection of a single part.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PartSelection {
    /// Selected item index, `None` for no item.
    pub item: Option<usize>,
    /// Offset applied to every image the part draws.
    pub position: Position,
    /// Color token: a variant name or a `#RRGGBBAA` value.
    pub color: String,
}

/// Selection of every part in a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    pub(crate) parts: Vec<PartSelection>,
    pub(crate) active_part: Option<PartId>,
}

impl SelectionState {
    /// Default selection: the first item of each required part, no item
    /// for parts that allow none, rest positions and first colors.
    #[must_use]
    pub fn defaults(catalog: &Catalog) -> Self {
        let parts = catalog
            .parts()
            .iter()
            .map(|part| PartSelection {
                item: part.default_item(),
                position: part.rest_position(),
                color: part.default_color(),
            })
            .collect();
        Self {
            parts,
            active_part: catalog.first_listed_part(),
        }
    }

    /// Selections of all parts, indexed by [`PartId`].
    #[must_use]
    pub fn parts(&self) -> &[PartSelection] {
        &self.parts
    }

    /// Selection of one part.
    #[must_use]
    pub fn part(&self, id: PartId) -> Option<&PartSelection> {
        self.parts.get(id)
    }

    /// Selected item of a part.
    #[must_use]
    pub fn item(&self, id: PartId) -> Option<usize> {
        self.parts.get(id).and_then(|p| p.item)
    }

    /// Position of a part, origin for unknown parts.
    #[must_use]
    pub fn position(&self, id: PartId) -> Position {
        self.parts.get(id).map(|p| p.position).unwrap_or_default()
    }

    /// Color token of a part, empty for unknown parts.
    #[must_use]
    pub fn color(&self, id: PartId) -> &str {
        self.parts.get(id).map_or("", |p| p.color.as_str())
    }

    /// Part targeted by movement and color commands.
    #[must_use]
    pub const fn active_part(&self) -> Option<PartId> {
        self.active_part
    }

    /// Make a part active.
    ///
    /// Returns `false` if the part does not exist or was already active.
    pub fn set_active_part(&mut self, id: PartId) -> bool {
        if id >= self.parts.len() || self.active_part == Some(id) {
            return false;
        }
        self.active_part = Some(id);
        true
    }

    /// Select an item for a part, resetting its position on change.
    ///
    /// Returns `false` when nothing changed or the choice is illegal: an
    /// out-of-range index, or "none" for a part that requires an item.
    pub fn select_item(&mut self, catalog: &Catalog, id: PartId, item: Option<usize>) -> bool {
        let Some(part) = catalog.part(id) else {
            return false;
        };
        let legal = match item {
            Some(index) => index < part.items.len(),
            None => part.none_allowed,
        };
        if !legal {
            tracing::debug!("Rejected item {item:?} for part '{}'", part.name);
            return false;
        }
        let Some(selection) = self.parts.get_mut(id) else {
            return false;
        };
        if selection.item == item {
            return false;
        }
        selection.item = item;
        selection.position = part.rest_position();
        true
    }

    /// Move a part, clamped into its movement bounds.
    ///
    /// Returns `false` for unknown parts or when the clamped position is
    /// unchanged.
    pub fn set_position(&mut self, catalog: &Catalog, id: PartId, position: Position) -> bool {
        let Some(part) = catalog.part(id) else {
            return false;
        };
        let clamped = part.movement.map_or(position, |m| m.clamp(position));
        let Some(selection) = self.parts.get_mut(id) else {
            return false;
        };
        if selection.position == clamped {
            return false;
        }
        selection.position = clamped;
        true
    }

    /// Set a part's color token. Returns `false` if unchanged.
    pub fn set_color(&mut self, id: PartId, token: impl Into<String>) -> bool {
        let token = token.into();
        match self.parts.get_mut(id) {
            Some(selection) if selection.color != token => {
                selection.color = token;
                true
            }
            _ => false,
        }
    }

    /// Serialize to a fit keyed by layer key.
    #[must_use]
    pub fn to_fit(&self, catalog: &Catalog) -> Fit {
        let mut fit = Fit::new();
        for (part, selection) in catalog.parts().iter().zip(&self.parts) {
            let item = selection
                .item
                .and_then(|i| part.items.get(i))
                .map_or(NONE_ITEM, |item| item.item.as_str());
            fit.insert(
                part.layer.clone(),
                FitEntry {
                    item: item.to_string(),
                    position: selection.position,
                    color: selection.color.clone(),
                },
            );
        }
        fit
    }

    /// Restore selections from a fit.
    ///
    /// Entries for unknown layers and unknown items are skipped with a
    /// warning; positions are clamped. Parts absent from the fit keep their
    /// current selection. Returns `true` if anything changed.
    pub fn apply_fit(&mut self, catalog: &Catalog, fit: &Fit) -> bool {
        let before = self.clone();
        for (layer, entry) in fit.iter() {
            let Some(id) = catalog.part_by_layer(layer) else {
                tracing::warn!("Fit entry for unknown layer '{layer}' skipped");
                continue;
            };
            let Some(part) = catalog.part(id) else {
                continue;
            };
            let item = if entry.item == NONE_ITEM {
                None
            } else if let Some(index) = part.item_index(&entry.item) {
                Some(index)
            } else {
                tracing::warn!("Fit item '{}' not found in part '{}'", entry.item, part.name);
                continue;
            };
            self.select_item(catalog, id, item);
            self.set_position(catalog, id, entry.position);
            self.set_color(id, entry.color.clone());
        }
        *self != before
    }

    /// Check that every entry of a fit names a known layer and item.
    ///
    /// [`SelectionState::apply_fit`] skips such entries; this is the strict
    /// form for fits supplied by the user.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::PartNotFound`] for an unknown layer key and
    /// [`CoreError::ItemNotFound`] for an unknown item.
    pub fn check_fit(catalog: &Catalog, fit: &Fit) -> CoreResult<()> {
        for (layer, entry) in fit.iter() {
            let part = catalog
                .part_by_layer(layer)
                .and_then(|id| catalog.part(id))
                .ok_or_else(|| CoreError::PartNotFound(layer.to_string()))?;
            if entry.item != NONE_ITEM && part.item_index(&entry.item).is_none() {
                return Err(CoreError::ItemNotFound {
                    part: layer.to_string(),
                    item: entry.item.clone(),
                });
            }
        }
        Ok(())
    }
}
