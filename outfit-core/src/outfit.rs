//! Outfit presets.

use crate::catalog::Catalog;
use crate::selection::SelectionState;

/// Selection for an outfit preset.
///
/// Every part starts from its default, then takes the first item tagged
/// with `uid`. Parts with no tagged item keep the default. An unknown uid
/// yields the plain defaults. The result is not resolved.
#[must_use]
pub fn select_outfit(catalog: &Catalog, uid: &str) -> SelectionState {
    let mut state = SelectionState::defaults(catalog);
    if catalog.outfit(uid).is_none() {
        tracing::warn!("Unknown outfit '{uid}', using defaults");
    }
    for (id, part) in catalog.parts().iter().enumerate() {
        if let Some(index) = part
            .items
            .iter()
            .position(|item| item.outfits.iter().any(|tag| tag == uid))
        {
            state.select_item(catalog, id, Some(index));
        }
    }
    state
}
