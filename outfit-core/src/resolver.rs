//! Requirement resolution.
//!
//! Items can require another part to hold a specific item (or none). The
//! resolver walks the layers bottom to top and forces every requirement of
//! a selected item onto its target part. Forcing can enable new
//! requirements, so passes repeat until a pass changes nothing. The pass
//! count is bounded; if selections still change after the final pass the
//! requirements form a cycle, and the input selection is returned unchanged
//! and flagged as not converged. Either way, resolving the result again
//! yields the same selection.

use crate::catalog::{Catalog, PartId, Requirement};
use crate::selection::SelectionState;

/// Why a requirement could not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// No part owns the required layer key.
    PartNotFound,
    /// The target part has no such item, or cannot be set to none.
    ItemNotFound,
}

/// A requirement that could not be satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedRequirement {
    /// Part whose selected item declared the requirement.
    pub source: PartId,
    /// Base filename of the declaring item.
    pub item: String,
    /// The requirement itself.
    pub requirement: Requirement,
    /// Failure cause.
    pub reason: UnresolvedReason,
}

/// Outcome of resolving a selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The resolved selection.
    pub state: SelectionState,
    /// Requirements that failed in the last pass.
    pub unresolved: Vec<UnresolvedRequirement>,
    /// Passes run.
    pub passes: usize,
    /// Whether the final pass changed nothing.
    pub converged: bool,
}

impl Resolution {
    /// Whether every requirement was applied and the result is stable.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.converged && self.unresolved.is_empty()
    }
}

/// Resolve all requirements of a selection.
#[must_use]
pub fn resolve(catalog: &Catalog, selection: &SelectionState) -> Resolution {
    let mut state = selection.clone();
    let max_passes = catalog.parts().len() + 1;
    let mut unresolved = Vec::new();
    let mut passes = 0;
    let mut converged = false;

    while passes < max_passes {
        passes += 1;
        unresolved.clear();
        if !resolve_pass(catalog, &mut state, &mut unresolved) {
            converged = true;
            break;
        }
    }

    if !converged {
        tracing::warn!(
            "Requirement resolution did not settle after {passes} passes, keeping selection"
        );
        state = selection.clone();
    }
    for failure in &unresolved {
        tracing::error!(
            "Requirement {}={} of item '{}' could not be applied: {:?}",
            failure.requirement.part,
            failure.requirement.item,
            failure.item,
            failure.reason
        );
    }

    Resolution {
        state,
        unresolved,
        passes,
        converged,
    }
}

/// One bottom-to-top pass. Returns whether any selection changed.
fn resolve_pass(
    catalog: &Catalog,
    state: &mut SelectionState,
    unresolved: &mut Vec<UnresolvedRequirement>,
) -> bool {
    let mut changed = false;
    for layer in catalog.layers() {
        let Some(source) = layer.part else {
            continue;
        };
        let Some(item) = state
            .item(source)
            .and_then(|index| catalog.part(source)?.items.get(index))
        else {
            continue;
        };
        let Some(requirement) = &item.requires else {
            continue;
        };

        let fail = |reason| UnresolvedRequirement {
            source,
            item: item.item.clone(),
            requirement: requirement.clone(),
            reason,
        };
        let Some(target) = catalog.part_by_layer(&requirement.part) else {
            unresolved.push(fail(UnresolvedReason::PartNotFound));
            continue;
        };
        let Some(target_part) = catalog.part(target) else {
            unresolved.push(fail(UnresolvedReason::PartNotFound));
            continue;
        };
        let forced = if requirement.wants_none() && target_part.none_allowed {
            None
        } else if let Some(index) = target_part.item_index(&requirement.item) {
            Some(index)
        } else {
            unresolved.push(fail(UnresolvedReason::ItemNotFound));
            continue;
        };
        if state.select_item(catalog, target, forced) {
            tracing::debug!(
                "Item '{}' forced {}={}",
                item.item,
                requirement.part,
                requirement.item
            );
            changed = true;
        }
    }
    changed
}

/// Whether a selection currently satisfies a requirement.
///
/// Used for conditional multilayer pieces, which are skipped rather than
/// forced.
#[must_use]
pub fn is_satisfied(catalog: &Catalog, state: &SelectionState, requirement: &Requirement) -> bool {
    let Some(target) = catalog.part_by_layer(&requirement.part) else {
        return false;
    };
    match state.item(target) {
        None => requirement.wants_none(),
        Some(index) => catalog
            .part(target)
            .and_then(|part| part.items.get(index))
            .is_some_and(|item| item.item == requirement.item),
    }
}
