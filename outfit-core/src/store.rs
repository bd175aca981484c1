//! Selection store with change notification.
//!
//! [`SelectionStore`] owns the current [`SelectionState`] and is the only
//! place it changes. Every operation that alters the selection notifies the
//! registered subscribers synchronously, once, after the change is complete.
//! A render scheduler subscribes here and starts a render per notification.

use std::fmt;
use std::sync::Arc;

use rand::Rng;

use crate::catalog::{Catalog, PartId};
use crate::fit::Fit;
use crate::movement::{Direction, Movement};
use crate::outfit::select_outfit;
use crate::randomizer::randomize;
use crate::resolver::{resolve, Resolution};
use crate::selection::{Position, SelectionState};

/// Identifier returned by [`SelectionStore::subscribe`].
pub type SubscriptionId = u64;

type Subscriber = Box<dyn Fn(&SelectionState) + Send + Sync>;

/// Owner of the current selection.
pub struct SelectionStore {
    catalog: Arc<Catalog>,
    state: SelectionState,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: SubscriptionId,
}

impl fmt::Debug for SelectionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionStore")
            .field("state", &self.state)
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl SelectionStore {
    /// Create a store holding the initial selection.
    ///
    /// The initial selection is the first outfit when the catalog has any,
    /// otherwise the defaults, resolved either way.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let initial = match catalog.outfits().first() {
            Some(outfit) => select_outfit(&catalog, &outfit.uid),
            None => SelectionState::defaults(&catalog),
        };
        let state = resolve(&catalog, &initial).state;
        Self {
            catalog,
            state,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// The catalog the selection refers to.
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// The current selection.
    #[must_use]
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Register a change listener.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: Fn(&SelectionState) + Send + Sync + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(listener)));
        id
    }

    /// Remove a change listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    fn notify(&self) {
        for (_, listener) in &self.subscribers {
            listener(&self.state);
        }
    }

    /// Apply `f` to the selection and notify if it reported a change.
    fn update<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&Catalog, &mut SelectionState) -> bool,
    {
        let changed = f(&self.catalog, &mut self.state);
        if changed {
            self.notify();
        }
        changed
    }

    /// Replace the selection wholesale, keeping the active part.
    fn replace(&mut self, mut next: SelectionState) -> bool {
        next.active_part = self.state.active_part;
        if next == self.state {
            return false;
        }
        self.state = next;
        self.notify();
        true
    }

    /// Return every part to its default selection.
    pub fn reset(&mut self) -> bool {
        let defaults = SelectionState::defaults(&self.catalog);
        self.replace(defaults)
    }

    /// Make a part the target of movement and color commands.
    pub fn set_active_part(&mut self, part: PartId) -> bool {
        self.update(|_, state| state.set_active_part(part))
    }

    /// Select an item (or none) for a part.
    pub fn select_item(&mut self, part: PartId, item: Option<usize>) -> bool {
        self.update(|catalog, state| state.select_item(catalog, part, item))
    }

    /// Select a color for a part and every part linked to it.
    ///
    /// All affected parts change before a single notification.
    pub fn select_color(&mut self, part: PartId, color: usize) -> bool {
        self.update(|catalog, state| {
            let Some(source) = catalog.part(part) else {
                return false;
            };
            let Some(choice) = source.colors.get(color) else {
                tracing::debug!("Color {color} out of range for part '{}'", source.name);
                return false;
            };
            let token = choice.token(source.color_mode);
            let mut changed = state.set_color(part, token.clone());
            for linked in &source.color_linked {
                match catalog.part_by_name(linked) {
                    Some(target) => changed |= state.set_color(target, token.clone()),
                    None => tracing::warn!("Color link to unknown part '{linked}'"),
                }
            }
            changed
        })
    }

    /// Whether the active part can step in a direction.
    #[must_use]
    pub fn can_move_active(&self, direction: Direction) -> bool {
        self.active_movement()
            .is_some_and(|(movement, position)| movement.can_move(position, direction))
    }

    fn active_movement(&self) -> Option<(Movement, Position)> {
        let id = self.state.active_part()?;
        let movement = self.catalog.part(id)?.movement?;
        Some((movement, self.state.position(id)))
    }

    /// Step the active part. Refused steps leave the selection untouched.
    pub fn move_active(&mut self, direction: Direction) -> bool {
        let Some(id) = self.state.active_part() else {
            return false;
        };
        let Some(next) = self
            .active_movement()
            .and_then(|(movement, position)| movement.step(position, direction))
        else {
            return false;
        };
        self.update(|catalog, state| state.set_position(catalog, id, next))
    }

    /// Move the active part back to the origin.
    pub fn reset_active_position(&mut self) -> bool {
        let Some(id) = self.state.active_part() else {
            return false;
        };
        self.update(|catalog, state| state.set_position(catalog, id, Position::default()))
    }

    /// Replace the selection with a random one.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let next = randomize(&self.catalog, rng);
        self.replace(next)
    }

    /// Load an outfit preset.
    pub fn select_outfit(&mut self, uid: &str) -> bool {
        let next = select_outfit(&self.catalog, uid);
        self.replace(next)
    }

    /// Restore selections from a fit.
    pub fn apply_fit(&mut self, fit: &Fit) -> bool {
        self.update(|catalog, state| state.apply_fit(catalog, fit))
    }

    /// The current selection as a fit.
    #[must_use]
    pub fn current_fit(&self) -> Fit {
        self.state.to_fit(&self.catalog)
    }

    /// Resolve requirements into the stored selection.
    pub fn resolve(&mut self) -> Resolution {
        let resolution = resolve(&self.catalog, &self.state);
        if resolution.state != self.state {
            self.state = resolution.state.clone();
            self.notify();
        }
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn catalog() -> Arc<Catalog> {
        Arc::new(
            Catalog::from_json(
                r#"{
                    "layers": ["body", "shirt", "pants", "hat"],
                    "parts": [
                        {"folder": "body", "items": ["base"]},
                        {"folder": "shirt", "colors": ["red", "navy"], "colorLinked": ["pants"],
                         "items": ["tee", "polo"]},
                        {"folder": "pants", "colors": ["red", "navy"], "items": ["jeans"]},
                        {"folder": "hat", "noneAllowed": true,
                         "movement": {"y": {"min": -20, "max": 20}}, "items": ["cap"]}
                    ]
                }"#,
            )
            .expect("catalog builds")
            .catalog,
        )
    }

    fn counted(store: &mut SelectionStore) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        store.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    #[test]
    fn test_initial_state() {
        let store = SelectionStore::new(catalog());
        assert_eq!(store.state().item(1), Some(0));
        assert_eq!(store.state().active_part(), Some(1));
    }

    #[test]
    fn test_notifies_once_per_change() {
        let mut store = SelectionStore::new(catalog());
        let count = counted(&mut store);
        assert!(store.select_item(1, Some(1)));
        assert!(!store.select_item(1, Some(1)));
        assert!(!store.select_item(0, None));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_linked_color_is_atomic() {
        let mut store = SelectionStore::new(catalog());
        let count = counted(&mut store);
        assert!(store.select_color(1, 1));
        assert_eq!(store.state().color(1), "navy");
        assert_eq!(store.state().color(2), "navy");
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!store.select_color(1, 5));
    }

    #[test]
    fn test_move_active_respects_bounds() {
        let mut store = SelectionStore::new(catalog());
        assert!(!store.move_active(Direction::Up));

        store.set_active_part(3);
        store.select_item(3, Some(0));
        assert!(!store.can_move_active(Direction::Left));
        assert!(store.move_active(Direction::Up));
        assert!(store.move_active(Direction::Up));
        assert!(!store.move_active(Direction::Up));
        assert_eq!(store.state().position(3), Position::new(0.0, -20.0));

        assert!(store.reset_active_position());
        assert_eq!(store.state().position(3), Position::default());
    }

    #[test]
    fn test_unsubscribe() {
        let mut store = SelectionStore::new(catalog());
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let id = store.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.select_item(1, Some(1));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_randomize_keeps_active_part() {
        let mut store = SelectionStore::new(catalog());
        store.set_active_part(3);
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..10 {
            store.randomize(&mut rng);
            assert_eq!(store.state().active_part(), Some(3));
        }
    }

    #[test]
    fn test_fit_round_trip_through_store() {
        let mut store = SelectionStore::new(catalog());
        store.select_item(1, Some(1));
        store.select_color(1, 1);
        let fit = store.current_fit();

        store.reset();
        assert_eq!(store.state().item(1), Some(0));
        assert!(store.apply_fit(&fit));
        assert_eq!(store.current_fit(), fit);
    }
}
