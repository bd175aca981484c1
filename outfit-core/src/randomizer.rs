//! Random selections.

use rand::Rng;

use crate::catalog::Catalog;
use crate::selection::{PartSelection, SelectionState};

/// Pick a random item and color for every part.
///
/// A part that allows none has `items + 1` equally likely outcomes, "none"
/// being one of them. Parts with no items and no "none" option stay empty.
/// Positions return to each part's rest position and the active part is
/// the first listed one. The result is not resolved.
pub fn randomize<R: Rng + ?Sized>(catalog: &Catalog, rng: &mut R) -> SelectionState {
    let parts = catalog
        .parts()
        .iter()
        .map(|part| {
            let outcomes = part.items.len() + usize::from(part.none_allowed);
            let item = if outcomes == 0 {
                None
            } else {
                let roll = rng.random_range(0..outcomes);
                if part.none_allowed {
                    roll.checked_sub(1)
                } else {
                    Some(roll)
                }
            };
            let color = if part.colors.is_empty() {
                String::new()
            } else {
                part.colors[rng.random_range(0..part.colors.len())].token(part.color_mode)
            };
            PartSelection {
                item,
                position: part.rest_position(),
                color,
            }
        })
        .collect();
    SelectionState {
        parts,
        active_part: catalog.first_listed_part(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn catalog() -> Catalog {
        Catalog::from_json(
            r#"{"parts": [
                {"folder": "body", "items": ["base"]},
                {"folder": "hat", "noneAllowed": true, "colors": ["red", "blue"], "items": ["cap", "beanie"]},
                {"folder": "aura", "noneAllowed": true}
            ]}"#,
        )
        .expect("catalog builds")
        .catalog
    }

    #[test]
    fn test_randomize_is_legal() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let state = randomize(&catalog, &mut rng);
            assert_eq!(state.item(0), Some(0));
            assert!(!state.item(1).is_some_and(|i| i >= 2));
            assert!(["red", "blue"].contains(&state.color(1)));
            assert_eq!(state.item(2), None);
        }
    }

    #[test]
    fn test_randomize_reaches_every_outcome() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = [false; 3];
        for _ in 0..300 {
            let state = randomize(&catalog, &mut rng);
            let slot = state.item(1).map_or(0, |i| i + 1);
            seen[slot] = true;
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn test_same_seed_same_result() {
        let catalog = catalog();
        let a = randomize(&catalog, &mut StdRng::seed_from_u64(3));
        let b = randomize(&catalog, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_random_items_in_range(seed in any::<u64>()) {
                let catalog = catalog();
                let state = randomize(&catalog, &mut StdRng::seed_from_u64(seed));
                for (id, part) in catalog.parts().iter().enumerate() {
                    match state.item(id) {
                        Some(index) => prop_assert!(index < part.items.len()),
                        None => prop_assert!(part.none_allowed),
                    }
                    prop_assert_eq!(state.position(id), part.rest_position());
                }
            }
        }
    }
}
