//! Selection Flow Integration Tests
//!
//! Exercises the catalog, store, resolver and history together:
//! - Requirements forcing selections on other parts
//! - Outfit presets and randomization
//! - Movement bounds through the store
//! - Undo/redo over file-backed checkpoints

use std::collections::HashMap;
use std::sync::Arc;

use outfit_core::{
    plan, resolve, Catalog, CatalogIndex, Direction, FileCheckpointStore, History,
    HistoryState, Position, SelectionStore,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

const CLOSET: &str = r#"{
    "layers": ["body", "socks", "shoes", "top", "hat"],
    "outfits": [{"uid": "casual"}, {"uid": "summer"}],
    "parts": [
        {"folder": "body", "items": ["base"]},
        {"folder": "socks", "noneAllowed": true, "items": [
            {"item": "ankle", "outfits": ["casual"]},
            "knee"
        ]},
        {"folder": "shoes", "colors": ["white", "black"], "items": [
            {"item": "sneaker", "outfits": ["casual"]},
            {"item": "sandal", "outfits": ["summer"], "requires": {"part": "socks", "item": "none"}}
        ]},
        {"folder": "top", "items": [
            {"item": "hoodie", "outfits": ["casual"]},
            {"item": "tank", "outfits": ["summer"]}
        ]},
        {"folder": "hat", "noneAllowed": true,
         "movement": {"x": false, "y": {"min": -20, "max": 20}},
         "items": [
            "cap",
            {"item": "sunhat", "outfits": ["summer"], "requires": {"part": "socks", "item": "none"}}
         ]}
    ]
}"#;

fn closet() -> Arc<Catalog> {
    Arc::new(Catalog::from_json(CLOSET).expect("catalog builds").catalog)
}

// ============================================================================
// Requirements
// ============================================================================

#[test]
fn test_hat_clears_socks() {
    let catalog = closet();
    let mut store = SelectionStore::new(Arc::clone(&catalog));
    store.select_item(1, Some(1));
    store.select_item(4, Some(1));

    let resolution = store.resolve();
    assert!(resolution.is_clean());
    assert_eq!(store.state().item(1), None);
    assert_eq!(store.state().item(4), Some(1));

    let again = resolve(&catalog, store.state());
    assert_eq!(&again.state, store.state());
}

#[test]
fn test_resolved_plan_omits_cleared_part() {
    let catalog = closet();
    let mut store = SelectionStore::new(Arc::clone(&catalog));
    store.select_outfit("summer");
    store.resolve();
    let stack = plan(&catalog, store.state());
    let paths: Vec<&str> = stack.draws.iter().map(|d| d.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["body/items/base.png", "shoes/items/sandal_white.png", "top/items/tank.png", "hat/items/sunhat.png"]
    );
}

// ============================================================================
// Presets and randomization
// ============================================================================

#[test]
fn test_first_outfit_is_initial_state() {
    let store = SelectionStore::new(closet());
    assert_eq!(store.state().item(1), Some(0));
    assert_eq!(store.state().item(2), Some(0));
    assert_eq!(store.state().item(4), None);
}

#[test]
fn test_random_then_resolve_is_stable() {
    let catalog = closet();
    let mut store = SelectionStore::new(Arc::clone(&catalog));
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..50 {
        store.randomize(&mut rng);
        let resolution = store.resolve();
        assert!(resolution.converged);
        assert_eq!(resolve(&catalog, store.state()).state, *store.state());
    }
}

// ============================================================================
// Movement
// ============================================================================

#[test]
fn test_hat_vertical_bounds() {
    let mut store = SelectionStore::new(closet());
    store.set_active_part(4);
    store.select_item(4, Some(0));

    assert!(!store.can_move_active(Direction::Left));
    assert!(!store.can_move_active(Direction::Right));
    while store.move_active(Direction::Up) {}
    assert_eq!(store.state().position(4), Position::new(0.0, -20.0));
    assert!(store.can_move_active(Direction::Down));
    while store.move_active(Direction::Down) {}
    assert_eq!(store.state().position(4), Position::new(0.0, 20.0));
}

// ============================================================================
// History
// ============================================================================

#[test]
fn test_history_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = SelectionStore::new(closet());

    let first = store.current_fit();
    {
        let mut history = History::open(
            FileCheckpointStore::with_data_dir(dir.path()).expect("store opens"),
        )
        .expect("history opens");
        assert!(history.commit(&first).expect("commit first"));
        store.select_outfit("summer");
        store.resolve();
        assert!(history.commit(&store.current_fit()).expect("commit second"));
    }

    let mut history =
        History::open(FileCheckpointStore::with_data_dir(dir.path()).expect("store opens"))
            .expect("history reopens");
    assert_eq!(history.state(), HistoryState::AtHead);
    let restored = history.undo().expect("undo").expect("a fit");
    assert_eq!(restored, first);

    store.apply_fit(&restored);
    assert_eq!(store.current_fit(), first);
}

#[test]
fn test_undo_then_commit_deletes_redo_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut history =
        History::open(FileCheckpointStore::with_data_dir(dir.path()).expect("store opens"))
            .expect("history opens");
    let mut store = SelectionStore::new(closet());

    history.commit(&store.current_fit()).expect("commit a");
    store.select_item(3, Some(1));
    history.commit(&store.current_fit()).expect("commit b");
    history.undo().expect("undo");
    store.select_item(0, Some(0));
    store.select_item(1, None);
    history.commit(&store.current_fit()).expect("commit c");

    assert!(!history.can_redo());
    let files = std::fs::read_dir(dir.path()).expect("read dir").count();
    // index + a + c
    assert_eq!(files, 3);
}

// ============================================================================
// Catalog documents
// ============================================================================

#[test]
fn test_split_documents() {
    let mut index = CatalogIndex::from_json(
        r#"{"images": "items/", "parts": [
            {"folder": "hat", "items": "items.json"},
            {"folder": "body", "items": ["base"]}
        ]}"#,
    )
    .expect("index parses");
    index
        .apply_layer_document(r#"["body", "hat"]"#)
        .expect("layers parse");

    let documents: HashMap<String, serde_json::Value> = index
        .item_documents()
        .into_iter()
        .map(|path| (path, json!({"noneAllowed": true, "items": ["cap"]})))
        .collect();
    let build = Catalog::build(index, &documents).expect("catalog builds");
    assert!(build.issues.is_empty());
    assert_eq!(build.catalog.layers()[0].part, Some(1));
    assert_eq!(
        build.catalog.image_path("hat", "cap", None),
        "hat/items/cap.png"
    );
}
