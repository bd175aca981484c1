//! Integration tests for catalog loading and compositing (outfit-renderer).
//!
//! Builds an asset directory on disk, loads the catalog through the
//! filesystem source and renders selections driven by the store.

use std::path::Path;
use std::sync::{Arc, Mutex};

use outfit_core::{Catalog, SelectionStore};
use outfit_renderer::export::encode_png;
use outfit_renderer::image::{decode_data_uri, solid_color};
use outfit_renderer::{load_catalog, ComposerConfig, Compositor, FsAssetSource, RenderScheduler};

const INDEX: &str = r#"{
    "images": "items/",
    "outfits": [{"uid": "beach"}],
    "parts": [
        {"folder": "body", "items": "items.json"},
        {"folder": "socks", "items": "items.json"},
        {"folder": "hat", "items": "items.json"}
    ]
}"#;

const LAYERS: &str = r#"["body", "socks", "hat"]"#;

fn write(root: &Path, path: &str, bytes: &[u8]) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent).expect("create dirs");
    }
    std::fs::write(full, bytes).expect("write asset");
}

fn write_png(root: &Path, path: &str, width: u32, height: u32, rgba: [u8; 4]) {
    let png = encode_png(&solid_color(width, height, rgba)).expect("fixture png");
    write(root, path, &png);
}

/// Lay out a small wardrobe: a 4x4 body, 4x1 socks on the bottom row and a
/// 2x2 sunhat that requires bare feet.
fn wardrobe(root: &Path) {
    write(root, "index.json", INDEX.as_bytes());
    write(root, "layers.json", LAYERS.as_bytes());
    write(root, "body/items.json", br#"{"items": ["base"]}"#);
    write(
        root,
        "socks/items.json",
        br#"{"noneAllowed": true, "colors": ["white", "black"], "items": ["crew"]}"#,
    );
    write(
        root,
        "hat/items.json",
        br#"{"noneAllowed": true,
            "movement": {"x": {"min": 0, "max": 2}, "y": false},
            "items": [{"item": "sunhat", "outfits": ["beach"],
                       "requires": {"part": "socks", "item": "none"}}]}"#,
    );
    write_png(root, "body/items/base.png", 4, 4, [0, 0, 255, 255]);
    write_png(root, "socks/items/crew_white.png", 4, 4, [255, 255, 255, 255]);
    write_png(root, "socks/items/crew_black.png", 4, 4, [0, 0, 0, 255]);
    write_png(root, "hat/items/sunhat.png", 2, 2, [255, 255, 0, 255]);
}

async fn setup(root: &Path) -> (Arc<Catalog>, Compositor) {
    wardrobe(root);
    let source = Arc::new(FsAssetSource::new(root));
    let build = load_catalog(source.as_ref(), "index.json", Some("layers.json"))
        .await
        .expect("catalog loads");
    assert!(build.issues.is_empty());
    let compositor = Compositor::new(source, ComposerConfig::new(root).with_size(4, 4));
    (Arc::new(build.catalog), compositor)
}

// ==========================================================================
// Rendering through the store
// ==========================================================================

#[tokio::test]
async fn test_outfit_render_applies_requirements() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (catalog, compositor) = setup(dir.path()).await;
    let mut store = SelectionStore::new(Arc::clone(&catalog));
    store.select_item(1, Some(0));
    store.select_outfit("beach");
    assert_eq!(store.state().item(1), None);

    let output = compositor.render(&catalog, store.state()).await;
    assert!(output.is_complete());
    assert_eq!(output.image.get_pixel(0, 0).0, [255, 255, 0, 255]);
    assert_eq!(output.image.get_pixel(3, 3).0, [0, 0, 255, 255]);
}

#[tokio::test]
async fn test_color_and_position_reach_the_image() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (catalog, compositor) = setup(dir.path()).await;
    let mut store = SelectionStore::new(Arc::clone(&catalog));
    store.reset();
    store.select_item(1, Some(0));
    store.select_color(1, 1);

    let output = compositor.render(&catalog, store.state()).await;
    assert_eq!(output.image.get_pixel(1, 1).0, [0, 0, 0, 255]);

    // Sunhat forces socks off in the render, not in the store.
    store.select_item(2, Some(0));
    store.set_active_part(2);
    assert!(store.move_active(outfit_core::Direction::Right));
    let output = compositor.render(&catalog, store.state()).await;
    assert_eq!(store.state().item(1), Some(0));
    assert_eq!(output.resolution.state.item(1), None);
    assert_eq!(output.image.get_pixel(0, 0).0, [0, 0, 255, 255]);
    assert_eq!(output.image.get_pixel(2, 0).0, [255, 255, 0, 255]);
}

#[tokio::test]
async fn test_missing_variant_leaves_layer_blank() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (catalog, compositor) = setup(dir.path()).await;
    std::fs::remove_file(dir.path().join("socks/items/crew_white.png")).expect("remove");

    let mut store = SelectionStore::new(Arc::clone(&catalog));
    store.reset();
    store.select_item(1, Some(0));
    let output = compositor.render(&catalog, store.state()).await;
    assert_eq!(output.failures.len(), 1);
    assert_eq!(output.failures[0].key, "socks");
    assert_eq!(output.image.get_pixel(0, 0).0, [0, 0, 255, 255]);
}

// ==========================================================================
// Scheduling from store notifications
// ==========================================================================

#[tokio::test]
async fn test_store_notifications_drive_scheduler() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (catalog, compositor) = setup(dir.path()).await;
    let scheduler = Arc::new(RenderScheduler::new(
        Arc::new(compositor),
        Arc::clone(&catalog),
    ));

    let handles = Arc::new(Mutex::new(Vec::new()));
    let mut store = SelectionStore::new(Arc::clone(&catalog));
    {
        let scheduler = Arc::clone(&scheduler);
        let handles = Arc::clone(&handles);
        store.subscribe(move |state| {
            let handle = scheduler.schedule(state.clone());
            handles.lock().expect("lock").push(handle);
        });
    }
    store.reset();
    store.select_item(1, Some(0));
    store.select_color(1, 1);

    let pending: Vec<_> = handles.lock().expect("lock").drain(..).collect();
    assert_eq!(pending.len(), 3);
    for handle in pending {
        handle.await.expect("render task");
    }

    let frame = scheduler.output().latest().expect("published frame");
    assert_eq!(frame.generation, 3);
    assert_eq!(frame.image.get_pixel(1, 1).0, [0, 0, 0, 255]);
}

// ==========================================================================
// Export
// ==========================================================================

#[tokio::test]
async fn test_data_uri_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (catalog, compositor) = setup(dir.path()).await;
    let store = SelectionStore::new(Arc::clone(&catalog));
    let output = compositor.render(&catalog, store.state()).await;

    let uri = output.to_data_uri().expect("data uri");
    let decoded = decode_data_uri(&uri).expect("decodes");
    assert_eq!(decoded, output.image);
}
