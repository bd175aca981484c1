//! # Outfit Core
//!
//! Core outfit composition logic: the catalog model, selection state,
//! requirement resolution, movement constraints, presets, randomization
//! and undo/redo history. Everything here is synchronous and pixel-free;
//! the renderer crate turns a resolved selection into an image.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 outfit-core                 │
//! ├─────────────────────────────────────────────┤
//! │  Catalog          │  Selection Store        │
//! │  - Parts / items  │  - Items, positions     │
//! │  - Layer slots    │  - Colors, active part  │
//! │  - Outfits        │  - Change notification  │
//! ├─────────────────────────────────────────────┤
//! │  Resolver         │  History                │
//! │  - Requirements   │  - Fit checkpoints      │
//! │  - Draw planning  │  - Undo / redo          │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod checkpoint;
pub mod color;
pub mod error;
pub mod fit;
pub mod history;
pub mod movement;
pub mod outfit;
pub mod randomizer;
pub mod resolver;
pub mod selection;
pub mod stack;
pub mod store;

pub use catalog::{
    Catalog, CatalogBuild, CatalogIndex, CatalogIssue, Item, Layer, LayerPiece, Outfit, Part,
    PartId, Requirement, NONE_ITEM,
};
pub use checkpoint::{CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};
pub use color::{parse_hex_token, Color, ColorMode};
pub use error::{CoreError, CoreResult};
pub use fit::{Fit, FitEntry};
pub use history::{History, HistoryState};
pub use movement::{AxisMovement, Direction, Limits, Movement, MOVEMENT_BASE};
pub use outfit::select_outfit;
pub use randomizer::randomize;
pub use resolver::{resolve, Resolution, UnresolvedReason, UnresolvedRequirement};
pub use selection::{PartSelection, Position, SelectionState};
pub use stack::{plan, DrawRequest, LayerStack, SkippedDraw};
pub use store::{SelectionStore, SubscriptionId};

/// Outfit core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
