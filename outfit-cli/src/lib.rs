//! # Outfit Composer CLI
//!
//! Command-line host for the outfit composer. Loads a catalog from an
//! asset directory, builds a selection (outfit preset, random, or a saved
//! fit), renders it to PNG and keeps an undo/redo history of committed
//! fits on disk.
//!
//! ## Usage
//!
//! ```bash
//! outfit-composer --assets ./wardrobe render --outfit summer --out fit.png --commit
//! outfit-composer --assets ./wardrobe render --random --seed 7 --data-uri
//! outfit-composer --assets ./wardrobe undo --out previous.png
//! outfit-composer --assets ./wardrobe list parts
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `AppConfig` - Asset, catalog, history and output settings
//! - `ComposerApp` - Loaded catalog, selection store and compositor

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

mod app;

pub use app::ComposerApp;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use outfit_renderer::{ComposerConfig, DEFAULT_INDEX_PATH};

/// Default directory for history checkpoints.
pub const DEFAULT_HISTORY_DIR: &str = ".outfit-history";

/// Command-line arguments for outfit-composer.
#[derive(Debug, Clone, Parser)]
#[command(name = "outfit-composer")]
#[command(about = "Compose layered outfit images from a part catalog")]
#[command(version)]
pub struct CliArgs {
    /// Directory holding the catalog and part images
    #[arg(long, env = "OUTFIT_ASSETS", default_value = ".")]
    pub assets: PathBuf,

    /// Catalog index document, relative to the asset directory
    #[arg(long, env = "OUTFIT_CATALOG", default_value = DEFAULT_INDEX_PATH)]
    pub catalog: String,

    /// Separate layer-order document, relative to the asset directory
    #[arg(long, env = "OUTFIT_LAYERS")]
    pub layers: Option<String>,

    /// Directory for undo/redo checkpoints
    #[arg(long, env = "OUTFIT_HISTORY_DIR", default_value = DEFAULT_HISTORY_DIR)]
    pub history_dir: PathBuf,

    /// Output width in pixels
    #[arg(long, default_value = "800")]
    pub width: u32,

    /// Output height in pixels
    #[arg(long, default_value = "800")]
    pub height: u32,

    /// Action to perform
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level actions.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Build a selection and render it
    Render(RenderArgs),
    /// List catalog contents
    List {
        /// What to list
        #[arg(value_enum)]
        target: ListTarget,
    },
    /// Step back to the previous committed fit
    Undo(OutputArgs),
    /// Step forward to the next committed fit
    Redo(OutputArgs),
    /// Print the active committed fit
    Show,
}

/// Selection and output options for `render`.
#[derive(Debug, Clone, Default, Args)]
pub struct RenderArgs {
    /// Start from an outfit preset
    #[arg(long, conflicts_with_all = ["random", "fit"])]
    pub outfit: Option<String>,

    /// Start from a random selection
    #[arg(long, conflicts_with = "fit")]
    pub random: bool,

    /// Seed for --random
    #[arg(long, requires = "random")]
    pub seed: Option<u64>,

    /// Start from a saved fit JSON file
    #[arg(long)]
    pub fit: Option<PathBuf>,

    /// Record the resulting fit in the history
    #[arg(long)]
    pub commit: bool,

    /// Output options
    #[command(flatten)]
    pub output: OutputArgs,
}

/// Where rendered images go.
#[derive(Debug, Clone, Default, Args)]
pub struct OutputArgs {
    /// Write the rendered PNG to this path
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Print the rendered PNG as a data URI
    #[arg(long)]
    pub data_uri: bool,
}

impl OutputArgs {
    /// Whether any image output was requested.
    #[must_use]
    pub fn wants_image(&self) -> bool {
        self.out.is_some() || self.data_uri
    }
}

/// Catalog listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListTarget {
    /// Parts with their layer and item counts
    Parts,
    /// Outfit presets
    Outfits,
    /// Layer slots bottom to top
    Layers,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Asset root and output size.
    pub composer: ComposerConfig,
    /// Catalog index path relative to the asset root.
    pub catalog: String,
    /// Layer-order document relative to the asset root.
    pub layers: Option<String>,
    /// Directory for history checkpoints.
    pub history_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            composer: ComposerConfig::default(),
            catalog: DEFAULT_INDEX_PATH.to_string(),
            layers: None,
            history_dir: PathBuf::from(DEFAULT_HISTORY_DIR),
        }
    }
}

impl From<&CliArgs> for AppConfig {
    fn from(args: &CliArgs) -> Self {
        Self {
            composer: ComposerConfig::new(args.assets.clone()).with_size(args.width, args.height),
            catalog: args.catalog.clone(),
            layers: args.layers.clone(),
            history_dir: args.history_dir.clone(),
        }
    }
}
