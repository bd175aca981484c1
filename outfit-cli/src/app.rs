//! Command handlers.
//!
//! Each handler returns the text to print on stdout. Diagnostics go
//! through tracing.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use outfit_core::{Catalog, FileCheckpointStore, Fit, History, SelectionState, SelectionStore};
use outfit_renderer::{load_catalog, Compositor, FsAssetSource, RenderOutput};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::{AppConfig, Command, ListTarget, OutputArgs, RenderArgs};

/// Loaded catalog, selection store and compositor.
pub struct ComposerApp {
    config: AppConfig,
    store: SelectionStore,
    compositor: Compositor,
}

impl std::fmt::Debug for ComposerApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposerApp")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl ComposerApp {
    /// Load the catalog described by `config`.
    ///
    /// Catalog issues are logged while the catalog is built and do not
    /// stop loading.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the catalog
    /// cannot be read.
    pub async fn load(config: AppConfig) -> Result<Self> {
        config.composer.validate()?;
        let source = Arc::new(FsAssetSource::new(config.composer.asset_root.clone()));
        let build = load_catalog(source.as_ref(), &config.catalog, config.layers.as_deref())
            .await
            .with_context(|| format!("loading catalog '{}'", config.catalog))?;

        let store = SelectionStore::new(Arc::new(build.catalog));
        let compositor = Compositor::new(source, config.composer.clone());
        Ok(Self {
            config,
            store,
            compositor,
        })
    }

    /// The loaded catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        self.store.catalog()
    }

    /// The selection store.
    #[must_use]
    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    /// Run one command and return its stdout text.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(&mut self, command: &Command) -> Result<String> {
        match command {
            Command::Render(args) => self.render(args).await,
            Command::List { target } => Ok(self.list(*target)),
            Command::Undo(output) => self.step(output, false).await,
            Command::Redo(output) => self.step(output, true).await,
            Command::Show => self.show(),
        }
    }

    fn history(&self) -> Result<History<FileCheckpointStore>> {
        let store = FileCheckpointStore::with_data_dir(&self.config.history_dir)
            .with_context(|| format!("opening history in {}", self.config.history_dir.display()))?;
        Ok(History::open(store)?)
    }

    async fn render(&mut self, args: &RenderArgs) -> Result<String> {
        if let Some(uid) = &args.outfit {
            if self.catalog().outfit(uid).is_none() {
                bail!("unknown outfit '{uid}'");
            }
            self.store.select_outfit(uid);
        } else if args.random {
            match args.seed {
                Some(seed) => self.store.randomize(&mut StdRng::seed_from_u64(seed)),
                None => self.store.randomize(&mut rand::rng()),
            };
        } else if let Some(path) = &args.fit {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading fit {}", path.display()))?;
            let fit = Fit::from_json(&json)?;
            SelectionState::check_fit(self.catalog(), &fit)
                .with_context(|| format!("applying fit {}", path.display()))?;
            self.store.reset();
            self.store.apply_fit(&fit);
        }

        let resolution = self.store.resolve();
        if !resolution.converged {
            tracing::warn!(
                "Requirements did not settle after {} passes",
                resolution.passes
            );
        }

        if args.commit {
            let mut history = self.history()?;
            if history.commit(&self.store.current_fit())? {
                tracing::info!("Committed fit, {} undo steps", history.undo_depth());
            }
        }
        self.emit(&args.output).await
    }

    async fn step(&mut self, output: &OutputArgs, forward: bool) -> Result<String> {
        let mut history = self.history()?;
        let fit = if forward { history.redo()? } else { history.undo()? };
        let Some(fit) = fit else {
            let action = if forward { "redo" } else { "undo" };
            tracing::info!("Nothing to {action}");
            return Ok(String::new());
        };
        self.store.reset();
        self.store.apply_fit(&fit);
        self.emit(output).await
    }

    fn show(&self) -> Result<String> {
        let history = self.history()?;
        tracing::info!(
            "History: {:?}, {} undo, {} redo",
            history.state(),
            history.undo_depth(),
            history.redo_depth()
        );
        match history.active_fit()? {
            Some(fit) => Ok(serde_json::to_string_pretty(&fit)?),
            None => Ok(String::new()),
        }
    }

    /// Render the current selection to the requested outputs, or print the
    /// fit when no image output was requested.
    async fn emit(&self, output: &OutputArgs) -> Result<String> {
        if !output.wants_image() {
            return Ok(serde_json::to_string_pretty(&self.store.current_fit())?);
        }
        let rendered = self.compositor.render(self.catalog(), self.store.state()).await;
        report(&rendered);

        let mut text = String::new();
        if let Some(path) = &output.out {
            write_png(path, &rendered.to_png()?)?;
            tracing::info!("Wrote {}", path.display());
        }
        if output.data_uri {
            text.push_str(&rendered.to_data_uri()?);
        }
        Ok(text)
    }

    fn list(&self, target: ListTarget) -> String {
        let catalog = self.catalog();
        let mut text = String::new();
        match target {
            ListTarget::Parts => {
                for (id, part) in catalog.parts().iter().enumerate() {
                    let hidden = if part.is_listed() { "" } else { "\thidden" };
                    let icon = catalog.part_icon_path(id).unwrap_or_default();
                    let _ = writeln!(
                        text,
                        "{id}\t{}\t{}\t{} items\t{icon}{hidden}",
                        part.name,
                        part.layer,
                        part.items.len()
                    );
                }
            }
            ListTarget::Outfits => {
                for outfit in catalog.outfits() {
                    let _ = writeln!(
                        text,
                        "{}\t{}\t{}",
                        outfit.uid,
                        outfit.name.as_deref().unwrap_or(&outfit.uid),
                        Catalog::outfit_icon_path(outfit)
                    );
                }
            }
            ListTarget::Layers => {
                for (index, layer) in catalog.layers().iter().enumerate() {
                    let owner = layer
                        .part
                        .and_then(|id| catalog.part(id))
                        .map_or("-", |part| part.name.as_str());
                    let _ = writeln!(text, "{index}\t{}\t{owner}", layer.key);
                }
            }
        }
        text.truncate(text.trim_end().len());
        text
    }
}

fn report(output: &RenderOutput) {
    for skipped in &output.skipped {
        tracing::warn!(
            "Skipped {} for part {}: unknown layer '{}'",
            skipped.path,
            skipped.part,
            skipped.layer
        );
    }
    for failure in &output.failures {
        tracing::warn!(
            "Layer {} ({}) left blank: {} ({})",
            failure.layer,
            failure.key,
            failure.path,
            failure.reason
        );
    }
}

fn write_png(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))
}
