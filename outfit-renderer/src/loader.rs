//! Catalog loading through an asset source.

use std::collections::HashMap;

use futures::future::join_all;
use outfit_core::{Catalog, CatalogBuild, CatalogIndex, CoreError};

use crate::asset::AssetSource;
use crate::error::{RenderError, RenderResult};

/// Default path of the catalog index document.
pub const DEFAULT_INDEX_PATH: &str = "index.json";

async fn fetch_text(source: &dyn AssetSource, path: &str) -> RenderResult<String> {
    let bytes = source.fetch(path).await?;
    String::from_utf8(bytes).map_err(|e| RenderError::asset(path, e))
}

/// Load a catalog: the index, an optional separate layers document, and
/// every per-part items document, fetched concurrently.
///
/// # Errors
///
/// Returns an error if any document cannot be fetched or parsed, or the
/// assembled catalog is invalid.
pub async fn load_catalog(
    source: &dyn AssetSource,
    index_path: &str,
    layers_path: Option<&str>,
) -> RenderResult<CatalogBuild> {
    let mut index = CatalogIndex::from_json(&fetch_text(source, index_path).await?)?;
    if let Some(layers_path) = layers_path {
        index.apply_layer_document(&fetch_text(source, layers_path).await?)?;
    }

    let paths = index.item_documents();
    let fetched = join_all(paths.iter().map(|path| fetch_text(source, path))).await;
    let mut documents = HashMap::with_capacity(paths.len());
    for (path, text) in paths.into_iter().zip(fetched) {
        let value: serde_json::Value = serde_json::from_str(&text?).map_err(CoreError::from)?;
        documents.insert(path, value);
    }

    let build = Catalog::build(index, &documents)?;
    tracing::info!(
        "Loaded catalog: {} parts, {} layers, {} outfits, {} issues",
        build.catalog.parts().len(),
        build.catalog.layers().len(),
        build.catalog.outfits().len(),
        build.issues.len()
    );
    Ok(build)
}
