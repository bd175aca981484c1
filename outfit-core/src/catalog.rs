//! Immutable catalog of parts, layers and outfits.
//!
//! A catalog is assembled from an index document whose parts either carry
//! their items inline or point at a per-part items document under the
//! part's folder. [`CatalogIndex::item_documents`] lists those documents so
//! a loader can fetch them, and [`Catalog::build`] merges everything into a
//! validated [`Catalog`] together with any non-fatal [`CatalogIssue`]s.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color::{Color, ColorMode};
use crate::error::{CoreError, CoreResult};
use crate::movement::Movement;
use crate::selection::Position;

/// Index of a part within [`Catalog::parts`].
pub type PartId = usize;

/// Item name that stands for "no item selected".
pub const NONE_ITEM: &str = "none";

/// Default subdirectory for item images inside a part folder.
pub const DEFAULT_IMAGE_SUBDIR: &str = "items/";

/// Default subdirectory for item thumbnails inside a part folder.
pub const DEFAULT_THUMBNAIL_SUBDIR: &str = "thumbnails/";

/// Directory holding part icons.
pub const PART_ICON_DIR: &str = "icons/parts/";

/// Directory holding outfit icons.
pub const OUTFIT_ICON_DIR: &str = "outfits/";

/// A dependency from one item onto the selection of another part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Layer key of the target part.
    pub part: String,
    /// Base filename of the required item, or `"none"`.
    pub item: String,
}

impl Requirement {
    /// Whether the requirement asks for the target part to be empty.
    #[must_use]
    pub fn wants_none(&self) -> bool {
        self.item == NONE_ITEM
    }
}

/// An extra image an item draws on another layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LayerPiece {
    /// Base filename of the extra image.
    pub item: String,
    /// Layer key the image draws into.
    pub layer: String,
    /// Condition for drawing the piece at all.
    #[serde(default)]
    pub requires: Option<Requirement>,
}

/// One selectable option of a part.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "ItemRecord")]
pub struct Item {
    /// Base filename, unique within its part.
    pub item: String,
    /// Display name.
    pub name: Option<String>,
    /// Outfit uids this item belongs to.
    pub outfits: Vec<String>,
    /// Layer override for the base image.
    pub layer: Option<String>,
    /// Extra images drawn on other layers.
    pub multilayer: Vec<LayerPiece>,
    /// Selection forced onto another part while this item is chosen.
    pub requires: Option<Requirement>,
    /// Whether the item has its own thumbnail image.
    pub thumbnail: bool,
    /// Folder override for the base image.
    pub folder: Option<String>,
    /// Skip the base image and draw only the layer pieces.
    pub hide: bool,
}

impl Item {
    /// An item with only a filename.
    #[must_use]
    pub fn named(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            name: None,
            outfits: Vec::new(),
            layer: None,
            multilayer: Vec::new(),
            requires: None,
            thumbnail: false,
            folder: None,
            hide: false,
        }
    }

    /// Display name, falling back to the filename.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.item)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ItemRecord {
    Name(String),
    Full(ItemFields),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemFields {
    item: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "outfitTags")]
    outfits: Option<Vec<String>>,
    #[serde(default)]
    layer: Option<String>,
    #[serde(default)]
    multilayer: Option<Vec<LayerPiece>>,
    #[serde(default)]
    requires: Option<Requirement>,
    #[serde(default)]
    thumbnail: Option<bool>,
    #[serde(default)]
    folder: Option<String>,
    #[serde(default)]
    hide: Option<bool>,
}

impl From<ItemRecord> for Item {
    fn from(record: ItemRecord) -> Self {
        match record {
            ItemRecord::Name(item) => Self::named(item),
            ItemRecord::Full(fields) => Self {
                item: fields.item,
                name: fields.name,
                outfits: fields.outfits.unwrap_or_default(),
                layer: fields.layer,
                multilayer: fields.multilayer.unwrap_or_default(),
                requires: fields.requires,
                thumbnail: fields.thumbnail.unwrap_or(false),
                folder: fields.folder,
                hide: fields.hide.unwrap_or(false),
            },
        }
    }
}

/// A category of wearable items.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    /// Display name.
    pub name: String,
    /// Layer key the part draws into.
    pub layer: String,
    /// Asset folder of the part.
    pub folder: String,
    /// Icon filename without extension.
    pub icon: Option<String>,
    /// Whether "no item" is a legal selection.
    pub none_allowed: bool,
    /// Thumbnail filename shown for the "no item" choice.
    pub none_thumbnail: Option<String>,
    /// Hide the part from the parts list.
    pub hide_from_list: bool,
    /// Movement constraints, `None` for immovable parts.
    pub movement: Option<Movement>,
    /// How color choices reach the rendered image.
    pub color_mode: ColorMode,
    /// Selectable colors.
    pub colors: Vec<Color>,
    /// Names of parts that follow this part's color choice.
    pub color_linked: Vec<String>,
    /// Selectable items, in display order.
    pub items: Vec<Item>,
    /// Treat every item as having a thumbnail.
    pub assume_thumbnails: bool,
}

impl Part {
    /// Whether the part shows in the parts list.
    ///
    /// Parts are hidden when flagged, or when they offer no real choice:
    /// at most one item, no "none" option and no colors.
    #[must_use]
    pub fn is_listed(&self) -> bool {
        let trivial = self.items.len() <= 1 && !self.none_allowed && self.colors.is_empty();
        !(self.hide_from_list || trivial)
    }

    /// Whether any movement axis is enabled.
    #[must_use]
    pub fn is_movable(&self) -> bool {
        self.movement.is_some_and(|m| m.is_movable())
    }

    /// Position of the item with the given base filename.
    #[must_use]
    pub fn item_index(&self, item: &str) -> Option<usize> {
        self.items.iter().position(|candidate| candidate.item == item)
    }

    /// Token of the first color, or empty when the part has none.
    #[must_use]
    pub fn default_color(&self) -> String {
        self.colors
            .first()
            .map(|c| c.token(self.color_mode))
            .unwrap_or_default()
    }

    /// Position a part returns to when its item changes: the origin,
    /// clamped into the movement bounds.
    #[must_use]
    pub fn rest_position(&self) -> Position {
        self.movement
            .map_or(Position::default(), |m| m.clamp(Position::default()))
    }

    /// Item selected by default: the first item, unless "none" is allowed.
    #[must_use]
    pub fn default_item(&self) -> Option<usize> {
        if self.none_allowed || self.items.is_empty() {
            None
        } else {
            Some(0)
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    layer: Option<String>,
    folder: String,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    none_allowed: bool,
    #[serde(default)]
    none_thumbnail: Option<String>,
    #[serde(default, alias = "hidePartList", alias = "hidePartsList")]
    hide_from_list: bool,
    #[serde(default)]
    movement: Option<Movement>,
    #[serde(default)]
    color_mode: Option<String>,
    #[serde(default)]
    colors: Option<Vec<Color>>,
    #[serde(default)]
    color_linked: Option<Vec<String>>,
    #[serde(default)]
    items: Vec<Item>,
    #[serde(default)]
    assume_thumbnails: bool,
}

impl From<PartRecord> for Part {
    fn from(record: PartRecord) -> Self {
        Self {
            name: record.name.unwrap_or_else(|| record.folder.clone()),
            layer: record.layer.unwrap_or_else(|| record.folder.clone()),
            folder: record.folder,
            icon: record.icon,
            none_allowed: record.none_allowed,
            none_thumbnail: record.none_thumbnail,
            hide_from_list: record.hide_from_list,
            movement: record.movement,
            color_mode: ColorMode::from_catalog(record.color_mode.as_deref()),
            colors: record.colors.unwrap_or_default(),
            color_linked: record.color_linked.unwrap_or_default(),
            items: record.items,
            assume_thumbnails: record.assume_thumbnails,
        }
    }
}

/// A drawing slot in the layer stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    /// Layer key.
    pub key: String,
    /// Part that owns this slot. Unowned slots still receive
    /// multilayer pieces and item layer overrides.
    pub part: Option<PartId>,
}

/// A named preset selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outfit {
    /// Identifier matched against item outfit tags.
    pub uid: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Non-fatal problem found while building a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogIssue {
    /// A listed layer key has no owning part.
    LayerWithoutPart {
        /// Layer key.
        layer: String,
    },
    /// A part's layer key was missing from the layer list, so a slot was
    /// appended on top for it.
    PartWithoutLayer {
        /// Part name.
        part: String,
        /// Layer key of the part.
        layer: String,
    },
    /// A part's layer key was already owned by an earlier part. The part
    /// was given a new key and a slot appended on top.
    SharedLayerKey {
        /// Part name.
        part: String,
        /// Declared layer key.
        layer: String,
        /// Key the part now owns.
        assigned: String,
    },
    /// A color link names a part that does not exist.
    UnknownColorLink {
        /// Part declaring the link.
        part: String,
        /// Name that failed to resolve.
        linked: String,
    },
}

impl std::fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LayerWithoutPart { layer } => write!(f, "layer '{layer}' has no part"),
            Self::PartWithoutLayer { part, layer } => {
                write!(f, "part '{part}' has no layer slot '{layer}', appended on top")
            }
            Self::SharedLayerKey { part, layer, assigned } => {
                write!(f, "part '{part}' shares layer '{layer}', re-keyed as '{assigned}'")
            }
            Self::UnknownColorLink { part, linked } => {
                write!(f, "part '{part}' links color to unknown part '{linked}'")
            }
        }
    }
}

/// Raw catalog index document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogIndex {
    /// Part entries, kept as JSON until their item documents are merged.
    #[serde(default)]
    pub parts: Vec<Value>,
    /// Layer keys, bottom to top.
    #[serde(default)]
    pub layers: Vec<String>,
    /// Outfit presets.
    #[serde(default)]
    pub outfits: Vec<Outfit>,
    /// Subdirectory of item images inside a part folder, `items/` when absent.
    #[serde(default)]
    pub images: Option<String>,
    /// Subdirectory of thumbnails inside a part folder.
    #[serde(default)]
    pub thumbnails: Option<String>,
}

impl CatalogIndex {
    /// Parse an index document.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Serialization`] if the JSON is malformed.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Replace the layer list with a separate layers document.
    ///
    /// Accepts either a bare array of keys or `{"layers": [...]}`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Serialization`] if the document is neither.
    pub fn apply_layer_document(&mut self, json: &str) -> CoreResult<()> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum LayerDocument {
            Keys(Vec<String>),
            Wrapped { layers: Vec<String> },
        }
        self.layers = match serde_json::from_str(json)? {
            LayerDocument::Keys(keys) | LayerDocument::Wrapped { layers: keys } => keys,
        };
        Ok(())
    }

    /// Paths of per-part items documents, relative to the asset root.
    #[must_use]
    pub fn item_documents(&self) -> Vec<String> {
        self.parts.iter().filter_map(items_document_path).collect()
    }
}

fn items_document_path(part: &Value) -> Option<String> {
    let items = part.get("items")?.as_str()?;
    let folder = part.get("folder").and_then(Value::as_str).unwrap_or_default();
    Some(format!("{folder}/{items}"))
}

/// A built catalog plus the issues found while building it.
#[derive(Debug, Clone)]
pub struct CatalogBuild {
    /// The catalog.
    pub catalog: Catalog,
    /// Non-fatal problems, also logged at warn level.
    pub issues: Vec<CatalogIssue>,
}

/// Immutable description of every part, layer and outfit.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    parts: Vec<Part>,
    layers: Vec<Layer>,
    outfits: Vec<Outfit>,
    images: String,
    thumbnails: String,
}

impl Catalog {
    /// Build a catalog from an index and its fetched items documents.
    ///
    /// `documents` maps each path from [`CatalogIndex::item_documents`] to
    /// its parsed JSON. An object document is merged over the part entry;
    /// an array document becomes the part's items.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Catalog`] if a part entry is malformed or its
    /// items document was not supplied.
    pub fn build(index: CatalogIndex, documents: &HashMap<String, Value>) -> CoreResult<CatalogBuild> {
        let mut parts = Vec::with_capacity(index.parts.len());
        for (position, mut entry) in index.parts.into_iter().enumerate() {
            if let Some(path) = items_document_path(&entry) {
                let document = documents
                    .get(&path)
                    .ok_or_else(|| CoreError::Catalog(format!("items document '{path}' not loaded")))?;
                merge_items_document(&mut entry, document.clone());
            }
            let record: PartRecord = serde_json::from_value(entry)
                .map_err(|e| CoreError::Catalog(format!("part #{position}: {e}")))?;
            parts.push(Part::from(record));
        }

        let mut build = Self::from_parts(parts, index.layers, index.outfits);
        if let Some(images) = index.images {
            build.catalog.images = images;
        }
        if let Some(thumbnails) = index.thumbnails {
            build.catalog.thumbnails = thumbnails;
        }
        Ok(build)
    }

    /// Build a catalog from a self-contained index with inline items.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or references an items
    /// document.
    pub fn from_json(json: &str) -> CoreResult<CatalogBuild> {
        Self::build(CatalogIndex::from_json(json)?, &HashMap::new())
    }

    /// Bind parts to layer slots and validate cross references.
    ///
    /// Each listed layer is owned by the first part whose layer key matches.
    /// Parts left without a slot get one appended on top. A part whose key
    /// is already taken is re-keyed (folder, then name, then a numbered
    /// key) so every part owns exactly one slot and fits stay one-to-one.
    #[must_use]
    pub fn from_parts(mut parts: Vec<Part>, layer_keys: Vec<String>, outfits: Vec<Outfit>) -> CatalogBuild {
        let mut issues = Vec::new();
        let mut layers: Vec<Layer> = layer_keys
            .into_iter()
            .map(|key| {
                let part = parts.iter().position(|p| p.layer == key);
                if part.is_none() {
                    issues.push(CatalogIssue::LayerWithoutPart { layer: key.clone() });
                }
                Layer { key, part }
            })
            .collect();

        for (id, part) in parts.iter_mut().enumerate() {
            if layers.iter().any(|layer| layer.part == Some(id)) {
                continue;
            }
            if layers.iter().any(|layer| layer.key == part.layer) {
                let assigned = unique_layer_key(&layers, part);
                issues.push(CatalogIssue::SharedLayerKey {
                    part: part.name.clone(),
                    layer: std::mem::replace(&mut part.layer, assigned.clone()),
                    assigned,
                });
            } else {
                issues.push(CatalogIssue::PartWithoutLayer {
                    part: part.name.clone(),
                    layer: part.layer.clone(),
                });
            }
            layers.push(Layer {
                key: part.layer.clone(),
                part: Some(id),
            });
        }

        for part in &parts {
            for linked in &part.color_linked {
                if !parts.iter().any(|p| &p.name == linked || &p.layer == linked) {
                    issues.push(CatalogIssue::UnknownColorLink {
                        part: part.name.clone(),
                        linked: linked.clone(),
                    });
                }
            }
        }

        for issue in &issues {
            tracing::warn!("Catalog issue: {issue}");
        }

        CatalogBuild {
            catalog: Self {
                parts,
                layers,
                outfits,
                images: DEFAULT_IMAGE_SUBDIR.to_string(),
                thumbnails: DEFAULT_THUMBNAIL_SUBDIR.to_string(),
            },
            issues,
        }
    }

    /// All parts, indexed by [`PartId`].
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// A part by id.
    #[must_use]
    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.parts.get(id)
    }

    /// Layer slots, bottom to top.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Outfit presets.
    #[must_use]
    pub fn outfits(&self) -> &[Outfit] {
        &self.outfits
    }

    /// An outfit by uid.
    #[must_use]
    pub fn outfit(&self, uid: &str) -> Option<&Outfit> {
        self.outfits.iter().find(|o| o.uid == uid)
    }

    /// The part owning the slot with the given layer key.
    #[must_use]
    pub fn part_by_layer(&self, key: &str) -> Option<PartId> {
        self.layers
            .iter()
            .find(|layer| layer.key == key)
            .and_then(|layer| layer.part)
    }

    /// A part by display name, falling back to layer key.
    #[must_use]
    pub fn part_by_name(&self, name: &str) -> Option<PartId> {
        self.parts
            .iter()
            .position(|p| p.name == name)
            .or_else(|| self.part_by_layer(name))
    }

    /// Index of the first slot with the given layer key.
    #[must_use]
    pub fn layer_index(&self, key: &str) -> Option<usize> {
        self.layers.iter().position(|layer| layer.key == key)
    }

    /// The first part that shows in the parts list.
    #[must_use]
    pub fn first_listed_part(&self) -> Option<PartId> {
        self.parts.iter().position(Part::is_listed)
    }

    /// Path of an item image relative to the asset root.
    ///
    /// `suffix` is the variant color name, appended as `_<suffix>`.
    #[must_use]
    pub fn image_path(&self, folder: &str, file: &str, suffix: Option<&str>) -> String {
        match suffix {
            Some(suffix) => format!("{folder}/{}{file}_{suffix}.png", self.images),
            None => format!("{folder}/{}{file}.png", self.images),
        }
    }

    /// Thumbnail path of an item, if it has a thumbnail.
    #[must_use]
    pub fn item_thumbnail_path(&self, part: PartId, item: usize) -> Option<String> {
        let part = self.parts.get(part)?;
        let entry = part.items.get(item)?;
        (entry.thumbnail || part.assume_thumbnails).then(|| {
            let folder = entry.folder.as_deref().unwrap_or(&part.folder);
            format!("{folder}/{}{}.png", self.thumbnails, entry.item)
        })
    }

    /// Thumbnail path of the "no item" choice of a part.
    #[must_use]
    pub fn none_thumbnail_path(&self, part: PartId) -> Option<String> {
        let part = self.parts.get(part)?;
        let file = part.none_thumbnail.as_deref()?;
        Some(format!("{}/{}{file}.png", part.folder, self.thumbnails))
    }

    /// Icon path of a part.
    #[must_use]
    pub fn part_icon_path(&self, part: PartId) -> Option<String> {
        let part = self.parts.get(part)?;
        let icon = part.icon.as_deref().unwrap_or("icon");
        Some(format!("{PART_ICON_DIR}{}/{icon}.png", part.folder))
    }

    /// Icon path of an outfit.
    #[must_use]
    pub fn outfit_icon_path(outfit: &Outfit) -> String {
        format!("{OUTFIT_ICON_DIR}{}.png", outfit.uid)
    }
}

/// A slot key not yet used by `layers` for a part whose own key is taken.
fn unique_layer_key(layers: &[Layer], part: &Part) -> String {
    let taken = |key: &str| layers.iter().any(|layer| layer.key == key);
    if let Some(key) = [part.folder.as_str(), part.name.as_str()]
        .into_iter()
        .find(|key| !key.is_empty() && !taken(key))
    {
        return key.to_string();
    }
    let mut n = 2;
    loop {
        let key = format!("{}-{n}", part.layer);
        if !taken(&key) {
            return key;
        }
        n += 1;
    }
}

fn merge_items_document(entry: &mut Value, document: Value) {
    match (entry, document) {
        (Value::Object(entry), Value::Object(document)) => {
            for (key, value) in document {
                entry.insert(key, value);
            }
        }
        (Value::Object(entry), items @ Value::Array(_)) => {
            entry.insert("items".to_string(), items);
        }
        (_, other) => {
            tracing::warn!("Ignoring items document that is neither object nor array: {other}");
        }
    }
}
