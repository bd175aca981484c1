//! Serialized selections ("fits").

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::selection::Position;

/// Stored selection of one part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitEntry {
    /// Base filename of the selected item, or `"none"`.
    pub item: String,
    /// Part offset.
    #[serde(default)]
    pub position: Position,
    /// Color token.
    #[serde(default)]
    pub color: String,
}

/// A full selection keyed by layer key.
///
/// Keys are kept sorted so equal selections serialize to identical JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fit(BTreeMap<String, FitEntry>);

impl Fit {
    /// Create an empty fit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for a layer key.
    pub fn insert(&mut self, layer: String, entry: FitEntry) -> Option<FitEntry> {
        self.0.insert(layer, entry)
    }

    /// Entry for a layer key.
    #[must_use]
    pub fn get(&self, layer: &str) -> Option<&FitEntry> {
        self.0.get(layer)
    }

    /// Whether the fit has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Entries in layer key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FitEntry)> {
        self.0.iter()
    }

    /// Serialize to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not a fit.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl<'a> IntoIterator for &'a Fit {
    type Item = (&'a String, &'a FitEntry);
    type IntoIter = std::collections::btree_map::Iter<'a, String, FitEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
