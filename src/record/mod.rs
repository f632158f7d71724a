//! Product record model
//!
//! A [`ProductRecord`] is the normalized, serialized form of one catalog
//! product. Only `product_id` and `status` are mandatory; every other field is
//! omitted from the JSON output when it is absent or empty.

mod assemble;

pub use assemble::{assemble, dedupe_bom, parse_quantity, RecordContext};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle status of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Discontinued,
}

impl ProductStatus {
    /// Interprets a status marker found on a product page
    ///
    /// Returns `None` when the text names neither state.
    pub fn from_marker(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();

        if ["discontinued", "obsolete", "inactive", "no longer available"]
            .iter()
            .any(|marker| text.contains(marker))
        {
            return Some(ProductStatus::Discontinued);
        }

        if ["active", "available", "current", "in production"]
            .iter()
            .any(|marker| text.contains(marker))
        {
            return Some(ProductStatus::Active);
        }

        None
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Discontinued => "discontinued",
        }
    }
}

/// One line of a bill of materials
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomItem {
    pub part_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
}

/// An accessory sold for a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accessory {
    pub part_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Kind of a downloaded asset; also the name of its directory on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Images,
    Manuals,
    Other,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Images => "images",
            AssetKind::Manuals => "manuals",
            AssetKind::Other => "other",
        }
    }
}

/// Downloaded files of one product, as paths relative to the output directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetManifest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manuals: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other: Vec<String>,
}

impl AssetManifest {
    /// Adds a path under the given kind, ignoring duplicates
    pub fn push(&mut self, kind: AssetKind, path: String) {
        let list = match kind {
            AssetKind::Images => &mut self.images,
            AssetKind::Manuals => &mut self.manuals,
            AssetKind::Other => &mut self.other,
        };
        if !list.contains(&path) {
            list.push(path);
        }
    }

    pub fn len(&self) -> usize {
        self.images.len() + self.manuals.len() + self.other.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over every `(kind, path)` pair
    pub fn iter(&self) -> impl Iterator<Item = (AssetKind, &str)> {
        self.images
            .iter()
            .map(|p| (AssetKind::Images, p.as_str()))
            .chain(self.manuals.iter().map(|p| (AssetKind::Manuals, p.as_str())))
            .chain(self.other.iter().map(|p| (AssetKind::Other, p.as_str())))
    }
}

/// The normalized record written for each product
///
/// Maps are ordered so that serializing the same record twice produces
/// identical bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub status: ProductStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specs: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bom: Option<Vec<BomItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessories: Option<Vec<Accessory>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nameplate: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<AssetManifest>,
}
