//! Field extraction from product pages
//!
//! All site-specific markup knowledge lives behind the [`FieldExtractor`]
//! trait. The rest of the pipeline only sees [`ProductFields`], so targeting a
//! different vendor means writing a new extractor, not touching the pipeline.

mod baldor;
mod text;

pub use baldor::BaldorExtractor;
pub use text::{collapse_whitespace, element_text, joined_text, normalize_price};

use crate::record::{Accessory, AssetKind, BomItem, ProductStatus};
use crate::ExtractionError;
use std::collections::BTreeMap;

/// A resource referenced by a product page that should be downloaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    /// Which asset directory the file belongs to
    pub kind: AssetKind,

    /// Absolute URL of the resource
    pub url: String,

    /// File name to store the resource under
    pub file_name: String,
}

/// Everything an extractor could read from one product page
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub product_id: String,
    pub status: ProductStatus,
    pub name: Option<String>,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub price_usd: Option<String>,
    pub info: BTreeMap<String, String>,
    pub specs: BTreeMap<String, String>,
    pub bom: Vec<BomItem>,
    pub accessories: Vec<Accessory>,
    pub nameplate: BTreeMap<String, String>,
    pub asset_refs: Vec<AssetRef>,
}

impl ProductFields {
    /// Creates a field set holding only the required fields
    pub fn new(product_id: String, status: ProductStatus) -> Self {
        Self {
            product_id,
            status,
            name: None,
            description: None,
            brand: None,
            price_usd: None,
            info: BTreeMap::new(),
            specs: BTreeMap::new(),
            bom: Vec::new(),
            accessories: Vec::new(),
            nameplate: BTreeMap::new(),
            asset_refs: Vec::new(),
        }
    }
}

/// Trait for site-specific product page parsers
///
/// Implementations must treat missing optional data as absent, and fail only
/// when the product id or status cannot be located.
pub trait FieldExtractor: Send + Sync {
    /// Display name of the site this extractor understands
    fn site_name(&self) -> &str;

    /// Parses one product page
    ///
    /// # Arguments
    ///
    /// * `page_url` - The URL the page was fetched from (used in errors and logs)
    /// * `body` - The raw HTML body
    fn extract(&self, page_url: &str, body: &str) -> Result<ProductFields, ExtractionError>;
}
