//! Record assembly
//!
//! Merges the fields extracted from a product page with listing metadata and
//! the downloaded asset manifest. Assembly is pure: it performs no I/O and
//! cannot fail.

use crate::extract::ProductFields;
use crate::record::{Accessory, AssetManifest, BomItem, ProductRecord};
use std::collections::{BTreeMap, HashMap};

/// Metadata known about a product before its page is parsed
#[derive(Debug, Clone, Default)]
pub struct RecordContext {
    /// Category name from the catalog listing
    pub category: Option<String>,

    /// Brand used when the page does not name one
    pub default_brand: Option<String>,
}

/// Builds the final record for one product
///
/// Empty strings, maps and lists are dropped so that absent data is omitted
/// from the output rather than written as an empty value. BOM lines sharing a
/// part number are merged.
pub fn assemble(
    fields: ProductFields,
    context: &RecordContext,
    assets: AssetManifest,
) -> ProductRecord {
    let brand = non_empty(fields.brand).or_else(|| non_empty(context.default_brand.clone()));

    let bom: Vec<BomItem> = fields
        .bom
        .into_iter()
        .filter_map(prune_bom_item)
        .collect();

    let accessories: Vec<Accessory> = fields
        .accessories
        .into_iter()
        .filter_map(|item| {
            let part_number = item.part_number.trim().to_string();
            if part_number.is_empty() {
                return None;
            }
            Some(Accessory {
                part_number,
                description: non_empty(item.description),
            })
        })
        .collect();

    ProductRecord {
        product_id: fields.product_id.trim().to_string(),
        name: non_empty(fields.name),
        description: non_empty(fields.description),
        brand,
        category: non_empty(context.category.clone()),
        status: fields.status,
        price_usd: non_empty(fields.price_usd),
        info: non_empty_map(fields.info),
        specs: non_empty_map(fields.specs),
        bom: non_empty_vec(dedupe_bom(bom)),
        accessories: non_empty_vec(accessories),
        nameplate: non_empty_map(fields.nameplate),
        assets: if assets.is_empty() { None } else { Some(assets) },
    }
}

/// Merges BOM lines with the same part number
///
/// Quantities are summed and rendered with three decimals (`"3.000 EA"`). The
/// last non-empty description wins and the first-seen order of part numbers is
/// kept. A part whose lines carry no quantity at all keeps no quantity.
pub fn dedupe_bom(items: Vec<BomItem>) -> Vec<BomItem> {
    struct Group {
        description: Option<String>,
        total: f64,
        has_quantity: bool,
    }

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Group> = HashMap::new();

    for item in items {
        let group = groups.entry(item.part_number.clone()).or_insert_with(|| {
            order.push(item.part_number.clone());
            Group {
                description: None,
                total: 0.0,
                has_quantity: false,
            }
        });

        if item.description.is_some() {
            group.description = item.description;
        }

        if let Some(quantity) = item.quantity.as_deref() {
            group.has_quantity = true;
            group.total += parse_quantity(quantity).unwrap_or(0.0);
        }
    }

    order
        .into_iter()
        .filter_map(|part_number| {
            let group = groups.remove(&part_number)?;
            Some(BomItem {
                part_number,
                description: group.description,
                quantity: group
                    .has_quantity
                    .then(|| format!("{:.3} EA", group.total)),
            })
        })
        .collect()
}

/// Reads the leading number of a quantity such as `"1.000 EA"`
pub fn parse_quantity(raw: &str) -> Option<f64> {
    raw.split_whitespace()
        .next()
        .and_then(|number| number.replace(',', "").parse::<f64>().ok())
}

fn prune_bom_item(item: BomItem) -> Option<BomItem> {
    let part_number = item.part_number.trim().to_string();
    if part_number.is_empty() {
        return None;
    }
    Some(BomItem {
        part_number,
        description: non_empty(item.description),
        quantity: non_empty(item.quantity),
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn non_empty_map(map: BTreeMap<String, String>) -> Option<BTreeMap<String, String>> {
    let cleaned: BTreeMap<String, String> = map
        .into_iter()
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .collect();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn non_empty_vec<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
