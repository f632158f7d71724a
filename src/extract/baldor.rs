//! Baldor catalog product page extractor
//!
//! Product pages (`/catalog/<code>`) are static HTML:
//! - `div.page-title` holds the catalog number, used as `product_id`
//! - `div#catalog-detail` holds the header: description, price and the
//!   `table.detail-table` key/value rows
//! - `div.c-tab li` names the tabs, each rendered as `div.pane[data-tab=...]`
//!
//! Tabs without a parser are logged and skipped.

use crate::extract::text::{element_text, joined_text, normalize_price};
use crate::extract::{AssetRef, FieldExtractor, ProductFields};
use crate::record::{Accessory, AssetKind, BomItem, ProductStatus};
use crate::ExtractionError;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use tracing::{debug, warn};
use url::Url;

/// Query appended to product image paths to get the full-size render
const IMAGE_QUERY: &str = "bc=white&as=1&w=1920&h=0";

/// Compiled selectors for the Baldor product page layout
struct Selectors {
    page_title: Selector,
    catalog_detail: Selector,
    product_name: Selector,
    heading: Selector,
    description: Selector,
    detail_row: Selector,
    header_cell: Selector,
    data_cell: Selector,
    status: Selector,
    price: Selector,
    tab_name: Selector,
    pane: Selector,
    column: Selector,
    label: Selector,
    value: Selector,
    row: Selector,
    drawing: Selector,
    cad_link: Selector,
    link: Selector,
    product_image: Selector,
    manual_link: Selector,
}

impl Selectors {
    fn compile() -> Result<Self, ExtractionError> {
        Ok(Self {
            page_title: selector("div.page-title")?,
            catalog_detail: selector("div#catalog-detail")?,
            product_name: selector(".product-name")?,
            heading: selector("h1")?,
            description: selector("div.product-description")?,
            detail_row: selector("table.detail-table tr")?,
            header_cell: selector("th")?,
            data_cell: selector("td")?,
            status: selector(".product-status")?,
            price: selector(".product-price")?,
            tab_name: selector("div.c-tab li")?,
            pane: selector("div.pane[data-tab]")?,
            column: selector("div.col")?,
            label: selector("span.label")?,
            value: selector("span.value")?,
            row: selector("tr")?,
            drawing: selector("[data-drawing-number]")?,
            cad_link: selector("a[data-cad-value][data-cad-url]")?,
            link: selector("a[href]")?,
            product_image: selector("img.product-image")?,
            manual_link: selector("a.product-manual[href], .product-documents a[href$=\".pdf\"]")?,
        })
    }
}

fn selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::Selector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}

/// Extractor for `www.baldor.com` product pages
pub struct BaldorExtractor {
    base_url: Url,
    /// `base_url` as configured, without a trailing slash; prefixes site paths
    base_prefix: String,
    selectors: Selectors,
}

impl BaldorExtractor {
    /// Creates an extractor resolving relative asset links against `base_url`
    pub fn new(base_url: &str) -> Result<Self, ExtractionError> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            base_prefix: base_url.trim_end_matches('/').to_string(),
            selectors: Selectors::compile()?,
        })
    }

    /// Reads the `table.detail-table` rows of the catalog header
    fn parse_info(&self, detail: &ElementRef) -> BTreeMap<String, String> {
        let s = &self.selectors;
        let mut info = BTreeMap::new();

        for row in detail.select(&s.detail_row) {
            let key = row.select(&s.header_cell).next();
            let value = row.select(&s.data_cell).next();

            if let (Some(key), Some(value)) = (key, value) {
                let key = element_text(&key);
                if !key.is_empty() {
                    info.insert(key, joined_text(&value, " "));
                }
            }
        }

        info
    }

    /// Locates the status marker; a product without one is active
    fn resolve_status(
        &self,
        document: &Html,
        info: &BTreeMap<String, String>,
        page_url: &str,
    ) -> Result<ProductStatus, ExtractionError> {
        let marker = document
            .select(&self.selectors.status)
            .next()
            .map(|e| element_text(&e))
            .filter(|text| !text.is_empty())
            .or_else(|| info_value(info, &["Status", "Product Status"]));

        match marker {
            None => Ok(ProductStatus::Active),
            Some(text) => {
                ProductStatus::from_marker(&text).ok_or_else(|| ExtractionError::UnknownStatus {
                    value: text,
                    url: page_url.to_string(),
                })
            }
        }
    }

    /// Returns the lower-cased tab names, falling back to the panes present
    fn tab_names(&self, document: &Html) -> Vec<String> {
        let mut names: Vec<String> = document
            .select(&self.selectors.tab_name)
            .map(|e| element_text(&e).to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();

        if names.is_empty() {
            names = document
                .select(&self.selectors.pane)
                .filter_map(|pane| pane.value().attr("data-tab"))
                .map(|tab| tab.trim().to_lowercase())
                .collect();
        }

        names.dedup();
        names
    }

    fn find_pane<'a>(&self, document: &'a Html, tab: &str) -> Option<ElementRef<'a>> {
        document.select(&self.selectors.pane).find(|pane| {
            pane.value()
                .attr("data-tab")
                .map(|t| t.trim().eq_ignore_ascii_case(tab))
                .unwrap_or(false)
        })
    }

    /// Key/value pairs of the Specs tab: `div.col > div > span.label + span.value`
    fn parse_specs(&self, pane: &ElementRef, fields: &mut ProductFields) {
        let s = &self.selectors;

        for column in pane.select(&s.column) {
            for item in column
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|e| e.value().name() == "div")
            {
                let label = item.select(&s.label).next();
                let value = item.select(&s.value).next();

                if let (Some(label), Some(value)) = (label, value) {
                    fields
                        .specs
                        .insert(element_text(&label), joined_text(&value, ", "));
                }
            }
        }

        debug!("Extracted {} specs", fields.specs.len());
    }

    /// BOM rows: part number, description, quantity
    fn parse_parts(&self, pane: &ElementRef, fields: &mut ProductFields) {
        for cells in self.table_rows(pane) {
            let mut cells = cells.into_iter();
            let Some(part_number) = cells.next() else {
                continue;
            };
            fields.bom.push(BomItem {
                part_number,
                description: cells.next(),
                quantity: cells.next(),
            });
        }

        debug!("Extracted {} BOM lines", fields.bom.len());
    }

    /// Accessory rows: part number, description
    fn parse_accessories(&self, pane: &ElementRef, fields: &mut ProductFields) {
        for cells in self.table_rows(pane) {
            let mut cells = cells.into_iter();
            let Some(part_number) = cells.next() else {
                continue;
            };
            fields.accessories.push(Accessory {
                part_number,
                description: cells.next(),
            });
        }

        debug!("Extracted {} accessories", fields.accessories.len());
    }

    /// Nameplate data, either `th`/`td` pairs or `span.label`/`span.value` pairs
    fn parse_nameplate(&self, pane: &ElementRef, fields: &mut ProductFields) {
        let s = &self.selectors;

        for row in pane.select(&s.row) {
            for (key, value) in row.select(&s.header_cell).zip(row.select(&s.data_cell)) {
                let key = element_text(&key);
                if !key.is_empty() {
                    fields.nameplate.insert(key, joined_text(&value, " "));
                }
            }
        }

        let labels = pane.select(&s.label);
        let values = pane.select(&s.value);
        for (label, value) in labels.zip(values) {
            let key = element_text(&label);
            if !key.is_empty() {
                fields
                    .nameplate
                    .entry(key)
                    .or_insert_with(|| joined_text(&value, " "));
            }
        }

        debug!("Extracted {} nameplate entries", fields.nameplate.len());
    }

    /// Drawing PDFs and CAD downloads
    fn parse_drawings(&self, pane: &ElementRef, fields: &mut ProductFields) {
        let s = &self.selectors;
        let product = urlencoding::encode(&fields.product_id).into_owned();

        for element in pane.select(&s.drawing) {
            let Some(number) = element.value().attr("data-drawing-number") else {
                continue;
            };
            let number = number.trim();
            if number.is_empty() {
                continue;
            }
            if let Some(url) = self.absolute_url(&format!(
                "/api/products/{}/drawings/{}",
                product,
                urlencoding::encode(number)
            )) {
                fields.asset_refs.push(AssetRef {
                    kind: AssetKind::Other,
                    url,
                    file_name: format!("drawing_{}.pdf", number),
                });
            }
        }

        for (i, element) in pane.select(&s.cad_link).enumerate() {
            let (Some(value), Some(original)) = (
                element.value().attr("data-cad-value"),
                element.value().attr("data-cad-url"),
            ) else {
                continue;
            };
            let filetype = element
                .value()
                .attr("data-cad-filetype")
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or("file");
            let extension = value.rsplit('.').next().unwrap_or("bin");

            if let Some(url) = self.absolute_url(&format!(
                "/api/products/download/?value={}&url={}",
                urlencoding::encode(value),
                urlencoding::encode(original)
            )) {
                fields.asset_refs.push(AssetRef {
                    kind: AssetKind::Other,
                    url,
                    file_name: format!("cad_{}_{}.{}", filetype, i, extension),
                });
            }
        }
    }

    /// Performance curve documents
    fn parse_performance(&self, pane: &ElementRef, fields: &mut ProductFields) {
        let urls: Vec<String> = pane
            .select(&self.selectors.link)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| self.absolute_url(href))
            .collect();

        for (i, url) in dedup_preserving_order(urls).into_iter().enumerate() {
            fields.asset_refs.push(AssetRef {
                kind: AssetKind::Other,
                url,
                file_name: format!("performance_{}.pdf", i),
            });
        }
    }

    /// Main product image and product manuals from the page header
    fn collect_header_assets(&self, document: &Html, fields: &mut ProductFields) {
        let s = &self.selectors;

        let image = document.select(&s.product_image).next().and_then(|img| {
            img.value()
                .attr("data-src")
                .or_else(|| img.value().attr("src"))
        });

        match image.and_then(|src| self.absolute_url(src)) {
            Some(src) => {
                let mut url = Url::parse(&src).ok();
                if let Some(url) = url.as_mut() {
                    url.set_query(Some(IMAGE_QUERY));
                }
                if let Some(url) = url {
                    fields.asset_refs.push(AssetRef {
                        kind: AssetKind::Images,
                        url: url.to_string(),
                        file_name: "img.jpg".to_string(),
                    });
                }
            }
            None => debug!("No main image found for {}", fields.product_id),
        }

        let manuals: Vec<String> = document
            .select(&s.manual_link)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| self.absolute_url(href))
            .collect();

        for (i, url) in dedup_preserving_order(manuals).into_iter().enumerate() {
            let file_name = if i == 0 {
                "manual.pdf".to_string()
            } else {
                format!("manual_{}.pdf", i)
            };
            fields.asset_refs.push(AssetRef {
                kind: AssetKind::Manuals,
                url,
                file_name,
            });
        }
    }

    /// Rows of all tables in a pane as trimmed `td` texts; header rows are skipped
    fn table_rows(&self, pane: &ElementRef) -> Vec<Vec<String>> {
        let s = &self.selectors;

        pane.select(&s.row)
            .map(|row| {
                row.select(&s.data_cell)
                    .map(|cell| joined_text(&cell, " "))
                    .collect::<Vec<_>>()
            })
            .filter(|cells| cells.first().map(|c| !c.is_empty()).unwrap_or(false))
            .collect()
    }

    /// Resolves a link against the site base; non-http links are dropped
    ///
    /// Root-relative paths are appended to the configured base, so a base with
    /// a path prefix keeps that prefix.
    fn absolute_url(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            return None;
        }

        let url = if href.starts_with('/') && !href.starts_with("//") {
            Url::parse(&format!("{}{}", self.base_prefix, href)).ok()?
        } else {
            self.base_url.join(href).ok()?
        };
        if url.scheme() == "http" || url.scheme() == "https" {
            Some(url.to_string())
        } else {
            None
        }
    }
}

impl FieldExtractor for BaldorExtractor {
    fn site_name(&self) -> &str {
        "Baldor"
    }

    fn extract(&self, page_url: &str, body: &str) -> Result<ProductFields, ExtractionError> {
        let s = &self.selectors;
        let document = Html::parse_document(body);

        let product_id = document
            .select(&s.page_title)
            .next()
            .map(|e| element_text(&e))
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ExtractionError::MissingField {
                field: "product_id",
                url: page_url.to_string(),
            })?;

        // Without the catalog header there is nothing to read a status from.
        let detail = document.select(&s.catalog_detail).next().ok_or_else(|| {
            ExtractionError::MissingField {
                field: "status",
                url: page_url.to_string(),
            }
        })?;

        let info = self.parse_info(&detail);
        let status = self.resolve_status(&document, &info, page_url)?;

        let mut fields = ProductFields::new(product_id, status);

        fields.description = detail
            .select(&s.description)
            .next()
            .map(|e| element_text(&e));

        fields.name = detail
            .select(&s.product_name)
            .next()
            .or_else(|| document.select(&s.heading).next())
            .map(|e| element_text(&e));

        fields.price_usd = document
            .select(&s.price)
            .next()
            .map(|e| element_text(&e))
            .or_else(|| info_value(&info, &["List Price", "Price"]))
            .and_then(|raw| normalize_price(&raw));

        fields.brand = info_value(&info, &["Brand"]);
        fields.info = info;

        for tab in self.tab_names(&document) {
            let Some(pane) = self.find_pane(&document, &tab) else {
                warn!("Tab '{}' has no pane on {}", tab, page_url);
                continue;
            };

            match tab.as_str() {
                "specs" => self.parse_specs(&pane, &mut fields),
                "parts" => self.parse_parts(&pane, &mut fields),
                "accessories" => self.parse_accessories(&pane, &mut fields),
                "nameplate" => self.parse_nameplate(&pane, &mut fields),
                "drawings" => self.parse_drawings(&pane, &mut fields),
                "performance" => self.parse_performance(&pane, &mut fields),
                other => warn!("No parser implementation for tab '{}'", other),
            }
        }

        self.collect_header_assets(&document, &mut fields);

        debug!(
            "Extracted {} ({} info rows, {} assets referenced)",
            fields.product_id,
            fields.info.len(),
            fields.asset_refs.len()
        );

        Ok(fields)
    }
}

/// Looks up the first of `keys` present in the info table, ignoring case
fn info_value(info: &BTreeMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        info.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.clone())
            .filter(|v| !v.trim().is_empty())
    })
}

fn dedup_preserving_order(urls: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(urls.len());
    for url in urls {
        if !unique.contains(&url) {
            unique.push(url);
        }
    }
    unique
}
