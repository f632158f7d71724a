//! Catalog enumeration
//!
//! Turns the site's category tree and paginated listing API into the ordered
//! list of product pages to harvest.

use crate::config::{Config, CrawlerConfig, SiteConfig};
use crate::extract::collapse_whitespace;
use crate::FetchError;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::collections::HashSet;
use url::Url;

use super::fetcher::Fetcher;

/// A catalog category as used by the listing API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: u32,
    pub name: Option<String>,
}

/// One product found in the catalog listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Product code as returned by the listing API
    pub code: String,

    /// Product detail page URL
    pub url: String,

    /// Name of the category the product was first listed under
    pub category: Option<String>,
}

/// Listing API response body
#[derive(Debug, Default, Deserialize)]
pub struct ListingResponse {
    #[serde(default)]
    pub results: ListingResults,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingResults {
    #[serde(default)]
    pub matches: Vec<ListingMatch>,
}

#[derive(Debug, Deserialize)]
pub struct ListingMatch {
    #[serde(default)]
    pub code: Option<String>,
}

impl ListingResponse {
    /// Non-empty product codes on this page, in listing order
    pub fn codes(&self) -> Vec<String> {
        self.results
            .matches
            .iter()
            .filter_map(|m| m.code.as_deref())
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Parses the category links of the catalog landing page
///
/// Only links carrying a numeric `category=` parameter are kept; duplicates are
/// dropped, first occurrence wins.
pub fn parse_categories(html: &str) -> Vec<Category> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("li.subcategory a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut categories = Vec::new();

    for link in document.select(&selector) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        let Some(id) = category_id_from_href(href) else {
            tracing::debug!("Ignoring category link without id: {}", href);
            continue;
        };
        if !seen.insert(id) {
            continue;
        }

        let name = collapse_whitespace(&link.text().collect::<String>());
        categories.push(Category {
            id,
            name: if name.is_empty() { None } else { Some(name) },
        });
    }

    categories
}

/// Reads the `category=<id>` parameter from a link's query or fragment
pub fn category_id_from_href(href: &str) -> Option<u32> {
    href.split(['?', '#', '&'])
        .find_map(|part| part.strip_prefix("category="))
        .and_then(|value| value.trim().parse().ok())
}

/// Builds the listing API URL for one page of a category
pub fn listing_url(
    site: &SiteConfig,
    category: u32,
    page_index: u32,
    page_size: u32,
) -> Result<String, FetchError> {
    let mut url = Url::parse(&format!("{}{}", site.base_url, site.api_path))?;
    url.query_pairs_mut()
        .append_pair("include", "results")
        .append_pair("language", &site.language)
        .append_pair("pageIndex", &page_index.to_string())
        .append_pair("pageSize", &page_size.to_string())
        .append_pair("category", &category.to_string());
    Ok(url.into())
}

/// Builds the detail page URL of a product
pub fn product_url(site: &SiteConfig, code: &str) -> String {
    format!(
        "{}{}/{}",
        site.base_url,
        site.catalog_path,
        urlencoding::encode(code)
    )
}

/// Walks categories and listing pages to produce the products to harvest
pub struct CatalogEnumerator<'a> {
    site: &'a SiteConfig,
    crawler: &'a CrawlerConfig,
    fetcher: &'a Fetcher,
}

impl<'a> CatalogEnumerator<'a> {
    pub fn new(config: &'a Config, fetcher: &'a Fetcher) -> Self {
        Self {
            site: &config.site,
            crawler: &config.crawler,
            fetcher,
        }
    }

    /// Returns the configured categories, or discovers them from the catalog page
    pub async fn categories(&self) -> Result<Vec<Category>, FetchError> {
        if !self.crawler.categories.is_empty() {
            return Ok(self
                .crawler
                .categories
                .iter()
                .map(|entry| Category {
                    id: entry.id,
                    name: entry.name.clone(),
                })
                .collect());
        }

        let catalog_url = format!("{}{}", self.site.base_url, self.site.catalog_path);
        tracing::info!("Discovering categories from {}", catalog_url);

        let page = self.fetcher.fetch_page(&catalog_url).await?;
        let categories = parse_categories(&page.body);

        if categories.is_empty() {
            tracing::warn!("No categories found on {}", catalog_url);
        } else {
            tracing::info!("Discovered {} categories", categories.len());
        }

        Ok(categories)
    }

    /// Pages through the listing API for one category
    ///
    /// Stops at the first empty page, at a page that only repeats codes already
    /// seen, or at the page limit. A failed page ends the category with the
    /// codes collected so far.
    pub async fn collect_codes(&self, category: &Category) -> Vec<String> {
        let mut codes = Vec::new();
        let mut seen = HashSet::new();

        for page_index in 0..self.crawler.max_pages_per_category {
            let url = match listing_url(self.site, category.id, page_index, self.crawler.page_size)
            {
                Ok(url) => url,
                Err(e) => {
                    tracing::error!("Cannot build listing URL for category {}: {}", category.id, e);
                    break;
                }
            };

            let response: ListingResponse = match self.fetcher.fetch_json(&url).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(
                        "Listing page {} of category {} failed: {}",
                        page_index,
                        category.id,
                        e
                    );
                    break;
                }
            };

            let page_codes = response.codes();
            if page_codes.is_empty() {
                tracing::debug!("Category {} exhausted at page {}", category.id, page_index);
                break;
            }

            let before = codes.len();
            for code in page_codes {
                if seen.insert(code.clone()) {
                    codes.push(code);
                }
            }

            if codes.len() == before {
                tracing::warn!(
                    "Listing page {} of category {} repeated earlier results, stopping",
                    page_index,
                    category.id
                );
                break;
            }

            if page_index + 1 == self.crawler.max_pages_per_category {
                tracing::warn!(
                    "Category {} reached the page limit ({})",
                    category.id,
                    self.crawler.max_pages_per_category
                );
            }
        }

        codes
    }

    /// Enumerates products across all categories
    ///
    /// Codes listed under several categories are kept once, under the first
    /// category. Enumeration stops as soon as `limit` products are collected.
    pub async fn enumerate(&self, limit: Option<usize>) -> Result<Vec<ListingEntry>, FetchError> {
        let categories = self.categories().await?;
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for category in &categories {
            if limit.is_some_and(|max| entries.len() >= max) {
                break;
            }

            let codes = self.collect_codes(category).await;
            tracing::info!(
                "Category {} ({}): {} products",
                category.id,
                category.name.as_deref().unwrap_or("unnamed"),
                codes.len()
            );

            for code in codes {
                if limit.is_some_and(|max| entries.len() >= max) {
                    break;
                }
                if !seen.insert(code.clone()) {
                    continue;
                }
                entries.push(ListingEntry {
                    url: product_url(self.site, &code),
                    code,
                    category: category.name.clone(),
                });
            }
        }

        Ok(entries)
    }
}
