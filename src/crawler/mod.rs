//! Crawler module for catalog traversal and product harvesting
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching with retry logic
//! - Request pacing
//! - Catalog and listing enumeration
//! - Overall harvest coordination

mod catalog;
mod coordinator;
mod fetcher;
mod pacer;

pub use catalog::{
    category_id_from_href, listing_url, parse_categories, product_url, CatalogEnumerator,
    Category, ListingEntry, ListingResponse,
};
pub use coordinator::{run_harvest, Harvester, ProductOutcome};
pub use fetcher::{
    build_http_client, is_retryable_status, FetchedPage, Fetcher, ACCEPT_ANY, ACCEPT_HTML,
    ACCEPT_JSON,
};
pub use pacer::{time_until_next_request, RequestPacer};
