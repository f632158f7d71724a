//! Harvest coordinator - main pipeline orchestration logic
//!
//! This module contains the main harvest loop, which:
//! - Enumerates the catalog into product pages
//! - Fetches and extracts each product page
//! - Downloads the product's assets
//! - Assembles and writes the product record
//! - Keeps one product's failure from stopping the others

use crate::assets::{AssetDownloader, DownloadOutcome};
use crate::config::Config;
use crate::extract::{BaldorExtractor, FieldExtractor};
use crate::output::{is_file_name_safe, sanitize_file_name, JsonWriter, RunSummary};
use crate::record::{assemble, RecordContext};
use crate::{AssetError, HarvestError};
use std::path::PathBuf;

use super::catalog::{CatalogEnumerator, ListingEntry};
use super::fetcher::Fetcher;

/// What processing one product produced
#[derive(Debug)]
pub struct ProductOutcome {
    pub product_id: String,

    /// Path of the written JSON record
    pub path: PathBuf,

    pub assets_downloaded: usize,
    pub assets_reused: usize,

    /// Assets left out of the record
    pub asset_failures: Vec<AssetError>,
}

/// Main harvester structure
pub struct Harvester {
    config: Config,
    fetcher: Fetcher,
    extractor: Box<dyn FieldExtractor>,
    downloader: Option<AssetDownloader>,
    writer: JsonWriter,
}

impl Harvester {
    /// Creates a harvester for the configured Baldor catalog
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Successfully created harvester
    /// * `Err(HarvestError)` - The HTTP client or extractor could not be built
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let extractor = BaldorExtractor::new(&config.site.base_url)?;
        Self::with_extractor(config, Box::new(extractor))
    }

    /// Creates a harvester using a custom page extractor
    pub fn with_extractor(
        config: Config,
        extractor: Box<dyn FieldExtractor>,
    ) -> Result<Self, HarvestError> {
        let fetcher = Fetcher::new(&config.http)?;
        let output_dir = PathBuf::from(&config.output.directory);
        let downloader = config
            .output
            .download_assets
            .then(|| AssetDownloader::new(&output_dir));
        let writer = JsonWriter::new(output_dir);

        Ok(Self {
            config,
            fetcher,
            extractor,
            downloader,
            writer,
        })
    }

    /// Runs the full harvest
    ///
    /// Only an unusable output directory aborts the run. Every other failure is
    /// logged, counted in the summary and skipped.
    pub async fn run(&self) -> Result<RunSummary, HarvestError> {
        self.writer.ensure_output_dir()?;

        let mut summary = RunSummary::start();
        tracing::info!(
            "Starting harvest of {} into {}",
            self.extractor.site_name(),
            self.writer.output_dir().display()
        );

        let limit = self.config.crawler.max_products.map(|n| n as usize);
        let enumerator = CatalogEnumerator::new(&self.config, &self.fetcher);

        let entries = match enumerator.enumerate(limit).await {
            Ok(entries) => entries,
            Err(e) => {
                let err = HarvestError::from(e);
                tracing::error!("Catalog enumeration failed: {}", err);
                summary.record_failure("catalog", &err);
                summary.finish(self.fetcher.pacer().requests_made());
                return Ok(summary);
            }
        };

        summary.products_found = entries.len();
        tracing::info!("Found {} products to harvest", entries.len());

        for (index, entry) in entries.iter().enumerate() {
            match self.process_product(entry).await {
                Ok(outcome) => {
                    for failure in &outcome.asset_failures {
                        summary.record_asset_failure(failure);
                    }
                    summary.record_written(outcome.assets_downloaded, outcome.assets_reused);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::error!("Skipping {}: {}", entry.url, e);
                    summary.record_failure(&entry.code, &e);
                }
            }

            let done = index + 1;
            if done % 10 == 0 || done == entries.len() {
                tracing::info!(
                    "Progress: {}/{} products, {} written, {} failed",
                    done,
                    entries.len(),
                    summary.products_written,
                    summary.products_failed()
                );
            }
        }

        summary.finish(self.fetcher.pacer().requests_made());

        tracing::info!(
            "Harvest completed: {} of {} products written in {}s",
            summary.products_written,
            summary.products_found,
            summary.duration_seconds().unwrap_or(0)
        );

        Ok(summary)
    }

    /// Processes a single product
    ///
    /// This method:
    /// 1. Fetches the product page
    /// 2. Extracts the product fields
    /// 3. Downloads referenced assets
    /// 4. Assembles and writes the record
    pub async fn process_product(
        &self,
        entry: &ListingEntry,
    ) -> Result<ProductOutcome, HarvestError> {
        tracing::debug!("Processing product {}", entry.code);

        let page = self.fetcher.fetch_page(&entry.url).await?;
        let fields = self.extractor.extract(&page.final_url, &page.body)?;

        if !is_file_name_safe(&fields.product_id) {
            tracing::warn!(
                "Product id '{}' is stored as '{}'; ids differing only in reserved characters share one file",
                fields.product_id,
                sanitize_file_name(&fields.product_id)
            );
        }

        let downloads = match &self.downloader {
            Some(downloader) => {
                downloader
                    .download_all(&self.fetcher, &fields.product_id, &fields.asset_refs)
                    .await
            }
            None => DownloadOutcome::default(),
        };

        let context = RecordContext {
            category: entry.category.clone(),
            default_brand: self.config.site.brand.clone(),
        };
        let record = assemble(fields, &context, downloads.manifest);
        let path = self.writer.write(&record)?;

        tracing::info!(
            "Wrote {} ({}, {} assets)",
            record.product_id,
            record.status.as_str(),
            record.assets.as_ref().map_or(0, |a| a.len())
        );

        Ok(ProductOutcome {
            product_id: record.product_id,
            path,
            assets_downloaded: downloads.downloaded,
            assets_reused: downloads.reused,
            asset_failures: downloads.failures,
        })
    }
}

/// Runs a complete harvest with the Baldor extractor
///
/// # Arguments
///
/// * `config` - The validated harvest configuration
///
/// # Returns
///
/// * `Ok(RunSummary)` - The run completed, possibly with skipped products
/// * `Err(HarvestError)` - The run could not start or lost its output directory
pub async fn run_harvest(config: Config) -> Result<RunSummary, HarvestError> {
    Harvester::new(config)?.run().await
}
