//! Run summary
//!
//! Counts what a harvest run produced and what it had to skip, and prints the
//! totals once the run is over.

use crate::{AssetError, HarvestError};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A product that could not be harvested
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedProduct {
    /// Product code or URL
    pub product: String,

    /// Error kind label, see [`HarvestError::kind`]
    pub kind: &'static str,

    pub message: String,
}

/// Outcome of one harvest run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Products returned by catalog enumeration
    pub products_found: usize,

    /// Records written to disk
    pub products_written: usize,

    /// Assets fetched during this run
    pub assets_downloaded: usize,

    /// Assets already present from an earlier run
    pub assets_reused: usize,

    /// Failures counted by error kind, including per-asset failures
    pub failures_by_kind: BTreeMap<&'static str, usize>,

    pub failed_products: Vec<FailedProduct>,

    /// URL or path of each asset that could not be stored
    pub failed_assets: Vec<String>,

    /// HTTP requests issued, retries included
    pub requests_made: u64,
}

impl RunSummary {
    /// Starts a summary stamped with the current time
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            products_found: 0,
            products_written: 0,
            assets_downloaded: 0,
            assets_reused: 0,
            failures_by_kind: BTreeMap::new(),
            failed_products: Vec::new(),
            failed_assets: Vec::new(),
            requests_made: 0,
        }
    }

    /// Records a product whose JSON file was written
    pub fn record_written(&mut self, assets_downloaded: usize, assets_reused: usize) {
        self.products_written += 1;
        self.assets_downloaded += assets_downloaded;
        self.assets_reused += assets_reused;
    }

    /// Records a product that was skipped
    pub fn record_failure(&mut self, product: &str, error: &HarvestError) {
        *self.failures_by_kind.entry(error.kind()).or_insert(0) += 1;
        self.failed_products.push(FailedProduct {
            product: product.to_string(),
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    /// Records an asset that could not be stored
    pub fn record_asset_failure(&mut self, error: &AssetError) {
        *self.failures_by_kind.entry("asset").or_insert(0) += 1;
        self.failed_assets.push(error.target());
    }

    pub fn finish(&mut self, requests_made: u64) {
        self.finished_at = Some(Utc::now());
        self.requests_made = requests_made;
    }

    pub fn products_failed(&self) -> usize {
        self.failed_products.len()
    }

    pub fn asset_failures(&self) -> usize {
        self.failures_by_kind.get("asset").copied().unwrap_or(0)
    }

    /// Run duration in seconds, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

/// Prints the summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Harvest Summary ===\n");

    println!("Run:");
    println!("  Started: {}", summary.started_at.to_rfc3339());
    if let Some(finished) = summary.finished_at {
        println!("  Finished: {}", finished.to_rfc3339());
    }
    if let Some(seconds) = summary.duration_seconds() {
        println!("  Duration: {}s", seconds);
    }
    println!("  HTTP requests: {}", summary.requests_made);
    println!();

    println!("Products:");
    println!("  Found: {}", summary.products_found);
    println!("  Written: {}", summary.products_written);
    println!("  Failed: {}", summary.products_failed());
    println!();

    println!("Assets:");
    println!("  Downloaded: {}", summary.assets_downloaded);
    println!("  Already present: {}", summary.assets_reused);
    println!("  Failed: {}", summary.asset_failures());
    println!();

    if !summary.failures_by_kind.is_empty() {
        println!("Failures by Kind:");
        let mut counts: Vec<_> = summary.failures_by_kind.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));

        for (kind, count) in counts {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    if !summary.failed_products.is_empty() {
        println!("Skipped Products ({}):", summary.failed_products.len());
        for failed in &summary.failed_products {
            println!("  - {} [{}] {}", failed.product, failed.kind, failed.message);
        }
        println!();
    }

    if !summary.failed_assets.is_empty() {
        println!("Failed Assets ({}):", summary.failed_assets.len());
        for target in &summary.failed_assets {
            println!("  - {}", target);
        }
        println!();
    }

    let success_rate = if summary.products_found > 0 {
        (summary.products_written as f64 / summary.products_found as f64) * 100.0
    } else {
        0.0
    };
    println!("Success Rate: {:.1}%", success_rate);
}
