//! Asset downloads
//!
//! Images, manuals, drawings and CAD files referenced by a product page are
//! stored next to the product's JSON record and listed in its `assets` field.

mod downloader;

pub use downloader::{AssetDownloader, DownloadOutcome};
