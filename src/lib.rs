//! Catalog-Harvest: a product catalog scraper
//!
//! This crate walks a vendor's online catalog, extracts a normalized record for
//! every product page, downloads the referenced images and documents, and
//! writes one JSON file per product.

pub mod assets;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod record;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Catalog-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(#[from] FetchError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    #[error("Output directory {path} cannot be created: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// Stable label for the error kind, used in run summaries
    pub fn kind(&self) -> &'static str {
        match self {
            HarvestError::Config(_) => "config",
            HarvestError::Network(_) => "network",
            HarvestError::Extraction(_) => "extraction",
            HarvestError::Asset(_) => "asset",
            HarvestError::Write(_) => "write",
            HarvestError::OutputDir { .. } => "output-dir",
            HarvestError::Client(_) => "client",
            HarvestError::Io(_) => "io",
        }
    }

    /// Returns true if the error must abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            HarvestError::Config(_) | HarvestError::OutputDir { .. } | HarvestError::Client(_)
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while fetching a URL
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {source}")]
    Connect { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request failed for {url}: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("Invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Errors raised when a page does not match the expected product layout
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Required field '{field}' not found on {url}")]
    MissingField { field: &'static str, url: String },

    #[error("Unrecognized product status '{value}' on {url}")]
    UnknownStatus { value: String, url: String },

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
}

/// Errors raised while downloading a single asset
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Failed to fetch asset {url}: {source}")]
    Fetch { url: String, source: FetchError },

    #[error("Transfer of {url} interrupted: {source}")]
    Transfer { url: String, source: reqwest::Error },

    #[error("Failed to store asset at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl AssetError {
    /// The URL or path the failure relates to
    pub fn target(&self) -> String {
        match self {
            AssetError::Fetch { url, .. } | AssetError::Transfer { url, .. } => url.clone(),
            AssetError::Io { path, .. } => path.display().to_string(),
        }
    }
}

/// Errors raised while writing a product record
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to serialize record {product_id}: {source}")]
    Serialize {
        product_id: String,
        source: serde_json::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type alias for Catalog-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_harvest, Harvester};
pub use extract::{BaldorExtractor, FieldExtractor, ProductFields};
pub use record::{ProductRecord, ProductStatus};
