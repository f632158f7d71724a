use serde::Deserialize;

/// Main configuration structure for Catalog-Harvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Target site description
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Scheme and host of the vendor site, without a trailing slash
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path prefix of product detail pages; product URLs are `{base}{catalog}/{code}`
    #[serde(rename = "catalog-path")]
    pub catalog_path: String,

    /// Path of the paginated product listing API
    #[serde(rename = "api-path")]
    pub api_path: String,

    /// Language requested from the listing API
    pub language: String,

    /// Brand applied to records whose page does not name one
    pub brand: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.baldor.com".to_string(),
            catalog_path: "/catalog".to_string(),
            api_path: "/api/products".to_string(),
            language: "en-US".to_string(),
            brand: Some("Baldor-Reliance".to_string()),
        }
    }
}

/// Catalog enumeration configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Categories to crawl; discovered from the catalog page when empty
    pub categories: Vec<CategoryEntry>,

    /// Number of products requested per listing page
    #[serde(rename = "page-size")]
    pub page_size: u32,

    /// Safety limit on listing pages fetched for one category
    #[serde(rename = "max-pages-per-category")]
    pub max_pages_per_category: u32,

    /// Maximum number of products processed in one run
    #[serde(rename = "max-products")]
    pub max_products: Option<u32>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            page_size: 1000,
            max_pages_per_category: 500,
            max_products: None,
        }
    }
}

/// A catalog category
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryEntry {
    /// Numeric category id used by the listing API
    pub id: u32,

    /// Display name, written into each record's `category` field
    pub name: Option<String>,
}

/// HTTP client behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Total request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Retries for throttled (429) and transient 5xx responses
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base backoff between retries; doubled on every attempt
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Minimum time between two requests to the site (milliseconds)
    #[serde(rename = "min-request-interval-ms")]
    pub min_request_interval_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36"
                .to_string(),
            timeout_secs: 10,
            connect_timeout_secs: 5,
            max_retries: 5,
            retry_backoff_ms: 300,
            min_request_interval_ms: 250,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving `<product_id>.json` files and asset folders
    pub directory: String,

    /// Whether images, manuals and drawings are downloaded
    #[serde(rename = "download-assets")]
    pub download_assets: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "output".to_string(),
            download_assets: true,
        }
    }
}
