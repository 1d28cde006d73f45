use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure for Catalog-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub workers: WorkersConfig,
    pub context: ShopContext,
    #[serde(default)]
    pub categories: CategoriesConfig,
    pub restart: RestartConfig,
    pub output: OutputConfig,
}

/// Catalog API access
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Site root, e.g. `https://novex.ru/`. API endpoints and product links hang off it.
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

fn default_request_timeout() -> u64 {
    5
}

/// Delay drawn before the first attempt of every request
///
/// Written either as a scalar (`delay-range = 2`, `0` for no delay) or as an
/// inclusive range of whole seconds (`delay-range = [1, 3]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DelayRange {
    Fixed(u64),
    Range([u64; 2]),
}

impl DelayRange {
    pub fn bounds(&self) -> (u64, u64) {
        match *self {
            DelayRange::Fixed(secs) => (secs, secs),
            DelayRange::Range([low, high]) => (low, high),
        }
    }

    /// Upper bound used as the base of the retry backoff; a zero range counts as one second.
    pub fn backoff_base(&self) -> u64 {
        match self.bounds().1 {
            0 => 1,
            high => high,
        }
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        DelayRange::Fixed(0)
    }
}

/// Retry behavior for every network call
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(rename = "delay-range", default)]
    pub delay_range: DelayRange,

    /// Multiplicative growth of the delay between retries
    #[serde(rename = "backoff-factor")]
    pub backoff_factor: f64,

    /// Retries allowed after the first failed attempt
    #[serde(rename = "max-retries")]
    pub max_retries: u32,
}

/// Worker pool sizing
#[derive(Debug, Clone, Deserialize)]
pub struct WorkersConfig {
    /// Threads used by both the listing and the enrichment stage
    #[serde(rename = "max-threads")]
    pub max_threads: usize,

    /// Page size requested from the listing endpoint
    #[serde(rename = "products-limit")]
    pub products_limit: u32,
}

/// City, shop and delivery method the prices and stocks are requested for
#[derive(Debug, Clone, Deserialize)]
pub struct ShopContext {
    #[serde(rename = "city-id")]
    pub city_id: String,

    #[serde(rename = "shop-id")]
    pub shop_id: String,

    #[serde(rename = "delivery-method")]
    pub delivery_method: String,
}

/// Category scope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoriesConfig {
    /// Slugs defining the scrape scope; empty means the whole catalog
    #[serde(default)]
    pub include: Vec<String>,

    /// Slugs whose whole subtree is skipped
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Restart supervisor policy
#[derive(Debug, Clone, Deserialize)]
pub struct RestartConfig {
    #[serde(rename = "interval-minutes")]
    pub interval_minutes: u64,

    /// Total number of runs attempted before giving up
    pub count: u32,
}

impl RestartConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving the CSV tables
    pub directory: String,
}
