//! Catalog-Harvest: a concurrent retail catalog scraper
//!
//! This crate walks a retailer's category tree, pulls every in-scope product
//! through the paginated catalog API, enriches each product with a detail
//! lookup and writes normalized CSV tables. Whole runs are supervised and
//! restarted from a clean state on failure.

pub mod catalog;
pub mod config;
pub mod crawler;
pub mod output;
pub mod product;

#[cfg(test)]
pub(crate) mod test_support;

use output::OutputError;
use thiserror::Error;

/// Main error type for Catalog-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Invalid JSON from {url}: {source}")]
    Json {
        url: String,
        source: serde_json::Error,
    },

    #[error("Unrecognized response shape from {url}: {source}")]
    MalformedResponse {
        url: String,
        source: serde_json::Error,
    },

    #[error("Category tree unavailable: {0}")]
    CategoriesUnavailable(String),

    #[error("Worker {worker} of the {pool} pool panicked")]
    WorkerPanicked { pool: &'static str, worker: usize },

    #[error("Invalid request header: {0}")]
    InvalidHeader(String),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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

/// Result type alias for Catalog-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use catalog::{resolve, CategoryFilter, CategoryTree, Resolution};
pub use config::Config;
pub use crawler::{harvest, Backoff, HarvestMode, Pipeline, Supervisor, Termination};
pub use output::{CsvOutput, HarvestStats, OutputHandler};
