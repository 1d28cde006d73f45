use crate::catalog::normalize_slug;
use crate::config::types::{
    ApiConfig, CategoriesConfig, Config, OutputConfig, RestartConfig, RetryConfig, ShopContext,
    WorkersConfig,
};
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};
use std::collections::HashSet;
use url::Url;

/// Upper bound on worker threads per stage
pub const MAX_THREADS: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_retry_config(&config.retry)?;
    validate_workers_config(&config.workers)?;
    validate_shop_context(&config.context)?;
    validate_categories(&config.categories)?;
    validate_restart_config(&config.restart)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates API access configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use HTTP or HTTPS",
            config.base_url
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request-timeout must be >= 1 second".to_string(),
        ));
    }

    for (name, value) in &config.headers {
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            ConfigError::Validation(format!("Invalid header name '{}'", name))
        })?;
        HeaderValue::from_str(value).map_err(|_| {
            ConfigError::Validation(format!("Invalid value for header '{}'", name))
        })?;
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    let (low, high) = config.delay_range.bounds();
    if low > high {
        return Err(ConfigError::Validation(format!(
            "delay-range lower bound {} exceeds upper bound {}",
            low, high
        )));
    }

    if !config.backoff_factor.is_finite() || config.backoff_factor < 0.0 {
        return Err(ConfigError::Validation(format!(
            "backoff-factor must be a finite number >= 0, got {}",
            config.backoff_factor
        )));
    }

    Ok(())
}

/// Validates worker pool configuration
fn validate_workers_config(config: &WorkersConfig) -> Result<(), ConfigError> {
    if config.max_threads < 1 || config.max_threads > MAX_THREADS {
        return Err(ConfigError::Validation(format!(
            "max-threads must be between 1 and {}, got {}",
            MAX_THREADS, config.max_threads
        )));
    }

    if config.products_limit < 1 {
        return Err(ConfigError::Validation(
            "products-limit must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_shop_context(config: &ShopContext) -> Result<(), ConfigError> {
    for (field, value) in [
        ("city-id", &config.city_id),
        ("shop-id", &config.shop_id),
        ("delivery-method", &config.delivery_method),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
        }
    }
    Ok(())
}

/// Validates category slugs: non-empty and never both included and excluded
fn validate_categories(config: &CategoriesConfig) -> Result<(), ConfigError> {
    let mut excluded = HashSet::new();
    for raw in &config.exclude {
        let slug = normalize_slug(raw);
        if slug.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Excluded category '{}' has an empty slug",
                raw
            )));
        }
        excluded.insert(slug);
    }

    for raw in &config.include {
        let slug = normalize_slug(raw);
        if slug.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Included category '{}' has an empty slug",
                raw
            )));
        }
        if excluded.contains(&slug) {
            return Err(ConfigError::Validation(format!(
                "Category '{}' is both included and excluded",
                slug
            )));
        }
    }

    Ok(())
}

fn validate_restart_config(config: &RestartConfig) -> Result<(), ConfigError> {
    if config.count < 1 {
        return Err(ConfigError::Validation(
            "restart count must be >= 1".to_string(),
        ));
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }
    Ok(())
}
