//! Run statistics
//!
//! Counters collected by the pipeline during one attempt, logged when the
//! attempt ends and printed by the CLI.

use std::time::Duration;

/// Harvest statistics summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarvestStats {
    /// Attempt number the statistics belong to
    pub attempt: u32,

    /// Categories in the fetched tree
    pub categories: usize,

    /// Slugs that occur more than once in the tree
    pub duplicate_slugs: usize,

    /// Categories visited while resolving the scope
    pub visited: usize,

    /// Leaf categories selected for scraping
    pub targets: usize,

    /// Listing pages fetched
    pub pages: u64,

    /// Categories abandoned after exhausting retries
    pub failed_targets: usize,

    /// Products returned by the listing stage
    pub raw_products: usize,

    /// Products dropped by the blacklist re-check
    pub out_of_scope: usize,

    /// Products dropped because their slug was already seen
    pub duplicate_products: usize,

    /// Products that completed enrichment
    pub enriched: usize,

    /// Details returned without characteristics
    pub missing_characteristics: usize,

    /// Products dropped because their detail lookup failed
    pub detail_failures: usize,

    pub elapsed: Duration,
}

impl HarvestStats {
    pub fn new(attempt: u32) -> Self {
        Self {
            attempt,
            ..Default::default()
        }
    }

    /// Share of in-scope products that made it into the output, in percent
    pub fn enrichment_rate(&self) -> f64 {
        let in_scope = self
            .raw_products
            .saturating_sub(self.out_of_scope + self.duplicate_products);
        if in_scope == 0 {
            return 0.0;
        }
        (self.enriched as f64 / in_scope as f64) * 100.0
    }

    /// Emits the statistics as one structured log event
    pub fn log(&self) {
        tracing::info!(
            attempt = self.attempt,
            categories = self.categories,
            targets = self.targets,
            pages = self.pages,
            failed_targets = self.failed_targets,
            raw_products = self.raw_products,
            out_of_scope = self.out_of_scope,
            duplicates = self.duplicate_products,
            enriched = self.enriched,
            detail_failures = self.detail_failures,
            elapsed_secs = self.elapsed.as_secs(),
            "Harvest statistics"
        );
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStats) {
    println!("=== Harvest Statistics ===\n");

    println!("Categories:");
    println!("  In tree: {}", stats.categories);
    if stats.duplicate_slugs > 0 {
        println!("  Duplicate slugs: {}", stats.duplicate_slugs);
    }
    println!("  Visited: {}", stats.visited);
    println!("  Selected for scraping: {}", stats.targets);
    println!("  Abandoned: {}", stats.failed_targets);
    println!();

    println!("Products:");
    println!("  Listing pages: {}", stats.pages);
    println!("  Fetched: {}", stats.raw_products);
    println!("  Out of scope: {}", stats.out_of_scope);
    println!("  Duplicates: {}", stats.duplicate_products);
    println!("  Enriched: {}", stats.enriched);
    println!("  Without characteristics: {}", stats.missing_characteristics);
    println!("  Detail failures: {}", stats.detail_failures);
    println!();

    println!(
        "Enrichment Rate: {:.1}% ({} products written)",
        stats.enrichment_rate(),
        stats.enriched
    );
    println!(
        "Attempt {} finished in {:.1}s",
        stats.attempt,
        stats.elapsed.as_secs_f64()
    );
}
