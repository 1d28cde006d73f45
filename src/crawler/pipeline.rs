//! Harvest pipeline - one complete attempt
//!
//! This module contains the orchestration of a single run:
//! - Fetching the category tree and resolving the scrape scope
//! - Writing the category tables
//! - Paginating every target category (listing pool)
//! - Re-checking fetched products against the exclude list
//! - Looking up product details (enrichment pool)
//! - Writing the product table
//!
//! A `Pipeline` is built fresh for every attempt and consumed by its run.

use super::endpoints::Endpoints;
use super::enrich::Enricher;
use super::fetcher::JsonSource;
use super::listing::{ListingFetcher, ScrapeTarget};
use super::queue::WorkQueue;
use super::retry::{Backoff, Sleeper};
use super::supervisor::{RestartPolicy, Supervisor, Termination};
use crate::catalog::{resolve, CategoryFilter, CategoryNode, CategoryTree, Resolution};
use crate::config::Config;
use crate::output::rows::{category_table, product_table};
use crate::output::{HarvestStats, OutputHandler, TableKind};
use crate::product::{EnrichedProduct, RawProduct};
use crate::HarvestError;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Span;

/// What a supervised run does on each attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestMode {
    /// Categories, listings, enrichment and all three tables
    Full,
    /// Category tree and the two category tables only
    CategoriesOnly,
}

/// Result of [`harvest`]
#[derive(Debug, Clone)]
pub struct SupervisedRun {
    pub termination: Termination,
    /// Statistics of the successful attempt, if any
    pub stats: Option<HarvestStats>,
    /// Wall-clock time of all attempts, restart intervals included
    pub elapsed: Duration,
}

/// Runs the harvest under the restart supervisor configured in `config`
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `source` - Where JSON documents are fetched from
/// * `output` - Where tables are written
/// * `sleeper` - Used for retry delays and restart intervals
/// * `mode` - Which stages each attempt runs
pub fn harvest(
    config: &Config,
    source: &dyn JsonSource,
    output: &dyn OutputHandler,
    sleeper: Arc<dyn Sleeper>,
    mode: HarvestMode,
) -> SupervisedRun {
    let started = Instant::now();
    let supervisor = Supervisor::new(RestartPolicy::from_config(&config.restart), sleeper.clone());
    let mut stats = None;

    let termination = supervisor.supervise(|attempt| -> Result<(), HarvestError> {
        let pipeline = Pipeline::new(config, source, output, sleeper.clone(), attempt)?;
        stats = Some(match mode {
            HarvestMode::Full => pipeline.run()?,
            HarvestMode::CategoriesOnly => pipeline.run_categories()?,
        });
        Ok(())
    });

    SupervisedRun {
        termination,
        stats,
        elapsed: started.elapsed(),
    }
}

/// State of one harvest attempt
pub struct Pipeline<'a> {
    config: &'a Config,
    source: &'a dyn JsonSource,
    output: &'a dyn OutputHandler,
    endpoints: Endpoints,
    backoff: Backoff,
    filter: CategoryFilter,
    span: Span,
    stats: HarvestStats,
}

impl<'a> Pipeline<'a> {
    /// Creates a new pipeline instance
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `source` - Where JSON documents are fetched from
    /// * `output` - Where tables are written
    /// * `sleeper` - Used by the retry backoff
    /// * `attempt` - 1-based attempt number, recorded on the `harvest` span
    pub fn new(
        config: &'a Config,
        source: &'a dyn JsonSource,
        output: &'a dyn OutputHandler,
        sleeper: Arc<dyn Sleeper>,
        attempt: u32,
    ) -> Result<Self, HarvestError> {
        Ok(Self {
            config,
            source,
            output,
            endpoints: Endpoints::new(&config.api.base_url)?,
            backoff: Backoff::new(&config.retry, sleeper),
            filter: CategoryFilter::from_config(&config.categories),
            span: tracing::info_span!("harvest", attempt),
            stats: HarvestStats::new(attempt),
        })
    }

    /// Runs every stage and writes all three tables
    pub fn run(mut self) -> Result<HarvestStats, HarvestError> {
        let span = self.span.clone();
        let _entered = span.enter();
        let started = Instant::now();
        tracing::info!("Starting harvest");

        let (tree, resolution) = self.resolve_scope()?;
        let raw = self.fetch_products(&tree, &resolution)?;
        let in_scope = self.retain_in_scope(raw);
        let enriched = self.enrich(in_scope)?;
        self.write_products(&tree, &enriched)?;

        Ok(self.finish(started))
    }

    /// Fetches and resolves the category tree and writes the category tables
    pub fn run_categories(mut self) -> Result<HarvestStats, HarvestError> {
        let span = self.span.clone();
        let _entered = span.enter();
        let started = Instant::now();
        tracing::info!("Starting category resolution");

        self.resolve_scope()?;

        Ok(self.finish(started))
    }

    fn fetch_tree(&self) -> Result<CategoryTree, HarvestError> {
        tracing::info!("Getting all categories and subcategories");
        let url = self.endpoints.categories();

        let body = self
            .backoff
            .call(url.as_str(), || self.source.get_json(url))
            .map_err(|exhausted| HarvestError::CategoriesUnavailable(exhausted.to_string()))?;

        let roots: Vec<CategoryNode> =
            serde_json::from_value(body).map_err(|source| HarvestError::MalformedResponse {
                url: url.to_string(),
                source,
            })?;

        Ok(CategoryTree::from_nodes(roots))
    }

    fn resolve_scope(&mut self) -> Result<(CategoryTree, Resolution), HarvestError> {
        let tree = self.fetch_tree()?;
        let resolution = resolve(&tree, &self.filter);

        self.stats.categories = tree.len();
        self.stats.duplicate_slugs = tree.duplicate_slugs().len();
        self.stats.visited = resolution.visited.len();
        self.stats.targets = resolution.targets.len();
        tracing::info!(
            "{} categories in tree, {} visited, {} selected for scraping",
            tree.len(),
            resolution.visited.len(),
            resolution.targets.len()
        );

        self.output.write_table(
            TableKind::Categories,
            &category_table(&tree, &resolution.visited),
        )?;
        self.output.write_table(
            TableKind::CategoriesToParse,
            &category_table(&tree, &resolution.targets),
        )?;

        Ok((tree, resolution))
    }

    fn fetch_products(
        &mut self,
        tree: &CategoryTree,
        resolution: &Resolution,
    ) -> Result<Vec<RawProduct>, HarvestError> {
        let targets: WorkQueue<ScrapeTarget> = resolution
            .targets
            .iter()
            .map(|&id| {
                let category = tree.get(id);
                ScrapeTarget {
                    slug: category.slug.clone(),
                    title: category.title.clone(),
                }
            })
            .collect();

        let fetcher = ListingFetcher::new(
            self.source,
            &self.endpoints,
            &self.backoff,
            &self.config.context,
            self.config.workers.products_limit,
        );
        let outcome = fetcher.run(targets, self.config.workers.max_threads, &self.span)?;

        self.stats.pages = outcome.pages;
        self.stats.failed_targets = outcome.failed_targets;
        self.stats.raw_products = outcome.products.len();
        tracing::info!(
            "Fetched {} products from {} pages ({} categories abandoned)",
            outcome.products.len(),
            outcome.pages,
            outcome.failed_targets
        );

        Ok(outcome.products)
    }

    /// Drops products filed under an excluded category, and repeated slugs
    fn retain_in_scope(&mut self, products: Vec<RawProduct>) -> Vec<RawProduct> {
        let mut seen = HashSet::with_capacity(products.len());
        let mut kept = Vec::with_capacity(products.len());

        for product in products {
            if let Some(slug) = self.filter.excluded_category(&product.record) {
                tracing::debug!(
                    "Product '{}' is out of scope (category '{}')",
                    product.slug(),
                    slug
                );
                self.stats.out_of_scope += 1;
                continue;
            }
            if !seen.insert(product.slug().to_string()) {
                self.stats.duplicate_products += 1;
                continue;
            }
            kept.push(product);
        }

        tracing::info!(
            "{} products in scope ({} out of scope, {} duplicates)",
            kept.len(),
            self.stats.out_of_scope,
            self.stats.duplicate_products
        );
        kept
    }

    fn enrich(&mut self, products: Vec<RawProduct>) -> Result<Vec<EnrichedProduct>, HarvestError> {
        let enricher = Enricher::new(
            self.source,
            &self.endpoints,
            &self.backoff,
            &self.config.context,
        );
        let outcome = enricher.run(
            products.into_iter().collect(),
            self.config.workers.max_threads,
            &self.span,
        )?;

        self.stats.enriched = outcome.products.len();
        self.stats.missing_characteristics = outcome.missing_characteristics;
        self.stats.detail_failures = outcome.failed;
        tracing::info!(
            "Enriched {} products ({} lookups failed)",
            outcome.products.len(),
            outcome.failed
        );

        Ok(outcome.products)
    }

    fn write_products(
        &self,
        tree: &CategoryTree,
        products: &[EnrichedProduct],
    ) -> Result<(), HarvestError> {
        let table = product_table(products, tree, &self.endpoints);
        self.output.write_table(TableKind::Products, &table)?;
        Ok(())
    }

    fn finish(mut self, started: Instant) -> HarvestStats {
        self.stats.elapsed = started.elapsed();
        self.stats.log();
        tracing::info!("Execution time: {:.1}s", self.stats.elapsed.as_secs_f64());
        self.stats
    }
}
