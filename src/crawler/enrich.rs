//! Enrichment stage: one detail lookup per product
//!
//! The detail record contributes the country of origin. Products whose lookup
//! runs out of retries are dropped from the run; products whose detail has no
//! characteristics are kept without a country.

use super::endpoints::Endpoints;
use super::fetcher::JsonSource;
use super::pool::run_pool;
use super::queue::{Sink, WorkQueue};
use super::retry::Backoff;
use crate::config::ShopContext;
use crate::product::{EnrichedProduct, ProductDetail, RawProduct, COUNTRY_PROPERTY_CODE};
use crate::HarvestError;
use tracing::Span;

/// What the enrichment stage produced
#[derive(Debug, Default)]
pub struct EnrichOutcome {
    pub products: Vec<EnrichedProduct>,
    /// Details that carried no characteristics at all
    pub missing_characteristics: usize,
    /// Products dropped because their lookup was abandoned
    pub failed: usize,
}

#[derive(Debug, Default)]
struct WorkerReport {
    missing_characteristics: usize,
    failed: usize,
}

enum Lookup {
    Enriched {
        product: EnrichedProduct,
        had_characteristics: bool,
    },
    Abandoned,
}

pub struct Enricher<'a> {
    source: &'a dyn JsonSource,
    endpoints: &'a Endpoints,
    backoff: &'a Backoff,
    context: &'a ShopContext,
}

impl<'a> Enricher<'a> {
    pub fn new(
        source: &'a dyn JsonSource,
        endpoints: &'a Endpoints,
        backoff: &'a Backoff,
        context: &'a ShopContext,
    ) -> Self {
        Self {
            source,
            endpoints,
            backoff,
            context,
        }
    }

    pub fn run(
        &self,
        products: WorkQueue<RawProduct>,
        max_threads: usize,
        span: &Span,
    ) -> Result<EnrichOutcome, HarvestError> {
        let total = products.len();
        let workers = max_threads.min(total);
        tracing::info!("Enriching {} products with {} workers", total, workers);

        let sink = Sink::new();
        let reports = run_pool("enrich", workers, span, |_| {
            self.drain(&products, &sink, total)
        })?;

        let mut outcome = EnrichOutcome {
            products: sink.into_inner(),
            ..Default::default()
        };
        for report in reports {
            outcome.missing_characteristics += report.missing_characteristics;
            outcome.failed += report.failed;
        }
        Ok(outcome)
    }

    fn drain(
        &self,
        products: &WorkQueue<RawProduct>,
        sink: &Sink<EnrichedProduct>,
        total: usize,
    ) -> Result<WorkerReport, HarvestError> {
        let mut report = WorkerReport::default();
        while let Some(product) = products.pop() {
            tracing::debug!(
                "Enriching '{}' ({} of {} still queued)",
                product.slug(),
                products.len(),
                total
            );
            match self.lookup(product)? {
                Lookup::Enriched {
                    product,
                    had_characteristics,
                } => {
                    if !had_characteristics {
                        report.missing_characteristics += 1;
                    }
                    sink.push(product);
                }
                Lookup::Abandoned => report.failed += 1,
            }
        }
        Ok(report)
    }

    fn lookup(&self, product: RawProduct) -> Result<Lookup, HarvestError> {
        let url = self.endpoints.detail(product.slug(), self.context);
        let body = match self.backoff.call(url.as_str(), || self.source.get_json(&url)) {
            Ok(body) => body,
            Err(exhausted) => {
                tracing::error!(
                    "Dropping product '{}', detail lookup failed: {}",
                    product.slug(),
                    exhausted
                );
                return Ok(Lookup::Abandoned);
            }
        };

        let detail: ProductDetail =
            serde_json::from_value(body).map_err(|source| HarvestError::MalformedResponse {
                url: url.to_string(),
                source,
            })?;

        let (country, had_characteristics) = match detail.property(COUNTRY_PROPERTY_CODE) {
            Some(value) => (value.map(str::to_owned), true),
            None => {
                tracing::warn!("Product '{}' has no characteristics", product.slug());
                (None, false)
            }
        };

        Ok(Lookup::Enriched {
            product: EnrichedProduct {
                raw: product,
                country,
            },
            had_characteristics,
        })
    }
}
