//! Listing stage: paginate every target category into raw products

use super::endpoints::Endpoints;
use super::fetcher::JsonSource;
use super::pool::run_pool;
use super::queue::{Sink, WorkQueue};
use super::retry::Backoff;
use crate::config::ShopContext;
use crate::product::{ListingPage, RawProduct};
use crate::HarvestError;
use chrono::Local;
use tracing::Span;

/// A category queued for pagination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeTarget {
    pub slug: String,
    pub title: String,
}

/// What the listing stage produced
#[derive(Debug, Default)]
pub struct ListingOutcome {
    pub products: Vec<RawProduct>,
    pub pages: u64,
    pub failed_targets: usize,
}

#[derive(Debug, Default)]
struct WorkerReport {
    pages: u64,
    failed_targets: usize,
}

pub struct ListingFetcher<'a> {
    source: &'a dyn JsonSource,
    endpoints: &'a Endpoints,
    backoff: &'a Backoff,
    context: &'a ShopContext,
    page_size: u32,
}

impl<'a> ListingFetcher<'a> {
    pub fn new(
        source: &'a dyn JsonSource,
        endpoints: &'a Endpoints,
        backoff: &'a Backoff,
        context: &'a ShopContext,
        page_size: u32,
    ) -> Self {
        Self {
            source,
            endpoints,
            backoff,
            context,
            page_size,
        }
    }

    /// Drains `targets` with at most `max_threads` workers
    ///
    /// A category whose page request exhausts its retries is abandoned; the
    /// pages collected before that point are kept. A page that decodes to an
    /// unexpected shape aborts the whole stage.
    pub fn run(
        &self,
        targets: WorkQueue<ScrapeTarget>,
        max_threads: usize,
        span: &Span,
    ) -> Result<ListingOutcome, HarvestError> {
        let workers = max_threads.min(targets.len());
        tracing::info!(
            "Fetching {} categories with {} workers",
            targets.len(),
            workers
        );

        let sink = Sink::new();
        let reports = run_pool("fetch", workers, span, |_| self.drain(&targets, &sink))?;

        let mut outcome = ListingOutcome {
            products: sink.into_inner(),
            ..Default::default()
        };
        for report in reports {
            outcome.pages += report.pages;
            outcome.failed_targets += report.failed_targets;
        }
        Ok(outcome)
    }

    fn drain(
        &self,
        targets: &WorkQueue<ScrapeTarget>,
        sink: &Sink<RawProduct>,
    ) -> Result<WorkerReport, HarvestError> {
        let mut report = WorkerReport::default();
        while let Some(target) = targets.pop() {
            match self.paginate(&target, sink)? {
                Some(pages) => report.pages += pages,
                None => report.failed_targets += 1,
            }
        }
        Ok(report)
    }

    /// Fetches pages 1..=pages of one category
    ///
    /// Returns the number of pages fetched, or `None` when a page request
    /// ran out of retries.
    fn paginate(
        &self,
        target: &ScrapeTarget,
        sink: &Sink<RawProduct>,
    ) -> Result<Option<u64>, HarvestError> {
        let mut page = 1;
        let mut fetched = 0;

        loop {
            let url = self
                .endpoints
                .listing(&target.slug, self.context, page, self.page_size);
            let body = match self.backoff.call(url.as_str(), || self.source.get_json(&url)) {
                Ok(body) => body,
                Err(exhausted) => {
                    tracing::error!(
                        "Giving up on category '{}' at page {}: {}",
                        target.slug,
                        page,
                        exhausted
                    );
                    return Ok(None);
                }
            };

            let listing: ListingPage =
                serde_json::from_value(body).map_err(|source| HarvestError::MalformedResponse {
                    url: url.to_string(),
                    source,
                })?;
            let received_at = Local::now();

            if page == 1 {
                tracing::info!(
                    "Category '{}' ({}): {} products on {} pages",
                    target.title,
                    target.slug,
                    listing.pagination.total,
                    listing.pagination.pages
                );
            }
            tracing::debug!(
                "Page {}/{} of '{}': {} products",
                page,
                listing.pagination.pages,
                target.slug,
                listing.items.len()
            );

            let is_last = listing.pagination.is_last();
            sink.append(
                listing
                    .items
                    .into_iter()
                    .map(|record| RawProduct::new(record, received_at))
                    .collect(),
            );
            fetched += 1;

            if is_last {
                return Ok(Some(fetched));
            }
            page += 1;
        }
    }
}
