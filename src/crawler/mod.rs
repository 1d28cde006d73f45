//! Crawler module for catalog fetching and processing
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching of JSON documents
//! - Retry with exponential backoff
//! - Worker pools for the listing and enrichment stages
//! - Whole-run orchestration and the restart supervisor

mod endpoints;
mod enrich;
mod fetcher;
mod listing;
mod pipeline;
mod pool;
mod queue;
mod retry;
mod supervisor;

pub use endpoints::Endpoints;
pub use enrich::{EnrichOutcome, Enricher};
pub use fetcher::{build_http_client, HttpSource, JsonSource};
pub use listing::{ListingFetcher, ListingOutcome, ScrapeTarget};
pub use pipeline::{harvest, HarvestMode, Pipeline, SupervisedRun};
pub use pool::run_pool;
pub use queue::{Sink, WorkQueue};
pub use retry::{backoff_delay, Backoff, RetriesExhausted, Sleeper, ThreadSleeper};
pub use supervisor::{RestartPolicy, Supervisor, SupervisorState, Termination};
