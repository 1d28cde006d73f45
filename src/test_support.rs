//! Shared fixtures for unit tests

use crate::catalog::{CategoryNode, SourceId};
use crate::config::{
    ApiConfig, CategoriesConfig, Config, DelayRange, OutputConfig, RestartConfig, RetryConfig,
    ShopContext, WorkersConfig,
};
use crate::crawler::{JsonSource, Sleeper};
use crate::output::{OutputHandler, OutputResult, Table, TableKind};
use crate::product::{CategoryRef, Price, ProductRecord};
use crate::HarvestError;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// A valid configuration with no delays, so retries only "sleep" on the test sleeper
pub fn sample_config(base_url: &str) -> Config {
    Config {
        api: ApiConfig {
            base_url: base_url.to_string(),
            request_timeout: 5,
            headers: Default::default(),
        },
        retry: RetryConfig {
            delay_range: DelayRange::Fixed(0),
            backoff_factor: 0.0,
            max_retries: 2,
        },
        workers: WorkersConfig {
            max_threads: 4,
            products_limit: 2,
        },
        context: ShopContext {
            city_id: "463573".to_string(),
            shop_id: "104".to_string(),
            delivery_method: "pickup".to_string(),
        },
        categories: CategoriesConfig::default(),
        restart: RestartConfig {
            interval_minutes: 0,
            count: 3,
        },
        output: OutputConfig {
            directory: "results".to_string(),
        },
    }
}

static NEXT_NODE_ID: AtomicI64 = AtomicI64::new(1000);

pub fn branch(slug: &str, title: &str, children: Vec<CategoryNode>) -> CategoryNode {
    CategoryNode {
        id: SourceId::Number(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)),
        slug: slug.to_string(),
        title: title.to_string(),
        children: Some(children),
    }
}

pub fn leaf(slug: &str, title: &str) -> CategoryNode {
    CategoryNode {
        id: SourceId::Number(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)),
        slug: slug.to_string(),
        title: title.to_string(),
        children: None,
    }
}

/// A product whose single category reference carries `chain` (leaf first) as nested parents
pub fn product_record(slug: &str, chain: &[(&str, &str)]) -> ProductRecord {
    let category = chain.iter().rev().fold(None, |parent, (cat_slug, title)| {
        Some(Box::new(CategoryRef {
            id: None,
            slug: Some(cat_slug.to_string()),
            title: title.to_string(),
            parent,
        }))
    });

    ProductRecord {
        slug: slug.to_string(),
        title: format!("Product {}", slug),
        sku: Some(format!("SKU-{}", slug)),
        price: Price {
            base_price: 100.0,
            price: 90.0,
        },
        categories: category.map(|c| vec![*c]).unwrap_or_default(),
        trade_mark: None,
        gallery: None,
        stock: None,
    }
}

/// Listing item JSON as served by the catalog API
pub fn product_json(slug: &str, category_slug: &str, category_title: &str) -> Value {
    json!({
        "slug": slug,
        "title": format!("Product {}", slug),
        "sku": format!("SKU-{}", slug),
        "price": {"basePrice": "100.00", "price": 90},
        "categories": [{"slug": category_slug, "title": category_title, "parent": null}],
        "tradeMark": "Brand",
        "gallery": [{"file": {"url": format!("/upload/{}.jpg", slug)}}],
        "productBranchStocks": 3
    })
}

pub fn listing_json(items: Vec<Value>, page: u32, pages: u32) -> Value {
    json!({
        "items": items,
        "pagination": {"page": page, "pages": pages, "total": 0}
    })
}

pub fn detail_json(country: &str) -> Value {
    json!({
        "characteristics": [
            {"productProp": {"code": "country"}, "value": country}
        ]
    })
}

enum Reply {
    Json(Value),
    Fail,
}

impl Reply {
    fn to_result(&self) -> Result<Value, HarvestError> {
        match self {
            Reply::Json(body) => Ok(body.clone()),
            Reply::Fail => Err(stub_failure()),
        }
    }
}

fn stub_failure() -> HarvestError {
    HarvestError::Io(io::Error::new(
        io::ErrorKind::ConnectionReset,
        "stubbed failure",
    ))
}

/// In-memory `JsonSource` keyed by full URL
///
/// One-shot replies queued with `once`/`fail_once` are served before the
/// standing reply registered with `on`/`fail`. Unknown URLs fail.
#[derive(Default)]
pub struct StubSource {
    standing: Mutex<HashMap<String, Reply>>,
    queued: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<String>>,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, url: impl AsRef<str>, body: Value) {
        self.standing
            .lock()
            .unwrap()
            .insert(url.as_ref().to_string(), Reply::Json(body));
    }

    pub fn fail(&self, url: impl AsRef<str>) {
        self.standing
            .lock()
            .unwrap()
            .insert(url.as_ref().to_string(), Reply::Fail);
    }

    pub fn once(&self, url: impl AsRef<str>, body: Value) {
        self.enqueue(url.as_ref(), Reply::Json(body));
    }

    pub fn fail_once(&self, url: impl AsRef<str>) {
        self.enqueue(url.as_ref(), Reply::Fail);
    }

    fn enqueue(&self, url: &str, reply: Reply) {
        self.queued
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn calls_to(&self, url: impl AsRef<str>) -> usize {
        let url = url.as_ref();
        self.calls.lock().unwrap().iter().filter(|c| *c == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl JsonSource for StubSource {
    fn get_json(&self, url: &Url) -> Result<Value, HarvestError> {
        let key = url.to_string();
        self.calls.lock().unwrap().push(key.clone());

        if let Some(reply) = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
        {
            return reply.to_result();
        }

        match self.standing.lock().unwrap().get(&key) {
            Some(reply) => reply.to_result(),
            None => Err(stub_failure()),
        }
    }
}

/// Records requested delays instead of sleeping
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

/// Keeps written tables in memory
#[derive(Debug, Default)]
pub struct MemoryOutput {
    tables: Mutex<HashMap<TableKind, Table>>,
}

impl MemoryOutput {
    pub fn table(&self, kind: TableKind) -> Option<Table> {
        self.tables.lock().unwrap().get(&kind).cloned()
    }
}

impl OutputHandler for MemoryOutput {
    fn write_table(&self, kind: TableKind, table: &Table) -> OutputResult<()> {
        self.tables.lock().unwrap().insert(kind, table.clone());
        Ok(())
    }
}
