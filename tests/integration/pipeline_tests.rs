//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the catalog API and run the
//! supervised pipeline end-to-end over HTTP, writing real CSV files.

use catalog_harvest::config::{
    ApiConfig, CategoriesConfig, Config, DelayRange, OutputConfig, RestartConfig, RetryConfig,
    ShopContext, WorkersConfig,
};
use catalog_harvest::crawler::{harvest, HarvestMode, HttpSource, Sleeper, SupervisedRun};
use catalog_harvest::output::CsvOutput;
use catalog_harvest::Termination;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Skips every delay so retries and restarts run instantly
struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, output_dir: &Path) -> Config {
    let mut headers = BTreeMap::new();
    headers.insert("Accept".to_string(), "application/json".to_string());

    Config {
        api: ApiConfig {
            base_url: format!("{}/", base_url),
            request_timeout: 5,
            headers,
        },
        retry: RetryConfig {
            delay_range: DelayRange::Range([0, 1]),
            backoff_factor: 0.5,
            max_retries: 2,
        },
        workers: WorkersConfig {
            max_threads: 3,
            products_limit: 2,
        },
        context: ShopContext {
            city_id: "463573".to_string(),
            shop_id: "104".to_string(),
            delivery_method: "pickup".to_string(),
        },
        categories: CategoriesConfig {
            include: vec!["/dlya-zhivotnyh/".to_string()],
            exclude: vec!["/korma-dlya-ptits/".to_string()],
        },
        restart: RestartConfig {
            interval_minutes: 0,
            count: 2,
        },
        output: OutputConfig {
            directory: output_dir.display().to_string(),
        },
    }
}

fn category_tree() -> Value {
    json!([
        {
            "id": 10, "slug": "dlya-zhivotnyh", "title": "Для животных",
            "children": [
                {"id": 11, "slug": "korma-dlya-koshek", "title": "Корма для кошек", "children": []},
                {"id": 12, "slug": "korma-dlya-ptits", "title": "Корма для птиц", "children": []}
            ]
        },
        {"id": 20, "slug": "hozyaystvo", "title": "Хозяйство", "children": []}
    ])
}

fn product(slug: &str, title: &str) -> Value {
    json!({
        "slug": slug,
        "title": title,
        "sku": 4100242804u64,
        "price": {"basePrice": "134.99", "price": 99.9},
        "categories": [{
            "slug": "korma-dlya-koshek",
            "title": "Корма для кошек",
            "parent": {"slug": "dlya-zhivotnyh", "title": "Для животных", "parent": null}
        }],
        "tradeMark": {"title": "Whiskas"},
        "gallery": [{"file": {"url": format!("/upload/{}.jpg", slug)}}],
        "productBranchStocks": [{"shopId": 104, "quantity": 3}]
    })
}

fn listing(items: Vec<Value>, page: u32, pages: u32) -> Value {
    json!({"items": items, "pagination": {"page": page, "pages": pages, "total": 3}})
}

fn detail(country: &str) -> Value {
    json!({"characteristics": [{"productProp": {"code": "country"}, "value": country}]})
}

/// Mounts a catalog with one target category of three products over two pages
async fn mount_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/catalog/categories"))
        .and(query_param("withChildren", "true"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(category_tree()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/catalog/products"))
        .and(query_param("categoryIdOrSlug", "korma-dlya-koshek"))
        .and(query_param("contextCityId", "463573"))
        .and(query_param("shopIds[]", "104"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(
            vec![
                product("whiskas-85g", "Корм Whiskas\n85 г"),
                product("felix-75g", "Корм \"Felix\""),
            ],
            1,
            2,
        )))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/catalog/products"))
        .and(query_param("categoryIdOrSlug", "korma-dlya-koshek"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing(
            vec![product("sheba-80g", "Корм Sheba")],
            2,
            2,
        )))
        .mount(server)
        .await;

    for (slug, country) in [("whiskas-85g", "Россия"), ("sheba-80g", "Таиланд")] {
        Mock::given(method("GET"))
            .and(path(format!("/api/catalog/products/{}", slug)))
            .and(query_param("deliveryType", "pickup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(detail(country)))
            .mount(server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path("/api/catalog/products/felix-75g"))
        .respond_with(ResponseTemplate::new(503))
        .mount(server)
        .await;
}

/// Runs the blocking harvester off the async runtime
async fn run_harvest(config: Config, mode: HarvestMode) -> SupervisedRun {
    tokio::task::spawn_blocking(move || {
        let source = HttpSource::new(&config.api).expect("Failed to build HTTP client");
        let output = CsvOutput::new(&config.output.directory);
        harvest(&config, &source, &output, Arc::new(NoSleep), mode)
    })
    .await
    .expect("Harvest task panicked")
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("Failed to read output file")
        .lines()
        .map(str::to_owned)
        .collect()
}

#[tokio::test]
async fn test_full_harvest_writes_tables() {
    let mock_server = MockServer::start().await;
    mount_catalog(&mock_server).await;
    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    let run = run_harvest(config, HarvestMode::Full).await;

    assert_eq!(run.termination, Termination::Success { attempts: 1 });
    let stats = run.stats.expect("Successful run should report statistics");
    assert_eq!(stats.targets, 1);
    assert_eq!(stats.pages, 2);
    assert_eq!(stats.raw_products, 3);
    assert_eq!(stats.enriched, 2);
    assert_eq!(stats.detail_failures, 1);

    let categories = read_lines(&temp_dir.path().join("categories.csv"));
    assert_eq!(
        categories,
        vec![
            "original_id;title;id;parent_id",
            "10;\"Для животных\";\"dlya-zhivotnyh\";",
            "11;\"Корма для кошек\";\"korma-dlya-koshek\";\"dlya-zhivotnyh\"",
            "20;\"Хозяйство\";\"hozyaystvo\";",
        ]
    );

    let targets = read_lines(&temp_dir.path().join("categories_to_parse.csv"));
    assert_eq!(targets.len(), 2);
    assert!(targets[1].starts_with("11;"));

    let products = read_lines(&temp_dir.path().join("products.csv"));
    assert_eq!(
        products[0],
        "price_datetime;price;price_promo;sku_status;sku_instock;sku_article;sku_name;\
         sku_category;sku_brand;sku_country;sku_link;sku_images"
    );
    assert_eq!(products.len(), 3);

    let base = mock_server.uri();
    let sheba: Vec<&str> = products[1].split(';').collect();
    assert_eq!(sheba.len(), 12);
    assert_eq!(&sheba[1..6], ["134.99", "99.90", "1", "3", "\"4100242804\""]);
    assert_eq!(sheba[6], "\"Корм Sheba\"");
    assert_eq!(sheba[7], "\"Для животных|Корма для кошек\"");
    assert_eq!(sheba[8], "\"Whiskas\"");
    assert_eq!(sheba[9], "\"Таиланд\"");
    assert_eq!(sheba[10], format!("\"{}/catalog/product/sheba-80g\"", base));
    assert_eq!(sheba[11], format!("\"{}/upload/sheba-80g.jpg\"", base));

    let whiskas: Vec<&str> = products[2].split(';').collect();
    assert_eq!(whiskas[6], "\"Корм Whiskas85 г\"");
    assert_eq!(whiskas[9], "\"Россия\"");
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/catalog/categories"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    mount_catalog(&mock_server).await;

    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    let run = run_harvest(config, HarvestMode::CategoriesOnly).await;

    assert_eq!(run.termination, Termination::Success { attempts: 1 });
    assert!(temp_dir.path().join("categories.csv").exists());
    assert!(!temp_dir.path().join("products.csv").exists());
}

#[tokio::test]
async fn test_unreachable_catalog_exhausts_restarts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/catalog/categories"))
        .respond_with(ResponseTemplate::new(502))
        .expect(6)
        .mount(&mock_server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    let run = run_harvest(config, HarvestMode::Full).await;

    // two attempts of three requests each
    assert_eq!(run.termination, Termination::Exhausted { attempts: 2 });
    assert!(run.stats.is_none());
    assert!(!temp_dir.path().join("categories.csv").exists());
}

#[tokio::test]
async fn test_malformed_listing_fails_the_attempt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/catalog/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .with_priority(1)
        .mount(&mock_server)
        .await;
    mount_catalog(&mock_server).await;

    let temp_dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), temp_dir.path());

    let run = run_harvest(config, HarvestMode::Full).await;

    assert_eq!(run.termination, Termination::Exhausted { attempts: 2 });
    assert!(!temp_dir.path().join("products.csv").exists());
}
