use super::decode;
use crate::catalog::SourceId;
use chrono::{DateTime, Local};
use serde::Deserialize;
use serde_json::Value;

/// Property code of the detail characteristic that carries the country of origin
pub const COUNTRY_PROPERTY_CODE: &str = "country";

/// One listing page: `{ items: [...], pagination: { page, pages, total } }`
#[derive(Debug, Clone, Deserialize)]
pub struct ListingPage {
    pub items: Vec<ProductRecord>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub pages: u32,
    #[serde(default)]
    pub total: u64,
}

impl Pagination {
    /// True once the reported page is the last one (or the category is empty)
    pub fn is_last(&self) -> bool {
        self.pages == 0 || self.page >= self.pages
    }
}

/// A product as it appears in a listing page
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub slug: String,
    pub title: String,
    #[serde(default, deserialize_with = "decode::opt_text")]
    pub sku: Option<String>,
    pub price: Price,
    #[serde(default, deserialize_with = "decode::null_as_default")]
    pub categories: Vec<CategoryRef>,
    #[serde(default, deserialize_with = "decode::opt_text")]
    pub trade_mark: Option<String>,
    #[serde(default)]
    pub gallery: Option<Vec<GalleryImage>>,
    /// `None` when the field is absent; `Some(Value::Null)` when sent as null
    #[serde(
        rename = "productBranchStocks",
        default,
        deserialize_with = "decode::present"
    )]
    pub stock: Option<Value>,
}

impl ProductRecord {
    pub fn primary_category(&self) -> Option<&CategoryRef> {
        self.categories.first()
    }

    /// URL path of the first gallery image, if any
    pub fn first_image(&self) -> Option<&str> {
        self.gallery
            .as_ref()?
            .first()?
            .file
            .as_ref()?
            .url
            .as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Price {
    /// Regular price
    #[serde(rename = "basePrice", deserialize_with = "decode::decimal")]
    pub base_price: f64,

    /// Current (promo) price
    #[serde(deserialize_with = "decode::decimal")]
    pub price: f64,
}

/// Category reference embedded in a product, with the parent chain the API attaches
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryRef {
    #[serde(default)]
    pub id: Option<SourceId>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub parent: Option<Box<CategoryRef>>,
}

impl CategoryRef {
    /// This reference followed by its parents, leaf first
    pub fn chain(&self) -> impl Iterator<Item = &CategoryRef> {
        std::iter::successors(Some(self), |category| category.parent.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GalleryImage {
    #[serde(default)]
    pub file: Option<FileRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileRef {
    #[serde(default)]
    pub url: Option<String>,
}

/// Detail record returned by `products/{slug}`
#[derive(Debug, Clone, Deserialize)]
pub struct ProductDetail {
    #[serde(default)]
    pub characteristics: Option<Vec<Characteristic>>,
}

impl ProductDetail {
    /// Value of the characteristic with `code`
    ///
    /// `None` when the detail carries no characteristics at all;
    /// `Some(None)` when they are present but lack the code or its value.
    pub fn property(&self, code: &str) -> Option<Option<&str>> {
        let characteristics = self.characteristics.as_ref()?;
        Some(
            characteristics
                .iter()
                .find(|c| c.product_prop.code == code)
                .and_then(|c| c.value.as_deref()),
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Characteristic {
    #[serde(rename = "productProp")]
    pub product_prop: ProductProp,
    #[serde(default, deserialize_with = "decode::opt_text")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductProp {
    pub code: String,
}

/// A listed product stamped with the local time it was fetched
#[derive(Debug, Clone)]
pub struct RawProduct {
    pub record: ProductRecord,
    pub received_at: DateTime<Local>,
}

impl RawProduct {
    pub fn new(record: ProductRecord, received_at: DateTime<Local>) -> Self {
        Self {
            record,
            received_at,
        }
    }

    pub fn slug(&self) -> &str {
        &self.record.slug
    }
}

/// A raw product augmented by its detail lookup
#[derive(Debug, Clone)]
pub struct EnrichedProduct {
    pub raw: RawProduct,
    pub country: Option<String>,
}

impl EnrichedProduct {
    pub fn record(&self) -> &ProductRecord {
        &self.raw.record
    }
}
