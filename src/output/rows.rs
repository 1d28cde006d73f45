//! Projection of categories and enriched products into table rows

use super::traits::{Cell, Row, Table};
use crate::catalog::{CategoryId, CategoryTree, SourceId};
use crate::crawler::Endpoints;
use crate::product::stock::{is_in_stock, quantity};
use crate::product::{EnrichedProduct, ProductRecord};

pub const PRODUCT_HEADER: [&str; 12] = [
    "price_datetime",
    "price",
    "price_promo",
    "sku_status",
    "sku_instock",
    "sku_article",
    "sku_name",
    "sku_category",
    "sku_brand",
    "sku_country",
    "sku_link",
    "sku_images",
];

pub const CATEGORY_HEADER: [&str; 4] = ["original_id", "title", "id", "parent_id"];

const PRICE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Separator between ancestor titles in `sku_category`
pub const PATH_SEPARATOR: &str = "|";

pub fn category_row(tree: &CategoryTree, id: CategoryId) -> Row {
    let category = tree.get(id);
    let original_id = match &category.source_id {
        SourceId::Number(n) => Cell::Int(*n),
        SourceId::Text(text) => Cell::text(text),
    };
    let parent_slug = category.parent.map(|parent| tree.get(parent).slug.as_str());

    vec![
        original_id,
        Cell::text(&category.title),
        Cell::text(&category.slug),
        Cell::opt_text(parent_slug),
    ]
}

pub fn category_table(tree: &CategoryTree, ids: &[CategoryId]) -> Table {
    let mut table = Table::new(&CATEGORY_HEADER);
    for &id in ids {
        table.push(category_row(tree, id));
    }
    table
}

/// Ancestor titles of the product's primary category, root to leaf
///
/// Uses the resolved tree when it knows the category, and the parent chain
/// embedded in the product otherwise.
pub fn category_path(record: &ProductRecord, tree: &CategoryTree) -> Option<String> {
    let primary = record.primary_category()?;

    if let Some(id) = primary.slug.as_deref().and_then(|slug| tree.find_by_slug(slug)) {
        return Some(tree.path(id));
    }

    let mut titles: Vec<&str> = primary.chain().map(|c| c.title.as_str()).collect();
    titles.reverse();
    Some(titles.join(PATH_SEPARATOR))
}

pub fn product_row(product: &EnrichedProduct, tree: &CategoryTree, endpoints: &Endpoints) -> Row {
    let record = product.record();
    let stock = record.stock.as_ref();

    let image = match record.first_image() {
        Some(path) => Cell::text(&endpoints.image_link(path)),
        None => {
            tracing::warn!("Product '{}' has no image", record.slug);
            Cell::Null
        }
    };

    vec![
        Cell::text(
            &product
                .raw
                .received_at
                .format(PRICE_DATETIME_FORMAT)
                .to_string(),
        ),
        Cell::Decimal(record.price.base_price),
        Cell::Decimal(record.price.price),
        stock.map_or(Cell::Null, |value| Cell::Int(i64::from(is_in_stock(value)))),
        stock.and_then(quantity).map_or(Cell::Null, Cell::quantity),
        Cell::opt_text(record.sku.as_deref()),
        Cell::text(&record.title),
        Cell::opt_text(category_path(record, tree).as_deref()),
        Cell::opt_text(record.trade_mark.as_deref()),
        Cell::opt_text(product.country.as_deref()),
        Cell::text(&endpoints.product_link(&record.slug)),
        image,
    ]
}

/// Product table, ordered by product link
pub fn product_table(
    products: &[EnrichedProduct],
    tree: &CategoryTree,
    endpoints: &Endpoints,
) -> Table {
    let mut ordered: Vec<&EnrichedProduct> = products.iter().collect();
    ordered.sort_by_cached_key(|p| endpoints.product_link(&p.record().slug));

    let mut table = Table::new(&PRODUCT_HEADER);
    for product in ordered {
        table.push(product_row(product, tree, endpoints));
    }
    table
}
