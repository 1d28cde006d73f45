//! Catalog API URLs
//!
//! Every endpoint hangs off the configured site root:
//! - `api/catalog/categories?withChildren=true`
//! - `api/catalog/products?categoryIdOrSlug=..&page=..&limit=..`
//! - `api/catalog/products/{slug}?deliveryType=..&shopIds[]=..`
//! - `catalog/product/{slug}` (public product page)

use crate::config::ShopContext;
use crate::HarvestError;
use url::Url;

#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
    categories: Url,
    products: Url,
    product_page: Url,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Result<Self, HarvestError> {
        let mut base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(HarvestError::UrlParse(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut categories = base.join("api/catalog/categories")?;
        categories.set_query(Some("withChildren=true"));

        Ok(Self {
            categories,
            products: base.join("api/catalog/products")?,
            product_page: base.join("catalog/product/")?,
            base,
        })
    }

    /// Full category tree with children
    pub fn categories(&self) -> &Url {
        &self.categories
    }

    /// One page of a category listing
    pub fn listing(&self, slug: &str, context: &ShopContext, page: u32, limit: u32) -> Url {
        let mut url = self.products.clone();
        url.set_query(Some(&format!(
            "categoryIdOrSlug={}&contextCityId={}&deliveryType={}&shopIds[]={}&page={}&limit={}",
            slug, context.city_id, context.delivery_method, context.shop_id, page, limit
        )));
        url
    }

    /// Detail record of one product
    pub fn detail(&self, slug: &str, context: &ShopContext) -> Url {
        let mut url = with_segment(&self.products, slug);
        url.set_query(Some(&format!(
            "deliveryType={}&shopIds[]={}",
            context.delivery_method, context.shop_id
        )));
        url
    }

    /// Public page of a product
    pub fn product_link(&self, slug: &str) -> String {
        with_segment(&self.product_page, slug).to_string()
    }

    /// Absolute link of a gallery file; the API returns site-relative paths
    pub fn image_link(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let root = self.base.as_str().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", root, path)
        } else {
            format!("{}/{}", root, path)
        }
    }
}

fn with_segment(base: &Url, segment: &str) -> Url {
    let mut url = base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(segment);
    }
    url
}
