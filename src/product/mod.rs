//! Product records
//!
//! Wire shapes of the listing and detail endpoints, and the raw/enriched
//! products that flow through the pipeline.

mod decode;
pub mod stock;
mod types;

pub use types::{
    CategoryRef, Characteristic, EnrichedProduct, FileRef, GalleryImage, ListingPage, Pagination,
    Price, ProductDetail, ProductProp, ProductRecord, RawProduct, COUNTRY_PROPERTY_CODE,
};
