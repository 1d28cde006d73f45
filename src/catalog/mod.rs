//! Category taxonomy
//!
//! This module contains:
//! - The wire shape of the category tree returned by the catalog API
//! - An arena-backed `CategoryTree` with parent indices
//! - The include/exclude `CategoryFilter`
//! - The resolver that picks the leaf categories to scrape

mod filter;
mod resolver;
mod tree;

pub use filter::{normalize_slug, CategoryFilter};
pub use resolver::{resolve, Resolution};
pub use tree::{Category, CategoryId, CategoryTree};

use serde::Deserialize;
use std::fmt;

/// Opaque identifier as sent by the source; numeric or textual
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum SourceId {
    Number(i64),
    Text(String),
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Number(n) => write!(f, "{}", n),
            SourceId::Text(s) => f.write_str(s),
        }
    }
}

/// One node of the `?withChildren=true` category response
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryNode {
    pub id: SourceId,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub children: Option<Vec<CategoryNode>>,
}
