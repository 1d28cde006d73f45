//! Include/exclude category scope

use crate::config::CategoriesConfig;
use crate::product::ProductRecord;
use std::collections::HashSet;

/// Strips the `/` characters configuration may carry when slugs are copied from URL paths
pub fn normalize_slug(raw: &str) -> String {
    raw.chars().filter(|&c| c != '/').collect::<String>().trim().to_string()
}

/// Include/exclude scope of a run, immutable once built
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    include: HashSet<String>,
    exclude: HashSet<String>,
}

impl CategoryFilter {
    pub fn new<I, E, S, T>(include: I, exclude: E) -> Self
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            include: include
                .into_iter()
                .map(|s| normalize_slug(s.as_ref()))
                .collect(),
            exclude: exclude
                .into_iter()
                .map(|s| normalize_slug(s.as_ref()))
                .collect(),
        }
    }

    pub fn from_config(config: &CategoriesConfig) -> Self {
        Self::new(&config.include, &config.exclude)
    }

    /// True when no include list was given, i.e. the whole catalog is in scope
    pub fn includes_everything(&self) -> bool {
        self.include.is_empty()
    }

    pub fn is_included(&self, slug: &str) -> bool {
        self.include.contains(slug)
    }

    pub fn is_excluded(&self, slug: &str) -> bool {
        self.exclude.contains(slug)
    }

    /// Returns the excluded slug a product is filed under, if any
    ///
    /// Every category reference of the product is checked together with the
    /// parent chain it carries.
    pub fn excluded_category<'a>(&self, product: &'a ProductRecord) -> Option<&'a str> {
        product
            .categories
            .iter()
            .flat_map(|category| category.chain())
            .filter_map(|category| category.slug.as_deref())
            .find(|slug| self.is_excluded(slug))
    }
}
