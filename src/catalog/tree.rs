//! Arena-backed category tree
//!
//! Nodes are owned by the arena and refer to each other by index, so a child
//! records its parent without owning it.

use super::{CategoryNode, SourceId};
use std::collections::HashMap;

/// Stable index of a category inside its `CategoryTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CategoryId(usize);

impl CategoryId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A category stored in the arena
#[derive(Debug, Clone)]
pub struct Category {
    pub source_id: SourceId,
    pub slug: String,
    pub title: String,
    pub parent: Option<CategoryId>,
    pub children: Vec<CategoryId>,
}

impl Category {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// The full category taxonomy of the catalog
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    nodes: Vec<Category>,
    roots: Vec<CategoryId>,
    by_slug: HashMap<String, CategoryId>,
    duplicate_slugs: Vec<String>,
}

impl CategoryTree {
    /// Builds the arena from the nested API response, preserving child order
    ///
    /// A slug reachable through more than one parent is kept at every
    /// position and reported; slug lookups resolve to its first occurrence.
    pub fn from_nodes(roots: Vec<CategoryNode>) -> Self {
        let mut tree = CategoryTree::default();
        for node in roots {
            let id = tree.insert(node, None);
            tree.roots.push(id);
        }

        if !tree.duplicate_slugs.is_empty() {
            tracing::warn!(
                "Category tree lists {} slug(s) under more than one parent: {}",
                tree.duplicate_slugs.len(),
                tree.duplicate_slugs.join(", ")
            );
        }

        tree
    }

    fn insert(&mut self, node: CategoryNode, parent: Option<CategoryId>) -> CategoryId {
        let id = CategoryId(self.nodes.len());
        self.nodes.push(Category {
            source_id: node.id,
            slug: node.slug.clone(),
            title: node.title,
            parent,
            children: Vec::new(),
        });

        if self.by_slug.contains_key(&node.slug) {
            self.duplicate_slugs.push(node.slug);
        } else {
            self.by_slug.insert(node.slug, id);
        }

        for child in node.children.unwrap_or_default() {
            let child_id = self.insert(child, Some(id));
            self.nodes[id.0].children.push(child_id);
        }

        id
    }

    pub fn get(&self, id: CategoryId) -> &Category {
        &self.nodes[id.0]
    }

    pub fn roots(&self) -> &[CategoryId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find_by_slug(&self, slug: &str) -> Option<CategoryId> {
        self.by_slug.get(slug).copied()
    }

    /// Slugs that appeared more than once while building
    pub fn duplicate_slugs(&self) -> &[String] {
        &self.duplicate_slugs
    }

    /// Walks from `id` up to its root, starting with `id` itself
    pub fn ancestors(&self, id: CategoryId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: Some(id),
        }
    }

    /// Titles from the root down to `id`, joined with `|`
    pub fn path(&self, id: CategoryId) -> String {
        let mut titles: Vec<&str> = self
            .ancestors(id)
            .map(|ancestor| self.get(ancestor).title.as_str())
            .collect();
        titles.reverse();
        titles.join("|")
    }
}

/// Iterator over a category and its ancestors
pub struct Ancestors<'a> {
    tree: &'a CategoryTree,
    next: Option<CategoryId>,
}

impl Iterator for Ancestors<'_> {
    type Item = CategoryId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.get(current).parent;
        Some(current)
    }
}
