//! Category tree resolution
//!
//! Decides which categories are scraped. Listings are always fetched per
//! leaf so that overlapping subtrees never count the same product twice.

use super::{CategoryFilter, CategoryId, CategoryTree};

/// Outcome of resolving a tree against a filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Approved leaf categories, in pre-order
    pub targets: Vec<CategoryId>,

    /// Every category visited, in pre-order; excluded subtrees are absent
    pub visited: Vec<CategoryId>,
}

/// Resolves the scrape targets of `tree` under `filter`
///
/// Traversal is depth-first and pre-order. At each node:
/// - an excluded slug prunes the node and its whole subtree
/// - a node is approved when the include set is empty, when its slug is
///   included, or when any ancestor was approved
/// - an approved node without children becomes a target
pub fn resolve(tree: &CategoryTree, filter: &CategoryFilter) -> Resolution {
    let mut resolution = Resolution::default();
    for &root in tree.roots() {
        visit(tree, filter, root, filter.includes_everything(), &mut resolution);
    }

    tracing::debug!(
        "Resolved {} scrape targets out of {} visited categories",
        resolution.targets.len(),
        resolution.visited.len()
    );

    resolution
}

fn visit(
    tree: &CategoryTree,
    filter: &CategoryFilter,
    id: CategoryId,
    inherited: bool,
    resolution: &mut Resolution,
) {
    let category = tree.get(id);
    if filter.is_excluded(&category.slug) {
        tracing::info!("Category '{}' skipped according to exclude list", category.slug);
        return;
    }

    resolution.visited.push(id);

    let approved = inherited || filter.is_included(&category.slug);
    if approved && category.is_leaf() {
        resolution.targets.push(id);
    }

    for &child in &category.children {
        visit(tree, filter, child, approved, resolution);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{branch, leaf};

    /// root-a
    ///   a1
    ///     a1x (leaf)
    ///     a1y (leaf)
    ///   a2 (leaf)
    /// root-b
    ///   b1 (leaf)
    ///   b2
    ///     b2x (leaf)
    /// root-c (leaf)
    fn sample_tree() -> CategoryTree {
        CategoryTree::from_nodes(vec![
            branch(
                "root-a",
                "A",
                vec![
                    branch("a1", "A1", vec![leaf("a1x", "A1X"), leaf("a1y", "A1Y")]),
                    leaf("a2", "A2"),
                ],
            ),
            branch(
                "root-b",
                "B",
                vec![leaf("b1", "B1"), branch("b2", "B2", vec![leaf("b2x", "B2X")])],
            ),
            leaf("root-c", "C"),
        ])
    }

    fn slugs(tree: &CategoryTree, ids: &[CategoryId]) -> Vec<String> {
        ids.iter().map(|&id| tree.get(id).slug.clone()).collect()
    }

    fn everything() -> CategoryFilter {
        CategoryFilter::new(Vec::<String>::new(), Vec::<String>::new())
    }

    #[test]
    fn test_empty_include_selects_every_leaf_once() {
        let tree = sample_tree();
        let resolution = resolve(&tree, &everything());

        assert_eq!(
            slugs(&tree, &resolution.targets),
            vec!["a1x", "a1y", "a2", "b1", "b2x", "root-c"]
        );
        assert_eq!(resolution.visited.len(), tree.len());
    }

    #[test]
    fn test_visited_is_preorder() {
        let tree = sample_tree();
        let resolution = resolve(&tree, &everything());

        assert_eq!(
            slugs(&tree, &resolution.visited),
            vec!["root-a", "a1", "a1x", "a1y", "a2", "root-b", "b1", "b2", "b2x", "root-c"]
        );
    }

    #[test]
    fn test_exclude_prunes_subtree() {
        let tree = sample_tree();
        let filter = CategoryFilter::new(Vec::<String>::new(), ["a1", "b2x"]);
        let resolution = resolve(&tree, &filter);

        let targets = slugs(&tree, &resolution.targets);
        assert_eq!(targets, vec!["a2", "b1", "root-c"]);

        let visited = slugs(&tree, &resolution.visited);
        for pruned in ["a1", "a1x", "a1y", "b2x"] {
            assert!(!visited.contains(&pruned.to_string()), "{} was visited", pruned);
        }
        assert!(visited.contains(&"b2".to_string()));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let tree = sample_tree();
        let filter = CategoryFilter::new(["root-a"], ["a1y"]);
        let resolution = resolve(&tree, &filter);

        assert_eq!(slugs(&tree, &resolution.targets), vec!["a1x", "a2"]);
    }

    #[test]
    fn test_include_is_inherited_by_descendants() {
        let tree = sample_tree();
        let filter = CategoryFilter::new(["root-b"], Vec::<String>::new());
        let resolution = resolve(&tree, &filter);

        assert_eq!(slugs(&tree, &resolution.targets), vec!["b1", "b2x"]);
        // the include filter does not shrink the reporting table
        assert_eq!(resolution.visited.len(), tree.len());
    }

    #[test]
    fn test_included_intermediate_node_is_not_a_target() {
        let tree = sample_tree();
        let filter = CategoryFilter::new(["a1"], Vec::<String>::new());
        let resolution = resolve(&tree, &filter);

        assert_eq!(slugs(&tree, &resolution.targets), vec!["a1x", "a1y"]);
    }

    #[test]
    fn test_excluded_leaf_yields_nothing() {
        let tree = sample_tree();
        let filter = CategoryFilter::new(["root-c"], ["root-c"]);
        let resolution = resolve(&tree, &filter);

        assert!(resolution.targets.is_empty());
    }

    #[test]
    fn test_approved_node_with_all_children_excluded() {
        let tree = sample_tree();
        let filter = CategoryFilter::new(["b2"], ["b2x"]);
        let resolution = resolve(&tree, &filter);

        assert!(resolution.targets.is_empty());
        assert!(slugs(&tree, &resolution.visited).contains(&"b2".to_string()));
    }

    #[test]
    fn test_duplicate_leaf_is_targeted_twice() {
        let tree = CategoryTree::from_nodes(vec![
            branch("a", "A", vec![leaf("shared", "Shared")]),
            branch("b", "B", vec![leaf("shared", "Shared")]),
        ]);
        let resolution = resolve(&tree, &everything());

        assert_eq!(slugs(&tree, &resolution.targets), vec!["shared", "shared"]);
    }

    #[test]
    fn test_no_excluded_descendant_ever_targeted() {
        let tree = sample_tree();
        for excluded in ["root-a", "a1", "root-b", "b2", "root-c"] {
            let filter = CategoryFilter::new(Vec::<String>::new(), [excluded]);
            let resolution = resolve(&tree, &filter);

            for &target in &resolution.targets {
                let under_excluded = tree
                    .ancestors(target)
                    .any(|id| tree.get(id).slug == excluded);
                assert!(!under_excluded, "target under excluded '{}'", excluded);
            }
        }
    }
}
