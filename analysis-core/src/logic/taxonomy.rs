//! Category taxonomy (process → equipment → ...)
//!
//! Trees are materialised from flat `(id, name, parent_id)` rows through a
//! parent → children index, so building and leaf collection stay linear in
//! the number of nodes.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};

use super::records::NodeId;

/// A taxonomy node owning its children.
///
/// A node with no children is a leaf, the unit of analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyNode {
    pub id: NodeId,
    pub name: String,
    pub parent_id: Option<NodeId>,
    pub children: Vec<TaxonomyNode>,
}

impl TaxonomyNode {
    pub fn leaf(id: NodeId, name: &str, parent_id: Option<NodeId>) -> Self {
        Self {
            id,
            name: name.to_string(),
            parent_id,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Flat taxonomy row as stored
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRow {
    pub id: NodeId,
    pub name: String,
    pub parent_id: Option<NodeId>,
}

/// Build trees from flat rows.
///
/// With `root = None` every parentless row becomes a root. With
/// `root = Some(id)` only the subtree under `id` is returned (empty if the id
/// is not among the rows). Children keep the row order.
pub fn build_tree(rows: &[CategoryRow], root: Option<NodeId>) -> Vec<TaxonomyNode> {
    let mut children_index: HashMap<NodeId, Vec<usize>> = HashMap::new();
    let mut by_id: HashMap<NodeId, usize> = HashMap::with_capacity(rows.len());

    for (idx, row) in rows.iter().enumerate() {
        by_id.insert(row.id, idx);
        if let Some(parent) = row.parent_id {
            children_index.entry(parent).or_default().push(idx);
        }
    }

    let root_indices: Vec<usize> = match root {
        Some(id) => by_id.get(&id).copied().into_iter().collect(),
        None => rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.parent_id.is_none())
            .map(|(idx, _)| idx)
            .collect(),
    };

    root_indices
        .into_iter()
        .map(|idx| materialize(rows, &children_index, idx))
        .collect()
}

fn materialize(
    rows: &[CategoryRow],
    children_index: &HashMap<NodeId, Vec<usize>>,
    idx: usize,
) -> TaxonomyNode {
    let row = &rows[idx];
    let children = children_index
        .get(&row.id)
        .map(|kids| {
            kids.iter()
                .map(|&child| materialize(rows, children_index, child))
                .collect()
        })
        .unwrap_or_default();

    TaxonomyNode {
        id: row.id,
        name: row.name.clone(),
        parent_id: row.parent_id,
        children,
    }
}

/// Collect every leaf under the given trees, depth-first, in tree order
pub fn collect_leaves(nodes: &[TaxonomyNode]) -> Vec<&TaxonomyNode> {
    let mut leaves = Vec::new();
    for node in nodes {
        push_leaves(node, &mut leaves);
    }
    leaves
}

fn push_leaves<'a>(node: &'a TaxonomyNode, out: &mut Vec<&'a TaxonomyNode>) {
    if node.is_leaf() {
        out.push(node);
    } else {
        for child in &node.children {
            push_leaves(child, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: NodeId, name: &str, parent_id: Option<NodeId>) -> CategoryRow {
        CategoryRow { id, name: name.to_string(), parent_id }
    }

    #[test]
    fn test_flat_list_all_leaves() {
        let nodes = vec![
            TaxonomyNode::leaf(1, "A", None),
            TaxonomyNode::leaf(2, "B", None),
        ];
        let ids: Vec<NodeId> = collect_leaves(&nodes).iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_nested_tree_only_leaves() {
        let mut mid = TaxonomyNode::leaf(2, "Mid", Some(1));
        mid.children.push(TaxonomyNode::leaf(3, "Leaf", Some(2)));
        let mut root = TaxonomyNode::leaf(1, "Root", None);
        root.children.push(mid);

        let leaves = collect_leaves(std::slice::from_ref(&root));
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].id, 3);
    }

    #[test]
    fn test_empty() {
        assert!(collect_leaves(&[]).is_empty());
    }

    #[test]
    fn test_build_tree_from_rows() {
        let rows = vec![
            row(1, "ProcessA", None),
            row(2, "Equip1", Some(1)),
            row(3, "Equip2", Some(1)),
            row(4, "ProcessB", None),
            row(5, "Unit", Some(2)),
        ];
        let tree = build_tree(&rows, None);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[0].children[0].name, "Unit");
        assert!(tree[1].is_leaf());

        let leaf_ids: Vec<NodeId> = collect_leaves(&tree).iter().map(|n| n.id).collect();
        assert_eq!(leaf_ids, vec![5, 3, 4]);
    }

    #[test]
    fn test_build_subtree() {
        let rows = vec![
            row(1, "ProcessA", None),
            row(2, "Equip1", Some(1)),
            row(3, "Unit", Some(2)),
        ];
        let tree = build_tree(&rows, Some(2));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].id, 2);
        assert_eq!(tree[0].parent_id, Some(1));
        assert_eq!(tree[0].children[0].id, 3);

        assert!(build_tree(&rows, Some(99)).is_empty());
    }
}
