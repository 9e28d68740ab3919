use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use serde::Serialize;
use termtree::Tree;
use tracing::instrument;

/// Leaf payload of a hierarchy node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeData {
    /// Size attribute, `None` for pure structural nodes
    pub count: Option<usize>,
    sentiment_total: f64,
    sentiment_samples: usize,
    /// Categorical color tag, e.g. a sentiment type name
    pub color: Option<String>,
    /// Raw review texts attached at this node
    pub reviews: Vec<String>,
}

impl NodeData {
    pub fn add_count(&mut self, n: usize) {
        *self.count.get_or_insert(0) += n;
    }

    pub fn add_sentiment(&mut self, score: f64) {
        self.sentiment_total += score;
        self.sentiment_samples += 1;
    }

    /// Mean of all recorded sentiment samples.
    pub fn sentiment(&self) -> Option<f64> {
        (self.sentiment_samples > 0).then(|| self.sentiment_total / self.sentiment_samples as f64)
    }
}

/// Node in the arena-based hierarchy.
#[derive(Debug)]
pub struct TreeNode {
    pub name: String,
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Child indices in insertion order
    pub children: Vec<Index>,
    child_index: HashMap<String, Index>,
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data.count {
            Some(count) => write!(f, "{} ({})", self.name, count),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Exchange form of a hierarchy, serialized as `name`, `children`, then leaf fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyNode {
    pub name: String,
    pub children: Vec<HierarchyNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reviews: Vec<String>,
}

impl HierarchyNode {
    pub fn child(&self, name: &str) -> Option<&HierarchyNode> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Arena-based tree with exactly one root.
///
/// Every node keeps a name → child map, so siblings are unique by name
/// and lookups do not scan. Children keep their insertion order.
#[derive(Debug)]
pub struct HierarchyArena {
    arena: Arena<TreeNode>,
    root: Index,
}

impl HierarchyArena {
    pub fn new(root_name: impl Into<String>) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(TreeNode {
            name: root_name.into(),
            data: NodeData::default(),
            parent: None,
            children: Vec::new(),
            child_index: HashMap::new(),
        });
        Self { arena, root }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.get_node(self.root)
            .map_or(true, |root| root.children.is_empty())
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    pub fn find_child(&self, parent: Index, name: &str) -> Option<Index> {
        self.get_node(parent)
            .and_then(|node| node.child_index.get(name).copied())
    }

    /// Return the child named `name`, creating it if absent.
    #[instrument(level = "trace", skip(self))]
    pub fn child_or_insert(&mut self, parent: Index, name: &str) -> Index {
        if let Some(idx) = self.find_child(parent, name) {
            return idx;
        }
        let idx = self.arena.insert(TreeNode {
            name: name.to_string(),
            data: NodeData::default(),
            parent: Some(parent),
            children: Vec::new(),
            child_index: HashMap::new(),
        });
        if let Some(node) = self.arena.get_mut(parent) {
            node.children.push(idx);
            node.child_index.insert(name.to_string(), idx);
        }
        idx
    }

    /// Walk `path` from `start`, creating missing nodes; returns the last node.
    pub fn insert_path<'p, I>(&mut self, start: Index, path: I) -> Index
    where
        I: IntoIterator<Item = &'p str>,
    {
        path.into_iter()
            .fold(start, |current, name| self.child_or_insert(current, name))
    }

    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Levels below the root; a root without children has depth 0.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root).saturating_sub(1)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Names of all nodes without children, left to right.
    pub fn leaf_names(&self) -> Vec<String> {
        self.iter()
            .filter(|(idx, node)| node.children.is_empty() && *idx != self.root)
            .map(|(_, node)| node.name.clone())
            .collect()
    }

    /// Sum of the size attribute over all nodes.
    pub fn total_count(&self) -> usize {
        self.iter().filter_map(|(_, node)| node.data.count).sum()
    }

    pub fn to_node(&self) -> HierarchyNode {
        self.node_at(self.root)
    }

    fn node_at(&self, idx: Index) -> HierarchyNode {
        match self.get_node(idx) {
            Some(node) => HierarchyNode {
                name: node.name.clone(),
                children: node.children.iter().map(|&c| self.node_at(c)).collect(),
                count: node.data.count,
                sentiment: node.data.sentiment(),
                color: node.data.color.clone(),
                reviews: node.data.reviews.clone(),
            },
            None => HierarchyNode {
                name: String::new(),
                children: Vec::new(),
                count: None,
                sentiment: None,
                color: None,
                reviews: Vec::new(),
            },
        }
    }

    /// Terminal rendering of the tree.
    pub fn to_termtree(&self) -> Tree<String> {
        self.termtree_at(self.root)
    }

    fn termtree_at(&self, idx: Index) -> Tree<String> {
        let Some(node) = self.get_node(idx) else {
            return Tree::new(String::new());
        };
        let leaves: Vec<Tree<String>> = node.children.iter().map(|&c| self.termtree_at(c)).collect();
        Tree::new(node.to_string()).with_leaves(leaves)
    }
}

/// Pre-order iterator, children left to right.
pub struct TreeIterator<'a> {
    arena: &'a HierarchyArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a HierarchyArena) -> Self {
        Self {
            arena,
            stack: vec![arena.root()],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_same_name_twice_when_inserting_then_reuses_child() {
        let mut tree = HierarchyArena::new("root");
        let root = tree.root();
        let a1 = tree.child_or_insert(root, "a");
        let a2 = tree.child_or_insert(root, "a");
        assert_eq!(a1, a2);
        assert_eq!(tree.get_node(root).unwrap().children.len(), 1);
    }

    #[test]
    fn given_children_when_iterating_then_keeps_insertion_order() {
        let mut tree = HierarchyArena::new("root");
        let root = tree.root();
        for name in ["zeta", "alpha", "mid", "alpha"] {
            tree.child_or_insert(root, name);
        }
        assert_eq!(tree.leaf_names(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn given_path_when_inserting_then_depth_matches_path_length() {
        let mut tree = HierarchyArena::new("root");
        let root = tree.root();
        let leaf = tree.insert_path(root, ["a", "b", "c"]);
        tree.get_node_mut(leaf).unwrap().data.add_count(2);

        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.total_count(), 2);
        assert_eq!(tree.leaf_names(), vec!["c"]);
    }

    #[test]
    fn given_root_only_when_inspecting_then_is_empty() {
        let tree = HierarchyArena::new("root");
        assert!(tree.is_empty());
        assert_eq!(tree.depth(), 0);
        assert!(tree.leaf_names().is_empty());
        assert!(tree.to_node().children.is_empty());
    }

    #[test]
    fn given_samples_when_reading_sentiment_then_returns_mean() {
        let mut data = NodeData::default();
        assert_eq!(data.sentiment(), None);
        data.add_sentiment(1.0);
        data.add_sentiment(-0.5);
        assert_eq!(data.sentiment(), Some(0.25));
    }

    #[test]
    fn given_tree_when_rendering_termtree_then_shows_counts() {
        let mut tree = HierarchyArena::new("Reviews");
        let root = tree.root();
        let leaf = tree.insert_path(root, ["Support"]);
        tree.get_node_mut(leaf).unwrap().data.add_count(3);
        let rendered = tree.to_termtree().to_string();
        assert!(rendered.starts_with("Reviews"));
        assert!(rendered.contains("Support (3)"));
    }
}
