//! Spine nodes and the id-sorted node store.
//!
//! # Architecture
//!
//! Nodes never hold references to each other. Parent, children and chain
//! neighbours are all ids resolved through the single owning [`NodeStore`],
//! which keeps nodes sorted by id:
//! - O(log n) lookups by id via binary search
//! - trivially serializable and comparable state
//! - no ownership cycles however the stored data is wired

use serde::{Deserialize, Serialize};

/// Kind of a spine node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// The project itself, root of the spine.
    Unit,
    /// A section; sections may nest.
    #[default]
    Section,
    /// A page, the unit of linear reading order.
    Page,
}

impl NodeKind {
    /// Encoded discriminant.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Unit => "unit",
            NodeKind::Section => "section",
            NodeKind::Page => "page",
        }
    }

    /// Containers (project, sections) get per-depth sibling links; pages get
    /// reading-order links.
    #[must_use]
    pub fn is_container(self) -> bool {
        !matches!(self, NodeKind::Page)
    }
}

/// Display metadata kept on a node so links can be rendered from the cache.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodePayload {
    pub title: String,
    pub name: String,
    pub priority: i64,
}

/// One project, section or page in the spine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Node {
    /// Record id, unique within one spine.
    pub id: i64,
    /// Structural parent id, 0 for the root.
    pub parent: i64,
    pub kind: NodeKind,
    /// Children placed explicitly by the editor, in order.
    pub ordered: Vec<i64>,
    /// Remaining children, sorted by priority then id.
    pub unordered: Vec<i64>,
    /// Hidden from navigation together with its subtree.
    pub excluded: bool,
    /// Distance from the root, assigned by linearization.
    pub depth: usize,
    /// Previous chain neighbour, 0 for none.
    pub prev: i64,
    /// Next chain neighbour, 0 for none.
    pub next: i64,
    pub payload: NodePayload,
}

impl Node {
    /// Create an unlinked node.
    #[must_use]
    pub fn new(id: i64, parent: i64, kind: NodeKind) -> Self {
        Self {
            id,
            parent,
            kind,
            ..Self::default()
        }
    }

    /// Children used for traversal.
    ///
    /// Ordered children win outright when present; unordered children are a
    /// fallback only, never merged in.
    #[must_use]
    pub fn traversal_children(&self) -> &[i64] {
        if self.ordered.is_empty() {
            &self.unordered
        } else {
            &self.ordered
        }
    }
}

/// Nodes of one spine, sorted by id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeStore {
    nodes: Vec<Node>,
}

impl NodeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from nodes in any order.
    ///
    /// On duplicate ids the first node wins; later duplicates are dropped.
    #[must_use]
    pub fn from_nodes(mut nodes: Vec<Node>) -> Self {
        // stable: keeps the first of equal ids in front
        nodes.sort_by_key(|n| n.id);
        let before = nodes.len();
        nodes.dedup_by_key(|n| n.id);
        if nodes.len() != before {
            tracing::warn!(dropped = before - nodes.len(), "Duplicate node ids dropped");
        }
        Self { nodes }
    }

    /// Look up a node by id.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<&Node> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    pub(crate) fn index_of(&self, id: i64) -> Option<usize> {
        self.nodes.binary_search_by_key(&id, |n| n.id).ok()
    }

    pub(crate) fn at(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    pub(crate) fn at_mut(&mut self, idx: usize) -> &mut Node {
        &mut self.nodes[idx]
    }

    /// Nodes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
