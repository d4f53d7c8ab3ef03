//! Spine facade and navigation queries.
//!
//! [`SpineIndex::create`] rebuilds from raw rows; [`SpineIndex::get`] reads
//! the cached encoding and never rebuilds. Both take the transaction they run
//! in as an explicit argument.

use std::collections::HashSet;
use std::time::Instant;

use lore_storage::{Transaction, UnitRow};
use serde_json::Value;

use crate::builder::build_store;
use crate::codec;
use crate::error::SpineError;
use crate::linearize::{linearize, walk_chain};
use crate::node::{Node, NodeKind, NodeStore};
use crate::tags::{TagIndex, aggregate};

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Navigation index of one project.
///
/// Immutable once built. An empty index means navigation is unavailable for
/// the project (no cache yet, or an unreadable one).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpineIndex {
    unit: i64,
    store: NodeStore,
    tags: TagIndex,
}

impl SpineIndex {
    /// Index with no nodes.
    #[must_use]
    pub fn empty(unit: i64) -> Self {
        Self {
            unit,
            ..Self::default()
        }
    }

    /// Rebuild the spine of `unit` from its rows.
    ///
    /// Does not persist anything; pass [`encode`](Self::encode) to
    /// [`Transaction::set_spine`] for that.
    pub fn create(tx: &dyn Transaction, unit: i64) -> Result<Self, SpineError> {
        let start = Instant::now();

        let row = tx.unit(unit)?.ok_or(SpineError::UnitNotFound(unit))?;
        let row = UnitRow { id: unit, ..row };
        let sections = tx.sections(unit)?;
        let pages = tx.pages(unit)?;

        let mut store = build_store(&row, &sections, &pages);
        let tags = aggregate(pages.iter().map(|p| p.tags.as_str()));
        let stats = linearize(&mut store, unit);

        tracing::debug!(
            unit,
            sections = sections.len(),
            pages = pages.len(),
            reachable = stats.reachable,
            chained_pages = stats.pages,
            max_depth = stats.max_depth,
            tags = tags.len(),
            elapsed_ms = elapsed_ms(start),
            "Spine built"
        );

        Ok(Self { unit, store, tags })
    }

    /// Load the cached spine of `unit`.
    ///
    /// A missing or unreadable cache yields an empty index, not an error.
    pub fn get(tx: &dyn Transaction, unit: i64) -> Result<Self, SpineError> {
        let Some(value) = tx.spine(unit)? else {
            tracing::debug!(unit, "No cached spine");
            return Ok(Self::empty(unit));
        };

        match Self::from_encoded(&value) {
            Some(index) if index.unit == unit => Ok(index),
            Some(index) => {
                tracing::warn!(
                    unit,
                    cached_unit = index.unit,
                    "Cached spine belongs to another project"
                );
                Ok(Self::empty(unit))
            }
            None => {
                tracing::warn!(unit, "Cached spine is not an object");
                Ok(Self::empty(unit))
            }
        }
    }

    /// Decode a persisted spine. Returns `None` if `value` is not an object.
    #[must_use]
    pub fn from_encoded(value: &Value) -> Option<Self> {
        let decoded = codec::decode(value)?;
        Some(Self {
            unit: decoded.unit,
            store: decoded.store,
            tags: decoded.tags,
        })
    }

    /// Persisted form, stored verbatim as the project's `spine` field.
    pub fn encode(&self) -> Result<Value, SpineError> {
        Ok(codec::encode(self.unit, &self.store, &self.tags)?)
    }

    #[must_use]
    pub fn unit(&self) -> i64 {
        self.unit
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// All nodes, in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.store.iter()
    }

    #[must_use]
    pub fn tags(&self) -> &TagIndex {
        &self.tags
    }

    /// Exact lookup by id.
    #[must_use]
    pub fn get_node(&self, id: i64) -> Option<&Node> {
        self.store.get(id)
    }

    /// Deepest assigned depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.store.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Next page in reading order. `None` if `id` is not a page.
    #[must_use]
    pub fn next_page(&self, id: i64) -> Option<&Node> {
        self.linked(id, |n| n.next, |kind| kind == NodeKind::Page)
    }

    /// Previous page in reading order. `None` if `id` is not a page.
    #[must_use]
    pub fn prev_page(&self, id: i64) -> Option<&Node> {
        self.linked(id, |n| n.prev, |kind| kind == NodeKind::Page)
    }

    /// Next container at the same depth. `None` for pages.
    #[must_use]
    pub fn next_sibling(&self, id: i64) -> Option<&Node> {
        self.linked(id, |n| n.next, NodeKind::is_container)
    }

    /// Previous container at the same depth. `None` for pages.
    #[must_use]
    pub fn prev_sibling(&self, id: i64) -> Option<&Node> {
        self.linked(id, |n| n.prev, NodeKind::is_container)
    }

    fn linked(
        &self,
        id: i64,
        link: impl Fn(&Node) -> i64,
        kind: impl Fn(NodeKind) -> bool,
    ) -> Option<&Node> {
        let node = self.store.get(id).filter(|n| kind(n.kind))?;
        match link(node) {
            0 => None,
            target => self.store.get(target),
        }
    }

    /// First page in reading order.
    #[must_use]
    pub fn first_page(&self) -> Option<&Node> {
        let root = self.store.get(self.unit)?;
        let mut visited = HashSet::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if !visited.insert(node.id) || node.excluded {
                continue;
            }
            if node.kind == NodeKind::Page {
                return Some(node);
            }
            stack.extend(
                node.traversal_children()
                    .iter()
                    .rev()
                    .filter_map(|&id| self.store.get(id)),
            );
        }
        None
    }

    /// Whole reading order.
    #[must_use]
    pub fn pages(&self) -> Vec<&Node> {
        self.first_page()
            .map(|first| walk_chain(&self.store, first))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| self.store.get(id))
            .collect()
    }

    /// Ancestors of `id`, root first, excluding the node itself.
    ///
    /// Stops at a missing parent or a parent loop.
    #[must_use]
    pub fn breadcrumbs(&self, id: i64) -> Vec<&Node> {
        let Some(node) = self.store.get(id) else {
            return Vec::new();
        };

        let mut seen = HashSet::from([node.id]);
        let mut crumbs = Vec::new();
        let mut parent = node.parent;
        while parent != 0 && seen.insert(parent) {
            let Some(ancestor) = self.store.get(parent) else {
                break;
            };
            crumbs.push(ancestor);
            parent = ancestor.parent;
        }
        crumbs.reverse();
        crumbs
    }

    /// Children used for traversal: ordered ones if any, else unordered.
    #[must_use]
    pub fn children(&self, id: i64) -> Vec<&Node> {
        self.store.get(id).map_or_else(Vec::new, |node| {
            node.traversal_children()
                .iter()
                .filter_map(|&child| self.store.get(child))
                .collect()
        })
    }
}
