//! Tree builder: merges raw rows into a node store.
//!
//! The project row becomes the root. Sections and pages hang off their
//! structural parent. Each node's explicit order list becomes its ordered
//! children; children the editor never placed are collected into the
//! parent's unordered list and sorted by priority.

use std::cmp::Ordering;

use lore_storage::{PageRow, RowOptions, SectionRow, UnitRow};

use crate::node::{Node, NodeKind, NodePayload, NodeStore};

/// Build an unlinked node store from one project's rows.
///
/// Rows may arrive in any order. On id collisions the project wins over a
/// page, and a page wins over a section.
#[must_use]
pub fn build_store(unit: &UnitRow, sections: &[SectionRow], pages: &[PageRow]) -> NodeStore {
    let mut nodes = Vec::with_capacity(1 + sections.len() + pages.len());

    nodes.push(make_node(
        unit.id,
        0,
        NodeKind::Unit,
        &unit.order,
        &RowOptions::default(),
        NodePayload {
            title: unit.title.clone(),
            name: unit.name.clone(),
            priority: 0,
        },
    ));
    for page in pages {
        nodes.push(make_node(
            page.id,
            page.parent(),
            NodeKind::Page,
            &page.order,
            &page.options,
            NodePayload {
                title: page.title.clone(),
                name: page.name.clone(),
                priority: page.priority,
            },
        ));
    }
    for section in sections {
        nodes.push(make_node(
            section.id,
            section.parent(),
            NodeKind::Section,
            &section.order,
            &section.options,
            NodePayload {
                title: section.title.clone(),
                name: section.name.clone(),
                priority: section.priority,
            },
        ));
    }

    let mut store = NodeStore::from_nodes(nodes);
    collect_unordered(&mut store);
    sort_unordered(&mut store);
    store
}

fn make_node(
    id: i64,
    parent: i64,
    kind: NodeKind,
    order: &[i64],
    options: &RowOptions,
    payload: NodePayload,
) -> Node {
    let mut node = Node::new(id, parent, kind);
    node.ordered = order.iter().copied().filter(|&child| child != 0).collect();
    node.excluded = options.excluded_from_spine;
    node.payload = payload;
    node
}

/// Attach every node not already placed by its parent's order list.
fn collect_unordered(store: &mut NodeStore) {
    let links: Vec<(i64, i64)> = store
        .iter()
        .filter(|n| n.parent != 0)
        .map(|n| (n.parent, n.id))
        .collect();

    for (parent, child) in links {
        let Some(idx) = store.index_of(parent) else {
            continue;
        };
        let parent = store.at_mut(idx);
        if !parent.ordered.contains(&child) && !parent.unordered.contains(&child) {
            parent.unordered.push(child);
        }
    }
}

fn sort_unordered(store: &mut NodeStore) {
    for idx in 0..store.len() {
        if store.at(idx).unordered.len() < 2 {
            continue;
        }
        let mut children = std::mem::take(&mut store.at_mut(idx).unordered);
        children.sort_by(|&a, &b| compare_unordered(store, a, b));
        store.at_mut(idx).unordered = children;
    }
}

/// Priority ascending, then id. Ids without a node sort last.
fn compare_unordered(store: &NodeStore, a: i64, b: i64) -> Ordering {
    let key = |id: i64| store.get(id).map(|n| n.payload.priority);
    match (key(a), key(b)) {
        (Some(pa), Some(pb)) => pa.cmp(&pb).then(a.cmp(&b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(&b),
    }
}
