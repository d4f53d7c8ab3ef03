//! Linearizer: depth assignment and prev/next chaining.
//!
//! Three depth-first passes run from the root, each with its own visited set
//! so shared or cyclic child references are walked at most once per pass:
//!
//! 1. [`follow`] assigns depths and finds the deepest level.
//! 2. [`process_level`] chains container nodes of one depth, once per level
//!    above the deepest.
//! 3. [`process_pages`] chains every page into one reading order.
//!
//! Traversal always uses [`Node::traversal_children`] and visits nodes in
//! pre-order from an explicit stack, so nesting depth is not limited by the
//! call stack. Excluded nodes are pruned with their whole subtree in the
//! chaining passes.

use std::collections::HashSet;

use crate::node::{Node, NodeKind, NodeStore};

/// Counters from one linearization run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinearizeStats {
    /// Deepest level reached from the root.
    pub max_depth: usize,
    /// Nodes reached from the root.
    pub reachable: usize,
    /// Pages in the reading order.
    pub pages: usize,
}

/// Assign depths and chain links in place.
///
/// Does nothing when `root` is not in the store.
pub fn linearize(store: &mut NodeStore, root: i64) -> LinearizeStats {
    let Some(root_idx) = store.index_of(root) else {
        return LinearizeStats::default();
    };

    let mut visited = HashSet::new();
    let mut max_depth = 0;
    follow(store, &mut visited, root_idx, &mut max_depth);
    let reachable = visited.len();

    for depth in 0..max_depth {
        visited.clear();
        process_level(store, &mut visited, root_idx, depth);
    }

    visited.clear();
    let pages = process_pages(store, &mut visited, root_idx);

    LinearizeStats {
        max_depth,
        reachable,
        pages,
    }
}

fn children_of(store: &NodeStore, idx: usize) -> Vec<usize> {
    store
        .at(idx)
        .traversal_children()
        .iter()
        .filter_map(|&id| store.index_of(id))
        .collect()
}

/// Push children so the first one is popped next.
fn push_children(stack: &mut Vec<usize>, store: &NodeStore, idx: usize) {
    stack.extend(children_of(store, idx).into_iter().rev());
}

/// Depth-first depth assignment; the first visit decides a node's depth.
fn follow(
    store: &mut NodeStore,
    visited: &mut HashSet<i64>,
    root: usize,
    max_depth: &mut usize,
) {
    let mut stack = vec![(root, 0)];
    while let Some((idx, depth)) = stack.pop() {
        if !visited.insert(store.at(idx).id) {
            continue;
        }

        store.at_mut(idx).depth = depth;
        *max_depth = (*max_depth).max(depth);

        let children = children_of(store, idx);
        stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
    }
}

/// Chain the containers at `level`.
///
/// Pages at `level` end the descent but never join the chain.
fn process_level(store: &mut NodeStore, visited: &mut HashSet<i64>, root: usize, level: usize) {
    let mut prev: Option<usize> = None;
    let mut stack = vec![root];
    while let Some(idx) = stack.pop() {
        let node = store.at(idx);
        if !visited.insert(node.id) || node.excluded {
            continue;
        }

        if node.depth == level {
            if node.kind.is_container() {
                if let Some(p) = prev {
                    link(store, p, idx);
                }
                prev = Some(idx);
            }
            continue;
        }

        push_children(&mut stack, store, idx);
    }
}

/// Chain every reachable, non-excluded page in traversal order.
///
/// Returns the number of pages chained.
fn process_pages(store: &mut NodeStore, visited: &mut HashSet<i64>, root: usize) -> usize {
    let mut count = 0;
    let mut prev: Option<usize> = None;
    let mut stack = vec![root];
    while let Some(idx) = stack.pop() {
        let node = store.at(idx);
        if !visited.insert(node.id) || node.excluded {
            continue;
        }

        if node.kind == NodeKind::Page {
            if let Some(p) = prev {
                link(store, p, idx);
            }
            prev = Some(idx);
            count += 1;
            continue;
        }

        push_children(&mut stack, store, idx);
    }
    count
}

fn link(store: &mut NodeStore, prev: usize, next: usize) {
    let next_id = store.at(next).id;
    let prev_id = store.at(prev).id;
    store.at_mut(prev).next = next_id;
    store.at_mut(next).prev = prev_id;
}

/// Follow `next` links from `start`, stopping at the end or on a loop.
pub(crate) fn walk_chain(store: &NodeStore, start: &Node) -> Vec<i64> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut current = Some(start);
    while let Some(node) = current {
        if !seen.insert(node.id) {
            break;
        }
        out.push(node.id);
        current = (node.next != 0).then(|| store.get(node.next)).flatten();
    }
    out
}

#[cfg(test)]
mod tests {
    use lore_storage::{PageRow, SectionRow, UnitRow};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::builder::build_store;

    const U: i64 = 1;
    const S1: i64 = 10;
    const S2: i64 = 11;
    const P1: i64 = 20;
    const P2: i64 = 21;
    const P3: i64 = 22;

    fn section(id: i64, root: i64, order: &[i64], priority: i64) -> SectionRow {
        SectionRow {
            id,
            project: U,
            root,
            order: order.to_vec(),
            priority,
            ..SectionRow::default()
        }
    }

    fn page(id: i64, section: i64, excluded: bool) -> PageRow {
        let mut row = PageRow {
            id,
            project: U,
            section,
            ..PageRow::default()
        };
        row.options.excluded_from_spine = excluded;
        row
    }

    fn unit(order: &[i64]) -> UnitRow {
        UnitRow {
            id: U,
            order: order.to_vec(),
            ..UnitRow::default()
        }
    }

    fn page_chain(store: &NodeStore) -> Vec<i64> {
        let head = store
            .iter()
            .find(|n| n.kind == NodeKind::Page && n.prev == 0 && n.next != 0);
        head.map(|n| walk_chain(store, n)).unwrap_or_default()
    }

    fn links(store: &NodeStore, id: i64) -> (i64, i64) {
        let node = store.get(id).unwrap();
        (node.prev, node.next)
    }

    /// U with S1 (order P1, P2) and S2 (priority 5); P2 excluded; P3 in S2.
    fn scenario() -> NodeStore {
        let mut store = build_store(
            &unit(&[]),
            &[section(S1, 0, &[P1, P2], 0), section(S2, 0, &[], 5)],
            &[page(P1, S1, false), page(P2, S1, true), page(P3, S2, false)],
        );
        linearize(&mut store, U);
        store
    }

    #[test]
    fn test_scenario_page_chain_skips_excluded() {
        let store = scenario();

        assert_eq!(page_chain(&store), vec![P1, P3]);
        assert_eq!(links(&store, P1), (0, P3));
        assert_eq!(links(&store, P3), (P1, 0));
    }

    #[test]
    fn test_scenario_section_chain() {
        let store = scenario();

        assert_eq!(links(&store, S1), (0, S2));
        assert_eq!(links(&store, S2), (S1, 0));
    }

    #[test]
    fn test_scenario_depths_and_stats() {
        let mut store = build_store(
            &unit(&[]),
            &[section(S1, 0, &[P1, P2], 0), section(S2, 0, &[], 5)],
            &[page(P1, S1, false), page(P2, S1, true), page(P3, S2, false)],
        );
        let stats = linearize(&mut store, U);

        assert_eq!(
            stats,
            LinearizeStats {
                max_depth: 2,
                reachable: 6,
                pages: 2,
            }
        );
        assert_eq!(store.get(U).unwrap().depth, 0);
        assert_eq!(store.get(S2).unwrap().depth, 1);
        assert_eq!(store.get(P2).unwrap().depth, 2);
    }

    #[test]
    fn test_root_has_no_links() {
        let store = scenario();

        assert_eq!(links(&store, U), (0, 0));
    }

    #[test]
    fn test_excluded_node_never_linked() {
        let store = scenario();

        assert_eq!(links(&store, P2), (0, 0));
        assert!(store.iter().all(|n| n.prev != P2 && n.next != P2));
    }

    #[test]
    fn test_excluded_section_hides_subtree() {
        let mut hidden = section(S1, 0, &[], 0);
        hidden.options.excluded_from_spine = true;
        let mut store = build_store(
            &unit(&[]),
            &[hidden, section(S2, 0, &[], 0), section(12, 0, &[], 0)],
            &[page(P1, S1, false), page(P2, S2, false), page(P3, 12, false)],
        );
        linearize(&mut store, U);

        assert_eq!(page_chain(&store), vec![P2, P3]);
        assert_eq!(links(&store, S1), (0, 0));
        assert_eq!(links(&store, P1), (0, 0));
        assert_eq!(links(&store, S2), (0, 12));
    }

    #[test]
    fn test_pages_chain_across_sections_and_depths() {
        // U: [S1 [S2 [P1]], P2, P3]
        let mut store = build_store(
            &unit(&[S1, P2, P3]),
            &[section(S1, 0, &[S2], 0), section(S2, S1, &[], 0)],
            &[page(P1, S2, false), page(P2, 0, false), page(P3, 0, false)],
        );
        linearize(&mut store, U);

        assert_eq!(page_chain(&store), vec![P1, P2, P3]);
        assert_eq!(store.get(P1).unwrap().depth, 3);
    }

    #[test]
    fn test_level_chain_skips_pages_between_containers() {
        // U: [S1, P1, S2]; P1 sits at the same depth but is not chained
        let mut store = build_store(
            &unit(&[S1, P1, S2]),
            &[section(S1, 0, &[], 0), section(S2, 0, &[], 0)],
            &[page(P1, 0, false), page(P2, S2, false)],
        );
        linearize(&mut store, U);

        assert_eq!(links(&store, S1), (0, S2));
        assert_eq!(links(&store, S2), (S1, 0));
        assert_eq!(page_chain(&store), vec![P1, P2]);
    }

    #[test]
    fn test_level_chain_crosses_parents() {
        // depth-2 sections under different depth-1 parents form one chain
        let mut store = build_store(
            &unit(&[S1, S2]),
            &[
                section(S1, 0, &[30], 0),
                section(S2, 0, &[31], 0),
                section(30, S1, &[], 0),
                section(31, S2, &[], 0),
            ],
            &[page(P1, 31, false)],
        );
        linearize(&mut store, U);

        assert_eq!(links(&store, 30), (0, 31));
        assert_eq!(links(&store, 31), (30, 0));
        assert_eq!(links(&store, S1), (0, S2));
    }

    #[test]
    fn test_deepest_level_not_chained() {
        // two sections at the deepest level, no pages below
        let mut store = build_store(
            &unit(&[]),
            &[section(S1, 0, &[], 0), section(S2, 0, &[], 0)],
            &[],
        );
        let stats = linearize(&mut store, U);

        assert_eq!(stats.max_depth, 1);
        assert_eq!(links(&store, S1), (0, 0));
        assert_eq!(links(&store, S2), (0, 0));
    }

    #[test]
    fn test_ordered_children_take_precedence() {
        // S1 orders only P2; P1 is unordered and therefore never traversed
        let mut store = build_store(
            &unit(&[]),
            &[section(S1, 0, &[P2], 0)],
            &[page(P1, S1, false), page(P2, S1, false)],
        );
        let stats = linearize(&mut store, U);

        assert_eq!(store.get(S1).unwrap().unordered, vec![P1]);
        assert_eq!(stats.pages, 1);
        assert_eq!(links(&store, P1), (0, 0));
        assert_eq!(links(&store, P2), (0, 0));
    }

    #[test]
    fn test_unordered_pages_follow_priority() {
        let mut a = page(P1, 0, false);
        a.priority = 9;
        let mut b = page(P2, 0, false);
        b.priority = -1;
        let c = page(P3, 0, false);
        let mut store = build_store(&unit(&[]), &[], &[a, b, c]);
        linearize(&mut store, U);

        assert_eq!(page_chain(&store), vec![P2, P3, P1]);
    }

    #[test]
    fn test_orphan_unreachable() {
        let mut store = build_store(
            &unit(&[]),
            &[],
            &[page(P1, 0, false), page(P2, 404, false), page(P3, 0, false)],
        );
        let stats = linearize(&mut store, U);

        assert_eq!(stats.reachable, 3);
        assert_eq!(page_chain(&store), vec![P1, P3]);
        assert_eq!(links(&store, P2), (0, 0));
    }

    #[test]
    fn test_cycle_is_walked_once() {
        // S1 and S2 order each other
        let mut store = build_store(
            &unit(&[S1]),
            &[section(S1, 0, &[S2, P1], 0), section(S2, S1, &[S1, P2], 0)],
            &[page(P1, S1, false), page(P2, S2, false)],
        );
        let stats = linearize(&mut store, U);

        assert_eq!(stats.max_depth, 3);
        assert_eq!(page_chain(&store), vec![P2, P1]);
    }

    #[test]
    fn test_shared_child_gets_first_visit_depth() {
        // P1 listed under both the root and S1
        let mut store = build_store(
            &unit(&[P1, S1]),
            &[section(S1, 0, &[P1, P2], 0)],
            &[page(P1, S1, false), page(P2, S1, false)],
        );
        linearize(&mut store, U);

        assert_eq!(store.get(P1).unwrap().depth, 1);
        assert_eq!(page_chain(&store), vec![P1, P2]);
    }

    #[test]
    fn test_reinclusion_restores_neighbours() {
        let rows = |excluded: bool| {
            vec![
                page(P1, 0, false),
                page(P2, 0, excluded),
                page(P3, 0, false),
            ]
        };

        let mut hidden = build_store(&unit(&[]), &[], &rows(true));
        linearize(&mut hidden, U);
        assert_eq!(page_chain(&hidden), vec![P1, P3]);

        let mut shown = build_store(&unit(&[]), &[], &rows(false));
        linearize(&mut shown, U);
        assert_eq!(page_chain(&shown), vec![P1, P2, P3]);
        assert_eq!(links(&shown, P2), (P1, P3));
    }

    #[test]
    fn test_missing_root_is_noop() {
        let mut store = build_store(&unit(&[]), &[], &[page(P1, 0, false)]);
        let before = store.clone();

        assert_eq!(linearize(&mut store, 999), LinearizeStats::default());
        assert_eq!(store, before);
    }

    #[test]
    fn test_deep_nesting_on_small_stack() {
        const DEPTH: i64 = 3000;
        let sections: Vec<SectionRow> = (1..=DEPTH)
            .map(|i| section(100 + i, if i == 1 { 0 } else { 99 + i }, &[], 0))
            .collect();
        let pages = [page(P1, 100 + DEPTH, false)];
        let mut store = build_store(&unit(&[]), &sections, &pages);

        let (stats, page_depth) = std::thread::Builder::new()
            .stack_size(128 * 1024)
            .spawn(move || {
                let stats = linearize(&mut store, U);
                (stats, store.get(P1).map(|n| n.depth))
            })
            .unwrap()
            .join()
            .unwrap();

        let depth = usize::try_from(DEPTH).unwrap() + 1;
        assert_eq!(stats.max_depth, depth);
        assert_eq!(stats.pages, 1);
        assert_eq!(page_depth, Some(depth));
    }

    #[test]
    fn test_walk_chain_stops_on_loop() {
        let mut a = Node::new(1, 0, NodeKind::Page);
        a.next = 2;
        let mut b = Node::new(2, 0, NodeKind::Page);
        b.next = 1;
        let store = NodeStore::from_nodes(vec![a, b]);

        assert_eq!(walk_chain(&store, store.get(1).unwrap()), vec![1, 2]);
    }
}
