//! Tree walking bounded by the editable root.
use crate::classify::{is_break, is_island, is_wysiwyg_root};
use html::{Dom, NodeData, NodeId};
use std::cmp::Ordering;

/// Which nodes a descendant walk visits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Traverse {
    /// Elements only; text and comments are neither offered nor descended through.
    Elements,
    /// Every node.
    Nodes,
}

/// The wysiwyg root and the fragment container both end upward walks.
pub fn is_boundary(dom: &Dom, id: NodeId) -> bool {
    matches!(dom.data(id), Some(NodeData::Document)) || is_wysiwyg_root(dom, id)
}

/// Nearest node, starting at `node` itself, that satisfies `pred`. The walk stops at the
/// editable root: a root that does not match ends the search with `None`.
pub fn get_ancestor<F>(dom: &Dom, node: NodeId, mut pred: F) -> Option<NodeId>
where
    F: FnMut(NodeId) -> bool,
{
    let mut current = Some(node).filter(|n| dom.is_live(*n));
    while let Some(id) = current {
        if pred(id) {
            return Some(id);
        }
        if is_boundary(dom, id) {
            return None;
        }
        current = dom.parent(id);
    }
    None
}

/// Pre-order descendants of `root` (excluding `root`) that satisfy `pred`.
pub fn get_descendants<F>(dom: &Dom, root: NodeId, traverse: Traverse, pred: F) -> Vec<NodeId>
where
    F: FnMut(NodeId) -> bool,
{
    collect(dom, root, traverse, pred, |_| true)
}

/// Like [`get_descendants`], but island subtrees are opaque: an island is offered to `pred`
/// while its contents are not.
pub fn get_descendants_outside_islands<F>(
    dom: &Dom,
    root: NodeId,
    traverse: Traverse,
    pred: F,
) -> Vec<NodeId>
where
    F: FnMut(NodeId) -> bool,
{
    collect(dom, root, traverse, pred, |id| !is_island(dom, id))
}

fn collect<F, D>(
    dom: &Dom,
    root: NodeId,
    traverse: Traverse,
    mut pred: F,
    mut descend: D,
) -> Vec<NodeId>
where
    F: FnMut(NodeId) -> bool,
    D: FnMut(NodeId) -> bool,
{
    let mut out = Vec::new();
    let visit = |id: NodeId| traverse == Traverse::Nodes || dom.is_element(id);
    let mut stack: Vec<NodeId> = dom
        .children(root)
        .iter()
        .rev()
        .copied()
        .filter(|c| visit(*c))
        .collect();
    while let Some(id) = stack.pop() {
        if pred(id) {
            out.push(id);
        }
        if descend(id) {
            stack.extend(dom.children(id).iter().rev().copied().filter(|c| visit(*c)));
        }
    }
    out
}

/// Levels below the editable root: `-1` for the root itself (or a missing node), `0` for
/// its direct children.
pub fn depth(dom: &Dom, node: NodeId) -> isize {
    if !dom.is_live(node) || is_boundary(dom, node) {
        return -1;
    }
    let mut depth = 0;
    for ancestor in dom.ancestors(node) {
        if is_boundary(dom, ancestor) {
            break;
        }
        depth += 1;
    }
    depth
}

/// Index among all sibling nodes; `0` for a parentless node.
pub fn position_index(dom: &Dom, node: NodeId) -> usize {
    dom.index_in_parent(node).unwrap_or(0)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderComparison {
    /// Lowest common ancestor, `None` when the nodes share no tree.
    pub ancestor: Option<NodeId>,
    /// `a` or its ancestor one level below `ancestor` (`a` itself when it is the ancestor).
    pub a: NodeId,
    pub b: NodeId,
    pub result: Ordering,
}

/// Document order of two arbitrary nodes.
pub fn compare_order(dom: &Dom, a: NodeId, b: NodeId) -> OrderComparison {
    let disconnected = OrderComparison {
        ancestor: None,
        a,
        b,
        result: Ordering::Equal,
    };
    if !dom.is_live(a) || !dom.is_live(b) {
        return disconnected;
    }
    if a == b {
        return OrderComparison {
            ancestor: Some(a),
            a,
            b,
            result: Ordering::Equal,
        };
    }

    let depth_a = dom.ancestors(a).count();
    let depth_b = dom.ancestors(b).count();
    let (mut lower_a, mut lower_b) = (a, b);
    let mut below_a = None;
    let mut below_b = None;
    for _ in depth_b..depth_a {
        below_a = Some(lower_a);
        lower_a = dom.parent(lower_a).unwrap_or(lower_a);
    }
    for _ in depth_a..depth_b {
        below_b = Some(lower_b);
        lower_b = dom.parent(lower_b).unwrap_or(lower_b);
    }

    // One contains the other: the container comes first.
    if lower_a == lower_b {
        let (result, a_side, b_side) = if depth_a < depth_b {
            (Ordering::Less, a, below_b.unwrap_or(b))
        } else {
            (Ordering::Greater, below_a.unwrap_or(a), b)
        };
        return OrderComparison {
            ancestor: Some(lower_a),
            a: a_side,
            b: b_side,
            result,
        };
    }

    loop {
        let (parent_a, parent_b) = (dom.parent(lower_a), dom.parent(lower_b));
        match (parent_a, parent_b) {
            (Some(pa), Some(pb)) if pa == pb => {
                let result = position_index(dom, lower_a).cmp(&position_index(dom, lower_b));
                return OrderComparison {
                    ancestor: Some(pa),
                    a: lower_a,
                    b: lower_b,
                    result,
                };
            }
            (Some(pa), Some(pb)) => {
                lower_a = pa;
                lower_b = pb;
            }
            _ => return disconnected,
        }
    }
}

/// Deepest first descendant of `first` and deepest last descendant of `last` (default
/// `first`). Descent stops at `<br>` and at empty elements.
pub fn edge_children(dom: &Dom, first: NodeId, last: Option<NodeId>) -> (NodeId, NodeId) {
    let descend = |mut node: NodeId, pick: fn(&Dom, NodeId) -> Option<NodeId>| {
        while dom.is_element(node) && !is_break(dom, node) {
            match pick(dom, node) {
                Some(child) => node = child,
                None => break,
            }
        }
        node
    };
    let start = descend(first, Dom::first_child);
    let end = descend(last.unwrap_or(first), Dom::last_child);
    (start, end)
}

/// First (or last) descendant node of `node` that satisfies `pred`.
pub fn child_element<F>(dom: &Dom, node: NodeId, pred: F, last: bool) -> Option<NodeId>
where
    F: FnMut(NodeId) -> bool,
{
    let found = get_descendants(dom, node, Traverse::Nodes, pred);
    if last {
        found.last().copied()
    } else {
        found.first().copied()
    }
}
