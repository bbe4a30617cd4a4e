//! Structural paths: child indices from a base node down to a target.
//!
//! A path survives anything that does not shift sibling indices along it. Code that mutates
//! the tree while holding paths must pass them through the mutation (see
//! [`crate::merge::merge_same_tags`]) rather than re-encoding afterwards.
use crate::query::{is_boundary, position_index};
use crate::unicode::strip_zero_width;
use html::{Dom, DomError, NodeId};

pub type NodePath = Vec<usize>;

/// Bytes absorbed into a text node by [`encode_path_merging_text`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextMerge {
    /// Absorbed from preceding siblings; add to an offset inside the node.
    pub before: usize,
    /// Absorbed from following siblings.
    pub after: usize,
}

/// Path from `base` (exclusive) to `node`. Without a base, or when `base` is not an
/// ancestor, the path starts below the nearest editable root or fragment container.
pub fn encode_path(dom: &Dom, node: NodeId, base: Option<NodeId>) -> NodePath {
    let mut path = Vec::new();
    let mut current = Some(node).filter(|n| dom.is_live(*n));
    while let Some(id) = current {
        if Some(id) == base || is_boundary(dom, id) {
            break;
        }
        path.push(position_index(dom, id));
        current = dom.parent(id);
    }
    path.reverse();
    path
}

/// [`encode_path`], after first coalescing the text siblings around a text `node` into it.
///
/// Zero-width spaces are stripped from the absorbed text (not from `node` itself).
/// `merge` receives the byte lengths pulled in from each side so a caller can shift a
/// caret offset inside `node` by `merge.before`.
pub fn encode_path_merging_text(
    dom: &mut Dom,
    node: NodeId,
    base: Option<NodeId>,
    merge: &mut TextMerge,
) -> Result<NodePath, DomError> {
    *merge = TextMerge::default();
    if dom.is_text(node) {
        let mut prefix = String::new();
        while let Some(prev) = dom.prev_sibling(node).filter(|p| dom.is_text(*p)) {
            let absorbed = strip_zero_width(dom.text(prev).unwrap_or("")).into_owned();
            prefix.insert_str(0, &absorbed);
            dom.remove(prev)?;
        }
        let mut suffix = String::new();
        while let Some(next) = dom.next_sibling(node).filter(|n| dom.is_text(*n)) {
            suffix.push_str(&strip_zero_width(dom.text(next).unwrap_or("")));
            dom.remove(next)?;
        }
        if !prefix.is_empty() || !suffix.is_empty() {
            let merged = format!("{prefix}{}{suffix}", dom.text(node).unwrap_or(""));
            dom.set_text(node, &merged)?;
        }
        merge.before = prefix.len();
        merge.after = suffix.len();
    }
    Ok(encode_path(dom, node, base))
}

/// Walk `path` down from `base`. An index past the end clamps to the last child and a
/// childless node ends the walk, so a stale path resolves to the nearest surviving node.
pub fn decode_path(dom: &Dom, path: &[usize], base: NodeId) -> NodeId {
    let mut current = base;
    for &index in path {
        let children = dom.children(current);
        let Some(&last) = children.last() else {
            break;
        };
        current = children.get(index).copied().unwrap_or(last);
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use html::parse_fragment;

    #[test]
    fn encode_path_stops_below_wysiwyg_root() {
        let dom = parse_fragment(
            r#"<div class="se-wrapper-wysiwyg"><p>a</p><p><span>aa</span><span>bb</span></p></div>"#,
        );
        let root = dom.children(dom.document())[0];
        let p = dom.children(root)[1];
        let bb = dom.children(dom.children(p)[1])[0];
        assert_eq!(encode_path(&dom, bb, None), [1, 1, 0]);
        assert_eq!(encode_path(&dom, bb, Some(p)), [1, 0]);
        assert_eq!(encode_path(&dom, root, None), Vec::<usize>::new());
    }

    #[test]
    fn path_round_trips_every_node() {
        let dom = parse_fragment("<ul><li>a<b>b</b></li><li><br></li></ul><p>c</p>");
        let base = dom.document();
        for node in dom.descendants(base) {
            let path = encode_path(&dom, node, Some(base));
            assert_eq!(decode_path(&dom, &path, base), node, "path {path:?}");
        }
    }

    #[test]
    fn decode_path_clamps_stale_indices() {
        let dom = parse_fragment("<p>a</p><p><b>x</b><i>y</i></p>");
        let base = dom.document();
        let second = dom.children(base)[1];
        let i = dom.children(second)[1];
        assert_eq!(decode_path(&dom, &[7, 9], base), i);
        let y = dom.children(i)[0];
        assert_eq!(decode_path(&dom, &[1, 1, 0, 4, 4], base), y);
        assert_eq!(decode_path(&dom, &[], base), base);
    }

    #[test]
    fn encode_merging_text_reports_absorbed_bytes() {
        let mut dom = parse_fragment("<p>x</p>");
        let p = dom.children(dom.document())[0];
        let middle = dom.children(p)[0];
        let before = dom.create_text("ab\u{200B}");
        let after = dom.create_text("\u{200B}cd");
        dom.insert_before(p, before, middle).unwrap();
        dom.append_child(p, after).unwrap();

        let mut merge = TextMerge::default();
        let path = encode_path_merging_text(&mut dom, middle, None, &mut merge).unwrap();
        assert_eq!(path, [0, 0]);
        assert_eq!(merge, TextMerge { before: 2, after: 2 });
        assert_eq!(dom.children(p), &[middle]);
        assert_eq!(dom.text(middle), Some("abxcd"));
    }

    #[test]
    fn encode_merging_text_ignores_elements() {
        let mut dom = parse_fragment("<p>a<b>b</b>c</p>");
        let p = dom.children(dom.document())[0];
        let b = dom.children(p)[1];
        let mut merge = TextMerge { before: 9, after: 9 };
        let path = encode_path_merging_text(&mut dom, b, None, &mut merge).unwrap();
        assert_eq!(path, [0, 1]);
        assert_eq!(merge, TextMerge::default());
        assert_eq!(dom.children(p).len(), 3);
    }
}
