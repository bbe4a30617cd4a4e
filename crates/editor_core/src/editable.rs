//! An editing surface: a tree rooted at a wysiwyg `<div>` plus caret bookkeeping.
use crate::Normalizer;
use crate::classify::{WYSIWYG_CLASS, is_list};
use crate::fixer;
use crate::merge::merge_same_tags;
use crate::path::{NodePath, TextMerge, decode_path, encode_path, encode_path_merging_text};
use crate::unicode::{ZERO_WIDTH_SPACE, strip_zero_width};
use html::{Dom, DomError, NodeId};
use std::sync::Arc;

/// A caret position. `offset` is a byte offset into a text node, or a child index into an
/// element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caret {
    pub node: NodeId,
    pub offset: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub start: Caret,
    pub end: Caret,
}

impl Selection {
    pub fn collapsed(caret: Caret) -> Self {
        Self { start: caret, end: caret }
    }
}

/// A selection stored as paths from the wysiwyg root, so it survives rebuilding of the
/// nodes it points into.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SavedSelection {
    /// Start and end paths.
    pub paths: [NodePath; 2],
    pub offsets: [usize; 2],
}

pub struct Editable {
    dom: Dom,
    root: NodeId,
}

impl Default for Editable {
    fn default() -> Self {
        Self::new()
    }
}

fn fresh_surface() -> (Dom, NodeId) {
    let mut dom = Dom::new();
    let root = dom.create_element_with(
        "div",
        vec![(Arc::from("class"), Some(WYSIWYG_CLASS.to_string()))],
    );
    let document = dom.document();
    // A new element under the document cannot form a cycle.
    if let Err(err) = dom.append_child(document, root) {
        log::debug!(target: "editor.editable", "could not attach root: {err}");
    }
    (dom, root)
}

impl Editable {
    /// An empty surface. Call [`Editable::set_contents`] to load content.
    pub fn new() -> Self {
        let (dom, root) = fresh_surface();
        Self { dom, root }
    }

    pub fn with_contents(normalizer: &Normalizer, html: &str) -> Self {
        let mut editable = Self::new();
        editable.set_contents(normalizer, html);
        editable
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Replace the contents with normalized `html`. Every line ends up as a line element;
    /// an empty input leaves a single placeholder line.
    pub fn set_contents(&mut self, normalizer: &Normalizer, html: &str) {
        let (mut dom, root) = fresh_surface();
        let stripped = normalizer.strip_disallowed(html);
        if let Err(err) = html::parse_fragment_into(&mut dom, root, &stripped) {
            log::debug!(target: "editor.editable", "content dropped: {err}");
        }
        let fixes = normalizer.normalize_tree(&mut dom, root);
        if let Err(err) = fixer::wrap_orphan_inline(&mut dom, root, normalizer.default_line()) {
            log::debug!(target: "editor.editable", "orphan wrap skipped: {err}");
        }
        log::debug!(target: "editor.editable", "contents set with {fixes} structural fixes");
        self.dom = dom;
        self.root = root;
    }

    pub fn contents(&self) -> String {
        html::inner_html(&self.dom, self.root)
    }

    pub fn encode_path(&self, node: NodeId) -> NodePath {
        encode_path(&self.dom, node, Some(self.root))
    }

    pub fn decode_path(&self, path: &[usize]) -> NodeId {
        decode_path(&self.dom, path, self.root)
    }

    /// Store `selection` as paths. Text carets first absorb their neighbouring text nodes,
    /// so the stored offsets address a single coalesced node. An element caret's child index
    /// drops by the preceding children the other caret's coalescing removed.
    pub fn snapshot_selection(&mut self, selection: Selection) -> Result<SavedSelection, DomError> {
        let Selection { start, end } = selection;
        let start_preceding = self.preceding_children(start);
        let end_preceding = self.preceding_children(end);
        // The end may sit in a sibling that the start's coalescing absorbs.
        let end_in_start_run = if end.node != start.node {
            offset_in_text_run(&self.dom, start.node, end)
        } else {
            None
        };

        let (start_path, start_offset, start_merge) = self.save_caret(start)?;
        let (end_path, end_offset) = if end.node == start.node {
            (start_path.clone(), end.offset + start_merge.before)
        } else if let Some(offset) = end_in_start_run.filter(|_| !self.dom.is_live(end.node)) {
            (start_path.clone(), offset)
        } else {
            let (path, offset, _) = self.save_caret(end)?;
            (path, offset)
        };

        Ok(SavedSelection {
            paths: [start_path, end_path],
            offsets: [
                start_offset - self.detached_count(start.node, &start_preceding),
                end_offset - self.detached_count(end.node, &end_preceding),
            ],
        })
    }

    // Children ahead of an element caret. Empty for text carets.
    fn preceding_children(&self, caret: Caret) -> Vec<NodeId> {
        if self.dom.is_text(caret.node) {
            return Vec::new();
        }
        self.dom.children(caret.node).iter().take(caret.offset).copied().collect()
    }

    fn detached_count(&self, parent: NodeId, children: &[NodeId]) -> usize {
        children
            .iter()
            .filter(|c| self.dom.parent(**c) != Some(parent))
            .count()
    }

    fn save_caret(&mut self, caret: Caret) -> Result<(NodePath, usize, TextMerge), DomError> {
        let mut merge = TextMerge::default();
        let path = encode_path_merging_text(&mut self.dom, caret.node, Some(self.root), &mut merge)?;
        Ok((path, caret.offset + merge.before, merge))
    }

    /// Resolve a saved selection against the current tree, clamping stale offsets.
    pub fn restore_selection(&self, saved: &SavedSelection) -> Selection {
        let caret = |i: usize| {
            let node = self.decode_path(&saved.paths[i]);
            Caret {
                node,
                offset: clamp_offset(&self.dom, node, saved.offsets[i]),
            }
        };
        Selection {
            start: caret(0),
            end: caret(1),
        }
    }

    /// Merge equal adjacent inline siblings across the surface, keeping `saved` valid.
    pub fn merge_adjacent(&mut self, saved: &mut SavedSelection, only_text: bool) {
        let absorbed = merge_same_tags(&mut self.dom, self.root, &mut saved.paths, only_text);
        for (offset, extra) in saved.offsets.iter_mut().zip(absorbed) {
            *offset += extra;
        }
    }

    /// Drop empty inline leftovers under `element`, sparing the branch holding `keep`.
    pub fn remove_empty_nodes(&mut self, element: NodeId, keep: Option<NodeId>) -> Result<(), DomError> {
        fixer::remove_empty_nodes(&mut self.dom, element, keep)
    }

    /// Normalize `html` into `<li>` items and append them to `list`.
    pub fn insert_list_items(
        &mut self,
        normalizer: &Normalizer,
        list: NodeId,
        html: &str,
    ) -> Result<Vec<NodeId>, DomError> {
        if !is_list(&self.dom, list) {
            return Err(DomError::WrongNodeKind(list));
        }
        let container = self.dom.create_element("div");
        let stripped = normalizer.strip_disallowed(html);
        html::parse_fragment_into(&mut self.dom, container, &stripped)?;
        normalizer.normalize_tree(&mut self.dom, container);
        let items = fixer::fragment_to_list_cells(&mut self.dom, container)?;
        for item in &items {
            self.dom.append_child(list, *item)?;
        }
        self.dom.remove(container)?;
        Ok(items)
    }
}

/// Where `caret` lands once the text run around `anchor` is coalesced into `anchor`, or
/// `None` when the caret is outside that run. Zero-width spaces in absorbed nodes vanish,
/// so offsets inside them shrink accordingly.
fn offset_in_text_run(dom: &Dom, anchor: NodeId, caret: Caret) -> Option<usize> {
    if !dom.is_text(anchor) || !dom.is_text(caret.node) {
        return None;
    }
    let parent = dom.parent(anchor)?;
    if dom.parent(caret.node) != Some(parent) {
        return None;
    }
    let siblings = dom.children(parent);
    let at = dom.index_in_parent(anchor)?;
    let first = siblings[..at]
        .iter()
        .rposition(|s| !dom.is_text(*s))
        .map_or(0, |i| i + 1);
    let mut position = 0;
    for &node in siblings[first..].iter().take_while(|s| dom.is_text(**s)) {
        let text = dom.text(node).unwrap_or("");
        if node == caret.node {
            let head = &text[..floor_char_boundary(text, caret.offset)];
            let kept: usize = head
                .chars()
                .filter(|c| *c != ZERO_WIDTH_SPACE)
                .map(char::len_utf8)
                .sum();
            return Some(position + kept);
        }
        position += if node == anchor { text.len() } else { strip_zero_width(text).len() };
    }
    None
}

fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

fn clamp_offset(dom: &Dom, node: NodeId, offset: usize) -> usize {
    match dom.text(node) {
        Some(text) => floor_char_boundary(text, offset),
        None => offset.min(dom.children(node).len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Options;

    fn normalizer() -> Normalizer {
        Normalizer::new(Options::default()).unwrap()
    }

    #[test]
    fn set_contents_normalizes() {
        let editable = Editable::with_contents(&normalizer(), "loose<ul><span>x</span></ul><script>bad()</script>");
        assert_eq!(editable.contents(), "<p>loose</p><ul><li>x</li></ul>");
        let empty = Editable::with_contents(&normalizer(), "");
        assert_eq!(empty.contents(), "<p><br></p>");
    }

    #[test]
    fn paths_are_relative_to_root() {
        let editable = Editable::with_contents(&normalizer(), "<p>a</p><p><b>b</b></p>");
        let root = editable.root();
        let second = editable.dom().children(root)[1];
        let b_text = editable.dom().children(editable.dom().children(second)[0])[0];
        let path = editable.encode_path(b_text);
        assert_eq!(path, [1, 0, 0]);
        assert_eq!(editable.decode_path(&path), b_text);
    }

    #[test]
    fn snapshot_coalesces_split_text() {
        let mut editable = Editable::with_contents(&normalizer(), "<p>ab</p>");
        let p = editable.dom().children(editable.root())[0];
        let ab = editable.dom().children(p)[0];
        let dom = editable.dom_mut();
        dom.set_text(ab, "ab").unwrap();
        let cd = dom.create_text("c\u{200B}d");
        dom.append_child(p, cd).unwrap();

        let selection = Selection {
            start: Caret { node: ab, offset: 1 },
            end: Caret { node: cd, offset: 4 },
        };
        let saved = editable.snapshot_selection(selection).unwrap();
        assert_eq!(saved.paths, [vec![0, 0], vec![0, 0]]);
        assert_eq!(saved.offsets, [1, 3]);
        assert_eq!(editable.contents(), "<p>abcd</p>");

        let restored = editable.restore_selection(&saved);
        assert_eq!(restored.start, Caret { node: ab, offset: 1 });
        assert_eq!(restored.end, Caret { node: ab, offset: 3 });
    }

    #[test]
    fn merge_adjacent_keeps_selection() {
        let mut editable = Editable::with_contents(&normalizer(), "<p><b>ab</b><b>cd</b></p>");
        let p = editable.dom().children(editable.root())[0];
        let cd = editable.dom().children(editable.dom().children(p)[1])[0];
        let mut saved = editable
            .snapshot_selection(Selection::collapsed(Caret { node: cd, offset: 1 }))
            .unwrap();
        editable.merge_adjacent(&mut saved, false);
        assert_eq!(editable.contents(), "<p><strong>abcd</strong></p>");
        let restored = editable.restore_selection(&saved);
        assert_eq!(editable.dom().text(restored.start.node), Some("abcd"));
        assert_eq!(restored.start.offset, 3);
    }

    #[test]
    fn element_caret_shifts_when_end_coalescing_removes_earlier_children() {
        let mut editable = Editable::with_contents(&normalizer(), "<p>ab<b>x</b></p>");
        let p = editable.dom().children(editable.root())[0];
        let bold = editable.dom().children(p)[1];
        let dom = editable.dom_mut();
        let cd = dom.create_text("cd");
        dom.insert_before(p, cd, bold).unwrap();

        let selection = Selection {
            start: Caret { node: p, offset: 2 },
            end: Caret { node: cd, offset: 1 },
        };
        let saved = editable.snapshot_selection(selection).unwrap();
        assert_eq!(saved.paths, [vec![0], vec![0, 0]]);
        assert_eq!(saved.offsets, [1, 3]);
        assert_eq!(editable.contents(), "<p>abcd<strong>x</strong></p>");

        let restored = editable.restore_selection(&saved);
        assert_eq!(editable.dom().children(p)[restored.start.offset], bold);
        assert_eq!(restored.end, Caret { node: cd, offset: 3 });
    }

    #[test]
    fn element_end_caret_shifts_when_start_coalescing_removes_earlier_children() {
        let mut editable = Editable::with_contents(&normalizer(), "<p>ab<b>x</b></p>");
        let p = editable.dom().children(editable.root())[0];
        let ab = editable.dom().children(p)[0];
        let bold = editable.dom().children(p)[1];
        let dom = editable.dom_mut();
        let cd = dom.create_text("cd");
        dom.insert_before(p, cd, bold).unwrap();

        let selection = Selection {
            start: Caret { node: ab, offset: 1 },
            end: Caret { node: p, offset: 2 },
        };
        let saved = editable.snapshot_selection(selection).unwrap();
        assert_eq!(saved.offsets, [1, 1]);
        let restored = editable.restore_selection(&saved);
        assert_eq!(editable.dom().children(p)[restored.end.offset], bold);
    }

    #[test]
    fn restore_clamps_stale_selection() {
        let editable = Editable::with_contents(&normalizer(), "<p>é</p>");
        let saved = SavedSelection {
            paths: [vec![0, 0], vec![5, 5, 5]],
            offsets: [1, 99],
        };
        let restored = editable.restore_selection(&saved);
        assert_eq!(restored.start.offset, 0);
        assert_eq!(restored.end.offset, 2);
    }

    #[test]
    fn insert_list_items_converts_fragment() {
        let normalizer = normalizer();
        let mut editable = Editable::with_contents(&normalizer, "<ul><li>a</li></ul>");
        let list = editable.dom().children(editable.root())[0];
        let items = editable
            .insert_list_items(&normalizer, list, "<p>b</p>c<ol><li>d</li></ol>")
            .unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(editable.contents(), "<ul><li>a</li><li>b</li><li>c</li><li>d</li></ul>");

        let mut p = Editable::with_contents(&normalizer, "<p>x</p>");
        let line = p.dom().children(p.root())[0];
        assert_eq!(
            p.insert_list_items(&normalizer, line, "y"),
            Err(DomError::WrongNodeKind(line))
        );
    }

    #[test]
    fn remove_empty_nodes_on_surface() {
        let mut editable = Editable::with_contents(&normalizer(), "<p>x<span>\u{200B}</span></p>");
        let p = editable.dom().children(editable.root())[0];
        editable.remove_empty_nodes(p, None).unwrap();
        assert_eq!(editable.contents(), "<p>x</p>");
    }
}
