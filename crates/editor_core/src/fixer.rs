//! Structural consistency checks and repairs for pasted or loaded content.
//!
//! One pre-order pass collects violations against the unmodified tree; the fixes then run in
//! a fixed order: removals, unwrapping of rejected elements, hoisting of misplaced lines,
//! empty-tag removal, list repair and table-cell repair. Every candidate is re-checked when its fix is applied, because earlier
//! fixes may already have moved or removed it. Fixing one violation can expose another (a
//! hoisted `<p>` can land directly in a `<ul>`), so the collect and apply cycle repeats until
//! the tree is clean.
use crate::classify::{
    is_break, is_component, is_format, is_island, is_list, is_list_cell, is_not_text_node,
    is_non_editable, is_range_format, is_table, is_table_cell, is_text_style,
};
use crate::path::{encode_path, NodePath};
use crate::query::{get_descendants_outside_islands, Traverse};
use crate::unicode::only_zero_width_space;
use crate::whitelist::{is_always_disallowed, TagPolicy};
use html::{Dom, DomError, NodeData, NodeId};
use serde::Serialize;

const MAX_ROUNDS: usize = 16;

/// Kinds in application order.
const APPLY_ORDER: [ViolationKind; 7] = [
    ViolationKind::Remove,
    ViolationKind::Blacklisted,
    ViolationKind::Disallowed,
    ViolationKind::Misplaced,
    ViolationKind::EmptyTag,
    ViolationKind::WrongList,
    ViolationKind::CellWithoutFormat,
];

/// Kinds in detection precedence; a node reports the first that matches.
const DETECT_ORDER: [ViolationKind; 7] = [
    ViolationKind::Remove,
    ViolationKind::Blacklisted,
    ViolationKind::Disallowed,
    ViolationKind::EmptyTag,
    ViolationKind::WrongList,
    ViolationKind::CellWithoutFormat,
    ViolationKind::Misplaced,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Always-disallowed elements, emptied islands the whitelist rejects, disallowed
    /// comments and blank text directly inside a list.
    Remove,
    /// Blacklisted element; unwrapped so its content survives.
    Blacklisted,
    /// Element outside the whitelist that slipped past the textual filter (an unterminated
    /// tag, for one); unwrapped like a blacklisted one.
    Disallowed,
    /// Childless line, block or text-style element.
    EmptyTag,
    /// Direct list child that is not a list or list item.
    WrongList,
    /// Table cell whose first element child is not a line, block or component.
    CellWithoutFormat,
    /// Line, component or list nested where it cannot live, or a list item outside a list.
    Misplaced,
}

impl ViolationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationKind::Remove => "remove",
            ViolationKind::Blacklisted => "blacklisted",
            ViolationKind::Disallowed => "disallowed",
            ViolationKind::EmptyTag => "empty_tag",
            ViolationKind::WrongList => "wrong_list",
            ViolationKind::CellWithoutFormat => "cell_without_format",
            ViolationKind::Misplaced => "misplaced",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub node: NodeId,
    /// Element name; `None` for text and comments.
    pub tag: Option<String>,
    /// Path from the checked root.
    pub path: NodePath,
}

fn is_blank_text(text: &str) -> bool {
    only_zero_width_space(text.trim())
}

fn first_element_child(dom: &Dom, id: NodeId) -> Option<NodeId> {
    dom.children(id).iter().copied().find(|c| dom.is_element(*c))
}

// Ancestors strictly between `node` and `root`.
fn inner_ancestors(dom: &Dom, node: NodeId, root: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    dom.ancestors(node).take_while(move |a| *a != root)
}

/// Holds a `<br>`, media, an input or a component somewhere below.
fn has_content_leaf(dom: &Dom, id: NodeId) -> bool {
    dom.descendants(id).any(|d| is_not_text_node(dom, d))
}

fn has_non_break_leaf(dom: &Dom, id: NodeId) -> bool {
    dom.descendants(id)
        .any(|d| !is_break(dom, d) && is_not_text_node(dom, d))
}

/// Whether `node` under `root` currently exhibits `kind`.
fn violates(dom: &Dom, root: NodeId, policy: &TagPolicy, node: NodeId, kind: ViolationKind) -> bool {
    if node == root {
        return false;
    }
    let Some(parent) = dom.parent(node) else {
        return false;
    };
    match (kind, dom.data(node)) {
        (ViolationKind::Remove, Some(NodeData::Text(text))) => is_list(dom, parent) && is_blank_text(text),
        (ViolationKind::Remove, Some(NodeData::Comment(_))) => !policy.allows_comments(),
        (ViolationKind::Remove, Some(NodeData::Element { name, .. })) => {
            is_always_disallowed(name)
                || (!policy.allows(name) && dom.children(node).is_empty() && is_island(dom, node))
        }
        (ViolationKind::Blacklisted, Some(NodeData::Element { name, .. })) => {
            policy.is_blacklisted(name)
        }
        (ViolationKind::Disallowed, Some(NodeData::Element { name, .. })) => {
            !policy.allows(name)
                && !is_always_disallowed(name)
                && !policy.is_blacklisted(name)
                && !is_island(dom, node)
        }
        (ViolationKind::EmptyTag, Some(NodeData::Element { .. })) => {
            dom.children(node).is_empty()
                && (is_format(dom, node) || is_range_format(dom, node) || is_text_style(dom, node))
                && !is_table(dom, node)
                && !is_list_cell(dom, node)
                && !dom.has_tag(node, "a")
                && !is_island(dom, node)
                && !inner_ancestors(dom, node, root).any(|a| is_island(dom, a))
        }
        (ViolationKind::WrongList, Some(NodeData::Text(text))) => {
            is_list(dom, parent) && !is_blank_text(text)
        }
        (ViolationKind::WrongList, Some(NodeData::Element { .. })) => {
            is_list(dom, parent) && !is_list(dom, node) && !is_list_cell(dom, node)
        }
        (ViolationKind::CellWithoutFormat, Some(NodeData::Element { .. })) => {
            is_table_cell(dom, node)
                && !first_element_child(dom, node).is_some_and(|c| {
                    is_format(dom, c) || is_range_format(dom, c) || is_component(dom, c)
                })
        }
        (ViolationKind::Misplaced, Some(NodeData::Element { .. })) => {
            let stray = if is_list_cell(dom, node) {
                !is_list(dom, parent)
            } else {
                (is_format(dom, node) || is_component(dom, node) || is_list(dom, node))
                    && !is_range_format(dom, parent)
                    && !is_list_cell(dom, parent)
            };
            stray
                && parent != root
                && !inner_ancestors(dom, node, root)
                    .any(|a| is_component(dom, a) || is_island(dom, a))
        }
        _ => false,
    }
}

fn detect(dom: &Dom, root: NodeId, policy: &TagPolicy, node: NodeId) -> Option<ViolationKind> {
    DETECT_ORDER
        .into_iter()
        .find(|kind| violates(dom, root, policy, node, *kind))
}

/// Every violation under `root`, in document order, without mutating anything.
///
/// Island contents are not inspected.
pub fn collect_violations(dom: &Dom, root: NodeId, policy: &TagPolicy) -> Vec<Violation> {
    get_descendants_outside_islands(dom, root, Traverse::Nodes, |_| true)
        .into_iter()
        .filter_map(|node| {
            let kind = detect(dom, root, policy, node)?;
            Some(Violation {
                kind,
                node,
                tag: dom.tag_name(node).map(str::to_string),
                path: encode_path(dom, node, Some(root)),
            })
        })
        .collect()
}

struct Fixer<'a> {
    dom: &'a mut Dom,
    root: NodeId,
    policy: &'a TagPolicy,
}

impl Fixer<'_> {
    fn still(&self, node: NodeId, kind: ViolationKind) -> bool {
        violates(self.dom, self.root, self.policy, node, kind)
    }

    fn apply(&mut self, violation: &Violation) -> Result<bool, DomError> {
        let node = violation.node;
        if !self.still(node, violation.kind) {
            log::debug!(target: "editor.fixer", "stale {} candidate {node}", violation.kind.as_str());
            return Ok(false);
        }
        log::trace!(
            target: "editor.fixer",
            "fix {} {node} <{}> at {:?}",
            violation.kind.as_str(),
            violation.tag.as_deref().unwrap_or("#text"),
            violation.path
        );
        match violation.kind {
            ViolationKind::Remove => self.dom.remove(node)?,
            ViolationKind::Blacklisted | ViolationKind::Disallowed => self.dom.unwrap(node)?,
            ViolationKind::Misplaced => self.hoist(node)?,
            ViolationKind::EmptyTag => self.remove_empty(node)?,
            ViolationKind::WrongList => self.wrap_in_list_cell(node)?,
            ViolationKind::CellWithoutFormat => self.fix_cell(node)?,
        }
        Ok(true)
    }

    // A parent left with no text and nothing but breaks is dropped.
    fn is_vacant(&self, id: NodeId) -> bool {
        only_zero_width_space(&self.dom.text_content(id)) && !has_non_break_leaf(self.dom, id)
    }

    /// Move `node` up one level at a time until it sits legally.
    fn hoist(&mut self, node: NodeId) -> Result<(), DomError> {
        while self.still(node, ViolationKind::Misplaced) {
            let parent = self.dom.parent(node).ok_or(DomError::InvalidParent(node))?;
            let grand = self.dom.parent(parent).ok_or(DomError::InvalidParent(parent))?;
            self.dom.insert_before(grand, node, parent)?;
            if parent != self.root && self.is_vacant(parent) {
                self.dom.remove(parent)?;
            }
        }
        Ok(())
    }

    /// Remove `node` and every ancestor that becomes an empty tag in turn.
    fn remove_empty(&mut self, node: NodeId) -> Result<(), DomError> {
        let mut next = self.dom.parent(node);
        self.dom.remove(node)?;
        while let Some(parent) = next {
            if !self.still(parent, ViolationKind::EmptyTag) {
                break;
            }
            next = self.dom.parent(parent);
            self.dom.remove(parent)?;
        }
        Ok(())
    }

    fn wrap_in_list_cell(&mut self, node: NodeId) -> Result<(), DomError> {
        let dom = &mut *self.dom;
        let parent = dom.parent(node).ok_or(DomError::InvalidParent(node))?;
        let li = dom.create_element("li");
        let inherit = dom.is_element(node)
            && !is_component(dom, node)
            && (is_format(dom, node) || is_text_style(dom, node));
        if !inherit {
            return dom.wrap(node, li);
        }
        dom.insert_before(parent, li, node)?;
        dom.move_children(node, li)?;
        dom.remove(node)?;
        if dom.children(li).is_empty() {
            let br = dom.create_element("br");
            dom.append_child(li, br)?;
        }
        Ok(())
    }

    fn fix_cell(&mut self, cell: NodeId) -> Result<(), DomError> {
        let dom = &mut *self.dom;
        let blank = is_blank_text(&dom.text_content(cell)) && !has_non_break_leaf(dom, cell);
        if blank {
            for child in dom.children(cell).to_vec() {
                dom.remove(child)?;
            }
            let div = dom.create_element("div");
            let br = dom.create_element("br");
            dom.append_child(div, br)?;
            return dom.append_child(cell, div);
        }

        let mut run: Vec<NodeId> = Vec::new();
        for child in dom.children(cell).to_vec() {
            let line = dom.is_element(child)
                && (is_format(dom, child) || is_range_format(dom, child) || is_component(dom, child));
            if line {
                wrap_run(dom, cell, &mut run, "div")?;
            } else {
                run.push(child);
            }
        }
        wrap_run(dom, cell, &mut run, "div")
    }
}

/// Move `run` into a new `tag` element placed where the run starts. Runs holding nothing
/// but blank text and comments are left alone.
fn wrap_run(dom: &mut Dom, parent: NodeId, run: &mut Vec<NodeId>, tag: &str) -> Result<(), DomError> {
    let nodes = std::mem::take(run);
    let meaningful = nodes.iter().any(|n| match dom.data(*n) {
        Some(NodeData::Element { .. }) => true,
        Some(NodeData::Text(text)) => !is_blank_text(text),
        _ => false,
    });
    let Some(&first) = nodes.first().filter(|_| meaningful) else {
        return Ok(());
    };
    let wrapper = dom.create_element(tag);
    dom.insert_before(parent, wrapper, first)?;
    for node in nodes {
        dom.append_child(wrapper, node)?;
    }
    Ok(())
}

/// Correct every structural violation under `root` in place and return how many fixes
/// were applied. Never fails: a fix that cannot be applied is logged and skipped.
///
/// A root left without any element or text receives a placeholder `default_line` holding
/// a `<br>`.
pub fn fix_structure(dom: &mut Dom, root: NodeId, policy: &TagPolicy, default_line: &str) -> usize {
    let mut applied = 0;
    for round in 0.. {
        let violations = collect_violations(dom, root, policy);
        if violations.is_empty() {
            break;
        }
        if round == MAX_ROUNDS {
            log::debug!(
                target: "editor.fixer",
                "giving up after {MAX_ROUNDS} rounds with {} violations left",
                violations.len()
            );
            break;
        }

        let mut fixer = Fixer { dom: &mut *dom, root, policy };
        let mut progressed = 0;
        for kind in APPLY_ORDER {
            for violation in violations.iter().filter(|v| v.kind == kind) {
                match fixer.apply(violation) {
                    Ok(true) => progressed += 1,
                    Ok(false) => {}
                    Err(err) => log::debug!(target: "editor.fixer", "skipped {violation:?}: {err}"),
                }
            }
        }
        applied += progressed;
        if progressed == 0 {
            break;
        }
    }

    if let Err(err) = ensure_placeholder(dom, root, default_line) {
        log::debug!(target: "editor.fixer", "placeholder not inserted: {err}");
    }
    applied
}

/// Give an empty root a single `<{default_line}><br></{default_line}>`.
fn ensure_placeholder(dom: &mut Dom, root: NodeId, default_line: &str) -> Result<(), DomError> {
    let meaningful = dom.children(root).iter().any(|c| match dom.data(*c) {
        Some(NodeData::Element { .. }) => true,
        Some(NodeData::Text(text)) => !is_blank_text(text),
        _ => false,
    });
    if meaningful {
        return Ok(());
    }
    for blank in dom.children(root).to_vec() {
        if dom.is_text(blank) {
            dom.remove(blank)?;
        }
    }
    let line = dom.create_element(default_line);
    let br = dom.create_element("br");
    dom.append_child(line, br)?;
    dom.append_child(root, line)?;
    log::debug!(target: "editor.fixer", "inserted placeholder <{default_line}>");
    Ok(())
}

/// Delete descendants of `element` that hold nothing but zero-width text and no `<br>`,
/// media or component. Components, non-editable nodes and the child of `element` that
/// contains `keep` are left alone. An `element` left without children receives a `<br>`.
pub fn remove_empty_nodes(dom: &mut Dom, element: NodeId, keep: Option<NodeId>) -> Result<(), DomError> {
    let keep = keep.and_then(|k| {
        std::iter::once(k)
            .chain(dom.ancestors(k))
            .find(|a| dom.parent(*a) == Some(element))
    });
    let elements = |dom: &Dom, id: NodeId| -> Vec<NodeId> {
        dom.children(id)
            .iter()
            .rev()
            .copied()
            .filter(|c| dom.is_element(*c))
            .collect()
    };

    let mut stack = elements(dom, element);
    while let Some(node) = stack.pop() {
        if Some(node) == keep
            || is_not_text_node(dom, node)
            || is_non_editable(dom, node)
            || is_component(dom, node)
        {
            continue;
        }
        if only_zero_width_space(&dom.text_content(node)) && !has_content_leaf(dom, node) {
            dom.remove(node)?;
            continue;
        }
        stack.extend(elements(dom, node));
    }

    if dom.children(element).is_empty() {
        let br = dom.create_element("br");
        dom.append_child(element, br)?;
    }
    Ok(())
}

/// Group top-level inline runs (text, text-style elements, breaks) of `root` into new
/// `default_line` elements. Returns the lines created.
pub fn wrap_orphan_inline(dom: &mut Dom, root: NodeId, default_line: &str) -> Result<Vec<NodeId>, DomError> {
    let mut created = Vec::new();
    let mut run: Vec<NodeId> = Vec::new();
    let mut flush = |dom: &mut Dom, run: &mut Vec<NodeId>| -> Result<(), DomError> {
        let first = run.first().copied();
        wrap_run(dom, root, run, default_line)?;
        if let Some(line) = first.and_then(|f| dom.parent(f)).filter(|p| *p != root) {
            created.push(line);
        }
        Ok(())
    };
    for child in dom.children(root).to_vec() {
        let block = dom.is_element(child)
            && (is_format(dom, child)
                || is_range_format(dom, child)
                || is_component(dom, child)
                || dom.has_tag(child, "meta"));
        if block {
            flush(dom, &mut run)?;
        } else if dom.is_element(child) || dom.is_text(child) || !run.is_empty() {
            run.push(child);
        }
    }
    flush(dom, &mut run)?;
    Ok(created)
}

/// Rebuild the children of `fragment` as `<li>` items ready to be inserted into a list.
///
/// Lists give up their items, lines become items holding their content, other blocks are
/// flattened, and any other node is wrapped whole. Blank text and comments are dropped.
pub fn fragment_to_list_cells(dom: &mut Dom, fragment: NodeId) -> Result<Vec<NodeId>, DomError> {
    let mut items = Vec::new();
    for node in dom.children(fragment).to_vec() {
        collect_list_cells(dom, node, &mut items)?;
    }
    for item in &items {
        dom.append_child(fragment, *item)?;
    }
    Ok(items)
}

fn collect_list_cells(dom: &mut Dom, node: NodeId, items: &mut Vec<NodeId>) -> Result<(), DomError> {
    if dom.is_text(node) && !is_blank_text(dom.text(node).unwrap_or("")) {
        let li = dom.create_element("li");
        dom.append_child(li, node)?;
        items.push(li);
    } else if dom.is_element(node) {
        let flatten = is_list(dom, node)
            || (is_range_format(dom, node)
                && !is_table(dom, node)
                && !is_list_cell(dom, node)
                && !is_format(dom, node));
        if flatten {
            for child in dom.children(node).to_vec() {
                collect_list_cells(dom, child, items)?;
            }
            dom.remove(node)?;
        } else if is_list_cell(dom, node) {
            dom.detach(node)?;
            items.push(node);
        } else if is_format(dom, node) {
            let li = dom.create_element("li");
            dom.move_children(node, li)?;
            dom.remove(node)?;
            if is_blank_text(&dom.text_content(li)) && !has_content_leaf(dom, li) {
                for child in dom.children(li).to_vec() {
                    dom.remove(child)?;
                }
                let br = dom.create_element("br");
                dom.append_child(li, br)?;
            }
            items.push(li);
        } else {
            let li = dom.create_element("li");
            dom.append_child(li, node)?;
            items.push(li);
        }
    } else {
        dom.remove(node)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use html::{inner_html, parse_fragment};

    fn policy() -> TagPolicy {
        TagPolicy::new("*", "").unwrap()
    }

    fn fixed(html: &str) -> String {
        let mut dom = parse_fragment(html);
        let root = dom.document();
        fix_structure(&mut dom, root, &policy(), "p");
        inner_html(&dom, root)
    }

    fn kinds(html: &str) -> Vec<(ViolationKind, Option<String>)> {
        let dom = parse_fragment(html);
        collect_violations(&dom, dom.document(), &policy())
            .into_iter()
            .map(|v| (v.kind, v.tag))
            .collect()
    }

    fn fixed_under_first(html: &str) -> String {
        let mut dom = parse_fragment(html);
        let root = dom.children(dom.document())[0];
        fix_structure(&mut dom, root, &policy(), "p");
        html::outer_html(&dom, root)
    }

    #[test]
    fn nested_line_is_hoisted_and_wrapper_dropped() {
        assert_eq!(fixed_under_first("<div><p><p>x</p></p></div>"), "<div><p>x</p></div>");
        // With the fragment as root the outer lines are misplaced too.
        assert_eq!(fixed("<div><p><p>x</p></p></div>"), "<p>x</p>");
    }

    #[test]
    fn hoisting_repeats_until_legal() {
        assert_eq!(fixed("<p><span><p>x</p></span></p>"), "<p>x</p>");
    }

    #[test]
    fn vacated_parent_with_media_survives() {
        assert_eq!(
            fixed_under_first(r#"<div><p><img src="a.png"><p>x</p></p></div>"#),
            r#"<div><p>x</p><p><img src="a.png"></p></div>"#
        );
    }

    #[test]
    fn cell_text_gets_a_line() {
        assert_eq!(
            fixed("<table><tr><td>text</td></tr></table>"),
            "<table><tr><td><div>text</div></td></tr></table>"
        );
    }

    #[test]
    fn blank_cell_gets_placeholder_line() {
        assert_eq!(
            fixed("<table><tr><td></td><th> <br></th></tr></table>"),
            "<table><tr><td><div><br></div></td><th><div><br></div></th></tr></table>"
        );
    }

    #[test]
    fn cell_inline_runs_wrapped_around_lines() {
        assert_eq!(
            fixed("<table><tr><td>a<b>b</b><p>c</p>d</td></tr></table>"),
            "<table><tr><td><div>a<b>b</b></div><p>c</p><div>d</div></td></tr></table>"
        );
    }

    #[test]
    fn loose_list_children_become_items() {
        assert_eq!(fixed("<ul><span>loose</span></ul>"), "<ul><li>loose</li></ul>");
        assert_eq!(
            fixed("<ol>\n<li>a</li>\ntext<p>line</p><img src=x></ol>"),
            "<ol><li>a</li><li>\ntext</li><li>line</li><li><img src=\"x\"></li></ol>"
        );
    }

    #[test]
    fn empty_tags_cascade() {
        assert_eq!(fixed("<p>a</p><blockquote><p><b></b></p></blockquote>"), "<p>a</p>");
        assert_eq!(fixed("<p><a href=\"x\"></a></p>"), "<p><a href=\"x\"></a></p>");
    }

    #[test]
    fn placeholder_for_empty_fragment() {
        assert_eq!(fixed(""), "<p><br></p>");
        assert_eq!(fixed("<p></p>  "), "<p><br></p>");
    }

    #[test]
    fn islands_are_left_alone() {
        let html = r#"<p><span class="katex"><p></p><span></span></span></p>"#;
        assert_eq!(fixed(html), html);
    }

    #[test]
    fn components_shelter_lines() {
        let html = r#"<div class="se-component"><figure><p>cap</p></figure></div>"#;
        assert!(kinds(html).is_empty());
        assert_eq!(fixed("<p><table><tr><td><p>x</p></td></tr></table></p>"), "<table><tr><td><p>x</p></td></tr></table>");
    }

    #[test]
    fn collect_precedence_and_paths() {
        let dom = parse_fragment("<ul><p></p><b>x</b></ul><p><p>y</p></p>");
        let found = collect_violations(&dom, dom.document(), &policy());
        let summary: Vec<_> = found.iter().map(|v| (v.kind, v.path.clone())).collect();
        assert_eq!(
            summary,
            [
                (ViolationKind::EmptyTag, vec![0, 0]),
                (ViolationKind::WrongList, vec![0, 1]),
                (ViolationKind::Misplaced, vec![1, 0]),
            ]
        );
    }

    #[test]
    fn kinds_serialize_as_snake_case() {
        let all = [ViolationKind::CellWithoutFormat, ViolationKind::EmptyTag];
        assert_eq!(
            serde_json::to_string(&all).unwrap(),
            r#"["cell_without_format","empty_tag"]"#
        );
        for kind in all {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
        }
    }

    #[test]
    fn check_is_empty_after_fix_and_fix_is_idempotent() {
        let inputs = [
            "<ul><p><div>x</div></p></ul>",
            "<div><p><p>x</p></p></div><table><tr><td>t</td></tr></table>",
            "<b><p>a</p>b</b><ul> <li>c</li><span></span></ul>",
        ];
        for input in inputs {
            let mut dom = parse_fragment(input);
            let root = dom.document();
            fix_structure(&mut dom, root, &policy(), "p");
            assert!(collect_violations(&dom, root, &policy()).is_empty(), "{input}");
            let once = inner_html(&dom, root);
            assert_eq!(fixed(&once), once, "{input}");
        }
    }

    #[test]
    fn disallowed_and_blacklisted_elements() {
        let policy = TagPolicy::new("*", "font").unwrap();
        let mut dom = parse_fragment(r#"<p>a<script>x()</script><font color="red">b</font><!-- c --></p>"#);
        let root = dom.document();
        fix_structure(&mut dom, root, &policy, "p");
        assert_eq!(inner_html(&dom, root), "<p>ab<!-- c --></p>");

        let strict = TagPolicy::new("p", "").unwrap();
        let mut dom = parse_fragment("<p>a<!-- c --><span class=\"__se__tag\"></span></p>");
        let root = dom.document();
        fix_structure(&mut dom, root, &strict, "p");
        assert_eq!(inner_html(&dom, root), "<p>a</p>");
    }

    #[test]
    fn elements_outside_whitelist_are_unwrapped() {
        let strict = TagPolicy::new("p|b", "").unwrap();
        let mut dom = parse_fragment("<p>a<object data=\"evil.swf\">b<b>c</b></object></p><p>p<amp");
        let root = dom.document();
        let found: Vec<_> = collect_violations(&dom, root, &strict)
            .into_iter()
            .map(|v| (v.kind, v.tag))
            .collect();
        assert_eq!(
            found,
            [
                (ViolationKind::Disallowed, Some("object".to_string())),
                (ViolationKind::Disallowed, Some("amp".to_string())),
            ]
        );
        fix_structure(&mut dom, root, &strict, "p");
        assert_eq!(inner_html(&dom, root), "<p>ab<b>c</b></p><p>p</p>");
        assert!(collect_violations(&dom, root, &strict).is_empty());
    }

    #[test]
    fn disallowed_yields_to_blacklist_and_islands() {
        let policy = TagPolicy::new("p|span", "font").unwrap();
        let dom = parse_fragment(r#"<p><font>a</font><span class="katex"><mark>b</mark></span></p>"#);
        let found: Vec<_> = collect_violations(&dom, dom.document(), &policy)
            .into_iter()
            .map(|v| v.kind)
            .collect();
        assert_eq!(found, [ViolationKind::Blacklisted]);
    }

    #[test]
    fn stray_list_items_are_hoisted() {
        assert_eq!(kinds("<blockquote><li>x</li></blockquote>"), [(ViolationKind::Misplaced, Some("li".to_string()))]);
        assert_eq!(fixed("<blockquote><li>x</li></blockquote>"), "<li>x</li>");
        assert_eq!(fixed("<ul><li>a<li>b</li></li></ul>"), "<ul><li>b</li><li>a</li></ul>");
        // Items at the root and inside components are left in place.
        assert!(kinds("<li>x</li>").is_empty());
        assert!(kinds("<table><tr><td><li>x</li></td></tr></table>").is_empty());
    }

    #[test]
    fn remove_empty_nodes_keeps_breaks_and_kept_node() {
        let mut dom = parse_fragment("<p><span>\u{200B}</span><b><br></b><i></i><u></u>x</p>");
        let p = dom.children(dom.document())[0];
        let keep = dom.children(p)[3];
        remove_empty_nodes(&mut dom, p, Some(keep)).unwrap();
        assert_eq!(inner_html(&dom, p), "<b><br></b><u></u>x");

        let mut dom = parse_fragment("<p><span></span></p>");
        let p = dom.children(dom.document())[0];
        remove_empty_nodes(&mut dom, p, None).unwrap();
        assert_eq!(inner_html(&dom, p), "<br>");
    }

    #[test]
    fn orphan_inline_runs_get_lines() {
        let mut dom = parse_fragment("a<b>b</b><p>c</p>\n<br>d");
        let root = dom.document();
        let created = wrap_orphan_inline(&mut dom, root, "p").unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(inner_html(&dom, root), "<p>a<b>b</b></p><p>c</p><p>\n<br>d</p>");
    }

    #[test]
    fn fragment_converts_to_list_cells() {
        let mut dom = parse_fragment(
            "<ul><li>a</li></ul><p>b</p><p> </p><blockquote><h2>c</h2></blockquote>d<table></table>",
        );
        let root = dom.document();
        let items = fragment_to_list_cells(&mut dom, root).unwrap();
        assert_eq!(items.len(), 6);
        assert_eq!(
            inner_html(&dom, root),
            "<li>a</li><li>b</li><li><br></li><li>c</li><li>d</li><li><table></table></li>"
        );
    }
}
