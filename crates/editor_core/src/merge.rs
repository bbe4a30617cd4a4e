//! Sibling merging with path remapping.
//!
//! After an edit splits or rewraps inline content the tree tends to accumulate runs like
//! `<b>a</b><b>b</b>`. `merge_same_tags` folds those back together while keeping caller
//! paths pointed at the same content.
use crate::classify::{
    is_format, is_free_format, is_ignore_node_change, is_list_cell, is_table,
};
use crate::path::NodePath;
use html::{Dom, DomError, NodeData, NodeId};
use std::collections::HashSet;

/// Mergeable equivalence: two text nodes always match, a text node never matches an
/// element, and two elements match when their style declarations and class tokens are
/// equal as sets.
pub fn same_attributes(dom: &Dom, a: NodeId, b: NodeId) -> bool {
    match (dom.data(a), dom.data(b)) {
        (Some(NodeData::Text(_)), Some(NodeData::Text(_))) => true,
        (Some(NodeData::Element { .. }), Some(NodeData::Element { .. })) => {
            let style_a: HashSet<_> = dom.style_declarations(a).into_iter().collect();
            let style_b: HashSet<_> = dom.style_declarations(b).into_iter().collect();
            let class_a: HashSet<_> = dom.class_tokens(a).collect();
            let class_b: HashSet<_> = dom.class_tokens(b).collect();
            style_a == style_b && class_a == class_b
        }
        _ => false,
    }
}

fn same_tag(dom: &Dom, a: NodeId, b: NodeId) -> bool {
    match (dom.data(a), dom.data(b)) {
        (Some(NodeData::Text(_)), Some(NodeData::Text(_))) => true,
        (Some(NodeData::Element { name: x, .. }), Some(NodeData::Element { name: y, .. })) => x == y,
        _ => false,
    }
}

/// Write declarations back as a `style` attribute, dropping it when empty.
pub fn set_style_declarations(
    dom: &mut Dom,
    id: NodeId,
    declarations: &[(String, String)],
) -> Result<(), DomError> {
    if declarations.is_empty() {
        return dom.remove_attr(id, "style");
    }
    let css = declarations
        .iter()
        .map(|(k, v)| format!("{k}: {v};"))
        .collect::<Vec<_>>()
        .join(" ");
    dom.set_attr(id, "style", &css)
}

/// Copy `source`'s attributes onto `target`. Class tokens are unioned (target's first),
/// style declarations are merged with `source` winning per property, and every other
/// attribute is overwritten by `source`'s value.
pub fn copy_tag_attributes(dom: &mut Dom, target: NodeId, source: NodeId) -> Result<(), DomError> {
    let mut styles = dom.style_declarations(target);
    for (property, value) in dom.style_declarations(source) {
        match styles.iter_mut().find(|(p, _)| *p == property) {
            Some((_, existing)) => *existing = value,
            None => styles.push((property, value)),
        }
    }

    let mut classes: Vec<String> = dom.class_tokens(target).map(str::to_string).collect();
    for token in dom.class_tokens(source) {
        if !classes.iter().any(|c| c == token) {
            classes.push(token.to_string());
        }
    }

    let others: Vec<(String, String)> = dom
        .attributes(source)
        .iter()
        .filter(|(k, _)| !matches!(&**k, "style" | "class"))
        .map(|(k, v)| (k.to_string(), v.clone().unwrap_or_default()))
        .collect();
    for (key, value) in others {
        dom.set_attr(target, &key, &value)?;
    }
    if !classes.is_empty() {
        dom.set_attr(target, "class", &classes.join(" "))?;
    }
    set_style_declarations(dom, target, &styles)
}

struct Merger<'a> {
    dom: &'a mut Dom,
    root: NodeId,
    paths: &'a mut [NodePath],
    offsets: Vec<usize>,
    only_text: bool,
}

impl Merger<'_> {
    /// Paths whose prefix walks through `current` (located at `prefix`) and continue below it.
    fn through(&self, prefix: &[usize]) -> Vec<usize> {
        let depth = prefix.len();
        (0..self.paths.len())
            .filter(|&n| {
                let path = &self.paths[n];
                path.len() > depth && path[..depth] == *prefix
            })
            .collect()
    }

    // Structural nodes are never merged with siblings but their insides are.
    fn is_barrier(&self, id: NodeId) -> bool {
        let dom = &*self.dom;
        if self.only_text && dom.is_element(id) && is_ignore_node_change(dom, id) {
            return true;
        }
        is_table(dom, id) || is_list_cell(dom, id) || (is_format(dom, id) && !is_free_format(dom, id))
    }

    fn level(&mut self, current: NodeId, prefix: &mut Vec<usize>) -> Result<(), DomError> {
        let depth = prefix.len();

        // A sole child with the same tag replaces its parent; the parent's attributes win.
        if current != self.root {
            if let &[child] = self.dom.children(current) {
                if same_tag(self.dom, current, child) && self.dom.is_element(child) {
                    for n in self.through(prefix) {
                        if self.paths[n][depth] == 0 {
                            self.paths[n].remove(depth);
                        }
                    }
                    copy_tag_attributes(self.dom, child, current)?;
                    self.dom.unwrap(current)?;
                    log::trace!(
                        target: "editor.merge",
                        "collapsed nested <{}>",
                        self.dom.tag_name(child).unwrap_or("")
                    );
                    return self.level(child, prefix);
                }
            }
        }

        let mut i = 0;
        while let Some(&child) = self.dom.children(current).get(i) {
            if self.is_barrier(child) {
                let dom = &*self.dom;
                if is_table(dom, child) || is_list_cell(dom, child) || is_format(dom, child) {
                    self.descend(child, i, prefix)?;
                }
                i += 1;
                continue;
            }

            let Some(next) = self.dom.next_sibling(child) else {
                if self.dom.is_element(child) {
                    self.descend(child, i, prefix)?;
                }
                break;
            };

            if self.mergeable(child, next) {
                self.merge_pair(child, next, i, prefix)?;
                continue;
            }

            if self.dom.is_element(child) {
                self.descend(child, i, prefix)?;
            }
            i += 1;
        }
        Ok(())
    }

    fn descend(&mut self, child: NodeId, index: usize, prefix: &mut Vec<usize>) -> Result<(), DomError> {
        prefix.push(index);
        let result = self.level(child, prefix);
        prefix.pop();
        result
    }

    fn mergeable(&self, child: NodeId, next: NodeId) -> bool {
        let dom = &*self.dom;
        !self.is_barrier(next)
            && same_tag(dom, child, next)
            && same_attributes(dom, child, next)
            && dom.attr(child, "href") == dom.attr(next, "href")
    }

    fn merge_pair(
        &mut self,
        child: NodeId,
        next: NodeId,
        i: usize,
        prefix: &[usize],
    ) -> Result<(), DomError> {
        let depth = prefix.len();
        let moved = self.through(prefix);

        if let Some(text) = self.dom.text(child) {
            let absorbed_at = text.len();
            let tail = self.dom.text(next).unwrap_or("").to_string();
            self.dom.append_text(child, &tail)?;
            for n in moved {
                let path = &mut self.paths[n];
                if path[depth] == i + 1 {
                    path[depth] = i;
                    path.truncate(depth + 1);
                    self.offsets[n] += absorbed_at;
                } else if path[depth] > i + 1 {
                    path[depth] -= 1;
                }
            }
            return self.dom.remove(next);
        }

        let child_len = self.dom.children(child).len();
        let left = self.dom.last_child(child);
        let right = self.dom.first_child(next);
        // Boundary text nodes are joined so the merged element holds no adjacent text runs.
        let joined = match (left, right) {
            (Some(l), Some(r)) if self.dom.is_text(l) && self.dom.is_text(r) => {
                let left_len = self.dom.text(l).unwrap_or("").len();
                let tail = self.dom.text(r).unwrap_or("").to_string();
                self.dom.append_text(l, &tail)?;
                self.dom.remove(r)?;
                Some(left_len)
            }
            _ => None,
        };

        for n in moved {
            let path = &mut self.paths[n];
            if path[depth] > i + 1 {
                path[depth] -= 1;
                continue;
            }
            if path[depth] != i + 1 {
                continue;
            }
            path[depth] = i;
            let Some(&k) = path.get(depth + 1) else {
                continue;
            };
            match joined {
                Some(left_len) if k == 0 => {
                    path[depth + 1] = child_len - 1;
                    path.truncate(depth + 2);
                    self.offsets[n] += left_len;
                }
                Some(_) => path[depth + 1] = child_len + k - 1,
                None => path[depth + 1] = child_len + k,
            }
        }

        self.dom.move_children(next, child)?;
        self.dom.remove(next)
    }
}

/// Merge adjacent siblings with the same tag, attributes and `href`, recursively under
/// `element`.
///
/// `paths` are relative to `element` and are rewritten in place to follow merged content.
/// The returned offsets, aligned with `paths`, are byte counts to add to each caret offset
/// for text that was prepended to its node. With `only_text`, only text-style elements and
/// text nodes are merged. Tables, list cells and non-free lines are never merged with their
/// siblings, though their contents are.
pub fn merge_same_tags(
    dom: &mut Dom,
    element: NodeId,
    paths: &mut [NodePath],
    only_text: bool,
) -> Vec<usize> {
    let mut merger = Merger {
        dom,
        root: element,
        offsets: vec![0; paths.len()],
        paths,
        only_text,
    };
    if let Err(err) = merger.level(element, &mut Vec::new()) {
        log::debug!(target: "editor.merge", "merge stopped early: {err}");
    }
    merger.offsets
}

/// Collapse sole-child duplication such as `<ul><ul><li>..</li></ul></ul>` when `filter`
/// accepts the outer element.
pub fn merge_nested_tags<F>(dom: &mut Dom, element: NodeId, mut filter: F)
where
    F: FnMut(&Dom, NodeId) -> bool,
{
    let mut stack = vec![element];
    while let Some(current) = stack.pop() {
        loop {
            let children: Vec<NodeId> = dom
                .children(current)
                .iter()
                .copied()
                .filter(|c| !is_blank_text(dom, *c))
                .collect();
            let [only] = children[..] else {
                break;
            };
            if !same_tag(dom, current, only) || !dom.is_element(only) || !filter(&*dom, current) {
                break;
            }
            if let Err(err) = dom.move_children(only, current).and_then(|_| dom.remove(only)) {
                log::debug!(target: "editor.merge", "nested merge skipped: {err}");
                break;
            }
        }
        stack.extend(dom.children(current).iter().rev().copied().filter(|c| dom.is_element(*c)));
    }
}

fn is_blank_text(dom: &Dom, id: NodeId) -> bool {
    dom.text(id).is_some_and(|t| t.trim().is_empty())
}
