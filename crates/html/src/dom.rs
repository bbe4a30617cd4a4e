//! Mutable arena DOM.
//!
//! Nodes live in a flat `Vec` and refer to each other by `NodeId`. The tree owns top-down
//! through `children`; `parent` is a back-reference only. Removed nodes keep their slot (ids
//! are never reused) but are marked dead, so a stale id held across a mutation reads as an
//! empty, parentless node instead of aliasing a different one.
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeData {
    /// Fragment container. Always the arena root.
    Document,
    Element {
        name: Arc<str>,
        attributes: Vec<(Arc<str>, Option<String>)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    UnknownNode(NodeId),
    Removed(NodeId),
    WrongNodeKind(NodeId),
    InvalidParent(NodeId),
    InvalidSibling { parent: NodeId, before: NodeId },
    CycleDetected { parent: NodeId, child: NodeId },
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::UnknownNode(id) => write!(f, "unknown node {id}"),
            DomError::Removed(id) => write!(f, "node {id} was removed"),
            DomError::WrongNodeKind(id) => write!(f, "node {id} has the wrong kind"),
            DomError::InvalidParent(id) => write!(f, "node {id} cannot have children"),
            DomError::InvalidSibling { parent, before } => {
                write!(f, "node {before} is not a child of {parent}")
            }
            DomError::CycleDetected { parent, child } => {
                write!(f, "inserting {child} under {parent} would create a cycle")
            }
        }
    }
}

impl std::error::Error for DomError {}

#[derive(Debug, Clone)]
struct NodeRecord {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    removed: bool,
}

impl NodeRecord {
    fn allows_children(&self) -> bool {
        matches!(self.data, NodeData::Document | NodeData::Element { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<NodeRecord>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// A tree holding only the document (fragment) root.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeRecord {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
                removed: false,
            }],
        }
    }

    pub fn document(&self) -> NodeId {
        NodeId(0)
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        // Arena growth is bounded by input size; a fragment never approaches u32::MAX nodes.
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeRecord {
            data,
            parent: None,
            children: Vec::new(),
            removed: false,
        });
        id
    }

    /// Create a detached element. The name is ASCII-lowercased.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.create_element_with(name, Vec::new())
    }

    pub fn create_element_with(
        &mut self,
        name: &str,
        attributes: Vec<(Arc<str>, Option<String>)>,
    ) -> NodeId {
        self.push(NodeData::Element {
            name: Arc::from(name.to_ascii_lowercase()),
            attributes,
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Comment(text.to_string()))
    }

    fn record(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(id.index()).filter(|r| !r.removed)
    }

    fn live(&self, id: NodeId) -> Result<&NodeRecord, DomError> {
        let record = self.nodes.get(id.index()).ok_or(DomError::UnknownNode(id))?;
        if record.removed {
            return Err(DomError::Removed(id));
        }
        Ok(record)
    }

    fn live_mut(&mut self, id: NodeId) -> Result<&mut NodeRecord, DomError> {
        let record = self
            .nodes
            .get_mut(id.index())
            .ok_or(DomError::UnknownNode(id))?;
        if record.removed {
            return Err(DomError::Removed(id));
        }
        Ok(record)
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.record(id).map(|r| &r.data)
    }

    pub fn is_live(&self, id: NodeId) -> bool {
        self.record(id).is_some()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.record(id).and_then(|r| r.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.record(id).map_or(&[], |r| r.children.as_slice())
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            dom: self,
            next: self.parent(id),
        }
    }

    /// Pre-order descendants of `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { dom: self, stack }
    }

    /// Inclusive containment: a node contains itself.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        if !self.is_live(node) {
            return false;
        }
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if !self.live(parent)?.allows_children() {
            return Err(DomError::InvalidParent(parent));
        }
        let child_record = self.live(child)?;
        // A childless node can only be an ancestor of itself.
        let cycle = child == parent
            || (!child_record.children.is_empty() && self.contains(child, parent));
        if matches!(child_record.data, NodeData::Document) || cycle {
            return Err(DomError::CycleDetected { parent, child });
        }
        Ok(())
    }

    /// Append `child` as the last child of `parent`, moving it if already attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        self.detach(child)?;
        self.live_mut(parent)?.children.push(child);
        self.live_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Insert `child` into `parent` right before `before`, moving it if already attached.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: NodeId,
    ) -> Result<(), DomError> {
        if child == before {
            return Ok(());
        }
        self.check_insert(parent, child)?;
        if self.parent(before) != Some(parent) {
            return Err(DomError::InvalidSibling { parent, before });
        }
        self.detach(child)?;
        let siblings = &mut self.live_mut(parent)?.children;
        let pos = siblings
            .iter()
            .position(|c| *c == before)
            .ok_or(DomError::InvalidSibling { parent, before })?;
        siblings.insert(pos, child);
        self.live_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Insert `child` as the next sibling of `reference`.
    pub fn insert_after(&mut self, reference: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent = self.parent(reference).ok_or(DomError::InvalidParent(reference))?;
        match self.next_sibling(reference) {
            Some(next) if next != child => self.insert_before(parent, child, next),
            Some(_) => Ok(()),
            None => self.append_child(parent, child),
        }
    }

    /// Unlink `id` from its parent. The node stays live and can be reinserted.
    pub fn detach(&mut self, id: NodeId) -> Result<(), DomError> {
        let Some(parent) = self.live_mut(id)?.parent.take() else {
            return Ok(());
        };
        if let Ok(record) = self.live_mut(parent) {
            record.children.retain(|c| *c != id);
        }
        Ok(())
    }

    /// Detach `id` and mark its whole subtree dead.
    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        if id == self.document() {
            return Err(DomError::InvalidParent(id));
        }
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(record) = self.nodes.get_mut(current.index()) {
                record.removed = true;
                record.parent = None;
                stack.append(&mut record.children);
            }
        }
        Ok(())
    }

    /// Move the children of `id` into its parent at its position, then remove `id`.
    pub fn unwrap(&mut self, id: NodeId) -> Result<(), DomError> {
        let parent = self.parent(id).ok_or(DomError::InvalidParent(id))?;
        for child in self.children(id).to_vec() {
            self.insert_before(parent, child, id)?;
        }
        self.remove(id)
    }

    /// Put `wrapper` where `node` is and move `node` inside it.
    pub fn wrap(&mut self, node: NodeId, wrapper: NodeId) -> Result<(), DomError> {
        let parent = self.parent(node).ok_or(DomError::InvalidParent(node))?;
        self.insert_before(parent, wrapper, node)?;
        self.append_child(wrapper, node)
    }

    /// Move every child of `from` to the end of `to`.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) -> Result<(), DomError> {
        for child in self.children(from).to_vec() {
            self.append_child(to, child)?;
        }
        Ok(())
    }

    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Element { name, .. } => Some(&**name),
            _ => None,
        }
    }

    pub fn has_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag_name(id).is_some_and(|name| name == tag)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Element { .. }))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Text(_)))
    }

    pub fn is_comment(&self, id: NodeId) -> bool {
        matches!(self.data(id), Some(NodeData::Comment(_)))
    }

    pub fn attributes(&self, id: NodeId) -> &[(Arc<str>, Option<String>)] {
        match self.data(id) {
            Some(NodeData::Element { attributes, .. }) => attributes.as_slice(),
            _ => &[],
        }
    }

    /// Attribute value; a valueless attribute reads as `""`.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    fn attributes_mut(
        &mut self,
        id: NodeId,
    ) -> Result<&mut Vec<(Arc<str>, Option<String>)>, DomError> {
        match &mut self.live_mut(id)?.data {
            NodeData::Element { attributes, .. } => Ok(attributes),
            _ => Err(DomError::WrongNodeKind(id)),
        }
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let attributes = self.attributes_mut(id)?;
        match attributes.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some((_, v)) => *v = Some(value.to_string()),
            None => attributes.push((Arc::from(name.to_ascii_lowercase()), Some(value.to_string()))),
        }
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        self.attributes_mut(id)?
            .retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        Ok(())
    }

    /// Keep only the attributes for which `keep(name, value)` holds.
    pub fn retain_attributes(
        &mut self,
        id: NodeId,
        mut keep: impl FnMut(&str, Option<&str>) -> bool,
    ) -> Result<(), DomError> {
        self.attributes_mut(id)?
            .retain(|(k, v)| keep(k, v.as_deref()));
        Ok(())
    }

    /// Change an element's tag name in place, keeping its attributes and children.
    pub fn rename(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        match &mut self.live_mut(id)?.data {
            NodeData::Element { name: current, .. } => {
                *current = Arc::from(name.to_ascii_lowercase());
                Ok(())
            }
            _ => Err(DomError::WrongNodeKind(id)),
        }
    }

    /// Whitespace-separated tokens of the `class` attribute.
    pub fn class_tokens(&self, id: NodeId) -> impl Iterator<Item = &str> {
        self.attr(id, "class")
            .unwrap_or("")
            .split_ascii_whitespace()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.class_tokens(id).any(|t| t == class)
    }

    /// `style` declarations in source order, property names lowercased. Empty and
    /// malformed declarations are dropped.
    pub fn style_declarations(&self, id: NodeId) -> Vec<(String, String)> {
        let Some(style) = self.attr(id, "style") else {
            return Vec::new();
        };
        style
            .split(';')
            .filter_map(|decl| {
                let (property, value) = decl.split_once(':')?;
                let property = property.trim().to_ascii_lowercase();
                let value = value.trim();
                (!property.is_empty() && !value.is_empty())
                    .then(|| (property, value.to_string()))
            })
            .collect()
    }

    /// Character data of a text node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id)? {
            NodeData::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        match &mut self.live_mut(id)?.data {
            NodeData::Text(existing) => {
                existing.clear();
                existing.push_str(text);
                Ok(())
            }
            _ => Err(DomError::WrongNodeKind(id)),
        }
    }

    pub fn append_text(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        match &mut self.live_mut(id)?.data {
            NodeData::Text(existing) => {
                existing.push_str(text);
                Ok(())
            }
            _ => Err(DomError::WrongNodeKind(id)),
        }
    }

    /// Concatenated text of `id` and its descendants, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                out.push_str(text);
            }
        }
        out
    }
}

pub struct Ancestors<'a> {
    dom: &'a Dom,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.dom.parent(current);
        Some(current)
    }
}

pub struct Descendants<'a> {
    dom: &'a Dom,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.dom.children(current).iter().rev().copied());
        Some(current)
    }
}
