//! Host node tree
//!
//! An arena of markup nodes with DOM-like parent/sibling links. Templates are
//! parsed into a [`Document`], cloned into the host [`Document`] with
//! [`Document::import_node`], and then mutated in place by the renderer.
//!
//! Nodes are addressed by generational [`NodeId`] keys: once a node is
//! removed its id stops resolving, even if the slot is later reused.

mod event;
mod mutation;
mod serialize;

pub use event::{Callback, Event};
pub use mutation::MutationRecord;

use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

new_key_type! {
    /// Handle to a node inside a [`Document`]
    pub struct NodeId;
}

/// Identity of a [`Document`], unique within the process
///
/// [`NodeId`]s are only meaningful together with the document that issued
/// them; two documents hand out the same ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

impl DocumentId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Elements that never have children or a closing tag
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Errors from misuse of the [`Document`] API
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("node {0:?} does not exist in this document")]
    UnknownNode(NodeId),

    #[error("reference node {reference:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, reference: NodeId },

    #[error("cannot insert {child:?} into {parent:?}: {reason}")]
    HierarchyRequest {
        parent: NodeId,
        child: NodeId,
        reason: &'static str,
    },

    #[error("node {node:?} is not {expected}")]
    WrongNodeKind {
        node: NodeId,
        expected: &'static str,
    },

    #[error("offset {offset} is not a character boundary within text of length {len}")]
    InvalidOffset { offset: usize, len: usize },

    #[error("region belongs to document {owner:?}, not {document:?}")]
    ForeignRegion {
        owner: DocumentId,
        document: DocumentId,
    },
}

/// Kind of a node, as seen by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Fragment,
    Element,
    Text,
    Comment,
    CData,
    Doctype,
    ProcessingInstruction,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Fragment => "#document-fragment",
            NodeKind::Element => "element",
            NodeKind::Text => "#text",
            NodeKind::Comment => "#comment",
            NodeKind::CData => "#cdata-section",
            NodeKind::Doctype => "doctype",
            NodeKind::ProcessingInstruction => "processing-instruction",
        }
    }
}

#[derive(Debug, Clone)]
enum NodeData {
    Fragment,
    Element(ElementData),
    Text(String),
    Comment(String),
    CData(String),
    Doctype(String),
    ProcessingInstruction(String),
}

impl NodeData {
    fn kind(&self) -> NodeKind {
        match self {
            NodeData::Fragment => NodeKind::Fragment,
            NodeData::Element(_) => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Comment(_) => NodeKind::Comment,
            NodeData::CData(_) => NodeKind::CData,
            NodeData::Doctype(_) => NodeKind::Doctype,
            NodeData::ProcessingInstruction(_) => NodeKind::ProcessingInstruction,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ElementData {
    name: String,
    attributes: Vec<(String, String)>,
    /// Bound handlers by event name; never serialized
    handlers: Vec<(String, Callback)>,
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
    data: NodeData,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            data,
        }
    }
}

/// A mutable tree of markup nodes
#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    nodes: SlotMap<NodeId, Node>,
    /// `Some` while observing
    records: Option<Vec<MutationRecord>>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            id: DocumentId::next(),
            nodes: SlotMap::default(),
            records: None,
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    // Creation ------------------------------------------------------------

    pub fn create_fragment(&mut self) -> NodeId {
        self.nodes.insert(Node::new(NodeData::Fragment))
    }

    pub fn create_element(&mut self, name: impl Into<String>) -> NodeId {
        self.nodes.insert(Node::new(NodeData::Element(ElementData {
            name: name.into(),
            ..ElementData::default()
        })))
    }

    pub fn create_text(&mut self, data: impl Into<String>) -> NodeId {
        self.nodes.insert(Node::new(NodeData::Text(data.into())))
    }

    pub fn create_comment(&mut self, data: impl Into<String>) -> NodeId {
        self.nodes.insert(Node::new(NodeData::Comment(data.into())))
    }

    pub fn create_cdata(&mut self, data: impl Into<String>) -> NodeId {
        self.nodes.insert(Node::new(NodeData::CData(data.into())))
    }

    pub fn create_doctype(&mut self, data: impl Into<String>) -> NodeId {
        self.nodes.insert(Node::new(NodeData::Doctype(data.into())))
    }

    pub fn create_processing_instruction(&mut self, data: impl Into<String>) -> NodeId {
        self.nodes
            .insert(Node::new(NodeData::ProcessingInstruction(data.into())))
    }

    // Navigation ----------------------------------------------------------

    /// Whether `id` refers to a live node of this document
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes, attached or not
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.nodes.get(id).map(|n| n.data.kind())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.first_child
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.last_child
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.next_sibling
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id)?.prev_sibling
    }

    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(id),
        }
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// Tag name of an element
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id)?.data {
            NodeData::Element(el) => Some(&el.name),
            _ => None,
        }
    }

    /// Character data of a text, comment, CDATA, doctype or processing instruction node
    pub fn data(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id)?.data {
            NodeData::Text(s)
            | NodeData::Comment(s)
            | NodeData::CData(s)
            | NodeData::Doctype(s)
            | NodeData::ProcessingInstruction(s) => Some(s),
            NodeData::Fragment | NodeData::Element(_) => None,
        }
    }

    /// Whether `ancestor` is `node` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Node following `node` in pre-order, staying inside `root`
    pub fn next_in_preorder(&self, root: NodeId, node: NodeId) -> Option<NodeId> {
        if let Some(child) = self.first_child(node) {
            return Some(child);
        }
        let mut current = node;
        loop {
            if current == root {
                return None;
            }
            if let Some(next) = self.next_sibling(current) {
                return Some(next);
            }
            current = self.parent(current)?;
        }
    }

    /// All descendants of `root` in pre-order; `root` itself is excluded
    ///
    /// The position of a node in the returned list is its address within
    /// `root`, which is stable across deep clones.
    pub fn walk(&self, root: NodeId) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        let mut current = self.first_child(root);
        while let Some(id) = current {
            nodes.push(id);
            current = self.next_in_preorder(root, id);
        }
        nodes
    }

    // Tree mutation -------------------------------------------------------

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `reference` (append when `None`)
    ///
    /// A fragment is never inserted itself: its children are moved instead
    /// and the fragment is left empty.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.check(parent)?;
        self.check(child)?;
        if let Some(reference) = reference {
            self.check(reference)?;
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild { parent, reference });
            }
        }
        if !matches!(
            self.kind(parent),
            Some(NodeKind::Element | NodeKind::Fragment)
        ) {
            return Err(DomError::HierarchyRequest {
                parent,
                child,
                reason: "parent cannot have children",
            });
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest {
                parent,
                child,
                reason: "node would become its own ancestor",
            });
        }

        let moved: Vec<NodeId> = if self.kind(child) == Some(NodeKind::Fragment) {
            self.children(child).collect()
        } else {
            vec![child]
        };
        // Inserting a node before itself keeps its place
        let reference = match reference {
            Some(r) if moved.contains(&r) => self.next_sibling(*moved.last().unwrap_or(&r)),
            other => other,
        };

        for &node in &moved {
            if let Some(old_parent) = self.unlink(node) {
                if old_parent != child {
                    self.record(MutationRecord::ChildList {
                        target: old_parent,
                        added: Vec::new(),
                        removed: vec![node],
                    });
                }
            }
            self.link(parent, node, reference);
        }
        if !moved.is_empty() {
            self.record(MutationRecord::ChildList {
                target: parent,
                added: moved,
                removed: Vec::new(),
            });
        }
        Ok(())
    }

    /// Detach `node` from its parent and free it together with its subtree
    pub fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        self.check(node)?;
        if let Some(parent) = self.unlink(node) {
            self.record(MutationRecord::ChildList {
                target: parent,
                added: Vec::new(),
                removed: vec![node],
            });
        }
        for id in self.walk(node) {
            self.nodes.remove(id);
        }
        self.nodes.remove(node);
        Ok(())
    }

    /// Replace the data of a text, comment or CDATA node
    pub fn set_data(&mut self, node: NodeId, data: impl Into<String>) -> Result<(), DomError> {
        let slot = match self.nodes.get_mut(node).map(|n| &mut n.data) {
            Some(NodeData::Text(s) | NodeData::Comment(s) | NodeData::CData(s)) => s,
            Some(_) => {
                return Err(DomError::WrongNodeKind {
                    node,
                    expected: "a character data node",
                })
            }
            None => return Err(DomError::UnknownNode(node)),
        };
        let old_value = std::mem::replace(slot, data.into());
        self.record(MutationRecord::CharacterData {
            target: node,
            old_value,
        });
        Ok(())
    }

    /// Split a text node at byte `offset`
    ///
    /// The node keeps the text before `offset`; the rest moves into a new
    /// text node inserted right after it (when it has a parent). Returns the
    /// new node.
    pub fn split_text(&mut self, node: NodeId, offset: usize) -> Result<NodeId, DomError> {
        let tail = match self.nodes.get_mut(node).map(|n| &mut n.data) {
            Some(NodeData::Text(s)) => {
                if offset > s.len() || !s.is_char_boundary(offset) {
                    return Err(DomError::InvalidOffset {
                        offset,
                        len: s.len(),
                    });
                }
                s.split_off(offset)
            }
            Some(_) => {
                return Err(DomError::WrongNodeKind {
                    node,
                    expected: "a text node",
                })
            }
            None => return Err(DomError::UnknownNode(node)),
        };
        let new_node = self.create_text(tail);
        if let Some(parent) = self.parent(node) {
            let next = self.next_sibling(node);
            self.insert_before(parent, new_node, next)?;
        }
        Ok(new_node)
    }

    // Attributes ----------------------------------------------------------

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.get_attribute(node, name).is_some()
    }

    /// Attributes of an element in source order
    pub fn attributes(&self, node: NodeId) -> &[(String, String)] {
        self.element(node)
            .map(|el| el.attributes.as_slice())
            .unwrap_or_default()
    }

    pub fn set_attribute(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), DomError> {
        let name = name.into();
        let value = value.into();
        let element = self.element_mut(node)?;
        let old_value = match element.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                element.attributes.push((name.clone(), value));
                None
            }
        };
        self.record(MutationRecord::Attributes {
            target: node,
            name,
            old_value,
        });
        Ok(())
    }

    /// Remove an attribute; returns whether it was present
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<bool, DomError> {
        let element = self.element_mut(node)?;
        let Some(index) = element.attributes.iter().position(|(n, _)| n == name) else {
            return Ok(false);
        };
        let (name, old_value) = element.attributes.remove(index);
        self.record(MutationRecord::Attributes {
            target: node,
            name,
            old_value: Some(old_value),
        });
        Ok(true)
    }

    // Events --------------------------------------------------------------

    pub fn handler(&self, node: NodeId, event: &str) -> Option<&Callback> {
        self.element(node)?
            .handlers
            .iter()
            .find(|(n, _)| n == event)
            .map(|(_, cb)| cb)
    }

    /// Bind `callback` as the handler for `event` on an element, replacing any previous one
    pub fn set_handler(
        &mut self,
        node: NodeId,
        event: impl Into<String>,
        callback: Callback,
    ) -> Result<(), DomError> {
        let event = event.into();
        let element = self.element_mut(node)?;
        match element.handlers.iter_mut().find(|(n, _)| *n == event) {
            Some((_, existing)) => *existing = callback,
            None => element.handlers.push((event.clone(), callback)),
        }
        self.record(MutationRecord::Handler {
            target: node,
            event,
        });
        Ok(())
    }

    /// Deliver `event` to the handlers of `target` and its ancestors
    ///
    /// Returns the number of handlers invoked.
    pub fn dispatch(&self, target: NodeId, event: &str) -> usize {
        let mut invoked = 0;
        let mut current = Some(target);
        while let Some(node) = current {
            if let Some(callback) = self.handler(node, event) {
                callback.call(&Event {
                    name: event.to_string(),
                    target,
                    current_target: node,
                });
                invoked += 1;
            }
            current = self.parent(node);
        }
        invoked
    }

    // Cloning -------------------------------------------------------------

    /// Deep-copy `node` from `source` into this document, detached
    ///
    /// Handlers are not copied. The copy is built without emitting
    /// mutation records.
    pub fn import_node(&mut self, source: &Document, node: NodeId) -> Result<NodeId, DomError> {
        let data = match &source
            .nodes
            .get(node)
            .ok_or(DomError::UnknownNode(node))?
            .data
        {
            NodeData::Element(el) => NodeData::Element(ElementData {
                name: el.name.clone(),
                attributes: el.attributes.clone(),
                handlers: Vec::new(),
            }),
            other => other.clone(),
        };
        let copy = self.nodes.insert(Node::new(data));
        let mut child = source.first_child(node);
        while let Some(id) = child {
            let child_copy = self.import_node(source, id)?;
            self.link(copy, child_copy, None);
            child = source.next_sibling(id);
        }
        Ok(copy)
    }

    // Observation ---------------------------------------------------------

    /// Start (or keep) collecting mutation records
    pub fn observe(&mut self) {
        if self.records.is_none() {
            self.records = Some(Vec::new());
        }
    }

    /// Drain the records collected so far, continuing to observe
    pub fn take_records(&mut self) -> Vec<MutationRecord> {
        self.records.as_mut().map(std::mem::take).unwrap_or_default()
    }

    /// Stop observing and return any pending records
    pub fn disconnect(&mut self) -> Vec<MutationRecord> {
        self.records.take().unwrap_or_default()
    }

    // Internals -----------------------------------------------------------

    fn check(&self, id: NodeId) -> Result<(), DomError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(DomError::UnknownNode(id))
        }
    }

    fn record(&mut self, record: MutationRecord) {
        if let Some(records) = &mut self.records {
            records.push(record);
        }
    }

    fn element(&self, node: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(node)?.data {
            NodeData::Element(el) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Result<&mut ElementData, DomError> {
        match self.nodes.get_mut(node).map(|n| &mut n.data) {
            Some(NodeData::Element(el)) => Ok(el),
            Some(_) => Err(DomError::WrongNodeKind {
                node,
                expected: "an element",
            }),
            None => Err(DomError::UnknownNode(node)),
        }
    }

    /// Detach `node` from its parent and siblings; returns the old parent
    fn unlink(&mut self, node: NodeId) -> Option<NodeId> {
        let n = self.nodes.get_mut(node)?;
        let (parent, prev, next) = (n.parent.take(), n.prev_sibling.take(), n.next_sibling.take());
        let parent = parent?;
        match prev {
            Some(prev) => self.nodes[prev].next_sibling = next,
            None => self.nodes[parent].first_child = next,
        }
        match next {
            Some(next) => self.nodes[next].prev_sibling = prev,
            None => self.nodes[parent].last_child = prev,
        }
        Some(parent)
    }

    /// Link a detached `node` under `parent` before `reference`
    fn link(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        let prev = match reference {
            Some(r) => self.nodes[r].prev_sibling,
            None => self.nodes[parent].last_child,
        };
        {
            let n = &mut self.nodes[node];
            n.parent = Some(parent);
            n.prev_sibling = prev;
            n.next_sibling = reference;
        }
        match prev {
            Some(prev) => self.nodes[prev].next_sibling = Some(node),
            None => self.nodes[parent].first_child = Some(node),
        }
        match reference {
            Some(r) => self.nodes[r].prev_sibling = Some(node),
            None => self.nodes[parent].last_child = Some(node),
        }
    }
}

/// Iterator over the children of a node
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.next_sibling(current);
        Some(current)
    }
}
