//! Regions: ranges of sibling nodes owned by one render target

use std::rc::Rc;

use tracing::trace;

use super::part::Part;
use crate::dom::{Document, DocumentId, DomError, NodeId};
use crate::template::Shape;

/// The template instantiated in a region, with its live parts
pub struct MountedContent {
    pub(crate) shape: Rc<Shape>,
    pub(crate) parts: Vec<Part>,
}

impl MountedContent {
    pub fn shape(&self) -> &Rc<Shape> {
        &self.shape
    }

    /// Nodes inserted into the region's parent by top-level content slots
    fn nested_len(&self) -> usize {
        self.parts.iter().map(Part::top_level_len).sum()
    }
}

/// A run of consecutive siblings ending at `last`
///
/// The region holds nothing, a single text node, or a mounted template. In
/// the last case `last` is always a node of the template fragment itself,
/// because every content slot ends in its own boundary node.
#[derive(Default)]
pub struct Region {
    /// Document the mounted template lives in
    document: Option<DocumentId>,
    last: Option<NodeId>,
    /// Nodes inserted directly, not counting nested top-level content
    own_len: usize,
    content: Option<MountedContent>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    /// A region holding exactly the text node `node`
    pub(crate) fn text(node: NodeId) -> Self {
        Self {
            document: None,
            last: Some(node),
            own_len: 1,
            content: None,
        }
    }

    /// Number of siblings physically inside the region
    pub fn len(&self) -> usize {
        self.own_len + self.content.as_ref().map_or(0, MountedContent::nested_len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// End anchor: the last node of the region
    pub fn last(&self) -> Option<NodeId> {
        self.last
    }

    /// Document holding the template mounted here, if any
    pub fn document(&self) -> Option<DocumentId> {
        self.document
    }

    pub fn content(&self) -> Option<&MountedContent> {
        self.content.as_ref()
    }

    /// The text node this region holds, if it holds text
    pub(crate) fn text_node(&self) -> Option<NodeId> {
        match (&self.content, self.own_len) {
            (None, 1) => self.last,
            _ => None,
        }
    }

    /// First node of the region
    pub fn first_node(&self, doc: &Document) -> Option<NodeId> {
        let mut node = self.last?;
        for _ in 1..self.len() {
            node = doc.previous_sibling(node)?;
        }
        Some(node)
    }

    /// Where content inserted in place of this region's nodes belongs
    pub(crate) fn next_node(&self, doc: &Document) -> Option<NodeId> {
        self.last.and_then(|last| doc.next_sibling(last))
    }

    /// Remove every node of the region, walking back from the end anchor
    pub fn clear(&mut self, doc: &mut Document) -> Result<(), DomError> {
        let len = self.len();
        let mut node = self.last;
        for _ in 0..len {
            let Some(id) = node else { break };
            node = doc.previous_sibling(id);
            doc.remove(id)?;
        }
        if len > 0 {
            trace!(removed = len, "cleared region");
        }
        *self = Self::default();
        Ok(())
    }

    pub(crate) fn take_content(&mut self) -> Option<MountedContent> {
        self.content.take()
    }

    /// Record a fresh mount; its content is restored after the first update
    pub(crate) fn set_anchor(&mut self, doc: &Document, last: Option<NodeId>, own_len: usize) {
        self.document = Some(doc.id());
        self.last = last;
        self.own_len = own_len;
        self.content = None;
    }

    pub(crate) fn restore_content(&mut self, content: MountedContent) {
        self.content = Some(content);
    }
}
