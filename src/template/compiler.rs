//! Template compiler
//!
//! Joins the static segments with the slot marker, parses the result into a
//! private fragment and walks it in pre-order. Every node visited gets the
//! next address; nodes holding the marker produce part descriptors and are
//! rewritten so that a clone of the fragment is ready to bind values.

use tracing::debug;

use super::{PartDescriptor, PartKind, Shape, Statics};
use crate::config::EngineConfig;
use crate::dom::{Document, NodeId, NodeKind};
use crate::error::CompileError;
use crate::parser;

/// Compile `statics` into a shape
pub fn compile(statics: &Statics, config: &EngineConfig) -> Result<Shape, CompileError> {
    let marker = config.marker.as_str();
    if let Some(segment) = statics.segments().iter().position(|s| s.contains(marker)) {
        return Err(CompileError::MarkerInStatics {
            segment,
            marker: marker.to_string(),
        });
    }

    let source = statics.join(marker);
    let mut document = Document::new();
    let root = parser::parse_fragment(&mut document, &source)?;

    let mut compiler = Compiler {
        document: &mut document,
        root,
        config,
        parts: Vec::new(),
    };
    compiler.walk()?;
    let parts = compiler.parts;

    let found: usize = parts.iter().map(|p| p.kind.value_count()).sum();
    if found != statics.slot_count() {
        return Err(CompileError::SlotCountMismatch {
            expected: statics.slot_count(),
            found,
        });
    }

    debug!(
        slots = statics.slot_count(),
        parts = parts.len(),
        "compiled template shape"
    );
    Ok(Shape::new(document, root, parts, statics.slot_count()))
}

struct Compiler<'a> {
    document: &'a mut Document,
    root: NodeId,
    config: &'a EngineConfig,
    parts: Vec<PartDescriptor>,
}

impl Compiler<'_> {
    /// Visit the fragment in pre-order, seeing splits made to visited nodes
    fn walk(&mut self) -> Result<(), CompileError> {
        let mut address = 0;
        let mut current = self.document.first_child(self.root);
        while let Some(node) = current {
            match self.document.kind(node) {
                Some(NodeKind::Text) => self.text(node, address)?,
                Some(NodeKind::Element) => self.element(node, address)?,
                Some(NodeKind::Comment) => self.comment(node, address),
                Some(kind) => {
                    return Err(CompileError::UnsupportedNode {
                        kind: kind.name(),
                        address,
                    })
                }
                None => {}
            }
            address += 1;
            current = self.document.next_in_preorder(self.root, node);
        }
        Ok(())
    }

    fn push(&mut self, address: usize, kind: PartKind) {
        self.parts.push(PartDescriptor { address, kind });
    }

    fn text(&mut self, node: NodeId, address: usize) -> Result<(), CompileError> {
        let marker = self.config.marker.as_str();
        let data = self.document.data(node).unwrap_or_default().to_string();

        if let Some(rest) = data.strip_prefix(marker) {
            let Some(parent) = self.document.parent(node) else {
                return Ok(());
            };
            self.push(
                address,
                PartKind::Content {
                    top_level: parent == self.root,
                },
            );
            // Placeholder, then boundary, then the remaining text
            self.document.set_data(node, "")?;
            let boundary = self.document.create_text("");
            let next = self.document.next_sibling(node);
            self.document.insert_before(parent, boundary, next)?;
            if !rest.is_empty() {
                let tail = self.document.create_text(rest);
                let next = self.document.next_sibling(boundary);
                self.document.insert_before(parent, tail, next)?;
            }
        } else if let Some(offset) = data.find(marker) {
            // The tail starts with the marker and is visited next
            self.document.split_text(node, offset)?;
        }
        Ok(())
    }

    fn element(&mut self, node: NodeId, address: usize) -> Result<(), CompileError> {
        let marker = self.config.marker.as_str();
        let prefix = self.config.event_prefix.as_str();
        let tag = self.document.tag_name(node).unwrap_or_default().to_string();
        if tag.contains(marker) {
            return Err(CompileError::UnsupportedSlot {
                context: "tag name",
                element: tag,
                address,
            });
        }

        let attributes = self.document.attributes(node).to_vec();
        for (name, value) in attributes {
            if name.contains(marker) {
                return Err(CompileError::UnsupportedSlot {
                    context: "attribute name",
                    element: tag,
                    address,
                });
            }
            let kind = if value == marker {
                match name.strip_prefix(prefix) {
                    Some(event) if !event.is_empty() => PartKind::Event {
                        event: event.to_string(),
                        name: name.clone(),
                    },
                    _ => PartKind::Attribute { name: name.clone() },
                }
            } else if value.contains(marker) {
                PartKind::InterpolatedAttribute {
                    chunks: value.split(marker).map(str::to_string).collect(),
                    name: name.clone(),
                }
            } else {
                continue;
            };
            self.push(address, kind);
            self.document.remove_attribute(node, &name)?;
        }
        Ok(())
    }

    fn comment(&mut self, node: NodeId, address: usize) {
        let count = self
            .document
            .data(node)
            .map_or(0, |data| data.matches(self.config.marker.as_str()).count());
        if count > 0 {
            self.push(address, PartKind::Comment { count });
        }
    }
}
