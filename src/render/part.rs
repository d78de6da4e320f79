//! Live parts: one binding per slot of a mounted template
//!
//! Each part pairs a descriptor with the node it resolved to inside one
//! clone of the shape. Updates only touch the tree when the bound value
//! actually changed.

use tracing::trace;

use super::{BindError, Engine, Region};
use crate::dom::{Callback, Document, DomError, NodeId};
use crate::template::{Invocation, PartKind, Value};
use crate::RenderError;

pub(crate) enum Part {
    Event {
        node: NodeId,
        event: String,
        last: Option<Callback>,
    },
    Attribute {
        node: NodeId,
        name: String,
    },
    Interpolated {
        node: NodeId,
        name: String,
        chunks: Vec<String>,
        last: Option<Vec<String>>,
    },
    Comment {
        count: usize,
    },
    Content(ContentPart),
}

impl Part {
    /// Bind `kind` to `node`, a node of a freshly imported clone
    ///
    /// Top-level content slots insert into `container`, since the clone's
    /// fragment root is emptied when the clone is mounted.
    pub(crate) fn new(
        doc: &Document,
        kind: &PartKind,
        node: NodeId,
        container: NodeId,
    ) -> Result<Self, DomError> {
        Ok(match kind {
            PartKind::Event { event, .. } => Part::Event {
                node,
                event: event.clone(),
                last: None,
            },
            PartKind::Attribute { name } => Part::Attribute {
                node,
                name: name.clone(),
            },
            PartKind::InterpolatedAttribute { name, chunks } => Part::Interpolated {
                node,
                name: name.clone(),
                chunks: chunks.clone(),
                last: None,
            },
            PartKind::Comment { count } => Part::Comment { count: *count },
            PartKind::Content { top_level } => {
                let parent = if *top_level {
                    container
                } else {
                    doc.parent(node).ok_or(DomError::UnknownNode(node))?
                };
                let boundary = doc.next_sibling(node).ok_or(DomError::UnknownNode(node))?;
                Part::Content(ContentPart {
                    parent,
                    boundary,
                    top_level: *top_level,
                    regions: vec![Region::text(node)],
                })
            }
        })
    }

    pub(crate) fn value_count(&self) -> usize {
        match self {
            Part::Interpolated { chunks, .. } => chunks.len().saturating_sub(1),
            Part::Comment { count } => *count,
            Part::Event { .. } | Part::Attribute { .. } | Part::Content(_) => 1,
        }
    }

    /// Siblings this part inserted next to the template's own top-level nodes
    pub(crate) fn top_level_len(&self) -> usize {
        match self {
            Part::Content(part) if part.top_level => part.len(),
            _ => 0,
        }
    }

    /// Apply `values`, exactly [`Part::value_count`] of them
    pub(crate) fn update(
        &mut self,
        engine: &mut Engine,
        doc: &mut Document,
        values: &[Value],
    ) -> Result<(), RenderError> {
        match self {
            Part::Event { node, event, last } => {
                let Some(value) = values.first() else {
                    return Ok(());
                };
                let Value::Callback(callback) = value else {
                    return Err(wrong_type("event", "a callback", value).into());
                };
                if last.as_ref().is_some_and(|l| l.ptr_eq(callback)) {
                    return Ok(());
                }
                doc.set_handler(*node, event.as_str(), callback.clone())?;
                trace!(event = %event, "bound event handler");
                *last = Some(callback.clone());
            }
            Part::Attribute { node, name } => match values.first() {
                Some(Value::Bool(on)) => {
                    let present = doc.has_attribute(*node, name);
                    if *on && !present {
                        doc.set_attribute(*node, name.as_str(), "")?;
                    } else if !*on && present {
                        doc.remove_attribute(*node, name)?;
                    }
                }
                Some(Value::Str(s)) => {
                    if doc.get_attribute(*node, name) != Some(s.as_str()) {
                        doc.set_attribute(*node, name.as_str(), s.as_str())?;
                    }
                }
                Some(other) => {
                    return Err(wrong_type("attribute", "a boolean or string", other).into())
                }
                None => {}
            },
            Part::Interpolated {
                node,
                name,
                chunks,
                last,
            } => {
                let strings = values
                    .iter()
                    .map(|value| match value {
                        Value::Str(s) => Ok(s.clone()),
                        other => Err(wrong_type("interpolated attribute", "a string", other)),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                if last.as_ref() == Some(&strings) {
                    return Ok(());
                }
                let mut joined = chunks.first().cloned().unwrap_or_default();
                for (value, chunk) in strings.iter().zip(chunks.iter().skip(1)) {
                    joined.push_str(value);
                    joined.push_str(chunk);
                }
                trace!(attribute = %name, value = %joined, "rewrote interpolated attribute");
                doc.set_attribute(*node, name.as_str(), joined)?;
                *last = Some(strings);
            }
            Part::Comment { .. } => {}
            Part::Content(part) => {
                if let Some(value) = values.first() {
                    part.update(engine, doc, value)?;
                }
            }
        }
        Ok(())
    }
}

fn wrong_type(part: &'static str, expected: &'static str, found: &Value) -> BindError {
    BindError::WrongType {
        part,
        expected,
        found: found.type_name(),
    }
}

/// Child content of one slot: a list of regions, one per item
///
/// Regions are reconciled by position. All of them sit between the slot's
/// start and its `boundary` node, in order.
pub(crate) struct ContentPart {
    parent: NodeId,
    boundary: NodeId,
    top_level: bool,
    regions: Vec<Region>,
}

impl ContentPart {
    fn len(&self) -> usize {
        self.regions.iter().map(Region::len).sum()
    }

    fn update(
        &mut self,
        engine: &mut Engine,
        doc: &mut Document,
        value: &Value,
    ) -> Result<(), RenderError> {
        match value {
            Value::Null => self.resize(doc, 0)?,
            Value::Str(_) | Value::Template(_) => {
                self.resize(doc, 1)?;
                self.update_at(engine, doc, 0, value)?;
            }
            Value::List(items) => {
                if let Some((index, item)) = items.iter().enumerate().find(|(_, item)| {
                    !matches!(item, Value::Null | Value::Str(_) | Value::Template(_))
                }) {
                    return Err(BindError::InvalidListItem {
                        index,
                        found: item.type_name(),
                    }
                    .into());
                }
                self.resize(doc, items.len())?;
                for (index, item) in items.iter().enumerate() {
                    self.update_at(engine, doc, index, item)?;
                }
            }
            other => {
                return Err(wrong_type("content", "null, a string, a template or a list", other).into())
            }
        }
        Ok(())
    }

    /// Drop tail regions or append empty ones until there are `len`
    fn resize(&mut self, doc: &mut Document, len: usize) -> Result<(), DomError> {
        while self.regions.len() > len {
            if let Some(mut region) = self.regions.pop() {
                region.clear(doc)?;
            }
        }
        self.regions.resize_with(len, Region::default);
        Ok(())
    }

    fn update_at(
        &mut self,
        engine: &mut Engine,
        doc: &mut Document,
        index: usize,
        value: &Value,
    ) -> Result<(), RenderError> {
        match value {
            Value::Str(s) => self.set_text(doc, index, s)?,
            Value::Template(invocation) => self.set_template(engine, doc, index, invocation)?,
            _ => self.regions[index].clear(doc)?,
        }
        Ok(())
    }

    fn set_text(&mut self, doc: &mut Document, index: usize, text: &str) -> Result<(), DomError> {
        if let Some(node) = self.regions[index].text_node() {
            if doc.data(node) != Some(text) {
                doc.set_data(node, text)?;
            }
            return Ok(());
        }
        let before = self.insertion_point(doc, index);
        self.regions[index].clear(doc)?;
        trace!(index, "inserted text content");
        let node = doc.create_text(text);
        doc.insert_before(self.parent, node, before)?;
        self.regions[index] = Region::text(node);
        Ok(())
    }

    fn set_template(
        &mut self,
        engine: &mut Engine,
        doc: &mut Document,
        index: usize,
        invocation: &Invocation,
    ) -> Result<(), RenderError> {
        let before = self.insertion_point(doc, index);
        engine.render_region(doc, invocation, self.parent, &mut self.regions[index], before)
    }

    /// Node that content for region `index` must be inserted before
    ///
    /// The node after the region when it holds anything, else the first
    /// node of the next non-empty region, else the slot's boundary.
    fn insertion_point(&self, doc: &Document, index: usize) -> Option<NodeId> {
        if !self.regions[index].is_empty() {
            return self.regions[index].next_node(doc);
        }
        self.regions[index + 1..]
            .iter()
            .find(|region| !region.is_empty())
            .and_then(|region| region.first_node(doc))
            .or(Some(self.boundary))
    }
}
