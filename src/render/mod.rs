//! Mounting and reconciliation
//!
//! The [`Engine`] renders an [`Invocation`] into a region of a host
//! [`Document`]. The first render of a shape into a region clones the
//! shape's fragment and binds its parts; later renders of the same shape
//! only push the new values through those parts.
//!
//! # Example
//!
//! ```rust
//! use html_templating::{html, Document, Engine};
//!
//! let mut doc = Document::new();
//! let container = doc.create_element("main");
//! let mut engine = Engine::new();
//!
//! let view = |count: &str| html!("<p class=\"count\">{}</p>", count.to_string());
//! engine.render(&mut doc, &view("1"), container).unwrap();
//! let paragraph = doc.first_child(container);
//!
//! engine.render(&mut doc, &view("2"), container).unwrap();
//! assert_eq!(doc.inner_html(container), "<p class=\"count\">2</p>");
//! assert_eq!(doc.first_child(container), paragraph);
//! ```

mod error;
mod part;
mod region;

pub use error::BindError;
pub use region::{MountedContent, Region};

use std::collections::HashMap;
use std::rc::Rc;

use slotmap::SecondaryMap;
use tracing::debug;

use crate::config::{ConfigError, EngineConfig};
use crate::dom::{Document, DocumentId, DomError, NodeId};
use crate::error::CompileError;
use crate::template::{Invocation, Shape, ShapeCache, Statics};
use crate::RenderError;
use part::Part;

/// Where a render goes, beyond its container
#[derive(Default)]
pub struct RenderOptions<'r> {
    /// Region to render into instead of the container's root region
    pub region: Option<&'r mut Region>,
    /// Node to insert new content before when the region is empty; appends when `None`
    pub before: Option<NodeId>,
}

/// Renders templates into host documents, keeping compiled shapes and
/// mounted content between calls
#[derive(Default)]
pub struct Engine {
    config: EngineConfig,
    shapes: ShapeCache,
    /// Root regions per document, by container
    roots: HashMap<DocumentId, SecondaryMap<NodeId, Region>>,
}

impl Engine {
    /// Create an engine with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with `config`, rejecting an invalid one
    pub fn with_config(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Render `invocation` into the root region of `container`
    pub fn render(
        &mut self,
        doc: &mut Document,
        invocation: &Invocation,
        container: NodeId,
    ) -> Result<(), RenderError> {
        self.render_with(doc, invocation, container, RenderOptions::default())
    }

    /// Render `invocation` into `container` with explicit placement
    pub fn render_with(
        &mut self,
        doc: &mut Document,
        invocation: &Invocation,
        container: NodeId,
        options: RenderOptions<'_>,
    ) -> Result<(), RenderError> {
        if !doc.contains(container) {
            return Err(DomError::UnknownNode(container).into());
        }
        match options.region {
            Some(region) => {
                if let Some(owner) = region.document().filter(|&owner| owner != doc.id()) {
                    return Err(DomError::ForeignRegion {
                        owner,
                        document: doc.id(),
                    }
                    .into());
                }
                self.render_region(doc, invocation, container, region, options.before)
            }
            None => {
                let mut region = self
                    .roots
                    .get_mut(&doc.id())
                    .and_then(|roots| roots.remove(container))
                    .unwrap_or_default();
                let result =
                    self.render_region(doc, invocation, container, &mut region, options.before);
                self.roots
                    .entry(doc.id())
                    .or_default()
                    .insert(container, region);
                result
            }
        }
    }

    /// Remove everything rendered into the root region of `container`
    ///
    /// Returns whether anything was mounted there.
    pub fn unmount(&mut self, doc: &mut Document, container: NodeId) -> Result<bool, RenderError> {
        let Some(mut region) = self
            .roots
            .get_mut(&doc.id())
            .and_then(|roots| roots.remove(container))
        else {
            return Ok(false);
        };
        let mounted = region.content().is_some();
        region.clear(doc)?;
        if mounted {
            debug!(?container, "unmounted root region");
        }
        Ok(mounted)
    }

    /// The root region of `container` in `doc`, if anything was rendered into it
    pub fn region(&self, doc: &Document, container: NodeId) -> Option<&Region> {
        self.roots.get(&doc.id())?.get(container)
    }

    /// Compiled shape for `statics`, compiling and caching it on first use
    pub fn compile(&mut self, statics: &Rc<Statics>) -> Result<Rc<Shape>, CompileError> {
        self.shapes.get_or_compile(statics, &self.config)
    }

    /// Number of shapes in the cache, live or not yet pruned
    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    pub(crate) fn render_region(
        &mut self,
        doc: &mut Document,
        invocation: &Invocation,
        container: NodeId,
        region: &mut Region,
        before: Option<NodeId>,
    ) -> Result<(), RenderError> {
        let shape = self.compile(invocation.statics())?;
        let values = invocation.values();
        if values.len() != shape.slot_count() {
            return Err(BindError::ValueCount {
                expected: shape.slot_count(),
                found: values.len(),
            }
            .into());
        }

        let mut content = match region.take_content() {
            Some(content) if Rc::ptr_eq(&content.shape, &shape) => content,
            previous => {
                // The old content counts towards what must be cleared
                if let Some(previous) = previous {
                    region.restore_content(previous);
                }
                self.mount(doc, shape, container, region, before)?
            }
        };

        let mut cursor = 0;
        let mut result = Ok(());
        for part in &mut content.parts {
            let count = part.value_count();
            let slice = &values[cursor..cursor + count];
            cursor += count;
            result = part.update(self, doc, slice);
            if result.is_err() {
                break;
            }
        }
        region.restore_content(content);
        result
    }

    /// Replace whatever `region` holds with a fresh clone of `shape`
    fn mount(
        &mut self,
        doc: &mut Document,
        shape: Rc<Shape>,
        container: NodeId,
        region: &mut Region,
        before: Option<NodeId>,
    ) -> Result<MountedContent, RenderError> {
        let before = if region.is_empty() {
            before
        } else {
            region.next_node(doc)
        };
        let replaced = !region.is_empty();
        region.clear(doc)?;

        let clone = doc.import_node(shape.document(), shape.root())?;
        let nodes = doc.walk(clone);
        let parts = shape
            .parts()
            .iter()
            .map(|descriptor| {
                let node = nodes
                    .get(descriptor.address)
                    .copied()
                    .ok_or(DomError::UnknownNode(clone))?;
                Part::new(doc, &descriptor.kind, node, container)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let last = doc.last_child(clone);
        doc.insert_before(container, clone, before)?;
        doc.remove(clone)?;

        debug!(
            parts = parts.len(),
            nodes = nodes.len(),
            replaced,
            "mounted template"
        );
        region.set_anchor(doc, last, shape.static_len());
        Ok(MountedContent { shape, parts })
    }
}
