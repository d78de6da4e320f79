//! html-templating - incremental rendering of markup templates
//!
//! This library compiles templates written as static markup with `{}` slots
//! into reusable shapes, mounts them into a host node tree and, on every
//! later render, mutates only the nodes whose bound value changed.
//!
//! # Example
//!
//! ```rust
//! use html_templating::{html, Document, Engine, Invocation};
//!
//! let mut doc = Document::new();
//! let container = doc.create_element("main");
//! let mut engine = Engine::new();
//!
//! let todo = |done: bool, label: &str| html!("<li done={}>{}</li>", done, label);
//! let list = |items: Vec<Invocation>| html!("<ul>{}</ul>", items);
//!
//! engine
//!     .render(&mut doc, &list(vec![todo(false, "write"), todo(true, "read")]), container)
//!     .unwrap();
//! assert_eq!(
//!     doc.inner_html(container),
//!     r#"<ul><li>write</li><li done>read</li></ul>"#
//! );
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod parser;
pub mod render;
pub mod scenario;
pub mod template;

pub use config::{ConfigError, EngineConfig};
pub use dom::{
    Callback, Document, DocumentId, DomError, Event, MutationRecord, NodeId, NodeKind,
};
pub use error::{CompileError, ParseError};
pub use render::{BindError, Engine, MountedContent, Region, RenderOptions};
pub use scenario::{Scenario, ScenarioError};
pub use template::{Invocation, PartDescriptor, PartKind, Shape, Statics, Value};

use thiserror::Error;

/// Errors that can occur during a render call
#[derive(Debug, Error)]
pub enum RenderError {
    /// The template could not be compiled
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    /// A value does not fit the slot it was bound to
    #[error("bind error: {0}")]
    Bind(#[from] BindError),

    /// The host tree rejected an operation
    #[error("document error: {0}")]
    Dom(#[from] DomError),
}
