//! Templates and the values bound into them
//!
//! A template is a list of static markup segments with a slot between each
//! pair. Evaluating a template produces an [`Invocation`]: the shared
//! [`Statics`] plus one [`Value`] per slot.
//!
//! # Example
//!
//! ```rust
//! use html_templating::{html, Value};
//!
//! let item = |label: &str| html!("<li>{}</li>", label);
//! let list = html!(
//!     "<ul class={}>{}</ul>",
//!     "menu",
//!     vec![item("Home"), item("About")]
//! );
//! assert_eq!(list.statics().slot_count(), 2);
//! assert!(matches!(list.values()[1], Value::List(_)));
//! ```
//!
//! Every evaluation of one `html!` call site shares a single `Rc<Statics>`,
//! so the engine compiles its shape once and afterwards only updates values.

mod cache;
mod compiler;

pub use cache::ShapeCache;
pub use compiler::compile;

use std::fmt;
use std::rc::Rc;

use crate::dom::{Callback, Document, NodeId};

/// Static markup segments of one template
///
/// There is always one more segment than there are slots. The identity of a
/// template is the `Rc<Statics>` allocation, never its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statics {
    segments: Vec<String>,
}

impl Statics {
    /// Build statics from explicit segments; an empty list means one empty segment
    pub fn new<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        let mut segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            segments.push(String::new());
        }
        Self { segments }
    }

    /// Split `format!`-style text on `{}` slots
    ///
    /// `{{` and `}}` stand for literal braces. Any other brace is kept as is.
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            match (c, chars.peek()) {
                ('{', Some('{')) | ('}', Some('}')) => {
                    chars.next();
                    current.push(c);
                }
                ('{', Some('}')) => {
                    chars.next();
                    segments.push(std::mem::take(&mut current));
                }
                _ => current.push(c),
            }
        }
        segments.push(current);
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn slot_count(&self) -> usize {
        self.segments.len() - 1
    }

    /// The markup with `marker` standing in for every slot
    pub fn join(&self, marker: &str) -> String {
        self.segments.join(marker)
    }
}

/// One evaluation of a template: its statics plus the dynamic values
#[derive(Debug, Clone)]
pub struct Invocation {
    statics: Rc<Statics>,
    values: Vec<Value>,
}

impl Invocation {
    pub fn new(statics: Rc<Statics>, values: Vec<Value>) -> Self {
        Self { statics, values }
    }

    pub fn statics(&self) -> &Rc<Statics> {
        &self.statics
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// A dynamic value bound into a slot
///
/// There is no coercion: a value of the wrong kind for its slot is a bind
/// error. `Number` is accepted by no part.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Str(String),
    Number(f64),
    Callback(Callback),
    Template(Invocation),
    List(Vec<Value>),
}

impl Value {
    /// Name of the value kind, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Str(_) => "string",
            Value::Number(_) => "number",
            Value::Callback(_) => "callback",
            Value::Template(_) => "template",
            Value::List(_) => "list",
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

macro_rules! number_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

number_from!(f32, f64, i32, i64, u32, u64, usize);

impl From<Callback> for Value {
    fn from(cb: Callback) -> Self {
        Value::Callback(cb)
    }
}

impl From<Invocation> for Value {
    fn from(inv: Invocation) -> Self {
        Value::Template(inv)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Build an [`Invocation`] from a template literal and its slot values
///
/// `{}` marks a slot, `{{` and `}}` are literal braces. Each call site owns
/// one `Rc<Statics>`, so re-evaluating it reuses the compiled shape.
#[macro_export]
macro_rules! html {
    ($template:literal $(, $value:expr)*) => {{
        ::std::thread_local! {
            static STATICS: ::std::rc::Rc<$crate::template::Statics> =
                ::std::rc::Rc::new($crate::template::Statics::parse($template));
        }
        $crate::template::Invocation::new(
            STATICS.with(::std::rc::Rc::clone),
            ::std::vec![$($crate::template::Value::from($value)),*],
        )
    }};
}

/// What a part binds and how many values it consumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartKind {
    /// `onclick={}`: `name` is the attribute, `event` the name without the prefix
    Event { name: String, event: String },
    /// `disabled={}` or `title={}`
    Attribute { name: String },
    /// `href="/item/{}"`: the literal text around each slot
    InterpolatedAttribute { name: String, chunks: Vec<String> },
    /// Slots inside a comment; their values are ignored
    Comment { count: usize },
    /// Child content; `top_level` when the slot sits directly in the fragment root
    Content { top_level: bool },
}

impl PartKind {
    /// Number of consecutive values this part consumes
    pub fn value_count(&self) -> usize {
        match self {
            PartKind::Event { .. } | PartKind::Attribute { .. } | PartKind::Content { .. } => 1,
            PartKind::InterpolatedAttribute { chunks, .. } => chunks.len().saturating_sub(1),
            PartKind::Comment { count } => *count,
        }
    }
}

/// A part at a pre-order address within the template fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartDescriptor {
    pub address: usize,
    pub kind: PartKind,
}

/// A compiled template: the prepared fragment and its part descriptors
///
/// Content slots are an empty text placeholder followed by an empty text
/// boundary node. The placeholder is the initial content of the slot; the
/// boundary stays put for as long as the shape is mounted.
pub struct Shape {
    document: Document,
    root: NodeId,
    parts: Vec<PartDescriptor>,
    slot_count: usize,
}

impl Shape {
    pub(crate) fn new(
        document: Document,
        root: NodeId,
        parts: Vec<PartDescriptor>,
        slot_count: usize,
    ) -> Self {
        Self {
            document,
            root,
            parts,
            slot_count,
        }
    }

    /// Private document holding the prepared fragment
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Fragment root inside [`Shape::document`]
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn parts(&self) -> &[PartDescriptor] {
        &self.parts
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Count of top-level nodes a mount inserts that no content slot owns
    pub fn static_len(&self) -> usize {
        let top_level_slots = self
            .parts
            .iter()
            .filter(|p| matches!(p.kind, PartKind::Content { top_level: true }))
            .count();
        self.document.child_count(self.root) - top_level_slots
    }

    /// Serialized fragment with bound attributes and slot text removed
    pub fn html(&self) -> String {
        self.document.inner_html(self.root)
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("html", &self.html())
            .field("parts", &self.parts)
            .field("slot_count", &self.slot_count)
            .finish()
    }
}
