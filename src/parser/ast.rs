//! Syntax tree for template markup

use super::lexer::Tag;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// One node of parsed markup
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    Element(Element),
    Text(String),
    Comment(String),
    CData(String),
    Doctype(String),
    ProcessingInstruction(String),
}

/// An element with its attributes and children
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Spanned<MarkupNode>>,
}

impl Element {
    pub fn new(tag: Tag, children: Vec<Spanned<MarkupNode>>) -> Self {
        Self {
            name: tag.name,
            attributes: tag.attributes,
            children,
        }
    }
}
