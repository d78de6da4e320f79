//! Parser for template markup

pub mod ast;
mod grammar;
pub mod lexer;

pub use ast::*;
pub use grammar::parse;

use crate::dom::{Document, DomError, NodeId};
use crate::error::CompileError;

/// Parse markup and build it into `doc` as a detached fragment
pub fn parse_fragment(doc: &mut Document, input: &str) -> Result<NodeId, CompileError> {
    let nodes = parse(input)?;
    let root = doc.create_fragment();
    build(doc, root, &nodes)?;
    Ok(root)
}

fn build(
    doc: &mut Document,
    parent: NodeId,
    nodes: &[Spanned<MarkupNode>],
) -> Result<(), DomError> {
    for node in nodes {
        let id = match &node.node {
            MarkupNode::Element(el) => {
                let id = doc.create_element(el.name.as_str());
                for (name, value) in &el.attributes {
                    doc.set_attribute(id, name.as_str(), value.as_str())?;
                }
                build(doc, id, &el.children)?;
                id
            }
            MarkupNode::Text(s) => doc.create_text(s.as_str()),
            MarkupNode::Comment(s) => doc.create_comment(s.as_str()),
            MarkupNode::CData(s) => doc.create_cdata(s.as_str()),
            MarkupNode::Doctype(s) => doc.create_doctype(s.as_str()),
            MarkupNode::ProcessingInstruction(s) => doc.create_processing_instruction(s.as_str()),
        };
        doc.append_child(parent, id)?;
    }
    Ok(())
}
