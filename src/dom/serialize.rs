//! Markup serialization of a document subtree

use super::{is_void_element, Document, NodeData, NodeId};

impl Document {
    /// Serialized markup of the children of `node`
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serialized markup of `node` itself, including its children
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    /// Concatenated text content of `node` and its descendants
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let Some(NodeData::Text(s)) = self.nodes.get(node).map(|n| &n.data) {
            out.push_str(s);
        }
        for id in self.walk(node) {
            if let Some(NodeData::Text(s)) = self.nodes.get(id).map(|n| &n.data) {
                out.push_str(s);
            }
        }
        out
    }

    fn write_node(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.nodes.get(node) else {
            return;
        };
        match &n.data {
            NodeData::Fragment => {
                for child in self.children(node) {
                    self.write_node(child, out);
                }
            }
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.name);
                for (name, value) in &el.attributes {
                    out.push(' ');
                    out.push_str(name);
                    if !value.is_empty() {
                        out.push_str("=\"");
                        out.push_str(&escape_attribute(value));
                        out.push('"');
                    }
                }
                out.push('>');
                if is_void_element(&el.name) {
                    return;
                }
                for child in self.children(node) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&el.name);
                out.push('>');
            }
            NodeData::Text(s) => out.push_str(&escape_text(s)),
            NodeData::Comment(s) => {
                out.push_str("<!--");
                out.push_str(s);
                out.push_str("-->");
            }
            NodeData::CData(s) => {
                out.push_str("<![CDATA[");
                out.push_str(s);
                out.push_str("]]>");
            }
            NodeData::Doctype(s) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(s);
                out.push('>');
            }
            NodeData::ProcessingInstruction(s) => {
                out.push_str("<?");
                out.push_str(s);
                out.push_str("?>");
            }
        }
    }
}

pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn escape_attribute(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}
