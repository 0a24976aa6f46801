//! Markup serialization for rendered fragments

use quick_xml::escape::{escape, partial_escape};

use super::dom::{Element, Node};

/// HTML elements that never carry content
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "hr", "img", "input", "link", "meta", "wbr",
];

/// Build markup incrementally
#[derive(Debug, Default)]
pub struct MarkupWriter {
    out: String,
}

impl MarkupWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_nodes(&mut self, nodes: &[Node]) {
        for node in nodes {
            self.write_node(node);
        }
    }

    pub fn write_node(&mut self, node: &Node) {
        match node {
            Node::Element(element) => self.write_element(element),
            Node::Text(text) => self.out.push_str(&partial_escape(text.as_str())),
        }
    }

    pub fn write_element(&mut self, element: &Element) {
        self.out.push('<');
        self.out.push_str(&element.name);
        for (name, value) in &element.attributes {
            self.out.push(' ');
            self.out.push_str(name);
            self.out.push_str("=\"");
            self.out.push_str(&escape(value.as_str()));
            self.out.push('"');
        }

        if element.children.is_empty() && VOID_ELEMENTS.contains(&element.name.as_str()) {
            self.out.push_str("/>");
            return;
        }

        self.out.push('>');
        self.write_nodes(&element.children);
        self.out.push_str("</");
        self.out.push_str(&element.name);
        self.out.push('>');
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Serialize nodes to a markup string
pub fn to_markup(nodes: &[Node]) -> String {
    let mut writer = MarkupWriter::new();
    writer.write_nodes(nodes);
    writer.finish()
}
