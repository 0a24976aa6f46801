//! Minimal XHTML document model
//!
//! Templates and nested fragments are parsed with quick-xml into a tree of
//! [`Node`]s. Text is held unescaped; the writer escapes on output.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::RenderError;

use super::writer;

/// A node in a parsed fragment
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element with attributes in source order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// Set an attribute, replacing an existing value in place
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }

    /// Concatenated text content of this element and its descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => collect_text(&element.children, out),
        }
    }
}

/// A parsed sub-tree without a document wrapper
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    pub nodes: Vec<Node>,
}

impl Fragment {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Parse markup into a fragment
    ///
    /// Empty input yields an empty fragment. Comments, doctypes and processing
    /// instructions are discarded.
    pub fn parse(markup: &str) -> Result<Self, RenderError> {
        let mut reader = Reader::from_str(markup);
        let mut stack: Vec<Element> = Vec::new();
        let mut nodes: Vec<Node> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(element_from(&start)?),
                Event::Empty(start) => {
                    let element = element_from(&start)?;
                    push_node(&mut stack, &mut nodes, Node::Element(element));
                }
                Event::End(end) => {
                    let element = stack.pop().ok_or_else(|| {
                        RenderError::Structure(format!(
                            "unexpected closing tag </{}>",
                            String::from_utf8_lossy(end.name().as_ref())
                        ))
                    })?;
                    push_node(&mut stack, &mut nodes, Node::Element(element));
                }
                Event::Text(text) => {
                    let text = text.unescape_with(resolve_html_entity)?;
                    if !text.is_empty() {
                        push_node(&mut stack, &mut nodes, Node::Text(text.into_owned()));
                    }
                }
                Event::CData(data) => {
                    let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    push_node(&mut stack, &mut nodes, Node::Text(text));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(RenderError::Structure(format!(
                "unclosed element <{}>",
                open.name
            )));
        }

        Ok(Self { nodes })
    }

    /// First top-level element, ignoring surrounding text
    pub fn first_element(&self) -> Option<&Element> {
        self.nodes.iter().find_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    pub fn into_first_element(self) -> Option<Element> {
        self.nodes.into_iter().find_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Serialize back to markup
    pub fn to_markup(&self) -> String {
        writer::to_markup(&self.nodes)
    }
}

fn element_from(start: &BytesStart<'_>) -> Result<Element, RenderError> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()));
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value_with(resolve_html_entity)?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

/// Append to the innermost open element, merging adjacent text
fn push_node(stack: &mut [Element], top_level: &mut Vec<Node>, node: Node) {
    let target = match stack.last_mut() {
        Some(parent) => &mut parent.children,
        None => top_level,
    };
    if let (Node::Text(text), Some(Node::Text(previous))) = (&node, target.last_mut()) {
        previous.push_str(text);
        return;
    }
    target.push(node);
}

/// HTML entities commonly found in narrative templates, beyond the XML five
fn resolve_html_entity(entity: &str) -> Option<&'static str> {
    match entity {
        "nbsp" => Some("\u{a0}"),
        "copy" => Some("\u{a9}"),
        "reg" => Some("\u{ae}"),
        "deg" => Some("\u{b0}"),
        "plusmn" => Some("\u{b1}"),
        "micro" => Some("\u{b5}"),
        "middot" => Some("\u{b7}"),
        "times" => Some("\u{d7}"),
        "ndash" => Some("\u{2013}"),
        "mdash" => Some("\u{2014}"),
        _ => None,
    }
}
