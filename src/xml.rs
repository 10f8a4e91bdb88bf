//! XML adapter for [`PropertyTree`], backed by `roxmltree`.
//!
//! Elements become nodes named by their local tag name. Attributes are stored
//! under the [`XML_ATTRIBUTES`] sub-key, so a field reads the `id` attribute at
//! `<xmlattr>/id`. The direct text of an element, trimmed, is the node value.
use crate::error::DocumentError;
use crate::tree::{PropertyTree, XML_ATTRIBUTES};

impl PropertyTree {
    /// A document root holding the document's root element.
    pub fn from_xml(src: &str) -> Result<PropertyTree, DocumentError> {
        let document = roxmltree::Document::parse(src)?;
        let root = document.root_element();
        let mut tree = PropertyTree::document();
        tree.push_child(root.tag_name().name(), element_node(root));
        tracing::trace!(root = root.tag_name().name(), "parsed XML document");
        Ok(tree)
    }

    /// Renders the tree as XML. A document root renders its elements, any
    /// other node renders its children.
    pub fn to_xml(&self) -> String {
        let mut out = String::new();
        if self.is_document() {
            out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        }
        for (name, child) in self.children() {
            if name != XML_ATTRIBUTES {
                write_element(&mut out, name, child, 0);
            }
        }
        out
    }
}

fn element_node(element: roxmltree::Node<'_, '_>) -> PropertyTree {
    let mut node = PropertyTree::new();
    if element.attributes().next().is_some() {
        let attributes = node.push_child(XML_ATTRIBUTES, PropertyTree::new());
        for attribute in element.attributes() {
            attributes.push_child(attribute.name(), PropertyTree::with_data(attribute.value()));
        }
    }
    let mut text = String::new();
    for child in element.children() {
        if child.is_element() {
            node.push_child(child.tag_name().name(), element_node(child));
        } else if child.is_text() {
            text.push_str(child.text().unwrap_or_default());
        }
    }
    node.set_data(text.trim());
    node
}

fn write_element(out: &mut String, name: &str, node: &PropertyTree, depth: usize) {
    let indent = "  ".repeat(depth);
    out.push_str(&format!("{indent}<{name}"));
    let mut elements = Vec::new();
    for (key, child) in node.children() {
        if key == XML_ATTRIBUTES {
            for (attribute, value) in child.children() {
                let value = escape(value.data(), Context::Attribute);
                out.push_str(&format!(" {attribute}=\"{value}\""));
            }
        } else {
            elements.push((key, child));
        }
    }
    if elements.is_empty() && node.data().is_empty() {
        out.push_str("/>\n");
        return;
    }
    out.push('>');
    out.push_str(&escape(node.data(), Context::Text));
    if !elements.is_empty() {
        out.push('\n');
        for (key, child) in elements {
            write_element(out, key, child, depth + 1);
        }
        out.push_str(&indent);
    }
    out.push_str(&format!("</{name}>\n"));
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Context {
    Text,
    Attribute,
}

/// Attribute values are whitespace-normalized by readers, so tabs and line
/// breaks go out as character references there. A raw `\r` never survives
/// line-end normalization in either context.
fn escape(text: &str, context: Context) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\r' => escaped.push_str("&#13;"),
            '\n' if context == Context::Attribute => escaped.push_str("&#10;"),
            '\t' if context == Context::Attribute => escaped.push_str("&#9;"),
            other => escaped.push(other),
        }
    }
    escaped
}
