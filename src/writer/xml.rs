//! XML text rendering of node trees
//!
//! Output is UTF-8 without BOM, indented with tabs, LF line endings. Leaves
//! with no content render as `<Name />`. Characters XML 1.0 cannot carry are
//! dropped before escaping.

use super::invariant::format_scalar;
use super::node::{Node, NodeContent};

/// XML declaration written at the top of every document
pub const DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Opening root element, e.g. `<Products Version="5.0.0">`
pub fn root_start(name: &str, version: &str) -> String {
    format!(r#"<{} Version="{}">"#, name, escape_attribute(version))
}

pub fn root_end(name: &str) -> String {
    format!("</{}>", name)
}

/// Render a node and its children at the given depth
///
/// The first line carries the indentation, no trailing newline is written.
pub fn render_node(node: &Node, depth: usize) -> String {
    let mut out = String::new();
    write_node(&mut out, node, depth);
    out
}

fn write_node(out: &mut String, node: &Node, depth: usize) {
    indent(out, depth);
    out.push('<');
    out.push_str(&node.name);
    for (name, value) in &node.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attribute(value));
        out.push('"');
    }

    if node.is_empty() {
        out.push_str(" />");
        return;
    }
    out.push('>');

    match &node.content {
        NodeContent::Scalar(value) => out.push_str(&escape_text(&format_scalar(value))),
        NodeContent::Group(children) => {
            for child in children {
                out.push('\n');
                write_node(out, child, depth + 1);
            }
            out.push('\n');
            indent(out, depth);
        }
    }

    out.push_str("</");
    out.push_str(&node.name);
    out.push('>');
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}

/// Check if a character may appear in an XML 1.0 document
pub fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Escape element content
///
/// `\r` is written as a character reference; parsers fold a raw one into `\n`.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().filter(|c| is_xml_char(*c)) {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape an attribute value (double quoted)
pub fn escape_attribute(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars().filter(|c| is_xml_char(*c)) {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            _ => out.push(c),
        }
    }
    out
}
