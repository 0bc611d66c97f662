//! Small XML writer and roxmltree lookup helpers
//!
//! The writer emits indented, escaped XML with prefixed element names. The
//! readers match elements by local name only, so a hub that binds its own
//! namespace prefixes still decodes.

use roxmltree::Node;

use super::{DecodeError, DecodeResult, Operation};

/// Escape text content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Default)]
pub struct XmlWriter {
    buf: String,
    open: Vec<&'static str>,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declaration(&mut self) -> &mut Self {
        self.buf.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        self
    }

    fn indent(&mut self) {
        for _ in 0..self.open.len() {
            self.buf.push_str("  ");
        }
    }

    /// Open an element with `(name, value)` attributes.
    pub fn open_with(&mut self, name: &'static str, attributes: &[(&str, &str)]) -> &mut Self {
        self.indent();
        self.buf.push('<');
        self.buf.push_str(name);
        for (key, value) in attributes {
            self.buf.push(' ');
            self.buf.push_str(key);
            self.buf.push_str("=\"");
            self.buf.push_str(&escape(value));
            self.buf.push('"');
        }
        self.buf.push_str(">\n");
        self.open.push(name);
        self
    }

    pub fn open(&mut self, name: &'static str) -> &mut Self {
        self.open_with(name, &[])
    }

    pub fn close(&mut self) -> &mut Self {
        if let Some(name) = self.open.pop() {
            self.indent();
            self.buf.push_str("</");
            self.buf.push_str(name);
            self.buf.push_str(">\n");
        }
        self
    }

    pub fn empty(&mut self, name: &'static str) -> &mut Self {
        self.indent();
        self.buf.push('<');
        self.buf.push_str(name);
        self.buf.push_str("/>\n");
        self
    }

    pub fn leaf(&mut self, name: &'static str, text: impl AsRef<str>) -> &mut Self {
        self.indent();
        self.buf.push('<');
        self.buf.push_str(name);
        self.buf.push('>');
        self.buf.push_str(&escape(text.as_ref()));
        self.buf.push_str("</");
        self.buf.push_str(name);
        self.buf.push_str(">\n");
        self
    }

    /// Absent values produce no element at all.
    pub fn opt_leaf<T: AsRef<str>>(&mut self, name: &'static str, text: Option<T>) -> &mut Self {
        if let Some(text) = text {
            self.leaf(name, text);
        }
        self
    }

    /// Close every open element and return the document.
    pub fn finish(mut self) -> String {
        while !self.open.is_empty() {
            self.close();
        }
        self.buf
    }
}

pub fn is(node: &Node<'_, '_>, local: &str) -> bool {
    node.is_element() && node.tag_name().name() == local
}

pub fn child<'a, 'input>(node: &Node<'a, 'input>, local: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is(n, local))
}

pub fn children<'a, 'input: 'a>(
    node: &Node<'a, 'input>,
    local: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| is(n, local))
}

/// First element child, whatever its name.
pub fn first_element<'a, 'input>(node: &Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.is_element())
}

/// Trimmed text of a child element; empty text counts as absent.
pub fn child_text<'a>(node: &Node<'a, '_>, local: &str) -> Option<&'a str> {
    child(node, local)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn require_text<'a>(
    operation: Operation,
    raw: &str,
    node: &Node<'a, '_>,
    local: &str,
) -> DecodeResult<&'a str> {
    child_text(node, local).ok_or_else(|| {
        DecodeError::new(
            operation,
            format!("missing <{}> in <{}>", local, node.tag_name().name()),
            raw,
        )
    })
}

pub fn require_child<'a, 'input>(
    operation: Operation,
    raw: &str,
    node: &Node<'a, 'input>,
    local: &str,
) -> DecodeResult<Node<'a, 'input>> {
    child(node, local).ok_or_else(|| {
        DecodeError::new(
            operation,
            format!("missing <{}> in <{}>", local, node.tag_name().name()),
            raw,
        )
    })
}

/// Parse an optional child with a fallible constructor.
pub fn parse_opt<T, E: std::fmt::Display>(
    operation: Operation,
    raw: &str,
    node: &Node<'_, '_>,
    local: &str,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> DecodeResult<Option<T>> {
    match child_text(node, local) {
        Some(text) => parse(text)
            .map(Some)
            .map_err(|e| DecodeError::new(operation, format!("<{}>: {}", local, e), raw)),
        None => Ok(None),
    }
}

/// Parse a mandatory child with a fallible constructor.
pub fn parse_req<T, E: std::fmt::Display>(
    operation: Operation,
    raw: &str,
    node: &Node<'_, '_>,
    local: &str,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> DecodeResult<T> {
    let text = require_text(operation, raw, node, local)?;
    parse(text).map_err(|e| DecodeError::new(operation, format!("<{}>: {}", local, e), raw))
}

pub fn parse_bool(text: &str) -> Result<bool, String> {
    match text.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(format!("not a boolean: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use roxmltree::Document;

    use super::*;

    #[test]
    fn writer_escapes_and_indents() {
        let mut w = XmlWriter::new();
        w.open("a:Root").leaf("a:Name", "Tom & <Jerry>").opt_leaf::<&str>("a:Skip", None);
        w.empty("a:Empty");
        let xml = w.finish();

        assert_eq!(
            xml,
            "<a:Root>\n  <a:Name>Tom &amp; &lt;Jerry&gt;</a:Name>\n  <a:Empty/>\n</a:Root>\n"
        );
    }

    #[test]
    fn lookups_ignore_prefixes() {
        let raw = r#"<x:Root xmlns:x="urn:x" xmlns:y="urn:y"><y:Code> 017 </y:Code><y:Empty>  </y:Empty></x:Root>"#;
        let doc = Document::parse(raw).unwrap();
        let root = doc.root_element();

        assert_eq!(child_text(&root, "Code"), Some("017"));
        assert_eq!(child_text(&root, "Empty"), None);
        assert!(require_text(Operation::AuthorizeStart, raw, &root, "Missing").is_err());
    }

    #[test]
    fn parse_bool_accepts_xsd_forms() {
        assert_eq!(parse_bool("true"), Ok(true));
        assert_eq!(parse_bool("0"), Ok(false));
        assert!(parse_bool("yes").is_err());
    }
}
