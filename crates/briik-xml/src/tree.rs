//! Minimal element tree built from the quick-xml event stream.
//!
//! Import navigates this tree structurally (direct children only), so an
//! element name reused at different depths (`Status/Order` vs
//! `Orders/Order`) never gets confused.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XmlError, XmlResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Node {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
    /// Concatenated, unescaped character data directly inside this element.
    pub text: String,
}

/// Stand-in for absent elements; every lookup on it yields nothing.
pub(crate) static EMPTY: Node = Node {
    name: String::new(),
    attrs: Vec::new(),
    children: Vec::new(),
    text: String::new(),
};

impl Node {
    fn open(start: &BytesStart<'_>) -> XmlResult<Node> {
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attrs.push((key, value));
        }

        Ok(Node {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attrs,
            children: Vec::new(),
            text: String::new(),
        })
    }

    /// First direct child called `name`.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// First direct child called `name`, or [`EMPTY`].
    pub fn child_or_empty(&self, name: &str) -> &Node {
        self.child(name).unwrap_or(&EMPTY)
    }

    /// Direct children called `name`, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Text of the direct child `name` ("" when absent).
    pub fn text_of(&self, name: &str) -> &str {
        self.child(name).map(|c| c.text.as_str()).unwrap_or("")
    }
}

/// Parses `xml` and returns its root element.
pub(crate) fn parse(xml: &str) -> XmlResult<Node> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    // stack[0] is a synthetic document node collecting the root element
    let mut stack: Vec<Node> = vec![Node::default()];

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => stack.push(Node::open(&e)?),
            Event::Empty(e) => {
                let node = Node::open(&e)?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(node);
                }
            }
            Event::End(_) => {
                // the reader already verified the closing name matches
                if stack.len() > 1 {
                    if let Some(node) = stack.pop() {
                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(node);
                        }
                    }
                }
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text);
                }
            }
            Event::CData(e) => {
                let raw = e.into_inner();
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&raw));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if stack.len() > 1 {
        let open = stack.last().map(|n| n.name.clone()).unwrap_or_default();
        return Err(XmlError::UnexpectedEof(open));
    }

    let document = stack.pop().unwrap_or_default();
    document
        .children
        .into_iter()
        .next()
        .ok_or(XmlError::EmptyDocument)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_structure() {
        let root = parse(
            r#"<?xml version="1.0"?>
<A v="1 &amp; 2"><B>x &lt; y</B><B>two</B><C/></A>"#,
        )
        .unwrap();

        assert_eq!(root.name, "A");
        assert_eq!(root.attr("v"), Some("1 & 2"));
        assert_eq!(root.children_named("B").count(), 2);
        assert_eq!(root.text_of("B"), "x < y");
        assert!(root.child("C").is_some());
        assert_eq!(root.text_of("Missing"), "");
        assert!(root.child_or_empty("Missing").children.is_empty());
    }

    #[test]
    fn test_cdata_is_text() {
        let root = parse("<A><B><![CDATA[<raw> & co]]></B></A>").unwrap();
        assert_eq!(root.text_of("B"), "<raw> & co");
    }

    #[test]
    fn test_unclosed_element_fails() {
        assert!(parse("<A><B>text</B>").is_err());
    }

    #[test]
    fn test_mismatched_end_fails() {
        assert!(parse("<A><B></C></A>").is_err());
    }

    #[test]
    fn test_empty_document_has_no_root() {
        assert!(matches!(parse("   "), Err(XmlError::EmptyDocument)));
    }
}
