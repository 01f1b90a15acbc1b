//! Minimal element tree over `quick-xml` events.
//!
//! Only elements, attributes and comments are kept. Text content is not
//! needed by anything that reads CSDL, so it is dropped while reading.

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::reader::Reader as XmlReader;

use crate::error::XmlError;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Local name, namespace prefix stripped (`edmx:Edmx` becomes `Edmx`).
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    /// Look up an attribute by its local name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(e) => Some(e),
            Node::Comment(_) => None,
        })
    }

    pub fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.name == name)
    }

    pub fn first_named(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }
}

/// Read `text` into a tree rooted at its document element.
pub fn parse_document(text: &str) -> Result<Element, XmlError> {
    let mut reader = XmlReader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut buf = Vec::new();

    loop {
        let position = reader.buffer_position();
        match reader.read_event_into(&mut buf) {
            Ok(XmlEvent::Start(ref e)) => stack.push(start_element(e)),
            Ok(XmlEvent::Empty(ref e)) => {
                let element = start_element(e);
                attach(&mut stack, &mut root, element, position)?;
            }
            Ok(XmlEvent::End(_)) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element, position)?;
                }
            }
            Ok(XmlEvent::Comment(ref e)) => {
                let text = String::from_utf8_lossy(e).to_string();
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Comment(text));
                }
            }
            Ok(XmlEvent::Eof) => break,
            Err(e) => {
                return Err(XmlError::Syntax {
                    position: reader.error_position(),
                    message: e.to_string(),
                });
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.pop() {
        return Err(XmlError::Unclosed(open.name));
    }
    root.ok_or(XmlError::Empty)
}

fn start_element(e: &BytesStart) -> Element {
    let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
    let attributes = e
        .attributes()
        .filter_map(|a| a.ok())
        .map(|a| {
            let raw = String::from_utf8_lossy(&a.value).to_string();
            let value = match unescape(&raw) {
                Ok(unescaped) => unescaped.into_owned(),
                Err(_) => raw,
            };
            (
                String::from_utf8_lossy(a.key.local_name().as_ref()).to_string(),
                value,
            )
        })
        .collect();

    Element {
        name,
        attributes,
        children: Vec::new(),
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    position: u64,
) -> Result<(), XmlError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
        return Ok(());
    }
    if root.is_some() {
        return Err(XmlError::Syntax {
            position,
            message: format!("unexpected second root element <{}>", element.name),
        });
    }
    *root = Some(element);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_namespace_prefixes() {
        let root = parse_document(
            r#"<edmx:Edmx xmlns:edmx="urn:x" Version="4.0"><edmx:DataServices/></edmx:Edmx>"#,
        )
        .unwrap();
        assert_eq!(root.name, "Edmx");
        assert_eq!(root.attr("Version"), Some("4.0"));
        assert!(root.first_named("DataServices").is_some());
    }

    #[test]
    fn keeps_comments_in_document_order() {
        let root = parse_document("<a><!-- one --><b/><!-- two --></a>").unwrap();
        assert_eq!(root.children.len(), 3);
        assert_eq!(root.children[0], Node::Comment(" one ".to_string()));
        assert!(matches!(root.children[1], Node::Element(ref e) if e.name == "b"));
        assert_eq!(root.children[2], Node::Comment(" two ".to_string()));
    }

    #[test]
    fn unescapes_attribute_values() {
        let root = parse_document(r#"<a Name="x&amp;y"/>"#).unwrap();
        assert_eq!(root.attr("Name"), Some("x&y"));
    }

    #[test]
    fn mismatched_end_tag_is_an_error() {
        assert!(parse_document("<a><b></a>").is_err());
    }

    #[test]
    fn unclosed_element_is_an_error() {
        assert!(parse_document("<a><b>").is_err());
    }

    #[test]
    fn empty_input_has_no_root() {
        assert!(matches!(parse_document("   "), Err(XmlError::Empty)));
    }
}
