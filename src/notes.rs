//! `Note:` comments collected from the raw XML of every loaded document.
//!
//! Comments are not part of the schema model, so they are read from the
//! element trees directly. A note belongs to the closest enclosing
//! `EntityType`, `ComplexType` or `EnumType`; failing that, to the
//! enclosing `Schema` itself, which is recorded with an empty type name.

use std::collections::BTreeMap;

use crate::csdl::DocumentSet;
use crate::xml::{Element, Node};

const NOTE_MARKER: &str = "note:";
const TYPE_ELEMENTS: [&str; 3] = ["EntityType", "ComplexType", "EnumType"];

/// `(namespace, type name)` to the notes written against it, in document order.
///
/// Iteration is sorted by namespace and then by name.
#[derive(Debug, Default, Clone)]
pub struct NoteIndex {
    notes: BTreeMap<(String, String), Vec<String>>,
}

impl NoteIndex {
    pub fn scan(documents: &DocumentSet) -> Self {
        let mut index = Self::default();
        for document in documents.documents() {
            index.scan_element(&document.root, None, None);
        }
        index
    }

    fn scan_element(&mut self, element: &Element, namespace: Option<&str>, owner: Option<&str>) {
        let namespace = match element.name.as_str() {
            "Schema" => element.attr("Namespace"),
            _ => namespace,
        };
        let owner = if TYPE_ELEMENTS.contains(&element.name.as_str()) {
            element.attr("Name").or(owner)
        } else {
            owner
        };

        for child in &element.children {
            match child {
                Node::Element(child) => self.scan_element(child, namespace, owner),
                Node::Comment(text) => {
                    if let (Some(namespace), Some(note)) = (namespace, note_text(text)) {
                        self.push(namespace, owner.unwrap_or(""), note);
                    }
                }
            }
        }
    }

    pub fn push(&mut self, namespace: &str, name: &str, note: impl Into<String>) {
        self.notes
            .entry((namespace.to_string(), name.to_string()))
            .or_default()
            .push(note.into());
    }

    pub fn get(&self, namespace: &str, name: &str) -> Option<&[String]> {
        self.notes
            .get(&(namespace.to_string(), name.to_string()))
            .map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &[String])> {
        self.notes
            .iter()
            .map(|((ns, name), notes)| (ns.as_str(), name.as_str(), notes.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

fn note_text(comment: &str) -> Option<&str> {
    let trimmed = comment.trim();
    let head = trimmed.get(..NOTE_MARKER.len())?;
    head.eq_ignore_ascii_case(NOTE_MARKER).then_some(trimmed)
}
