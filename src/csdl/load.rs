//! Loading a primary document and everything it references.

use std::collections::{HashSet, VecDeque};
use std::fs;

use log::debug;

use super::parser::{RawDocument, RawReference, read_document};
use super::resolve::{Document, ReferenceResolver};
use crate::error::{ErrorSink, ModelError};
use crate::xml::{Element, parse_document};

/// Standard vocabularies are built into every consumer and carry no types.
const VOCABULARY_PREFIX: &str = "Org.OData.";

/// One document after XML parsing.
#[derive(Debug)]
pub struct LoadedDocument {
    pub source: Document,
    pub root: Element,
    pub(crate) raw: RawDocument,
}

/// The primary document followed by every document reachable from it.
#[derive(Debug)]
pub struct DocumentSet {
    documents: Vec<LoadedDocument>,
    unresolved_references: bool,
}

impl DocumentSet {
    /// Parse `primary` and, transitively, each document it references.
    ///
    /// References that cannot be resolved are recorded in `sink` as warnings
    /// and leave their namespaces unresolved. Malformed XML or CSDL in any
    /// loaded document fails the whole load.
    pub fn load(
        primary: Document,
        resolver: &dyn ReferenceResolver,
        sink: &mut ErrorSink,
    ) -> Result<Self, ModelError> {
        let mut documents = Vec::new();
        let mut issues = Vec::new();
        let mut unresolved_references = false;
        let mut seen = HashSet::new();
        seen.insert(document_key(&primary));

        let mut queue = VecDeque::from([primary]);
        while let Some(source) = queue.pop_front() {
            debug!(document = source.name.as_str(); "Loading schema document");
            let root = parse_document(&source.text).map_err(|err| ModelError::Xml {
                document: source.name.clone(),
                source: err,
            })?;
            let raw = read_document(&root, &source.name, &mut issues);

            for reference in raw.references.iter().filter(|r| !is_vocabulary(r)) {
                match resolver.resolve(&source, &reference.uri) {
                    Ok(referenced) => {
                        if seen.insert(document_key(&referenced)) {
                            queue.push_back(referenced);
                        }
                    }
                    Err(err) => {
                        unresolved_references = true;
                        sink.warning(format!("{}: {err}", source.name));
                    }
                }
            }

            documents.push(LoadedDocument { source, root, raw });
        }

        if !issues.is_empty() {
            return Err(ModelError::Invalid(issues));
        }
        Ok(Self {
            documents,
            unresolved_references,
        })
    }

    pub fn primary(&self) -> &LoadedDocument {
        &self.documents[0]
    }

    pub fn documents(&self) -> &[LoadedDocument] {
        &self.documents
    }

    pub fn has_unresolved_references(&self) -> bool {
        self.unresolved_references
    }
}

fn is_vocabulary(reference: &RawReference) -> bool {
    !reference.includes.is_empty()
        && reference
            .includes
            .iter()
            .all(|i| i.namespace.starts_with(VOCABULARY_PREFIX))
}

/// Identity used to load each document once, which also breaks reference cycles.
fn document_key(document: &Document) -> String {
    let on_disk = document
        .base_dir
        .as_ref()
        .map(|dir| dir.join(document.file_name()))
        .and_then(|path| fs::canonicalize(path).ok());
    match on_disk {
        Some(path) => path.display().to_string(),
        None => document.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csdl::resolve::MemoryResolver;

    fn edmx(references: &str, schemas: &str) -> String {
        format!(
            r#"<edmx:Edmx Version="4.0" xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx">
                {references}
                <edmx:DataServices>{schemas}</edmx:DataServices>
            </edmx:Edmx>"#
        )
    }

    #[test]
    fn vocabulary_references_are_not_resolved() {
        let text = edmx(
            r#"<edmx:Reference Uri="https://oasis-tcs.github.io/odata-vocabularies/vocabularies/Org.OData.Core.V1.xml">
                 <edmx:Include Alias="Core" Namespace="Org.OData.Core.V1"/>
               </edmx:Reference>"#,
            r#"<Schema Namespace="ns"/>"#,
        );
        let mut sink = ErrorSink::new();
        let set = DocumentSet::load(
            Document::new("main.xml", text),
            &MemoryResolver::new(),
            &mut sink,
        )
        .unwrap();
        assert!(sink.is_empty(), "{:?}", sink.entries());
        assert!(!set.has_unresolved_references());
        assert_eq!(set.documents().len(), 1);
    }

    #[test]
    fn unresolvable_reference_is_a_warning() {
        let text = edmx(
            r#"<edmx:Reference Uri="missing.xml"><edmx:Include Namespace="other"/></edmx:Reference>"#,
            r#"<Schema Namespace="ns"/>"#,
        );
        let mut sink = ErrorSink::new();
        let set = DocumentSet::load(
            Document::new("main.xml", text),
            &MemoryResolver::new(),
            &mut sink,
        )
        .unwrap();
        assert!(!sink.has_errors());
        assert_eq!(sink.warnings().count(), 1);
        assert!(set.has_unresolved_references());
    }

    #[test]
    fn reference_cycles_load_each_document_once() {
        let a = edmx(
            r#"<edmx:Reference Uri="b.xml"><edmx:Include Namespace="b"/></edmx:Reference>"#,
            r#"<Schema Namespace="a"/>"#,
        );
        let b = edmx(
            r#"<edmx:Reference Uri="a.xml"><edmx:Include Namespace="a"/></edmx:Reference>"#,
            r#"<Schema Namespace="b"/>"#,
        );
        let resolver = MemoryResolver::new().with("a.xml", a.clone()).with("b.xml", b);
        let mut sink = ErrorSink::new();
        let set = DocumentSet::load(Document::new("a.xml", a), &resolver, &mut sink).unwrap();
        assert_eq!(set.documents().len(), 2);
        assert!(sink.is_empty());
    }

    #[test]
    fn malformed_xml_fails_the_load() {
        let mut sink = ErrorSink::new();
        let err = DocumentSet::load(
            Document::new("main.xml", "<edmx:Edmx><oops></edmx:Edmx>"),
            &MemoryResolver::new(),
            &mut sink,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::Xml { .. }), "{err:?}");
    }

    #[test]
    fn structural_problems_in_referenced_documents_fail_the_load() {
        let main = edmx(
            r#"<edmx:Reference Uri="b.xml"><edmx:Include Namespace="b"/></edmx:Reference>"#,
            r#"<Schema Namespace="a"/>"#,
        );
        let broken = edmx("", r#"<Schema Namespace="b"><EntityType/></Schema>"#);
        let resolver = MemoryResolver::new().with("b.xml", broken);
        let mut sink = ErrorSink::new();
        let err = DocumentSet::load(Document::new("main.xml", main), &resolver, &mut sink)
            .unwrap_err();
        let ModelError::Invalid(issues) = err else {
            panic!("expected invalid model");
        };
        assert!(issues[0].starts_with("b.xml:"), "{issues:?}");
    }
}
