//! Locating documents named by `edmx:Reference` elements.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ResolveError;

/// A raw schema document and where it came from.
#[derive(Debug, Clone)]
pub struct Document {
    /// Display name, usually the path the document was read from.
    pub name: String,
    /// Directory relative references are resolved against.
    pub base_dir: Option<PathBuf>,
    pub text: String,
}

impl Document {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_dir: None,
            text: text.into(),
        }
    }

    /// Read a document from disk, remembering its directory.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Ok(Self {
            name: path.display().to_string(),
            base_dir: path.parent().map(Path::to_path_buf),
            text,
        })
    }

    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// File name part of [`Document::name`].
    pub fn file_name(&self) -> &str {
        Path::new(&self.name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.name)
    }
}

/// Turns a reference URI into the document it names.
pub trait ReferenceResolver {
    /// Resolve `uri`, as written in `from`, to a document.
    fn resolve(&self, from: &Document, uri: &str) -> Result<Document, ResolveError>;
}

/// True for `scheme://...` and `scheme:...` style URIs, false for paths.
pub fn is_absolute_uri(uri: &str) -> bool {
    let Some((scheme, _)) = uri.split_once(':') else {
        return false;
    };
    // A single letter before the colon is a Windows drive, still a path.
    scheme.len() > 1
        && scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Resolves relative paths against the referencing document's directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsResolver;

impl ReferenceResolver for FsResolver {
    fn resolve(&self, from: &Document, uri: &str) -> Result<Document, ResolveError> {
        if is_absolute_uri(uri) || Path::new(uri).is_absolute() {
            return Err(ResolveError::AbsoluteUri(uri.to_string()));
        }
        let Some(dir) = &from.base_dir else {
            return Err(ResolveError::NoDirectoryContext(uri.to_string()));
        };
        let path = dir.join(uri);
        Document::from_path(&path).map_err(|source| ResolveError::Io { path, source })
    }
}

/// Serves documents from memory, keyed by the reference URI.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    documents: HashMap<String, String>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, uri: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(uri, text);
        self
    }

    pub fn insert(&mut self, uri: impl Into<String>, text: impl Into<String>) {
        self.documents.insert(uri.into(), text.into());
    }
}

impl ReferenceResolver for MemoryResolver {
    fn resolve(&self, _from: &Document, uri: &str) -> Result<Document, ResolveError> {
        if is_absolute_uri(uri) {
            return Err(ResolveError::AbsoluteUri(uri.to_string()));
        }
        self.documents
            .get(uri)
            .map(|text| Document::new(uri, text.clone()))
            .ok_or_else(|| ResolveError::NotFound(uri.to_string()))
    }
}
