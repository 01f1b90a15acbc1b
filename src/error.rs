//! Error types and the diagnostic sink used during a conversion.
//!
//! Loading failures are typed with [`thiserror`]; everything that should
//! surface to the caller without aborting the run is recorded into an
//! [`ErrorSink`] as a [`GenerationError`].

use std::fmt;
use std::io;
use std::path::PathBuf;

use log::warn;
use thiserror::Error;

/// Failure to read a document as well-formed XML.
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("XML parse error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("document has no root element")]
    Empty,

    #[error("element <{0}> is never closed")]
    Unclosed(String),
}

/// Failure to locate a referenced document.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("absolute reference '{0}' is not supported, use a path relative to the referencing document")]
    AbsoluteUri(String),

    #[error("cannot resolve '{0}' because the referencing document has no directory")]
    NoDirectoryContext(String),

    #[error("referenced document '{0}' was not found")]
    NotFound(String),

    #[error("failed to read referenced document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure to build a schema model from the loaded documents.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to parse {document}: {source}")]
    Xml {
        document: String,
        #[source]
        source: XmlError,
    },

    #[error("invalid CSDL: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// The severity level of a [`GenerationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Suppresses the diagram output.
    Error,
    /// Recorded for the caller, output is still produced.
    Warning,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One recorded problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationError {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Accumulates warnings and errors for a single conversion run.
///
/// Only [`Severity::Error`] entries count towards [`ErrorSink::has_errors`];
/// the converter replaces its output with a fixed message when that is true.
#[derive(Debug, Default)]
pub struct ErrorSink {
    entries: Vec<GenerationError>,
    has_errors: bool,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Severity::Error, message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(message = message.as_str(); "Conversion warning");
        self.push(Severity::Warning, message);
    }

    fn push(&mut self, severity: Severity, message: String) {
        if severity.is_error() {
            self.has_errors = true;
        }
        self.entries.push(GenerationError { severity, message });
    }

    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    pub fn entries(&self) -> &[GenerationError] {
        &self.entries
    }

    pub fn warnings(&self) -> impl Iterator<Item = &GenerationError> {
        self.entries.iter().filter(|e| e.severity.is_warning())
    }

    pub fn errors(&self) -> impl Iterator<Item = &GenerationError> {
        self.entries.iter().filter(|e| e.severity.is_error())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
