//! CSDL to PlantUML conversion.

mod emit;
mod naming;
mod worklist;
mod writer;

pub use emit::DiagramEmitter;
pub use naming::{Cardinality, Naming};
pub use worklist::Worklist;
pub use writer::CodeWriter;

use log::info;

use crate::csdl::{Document, DocumentSet, FsResolver, Model, ReferenceResolver};
use crate::error::{ErrorSink, ModelError};
use crate::notes::NoteIndex;
use crate::options::GeneratorOptions;

/// Returned in place of the diagram whenever an error was recorded.
pub const FAILURE_MESSAGE: &str = "There were errors generating the PlantUML file.";

/// Result of one conversion run.
#[derive(Debug)]
pub struct Conversion {
    pub diagram: String,
    pub errors: ErrorSink,
}

impl Conversion {
    pub fn is_success(&self) -> bool {
        !self.errors.has_errors()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlantConverter {
    options: GeneratorOptions,
}

impl PlantConverter {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Convert `document`, loading its references through `resolver`.
    ///
    /// Problems are reported through [`Conversion::errors`]; when any of them
    /// is an error the diagram is [`FAILURE_MESSAGE`].
    pub fn convert(&self, document: Document, resolver: &dyn ReferenceResolver) -> Conversion {
        let file_name = document.file_name().to_string();
        info!(document = file_name.clone(); "Converting schema to PlantUML");

        let mut errors = ErrorSink::new();
        let diagram = match self.generate(document, &file_name, resolver, &mut errors) {
            Ok(diagram) => diagram,
            Err(err) => {
                errors.error(err.to_string());
                String::new()
            }
        };
        let diagram = if errors.has_errors() {
            FAILURE_MESSAGE.to_string()
        } else {
            diagram
        };

        info!(
            document = file_name,
            warnings = errors.warnings().count(),
            errors = errors.errors().count();
            "Conversion finished"
        );
        Conversion { diagram, errors }
    }

    fn generate(
        &self,
        document: Document,
        file_name: &str,
        resolver: &dyn ReferenceResolver,
        errors: &mut ErrorSink,
    ) -> Result<String, ModelError> {
        let documents = DocumentSet::load(document, resolver, errors)?;
        let notes = NoteIndex::scan(&documents);
        let model = Model::build(&documents)?;
        Ok(DiagramEmitter::new(&model, &self.options, &notes).emit(file_name))
    }
}

/// Convert CSDL text with default options.
///
/// References are resolved on disk relative to `file_name`'s directory.
pub fn emit_plant_diagram(csdl: &str, file_name: &str) -> String {
    let mut document = Document::new(file_name, csdl);
    if let Some(dir) = std::path::Path::new(file_name).parent() {
        document = document.with_base_dir(dir);
    }
    PlantConverter::default()
        .convert(document, &FsResolver)
        .diagram
}
