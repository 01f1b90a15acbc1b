//! Generate PlantUML class diagrams from OData CSDL schema documents.
//!
//! ```no_run
//! use csdl_diagram::{Document, FsResolver, GeneratorOptions, PlantConverter};
//!
//! let document = Document::from_path("schemas/model.xml")?;
//! let conversion = PlantConverter::new(GeneratorOptions::default()).convert(document, &FsResolver);
//! println!("{}", conversion.diagram);
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod cli;
pub mod csdl;
pub mod error;
pub mod notes;
pub mod options;
pub mod plant;
pub mod render;
mod xml;

pub use csdl::{Document, FsResolver, MemoryResolver, ReferenceResolver};
pub use error::{ErrorSink, GenerationError, ModelError, ResolveError, Severity};
pub use notes::NoteIndex;
pub use options::{ConfigError, GeneratorOptions};
pub use plant::{Conversion, FAILURE_MESSAGE, PlantConverter, emit_plant_diagram};
pub use render::{RenderError, render_svg};
