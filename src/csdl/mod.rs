//! A small OData CSDL model: enough of the EDM to draw class diagrams.

mod load;
mod model;
mod parser;
mod resolve;
mod types;

pub use load::{DocumentSet, LoadedDocument};
pub use model::Model;
pub use resolve::{Document, FsResolver, MemoryResolver, ReferenceResolver, is_absolute_uri};
pub use types::{
    ContainerMember, EntityContainer, EnumType, Kind, MemberKind, Navigation, Operation,
    Property, SchemaType, StructuredType, TypeId, TypeKind, TypeRef, local_name,
};
