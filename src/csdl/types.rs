/// Index of a declared type inside a [`Model`](super::Model).
///
/// Ids are assigned in declaration order, primary document first, so
/// ordering by id is the same as ordering by where the type was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub(crate) usize);

impl TypeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The three kinds of declared type that can show up in a diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Entity,
    Complex,
    Enum,
}

impl Kind {
    pub const ALL: [Kind; 3] = [Kind::Entity, Kind::Complex, Kind::Enum];
}

/// A declared type together with where it lives.
#[derive(Debug, Clone)]
pub struct SchemaType {
    pub namespace: String,
    pub name: String,
    pub kind: TypeKind,
}

impl SchemaType {
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    pub fn kind(&self) -> Kind {
        match self.kind {
            TypeKind::Entity(_) => Kind::Entity,
            TypeKind::Complex(_) => Kind::Complex,
            TypeKind::Enum(_) => Kind::Enum,
        }
    }

    pub fn as_structured(&self) -> Option<&StructuredType> {
        match &self.kind {
            TypeKind::Entity(s) | TypeKind::Complex(s) => Some(s),
            TypeKind::Enum(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TypeKind {
    Entity(StructuredType),
    Complex(StructuredType),
    Enum(EnumType),
}

/// Shared shape of entity and complex types.
#[derive(Debug, Clone, Default)]
pub struct StructuredType {
    pub base: Option<TypeRef>,
    pub is_abstract: bool,
    /// Declared properties in document order.
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Default)]
pub struct EnumType {
    pub members: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    pub ty: TypeRef,
    pub nullable: bool,
    /// Present only for navigation properties.
    pub navigation: Option<Navigation>,
}

impl Property {
    pub fn is_navigation(&self) -> bool {
        self.navigation.is_some()
    }

    pub fn contains_target(&self) -> bool {
        self.navigation.is_some_and(|n| n.contains_target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    pub contains_target: bool,
}

/// A resolved reference to a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// `Edm.*` primitives and type definitions, by qualified name.
    Scalar(String),
    Named(TypeId),
    Collection(Box<TypeRef>),
    /// A name the model could not bind, kept as written.
    Unresolved(String),
}

impl TypeRef {
    pub fn is_collection(&self) -> bool {
        matches!(self, TypeRef::Collection(_))
    }

    /// The element type with any collection wrappers removed.
    pub fn element(&self) -> &TypeRef {
        match self {
            TypeRef::Collection(inner) => inner.element(),
            other => other,
        }
    }

    pub fn named(&self) -> Option<TypeId> {
        match self.element() {
            TypeRef::Named(id) => Some(*id),
            _ => None,
        }
    }
}

/// A bound or unbound action or function.
#[derive(Debug, Clone)]
pub struct Operation {
    pub namespace: String,
    pub name: String,
    pub is_bound: bool,
    /// Type of the first parameter, the binding parameter for bound operations.
    pub binding: Option<TypeRef>,
    pub return_type: Option<TypeRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    EntitySet,
    Singleton,
}

#[derive(Debug, Clone)]
pub struct ContainerMember {
    pub name: String,
    pub kind: MemberKind,
    pub entity_type: TypeRef,
}

#[derive(Debug, Clone)]
pub struct EntityContainer {
    pub namespace: String,
    pub name: String,
    pub members: Vec<ContainerMember>,
}

impl EntityContainer {
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    pub fn singletons(&self) -> impl Iterator<Item = &ContainerMember> {
        self.members
            .iter()
            .filter(|m| m.kind == MemberKind::Singleton)
    }

    pub fn entity_sets(&self) -> impl Iterator<Item = &ContainerMember> {
        self.members
            .iter()
            .filter(|m| m.kind == MemberKind::EntitySet)
    }
}

/// Local part of a possibly qualified name (`a.b.C` becomes `C`).
pub fn local_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_unwraps_nested_collections() {
        let r = TypeRef::Collection(Box::new(TypeRef::Named(TypeId(3))));
        assert!(r.is_collection());
        assert_eq!(r.element(), &TypeRef::Named(TypeId(3)));
        assert_eq!(r.named(), Some(TypeId(3)));
    }

    #[test]
    fn scalars_have_no_named_target() {
        assert_eq!(TypeRef::Scalar("Edm.String".into()).named(), None);
        assert_eq!(TypeRef::Unresolved("x.Y".into()).named(), None);
    }

    #[test]
    fn local_name_takes_last_segment() {
        assert_eq!(local_name("microsoft.graph.user"), "user");
        assert_eq!(local_name("user"), "user");
    }
}
