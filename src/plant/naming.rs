use std::fmt;

use crate::csdl::{Model, TypeId, TypeRef, local_name};
use crate::options::GeneratorOptions;

const EDM_NAMESPACE: &str = "Edm";

/// How type names are spelled in the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Naming {
    qualified: bool,
}

impl Naming {
    pub fn new(qualified: bool) -> Self {
        Self { qualified }
    }

    /// Qualify when names could collide or when the namespace asks for it.
    ///
    /// A model spanning several namespaces, or one with references that did
    /// not resolve, is always qualified. A single namespace is qualified only
    /// when it starts with one of the configured prefixes.
    pub fn for_model(model: &Model, options: &GeneratorOptions) -> Self {
        let qualified = match model.namespaces() {
            [] => false,
            [only] => model.has_unresolved_references() || options.qualifies_namespace(only),
            _ => true,
        };
        Self { qualified }
    }

    pub fn is_qualified(&self) -> bool {
        self.qualified
    }

    pub fn qualify(&self, namespace: &str, name: &str) -> String {
        if self.qualified {
            format!("{namespace}.{name}")
        } else {
            name.to_string()
        }
    }

    pub fn type_name(&self, model: &Model, id: TypeId) -> String {
        let ty = model.get(id);
        self.qualify(&ty.namespace, &ty.name)
    }

    /// Spell a type reference, collection wrapper included.
    ///
    /// Targets in `owner_namespace` are written without their namespace.
    pub fn type_ref(&self, model: &Model, ty: &TypeRef, owner_namespace: Option<&str>) -> String {
        match ty {
            TypeRef::Collection(inner) => {
                format!("Collection({})", self.type_ref(model, inner, owner_namespace))
            }
            TypeRef::Named(id) => {
                let target = model.get(*id);
                if owner_namespace == Some(target.namespace.as_str()) {
                    target.name.clone()
                } else {
                    self.qualify(&target.namespace, &target.name)
                }
            }
            TypeRef::Scalar(name) | TypeRef::Unresolved(name) => match name.rsplit_once('.') {
                Some((EDM_NAMESPACE, local)) => local.to_string(),
                Some((namespace, local)) if owner_namespace == Some(namespace) => local.to_string(),
                Some(_) if self.qualified => name.clone(),
                _ => local_name(name).to_string(),
            },
        }
    }
}

/// Multiplicity of a property or relationship end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cardinality {
    pub optional: bool,
    pub many: bool,
}

impl Cardinality {
    pub fn new(nullable: bool, collection: bool) -> Self {
        Self {
            optional: nullable,
            many: collection,
        }
    }

    pub fn min(&self) -> &'static str {
        if self.optional { "0" } else { "1" }
    }

    pub fn max(&self) -> &'static str {
        if self.many { "*" } else { "1" }
    }

    /// The ` [min..max]` suffix of a property line, only shown for optional properties.
    pub fn annotation(&self) -> Option<String> {
        self.optional.then(|| format!(" [{self}]"))
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.min(), self.max())
    }
}
