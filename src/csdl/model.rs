//! The resolved, immutable schema model.

use std::collections::{HashMap, HashSet};

use super::load::DocumentSet;
use super::parser::{RawDocument, RawStructured, RawTypeKind};
use super::types::*;
use crate::error::ModelError;

const COLLECTION_PREFIX: &str = "Collection(";

/// Every type, operation and the entity container of a document set.
#[derive(Debug)]
pub struct Model {
    types: Vec<SchemaType>,
    lookup: HashMap<(String, String), TypeId>,
    derived: HashMap<TypeId, Vec<TypeId>>,
    entry: Vec<TypeId>,
    operations: Vec<Operation>,
    container: Option<EntityContainer>,
    namespaces: Vec<String>,
    unresolved_references: bool,
}

impl Model {
    /// Resolve all type names across `documents`.
    ///
    /// Names that do not bind become [`TypeRef::Unresolved`]; only duplicate
    /// declarations are treated as errors here.
    pub fn build(documents: &DocumentSet) -> Result<Self, ModelError> {
        let mut issues = Vec::new();
        let mut lookup = HashMap::new();
        let mut type_definitions = HashSet::new();
        let mut namespaces: Vec<String> = Vec::new();
        let mut pending = Vec::new();

        for (doc_index, loaded) in documents.documents().iter().enumerate() {
            for schema in &loaded.raw.schemas {
                if !namespaces.contains(&schema.namespace) {
                    namespaces.push(schema.namespace.clone());
                }
                for raw in &schema.types {
                    let key = (schema.namespace.clone(), raw.name.clone());
                    if lookup.contains_key(&key) {
                        issues.push(format!(
                            "{}: type '{}.{}' is declared more than once",
                            loaded.source.name, schema.namespace, raw.name
                        ));
                        continue;
                    }
                    lookup.insert(key, TypeId(pending.len()));
                    pending.push((doc_index, schema.namespace.as_str(), raw));
                }
                for name in &schema.type_definitions {
                    type_definitions.insert((schema.namespace.clone(), name.clone()));
                }
            }
        }
        if !issues.is_empty() {
            return Err(ModelError::Invalid(issues));
        }

        let scopes: Vec<NameScope> = documents
            .documents()
            .iter()
            .map(|loaded| NameScope {
                aliases: aliases(&loaded.raw),
                lookup: &lookup,
                type_definitions: &type_definitions,
            })
            .collect();

        let mut types = Vec::with_capacity(pending.len());
        let mut entry = Vec::new();
        for (index, (doc_index, namespace, raw)) in pending.iter().enumerate() {
            let scope = &scopes[*doc_index];
            let kind = match &raw.kind {
                RawTypeKind::Entity(s) => TypeKind::Entity(scope.structured(s)),
                RawTypeKind::Complex(s) => TypeKind::Complex(scope.structured(s)),
                RawTypeKind::Enum(members) => TypeKind::Enum(EnumType {
                    members: members.clone(),
                }),
            };
            if *doc_index == 0 {
                entry.push(TypeId(index));
            }
            types.push(SchemaType {
                namespace: namespace.to_string(),
                name: raw.name.clone(),
                kind,
            });
        }

        let mut derived: HashMap<TypeId, Vec<TypeId>> = HashMap::new();
        for (index, ty) in types.iter().enumerate() {
            if let Some(base) = ty
                .as_structured()
                .and_then(|s| s.base.as_ref())
                .and_then(TypeRef::named)
            {
                derived.entry(base).or_default().push(TypeId(index));
            }
        }

        let mut operations = Vec::new();
        let mut container = None;
        for (doc_index, loaded) in documents.documents().iter().enumerate() {
            let scope = &scopes[doc_index];
            for schema in &loaded.raw.schemas {
                for raw in &schema.operations {
                    operations.push(Operation {
                        namespace: schema.namespace.clone(),
                        name: raw.name.clone(),
                        is_bound: raw.is_bound,
                        binding: raw
                            .parameter_types
                            .first()
                            .filter(|_| raw.is_bound)
                            .map(|t| scope.resolve(t)),
                        return_type: raw.return_type.as_deref().map(|t| scope.resolve(t)),
                    });
                }
                if doc_index == 0 && container.is_none() {
                    container = schema.container.as_ref().map(|raw| EntityContainer {
                        namespace: schema.namespace.clone(),
                        name: raw.name.clone(),
                        members: raw
                            .members
                            .iter()
                            .map(|m| ContainerMember {
                                name: m.name.clone(),
                                kind: if m.singleton {
                                    MemberKind::Singleton
                                } else {
                                    MemberKind::EntitySet
                                },
                                entity_type: scope.resolve(&m.type_name),
                            })
                            .collect(),
                    });
                }
            }
        }

        Ok(Self {
            types,
            lookup,
            derived,
            entry,
            operations,
            container,
            namespaces,
            unresolved_references: documents.has_unresolved_references(),
        })
    }

    pub fn get(&self, id: TypeId) -> &SchemaType {
        &self.types[id.0]
    }

    pub fn types(&self) -> impl Iterator<Item = (TypeId, &SchemaType)> {
        self.types.iter().enumerate().map(|(i, t)| (TypeId(i), t))
    }

    pub fn find(&self, namespace: &str, name: &str) -> Option<TypeId> {
        self.lookup
            .get(&(namespace.to_string(), name.to_string()))
            .copied()
    }

    /// Types declared directly in the primary document.
    pub fn entry_types(&self) -> &[TypeId] {
        &self.entry
    }

    /// Every type, in any loaded document, whose base type is `id`.
    pub fn derived_types(&self, id: TypeId) -> &[TypeId] {
        self.derived.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Bound operations paired with the structured type they bind to.
    ///
    /// Operations bound to a collection are not attached to any type.
    pub fn bound_operations(&self) -> impl Iterator<Item = (TypeId, &Operation)> {
        self.operations.iter().filter_map(|op| match op.binding {
            Some(TypeRef::Named(id)) if op.is_bound && self.get(id).as_structured().is_some() => {
                Some((id, op))
            }
            _ => None,
        })
    }

    pub fn container(&self) -> Option<&EntityContainer> {
        self.container.as_ref()
    }

    /// Declared namespaces in load order, primary document first.
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn has_unresolved_references(&self) -> bool {
        self.unresolved_references
    }
}

fn aliases(raw: &RawDocument) -> HashMap<String, String> {
    let mut aliases = HashMap::new();
    for schema in &raw.schemas {
        if let Some(alias) = &schema.alias {
            aliases.insert(alias.clone(), schema.namespace.clone());
        }
    }
    for include in raw.references.iter().flat_map(|r| &r.includes) {
        if let Some(alias) = &include.alias {
            aliases.insert(alias.clone(), include.namespace.clone());
        }
    }
    aliases
}

/// Name resolution as seen from one document.
struct NameScope<'a> {
    aliases: HashMap<String, String>,
    lookup: &'a HashMap<(String, String), TypeId>,
    type_definitions: &'a HashSet<(String, String)>,
}

impl NameScope<'_> {
    fn resolve(&self, name: &str) -> TypeRef {
        let name = name.trim();
        if let Some(inner) = name
            .strip_prefix(COLLECTION_PREFIX)
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return TypeRef::Collection(Box::new(self.resolve(inner)));
        }

        let Some((qualifier, local)) = name.rsplit_once('.') else {
            return TypeRef::Unresolved(name.to_string());
        };
        if qualifier == "Edm" {
            return TypeRef::Scalar(name.to_string());
        }
        let namespace = self
            .aliases
            .get(qualifier)
            .map(String::as_str)
            .unwrap_or(qualifier);
        let key = (namespace.to_string(), local.to_string());
        if let Some(id) = self.lookup.get(&key) {
            TypeRef::Named(*id)
        } else if self.type_definitions.contains(&key) {
            TypeRef::Scalar(format!("{namespace}.{local}"))
        } else {
            TypeRef::Unresolved(name.to_string())
        }
    }

    fn structured(&self, raw: &RawStructured) -> StructuredType {
        StructuredType {
            base: raw.base.as_deref().map(|b| self.resolve(b)),
            is_abstract: raw.is_abstract,
            properties: raw
                .properties
                .iter()
                .map(|p| Property {
                    name: p.name.clone(),
                    ty: self.resolve(&p.type_name),
                    nullable: p.nullable,
                    navigation: p.navigation.map(|contains_target| Navigation { contains_target }),
                })
                .collect(),
        }
    }
}
