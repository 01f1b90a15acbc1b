use std::collections::HashMap;

use log::debug;

use super::naming::{Cardinality, Naming};
use super::worklist::Worklist;
use super::writer::CodeWriter;
use crate::csdl::{
    EnumType, Kind, Model, Operation, StructuredType, TypeId, TypeKind, TypeRef, local_name,
};
use crate::notes::NoteIndex;
use crate::options::GeneratorOptions;

/// Root type whose identity property is replaced by a synthetic `id`.
const ROOT_ENTITY: &str = "entity";
const NAMESPACE_INDENT: &str = "  ";

/// Writes the PlantUML text for one model.
pub struct DiagramEmitter<'a> {
    model: &'a Model,
    options: &'a GeneratorOptions,
    notes: &'a NoteIndex,
    naming: Naming,
    bound: HashMap<TypeId, Vec<&'a Operation>>,
    out: CodeWriter,
}

impl<'a> DiagramEmitter<'a> {
    pub fn new(model: &'a Model, options: &'a GeneratorOptions, notes: &'a NoteIndex) -> Self {
        let mut bound: HashMap<TypeId, Vec<&'a Operation>> = HashMap::new();
        for (id, operation) in model.bound_operations() {
            bound.entry(id).or_default().push(operation);
        }
        Self {
            model,
            options,
            notes,
            naming: Naming::for_model(model, options),
            bound,
            out: CodeWriter::new(),
        }
    }

    pub fn emit(mut self, file_name: &str) -> String {
        self.out.line("@startuml");
        self.out.line("skinparam classAttributeIconSize 0");
        self.out.line("hide private members");
        self.out.line(format!("title API Entity Diagram for {file_name}"));
        self.out.blank();

        self.emit_container();

        let mut worklist = Worklist::seeded(self.model, self.options);
        while let Some(id) = worklist.next_type() {
            debug!(type_name = self.model.get(id).full_name(); "Emitting type");
            self.emit_type(id);
            self.out.blank();
        }

        self.emit_notes(&worklist);
        self.out.line("@enduml");
        self.out.finish()
    }

    fn emit_container(&mut self) {
        let model = self.model;
        let Some(container) = model.container() else {
            return;
        };
        let name = self.naming.qualify(&container.namespace, &container.name);

        let singletons = container.singletons().map(|m| (m, "1..1"));
        let sets = container.entity_sets().map(|m| (m, "0..*"));
        let mut members = Vec::new();
        for (member, cardinality) in singletons.chain(sets) {
            members.push(format!(
                "+{}: {}",
                member.name,
                self.naming.type_ref(model, &member.entity_type, None)
            ));
            if let Some(target) = self.visible_target(&member.entity_type) {
                self.out.line(format!(
                    "{name} .. \"{cardinality}\" {}: {}",
                    self.naming.type_name(model, target),
                    member.name
                ));
            }
        }

        self.out
            .line(format!("class {name} <<(S,white)entityContainer>> #LightPink {{"));
        for member in members {
            self.out.line(member);
        }
        self.out.line("}");
        self.out.blank();
    }

    fn emit_type(&mut self, id: TypeId) {
        let model = self.model;
        match &model.get(id).kind {
            TypeKind::Entity(structured) => {
                self.emit_structured(id, structured, Kind::Entity);
                self.emit_navigation(id, structured);
            }
            TypeKind::Complex(structured) => self.emit_structured(id, structured, Kind::Complex),
            TypeKind::Enum(enumeration) => self.emit_enum(id, enumeration),
        }
    }

    fn emit_structured(&mut self, id: TypeId, structured: &StructuredType, kind: Kind) {
        let model = self.model;
        let namespace = model.get(id).namespace.as_str();
        let name = self.naming.type_name(model, id);

        let stereotype = match (kind, structured.is_abstract) {
            (Kind::Entity, false) => "<<(N,white)entity>> #PaleGreen",
            (Kind::Entity, true) => "<<entity>> #PaleGreen",
            _ => "<<complexType>> #Skyblue",
        };
        let prefix = if structured.is_abstract { "abstract " } else { "" };
        let extends = structured
            .base
            .as_ref()
            .and_then(|base| self.visible_target(base))
            .map(|base| format!(" extends {}", self.naming.type_name(model, base)))
            .unwrap_or_default();
        self.out
            .line(format!("{prefix}class {name} {stereotype}{extends} {{"));

        if kind == Kind::Entity && self.replaces_root_identity(structured) {
            self.out.line("+id: String");
        }

        let mut usages = Vec::new();
        for property in &structured.properties {
            let collection = property.ty.is_collection();
            let cardinality = Cardinality::new(property.nullable, collection);
            // Parentheses in a collection type would otherwise read as a method.
            let field = if collection { "{field} " } else { "" };
            let exposure = if property.is_navigation() { "-" } else { "+" };
            let contained = if property.contains_target() { "*" } else { "" };
            self.out.line(format!(
                "{field}{exposure}{}: {}{}{contained}",
                property.name,
                self.naming.type_ref(model, &property.ty, Some(namespace)),
                cardinality.annotation().unwrap_or_default(),
            ));

            if let Some(target) = self.visible_target(&property.ty) {
                if matches!(model.get(target).kind(), Kind::Complex | Kind::Enum) {
                    usages.push(format!(
                        "{name} +--> \"[{cardinality}]\" {}: {}",
                        self.naming.type_name(model, target),
                        property.name
                    ));
                }
            }
        }

        let operations = self.bound.get(&id).cloned().unwrap_or_default();
        for operation in operations {
            match &operation.return_type {
                Some(returns) => self.out.line(format!(
                    "+{}(): {}",
                    operation.name,
                    self.naming.type_ref(model, returns, Some(namespace))
                )),
                None => self.out.line(format!("+{}()", operation.name)),
            }
        }
        self.out.line("}");

        for usage in usages {
            self.out.line(usage);
        }
    }

    fn emit_navigation(&mut self, id: TypeId, structured: &StructuredType) {
        let model = self.model;
        let owner = self.naming.type_name(model, id);
        for property in structured.properties.iter().filter(|p| p.is_navigation()) {
            let Some(target) = self.visible_target(&property.ty) else {
                continue;
            };
            let cardinality = Cardinality::new(property.nullable, property.ty.is_collection());
            let glyph = if property.contains_target() { "*" } else { "" };
            self.out.line(format!(
                "{owner} {glyph}--> \"{cardinality}\" {}: {}",
                self.naming.type_name(model, target),
                property.name
            ));
        }
    }

    fn emit_enum(&mut self, id: TypeId, enumeration: &EnumType) {
        let name = self.naming.type_name(self.model, id);
        self.out.line(format!("enum {name} <<enum>> #GoldenRod {{"));
        for member in &enumeration.members {
            self.out.line(member);
        }
        self.out.line("}");
    }

    /// Notes sorted by namespace and type, grouped per namespace when qualified.
    fn emit_notes(&mut self, worklist: &Worklist<'_>) {
        let model = self.model;
        let notes = self.notes;
        let mut open_namespace: Option<&str> = None;
        let mut root_notes = 0;

        for (namespace, name, lines) in notes.iter() {
            let attached = if name.is_empty() {
                if !model.namespaces().iter().any(|ns| ns == namespace) {
                    continue;
                }
                false
            } else {
                match model.find(namespace, name) {
                    Some(id) if worklist.is_emitted(id) => true,
                    _ => continue,
                }
            };

            if self.naming.is_qualified() && open_namespace != Some(namespace) {
                if open_namespace.is_some() {
                    self.close_namespace();
                }
                self.out.line(format!("namespace {namespace} {{"));
                self.out.push_indent(NAMESPACE_INDENT);
                open_namespace = Some(namespace);
            }

            if attached {
                self.out.line(format!("note top of {name}"));
            } else {
                root_notes += 1;
                self.out.line(format!("note as RootNoteR{root_notes}"));
            }
            for text in lines.iter().flat_map(|note| note.lines()) {
                self.out.line(text.trim());
            }
            self.out.line("end note");
        }

        if open_namespace.is_some() {
            self.close_namespace();
        }
    }

    fn close_namespace(&mut self) {
        self.out.pop_indent();
        self.out.line("}");
    }

    /// The named element type of `ty`, unless it is skip-listed.
    fn visible_target(&self, ty: &TypeRef) -> Option<TypeId> {
        ty.named()
            .filter(|&id| !self.options.skips(&self.model.get(id).name))
    }

    fn replaces_root_identity(&self, structured: &StructuredType) -> bool {
        if !self.options.skips(ROOT_ENTITY) {
            return false;
        }
        match structured.base.as_ref().map(TypeRef::element) {
            None => true,
            Some(TypeRef::Named(id)) => self.model.get(*id).name.eq_ignore_ascii_case(ROOT_ENTITY),
            Some(TypeRef::Scalar(name) | TypeRef::Unresolved(name)) => {
                local_name(name).eq_ignore_ascii_case(ROOT_ENTITY)
            }
            Some(TypeRef::Collection(_)) => false,
        }
    }
}
