//! Reads the CSDL element tree into raw, still unresolved declarations.

use crate::xml::Element;

pub(crate) const MISSING_WRAPPER: &str =
    "CSDL file is missing standard Edmx and Edmx:DataServices wrapper nodes.";

#[derive(Debug, Clone, Default)]
pub(crate) struct RawDocument {
    pub references: Vec<RawReference>,
    pub schemas: Vec<RawSchema>,
}

#[derive(Debug, Clone)]
pub(crate) struct RawReference {
    pub uri: String,
    pub includes: Vec<RawInclude>,
}

#[derive(Debug, Clone)]
pub(crate) struct RawInclude {
    pub namespace: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RawSchema {
    pub namespace: String,
    pub alias: Option<String>,
    pub types: Vec<RawType>,
    pub type_definitions: Vec<String>,
    pub operations: Vec<RawOperation>,
    pub container: Option<RawContainer>,
}

#[derive(Debug, Clone)]
pub(crate) struct RawType {
    pub name: String,
    pub kind: RawTypeKind,
}

#[derive(Debug, Clone)]
pub(crate) enum RawTypeKind {
    Entity(RawStructured),
    Complex(RawStructured),
    Enum(Vec<String>),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct RawStructured {
    pub base: Option<String>,
    pub is_abstract: bool,
    pub properties: Vec<RawProperty>,
}

#[derive(Debug, Clone)]
pub(crate) struct RawProperty {
    pub name: String,
    pub type_name: String,
    pub nullable: bool,
    /// `Some(contains_target)` for navigation properties.
    pub navigation: Option<bool>,
}

#[derive(Debug, Clone)]
pub(crate) struct RawOperation {
    pub name: String,
    pub is_bound: bool,
    pub parameter_types: Vec<String>,
    pub return_type: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct RawContainer {
    pub name: String,
    pub members: Vec<RawMember>,
}

#[derive(Debug, Clone)]
pub(crate) struct RawMember {
    pub name: String,
    pub type_name: String,
    pub singleton: bool,
}

/// Read a document tree. Structural problems are appended to `issues`
/// prefixed with `document`; the returned value holds whatever could be read.
pub(crate) fn read_document(root: &Element, document: &str, issues: &mut Vec<String>) -> RawDocument {
    let mut reader = DocumentReader {
        document,
        issues,
    };
    reader.read(root)
}

struct DocumentReader<'a> {
    document: &'a str,
    issues: &'a mut Vec<String>,
}

impl DocumentReader<'_> {
    fn issue(&mut self, message: impl AsRef<str>) {
        self.issues
            .push(format!("{}: {}", self.document, message.as_ref()));
    }

    fn required(&mut self, element: &Element, attribute: &str) -> Option<String> {
        match element.attr(attribute) {
            Some(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
            _ => {
                self.issue(format!(
                    "<{}> is missing required attribute '{}'",
                    element.name, attribute
                ));
                None
            }
        }
    }

    fn read(&mut self, root: &Element) -> RawDocument {
        if root.name != "Edmx" {
            self.issue(MISSING_WRAPPER);
            return RawDocument::default();
        }
        let Some(data_services) = root.first_named("DataServices") else {
            self.issue(MISSING_WRAPPER);
            return RawDocument::default();
        };

        let mut document = RawDocument::default();
        for reference in root.elements_named("Reference") {
            let Some(uri) = self.required(reference, "Uri") else {
                continue;
            };
            let includes = reference
                .elements_named("Include")
                .filter_map(|include| {
                    let namespace = self.required(include, "Namespace")?;
                    Some(RawInclude {
                        namespace,
                        alias: include.attr("Alias").map(str::to_string),
                    })
                })
                .collect();
            document.references.push(RawReference { uri, includes });
        }

        for schema in data_services.elements_named("Schema") {
            if let Some(schema) = self.read_schema(schema) {
                document.schemas.push(schema);
            }
        }
        document
    }

    fn read_schema(&mut self, element: &Element) -> Option<RawSchema> {
        let namespace = self.required(element, "Namespace")?;
        let mut schema = RawSchema {
            namespace,
            alias: element.attr("Alias").map(str::to_string),
            ..Default::default()
        };

        for child in element.elements() {
            match child.name.as_str() {
                "EntityType" | "ComplexType" => {
                    let Some(name) = self.required(child, "Name") else {
                        continue;
                    };
                    let structured = self.read_structured(child);
                    let kind = if child.name == "EntityType" {
                        RawTypeKind::Entity(structured)
                    } else {
                        RawTypeKind::Complex(structured)
                    };
                    schema.types.push(RawType { name, kind });
                }
                "EnumType" => {
                    let Some(name) = self.required(child, "Name") else {
                        continue;
                    };
                    let members = child
                        .elements_named("Member")
                        .filter_map(|m| self.required(m, "Name"))
                        .collect();
                    schema.types.push(RawType {
                        name,
                        kind: RawTypeKind::Enum(members),
                    });
                }
                "TypeDefinition" => {
                    if let Some(name) = self.required(child, "Name") {
                        schema.type_definitions.push(name);
                    }
                }
                "Action" | "Function" => {
                    if let Some(operation) = self.read_operation(child) {
                        schema.operations.push(operation);
                    }
                }
                "EntityContainer" => {
                    if schema.container.is_some() {
                        self.issue(format!(
                            "schema '{}' declares more than one entity container",
                            schema.namespace
                        ));
                        continue;
                    }
                    schema.container = self.read_container(child);
                }
                _ => {}
            }
        }
        Some(schema)
    }

    fn read_structured(&mut self, element: &Element) -> RawStructured {
        let mut structured = RawStructured {
            base: element.attr("BaseType").map(|b| b.trim().to_string()),
            is_abstract: parse_bool(element.attr("Abstract")).unwrap_or(false),
            properties: Vec::new(),
        };

        for child in element.elements() {
            let navigation = match child.name.as_str() {
                "Property" => None,
                "NavigationProperty" => {
                    Some(parse_bool(child.attr("ContainsTarget")).unwrap_or(false))
                }
                _ => continue,
            };
            let (Some(name), Some(type_name)) =
                (self.required(child, "Name"), self.required(child, "Type"))
            else {
                continue;
            };
            structured.properties.push(RawProperty {
                name,
                type_name,
                nullable: parse_bool(child.attr("Nullable")).unwrap_or(true),
                navigation,
            });
        }
        structured
    }

    fn read_operation(&mut self, element: &Element) -> Option<RawOperation> {
        let name = self.required(element, "Name")?;
        let parameter_types = element
            .elements_named("Parameter")
            .filter_map(|p| self.required(p, "Type"))
            .collect();
        let return_type = element
            .first_named("ReturnType")
            .and_then(|r| self.required(r, "Type"));

        Some(RawOperation {
            name,
            is_bound: parse_bool(element.attr("IsBound")).unwrap_or(false),
            parameter_types,
            return_type,
        })
    }

    fn read_container(&mut self, element: &Element) -> Option<RawContainer> {
        let name = self.required(element, "Name")?;
        let mut members = Vec::new();
        for child in element.elements() {
            let (type_attribute, singleton) = match child.name.as_str() {
                "EntitySet" => ("EntityType", false),
                "Singleton" => ("Type", true),
                _ => continue,
            };
            let (Some(member), Some(type_name)) = (
                self.required(child, "Name"),
                self.required(child, type_attribute),
            ) else {
                continue;
            };
            members.push(RawMember {
                name: member,
                type_name,
                singleton,
            });
        }
        Some(RawContainer { name, members })
    }
}

fn parse_bool(value: Option<&str>) -> Option<bool> {
    match value?.trim() {
        v if v.eq_ignore_ascii_case("true") => Some(true),
        v if v.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}
