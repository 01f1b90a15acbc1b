//! The set of types a diagram has to show.
//!
//! Starting from the container members and the primary document's own
//! declarations, types are popped kind by kind (entities, then complex
//! types, then enums). Popping a type admits everything it points at:
//! property targets, its base, the types derived from it and, for
//! entities, navigation targets. Passes repeat until one pops nothing.

use std::collections::BTreeSet;

use crate::csdl::{Kind, Model, TypeId, TypeKind, TypeRef};
use crate::options::GeneratorOptions;

/// `to_emit` / `emitted` pairs, one per [`Kind`].
#[derive(Debug)]
pub struct Worklist<'a> {
    model: &'a Model,
    options: &'a GeneratorOptions,
    to_emit: [BTreeSet<TypeId>; 3],
    emitted: [BTreeSet<TypeId>; 3],
    cursor: usize,
    popped_this_pass: bool,
}

fn slot(kind: Kind) -> usize {
    match kind {
        Kind::Entity => 0,
        Kind::Complex => 1,
        Kind::Enum => 2,
    }
}

impl<'a> Worklist<'a> {
    pub fn new(model: &'a Model, options: &'a GeneratorOptions) -> Self {
        Self {
            model,
            options,
            to_emit: Default::default(),
            emitted: Default::default(),
            cursor: 0,
            popped_this_pass: false,
        }
    }

    /// A worklist seeded with container members and primary declarations.
    pub fn seeded(model: &'a Model, options: &'a GeneratorOptions) -> Self {
        let mut worklist = Self::new(model, options);
        if let Some(container) = model.container() {
            for member in &container.members {
                worklist.admit_ref(&member.entity_type);
            }
        }
        for &id in model.entry_types() {
            worklist.admit(id);
        }
        worklist
    }

    /// Queue `id` unless it is skip-listed or has already been emitted.
    pub fn admit(&mut self, id: TypeId) -> bool {
        let ty = self.model.get(id);
        if self.options.skips(&ty.name) {
            return false;
        }
        let slot = slot(ty.kind());
        if self.emitted[slot].contains(&id) {
            return false;
        }
        self.to_emit[slot].insert(id)
    }

    /// Queue the element type of `ty`; scalars and unresolved names add nothing.
    pub fn admit_ref(&mut self, ty: &TypeRef) -> bool {
        ty.named().is_some_and(|id| self.admit(id))
    }

    /// Next type to render, already expanded and marked emitted.
    pub fn next_type(&mut self) -> Option<TypeId> {
        loop {
            if let Some(id) = self.to_emit[self.cursor].pop_first() {
                self.emitted[self.cursor].insert(id);
                self.popped_this_pass = true;
                self.expand(id);
                return Some(id);
            }
            if self.cursor + 1 < Kind::ALL.len() {
                self.cursor += 1;
                continue;
            }
            if !self.popped_this_pass {
                return None;
            }
            self.cursor = 0;
            self.popped_this_pass = false;
        }
    }

    fn expand(&mut self, id: TypeId) {
        let model = self.model;
        let ty = model.get(id);
        let (structured, is_entity) = match &ty.kind {
            TypeKind::Entity(s) => (s, true),
            TypeKind::Complex(s) => (s, false),
            TypeKind::Enum(_) => return,
        };

        for property in &structured.properties {
            let Some(target) = property.ty.named() else {
                continue;
            };
            match model.get(target).kind() {
                Kind::Complex | Kind::Enum => {
                    self.admit(target);
                }
                Kind::Entity if is_entity && property.is_navigation() => {
                    self.admit(target);
                }
                Kind::Entity => {}
            }
        }
        if let Some(base) = &structured.base {
            self.admit_ref(base);
        }
        for &derived in model.derived_types(id) {
            self.admit(derived);
        }
    }

    pub fn is_emitted(&self, id: TypeId) -> bool {
        self.emitted.iter().any(|set| set.contains(&id))
    }

    pub fn emitted(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.emitted.iter().flatten().copied()
    }

    /// Drain the worklist, returning types in the order they were popped.
    pub fn drain(mut self) -> Vec<TypeId> {
        std::iter::from_fn(|| self.next_type()).collect()
    }
}


#[cfg(test)]
mod proptest_tests {
    use std::collections::HashSet;
    use std::fmt::Write;

    use proptest::prelude::*;

    use super::*;
    use crate::csdl::{Document, DocumentSet, MemoryResolver};
    use crate::error::ErrorSink;

    // ===================
    // Strategies
    // ===================

    #[derive(Debug, Clone)]
    struct GenType {
        kind: u8,
        base: Option<usize>,
        targets: Vec<(usize, bool)>,
    }

    fn schema_strategy() -> impl Strategy<Value = Vec<GenType>> {
        prop::collection::vec(
            (
                0u8..3,
                prop::option::of(0usize..12),
                prop::collection::vec((0usize..12, any::<bool>()), 0..4),
            )
                .prop_map(|(kind, base, targets)| GenType {
                    kind,
                    base,
                    targets,
                }),
            1..12,
        )
    }

    fn skip_strategy() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::vec(0usize..12, 0..3)
    }

    /// Types alternate between two namespaces so references cross schemas.
    fn to_csdl(types: &[GenType]) -> String {
        let n = types.len();
        let kind_of = |i: usize| types[i % n].kind;
        let mut primary = String::new();
        let mut secondary = String::new();
        for (i, t) in types.iter().enumerate() {
            let out = if i % 2 == 0 { &mut primary } else { &mut secondary };
            if t.kind == 2 {
                let _ = write!(out, r#"<EnumType Name="T{i}"><Member Name="m"/></EnumType>"#);
                continue;
            }
            let element = if t.kind == 0 { "EntityType" } else { "ComplexType" };
            let base = t
                .base
                .map(|b| b % n)
                .filter(|&b| b != i && kind_of(b) == t.kind)
                .map(|b| format!(r#" BaseType="{}.T{b}""#, if b % 2 == 0 { "p" } else { "s" }))
                .unwrap_or_default();
            let _ = write!(out, r#"<{element} Name="T{i}"{base}>"#);
            for (j, (target, nav)) in t.targets.iter().enumerate() {
                let target = target % n;
                let ns = if target % 2 == 0 { "p" } else { "s" };
                let tag = if *nav && kind_of(target) == 0 {
                    "NavigationProperty"
                } else {
                    "Property"
                };
                let _ = write!(out, r#"<{tag} Name="p{j}" Type="{ns}.T{target}"/>"#);
            }
            let _ = write!(out, "</{element}>");
        }
        format!(
            r#"<edmx:Edmx Version="4.0" xmlns:edmx="http://docs.oasis-open.org/odata/ns/edmx"><edmx:DataServices>
               <Schema Namespace="p">{primary}</Schema><Schema Namespace="s">{secondary}</Schema>
               </edmx:DataServices></edmx:Edmx>"#
        )
    }

    fn build(types: &[GenType]) -> Model {
        let mut sink = ErrorSink::new();
        let set = DocumentSet::load(
            Document::new("gen.xml", to_csdl(types)),
            &MemoryResolver::new(),
            &mut sink,
        )
        .unwrap();
        Model::build(&set).unwrap()
    }

    fn options_for(skips: &[usize], n: usize) -> GeneratorOptions {
        GeneratorOptions::default().with_skip_list(skips.iter().map(|s| format!("T{}", s % n)))
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Every emitted type appears once and everything it points at is emitted too.
    fn check_closure_is_complete(types: Vec<GenType>, skips: Vec<usize>) -> Result<(), TestCaseError> {
        let model = build(&types);
        let options = options_for(&skips, types.len());
        let order = Worklist::seeded(&model, &options).drain();

        let emitted: HashSet<TypeId> = order.iter().copied().collect();
        prop_assert_eq!(emitted.len(), order.len());

        let admissible = |id: TypeId| !options.skips(&model.get(id).name);
        for &id in model.entry_types() {
            prop_assert_eq!(emitted.contains(&id), admissible(id));
        }
        for &id in &order {
            prop_assert!(admissible(id));
            let ty = model.get(id);
            let Some(structured) = ty.as_structured() else {
                continue;
            };
            for property in &structured.properties {
                let Some(target) = property.ty.named() else {
                    continue;
                };
                let followed = match model.get(target).kind() {
                    Kind::Complex | Kind::Enum => true,
                    Kind::Entity => ty.kind() == Kind::Entity && property.is_navigation(),
                };
                if followed && admissible(target) {
                    prop_assert!(emitted.contains(&target));
                }
            }
            if let Some(base) = structured.base.as_ref().and_then(TypeRef::named) {
                prop_assert_eq!(emitted.contains(&base), admissible(base));
            }
            for &derived in model.derived_types(id) {
                prop_assert_eq!(emitted.contains(&derived), admissible(derived));
            }
        }
        Ok(())
    }

    fn check_drain_is_deterministic(types: Vec<GenType>, skips: Vec<usize>) -> Result<(), TestCaseError> {
        let model = build(&types);
        let options = options_for(&skips, types.len());
        let first = Worklist::seeded(&model, &options).drain();
        let second = Worklist::seeded(&model, &options).drain();
        prop_assert_eq!(first, second);
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn closure_is_complete(types in schema_strategy(), skips in skip_strategy()) {
            check_closure_is_complete(types, skips)?;
        }

        #[test]
        fn drain_is_deterministic(types in schema_strategy(), skips in skip_strategy()) {
            check_drain_is_deterministic(types, skips)?;
        }
    }
}
