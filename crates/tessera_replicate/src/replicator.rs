//! Continuation-driven graph copy.
//!
//! Every source entity has a slot: a [`Continuation`] resolved with its
//! target counterpart once the entity has been copied. Copying a
//! cross-reference waits on the slot of the referenced entity, so entities
//! can be copied in any order. Classes additionally have a completion slot,
//! resolved once their generalizations are complete and their local parts
//! have been copied; the parts of a class are only copied after all of its
//! generalizations completed, so overrides always find their definition.

use crate::error::{ReplicateError, ReplicateResult};
use rustc_hash::FxHashMap;
use tessera_core::{ModuleId, PartId, TypeId};
use tessera_model::{Model, ModelError, ModelResult, PartKind, TypeKind};
use tessera_sched::Continuation;

type Slot<T> = Continuation<CopyState, T>;

/// A copied graph with the mapping from source to target handles
#[derive(Debug, Clone)]
pub struct Replica {
    model: Model,
    modules: FxHashMap<ModuleId, ModuleId>,
    types: FxHashMap<TypeId, TypeId>,
    parts: FxHashMap<PartId, PartId>,
}

impl Replica {
    /// The copied graph
    #[must_use]
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Give up the mapping, returning the copied graph
    #[must_use]
    pub fn into_model(self) -> Model {
        self.model
    }

    /// Copy of a source module
    #[must_use]
    pub fn module(&self, source: ModuleId) -> Option<ModuleId> {
        self.modules.get(&source).copied()
    }

    /// Copy of a source type
    #[must_use]
    pub fn ty(&self, source: TypeId) -> Option<TypeId> {
        self.types.get(&source).copied()
    }

    /// Copy of a source part
    #[must_use]
    pub fn part(&self, source: PartId) -> Option<PartId> {
        self.parts.get(&source).copied()
    }
}

/// Copies finished type graphs
#[derive(Debug, Clone, Default)]
pub struct GraphReplicator {
    /// Names of the modules to copy; all modules if unset
    modules: Option<Vec<String>>,
}

impl GraphReplicator {
    /// Create a replicator copying every module
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy only the named modules
    #[must_use]
    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modules = Some(modules.into_iter().map(Into::into).collect());
        self
    }

    /// Copy the selected modules of `source` into a new graph
    ///
    /// # Errors
    ///
    /// Returns [`ReplicateError::UnknownModule`] for a selected module
    /// missing in `source` and [`ReplicateError::Dangling`] if copied
    /// entities refer to entities outside the selection
    pub fn replicate(&self, source: &Model) -> ReplicateResult<Replica> {
        let selected = self.select(source)?;
        let mut state = CopyState::new(source.clone());
        for module in selected {
            state.copy_module(module);
        }
        state.finish()
    }

    fn select(&self, source: &Model) -> ReplicateResult<Vec<ModuleId>> {
        let Some(names) = &self.modules else {
            return Ok(source.modules().collect());
        };
        names
            .iter()
            .map(|name| {
                source
                    .module_by_name(name)
                    .ok_or_else(|| ReplicateError::UnknownModule { name: name.clone() })
            })
            .collect()
    }
}

/// A cross-reference that waited on a slot
enum Request {
    Type { referrer: String, source: TypeId },
    Part { referrer: String, source: PartId },
}

struct CopyState {
    source: Model,
    target: Model,
    modules: FxHashMap<ModuleId, ModuleId>,
    types: FxHashMap<TypeId, TypeId>,
    parts: FxHashMap<PartId, PartId>,
    type_slots: FxHashMap<TypeId, Slot<TypeId>>,
    part_slots: FxHashMap<PartId, Slot<PartId>>,
    completions: FxHashMap<TypeId, Slot<TypeId>>,
    requests: Vec<Request>,
    failure: Option<ModelError>,
}

impl CopyState {
    fn new(source: Model) -> Self {
        Self {
            source,
            target: Model::new(),
            modules: FxHashMap::default(),
            types: FxHashMap::default(),
            parts: FxHashMap::default(),
            type_slots: FxHashMap::default(),
            part_slots: FxHashMap::default(),
            completions: FxHashMap::default(),
            requests: Vec::new(),
            failure: None,
        }
    }

    /// Keep the first model error
    fn record<T>(&mut self, result: ModelResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(error = %err, "target graph rejected copy");
                self.failure.get_or_insert(err);
                None
            }
        }
    }

    fn type_slot(&mut self, source: TypeId) -> Slot<TypeId> {
        self.type_slots.entry(source).or_insert_with(Continuation::pending).clone()
    }

    fn part_slot(&mut self, source: PartId) -> Slot<PartId> {
        self.part_slots.entry(source).or_insert_with(Continuation::pending).clone()
    }

    fn completion(&mut self, source: TypeId) -> Slot<TypeId> {
        self.completions.entry(source).or_insert_with(Continuation::pending).clone()
    }

    fn wait_type(&mut self, referrer: &str, source: TypeId) -> Slot<TypeId> {
        let slot = self.type_slot(source);
        if !slot.is_ready() {
            self.requests.push(Request::Type {
                referrer: referrer.to_string(),
                source,
            });
        }
        slot
    }

    fn wait_part(&mut self, referrer: &str, source: PartId) -> Slot<PartId> {
        let slot = self.part_slot(source);
        if !slot.is_ready() {
            self.requests.push(Request::Part {
                referrer: referrer.to_string(),
                source,
            });
        }
        slot
    }

    fn resolve<T: Clone + 'static>(&mut self, slot: &Slot<T>, value: T) {
        if slot.accept(self, value).is_err() {
            tracing::debug!("entity copied twice");
        }
    }

    fn enter_type(&mut self, source: TypeId, target: TypeId) {
        self.types.insert(source, target);
        let slot = self.type_slot(source);
        self.resolve(&slot, target);
    }

    fn enter_part(&mut self, source: PartId, target: PartId) {
        self.parts.insert(source, target);
        let slot = self.part_slot(source);
        self.resolve(&slot, target);
    }

    fn copy_module(&mut self, source: ModuleId) {
        let module = self.source.module(source);
        let (name, annotations) = (module.name.clone(), module.annotations.clone());
        let types: Vec<TypeId> = self.source.types_of(source).collect();
        tracing::debug!(module = %name, types = types.len(), "copying module");

        let created = self.target.add_module(&name);
        let Some(target) = self.record(created) else {
            return;
        };
        self.target.module_mut(target).annotations = annotations;
        self.modules.insert(source, target);

        for ty in types {
            self.copy_type(target, ty);
        }
    }

    fn copy_type(&mut self, module: ModuleId, source: TypeId) {
        let ty = self.source.ty(source).clone();
        let created = match &ty.kind {
            TypeKind::Class(class) => self.target.add_class(module, &ty.name, class.is_abstract, class.is_final),
            TypeKind::Primitive(data) => self.target.add_primitive(module, &ty.name, data.clone()),
            TypeKind::Enumeration(_) => self.target.add_enumeration(module, &ty.name),
            TypeKind::Association(_) => self.target.add_association(module, &ty.name),
        };
        let Some(target) = self.record(created) else {
            return;
        };
        self.target.ty_mut(target).annotations = ty.annotations;
        self.enter_type(source, target);

        match ty.kind {
            TypeKind::Class(class) => self.link_class(source, target, &class.generalizations),
            TypeKind::Association(assoc) => self.link_association(source, target, &assoc.subsets, assoc.parts),
            TypeKind::Enumeration(enumeration) => {
                for classifier in enumeration.classifiers {
                    let added = self.target.add_classifier(target, classifier);
                    self.record(added);
                }
            }
            TypeKind::Primitive(_) => {}
        }
    }

    fn link_class(&mut self, source: TypeId, target: TypeId, generalizations: &[TypeId]) {
        let referrer = self.source.qualified_name(source).to_string();
        let slots: Vec<Slot<TypeId>> = generalizations
            .iter()
            .map(|&g| self.wait_type(&referrer, g))
            .collect();
        Continuation::join_all(self, &slots).on_ready(self, move |state, copied| {
            let set = state.target.set_generalizations(target, copied);
            state.record(set);
        });

        let completions: Vec<Slot<TypeId>> = generalizations.iter().map(|&g| self.completion(g)).collect();
        Continuation::join_all(self, &completions).on_ready(self, move |state, _| {
            state.copy_class_parts(source, target);
        });
    }

    fn copy_class_parts(&mut self, source: TypeId, target: TypeId) {
        let parts = self.source.local_parts(source).to_vec();
        let dependencies: Vec<Slot<()>> = parts.iter().map(|&p| self.part_dependencies(p)).collect();
        Continuation::join_all(self, &dependencies).on_ready(self, move |state, _| {
            for &part in &parts {
                state.copy_part(part, target);
            }
            let marked = state.target.mark_complete(target);
            state.record(marked);
            let completion = state.completion(source);
            state.resolve(&completion, target);
        });
    }

    fn link_association(&mut self, source: TypeId, target: TypeId, subsets: &[TypeId], parts: Vec<PartId>) {
        let referrer = self.source.qualified_name(source).to_string();
        let slots: Vec<Slot<TypeId>> = subsets.iter().map(|&s| self.wait_type(&referrer, s)).collect();
        Continuation::join_all(self, &slots).on_ready(self, move |state, copied| {
            for subset in copied {
                let added = state.target.add_subset(target, subset);
                state.record(added);
            }
        });

        let dependencies: Vec<Slot<()>> = parts.iter().map(|&p| self.part_dependencies(p)).collect();
        Continuation::join_all(self, &dependencies).on_ready(self, move |state, _| {
            for &part in &parts {
                state.copy_part(part, target);
            }
        });
    }

    /// Resolved once everything `part` refers to has been copied
    fn part_dependencies(&mut self, part: PartId) -> Slot<()> {
        let (ty, end, definition) = {
            let p = self.source.part(part);
            (p.ty, p.reference_end(), p.definition)
        };
        let referrer = self.source.part_ref(part).to_string();

        let mut waits = Vec::with_capacity(3);
        if let Some(ty) = ty {
            let slot = self.wait_type(&referrer, ty);
            waits.push(slot.map(self, |_, _| ()));
        }
        for reference in [end, definition].into_iter().flatten() {
            let slot = self.wait_part(&referrer, reference);
            waits.push(slot.map(self, |_, _| ()));
        }
        Continuation::join_all(self, &waits).map(self, |_, _| ())
    }

    fn copy_part(&mut self, source: PartId, owner: TypeId) {
        let mut part = self.source.part(source).clone();
        part.owner = owner;
        part.ty = part.ty.and_then(|ty| self.types.get(&ty).copied());
        part.definition = part.definition.and_then(|d| self.parts.get(&d).copied());
        if let PartKind::Reference { end } = &mut part.kind {
            *end = end.and_then(|e| self.parts.get(&e).copied());
        }
        let inserted = self.target.insert_part(part);
        if let Some(target) = self.record(inserted) {
            self.enter_part(source, target);
        }
    }

    fn finish(self) -> ReplicateResult<Replica> {
        if let Some(err) = self.failure {
            return Err(err.into());
        }

        let mut references = Vec::new();
        for request in &self.requests {
            match request {
                Request::Type { referrer, source } if !self.types.contains_key(source) => {
                    references.push(format!("{} -> {}", referrer, self.source.qualified_name(*source)));
                }
                Request::Part { referrer, source } if !self.parts.contains_key(source) => {
                    references.push(format!("{} -> {}", referrer, self.source.part_ref(*source)));
                }
                _ => {}
            }
        }
        if !references.is_empty() {
            return Err(ReplicateError::Dangling { references });
        }

        tracing::debug!(
            modules = self.modules.len(),
            types = self.types.len(),
            parts = self.parts.len(),
            "replication finished"
        );
        Ok(Replica {
            model: self.target,
            modules: self.modules,
            types: self.types,
            parts: self.parts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tessera_core::QualifiedName;
    use tessera_model::{Annotation, Annotations, Classifier, EndData, PrimitiveData, PrimitiveKind};

    // `ext` is created first, so its types precede the types they depend on
    fn make_source() -> Model {
        let mut model = Model::new();
        let ext = model.add_module("ext").unwrap();
        let base = model.add_module("base").unwrap();

        let sub = model.add_class(ext, "Sub", false, false).unwrap();
        let string = model
            .add_primitive(base, "String", PrimitiveData::new(PrimitiveKind::String))
            .unwrap();
        let color = model.add_enumeration(base, "Color").unwrap();
        model
            .add_classifier(
                color,
                Classifier {
                    name: "red".to_string(),
                    is_default: true,
                    annotations: Annotations::new(),
                },
            )
            .unwrap();
        let root = model.add_class(base, "Base", true, false).unwrap();
        model.set_generalizations(sub, vec![root]).unwrap();

        let name = model.add_property(root, "name", string).unwrap();
        model
            .part_mut(name)
            .annotations
            .set(Annotation::new("label", serde_json::json!("Name")));
        model.add_property(root, "color", color).unwrap();

        let assoc = model.add_association(base, "Base$parent").unwrap();
        model.add_end(assoc, "self", root).unwrap();
        let parent = model.add_end(assoc, "parent", root).unwrap();
        model.add_reference(root, "parent", parent).unwrap();

        model.add_property(sub, "name", string).unwrap();
        model.add_property(sub, "extra", string).unwrap();
        model.mark_complete(root).unwrap();
        model.mark_complete(sub).unwrap();
        model
    }

    fn qualified(name: &str) -> QualifiedName {
        QualifiedName::parse(name).unwrap()
    }

    fn assert_same_structure(source: &Model, replica: &Replica) {
        let copy = replica.model();
        assert_eq!(copy.type_count(), source.type_count());
        assert_eq!(copy.part_count(), source.part_count());

        for index in 0..source.type_count() {
            let ty = TypeId::from_index(index);
            let target = replica.ty(ty).unwrap();
            assert_eq!(copy.qualified_name(target), source.qualified_name(ty));
            assert_eq!(copy.ty(target).annotations, source.ty(ty).annotations);
            let generalizations: Vec<TypeId> = source
                .generalizations(ty)
                .iter()
                .map(|&g| replica.ty(g).unwrap())
                .collect();
            assert_eq!(copy.generalizations(target), generalizations.as_slice());
            assert!(copy.is_complete(target));

            let parts: Vec<PartId> = source
                .local_parts(ty)
                .iter()
                .map(|&p| replica.part(p).unwrap())
                .collect();
            assert_eq!(copy.local_parts(target), parts.as_slice());
        }

        for index in 0..source.part_count() {
            let part = PartId::from_index(index);
            let original = source.part(part);
            let copied = copy.part(replica.part(part).unwrap());
            assert_eq!(copied.name, original.name);
            assert_eq!(Some(copied.owner), replica.ty(original.owner));
            assert_eq!(copied.ty, original.ty.and_then(|t| replica.ty(t)));
            assert_eq!(copied.definition, original.definition.and_then(|d| replica.part(d)));
            assert_eq!(
                copied.reference_end(),
                original.reference_end().and_then(|e| replica.part(e))
            );
            assert_eq!(copied.multiplicity, original.multiplicity);
            assert_eq!(copied.annotations, original.annotations);
        }
    }

    #[test]
    fn test_replicate_whole_graph() {
        let source = make_source();
        let replica = GraphReplicator::new().replicate(&source).unwrap();
        assert_same_structure(&source, &replica);
    }

    #[test]
    fn test_override_keeps_definition() {
        let source = make_source();
        let replica = GraphReplicator::new().replicate(&source).unwrap();
        let copy = replica.model();

        let sub = copy.find_type(&qualified("ext:Sub"), None).unwrap();
        let base = copy.find_type(&qualified("base:Base"), None).unwrap();
        let name = copy.local_part(sub, "name").unwrap();
        assert_eq!(copy.part(name).definition, copy.local_part(base, "name"));
        assert!(copy.part(copy.local_part(base, "name").unwrap()).annotations.get("label").is_some());
    }

    #[test]
    fn test_dangling_property_type() {
        let mut source = Model::new();
        let app = source.add_module("app").unwrap();
        let lib = source.add_module("lib").unwrap();
        let x = source.add_class(app, "X", false, false).unwrap();
        let y = source.add_class(lib, "Y", false, false).unwrap();
        source.add_property(x, "y", y).unwrap();

        let err = GraphReplicator::new().with_modules(["app"]).replicate(&source).unwrap_err();
        assert_eq!(
            err,
            ReplicateError::Dangling {
                references: vec!["app:X#y -> lib:Y".to_string()]
            }
        );
    }

    #[test]
    fn test_dangling_generalization() {
        let source = make_source();
        let err = GraphReplicator::new().with_modules(["ext"]).replicate(&source).unwrap_err();
        let ReplicateError::Dangling { references } = err else {
            panic!("expected dangling references");
        };
        assert_eq!(references, vec!["ext:Sub -> base:Base".to_string()]);
    }

    #[test]
    fn test_selected_modules_only() {
        let source = make_source();
        let replica = GraphReplicator::new().with_modules(["base"]).replicate(&source).unwrap();
        assert_eq!(replica.model().module_count(), 1);
        assert!(replica.model().module_by_name("ext").is_none());
        assert_eq!(replica.model().type_count(), source.type_count() - 1);
    }

    #[test]
    fn test_unknown_module() {
        let source = make_source();
        let err = GraphReplicator::new().with_modules(["missing"]).replicate(&source).unwrap_err();
        assert_eq!(err, ReplicateError::UnknownModule { name: "missing".to_string() });
    }

    #[test]
    fn test_end_data_copied() {
        let mut source = Model::new();
        let base = source.add_module("base").unwrap();
        let order = source.add_class(base, "Order", false, false).unwrap();
        let item = source.add_class(base, "Item", false, false).unwrap();
        let assoc = source.add_association(base, "Order$items").unwrap();
        let back = source.add_end(assoc, "self", order).unwrap();
        let items = source.add_end(assoc, "items", item).unwrap();
        *source.part_mut(items).end_data_mut().unwrap() = EndData {
            composite: true,
            ..EndData::navigable()
        };
        source.part_mut(back).end_data_mut().unwrap().aggregate = true;
        source.add_reference(order, "items", items).unwrap();
        source.add_reference(item, "order", back).unwrap();

        let replica = GraphReplicator::new().replicate(&source).unwrap();
        assert_same_structure(&source, &replica);
        let copied = replica.model().part(replica.part(items).unwrap());
        assert!(copied.end_data().is_some_and(|d| d.composite));
        assert!(replica.model().is_forward_reference(replica.part(PartId::from_index(2)).unwrap()));
    }

    fn chain(order: &[usize]) -> Model {
        let mut model = Model::new();
        let modules: Vec<ModuleId> = (0..order.len())
            .map(|i| model.add_module(&format!("m{}", order[i])).unwrap())
            .collect();
        let module_of = |level: usize| modules[order.iter().position(|&o| o == level).unwrap()];

        let prim = model.add_module("prim").unwrap();
        let string = model
            .add_primitive(prim, "String", PrimitiveData::new(PrimitiveKind::String))
            .unwrap();
        let classes: Vec<TypeId> = (0..order.len())
            .map(|level| {
                model
                    .add_class(module_of(level), &format!("C{}", level), false, false)
                    .unwrap()
            })
            .collect();
        for level in 1..classes.len() {
            model.set_generalizations(classes[level], vec![classes[level - 1]]).unwrap();
        }
        for (level, &class) in classes.iter().enumerate() {
            model.add_property(class, "shared", string).unwrap();
            model.add_property(class, &format!("own{}", level), string).unwrap();
        }
        for &class in &classes {
            model.mark_complete(class).unwrap();
        }
        model
    }

    proptest! {
        #[test]
        fn prop_replication_order_independent(
            order in Just((0..6).collect::<Vec<usize>>()).prop_shuffle()
        ) {
            let source = chain(&order);
            let replica = GraphReplicator::new().replicate(&source).unwrap();
            assert_same_structure(&source, &replica);
        }
    }
}
