//! The type graph arena.
//!
//! [`Model`] owns every module, type and part. Creation operations enforce
//! name uniqueness and kind correctness; everything else (override
//! legality, completeness, scheduling) is left to the construction stages.

use crate::annotation::Annotations;
use crate::error::{ModelError, ModelResult};
use crate::module::Module;
use crate::part::{EndData, Multiplicity, PartKind, TypePart};
use crate::types::{
    AssociationData, ClassData, Classifier, EnumerationData, PrimitiveData, Type, TypeKind,
};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tessera_core::{
    is_valid_name, ModuleId, ObjectRef, PartId, PartRef, QualifiedName, RoleRef, TypeId,
};

/// Root of the type graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    /// Modules by name
    module_index: IndexMap<String, ModuleId>,
    /// Module arena
    modules: Vec<Module>,
    /// Type arena
    types: Vec<Type>,
    /// Part arena
    parts: Vec<TypePart>,
}

impl Model {
    /// Create an empty model
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ----------------------------------------------------------------
    // Modules
    // ----------------------------------------------------------------

    /// Add a new module
    ///
    /// # Errors
    ///
    /// Returns error if the name is invalid or already taken
    pub fn add_module(&mut self, name: &str) -> ModelResult<ModuleId> {
        check_name(name)?;
        if self.module_index.contains_key(name) {
            return Err(ModelError::DuplicateModule {
                name: name.to_string(),
            });
        }
        let id = ModuleId::from_index(self.modules.len());
        self.modules.push(Module::new(name));
        self.module_index.insert(name.to_string(), id);
        tracing::debug!(module = %name, %id, "module created");
        Ok(id)
    }

    /// Get the module of the given name, creating it if missing
    ///
    /// # Errors
    ///
    /// Returns error if the name is invalid
    pub fn make_module(&mut self, name: &str) -> ModelResult<ModuleId> {
        match self.module_by_name(name) {
            Some(id) => Ok(id),
            None => self.add_module(name),
        }
    }

    /// Look up a module by name
    #[must_use]
    pub fn module_by_name(&self, name: &str) -> Option<ModuleId> {
        self.module_index.get(name).copied()
    }

    /// Get a module
    #[must_use]
    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.index()]
    }

    /// Get a module mutably
    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.index()]
    }

    /// All modules in creation order
    pub fn modules(&self) -> impl Iterator<Item = ModuleId> + use<> {
        (0..self.modules.len()).map(ModuleId::from_index)
    }

    /// Number of modules
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Register a singleton instance in a module
    ///
    /// # Errors
    ///
    /// Returns error if a singleton of that name already exists
    pub fn add_singleton(&mut self, module: ModuleId, name: &str, object: ObjectRef) -> ModelResult<()> {
        let m = self.module_mut(module);
        if m.singletons.contains_key(name) {
            return Err(ModelError::DuplicatePart {
                owner: m.name.clone(),
                name: name.to_string(),
            });
        }
        m.singletons.insert(name.to_string(), object);
        Ok(())
    }

    /// Bind a role to a module
    ///
    /// # Errors
    ///
    /// Returns error if a role of that name is already bound
    pub fn add_role(&mut self, module: ModuleId, name: &str, role: RoleRef) -> ModelResult<()> {
        check_name(name)?;
        let m = self.module_mut(module);
        if m.roles.contains_key(name) {
            return Err(ModelError::DuplicatePart {
                owner: m.name.clone(),
                name: name.to_string(),
            });
        }
        m.roles.insert(name.to_string(), role);
        Ok(())
    }

    // ----------------------------------------------------------------
    // Types
    // ----------------------------------------------------------------

    fn add_type(&mut self, module: ModuleId, name: &str, kind: TypeKind) -> ModelResult<TypeId> {
        check_name(name)?;
        let m = &self.modules[module.index()];
        if m.types.contains_key(name) {
            return Err(ModelError::DuplicateType {
                module: m.name.clone(),
                name: name.to_string(),
            });
        }
        let id = TypeId::from_index(self.types.len());
        self.types.push(Type {
            name: name.to_string(),
            module,
            annotations: Annotations::new(),
            kind,
        });
        self.modules[module.index()].types.insert(name.to_string(), id);
        tracing::trace!(%module, ty = %name, %id, "type created");
        Ok(id)
    }

    /// Add an empty class shell
    ///
    /// # Errors
    ///
    /// Returns error if the name is invalid or taken
    pub fn add_class(
        &mut self,
        module: ModuleId,
        name: &str,
        is_abstract: bool,
        is_final: bool,
    ) -> ModelResult<TypeId> {
        self.add_type(
            module,
            name,
            TypeKind::Class(ClassData {
                is_abstract,
                is_final,
                ..ClassData::default()
            }),
        )
    }

    /// Add an empty enumeration
    ///
    /// # Errors
    ///
    /// Returns error if the name is invalid or taken
    pub fn add_enumeration(&mut self, module: ModuleId, name: &str) -> ModelResult<TypeId> {
        self.add_type(module, name, TypeKind::Enumeration(EnumerationData::default()))
    }

    /// Add a primitive datatype
    ///
    /// # Errors
    ///
    /// Returns error if the name is invalid or taken
    pub fn add_primitive(
        &mut self,
        module: ModuleId,
        name: &str,
        data: PrimitiveData,
    ) -> ModelResult<TypeId> {
        self.add_type(module, name, TypeKind::Primitive(data))
    }

    /// Add an association without ends
    ///
    /// # Errors
    ///
    /// Returns error if the name is invalid or taken
    pub fn add_association(&mut self, module: ModuleId, name: &str) -> ModelResult<TypeId> {
        self.add_type(module, name, TypeKind::Association(AssociationData::default()))
    }

    /// Get a type
    #[must_use]
    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    /// Get a type mutably
    pub fn ty_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.types[id.index()]
    }

    /// Number of types
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Types of a module in creation order
    pub fn types_of(&self, module: ModuleId) -> impl Iterator<Item = TypeId> + '_ {
        self.module(module).types.values().copied()
    }

    /// Look up a type by module and local name
    #[must_use]
    pub fn type_by_name(&self, module: ModuleId, name: &str) -> Option<TypeId> {
        self.module(module).type_by_name(name)
    }

    /// Find a type by qualified name; module-relative names resolve in `context`
    #[must_use]
    pub fn find_type(&self, name: &QualifiedName, context: Option<ModuleId>) -> Option<TypeId> {
        let module = match &name.module {
            Some(module) => self.module_by_name(module)?,
            None => context?,
        };
        self.type_by_name(module, &name.name)
    }

    /// Qualified name of a type
    #[must_use]
    pub fn qualified_name(&self, id: TypeId) -> QualifiedName {
        let ty = self.ty(id);
        QualifiedName::new(self.module(ty.module).name.clone(), ty.name.clone())
    }

    /// Qualified name of a part, `module:Type#part`
    #[must_use]
    pub fn part_ref(&self, id: PartId) -> PartRef {
        let part = self.part(id);
        PartRef {
            owner: self.qualified_name(part.owner),
            part: part.name.clone(),
        }
    }

    fn class_mut(&mut self, id: TypeId) -> ModelResult<&mut ClassData> {
        let name = self.qualified_name(id).to_string();
        self.ty_mut(id).as_class_mut().ok_or(ModelError::WrongKind {
            name,
            expected: "class".to_string(),
        })
    }

    fn association_mut(&mut self, id: TypeId) -> ModelResult<&mut AssociationData> {
        let name = self.qualified_name(id).to_string();
        match &mut self.ty_mut(id).kind {
            TypeKind::Association(assoc) => Ok(assoc),
            _ => Err(ModelError::WrongKind {
                name,
                expected: "association".to_string(),
            }),
        }
    }

    /// Append a classifier to an enumeration
    ///
    /// # Errors
    ///
    /// Returns error if the type is no enumeration or the name is taken
    pub fn add_classifier(&mut self, enumeration: TypeId, classifier: Classifier) -> ModelResult<()> {
        check_name(&classifier.name)?;
        let owner = self.qualified_name(enumeration).to_string();
        let TypeKind::Enumeration(data) = &mut self.ty_mut(enumeration).kind else {
            return Err(ModelError::WrongKind {
                name: owner,
                expected: "enumeration".to_string(),
            });
        };
        if data.classifiers.iter().any(|c| c.name == classifier.name) {
            return Err(ModelError::DuplicateClassifier {
                owner,
                name: classifier.name,
            });
        }
        data.classifiers.push(classifier);
        Ok(())
    }

    // ----------------------------------------------------------------
    // Hierarchy
    // ----------------------------------------------------------------

    /// Replace the generalizations of a class
    ///
    /// Duplicates are dropped, keeping the first occurrence.
    ///
    /// # Errors
    ///
    /// Returns error if `class` or any generalization is not a class
    pub fn set_generalizations(&mut self, class: TypeId, generalizations: Vec<TypeId>) -> ModelResult<()> {
        for &g in &generalizations {
            if !self.ty(g).is_class() {
                return Err(ModelError::WrongKind {
                    name: self.qualified_name(g).to_string(),
                    expected: "class".to_string(),
                });
            }
        }
        let unique: IndexSet<TypeId> = generalizations.into_iter().collect();
        self.class_mut(class)?.generalizations = unique.into_iter().collect();
        Ok(())
    }

    /// Direct generalizations; empty for non-classes
    #[must_use]
    pub fn generalizations(&self, id: TypeId) -> &[TypeId] {
        self.ty(id)
            .as_class()
            .map_or(&[], |class| class.generalizations.as_slice())
    }

    /// Check if `sub` is `sup` or a (transitive) specialization of it
    #[must_use]
    pub fn is_specialization_of(&self, sub: TypeId, sup: TypeId) -> bool {
        let mut visited = IndexSet::new();
        let mut stack = vec![sub];
        while let Some(current) = stack.pop() {
            if current == sup {
                return true;
            }
            if visited.insert(current) {
                stack.extend_from_slice(self.generalizations(current));
            }
        }
        false
    }

    /// Mark a class complete
    ///
    /// # Errors
    ///
    /// Returns error if `class` is not a class
    pub fn mark_complete(&mut self, class: TypeId) -> ModelResult<()> {
        self.class_mut(class)?.complete = true;
        Ok(())
    }

    /// Check if a class is complete; non-classes are always complete
    #[must_use]
    pub fn is_complete(&self, id: TypeId) -> bool {
        self.ty(id).as_class().is_none_or(|class| class.complete)
    }

    /// Add `subset` to the subsets of association `assoc`
    ///
    /// # Errors
    ///
    /// Returns error if either type is not an association
    pub fn add_subset(&mut self, assoc: TypeId, subset: TypeId) -> ModelResult<()> {
        if !self.ty(subset).is_association() {
            return Err(ModelError::WrongKind {
                name: self.qualified_name(subset).to_string(),
                expected: "association".to_string(),
            });
        }
        let data = self.association_mut(assoc)?;
        if !data.subsets.contains(&subset) {
            data.subsets.push(subset);
        }
        Ok(())
    }

    /// Associations declaring `assoc` as one of their subsets
    #[must_use]
    pub fn unions(&self, assoc: TypeId) -> Vec<TypeId> {
        (0..self.types.len())
            .map(TypeId::from_index)
            .filter(|&id| {
                self.ty(id)
                    .as_association()
                    .is_some_and(|data| data.subsets.contains(&assoc))
            })
            .collect()
    }

    // ----------------------------------------------------------------
    // Parts
    // ----------------------------------------------------------------

    /// Insert a fully prepared part into its owner
    ///
    /// No override detection happens here; the caller is responsible for
    /// `definition`.
    ///
    /// # Errors
    ///
    /// Returns error if the owner cannot hold parts or the name is taken
    pub fn insert_part(&mut self, part: TypePart) -> ModelResult<PartId> {
        check_name(&part.name)?;
        let owner = part.owner;
        if self.local_part(owner, &part.name).is_some() {
            return Err(ModelError::DuplicatePart {
                owner: self.qualified_name(owner).to_string(),
                name: part.name,
            });
        }
        let id = PartId::from_index(self.parts.len());
        let owner_name = self.qualified_name(owner).to_string();
        match &mut self.ty_mut(owner).kind {
            TypeKind::Class(class) => class.parts.push(id),
            TypeKind::Association(assoc) => assoc.parts.push(id),
            TypeKind::Enumeration(_) | TypeKind::Primitive(_) => {
                return Err(ModelError::WrongKind {
                    name: owner_name,
                    expected: "class or association".to_string(),
                });
            }
        }
        self.parts.push(part);
        Ok(id)
    }

    fn add_class_part(&mut self, owner: TypeId, mut part: TypePart) -> ModelResult<PartId> {
        part.definition = self
            .overridden_parts(owner, &part.name)
            .first()
            .map(|&overridden| self.definition(overridden));
        self.insert_part(part)
    }

    /// Add a property to a class or association
    ///
    /// On a class, a property with the name of an inherited part becomes an
    /// override of that part.
    ///
    /// # Errors
    ///
    /// Returns error if the owner cannot hold properties or the name is taken
    pub fn add_property(&mut self, owner: TypeId, name: &str, ty: TypeId) -> ModelResult<PartId> {
        if self.ty(owner).is_association() {
            return self.insert_part(TypePart::new(name, owner, Some(ty), PartKind::AssociationProperty));
        }
        self.add_class_part(owner, TypePart::new(name, owner, Some(ty), PartKind::Property))
    }

    /// Add an end to an association
    ///
    /// # Errors
    ///
    /// Returns error if the owner is no association or the name is taken
    pub fn add_end(&mut self, assoc: TypeId, name: &str, ty: TypeId) -> ModelResult<PartId> {
        if !self.ty(assoc).is_association() {
            return Err(ModelError::WrongKind {
                name: self.qualified_name(assoc).to_string(),
                expected: "association".to_string(),
            });
        }
        self.insert_part(TypePart::new(
            name,
            assoc,
            Some(ty),
            PartKind::AssociationEnd(EndData::navigable()),
        ))
    }

    /// Add a reference implemented by `end` to a class
    ///
    /// A reference with the name of an inherited part becomes an override of
    /// that part.
    ///
    /// # Errors
    ///
    /// Returns error if the owner is no class, `end` is no association end or
    /// the name is taken
    pub fn add_reference(&mut self, owner: TypeId, name: &str, end: PartId) -> ModelResult<PartId> {
        if !self.ty(owner).is_class() {
            return Err(ModelError::WrongKind {
                name: self.qualified_name(owner).to_string(),
                expected: "class".to_string(),
            });
        }
        if self.part(end).end_data().is_none() {
            return Err(ModelError::WrongKind {
                name: self.part_ref(end).to_string(),
                expected: "association end".to_string(),
            });
        }
        self.add_class_part(owner, TypePart::new(name, owner, None, PartKind::Reference { end: Some(end) }))
    }

    /// Get a part
    #[must_use]
    pub fn part(&self, id: PartId) -> &TypePart {
        &self.parts[id.index()]
    }

    /// Get a part mutably
    pub fn part_mut(&mut self, id: PartId) -> &mut TypePart {
        &mut self.parts[id.index()]
    }

    /// Number of parts
    #[must_use]
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Local parts of a type in defined order
    #[must_use]
    pub fn local_parts(&self, id: TypeId) -> &[PartId] {
        self.ty(id).local_parts()
    }

    /// Local part of the given name
    #[must_use]
    pub fn local_part(&self, id: TypeId, name: &str) -> Option<PartId> {
        self.local_parts(id)
            .iter()
            .copied()
            .find(|&p| self.part(p).name == name)
    }

    /// Reorder the local parts of a type
    ///
    /// # Errors
    ///
    /// Returns error if `order` is not a permutation of the current parts
    pub fn set_local_parts(&mut self, id: TypeId, order: Vec<PartId>) -> ModelResult<()> {
        let current: IndexSet<PartId> = self.local_parts(id).iter().copied().collect();
        let requested: IndexSet<PartId> = order.iter().copied().collect();
        if current != requested || requested.len() != order.len() {
            return Err(ModelError::InvalidOrder {
                owner: self.qualified_name(id).to_string(),
                reason: "order must be a permutation of the local parts".to_string(),
            });
        }
        match &mut self.ty_mut(id).kind {
            TypeKind::Class(class) => class.parts = order,
            TypeKind::Association(assoc) => assoc.parts = order,
            TypeKind::Enumeration(_) | TypeKind::Primitive(_) => {}
        }
        Ok(())
    }

    /// Effective part of the given name: local first, then inherited in
    /// generalization order
    #[must_use]
    pub fn find_part(&self, id: TypeId, name: &str) -> Option<PartId> {
        let mut visited = IndexSet::new();
        let mut queue = std::collections::VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(part) = self.local_part(current, name) {
                return Some(part);
            }
            queue.extend(self.generalizations(current).iter().copied());
        }
        None
    }

    /// Effective parts of the given name in each direct generalization
    ///
    /// These are the parts a local part of that name would override.
    #[must_use]
    pub fn overridden_parts(&self, class: TypeId, name: &str) -> Vec<PartId> {
        let mut result = IndexSet::new();
        for &g in self.generalizations(class) {
            if let Some(part) = self.find_part(g, name) {
                result.insert(part);
            }
        }
        result.into_iter().collect()
    }

    /// All effective parts: local parts followed by inherited, non-overridden ones
    #[must_use]
    pub fn all_parts(&self, id: TypeId) -> Vec<PartId> {
        let mut names = IndexSet::new();
        let mut result = Vec::new();
        let mut visited = IndexSet::new();
        let mut queue = std::collections::VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            for &part in self.local_parts(current) {
                if names.insert(self.part(part).name.clone()) {
                    result.push(part);
                }
            }
            queue.extend(self.generalizations(current).iter().copied());
        }
        result
    }

    /// Root definition of a part; a definition is its own root
    #[must_use]
    pub fn definition(&self, id: PartId) -> PartId {
        self.part(id).definition.unwrap_or(id)
    }

    /// Value type of a part; references resolve through their end
    #[must_use]
    pub fn part_type(&self, id: PartId) -> Option<TypeId> {
        let part = self.part(id);
        match part.kind {
            PartKind::Reference { end } => end.and_then(|end| self.part(end).ty),
            _ => part.ty,
        }
    }

    /// Multiplicity of a part; references resolve through their end
    #[must_use]
    pub fn multiplicity(&self, id: PartId) -> Multiplicity {
        let part = self.part(id);
        match part.kind {
            PartKind::Reference { end: Some(end) } => self.part(end).multiplicity,
            _ => part.multiplicity,
        }
    }

    /// Ends of an association in defined order
    #[must_use]
    pub fn ends(&self, assoc: TypeId) -> Vec<PartId> {
        self.local_parts(assoc)
            .iter()
            .copied()
            .filter(|&p| self.part(p).end_data().is_some())
            .collect()
    }

    /// The opposite end of a binary association
    #[must_use]
    pub fn other_end(&self, end: PartId) -> Option<PartId> {
        let ends = self.ends(self.part(end).owner);
        match ends.as_slice() {
            [a, b] if *a == end => Some(*b),
            [a, b] if *b == end => Some(*a),
            _ => None,
        }
    }

    /// Check if a reference is the forward side of its association
    ///
    /// Forward references are implemented by the last end of their
    /// association, backward references by the first.
    #[must_use]
    pub fn is_forward_reference(&self, reference: PartId) -> bool {
        let Some(end) = self.part(reference).reference_end() else {
            return false;
        };
        let ends = self.ends(self.part(end).owner);
        ends.first() != Some(&end)
    }

    /// The reference of `class` implemented by `end`, if any
    #[must_use]
    pub fn reference_for_end(&self, class: TypeId, end: PartId) -> Option<PartId> {
        self.all_parts(class)
            .into_iter()
            .find(|&p| self.part(p).reference_end() == Some(end))
    }
}

fn check_name(name: &str) -> ModelResult<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(ModelError::InvalidName {
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimitiveKind;

    fn make_base_model() -> (Model, ModuleId, TypeId, TypeId) {
        let mut model = Model::new();
        let module = model.add_module("base").unwrap();
        let string = model
            .add_primitive(module, "String", PrimitiveData::new(PrimitiveKind::String))
            .unwrap();
        let base = model.add_class(module, "Base", true, false).unwrap();
        (model, module, string, base)
    }

    #[test]
    fn test_model_new() {
        let model = Model::new();
        assert_eq!(model.module_count(), 0);
        assert_eq!(model.type_count(), 0);
        assert_eq!(model.part_count(), 0);
    }

    #[test]
    fn test_add_module_duplicate() {
        let mut model = Model::new();
        model.add_module("base").unwrap();
        assert!(matches!(
            model.add_module("base"),
            Err(ModelError::DuplicateModule { .. })
        ));
        assert_eq!(model.make_module("base").unwrap(), ModuleId::from_index(0));
    }

    #[test]
    fn test_add_type_duplicate() {
        let (mut model, module, _, _) = make_base_model();
        assert!(matches!(
            model.add_class(module, "Base", false, false),
            Err(ModelError::DuplicateType { .. })
        ));
        assert!(matches!(
            model.add_enumeration(module, "bad name"),
            Err(ModelError::InvalidName { .. })
        ));
    }

    #[test]
    fn test_find_type() {
        let (mut model, module, _, base) = make_base_model();
        let other = model.add_module("ext").unwrap();

        assert_eq!(model.find_type(&QualifiedName::new("base", "Base"), Some(other)), Some(base));
        assert_eq!(model.find_type(&QualifiedName::local("Base"), Some(module)), Some(base));
        assert_eq!(model.find_type(&QualifiedName::local("Base"), Some(other)), None);
        assert_eq!(model.find_type(&QualifiedName::local("Base"), None), None);
        assert_eq!(model.qualified_name(base).to_string(), "base:Base");
    }

    #[test]
    fn test_generalizations_deduplicated() {
        let (mut model, module, string, base) = make_base_model();
        let sub = model.add_class(module, "Sub", false, false).unwrap();

        model.set_generalizations(sub, vec![base, base]).unwrap();
        assert_eq!(model.generalizations(sub), &[base]);
        assert!(model.is_specialization_of(sub, base));
        assert!(!model.is_specialization_of(base, sub));

        assert!(matches!(
            model.set_generalizations(sub, vec![string]),
            Err(ModelError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_property_override_detection() {
        let (mut model, module, string, base) = make_base_model();
        let sub = model.add_class(module, "Sub", false, false).unwrap();
        model.set_generalizations(sub, vec![base]).unwrap();

        let name = model.add_property(base, "name", string).unwrap();
        let sub_name = model.add_property(sub, "name", string).unwrap();
        let other = model.add_property(sub, "other", string).unwrap();

        assert!(!model.part(name).is_override());
        assert!(model.part(sub_name).is_override());
        assert_eq!(model.definition(sub_name), name);
        assert_eq!(model.definition(other), other);

        assert_eq!(model.find_part(sub, "name"), Some(sub_name));
        assert_eq!(model.overridden_parts(sub, "name"), vec![name]);
        assert_eq!(model.all_parts(sub), vec![sub_name, other]);
    }

    #[test]
    fn test_definition_is_root() {
        let (mut model, module, string, base) = make_base_model();
        let mid = model.add_class(module, "Mid", false, false).unwrap();
        let leaf = model.add_class(module, "Leaf", false, false).unwrap();
        model.set_generalizations(mid, vec![base]).unwrap();
        model.set_generalizations(leaf, vec![mid]).unwrap();

        let root = model.add_property(base, "x", string).unwrap();
        model.add_property(mid, "x", string).unwrap();
        let leaf_x = model.add_property(leaf, "x", string).unwrap();

        assert_eq!(model.definition(leaf_x), root);
    }

    #[test]
    fn test_duplicate_part() {
        let (mut model, _, string, base) = make_base_model();
        model.add_property(base, "name", string).unwrap();
        assert!(matches!(
            model.add_property(base, "name", string),
            Err(ModelError::DuplicatePart { .. })
        ));
        assert!(matches!(
            model.add_property(string, "name", string),
            Err(ModelError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_reference_and_ends() {
        let (mut model, module, _, base) = make_base_model();
        let other = model.add_class(module, "Other", false, false).unwrap();
        let assoc = model.add_association(module, "Base$others").unwrap();
        let self_end = model.add_end(assoc, "self", base).unwrap();
        let target_end = model.add_end(assoc, "others", other).unwrap();
        model.part_mut(target_end).multiplicity = Multiplicity::many();

        let forward = model.add_reference(base, "others", target_end).unwrap();
        let backward = model.add_reference(other, "bases", self_end).unwrap();

        assert_eq!(model.ends(assoc), vec![self_end, target_end]);
        assert_eq!(model.other_end(self_end), Some(target_end));
        assert_eq!(model.other_end(target_end), Some(self_end));
        assert!(model.is_forward_reference(forward));
        assert!(!model.is_forward_reference(backward));
        assert_eq!(model.part_type(forward), Some(other));
        assert_eq!(model.part_type(backward), Some(base));
        assert!(model.multiplicity(forward).multiple);
        assert_eq!(model.reference_for_end(base, target_end), Some(forward));

        assert!(matches!(
            model.add_reference(base, "bad", forward),
            Err(ModelError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_set_local_parts() {
        let (mut model, _, string, base) = make_base_model();
        let a = model.add_property(base, "a", string).unwrap();
        let b = model.add_property(base, "b", string).unwrap();

        model.set_local_parts(base, vec![b, a]).unwrap();
        assert_eq!(model.local_parts(base), &[b, a]);

        assert!(model.set_local_parts(base, vec![a]).is_err());
        assert!(model.set_local_parts(base, vec![a, a]).is_err());
    }

    #[test]
    fn test_classifiers() {
        let (mut model, module, _, _) = make_base_model();
        let color = model.add_enumeration(module, "Color").unwrap();
        let red = Classifier {
            name: "red".to_string(),
            is_default: true,
            annotations: Annotations::new(),
        };
        model.add_classifier(color, red.clone()).unwrap();
        assert!(matches!(
            model.add_classifier(color, red),
            Err(ModelError::DuplicateClassifier { .. })
        ));
        assert_eq!(model.ty(color).as_enumeration().map(|e| e.classifiers.len()), Some(1));
    }

    #[test]
    fn test_subsets_and_unions() {
        let (mut model, module, _, _) = make_base_model();
        let all = model.add_association(module, "All").unwrap();
        let some = model.add_association(module, "Some").unwrap();
        model.add_subset(some, all).unwrap();
        model.add_subset(some, all).unwrap();

        assert_eq!(model.ty(some).as_association().map(|a| a.subsets.clone()), Some(vec![all]));
        assert_eq!(model.unions(all), vec![some]);
    }

    #[test]
    fn test_find_part_survives_cycle() {
        let (mut model, module, _, base) = make_base_model();
        let sub = model.add_class(module, "Sub", false, false).unwrap();
        model.set_generalizations(sub, vec![base]).unwrap();
        model.set_generalizations(base, vec![sub]).unwrap();

        assert_eq!(model.find_part(sub, "missing"), None);
        assert!(model.all_parts(sub).is_empty());
    }

    #[test]
    fn test_completion_flag() {
        let (mut model, _, string, base) = make_base_model();
        assert!(!model.is_complete(base));
        assert!(model.is_complete(string));
        model.mark_complete(base).unwrap();
        assert!(model.is_complete(base));
        assert!(model.mark_complete(string).is_err());
    }

    #[test]
    fn test_singletons_and_roles() {
        let (mut model, module, _, _) = make_base_model();
        model.add_singleton(module, "ROOT", ObjectRef::from_index(1)).unwrap();
        assert!(model.add_singleton(module, "ROOT", ObjectRef::from_index(2)).is_err());
        assert_eq!(model.module(module).singleton("ROOT"), Some(ObjectRef::from_index(1)));

        model.add_role(module, "admin", RoleRef::from_index(0)).unwrap();
        assert_eq!(model.module(module).role("admin"), Some(RoleRef::from_index(0)));
    }

    proptest::proptest! {
        #[test]
        fn prop_override_chain_keeps_root_definition(redeclared in proptest::collection::vec(proptest::bool::ANY, 1..12)) {
            let (mut model, module, string, base) = make_base_model();
            let root = model.add_property(base, "x", string).unwrap();

            let mut parent = base;
            for (level, redeclare) in redeclared.iter().enumerate() {
                let class = model.add_class(module, &format!("Level{}", level), false, false).unwrap();
                model.set_generalizations(class, vec![parent]).unwrap();
                if *redeclare {
                    let part = model.add_property(class, "x", string).unwrap();
                    proptest::prop_assert_eq!(model.definition(part), root);
                }
                parent = class;
            }

            let effective = model.find_part(parent, "x").unwrap();
            proptest::prop_assert_eq!(model.definition(effective), root);
            proptest::prop_assert_eq!(model.all_parts(parent).len(), 1);
        }
    }
}
