//! Instantiation of runtime objects.
//!
//! Structural entities (modules, types, parts) live in the [`Model`] arena.
//! Roles, groups and singleton instances belong to the application; the
//! resolver only decides when they are created and delegates the how to a
//! [`ModelFactory`].
//!
//! [`Model`]: tessera_model::Model

use indexmap::IndexMap;
use tessera_core::{CoreResult, GroupRef, ObjectRef, QualifiedName, RoleRef, TypeId};

/// Creates the runtime objects a model declares
pub trait ModelFactory {
    /// Create a role bound to `module`
    ///
    /// # Errors
    ///
    /// Returns error if the role cannot be created
    fn create_role(&mut self, module: &str, name: &str) -> CoreResult<RoleRef>;

    /// Instantiate the concrete class `class`
    ///
    /// # Errors
    ///
    /// Returns error if the instance cannot be created
    fn create_object(&mut self, class: TypeId, name: &QualifiedName) -> CoreResult<ObjectRef>;

    /// Look up a group by name
    fn find_group(&self, name: &str) -> Option<GroupRef>;

    /// Grant `role` to `group` on `object`
    ///
    /// # Errors
    ///
    /// Returns error if the grant cannot be recorded
    fn assign_role(&mut self, object: ObjectRef, group: GroupRef, role: RoleRef) -> CoreResult<()>;
}

/// In-memory factory without persistence
#[derive(Debug, Clone, Default)]
pub struct TransientFactory {
    /// Created roles as `(module, name)`
    roles: Vec<(String, String)>,
    /// Class of every created object
    objects: Vec<TypeId>,
    /// Known groups
    groups: IndexMap<String, GroupRef>,
    /// Recorded grants
    grants: Vec<(ObjectRef, GroupRef, RoleRef)>,
}

impl TransientFactory {
    /// Create a factory without groups
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group
    #[must_use]
    pub fn with_group(mut self, name: impl Into<String>) -> Self {
        let id = GroupRef::from_index(self.groups.len());
        self.groups.insert(name.into(), id);
        self
    }

    /// Number of created objects
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Class of a created object
    #[must_use]
    pub fn class_of(&self, object: ObjectRef) -> Option<TypeId> {
        self.objects.get(object.index()).copied()
    }

    /// Recorded grants in recording order
    #[must_use]
    pub fn grants(&self) -> &[(ObjectRef, GroupRef, RoleRef)] {
        &self.grants
    }
}

impl ModelFactory for TransientFactory {
    fn create_role(&mut self, module: &str, name: &str) -> CoreResult<RoleRef> {
        let id = RoleRef::from_index(self.roles.len());
        self.roles.push((module.to_string(), name.to_string()));
        Ok(id)
    }

    fn create_object(&mut self, class: TypeId, name: &QualifiedName) -> CoreResult<ObjectRef> {
        let id = ObjectRef::from_index(self.objects.len());
        self.objects.push(class);
        tracing::debug!(class = %name, object = %id, "object created");
        Ok(id)
    }

    fn find_group(&self, name: &str) -> Option<GroupRef> {
        self.groups.get(name).copied()
    }

    fn assign_role(&mut self, object: ObjectRef, group: GroupRef, role: RoleRef) -> CoreResult<()> {
        self.grants.push((object, group, role));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_factory() {
        let mut factory = TransientFactory::new().with_group("staff");
        let role = factory.create_role("base", "admin").unwrap();
        let class = TypeId::from_index(3);
        let object = factory
            .create_object(class, &QualifiedName::new("base", "Root"))
            .unwrap();
        let group = factory.find_group("staff").unwrap();
        factory.assign_role(object, group, role).unwrap();

        assert_eq!(factory.object_count(), 1);
        assert_eq!(factory.class_of(object), Some(class));
        assert_eq!(factory.grants(), &[(object, group, role)]);
        assert!(factory.find_group("missing").is_none());
    }
}
