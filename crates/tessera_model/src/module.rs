//! Modules: named namespaces of types, singletons and roles.

use crate::annotation::Annotations;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tessera_core::{ObjectRef, RoleRef, TypeId};

/// A module of the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Name, unique within the model
    pub name: String,
    /// Module annotations
    pub annotations: Annotations,
    /// Types by name, in creation order
    pub types: IndexMap<String, TypeId>,
    /// Singleton instances by name
    pub singletons: IndexMap<String, ObjectRef>,
    /// Roles bound to this module by name
    pub roles: IndexMap<String, RoleRef>,
}

impl Module {
    /// Create an empty module
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: Annotations::new(),
            types: IndexMap::new(),
            singletons: IndexMap::new(),
            roles: IndexMap::new(),
        }
    }

    /// Look up a type by local name
    #[must_use]
    pub fn type_by_name(&self, name: &str) -> Option<TypeId> {
        self.types.get(name).copied()
    }

    /// Look up a singleton by name
    #[must_use]
    pub fn singleton(&self, name: &str) -> Option<ObjectRef> {
        self.singletons.get(name).copied()
    }

    /// Look up a role by name
    #[must_use]
    pub fn role(&self, name: &str) -> Option<RoleRef> {
        self.roles.get(name).copied()
    }
}
