//! Scope-relative type lookup.

use crate::model::Model;
use serde::{Deserialize, Serialize};
use tessera_core::{ModuleId, QualifiedName, TypeId};

/// Where a type name is looked up
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeRef {
    /// Look up by module name, defaulting to the declaring module
    #[default]
    Global,
    /// Look up in the declaring module only
    This,
    /// Look up in the scope enclosing the declaring module
    Parent,
    /// Look up in the nearest enclosing scope declared by the named type
    Ancestor(String),
}

impl Model {
    /// Resolve a type name relative to the module `base`
    ///
    /// Modules are not nested, so `Parent` and `Ancestor` scopes have no
    /// enclosing scope and resolve globally. A `type_name` that carries its
    /// own module prefix overrides `module_name`.
    #[must_use]
    pub fn lookup_type(
        &self,
        base: ModuleId,
        scope: &ScopeRef,
        module_name: Option<&str>,
        type_name: &str,
    ) -> Option<TypeId> {
        let name = QualifiedName::parse(type_name).ok()?;
        match scope {
            ScopeRef::This => {
                if name.module.as_deref().is_some_and(|m| m != self.module(base).name) {
                    return None;
                }
                self.type_by_name(base, &name.name)
            }
            ScopeRef::Global | ScopeRef::Parent | ScopeRef::Ancestor(_) => {
                if name.is_qualified() {
                    return self.find_type(&name, Some(base));
                }
                let module = match module_name {
                    Some(module) => self.module_by_name(module)?,
                    None => base,
                };
                self.type_by_name(module, &name.name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_model() -> (Model, ModuleId, ModuleId, TypeId, TypeId) {
        let mut model = Model::new();
        let base = model.add_module("base").unwrap();
        let ext = model.add_module("ext").unwrap();
        let base_item = model.add_class(base, "Item", false, false).unwrap();
        let ext_item = model.add_class(ext, "Item", false, false).unwrap();
        (model, base, ext, base_item, ext_item)
    }

    #[test]
    fn test_lookup_global() {
        let (model, base, ext, base_item, ext_item) = make_model();

        assert_eq!(model.lookup_type(ext, &ScopeRef::Global, None, "Item"), Some(ext_item));
        assert_eq!(model.lookup_type(ext, &ScopeRef::Global, Some("base"), "Item"), Some(base_item));
        assert_eq!(model.lookup_type(ext, &ScopeRef::Global, None, "base:Item"), Some(base_item));
        assert_eq!(model.lookup_type(base, &ScopeRef::Global, Some("missing"), "Item"), None);
    }

    #[test]
    fn test_lookup_this() {
        let (model, _, ext, _, ext_item) = make_model();

        assert_eq!(model.lookup_type(ext, &ScopeRef::This, None, "Item"), Some(ext_item));
        assert_eq!(model.lookup_type(ext, &ScopeRef::This, None, "ext:Item"), Some(ext_item));
        assert_eq!(model.lookup_type(ext, &ScopeRef::This, None, "base:Item"), None);
    }

    #[test]
    fn test_lookup_enclosing_scopes_fall_back() {
        let (model, _, ext, base_item, _) = make_model();

        assert_eq!(model.lookup_type(ext, &ScopeRef::Parent, Some("base"), "Item"), Some(base_item));
        assert_eq!(
            model.lookup_type(ext, &ScopeRef::Ancestor("Item".to_string()), None, "base:Item"),
            Some(base_item)
        );
    }
}
