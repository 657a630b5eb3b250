//! Model and module declarations.

use crate::error::ConfigResult;
use crate::types::TypeConfig;
use serde::{Deserialize, Serialize};
use tessera_model::Annotation;

/// Declaration of a whole model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Module declarations
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

impl ModelConfig {
    /// Create an empty declaration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module
    #[must_use]
    pub fn with_module(mut self, module: ModuleConfig) -> Self {
        self.modules.push(module);
        self
    }

    /// Read the JSON form
    ///
    /// # Errors
    ///
    /// Returns error if `json` is not a valid declaration
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the pretty-printed JSON form
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Look up a module declaration by name
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&ModuleConfig> {
        self.modules.iter().find(|m| m.name == name)
    }
}

/// Declaration of a module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Module name
    pub name: String,
    /// Module annotations
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Type declarations
    #[serde(default)]
    pub types: Vec<TypeConfig>,
    /// Names of roles bound to the module
    #[serde(default)]
    pub roles: Vec<String>,
    /// Singleton declarations
    #[serde(default)]
    pub singletons: Vec<SingletonConfig>,
}

impl ModuleConfig {
    /// Declare an empty module
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a type
    #[must_use]
    pub fn with_type(mut self, ty: TypeConfig) -> Self {
        self.types.push(ty);
        self
    }

    /// Bind a role
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Add a singleton
    #[must_use]
    pub fn with_singleton(mut self, singleton: SingletonConfig) -> Self {
        self.singletons.push(singleton);
        self
    }
}

/// Declaration of a singleton instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingletonConfig {
    /// Name the instance is registered under
    pub name: String,
    /// Class to instantiate, `module:Type` or `Type`
    #[serde(rename = "type")]
    pub type_spec: String,
    /// Role assignments applied to the instance
    #[serde(default)]
    pub assignments: Vec<RoleAssignment>,
}

impl SingletonConfig {
    /// Declare a singleton of the given class
    #[must_use]
    pub fn new(name: impl Into<String>, type_spec: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_spec: type_spec.into(),
            assignments: Vec::new(),
        }
    }

    /// Grant `roles` to `group` on the instance
    #[must_use]
    pub fn with_assignment(mut self, group: &str, roles: &[&str]) -> Self {
        self.assignments.push(RoleAssignment {
            group: group.to_string(),
            roles: roles.iter().map(|r| (*r).to_string()).collect(),
        });
        self
    }
}

/// Grant of roles to a group on a singleton
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Group receiving the roles
    pub group: String,
    /// Names of the granted roles
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::part::PartConfig;
    use crate::types::ClassConfig;
    use proptest::prelude::*;

    fn make_config() -> ModelConfig {
        ModelConfig::new()
            .with_module(
                ModuleConfig::new("base")
                    .with_type(TypeConfig::Class(ClassConfig::new("Base").with_abstract(true)))
                    .with_role("admin"),
            )
            .with_module(
                ModuleConfig::new("ext")
                    .with_type(TypeConfig::Class(
                        ClassConfig::new("Sub")
                            .extends("base:Base")
                            .unwrap()
                            .with_part(PartConfig::reference("target", "base:Base")),
                    ))
                    .with_singleton(SingletonConfig::new("ROOT", "Sub").with_assignment("staff", &["admin"])),
            )
    }

    #[test]
    fn test_model_config_lookup() {
        let config = make_config();
        assert!(config.module("base").is_some());
        assert!(config.module("missing").is_none());
        assert_eq!(config.module("ext").map(|m| m.singletons.len()), Some(1));
    }

    #[test]
    fn test_model_config_json() {
        let config = make_config();
        let json = config.to_json().unwrap();
        assert_eq!(ModelConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_model_config_invalid_json() {
        assert!(ModelConfig::from_json("{\"modules\": 3}").is_err());
    }

    proptest! {
        #[test]
        fn prop_module_order_preserved(names in proptest::collection::vec("[a-z]{1,8}", 0..10)) {
            let config = names
                .iter()
                .fold(ModelConfig::new(), |config, name| config.with_module(ModuleConfig::new(name.clone())));
            let json = config.to_json().unwrap();
            let parsed = ModelConfig::from_json(&json).unwrap();
            let parsed_names: Vec<_> = parsed.modules.iter().map(|m| m.name.clone()).collect();
            prop_assert_eq!(parsed_names, names);
        }
    }
}
