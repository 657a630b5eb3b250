//! Type declarations.

use crate::error::{ConfigError, ConfigResult};
use crate::part::PartConfig;
use serde::{Deserialize, Serialize};
use tessera_core::QualifiedName;
use tessera_model::{Annotation, PrimitiveKind, ScopeRef};

/// Declaration of one type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TypeConfig {
    /// A class
    Class(ClassConfig),
    /// A primitive datatype
    Primitive(PrimitiveConfig),
    /// An enumeration
    Enumeration(EnumerationConfig),
    /// An association
    Association(AssociationConfig),
}

impl TypeConfig {
    /// Declared type name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Class(config) => &config.name,
            Self::Primitive(config) => &config.name,
            Self::Enumeration(config) => &config.name,
            Self::Association(config) => &config.name,
        }
    }

    /// Declared type annotations
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        match self {
            Self::Class(config) => &config.annotations,
            Self::Primitive(config) => &config.annotations,
            Self::Enumeration(config) => &config.annotations,
            Self::Association(config) => &config.annotations,
        }
    }

    /// Declared parts; empty for primitives and enumerations
    #[must_use]
    pub fn parts(&self) -> &[PartConfig] {
        match self {
            Self::Class(config) => &config.parts,
            Self::Association(config) => &config.parts,
            Self::Primitive(_) | Self::Enumeration(_) => &[],
        }
    }
}

/// Reference to a generalization or subset, resolved in a scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendsConfig {
    /// Scope the name is resolved in
    #[serde(default)]
    pub scope: ScopeRef,
    /// Module name; the declaring module if unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Type name, optionally qualified as `module:Type`
    #[serde(rename = "type")]
    pub type_name: String,
}

impl ExtendsConfig {
    /// Parse `module:Type` or `Type` into a global reference
    ///
    /// # Errors
    ///
    /// Returns error if the reference is not a valid qualified name
    pub fn parse(spec: &str) -> ConfigResult<Self> {
        let name = QualifiedName::parse(spec).map_err(|err| ConfigError::InvalidReference {
            spec: spec.to_string(),
            reason: err.to_string(),
        })?;
        Ok(Self {
            scope: ScopeRef::Global,
            module: name.module,
            type_name: name.name,
        })
    }

    /// Resolve in the given scope
    #[must_use]
    pub fn in_scope(mut self, scope: ScopeRef) -> Self {
        self.scope = scope;
        self
    }

    /// The referenced name as written
    #[must_use]
    pub fn display_name(&self) -> String {
        match &self.module {
            Some(module) => format!("{}:{}", module, self.type_name),
            None => self.type_name.clone(),
        }
    }
}

/// Declaration of a class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassConfig {
    /// Class name
    pub name: String,
    /// Whether the class has no direct instances
    #[serde(rename = "abstract", default)]
    pub is_abstract: bool,
    /// Whether the class has no specializations
    #[serde(rename = "final", default)]
    pub is_final: bool,
    /// Direct super classes
    #[serde(default)]
    pub generalizations: Vec<ExtendsConfig>,
    /// Declared parts, in defined order
    #[serde(default)]
    pub parts: Vec<PartConfig>,
    /// Class annotations
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl ClassConfig {
    /// Declare a concrete class
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the abstract flag
    #[must_use]
    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    /// Set the final flag
    #[must_use]
    pub fn with_final(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }

    /// Add a generalization given as `module:Type` or `Type`
    ///
    /// # Errors
    ///
    /// Returns error if `spec` is not a valid qualified name
    pub fn extends(mut self, spec: &str) -> ConfigResult<Self> {
        self.generalizations.push(ExtendsConfig::parse(spec)?);
        Ok(self)
    }

    /// Add a part
    #[must_use]
    pub fn with_part(mut self, part: PartConfig) -> Self {
        self.parts.push(part);
        self
    }

    /// Add an annotation
    #[must_use]
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

/// Declaration of a primitive datatype
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveConfig {
    /// Type name
    pub name: String,
    /// Value kind
    #[serde(rename = "primitive")]
    pub kind: PrimitiveKind,
    /// Storage mapping strategy; identity if unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_mapping: Option<String>,
    /// Physical column type hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_type: Option<String>,
    /// Physical size hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_size: Option<u32>,
    /// Physical precision hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_precision: Option<u32>,
    /// Binary physical encoding
    #[serde(default)]
    pub binary: bool,
    /// Type annotations
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl PrimitiveConfig {
    /// Declare a primitive without physical hints
    #[must_use]
    pub fn new(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self {
            name: name.into(),
            kind,
            storage_mapping: None,
            db_type: None,
            db_size: None,
            db_precision: None,
            binary: false,
            annotations: Vec::new(),
        }
    }
}

/// Declaration of one enumeration value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Classifier name
    pub name: String,
    /// Whether this is the default value
    #[serde(rename = "default", default)]
    pub is_default: bool,
    /// Classifier annotations
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// Declaration of an enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationConfig {
    /// Type name
    pub name: String,
    /// Values in defined order
    #[serde(default)]
    pub classifiers: Vec<ClassifierConfig>,
    /// Type annotations
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl EnumerationConfig {
    /// Declare an enumeration with the given values and no default
    #[must_use]
    pub fn new(name: impl Into<String>, classifiers: &[&str]) -> Self {
        Self {
            name: name.into(),
            classifiers: classifiers
                .iter()
                .map(|name| ClassifierConfig {
                    name: (*name).to_string(),
                    is_default: false,
                    annotations: Vec::new(),
                })
                .collect(),
            annotations: Vec::new(),
        }
    }

    /// Mark the named classifier as default
    #[must_use]
    pub fn with_default(mut self, name: &str) -> Self {
        for classifier in &mut self.classifiers {
            if classifier.name == name {
                classifier.is_default = true;
            }
        }
        self
    }
}

/// Declaration of an association
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationConfig {
    /// Type name
    pub name: String,
    /// Associations this one is a subset of
    #[serde(default)]
    pub subsets: Vec<ExtendsConfig>,
    /// Ends and association properties
    #[serde(default)]
    pub parts: Vec<PartConfig>,
    /// Type annotations
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl AssociationConfig {
    /// Declare an association without parts
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a part
    #[must_use]
    pub fn with_part(mut self, part: PartConfig) -> Self {
        self.parts.push(part);
        self
    }

    /// Declare this association a subset of `spec`
    ///
    /// # Errors
    ///
    /// Returns error if `spec` is not a valid qualified name
    pub fn subset_of(mut self, spec: &str) -> ConfigResult<Self> {
        self.subsets.push(ExtendsConfig::parse(spec)?);
        Ok(self)
    }
}
