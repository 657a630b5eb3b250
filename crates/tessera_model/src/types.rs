//! Types of the graph: classes, enumerations, primitives and associations.

use crate::annotation::{Annotations, TargetKind};
use serde::{Deserialize, Serialize};
use tessera_core::{ModuleId, PartId, TypeId};

/// A type of the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Type {
    /// Name, unique within the module
    pub name: String,
    /// Defining module
    pub module: ModuleId,
    /// Type annotations
    pub annotations: Annotations,
    /// Kind-specific data
    pub kind: TypeKind,
}

impl Type {
    /// Check if this is a class
    #[must_use]
    pub fn is_class(&self) -> bool {
        matches!(self.kind, TypeKind::Class(_))
    }

    /// Check if this is an association
    #[must_use]
    pub fn is_association(&self) -> bool {
        matches!(self.kind, TypeKind::Association(_))
    }

    /// Class data, if this is a class
    #[must_use]
    pub fn as_class(&self) -> Option<&ClassData> {
        match &self.kind {
            TypeKind::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Mutable class data, if this is a class
    pub fn as_class_mut(&mut self) -> Option<&mut ClassData> {
        match &mut self.kind {
            TypeKind::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Association data, if this is an association
    #[must_use]
    pub fn as_association(&self) -> Option<&AssociationData> {
        match &self.kind {
            TypeKind::Association(assoc) => Some(assoc),
            _ => None,
        }
    }

    /// Enumeration data, if this is an enumeration
    #[must_use]
    pub fn as_enumeration(&self) -> Option<&EnumerationData> {
        match &self.kind {
            TypeKind::Enumeration(data) => Some(data),
            _ => None,
        }
    }

    /// Primitive data, if this is a primitive
    #[must_use]
    pub fn as_primitive(&self) -> Option<&PrimitiveData> {
        match &self.kind {
            TypeKind::Primitive(data) => Some(data),
            _ => None,
        }
    }

    /// Local parts in their defined order; empty for enumerations and primitives
    #[must_use]
    pub fn local_parts(&self) -> &[PartId] {
        match &self.kind {
            TypeKind::Class(class) => &class.parts,
            TypeKind::Association(assoc) => &assoc.parts,
            TypeKind::Enumeration(_) | TypeKind::Primitive(_) => &[],
        }
    }

    /// Target kind of parts pointing to this type
    #[must_use]
    pub fn target_kind(&self) -> TargetKind {
        match self.kind {
            TypeKind::Class(_) => TargetKind::Class,
            TypeKind::Enumeration(_) => TargetKind::Enumeration,
            TypeKind::Primitive(_) => TargetKind::Primitive,
            TypeKind::Association(_) => TargetKind::Association,
        }
    }

    /// Human readable kind name
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            TypeKind::Class(_) => "class",
            TypeKind::Enumeration(_) => "enumeration",
            TypeKind::Primitive(_) => "primitive",
            TypeKind::Association(_) => "association",
        }
    }
}

/// Kind-specific type data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TypeKind {
    /// A class
    Class(ClassData),
    /// An enumeration
    Enumeration(EnumerationData),
    /// A primitive datatype
    Primitive(PrimitiveData),
    /// An association
    Association(AssociationData),
}

/// Data of a class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassData {
    /// Whether the class can have no direct instances
    pub is_abstract: bool,
    /// Whether the class can have no specializations
    pub is_final: bool,
    /// Direct super classes, in declaration order
    pub generalizations: Vec<TypeId>,
    /// Local parts, in defined order
    pub parts: Vec<PartId>,
    /// Set once all generalizations are complete and all local parts exist
    pub complete: bool,
}

/// Data of an enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationData {
    /// Classifiers in defined order
    pub classifiers: Vec<Classifier>,
}

impl EnumerationData {
    /// The default classifier, if any
    #[must_use]
    pub fn default_classifier(&self) -> Option<&Classifier> {
        self.classifiers.iter().find(|c| c.is_default)
    }
}

/// One value of an enumeration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classifier {
    /// Name, unique within the enumeration
    pub name: String,
    /// Whether this is the default value
    pub is_default: bool,
    /// Classifier annotations
    pub annotations: Annotations,
}

/// Kind of values stored by a primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrimitiveKind {
    /// Character data
    String,
    /// Integral numbers
    Int,
    /// Floating point numbers
    Float,
    /// Two-valued logic
    Boolean,
    /// Three-valued logic
    Tristate,
    /// Points in time
    Date,
    /// Raw bytes
    Binary,
    /// Application defined values
    Custom,
}

/// Data of a primitive datatype
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveData {
    /// Value kind
    pub kind: PrimitiveKind,
    /// Name of the storage mapping strategy
    pub storage_mapping: String,
    /// Physical column type hint
    pub db_type: Option<String>,
    /// Physical size hint
    pub db_size: Option<u32>,
    /// Physical precision hint
    pub db_precision: Option<u32>,
    /// Whether the physical encoding is binary
    pub binary: bool,
}

impl PrimitiveData {
    /// Create primitive data with the identity storage mapping and no hints
    #[must_use]
    pub fn new(kind: PrimitiveKind) -> Self {
        Self {
            kind,
            storage_mapping: "identity".to_string(),
            db_type: None,
            db_size: None,
            db_precision: None,
            binary: false,
        }
    }
}

/// Data of an association
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationData {
    /// Ends and association properties, in defined order
    pub parts: Vec<PartId>,
    /// Associations this association is a subset of
    pub subsets: Vec<TypeId>,
}
