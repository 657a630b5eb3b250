//! Type parts: properties, association ends and references.

use crate::annotation::Annotations;
use serde::{Deserialize, Serialize};
use tessera_core::{PartId, TypeId};

/// History semantics of an association end
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryType {
    /// Points to the current version of the target
    #[default]
    Current,
    /// Points to a fixed historic version of the target
    Historic,
    /// Points to current or historic versions
    Mixed,
}

/// Cardinality constraints of a part
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Multiplicity {
    /// A value is required
    pub mandatory: bool,
    /// Multiple values are allowed
    pub multiple: bool,
    /// Values are ordered (only meaningful if multiple)
    pub ordered: bool,
    /// Duplicates are allowed (only meaningful if multiple)
    pub bag: bool,
}

impl Multiplicity {
    /// Single optional value
    #[must_use]
    pub const fn single() -> Self {
        Self {
            mandatory: false,
            multiple: false,
            ordered: false,
            bag: false,
        }
    }

    /// Unordered set of values
    #[must_use]
    pub const fn many() -> Self {
        Self {
            mandatory: false,
            multiple: true,
            ordered: false,
            bag: false,
        }
    }
}

/// Data of an association end
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndData {
    /// The end owns its targets
    pub composite: bool,
    /// The end is the container side of a composition
    pub aggregate: bool,
    /// The end can be navigated
    pub navigate: bool,
    /// History semantics
    pub history: HistoryType,
}

impl EndData {
    /// A navigable, non-composite end pointing to current versions
    #[must_use]
    pub const fn navigable() -> Self {
        Self {
            composite: false,
            aggregate: false,
            navigate: true,
            history: HistoryType::Current,
        }
    }
}

/// Kind-specific part data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PartKind {
    /// A property of a class
    Property,
    /// A property of an association
    AssociationProperty,
    /// An end of an association
    AssociationEnd(EndData),
    /// A reference of a class, implemented by an association end
    Reference {
        /// The implementing end; only unset while a graph copy is in progress
        end: Option<PartId>,
    },
}

/// Coarse classification of parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    /// See [`PartKind::Property`]
    Property,
    /// See [`PartKind::AssociationProperty`]
    AssociationProperty,
    /// See [`PartKind::AssociationEnd`]
    AssociationEnd,
    /// See [`PartKind::Reference`]
    Reference,
}

/// A part of a class or association
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypePart {
    /// Name, unique within the owner
    pub name: String,
    /// Owning type
    pub owner: TypeId,
    /// Value type; references take their type from their end
    pub ty: Option<TypeId>,
    /// Part annotations
    pub annotations: Annotations,
    /// Whether the part has no storage of its own
    pub is_abstract: bool,
    /// Root definition this part overrides, `None` if the part is a definition itself
    pub definition: Option<PartId>,
    /// Cardinality; references take theirs from their end
    pub multiplicity: Multiplicity,
    /// Name of the storage implementation, if declared
    pub storage: Option<String>,
    /// Kind-specific data
    pub kind: PartKind,
}

impl TypePart {
    /// Create a part with default multiplicity and no annotations
    #[must_use]
    pub fn new(name: impl Into<String>, owner: TypeId, ty: Option<TypeId>, kind: PartKind) -> Self {
        Self {
            name: name.into(),
            owner,
            ty,
            annotations: Annotations::new(),
            is_abstract: false,
            definition: None,
            multiplicity: Multiplicity::single(),
            storage: None,
            kind,
        }
    }

    /// Coarse kind of this part
    #[must_use]
    pub fn model_kind(&self) -> ModelKind {
        match self.kind {
            PartKind::Property => ModelKind::Property,
            PartKind::AssociationProperty => ModelKind::AssociationProperty,
            PartKind::AssociationEnd(_) => ModelKind::AssociationEnd,
            PartKind::Reference { .. } => ModelKind::Reference,
        }
    }

    /// Check if this part overrides an inherited one
    #[must_use]
    pub fn is_override(&self) -> bool {
        self.definition.is_some()
    }

    /// End data, if this is an association end
    #[must_use]
    pub fn end_data(&self) -> Option<&EndData> {
        match &self.kind {
            PartKind::AssociationEnd(data) => Some(data),
            _ => None,
        }
    }

    /// Mutable end data, if this is an association end
    pub fn end_data_mut(&mut self) -> Option<&mut EndData> {
        match &mut self.kind {
            PartKind::AssociationEnd(data) => Some(data),
            _ => None,
        }
    }

    /// Implementing end, if this is a reference
    #[must_use]
    pub fn reference_end(&self) -> Option<PartId> {
        match self.kind {
            PartKind::Reference { end } => end,
            _ => None,
        }
    }
}
