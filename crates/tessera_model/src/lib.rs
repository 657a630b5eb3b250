//! TESSERA Type Graph
//!
//! The type graph is the target of model construction: a set of modules
//! holding classes, enumerations, primitives and associations, linked by
//! generalizations, part types and association ends.
//!
//! Entities are stored in arenas owned by [`Model`] and addressed by the
//! handles from [`tessera_core`]. The graph itself performs no validation
//! beyond name uniqueness; override legality and completeness are the
//! business of the construction stages.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod annotation;
pub mod error;
pub mod model;
pub mod module;
pub mod part;
pub mod scope;
pub mod types;

pub use annotation::{Annotation, AnnotationInheritance, Annotations, TargetKind};
pub use error::{ModelError, ModelResult};
pub use model::Model;
pub use module::Module;
pub use part::{EndData, HistoryType, ModelKind, Multiplicity, PartKind, TypePart};
pub use scope::ScopeRef;
pub use types::{
    AssociationData, ClassData, Classifier, EnumerationData, PrimitiveData, PrimitiveKind, Type,
    TypeKind,
};
