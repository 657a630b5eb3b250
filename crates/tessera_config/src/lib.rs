//! TESSERA Declarations
//!
//! An in-memory tree describing the modules, types, parts, roles and
//! singletons a model should contain. Declarations reference each other by
//! name only (`module:Type`, `Type`, `module:Assoc#end`) and may be given in
//! any order; resolving them into a linked graph is the job of
//! `tessera_resolve`.
//!
//! The tree is serde-derivable; [`ModelConfig::from_json`] reads the JSON
//! form used by the `tessera` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decl;
pub mod error;
pub mod part;
pub mod types;

pub use decl::{ModelConfig, ModuleConfig, RoleAssignment, SingletonConfig};
pub use error::{ConfigError, ConfigResult};
pub use part::{EndConfig, PartConfig, PartKindConfig, ReferenceConfig, ReferenceKind, OVERRIDE_PROPERTIES};
pub use types::{
    AssociationConfig, ClassConfig, ClassifierConfig, EnumerationConfig, ExtendsConfig,
    PrimitiveConfig, TypeConfig,
};
