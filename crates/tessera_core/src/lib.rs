//! TESSERA Core Types
//!
//! This crate contains pure types shared by every stage of model
//! construction: arena handles, qualified names, the error type and the
//! diagnostic protocol that collects structural problems.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod id;
pub mod name;
pub mod protocol;

// Re-exports
pub use error::{CoreError, CoreResult};
pub use id::{GroupRef, ModuleId, ObjectRef, PartId, RoleRef, TypeId};
pub use name::{is_valid_name, PartRef, QualifiedName, MODULE_SEPARATOR, PART_SEPARATOR};
pub use protocol::{Diagnostic, Protocol, Severity};
