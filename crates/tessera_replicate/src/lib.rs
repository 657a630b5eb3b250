//! TESSERA Replication
//!
//! Copies a finished type graph, or a selection of its modules, into a new
//! independent graph. Types are copied in module order without sorting by
//! dependency; references to entities not copied yet wait on
//! [`Continuation`](tessera_sched::Continuation)s that fire once the entity
//! arrives. References that never resolve are reported as dangling.
//!
//! Singletons and roles are runtime objects and are not copied.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod replicator;

pub use error::{ReplicateError, ReplicateResult};
pub use replicator::{GraphReplicator, Replica};
