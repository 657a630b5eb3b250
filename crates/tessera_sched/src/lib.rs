//! TESSERA Scheduling
//!
//! Model construction runs as a fixed sequence of phases. Work items
//! ("jobs") are queued into phases and executed by a single control loop;
//! a running job may queue further jobs into later phases only.
//!
//! - [`PhaseScheduler`]: the phase-indexed job queues and the control loop
//! - [`TopologicalJobGroup`]: per-phase jobs keyed by a node and executed
//!   in generalization order
//! - [`Continuation`]: a synchronous single-threaded future used to run
//!   callbacks once a value has been produced

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod continuation;
pub mod error;
pub mod phase;
pub mod scheduler;
pub mod topo;

pub use continuation::Continuation;
pub use error::{ContinuationError, ScheduleError, ScheduleResult};
pub use phase::Phase;
pub use scheduler::{Completion, Job, JobContext, PhaseScheduler};
pub use topo::TopologicalJobGroup;
