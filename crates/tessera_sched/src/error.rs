//! Scheduling errors.
//!
//! Both scheduling errors are fatal: they indicate an ordering bug in the
//! code issuing jobs or an inconsistent generalization graph, never a
//! recoverable configuration problem.

use crate::phase::Phase;

/// Scheduling result type
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Fatal scheduling error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// A job was queued into a phase that has already started
    #[error("Cannot schedule into phase {phase}: phase {current} is already running")]
    PhaseAlreadyStarted {
        /// Requested phase
        phase: Phase,
        /// Phase executing at the time of the request
        current: Phase,
    },

    /// The generalization graph of a topological phase has a cycle
    #[error("Generalization cycle in phase {phase}: {}", .nodes.join(" -> "))]
    Cycle {
        /// Phase whose job group could not be ordered
        phase: Phase,
        /// Members of the cycle, first member repeated at the end
        nodes: Vec<String>,
    },
}

/// Continuation misuse
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContinuationError {
    /// A continuation can be resolved only once
    #[error("Continuation already resolved")]
    AlreadyResolved,
}
