//! Phase-ordered job execution.
//!
//! The scheduler is completely deterministic:
//! - One control loop, no threads
//! - Phases run in the fixed order of [`Phase::ALL`]
//! - Jobs of a phase run in FIFO order, topological phases first run their
//!   node-keyed jobs in generalization order
//! - Jobs may only queue work into phases that have not started yet

use crate::error::{ScheduleError, ScheduleResult};
use crate::phase::Phase;
use crate::topo::TopologicalJobGroup;
use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;
use tessera_core::Protocol;

/// State a scheduler operates on
pub trait JobContext {
    /// Dependency node of topological phases
    type Node: Copy + Eq + Hash + fmt::Debug;

    /// Direct predecessors of `node`; their jobs run before the jobs of `node`
    fn predecessors(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Human readable name of `node` for diagnostics
    fn describe(&self, node: Self::Node) -> String;

    /// Error sink checked after every phase
    fn protocol(&self) -> &Protocol;
}

/// A unit of deferred work
///
/// A job receives the shared context and the scheduler, so it can queue
/// follow-up work into later phases.
pub type Job<C> = Box<dyn FnOnce(&mut C, &mut PhaseScheduler<C>) -> ScheduleResult<()>>;

/// Outcome of [`PhaseScheduler::complete`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Every phase drained
    Finished,
    /// The protocol held errors after the given phase; later phases were skipped
    Aborted {
        /// Last phase executed
        after: Phase,
    },
}

struct PhaseQueue<C: JobContext> {
    jobs: VecDeque<Job<C>>,
    group: TopologicalJobGroup<C>,
}

impl<C: JobContext> PhaseQueue<C> {
    fn new() -> Self {
        Self {
            jobs: VecDeque::new(),
            group: TopologicalJobGroup::new(),
        }
    }

    fn len(&self) -> usize {
        self.jobs.len() + self.group.len()
    }
}

/// Phase-indexed job queues with a single control loop
pub struct PhaseScheduler<C: JobContext> {
    /// One queue per phase, indexed by [`Phase::index`]
    queues: Vec<PhaseQueue<C>>,
    /// Phase currently executing
    current: Option<Phase>,
    /// Stop after a phase that left errors in the protocol
    abort_on_errors: bool,
    /// Total number of jobs executed
    executed: usize,
}

impl<C: JobContext> PhaseScheduler<C> {
    /// Create a scheduler with empty queues
    #[must_use]
    pub fn new() -> Self {
        Self {
            queues: Phase::ALL.iter().map(|_| PhaseQueue::new()).collect(),
            current: None,
            abort_on_errors: true,
            executed: 0,
        }
    }

    /// Set whether to stop after a phase that left errors in the protocol
    #[must_use]
    pub fn with_abort_on_errors(mut self, abort: bool) -> Self {
        self.abort_on_errors = abort;
        self
    }

    fn check_open(&self, phase: Phase) -> ScheduleResult<()> {
        match self.current {
            Some(current) if phase <= current => {
                Err(ScheduleError::PhaseAlreadyStarted { phase, current })
            }
            _ => Ok(()),
        }
    }

    /// Queue a job into `phase`
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::PhaseAlreadyStarted`] if `phase` is not after
    /// the phase currently executing
    pub fn schedule<F>(&mut self, phase: Phase, job: F) -> ScheduleResult<()>
    where
        F: FnOnce(&mut C, &mut PhaseScheduler<C>) -> ScheduleResult<()> + 'static,
    {
        self.check_open(phase)?;
        self.queues[phase.index()].jobs.push_back(Box::new(job));
        Ok(())
    }

    /// Queue a job for `node` into `phase`
    ///
    /// In topological phases the job runs after the jobs of all (transitive)
    /// predecessors of `node`. In other phases this is [`Self::schedule`].
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::PhaseAlreadyStarted`] if `phase` is not after
    /// the phase currently executing
    pub fn schedule_for<F>(&mut self, phase: Phase, node: C::Node, job: F) -> ScheduleResult<()>
    where
        F: FnOnce(&mut C, &mut PhaseScheduler<C>) -> ScheduleResult<()> + 'static,
    {
        if !phase.is_topological() {
            return self.schedule(phase, job);
        }
        self.check_open(phase)?;
        self.queues[phase.index()].group.add(node, Box::new(job));
        Ok(())
    }

    /// Phase currently executing, `None` outside of [`Self::complete`]
    #[must_use]
    pub fn current_phase(&self) -> Option<Phase> {
        self.current
    }

    /// Number of queued jobs in `phase`
    #[must_use]
    pub fn pending_in(&self, phase: Phase) -> usize {
        self.queues[phase.index()].len()
    }

    /// Number of queued jobs over all phases
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queues.iter().map(PhaseQueue::len).sum()
    }

    /// Total number of jobs executed so far
    #[must_use]
    pub fn executed(&self) -> usize {
        self.executed
    }

    /// Drop every queued job
    pub fn clear(&mut self) {
        for queue in &mut self.queues {
            *queue = PhaseQueue::new();
        }
    }

    /// Run every phase in order
    ///
    /// After each phase the protocol of `ctx` is checked; if it holds errors
    /// (and aborting is enabled) the remaining phases are skipped and their
    /// jobs dropped. The scheduler is reusable afterwards.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error raised by a job or by ordering a
    /// topological phase; remaining jobs are dropped
    pub fn complete(&mut self, ctx: &mut C) -> ScheduleResult<Completion> {
        let result = self.run_phases(ctx);
        self.current = None;
        if !matches!(result, Ok(Completion::Finished)) {
            let dropped = self.pending();
            if dropped > 0 {
                tracing::debug!(dropped, "dropping queued jobs");
            }
            self.clear();
        }
        result
    }

    fn run_phases(&mut self, ctx: &mut C) -> ScheduleResult<Completion> {
        for phase in Phase::ALL {
            self.current = Some(phase);
            let span = tracing::debug_span!("phase", phase = ?phase);
            let _enter = span.enter();

            let executed = self.run_phase(ctx, phase)?;
            if executed > 0 {
                tracing::debug!(executed, "phase drained");
            }

            if self.abort_on_errors && ctx.protocol().has_errors() {
                tracing::debug!(errors = ctx.protocol().error_count(), "aborting after phase");
                return Ok(Completion::Aborted { after: phase });
            }
        }
        Ok(Completion::Finished)
    }

    fn run_phase(&mut self, ctx: &mut C, phase: Phase) -> ScheduleResult<usize> {
        let mut executed = 0;

        let group = std::mem::take(&mut self.queues[phase.index()].group);
        for (_, jobs) in group.into_ordered(ctx, phase)? {
            for job in jobs {
                job(ctx, self)?;
                executed += 1;
            }
        }

        while let Some(job) = self.queues[phase.index()].jobs.pop_front() {
            job(ctx, self)?;
            executed += 1;
        }

        self.executed += executed;
        Ok(executed)
    }
}

impl<C: JobContext> Default for PhaseScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: JobContext> fmt::Debug for PhaseScheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseScheduler")
            .field("current", &self.current)
            .field("pending", &self.pending())
            .field("executed", &self.executed)
            .field("abort_on_errors", &self.abort_on_errors)
            .finish()
    }
}
