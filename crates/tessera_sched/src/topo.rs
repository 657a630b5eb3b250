//! Jobs keyed by dependency node, executed in topological order.

use crate::error::{ScheduleError, ScheduleResult};
use crate::phase::Phase;
use crate::scheduler::{Job, JobContext};
use indexmap::{IndexMap, IndexSet};
use std::fmt;

/// Jobs of one phase grouped by node
///
/// Executing the group orders the nodes so that every node comes after all
/// of its (transitive) predecessors. Nodes without jobs are traversed but
/// not emitted. Jobs of one node keep their insertion order.
pub struct TopologicalJobGroup<C: JobContext> {
    jobs: IndexMap<C::Node, Vec<Job<C>>>,
}

impl<C: JobContext> TopologicalJobGroup<C> {
    /// Create an empty group
    #[must_use]
    pub fn new() -> Self {
        Self {
            jobs: IndexMap::new(),
        }
    }

    /// Add a job for `node`
    pub fn add(&mut self, node: C::Node, job: Job<C>) {
        self.jobs.entry(node).or_default().push(job);
    }

    /// Number of jobs
    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.values().map(Vec::len).sum()
    }

    /// Check if no job was added
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Number of distinct nodes with jobs
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.jobs.len()
    }

    /// Compute the execution order of the nodes with jobs
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::Cycle`] if the predecessor relation reachable
    /// from the nodes has a cycle
    pub fn order(&self, ctx: &C, phase: Phase) -> ScheduleResult<Vec<C::Node>> {
        let mut visited = IndexSet::new();
        let mut path = IndexSet::new();
        let mut order = Vec::with_capacity(self.jobs.len());

        for &node in self.jobs.keys() {
            self.visit(ctx, phase, node, &mut visited, &mut path, &mut order)?;
        }
        Ok(order)
    }

    /// Depth-first walk from `root` on an explicit stack
    fn visit(
        &self,
        ctx: &C,
        phase: Phase,
        root: C::Node,
        visited: &mut IndexSet<C::Node>,
        path: &mut IndexSet<C::Node>,
        order: &mut Vec<C::Node>,
    ) -> ScheduleResult<()> {
        if visited.contains(&root) {
            return Ok(());
        }
        path.insert(root);
        let mut stack = vec![(root, ctx.predecessors(root), 0usize)];

        while let Some((node, predecessors, next)) = stack.last_mut() {
            if let Some(&predecessor) = predecessors.get(*next) {
                *next += 1;
                if visited.contains(&predecessor) {
                    continue;
                }
                if let Some(start) = path.get_index_of(&predecessor) {
                    let mut nodes: Vec<String> = path
                        .iter()
                        .skip(start)
                        .map(|&member| ctx.describe(member))
                        .collect();
                    nodes.push(ctx.describe(predecessor));
                    return Err(ScheduleError::Cycle { phase, nodes });
                }
                path.insert(predecessor);
                stack.push((predecessor, ctx.predecessors(predecessor), 0));
                continue;
            }

            let node = *node;
            stack.pop();
            path.pop();
            visited.insert(node);
            if self.jobs.contains_key(&node) {
                order.push(node);
            }
        }
        Ok(())
    }

    /// Consume the group, returning node jobs in execution order
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::Cycle`] if the nodes cannot be ordered
    pub fn into_ordered(mut self, ctx: &C, phase: Phase) -> ScheduleResult<Vec<(C::Node, Vec<Job<C>>)>> {
        let order = self.order(ctx, phase)?;
        Ok(order
            .into_iter()
            .filter_map(|node| self.jobs.swap_remove(&node).map(|jobs| (node, jobs)))
            .collect())
    }
}

impl<C: JobContext> Default for TopologicalJobGroup<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: JobContext> fmt::Debug for TopologicalJobGroup<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.jobs.iter().map(|(node, jobs)| (node, jobs.len())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::tests::TestContext;
    use crate::scheduler::PhaseScheduler;
    use proptest::prelude::*;

    fn noop() -> Job<TestContext> {
        Box::new(|_: &mut TestContext, _: &mut PhaseScheduler<TestContext>| Ok(()))
    }

    fn position(order: &[u32], node: u32) -> usize {
        order.iter().position(|&n| n == node).unwrap()
    }

    #[test]
    fn test_group_chain() {
        let mut ctx = TestContext::default();
        // B (2) generalizes A (1)
        ctx.edges.insert(1, vec![2]);
        let mut group = TopologicalJobGroup::new();
        group.add(1, noop());
        group.add(2, noop());
        group.add(1, noop());

        assert_eq!(group.len(), 3);
        assert_eq!(group.node_count(), 2);
        assert_eq!(group.order(&ctx, Phase::CreateParts).unwrap(), vec![2, 1]);
    }

    #[test]
    fn test_group_diamond() {
        let mut ctx = TestContext::default();
        ctx.edges.insert(2, vec![1]);
        ctx.edges.insert(3, vec![1]);
        ctx.edges.insert(4, vec![2, 3]);
        let mut group = TopologicalJobGroup::new();
        for node in [4, 3, 2, 1] {
            group.add(node, noop());
        }

        let order = group.order(&ctx, Phase::CreateParts).unwrap();
        assert!(position(&order, 4) > position(&order, 2));
        assert!(position(&order, 4) > position(&order, 3));
        assert!(position(&order, 2) > position(&order, 1));
        assert!(position(&order, 3) > position(&order, 1));
    }

    #[test]
    fn test_group_skips_nodes_without_jobs() {
        let mut ctx = TestContext::default();
        ctx.edges.insert(3, vec![2]);
        ctx.edges.insert(2, vec![1]);
        let mut group = TopologicalJobGroup::new();
        group.add(3, noop());
        group.add(1, noop());

        assert_eq!(group.order(&ctx, Phase::CreateParts).unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_group_cycle() {
        let mut ctx = TestContext::default();
        ctx.edges.insert(1, vec![2]);
        ctx.edges.insert(2, vec![1]);
        let mut group = TopologicalJobGroup::new();
        group.add(1, noop());

        let err = group.order(&ctx, Phase::CreateReferenceOverrides).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::Cycle {
                phase: Phase::CreateReferenceOverrides,
                nodes: vec!["n1".to_string(), "n2".to_string(), "n1".to_string()],
            }
        );
    }

    #[test]
    fn test_group_deep_chain() {
        let mut ctx = TestContext::default();
        let depth = 200_000u32;
        for node in 1..depth {
            ctx.edges.insert(node, vec![node - 1]);
        }
        let mut group = TopologicalJobGroup::new();
        group.add(depth - 1, noop());
        group.add(0, noop());

        assert_eq!(group.order(&ctx, Phase::CreateParts).unwrap(), vec![0, depth - 1]);
    }

    #[test]
    fn test_group_self_cycle() {
        let mut ctx = TestContext::default();
        ctx.edges.insert(5, vec![5]);
        let mut group = TopologicalJobGroup::new();
        group.add(5, noop());

        let err = group.order(&ctx, Phase::CreateParts).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::Cycle {
                phase: Phase::CreateParts,
                nodes: vec!["n5".to_string(), "n5".to_string()],
            }
        );
    }

    #[test]
    fn test_group_jobs_keep_insertion_order() {
        let mut ctx = TestContext::default();
        let mut group = TopologicalJobGroup::new();
        for entry in ["a", "b", "c"] {
            group.add(
                7,
                Box::new(move |ctx: &mut TestContext, _: &mut PhaseScheduler<TestContext>| {
                    ctx.log.push(entry.to_string());
                    Ok(())
                }),
            );
        }

        let mut scheduler = PhaseScheduler::new();
        for (_, jobs) in group.into_ordered(&ctx, Phase::CreateParts).unwrap() {
            for job in jobs {
                job(&mut ctx, &mut scheduler).unwrap();
            }
        }
        assert_eq!(ctx.log, vec!["a", "b", "c"]);
    }

    proptest! {
        #[test]
        fn prop_order_respects_edges(
            raw_edges in proptest::collection::vec((0u32..24, 0u32..24), 0..60),
            with_jobs in proptest::collection::vec(0u32..24, 1..24),
        ) {
            // Only edges from higher to lower nodes, so the graph is a DAG
            let mut ctx = TestContext::default();
            for (a, b) in raw_edges {
                if a > b {
                    ctx.edges.entry(a).or_default().push(b);
                }
            }
            let mut group = TopologicalJobGroup::new();
            for &node in &with_jobs {
                group.add(node, noop());
            }

            let order = group.order(&ctx, Phase::CreateParts).unwrap();
            let unique: IndexSet<u32> = with_jobs.iter().copied().collect();
            prop_assert_eq!(order.len(), unique.len());

            for (i, &node) in order.iter().enumerate() {
                // Every emitted node reachable as an ancestor must come earlier
                let mut stack = ctx.predecessors(node);
                let mut seen = IndexSet::new();
                while let Some(ancestor) = stack.pop() {
                    if !seen.insert(ancestor) {
                        continue;
                    }
                    if let Some(pos) = order.iter().position(|&n| n == ancestor) {
                        prop_assert!(pos < i);
                    }
                    stack.extend(ctx.predecessors(ancestor));
                }
            }
        }
    }
}
