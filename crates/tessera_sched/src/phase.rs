//! Construction phases.

use std::fmt;

/// A stage of model construction
///
/// Phases execute in declaration order. Each phase may rely on everything
/// established by the phases before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Modules and empty type shells exist
    Start,
    /// Generalizations and association subsets are assigned
    BuildTypeHierarchy,
    /// Properties are created and parts dispatched (topological)
    CreateParts,
    /// Association ends exist
    CreateAssociationEnds,
    /// Forward references and explicit end references exist
    CreateReferences,
    /// Forward reference overrides exist (topological)
    CreateReferenceOverrides,
    /// Backward references exist
    CreateBackReferences,
    /// Backward reference overrides exist (topological)
    CreateBackReferenceOverrides,
    /// Parts of extended types follow their declared order
    ReorderProperties,
    /// Touched classes are marked complete
    Cleanup,
    /// Roles are bound to modules
    CreateRoles,
    /// Singletons are instantiated
    CreateSingletons,
}

impl Phase {
    /// Every phase in execution order
    pub const ALL: [Phase; 12] = [
        Phase::Start,
        Phase::BuildTypeHierarchy,
        Phase::CreateParts,
        Phase::CreateAssociationEnds,
        Phase::CreateReferences,
        Phase::CreateReferenceOverrides,
        Phase::CreateBackReferences,
        Phase::CreateBackReferenceOverrides,
        Phase::ReorderProperties,
        Phase::Cleanup,
        Phase::CreateRoles,
        Phase::CreateSingletons,
    ];

    /// Position in the execution order
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Check if jobs of this phase are ordered by generalization
    #[must_use]
    pub const fn is_topological(self) -> bool {
        matches!(
            self,
            Phase::CreateParts | Phase::CreateReferenceOverrides | Phase::CreateBackReferenceOverrides
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order_matches_index() {
        for (i, phase) in Phase::ALL.iter().enumerate() {
            assert_eq!(phase.index(), i);
        }
        assert!(Phase::ALL.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_topological_phases() {
        let topo: Vec<_> = Phase::ALL.iter().filter(|p| p.is_topological()).collect();
        assert_eq!(
            topo,
            vec![
                &Phase::CreateParts,
                &Phase::CreateReferenceOverrides,
                &Phase::CreateBackReferenceOverrides
            ]
        );
    }
}
