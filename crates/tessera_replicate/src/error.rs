//! Replication errors.

use tessera_model::ModelError;

/// Replication result type
pub type ReplicateResult<T> = Result<T, ReplicateError>;

/// Errors ending a replication run
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplicateError {
    /// Copied entities refer to entities outside the copy
    #[error("{} dangling reference(s): {}", .references.len(), .references.join(", "))]
    Dangling {
        /// `referrer -> referenced` for every unresolved reference
        references: Vec<String>,
    },

    /// A selected module does not exist in the source graph
    #[error("Unknown module: {name}")]
    UnknownModule {
        /// Requested module name
        name: String,
    },

    /// The target graph rejected a copied entity
    #[error(transparent)]
    Model(#[from] ModelError),
}
