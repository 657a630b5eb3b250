//! Errors raised by type graph operations.

/// Model result type
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised when an operation would leave the graph inconsistent
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Module name already taken
    #[error("Module '{name}' already exists")]
    DuplicateModule {
        /// Module name
        name: String,
    },

    /// Type name already taken within its module
    #[error("Type '{module}:{name}' already exists")]
    DuplicateType {
        /// Module name
        module: String,
        /// Type name
        name: String,
    },

    /// Part name already taken within its owner
    #[error("Part '{name}' already exists in '{owner}'")]
    DuplicatePart {
        /// Qualified owner name
        owner: String,
        /// Part name
        name: String,
    },

    /// Classifier name already taken within its enumeration
    #[error("Classifier '{name}' already exists in '{owner}'")]
    DuplicateClassifier {
        /// Qualified enumeration name
        owner: String,
        /// Classifier name
        name: String,
    },

    /// Name is not a valid identifier
    #[error("Invalid name '{name}'")]
    InvalidName {
        /// The rejected name
        name: String,
    },

    /// Type lookup failed
    #[error("Type not found: {name}")]
    TypeNotFound {
        /// Requested name
        name: String,
    },

    /// Part lookup failed
    #[error("Part not found: {name}")]
    PartNotFound {
        /// Requested name
        name: String,
    },

    /// Entity has an unexpected kind
    #[error("'{name}' is not a {expected}")]
    WrongKind {
        /// Qualified name of the entity
        name: String,
        /// Expected kind
        expected: String,
    },

    /// Local part list does not match the existing parts
    #[error("Invalid part order for '{owner}': {reason}")]
    InvalidOrder {
        /// Qualified owner name
        owner: String,
        /// Reason of the mismatch
        reason: String,
    },
}
