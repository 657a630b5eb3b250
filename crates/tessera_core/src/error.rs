//! Core error types for TESSERA.

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Invalid qualified name or identifier
    #[error("Invalid name '{name}': {reason}")]
    InvalidName {
        /// The offending name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Validation error
    #[error("Validation failed for {field}: {reason}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Reason of the failure
        reason: String,
    },

    /// Not found
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Kind of the missing entity
        kind: String,
        /// Identifier of the missing entity
        id: String,
    },

    /// Already exists
    #[error("{kind} already exists: {id}")]
    AlreadyExists {
        /// Kind of the duplicate entity
        kind: String,
        /// Identifier of the duplicate entity
        id: String,
    },

    /// Accumulated configuration errors from a [`crate::Protocol`]
    #[error("{} configuration error(s): {}", errors.len(), errors.join("; "))]
    Configuration {
        /// All error messages in the order they were reported
        errors: Vec<String>,
    },

    /// Internal error (for unexpected errors)
    #[error("Internal error: {message}")]
    Internal {
        /// Error message
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::NotFound {
            kind: "Type".to_string(),
            id: "base:Base".to_string(),
        };
        assert_eq!(format!("{}", err), "Type not found: base:Base");
    }

    #[test]
    fn test_configuration_error_lists_all() {
        let err = CoreError::Configuration {
            errors: vec!["first".to_string(), "second".to_string()],
        };
        let s = err.to_string();
        assert!(s.starts_with("2 configuration error(s)"));
        assert!(s.contains("first; second"));
    }

    #[test]
    fn test_error_equality() {
        let err1 = CoreError::Internal { message: "x".to_string() };
        let err2 = CoreError::Internal { message: "x".to_string() };
        assert_eq!(err1, err2);
    }
}
