//! Declaration errors.

/// Declaration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors reading or interpreting declarations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Malformed JSON input
    #[error("Invalid declaration: {0}")]
    Json(#[from] serde_json::Error),

    /// A type reference could not be parsed
    #[error("Invalid type reference '{spec}': {reason}")]
    InvalidReference {
        /// The offending reference
        spec: String,
        /// What is wrong with it
        reason: String,
    },
}
