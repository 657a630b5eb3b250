//! Resolution errors.

use tessera_core::Diagnostic;
use tessera_sched::ScheduleError;

/// Resolution result type
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Errors ending a resolution run
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Phase ordering bug or generalization cycle
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// The protocol holds structural errors
    #[error("{}", summarize(.diagnostics))]
    Configuration {
        /// Every error recorded in the protocol
        diagnostics: Vec<Diagnostic>,
    },
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    let messages: Vec<String> = diagnostics.iter().map(|d| d.message.clone()).collect();
    format!("{} configuration error(s): {}", diagnostics.len(), messages.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::Severity;

    #[test]
    fn test_configuration_display() {
        let err = ResolveError::Configuration {
            diagnostics: vec![
                Diagnostic {
                    severity: Severity::Error,
                    message: "a".to_string(),
                    cause: None,
                },
                Diagnostic {
                    severity: Severity::Error,
                    message: "b".to_string(),
                    cause: Some("c".to_string()),
                },
            ],
        };
        assert_eq!(err.to_string(), "2 configuration error(s): a; b");
    }
}
