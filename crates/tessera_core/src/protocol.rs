//! Diagnostic protocol shared by all construction stages.
//!
//! The protocol is an append-only log of diagnostics. Structural problems
//! found while building a model are recorded here instead of aborting, so
//! that a single run reports as many problems as possible. Callers convert
//! a protocol holding errors into a hard failure at well-defined checkpoints
//! with [`Protocol::check_errors`].

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    /// Informational message
    Info,
    /// Suspicious but not fatal
    Warning,
    /// Structural error
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single entry of the protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// Human readable message
    pub message: String,
    /// Optional underlying cause
    pub cause: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " (caused by: {})", cause)?;
        }
        Ok(())
    }
}

/// Append-only diagnostic log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protocol {
    entries: Vec<Diagnostic>,
    error_count: usize,
}

impl Protocol {
    /// Create an empty protocol
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an informational message
    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.push(Severity::Info, message, None);
    }

    /// Record a warning
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.push(Severity::Warning, message, None);
    }

    /// Record an error
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{}", message);
        self.push(Severity::Error, message, None);
    }

    /// Record an error together with its cause
    pub fn error_caused_by(&mut self, message: impl Into<String>, cause: &dyn fmt::Display) {
        let message = message.into();
        let cause = cause.to_string();
        tracing::error!(%cause, "{}", message);
        self.push(Severity::Error, message, Some(cause));
    }

    fn push(&mut self, severity: Severity, message: String, cause: Option<String>) {
        if severity == Severity::Error {
            self.error_count += 1;
        }
        self.entries.push(Diagnostic {
            severity,
            message,
            cause,
        });
    }

    /// Check if any error has been recorded
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Number of recorded errors
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// All diagnostics in recording order
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Recorded errors in recording order
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// Check if an error with a message containing `needle` was recorded
    #[must_use]
    pub fn has_error_containing(&self, needle: &str) -> bool {
        self.errors().any(|d| d.message.contains(needle))
    }

    /// Fail if any error has been recorded
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] listing every recorded error
    pub fn check_errors(&self) -> CoreResult<()> {
        if !self.has_errors() {
            return Ok(());
        }
        Err(CoreError::Configuration {
            errors: self.errors().map(ToString::to_string).collect(),
        })
    }

    /// Move all diagnostics of `other` into this protocol
    pub fn append(&mut self, other: Protocol) {
        self.error_count += other.error_count;
        self.entries.extend(other.entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_empty() {
        let protocol = Protocol::new();
        assert!(!protocol.has_errors());
        assert!(protocol.check_errors().is_ok());
    }

    #[test]
    fn test_protocol_warnings_are_not_errors() {
        let mut protocol = Protocol::new();
        protocol.info("skipped");
        protocol.warn("reused");
        assert!(!protocol.has_errors());
        assert_eq!(protocol.diagnostics().len(), 2);
    }

    #[test]
    fn test_protocol_collects_all_errors() {
        let mut protocol = Protocol::new();
        protocol.error("first");
        protocol.info("between");
        protocol.error_caused_by("second", &"root cause");

        assert_eq!(protocol.error_count(), 2);
        match protocol.check_errors() {
            Err(CoreError::Configuration { errors }) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0], "error: first");
                assert_eq!(errors[1], "error: second (caused by: root cause)");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_protocol_has_error_containing() {
        let mut protocol = Protocol::new();
        protocol.error("Undeclared override of 'a:A#x'");
        assert!(protocol.has_error_containing("Undeclared override"));
        assert!(!protocol.has_error_containing("cycle"));
    }

    #[test]
    fn test_protocol_append() {
        let mut left = Protocol::new();
        left.error("left");
        let mut right = Protocol::new();
        right.error("right");
        right.info("note");

        left.append(right);
        assert_eq!(left.error_count(), 2);
        assert_eq!(left.diagnostics().len(), 3);
    }
}
