//! Resolver configuration.

use serde::{Deserialize, Serialize};

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Stop advancing phases once the protocol holds errors
    pub abort_on_errors: bool,
    /// Report overrides that do not override an inherited part
    pub check_declared_overrides: bool,
    /// Run the role creation phase
    pub create_roles: bool,
    /// Run the singleton creation phase
    pub create_singletons: bool,
}

impl ResolverConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to stop after a phase that left errors
    #[must_use]
    pub fn with_abort_on_errors(mut self, abort: bool) -> Self {
        self.abort_on_errors = abort;
        self
    }

    /// Set whether overrides without an inherited part are reported
    #[must_use]
    pub fn with_check_declared_overrides(mut self, check: bool) -> Self {
        self.check_declared_overrides = check;
        self
    }

    /// Set whether roles are created
    #[must_use]
    pub fn with_roles(mut self, create: bool) -> Self {
        self.create_roles = create;
        self
    }

    /// Set whether singletons are created
    #[must_use]
    pub fn with_singletons(mut self, create: bool) -> Self {
        self.create_singletons = create;
        self
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            abort_on_errors: true,
            check_declared_overrides: true,
            create_roles: true,
            create_singletons: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ResolverConfig::default();
        assert!(config.abort_on_errors);
        assert!(config.check_declared_overrides);
        assert!(config.create_roles && config.create_singletons);
    }

    #[test]
    fn test_config_builder() {
        let config = ResolverConfig::new()
            .with_abort_on_errors(false)
            .with_singletons(false);
        assert!(!config.abort_on_errors);
        assert!(!config.create_singletons);
        assert!(config.create_roles);
    }
}
