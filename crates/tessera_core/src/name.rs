//! Qualified names of types and type parts.
//!
//! A type is named either relative to a module (`Person`) or qualified with
//! its module (`crm:Person`). A type part is named by its owner followed by
//! the part name (`crm:Person#name`).

use crate::error::{CoreError, CoreResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between module name and type name
pub const MODULE_SEPARATOR: char = ':';

/// Separator between type name and part name
pub const PART_SEPARATOR: char = '#';

/// `$` is admitted for synthesized association names (`Owner$ref`).
const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_.$\-]*$";

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(IDENTIFIER_PATTERN).expect("identifier pattern must compile"));

/// Check whether `name` is usable as module, type or part name
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// A type name, optionally qualified with its module
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    /// Module name, `None` for module-relative names
    pub module: Option<String>,
    /// Local type name
    pub name: String,
}

impl QualifiedName {
    /// Create a fully qualified name
    #[must_use]
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: Some(module.into()),
            name: name.into(),
        }
    }

    /// Create a module-relative name
    #[must_use]
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            module: None,
            name: name.into(),
        }
    }

    /// Parse `module:Type` or `Type`
    ///
    /// # Errors
    ///
    /// Returns error if either component is not a valid identifier
    pub fn parse(spec: &str) -> CoreResult<Self> {
        let (module, name) = match spec.split_once(MODULE_SEPARATOR) {
            Some((module, name)) => (Some(module), name),
            None => (None, spec),
        };

        if let Some(module) = module {
            if !is_valid_name(module) {
                return Err(CoreError::InvalidName {
                    name: spec.to_string(),
                    reason: format!("'{}' is not a valid module name", module),
                });
            }
        }
        if !is_valid_name(name) {
            return Err(CoreError::InvalidName {
                name: spec.to_string(),
                reason: format!("'{}' is not a valid type name", name),
            });
        }

        Ok(Self {
            module: module.map(str::to_string),
            name: name.to_string(),
        })
    }

    /// Check whether the name carries an explicit module
    #[must_use]
    pub fn is_qualified(&self) -> bool {
        self.module.is_some()
    }

    /// Resolve the module name, falling back to `default_module`
    #[must_use]
    pub fn module_or<'a>(&'a self, default_module: &'a str) -> &'a str {
        self.module.as_deref().unwrap_or(default_module)
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module {
            Some(module) => write!(f, "{}{}{}", module, MODULE_SEPARATOR, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A reference to a type part: `Type#part` or `module:Type#part`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartRef {
    /// Owner of the part
    pub owner: QualifiedName,
    /// Part name
    pub part: String,
}

impl PartRef {
    /// Parse a part reference
    ///
    /// # Errors
    ///
    /// Returns error if the separator is missing or a component is invalid
    pub fn parse(spec: &str) -> CoreResult<Self> {
        let Some((owner, part)) = spec.rsplit_once(PART_SEPARATOR) else {
            return Err(CoreError::InvalidName {
                name: spec.to_string(),
                reason: format!("missing '{}' between type and part name", PART_SEPARATOR),
            });
        };
        if !is_valid_name(part) {
            return Err(CoreError::InvalidName {
                name: spec.to_string(),
                reason: format!("'{}' is not a valid part name", part),
            });
        }
        Ok(Self {
            owner: QualifiedName::parse(owner)?,
            part: part.to_string(),
        })
    }
}

impl fmt::Display for PartRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.owner, PART_SEPARATOR, self.part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_qualified() {
        let name = QualifiedName::parse("base:Base").unwrap();
        assert_eq!(name.module.as_deref(), Some("base"));
        assert_eq!(name.name, "Base");
        assert!(name.is_qualified());
        assert_eq!(name.to_string(), "base:Base");
    }

    #[test]
    fn test_parse_local() {
        let name = QualifiedName::parse("Base").unwrap();
        assert!(!name.is_qualified());
        assert_eq!(name.module_or("ext"), "ext");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(QualifiedName::parse("").is_err());
        assert!(QualifiedName::parse("base:").is_err());
        assert!(QualifiedName::parse(":Base").is_err());
        assert!(QualifiedName::parse("1abc").is_err());
    }

    #[test]
    fn test_parse_part_ref() {
        let part = PartRef::parse("ext:Sub$target#self").unwrap();
        assert_eq!(part.owner.name, "Sub$target");

        let part = PartRef::parse("ext:Link#source").unwrap();
        assert_eq!(part.owner, QualifiedName::new("ext", "Link"));
        assert_eq!(part.part, "source");
        assert_eq!(part.to_string(), "ext:Link#source");
    }

    #[test]
    fn test_parse_part_ref_missing_separator() {
        assert!(PartRef::parse("ext:Link").is_err());
    }

    proptest::proptest! {
        #[test]
        fn prop_valid_names_parse(module in "[a-z][a-z0-9_]{0,8}", ty in "[A-Z][A-Za-z0-9]{0,8}") {
            let spec = format!("{}:{}", module, ty);
            let parsed = QualifiedName::parse(&spec).unwrap();
            prop_assert_eq!(parsed.to_string(), spec);
        }
    }
}
