//! Annotations attached to model parts.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// How an annotation behaves when a part is overridden
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnotationInheritance {
    /// Inherited by overrides, may be replaced
    #[default]
    Inherited,
    /// Not inherited; each override declares its own
    Redefine,
    /// Inherited and must not be replaced by an override
    Final,
}

/// Kind of type an annotated part may point to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    /// Part typed by a class
    Class,
    /// Part typed by an enumeration
    Enumeration,
    /// Part typed by a primitive
    Primitive,
    /// Part typed by an association
    Association,
}

/// A named annotation with an arbitrary JSON value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// Annotation name, unique per annotated part
    pub name: String,
    /// Annotation payload
    #[serde(default)]
    pub value: serde_json::Value,
    /// Inheritance policy
    #[serde(default)]
    pub inheritance: AnnotationInheritance,
    /// Target kinds this annotation is restricted to; empty means unrestricted
    #[serde(default)]
    pub targets: Vec<TargetKind>,
}

impl Annotation {
    /// Create an unrestricted, inherited annotation
    #[must_use]
    pub fn new(name: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            value,
            inheritance: AnnotationInheritance::Inherited,
            targets: Vec::new(),
        }
    }

    /// Set the inheritance policy
    #[must_use]
    pub fn with_inheritance(mut self, inheritance: AnnotationInheritance) -> Self {
        self.inheritance = inheritance;
        self
    }

    /// Restrict to the given target kinds
    #[must_use]
    pub fn with_targets(mut self, targets: Vec<TargetKind>) -> Self {
        self.targets = targets;
        self
    }

    /// Check whether the annotation may be placed on a part pointing to `kind`
    #[must_use]
    pub fn allows_target(&self, kind: Option<TargetKind>) -> bool {
        match kind {
            _ if self.targets.is_empty() => true,
            Some(kind) => self.targets.contains(&kind),
            None => false,
        }
    }

    /// Check whether an override may carry this annotation
    #[must_use]
    pub fn allowed_on_override(&self) -> bool {
        self.inheritance != AnnotationInheritance::Final
    }
}

/// Annotations of a model part, keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Annotations(IndexMap<String, Annotation>);

impl Annotations {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an annotation, replacing one of the same name
    pub fn set(&mut self, annotation: Annotation) {
        self.0.insert(annotation.name.clone(), annotation);
    }

    /// Get an annotation by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Annotation> {
        self.0.get(name)
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.0.values()
    }

    /// Number of annotations
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_targets() {
        let unrestricted = Annotation::new("label", serde_json::json!("Name"));
        assert!(unrestricted.allows_target(Some(TargetKind::Primitive)));
        assert!(unrestricted.allows_target(None));

        let restricted = unrestricted.with_targets(vec![TargetKind::Class]);
        assert!(restricted.allows_target(Some(TargetKind::Class)));
        assert!(!restricted.allows_target(Some(TargetKind::Primitive)));
        assert!(!restricted.allows_target(None));
    }

    #[test]
    fn test_final_annotation_not_on_override() {
        let ann = Annotation::new("storage", serde_json::Value::Null)
            .with_inheritance(AnnotationInheritance::Final);
        assert!(!ann.allowed_on_override());
        assert!(Annotation::new("x", serde_json::Value::Null).allowed_on_override());
    }

    #[test]
    fn test_annotations_replace_by_name() {
        let mut annotations = Annotations::new();
        annotations.set(Annotation::new("label", serde_json::json!("a")));
        annotations.set(Annotation::new("label", serde_json::json!("b")));

        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations.get("label").map(|a| &a.value), Some(&serde_json::json!("b")));
    }
}
