//! Part declarations: properties, references and association ends.

use serde::{Deserialize, Serialize};
use tessera_model::{Annotation, HistoryType, Multiplicity};

/// Properties an override may set
///
/// Every other property of an override is inherited from its definition.
/// `storage` is additionally admitted when all overridden parts are abstract.
pub const OVERRIDE_PROPERTIES: &[&str] = &[
    "name",
    "override",
    "type",
    "abstract",
    "mandatory",
    "end",
    "kind",
    "inverse",
    "annotations",
];

/// Direction of a reference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceKind {
    /// Owns a synthetic association
    Forwards,
    /// Implemented by the opposite end of a forward reference
    Backwards,
    /// Forwards unless an inverse is named
    #[default]
    None,
}

/// Reference-specific declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// Direction
    #[serde(default)]
    pub kind: ReferenceKind,
    /// Existing end implementing the reference, `Assoc#end` or `module:Assoc#end`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    /// Name of the forward reference on the target type this reference inverts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse: Option<String>,
    /// Whether the reference owns its targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite: Option<bool>,
    /// Whether the reference can be navigated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigate: Option<bool>,
    /// History semantics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<HistoryType>,
}

impl ReferenceConfig {
    /// Check if this reference owns a synthetic association
    #[must_use]
    pub fn is_forwards(&self) -> bool {
        match self.kind {
            ReferenceKind::Forwards => true,
            ReferenceKind::Backwards => false,
            ReferenceKind::None => self.inverse.is_none(),
        }
    }
}

/// Association-end-specific declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndConfig {
    /// Whether the end owns its targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composite: Option<bool>,
    /// Whether the end is the container side of a composition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<bool>,
    /// Whether the end can be navigated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigate: Option<bool>,
    /// History semantics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<HistoryType>,
}

/// Kind-specific part declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "part", rename_all = "kebab-case")]
pub enum PartKindConfig {
    /// A property
    Property,
    /// A reference of a class
    Reference(ReferenceConfig),
    /// An end of an association
    End(EndConfig),
}

/// Declaration of one part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartConfig {
    /// Part name
    pub name: String,
    /// Whether the part overrides an inherited one
    #[serde(rename = "override", default)]
    pub is_override: bool,
    /// Value or target type, `module:Type` or `Type`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_spec: Option<String>,
    /// Whether the part has no storage of its own
    #[serde(rename = "abstract", default)]
    pub is_abstract: bool,
    /// A value is required
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mandatory: Option<bool>,
    /// Multiple values are allowed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple: Option<bool>,
    /// Values are ordered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered: Option<bool>,
    /// Duplicates are allowed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bag: Option<bool>,
    /// Storage implementation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<String>,
    /// Part annotations
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Kind-specific declaration
    #[serde(flatten)]
    pub kind: PartKindConfig,
}

impl PartConfig {
    fn new(name: &str, type_spec: Option<&str>, kind: PartKindConfig) -> Self {
        Self {
            name: name.to_string(),
            is_override: false,
            type_spec: type_spec.map(str::to_string),
            is_abstract: false,
            mandatory: None,
            multiple: None,
            ordered: None,
            bag: None,
            storage: None,
            annotations: Vec::new(),
            kind,
        }
    }

    /// Declare a property of the given type
    #[must_use]
    pub fn property(name: &str, type_spec: &str) -> Self {
        Self::new(name, Some(type_spec), PartKindConfig::Property)
    }

    /// Declare a forward reference to the given type
    #[must_use]
    pub fn reference(name: &str, type_spec: &str) -> Self {
        Self::new(
            name,
            Some(type_spec),
            PartKindConfig::Reference(ReferenceConfig {
                kind: ReferenceKind::Forwards,
                ..ReferenceConfig::default()
            }),
        )
    }

    /// Declare an association end of the given type
    #[must_use]
    pub fn end(name: &str, type_spec: &str) -> Self {
        Self::new(name, Some(type_spec), PartKindConfig::End(EndConfig::default()))
    }

    /// Declare an override of an inherited part
    #[must_use]
    pub fn overriding(mut self) -> Self {
        self.is_override = true;
        self
    }

    /// Set the abstract flag
    #[must_use]
    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    /// Set the mandatory flag
    #[must_use]
    pub fn with_mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = Some(mandatory);
        self
    }

    /// Set the multiple flag
    #[must_use]
    pub fn with_multiple(mut self, multiple: bool) -> Self {
        self.multiple = Some(multiple);
        self
    }

    /// Set the ordered flag
    #[must_use]
    pub fn with_ordered(mut self, ordered: bool) -> Self {
        self.ordered = Some(ordered);
        self
    }

    /// Set the storage implementation
    #[must_use]
    pub fn with_storage(mut self, storage: impl Into<String>) -> Self {
        self.storage = Some(storage.into());
        self
    }

    /// Add an annotation
    #[must_use]
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Turn a reference into the inverse of the named forward reference
    #[must_use]
    pub fn backwards(mut self, inverse: &str) -> Self {
        if let PartKindConfig::Reference(reference) = &mut self.kind {
            reference.kind = ReferenceKind::Backwards;
            reference.inverse = Some(inverse.to_string());
        }
        self
    }

    /// Bind a reference to an existing association end
    #[must_use]
    pub fn with_end(mut self, end: &str) -> Self {
        if let PartKindConfig::Reference(reference) = &mut self.kind {
            reference.end = Some(end.to_string());
        }
        self
    }

    /// Set the composite flag of a reference or end
    #[must_use]
    pub fn with_composite(mut self, composite: bool) -> Self {
        match &mut self.kind {
            PartKindConfig::Reference(reference) => reference.composite = Some(composite),
            PartKindConfig::End(end) => end.composite = Some(composite),
            PartKindConfig::Property => {}
        }
        self
    }

    /// Set the history semantics of a reference or end
    #[must_use]
    pub fn with_history(mut self, history: HistoryType) -> Self {
        match &mut self.kind {
            PartKindConfig::Reference(reference) => reference.history = Some(history),
            PartKindConfig::End(end) => end.history = Some(history),
            PartKindConfig::Property => {}
        }
        self
    }

    /// Reference declaration, if this declares a reference
    #[must_use]
    pub fn as_reference(&self) -> Option<&ReferenceConfig> {
        match &self.kind {
            PartKindConfig::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    /// Declared multiplicity; ordering and bag semantics only apply to multiple parts
    #[must_use]
    pub fn multiplicity(&self) -> Multiplicity {
        let multiple = self.multiple.unwrap_or(false);
        Multiplicity {
            mandatory: self.mandatory.unwrap_or(false),
            multiple,
            ordered: multiple && self.ordered.unwrap_or(false),
            bag: multiple && self.bag.unwrap_or(false),
        }
    }

    /// Names of the properties explicitly set by this declaration
    #[must_use]
    pub fn set_properties(&self) -> Vec<&'static str> {
        let mut set = vec!["name"];
        let mut flag = |name: &'static str, present: bool| {
            if present {
                set.push(name);
            }
        };
        flag("override", self.is_override);
        flag("type", self.type_spec.is_some());
        flag("abstract", self.is_abstract);
        flag("mandatory", self.mandatory.is_some());
        flag("multiple", self.multiple.is_some());
        flag("ordered", self.ordered.is_some());
        flag("bag", self.bag.is_some());
        flag("storage", self.storage.is_some());
        flag("annotations", !self.annotations.is_empty());
        match &self.kind {
            PartKindConfig::Property => {}
            PartKindConfig::Reference(reference) => {
                flag("kind", reference.kind != ReferenceKind::None);
                flag("end", reference.end.is_some());
                flag("inverse", reference.inverse.is_some());
                flag("composite", reference.composite.is_some());
                flag("navigate", reference.navigate.is_some());
                flag("history", reference.history.is_some());
            }
            PartKindConfig::End(end) => {
                flag("composite", end.composite.is_some());
                flag("aggregate", end.aggregate.is_some());
                flag("navigate", end.navigate.is_some());
                flag("history", end.history.is_some());
            }
        }
        set
    }

    /// Set properties an override must not carry
    ///
    /// `storage` is not included; whether it is admitted depends on the
    /// overridden parts.
    #[must_use]
    pub fn properties_not_allowed_in_override(&self) -> Vec<&'static str> {
        self.set_properties()
            .into_iter()
            .filter(|name| *name != "storage" && !OVERRIDE_PROPERTIES.contains(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_direction() {
        let forward = PartConfig::reference("items", "Item");
        assert!(forward.as_reference().is_some_and(ReferenceConfig::is_forwards));

        let backward = PartConfig::reference("owner", "Order").backwards("items");
        assert!(backward.as_reference().is_some_and(|r| !r.is_forwards()));

        let implicit = ReferenceConfig {
            inverse: Some("items".to_string()),
            ..ReferenceConfig::default()
        };
        assert!(!implicit.is_forwards());
        assert!(ReferenceConfig::default().is_forwards());
    }

    #[test]
    fn test_multiplicity_ignores_order_on_single() {
        let part = PartConfig::property("tags", "String").with_ordered(true);
        assert!(!part.multiplicity().ordered);

        let part = part.with_multiple(true).with_mandatory(true);
        let multiplicity = part.multiplicity();
        assert!(multiplicity.multiple && multiplicity.ordered && multiplicity.mandatory);
    }

    #[test]
    fn test_set_properties() {
        let part = PartConfig::reference("target", "base:Base")
            .overriding()
            .with_mandatory(true)
            .with_composite(true);
        assert_eq!(
            part.set_properties(),
            vec!["name", "override", "type", "mandatory", "kind", "composite"]
        );
        assert_eq!(part.properties_not_allowed_in_override(), vec!["composite"]);
    }

    #[test]
    fn test_storage_left_to_caller() {
        let part = PartConfig::property("x", "String").overriding().with_storage("column");
        assert!(part.set_properties().contains(&"storage"));
        assert!(part.properties_not_allowed_in_override().is_empty());
    }

    #[test]
    fn test_part_config_json() {
        let json = r#"{"name": "owner", "type": "Order", "part": "reference",
            "kind": "backwards", "inverse": "items", "mandatory": true}"#;
        let part: PartConfig = serde_json::from_str(json).unwrap();
        assert_eq!(part.type_spec.as_deref(), Some("Order"));
        let reference = part.as_reference().unwrap();
        assert_eq!(reference.kind, ReferenceKind::Backwards);
        assert_eq!(reference.inverse.as_deref(), Some("items"));
        assert_eq!(part.mandatory, Some(true));
    }
}
