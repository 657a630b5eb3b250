//! Override legality and part configuration.

use crate::resolver::ResolverState;
use tessera_config::{PartConfig, PartKindConfig, ReferenceConfig};
use tessera_core::{PartId, TypeId};
use tessera_model::{Annotation, AnnotationInheritance, EndData, HistoryType, PartKind, TypePart};

impl ResolverState {
    /// Check that `part` declares an override exactly when it shadows an
    /// inherited part
    ///
    /// Returns whether the part may be created.
    pub(crate) fn check_override_declaration(&mut self, owner: TypeId, part: &PartConfig) -> bool {
        let overridden = self.model.overridden_parts(owner, &part.name);
        let Some(&inherited) = overridden.first() else {
            if part.is_override && self.config.check_declared_overrides {
                let message = format!(
                    "Undeclared override: '{}' does not override an inherited part",
                    self.part_name(owner, &part.name)
                );
                self.error(message);
                return false;
            }
            return true;
        };

        if !part.is_override {
            let message = format!(
                "Undeclared override of '{}' through '{}'",
                self.model.part_ref(inherited),
                self.part_name(owner, &part.name)
            );
            self.error(message);
            return false;
        }

        for &overridden in &overridden {
            let is_backward = matches!(self.model.part(overridden).kind, PartKind::Reference { .. })
                && !self.model.is_forward_reference(overridden);
            if is_backward && !self.model.part(overridden).is_abstract {
                let message = format!(
                    "Backward reference '{}' is not abstract and cannot be overridden by '{}'",
                    self.model.part_ref(overridden),
                    self.part_name(owner, &part.name)
                );
                self.error(message);
                return false;
            }
        }
        true
    }

    /// Configure a freshly created class part
    ///
    /// Overrides keep everything but the admitted properties from their
    /// definition; violations are reported without removing the part.
    pub(crate) fn configure_class_part(&mut self, id: PartId, config: &PartConfig) {
        if !self.model.part(id).is_override() {
            self.install_configuration(id, config);
            return;
        }

        let owner = self.model.part(id).owner;
        let part_name = self.model.part_ref(id).to_string();
        for property in config.properties_not_allowed_in_override() {
            self.error(format!(
                "Override failed. Property '{}' is not allowed in overrides of '{}'",
                property, part_name
            ));
        }

        let overridden = self.model.overridden_parts(owner, &config.name);
        if let Some(storage) = &config.storage {
            if overridden.iter().all(|&p| self.model.part(p).is_abstract) {
                self.model.part_mut(id).storage = Some(storage.clone());
            } else {
                self.error(format!(
                    "Override failed. Storage '{}' of '{}' requires all overridden parts to be abstract",
                    storage, part_name
                ));
            }
        }
        self.model.part_mut(id).is_abstract = config.is_abstract;

        let definition = self.model.definition(id);
        let multiplicity = self.override_multiplicity(definition, config);
        match self.model.part(id).reference_end() {
            Some(end) if Some(end) != self.model.part(definition).reference_end() => {
                self.model.part_mut(end).multiplicity = multiplicity;
            }
            Some(_) => {}
            None => self.model.part_mut(id).multiplicity = multiplicity,
        }

        for &source in &overridden {
            let inherited: Vec<Annotation> = self
                .model
                .part(source)
                .annotations
                .iter()
                .filter(|a| a.inheritance != AnnotationInheritance::Redefine)
                .cloned()
                .collect();
            let annotations = &mut self.model.part_mut(id).annotations;
            for annotation in inherited {
                if annotations.get(&annotation.name).is_none() {
                    annotations.set(annotation);
                }
            }
        }
        self.add_part_annotations(id, &config.annotations, true);
    }

    /// Apply the declared structure of a part that is no override
    pub(crate) fn install_configuration(&mut self, id: PartId, config: &PartConfig) {
        let multiplicity = config.multiplicity();
        let kind = self.model.part(id).kind;
        match (kind, &config.kind) {
            (PartKind::Reference { end: Some(end) }, PartKindConfig::Reference(reference)) => {
                self.model.part_mut(id).is_abstract = config.is_abstract;
                self.install_reference_ends(id, end, config, reference);
            }
            (PartKind::AssociationEnd(_), PartKindConfig::End(end_config)) => {
                let part = self.model.part_mut(id);
                part.multiplicity = multiplicity;
                part.is_abstract = config.is_abstract;
                part.storage = config.storage.clone();
                if let Some(data) = part.end_data_mut() {
                    let defaults = EndData::navigable();
                    *data = EndData {
                        composite: end_config.composite.unwrap_or(defaults.composite),
                        aggregate: end_config.aggregate.unwrap_or(defaults.aggregate),
                        navigate: end_config.navigate.unwrap_or(defaults.navigate),
                        history: end_config.history.unwrap_or(defaults.history),
                    };
                }
            }
            _ => {
                let part = self.model.part_mut(id);
                part.multiplicity = multiplicity;
                part.is_abstract = config.is_abstract;
                part.storage = config.storage.clone();
            }
        }
        self.add_part_annotations(id, &config.annotations, false);
    }

    /// Configure the ends behind a new reference
    ///
    /// A reference bound to an explicit end leaves the end as its association
    /// declares it.
    fn install_reference_ends(&mut self, id: PartId, end: PartId, config: &PartConfig, reference: &ReferenceConfig) {
        if reference.end.is_some() {
            return;
        }
        let multiplicity = config.multiplicity();

        if reference.is_forwards() {
            let history = reference.history.unwrap_or_default();
            let mut composite = reference.composite.unwrap_or(false);
            if composite && history != HistoryType::Current {
                let message = format!(
                    "Composite reference '{}' must point to current versions",
                    self.model.part_ref(id)
                );
                self.error(message);
                composite = false;
            }
            let target = self.model.part_mut(end);
            target.multiplicity = multiplicity;
            if let Some(data) = target.end_data_mut() {
                *data = EndData {
                    composite,
                    aggregate: false,
                    navigate: reference.navigate.unwrap_or(true),
                    history,
                };
            }
            if composite {
                if let Some(back) = self.model.other_end(end) {
                    mark_container(self.model.part_mut(back));
                }
            }
            return;
        }

        let forward_composite = self
            .model
            .other_end(end)
            .and_then(|forward| self.model.part(forward).end_data())
            .is_some_and(|data| data.composite);
        let back = self.model.part_mut(end);
        if forward_composite {
            mark_container(back);
        } else {
            back.multiplicity = multiplicity;
        }
        if let Some(data) = back.end_data_mut() {
            data.navigate = reference.navigate.unwrap_or(true);
            if let Some(history) = reference.history {
                data.history = history;
            }
        }
    }

    /// Attach declared annotations, rejecting misplaced ones
    pub(crate) fn add_part_annotations(&mut self, id: PartId, annotations: &[Annotation], is_override: bool) {
        let target = self.model.part_type(id).map(|ty| self.model.ty(ty).target_kind());
        for annotation in annotations {
            if !annotation.allows_target(target) {
                let message = format!(
                    "Annotation '{}' cannot be placed on '{}'",
                    annotation.name,
                    self.model.part_ref(id)
                );
                self.error(message);
                continue;
            }
            if is_override {
                let inherited_final = self
                    .model
                    .part(id)
                    .annotations
                    .get(&annotation.name)
                    .is_some_and(|a| !a.allowed_on_override());
                if inherited_final || !annotation.allowed_on_override() {
                    let message = format!(
                        "Final annotation '{}' cannot be declared on override '{}'",
                        annotation.name,
                        self.model.part_ref(id)
                    );
                    self.error(message);
                    continue;
                }
            }
            self.model.part_mut(id).annotations.set(annotation.clone());
        }
    }
}

/// The back end of a composition holds the single container
fn mark_container(part: &mut TypePart) {
    part.multiplicity.multiple = false;
    if let Some(data) = part.end_data_mut() {
        data.aggregate = true;
    }
}
