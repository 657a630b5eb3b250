//! Creation of properties, association ends and references.
//!
//! Properties are created as soon as their owner's hierarchy is known.
//! Ends and references depend on other types' parts and are deferred:
//!
//! | Declaration                      | Phase                          |
//! |----------------------------------|--------------------------------|
//! | association end                  | `CreateAssociationEnds`        |
//! | reference to an explicit end     | `CreateReferences`             |
//! | forward reference                | `CreateReferences`             |
//! | forward reference override       | `CreateReferenceOverrides`     |
//! | backward reference               | `CreateBackReferences`         |
//! | backward reference override      | `CreateBackReferenceOverrides` |

use crate::resolver::{declared_names, ResolverState, Scheduler};
use tessera_config::{PartConfig, PartKindConfig, ReferenceConfig};
use tessera_core::{PartId, PartRef, QualifiedName, TypeId};
use tessera_model::Multiplicity;
use tessera_sched::{Phase, ScheduleResult};

/// Name of the association end pointing back to the owner of a forward reference
pub const SELF_END_NAME: &str = "self";

/// Name of the association synthesized for the forward reference `reference` of `owner`
#[must_use]
pub fn synthetic_association_name(owner: &str, reference: &str) -> String {
    format!("{}${}", owner, reference)
}

impl ResolverState {
    pub(crate) fn part_name(&self, owner: TypeId, name: &str) -> String {
        PartRef {
            owner: self.model.qualified_name(owner),
            part: name.to_string(),
        }
        .to_string()
    }

    /// Create or schedule every declared part of `owner`
    pub(crate) fn create_parts(
        &mut self,
        scheduler: &mut Scheduler,
        owner: TypeId,
        is_new: bool,
        parts: &[PartConfig],
    ) -> ScheduleResult<()> {
        let mut added = false;
        for part in parts {
            if self.model.local_part(owner, &part.name).is_some() {
                if is_new {
                    let message = format!("Duplicate declaration of part '{}'", self.part_name(owner, &part.name));
                    self.error(message);
                }
                continue;
            }
            added |= self.dispatch_part(scheduler, owner, part)?;
        }

        if !is_new && added {
            let declared = declared_names(parts);
            scheduler.schedule(Phase::ReorderProperties, move |s: &mut ResolverState, _: &mut Scheduler| {
                s.reorder_parts(owner, &declared);
                Ok(())
            })?;
        }
        Ok(())
    }

    /// Returns whether the part was created or scheduled
    fn dispatch_part(&mut self, scheduler: &mut Scheduler, owner: TypeId, part: &PartConfig) -> ScheduleResult<bool> {
        let owner_type = self.model.ty(owner);
        let (is_class, is_association) = (owner_type.is_class(), owner_type.is_association());

        match &part.kind {
            PartKindConfig::Property => Ok(self.create_property(owner, part)),
            PartKindConfig::End(_) => {
                if !is_association {
                    let message = format!(
                        "End declaration '{}' in '{}', which is not an association",
                        part.name,
                        self.type_name(owner)
                    );
                    self.error(message);
                    return Ok(false);
                }
                let part = part.clone();
                scheduler.schedule(Phase::CreateAssociationEnds, move |s: &mut ResolverState, _: &mut Scheduler| {
                    s.create_end(owner, &part);
                    Ok(())
                })?;
                Ok(true)
            }
            PartKindConfig::Reference(reference) => {
                if !is_class {
                    let message = format!(
                        "Reference declaration '{}' in '{}', which is not a class",
                        part.name,
                        self.type_name(owner)
                    );
                    self.error(message);
                    return Ok(false);
                }
                let (phase, topological) = reference_phase(reference, part.is_override);
                let part = part.clone();
                let job = move |s: &mut ResolverState, _: &mut Scheduler| {
                    s.create_reference(owner, &part);
                    Ok(())
                };
                if topological {
                    scheduler.schedule_for(phase, owner, job)?;
                } else {
                    scheduler.schedule(phase, job)?;
                }
                Ok(true)
            }
        }
    }

    fn create_reference(&mut self, owner: TypeId, part: &PartConfig) {
        let Some(reference) = part.as_reference() else {
            return;
        };
        if let Some(end) = &reference.end {
            self.create_end_reference(owner, part, end);
        } else if reference.is_forwards() {
            self.create_forward_reference(owner, part);
        } else {
            self.create_backward_reference(owner, part, reference);
        }
    }

    /// Resolve the declared type of a part
    ///
    /// An override without a declared type keeps the type of its definition.
    fn resolve_part_type(&mut self, owner: TypeId, part: &PartConfig) -> Option<TypeId> {
        let Some(spec) = &part.type_spec else {
            if part.is_override {
                if let Some(&overridden) = self.model.overridden_parts(owner, &part.name).first() {
                    return self.model.part_type(overridden);
                }
            }
            let message = format!("Part '{}' declares no type", self.part_name(owner, &part.name));
            self.error(message);
            return None;
        };
        let name = match QualifiedName::parse(spec) {
            Ok(name) => name,
            Err(err) => {
                let message = format!("Invalid type of part '{}'", self.part_name(owner, &part.name));
                self.protocol.error_caused_by(message, &err);
                return None;
            }
        };
        let resolved = self.model.find_type(&name, Some(self.model.ty(owner).module));
        if resolved.is_none() {
            let message = format!(
                "Cannot resolve type '{}' of part '{}'",
                spec,
                self.part_name(owner, &part.name)
            );
            self.error(message);
        }
        resolved
    }

    fn create_property(&mut self, owner: TypeId, part: &PartConfig) -> bool {
        let is_class = self.model.ty(owner).is_class();
        if is_class && !self.check_override_declaration(owner, part) {
            return false;
        }
        let Some(ty) = self.resolve_part_type(owner, part) else {
            return false;
        };
        let property = match self.model.add_property(owner, &part.name, ty) {
            Ok(property) => property,
            Err(err) => {
                let message = format!("Cannot create property '{}'", self.part_name(owner, &part.name));
                self.protocol.error_caused_by(message, &err);
                return false;
            }
        };
        if is_class {
            self.configure_class_part(property, part);
        } else {
            self.install_configuration(property, part);
        }
        true
    }

    fn create_end(&mut self, assoc: TypeId, part: &PartConfig) {
        let Some(ty) = self.resolve_part_type(assoc, part) else {
            return;
        };
        match self.model.add_end(assoc, &part.name, ty) {
            Ok(end) => self.install_configuration(end, part),
            Err(err) => {
                let message = format!("Cannot create association end '{}'", self.part_name(assoc, &part.name));
                self.protocol.error_caused_by(message, &err);
            }
        }
    }

    fn add_reference(&mut self, owner: TypeId, part: &PartConfig, end: PartId) {
        match self.model.add_reference(owner, &part.name, end) {
            Ok(reference) => self.configure_class_part(reference, part),
            Err(err) => {
                let message = format!("Cannot create reference '{}'", self.part_name(owner, &part.name));
                self.protocol.error_caused_by(message, &err);
            }
        }
    }

    fn create_end_reference(&mut self, owner: TypeId, part: &PartConfig, end_spec: &str) {
        let end_ref = match PartRef::parse(end_spec) {
            Ok(end_ref) => end_ref,
            Err(err) => {
                let message = format!("Invalid end of reference '{}'", self.part_name(owner, &part.name));
                self.protocol.error_caused_by(message, &err);
                return;
            }
        };
        let end = self
            .model
            .find_type(&end_ref.owner, Some(self.model.ty(owner).module))
            .and_then(|assoc| self.model.local_part(assoc, &end_ref.part));
        let Some(end) = end else {
            let message = format!(
                "End '{}' of reference '{}' cannot be resolved",
                end_spec,
                self.part_name(owner, &part.name)
            );
            self.error(message);
            return;
        };
        if self.model.part(end).end_data().is_none() {
            let message = format!(
                "Configured end '{}' of reference '{}' is not an association end",
                end_spec,
                self.part_name(owner, &part.name)
            );
            self.error(message);
            return;
        }
        if !self.check_override_declaration(owner, part) {
            return;
        }
        self.add_reference(owner, part, end);
    }

    fn create_forward_reference(&mut self, owner: TypeId, part: &PartConfig) {
        if !self.check_override_declaration(owner, part) {
            return;
        }
        let module = self.model.ty(owner).module;
        let assoc_name = synthetic_association_name(&self.model.ty(owner).name, &part.name);
        if self.model.type_by_name(module, &assoc_name).is_some() {
            self.protocol.info(format!(
                "Module '{}' already contains a type named '{}', skipping creation of association",
                self.model.module(module).name,
                assoc_name
            ));
            return;
        }
        let Some(target) = self.resolve_part_type(owner, part) else {
            return;
        };

        let ends = self.model.add_association(module, &assoc_name).and_then(|assoc| {
            let self_end = self.model.add_end(assoc, SELF_END_NAME, owner)?;
            let target_end = self.model.add_end(assoc, &part.name, target)?;
            Ok((self_end, target_end))
        });
        let (self_end, target_end) = match ends {
            Ok(ends) => ends,
            Err(err) => {
                let message = format!("Cannot create association '{}'", assoc_name);
                self.protocol.error_caused_by(message, &err);
                return;
            }
        };
        self.model.part_mut(self_end).multiplicity.multiple = true;

        if part.is_override {
            self.copy_definition_ends(owner, part, self_end, target_end);
        }
        self.add_reference(owner, part, target_end);
    }

    /// Copy the end settings of the overridden forward reference
    ///
    /// Only type and mandatory flag may change in an override; everything
    /// else, including the opposite end, comes from the definition.
    fn copy_definition_ends(&mut self, owner: TypeId, part: &PartConfig, self_end: PartId, target_end: PartId) {
        let Some(&overridden) = self.model.overridden_parts(owner, &part.name).first() else {
            return;
        };
        let definition = self.model.definition(overridden);
        let Some(definition_end) = self.model.part(definition).reference_end() else {
            return;
        };
        let copy = |state: &mut Self, from: PartId, to: PartId| {
            let source = state.model.part(from).clone();
            let target = state.model.part_mut(to);
            target.multiplicity = source.multiplicity;
            if let (Some(from_data), Some(to_data)) = (source.end_data(), target.end_data_mut()) {
                *to_data = *from_data;
            }
        };
        copy(self, definition_end, target_end);
        if let Some(definition_self) = self.model.other_end(definition_end) {
            copy(self, definition_self, self_end);
        }
    }

    fn create_backward_reference(&mut self, owner: TypeId, part: &PartConfig, reference: &ReferenceConfig) {
        let Some(inverse) = reference.inverse.clone() else {
            let message = format!(
                "Backward reference '{}' names no inverse reference",
                self.part_name(owner, &part.name)
            );
            self.error(message);
            return;
        };
        let Some(source) = self.resolve_part_type(owner, part) else {
            return;
        };
        if !self.model.ty(source).is_class() {
            let message = format!(
                "Type '{}' of backward reference '{}' is not a class",
                self.type_name(source),
                self.part_name(owner, &part.name)
            );
            self.error(message);
            return;
        }

        let forward = if part.is_override {
            let assoc_name = synthetic_association_name(&self.model.ty(source).name, &inverse);
            let module = self.model.ty(source).module;
            if self.model.type_by_name(module, &assoc_name).is_none() {
                let message = format!(
                    "Cannot override backward reference '{}': association '{}' not found, \
                     '{}' must override '{}' as well",
                    self.part_name(owner, &part.name),
                    assoc_name,
                    self.type_name(source),
                    inverse
                );
                self.error(message);
                return;
            }
            self.model.local_part(source, &inverse)
        } else {
            self.model.find_part(source, &inverse)
        };

        let forward_end = forward.and_then(|forward| self.model.part(forward).reference_end());
        let Some(forward_end) = forward_end else {
            let message = format!(
                "Inverse reference '{}' of backward reference '{}' not found",
                self.part_name(source, &inverse),
                self.part_name(owner, &part.name)
            );
            self.error(message);
            return;
        };
        let destination = self.model.part(forward_end).ty;
        if !destination.is_some_and(|d| self.model.ty(d).is_class()) {
            let message = format!(
                "Destination of inverse reference '{}' is not a class",
                self.part_name(source, &inverse)
            );
            self.error(message);
            return;
        }
        let Some(back_end) = self.model.other_end(forward_end) else {
            let message = format!(
                "Association of '{}' is not binary",
                self.part_name(source, &inverse)
            );
            self.error(message);
            return;
        };

        if !self.check_override_declaration(owner, part) {
            return;
        }
        self.add_reference(owner, part, back_end);
    }

    /// Multiplicity of an override: the definition's, with the declared mandatory flag
    pub(crate) fn override_multiplicity(&self, definition: PartId, part: &PartConfig) -> Multiplicity {
        let mut multiplicity = self.model.multiplicity(definition);
        if let Some(mandatory) = part.mandatory {
            multiplicity.mandatory = mandatory;
        }
        multiplicity
    }
}

/// Phase a reference is created in, and whether that phase is keyed by owner
fn reference_phase(reference: &ReferenceConfig, is_override: bool) -> (Phase, bool) {
    if reference.end.is_some() {
        (Phase::CreateReferences, false)
    } else if reference.is_forwards() {
        if is_override {
            (Phase::CreateReferenceOverrides, true)
        } else {
            (Phase::CreateReferences, false)
        }
    } else if is_override {
        (Phase::CreateBackReferenceOverrides, true)
    } else {
        (Phase::CreateBackReferences, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_config::ReferenceKind;

    #[test]
    fn test_synthetic_association_name() {
        assert_eq!(synthetic_association_name("Order", "items"), "Order$items");
    }

    #[test]
    fn test_reference_phase() {
        let forward = ReferenceConfig {
            kind: ReferenceKind::Forwards,
            ..ReferenceConfig::default()
        };
        assert_eq!(reference_phase(&forward, false), (Phase::CreateReferences, false));
        assert_eq!(reference_phase(&forward, true), (Phase::CreateReferenceOverrides, true));

        let backward = ReferenceConfig {
            inverse: Some("items".to_string()),
            ..ReferenceConfig::default()
        };
        assert_eq!(reference_phase(&backward, false), (Phase::CreateBackReferences, false));
        assert_eq!(reference_phase(&backward, true), (Phase::CreateBackReferenceOverrides, true));

        let explicit = ReferenceConfig {
            end: Some("Link#source".to_string()),
            ..ReferenceConfig::default()
        };
        assert_eq!(reference_phase(&explicit, true), (Phase::CreateReferences, false));
    }
}
