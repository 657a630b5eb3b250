//! Translation of declarations into scheduled construction.
//!
//! [`ModelResolver::create_model`] walks a declaration tree, creates module
//! and type shells right away and queues everything that depends on other
//! declarations into the phases of a [`PhaseScheduler`].
//! [`ModelResolver::complete`] then drains the phases.
//!
//! Structural problems are recorded in the [`Protocol`] and abandon only
//! the offending declaration. Resolving a declaration against a model that
//! already contains it is additive: existing modules, types and parts are
//! kept and only missing ones are created.

use crate::config::ResolverConfig;
use crate::error::{ResolveError, ResolveResult};
use crate::factory::ModelFactory;
use indexmap::{IndexMap, IndexSet};
use tessera_config::{
    AssociationConfig, ClassConfig, EnumerationConfig, ExtendsConfig, ModelConfig, ModuleConfig,
    PartConfig, PrimitiveConfig, SingletonConfig, TypeConfig,
};
use tessera_core::{ModuleId, Protocol, QualifiedName, RoleRef, TypeId};
use tessera_model::{Annotation, Annotations, Classifier, Model, PrimitiveData};
use tessera_sched::{Completion, JobContext, Phase, PhaseScheduler, ScheduleResult};

/// Scheduler over the resolver state
pub(crate) type Scheduler = PhaseScheduler<ResolverState>;

/// State shared by all construction jobs
pub struct ResolverState {
    pub(crate) model: Model,
    pub(crate) protocol: Protocol,
    pub(crate) factory: Option<Box<dyn ModelFactory>>,
    pub(crate) config: ResolverConfig,
}

impl JobContext for ResolverState {
    type Node = TypeId;

    fn predecessors(&self, node: TypeId) -> Vec<TypeId> {
        self.model.generalizations(node).to_vec()
    }

    fn describe(&self, node: TypeId) -> String {
        self.model.qualified_name(node).to_string()
    }

    fn protocol(&self) -> &Protocol {
        &self.protocol
    }
}

/// Builds a type graph from declarations
pub struct ModelResolver {
    state: ResolverState,
    scheduler: Scheduler,
}

impl ModelResolver {
    /// Create a resolver extending `model`
    #[must_use]
    pub fn new(model: Model) -> Self {
        Self {
            state: ResolverState {
                model,
                protocol: Protocol::new(),
                factory: None,
                config: ResolverConfig::default(),
            },
            scheduler: PhaseScheduler::new(),
        }
    }

    /// Set the configuration
    #[must_use]
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.scheduler = PhaseScheduler::new().with_abort_on_errors(config.abort_on_errors);
        self.state.config = config;
        self
    }

    /// Install the factory creating roles and singletons
    ///
    /// Without a factory, roles and singletons are not created.
    #[must_use]
    pub fn with_factory(mut self, factory: impl ModelFactory + 'static) -> Self {
        self.state.factory = Some(Box::new(factory));
        self
    }

    /// The model under construction
    #[must_use]
    pub fn model(&self) -> &Model {
        &self.state.model
    }

    /// Diagnostics recorded so far
    #[must_use]
    pub fn protocol(&self) -> &Protocol {
        &self.state.protocol
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &ResolverConfig {
        &self.state.config
    }

    /// Give up the resolver, returning the model and the protocol
    #[must_use]
    pub fn into_parts(self) -> (Model, Protocol) {
        (self.state.model, self.state.protocol)
    }

    /// Give up the resolver, returning the model
    #[must_use]
    pub fn into_model(self) -> Model {
        self.state.model
    }

    /// Schedule construction of every declared module
    ///
    /// # Errors
    ///
    /// Returns error if a job cannot be scheduled
    pub fn create_model(&mut self, config: &ModelConfig) -> ResolveResult<()> {
        for module in &config.modules {
            self.create_module(module)?;
        }
        Ok(())
    }

    /// Schedule construction of one module
    ///
    /// Returns the module, or `None` if it could not be created.
    ///
    /// # Errors
    ///
    /// Returns error if a job cannot be scheduled
    pub fn create_module(&mut self, config: &ModuleConfig) -> ResolveResult<Option<ModuleId>> {
        let Self { state, scheduler } = self;
        let module = match state.model.make_module(&config.name) {
            Ok(module) => module,
            Err(err) => {
                state
                    .protocol
                    .error_caused_by(format!("Cannot create module '{}'", config.name), &err);
                return Ok(None);
            }
        };
        tracing::debug!(module = %config.name, types = config.types.len(), "scheduling module");

        for annotation in &config.annotations {
            state.model.module_mut(module).annotations.set(annotation.clone());
        }
        for ty in &config.types {
            state.add_type(scheduler, module, ty)?;
        }

        if state.config.create_roles {
            for role in &config.roles {
                let role = role.clone();
                scheduler.schedule(Phase::CreateRoles, move |s: &mut ResolverState, _: &mut Scheduler| {
                    s.create_role(module, &role);
                    Ok(())
                })?;
            }
        }
        if state.config.create_singletons {
            for singleton in &config.singletons {
                let singleton = singleton.clone();
                scheduler.schedule(Phase::CreateSingletons, move |s: &mut ResolverState, _: &mut Scheduler| {
                    s.create_singleton(module, &singleton);
                    Ok(())
                })?;
            }
        }
        Ok(Some(module))
    }

    /// Run every scheduled phase
    ///
    /// Construction already performed is kept even if errors are reported.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Schedule`] on a fatal scheduling error and
    /// [`ResolveError::Configuration`] if the protocol holds errors
    pub fn complete(&mut self) -> ResolveResult<()> {
        let completion = self.scheduler.complete(&mut self.state)?;
        if let Completion::Aborted { after } = completion {
            tracing::debug!(%after, "construction aborted");
        }
        if self.state.protocol.has_errors() {
            return Err(ResolveError::Configuration {
                diagnostics: self.state.protocol.errors().cloned().collect(),
            });
        }
        Ok(())
    }
}

impl ResolverState {
    pub(crate) fn error(&mut self, message: impl Into<String>) {
        self.protocol.error(message);
    }

    pub(crate) fn type_name(&self, ty: TypeId) -> String {
        self.model.qualified_name(ty).to_string()
    }

    fn set_type_annotations(&mut self, ty: TypeId, annotations: &[Annotation]) {
        let target = &mut self.model.ty_mut(ty).annotations;
        for annotation in annotations {
            target.set(annotation.clone());
        }
    }

    fn add_type(&mut self, scheduler: &mut Scheduler, module: ModuleId, config: &TypeConfig) -> ScheduleResult<()> {
        match config {
            TypeConfig::Class(class) => self.add_class(scheduler, module, class),
            TypeConfig::Association(assoc) => self.add_association(scheduler, module, assoc),
            TypeConfig::Primitive(primitive) => {
                self.add_primitive(module, primitive);
                Ok(())
            }
            TypeConfig::Enumeration(enumeration) => {
                self.add_enumeration(module, enumeration);
                Ok(())
            }
        }
    }

    /// Existing type of the given name and kind; reports a kind clash
    fn existing_type(&mut self, module: ModuleId, name: &str, kind: &str) -> Result<Option<TypeId>, ()> {
        let Some(existing) = self.model.type_by_name(module, name) else {
            return Ok(None);
        };
        let actual = self.model.ty(existing).kind_name();
        if actual != kind {
            let message = format!(
                "Type '{}' already exists as {}, cannot declare it as {}",
                self.type_name(existing),
                actual,
                kind
            );
            self.error(message);
            return Err(());
        }
        Ok(Some(existing))
    }

    fn add_class(&mut self, scheduler: &mut Scheduler, module: ModuleId, config: &ClassConfig) -> ScheduleResult<()> {
        let Ok(existing) = self.existing_type(module, &config.name, "class") else {
            return Ok(());
        };
        let (class, is_new) = match existing {
            Some(class) => (class, false),
            None => match self.model.add_class(module, &config.name, config.is_abstract, config.is_final) {
                Ok(class) => {
                    self.set_type_annotations(class, &config.annotations);
                    let generalizations = config.generalizations.clone();
                    scheduler.schedule(Phase::BuildTypeHierarchy, move |s: &mut ResolverState, _: &mut Scheduler| {
                        s.resolve_generalizations(class, &generalizations);
                        Ok(())
                    })?;
                    (class, true)
                }
                Err(err) => {
                    self.protocol
                        .error_caused_by(format!("Cannot create class '{}'", config.name), &err);
                    return Ok(());
                }
            },
        };

        let parts = config.parts.clone();
        scheduler.schedule_for(Phase::CreateParts, class, move |s: &mut ResolverState, sched: &mut Scheduler| {
            s.create_parts(sched, class, is_new, &parts)
        })?;
        scheduler.schedule(Phase::Cleanup, move |s: &mut ResolverState, _: &mut Scheduler| {
            s.complete_class(class);
            Ok(())
        })
    }

    fn add_association(
        &mut self,
        scheduler: &mut Scheduler,
        module: ModuleId,
        config: &AssociationConfig,
    ) -> ScheduleResult<()> {
        let Ok(existing) = self.existing_type(module, &config.name, "association") else {
            return Ok(());
        };
        let (assoc, is_new) = match existing {
            Some(assoc) => (assoc, false),
            None => match self.model.add_association(module, &config.name) {
                Ok(assoc) => {
                    self.set_type_annotations(assoc, &config.annotations);
                    let subsets = config.subsets.clone();
                    scheduler.schedule(Phase::BuildTypeHierarchy, move |s: &mut ResolverState, _: &mut Scheduler| {
                        s.resolve_subsets(assoc, &subsets);
                        Ok(())
                    })?;
                    (assoc, true)
                }
                Err(err) => {
                    self.protocol
                        .error_caused_by(format!("Cannot create association '{}'", config.name), &err);
                    return Ok(());
                }
            },
        };

        let parts = config.parts.clone();
        scheduler.schedule_for(Phase::CreateParts, assoc, move |s: &mut ResolverState, sched: &mut Scheduler| {
            s.create_parts(sched, assoc, is_new, &parts)
        })
    }

    fn add_primitive(&mut self, module: ModuleId, config: &PrimitiveConfig) {
        let Ok(existing) = self.existing_type(module, &config.name, "primitive") else {
            return;
        };
        if existing.is_some() {
            return;
        }
        let mut data = PrimitiveData::new(config.kind);
        if let Some(mapping) = &config.storage_mapping {
            data.storage_mapping = mapping.clone();
        }
        data.db_type = config.db_type.clone();
        data.db_size = config.db_size;
        data.db_precision = config.db_precision;
        data.binary = config.binary;

        match self.model.add_primitive(module, &config.name, data) {
            Ok(primitive) => self.set_type_annotations(primitive, &config.annotations),
            Err(err) => self
                .protocol
                .error_caused_by(format!("Cannot create primitive '{}'", config.name), &err),
        }
    }

    fn add_enumeration(&mut self, module: ModuleId, config: &EnumerationConfig) {
        let Ok(existing) = self.existing_type(module, &config.name, "enumeration") else {
            return;
        };
        let enumeration = match existing {
            Some(enumeration) => enumeration,
            None => match self.model.add_enumeration(module, &config.name) {
                Ok(enumeration) => {
                    self.set_type_annotations(enumeration, &config.annotations);
                    enumeration
                }
                Err(err) => {
                    self.protocol
                        .error_caused_by(format!("Cannot create enumeration '{}'", config.name), &err);
                    return;
                }
            },
        };

        for classifier in &config.classifiers {
            let Some(data) = self.model.ty(enumeration).as_enumeration() else {
                return;
            };
            if data.classifiers.iter().any(|c| c.name == classifier.name) {
                continue;
            }
            if classifier.is_default {
                if let Some(default) = data.default_classifier() {
                    let message = format!(
                        "Classifier '{}' of '{}' cannot be default, '{}' already is",
                        classifier.name,
                        self.type_name(enumeration),
                        default.name
                    );
                    self.error(message);
                    continue;
                }
            }
            let mut annotations = Annotations::new();
            for annotation in &classifier.annotations {
                annotations.set(annotation.clone());
            }
            let result = self.model.add_classifier(
                enumeration,
                Classifier {
                    name: classifier.name.clone(),
                    is_default: classifier.is_default,
                    annotations,
                },
            );
            if let Err(err) = result {
                self.protocol.error_caused_by(
                    format!("Cannot add classifier '{}'", classifier.name),
                    &err,
                );
            }
        }
    }

    fn lookup_extends(&self, owner: TypeId, config: &ExtendsConfig) -> Option<TypeId> {
        self.model.lookup_type(
            self.model.ty(owner).module,
            &config.scope,
            config.module.as_deref(),
            &config.type_name,
        )
    }

    fn resolve_generalizations(&mut self, class: TypeId, configs: &[ExtendsConfig]) {
        let mut generalizations = Vec::with_capacity(configs.len());
        for config in configs {
            let Some(generalization) = self.lookup_extends(class, config) else {
                let message = format!(
                    "Cannot resolve generalization '{}' of '{}'",
                    config.display_name(),
                    self.type_name(class)
                );
                self.error(message);
                continue;
            };
            match self.model.ty(generalization).as_class() {
                None => {
                    let message = format!(
                        "Generalization '{}' of '{}' is not a class",
                        self.type_name(generalization),
                        self.type_name(class)
                    );
                    self.error(message);
                }
                Some(data) if data.is_final => {
                    let message = format!(
                        "Class '{}' cannot extend final class '{}'",
                        self.type_name(class),
                        self.type_name(generalization)
                    );
                    self.error(message);
                }
                Some(_) => generalizations.push(generalization),
            }
        }
        if let Err(err) = self.model.set_generalizations(class, generalizations) {
            let message = format!("Cannot set generalizations of '{}'", self.type_name(class));
            self.protocol.error_caused_by(message, &err);
        }
    }

    fn resolve_subsets(&mut self, assoc: TypeId, configs: &[ExtendsConfig]) {
        for config in configs {
            let Some(subset) = self.lookup_extends(assoc, config) else {
                let message = format!(
                    "Cannot resolve subset '{}' of '{}'",
                    config.display_name(),
                    self.type_name(assoc)
                );
                self.error(message);
                continue;
            };
            if let Err(err) = self.model.add_subset(assoc, subset) {
                let message = format!("Invalid subset of '{}'", self.type_name(assoc));
                self.protocol.error_caused_by(message, &err);
            }
        }
    }

    /// Sort the local parts of `owner` into declared order
    ///
    /// Declared parts come first in declaration order, all others follow
    /// sorted by name.
    pub(crate) fn reorder_parts(&mut self, owner: TypeId, declared: &[String]) {
        let index: IndexMap<&str, usize> = declared
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let mut parts = self.model.local_parts(owner).to_vec();
        parts.sort_by(|&a, &b| {
            let a = &self.model.part(a).name;
            let b = &self.model.part(b).name;
            match (index.get(a.as_str()), index.get(b.as_str())) {
                (Some(x), Some(y)) => x.cmp(y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.cmp(b),
            }
        });
        if let Err(err) = self.model.set_local_parts(owner, parts) {
            let message = format!("Cannot reorder parts of '{}'", self.type_name(owner));
            self.protocol.error_caused_by(message, &err);
        }
    }

    /// Mark `class` complete, its generalizations first
    fn complete_class(&mut self, class: TypeId) {
        let mut visited = IndexSet::new();
        let mut stack = vec![(class, false)];
        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                if self.model.mark_complete(current).is_err() {
                    tracing::debug!(ty = %current, "not a class, skipping completion");
                }
                continue;
            }
            if self.model.is_complete(current) || !visited.insert(current) {
                continue;
            }
            stack.push((current, true));
            for &generalization in self.model.generalizations(current).iter().rev() {
                stack.push((generalization, false));
            }
        }
    }

    fn find_role(&self, module: ModuleId, name: &str) -> Option<RoleRef> {
        self.model
            .module(module)
            .role(name)
            .or_else(|| self.model.modules().find_map(|m| self.model.module(m).role(name)))
    }

    fn create_role(&mut self, module: ModuleId, name: &str) {
        let module_name = self.model.module(module).name.clone();
        if self.model.module(module).role(name).is_some() {
            self.protocol.warn(format!(
                "Role '{}' already exists in module '{}', reusing it",
                name, module_name
            ));
            return;
        }
        let Some(factory) = self.factory.as_mut() else {
            tracing::debug!(role = %name, "no factory installed, skipping role");
            return;
        };
        let role = match factory.create_role(&module_name, name) {
            Ok(role) => role,
            Err(err) => {
                self.protocol
                    .error_caused_by(format!("Cannot create role '{}' in module '{}'", name, module_name), &err);
                return;
            }
        };
        if let Err(err) = self.model.add_role(module, name, role) {
            self.protocol
                .error_caused_by(format!("Cannot bind role '{}' to module '{}'", name, module_name), &err);
        }
    }

    fn create_singleton(&mut self, module: ModuleId, config: &SingletonConfig) {
        let module_name = self.model.module(module).name.clone();
        if self.model.module(module).singleton(&config.name).is_some() {
            self.protocol.info(format!(
                "Singleton '{}' already exists in module '{}'",
                config.name, module_name
            ));
            return;
        }

        let class_name = match QualifiedName::parse(&config.type_spec) {
            Ok(name) => name,
            Err(err) => {
                self.protocol
                    .error_caused_by(format!("Invalid type of singleton '{}'", config.name), &err);
                return;
            }
        };
        let Some(class) = self.model.find_type(&class_name, Some(module)) else {
            self.error(format!(
                "Class '{}' of singleton '{}' in module '{}' not found",
                config.type_spec, config.name, module_name
            ));
            return;
        };
        match self.model.ty(class).as_class() {
            None => {
                let message = format!(
                    "Type '{}' of singleton '{}' is not a class",
                    self.type_name(class),
                    config.name
                );
                self.error(message);
                return;
            }
            Some(data) if data.is_abstract => {
                let message = format!(
                    "Class '{}' of singleton '{}' is abstract",
                    self.type_name(class),
                    config.name
                );
                self.error(message);
                return;
            }
            Some(_) => {}
        }

        let qualified = self.model.qualified_name(class);
        let Some(factory) = self.factory.as_mut() else {
            tracing::debug!(singleton = %config.name, "no factory installed, skipping singleton");
            return;
        };
        let object = match factory.create_object(class, &qualified) {
            Ok(object) => object,
            Err(err) => {
                self.protocol
                    .error_caused_by(format!("Cannot instantiate singleton '{}'", config.name), &err);
                return;
            }
        };
        if let Err(err) = self.model.add_singleton(module, &config.name, object) {
            self.protocol
                .error_caused_by(format!("Cannot register singleton '{}'", config.name), &err);
            return;
        }

        for assignment in &config.assignments {
            let group = self.factory.as_ref().and_then(|f| f.find_group(&assignment.group));
            if group.is_none() {
                self.error(format!(
                    "Unknown group '{}' in role assignment of singleton '{}'",
                    assignment.group, config.name
                ));
            }
            for role_name in &assignment.roles {
                let role = self.find_role(module, role_name);
                if role.is_none() {
                    self.error(format!(
                        "Unknown role '{}' in role assignment of singleton '{}'",
                        role_name, config.name
                    ));
                }
                let (Some(group), Some(role)) = (group, role) else {
                    continue;
                };
                let result = match self.factory.as_mut() {
                    Some(factory) => factory.assign_role(object, group, role),
                    None => Ok(()),
                };
                if let Err(err) = result {
                    self.protocol.error_caused_by(
                        format!("Cannot assign role '{}' on singleton '{}'", role_name, config.name),
                        &err,
                    );
                }
            }
        }
    }
}

/// Parts declared for a type, by name in declared order
pub(crate) fn declared_names(parts: &[PartConfig]) -> Vec<String> {
    parts.iter().map(|p| p.name.clone()).collect()
}
