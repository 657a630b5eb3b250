//! Subcommand implementations.

use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;
use std::fmt::Write as _;
use std::path::Path;
use tessera_config::ModelConfig;
use tessera_core::Protocol;
use tessera_model::Model;
use tessera_replicate::GraphReplicator;
use tessera_resolve::{ModelResolver, ResolveError, ResolverConfig, TransientFactory};

/// Resolution switches shared by all subcommands
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Stop after the first phase that reports errors
    pub abort_on_errors: bool,
    /// Create roles and singletons
    pub singletons: bool,
    /// Groups known to the factory
    pub groups: Vec<String>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            abort_on_errors: true,
            singletons: true,
            groups: Vec::new(),
        }
    }
}

/// Read a JSON declaration
pub fn load(path: &Path) -> Result<ModelConfig> {
    let json = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    ModelConfig::from_json(&json).wrap_err_with(|| format!("Failed to parse {}", path.display()))
}

/// Resolve a declaration into a fresh model
///
/// Structural errors stay in the returned protocol; only fatal scheduling
/// errors fail.
pub fn resolve(config: &ModelConfig, options: &ResolveOptions) -> Result<(Model, Protocol)> {
    let factory = options
        .groups
        .iter()
        .fold(TransientFactory::new(), |factory, group| factory.with_group(group.as_str()));
    let mut resolver = ModelResolver::new(Model::new())
        .with_config(
            ResolverConfig::new()
                .with_abort_on_errors(options.abort_on_errors)
                .with_roles(options.singletons)
                .with_singletons(options.singletons),
        )
        .with_factory(factory);

    resolver.create_model(config)?;
    match resolver.complete() {
        Ok(()) | Err(ResolveError::Configuration { .. }) => {}
        Err(err) => return Err(err.into()),
    }
    let (model, protocol) = resolver.into_parts();
    tracing::info!(
        modules = model.module_count(),
        types = model.type_count(),
        parts = model.part_count(),
        errors = protocol.error_count(),
        "resolved"
    );
    Ok((model, protocol))
}

/// One line per diagnostic
pub fn render_diagnostics(protocol: &Protocol) -> String {
    let mut out = String::new();
    for diagnostic in protocol.diagnostics() {
        let _ = writeln!(out, "{}", diagnostic);
    }
    out
}

fn summary(model: &Model) -> String {
    format!(
        "{} module(s), {} type(s), {} part(s)",
        model.module_count(),
        model.type_count(),
        model.part_count()
    )
}

fn resolve_clean(path: &Path, options: &ResolveOptions) -> Result<Model> {
    let config = load(path)?;
    let (model, protocol) = resolve(&config, options)?;
    if protocol.has_errors() {
        bail!(
            "{} error(s) in {}\n{}",
            protocol.error_count(),
            path.display(),
            render_diagnostics(&protocol).trim_end()
        );
    }
    Ok(model)
}

/// Resolve and report every diagnostic
pub fn check(path: &Path, options: &ResolveOptions) -> Result<String> {
    let model = resolve_clean(path, options)?;
    Ok(format!("{}: ok, {}", path.display(), summary(&model)))
}

/// Resolve and copy the selected modules into a fresh model
pub fn copy(path: &Path, options: &ResolveOptions, modules: &[String]) -> Result<String> {
    let model = resolve_clean(path, options)?;
    let mut replicator = GraphReplicator::new();
    if !modules.is_empty() {
        replicator = replicator.with_modules(modules);
    }
    let replica = replicator.replicate(&model)?;
    Ok(format!("Copied {}", summary(replica.model())))
}

/// Resolve and serialize the graph
pub fn dump(path: &Path, options: &ResolveOptions) -> Result<String> {
    let model = resolve_clean(path, options)?;
    Ok(serde_json::to_string_pretty(&model)?)
}

/// Write command output to a file
pub fn write_output(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).wrap_err_with(|| format!("Failed to write {}", path.display()))
}
