#![allow(missing_docs)]
//! Benchmark: construction of a deep class hierarchy
//!
//! Each level extends the previous one, overrides the inherited property and
//! the inherited forward reference, and adds a property of its own. Levels are
//! declared leaf first so every generalization is a forward reference.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use tessera_config::{ClassConfig, ModelConfig, ModuleConfig, PartConfig, PrimitiveConfig, TypeConfig};
use tessera_model::{Model, PrimitiveKind};
use tessera_resolve::ModelResolver;

fn hierarchy(depth: usize) -> ModelConfig {
    let mut module = ModuleConfig::new("bench")
        .with_type(TypeConfig::Primitive(PrimitiveConfig::new("String", PrimitiveKind::String)));
    for level in (0..depth).rev() {
        let mut class = ClassConfig::new(format!("Level{}", level))
            .with_part(PartConfig::property(&format!("own{}", level), "String"));
        if level == 0 {
            class = class
                .with_part(PartConfig::property("name", "String"))
                .with_part(PartConfig::reference("next", "Level0"));
        } else {
            class = class
                .extends(&format!("Level{}", level - 1))
                .unwrap()
                .with_part(PartConfig::property("name", "String").overriding().with_mandatory(true))
                .with_part(PartConfig::reference("next", &format!("Level{}", level)).overriding());
        }
        module = module.with_type(TypeConfig::Class(class));
    }
    ModelConfig::new().with_module(module)
}

fn bench_deep_hierarchy(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_hierarchy");
    for &depth in &[10usize, 100, 500] {
        let config = hierarchy(depth);
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &config, |b, config| {
            b.iter_batched(
                || ModelResolver::new(Model::new()),
                |mut resolver| {
                    resolver.create_model(config).unwrap();
                    resolver.complete().unwrap();
                    resolver.into_model()
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_deep_hierarchy);
criterion_main!(benches);
