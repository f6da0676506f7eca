//! Benchmark: compile and extraction hot paths

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;
use weft_di::{Container, Invocation, Provider};

struct Link {
	depth: usize,
}

trait Handler: Send + Sync {}

struct Route;

impl Handler for Route {}

fn chain(len: usize) -> Container {
	let mut container = Container::new();
	for index in 0..len {
		let builder = Provider::new::<Link>().prototype().named(index.to_string());
		let provider = if index + 1 < len {
			builder
				.named_param::<Link>((index + 1).to_string())
				.factory(|args| Ok(Link { depth: args.get::<Link>(0)?.depth + 1 }))
		} else {
			builder.factory(|_| Ok(Link { depth: 1 }))
		};
		container.provide(provider);
	}
	container.invoke_on_compile(Invocation::new().named_param::<Link>("0").run(|_| Ok(())));
	container
}

fn benchmark_singleton_extraction(c: &mut Criterion) {
	let mut container = Container::new();
	container.provide(Provider::value(String::from("cached")));
	container.compile().unwrap();

	c.bench_function("singleton_cache_hit", |b| {
		b.iter(|| black_box(container.extract::<String>().unwrap()));
	});
}

fn benchmark_prototype_chain(c: &mut Criterion) {
	let mut group = c.benchmark_group("prototype_chain");
	for len in [1usize, 10, 50] {
		let mut container = chain(len);
		container.compile().unwrap();
		group.bench_with_input(BenchmarkId::from_parameter(len), &container, |b, container| {
			b.iter(|| black_box(container.extract_named::<Link>("0").unwrap().depth));
		});
	}
	group.finish();
}

fn benchmark_compile(c: &mut Criterion) {
	c.bench_function("compile_chain_50", |b| {
		b.iter(|| {
			let mut container = chain(50);
			container.compile().unwrap();
			black_box(container)
		});
	});
}

fn benchmark_group_extraction(c: &mut Criterion) {
	let mut container = Container::new();
	for index in 0..32 {
		container.provide(
			Provider::new::<Route>()
				.named(index.to_string())
				.implements::<dyn Handler>(|r| r as Arc<dyn Handler>)
				.factory(|_| Ok(Route)),
		);
	}
	container.compile().unwrap();

	c.bench_function("group_32_handlers", |b| {
		b.iter(|| black_box(container.group::<dyn Handler>().unwrap().len()));
	});
}

criterion_group!(
	benches,
	benchmark_singleton_extraction,
	benchmark_prototype_chain,
	benchmark_compile,
	benchmark_group_extraction
);
criterion_main!(benches);
