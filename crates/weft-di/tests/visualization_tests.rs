//! DOT export of a registered graph

#![cfg(feature = "dev-tools")]

use rstest::*;
use std::sync::Arc;
use weft_di::{Container, Provider};

struct Mux;

struct Server;

struct Metrics;

#[fixture]
fn container() -> Container {
	let mut container = Container::new();
	container
		.provide(Provider::new::<Mux>().factory(|_| Ok(Mux)))
		.provide(
			Provider::new::<Server>()
				.param::<Mux>()
				.optional_param::<Metrics>()
				.prototype()
				.factory(|_| Ok(Server)),
		);
	container
}

#[rstest]
fn graph_lists_providers_and_edges(container: Container) {
	// Act
	let graph = container.graph();

	// Assert
	let stats = graph.statistics();
	assert_eq!(stats.singleton_count, 1);
	assert_eq!(stats.prototype_count, 1);
	assert_eq!(stats.unresolved_count, 1);
	assert_eq!(stats.edge_count, 2);
	assert!(graph.detect_cycles().is_empty());
	let optional: Vec<bool> = graph.edges().iter().map(|e| e.optional).collect();
	assert_eq!(optional, vec![false, true]);
}

#[rstest]
fn dot_output_has_edges(container: Container) {
	// Act
	let dot = container.graph().to_dot();

	// Assert
	assert!(dot.starts_with("digraph DependencyGraph {"));
	assert!(dot.contains("visualization_tests::Server\" -> \"visualization_tests::Mux\";"));
	assert!(dot.contains("[style=dashed]"));
}

#[rstest]
fn graph_includes_synthesized_groups() {
	// Arrange
	let mut container = Container::new();
	container
		.provide(Provider::new::<Mux>().named("a").factory(|_| Ok(Mux)))
		.provide(Provider::new::<Mux>().named("b").factory(|_| Ok(Mux)));
	let group = container.group::<Mux>().unwrap();

	// Act
	let graph = container.graph();

	// Assert
	assert_eq!(group.len(), 2);
	let group_node = graph.nodes().find(|n| n.kind == "group").unwrap();
	assert!(group_node.name.starts_with('['));
	let members = graph
		.edges()
		.iter()
		.filter(|e| e.from == group_node.name)
		.count();
	assert_eq!(members, 2);
	assert!(Arc::ptr_eq(&group[0], &container.extract_named::<Mux>("a").unwrap()));
}
