//! Dependency graph export for development and debugging
//!
//! Renders the registered providers and their lookups in DOT format, which
//! can be fed to Graphviz.
//!
//! ## Example
//!
//! ```rust
//! use weft_di::visualization::DependencyGraph;
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_node("Database", "singleton", "constructor");
//! graph.add_node("UserService", "prototype", "constructor");
//! graph.add_dependency("UserService", "Database");
//!
//! let dot = graph.to_dot();
//! println!("{}", dot);
//! ```

use crate::compiler::Dependency;
use crate::schema::{Lookup, Schema};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt::Write;

/// Lifecycle label of lookups nothing answers yet.
const UNRESOLVED: &str = "unresolved";

/// Represents a node in the dependency graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
	/// Type and tags of the node
	pub name: String,
	/// "singleton", "prototype" or "unresolved"
	pub lifecycle: String,
	/// Build strategy: "constructor", "aggregate", "group" or "implicit"
	pub kind: String,
}

/// Edge from a requesting node to the node answering its lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
	pub from: String,
	pub to: String,
	pub optional: bool,
}

/// Dependency graph for visualization
#[derive(Debug, Default)]
pub struct DependencyGraph {
	nodes: IndexMap<String, GraphNode>,
	edges: Vec<GraphEdge>,
}

impl DependencyGraph {
	pub fn new() -> Self {
		Self::default()
	}

	/// Snapshot of every node in `schema`. Lookups that would need an
	/// implicit node not built yet point at an `unresolved` placeholder.
	pub(crate) fn from_schema(schema: &Schema) -> Self {
		let mut graph = Self::new();
		for node in schema.nodes() {
			graph.add_node(
				node.to_string(),
				node.lifecycle().as_str(),
				node.compiler().kind(),
			);
		}
		for node in schema.nodes() {
			let from = node.to_string();
			for dependency in node.compiler().dependencies() {
				match dependency {
					Dependency::Lookup { request, .. } => {
						let to = match schema.find(request) {
							Ok(Lookup::Found(id)) => schema.node(id).to_string(),
							_ => {
								let name = request.to_string();
								if !graph.nodes.contains_key(&name) {
									graph.add_node(name.clone(), UNRESOLVED, "implicit");
								}
								name
							}
						};
						graph.edges.push(GraphEdge {
							from: from.clone(),
							to,
							optional: request.is_optional(),
						});
					}
					Dependency::Member { node: member, .. } => {
						graph.add_dependency(from.clone(), schema.node(member).to_string());
					}
				}
			}
		}
		graph
	}

	/// Add a node to the graph
	pub fn add_node(
		&mut self,
		name: impl Into<String>,
		lifecycle: impl Into<String>,
		kind: impl Into<String>,
	) {
		let name = name.into();
		self.nodes.insert(
			name.clone(),
			GraphNode {
				name,
				lifecycle: lifecycle.into(),
				kind: kind.into(),
			},
		);
	}

	/// Add a required dependency edge from `from` to `to`
	pub fn add_dependency(&mut self, from: impl Into<String>, to: impl Into<String>) {
		self.edges.push(GraphEdge {
			from: from.into(),
			to: to.into(),
			optional: false,
		});
	}

	pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
		self.nodes.values()
	}

	pub fn edges(&self) -> &[GraphEdge] {
		&self.edges
	}

	/// Generate DOT format output for Graphviz
	///
	/// # Example
	///
	/// ```rust
	/// use weft_di::visualization::DependencyGraph;
	///
	/// let mut graph = DependencyGraph::new();
	/// graph.add_node("Database", "singleton", "constructor");
	/// graph.add_node("UserService", "prototype", "constructor");
	/// graph.add_dependency("UserService", "Database");
	///
	/// let dot = graph.to_dot();
	/// assert!(dot.contains("digraph"));
	/// assert!(dot.contains("\"UserService\" -> \"Database\";"));
	/// ```
	pub fn to_dot(&self) -> String {
		let mut output = String::from("digraph DependencyGraph {\n");
		output.push_str("  rankdir=LR;\n");
		output.push_str("  node [shape=box, style=rounded];\n\n");

		for node in self.nodes.values() {
			let color = match node.lifecycle.as_str() {
				"singleton" => "lightblue",
				"prototype" => "lightyellow",
				_ => "white",
			};
			let _ = writeln!(
				output,
				"  \"{}\" [label=\"{}\\n({})\", fillcolor={}, style=filled];",
				escape(&node.name),
				escape(&node.name),
				node.kind,
				color
			);
		}

		output.push('\n');

		for edge in &self.edges {
			let style = if edge.optional { " [style=dashed]" } else { "" };
			let _ = writeln!(
				output,
				"  \"{}\" -> \"{}\"{};",
				escape(&edge.from),
				escape(&edge.to),
				style
			);
		}

		output.push_str("}\n");
		output
	}

	/// Detect circular dependencies in the graph
	///
	/// Returns each cycle found as the list of node names along it.
	pub fn detect_cycles(&self) -> Vec<Vec<String>> {
		let mut cycles = Vec::new();
		let mut visited = HashSet::new();
		let mut rec_stack = HashSet::new();

		for name in self.nodes.keys() {
			if !visited.contains(name.as_str()) {
				let mut path = Vec::new();
				self.dfs_detect_cycles(name, &mut visited, &mut rec_stack, &mut path, &mut cycles);
			}
		}

		cycles
	}

	fn dfs_detect_cycles<'g>(
		&'g self,
		node: &'g str,
		visited: &mut HashSet<&'g str>,
		rec_stack: &mut HashSet<&'g str>,
		path: &mut Vec<&'g str>,
		cycles: &mut Vec<Vec<String>>,
	) {
		visited.insert(node);
		rec_stack.insert(node);
		path.push(node);

		for edge in self.edges.iter().filter(|edge| edge.from == node) {
			let dep = edge.to.as_str();
			if !visited.contains(dep) {
				self.dfs_detect_cycles(dep, visited, rec_stack, path, cycles);
			} else if rec_stack.contains(dep)
				&& let Some(start) = path.iter().position(|p| *p == dep)
			{
				cycles.push(path[start..].iter().map(|p| p.to_string()).collect());
			}
		}

		path.pop();
		rec_stack.remove(node);
	}

	/// Get statistics about the dependency graph
	pub fn statistics(&self) -> GraphStatistics {
		let count = |lifecycle: &str| {
			self.nodes
				.values()
				.filter(|n| n.lifecycle == lifecycle)
				.count()
		};

		GraphStatistics {
			node_count: self.nodes.len(),
			edge_count: self.edges.len(),
			singleton_count: count("singleton"),
			prototype_count: count("prototype"),
			unresolved_count: count(UNRESOLVED),
		}
	}
}

fn escape(name: &str) -> String {
	name.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Statistics about a dependency graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphStatistics {
	/// Total number of nodes
	pub node_count: usize,
	/// Total number of edges
	pub edge_count: usize,
	/// Number of singleton nodes
	pub singleton_count: usize,
	/// Number of prototype nodes
	pub prototype_count: usize,
	/// Lookups with no node behind them yet
	pub unresolved_count: usize,
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_detect_cycles() {
		// Arrange
		let mut graph = DependencyGraph::new();
		graph.add_node("A", "singleton", "constructor");
		graph.add_node("B", "singleton", "constructor");
		graph.add_dependency("A", "B");
		graph.add_dependency("B", "A");

		// Act
		let cycles = graph.detect_cycles();

		// Assert
		assert_eq!(cycles, vec![vec!["A".to_string(), "B".to_string()]]);
	}

	#[rstest]
	fn test_statistics() {
		// Arrange
		let mut graph = DependencyGraph::new();
		graph.add_node("A", "singleton", "constructor");
		graph.add_node("B", "prototype", "constructor");
		graph.add_node("C", UNRESOLVED, "implicit");
		graph.add_dependency("B", "A");

		// Act
		let stats = graph.statistics();

		// Assert
		assert_eq!(
			stats,
			GraphStatistics {
				node_count: 3,
				edge_count: 1,
				singleton_count: 1,
				prototype_count: 1,
				unresolved_count: 1,
			}
		);
	}

	#[rstest]
	fn test_dot_escapes_quotes() {
		// Arrange
		let mut graph = DependencyGraph::new();
		graph.add_node("Logger[name:\"file\"]", "singleton", "constructor");

		// Act
		let dot = graph.to_dot();

		// Assert
		assert!(dot.contains("\"Logger[name:\\\"file\\\"]\""));
	}
}
