//! Circular dependency detection
//!
//! The detector walks the graph below a root before anything under it is
//! built, so resolution never recurses into a cycle and never waits on a build
//! lock it already holds.
//!
//! ## Marks
//!
//! - **Visiting**: on the current DFS path; reaching it again is a cycle
//! - **Done**: fully explored in this walk, shared subgraphs are not re-walked
//!
//! Nodes proven at the current schema generation are stamped, so later walks
//! (and resolutions with a verified root) skip them entirely.

use crate::compiler::Dependency;
use crate::error::{DiError, DiResult};
use crate::key::Request;
use crate::node::NodeId;
use crate::schema::Schema;
use std::collections::HashMap;

/// Maximum resolution depth (prevents pathological cases)
pub const MAX_RESOLUTION_DEPTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
	Visiting,
	Done,
}

pub(crate) struct CycleDetector<'s> {
	schema: &'s mut Schema,
	marks: HashMap<NodeId, Mark>,
	path: Vec<NodeId>,
	max_depth: usize,
	generation: u64,
}

impl<'s> CycleDetector<'s> {
	pub(crate) fn new(schema: &'s mut Schema, max_depth: usize) -> Self {
		let generation = schema.generation();
		Self {
			schema,
			marks: HashMap::new(),
			path: Vec::new(),
			max_depth,
			generation,
		}
	}

	/// Locates (synthesizing if needed) the node answering `request` and
	/// proves its subgraph.
	///
	/// Returns `None` for an optional request with no provider.
	pub(crate) fn verify_request(&mut self, request: &Request) -> DiResult<Option<NodeId>> {
		match self.schema.materialize(request) {
			Ok(id) => {
				self.visit(id)?;
				Ok(Some(id))
			}
			Err(err) if request.is_optional() && err.is_not_found() => Ok(None),
			Err(err) => Err(err),
		}
	}

	pub(crate) fn verify_node(&mut self, id: NodeId) -> DiResult<()> {
		self.visit(id)
	}

	fn visit(&mut self, id: NodeId) -> DiResult<()> {
		let node = self.schema.node(id);
		if node.is_verified(self.generation) {
			return Ok(());
		}
		match self.marks.get(&id) {
			Some(Mark::Done) => return Ok(()),
			Some(Mark::Visiting) => return Err(self.cycle_error(id)),
			None => {}
		}
		if self.path.len() >= self.max_depth {
			return Err(DiError::DepthExceeded {
				depth: self.path.len() + 1,
			});
		}

		self.marks.insert(id, Mark::Visiting);
		self.path.push(id);

		for dependency in node.compiler().dependencies() {
			let child = match dependency {
				Dependency::Lookup { request, .. } => match self.schema.materialize(request) {
					Ok(child) => child,
					Err(err) if request.is_optional() && err.is_not_found() => continue,
					Err(err) => return Err(err.requested_by(&*node)),
				},
				Dependency::Member { node: member, .. } => member,
			};
			self.visit(child).map_err(|err| err.requested_by(&*node))?;
		}

		self.path.pop();
		self.marks.insert(id, Mark::Done);
		node.mark_verified(self.generation);
		tracing::trace!(node = %node, "subgraph verified");
		Ok(())
	}

	/// Builds the `A -> B -> A` path from the first occurrence of `id`.
	fn cycle_error(&self, id: NodeId) -> DiError {
		let start = self.path.iter().position(|&n| n == id).unwrap_or(0);
		let path = self.path[start..]
			.iter()
			.chain(std::iter::once(&id))
			.map(|&n| self.schema.node(n).to_string())
			.collect::<Vec<_>>()
			.join(" -> ");
		tracing::debug!(path = %path, "dependency cycle detected");
		DiError::DependencyCycle { path }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::compiler::{Built, Compiler};
	use crate::instance::Instance;
	use crate::key::TypeKey;
	use crate::node::Lifecycle;
	use crate::schema::NodeSpec;
	use crate::tags::TagSet;
	use rstest::rstest;
	use std::sync::Arc;

	struct A;
	struct B;
	struct C;

	fn provide<T: Send + Sync + 'static>(schema: &mut Schema, params: Vec<Request>) -> NodeId {
		schema.register(NodeSpec {
			key: TypeKey::of::<T>(),
			tags: TagSet::new(),
			lifecycle: Lifecycle::Singleton,
			compiler: Compiler::constructor(
				params,
				Arc::new(|_| Ok(Built::new(Instance::from_value(())))),
			),
			views: Vec::new(),
		})
	}

	#[rstest]
	fn test_two_node_cycle_reports_path() {
		// Arrange
		let mut schema = Schema::new();
		let a = provide::<A>(&mut schema, vec![Request::of::<B>()]);
		provide::<B>(&mut schema, vec![Request::of::<A>()]);
		let mut detector = CycleDetector::new(&mut schema, MAX_RESOLUTION_DEPTH);

		// Act
		let err = detector.verify_node(a).unwrap_err();

		// Assert
		let DiError::DependencyCycle { path } = &err else {
			panic!("expected a cycle, got {err:?}");
		};
		let names: Vec<&str> = path
			.split(" -> ")
			.map(|name| name.rsplit("::").next().unwrap())
			.collect();
		assert_eq!(names, vec!["A", "B", "A"]);
	}

	#[rstest]
	fn test_diamond_is_not_a_cycle() {
		// Arrange
		let mut schema = Schema::new();
		provide::<C>(&mut schema, vec![]);
		provide::<B>(&mut schema, vec![Request::of::<C>()]);
		let a = provide::<A>(&mut schema, vec![Request::of::<B>(), Request::of::<C>()]);
		let generation = schema.generation();

		// Act
		CycleDetector::new(&mut schema, MAX_RESOLUTION_DEPTH)
			.verify_node(a)
			.unwrap();

		// Assert
		assert!(schema.node(a).is_verified(generation));
	}

	#[rstest]
	fn test_missing_dependency_is_wrapped_with_requester() {
		// Arrange
		let mut schema = Schema::new();
		let a = provide::<A>(&mut schema, vec![Request::of::<B>()]);

		// Act
		let err = CycleDetector::new(&mut schema, MAX_RESOLUTION_DEPTH)
			.verify_node(a)
			.unwrap_err();

		// Assert
		assert_eq!(err.requesters().len(), 1);
		assert!(err.root_cause().is_not_found());
	}

	#[rstest]
	fn test_missing_optional_dependency_is_skipped() {
		// Arrange
		let mut schema = Schema::new();
		let a = provide::<A>(&mut schema, vec![Request::of::<B>().optional()]);

		// Act
		let result = CycleDetector::new(&mut schema, MAX_RESOLUTION_DEPTH).verify_node(a);

		// Assert
		assert!(result.is_ok());
	}

	#[rstest]
	fn test_depth_limit() {
		// Arrange
		let mut schema = Schema::new();
		provide::<C>(&mut schema, vec![]);
		provide::<B>(&mut schema, vec![Request::of::<C>()]);
		let a = provide::<A>(&mut schema, vec![Request::of::<B>()]);

		// Act
		let err = CycleDetector::new(&mut schema, 2).verify_node(a).unwrap_err();

		// Assert
		assert!(matches!(err, DiError::DepthExceeded { depth: 3 }));
	}
}
