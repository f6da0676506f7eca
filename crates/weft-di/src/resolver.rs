//! Depth-first construction of verified subgraphs

use crate::cleanup::CleanupChain;
use crate::compiler::Dependency;
use crate::error::{DiError, DiResult};
use crate::instance::{Arguments, Instance};
use crate::key::Request;
use crate::node::{Lifecycle, Node, NodeId};
use crate::schema::{Lookup, Schema};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Borrowed view of the container state needed to build values.
///
/// Never holds a schema lock across a recursive call.
pub(crate) struct Resolver<'c> {
	schema: &'c RwLock<Schema>,
	cleanups: &'c CleanupChain,
	closed: &'c AtomicBool,
}

impl<'c> Resolver<'c> {
	pub(crate) fn new(
		schema: &'c RwLock<Schema>,
		cleanups: &'c CleanupChain,
		closed: &'c AtomicBool,
	) -> Self {
		Self {
			schema,
			cleanups,
			closed,
		}
	}

	/// Resolves `request` and presents the value as the requested type.
	///
	/// An optional request whose own lookup finds nothing yields `None`;
	/// failures further down always propagate.
	pub(crate) fn resolve_request(&self, request: &Request) -> DiResult<Option<Instance>> {
		let id = match self.locate(request) {
			Ok(id) => id,
			Err(err) if request.is_optional() && err.is_not_found() => return Ok(None),
			Err(err) => return Err(err),
		};
		let node = self.node(id);
		let instance = self.resolve_node(&node)?;
		node.view(instance, request.key()).map(Some)
	}

	/// Resolves every request in order, as an invocation's argument list.
	pub(crate) fn arguments_for(
		&self,
		requests: &[Request],
		owner: &dyn fmt::Display,
	) -> DiResult<Arguments> {
		let dependencies = requests
			.iter()
			.map(|request| Dependency::Lookup {
				field: None,
				request,
			})
			.collect();
		self.arguments(dependencies, owner)
	}

	fn locate(&self, request: &Request) -> DiResult<NodeId> {
		let found = self.schema.read().find(request)?;
		match found {
			Lookup::Found(id) => Ok(id),
			Lookup::Synthesize => self.schema.write().materialize(request),
		}
	}

	fn node(&self, id: NodeId) -> Arc<Node> {
		self.schema.read().node(id)
	}

	pub(crate) fn resolve_node(&self, node: &Node) -> DiResult<Instance> {
		if self.closed.load(Ordering::Acquire) {
			return Err(DiError::ContainerClosed);
		}

		match node.lifecycle() {
			Lifecycle::Singleton => {
				if let Some(instance) = node.cached() {
					tracing::trace!(node = %node, "singleton cache hit");
					return Ok(instance);
				}
				let _guard = node.lock_build();
				if let Some(instance) = node.cached() {
					return Ok(instance);
				}
				let instance = self.build(node)?;
				node.store(instance.clone());
				Ok(instance)
			}
			Lifecycle::Prototype => self.build(node),
		}
	}

	fn build(&self, node: &Node) -> DiResult<Instance> {
		let args = self.arguments(node.compiler().dependencies(), node)?;
		let built = node
			.compiler()
			.compile(args)
			.map_err(|source| DiError::ConstructionFailure {
				type_name: node.to_string(),
				source,
			})?;

		if let Some(cleanup) = built.cleanup {
			self.cleanups.push(node.to_string(), cleanup);
		}
		tracing::debug!(
			node = %node,
			lifecycle = node.lifecycle().as_str(),
			strategy = node.compiler().kind(),
			"instance built"
		);
		Ok(built.instance)
	}

	fn arguments(
		&self,
		dependencies: Vec<Dependency<'_>>,
		owner: &dyn fmt::Display,
	) -> DiResult<Arguments> {
		let mut args = Arguments::with_capacity(dependencies.len());
		for dependency in dependencies {
			match dependency {
				Dependency::Lookup { field, request } => {
					let value = self
						.resolve_request(request)
						.map_err(|err| err.requested_by(owner))?;
					args.push(field, *request.key(), request.tags().clone(), value);
				}
				Dependency::Member { node, view } => {
					let member = self.node(node);
					let value = self
						.resolve_node(&member)
						.and_then(|instance| member.view(instance, &view))
						.map_err(|err| err.requested_by(owner))?;
					args.push(None, view, member.tags().clone(), Some(value));
				}
			}
		}
		Ok(args)
	}
}
