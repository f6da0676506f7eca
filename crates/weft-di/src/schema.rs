//! Type registry: maps type descriptors to the nodes able to produce them

use crate::compiler::Compiler;
use crate::error::{DiError, DiResult};
use crate::key::{Request, TypeKey};
use crate::node::{Lifecycle, Node, NodeId, View};
use crate::tags::TagSet;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Result of a read-only lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Lookup {
	Found(NodeId),
	/// Nothing explicit matches, but an aggregate or group node can be built
	Synthesize,
}

/// Everything needed to allocate an explicit node.
pub(crate) struct NodeSpec {
	pub(crate) key: TypeKey,
	pub(crate) tags: TagSet,
	pub(crate) lifecycle: Lifecycle,
	pub(crate) compiler: Compiler,
	pub(crate) views: Vec<View>,
}

/// Arena of nodes plus the per-type candidate lists.
#[derive(Default)]
pub(crate) struct Schema {
	nodes: Vec<Arc<Node>>,
	entries: IndexMap<TypeKey, Vec<NodeId>>,
	explicit: Vec<NodeId>,
	aggregates: HashMap<TypeKey, NodeId>,
	groups: HashMap<(TypeKey, TagSet), NodeId>,
	generation: u64,
}

impl Schema {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	/// Registers a node under its own type and every declared interface.
	///
	/// No uniqueness check happens here; ambiguity is reported at lookup.
	pub(crate) fn register(&mut self, spec: NodeSpec) -> NodeId {
		let id = self.allocate(spec);
		let node = Arc::clone(&self.nodes[id.0]);

		self.entries.entry(*node.key()).or_default().push(id);
		for interface in node.interfaces() {
			let ids = self.entries.entry(*interface).or_default();
			if ids.last() != Some(&id) {
				ids.push(id);
			}
		}
		self.explicit.push(id);
		self.generation += 1;

		tracing::debug!(
			node = %node,
			lifecycle = node.lifecycle().as_str(),
			interfaces = node.interfaces().count(),
			"provider registered"
		);
		id
	}

	fn allocate(&mut self, spec: NodeSpec) -> NodeId {
		let id = NodeId(self.nodes.len());
		self.nodes.push(Arc::new(Node::new(
			id,
			spec.key,
			spec.tags,
			spec.lifecycle,
			spec.compiler,
			spec.views,
		)));
		id
	}

	pub(crate) fn node(&self, id: NodeId) -> Arc<Node> {
		Arc::clone(&self.nodes[id.0])
	}

	/// Every node, explicit and synthesized, in allocation order.
	pub(crate) fn nodes(&self) -> impl Iterator<Item = &Arc<Node>> {
		self.nodes.iter()
	}

	/// Explicitly registered nodes in registration order.
	pub(crate) fn explicit(&self) -> &[NodeId] {
		&self.explicit
	}

	/// Bumped by every explicit registration.
	pub(crate) fn generation(&self) -> u64 {
		self.generation
	}

	/// Read-only lookup by type and tags.
	pub(crate) fn find(&self, request: &Request) -> DiResult<Lookup> {
		let key = request.key();
		if key.is_group() {
			let memo = (*key, request.tags().normalized());
			if let Some(&id) = self.groups.get(&memo) {
				return Ok(Lookup::Found(id));
			}
			self.group_members(request)?;
			return Ok(Lookup::Synthesize);
		}

		match self.entries.get(key) {
			Some(candidates) if !candidates.is_empty() => {
				let matched: Vec<NodeId> = candidates
					.iter()
					.copied()
					.filter(|&id| request.tags().matches(self.nodes[id.0].tags()))
					.collect();
				match matched.as_slice() {
					[] => Err(not_found(request)),
					[id] => Ok(Lookup::Found(*id)),
					_ => Err(DiError::AmbiguousDefinition {
						type_name: key.to_string(),
						tags: request.tags().normalized(),
						candidates: matched.len(),
					}),
				}
			}
			_ => match request.aggregate() {
				Some(spec) => Ok(self
					.aggregates
					.get(&spec.key())
					.map_or(Lookup::Synthesize, |&id| Lookup::Found(id))),
				None => Err(not_found(request)),
			},
		}
	}

	/// Lookup that synthesizes implicit aggregate and group nodes on demand.
	///
	/// Synthesized nodes are memoized; a group is a snapshot of the members
	/// registered when it was first requested.
	pub(crate) fn materialize(&mut self, request: &Request) -> DiResult<NodeId> {
		if let Lookup::Found(id) = self.find(request)? {
			return Ok(id);
		}

		let key = *request.key();
		if key.is_group() {
			let members = self.group_members(request)?;
			let tags = request.tags().normalized();
			tracing::debug!(group = %key, tags = %tags, members = members.len(), "group node synthesized");
			let id = self.allocate(NodeSpec {
				key,
				tags: tags.clone(),
				lifecycle: Lifecycle::Singleton,
				compiler: Compiler::group(key.element(), members),
				views: Vec::new(),
			});
			self.groups.insert((key, tags), id);
			return Ok(id);
		}

		let spec = *request.aggregate().ok_or_else(|| not_found(request))?;
		tracing::debug!(aggregate = %key, "aggregate node synthesized");
		let id = self.allocate(NodeSpec {
			key,
			tags: TagSet::new(),
			lifecycle: Lifecycle::Singleton,
			compiler: Compiler::aggregate(spec),
			views: Vec::new(),
		});
		self.aggregates.insert(spec.key(), id);
		Ok(id)
	}

	fn group_members(&self, request: &Request) -> DiResult<Vec<NodeId>> {
		let element = request.key().element();
		let members: Vec<NodeId> = self
			.entries
			.get(&element)
			.into_iter()
			.flatten()
			.copied()
			.filter(|&id| request.tags().is_subset_of(self.nodes[id.0].tags()))
			.collect();
		if members.is_empty() {
			return Err(not_found(request));
		}
		Ok(members)
	}
}

fn not_found(request: &Request) -> DiError {
	DiError::TypeNotFound {
		type_name: request.key().to_string(),
		tags: request.tags().normalized(),
	}
}
