//! Graph vertices

use crate::compiler::Compiler;
use crate::error::{DiError, DiResult};
use crate::instance::Instance;
use crate::key::TypeKey;
use crate::tags::TagSet;
use parking_lot::{Mutex, MutexGuard, RwLock};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable index of a node in the schema arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
	pub fn index(&self) -> usize {
		self.0
	}
}

/// Whether a node's value is cached after the first build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
	/// Built once, shared by every resolution
	#[default]
	Singleton,
	/// Built again on every resolution
	Prototype,
}

impl Lifecycle {
	pub fn as_str(&self) -> &'static str {
		match self {
			Lifecycle::Singleton => "singleton",
			Lifecycle::Prototype => "prototype",
		}
	}
}

impl std::str::FromStr for Lifecycle {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"singleton" => Ok(Lifecycle::Singleton),
			"prototype" => Ok(Lifecycle::Prototype),
			other => Err(format!("unknown lifecycle `{other}`")),
		}
	}
}

pub(crate) type Caster = Arc<dyn Fn(&Instance) -> DiResult<Instance> + Send + Sync>;

/// Interface a node was registered under, with the upcast to reach it.
#[derive(Clone)]
pub(crate) struct View {
	pub(crate) key: TypeKey,
	pub(crate) cast: Caster,
}

pub(crate) struct Node {
	id: NodeId,
	key: TypeKey,
	tags: TagSet,
	lifecycle: Lifecycle,
	compiler: Compiler,
	views: Vec<View>,
	build_lock: Mutex<()>,
	instance: RwLock<Option<Instance>>,
	// schema generation + 1 at which the subgraph was proven; 0 = never
	verified: AtomicU64,
}

impl Node {
	pub(crate) fn new(
		id: NodeId,
		key: TypeKey,
		tags: TagSet,
		lifecycle: Lifecycle,
		compiler: Compiler,
		views: Vec<View>,
	) -> Self {
		Self {
			id,
			key,
			tags,
			lifecycle,
			compiler,
			views,
			build_lock: Mutex::new(()),
			instance: RwLock::new(None),
			verified: AtomicU64::new(0),
		}
	}

	pub(crate) fn key(&self) -> &TypeKey {
		&self.key
	}

	pub(crate) fn tags(&self) -> &TagSet {
		&self.tags
	}

	pub(crate) fn lifecycle(&self) -> Lifecycle {
		self.lifecycle
	}

	pub(crate) fn compiler(&self) -> &Compiler {
		&self.compiler
	}

	pub(crate) fn interfaces(&self) -> impl Iterator<Item = &TypeKey> {
		self.views.iter().map(|view| &view.key)
	}

	pub(crate) fn cached(&self) -> Option<Instance> {
		self.instance.read().clone()
	}

	pub(crate) fn store(&self, instance: Instance) {
		*self.instance.write() = Some(instance);
	}

	/// Serializes singleton builds of this node.
	pub(crate) fn lock_build(&self) -> MutexGuard<'_, ()> {
		self.build_lock.lock()
	}

	pub(crate) fn is_verified(&self, generation: u64) -> bool {
		self.verified.load(Ordering::Acquire) == generation + 1
	}

	pub(crate) fn mark_verified(&self, generation: u64) {
		self.verified.store(generation + 1, Ordering::Release);
	}

	/// Presents this node's instance as `key`: either its own type or one of
	/// the interfaces it was registered under.
	pub(crate) fn view(&self, instance: Instance, key: &TypeKey) -> DiResult<Instance> {
		if *key == self.key {
			return Ok(instance);
		}
		let view = self
			.views
			.iter()
			.find(|view| view.key == *key)
			.ok_or_else(|| DiError::TypeMismatch {
				expected: key.name(),
				found: self.key.to_string(),
			})?;
		(view.cast)(&instance)
	}
}

impl fmt::Display for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}{}", self.key, self.tags)
	}
}

impl fmt::Debug for Node {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Node")
			.field("id", &self.id)
			.field("key", &self.key)
			.field("tags", &self.tags)
			.field("lifecycle", &self.lifecycle)
			.field("compiler", &self.compiler.kind())
			.finish_non_exhaustive()
	}
}
