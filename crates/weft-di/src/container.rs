//! The container: registration, compile, extraction and teardown

use crate::cleanup::{CleanupChain, TeardownReport};
use crate::compiler::Compiler;
use crate::cycle_detection::CycleDetector;
use crate::error::{DiError, DiResult};
use crate::injectable::Inject;
use crate::instance::Instance;
use crate::key::Request;
use crate::node::NodeId;
use crate::provider::{Invocation, Provider};
use crate::resolver::Resolver;
use crate::schema::{Lookup, NodeSpec, Schema};
use crate::settings::ContainerSettings;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Dependency graph container.
///
/// Providers are registered with [`Container::provide`] and proven with
/// [`Container::compile`]; values are built lazily on first extraction.
/// Extraction takes `&self`, so a compiled container can be shared across
/// threads behind an `Arc`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use weft_di::{Cleanup, Container, Invocation, Provider};
///
/// struct Pool;
/// struct Repository {
///     pool: Arc<Pool>,
/// }
///
/// let mut container = Container::new();
/// container
///     .provide(Provider::new::<Pool>().with_cleanup(|_| Ok((Pool, Cleanup::new(|| ())))))
///     .provide(
///         Provider::new::<Repository>()
///             .param::<Pool>()
///             .factory(|args| Ok(Repository { pool: args.get(0)? })),
///     );
/// container.invoke_on_compile(Invocation::new().param::<Repository>().run(|_| Ok(())));
/// container.compile().unwrap();
///
/// let repository = container.extract::<Repository>().unwrap();
/// assert!(Arc::ptr_eq(&repository.pool, &container.extract::<Pool>().unwrap()));
///
/// let report = container.cleanup();
/// assert_eq!(report.executed, 1);
/// ```
pub struct Container {
	settings: ContainerSettings,
	schema: RwLock<Schema>,
	cleanups: CleanupChain,
	invocations: Vec<Invocation>,
	executed: usize,
	closed: AtomicBool,
}

impl Container {
	pub fn new() -> Self {
		Self::with_settings(ContainerSettings::default())
	}

	pub fn with_settings(settings: ContainerSettings) -> Self {
		Self {
			settings,
			schema: RwLock::new(Schema::new()),
			cleanups: CleanupChain::new(),
			invocations: Vec::new(),
			executed: 0,
			closed: AtomicBool::new(false),
		}
	}

	pub fn settings(&self) -> &ContainerSettings {
		&self.settings
	}

	/// Registers a provider. Nothing is validated until compile or the first
	/// lookup that reaches it.
	pub fn provide(&mut self, provider: Provider) -> &mut Self {
		let lifecycle = provider
			.lifecycle
			.unwrap_or(self.settings.default_lifecycle);
		self.schema.get_mut().register(NodeSpec {
			key: provider.key,
			tags: provider.tags,
			lifecycle,
			compiler: Compiler::constructor(provider.params, provider.factory),
			views: provider.views,
		});
		self
	}

	/// Registers a function run once at the next compile.
	pub fn invoke_on_compile(&mut self, invocation: Invocation) -> &mut Self {
		self.invocations.push(invocation);
		self
	}

	/// Proves the graph and runs pending eager invocations.
	///
	/// The subgraphs of the pending invocations are checked for cycles and
	/// missing dependencies; providers nothing reaches are left alone unless
	/// `verify_all_providers` is set. Invocations that already ran are not run
	/// again, so compiling twice is harmless.
	pub fn compile(&mut self) -> DiResult<()> {
		if self.is_closed() {
			return Err(DiError::ContainerClosed);
		}
		let pending = &self.invocations[self.executed..];
		{
			let schema = self.schema.get_mut();
			let roots: Vec<NodeId> = if self.settings.verify_all_providers {
				schema.explicit().to_vec()
			} else {
				Vec::new()
			};
			let mut detector = CycleDetector::new(schema, self.settings.max_depth);
			for id in roots {
				detector.verify_node(id)?;
			}
			for invocation in pending {
				for param in invocation.params() {
					detector.verify_request(param)?;
				}
			}
		}

		let pending = pending.len();
		while self.executed < self.invocations.len() {
			let invocation = self.invocations[self.executed].clone();
			self.run(&invocation)?;
			self.executed += 1;
		}

		let schema = self.schema.get_mut();
		tracing::info!(
			nodes = schema.nodes().count(),
			providers = schema.explicit().len(),
			invocations = pending,
			"container compiled"
		);
		Ok(())
	}

	/// Resolves a request as an erased instance; `None` only for an optional
	/// request with no provider.
	pub fn resolve(&self, request: &Request) -> DiResult<Option<Instance>> {
		if self.is_closed() {
			return Err(DiError::ContainerClosed);
		}
		if self.prepare(request)?.is_none() {
			return Ok(None);
		}
		self.resolver().resolve_request(request)
	}

	/// Extracts the single unnamed provider of `T`.
	pub fn extract<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
		self.extract_request(&Request::of::<T>())
	}

	/// Extracts the provider of `T` registered under `name`.
	pub fn extract_named<T: ?Sized + Send + Sync + 'static>(
		&self,
		name: impl Into<String>,
	) -> DiResult<Arc<T>> {
		self.extract_request(&Request::of::<T>().named(name))
	}

	/// Extracts `T`, or `None` when nothing provides it.
	pub fn extract_optional<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Option<Arc<T>>> {
		self.resolve(&Request::of::<T>().optional())?
			.map(|instance| instance.downcast::<T>())
			.transpose()
	}

	/// Extracts an aggregate, assembling it field by field when it was not
	/// registered explicitly.
	pub fn extract_injected<T: Inject>(&self) -> DiResult<Arc<T>> {
		self.extract_request(&Request::injected::<T>())
	}

	/// Every provider of `E`, in registration order.
	pub fn group<E: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<E>>> {
		self.resolve(&Request::group::<E>())?
			.ok_or_else(|| not_found(&Request::group::<E>()))?
			.members::<E>()
	}

	/// Extracts the value answering `request` as `T`.
	pub fn extract_request<T: ?Sized + Send + Sync + 'static>(
		&self,
		request: &Request,
	) -> DiResult<Arc<T>> {
		self.resolve(request)?
			.ok_or_else(|| not_found(request))?
			.downcast::<T>()
	}

	/// Resolves the invocation's parameters and runs it.
	pub fn invoke(&self, invocation: &Invocation) -> DiResult<()> {
		if self.is_closed() {
			return Err(DiError::ContainerClosed);
		}
		for param in invocation.params() {
			self.prepare(param)?;
		}
		self.run(invocation)
	}

	/// Whether a node of `T` exists or could be synthesized. Builds nothing.
	pub fn has<T: ?Sized + Send + Sync + 'static>(&self) -> bool {
		self.has_request(&Request::of::<T>())
	}

	pub fn has_request(&self, request: &Request) -> bool {
		self.schema.read().find(request).is_ok()
	}

	/// Runs every recorded cleanup in reverse construction order.
	///
	/// Closes the container first: later resolutions fail with
	/// [`DiError::ContainerClosed`]. A second call does nothing.
	pub fn cleanup(&self) -> TeardownReport {
		if self.closed.swap(true, Ordering::AcqRel) {
			tracing::debug!("container already closed");
			return TeardownReport::default();
		}
		let report = self.cleanups.drain();
		tracing::info!(
			executed = report.executed,
			failed = report.failures.len(),
			"container closed"
		);
		report
	}

	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::Acquire)
	}

	/// Snapshot of the graph for export.
	#[cfg(feature = "dev-tools")]
	pub fn graph(&self) -> crate::visualization::DependencyGraph {
		crate::visualization::DependencyGraph::from_schema(&self.schema.read())
	}

	fn resolver(&self) -> Resolver<'_> {
		Resolver::new(&self.schema, &self.cleanups, &self.closed)
	}

	fn run(&self, invocation: &Invocation) -> DiResult<()> {
		let args = self
			.resolver()
			.arguments_for(invocation.params(), invocation)?;
		tracing::debug!(invocation = %invocation, "running invocation");
		(invocation.func)(&args).map_err(|source| DiError::Invocation { source })
	}

	/// Proves the subgraph below `request` unless its node is already proven
	/// at the current generation. `None` for an absent optional request.
	fn prepare(&self, request: &Request) -> DiResult<Option<NodeId>> {
		{
			let schema = self.schema.read();
			if let Ok(Lookup::Found(id)) = schema.find(request)
				&& schema.node(id).is_verified(schema.generation())
			{
				return Ok(Some(id));
			}
		}
		let mut schema = self.schema.write();
		CycleDetector::new(&mut schema, self.settings.max_depth).verify_request(request)
	}
}

impl Default for Container {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for Container {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Container")
			.field("settings", &self.settings)
			.field("providers", &self.schema.read().explicit().len())
			.field("invocations", &self.invocations.len())
			.field("cleanups", &self.cleanups.len())
			.field("closed", &self.is_closed())
			.finish_non_exhaustive()
	}
}

fn not_found(request: &Request) -> DiError {
	DiError::TypeNotFound {
		type_name: request.key().to_string(),
		tags: request.tags().normalized(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn assert_send_sync<T: Send + Sync>() {}

	#[rstest]
	fn test_container_is_send_sync() {
		assert_send_sync::<Container>();
	}

	#[rstest]
	fn test_has_does_not_build() {
		// Arrange
		let built = Arc::new(AtomicBool::new(false));
		let flag = Arc::clone(&built);
		let mut container = Container::new();
		container.provide(Provider::new::<u32>().factory(move |_| {
			flag.store(true, Ordering::SeqCst);
			Ok(7)
		}));

		// Act
		let present = container.has::<u32>();

		// Assert
		assert!(present);
		assert!(!container.has::<u64>());
		assert!(!built.load(Ordering::SeqCst));
	}

	#[rstest]
	fn test_compile_after_close_fails() {
		// Arrange
		let mut container = Container::new();
		container.cleanup();

		// Act
		let result = container.compile();

		// Assert
		assert!(matches!(result, Err(DiError::ContainerClosed)));
	}
}
