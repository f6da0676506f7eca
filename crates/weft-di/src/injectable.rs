//! Aggregate injection capability

use crate::error::BoxError;
use crate::instance::{Arguments, Instance};
use crate::key::{Request, TypeKey};
use std::fmt;

/// Capability of an aggregate type whose fields are injected independently.
///
/// The type declares its field slots up front; the container resolves each
/// one as its own lookup and hands the results to [`Inject::assemble`].
/// Optional fields with no provider arrive as `None`.
///
/// A synthesized aggregate is one singleton per type: tags on the lookup
/// are ignored, so a named `Request::injected::<T>()` yields the same value
/// as an unnamed one. Field tags still apply to each field.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use weft_di::{Arguments, BoxError, Container, Field, Inject, Provider};
///
/// struct Logger(&'static str);
///
/// struct Handlers {
///     logger: Arc<Logger>,
///     audit: Option<Arc<Logger>>,
/// }
///
/// impl Inject for Handlers {
///     fn fields() -> Vec<Field> {
///         vec![
///             Field::new::<Logger>("logger").named("file"),
///             Field::new::<Logger>("audit").named("audit").optional(),
///         ]
///     }
///
///     fn assemble(fields: &Arguments) -> Result<Self, BoxError> {
///         Ok(Self {
///             logger: fields.field("logger")?,
///             audit: fields.optional_field("audit")?,
///         })
///     }
/// }
///
/// let mut container = Container::new();
/// container.provide(Provider::new::<Logger>().named("file").factory(|_| Ok(Logger("file"))));
///
/// let handlers = container.extract_injected::<Handlers>().unwrap();
/// assert_eq!(handlers.logger.0, "file");
/// assert!(handlers.audit.is_none());
/// ```
pub trait Inject: Sized + Send + Sync + 'static {
	/// Field slots in assembly order.
	fn fields() -> Vec<Field>;

	/// Builds the aggregate from its resolved fields.
	fn assemble(fields: &Arguments) -> Result<Self, BoxError>;
}

/// One injectable field of an aggregate.
#[derive(Debug, Clone)]
pub struct Field {
	name: &'static str,
	request: Request,
}

impl Field {
	pub fn new<T: ?Sized + Send + Sync + 'static>(name: &'static str) -> Self {
		Self::request(name, Request::of::<T>())
	}

	/// Field holding every provider of `E`.
	pub fn group<E: ?Sized + Send + Sync + 'static>(name: &'static str) -> Self {
		Self::request(name, Request::group::<E>())
	}

	/// Field that is itself an aggregate.
	pub fn injected<T: Inject>(name: &'static str) -> Self {
		Self::request(name, Request::injected::<T>())
	}

	pub fn request(name: &'static str, request: Request) -> Self {
		Self { name, request }
	}

	pub fn named(mut self, name: impl Into<String>) -> Self {
		self.request = self.request.named(name);
		self
	}

	pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.request = self.request.tag(key, value);
		self
	}

	pub fn optional(mut self) -> Self {
		self.request = self.request.optional();
		self
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn as_request(&self) -> &Request {
		&self.request
	}
}

type Assemble = fn(&Arguments) -> Result<Instance, BoxError>;

/// Erased `Inject` implementation carried by requests and aggregate nodes.
#[derive(Clone, Copy)]
pub(crate) struct AggregateSpec {
	key: TypeKey,
	fields: fn() -> Vec<Field>,
	assemble: Assemble,
}

impl AggregateSpec {
	pub(crate) fn of<T: Inject>() -> Self {
		Self {
			key: TypeKey::of::<T>(),
			fields: T::fields,
			assemble: assemble_erased::<T>,
		}
	}

	pub(crate) fn key(&self) -> TypeKey {
		self.key
	}

	pub(crate) fn fields(&self) -> Vec<Field> {
		(self.fields)()
	}

	pub(crate) fn assemble(&self, fields: &Arguments) -> Result<Instance, BoxError> {
		(self.assemble)(fields)
	}
}

fn assemble_erased<T: Inject>(fields: &Arguments) -> Result<Instance, BoxError> {
	T::assemble(fields).map(Instance::from_value)
}

impl fmt::Debug for AggregateSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AggregateSpec")
			.field("key", &self.key)
			.finish_non_exhaustive()
	}
}
