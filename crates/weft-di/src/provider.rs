//! Provider and invocation registration
//!
//! A [`Provider`] describes how to build one value: the lookups it needs, the
//! tags and lifecycle it is registered with, the interfaces it can be viewed
//! as, and the factory closure. An [`Invocation`] is the same parameter list
//! attached to a function that returns nothing.

use crate::cleanup::Cleanup;
use crate::compiler::{Built, Factory};
use crate::error::BoxError;
use crate::injectable::Inject;
use crate::instance::{Arguments, Instance};
use crate::key::{Request, TypeKey};
use crate::node::{Lifecycle, View};
use crate::tags::TagSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Parameter declarations shared by provider and invocation builders.
macro_rules! param_methods {
	() => {
		/// Declares a required parameter of type `D`.
		pub fn param<D: ?Sized + Send + Sync + 'static>(self) -> Self {
			self.request(Request::of::<D>())
		}

		/// Declares a parameter resolved by provider name.
		pub fn named_param<D: ?Sized + Send + Sync + 'static>(self, name: impl Into<String>) -> Self {
			self.request(Request::of::<D>().named(name))
		}

		/// Declares a parameter that is `None` when no provider matches.
		pub fn optional_param<D: ?Sized + Send + Sync + 'static>(self) -> Self {
			self.request(Request::of::<D>().optional())
		}

		/// Declares a parameter holding every provider of `E`, in registration order.
		pub fn group_param<E: ?Sized + Send + Sync + 'static>(self) -> Self {
			self.request(Request::group::<E>())
		}

		/// Declares an aggregate parameter assembled field by field.
		pub fn injected_param<D: Inject>(self) -> Self {
			self.request(Request::injected::<D>())
		}

		/// Declares a parameter from a fully built request.
		pub fn request(mut self, request: Request) -> Self {
			self.params.push(request);
			self
		}
	};
}

/// Registration record for one node.
pub struct Provider {
	pub(crate) key: TypeKey,
	pub(crate) tags: TagSet,
	pub(crate) lifecycle: Option<Lifecycle>,
	pub(crate) params: Vec<Request>,
	pub(crate) views: Vec<View>,
	pub(crate) factory: Factory,
}

impl Provider {
	/// Starts a provider of `T`.
	///
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use weft_di::{Container, Provider};
	///
	/// struct Mux;
	/// struct Server {
	///     mux: Arc<Mux>,
	/// }
	///
	/// let mut container = Container::new();
	/// container
	///     .provide(Provider::new::<Mux>().factory(|_| Ok(Mux)))
	///     .provide(
	///         Provider::new::<Server>()
	///             .param::<Mux>()
	///             .factory(|args| Ok(Server { mux: args.get(0)? })),
	///     );
	///
	/// let server = container.extract::<Server>().unwrap();
	/// let mux = container.extract::<Mux>().unwrap();
	/// assert!(Arc::ptr_eq(&server.mux, &mux));
	/// ```
	pub fn new<T: ?Sized + Send + Sync + 'static>() -> ProviderBuilder<T> {
		ProviderBuilder {
			tags: TagSet::new(),
			lifecycle: None,
			params: Vec::new(),
			views: Vec::new(),
			_marker: PhantomData,
		}
	}

	/// Registers an already built value.
	pub fn value<T: Send + Sync + 'static>(value: T) -> Provider {
		Provider::new::<T>().instance(value)
	}

	/// Provider built from a plain function whose parameters are `Arc<_>`
	/// dependencies.
	///
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use weft_di::{BoxError, Container, Provider};
	///
	/// struct Config {
	///     port: u16,
	/// }
	/// struct Server {
	///     port: u16,
	/// }
	///
	/// fn new_server(config: Arc<Config>) -> Result<Server, BoxError> {
	///     Ok(Server { port: config.port })
	/// }
	///
	/// let mut container = Container::new();
	/// container
	///     .provide(Provider::value(Config { port: 8080 }))
	///     .provide(Provider::from_fn(new_server));
	///
	/// assert_eq!(container.extract::<Server>().unwrap().port, 8080);
	/// ```
	pub fn from_fn<Args, F>(f: F) -> Provider
	where
		F: FactoryFn<Args>,
	{
		Provider::new::<F::Output>()
			.with_params(F::params())
			.shared(move |args| f.call(args))
	}

	/// Type the provider produces.
	pub fn key(&self) -> &TypeKey {
		&self.key
	}

	pub fn tags(&self) -> &TagSet {
		&self.tags
	}

	/// Declared lifecycle, `None` when the container default applies.
	pub fn lifecycle(&self) -> Option<Lifecycle> {
		self.lifecycle
	}

	pub fn params(&self) -> &[Request] {
		&self.params
	}
}

impl fmt::Debug for Provider {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Provider")
			.field("key", &self.key)
			.field("tags", &self.tags)
			.field("lifecycle", &self.lifecycle)
			.field("params", &self.params)
			.field(
				"interfaces",
				&self.views.iter().map(|view| view.key).collect::<Vec<_>>(),
			)
			.finish_non_exhaustive()
	}
}

/// Builder returned by [`Provider::new`].
///
/// Finished by one of the factory methods, which produce the [`Provider`].
pub struct ProviderBuilder<T: ?Sized> {
	tags: TagSet,
	lifecycle: Option<Lifecycle>,
	params: Vec<Request>,
	views: Vec<View>,
	_marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> ProviderBuilder<T> {
	param_methods!();

	fn with_params(mut self, params: Vec<Request>) -> Self {
		self.params.extend(params);
		self
	}

	/// Registers the provider under a name.
	pub fn named(self, name: impl Into<String>) -> Self {
		self.tag(crate::tags::NAME, name)
	}

	pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.tags = self.tags.with(key, value);
		self
	}

	/// Builds a fresh value on every resolution.
	pub fn prototype(self) -> Self {
		self.lifecycle(Lifecycle::Prototype)
	}

	/// Builds the value once and shares it.
	pub fn singleton(self) -> Self {
		self.lifecycle(Lifecycle::Singleton)
	}

	pub fn lifecycle(mut self, lifecycle: Lifecycle) -> Self {
		self.lifecycle = Some(lifecycle);
		self
	}

	/// Also registers the provider as `I`, typically a trait object.
	///
	/// The node stays one node: lookups of `T` and of `I` share the same
	/// singleton value, and groups of `I` include it. Declaring `I` again
	/// replaces the earlier cast.
	///
	/// # Examples
	///
	/// ```
	/// use std::sync::Arc;
	/// use weft_di::{Container, Provider};
	///
	/// trait Handler: Send + Sync {
	///     fn path(&self) -> &'static str;
	/// }
	///
	/// struct Health;
	///
	/// impl Handler for Health {
	///     fn path(&self) -> &'static str {
	///         "/health"
	///     }
	/// }
	///
	/// let mut container = Container::new();
	/// container.provide(
	///     Provider::new::<Health>()
	///         .implements::<dyn Handler>(|health| health as Arc<dyn Handler>)
	///         .factory(|_| Ok(Health)),
	/// );
	///
	/// let handlers = container.group::<dyn Handler>().unwrap();
	/// assert_eq!(handlers[0].path(), "/health");
	/// ```
	pub fn implements<I>(mut self, cast: fn(Arc<T>) -> Arc<I>) -> Self
	where
		I: ?Sized + Send + Sync + 'static,
	{
		let key = TypeKey::of::<I>();
		self.views.retain(|view| view.key != key);
		self.views.push(View {
			key,
			cast: Arc::new(move |instance| Ok(Instance::new(cast(instance.downcast::<T>()?)))),
		});
		self
	}

	/// Finishes with a factory returning a shared value, for unsized `T`.
	pub fn shared<F>(self, factory: F) -> Provider
	where
		F: Fn(&Arguments) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
	{
		self.finish(Arc::new(move |args| {
			factory(args).map(|value| Built::new(Instance::new(value)))
		}))
	}

	/// Like [`ProviderBuilder::shared`], with a teardown closure recorded
	/// each time a value is built.
	pub fn shared_with_cleanup<F>(self, factory: F) -> Provider
	where
		F: Fn(&Arguments) -> Result<(Arc<T>, Cleanup), BoxError> + Send + Sync + 'static,
	{
		self.finish(Arc::new(move |args| {
			factory(args).map(|(value, cleanup)| Built::with_cleanup(Instance::new(value), cleanup))
		}))
	}

	fn finish(self, factory: Factory) -> Provider {
		Provider {
			key: TypeKey::of::<T>(),
			tags: self.tags,
			lifecycle: self.lifecycle,
			params: self.params,
			views: self.views,
			factory,
		}
	}
}

impl<T: Send + Sync + 'static> ProviderBuilder<T> {
	/// Finishes with a factory.
	pub fn factory<F>(self, factory: F) -> Provider
	where
		F: Fn(&Arguments) -> Result<T, BoxError> + Send + Sync + 'static,
	{
		self.shared(move |args| factory(args).map(Arc::new))
	}

	/// Finishes with a factory that also returns a teardown closure.
	///
	/// A prototype records one cleanup per built value.
	pub fn with_cleanup<F>(self, factory: F) -> Provider
	where
		F: Fn(&Arguments) -> Result<(T, Cleanup), BoxError> + Send + Sync + 'static,
	{
		self.shared_with_cleanup(move |args| {
			factory(args).map(|(value, cleanup)| (Arc::new(value), cleanup))
		})
	}

	/// Finishes with a ready value; every resolution shares it.
	pub fn instance(self, value: T) -> Provider {
		let value = Arc::new(value);
		self.shared(move |_| Ok(Arc::clone(&value)))
	}
}

/// Function usable as a provider or invocation: every parameter is an
/// `Arc<_>` dependency, resolved by type.
pub trait FactoryFn<Args>: Send + Sync + 'static {
	type Output: Send + Sync + 'static;

	/// One request per parameter, in order.
	fn params() -> Vec<Request>;

	fn call(&self, args: &Arguments) -> Result<Arc<Self::Output>, BoxError>;
}

macro_rules! impl_factory_fn {
	($($ty:ident: $idx:tt),*) => {
		impl<Func, Out, Err, $($ty),*> FactoryFn<($(Arc<$ty>,)*)> for Func
		where
			Func: Fn($(Arc<$ty>),*) -> Result<Out, Err> + Send + Sync + 'static,
			Out: Send + Sync + 'static,
			Err: Into<BoxError>,
			$($ty: ?Sized + Send + Sync + 'static,)*
		{
			type Output = Out;

			fn params() -> Vec<Request> {
				vec![$(Request::of::<$ty>()),*]
			}

			#[allow(unused_variables)]
			fn call(&self, args: &Arguments) -> Result<Arc<Out>, BoxError> {
				(self)($(args.get::<$ty>($idx)?),*)
					.map(Arc::new)
					.map_err(Into::into)
			}
		}
	};
}

impl_factory_fn!();
impl_factory_fn!(A1: 0);
impl_factory_fn!(A1: 0, A2: 1);
impl_factory_fn!(A1: 0, A2: 1, A3: 2);
impl_factory_fn!(A1: 0, A2: 1, A3: 2, A4: 3);
impl_factory_fn!(A1: 0, A2: 1, A3: 2, A4: 3, A5: 4);
impl_factory_fn!(A1: 0, A2: 1, A3: 2, A4: 3, A5: 4, A6: 5);

type InvokeFn = Arc<dyn Fn(&Arguments) -> Result<(), BoxError> + Send + Sync>;

/// Function run by the container with resolved parameters.
///
/// Registered with [`Container::invoke_on_compile`](crate::Container::invoke_on_compile)
/// it runs once during compile; passed to
/// [`Container::invoke`](crate::Container::invoke) it runs immediately.
#[derive(Clone)]
pub struct Invocation {
	pub(crate) params: Vec<Request>,
	pub(crate) func: InvokeFn,
}

impl Invocation {
	pub fn new() -> InvocationBuilder {
		InvocationBuilder { params: Vec::new() }
	}

	/// Invocation of a plain function whose parameters are `Arc<_>`
	/// dependencies.
	pub fn from_fn<Args, F>(f: F) -> Invocation
	where
		F: FactoryFn<Args, Output = ()>,
	{
		Invocation {
			params: F::params(),
			func: Arc::new(move |args| f.call(args).map(drop)),
		}
	}

	pub fn params(&self) -> &[Request] {
		&self.params
	}
}

impl fmt::Debug for Invocation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Invocation")
			.field("params", &self.params)
			.finish_non_exhaustive()
	}
}

impl fmt::Display for Invocation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("invocation(")?;
		for (idx, param) in self.params.iter().enumerate() {
			if idx > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{param}")?;
		}
		f.write_str(")")
	}
}

/// Builder returned by [`Invocation::new`].
#[derive(Debug, Default)]
pub struct InvocationBuilder {
	params: Vec<Request>,
}

impl InvocationBuilder {
	param_methods!();

	/// Finishes with the function to run.
	pub fn run<F>(self, func: F) -> Invocation
	where
		F: Fn(&Arguments) -> Result<(), BoxError> + Send + Sync + 'static,
	{
		Invocation {
			params: self.params,
			func: Arc::new(func),
		}
	}
}
