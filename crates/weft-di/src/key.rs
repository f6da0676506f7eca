//! Type descriptors and lookup requests

use crate::injectable::{AggregateSpec, Inject};
use crate::tags::TagSet;
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Whether a descriptor names a single value or a group of an element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
	Single,
	Group,
}

/// Comparable identifier of a producible shape.
///
/// Concrete types and trait objects are both valid; a trait object key acts as
/// an interface that providers opt into with `implements`.
///
/// # Examples
///
/// ```
/// use weft_di::TypeKey;
///
/// trait Greeter {}
///
/// assert_eq!(TypeKey::of::<u32>(), TypeKey::of::<u32>());
/// assert_ne!(TypeKey::of::<u32>(), TypeKey::group::<u32>());
/// assert_eq!(TypeKey::group::<dyn Greeter>().element(), TypeKey::of::<dyn Greeter>());
/// ```
#[derive(Clone, Copy)]
pub struct TypeKey {
	id: TypeId,
	name: &'static str,
	shape: Shape,
}

impl TypeKey {
	pub fn of<T: ?Sized + 'static>() -> Self {
		Self {
			id: TypeId::of::<T>(),
			name: std::any::type_name::<T>(),
			shape: Shape::Single,
		}
	}

	/// Descriptor of the group of every node registered for `E`.
	pub fn group<E: ?Sized + 'static>() -> Self {
		Self {
			shape: Shape::Group,
			..Self::of::<E>()
		}
	}

	/// The single-value descriptor this key is built on.
	pub fn element(&self) -> TypeKey {
		TypeKey {
			shape: Shape::Single,
			..*self
		}
	}

	pub fn type_id(&self) -> TypeId {
		self.id
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn shape(&self) -> Shape {
		self.shape
	}

	pub fn is_group(&self) -> bool {
		self.shape == Shape::Group
	}
}

impl PartialEq for TypeKey {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id && self.shape == other.shape
	}
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
		self.shape.hash(state);
	}
}

impl fmt::Debug for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TypeKey({self})")
	}
}

impl fmt::Display for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.shape {
			Shape::Single => f.write_str(self.name),
			Shape::Group => write!(f, "[{}]", self.name),
		}
	}
}

/// A lookup: type descriptor plus tags.
///
/// Requests built with [`Request::injected`] also carry the aggregate
/// capability of the type, which lets the schema synthesize a node for it when
/// nothing was registered explicitly.
#[derive(Clone)]
pub struct Request {
	key: TypeKey,
	tags: TagSet,
	aggregate: Option<AggregateSpec>,
}

impl Request {
	pub fn of<T: ?Sized + Send + Sync + 'static>() -> Self {
		Self::for_key(TypeKey::of::<T>())
	}

	/// Request for the ordered group of every provider of `E`.
	pub fn group<E: ?Sized + Send + Sync + 'static>() -> Self {
		Self::for_key(TypeKey::group::<E>())
	}

	/// Request for an aggregate type that assembles itself from its fields.
	pub fn injected<T: Inject>() -> Self {
		Self {
			aggregate: Some(AggregateSpec::of::<T>()),
			..Self::of::<T>()
		}
	}

	pub(crate) fn for_key(key: TypeKey) -> Self {
		Self {
			key,
			tags: TagSet::new(),
			aggregate: None,
		}
	}

	pub fn named(self, name: impl Into<String>) -> Self {
		self.tag(crate::tags::NAME, name)
	}

	pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.tags = self.tags.with(key, value);
		self
	}

	pub fn with_tags(mut self, tags: TagSet) -> Self {
		self.tags = tags;
		self
	}

	pub fn optional(mut self) -> Self {
		self.tags = self.tags.optional();
		self
	}

	pub fn key(&self) -> &TypeKey {
		&self.key
	}

	pub fn tags(&self) -> &TagSet {
		&self.tags
	}

	pub fn is_optional(&self) -> bool {
		self.tags.is_optional()
	}

	pub(crate) fn aggregate(&self) -> Option<&AggregateSpec> {
		self.aggregate.as_ref()
	}
}

impl fmt::Debug for Request {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Request")
			.field("key", &self.key)
			.field("tags", &self.tags)
			.field("aggregate", &self.aggregate.is_some())
			.finish()
	}
}

impl fmt::Display for Request {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}{}", self.key, self.tags)
	}
}
