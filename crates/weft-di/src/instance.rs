//! Type-erased values and the argument lists handed to factories

use crate::error::{DiError, DiResult};
use crate::key::TypeKey;
use crate::tags::TagSet;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A resolved value.
///
/// Wraps an `Arc<T>` (where `T` may be a trait object) behind `dyn Any`, so
/// cloning an instance never clones the value and identity survives
/// extraction.
#[derive(Clone)]
pub struct Instance {
	value: Arc<dyn Any + Send + Sync>,
	type_name: &'static str,
}

impl Instance {
	pub fn new<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
		Self {
			value: Arc::new(value),
			type_name: std::any::type_name::<T>(),
		}
	}

	pub fn from_value<T: Send + Sync + 'static>(value: T) -> Self {
		Self::new(Arc::new(value))
	}

	/// Returns the shared value if it was produced as `T`.
	pub fn downcast<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
		self.value
			.downcast_ref::<Arc<T>>()
			.cloned()
			.ok_or_else(|| DiError::TypeMismatch {
				expected: std::any::type_name::<T>(),
				found: self.type_name.to_string(),
			})
	}

	/// Members of a group instance, each viewed as `E`.
	pub fn members<E: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Vec<Arc<E>>> {
		self.downcast::<Vec<Instance>>()?
			.iter()
			.map(Instance::downcast::<E>)
			.collect()
	}

	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	/// Whether both instances share the same allocation.
	pub fn ptr_eq(&self, other: &Instance) -> bool {
		Arc::ptr_eq(&self.value, &other.value)
	}
}

impl fmt::Debug for Instance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Instance")
			.field("type_name", &self.type_name)
			.finish_non_exhaustive()
	}
}

struct Slot {
	field: Option<&'static str>,
	key: TypeKey,
	tags: TagSet,
	value: Option<Instance>,
}

/// Resolved dependencies in declaration order.
///
/// Constructors and invocations read their parameters by index; aggregates
/// read by field name. An optional dependency with no provider is an empty
/// slot.
#[derive(Default)]
pub struct Arguments {
	slots: Vec<Slot>,
}

impl Arguments {
	pub(crate) fn with_capacity(capacity: usize) -> Self {
		Self {
			slots: Vec::with_capacity(capacity),
		}
	}

	pub(crate) fn push(
		&mut self,
		field: Option<&'static str>,
		key: TypeKey,
		tags: TagSet,
		value: Option<Instance>,
	) {
		self.slots.push(Slot {
			field,
			key,
			tags,
			value,
		});
	}

	pub(crate) fn into_instances(self) -> Vec<Option<Instance>> {
		self.slots.into_iter().map(|slot| slot.value).collect()
	}

	pub fn len(&self) -> usize {
		self.slots.len()
	}

	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	/// Raw instance at `index`, `None` for an unset optional slot.
	pub fn instance(&self, index: usize) -> DiResult<Option<&Instance>> {
		self.slot(index).map(|slot| slot.value.as_ref())
	}

	/// Required parameter at `index`.
	pub fn get<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
		required(self.slot(index)?)?.downcast::<T>()
	}

	/// Optional parameter at `index`.
	pub fn optional<T: ?Sized + Send + Sync + 'static>(
		&self,
		index: usize,
	) -> DiResult<Option<Arc<T>>> {
		self.slot(index)?
			.value
			.as_ref()
			.map(Instance::downcast::<T>)
			.transpose()
	}

	/// Group parameter at `index`.
	pub fn group<E: ?Sized + Send + Sync + 'static>(&self, index: usize) -> DiResult<Vec<Arc<E>>> {
		required(self.slot(index)?)?.members::<E>()
	}

	/// Required aggregate field.
	pub fn field<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> DiResult<Arc<T>> {
		required(self.named(name)?)?.downcast::<T>()
	}

	/// Optional aggregate field; `None` when no provider matched.
	pub fn optional_field<T: ?Sized + Send + Sync + 'static>(
		&self,
		name: &str,
	) -> DiResult<Option<Arc<T>>> {
		self.named(name)?
			.value
			.as_ref()
			.map(Instance::downcast::<T>)
			.transpose()
	}

	/// Group aggregate field.
	pub fn group_field<E: ?Sized + Send + Sync + 'static>(
		&self,
		name: &str,
	) -> DiResult<Vec<Arc<E>>> {
		required(self.named(name)?)?.members::<E>()
	}

	fn slot(&self, index: usize) -> DiResult<&Slot> {
		self.slots.get(index).ok_or_else(|| DiError::MissingArgument {
			slot: index.to_string(),
		})
	}

	fn named(&self, name: &str) -> DiResult<&Slot> {
		self.slots
			.iter()
			.find(|slot| slot.field == Some(name))
			.ok_or_else(|| DiError::MissingArgument {
				slot: name.to_string(),
			})
	}
}

fn required(slot: &Slot) -> DiResult<&Instance> {
	slot.value.as_ref().ok_or_else(|| DiError::TypeNotFound {
		type_name: slot.key.to_string(),
		tags: slot.tags.normalized(),
	})
}

impl fmt::Debug for Arguments {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list()
			.entries(self.slots.iter().map(|slot| {
				(
					slot.field,
					format!("{}{}", slot.key, slot.tags),
					slot.value.is_some(),
				)
			}))
			.finish()
	}
}
