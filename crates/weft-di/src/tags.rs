//! Tag sets used to disambiguate registrations and lookups

use std::collections::BTreeMap;
use std::fmt;

/// Tag key carrying a provider name.
pub const NAME: &str = "name";

/// Reserved label marking a lookup as optional. It never takes part in matching.
pub const OPTIONAL: &str = "optional";

/// Tag value matching any value of the same key.
pub const WILDCARD: &str = "*";

/// Ordered, deduplicated set of `key:value` labels.
///
/// The optional marker is carried alongside the labels but is ignored by
/// [`TagSet::matches`] and [`TagSet::is_subset_of`].
///
/// # Examples
///
/// ```
/// use weft_di::TagSet;
///
/// let lookup = TagSet::named("file");
/// let registered = TagSet::new().with("name", "file");
/// assert!(lookup.matches(&registered));
/// assert!(!TagSet::new().matches(&registered));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TagSet {
	labels: BTreeMap<String, String>,
	optional: bool,
}

impl TagSet {
	/// Creates an empty tag set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a tag set holding only a `name` label.
	pub fn named(name: impl Into<String>) -> Self {
		Self::new().with(NAME, name)
	}

	/// Adds (or replaces) a label.
	///
	/// Using the reserved `optional` key sets the optional marker instead.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		let key = key.into();
		if key == OPTIONAL {
			self.optional = true;
		} else {
			self.labels.insert(key, value.into());
		}
		self
	}

	/// Marks the lookup optional.
	pub fn optional(mut self) -> Self {
		self.optional = true;
		self
	}

	pub fn is_optional(&self) -> bool {
		self.optional
	}

	/// Value of the `name` label, if any.
	pub fn name(&self) -> Option<&str> {
		self.get(NAME)
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.labels.get(key).map(String::as_str)
	}

	/// Whether the set carries no labels (the optional marker is not a label).
	pub fn is_empty(&self) -> bool {
		self.labels.is_empty()
	}

	pub fn len(&self) -> usize {
		self.labels.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	/// Exact match of `self` (a lookup) against a registration's tags.
	///
	/// Both sets must carry the same keys; each value must be equal, or the
	/// lookup value must be the wildcard.
	pub fn matches(&self, registered: &TagSet) -> bool {
		self.labels.len() == registered.labels.len() && self.is_subset_of(registered)
	}

	/// Whether every label of `self` (a lookup) is satisfied by `registered`.
	///
	/// Group lookups filter with this relation, so an untagged group request
	/// gathers every member.
	pub fn is_subset_of(&self, registered: &TagSet) -> bool {
		self.labels.iter().all(|(key, value)| {
			registered
				.labels
				.get(key)
				.is_some_and(|candidate| value == WILDCARD || candidate == value)
		})
	}

	/// Copy of the set without the optional marker.
	pub(crate) fn normalized(&self) -> TagSet {
		TagSet {
			labels: self.labels.clone(),
			optional: false,
		}
	}
}

impl<K, V> FromIterator<(K, V)> for TagSet
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		iter.into_iter()
			.fold(TagSet::new(), |tags, (key, value)| tags.with(key, value))
	}
}

impl fmt::Display for TagSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.labels.is_empty() {
			return Ok(());
		}
		f.write_str("[")?;
		for (i, (key, value)) in self.labels.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{key}:{value:?}")?;
		}
		f.write_str("]")
	}
}
