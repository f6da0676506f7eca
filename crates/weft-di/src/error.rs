//! Error types for graph resolution

use crate::tags::TagSet;

/// Boxed error returned by factories, invocations and fallible cleanups.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the container.
pub type DiResult<T> = Result<T, DiError>;

/// Errors raised while registering, compiling or resolving the graph
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum DiError {
	/// No registered (or implicitly derivable) node matches the lookup
	#[error("type {type_name}{tags} not exists in the container")]
	TypeNotFound {
		/// Requested type
		type_name: String,
		/// Requested tags
		tags: TagSet,
	},

	/// More than one node matches a non-group lookup
	#[error(
		"multiple definitions of {type_name}{tags} ({candidates} candidates), maybe you need to use group type: [{type_name}]{tags}"
	)]
	AmbiguousDefinition {
		/// Requested type
		type_name: String,
		/// Requested tags
		tags: TagSet,
		/// Number of matching nodes
		candidates: usize,
	},

	/// The graph contains a circular requirement chain
	#[error("Circular dependency detected\n  Path: {path}\nThis forms a cycle that cannot be resolved.")]
	DependencyCycle {
		/// Circular path (format: A -> B -> C -> A)
		path: String,
	},

	/// A factory or assembly step reported an error
	#[error("{type_name}: construction failed: {source}")]
	ConstructionFailure {
		/// Node whose build step failed
		type_name: String,
		/// Original cause
		source: BoxError,
	},

	/// Resolution attempted after teardown
	#[error("container is closed")]
	ContainerClosed,

	/// A dependency of `requested_by` could not be resolved
	#[error("{requested_by}: {source}")]
	Dependency {
		/// Node that requested the failing dependency
		requested_by: String,
		/// Failure of the dependency itself
		source: Box<DiError>,
	},

	/// Maximum graph depth exceeded
	#[error(
		"Maximum resolution depth exceeded: {depth}\nThis likely indicates an extremely deep or circular dependency chain."
	)]
	DepthExceeded {
		/// Depth at which the walk stopped
		depth: usize,
	},

	/// A value was read as a type other than the one it resolved to
	#[error("type mismatch: expected {expected}, found {found}")]
	TypeMismatch {
		/// Type asked for
		expected: &'static str,
		/// Type actually held
		found: String,
	},

	/// An argument slot was read that the request list never declared
	#[error("argument {slot} was not declared")]
	MissingArgument {
		/// Index or field name
		slot: String,
	},

	/// An invocation function returned an error
	#[error("invocation failed: {source}")]
	Invocation {
		/// Original cause
		source: BoxError,
	},
}

impl DiError {
	/// Strips `Dependency` context layers and returns the underlying failure.
	///
	/// # Examples
	///
	/// ```
	/// use weft_di::{DiError, TagSet};
	///
	/// let err = DiError::Dependency {
	///     requested_by: "Server".to_string(),
	///     source: Box::new(DiError::TypeNotFound {
	///         type_name: "Mux".to_string(),
	///         tags: TagSet::new(),
	///     }),
	/// };
	/// assert!(err.root_cause().is_not_found());
	/// assert!(!err.is_not_found());
	/// ```
	pub fn root_cause(&self) -> &DiError {
		let mut current = self;
		while let DiError::Dependency { source, .. } = current {
			current = source;
		}
		current
	}

	/// Whether this error (without unwrapping context) is a `TypeNotFound`.
	pub fn is_not_found(&self) -> bool {
		matches!(self, DiError::TypeNotFound { .. })
	}

	/// Chain of requesting nodes, outermost first.
	pub fn requesters(&self) -> Vec<&str> {
		let mut chain = Vec::new();
		let mut current = self;
		while let DiError::Dependency {
			requested_by,
			source,
		} = current
		{
			chain.push(requested_by.as_str());
			current = source;
		}
		chain
	}

	/// Wraps `self` with the requesting node, leaving errors that already
	/// describe the whole chain untouched.
	pub(crate) fn requested_by(self, node: impl ToString) -> DiError {
		match self {
			err @ (DiError::DependencyCycle { .. }
			| DiError::DepthExceeded { .. }
			| DiError::ContainerClosed) => err,
			err => DiError::Dependency {
				requested_by: node.to_string(),
				source: Box::new(err),
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn not_found(name: &str) -> DiError {
		DiError::TypeNotFound {
			type_name: name.to_string(),
			tags: TagSet::new(),
		}
	}

	#[rstest]
	fn test_requested_by_builds_chain() {
		// Arrange
		let err = not_found("Mux");

		// Act
		let wrapped = err.requested_by("Router").requested_by("Server");

		// Assert
		assert_eq!(wrapped.requesters(), vec!["Server", "Router"]);
		assert!(wrapped.root_cause().is_not_found());
		assert_eq!(
			wrapped.to_string(),
			"Server: Router: type Mux not exists in the container"
		);
	}

	#[rstest]
	#[case(DiError::DependencyCycle { path: "A -> B -> A".to_string() })]
	#[case(DiError::DepthExceeded { depth: 101 })]
	#[case(DiError::ContainerClosed)]
	fn test_requested_by_keeps_terminal_errors(#[case] err: DiError) {
		// Act
		let wrapped = err.requested_by("Server");

		// Assert
		assert!(wrapped.requesters().is_empty());
	}

	#[rstest]
	fn test_ambiguous_message_suggests_group() {
		// Arrange
		let err = DiError::AmbiguousDefinition {
			type_name: "Logger".to_string(),
			tags: TagSet::new(),
			candidates: 2,
		};

		// Assert
		assert!(err.to_string().contains("maybe you need to use group type: [Logger]"));
	}
}
