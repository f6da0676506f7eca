//! Build strategies: how a node declares its dependencies and produces its value

use crate::cleanup::Cleanup;
use crate::error::BoxError;
use crate::injectable::{AggregateSpec, Field};
use crate::instance::{Arguments, Instance};
use crate::key::{Request, TypeKey};
use crate::node::NodeId;
use std::sync::Arc;

/// Output of a build step.
pub(crate) struct Built {
	pub(crate) instance: Instance,
	pub(crate) cleanup: Option<Cleanup>,
}

impl Built {
	pub(crate) fn new(instance: Instance) -> Self {
		Self {
			instance,
			cleanup: None,
		}
	}

	pub(crate) fn with_cleanup(instance: Instance, cleanup: Cleanup) -> Self {
		Self {
			instance,
			cleanup: Some(cleanup),
		}
	}
}

pub(crate) type Factory = Arc<dyn Fn(&Arguments) -> Result<Built, BoxError> + Send + Sync>;

/// One edge out of a node, recomputed on demand.
pub(crate) enum Dependency<'a> {
	/// Resolved through the schema
	Lookup {
		field: Option<&'static str>,
		request: &'a Request,
	},
	/// Fixed group member, viewed as the group's element type
	Member { node: NodeId, view: TypeKey },
}

pub(crate) enum Compiler {
	Constructor(ConstructorCompiler),
	Aggregate(AggregateCompiler),
	Group(GroupCompiler),
}

impl Compiler {
	pub(crate) fn constructor(params: Vec<Request>, factory: Factory) -> Self {
		Compiler::Constructor(ConstructorCompiler { params, factory })
	}

	pub(crate) fn aggregate(spec: AggregateSpec) -> Self {
		let fields = spec.fields();
		Compiler::Aggregate(AggregateCompiler { spec, fields })
	}

	pub(crate) fn group(element: TypeKey, members: Vec<NodeId>) -> Self {
		Compiler::Group(GroupCompiler { element, members })
	}

	pub(crate) fn kind(&self) -> &'static str {
		match self {
			Compiler::Constructor(_) => "constructor",
			Compiler::Aggregate(_) => "aggregate",
			Compiler::Group(_) => "group",
		}
	}

	/// Dependencies in the order their values are passed to [`Compiler::compile`].
	pub(crate) fn dependencies(&self) -> Vec<Dependency<'_>> {
		match self {
			Compiler::Constructor(c) => c
				.params
				.iter()
				.map(|request| Dependency::Lookup {
					field: None,
					request,
				})
				.collect(),
			Compiler::Aggregate(c) => c
				.fields
				.iter()
				.map(|field| Dependency::Lookup {
					field: Some(field.name()),
					request: field.as_request(),
				})
				.collect(),
			Compiler::Group(c) => c
				.members
				.iter()
				.map(|&node| Dependency::Member {
					node,
					view: c.element,
				})
				.collect(),
		}
	}

	pub(crate) fn compile(&self, args: Arguments) -> Result<Built, BoxError> {
		match self {
			Compiler::Constructor(c) => (c.factory)(&args),
			Compiler::Aggregate(c) => c.spec.assemble(&args).map(Built::new),
			Compiler::Group(c) => {
				let members = args
					.into_instances()
					.into_iter()
					.collect::<Option<Vec<_>>>()
					.ok_or_else(|| format!("group {} has an unresolved member", c.element))?;
				Ok(Built::new(Instance::from_value(members)))
			}
		}
	}
}

pub(crate) struct ConstructorCompiler {
	params: Vec<Request>,
	factory: Factory,
}

pub(crate) struct AggregateCompiler {
	spec: AggregateSpec,
	fields: Vec<Field>,
}

pub(crate) struct GroupCompiler {
	element: TypeKey,
	members: Vec<NodeId>,
}
