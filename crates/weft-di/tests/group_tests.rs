//! Group lookups: every provider of an element type, in registration order

use rstest::*;
use std::sync::Arc;
use weft_di::{Container, Provider, Request};

trait Handler: Send + Sync {
	fn path(&self) -> &str;
}

struct Route(&'static str);

impl Handler for Route {
	fn path(&self) -> &str {
		self.0
	}
}

struct Router {
	routes: Vec<String>,
}

fn route(path: &'static str) -> Provider {
	Provider::new::<Route>()
		.named(path)
		.tag("method", if path.starts_with("/admin") { "post" } else { "get" })
		.implements::<dyn Handler>(|r| r as Arc<dyn Handler>)
		.factory(move |_| Ok(Route(path)))
}

#[fixture]
fn routes() -> Container {
	let mut container = Container::new();
	container
		.provide(route("/health"))
		.provide(route("/users"))
		.provide(route("/admin/users"));
	container
}

fn paths(handlers: &[Arc<dyn Handler>]) -> Vec<&str> {
	handlers.iter().map(|h| h.path()).collect()
}

#[rstest]
fn group_keeps_registration_order(routes: Container) {
	// Act
	let handlers = routes.group::<dyn Handler>().unwrap();

	// Assert
	assert_eq!(paths(&handlers), vec!["/health", "/users", "/admin/users"]);
}

#[rstest]
fn group_members_share_singletons(routes: Container) {
	// Act
	let handlers = routes.group::<dyn Handler>().unwrap();
	let health = routes.extract_named::<Route>("/health").unwrap();

	// Assert
	assert_eq!(
		Arc::as_ptr(&handlers[0]) as *const (),
		Arc::as_ptr(&health) as *const ()
	);
}

#[rstest]
fn group_of_concrete_type_includes_every_provider(routes: Container) {
	// Act
	let routes = routes.group::<Route>().unwrap();

	// Assert
	assert_eq!(routes.len(), 3);
}

#[rstest]
fn group_filters_by_tag_subset(routes: Container) {
	// Act
	let instance = routes
		.resolve(&Request::group::<dyn Handler>().tag("method", "get"))
		.unwrap()
		.unwrap();

	// Assert
	let handlers = instance.members::<dyn Handler>().unwrap();
	assert_eq!(paths(&handlers), vec!["/health", "/users"]);
}

#[rstest]
fn empty_group_is_not_found() {
	// Arrange
	let container = Container::new();

	// Act
	let err = container.group::<dyn Handler>().err().unwrap();

	// Assert
	assert!(err.is_not_found());
}

#[rstest]
fn optional_empty_group_is_none() {
	// Arrange
	let container = Container::new();

	// Act
	let value = container
		.resolve(&Request::group::<dyn Handler>().optional())
		.unwrap();

	// Assert
	assert!(value.is_none());
}

#[rstest]
fn group_param_is_injected_into_providers(mut routes: Container) {
	// Arrange
	routes.provide(
		Provider::new::<Router>()
			.group_param::<dyn Handler>()
			.factory(|args| {
				let routes = args
					.group::<dyn Handler>(0)?
					.iter()
					.map(|h| h.path().to_string())
					.collect();
				Ok(Router { routes })
			}),
	);
	routes.compile().unwrap();

	// Act
	let router = routes.extract::<Router>().unwrap();

	// Assert
	assert_eq!(router.routes, vec!["/health", "/users", "/admin/users"]);
}

#[rstest]
fn group_is_a_snapshot_after_first_lookup(mut routes: Container) {
	// Arrange
	let before = routes.group::<dyn Handler>().unwrap();

	// Act
	routes.provide(route("/metrics"));
	let after = routes.group::<dyn Handler>().unwrap();

	// Assert
	assert_eq!(before.len(), 3);
	assert_eq!(after.len(), 3);
	assert!(routes.has_request(&Request::of::<Route>().named("/metrics")));
}

#[rstest]
fn repeated_interface_declaration_counts_once() {
	// Arrange
	let mut container = Container::new();
	container.provide(
		Provider::new::<Route>()
			.implements::<dyn Handler>(|r| r as Arc<dyn Handler>)
			.implements::<dyn Handler>(|r| r as Arc<dyn Handler>)
			.factory(|_| Ok(Route("/health"))),
	);

	// Act
	let handlers = container.group::<dyn Handler>().unwrap();
	let single = container.extract::<dyn Handler>();

	// Assert
	assert_eq!(paths(&handlers), vec!["/health"]);
	assert_eq!(single.unwrap().path(), "/health");
}
