//! Facade and prelude re-exports

#![cfg(feature = "di")]

use rstest::rstest;
use std::sync::Arc;
use weft::prelude::*;

struct Clock;

struct Scheduler {
	clock: Arc<Clock>,
}

fn new_scheduler(clock: Arc<Clock>) -> Result<Scheduler, BoxError> {
	Ok(Scheduler { clock })
}

#[rstest]
fn test_prelude_builds_a_graph() {
	// Arrange
	let mut container = Container::new();
	container
		.provide(Provider::value(Clock))
		.provide(Provider::from_fn(new_scheduler));

	// Act
	container.compile().unwrap();
	let scheduler = container.extract::<Scheduler>().unwrap();

	// Assert
	assert!(Arc::ptr_eq(
		&scheduler.clock,
		&container.extract::<Clock>().unwrap()
	));
	assert!(container.cleanup().is_clean());
}

#[rstest]
fn test_di_module_matches_flat_exports() {
	// Arrange
	let container = weft::di::Container::new();

	// Act
	let result = container.extract::<Clock>();

	// Assert
	assert!(matches!(result, Err(weft::DiError::TypeNotFound { .. })));
}
