//! Cleanup chain: teardown closures recorded during construction

use crate::error::BoxError;
use parking_lot::Mutex;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Teardown closure returned by a factory alongside its value.
pub struct Cleanup(Box<dyn FnOnce() -> Result<(), BoxError> + Send>);

impl Cleanup {
	pub fn new<F>(f: F) -> Self
	where
		F: FnOnce() + Send + 'static,
	{
		Self(Box::new(move || {
			f();
			Ok(())
		}))
	}

	/// Cleanup that may report a failure; the failure is logged at teardown.
	pub fn fallible<F>(f: F) -> Self
	where
		F: FnOnce() -> Result<(), BoxError> + Send + 'static,
	{
		Self(Box::new(f))
	}

	/// Runs the closure, turning errors and panics into a message.
	fn run(self) -> Result<(), String> {
		match catch_unwind(AssertUnwindSafe(self.0)) {
			Ok(Ok(())) => Ok(()),
			Ok(Err(err)) => Err(err.to_string()),
			Err(payload) => Err(panic_message(payload.as_ref())),
		}
	}
}

impl fmt::Debug for Cleanup {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Cleanup")
	}
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&str>() {
		format!("panicked: {message}")
	} else if let Some(message) = payload.downcast_ref::<String>() {
		format!("panicked: {message}")
	} else {
		"panicked".to_string()
	}
}

/// Outcome of a teardown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
	/// Closures invoked, including failed ones
	pub executed: usize,
	/// `owner: message` for each closure that failed
	pub failures: Vec<String>,
}

impl TeardownReport {
	pub fn is_clean(&self) -> bool {
		self.failures.is_empty()
	}
}

struct Record {
	owner: String,
	cleanup: Cleanup,
}

#[derive(Default)]
struct ChainState {
	records: Vec<Record>,
	drained: bool,
}

/// Append-only list of cleanups in construction completion order.
#[derive(Default)]
pub(crate) struct CleanupChain {
	state: Mutex<ChainState>,
}

impl CleanupChain {
	pub(crate) fn new() -> Self {
		Self::default()
	}

	/// Records a cleanup. Once the chain has been drained, the cleanup runs
	/// immediately instead of being kept.
	pub(crate) fn push(&self, owner: String, cleanup: Cleanup) {
		let mut state = self.state.lock();
		if !state.drained {
			tracing::trace!(owner = %owner, position = state.records.len(), "cleanup recorded");
			state.records.push(Record { owner, cleanup });
			return;
		}
		drop(state);

		tracing::debug!(owner = %owner, "cleanup recorded after teardown, running it now");
		if let Err(message) = cleanup.run() {
			tracing::warn!(owner = %owner, error = %message, "cleanup failed");
		}
	}

	pub(crate) fn len(&self) -> usize {
		self.state.lock().records.len()
	}

	/// Runs every recorded cleanup in reverse order. Failures are logged and
	/// collected; the remaining closures still run.
	pub(crate) fn drain(&self) -> TeardownReport {
		let records = {
			let mut state = self.state.lock();
			state.drained = true;
			std::mem::take(&mut state.records)
		};

		let mut report = TeardownReport::default();
		for Record { owner, cleanup } in records.into_iter().rev() {
			report.executed += 1;
			if let Err(message) = cleanup.run() {
				tracing::warn!(owner = %owner, error = %message, "cleanup failed");
				report.failures.push(format!("{owner}: {message}"));
			}
		}
		tracing::debug!(
			executed = report.executed,
			failed = report.failures.len(),
			"cleanup chain drained"
		);
		report
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::sync::Arc;

	fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> Cleanup {
		let log = Arc::clone(log);
		Cleanup::new(move || log.lock().push(label))
	}

	#[rstest]
	fn test_drain_runs_in_reverse_order() {
		// Arrange
		let log = Arc::new(Mutex::new(Vec::new()));
		let chain = CleanupChain::new();
		chain.push("first".into(), recorder(&log, "first"));
		chain.push("second".into(), recorder(&log, "second"));
		chain.push("third".into(), recorder(&log, "third"));

		// Act
		let report = chain.drain();

		// Assert
		assert_eq!(*log.lock(), vec!["third", "second", "first"]);
		assert_eq!(report.executed, 3);
		assert!(report.is_clean());
		assert_eq!(chain.len(), 0);
	}

	#[rstest]
	fn test_drain_continues_past_failures() {
		// Arrange
		let log = Arc::new(Mutex::new(Vec::new()));
		let chain = CleanupChain::new();
		chain.push("db".into(), recorder(&log, "db"));
		chain.push(
			"broken".into(),
			Cleanup::fallible(|| Err("socket already closed".into())),
		);
		chain.push("panicky".into(), Cleanup::new(|| panic!("boom")));
		chain.push("cache".into(), recorder(&log, "cache"));

		// Act
		let report = chain.drain();

		// Assert
		assert_eq!(*log.lock(), vec!["cache", "db"]);
		assert_eq!(report.executed, 4);
		assert_eq!(
			report.failures,
			vec![
				"panicky: panicked: boom".to_string(),
				"broken: socket already closed".to_string(),
			]
		);
	}

	#[rstest]
	fn test_push_after_drain_runs_immediately() {
		// Arrange
		let log = Arc::new(Mutex::new(Vec::new()));
		let chain = CleanupChain::new();
		chain.drain();

		// Act
		chain.push("late".into(), recorder(&log, "late"));

		// Assert
		assert_eq!(*log.lock(), vec!["late"]);
		assert_eq!(chain.len(), 0);
		assert_eq!(chain.drain().executed, 0);
	}
}
