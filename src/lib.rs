//! # Weft
//!
//! Dependency graph container for Rust.
//!
//! Declare how each value is built, let the container prove the graph has no
//! cycles or missing pieces, then resolve instances on demand and tear them
//! down in reverse construction order.
//!
//! ## Feature Flags
//!
//! - `di` (default) - the graph container, re-exported as [`di`]
//! - `dev-tools` - DOT export of the provider graph
//! - `full` - all features enabled
//!
//! ## Quick Example
//!
//! ```rust
//! use weft::prelude::*;
//! use std::sync::Arc;
//!
//! struct Mux;
//! struct Server {
//!     mux: Arc<Mux>,
//! }
//!
//! fn new_mux() -> Result<Mux, BoxError> {
//!     Ok(Mux)
//! }
//!
//! fn new_server(mux: Arc<Mux>) -> Result<Server, BoxError> {
//!     Ok(Server { mux })
//! }
//!
//! let mut container = Container::new();
//! container
//!     .provide(Provider::from_fn(new_mux))
//!     .provide(Provider::from_fn(new_server));
//! container.compile()?;
//!
//! let server = container.extract::<Server>()?;
//! assert!(Arc::ptr_eq(&server.mux, &container.extract::<Mux>()?));
//! container.cleanup();
//! # Ok::<(), DiError>(())
//! ```

#[cfg(feature = "di")]
pub use weft_di as di;

#[cfg(feature = "di")]
pub use weft_di::{
	Cleanup, Container, ContainerSettings, DiError, DiResult, Inject, Invocation, Lifecycle,
	Provider, Request, TagSet,
};

/// Prelude module for convenient imports
pub mod prelude {
	#[cfg(feature = "di")]
	pub use weft_di::{
		Arguments, BoxError, Cleanup, Container, ContainerSettings, DiError, DiResult, Field,
		Inject, Invocation, Lifecycle, Provider, Request, TagSet, TeardownReport,
	};
}
