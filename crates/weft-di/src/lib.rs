//! # Weft Dependency Graph
//!
//! Reflection-free dependency injection container.
//!
//! ## Features
//!
//! - **Typed lookups**: values are addressed by [`TypeKey`] plus [`TagSet`]
//! - **Interfaces**: one provider can be registered as several trait objects
//! - **Groups**: every provider of a type, gathered in registration order
//! - **Aggregates**: types implementing [`Inject`] are assembled field by field
//! - **Lifecycles**: singleton (built once) or prototype (built per lookup)
//! - **Teardown**: cleanups run in reverse construction order
//!
//! Cycles and missing dependencies are reported by [`Container::compile`],
//! before anything is built.
//!
//! ## Development Tools (dev-tools feature)
//!
//! - **Visualization**: export the graph in DOT format for Graphviz
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use weft_di::{Container, Provider};
//!
//! trait Logger: Send + Sync {
//!     fn sink(&self) -> &'static str;
//! }
//!
//! struct Stdout;
//! struct File;
//!
//! impl Logger for Stdout {
//!     fn sink(&self) -> &'static str {
//!         "stdout"
//!     }
//! }
//!
//! impl Logger for File {
//!     fn sink(&self) -> &'static str {
//!         "file"
//!     }
//! }
//!
//! let mut container = Container::new();
//! container
//!     .provide(
//!         Provider::new::<Stdout>()
//!             .named("stdout")
//!             .implements::<dyn Logger>(|l| l as Arc<dyn Logger>)
//!             .factory(|_| Ok(Stdout)),
//!     )
//!     .provide(
//!         Provider::new::<File>()
//!             .named("file")
//!             .implements::<dyn Logger>(|l| l as Arc<dyn Logger>)
//!             .factory(|_| Ok(File)),
//!     );
//! container.compile().unwrap();
//!
//! let file = container.extract_named::<dyn Logger>("file").unwrap();
//! assert_eq!(file.sink(), "file");
//!
//! let sinks: Vec<_> = container
//!     .group::<dyn Logger>()
//!     .unwrap()
//!     .iter()
//!     .map(|logger| logger.sink())
//!     .collect();
//! assert_eq!(sinks, ["stdout", "file"]);
//! ```

pub mod cleanup;
mod compiler;
pub mod container;
pub mod cycle_detection;
pub mod error;
pub mod injectable;
pub mod instance;
pub mod key;
pub mod node;
pub mod provider;
mod resolver;
mod schema;
pub mod settings;
pub mod tags;

#[cfg(feature = "dev-tools")]
pub mod visualization;

pub use cleanup::{Cleanup, TeardownReport};
pub use container::Container;
pub use cycle_detection::MAX_RESOLUTION_DEPTH;
pub use error::{BoxError, DiError, DiResult};
pub use injectable::{Field, Inject};
pub use instance::{Arguments, Instance};
pub use key::{Request, Shape, TypeKey};
pub use node::{Lifecycle, NodeId};
pub use provider::{FactoryFn, Invocation, InvocationBuilder, Provider, ProviderBuilder};
pub use settings::{ContainerSettings, SettingsError};
pub use tags::TagSet;
