//! # streamspec API
//!
//! Fluent `MessageStream` API for composing a dataflow graph that a runtime
//! scheduler later walks.
//!
//! ## Quick Start
//!
//! ```rust
//! use streamspec_api::environment::StreamEnvironment;
//! use streamspec_api::streamspec_core::types::SystemStream;
//!
//! let env = StreamEnvironment::new("page-lengths");
//! let pages = env.input_stream::<String>(SystemStream::new("kafka", "pages"));
//! let long_pages = pages
//!     .map(|page: String| page.len())
//!     .unwrap()
//!     .filter(|len: &usize| *len > 10)
//!     .unwrap();
//! long_pages.sink(|_len, _collector, _coordinator| {}).unwrap();
//!
//! let plan = env.plan().unwrap();
//! assert_eq!(plan.streams.len(), 3);
//! ```
//!
//! - [`environment`]: [`StreamEnvironment`](environment::StreamEnvironment),
//!   the arena owner that declares inputs and snapshots the graph.
//! - [`message_stream`]: [`MessageStream`](message_stream::MessageStream),
//!   the builder operations.

pub mod environment;
pub mod message_stream;

pub use streamspec_core;
