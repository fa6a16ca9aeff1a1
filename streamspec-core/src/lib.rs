//! # streamspec core
//!
//! Construction-time building blocks for the streamspec dataflow builder.
//!
//! This crate holds everything a runtime needs to read a dataflow graph, but
//! executes nothing itself:
//!
//! - [`types`]: stream ids, the [`StreamData`](types::StreamData) bound, the
//!   type-erased [`BoxedValue`](types::BoxedValue), and outgoing envelopes.
//! - [`functions`]: the user-function contracts (map, flat-map, filter, sink,
//!   join) and the collector/coordinator capabilities handed to sinks.
//! - [`spec`]: [`OperatorSpec`](spec::OperatorSpec), the tagged description of
//!   one edge in the graph.
//! - [`window`]: the bridge from user-facing window descriptors to the
//!   internal [`WindowFn`](window::WindowFn).
//! - [`graph`]: the [`StreamGraph`](graph::StreamGraph) arena that owns every
//!   stream node and its registered specs.
//! - [`plan`]: [`GraphPlan`](plan::GraphPlan), a serializable snapshot of the
//!   reachable graph.
//! - [`config`]: [`GraphConfig`](config::GraphConfig).

pub mod config;
pub mod error;
pub mod functions;
pub mod graph;
pub mod plan;
pub mod spec;
pub mod types;
pub mod window;

pub use error::{GraphError, Result};
