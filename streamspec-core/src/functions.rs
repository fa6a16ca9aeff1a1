//! User-function contracts.
//!
//! Each contract is a trait with a blanket implementation for the matching
//! closure shape, so plain closures satisfy it and named structs can
//! implement it explicitly. All contracts are `Send + Sync`: a runtime may
//! share the registered specs across worker threads.

use crate::types::OutgoingEnvelope;

/// One output per input.
pub trait MapFunction<IN, OUT>: Send + Sync {
    fn apply(&self, message: IN) -> OUT;
}

impl<IN, OUT, F> MapFunction<IN, OUT> for F
where
    F: Fn(IN) -> OUT + Send + Sync,
{
    fn apply(&self, message: IN) -> OUT {
        self(message)
    }
}

/// Zero or more outputs per input, in the order returned.
pub trait FlatMapFunction<IN, OUT>: Send + Sync {
    fn apply(&self, message: IN) -> Vec<OUT>;
}

impl<IN, OUT, I, F> FlatMapFunction<IN, OUT> for F
where
    F: Fn(IN) -> I + Send + Sync,
    I: IntoIterator<Item = OUT>,
{
    fn apply(&self, message: IN) -> Vec<OUT> {
        self(message).into_iter().collect()
    }
}

/// Keep-or-drop predicate. Should be side-effect free.
pub trait FilterFunction<IN>: Send + Sync {
    fn apply(&self, message: &IN) -> bool;
}

impl<IN, F> FilterFunction<IN> for F
where
    F: Fn(&IN) -> bool + Send + Sync,
{
    fn apply(&self, message: &IN) -> bool {
        self(message)
    }
}

/// Terminal consumer of a stream.
pub trait SinkFunction<IN>: Send + Sync {
    fn apply(
        &self,
        message: IN,
        collector: &mut dyn MessageCollector,
        coordinator: &mut dyn TaskCoordinator,
    );
}

impl<IN, F> SinkFunction<IN> for F
where
    F: Fn(IN, &mut dyn MessageCollector, &mut dyn TaskCoordinator) + Send + Sync,
{
    fn apply(
        &self,
        message: IN,
        collector: &mut dyn MessageCollector,
        coordinator: &mut dyn TaskCoordinator,
    ) {
        self(message, collector, coordinator)
    }
}

/// Combines one element from each side of a join.
///
/// Always written from the first stream's perspective: `left` is the element
/// of the stream `join` was called on.
pub trait JoinFunction<L, R, OUT>: Send + Sync {
    fn apply(&self, left: &L, right: &R) -> OUT;
}

impl<L, R, OUT, F> JoinFunction<L, R, OUT> for F
where
    F: Fn(&L, &R) -> OUT + Send + Sync,
{
    fn apply(&self, left: &L, right: &R) -> OUT {
        self(left, right)
    }
}

/// Runtime-provided output channel for sinks.
pub trait MessageCollector {
    fn send(&mut self, envelope: OutgoingEnvelope);
}

/// Scope of a coordinator request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestScope {
    /// Only the task that issued the request.
    CurrentTask,
    /// Every task in the same container.
    AllTasksInContainer,
}

/// Runtime-provided progress control for sinks.
pub trait TaskCoordinator {
    /// Request a commit of processed offsets.
    fn commit(&mut self, scope: RequestScope);

    /// Request an orderly shutdown.
    fn shutdown(&mut self, scope: RequestScope);
}
