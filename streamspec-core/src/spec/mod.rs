//! Operator specifications: one tagged value per edge of the dataflow graph.
//!
//! The builder lowers every user operation to one of four shapes:
//!
//! | User operation | Spec |
//! |---|---|
//! | `map`, `flat_map`, `filter`, `merge` (per input) | [`StreamOperatorSpec`] |
//! | `sink` | [`SinkOperatorSpec`] |
//! | `window` | [`WindowOperatorSpec`] |
//! | `join` (one per side) | [`PartialJoinOperatorSpec`] |
//!
//! Specs never run on their own. They hold the user function behind a
//! type-erased entry point working on [`BoxedValue`]s so the runtime can
//! dispatch on [`SpecKind`] alone; typed `apply` wrappers exist for callers
//! that know the element types.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::functions::{
    FilterFunction, FlatMapFunction, JoinFunction, MapFunction, MessageCollector, SinkFunction,
    TaskCoordinator,
};
use crate::types::{BoxedValue, StreamData, StreamId};
use crate::window::{WindowAssignment, WindowFn, WindowOutput};

/// Type-erased one-to-many transform.
pub type TransformFn = Arc<dyn Fn(BoxedValue) -> Result<Vec<BoxedValue>> + Send + Sync>;

/// Type-erased sink.
pub type SinkFn = Arc<
    dyn Fn(BoxedValue, &mut dyn MessageCollector, &mut dyn TaskCoordinator) -> Result<()>
        + Send
        + Sync,
>;

/// Type-erased join of an own-side element with an other-side element.
pub type BiTransformFn = Arc<dyn Fn(&BoxedValue, &BoxedValue) -> Result<BoxedValue> + Send + Sync>;

/// Kind tag the runtime dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecKind {
    Stream,
    Sink,
    Window,
    PartialJoin,
}

/// Which input of a join a partial is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinSide {
    /// The stream `join` was called on.
    Left,
    /// The `other` argument of `join`.
    Right,
}

/// One registered edge of the dataflow graph.
#[derive(Clone)]
pub enum OperatorSpec {
    Stream(StreamOperatorSpec),
    Sink(SinkOperatorSpec),
    Window(WindowOperatorSpec),
    PartialJoin(PartialJoinOperatorSpec),
}

impl OperatorSpec {
    /// Structural variant of this spec.
    pub fn kind(&self) -> SpecKind {
        match self {
            OperatorSpec::Stream(_) => SpecKind::Stream,
            OperatorSpec::Sink(_) => SpecKind::Sink,
            OperatorSpec::Window(_) => SpecKind::Window,
            OperatorSpec::PartialJoin(_) => SpecKind::PartialJoin,
        }
    }

    /// Downstream stream fed by this spec. `None` for sinks.
    pub fn output_stream(&self) -> Option<StreamId> {
        match self {
            OperatorSpec::Stream(spec) => Some(spec.output),
            OperatorSpec::Sink(_) => None,
            OperatorSpec::Window(spec) => Some(spec.output),
            OperatorSpec::PartialJoin(spec) => Some(spec.output),
        }
    }

    /// Type name of the elements this spec consumes.
    pub fn input_type(&self) -> &'static str {
        match self {
            OperatorSpec::Stream(spec) => spec.input_type,
            OperatorSpec::Sink(spec) => spec.input_type,
            OperatorSpec::Window(spec) => spec.input_type,
            OperatorSpec::PartialJoin(spec) => spec.input_type,
        }
    }

    /// Type name of the elements this spec produces. `None` for sinks.
    pub fn output_type(&self) -> Option<&'static str> {
        match self {
            OperatorSpec::Stream(spec) => Some(spec.output_type),
            OperatorSpec::Sink(_) => None,
            OperatorSpec::Window(spec) => Some(spec.output_type),
            OperatorSpec::PartialJoin(spec) => Some(spec.output_type),
        }
    }

    /// The map/flatMap/filter/merge payload, if this is a stream spec.
    pub fn as_stream(&self) -> Option<&StreamOperatorSpec> {
        match self {
            OperatorSpec::Stream(spec) => Some(spec),
            _ => None,
        }
    }

    /// The sink payload, if this is a sink spec.
    pub fn as_sink(&self) -> Option<&SinkOperatorSpec> {
        match self {
            OperatorSpec::Sink(spec) => Some(spec),
            _ => None,
        }
    }

    /// The window payload, if this is a window spec.
    pub fn as_window(&self) -> Option<&WindowOperatorSpec> {
        match self {
            OperatorSpec::Window(spec) => Some(spec),
            _ => None,
        }
    }

    /// One side of a join, if this is a partial-join spec.
    pub fn as_partial_join(&self) -> Option<&PartialJoinOperatorSpec> {
        match self {
            OperatorSpec::PartialJoin(spec) => Some(spec),
            _ => None,
        }
    }
}

impl fmt::Debug for OperatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorSpec::Stream(spec) => fmt::Debug::fmt(spec, f),
            OperatorSpec::Sink(spec) => fmt::Debug::fmt(spec, f),
            OperatorSpec::Window(spec) => fmt::Debug::fmt(spec, f),
            OperatorSpec::PartialJoin(spec) => fmt::Debug::fmt(spec, f),
        }
    }
}

impl From<StreamOperatorSpec> for OperatorSpec {
    fn from(spec: StreamOperatorSpec) -> Self {
        OperatorSpec::Stream(spec)
    }
}

impl From<SinkOperatorSpec> for OperatorSpec {
    fn from(spec: SinkOperatorSpec) -> Self {
        OperatorSpec::Sink(spec)
    }
}

impl From<WindowOperatorSpec> for OperatorSpec {
    fn from(spec: WindowOperatorSpec) -> Self {
        OperatorSpec::Window(spec)
    }
}

impl From<PartialJoinOperatorSpec> for OperatorSpec {
    fn from(spec: PartialJoinOperatorSpec) -> Self {
        OperatorSpec::PartialJoin(spec)
    }
}

// ── Stream ────────────────────────────────────────────────────────────────────

/// One input element in, a finite ordered collection out.
#[derive(Clone)]
pub struct StreamOperatorSpec {
    output: StreamId,
    transform: TransformFn,
    input_type: &'static str,
    output_type: &'static str,
}

impl StreamOperatorSpec {
    /// `e -> [f(e)]`.
    pub fn map<IN, OUT, F>(output: StreamId, f: F) -> Self
    where
        IN: StreamData,
        OUT: StreamData,
        F: MapFunction<IN, OUT> + 'static,
    {
        let transform: TransformFn = Arc::new(move |value: BoxedValue| -> Result<Vec<BoxedValue>> {
            let message = value.try_downcast::<IN>()?;
            Ok(vec![BoxedValue::new(f.apply(message))])
        });
        Self::from_transform::<IN, OUT>(output, transform)
    }

    /// `e -> f(e)`, order preserved.
    pub fn flat_map<IN, OUT, F>(output: StreamId, f: F) -> Self
    where
        IN: StreamData,
        OUT: StreamData,
        F: FlatMapFunction<IN, OUT> + 'static,
    {
        let transform: TransformFn = Arc::new(move |value: BoxedValue| -> Result<Vec<BoxedValue>> {
            let message = value.try_downcast::<IN>()?;
            Ok(f.apply(message).into_iter().map(BoxedValue::new).collect())
        });
        Self::from_transform::<IN, OUT>(output, transform)
    }

    /// `e -> [e]` if `predicate(e)`, else `[]`. A kept element is re-emitted
    /// as the same value, never copied.
    pub fn filter<IN, F>(output: StreamId, predicate: F) -> Self
    where
        IN: StreamData,
        F: FilterFunction<IN> + 'static,
    {
        let transform: TransformFn = Arc::new(move |value: BoxedValue| -> Result<Vec<BoxedValue>> {
            let keep = predicate.apply(value.try_downcast_ref::<IN>()?);
            Ok(if keep { vec![value] } else { Vec::new() })
        });
        Self::from_transform::<IN, IN>(output, transform)
    }

    /// `e -> [e]`. Used for each input of a merge.
    pub fn identity<IN: StreamData>(output: StreamId) -> Self {
        let transform: TransformFn = Arc::new(|value: BoxedValue| -> Result<Vec<BoxedValue>> {
            value.try_downcast_ref::<IN>()?;
            Ok(vec![value])
        });
        Self::from_transform::<IN, IN>(output, transform)
    }

    fn from_transform<IN, OUT>(output: StreamId, transform: TransformFn) -> Self {
        Self {
            output,
            transform,
            input_type: type_name::<IN>(),
            output_type: type_name::<OUT>(),
        }
    }

    /// Stream the produced elements are sent to.
    pub fn output_stream(&self) -> StreamId {
        self.output
    }

    /// The type-erased transform the runtime calls per element.
    pub fn transform_fn(&self) -> &TransformFn {
        &self.transform
    }

    /// Run the transform on a boxed element. Fails with `TypeMismatch` when
    /// the element is not of the spec's input type.
    pub fn apply_boxed(&self, value: BoxedValue) -> Result<Vec<BoxedValue>> {
        (self.transform)(value)
    }

    /// Run the transform on a typed element.
    pub fn apply<IN: StreamData, OUT: 'static>(&self, message: IN) -> Result<Vec<OUT>> {
        self.apply_boxed(BoxedValue::new(message))?
            .into_iter()
            .map(BoxedValue::try_downcast::<OUT>)
            .collect()
    }
}

impl fmt::Debug for StreamOperatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamOperatorSpec")
            .field("output", &self.output)
            .field("input_type", &self.input_type)
            .field("output_type", &self.output_type)
            .finish_non_exhaustive()
    }
}

// ── Sink ──────────────────────────────────────────────────────────────────────

/// Terminal spec; has no output stream.
#[derive(Clone)]
pub struct SinkOperatorSpec {
    sink: SinkFn,
    input_type: &'static str,
}

impl SinkOperatorSpec {
    /// Erase `f` behind the boxed sink signature.
    pub fn new<IN, F>(f: F) -> Self
    where
        IN: StreamData,
        F: SinkFunction<IN> + 'static,
    {
        let sink: SinkFn = Arc::new(
            move |value: BoxedValue,
                  collector: &mut dyn MessageCollector,
                  coordinator: &mut dyn TaskCoordinator|
                  -> Result<()> {
                f.apply(value.try_downcast::<IN>()?, collector, coordinator);
                Ok(())
            },
        );
        Self {
            sink,
            input_type: type_name::<IN>(),
        }
    }

    /// The type-erased sink the runtime calls per element.
    pub fn sink_fn(&self) -> &SinkFn {
        &self.sink
    }

    /// Hand a boxed element to the sink.
    pub fn apply_boxed(
        &self,
        value: BoxedValue,
        collector: &mut dyn MessageCollector,
        coordinator: &mut dyn TaskCoordinator,
    ) -> Result<()> {
        (self.sink)(value, collector, coordinator)
    }

    /// Hand a typed element to the sink.
    pub fn apply<IN: StreamData>(
        &self,
        message: IN,
        collector: &mut dyn MessageCollector,
        coordinator: &mut dyn TaskCoordinator,
    ) -> Result<()> {
        self.apply_boxed(BoxedValue::new(message), collector, coordinator)
    }
}

impl fmt::Debug for SinkOperatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkOperatorSpec")
            .field("input_type", &self.input_type)
            .finish_non_exhaustive()
    }
}

// ── Window ────────────────────────────────────────────────────────────────────

/// Windowed aggregation edge. Output elements are [`WindowOutput`]s.
#[derive(Clone)]
pub struct WindowOperatorSpec {
    output: StreamId,
    window_fn: Arc<dyn Any + Send + Sync>,
    assignment: WindowAssignment,
    window_fn_type: &'static str,
    input_type: &'static str,
    output_type: &'static str,
}

impl WindowOperatorSpec {
    /// Store the resolved `window_fn`, feeding `output`.
    pub fn new<M, K, V>(output: StreamId, window_fn: WindowFn<M, K, V>) -> Self
    where
        M: StreamData,
        K: StreamData,
        V: StreamData,
    {
        Self {
            output,
            assignment: window_fn.assignment(),
            window_fn: Arc::new(window_fn),
            window_fn_type: type_name::<WindowFn<M, K, V>>(),
            input_type: type_name::<M>(),
            output_type: type_name::<WindowOutput<K, V>>(),
        }
    }

    /// Stream the window results are sent to.
    pub fn output_stream(&self) -> StreamId {
        self.output
    }

    /// Window shape of the stored window function.
    pub fn assignment(&self) -> WindowAssignment {
        self.assignment
    }

    /// The resolved internal window function, typed.
    pub fn window_fn<M, K, V>(&self) -> Result<&WindowFn<M, K, V>>
    where
        M: 'static,
        K: 'static,
        V: 'static,
    {
        self.window_fn
            .downcast_ref::<WindowFn<M, K, V>>()
            .ok_or(GraphError::TypeMismatch {
                expected: type_name::<WindowFn<M, K, V>>(),
                actual: self.window_fn_type,
            })
    }
}

impl fmt::Debug for WindowOperatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowOperatorSpec")
            .field("output", &self.output)
            .field("assignment", &self.assignment)
            .field("window_fn_type", &self.window_fn_type)
            .field("input_type", &self.input_type)
            .field("output_type", &self.output_type)
            .finish_non_exhaustive()
    }
}

// ── Partial join ──────────────────────────────────────────────────────────────

/// One side of a binary join.
///
/// The bi-transform always takes the element arriving on this partial's own
/// input first. The right partial flips its arguments before calling the
/// joiner, so the joiner sees the left element first whichever side the
/// record arrived on.
#[derive(Clone)]
pub struct PartialJoinOperatorSpec {
    output: StreamId,
    side: JoinSide,
    peer: StreamId,
    bi_transform: BiTransformFn,
    input_type: &'static str,
    other_type: &'static str,
    output_type: &'static str,
}

impl PartialJoinOperatorSpec {
    /// Build both partials of `left ⋈ right`, sharing `output` and one joiner.
    ///
    /// Returns `(left_partial, right_partial)`.
    pub fn pair<L, R, OUT, J>(
        left: StreamId,
        right: StreamId,
        output: StreamId,
        joiner: J,
    ) -> (Self, Self)
    where
        L: StreamData,
        R: StreamData,
        OUT: StreamData,
        J: JoinFunction<L, R, OUT> + 'static,
    {
        let joiner = Arc::new(joiner);

        let left_joiner = Arc::clone(&joiner);
        let left_transform: BiTransformFn =
            Arc::new(move |own: &BoxedValue, other: &BoxedValue| -> Result<BoxedValue> {
                let l = own.try_downcast_ref::<L>()?;
                let r = other.try_downcast_ref::<R>()?;
                Ok(BoxedValue::new(left_joiner.apply(l, r)))
            });

        let right_joiner = joiner;
        let right_transform: BiTransformFn =
            Arc::new(move |own: &BoxedValue, other: &BoxedValue| -> Result<BoxedValue> {
                let r = own.try_downcast_ref::<R>()?;
                let l = other.try_downcast_ref::<L>()?;
                Ok(BoxedValue::new(right_joiner.apply(l, r)))
            });

        let left_partial = Self {
            output,
            side: JoinSide::Left,
            peer: right,
            bi_transform: left_transform,
            input_type: type_name::<L>(),
            other_type: type_name::<R>(),
            output_type: type_name::<OUT>(),
        };
        let right_partial = Self {
            output,
            side: JoinSide::Right,
            peer: left,
            bi_transform: right_transform,
            input_type: type_name::<R>(),
            other_type: type_name::<L>(),
            output_type: type_name::<OUT>(),
        };
        (left_partial, right_partial)
    }

    /// Stream both partials of the join feed.
    pub fn output_stream(&self) -> StreamId {
        self.output
    }

    /// Which join operand this partial is registered on.
    pub fn side(&self) -> JoinSide {
        self.side
    }

    /// The input stream of the opposite partial.
    pub fn peer(&self) -> StreamId {
        self.peer
    }

    /// Type name of the peer input's elements.
    pub fn other_type(&self) -> &'static str {
        self.other_type
    }

    /// The type-erased joiner, taking this partial's element first.
    pub fn bi_transform_fn(&self) -> &BiTransformFn {
        &self.bi_transform
    }

    /// Join two boxed elements, this partial's own element first.
    pub fn apply_boxed(&self, own: &BoxedValue, other: &BoxedValue) -> Result<BoxedValue> {
        (self.bi_transform)(own, other)
    }

    /// Join an element from this partial's input with one from the peer input.
    pub fn apply<OWN, OTHER, OUT>(&self, own: OWN, other: OTHER) -> Result<OUT>
    where
        OWN: StreamData,
        OTHER: StreamData,
        OUT: 'static,
    {
        self.apply_boxed(&BoxedValue::new(own), &BoxedValue::new(other))?
            .try_downcast::<OUT>()
    }
}

impl fmt::Debug for PartialJoinOperatorSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialJoinOperatorSpec")
            .field("output", &self.output)
            .field("side", &self.side)
            .field("peer", &self.peer)
            .field("input_type", &self.input_type)
            .field("other_type", &self.other_type)
            .field("output_type", &self.output_type)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "tests/spec_tests.rs"]
mod tests;
