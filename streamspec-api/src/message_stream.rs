use std::any::type_name;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use streamspec_core::functions::{MessageCollector, TaskCoordinator};
use streamspec_core::graph::StreamOrigin;
use streamspec_core::spec::{
    OperatorSpec, PartialJoinOperatorSpec, SinkOperatorSpec, StreamOperatorSpec,
    WindowOperatorSpec,
};
use streamspec_core::types::{StreamData, StreamId};
use streamspec_core::window::{WindowDescriptor, WindowOutput};
use streamspec_core::{GraphError, Result};

use crate::environment::EnvInner;

/// A handle on one stream of the graph, carrying elements of type `M`.
///
/// Every operator registers one spec on this stream (two for `join`, one per
/// input for `merge`) and returns a handle on a freshly allocated output.
/// Cloning a handle does not copy the stream: clones address the same node.
///
/// All operations are atomic. On error nothing is registered and no output
/// stream is allocated.
pub struct MessageStream<M> {
    pub(crate) env: Rc<RefCell<EnvInner>>,
    pub(crate) id: StreamId,
    pub(crate) _phantom: PhantomData<M>,
}

impl<M> MessageStream<M> {
    pub(crate) fn new(env: Rc<RefCell<EnvInner>>, id: StreamId) -> Self {
        Self {
            env,
            id,
            _phantom: PhantomData,
        }
    }

    /// Arena id of the stream this handle addresses.
    pub fn id(&self) -> StreamId {
        self.id
    }

    fn check_same_env<T>(&self, other: &MessageStream<T>) -> Result<()> {
        if Rc::ptr_eq(&self.env, &other.env) {
            Ok(())
        } else {
            Err(GraphError::invalid(format!(
                "{} belongs to a different stream environment",
                other.id
            )))
        }
    }

    /// Allocate an output stream and register the specs `build` produces for it.
    fn derive<OUT, B>(&self, inputs: &[StreamId], build: B) -> Result<MessageStream<OUT>>
    where
        OUT: StreamData,
        B: FnOnce(StreamId) -> Vec<(StreamId, OperatorSpec)>,
    {
        let mut inner = self.env.borrow_mut();
        inner.graph.check_open(inputs)?;
        let output = inner
            .graph
            .add_stream(type_name::<OUT>(), StreamOrigin::Derived);
        inner.graph.register(build(output))?;
        Ok(MessageStream::new(Rc::clone(&self.env), output))
    }
}

impl<M: StreamData> MessageStream<M> {
    /// Apply `f` to every element.
    pub fn map<OUT, F>(&self, f: F) -> Result<MessageStream<OUT>>
    where
        OUT: StreamData,
        F: Fn(M) -> OUT + Send + Sync + 'static,
    {
        self.derive(&[self.id], |output| {
            vec![(self.id, StreamOperatorSpec::map::<M, OUT, F>(output, f).into())]
        })
    }

    /// Replace every element with zero or more elements, in the order `f` yields them.
    pub fn flat_map<OUT, I, F>(&self, f: F) -> Result<MessageStream<OUT>>
    where
        OUT: StreamData,
        I: IntoIterator<Item = OUT>,
        F: Fn(M) -> I + Send + Sync + 'static,
    {
        self.derive(&[self.id], |output| {
            vec![(self.id, StreamOperatorSpec::flat_map::<M, OUT, F>(output, f).into())]
        })
    }

    /// Keep the elements `predicate` accepts.
    pub fn filter<F>(&self, predicate: F) -> Result<MessageStream<M>>
    where
        F: Fn(&M) -> bool + Send + Sync + 'static,
    {
        self.derive(&[self.id], |output| {
            vec![(self.id, StreamOperatorSpec::filter::<M, F>(output, predicate).into())]
        })
    }

    /// Terminate the stream in `sink`.
    pub fn sink<F>(&self, sink: F) -> Result<()>
    where
        F: Fn(M, &mut dyn MessageCollector, &mut dyn TaskCoordinator) + Send + Sync + 'static,
    {
        self.env
            .borrow_mut()
            .graph
            .register(vec![(self.id, SinkOperatorSpec::new::<M, F>(sink).into())])
    }

    /// Group the stream into windows described by `descriptor`.
    ///
    /// The descriptor is asked for its window function once, here, and
    /// dropped on return.
    pub fn window<W>(
        &self,
        descriptor: W,
    ) -> Result<MessageStream<WindowOutput<W::Key, W::Value>>>
    where
        W: WindowDescriptor<M>,
    {
        let window_fn = descriptor.internal_window_fn();
        drop(descriptor);
        self.derive(&[self.id], |output| {
            vec![(self.id, WindowOperatorSpec::new(output, window_fn).into())]
        })
    }

    /// Join this stream with `other`.
    ///
    /// Registers one partial on each input, both feeding the returned stream.
    /// `joiner` always receives this stream's element first. Joining a stream
    /// with itself is allowed: both partials land on that stream, left first.
    pub fn join<R, OUT, J>(
        &self,
        other: &MessageStream<R>,
        joiner: J,
    ) -> Result<MessageStream<OUT>>
    where
        R: StreamData,
        OUT: StreamData,
        J: Fn(&M, &R) -> OUT + Send + Sync + 'static,
    {
        self.check_same_env(other)?;
        self.derive(&[self.id, other.id], |output| {
            let (left, right) =
                PartialJoinOperatorSpec::pair::<M, R, OUT, J>(self.id, other.id, output, joiner);
            vec![(self.id, left.into()), (other.id, right.into())]
        })
    }

    /// Merge this stream with `others` into one stream.
    ///
    /// Each input, this one included, gets one identity spec feeding the
    /// returned stream. `others` must be non-empty and no stream may be
    /// listed twice.
    pub fn merge<'a, I>(&self, others: I) -> Result<MessageStream<M>>
    where
        I: IntoIterator<Item = &'a MessageStream<M>>,
    {
        let mut inputs = vec![self.id];
        let mut seen = HashSet::from([self.id]);
        for other in others {
            self.check_same_env(other)?;
            if !seen.insert(other.id) {
                return Err(GraphError::invalid(format!(
                    "{} is listed more than once as a merge input",
                    other.id
                )));
            }
            inputs.push(other.id);
        }
        if inputs.len() == 1 {
            return Err(GraphError::invalid("merge needs at least one other stream"));
        }

        self.derive(&inputs, |output| {
            inputs
                .iter()
                .map(|&input| (input, StreamOperatorSpec::identity::<M>(output).into()))
                .collect()
        })
    }

    /// Specs registered on this stream, in registration order.
    ///
    /// Inspection does not freeze the stream.
    pub fn registered_operator_specs(&self) -> Vec<OperatorSpec> {
        self.env
            .borrow()
            .graph
            .specs(self.id)
            .map(<[OperatorSpec]>::to_vec)
            .unwrap_or_default()
    }

    /// True once a scheduler has snapshot this stream.
    pub fn is_frozen(&self) -> bool {
        self.env.borrow().graph.is_frozen(self.id)
    }
}

impl<M> Clone for MessageStream<M> {
    fn clone(&self) -> Self {
        Self::new(Rc::clone(&self.env), self.id)
    }
}

impl<M> fmt::Debug for MessageStream<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageStream")
            .field("id", &self.id)
            .field("element_type", &type_name::<M>())
            .finish()
    }
}
