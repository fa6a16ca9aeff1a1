use std::any::type_name;
use std::cell::RefCell;
use std::rc::Rc;

use streamspec_core::config::GraphConfig;
use streamspec_core::graph::{StreamGraph, StreamOrigin};
use streamspec_core::plan::GraphPlan;
use streamspec_core::spec::OperatorSpec;
use streamspec_core::types::{StreamData, StreamId, SystemStream};
use streamspec_core::Result;

use crate::message_stream::MessageStream;

/// Shared mutable state for building the stream graph.
pub(crate) struct EnvInner {
    pub graph: StreamGraph,
    pub config: GraphConfig,
}

/// The entry point for composing a dataflow graph.
///
/// Declare inputs with [`input_stream`](Self::input_stream) or
/// [`new_stream`](Self::new_stream), chain operators on the returned
/// [`MessageStream`]s, then hand the graph to a scheduler with
/// [`plan`](Self::plan) or [`walk`](Self::walk).
pub struct StreamEnvironment {
    pub(crate) inner: Rc<RefCell<EnvInner>>,
}

impl StreamEnvironment {
    /// Create an environment for a job with the given name and default config.
    pub fn new(job_name: &str) -> Self {
        Self::with_config(GraphConfig::new(job_name))
    }

    /// Create an empty environment driven by `config`.
    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(EnvInner {
                graph: StreamGraph::new(),
                config,
            })),
        }
    }

    /// A copy of the environment's configuration.
    pub fn config(&self) -> GraphConfig {
        self.inner.borrow().config.clone()
    }

    /// Declare an input stream fed by `system_stream`.
    pub fn input_stream<M: StreamData>(&self, system_stream: SystemStream) -> MessageStream<M> {
        tracing::debug!(
            input = %system_stream,
            element = type_name::<M>(),
            "declared input stream"
        );
        self.declare(StreamOrigin::Input(system_stream))
    }

    /// Declare an input stream with no physical binding.
    pub fn new_stream<M: StreamData>(&self) -> MessageStream<M> {
        self.declare(StreamOrigin::Anonymous)
    }

    fn declare<M: StreamData>(&self, origin: StreamOrigin) -> MessageStream<M> {
        let id = self
            .inner
            .borrow_mut()
            .graph
            .add_stream(type_name::<M>(), origin);
        MessageStream::new(Rc::clone(&self.inner), id)
    }

    /// Declared inputs in creation order.
    pub fn sources(&self) -> Vec<StreamId> {
        self.inner.borrow().graph.sources()
    }

    /// Number of streams in the graph, declared and derived.
    pub fn stream_count(&self) -> usize {
        self.inner.borrow().graph.len()
    }

    /// Topological order of the streams reachable from `roots`. Does not freeze.
    pub fn topological_order(&self, roots: &[StreamId]) -> Result<Vec<StreamId>> {
        self.inner.borrow().graph.topological_order(roots)
    }

    /// Snapshot everything reachable from the declared inputs.
    pub fn plan(&self) -> Result<GraphPlan> {
        let roots = self.sources();
        self.plan_from(&roots)
    }

    /// Snapshot everything reachable from `roots`.
    ///
    /// With [`GraphConfig::freeze_on_plan`] set, every stream in the plan is
    /// frozen afterwards.
    pub fn plan_from(&self, roots: &[StreamId]) -> Result<GraphPlan> {
        let mut inner = self.inner.borrow_mut();
        let plan = GraphPlan::from_graph(&inner.graph, inner.config.job_name.clone(), roots)?;
        if inner.config.freeze_on_plan {
            inner.graph.freeze_reachable(roots)?;
        }
        tracing::debug!(
            job = %plan.job_name,
            streams = plan.streams.len(),
            operators = plan.operators.len(),
            "graph planned"
        );
        Ok(plan)
    }

    /// [`plan`](Self::plan) encoded for shipping to a scheduler.
    pub fn plan_bytes(&self) -> anyhow::Result<Vec<u8>> {
        self.plan()?.to_bytes()
    }

    /// Visit every `(input, spec)` pair reachable from `roots` in topological
    /// order, freezing the visited streams first when configured to.
    ///
    /// The specs are cloned out before visiting, so `visit` may use the
    /// environment freely.
    pub fn walk<F>(&self, roots: &[StreamId], mut visit: F) -> Result<()>
    where
        F: FnMut(StreamId, &OperatorSpec),
    {
        let edges = {
            let mut inner = self.inner.borrow_mut();
            if inner.config.freeze_on_plan {
                inner.graph.freeze_reachable(roots)?;
            }
            let mut edges: Vec<(StreamId, OperatorSpec)> = Vec::new();
            inner
                .graph
                .walk(roots, |input, spec| edges.push((input, spec.clone())))?;
            edges
        };
        for (input, spec) in &edges {
            visit(*input, spec);
        }
        Ok(())
    }

    /// Freeze every stream. No operator can be registered afterwards.
    pub fn freeze(&self) {
        self.inner.borrow_mut().graph.freeze_all();
    }
}

impl Default for StreamEnvironment {
    fn default() -> Self {
        Self::with_config(GraphConfig::default())
    }
}
