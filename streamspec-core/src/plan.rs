//! Serializable snapshot of a stream graph for a scheduler.
//!
//! A plan carries kinds, ids and type names only; user functions stay on the
//! in-memory [`OperatorSpec`]s.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::graph::{StreamGraph, StreamOrigin};
use crate::spec::{JoinSide, OperatorSpec, SpecKind};
use crate::types::StreamId;
use crate::window::WindowAssignment;

/// A stream node reachable from the plan roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamPlan {
    pub id: StreamId,
    pub element_type: String,
    pub origin: StreamOrigin,
}

/// One registered spec, as an edge from `source` to `output`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorPlan {
    pub source: StreamId,
    pub kind: SpecKind,
    pub output: Option<StreamId>,
    pub input_type: String,
    pub output_type: Option<String>,
    pub join_side: Option<JoinSide>,
    pub join_peer: Option<StreamId>,
    pub window: Option<WindowAssignment>,
}

impl OperatorPlan {
    fn describe(source: StreamId, spec: &OperatorSpec) -> Self {
        let join = spec.as_partial_join();
        Self {
            source,
            kind: spec.kind(),
            output: spec.output_stream(),
            input_type: spec.input_type().to_string(),
            output_type: spec.output_type().map(str::to_string),
            join_side: join.map(|partial| partial.side()),
            join_peer: join.map(|partial| partial.peer()),
            window: spec.as_window().map(|window| window.assignment()),
        }
    }
}

/// Serializable snapshot of the streams reachable from a set of roots.
///
/// `streams` are in topological order; `operators` follow their source
/// stream, in registration order within one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphPlan {
    pub job_name: String,
    pub roots: Vec<StreamId>,
    pub streams: Vec<StreamPlan>,
    pub operators: Vec<OperatorPlan>,
}

impl GraphPlan {
    /// Describe everything reachable from `roots`. Does not freeze.
    pub fn from_graph(
        graph: &StreamGraph,
        job_name: impl Into<String>,
        roots: &[StreamId],
    ) -> crate::Result<Self> {
        let mut streams = Vec::new();
        let mut operators = Vec::new();
        for id in graph.topological_order(roots)? {
            let Some(node) = graph.node(id) else {
                continue;
            };
            streams.push(StreamPlan {
                id,
                element_type: node.element_type.to_string(),
                origin: node.origin.clone(),
            });
            operators.extend(
                node.specs()
                    .iter()
                    .map(|spec| OperatorPlan::describe(id, spec)),
            );
        }
        Ok(Self {
            job_name: job_name.into(),
            roots: roots.to_vec(),
            streams,
            operators,
        })
    }

    /// Specs registered on `source`.
    pub fn operators_of(&self, source: StreamId) -> impl Iterator<Item = &OperatorPlan> {
        self.operators.iter().filter(move |op| op.source == source)
    }

    /// Position of `id` in the topological order, if it is part of the plan.
    pub fn position(&self, id: StreamId) -> Option<usize> {
        self.streams.iter().position(|stream| stream.id == id)
    }

    /// Encode the plan with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a plan produced by [`to_bytes`](Self::to_bytes).
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(data)?)
    }
}

#[cfg(test)]
#[path = "tests/plan_tests.rs"]
mod tests;
