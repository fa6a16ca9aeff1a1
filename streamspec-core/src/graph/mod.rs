//! The stream graph arena.
//!
//! Every `MessageStream` handle of the API crate is an index into a
//! [`StreamGraph`]. A node owns the operator specs registered on it; a spec
//! names its downstream node by [`StreamId`], so fan-in (join, merge) is
//! expressed by several specs storing the same id.
//!
//! Ids are handed out in creation order and every spec's output is allocated
//! after its input, so edges always point from a lower id to a higher one and
//! the graph cannot contain a cycle.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::spec::OperatorSpec;
use crate::types::{StreamId, SystemStream};

/// Where a stream's elements come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamOrigin {
    /// Declared input bound to a physical system stream.
    Input(SystemStream),
    /// Declared input without a physical binding.
    Anonymous,
    /// Output of one or more registered operators.
    Derived,
}

impl StreamOrigin {
    /// Declared inputs are the roots the scheduler starts from.
    pub fn is_source(&self) -> bool {
        !matches!(self, StreamOrigin::Derived)
    }
}

/// Whether a stream still accepts operator registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Open,
    /// Snapshot by the scheduler. One-way.
    Frozen,
}

/// A node in the stream graph.
#[derive(Debug)]
pub struct StreamNode {
    pub id: StreamId,
    pub element_type: &'static str,
    pub origin: StreamOrigin,
    specs: Vec<OperatorSpec>,
    state: RegistrationState,
}

impl StreamNode {
    /// Outgoing specs in registration order.
    pub fn specs(&self) -> &[OperatorSpec] {
        &self.specs
    }

    /// Current registration state.
    pub fn state(&self) -> RegistrationState {
        self.state
    }

    /// True once the scheduler has snapshot this stream.
    pub fn is_frozen(&self) -> bool {
        self.state == RegistrationState::Frozen
    }
}

/// Arena of stream nodes.
#[derive(Debug, Default)]
pub struct StreamGraph {
    nodes: Vec<StreamNode>,
}

impl StreamGraph {
    /// Create an empty stream graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stream node and return its assigned ID.
    pub fn add_stream(&mut self, element_type: &'static str, origin: StreamOrigin) -> StreamId {
        let id = StreamId(self.nodes.len());
        self.nodes.push(StreamNode {
            id,
            element_type,
            origin,
            specs: Vec::new(),
            state: RegistrationState::Open,
        });
        id
    }

    /// Number of streams, declared and derived.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no stream has been added yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node stored under `id`, if it belongs to this graph.
    pub fn node(&self, id: StreamId) -> Option<&StreamNode> {
        self.nodes.get(id.index())
    }

    fn existing(&self, id: StreamId) -> Result<&StreamNode> {
        self.node(id)
            .ok_or_else(|| GraphError::invalid(format!("{id} is not part of this graph")))
    }

    /// All declared inputs, in creation order.
    pub fn sources(&self) -> Vec<StreamId> {
        self.nodes
            .iter()
            .filter(|node| node.origin.is_source())
            .map(|node| node.id)
            .collect()
    }

    /// Outgoing specs of `id` in registration order.
    pub fn specs(&self, id: StreamId) -> Result<&[OperatorSpec]> {
        Ok(self.existing(id)?.specs())
    }

    /// Unknown ids report `false`.
    pub fn is_frozen(&self, id: StreamId) -> bool {
        self.node(id).is_some_and(StreamNode::is_frozen)
    }

    /// Check that every input exists and is still open.
    ///
    /// An input may appear more than once: a self-join registers both of its
    /// partials on the same stream.
    pub fn check_open(&self, inputs: &[StreamId]) -> Result<()> {
        let mut seen = HashSet::with_capacity(inputs.len());
        for &id in inputs {
            if !seen.insert(id) {
                continue;
            }
            if self.existing(id)?.is_frozen() {
                return Err(GraphError::GraphFrozen { stream: id });
            }
        }
        Ok(())
    }

    /// Append each spec to its input stream.
    ///
    /// All-or-nothing: the batch is validated first and nothing is appended
    /// if any input is unknown or frozen, or any output is unknown. Specs
    /// sharing an input are appended in batch order.
    pub fn register(&mut self, registrations: Vec<(StreamId, OperatorSpec)>) -> Result<()> {
        let inputs: Vec<StreamId> = registrations.iter().map(|(input, _)| *input).collect();
        self.check_open(&inputs)?;
        for (_, spec) in &registrations {
            if let Some(output) = spec.output_stream() {
                self.existing(output)?;
            }
        }

        for (input, spec) in registrations {
            tracing::trace!(
                input = %input,
                output = ?spec.output_stream(),
                kind = ?spec.kind(),
                "registered operator spec"
            );
            self.nodes[input.index()].specs.push(spec);
        }
        Ok(())
    }

    /// Move `id` to [`RegistrationState::Frozen`]. Freezing twice is a no-op.
    pub fn freeze(&mut self, id: StreamId) -> Result<()> {
        self.existing(id)?;
        let node = &mut self.nodes[id.index()];
        if node.state == RegistrationState::Open {
            node.state = RegistrationState::Frozen;
            tracing::debug!(stream = %id, specs = node.specs.len(), "stream frozen");
        }
        Ok(())
    }

    /// Freeze every stream reachable from `roots` and return them.
    pub fn freeze_reachable(&mut self, roots: &[StreamId]) -> Result<Vec<StreamId>> {
        let reachable = self.reachable(roots)?;
        for &id in &reachable {
            self.freeze(id)?;
        }
        Ok(reachable)
    }

    /// Freeze the whole arena.
    pub fn freeze_all(&mut self) {
        for node in &mut self.nodes {
            node.state = RegistrationState::Frozen;
        }
        tracing::debug!(streams = self.nodes.len(), "graph frozen");
    }

    /// Distinct downstream stream IDs of `id`, in registration order.
    pub fn downstream(&self, id: StreamId) -> Vec<StreamId> {
        let mut out: Vec<StreamId> = Vec::new();
        if let Some(node) = self.node(id) {
            for target in node.specs.iter().filter_map(OperatorSpec::output_stream) {
                if !out.contains(&target) {
                    out.push(target);
                }
            }
        }
        out
    }

    /// Stream IDs with at least one spec feeding `id`.
    pub fn upstream(&self, id: StreamId) -> Vec<StreamId> {
        self.nodes
            .iter()
            .filter(|node| node.specs.iter().any(|spec| spec.output_stream() == Some(id)))
            .map(|node| node.id)
            .collect()
    }

    /// Build adjacency list (downstream map) from the graph.
    pub fn downstream_map(&self) -> HashMap<StreamId, Vec<StreamId>> {
        self.nodes
            .iter()
            .map(|node| (node.id, self.downstream(node.id)))
            .collect()
    }

    /// Every stream reachable from `roots` (roots included), ascending by ID.
    pub fn reachable(&self, roots: &[StreamId]) -> Result<Vec<StreamId>> {
        let mut visited: BTreeSet<StreamId> = BTreeSet::new();
        let mut queue: VecDeque<StreamId> = VecDeque::new();
        for &root in roots {
            self.existing(root)?;
            if visited.insert(root) {
                queue.push_back(root);
            }
        }
        while let Some(id) = queue.pop_front() {
            for next in self.downstream(id) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        Ok(visited.into_iter().collect())
    }

    /// Topological order of the streams reachable from `roots` (Kahn's algorithm).
    ///
    /// Ties are broken by the smallest ID, so the order is deterministic.
    pub fn topological_order(&self, roots: &[StreamId]) -> Result<Vec<StreamId>> {
        let reachable = self.reachable(roots)?;
        let mut in_degree: HashMap<StreamId, usize> =
            reachable.iter().map(|&id| (id, 0)).collect();
        for &id in &reachable {
            for spec in self.nodes[id.index()].specs.iter() {
                if let Some(target) = spec.output_stream() {
                    *in_degree.entry(target).or_insert(0) += 1;
                }
            }
        }

        let mut ready: BTreeSet<StreamId> = in_degree
            .iter()
            .filter(|entry| *entry.1 == 0)
            .map(|entry| *entry.0)
            .collect();

        let mut result = Vec::with_capacity(reachable.len());
        while let Some(id) = ready.pop_first() {
            result.push(id);
            for spec in self.nodes[id.index()].specs.iter() {
                let Some(target) = spec.output_stream() else {
                    continue;
                };
                if let Some(deg) = in_degree.get_mut(&target) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.insert(target);
                    }
                }
            }
        }
        Ok(result)
    }

    /// Visit every `(input, spec)` pair reachable from `roots`, inputs in
    /// topological order and specs in registration order.
    pub fn walk<F>(&self, roots: &[StreamId], mut visit: F) -> Result<()>
    where
        F: FnMut(StreamId, &OperatorSpec),
    {
        for id in self.topological_order(roots)? {
            for spec in self.nodes[id.index()].specs.iter() {
                visit(id, spec);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/graph_tests.rs"]
mod tests;
