//! Error types for graph construction.
//!
//! Every builder operation either registers its specs and returns, or fails
//! with one of these errors and leaves the graph untouched.

use thiserror::Error;

use crate::types::StreamId;

/// Errors raised while building or snapshotting a stream graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Malformed construction request: foreign or unknown handles, empty or
    /// repeated operands, invalid window sizes.
    #[error("invalid graph: {reason}")]
    InvalidGraph { reason: String },

    /// The stream was snapshot by the scheduler and accepts no more operators.
    #[error("{stream} is frozen, no further operators can be registered")]
    GraphFrozen { stream: StreamId },

    /// A type-erased element did not have the type the spec was built for.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

impl GraphError {
    /// Shorthand for [`GraphError::InvalidGraph`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidGraph {
            reason: reason.into(),
        }
    }

    pub(crate) fn type_mismatch<T: 'static>(actual: &'static str) -> Self {
        Self::TypeMismatch {
            expected: std::any::type_name::<T>(),
            actual,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GraphError>;
