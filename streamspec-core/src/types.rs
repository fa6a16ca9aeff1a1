use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// Event time in milliseconds since epoch.
pub type EventTime = i64;

/// Stable index of a stream node inside a [`StreamGraph`](crate::graph::StreamGraph).
///
/// Two specs share an output stream iff they store the same `StreamId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StreamId(pub(crate) usize);

impl StreamId {
    /// Position of the stream in its arena. Ids are handed out in creation order.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream#{}", self.0)
    }
}

/// Trait bound for element types that can flow along a stream.
pub trait StreamData: Send + Clone + 'static {}

// Blanket implementation: any type satisfying the bounds is StreamData.
impl<T> StreamData for T where T: Send + Clone + 'static {}

/// A keyed message as seen by user functions.
///
/// The graph never builds envelopes itself; this trait only names the shape
/// helpers such as [`SessionWindow::count_by_key`](crate::window::SessionWindow::count_by_key)
/// rely on.
pub trait MessageEnvelope {
    type Key;
    type Message;

    fn key(&self) -> &Self::Key;
    fn message(&self) -> &Self::Message;
}

/// A `(system, stream)` pair naming a physical input or output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SystemStream {
    pub system: String,
    pub stream: String,
}

impl SystemStream {
    /// Name a stream of a physical system, e.g. `("kafka", "orders")`.
    pub fn new(system: impl Into<String>, stream: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            stream: stream.into(),
        }
    }
}

impl fmt::Display for SystemStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.system, self.stream)
    }
}

/// A message a sink hands to its [`MessageCollector`](crate::functions::MessageCollector).
#[derive(Debug, Clone)]
pub struct OutgoingEnvelope {
    pub system_stream: SystemStream,
    pub key: Option<String>,
    pub message: BoxedValue,
}

impl OutgoingEnvelope {
    /// Create an unkeyed envelope bound for `system_stream`.
    pub fn new<T: StreamData>(system_stream: SystemStream, message: T) -> Self {
        Self {
            system_stream,
            key: None,
            message: BoxedValue::new(message),
        }
    }

    /// Attach a partitioning key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Borrow the payload as `T`, or `None` on type mismatch.
    pub fn message<T: 'static>(&self) -> Option<&T> {
        self.message.downcast_ref()
    }
}

// --- Type-erased cloneable value for the runtime ---

/// Trait object that supports Any + Clone.
pub trait CloneableAny: Any + Send {
    fn clone_box(&self) -> Box<dyn CloneableAny>;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn type_name(&self) -> &'static str;
}

impl<T: Clone + Send + 'static> CloneableAny for T {
    fn clone_box(&self) -> Box<dyn CloneableAny> {
        Box::new(self.clone())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A cloneable, type-erased value. Specs exchange elements with the runtime as `BoxedValue`s.
pub struct BoxedValue(Box<dyn CloneableAny>);

impl BoxedValue {
    /// Wrap a concrete value into a type-erased box.
    pub fn new<T: StreamData>(val: T) -> Self {
        Self(Box::new(val))
    }

    /// Name of the concrete type held in the box.
    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    /// Return true if the box holds a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    /// Try to get a reference to the inner value as type `T`. Returns `None` on mismatch.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref()
    }

    /// Like [`downcast_ref`](Self::downcast_ref), reporting a [`GraphError::TypeMismatch`].
    pub fn try_downcast_ref<T: 'static>(&self) -> Result<&T> {
        self.0
            .as_any()
            .downcast_ref()
            .ok_or_else(|| GraphError::type_mismatch::<T>(self.type_name()))
    }

    /// Unwrap the inner value as `T`.
    pub fn try_downcast<T: 'static>(self) -> Result<T> {
        let actual = self.type_name();
        self.0
            .into_any()
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| GraphError::type_mismatch::<T>(actual))
    }
}

impl Clone for BoxedValue {
    fn clone(&self) -> Self {
        Self(self.0.clone_box())
    }
}

impl fmt::Debug for BoxedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoxedValue(<{}>)", self.type_name())
    }
}

#[cfg(test)]
#[path = "tests/types_tests.rs"]
mod tests;
