use super::*;

// ── WindowAssignment ──────────────────────────────────────────────────────────

/// Shape of the windows a [`WindowFn`] groups elements into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowAssignment {
    /// Per-key sessions closed after `gap_ms` without activity.
    Session { gap_ms: i64 },
    /// Fixed-size, non-overlapping windows aligned to multiples of `size_ms`.
    Tumbling { size_ms: i64 },
    /// A single window spanning all time.
    Global,
}

// ── WindowOutput ──────────────────────────────────────────────────────────────

/// Element type of a windowed stream: the group key and its aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowOutput<K, V> {
    pub key: K,
    pub value: V,
}

impl<K, V> WindowOutput<K, V> {
    /// Pair a group key with its aggregate.
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

// ── WindowFn ──────────────────────────────────────────────────────────────────

/// The internal window function the runtime evaluates.
///
/// Holds the key extractor, the incremental aggregator and the window shape.
/// The aggregator receives the previous aggregate for the `(key, window)` pair,
/// or `None` for the first element.
pub struct WindowFn<M, K, V> {
    key_fn: Arc<dyn Fn(&M) -> K + Send + Sync>,
    aggregate_fn: Arc<dyn Fn(&M, Option<V>) -> V + Send + Sync>,
    assignment: WindowAssignment,
}

impl<M, K, V> WindowFn<M, K, V> {
    /// Bundle a key extractor and an aggregator under `assignment`.
    pub fn new<KF, AF>(assignment: WindowAssignment, key_fn: KF, aggregate_fn: AF) -> Self
    where
        KF: Fn(&M) -> K + Send + Sync + 'static,
        AF: Fn(&M, Option<V>) -> V + Send + Sync + 'static,
    {
        Self {
            key_fn: Arc::new(key_fn),
            aggregate_fn: Arc::new(aggregate_fn),
            assignment,
        }
    }

    /// Window shape the runtime assigns elements to.
    pub fn assignment(&self) -> WindowAssignment {
        self.assignment
    }

    /// Extract the group key of `message`.
    pub fn key_of(&self, message: &M) -> K {
        (self.key_fn)(message)
    }

    /// Fold `message` into the running aggregate.
    pub fn aggregate(&self, message: &M, current: Option<V>) -> V {
        (self.aggregate_fn)(message, current)
    }
}

impl<M, K, V> Clone for WindowFn<M, K, V> {
    fn clone(&self) -> Self {
        Self {
            key_fn: Arc::clone(&self.key_fn),
            aggregate_fn: Arc::clone(&self.aggregate_fn),
            assignment: self.assignment,
        }
    }
}

impl<M, K, V> std::fmt::Debug for WindowFn<M, K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowFn")
            .field("assignment", &self.assignment)
            .finish_non_exhaustive()
    }
}
