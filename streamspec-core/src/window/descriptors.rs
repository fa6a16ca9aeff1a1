use super::*;

// ── WindowDescriptor ──────────────────────────────────────────────────────────

/// User-facing window description.
///
/// The builder calls [`internal_window_fn`](Self::internal_window_fn) exactly
/// once when the window operator is registered and never retains the descriptor.
pub trait WindowDescriptor<M> {
    /// Group key of the windowed output.
    type Key: StreamData;
    /// Aggregate of the windowed output.
    type Value: StreamData;

    /// Resolve the internal window function evaluated by the runtime.
    fn internal_window_fn(&self) -> WindowFn<M, Self::Key, Self::Value>;
}

fn positive_millis(what: &str, duration: Duration) -> Result<i64> {
    match i64::try_from(duration.as_millis()) {
        Ok(ms) if ms > 0 => Ok(ms),
        _ => Err(GraphError::invalid(format!(
            "{what} must be between 1ms and i64::MAX ms, got {duration:?}"
        ))),
    }
}

fn count_one<M>(_message: &M, count: Option<u64>) -> u64 {
    count.unwrap_or(0).saturating_add(1)
}

// ── Session ───────────────────────────────────────────────────────────────────

/// Gap-based per-key windows: a session closes once no element for its key
/// arrives within `gap`.
pub struct SessionWindow<M, K, V> {
    gap: Duration,
    window_fn: WindowFn<M, K, V>,
}

impl<M, K, V> SessionWindow<M, K, V>
where
    M: 'static,
    K: StreamData,
    V: StreamData,
{
    /// Sessions keyed by `key_fn`, folding elements with `aggregate_fn`.
    pub fn new<KF, AF>(gap: Duration, key_fn: KF, aggregate_fn: AF) -> Result<Self>
    where
        KF: Fn(&M) -> K + Send + Sync + 'static,
        AF: Fn(&M, Option<V>) -> V + Send + Sync + 'static,
    {
        let gap_ms = positive_millis("session gap", gap)?;
        Ok(Self {
            gap,
            window_fn: WindowFn::new(WindowAssignment::Session { gap_ms }, key_fn, aggregate_fn),
        })
    }

    /// Inactivity gap that closes a session.
    pub fn gap(&self) -> Duration {
        self.gap
    }
}

impl<M, K> SessionWindow<M, K, u64>
where
    M: 'static,
    K: StreamData,
{
    /// Sessions keyed by `key_fn` whose aggregate is the element count.
    pub fn counter<KF>(gap: Duration, key_fn: KF) -> Result<Self>
    where
        KF: Fn(&M) -> K + Send + Sync + 'static,
    {
        Self::new(gap, key_fn, count_one::<M>)
    }
}

impl<M> SessionWindow<M, M::Key, u64>
where
    M: MessageEnvelope + 'static,
    M::Key: StreamData,
{
    /// Count elements per envelope key.
    pub fn count_by_key(gap: Duration) -> Result<Self> {
        Self::counter(gap, |message: &M| message.key().clone())
    }
}

impl<M, K, V> WindowDescriptor<M> for SessionWindow<M, K, V>
where
    K: StreamData,
    V: StreamData,
{
    type Key = K;
    type Value = V;

    fn internal_window_fn(&self) -> WindowFn<M, K, V> {
        self.window_fn.clone()
    }
}

impl<M, K, V> std::fmt::Debug for SessionWindow<M, K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionWindow")
            .field("gap", &self.gap)
            .field("window_fn", &self.window_fn)
            .finish()
    }
}

// ── Tumbling ──────────────────────────────────────────────────────────────────

/// Fixed-size, non-overlapping windows aligned to multiples of `size`.
pub struct TumblingWindow<M, K, V> {
    size: Duration,
    window_fn: WindowFn<M, K, V>,
}

impl<M, K, V> TumblingWindow<M, K, V>
where
    M: 'static,
    K: StreamData,
    V: StreamData,
{
    /// Windows of `size` keyed by `key_fn`, folding elements with `aggregate_fn`.
    pub fn of<KF, AF>(size: Duration, key_fn: KF, aggregate_fn: AF) -> Result<Self>
    where
        KF: Fn(&M) -> K + Send + Sync + 'static,
        AF: Fn(&M, Option<V>) -> V + Send + Sync + 'static,
    {
        let size_ms = positive_millis("tumbling window size", size)?;
        Ok(Self {
            size,
            window_fn: WindowFn::new(WindowAssignment::Tumbling { size_ms }, key_fn, aggregate_fn),
        })
    }

    /// Length of every window.
    pub fn size(&self) -> Duration {
        self.size
    }
}

impl<M, K> TumblingWindow<M, K, u64>
where
    M: 'static,
    K: StreamData,
{
    /// Windows keyed by `key_fn` whose aggregate is the element count.
    pub fn counter<KF>(size: Duration, key_fn: KF) -> Result<Self>
    where
        KF: Fn(&M) -> K + Send + Sync + 'static,
    {
        Self::of(size, key_fn, count_one::<M>)
    }
}

impl<M, K, V> WindowDescriptor<M> for TumblingWindow<M, K, V>
where
    K: StreamData,
    V: StreamData,
{
    type Key = K;
    type Value = V;

    fn internal_window_fn(&self) -> WindowFn<M, K, V> {
        self.window_fn.clone()
    }
}

impl<M, K, V> std::fmt::Debug for TumblingWindow<M, K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TumblingWindow")
            .field("size", &self.size)
            .field("window_fn", &self.window_fn)
            .finish()
    }
}

// ── Global ────────────────────────────────────────────────────────────────────

/// A single window per key that spans all time. Only useful with a runtime
/// trigger that fires it.
pub struct GlobalWindow<M, K, V> {
    window_fn: WindowFn<M, K, V>,
}

impl<M, K, V> GlobalWindow<M, K, V>
where
    M: 'static,
    K: StreamData,
    V: StreamData,
{
    /// One window per `key_fn` key, folding elements with `aggregate_fn`.
    pub fn new<KF, AF>(key_fn: KF, aggregate_fn: AF) -> Self
    where
        KF: Fn(&M) -> K + Send + Sync + 'static,
        AF: Fn(&M, Option<V>) -> V + Send + Sync + 'static,
    {
        Self {
            window_fn: WindowFn::new(WindowAssignment::Global, key_fn, aggregate_fn),
        }
    }
}

impl<M, K, V> WindowDescriptor<M> for GlobalWindow<M, K, V>
where
    K: StreamData,
    V: StreamData,
{
    type Key = K;
    type Value = V;

    fn internal_window_fn(&self) -> WindowFn<M, K, V> {
        self.window_fn.clone()
    }
}

impl<M, K, V> std::fmt::Debug for GlobalWindow<M, K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalWindow")
            .field("window_fn", &self.window_fn)
            .finish()
    }
}
