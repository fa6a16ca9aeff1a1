mod common;

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use common::TestEnvelope;
use streamspec_api::environment::StreamEnvironment;
use streamspec_core::config::GraphConfig;
use streamspec_core::plan::GraphPlan;
use streamspec_core::spec::{JoinSide, SpecKind};
use streamspec_core::types::SystemStream;
use streamspec_core::window::{
    SessionWindow, WindowAssignment, WindowDescriptor, WindowFn, WindowOutput,
};
use streamspec_core::GraphError;

struct CountingDescriptor {
    calls: Rc<Cell<usize>>,
}

impl WindowDescriptor<TestEnvelope> for CountingDescriptor {
    type Key = String;
    type Value = usize;

    fn internal_window_fn(&self) -> WindowFn<TestEnvelope, String, usize> {
        self.calls.set(self.calls.get() + 1);
        WindowFn::new(
            WindowAssignment::Global,
            |m: &TestEnvelope| m.key.clone(),
            |m: &TestEnvelope, total: Option<usize>| total.unwrap_or(0) + m.message.value.len(),
        )
    }
}

#[test]
fn test_window_resolves_descriptor_once() {
    let env = StreamEnvironment::new("window");
    let input = env.new_stream::<TestEnvelope>();
    let calls = Rc::new(Cell::new(0));
    let windowed = input
        .window(CountingDescriptor {
            calls: Rc::clone(&calls),
        })
        .unwrap();
    assert_eq!(calls.get(), 1);

    let specs = input.registered_operator_specs();
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].kind(), SpecKind::Window);
    assert_eq!(specs[0].output_stream(), Some(windowed.id()));

    let spec = specs[0].as_window().unwrap();
    assert_eq!(spec.assignment(), WindowAssignment::Global);
    let wf = spec.window_fn::<TestEnvelope, String, usize>().unwrap();
    assert_eq!(wf.aggregate(&TestEnvelope::new("k", "abc", 0), Some(2)), 5);
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_session_window_downstream_of_window() {
    let env = StreamEnvironment::new("session");
    let clicks = env.input_stream::<TestEnvelope>(SystemStream::new("kafka", "clicks"));
    let sessions =
        SessionWindow::<TestEnvelope, String, u64>::count_by_key(Duration::from_secs(60)).unwrap();
    let per_user = clicks.window(sessions).unwrap();
    let busy = per_user
        .filter(|out: &WindowOutput<String, u64>| out.value > 3)
        .unwrap();

    let plan = env.plan().unwrap();
    let window = plan.operators_of(clicks.id()).next().unwrap();
    assert_eq!(window.window, Some(WindowAssignment::Session { gap_ms: 60_000 }));
    assert_eq!(plan.operators_of(per_user.id()).next().unwrap().output, Some(busy.id()));
}

#[test]
fn test_plan_freezes_reachable_streams() {
    let env = StreamEnvironment::new("freeze");
    let input = env.input_stream::<u64>(SystemStream::new("kafka", "numbers"));
    let doubled = input.map(|n: u64| n * 2).unwrap();

    assert!(!input.is_frozen());
    input.registered_operator_specs();
    assert!(!input.is_frozen());

    let plan = env.plan().unwrap();
    assert_eq!(plan.streams.len(), 2);
    assert!(input.is_frozen());
    assert!(doubled.is_frozen());

    let before = env.stream_count();
    let err = doubled.map(|n: u64| n + 1).unwrap_err();
    assert_eq!(err, GraphError::GraphFrozen { stream: doubled.id() });
    assert!(doubled.registered_operator_specs().is_empty());
    assert_eq!(env.stream_count(), before);

    let err = input.sink(|_n, _collector, _coordinator| {}).unwrap_err();
    assert!(matches!(err, GraphError::GraphFrozen { .. }));
    assert_eq!(input.registered_operator_specs().len(), 1);
}

#[test]
fn test_plan_bytes_decode_to_same_plan() {
    let env = StreamEnvironment::with_config(GraphConfig::new("bytes").with_freeze_on_plan(false));
    let input = env.input_stream::<u64>(SystemStream::new("kafka", "numbers"));
    input.map(|n: u64| n.to_string()).unwrap();

    let bytes = env.plan_bytes().unwrap();
    let decoded = GraphPlan::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, env.plan().unwrap());
    assert_eq!(decoded.job_name, "bytes");
}

#[test]
fn test_plan_without_freezing() {
    let env = StreamEnvironment::with_config(GraphConfig::new("open").with_freeze_on_plan(false));
    let input = env.new_stream::<u64>();
    input.map(|n: u64| n + 1).unwrap();

    env.plan().unwrap();
    assert!(!input.is_frozen());
    assert!(input.filter(|n: &u64| *n > 0).is_ok());
    assert_eq!(env.config().job_name, "open");
}

#[test]
fn test_plan_from_leaves_other_roots_open() {
    let env = StreamEnvironment::new("partial");
    let a = env.new_stream::<u64>();
    let b = env.new_stream::<u64>();

    let plan = env.plan_from(&[a.id()]).unwrap();
    assert_eq!(plan.roots, vec![a.id()]);
    assert!(a.is_frozen());
    assert!(!b.is_frozen());
    assert!(b.map(|n: u64| n).is_ok());
}

#[test]
fn test_failed_join_mutates_nothing() {
    let env = StreamEnvironment::new("join-atomic");
    let left = env.new_stream::<u64>();
    let right = env.new_stream::<u64>();
    env.plan_from(&[right.id()]).unwrap();

    let before = env.stream_count();
    let err = left.join(&right, |a: &u64, b: &u64| a + b).unwrap_err();
    assert_eq!(err, GraphError::GraphFrozen { stream: right.id() });
    assert!(left.registered_operator_specs().is_empty());
    assert!(right.registered_operator_specs().is_empty());
    assert_eq!(env.stream_count(), before);
}

#[test]
fn test_join_rejects_foreign_streams() {
    let env = StreamEnvironment::new("join-invalid");
    let s = env.new_stream::<u64>();

    let other_env = StreamEnvironment::new("elsewhere");
    let foreign = other_env.new_stream::<u64>();
    let err = s.join(&foreign, |a: &u64, b: &u64| a + b).unwrap_err();
    assert!(matches!(err, GraphError::InvalidGraph { .. }));

    assert!(s.registered_operator_specs().is_empty());
    assert!(foreign.registered_operator_specs().is_empty());
    assert_eq!(env.stream_count(), 1);
    assert_eq!(other_env.stream_count(), 1);
}

#[test]
fn test_self_join_registers_both_partials() {
    let env = StreamEnvironment::new("self-join");
    let s = env.new_stream::<u64>();
    let joined = s.join(&s, |a: &u64, b: &u64| a * 10 + b).unwrap();

    let specs = s.registered_operator_specs();
    assert_eq!(specs.len(), 2);
    assert!(specs.iter().all(|spec| spec.kind() == SpecKind::PartialJoin));
    assert_eq!(specs[0].output_stream(), Some(joined.id()));
    assert_eq!(specs[0].output_stream(), specs[1].output_stream());

    let left = specs[0].as_partial_join().unwrap();
    let right = specs[1].as_partial_join().unwrap();
    assert_eq!((left.side(), right.side()), (JoinSide::Left, JoinSide::Right));
    assert_eq!((left.peer(), right.peer()), (s.id(), s.id()));

    let from_left: u64 = left.apply(1u64, 2u64).unwrap();
    let from_right: u64 = right.apply(2u64, 1u64).unwrap();
    assert_eq!((from_left, from_right), (12, 12));
    assert_eq!(env.stream_count(), 2);

    let plan = env.plan().unwrap();
    assert_eq!(plan.operators_of(s.id()).count(), 2);
    assert!(plan.position(s.id()).unwrap() < plan.position(joined.id()).unwrap());
}

#[test]
fn test_window_and_merge_on_frozen_stream() {
    let env = StreamEnvironment::new("frozen-ops");
    let a = env.new_stream::<u64>();
    let b = env.new_stream::<u64>();
    env.plan_from(&[a.id()]).unwrap();
    let before = env.stream_count();

    let session = SessionWindow::<u64, u64, u64>::counter(Duration::from_secs(1), |n: &u64| *n)
        .unwrap();
    let err = a.window(session).unwrap_err();
    assert_eq!(err, GraphError::GraphFrozen { stream: a.id() });

    let err = b.merge([&a]).unwrap_err();
    assert_eq!(err, GraphError::GraphFrozen { stream: a.id() });
    let err = a.merge([&b]).unwrap_err();
    assert_eq!(err, GraphError::GraphFrozen { stream: a.id() });

    assert!(a.registered_operator_specs().is_empty());
    assert!(b.registered_operator_specs().is_empty());
    assert_eq!(env.stream_count(), before);
}

#[test]
fn test_merge_rejects_bad_operands() {
    let env = StreamEnvironment::new("merge-invalid");
    let u0 = env.new_stream::<u64>();
    let u1 = env.new_stream::<u64>();

    let err = u0.merge(std::iter::empty()).unwrap_err();
    assert!(matches!(err, GraphError::InvalidGraph { .. }));

    let err = u0.merge([&u1, &u1]).unwrap_err();
    assert!(matches!(err, GraphError::InvalidGraph { .. }));

    let err = u0.merge([&u0]).unwrap_err();
    assert!(matches!(err, GraphError::InvalidGraph { .. }));

    let other_env = StreamEnvironment::new("elsewhere");
    let foreign = other_env.new_stream::<u64>();
    let err = u0.merge([&u1, &foreign]).unwrap_err();
    assert!(matches!(err, GraphError::InvalidGraph { .. }));

    assert!(u0.registered_operator_specs().is_empty());
    assert!(u1.registered_operator_specs().is_empty());
    assert_eq!(env.stream_count(), 2);
}

#[test]
fn test_freeze_whole_environment() {
    let env = StreamEnvironment::default();
    let a = env.new_stream::<u64>();
    let b = a.map(|n: u64| n + 1).unwrap();
    let orphan = env.new_stream::<String>();
    env.freeze();

    assert!(a.is_frozen() && b.is_frozen() && orphan.is_frozen());
    assert!(orphan.map(|s: String| s.len()).is_err());
}

#[test]
fn test_walk_visits_in_topological_order() {
    let env = StreamEnvironment::new("walk");
    let a = env.new_stream::<u64>();
    let b = env.new_stream::<u64>();
    let merged = a.merge([&b]).unwrap();
    let doubled = merged.map(|n: u64| n * 2).unwrap();
    let late = env.new_stream::<u64>();

    let mut visited = Vec::new();
    env.walk(&env.sources(), |input, spec| {
        visited.push((input, spec.kind(), spec.output_stream()));
    })
    .unwrap();

    assert_eq!(
        visited,
        vec![
            (a.id(), SpecKind::Stream, Some(merged.id())),
            (b.id(), SpecKind::Stream, Some(merged.id())),
            (merged.id(), SpecKind::Stream, Some(doubled.id())),
        ]
    );
    assert!(merged.is_frozen());
    assert!(late.is_frozen());
    assert_eq!(
        env.topological_order(&[a.id()]).unwrap(),
        vec![a.id(), merged.id(), doubled.id()]
    );
}

#[test]
fn test_walk_callback_may_use_environment() {
    let env = StreamEnvironment::new("walk-reentrant");
    let a = env.new_stream::<u64>();
    a.map(|n: u64| n + 1).unwrap();
    let side = env.new_stream::<u64>();

    let mut registered = 0;
    env.walk(&[a.id()], |_, _| {
        if side.map(|n: u64| n).is_ok() {
            registered += 1;
        }
    })
    .unwrap();
    assert_eq!(registered, 1);
    assert_eq!(side.registered_operator_specs().len(), 1);
}
