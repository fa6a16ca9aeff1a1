#![allow(dead_code)]

use streamspec_core::functions::{MessageCollector, RequestScope, TaskCoordinator};
use streamspec_core::types::{EventTime, MessageEnvelope, OutgoingEnvelope};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestMessage {
    pub value: String,
    pub event_time: EventTime,
}

impl TestMessage {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn event_time(&self) -> EventTime {
        self.event_time
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestEnvelope {
    pub key: String,
    pub message: TestMessage,
}

impl TestEnvelope {
    pub fn new(key: &str, value: &str, event_time: EventTime) -> Self {
        Self {
            key: key.to_string(),
            message: TestMessage {
                value: value.to_string(),
                event_time,
            },
        }
    }
}

impl MessageEnvelope for TestEnvelope {
    type Key = String;
    type Message = TestMessage;

    fn key(&self) -> &String {
        &self.key
    }

    fn message(&self) -> &TestMessage {
        &self.message
    }
}

/// Key plus an integer payload, the output shape of most scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutput {
    pub key: String,
    pub payload: usize,
}

#[derive(Default)]
pub struct RecordingCollector {
    pub sent: Vec<OutgoingEnvelope>,
}

impl MessageCollector for RecordingCollector {
    fn send(&mut self, envelope: OutgoingEnvelope) {
        self.sent.push(envelope);
    }
}

#[derive(Default)]
pub struct RecordingCoordinator {
    pub commits: Vec<RequestScope>,
    pub shutdowns: Vec<RequestScope>,
}

impl TaskCoordinator for RecordingCoordinator {
    fn commit(&mut self, scope: RequestScope) {
        self.commits.push(scope);
    }

    fn shutdown(&mut self, scope: RequestScope) {
        self.shutdowns.push(scope);
    }
}
