//! # Mock Transport
//!
//! A scripted [`Transport`] for tests.
//!
//! Queue expectations with [`MockTransport::expect`], hand the mock to the
//! engine, then call [`MockTransport::verify`] to assert every expectation was
//! consumed and no unexpected call came in.
//!
//! ```ignore
//! let mock = MockTransport::new();
//! mock.expect(RequestKind::GetOne, "posts")
//!     .for_id(1)
//!     .after(Duration::from_millis(100))
//!     .return_ok(TransportResponse::data(json!({ "id": 1 })));
//! ```

use crate::model::{Payload, RecordId, RequestKind};
use crate::transport::{Transport, TransportError, TransportResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A queued answer for one matching call.
struct Expectation {
    kind: RequestKind,
    resource: String,
    id: Option<RecordId>,
    delay: Duration,
    response: Result<TransportResponse, TransportError>,
}

impl Expectation {
    fn matches(&self, kind: RequestKind, resource: &str, payload: &Payload) -> bool {
        self.kind == kind
            && self.resource == resource
            && self.id.as_ref().map_or(true, |id| payload.id() == Some(id))
    }
}

/// A call the mock received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub kind: RequestKind,
    pub resource: String,
    pub payload: Payload,
}

#[derive(Default)]
struct MockState {
    expectations: VecDeque<Expectation>,
    calls: Vec<RecordedCall>,
    unexpected: Vec<RecordedCall>,
}

/// A transport that answers from a queue of expectations.
///
/// Calls are matched against the *first* queued expectation with the same kind
/// and resource (and id, when one was given), so concurrent requests do not
/// depend on task scheduling order.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts building an expectation for a `kind` call on `resource`.
    pub fn expect(&self, kind: RequestKind, resource: impl Into<String>) -> ExpectationBuilder {
        ExpectationBuilder {
            state: self.state.clone(),
            kind,
            resource: resource.into(),
            id: None,
            delay: Duration::ZERO,
        }
    }

    /// Every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    /// Calls received so far with the given kind.
    pub fn calls_of(&self, kind: RequestKind) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.kind == kind).collect()
    }

    /// Panics if an expectation is left over or an unexpected call came in.
    pub fn verify(&self) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !state.unexpected.is_empty() {
            panic!("Unexpected transport calls: {:?}", state.unexpected);
        }
        if !state.expectations.is_empty() {
            panic!(
                "Not all expectations were met. {} remaining",
                state.expectations.len()
            );
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(
        &self,
        kind: RequestKind,
        resource: &str,
        payload: &Payload,
    ) -> Result<TransportResponse, TransportError> {
        let call = RecordedCall {
            kind,
            resource: resource.to_string(),
            payload: payload.clone(),
        };

        let expectation = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| TransportError::new("mock transport poisoned"))?;
            state.calls.push(call.clone());
            let position = state
                .expectations
                .iter()
                .position(|e| e.matches(kind, resource, payload));
            match position.and_then(|i| state.expectations.remove(i)) {
                Some(expectation) => expectation,
                None => {
                    state.unexpected.push(call);
                    return Err(TransportError::new(format!(
                        "no expectation for {kind} {resource}"
                    )));
                }
            }
        };

        if !expectation.delay.is_zero() {
            tokio::time::sleep(expectation.delay).await;
        }
        expectation.response
    }
}

/// Fluent builder returned by [`MockTransport::expect`].
pub struct ExpectationBuilder {
    state: Arc<Mutex<MockState>>,
    kind: RequestKind,
    resource: String,
    id: Option<RecordId>,
    delay: Duration,
}

impl ExpectationBuilder {
    /// Only match calls whose payload targets this id.
    pub fn for_id(mut self, id: impl Into<RecordId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Resolve only after `delay` has elapsed.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the expectation to resolve with `response`.
    pub fn return_ok(self, response: TransportResponse) {
        self.push(Ok(response));
    }

    /// Sets the expectation to reject with `error`.
    pub fn return_err(self, error: TransportError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<TransportResponse, TransportError>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.expectations.push_back(Expectation {
            kind: self.kind,
            resource: self.resource,
            id: self.id,
            delay: self.delay,
            response,
        });
    }
}
