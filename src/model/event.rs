//! Lifecycle events emitted for every dispatched request.

use crate::error::FetchError;
use crate::model::{Request, RequestKind};
use serde_json::Value;
use std::sync::Arc;

/// Identifier handed out by the dispatcher, unique for the life of the engine.
pub type RequestId = u64;

/// A successful transport response after its `data` field was checked.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub data: Value,
    pub total: Option<u64>,
}

/// Where a request is in its lifecycle.
///
/// `Start` is always emitted first; exactly one of the three terminal phases
/// follows it.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Start,
    Success(Response),
    Failure(FetchError),
    Cancel,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Phase::Start)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Start => "START",
            Phase::Success(_) => "SUCCESS",
            Phase::Failure(_) => "FAILURE",
            Phase::Cancel => "CANCEL",
        }
    }
}

/// A phase change of one request, tagged with the request that caused it.
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    pub request_id: RequestId,
    pub request: Arc<Request>,
    pub phase: Phase,
}

impl LifecycleEvent {
    pub fn new(request_id: RequestId, request: Arc<Request>, phase: Phase) -> Self {
        Self {
            request_id,
            request,
            phase,
        }
    }

    pub fn kind(&self) -> RequestKind {
        self.request.kind()
    }

    pub fn resource(&self) -> &str {
        &self.request.resource
    }
}
