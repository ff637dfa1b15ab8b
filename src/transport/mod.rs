//! The boundary to the remote API.
//!
//! The engine never speaks a wire protocol itself. It hands a request kind, a
//! resource name and a [`Payload`] to a [`Transport`] and expects either a
//! response carrying `data` or a rejection.

pub mod mock;

use crate::model::{Payload, RequestKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// What a transport resolves with.
///
/// `data` is optional at this level so that a misbehaving transport can be
/// detected and reported instead of trusted; the dispatcher rejects any
/// response where it is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransportResponse {
    pub data: Option<Value>,
    pub total: Option<u64>,
}

impl TransportResponse {
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            total: None,
        }
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }
}

/// A rejection from the transport (network error, non-2xx status...).
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    pub status: Option<u16>,
    pub body: Option<Value>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            body: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Translates engine requests into calls against a backend.
///
/// # Contract
/// - Reject (return `Err`) on every non-successful outcome.
/// - Resolve with a response whose `data` is an array of records for
///   list-shaped kinds and a single record otherwise.
///
/// The returned future is the single suspension point of a fetch task; a
/// superseded request is dropped while awaiting it.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn send(
        &self,
        kind: RequestKind,
        resource: &str,
        payload: &Payload,
    ) -> Result<TransportResponse, TransportError>;
}
