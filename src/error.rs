//! Error types of the engine.
//!
//! Two families live here:
//! - [`EngineError`]: the plumbing failed (an actor went away, a task panicked).
//!   Returned from async client methods.
//! - [`FetchError`]: a request failed. Never returned to callers as an `Err`;
//!   it is carried inside a `FAILURE` lifecycle event instead.

use crate::transport::TransportError;
use thiserror::Error;

/// Errors raised by the engine's own machinery.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Task failed: {0}")]
    TaskFailed(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Why a request ended in `FAILURE`.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    /// The transport rejected the call.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The transport resolved, but with something the engine cannot use.
    #[error("Protocol violation: {0}")]
    Protocol(String),
}

impl FetchError {
    /// The text shown to the user. Empty when the transport gave no message.
    pub fn message(&self) -> String {
        match self {
            FetchError::Transport(e) => e.message.clone(),
            FetchError::Protocol(msg) => msg.clone(),
        }
    }
}
