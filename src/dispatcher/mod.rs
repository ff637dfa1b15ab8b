//! # Fetch Dispatcher
//!
//! Runs one [`Request`] against the [`Transport`] per spawned task and reports
//! its lifecycle.
//!
//! ## Lifecycle
//!
//! Each task emits `START` first, then exactly one of `SUCCESS`, `FAILURE` or
//! `CANCEL`. Events go to the store actor first and to broadcast subscribers
//! second, so a subscriber that reads the store after seeing an event always
//! finds that event applied.
//!
//! ## Cancellation
//!
//! A task suspends at exactly one point: awaiting the transport. Under the
//! [`CancelPolicy::Supersede`] policy, dispatching a newer request of the same
//! kind cancels the task's token; if the task is still suspended it drops the
//! transport future and emits `CANCEL`. A task that already resumed finishes
//! normally. Cancellation is best-effort, never an error.
//!
//! A transport that panics fails its request like any other transport error.
//!
//! Nothing is retried. A caller that wants a retry dispatches a new request.

pub mod policy;

pub use policy::CancelPolicy;

use crate::error::{EngineError, FetchError};
use crate::model::{LifecycleEvent, Phase, Request, RequestId, RequestKind, Response};
use crate::store::StoreClient;
use crate::transport::{Transport, TransportResponse};
use futures::FutureExt;
use policy::SupersedeRegistry;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How a dispatched request ended, as seen by its caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Response),
    Failure(FetchError),
    /// Superseded while waiting on the transport. Its result, if any, was
    /// discarded.
    Cancelled,
}

impl Outcome {
    fn phase(&self) -> Phase {
        match self {
            Outcome::Success(response) => Phase::Success(response.clone()),
            Outcome::Failure(error) => Phase::Failure(error.clone()),
            Outcome::Cancelled => Phase::Cancel,
        }
    }
}

/// Handle to a dispatched request.
#[derive(Debug)]
pub struct DispatchHandle {
    request_id: RequestId,
    join: JoinHandle<Outcome>,
}

impl DispatchHandle {
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Waits for the request to reach its terminal phase.
    pub async fn outcome(self) -> Result<Outcome, EngineError> {
        self.join
            .await
            .map_err(|e| EngineError::TaskFailed(e.to_string()))
    }
}

struct Inner {
    transport: Arc<dyn Transport>,
    store: StoreClient,
    events: broadcast::Sender<LifecycleEvent>,
    next_id: AtomicU64,
    supersede: Mutex<SupersedeRegistry>,
    closed: AtomicBool,
}

/// Cloneable entry point for running requests.
#[derive(Clone)]
pub struct FetchDispatcher {
    inner: Arc<Inner>,
}

impl FetchDispatcher {
    pub fn new(transport: Arc<dyn Transport>, store: StoreClient, event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer);
        Self {
            inner: Arc::new(Inner {
                transport,
                store,
                events,
                next_id: AtomicU64::new(1),
                supersede: Mutex::new(SupersedeRegistry::default()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Receives every lifecycle event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.inner.events.subscribe()
    }

    /// Refuses any further dispatch. Tasks already running are unaffected.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Starts `request` in its own task.
    ///
    /// Under the supersede policy, the previous in-flight request of the same
    /// kind is cancelled before the new task is spawned.
    pub fn dispatch(&self, request: Request) -> Result<DispatchHandle, EngineError> {
        if self.is_closed() {
            return Err(EngineError::ActorClosed);
        }

        let request = Arc::new(request);
        let request_id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let token = CancellationToken::new();
        let policy = CancelPolicy::of(&request);

        debug!(
            request_id,
            kind = %request.kind(),
            resource = %request.resource,
            ?policy,
            "Dispatch"
        );

        if policy == CancelPolicy::Supersede {
            let mut registry = self.inner.supersede.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(superseded) = registry.register(request.kind(), request_id, token.clone()) {
                debug!(request_id, superseded, "Superseding previous request");
            }
        }

        let inner = self.inner.clone();
        let join = tokio::spawn(async move { inner.run(request_id, request, policy, token).await });
        Ok(DispatchHandle { request_id, join })
    }
}

impl Inner {
    async fn run(
        &self,
        request_id: RequestId,
        request: Arc<Request>,
        policy: CancelPolicy,
        token: CancellationToken,
    ) -> Outcome {
        let kind = request.kind();
        self.emit(LifecycleEvent::new(request_id, request.clone(), Phase::Start))
            .await;

        let send = AssertUnwindSafe(self.transport.send(kind, &request.resource, &request.payload))
            .catch_unwind();
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => Outcome::Cancelled,
            result = send => {
                match result {
                    Ok(Ok(response)) => match validate(kind, response) {
                        Ok(response) => Outcome::Success(response),
                        Err(e) => Outcome::Failure(e),
                    },
                    Ok(Err(e)) => Outcome::Failure(FetchError::Transport(e)),
                    // A panicking transport still owes the request a terminal event.
                    Err(panic) => Outcome::Failure(FetchError::Protocol(format!(
                        "The transport panicked while handling '{kind}': {}",
                        panic_message(panic.as_ref())
                    ))),
                }
            }
        };

        if policy == CancelPolicy::Supersede {
            self.supersede
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .release(kind, request_id);
        }

        match &outcome {
            Outcome::Success(_) => debug!(request_id, %kind, "Success"),
            Outcome::Failure(e) => warn!(request_id, %kind, error = %e, "Failure"),
            Outcome::Cancelled => debug!(request_id, %kind, "Cancelled"),
        }

        self.emit(LifecycleEvent::new(request_id, request, outcome.phase()))
            .await;
        outcome
    }

    async fn emit(&self, event: LifecycleEvent) {
        if let Err(e) = self.store.apply(event.clone()).await {
            warn!(request_id = event.request_id, error = %e, "Store unavailable, event dropped");
        }
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Checks the shape of a resolved response.
///
/// `data` must be present; list-shaped kinds need an array, and kinds that
/// return a single record need an object.
fn validate(kind: RequestKind, response: TransportResponse) -> Result<Response, FetchError> {
    let data = response.data.ok_or_else(|| {
        FetchError::Protocol(format!(
            "The response to '{kind}' must be like {{ data : ... }}, but the received response does not have a 'data' key."
        ))
    })?;

    let shape_ok = match kind {
        RequestKind::GetList
        | RequestKind::GetMany
        | RequestKind::GetManyReference
        | RequestKind::GetMatching => data.is_array(),
        RequestKind::GetOne | RequestKind::Create | RequestKind::Update => data.is_object(),
        RequestKind::Delete => true,
    };
    if !shape_ok {
        let expected = if kind.returns_many() { "an array" } else { "an object" };
        return Err(FetchError::Protocol(format!(
            "The 'data' of a '{kind}' response must be {expected}."
        )));
    }

    Ok(Response {
        data,
        total: response.total,
    })
}
