//! # Reference Accumulator
//!
//! Coalesces bursts of "I need these ids of resource R" into one `GET_MANY`
//! per resource.
//!
//! ## Protocol
//!
//! 1. Incoming ids are unioned into R's pending set.
//! 2. Each arrival restarts R's quiescence timer (50 ms by default).
//! 3. When the timer runs out, one `GET_MANY` carrying the whole pending set
//!    is dispatched and the set is cleared.
//!
//! Pending sets only grow until flushed, so no id requested during a window
//! is ever dropped. Resources are independent: each one is owned by its own
//! [`ResourceAccumulator`] task holding its pending set and its timer, and the
//! [`AccumulatorActor`] only routes batches to them.
//!
//! A resource that never goes quiet would never flush, so the window is also
//! capped by `max_wait` measured from the first id of the window.

use crate::dispatcher::FetchDispatcher;
use crate::error::EngineError;
use crate::model::{RecordId, Request};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_QUIESCENCE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccumulatorConfig {
    /// How long a resource must stay quiet before its pending ids are fetched.
    pub quiescence: Duration,
    /// Upper bound on a window, from its first id. `None` lets a resource
    /// under continuous load postpone its flush forever.
    pub max_wait: Option<Duration>,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            quiescence: DEFAULT_QUIESCENCE,
            max_wait: Some(Duration::from_secs(1)),
        }
    }
}

/// Ids waiting to be fetched, in first-requested order, without duplicates.
#[derive(Debug, Default)]
struct PendingIds {
    order: Vec<RecordId>,
    seen: HashSet<RecordId>,
}

impl PendingIds {
    fn extend(&mut self, ids: Vec<RecordId>) {
        for id in ids {
            if self.seen.insert(id.clone()) {
                self.order.push(id);
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Owns the pending set and the flush timer of one resource.
pub struct ResourceAccumulator {
    resource: String,
    receiver: mpsc::Receiver<Vec<RecordId>>,
    pending: PendingIds,
    dispatcher: FetchDispatcher,
    config: AccumulatorConfig,
}

impl ResourceAccumulator {
    fn new(
        resource: String,
        receiver: mpsc::Receiver<Vec<RecordId>>,
        dispatcher: FetchDispatcher,
        config: AccumulatorConfig,
    ) -> Self {
        Self {
            resource,
            receiver,
            pending: PendingIds::default(),
            dispatcher,
            config,
        }
    }

    pub async fn run(mut self) {
        debug!(resource = %self.resource, "Accumulator started");

        while let Some(ids) = self.receiver.recv().await {
            self.pending.extend(ids);
            let window_start = Instant::now();
            let mut deadline = window_start + self.config.quiescence;
            let mut closing = false;

            loop {
                let fire_at = match self.config.max_wait {
                    Some(max_wait) => deadline.min(window_start + max_wait),
                    None => deadline,
                };
                tokio::select! {
                    batch = self.receiver.recv() => match batch {
                        Some(ids) => {
                            self.pending.extend(ids);
                            deadline = Instant::now() + self.config.quiescence;
                            debug!(resource = %self.resource, pending = self.pending.len(), "Flush rescheduled");
                        }
                        None => {
                            closing = true;
                            break;
                        }
                    },
                    _ = sleep_until(fire_at) => break,
                }
            }

            self.flush();
            if closing {
                break;
            }
        }

        if !self.pending.is_empty() {
            warn!(resource = %self.resource, lost = self.pending.len(), "Accumulator stopped with pending ids");
        }
        debug!(resource = %self.resource, "Accumulator stopped");
    }

    /// Dispatches one `GET_MANY` for everything pending. If the dispatcher
    /// refuses it, the ids stay pending for the next window.
    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let ids = self.pending.order.clone();
        let count = ids.len();
        match self.dispatcher.dispatch(Request::get_many(self.resource.clone(), ids)) {
            Ok(handle) => {
                info!(resource = %self.resource, count, request_id = handle.request_id(), "Flushed");
                self.pending = PendingIds::default();
            }
            Err(e) => {
                warn!(resource = %self.resource, count, error = %e, "Flush failed, ids kept pending");
            }
        }
    }
}

/// A batch of ids for one resource.
#[derive(Debug)]
pub struct Accumulate {
    pub resource: String,
    pub ids: Vec<RecordId>,
}

/// Routes batches to one [`ResourceAccumulator`] per resource, spawning them
/// on first use.
pub struct AccumulatorActor {
    receiver: mpsc::Receiver<Accumulate>,
    dispatcher: FetchDispatcher,
    config: AccumulatorConfig,
    buffer_size: usize,
    resources: HashMap<String, mpsc::Sender<Vec<RecordId>>>,
    handles: Vec<JoinHandle<()>>,
}

impl AccumulatorActor {
    pub fn new(
        buffer_size: usize,
        dispatcher: FetchDispatcher,
        config: AccumulatorConfig,
    ) -> (Self, AccumulatorClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            dispatcher,
            config,
            buffer_size,
            resources: HashMap::new(),
            handles: Vec::new(),
        };
        (actor, AccumulatorClient::new(sender))
    }

    fn spawn_resource(&mut self, resource: &str) -> mpsc::Sender<Vec<RecordId>> {
        let (sender, receiver) = mpsc::channel(self.buffer_size);
        let accumulator = ResourceAccumulator::new(
            resource.to_string(),
            receiver,
            self.dispatcher.clone(),
            self.config,
        );
        self.handles.push(tokio::spawn(accumulator.run()));
        self.resources.insert(resource.to_string(), sender.clone());
        sender
    }

    /// Routes batches until every [`AccumulatorClient`] is dropped, then lets
    /// each resource flush what it still holds before returning.
    pub async fn run(mut self) {
        info!("Accumulator router started");

        while let Some(Accumulate { resource, ids }) = self.receiver.recv().await {
            let sender = match self.resources.get(&resource) {
                Some(sender) if !sender.is_closed() => sender.clone(),
                _ => self.spawn_resource(&resource),
            };
            if let Err(mpsc::error::SendError(ids)) = sender.send(ids).await {
                // The resource task is gone; start a fresh one.
                let sender = self.spawn_resource(&resource);
                if sender.send(ids).await.is_err() {
                    warn!(%resource, "Accumulator unavailable, batch dropped");
                }
            }
        }

        self.resources.clear();
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "Accumulator task failed");
            }
        }
        info!("Accumulator router shutdown");
    }
}

/// Cloneable handle used to request ids.
#[derive(Clone)]
pub struct AccumulatorClient {
    sender: mpsc::Sender<Accumulate>,
}

impl AccumulatorClient {
    pub fn new(sender: mpsc::Sender<Accumulate>) -> Self {
        Self { sender }
    }

    /// Asks for `ids` of `resource` to be fetched in the resource's next batch.
    pub async fn request(
        &self,
        resource: impl Into<String>,
        ids: Vec<RecordId>,
    ) -> Result<(), EngineError> {
        self.sender
            .send(Accumulate {
                resource: resource.into(),
                ids,
            })
            .await
            .map_err(|_| EngineError::ActorClosed)
    }
}
