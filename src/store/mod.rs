//! # Store Actor
//!
//! The single owner of the engine's state.
//!
//! ## Key Types
//!
//! - [`StoreActor`]: the "server" half. Owns an [`AdminState`] and the receiving
//!   end of the channel, applies lifecycle events one at a time and then runs
//!   their effects.
//! - [`StoreClient`]: the cloneable "client" half. Feeds events in and answers
//!   selector queries through one-shot replies.
//!
//! ## Concurrency Model
//!
//! Fetch tasks finish in any order, but they all report through the same
//! channel. The actor processes messages sequentially, so there is no lock
//! around the cache and no torn write is possible: a selector always sees the
//! state between two whole events.

pub mod loading;
pub mod state;

pub use loading::LoadingCounter;
pub use state::AdminState;

use crate::cache::ListState;
use crate::effects::EffectDispatcher;
use crate::error::EngineError;
use crate::model::{LifecycleEvent, Record, RecordId, ReferenceSource, RelationKey};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info};

/// One-shot channel used by the actor to answer a query.
pub type Reply<T> = oneshot::Sender<T>;

/// Messages understood by the [`StoreActor`].
#[derive(Debug)]
pub enum StoreRequest {
    /// Fold a lifecycle event into the state, then dispatch its effects.
    Apply { event: LifecycleEvent },
    Record {
        resource: String,
        id: RecordId,
        respond_to: Reply<Option<Record>>,
    },
    Records {
        resource: String,
        ids: Vec<RecordId>,
        respond_to: Reply<Vec<Record>>,
    },
    List {
        resource: String,
        respond_to: Reply<ListState>,
    },
    References {
        key: RelationKey,
        respond_to: Reply<Option<Vec<Record>>>,
    },
    PossibleReferences {
        source: ReferenceSource,
        reference: String,
        selected: Vec<RecordId>,
        respond_to: Reply<Option<Result<Vec<Record>, String>>>,
    },
    Loading { respond_to: Reply<u64> },
    Snapshot { respond_to: Reply<AdminState> },
}

/// The actor that owns the [`AdminState`].
pub struct StoreActor {
    receiver: mpsc::Receiver<StoreRequest>,
    state: AdminState,
    effects: EffectDispatcher,
}

impl StoreActor {
    pub fn new(
        buffer_size: usize,
        freshness_ttl: Duration,
        effects: EffectDispatcher,
    ) -> (Self, StoreClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            state: AdminState::new(freshness_ttl),
            effects,
        };
        (actor, StoreClient::new(sender))
    }

    /// Runs the event loop until every [`StoreClient`] is dropped.
    pub async fn run(mut self) {
        info!("Store started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Apply { event } => {
                    debug!(
                        request_id = event.request_id,
                        kind = %event.kind(),
                        resource = event.resource(),
                        phase = event.phase.name(),
                        "Apply"
                    );
                    self.state.apply(&event, Instant::now());
                    if event.phase.is_terminal() {
                        self.effects.handle(&event);
                    }
                }
                StoreRequest::Record {
                    resource,
                    id,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.state.cache.get(&resource, &id).cloned());
                }
                StoreRequest::Records {
                    resource,
                    ids,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.state.cache.get_many(&resource, &ids));
                }
                StoreRequest::List {
                    resource,
                    respond_to,
                } => {
                    let _ = respond_to.send(self.state.list(&resource));
                }
                StoreRequest::References { key, respond_to } => {
                    let records = self.state.references.references(&self.state.cache, &key);
                    let _ = respond_to.send(records);
                }
                StoreRequest::PossibleReferences {
                    source,
                    reference,
                    selected,
                    respond_to,
                } => {
                    let choices = self.state.references.possible_references(
                        &self.state.cache,
                        &source,
                        &reference,
                        &selected,
                    );
                    let _ = respond_to.send(choices);
                }
                StoreRequest::Loading { respond_to } => {
                    let _ = respond_to.send(self.state.loading.count());
                }
                StoreRequest::Snapshot { respond_to } => {
                    let _ = respond_to.send(self.state.clone());
                }
            }
        }

        info!(loading = self.state.loading.count(), "Store shutdown");
    }
}

/// Cloneable handle to the [`StoreActor`].
#[derive(Clone)]
pub struct StoreClient {
    sender: mpsc::Sender<StoreRequest>,
}

impl StoreClient {
    pub fn new(sender: mpsc::Sender<StoreRequest>) -> Self {
        Self { sender }
    }

    pub async fn apply(&self, event: LifecycleEvent) -> Result<(), EngineError> {
        self.sender
            .send(StoreRequest::Apply { event })
            .await
            .map_err(|_| EngineError::ActorClosed)
    }

    async fn ask<T>(
        &self,
        build: impl FnOnce(Reply<T>) -> StoreRequest,
    ) -> Result<T, EngineError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| EngineError::ActorClosed)?;
        response.await.map_err(|_| EngineError::ActorDropped)
    }

    pub async fn record(&self, resource: &str, id: RecordId) -> Result<Option<Record>, EngineError> {
        let resource = resource.to_string();
        self.ask(|respond_to| StoreRequest::Record {
            resource,
            id,
            respond_to,
        })
        .await
    }

    pub async fn records(
        &self,
        resource: &str,
        ids: Vec<RecordId>,
    ) -> Result<Vec<Record>, EngineError> {
        let resource = resource.to_string();
        self.ask(|respond_to| StoreRequest::Records {
            resource,
            ids,
            respond_to,
        })
        .await
    }

    pub async fn list(&self, resource: &str) -> Result<ListState, EngineError> {
        let resource = resource.to_string();
        self.ask(|respond_to| StoreRequest::List {
            resource,
            respond_to,
        })
        .await
    }

    pub async fn references(&self, key: RelationKey) -> Result<Option<Vec<Record>>, EngineError> {
        self.ask(|respond_to| StoreRequest::References { key, respond_to })
            .await
    }

    pub async fn possible_references(
        &self,
        source: ReferenceSource,
        reference: &str,
        selected: Vec<RecordId>,
    ) -> Result<Option<Result<Vec<Record>, String>>, EngineError> {
        let reference = reference.to_string();
        self.ask(|respond_to| StoreRequest::PossibleReferences {
            source,
            reference,
            selected,
            respond_to,
        })
        .await
    }

    pub async fn loading(&self) -> Result<u64, EngineError> {
        self.ask(|respond_to| StoreRequest::Loading { respond_to })
            .await
    }

    /// A copy of the whole state, as of every message sent before this one.
    pub async fn snapshot(&self) -> Result<AdminState, EngineError> {
        self.ask(|respond_to| StoreRequest::Snapshot { respond_to })
            .await
    }
}
