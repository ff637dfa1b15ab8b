use crate::accumulator::{AccumulatorActor, AccumulatorClient};
use crate::clients::ResourceClient;
use crate::dispatcher::FetchDispatcher;
use crate::effects::{EffectDispatcher, EffectSink};
use crate::error::EngineError;
use crate::model::LifecycleEvent;
use crate::runtime::EngineConfig;
use crate::store::{StoreActor, StoreClient};
use crate::transport::Transport;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// The running engine: store, dispatcher and accumulator wired together.
///
/// `DataEngine` is responsible for:
/// - **Lifecycle Management**: spawning the store and accumulator actors and
///   stopping them
/// - **Dependency Wiring**: the dispatcher reports to the store, the
///   accumulator dispatches through the dispatcher
///
/// # Example
///
/// ```ignore
/// let engine = DataEngine::start(transport, vec![Arc::new(LoggingSink)], EngineConfig::default())?;
///
/// let posts = engine.resource("posts");
/// posts.get_one(1, Some("/posts".into()))?.outcome().await?;
/// let post = posts.record(1).await?;
///
/// drop(posts);
/// engine.shutdown().await?;
/// ```
pub struct DataEngine {
    store: StoreClient,
    dispatcher: FetchDispatcher,
    accumulator: AccumulatorClient,
    store_handle: JoinHandle<()>,
    accumulator_handle: JoinHandle<()>,
}

impl DataEngine {
    /// Spawns every actor and returns once they are ready to take requests.
    pub fn start(
        transport: Arc<dyn Transport>,
        sinks: Vec<Arc<dyn EffectSink>>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        // 1. Store: owns all state, runs effects
        let (store_actor, store) = StoreActor::new(
            config.channel_buffer,
            config.freshness_ttl(),
            EffectDispatcher::new(sinks),
        );
        let store_handle = tokio::spawn(store_actor.run());

        // 2. Dispatcher: reports every lifecycle event to the store
        let dispatcher = FetchDispatcher::new(transport, store.clone(), config.event_buffer);

        // 3. Accumulator: batches GET_MANY through the dispatcher
        let (accumulator_actor, accumulator) =
            AccumulatorActor::new(config.channel_buffer, dispatcher.clone(), config.accumulator());
        let accumulator_handle = tokio::spawn(accumulator_actor.run());

        info!(?config, "Engine started");
        Ok(Self {
            store,
            dispatcher,
            accumulator,
            store_handle,
            accumulator_handle,
        })
    }

    pub fn store(&self) -> &StoreClient {
        &self.store
    }

    pub fn dispatcher(&self) -> &FetchDispatcher {
        &self.dispatcher
    }

    pub fn accumulator(&self) -> &AccumulatorClient {
        &self.accumulator
    }

    /// A client bound to one resource.
    pub fn resource(&self, resource: impl Into<String>) -> ResourceClient {
        ResourceClient::new(
            resource,
            self.dispatcher.clone(),
            self.store.clone(),
            self.accumulator.clone(),
        )
    }

    /// Every lifecycle event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.dispatcher.subscribe()
    }

    /// Stops the engine.
    ///
    /// 1. Closing the accumulator channel makes every resource flush what it
    ///    still holds.
    /// 2. The dispatcher stops taking requests; running fetches finish and
    ///    report.
    /// 3. The store drains its channel and exits.
    ///
    /// Clients obtained from [`DataEngine::resource`] keep the actors alive
    /// and must be dropped first.
    pub async fn shutdown(self) -> Result<(), EngineError> {
        info!("Shutting down engine...");

        drop(self.accumulator);
        self.accumulator_handle.await.map_err(|e| {
            error!("Accumulator task failed: {:?}", e);
            EngineError::TaskFailed(e.to_string())
        })?;

        self.dispatcher.close();
        drop(self.dispatcher);
        drop(self.store);
        self.store_handle.await.map_err(|e| {
            error!("Store task failed: {:?}", e);
            EngineError::TaskFailed(e.to_string())
        })?;

        info!("Engine shutdown complete.");
        Ok(())
    }
}
