#![allow(dead_code)]

use resource_orchestrator::effects::{EffectSink, RecordingSink};
use resource_orchestrator::model::{LifecycleEvent, RequestKind};
use resource_orchestrator::runtime::{setup_tracing, DataEngine, EngineConfig};
use resource_orchestrator::transport::mock::MockTransport;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

pub fn start(mock: &MockTransport, sink: &RecordingSink) -> DataEngine {
    start_with(mock, sink, EngineConfig::default())
}

pub fn start_with(mock: &MockTransport, sink: &RecordingSink, config: EngineConfig) -> DataEngine {
    setup_tracing();
    let sinks: Vec<Arc<dyn EffectSink>> = vec![Arc::new(sink.clone())];
    DataEngine::start(Arc::new(mock.clone()), sinks, config).expect("engine should start")
}

/// Waits for the next terminal event of `kind`.
pub async fn next_terminal(
    events: &mut broadcast::Receiver<LifecycleEvent>,
    kind: RequestKind,
) -> LifecycleEvent {
    loop {
        let event = events.recv().await.expect("event stream closed");
        if event.kind() == kind && event.phase.is_terminal() {
            return event;
        }
    }
}

/// Everything already sent on `events`.
pub fn drain(events: &mut broadcast::Receiver<LifecycleEvent>) -> Vec<LifecycleEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}
