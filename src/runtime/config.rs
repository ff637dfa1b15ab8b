//! Engine configuration.

use crate::accumulator::AccumulatorConfig;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables of a [`DataEngine`](crate::runtime::DataEngine).
///
/// Every field has a default, so a partial JSON document is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Records older than this are dropped on the next merge into their
    /// resource.
    pub freshness_ttl_ms: u64,

    /// Quiet time an accumulator waits after the last batch before fetching.
    pub quiescence_ms: u64,

    /// Longest an accumulator window may stay open, from its first id.
    /// `None` never forces a flush.
    pub max_accumulation_ms: Option<u64>,

    /// Capacity of each actor's message channel.
    pub channel_buffer: usize,

    /// Capacity of the lifecycle-event broadcast. Slow subscribers that fall
    /// further behind than this miss events.
    pub event_buffer: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            freshness_ttl_ms: 10 * 60 * 1000, // 10 minutes
            quiescence_ms: 50,
            max_accumulation_ms: Some(1000),
            channel_buffer: 32,
            event_buffer: 256,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.channel_buffer == 0 {
            return Err(EngineError::Config("channel_buffer must be at least 1".into()));
        }
        if self.event_buffer == 0 {
            return Err(EngineError::Config("event_buffer must be at least 1".into()));
        }
        Ok(())
    }

    pub fn freshness_ttl(&self) -> Duration {
        Duration::from_millis(self.freshness_ttl_ms)
    }

    pub fn accumulator(&self) -> AccumulatorConfig {
        AccumulatorConfig {
            quiescence: Duration::from_millis(self.quiescence_ms),
            max_wait: self.max_accumulation_ms.map(Duration::from_millis),
        }
    }
}
