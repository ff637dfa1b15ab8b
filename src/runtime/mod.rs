//! Runtime orchestration and lifecycle management.
//!
//! - [`DataEngine`]: starts, wires and stops the actors.
//! - [`EngineConfig`]: tunables, loadable from JSON.
//! - [`setup_tracing`]: logging setup.

pub mod config;
pub mod engine;
pub mod tracing;

pub use config::*;
pub use engine::*;
pub use self::tracing::setup_tracing;
