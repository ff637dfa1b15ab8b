//! Data model shared by every part of the engine.
//!
//! - [`Request`] / [`Payload`] / [`RequestKind`]: what a widget asks for.
//! - [`LifecycleEvent`] / [`Phase`]: what happened to it.
//! - [`RecordId`] / [`Record`]: what comes back.
//! - [`RelationKey`] / [`ReferenceSource`]: typed keys of the reference indices.

pub mod event;
pub mod keys;
pub mod record;
pub mod request;

pub use event::*;
pub use keys::*;
pub use record::*;
pub use request::*;
