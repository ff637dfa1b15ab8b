//! Widget-facing clients.

pub mod resource_client;

pub use resource_client::*;
