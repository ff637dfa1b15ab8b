//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered
//! by `RUST_LOG`.
//!
//! ## What Gets Traced
//!
//! - **Dispatch**: every request with its id, kind, resource and policy
//!   (`debug`), supersessions (`debug`), failures (`warn`).
//! - **Store**: every applied event with its phase (`debug`), startup and
//!   shutdown (`info`).
//! - **Effects**: every failure at `error` with the request that caused it,
//!   and every notification or navigation through [`LoggingSink`](crate::effects::LoggingSink).
//! - **Accumulators**: reschedules (`debug`) and flushes (`info`).
//!
//! ```bash
//! RUST_LOG=info cargo test
//! RUST_LOG=resource_orchestrator::dispatcher=debug cargo test
//! ```

/// Initializes the global subscriber. Later calls are no-ops, so every test
/// can call it.
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .try_init();
}
