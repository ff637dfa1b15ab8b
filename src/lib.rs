//! # Resource Orchestrator
//!
//! > **Request orchestration and record caching for admin front-ends.**
//!
//! Widgets never talk to the backend directly. They describe what they need
//! as a typed [`Request`](model::Request); the engine dispatches it through a
//! pluggable [`Transport`](transport::Transport), reports its lifecycle, folds
//! the result into a shared cache and turns outcomes into user-facing effects.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### One owner for all state
//! Every piece of shared state (record cache, list pages, reference indices,
//! loading counter) lives inside a single store actor. Updates arrive as
//! [`LifecycleEvent`](model::LifecycleEvent)s, in emission order, and are
//! applied one at a time. No locks, no torn reads.
//!
//! ### Fetches are tasks, not callbacks
//! Each dispatched request runs in its own Tokio task. Cancellation is
//! cooperative: a superseded fetch has its
//! [`CancellationToken`](tokio_util::sync::CancellationToken) tripped and
//! reports `CANCEL` instead of a result.
//!
//! ### Stale-while-revalidate
//! Cached records stay readable while newer data is on its way. Entries are
//! evicted lazily, on the next merge for their resource, once they are older
//! than the freshness TTL.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Vocabulary ([`model`])
//! Record ids, request kinds and payloads, lifecycle events, typed relation
//! keys.
//!
//! ### 2. The State ([`cache`], [`references`], [`store`])
//! - [`RecordCache`](cache::RecordCache): per-resource records with fetch
//!   timestamps.
//! - [`ReferenceIndex`](references::ReferenceIndex): one-to-many relations
//!   and the possible values of reference inputs.
//! - [`StoreActor`](store::StoreActor): owns [`AdminState`](store::AdminState)
//!   and runs effects after each terminal event.
//!
//! ### 3. The Plumbing ([`dispatcher`], [`accumulator`], [`transport`])
//! - [`FetchDispatcher`](dispatcher::FetchDispatcher): spawns fetches and
//!   enforces the cancel-previous policy.
//! - [`AccumulatorActor`](accumulator::AccumulatorActor): debounces id
//!   requests into one `GET_MANY` per resource.
//! - [`MockTransport`](transport::mock::MockTransport): scripted backend for
//!   tests.
//!
//! ### 4. The Reactions ([`effects`], [`query`])
//! - [`EffectDispatcher`](effects::EffectDispatcher): notifications and
//!   redirects for terminal events.
//! - [`reduce`](query::reduce): sort, page and filter state of a list view.
//!
//! ### 5. The Interface ([`clients`], [`runtime`])
//! [`DataEngine`](runtime::DataEngine) wires everything together and hands
//! out [`ResourceClient`](clients::ResourceClient)s.
//!
//! ## 🚀 Quick Start
//!
//! ```ignore
//! runtime::setup_tracing();
//!
//! let engine = DataEngine::start(transport, vec![Arc::new(LoggingSink)], EngineConfig::default())?;
//! let posts = engine.resource("posts");
//!
//! posts.get_list(Pagination::new(1, 25), Sort::new("id", SortOrder::Desc), Filter::new())?;
//! posts.get_many_accumulate(vec![RecordId::from(1), RecordId::from(2)]).await?;
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! RUST_LOG=debug cargo test
//! ```

pub mod accumulator;
pub mod cache;
pub mod clients;
pub mod dispatcher;
pub mod effects;
pub mod error;
pub mod model;
pub mod query;
pub mod references;
pub mod runtime;
pub mod store;
pub mod transport;
