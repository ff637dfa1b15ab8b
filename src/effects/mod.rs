//! Side effects of completed requests: user notifications and navigation.
//!
//! [`effect_for`] is a static table from `(kind, outcome)` to an [`Effect`].
//! [`EffectDispatcher`] runs it for every terminal event and hands the result
//! to the configured [`EffectSink`]s.
//!
//! Failures always produce a warning notification and an `error!` log line.
//! Cancellations produce nothing.

pub mod redirect;
pub mod sink;

pub use redirect::resolve_redirect_to;
pub use sink::{EffectSink, LoggingSink, RecordingSink};

use crate::model::{record_id, LifecycleEvent, Phase, Redirect, RequestKind};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

pub const NOTIFICATION_UPDATED: &str = "aor.notification.updated";
pub const NOTIFICATION_CREATED: &str = "aor.notification.created";
pub const NOTIFICATION_DELETED: &str = "aor.notification.deleted";
pub const NOTIFICATION_ITEM_DOESNT_EXIST: &str = "aor.notification.item_doesnt_exist";
pub const NOTIFICATION_HTTP_ERROR: &str = "aor.notification.http_error";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
}

/// A message for the user: either a translation key or a raw error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Info,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Effect {
    pub notification: Notification,
    pub navigation: Option<String>,
}

/// Notification plus optional redirect for a successful mutation.
fn mutation_success(event: &LifecycleEvent, key: &str) -> Effect {
    let payload = &event.request.payload;
    let id = match &event.phase {
        // A created record only gets its id from the server.
        Phase::Success(response) if event.kind() == RequestKind::Create => record_id(&response.data),
        _ => payload.id().cloned(),
    };
    let navigation = match (payload.redirect(), payload.base_path()) {
        (Some(Redirect::Path(path)), _) => Some(path.clone()),
        (Some(redirect), Some(base_path)) => resolve_redirect_to(redirect, base_path, id.as_ref()),
        _ => None,
    };
    Effect {
        notification: Notification::info(key),
        navigation,
    }
}

/// Looks up the effect of a lifecycle event, if it has one.
pub fn effect_for(event: &LifecycleEvent) -> Option<Effect> {
    use RequestKind::*;

    match (event.kind(), &event.phase) {
        (_, Phase::Start) | (_, Phase::Cancel) => None,

        (Update, Phase::Success(_)) => Some(mutation_success(event, NOTIFICATION_UPDATED)),
        (Create, Phase::Success(_)) => Some(mutation_success(event, NOTIFICATION_CREATED)),
        (Delete, Phase::Success(_)) => Some(mutation_success(event, NOTIFICATION_DELETED)),
        (GetList | GetOne | GetMany | GetManyReference | GetMatching, Phase::Success(_)) => None,

        (GetOne, Phase::Failure(e)) => match event.request.payload.base_path() {
            Some(base_path) => Some(Effect {
                notification: Notification::warning(NOTIFICATION_ITEM_DOESNT_EXIST),
                navigation: Some(base_path.to_string()),
            }),
            None => Some(failure(&e.message())),
        },
        (GetList | GetMany | GetManyReference | GetMatching | Create | Update | Delete, Phase::Failure(e)) => {
            Some(failure(&e.message()))
        }
    }
}

fn failure(message: &str) -> Effect {
    let message = if message.is_empty() {
        NOTIFICATION_HTTP_ERROR
    } else {
        message
    };
    Effect {
        notification: Notification::warning(message),
        navigation: None,
    }
}

/// Runs the effect table for each terminal event and feeds the sinks.
#[derive(Clone, Default)]
pub struct EffectDispatcher {
    sinks: Vec<Arc<dyn EffectSink>>,
}

impl EffectDispatcher {
    pub fn new(sinks: Vec<Arc<dyn EffectSink>>) -> Self {
        Self { sinks }
    }

    pub fn handle(&self, event: &LifecycleEvent) -> Option<Effect> {
        if let Phase::Failure(e) = &event.phase {
            error!(
                request_id = event.request_id,
                kind = %event.kind(),
                resource = event.resource(),
                error = %e,
                "Request failed"
            );
        }

        let effect = effect_for(event)?;
        debug!(request_id = event.request_id, ?effect, "Dispatching effect");
        for sink in &self.sinks {
            sink::deliver(sink.as_ref(), &effect);
        }
        Some(effect)
    }
}
