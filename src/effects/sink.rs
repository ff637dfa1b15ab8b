//! Consumers of effect descriptions.

use crate::effects::{Effect, Notification, NotificationLevel};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Where notifications and navigations end up.
///
/// Rendering is entirely the sink's business; the engine only describes what
/// should happen.
pub trait EffectSink: Send + Sync + 'static {
    fn notify(&self, notification: &Notification);
    fn navigate(&self, path: &str);
}

/// Writes every effect to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

impl EffectSink for LoggingSink {
    fn notify(&self, notification: &Notification) {
        match notification.level {
            NotificationLevel::Info => info!(message = %notification.message, "Notification"),
            NotificationLevel::Warning => warn!(message = %notification.message, "Notification"),
        }
    }

    fn navigate(&self, path: &str) {
        info!(path, "Navigate");
    }
}

/// Keeps every effect it receives, for inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    notifications: Arc<Mutex<Vec<Notification>>>,
    navigations: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().map(|n| n.clone()).unwrap_or_default()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().map(|n| n.clone()).unwrap_or_default()
    }
}

impl EffectSink for RecordingSink {
    fn notify(&self, notification: &Notification) {
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push(notification.clone());
        }
    }

    fn navigate(&self, path: &str) {
        if let Ok(mut navigations) = self.navigations.lock() {
            navigations.push(path.to_string());
        }
    }
}

/// Delivers one effect to a sink: the notification first, then navigation.
pub(crate) fn deliver(sink: &dyn EffectSink, effect: &Effect) {
    sink.notify(&effect.notification);
    if let Some(path) = &effect.navigation {
        sink.navigate(path);
    }
}
