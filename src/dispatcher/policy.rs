//! Cancellation policies.

use crate::model::{Request, RequestId, RequestKind};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// How a request interacts with earlier requests of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelPolicy {
    /// A newer request of the same kind cancels this one while it waits on
    /// the transport.
    Supersede,
    /// Runs to completion no matter what else is dispatched.
    Concurrent,
}

impl CancelPolicy {
    pub fn of(request: &Request) -> Self {
        if request.cancel_previous {
            CancelPolicy::Supersede
        } else {
            CancelPolicy::Concurrent
        }
    }
}

/// The latest in-flight supersede-policy task of each kind.
#[derive(Debug, Default)]
pub(crate) struct SupersedeRegistry {
    latest: HashMap<RequestKind, (RequestId, CancellationToken)>,
}

impl SupersedeRegistry {
    /// Makes `id` the latest task of `kind`, cancelling the previous one.
    /// Returns the id of the task that was cancelled, if any.
    pub fn register(
        &mut self,
        kind: RequestKind,
        id: RequestId,
        token: CancellationToken,
    ) -> Option<RequestId> {
        let (previous, previous_token) = self.latest.insert(kind, (id, token))?;
        previous_token.cancel();
        Some(previous)
    }

    /// Forgets `id` once it finished, unless a newer task already took its slot.
    pub fn release(&mut self, kind: RequestKind, id: RequestId) {
        if self.latest.get(&kind).is_some_and(|(latest, _)| *latest == id) {
            self.latest.remove(&kind);
        }
    }

    #[cfg(test)]
    pub fn in_flight(&self, kind: RequestKind) -> Option<RequestId> {
        self.latest.get(&kind).map(|(id, _)| *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_policy_follows_cancel_previous() {
        assert_eq!(CancelPolicy::of(&Request::get_one("posts", 1, None)), CancelPolicy::Supersede);
        assert_eq!(
            CancelPolicy::of(&Request::get_one("posts", 1, None).with_cancel_previous(false)),
            CancelPolicy::Concurrent
        );
        assert_eq!(
            CancelPolicy::of(&Request::create("posts", json!({}), None)),
            CancelPolicy::Concurrent
        );
    }

    #[test]
    fn test_register_cancels_previous_of_same_kind_only() {
        let mut registry = SupersedeRegistry::default();
        let first = CancellationToken::new();
        let other_kind = CancellationToken::new();
        assert_eq!(registry.register(RequestKind::GetOne, 1, first.clone()), None);
        assert_eq!(registry.register(RequestKind::GetList, 2, other_kind.clone()), None);
        assert_eq!(registry.register(RequestKind::GetOne, 3, CancellationToken::new()), Some(1));

        assert!(first.is_cancelled());
        assert!(!other_kind.is_cancelled());
        assert_eq!(registry.in_flight(RequestKind::GetOne), Some(3));
    }

    #[test]
    fn test_release_of_superseded_task_keeps_newer_slot() {
        let mut registry = SupersedeRegistry::default();
        registry.register(RequestKind::GetOne, 1, CancellationToken::new());
        registry.register(RequestKind::GetOne, 2, CancellationToken::new());

        registry.release(RequestKind::GetOne, 1);
        assert_eq!(registry.in_flight(RequestKind::GetOne), Some(2));

        registry.release(RequestKind::GetOne, 2);
        assert_eq!(registry.in_flight(RequestKind::GetOne), None);
    }
}
