//! Process-wide count of requests in flight.

use crate::model::Phase;

/// Number of started requests that have not reached a terminal phase yet.
///
/// Clamped at zero: terminal events of concurrent tasks can be observed out
/// of order, and a stray one must not drive the count negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadingCounter(u64);

impl LoadingCounter {
    pub fn count(&self) -> u64 {
        self.0
    }

    pub fn is_loading(&self) -> bool {
        self.0 > 0
    }

    pub fn apply(self, phase: &Phase) -> Self {
        match phase {
            Phase::Start => LoadingCounter(self.0 + 1),
            Phase::Success(_) | Phase::Failure(_) | Phase::Cancel => {
                LoadingCounter(self.0.saturating_sub(1))
            }
        }
    }
}
