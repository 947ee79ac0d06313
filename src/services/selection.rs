//! Tags in-flight requests so a response for a superseded selection can be
//! told apart from the current one.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Identifies one request issued for a selected location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub seq: u64,
    pub location: String,
}

#[derive(Debug, Default)]
pub struct SelectionTracker {
    current: AtomicU64,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `location` as the current selection and returns its ticket.
    /// Every earlier ticket becomes stale.
    pub fn begin(&self, location: &str) -> Ticket {
        let seq = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        Ticket {
            seq,
            location: location.to_string(),
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.current.load(Ordering::Acquire) == ticket.seq
    }

    /// Passes `value` through only if `ticket` is still current.
    pub fn accept<T>(&self, ticket: &Ticket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            debug!(
                seq = ticket.seq,
                location = %ticket.location,
                "Discarding response for superseded selection"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_ticket_wins() {
        let tracker = SelectionTracker::new();
        let first = tracker.begin("Canmore Alberta");
        let second = tracker.begin("Bangkok Thailand");

        assert!(second.seq > first.seq);
        assert!(!tracker.is_current(&first));
        assert!(tracker.is_current(&second));
        assert_eq!(tracker.accept(&first, 1), None);
        assert_eq!(tracker.accept(&second, 2), Some(2));
    }

    #[test]
    fn test_reselecting_same_location_still_supersedes() {
        let tracker = SelectionTracker::new();
        let first = tracker.begin("Canmore Alberta");
        let again = tracker.begin("Canmore Alberta");

        assert_eq!(tracker.accept(&first, "stale"), None);
        assert_eq!(tracker.accept(&again, "fresh"), Some("fresh"));
    }
}
