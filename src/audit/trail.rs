//! In-memory audit trail.

use parking_lot::Mutex;

use super::{AuditEvent, AuditSink};

/// Thread-safe in-memory recorder for audit events.
///
/// Useful for tests and for embedding applications that ship events
/// elsewhere in batches.
///
/// # Example
///
/// ```
/// use dispatch_core::audit::{AuditEvent, AuditEventKind, AuditOutcome, AuditSink, AuditTrail};
///
/// let trail = AuditTrail::new();
/// trail.record(AuditEvent::new(
///     "req-123",
///     Some("alice"),
///     AuditEventKind::Handling,
///     AuditOutcome::Success,
/// ));
///
/// assert_eq!(trail.events().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct AuditTrail {
    events: Mutex<Vec<AuditEvent>>,
}

impl AuditTrail {
    /// Creates an empty trail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the recorded events, oldest first.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    /// Returns the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drops every recorded event.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl AuditSink for AuditTrail {
    fn record(&self, event: AuditEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditEventKind, AuditOutcome};
    use std::sync::Arc;

    #[test]
    fn audit_trail_starts_empty() {
        let trail = AuditTrail::new();
        assert!(trail.is_empty());
        assert_eq!(trail.len(), 0);
    }

    #[test]
    fn audit_trail_keeps_order_and_clears() {
        let trail = AuditTrail::new();
        trail.record(AuditEvent::new(
            "req-1",
            Some("a"),
            AuditEventKind::Handling,
            AuditOutcome::Success,
        ));
        trail.record(AuditEvent::new(
            "req-2",
            None::<String>,
            AuditEventKind::Authentication,
            AuditOutcome::Denied,
        ));

        let events = trail.events();
        assert_eq!(events[0].request_id(), "req-1");
        assert_eq!(events[1].request_id(), "req-2");

        trail.clear();
        assert!(trail.is_empty());
    }

    #[test]
    fn audit_trail_accepts_concurrent_writers() {
        let trail = Arc::new(AuditTrail::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let trail = Arc::clone(&trail);
                std::thread::spawn(move || {
                    trail.record(AuditEvent::new(
                        format!("req-{i}"),
                        None::<String>,
                        AuditEventKind::Routing,
                        AuditOutcome::Rejected,
                    ));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(trail.len(), 8);
    }
}
