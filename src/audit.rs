//! Audit records of dispatch outcomes.
//!
//! This module provides:
//! - `AuditEvent`: structured record of one dispatch
//! - `AuditSink`: where the dispatcher sends events
//! - `AuditTrail`: in-memory, thread-safe sink
//!
//! Every event is also emitted through `tracing` whether or not a sink is
//! configured.

mod event;
mod trail;

pub use event::{AuditEvent, AuditEventKind, AuditOutcome};
pub use trail::AuditTrail;

/// Receives one event per dispatch.
pub trait AuditSink: Send + Sync {
    /// Stores or forwards `event`. Must not block for long.
    fn record(&self, event: AuditEvent);
}
