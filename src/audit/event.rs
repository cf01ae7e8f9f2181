//! Audit event schema.
//!
//! Events carry identifiers and outcome metadata only: no request bodies,
//! no query values, no fault details.

use std::fmt;

use crate::error::{Error, ViolationKind};
use crate::failure::StatusClass;
use crate::method::HttpMethod;

/// Pipeline stage an audit event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEventKind {
    /// Route resolution and verb checks
    Routing,
    /// Endpoint filters
    Filtering,
    /// Authentication check
    Authentication,
    /// Policy decisions
    Authorization,
    /// Parameter binding
    Binding,
    /// Validators
    Validation,
    /// Handler invocation and response production
    Handling,
}

impl fmt::Display for AuditEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEventKind::Routing => write!(f, "routing"),
            AuditEventKind::Filtering => write!(f, "filtering"),
            AuditEventKind::Authentication => write!(f, "authentication"),
            AuditEventKind::Authorization => write!(f, "authorization"),
            AuditEventKind::Binding => write!(f, "binding"),
            AuditEventKind::Validation => write!(f, "validation"),
            AuditEventKind::Handling => write!(f, "handling"),
        }
    }
}

/// How a dispatch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    /// The handler ran and its response was returned
    Success,
    /// Access was refused
    Denied,
    /// The request was invalid or unroutable
    Rejected,
    /// The caller went away first
    Cancelled,
    /// The handler or the dispatcher failed
    Error,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Success => write!(f, "success"),
            AuditOutcome::Denied => write!(f, "denied"),
            AuditOutcome::Rejected => write!(f, "rejected"),
            AuditOutcome::Cancelled => write!(f, "cancelled"),
            AuditOutcome::Error => write!(f, "error"),
        }
    }
}

/// One audited dispatch.
///
/// # Example
///
/// ```
/// use dispatch_core::audit::{AuditEvent, AuditEventKind, AuditOutcome};
/// use dispatch_core::HttpMethod;
///
/// let event = AuditEvent::new(
///     "req-123",
///     Some("alice"),
///     AuditEventKind::Handling,
///     AuditOutcome::Success,
/// )
/// .with_method(HttpMethod::Get)
/// .with_route("/company/42")
/// .with_status(200);
///
/// assert_eq!(event.request_id(), "req-123");
/// assert_eq!(event.principal(), Some("alice"));
/// assert_eq!(event.status(), Some(200));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Request identifier for correlation
    request_id: String,
    /// Caller id; None for anonymous calls
    principal: Option<String>,
    kind: AuditEventKind,
    outcome: AuditOutcome,
    /// Verb, once parsed
    method: Option<HttpMethod>,
    /// Requested path without query string
    route: Option<String>,
    status: Option<u16>,
    /// Set for failures only
    class: Option<StatusClass>,
}

impl AuditEvent {
    /// Creates an event with the required fields.
    pub fn new(
        request_id: impl Into<String>,
        principal: Option<impl Into<String>>,
        kind: AuditEventKind,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            principal: principal.map(Into::into),
            kind,
            outcome,
            method: None,
            route: None,
            status: None,
            class: None,
        }
    }

    /// Builds the event for a failed dispatch.
    pub fn for_failure(
        request_id: impl Into<String>,
        principal: Option<impl Into<String>>,
        err: &Error,
    ) -> Self {
        let (kind, outcome) = classify(err);
        Self::new(request_id, principal, kind, outcome)
    }

    /// Sets the verb.
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the requested path.
    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }

    /// Sets the reported HTTP status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the failure class.
    pub fn with_class(mut self, class: StatusClass) -> Self {
        self.class = Some(class);
        self
    }

    /// Returns the request identifier.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the caller id, if any.
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// Returns the stage.
    pub fn kind(&self) -> AuditEventKind {
        self.kind
    }

    /// Returns the outcome.
    pub fn outcome(&self) -> AuditOutcome {
        self.outcome
    }

    /// Returns the verb, if set.
    pub fn method(&self) -> Option<HttpMethod> {
        self.method
    }

    /// Returns the route, if set.
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Returns the status, if set.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns the failure class, if set.
    pub fn class(&self) -> Option<StatusClass> {
        self.class
    }

    /// Emits the event through `tracing` at info level.
    pub fn emit(&self) {
        tracing::info!(
            target: "dispatch::audit",
            request_id = %self.request_id,
            principal = self.principal.as_deref().unwrap_or("<none>"),
            kind = %self.kind,
            outcome = %self.outcome,
            method = self.method.map(HttpMethod::as_str),
            route = self.route.as_deref(),
            status = self.status,
            class = self.class.map(StatusClass::as_str),
            "audit"
        );
    }
}

fn classify(err: &Error) -> (AuditEventKind, AuditOutcome) {
    match err {
        Error::Dispatch(_) => (AuditEventKind::Routing, AuditOutcome::Rejected),
        Error::Filter { .. } => (AuditEventKind::Filtering, AuditOutcome::Denied),
        Error::Violation(v) => match v.kind {
            ViolationKind::Unauthenticated => (AuditEventKind::Authentication, AuditOutcome::Denied),
            ViolationKind::Forbidden { .. } => (AuditEventKind::Authorization, AuditOutcome::Denied),
        },
        Error::Binding(_) => (AuditEventKind::Binding, AuditOutcome::Rejected),
        Error::Validation(_) => (AuditEventKind::Validation, AuditOutcome::Rejected),
        Error::Domain(_) => (AuditEventKind::Handling, AuditOutcome::Rejected),
        Error::Cancelled => (AuditEventKind::Handling, AuditOutcome::Cancelled),
        Error::Unhandled(_) => (AuditEventKind::Handling, AuditOutcome::Error),
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuditEvent[kind={}, outcome={}, request_id={}, principal={}",
            self.kind,
            self.outcome,
            self.request_id,
            self.principal.as_deref().unwrap_or("<none>")
        )?;

        if let Some(method) = self.method {
            write!(f, ", method={}", method)?;
        }
        if let Some(route) = &self.route {
            write!(f, ", route={}", route)?;
        }
        if let Some(status) = self.status {
            write!(f, ", status={}", status)?;
        }
        if let Some(class) = self.class {
            write!(f, ", class={}", class)?;
        }

        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BindingError, UnhandledError, Violation};

    #[test]
    fn audit_outcome_display() {
        assert_eq!(AuditOutcome::Success.to_string(), "success");
        assert_eq!(AuditOutcome::Cancelled.to_string(), "cancelled");
        assert_eq!(AuditEventKind::Authorization.to_string(), "authorization");
    }

    #[test]
    fn failures_are_classified_by_stage() {
        let unauth = AuditEvent::for_failure(
            "req-1",
            None::<String>,
            &Error::Violation(Violation::new(ViolationKind::Unauthenticated, "who?")),
        );
        assert_eq!(unauth.kind(), AuditEventKind::Authentication);
        assert_eq!(unauth.outcome(), AuditOutcome::Denied);

        let binding = AuditEvent::for_failure(
            "req-2",
            Some("alice"),
            &Error::Binding(BindingError::unknown_field("x")),
        );
        assert_eq!(binding.kind(), AuditEventKind::Binding);
        assert_eq!(binding.outcome(), AuditOutcome::Rejected);

        let fault = AuditEvent::for_failure(
            "req-3",
            Some("alice"),
            &Error::Unhandled(UnhandledError::new("boom")),
        );
        assert_eq!(fault.outcome(), AuditOutcome::Error);
    }

    #[test]
    fn display_lists_set_fields_only() {
        let event = AuditEvent::new("req-9", None::<String>, AuditEventKind::Routing, AuditOutcome::Rejected)
            .with_route("/nowhere")
            .with_status(404)
            .with_class(StatusClass::RouteNotFound);

        let display = event.to_string();
        assert!(display.contains("principal=<none>"));
        assert!(display.contains("route=/nowhere"));
        assert!(display.contains("class=route-not-found"));
        assert!(!display.contains("method="));
    }

    #[test]
    fn fault_detail_never_reaches_the_event() {
        let err = Error::Unhandled(UnhandledError::new("secret=hunter2"));
        let event = AuditEvent::for_failure("req-4", Some("bob"), &err);
        assert!(!event.to_string().contains("hunter2"));
        assert!(!format!("{:?}", event).contains("hunter2"));
    }
}
