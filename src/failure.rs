//! The standard failure payload.

use serde::{Deserialize, Serialize};

use crate::error::{error_status, DispatchError, Error, ViolationKind};
use crate::validation::FieldViolation;

/// Message used for every fault outside the taxonomy.
pub const UNHANDLED_DETAIL: &str = "An unexpected error occurred.";

/// Category of a failed dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusClass {
    /// A raw value could not be bound.
    ClientBindingError,
    /// The endpoint needs an authenticated caller.
    AuthenticationRequired,
    /// A policy refused the caller.
    AuthorizationDenied,
    /// Validators rejected the request.
    ValidationFailed,
    /// The verb is unsupported or not registered for the route.
    MethodNotSupported,
    /// No template matches the route.
    RouteNotFound,
    /// An endpoint filter stopped the request.
    FilterRejected,
    /// The handler reported a domain failure.
    DomainError,
    /// The caller cancelled before the handler ran.
    RequestCancelled,
    /// Anything else.
    UnhandledFault,
}

impl StatusClass {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            StatusClass::ClientBindingError => "client-binding-error",
            StatusClass::AuthenticationRequired => "authentication-required",
            StatusClass::AuthorizationDenied => "authorization-denied",
            StatusClass::ValidationFailed => "validation-failed",
            StatusClass::MethodNotSupported => "method-not-supported",
            StatusClass::RouteNotFound => "route-not-found",
            StatusClass::FilterRejected => "filter-rejected",
            StatusClass::DomainError => "domain-error",
            StatusClass::RequestCancelled => "request-cancelled",
            StatusClass::UnhandledFault => "unhandled-fault",
        }
    }
}

impl std::fmt::Display for StatusClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Problem-details-shaped description of a failed dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailurePayload {
    /// Category.
    pub class: StatusClass,
    /// HTTP status.
    pub status: u16,
    /// Short summary.
    pub title: String,
    /// Caller-facing explanation.
    pub detail: String,
    /// Every validation violation, for `validation-failed` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldViolation>>,
}

impl FailurePayload {
    fn new(class: StatusClass, status: u16, title: &str, detail: impl Into<String>) -> Self {
        Self {
            class,
            status,
            title: title.to_string(),
            detail: detail.into(),
            errors: None,
        }
    }
}

impl From<&Error> for FailurePayload {
    fn from(err: &Error) -> Self {
        match err {
            Error::Binding(e) => {
                FailurePayload::new(StatusClass::ClientBindingError, 400, "Bad Request", e.to_string())
            }
            Error::Validation(e) => FailurePayload {
                errors: Some(e.violations().to_vec()),
                ..FailurePayload::new(
                    StatusClass::ValidationFailed,
                    400,
                    "Validation Failed",
                    "One or more validation errors occurred.",
                )
            },
            Error::Violation(v) => match &v.kind {
                ViolationKind::Unauthenticated => FailurePayload::new(
                    StatusClass::AuthenticationRequired,
                    401,
                    "Unauthorized",
                    v.message.clone(),
                ),
                ViolationKind::Forbidden { .. } => FailurePayload::new(
                    StatusClass::AuthorizationDenied,
                    403,
                    "Forbidden",
                    v.message.clone(),
                ),
            },
            Error::Dispatch(e @ DispatchError::RouteNotFound { .. }) => {
                FailurePayload::new(StatusClass::RouteNotFound, 404, "Not Found", e.to_string())
            }
            Error::Dispatch(
                e @ (DispatchError::MethodNotAllowed { .. } | DispatchError::UnsupportedMethod { .. }),
            ) => FailurePayload::new(
                StatusClass::MethodNotSupported,
                405,
                "Method Not Allowed",
                e.to_string(),
            ),
            Error::Filter { rejection, .. } => FailurePayload::new(
                StatusClass::FilterRejected,
                rejection.status,
                "Request Rejected",
                rejection.detail.clone(),
            ),
            Error::Domain(e) => {
                FailurePayload::new(
                    StatusClass::DomainError,
                    error_status(e.status),
                    &e.title,
                    e.detail.clone(),
                )
            }
            Error::Cancelled => FailurePayload::new(
                StatusClass::RequestCancelled,
                499,
                "Client Closed Request",
                "The request was cancelled.",
            ),
            Error::Unhandled(_) => FailurePayload::new(
                StatusClass::UnhandledFault,
                500,
                "Internal Server Error",
                UNHANDLED_DETAIL,
            ),
        }
    }
}

impl From<Error> for FailurePayload {
    fn from(err: Error) -> Self {
        FailurePayload::from(&err)
    }
}
