use std::fmt;

use thiserror::Error;

use crate::filter::FilterRejection;
use crate::secret::Sensitive;
use crate::validation::FieldViolation;

/// Convenience alias for results carrying the dispatch error taxonomy.
pub type DispatchResult<T> = Result<T, Error>;

/// Every failure a dispatch can end in.
///
/// Each pipeline stage returns one of these as an explicit value; the
/// [`Dispatcher`](crate::Dispatcher) performs a single exhaustive match over
/// them to produce a [`FailurePayload`](crate::FailurePayload).
#[derive(Debug, Error)]
pub enum Error {
    /// A transport value could not be converted into the request type.
    #[error(transparent)]
    Binding(#[from] BindingError),

    /// One or more validators rejected the bound request.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The caller was not authenticated or a policy denied access.
    #[error(transparent)]
    Violation(#[from] Violation),

    /// No descriptor for the route, or the verb is not supported there.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// An endpoint filter rejected the request before binding.
    #[error("request rejected by filter '{filter}': {}", rejection.detail)]
    Filter {
        /// Name of the rejecting filter.
        filter: String,
        /// What the filter answered.
        rejection: FilterRejection,
    },

    /// The handler reported a failure from its own error surface.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The cancellation token fired before the handler started.
    #[error("request cancelled before the handler ran")]
    Cancelled,

    /// Anything outside the taxonomy above.
    #[error(transparent)]
    Unhandled(#[from] UnhandledError),
}

impl From<HandlerError> for Error {
    fn from(err: HandlerError) -> Self {
        match err {
            HandlerError::Domain(domain) => Error::Domain(domain),
            HandlerError::Internal(source) => Error::Unhandled(UnhandledError::from(source)),
        }
    }
}

/// A raw transport value that could not be bound to its request field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// The raw string did not convert to the declared field type.
    #[error("value '{raw}' for field '{field}' is not a valid {expected}")]
    Conversion {
        /// Declared field name.
        field: String,
        /// Raw value as received.
        raw: String,
        /// Name of the declared type.
        expected: &'static str,
    },

    /// The request body could not be decoded.
    #[error("request body could not be decoded: {reason}")]
    Body {
        /// Decoder message.
        reason: String,
    },

    /// The request type does not accept a field the descriptor binds.
    #[error("field '{field}' is not accepted by the request type")]
    UnknownField {
        /// Field name from the binding spec.
        field: String,
    },

    /// The converted value does not fit the field it was assigned to.
    #[error("field '{field}' cannot hold a {found} value")]
    TypeMismatch {
        /// Field name from the binding spec.
        field: String,
        /// Kind of the converted value.
        found: &'static str,
    },
}

impl BindingError {
    /// Builds the error a request type returns for a field it does not know.
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
        }
    }

    /// The field the error concerns; `body` for body decoding failures.
    pub fn field(&self) -> &str {
        match self {
            Self::Conversion { field, .. }
            | Self::UnknownField { field }
            | Self::TypeMismatch { field, .. } => field,
            Self::Body { .. } => "body",
        }
    }
}

/// The complete, ordered set of violations reported by a request's validators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed with {} violation(s)", violations.len())]
pub struct ValidationError {
    violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub(crate) fn new(violations: Vec<FieldViolation>) -> Self {
        Self { violations }
    }

    /// Violations in validator-declaration order.
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Just the messages, in order.
    pub fn messages(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.message.as_str()).collect()
    }
}

/// An access violation raised by the authorization stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct Violation {
    /// The kind of violation that occurred
    pub kind: ViolationKind,
    /// Human-readable message explaining the violation
    pub message: String,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// The kind of access violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// Authentication is required but the caller is not authenticated
    Unauthenticated,
    /// A named policy rejected the authenticated caller
    Forbidden {
        /// The policy that said no
        policy: String,
    },
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Unauthenticated => write!(f, "Unauthenticated"),
            ViolationKind::Forbidden { policy } => write!(f, "Forbidden by policy '{}'", policy),
        }
    }
}

/// Route resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No registered template matches the path.
    #[error("no endpoint is registered for '{route}'")]
    RouteNotFound {
        /// Requested path.
        route: String,
    },

    /// The path matched, but not for this verb.
    #[error("method {method} is not allowed for '{route}'")]
    MethodNotAllowed {
        /// Requested path.
        route: String,
        /// Requested verb.
        method: String,
    },

    /// The verb is outside GET, POST, PUT, PATCH and DELETE.
    #[error("http method '{method}' is not supported")]
    UnsupportedMethod {
        /// Verb as received.
        method: String,
    },
}

/// A failure from the handler's own error surface, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{title}: {detail}")]
pub struct DomainError {
    /// HTTP status the handler chose.
    pub status: u16,
    /// Short summary.
    pub title: String,
    /// Caller-facing explanation.
    pub detail: String,
}

impl DomainError {
    /// Creates a domain error with the given status. A status outside
    /// 400..=599 becomes 500.
    pub fn new(status: u16, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            status: error_status(status),
            title: title.into(),
            detail: detail.into(),
        }
    }

    /// A 404 for a missing domain object.
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(404, "Not Found", detail)
    }

    /// A 409 for a state conflict.
    pub fn conflict(detail: impl Into<String>) -> Self {
        Self::new(409, "Conflict", detail)
    }
}

/// `status` when it is a client or server error, 500 otherwise.
pub(crate) fn error_status(status: u16) -> u16 {
    if (400..=599).contains(&status) {
        status
    } else {
        500
    }
}

/// What a handler may fail with.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Part of the domain's error surface; reaches the caller with its status.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Anything else; reported to the caller as an unhandled fault.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// A fault outside the taxonomy. Its detail never reaches `Debug`, `Display`
/// or the failure payload.
#[derive(Debug, Error)]
#[error("unhandled fault: {detail}")]
pub struct UnhandledError {
    detail: Sensitive<String>,
}

impl UnhandledError {
    /// Wraps an internal detail message.
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Sensitive::new(detail.into()),
        }
    }

    /// The protected detail, for server-side logging only.
    pub fn detail(&self) -> &Sensitive<String> {
        &self.detail
    }
}

impl From<anyhow::Error> for UnhandledError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(format!("{err:#}"))
    }
}

/// Startup failures raised while building the descriptor registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// An equivalent (route, verb) pair is already registered.
    #[error("{method} {route} is already registered")]
    DuplicateRoute {
        /// Route template of the rejected descriptor.
        route: String,
        /// Verb of the rejected descriptor.
        method: String,
    },

    /// The descriptor cannot be served as declared.
    #[error("descriptor for {route} is malformed: {reason}")]
    MalformedDescriptor {
        /// Route template of the rejected descriptor.
        route: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl RegistryError {
    pub(crate) fn malformed(route: &str, reason: impl Into<String>) -> Self {
        Self::MalformedDescriptor {
            route: route.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_error_names_its_field() {
        let err = BindingError::Conversion {
            field: "id".to_string(),
            raw: "not-a-guid".to_string(),
            expected: "uuid",
        };
        assert_eq!(err.field(), "id");
        assert_eq!(
            err.to_string(),
            "value 'not-a-guid' for field 'id' is not a valid uuid"
        );

        let body = BindingError::Body {
            reason: "EOF".to_string(),
        };
        assert_eq!(body.field(), "body");
    }

    #[test]
    fn violation_display_includes_kind() {
        let v = Violation::new(
            ViolationKind::Forbidden {
                policy: "CanEdit".to_string(),
            },
            "denied",
        );
        assert_eq!(v.to_string(), "Forbidden by policy 'CanEdit': denied");
    }

    #[test]
    fn unhandled_error_never_prints_detail() {
        let err = UnhandledError::new("connection string postgres://admin:hunter2@db");
        assert!(!err.to_string().contains("hunter2"));
        assert!(!format!("{:?}", err).contains("hunter2"));
        assert!(err.detail().expose().contains("hunter2"));
    }

    #[test]
    fn handler_errors_split_into_domain_and_unhandled() {
        let domain: Error = HandlerError::from(DomainError::not_found("no such role")).into();
        assert!(matches!(domain, Error::Domain(ref d) if d.status == 404));

        let internal: Error = HandlerError::from(anyhow::anyhow!("disk on fire")).into();
        assert!(matches!(internal, Error::Unhandled(_)));
    }

    #[test]
    fn domain_errors_only_carry_error_statuses() {
        assert_eq!(DomainError::new(200, "OK", "fine").status, 500);
        assert_eq!(DomainError::new(302, "Found", "elsewhere").status, 500);
        assert_eq!(DomainError::new(0, "Zero", "none").status, 500);
        assert_eq!(DomainError::new(422, "Unprocessable", "bad").status, 422);
        assert_eq!(DomainError::new(503, "Unavailable", "later").status, 503);
    }

    #[test]
    fn validation_error_keeps_order() {
        let err = ValidationError::new(vec![
            FieldViolation::new("name", "Name is required."),
            FieldViolation::new("name", "Name cannot be longer than 10 characters."),
        ]);
        assert_eq!(
            err.messages(),
            vec![
                "Name is required.",
                "Name cannot be longer than 10 characters."
            ]
        );
        assert_eq!(err.to_string(), "validation failed with 2 violation(s)");
    }
}
