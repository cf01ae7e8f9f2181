use tokio_util::sync::CancellationToken;

use crate::logging::RequestLog;
use crate::method::HttpMethod;
use crate::redact::roles_of;
use crate::request::{Principal, RoleSet};

/// Everything one dispatch carries through the pipeline.
///
/// Built by the [`Dispatcher`](crate::Dispatcher) once the route is
/// resolved and dropped when the call returns. Nothing in it is shared
/// with other calls.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    request_id: String,
    principal: Option<Principal>,
    cancel: CancellationToken,
    route: String,
    method: HttpMethod,
}

impl DispatchContext {
    pub(crate) fn new(
        request_id: String,
        principal: Option<Principal>,
        cancel: CancellationToken,
        route: String,
        method: HttpMethod,
    ) -> Self {
        Self {
            request_id,
            principal,
            cancel,
            route,
            method,
        }
    }

    /// Request id.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Caller, if the transport supplied one.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// The caller's roles for redaction. Empty when there is no
    /// authenticated principal.
    pub fn roles(&self) -> &RoleSet {
        roles_of(self.principal.as_ref())
    }

    /// Cancellation signal for this call.
    pub fn cancel(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Requested path.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Requested verb.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Logger stamped with this request's id.
    pub fn log(&self) -> RequestLog<'_> {
        RequestLog::new(&self.request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(principal: Option<Principal>) -> DispatchContext {
        DispatchContext::new(
            "req-1".to_string(),
            principal,
            CancellationToken::new(),
            "/company/1".to_string(),
            HttpMethod::Get,
        )
    }

    #[test]
    fn no_principal_has_no_roles() {
        assert!(ctx(None).roles().is_empty());
    }

    #[test]
    fn authenticated_principal_lends_its_roles() {
        let c = ctx(Some(Principal::authenticated("u").with_role("Manager")));
        assert!(c.roles().contains("Manager"));
        assert_eq!(c.principal().and_then(Principal::id), Some("u"));
    }

    #[test]
    fn logger_shares_the_request_id() {
        let c = ctx(None);
        assert_eq!(c.log().request_id(), "req-1");
        assert_eq!(c.route(), "/company/1");
        assert_eq!(c.method(), HttpMethod::Get);
        assert!(!c.cancel().is_cancelled());
    }
}
