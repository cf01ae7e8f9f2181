//! Request adapter for mapping HTTP requests to dispatch inputs.

use crate::binder::ValueSources;
use crate::request::{Principal, RequestMeta};

use super::ExtractSources;

/// Owned, framework-agnostic snapshot of an HTTP request.
///
/// Framework-specific code should implement `From<FrameworkRequest>` for
/// `RequestAdapter`, or fill one in with the setters below.
///
/// # Examples
///
/// ```
/// use dispatch_core::web::{ExtractSources, RequestAdapter};
/// use dispatch_core::Principal;
///
/// let mut adapter = RequestAdapter::new("req-12345", "PUT", "/role/update/7");
/// adapter.set_principal(Some(Principal::authenticated("user-1").with_role("Admin")));
/// adapter.add_query_param("dryRun", "true");
/// adapter.set_body(r#"{"Name":"Auditor"}"#);
///
/// let meta = adapter.request_meta();
/// assert_eq!(meta.request_id, "req-12345");
///
/// let sources = adapter.value_sources();
/// assert_eq!(sources.query_value("dryRun").as_deref(), Some("true"));
/// assert!(sources.has_body());
/// ```
#[derive(Debug, Clone)]
pub struct RequestAdapter {
    request_id: String,
    method: String,
    path: String,
    principal: Option<Principal>,
    /// In arrival order; repeats are kept
    query_params: Vec<(String, String)>,
    /// Values a framework router already captured
    path_params: Vec<(String, String)>,
    body: Vec<u8>,
}

impl RequestAdapter {
    /// Creates an adapter with no principal, parameters or body.
    pub fn new(request_id: impl Into<String>, method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            method: method.into(),
            path: path.into(),
            principal: None,
            query_params: Vec::new(),
            path_params: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Sets the caller. Call after the framework has authenticated it.
    pub fn set_principal(&mut self, principal: Option<Principal>) {
        self.principal = principal;
    }

    /// Adds a query parameter. Repeated keys are all kept.
    pub fn add_query_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query_params.push((key.into(), value.into()));
    }

    /// Adds a path parameter captured by the framework's own router.
    pub fn add_path_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.path_params.push((key.into(), value.into()));
    }

    /// Sets the raw body.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    /// Returns the request id.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the caller, if present.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }
}

impl ExtractSources for RequestAdapter {
    fn request_meta(&self) -> RequestMeta {
        RequestMeta {
            request_id: self.request_id.clone(),
            principal: self.principal.clone(),
        }
    }

    fn route(&self) -> &str {
        &self.path
    }

    fn method(&self) -> &str {
        &self.method
    }

    fn value_sources(&self) -> ValueSources {
        let mut sources = ValueSources::new().with_body(self.body.clone());
        for (key, value) in &self.path_params {
            sources.add_route_value(key.clone(), value.clone());
        }
        for (key, value) in &self.query_params {
            sources.add_query_value(key.clone(), value.clone());
        }
        sources
    }
}
