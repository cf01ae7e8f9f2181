//! Extraction boundary trait for transport integration.

use crate::binder::ValueSources;
use crate::request::RequestMeta;

/// Extracts everything a dispatch needs from a framework-specific request.
///
/// # Design Notes
///
/// Implementations only map framework types to core types. They do not
/// authorize, validate or decode bodies.
///
/// # Examples
///
/// ```
/// use dispatch_core::web::ExtractSources;
/// use dispatch_core::{Principal, RequestMeta, ValueSources};
///
/// struct MyFrameworkRequest {
///     id: String,
///     path: String,
///     user: Option<String>,
/// }
///
/// impl ExtractSources for MyFrameworkRequest {
///     fn request_meta(&self) -> RequestMeta {
///         RequestMeta {
///             request_id: self.id.clone(),
///             principal: self.user.as_deref().map(Principal::authenticated),
///         }
///     }
///
///     fn route(&self) -> &str {
///         &self.path
///     }
///
///     fn method(&self) -> &str {
///         "GET"
///     }
///
///     fn value_sources(&self) -> ValueSources {
///         ValueSources::new()
///     }
/// }
/// ```
pub trait ExtractSources {
    /// Request id and caller. An empty request id is replaced by the
    /// dispatcher.
    fn request_meta(&self) -> RequestMeta;

    /// Concrete request path, without query string.
    fn route(&self) -> &str;

    /// HTTP verb as sent by the client.
    fn method(&self) -> &str;

    /// Query values and body bytes. Route values are captured by the
    /// dispatcher, but any supplied here are kept unless the path
    /// overrides them.
    fn value_sources(&self) -> ValueSources;
}
