//! Named endpoint filters that run before binding.

use async_trait::async_trait;

use crate::binder::ValueSources;
use crate::descriptor::EndpointDescriptor;
use crate::request::Principal;

/// What a filter answered when it stopped a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRejection {
    /// HTTP status to report.
    pub status: u16,
    /// Caller-facing explanation.
    pub detail: String,
}

impl FilterRejection {
    /// Creates a rejection.
    pub fn new(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

/// Outcome of one filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterAction {
    /// Let the request through to the next filter.
    Continue,
    /// Stop the request here.
    Reject(FilterRejection),
}

/// What a filter can see of a request.
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    /// Request id.
    pub request_id: &'a str,
    /// The endpoint being called.
    pub descriptor: &'a EndpointDescriptor,
    /// Raw values, route values already merged.
    pub sources: &'a ValueSources,
    /// Caller, if any.
    pub principal: Option<&'a Principal>,
}

/// A pre-binding gate referenced by name from descriptors.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use dispatch_core::{EndpointFilter, FilterAction, FilterContext, FilterRejection};
///
/// struct RequireTenant;
///
/// #[async_trait]
/// impl EndpointFilter for RequireTenant {
///     async fn on_request(&self, ctx: FilterContext<'_>) -> FilterAction {
///         match ctx.sources.query_value("tenant") {
///             Some(_) => FilterAction::Continue,
///             None => FilterAction::Reject(FilterRejection::new(400, "tenant is required")),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait EndpointFilter: Send + Sync {
    /// Decides whether the request may proceed.
    async fn on_request(&self, ctx: FilterContext<'_>) -> FilterAction;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::HttpMethod;

    struct RejectDeletes;

    #[async_trait]
    impl EndpointFilter for RejectDeletes {
        async fn on_request(&self, ctx: FilterContext<'_>) -> FilterAction {
            if ctx.descriptor.method() == HttpMethod::Delete {
                FilterAction::Reject(FilterRejection::new(423, "locked"))
            } else {
                FilterAction::Continue
            }
        }
    }

    #[tokio::test]
    async fn filters_see_the_descriptor() {
        let descriptor = crate::registry::tests::descriptor_for("/lock", HttpMethod::Delete);
        let sources = ValueSources::new();
        let ctx = FilterContext {
            request_id: "req-1",
            descriptor: &descriptor,
            sources: &sources,
            principal: None,
        };
        assert_eq!(
            RejectDeletes.on_request(ctx).await,
            FilterAction::Reject(FilterRejection::new(423, "locked"))
        );
    }
}
