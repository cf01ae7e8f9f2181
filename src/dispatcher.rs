//! The dispatch entry point.
//!
//! Resolves a route, runs its filters, binds the request, drives the
//! pipeline and serializes the result. Every failure leaves as a
//! [`FailurePayload`].

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::audit::{AuditEvent, AuditEventKind, AuditOutcome, AuditSink};
use crate::binder::{Binder, BodyDecoder, ValueSources};
use crate::config::DispatcherConfig;
use crate::context::DispatchContext;
use crate::error::Error;
use crate::failure::FailurePayload;
use crate::filter::{FilterAction, FilterContext};
use crate::gate::{AuthorizationProvider, DenyAllPolicies};
use crate::logging::RequestLog;
use crate::method::HttpMethod;
use crate::pipeline::{until_cancelled, Pipeline};
use crate::registry::Registry;
use crate::request::Principal;
use crate::web::ExtractSources;

const UNASSIGNED_REQUEST_ID: &str = "unassigned";

/// A successful dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResponse {
    /// Always 200.
    pub status: u16,
    /// The redacted, serialized response.
    pub body: Value,
}

/// Routes calls to registered endpoints.
///
/// Cheap to share: the registry sits behind an `Arc` and nothing is
/// mutated while dispatching.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use dispatch_core::{Dispatcher, Registry, ValueSources};
/// use tokio_util::sync::CancellationToken;
///
/// let registry = Arc::new(Registry::builder().publish().unwrap());
/// let dispatcher = Dispatcher::new(registry);
///
/// let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// let failure = rt
///     .block_on(dispatcher.dispatch(
///         "/nowhere",
///         "GET",
///         ValueSources::new(),
///         None,
///         CancellationToken::new(),
///     ))
///     .unwrap_err();
/// assert_eq!(failure.status, 404);
/// ```
pub struct Dispatcher {
    registry: Arc<Registry>,
    config: DispatcherConfig,
    authorizer: Arc<dyn AuthorizationProvider>,
    binder: Binder,
    audit: Option<Arc<dyn AuditSink>>,
}

impl Dispatcher {
    /// Creates a dispatcher with default configuration. Named policies are
    /// denied until an authorizer is supplied.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            config: DispatcherConfig::default(),
            authorizer: Arc::new(DenyAllPolicies),
            binder: Binder::default(),
            audit: None,
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the policy decision provider.
    pub fn with_authorizer(mut self, authorizer: Arc<dyn AuthorizationProvider>) -> Self {
        self.authorizer = authorizer;
        self
    }

    /// Replaces the JSON body decoder.
    pub fn with_body_decoder(mut self, decoder: Arc<dyn BodyDecoder>) -> Self {
        self.binder = Binder::new(decoder);
        self
    }

    /// Sends one audit event per dispatch to `sink`.
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    /// The registry being served.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Dispatches one call.
    ///
    /// `route` is the concrete path, `verb` the HTTP method name. Route
    /// placeholders captured from `route` are merged into `sources` before
    /// binding.
    pub async fn dispatch(
        &self,
        route: &str,
        verb: &str,
        sources: ValueSources,
        principal: Option<Principal>,
        cancel: CancellationToken,
    ) -> Result<DispatchResponse, FailurePayload> {
        let request_id = if self.config.generate_request_ids {
            uuid::Uuid::new_v4().to_string()
        } else {
            UNASSIGNED_REQUEST_ID.to_string()
        };
        self.dispatch_with_id(request_id, route, verb, sources, principal, cancel)
            .await
    }

    /// Dispatches a call described by a transport adapter. The adapter's
    /// request id is kept; an empty one is replaced by a fresh UUID.
    pub async fn dispatch_extracted<T>(
        &self,
        request: &T,
        cancel: CancellationToken,
    ) -> Result<DispatchResponse, FailurePayload>
    where
        T: ExtractSources + ?Sized,
    {
        let meta = request.request_meta();
        let request_id = if meta.request_id.trim().is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            meta.request_id
        };
        self.dispatch_with_id(
            request_id,
            request.route(),
            request.method(),
            request.value_sources(),
            meta.principal,
            cancel,
        )
        .await
    }

    async fn dispatch_with_id(
        &self,
        request_id: String,
        route: &str,
        verb: &str,
        sources: ValueSources,
        principal: Option<Principal>,
        cancel: CancellationToken,
    ) -> Result<DispatchResponse, FailurePayload> {
        let span = tracing::info_span!("dispatch", request_id = %request_id, route, method = verb);
        let principal_id = principal.as_ref().and_then(Principal::id).map(str::to_string);
        let method = verb.parse::<HttpMethod>().ok();

        let outcome = self
            .run(&request_id, route, verb, sources, principal, cancel)
            .instrument(span.clone())
            .await;

        let _entered = span.enter();
        let log = RequestLog::new(&request_id);
        let event = match &outcome {
            Ok(_) => {
                log.debug(format_args!("dispatch succeeded"));
                AuditEvent::new(
                    request_id.as_str(),
                    principal_id,
                    AuditEventKind::Handling,
                    AuditOutcome::Success,
                )
                .with_status(200)
            }
            Err(err) => {
                match err {
                    Error::Unhandled(fault) => {
                        log.error(format_args!("unhandled fault: {}", fault.detail().expose()))
                    }
                    other => log.warn(format_args!("dispatch failed: {other}")),
                }
                let payload = FailurePayload::from(err);
                AuditEvent::for_failure(request_id.as_str(), principal_id, err)
                    .with_status(payload.status)
                    .with_class(payload.class)
            }
        };
        let event = match method {
            Some(method) => event.with_method(method),
            None => event,
        }
        .with_route(route);
        self.audit(event);

        outcome
            .map(|body| DispatchResponse { status: 200, body })
            .map_err(FailurePayload::from)
    }

    async fn run(
        &self,
        request_id: &str,
        route: &str,
        verb: &str,
        mut sources: ValueSources,
        principal: Option<Principal>,
        cancel: CancellationToken,
    ) -> Result<Value, Error> {
        let method = verb.parse::<HttpMethod>()?;
        let (endpoint, params) = self.registry.resolve(route, method)?.into_parts();
        sources.merge_route_values(params);

        let ctx = DispatchContext::new(
            request_id.to_string(),
            principal,
            cancel,
            route.to_string(),
            method,
        );
        let descriptor = endpoint.descriptor();

        for name in descriptor.filters() {
            let Some(filter) = self.registry.filter(name) else {
                continue;
            };
            let filter_ctx = FilterContext {
                request_id: ctx.request_id(),
                descriptor,
                sources: &sources,
                principal: ctx.principal(),
            };
            if let FilterAction::Reject(rejection) =
                until_cancelled(ctx.cancel(), filter.on_request(filter_ctx)).await?
            {
                let err = Error::Filter {
                    filter: name.clone(),
                    rejection,
                };
                ctx.log().rejected("filter", &err);
                return Err(err);
            }
        }

        let pipeline = Pipeline::new(
            self.config.pipeline,
            self.authorizer.as_ref(),
            self.registry.validators(),
        );
        endpoint.invoke(&ctx, &sources, &self.binder, &pipeline).await
    }

    fn audit(&self, event: AuditEvent) {
        event.emit();
        if let Some(sink) = &self.audit {
            sink.record(event);
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("binder", &self.binder)
            .field("audit", &self.audit.is_some())
            .finish()
    }
}
