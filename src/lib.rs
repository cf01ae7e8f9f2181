//! Declarative request dispatch.
//!
//! This crate turns a table of endpoint declarations into a dispatcher:
//! - **Binding**: typed requests rebuilt from route values, query values and
//!   a JSON body, with URL values overriding the body
//! - **Pipeline**: authorization, then validation, then the handler, then
//!   role-based redaction of the response
//! - **Failures**: every error leaves as one problem-details-shaped
//!   [`FailurePayload`]; server faults never leak their detail
//!
//! # Core Types
//!
//! - [`Registry`]: startup-built, immutable table of endpoints
//! - [`EndpointDescriptor`]: route template, verb, auth, filters, bindings
//! - [`Dispatcher`]: the entry point a transport calls
//! - [`Redact`]: per-type field visibility tables
//! - [`Sensitive<T>`]: wrapper that redacts values in logs/output
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use dispatch_core::{
//!     handler_fn, Bind, BindingError, BindingSpec, BoundValue, Dispatcher, EndpointDescriptor,
//!     FieldRule, FieldType, HandlerError, HttpMethod, Principal, Redact, Registry, Request,
//!     ValueSources,
//! };
//! use serde::{Deserialize, Serialize};
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Default, Deserialize)]
//! struct GetCompany {
//!     id: i64,
//! }
//!
//! impl Bind for GetCompany {
//!     fn assign(&mut self, field: &str, value: BoundValue) -> Result<(), BindingError> {
//!         match field {
//!             "id" => self.id = value.into_field(field)?,
//!             other => return Err(BindingError::unknown_field(other)),
//!         }
//!         Ok(())
//!     }
//! }
//!
//! #[derive(Serialize)]
//! struct Company {
//!     id: i64,
//!     balance: Option<f64>,
//! }
//!
//! impl Redact for Company {
//!     const FIELDS: &'static [FieldRule<Self>] =
//!         &[FieldRule::restricted("Balance", &["Admin", "Manager"], |c| c.balance = None)];
//! }
//!
//! impl Request for GetCompany {
//!     type Response = Company;
//! }
//!
//! let registry = Registry::builder()
//!     .register(
//!         EndpointDescriptor::builder("/company/{id}", HttpMethod::Get)
//!             .tag("Company")
//!             .require_authenticated()
//!             .bind(BindingSpec::route("id", FieldType::Int64)),
//!         handler_fn(|req: GetCompany, _| async move {
//!             Ok::<_, HandlerError>(Company { id: req.id, balance: Some(1200.0) })
//!         }),
//!     )
//!     .unwrap()
//!     .publish()
//!     .unwrap();
//! let dispatcher = Dispatcher::new(Arc::new(registry));
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let caller = Principal::authenticated("u-1").with_role("User");
//! let ok = rt
//!     .block_on(dispatcher.dispatch(
//!         "/company/7",
//!         "GET",
//!         ValueSources::new(),
//!         Some(caller),
//!         CancellationToken::new(),
//!     ))
//!     .unwrap();
//!
//! assert_eq!(ok.body["id"], 7);
//! assert!(ok.body["balance"].is_null());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
mod binder;
mod config;
mod context;
mod descriptor;
mod dispatcher;
mod error;
mod failure;
mod filter;
mod gate;
mod handler;
mod logging;
mod method;
mod pipeline;
mod policy;
mod redact;
mod registry;
mod request;
mod secret;
mod state;
mod validation;
pub mod web;

pub use binder::{
    convert, Bind, Binder, BodyDecoder, BoundValue, FromBoundValue, JsonBodyDecoder, ValueSources,
};
pub use config::{ConfigError, DispatcherConfig, PipelineConfig};
pub use context::DispatchContext;
pub use descriptor::{
    AuthRequirement, BindingSource, BindingSpec, DescriptorBuilder, EndpointDescriptor, FieldType,
};
pub use dispatcher::{DispatchResponse, Dispatcher};
pub use error::{
    BindingError, DispatchError, DispatchResult, DomainError, Error, HandlerError, RegistryError,
    UnhandledError, ValidationError, Violation, ViolationKind,
};
pub use failure::{FailurePayload, StatusClass, UNHANDLED_DETAIL};
pub use filter::{EndpointFilter, FilterAction, FilterContext, FilterRejection};
pub use gate::{AuthorizationDecision, AuthorizationProvider, DenyAllPolicies, PolicyGate};
pub use handler::{handler_fn, Handler, HandlerFn, Request};
pub use logging::RequestLog;
pub use method::HttpMethod;
pub use policy::{Authenticated, Authorized, PolicyReq};
pub use redact::{redact, FieldRule, Redact, Visibility};
pub use registry::{Registry, RouteMatch};
pub use request::{Principal, RequestMeta, RoleSet};
pub use secret::Sensitive;
pub use state::{Building, Published};
pub use validation::{FieldViolation, RuleSet, Validator};
