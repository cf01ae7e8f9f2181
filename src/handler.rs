use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::binder::Bind;
use crate::error::HandlerError;
use crate::redact::Redact;

/// A request type served by one endpoint.
///
/// The response is what the handler returns; it is redacted for the caller
/// and serialized as the success body.
pub trait Request: Bind + Send + Sync + 'static {
    /// Handler output.
    type Response: Redact + Serialize + Send + Sync + 'static;
}

/// Business logic for one request type.
///
/// The token fires when the caller goes away; long-running handlers should
/// watch it.
#[async_trait]
pub trait Handler<R: Request>: Send + Sync + 'static {
    /// Handles a bound, authorized and validated request.
    async fn handle(&self, request: R, cancel: CancellationToken) -> Result<R::Response, HandlerError>;
}

/// A [`Handler`] backed by an async closure. Built by [`handler_fn`].
pub struct HandlerFn<F, R> {
    f: F,
    _request: PhantomData<fn(R)>,
}

/// Wraps an async closure as a [`Handler`].
///
/// # Examples
///
/// ```
/// use dispatch_core::{handler_fn, HandlerError};
/// # use dispatch_core::{Bind, BindingError, BoundValue, Redact, Request};
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Default, Deserialize)]
/// # struct Ping;
/// # impl Bind for Ping {
/// #     fn assign(&mut self, f: &str, _: BoundValue) -> Result<(), BindingError> {
/// #         Err(BindingError::unknown_field(f))
/// #     }
/// # }
/// # #[derive(Serialize)]
/// # struct Pong;
/// # impl Redact for Pong {}
/// # impl Request for Ping { type Response = Pong; }
///
/// let handler = handler_fn(|_req: Ping, _cancel| async move { Ok::<_, HandlerError>(Pong) });
/// ```
pub fn handler_fn<R, F, Fut>(f: F) -> HandlerFn<F, R>
where
    R: Request,
    F: Fn(R, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R::Response, HandlerError>> + Send + 'static,
{
    HandlerFn {
        f,
        _request: PhantomData,
    }
}

#[async_trait]
impl<R, F, Fut> Handler<R> for HandlerFn<F, R>
where
    R: Request,
    F: Fn(R, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R::Response, HandlerError>> + Send + 'static,
{
    async fn handle(&self, request: R, cancel: CancellationToken) -> Result<R::Response, HandlerError> {
        (self.f)(request, cancel).await
    }
}
