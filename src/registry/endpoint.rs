//! Type-erased endpoints.
//!
//! The registry stores one `Arc<dyn Endpoint>` per descriptor so that
//! endpoints of different request types share one table. The typed request
//! and response never leave [`TypedEndpoint::invoke`]; callers only see JSON.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::Value;

use crate::binder::{Binder, ValueSources};
use crate::context::DispatchContext;
use crate::descriptor::EndpointDescriptor;
use crate::error::{Error, UnhandledError};
use crate::handler::{Handler, Request};
use crate::pipeline::{until_cancelled, Pipeline};

#[async_trait]
pub(crate) trait Endpoint: Send + Sync {
    fn descriptor(&self) -> &EndpointDescriptor;

    /// Binds, runs the pipeline, and serializes the redacted response.
    async fn invoke(
        &self,
        ctx: &DispatchContext,
        sources: &ValueSources,
        binder: &Binder,
        pipeline: &Pipeline<'_>,
    ) -> Result<Value, Error>;
}

pub(crate) struct TypedEndpoint<R, H> {
    descriptor: EndpointDescriptor,
    handler: H,
    _request: PhantomData<fn(R)>,
}

impl<R, H> TypedEndpoint<R, H> {
    pub(crate) fn new(descriptor: EndpointDescriptor, handler: H) -> Self {
        Self {
            descriptor,
            handler,
            _request: PhantomData,
        }
    }
}

#[async_trait]
impl<R, H> Endpoint for TypedEndpoint<R, H>
where
    R: Request,
    H: Handler<R>,
{
    fn descriptor(&self) -> &EndpointDescriptor {
        &self.descriptor
    }

    async fn invoke(
        &self,
        ctx: &DispatchContext,
        sources: &ValueSources,
        binder: &Binder,
        pipeline: &Pipeline<'_>,
    ) -> Result<Value, Error> {
        let request = match until_cancelled(ctx.cancel(), binder.bind::<R>(&self.descriptor, sources)).await? {
            Ok(request) => request,
            Err(err) => {
                ctx.log().rejected("binding", &err);
                return Err(err.into());
            }
        };

        let response = pipeline
            .run(ctx, &self.descriptor, &self.handler, request)
            .await?;

        serde_json::to_value(&response).map_err(|e| {
            Error::Unhandled(UnhandledError::new(format!(
                "serializing {} failed: {e}",
                self.descriptor.response_type()
            )))
        })
    }
}
