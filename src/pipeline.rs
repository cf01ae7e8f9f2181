//! The behavior pipeline.
//!
//! Authorization, then validation, then the handler, then redaction. The
//! first stage that fails ends the call; a failing handler skips redaction.

use tokio_util::sync::CancellationToken;

use crate::config::PipelineConfig;
use crate::context::DispatchContext;
use crate::descriptor::EndpointDescriptor;
use crate::error::{Error, ValidationError};
use crate::gate::{AuthorizationProvider, PolicyGate};
use crate::handler::{Handler, Request};
use crate::redact::Redact;
use crate::validation::{self, ValidatorCatalog};

/// The stages shared by every endpoint of a dispatcher.
pub(crate) struct Pipeline<'a> {
    config: PipelineConfig,
    authorizer: &'a dyn AuthorizationProvider,
    validators: &'a ValidatorCatalog,
}

impl<'a> Pipeline<'a> {
    pub(crate) fn new(
        config: PipelineConfig,
        authorizer: &'a dyn AuthorizationProvider,
        validators: &'a ValidatorCatalog,
    ) -> Self {
        Self {
            config,
            authorizer,
            validators,
        }
    }

    /// Runs `request` through every enabled stage.
    pub(crate) async fn run<R: Request>(
        &self,
        ctx: &DispatchContext,
        descriptor: &EndpointDescriptor,
        handler: &dyn Handler<R>,
        request: R,
    ) -> Result<R::Response, Error> {
        let log = ctx.log();

        if self.config.use_authorization {
            let gate = PolicyGate::for_requirement(ctx.principal(), descriptor.auth());
            if let Err(err) = gate.evaluate(self.authorizer, &request, ctx.cancel()).await {
                log.rejected("authorization", &err);
                return Err(err);
            }
        }

        if self.config.use_validation {
            let violations = until_cancelled(
                ctx.cancel(),
                validation::run_all(self.validators.get::<R>(), &request),
            )
            .await?;
            if !violations.is_empty() {
                let err = Error::from(ValidationError::new(violations));
                log.rejected("validation", &err);
                return Err(err);
            }
        }

        if ctx.cancel().is_cancelled() {
            return Err(Error::Cancelled);
        }

        log.debug(format_args!("invoking handler for {}", descriptor.request_type()));
        let mut response = handler.handle(request, ctx.cancel().clone()).await?;

        if self.config.use_role_redaction {
            response.redact(ctx.roles());
        }

        Ok(response)
    }
}

/// Awaits `work` unless `cancel` fires first.
pub(crate) async fn until_cancelled<T>(
    cancel: &CancellationToken,
    work: impl std::future::Future<Output = T>,
) -> Result<T, Error> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        out = work => Ok(out),
    }
}
