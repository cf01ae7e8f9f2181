use std::any::Any;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    descriptor::AuthRequirement,
    error::{Error, Violation, ViolationKind},
    policy::PolicyReq,
    request::Principal,
};

/// Answer from an [`AuthorizationProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationDecision {
    /// The policy grants the caller.
    Granted,
    /// The policy refuses the caller.
    Denied {
        /// Why, for the caller.
        reason: String,
    },
}

/// Decides whether a named policy grants a caller access to a request.
///
/// `resource` is the bound request; providers that care about its contents
/// downcast it to the concrete request type.
///
/// # Examples
///
/// ```
/// use std::any::Any;
/// use async_trait::async_trait;
/// use dispatch_core::{AuthorizationDecision, AuthorizationProvider, Principal};
///
/// struct RolePolicies;
///
/// #[async_trait]
/// impl AuthorizationProvider for RolePolicies {
///     async fn authorize(
///         &self,
///         principal: &Principal,
///         _resource: &(dyn Any + Send + Sync),
///         policy: &str,
///     ) -> AuthorizationDecision {
///         if principal.roles().contains(policy) {
///             AuthorizationDecision::Granted
///         } else {
///             AuthorizationDecision::Denied { reason: format!("role {policy} required") }
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait AuthorizationProvider: Send + Sync {
    /// Evaluates `policy` for `principal` against `resource`.
    async fn authorize(
        &self,
        principal: &Principal,
        resource: &(dyn Any + Send + Sync),
        policy: &str,
    ) -> AuthorizationDecision;
}

/// Provider used when none is configured: every named policy is denied.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAllPolicies;

#[async_trait]
impl AuthorizationProvider for DenyAllPolicies {
    async fn authorize(
        &self,
        _principal: &Principal,
        _resource: &(dyn Any + Send + Sync),
        policy: &str,
    ) -> AuthorizationDecision {
        AuthorizationDecision::Denied {
            reason: format!("no authorization provider is configured for policy '{}'", policy),
        }
    }
}

/// The authorization gate.
///
/// Collects requirements, then checks them in order against one caller,
/// stopping at the first failure. A requirement that needs a policy decision
/// first needs an authenticated caller.
///
/// # Examples
///
/// ```
/// use dispatch_core::{Authenticated, DenyAllPolicies, PolicyGate, Principal};
/// use tokio_util::sync::CancellationToken;
///
/// # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
/// # rt.block_on(async {
/// let alice = Principal::authenticated("alice");
/// let gate = PolicyGate::new(Some(&alice)).require(Authenticated);
/// let passed = gate
///     .evaluate(&DenyAllPolicies, &(), &CancellationToken::new())
///     .await;
/// assert!(passed.is_ok());
/// # });
/// ```
pub struct PolicyGate<'a> {
    principal: Option<&'a Principal>,
    requirements: Vec<PolicyReq>,
    anonymous: bool,
}

impl<'a> PolicyGate<'a> {
    /// Creates a gate for one caller. No principal means anonymous.
    pub fn new(principal: Option<&'a Principal>) -> Self {
        Self {
            principal,
            requirements: Vec::new(),
            anonymous: false,
        }
    }

    /// Creates a gate holding a descriptor's requirement.
    pub fn for_requirement(principal: Option<&'a Principal>, requirement: &AuthRequirement) -> Self {
        let gate = Self::new(principal);
        match requirement {
            AuthRequirement::None => gate,
            AuthRequirement::Anonymous => gate.allow_anonymous(),
            AuthRequirement::Required => gate.require(PolicyReq::Authenticated),
            AuthRequirement::Policies(policies) => policies
                .iter()
                .fold(gate.require(PolicyReq::Authenticated), |gate, policy| {
                    gate.require(PolicyReq::Policy(policy.clone()))
                }),
        }
    }

    /// Adds a requirement, deduplicating identical requirements.
    pub fn require(mut self, policy: impl Into<PolicyReq>) -> Self {
        let req = policy.into();
        if !self.requirements.contains(&req) {
            self.requirements.push(req);
        }
        self
    }

    /// Lets everyone through regardless of requirements.
    pub fn allow_anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// Requirements in check order.
    pub fn requirements(&self) -> &[PolicyReq] {
        &self.requirements
    }

    /// Checks every requirement in order.
    ///
    /// # Errors
    ///
    /// [`Error::Violation`] for the first failing requirement, or
    /// [`Error::Cancelled`] if `cancel` fires while a policy is being decided.
    pub async fn evaluate(
        &self,
        provider: &dyn AuthorizationProvider,
        resource: &(dyn Any + Send + Sync),
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        if self.anonymous {
            return Ok(());
        }

        for req in &self.requirements {
            let principal = self.authenticated_principal(req)?;
            let PolicyReq::Policy(policy) = req else {
                continue;
            };

            let decision = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                decision = provider.authorize(principal, resource, policy) => decision,
            };

            if let AuthorizationDecision::Denied { reason } = decision {
                return Err(Violation::new(
                    ViolationKind::Forbidden {
                        policy: policy.clone(),
                    },
                    reason,
                )
                .into());
            }
        }
        Ok(())
    }

    fn authenticated_principal(&self, req: &PolicyReq) -> Result<&'a Principal, Violation> {
        match self.principal {
            Some(principal) if principal.is_authenticated() => Ok(principal),
            _ => {
                let message = match req {
                    PolicyReq::Authenticated => "Authentication required".to_string(),
                    PolicyReq::Policy(policy) => {
                        format!("Cannot evaluate policy '{}' for an unauthenticated caller", policy)
                    }
                };
                Err(Violation::new(ViolationKind::Unauthenticated, message))
            }
        }
    }
}
