use std::fmt;

/// A requirement the authorization stage checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyReq {
    /// Requires an authenticated principal
    Authenticated,
    /// Requires an authenticated principal that the named policy grants
    Policy(String),
}

impl fmt::Display for PolicyReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyReq::Authenticated => f.write_str("authenticated"),
            PolicyReq::Policy(name) => write!(f, "policy '{}'", name),
        }
    }
}

/// Requirement for an authenticated caller.
pub struct Authenticated;

/// Requirement for a caller granted by a named policy.
///
/// The name is handed to the
/// [`AuthorizationProvider`](crate::AuthorizationProvider), which decides
/// what it means.
pub struct Authorized {
    policy: String,
}

impl Authorized {
    /// Creates a requirement for the given policy.
    pub fn for_policy(policy: impl Into<String>) -> Self {
        Self {
            policy: policy.into(),
        }
    }
}

impl From<Authenticated> for PolicyReq {
    fn from(_: Authenticated) -> Self {
        PolicyReq::Authenticated
    }
}

impl From<Authorized> for PolicyReq {
    fn from(auth: Authorized) -> Self {
        PolicyReq::Policy(auth.policy)
    }
}
