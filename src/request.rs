use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// The set of role names a caller holds.
///
/// Role names compare case-sensitively: `Admin` and `admin` are different
/// roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    /// A role set holding nothing.
    pub const fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Whether the caller holds `role`.
    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    /// Whether the caller holds at least one of `roles`.
    pub fn intersects(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.contains(role))
    }

    /// Adds a role.
    pub fn insert(&mut self, role: impl Into<String>) {
        self.0.insert(role.into());
    }

    /// Whether no role is held.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of held roles.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Held roles in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// The caller as established by the transport's authentication.
///
/// A principal is either anonymous or authenticated; only an authenticated
/// principal carries an id. Roles may be attached to either, but an
/// anonymous caller never passes an authorization requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    id: Option<String>,
    roles: RoleSet,
    authenticated: bool,
}

impl Principal {
    /// An unauthenticated caller.
    pub fn anonymous() -> Self {
        Self {
            id: None,
            roles: RoleSet::empty(),
            authenticated: false,
        }
    }

    /// An authenticated caller with the given identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use dispatch_core::Principal;
    ///
    /// let alice = Principal::authenticated("alice").with_role("Admin");
    /// assert!(alice.is_authenticated());
    /// assert!(alice.roles().contains("Admin"));
    /// assert!(!alice.roles().contains("admin"));
    /// ```
    pub fn authenticated(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            roles: RoleSet::empty(),
            authenticated: true,
        }
    }

    /// Adds one role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role);
        self
    }

    /// Adds several roles.
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for role in roles {
            self.roles.insert(role);
        }
        self
    }

    /// Identifier, if authenticated.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Held roles.
    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    /// Whether the transport authenticated this caller.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

/// Metadata about an incoming request.
///
/// Contains the request identifier and optional principal.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    /// Unique identifier for this request
    pub request_id: String,
    /// Caller, if the transport established one
    pub principal: Option<Principal>,
}
