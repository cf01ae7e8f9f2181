//! Role-based redaction of response graphs.
//!
//! Every response type declares a static table of [`FieldRule`]s. The
//! redactor walks the table: a field whose visibility the caller's roles do
//! not satisfy is cleared, every other field with a nested rule is descended
//! into. Collections forward to their elements (map values for keyed
//! collections). Strings and other leaves have no table. Sets are not
//! supported: clearing a field could make two elements equal and merge them.
//!
//! Redaction only follows owned fields, so the graph it walks is a tree.
//! Running it twice with the same roles changes nothing the second time.

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::request::{Principal, RoleSet};

static NO_ROLES: RoleSet = RoleSet::empty();

/// Who may see a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// No restriction.
    Everyone,
    /// Callers holding at least one of these roles. Never empty.
    AnyOf(&'static [&'static str]),
    /// Nobody, whatever their roles.
    Nobody,
}

impl Visibility {
    /// Whether a caller with `roles` may see the field.
    pub fn allows(&self, roles: &RoleSet) -> bool {
        match self {
            Visibility::Everyone => true,
            Visibility::AnyOf(required) => roles.intersects(required),
            Visibility::Nobody => false,
        }
    }
}

/// One entry of a response type's field table.
///
/// Built with the `const` constructors so that tables live in a `const`
/// and a restricted field with an empty role list fails to compile.
pub struct FieldRule<T> {
    name: &'static str,
    visibility: Visibility,
    clear: Option<fn(&mut T)>,
    descend: Option<fn(&mut T, &RoleSet)>,
}

impl<T> FieldRule<T> {
    /// A field only callers holding one of `roles` may see. `clear` sets it
    /// to its absent value.
    ///
    /// # Panics
    ///
    /// At compile time when used in a `const` table with an empty `roles`.
    pub const fn restricted(
        name: &'static str,
        roles: &'static [&'static str],
        clear: fn(&mut T),
    ) -> Self {
        assert!(!roles.is_empty(), "a restricted field needs at least one role");
        Self {
            name,
            visibility: Visibility::AnyOf(roles),
            clear: Some(clear),
            descend: None,
        }
    }

    /// A field nobody may see.
    pub const fn hidden(name: &'static str, clear: fn(&mut T)) -> Self {
        Self {
            name,
            visibility: Visibility::Nobody,
            clear: Some(clear),
            descend: None,
        }
    }

    /// An unrestricted field holding a composite or collection to redact.
    pub const fn nested(name: &'static str, descend: fn(&mut T, &RoleSet)) -> Self {
        Self {
            name,
            visibility: Visibility::Everyone,
            clear: None,
            descend: Some(descend),
        }
    }

    /// A restricted field that, when visible, is itself redacted.
    ///
    /// # Panics
    ///
    /// At compile time when used in a `const` table with an empty `roles`.
    pub const fn restricted_nested(
        name: &'static str,
        roles: &'static [&'static str],
        clear: fn(&mut T),
        descend: fn(&mut T, &RoleSet),
    ) -> Self {
        assert!(!roles.is_empty(), "a restricted field needs at least one role");
        Self {
            name,
            visibility: Visibility::AnyOf(roles),
            clear: Some(clear),
            descend: Some(descend),
        }
    }

    /// Field name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Who may see the field.
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    fn apply(&self, value: &mut T, roles: &RoleSet) {
        if !self.visibility.allows(roles) {
            if let Some(clear) = self.clear {
                clear(value);
            }
            return;
        }
        if let Some(descend) = self.descend {
            descend(value, roles);
        }
    }
}

impl<T> std::fmt::Debug for FieldRule<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldRule")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("nested", &self.descend.is_some())
            .finish()
    }
}

/// A value the redactor can walk.
///
/// Composite types list their fields in [`FIELDS`](Self::FIELDS) and keep the
/// default [`redact`](Self::redact). Types with nothing to redact implement
/// the trait with an empty body.
///
/// # Examples
///
/// ```
/// use dispatch_core::{FieldRule, Redact, RoleSet};
///
/// struct Company {
///     name: String,
///     balance: Option<f64>,
/// }
///
/// impl Redact for Company {
///     const FIELDS: &'static [FieldRule<Self>] = &[FieldRule::restricted(
///         "Balance",
///         &["Admin", "Manager"],
///         |c| c.balance = None,
///     )];
/// }
///
/// let mut rows = vec![Company { name: "Acme".into(), balance: Some(10.0) }];
/// rows.redact(&["User"].into_iter().collect::<RoleSet>());
/// assert_eq!(rows[0].balance, None);
/// assert_eq!(rows[0].name, "Acme");
/// ```
pub trait Redact: Sized + 'static {
    /// The field table.
    const FIELDS: &'static [FieldRule<Self>] = &[];

    /// Clears, in place, everything `roles` may not see.
    fn redact(&mut self, roles: &RoleSet) {
        for rule in Self::FIELDS {
            rule.apply(self, roles);
        }
    }
}

/// Redacts `value` for `principal`.
///
/// No principal, or one the transport did not authenticate, holds no roles.
pub fn redact<T: Redact>(value: &mut T, principal: Option<&Principal>) {
    value.redact(roles_of(principal));
}

pub(crate) fn roles_of(principal: Option<&Principal>) -> &RoleSet {
    match principal {
        Some(p) if p.is_authenticated() => p.roles(),
        _ => &NO_ROLES,
    }
}

macro_rules! leaf {
    ($($ty:ty),+ $(,)?) => {
        $(impl Redact for $ty {})+
    };
}

leaf!(
    (),
    bool,
    char,
    String,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    Uuid,
    DateTime<Utc>,
    serde_json::Value,
);

impl<T: Redact> Redact for Option<T> {
    fn redact(&mut self, roles: &RoleSet) {
        if let Some(inner) = self {
            inner.redact(roles);
        }
    }
}

impl<T: Redact> Redact for Box<T> {
    fn redact(&mut self, roles: &RoleSet) {
        (**self).redact(roles);
    }
}

impl<T: Redact> Redact for Vec<T> {
    fn redact(&mut self, roles: &RoleSet) {
        for item in self.iter_mut() {
            item.redact(roles);
        }
    }
}

impl<T: Redact> Redact for VecDeque<T> {
    fn redact(&mut self, roles: &RoleSet) {
        for item in self.iter_mut() {
            item.redact(roles);
        }
    }
}

impl<K: 'static, V: Redact, S: 'static> Redact for HashMap<K, V, S> {
    fn redact(&mut self, roles: &RoleSet) {
        for value in self.values_mut() {
            value.redact(roles);
        }
    }
}

impl<K: 'static, V: Redact> Redact for BTreeMap<K, V> {
    fn redact(&mut self, roles: &RoleSet) {
        for value in self.values_mut() {
            value.redact(roles);
        }
    }
}
