//! Type-state markers for registry progression.
//!
//! A [`Registry`](crate::Registry) starts in [`Building`], where descriptors,
//! validators and filters are registered, and becomes [`Published`] once
//! every reference has been checked. Only a published registry can resolve
//! routes, and only a building one can be mutated.

/// Marker for a registry still accepting registrations.
#[derive(Debug, Clone, Copy)]
pub struct Building {
    _private: (),
}

/// Marker for a frozen registry that serves lookups.
#[derive(Debug, Clone, Copy)]
pub struct Published {
    _private: (),
}
