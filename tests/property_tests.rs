//! Integration property tests for dispatch-core.
//!
//! These tests validate cross-module invariants using property-based
//! testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dispatch_core::{
    convert, handler_fn, redact, Bind, BindingError, BoundValue, Dispatcher, EndpointDescriptor,
    FieldRule, FieldType, HandlerError, HttpMethod, Principal, Redact, Registry, Request,
    RoleSet, StatusClass, ValueSources,
};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Owner {
    name: String,
    ssn: Option<String>,
}

impl Redact for Owner {
    const FIELDS: &'static [FieldRule<Self>] =
        &[FieldRule::restricted("Ssn", &["Admin"], |o| o.ssn = None)];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Company {
    name: String,
    balance: Option<i64>,
    owners: Vec<Owner>,
}

impl Redact for Company {
    const FIELDS: &'static [FieldRule<Self>] = &[
        FieldRule::restricted("Balance", &["Admin", "Manager"], |c| c.balance = None),
        FieldRule::nested("Owners", |c, roles| c.owners.redact(roles)),
    ];
}

// Strategy: Generate arbitrary role sets drawn from a small vocabulary
fn arb_roles() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(
        prop_oneof![Just("Admin"), Just("Manager"), Just("User"), Just("Auditor")],
        0..4,
    )
}

fn arb_owner() -> impl Strategy<Value = Owner> {
    ("[A-Za-z ]{1,12}", prop::option::of("[0-9]{3}-[0-9]{2}-[0-9]{4}"))
        .prop_map(|(name, ssn)| Owner { name, ssn })
}

fn arb_company() -> impl Strategy<Value = Company> {
    (
        "[A-Za-z]{1,10}",
        prop::option::of(any::<i64>()),
        prop::collection::vec(arb_owner(), 0..4),
    )
        .prop_map(|(name, balance, owners)| Company {
            name,
            balance,
            owners,
        })
}

#[derive(Debug, Default, Deserialize)]
struct Secured;

impl Bind for Secured {
    fn assign(&mut self, field: &str, _value: BoundValue) -> Result<(), BindingError> {
        Err(BindingError::unknown_field(field))
    }
}

#[derive(Debug, Serialize)]
struct Done;

impl Redact for Done {}

impl Request for Secured {
    type Response = Done;
}

proptest! {
    /// Property: redacting twice for the same caller changes nothing more
    #[test]
    fn proptest_redaction_is_idempotent(company in arb_company(), roles in arb_roles()) {
        let principal = Principal::authenticated("p").with_roles(roles);

        let mut once = company.clone();
        redact(&mut once, Some(&principal));
        let mut twice = once.clone();
        redact(&mut twice, Some(&principal));

        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once.name, company.name);
    }

    /// Property: restricted fields survive exactly when a listed role is held
    #[test]
    fn proptest_redaction_follows_roles(company in arb_company(), roles in arb_roles()) {
        let set: RoleSet = roles.iter().copied().collect();
        let mut redacted = company.clone();
        redacted.redact(&set);

        if set.intersects(&["Admin", "Manager"]) {
            prop_assert_eq!(redacted.balance, company.balance);
        } else {
            prop_assert_eq!(redacted.balance, None);
        }
        if !set.contains("Admin") {
            prop_assert!(redacted.owners.iter().all(|o| o.ssn.is_none()));
        }
        prop_assert_eq!(redacted.owners.len(), company.owners.len());
    }

    /// Property: every i32 converts to Int32 and every i64 to Int64
    #[test]
    fn proptest_integer_conversion_is_total(n in any::<i32>(), m in any::<i64>()) {
        prop_assert_eq!(convert("n", &n.to_string(), FieldType::Int32), Ok(BoundValue::Int32(n)));
        prop_assert_eq!(convert("m", &m.to_string(), FieldType::Int64), Ok(BoundValue::Int64(m)));
    }

    /// Property: conversion never panics and failures name the field
    #[test]
    fn proptest_conversion_failures_name_the_field(raw in "\\PC{0,24}") {
        for ty in [FieldType::Uuid, FieldType::Int32, FieldType::Int64, FieldType::Bool, FieldType::Timestamp, FieldType::Float] {
            if let Err(err) = convert("target", &raw, ty) {
                prop_assert_eq!(err.field(), "target");
            }
        }
    }

    /// Property: a caller that is not authenticated never runs a handler
    /// that requires authentication
    #[test]
    fn proptest_unauthenticated_never_invokes_handler(
        roles in prop::option::of(arb_roles()),
        verb in prop_oneof![Just("GET"), Just("POST"), Just("DELETE")],
    ) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let method: HttpMethod = verb.parse().unwrap();
        let registry = Registry::builder()
            .register(
                EndpointDescriptor::builder("/secured", method).require_authenticated(),
                handler_fn(move |_req: Secured, _| {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok::<_, HandlerError>(Done)
                    }
                }),
            )
            .unwrap()
            .publish()
            .unwrap();
        let dispatcher = Dispatcher::new(Arc::new(registry));

        let principal = roles.map(|roles| Principal::anonymous().with_roles(roles));

        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let failure = rt
            .block_on(dispatcher.dispatch(
                "/secured",
                verb,
                ValueSources::new(),
                principal,
                CancellationToken::new(),
            ))
            .unwrap_err();

        prop_assert_eq!(failure.class, StatusClass::AuthenticationRequired);
        prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
