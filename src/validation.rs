//! Validators and the per-request-type catalog that holds them.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One rule broken by a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Field the rule concerns.
    pub field: String,
    /// Caller-facing message.
    pub message: String,
}

impl FieldViolation {
    /// Creates a violation.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Checks a bound request. An empty list means the request is valid.
#[async_trait]
pub trait Validator<R>: Send + Sync {
    /// Returns every broken rule, in rule order.
    async fn validate(&self, request: &R) -> Vec<FieldViolation>;
}

type Predicate<R> = Box<dyn Fn(&R) -> bool + Send + Sync>;

struct Rule<R> {
    field: String,
    message: String,
    holds: Predicate<R>,
}

/// A validator built from predicate and message pairs.
///
/// Every rule runs; each one that does not hold reports its message.
///
/// # Examples
///
/// ```
/// use dispatch_core::RuleSet;
///
/// struct CreateCompany {
///     name: String,
/// }
///
/// let rules = RuleSet::<CreateCompany>::new()
///     .rule("Name", |c| !c.name.is_empty(), "Name is required.")
///     .rule("Name", |c| c.name.chars().count() <= 10, "Name cannot be longer than 10 characters.");
/// assert_eq!(rules.len(), 2);
/// ```
pub struct RuleSet<R> {
    rules: Vec<Rule<R>>,
}

impl<R> RuleSet<R> {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Adds a rule. `holds` returns `true` when the request is fine.
    pub fn rule<F>(mut self, field: impl Into<String>, holds: F, message: impl Into<String>) -> Self
    where
        F: Fn(&R) -> bool + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            field: field.into(),
            message: message.into(),
            holds: Box::new(holds),
        });
        self
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn check(&self, request: &R) -> Vec<FieldViolation> {
        self.rules
            .iter()
            .filter(|rule| !(rule.holds)(request))
            .map(|rule| FieldViolation::new(rule.field.clone(), rule.message.clone()))
            .collect()
    }
}

impl<R> Default for RuleSet<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for RuleSet<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.rules.len())
            .finish()
    }
}

#[async_trait]
impl<R: Send + Sync + 'static> Validator<R> for RuleSet<R> {
    async fn validate(&self, request: &R) -> Vec<FieldViolation> {
        self.check(request)
    }
}

/// Validators keyed by request type, in registration order.
#[derive(Default)]
pub(crate) struct ValidatorCatalog {
    by_type: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ValidatorCatalog {
    pub(crate) fn add<R: 'static>(&mut self, validator: Arc<dyn Validator<R>>) {
        let slot = self
            .by_type
            .entry(TypeId::of::<R>())
            .or_insert_with(|| Box::new(Vec::<Arc<dyn Validator<R>>>::new()));
        if let Some(list) = slot.downcast_mut::<Vec<Arc<dyn Validator<R>>>>() {
            list.push(validator);
        }
    }

    pub(crate) fn get<R: 'static>(&self) -> &[Arc<dyn Validator<R>>] {
        self.by_type
            .get(&TypeId::of::<R>())
            .and_then(|slot| slot.downcast_ref::<Vec<Arc<dyn Validator<R>>>>())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn count(&self) -> usize {
        self.by_type.len()
    }
}

impl fmt::Debug for ValidatorCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorCatalog")
            .field("request_types", &self.by_type.len())
            .finish()
    }
}

/// Runs every validator in order and concatenates what they report.
pub(crate) async fn run_all<R: Sync>(
    validators: &[Arc<dyn Validator<R>>],
    request: &R,
) -> Vec<FieldViolation> {
    let mut violations = Vec::new();
    for validator in validators {
        violations.extend(validator.validate(request).await);
    }
    violations
}
