//! The descriptor registry.
//!
//! Built once at startup in the [`Building`] state, then frozen with
//! [`Registry::publish`]. A published registry is read-only and is shared
//! across calls behind an `Arc`.

mod endpoint;
pub(crate) mod route;

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::descriptor::{DescriptorBuilder, EndpointDescriptor};
use crate::error::{DispatchError, RegistryError};
use crate::filter::EndpointFilter;
use crate::handler::{Handler, Request};
use crate::method::HttpMethod;
use crate::state::{Building, Published};
use crate::validation::{Validator, ValidatorCatalog};

pub(crate) use endpoint::Endpoint;
use endpoint::TypedEndpoint;
use route::RouteTemplate;

/// Every endpoint, validator and filter a dispatcher serves.
///
/// # Examples
///
/// ```
/// use dispatch_core::{
///     handler_fn, Bind, BindingError, BindingSpec, BoundValue, EndpointDescriptor, FieldType,
///     HandlerError, HttpMethod, Redact, Registry, Request,
/// };
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Default, Deserialize)]
/// struct GetRole {
///     id: i64,
/// }
///
/// impl Bind for GetRole {
///     fn assign(&mut self, field: &str, value: BoundValue) -> Result<(), BindingError> {
///         match field {
///             "id" => self.id = value.into_field(field)?,
///             other => return Err(BindingError::unknown_field(other)),
///         }
///         Ok(())
///     }
/// }
///
/// #[derive(Serialize)]
/// struct Role {
///     id: i64,
/// }
///
/// impl Redact for Role {}
///
/// impl Request for GetRole {
///     type Response = Role;
/// }
///
/// let registry = Registry::builder()
///     .register(
///         EndpointDescriptor::builder("/role/{id}", HttpMethod::Get)
///             .bind(BindingSpec::route("id", FieldType::Int64)),
///         handler_fn(|req: GetRole, _| async move { Ok::<_, HandlerError>(Role { id: req.id }) }),
///     )
///     .unwrap()
///     .publish()
///     .unwrap();
///
/// assert_eq!(registry.len(), 1);
/// assert!(registry.resolve("/role/7", HttpMethod::Get).is_ok());
/// ```
pub struct Registry<S = Published> {
    endpoints: Vec<Arc<dyn Endpoint>>,
    index: HashMap<(String, HttpMethod), usize>,
    filters: HashMap<String, Arc<dyn EndpointFilter>>,
    validators: ValidatorCatalog,
    _state: PhantomData<S>,
}

impl Registry<Building> {
    /// Starts an empty registry.
    pub fn builder() -> Self {
        Self {
            endpoints: Vec::new(),
            index: HashMap::new(),
            filters: HashMap::new(),
            validators: ValidatorCatalog::default(),
            _state: PhantomData,
        }
    }

    /// Registers an endpoint for request type `R`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateRoute`] when an equivalent route is already
    /// registered for the verb; [`RegistryError::MalformedDescriptor`] when
    /// the declaration cannot be served.
    pub fn register<R, H>(mut self, declared: DescriptorBuilder, handler: H) -> Result<Self, RegistryError>
    where
        R: Request,
        H: Handler<R>,
    {
        let descriptor = declared.build::<R>()?;
        let key = (descriptor.template().shape_key(), descriptor.method());
        if self.index.contains_key(&key) {
            return Err(RegistryError::DuplicateRoute {
                route: descriptor.route().to_string(),
                method: descriptor.method().to_string(),
            });
        }

        tracing::debug!(
            route = descriptor.route(),
            method = %descriptor.method(),
            request = descriptor.request_type(),
            "endpoint registered"
        );
        self.index.insert(key, self.endpoints.len());
        self.endpoints
            .push(Arc::new(TypedEndpoint::<R, H>::new(descriptor, handler)));
        Ok(self)
    }

    /// Adds a validator for request type `R`. Validators run in the order
    /// they are added.
    pub fn validator<R, V>(mut self, validator: V) -> Self
    where
        R: Request,
        V: Validator<R> + 'static,
    {
        self.validators.add::<R>(Arc::new(validator));
        self
    }

    /// Adds a named endpoint filter. A later filter with the same name
    /// replaces the earlier one.
    pub fn filter(mut self, name: impl Into<String>, filter: impl EndpointFilter + 'static) -> Self {
        self.filters.insert(name.into(), Arc::new(filter));
        self
    }

    /// Freezes the registry.
    ///
    /// # Errors
    ///
    /// [`RegistryError::MalformedDescriptor`] when a descriptor references a
    /// filter that was never added.
    pub fn publish(self) -> Result<Registry<Published>, RegistryError> {
        for endpoint in &self.endpoints {
            let descriptor = endpoint.descriptor();
            if let Some(missing) = descriptor
                .filters()
                .iter()
                .find(|name| !self.filters.contains_key(name.as_str()))
            {
                return Err(RegistryError::malformed(
                    descriptor.route(),
                    format!("filter '{}' is not registered", missing),
                ));
            }
        }

        tracing::info!(
            endpoints = self.endpoints.len(),
            filters = self.filters.len(),
            validated_types = self.validators.count(),
            "registry published"
        );
        Ok(Registry {
            endpoints: self.endpoints,
            index: self.index,
            filters: self.filters,
            validators: self.validators,
            _state: PhantomData,
        })
    }
}

/// A resolved route.
pub struct RouteMatch<'a> {
    endpoint: &'a dyn Endpoint,
    params: Vec<(String, String)>,
}

impl<'a> RouteMatch<'a> {
    /// The matched endpoint's descriptor.
    pub fn descriptor(&self) -> &'a EndpointDescriptor {
        self.endpoint.descriptor()
    }

    /// Placeholder values captured from the path, in template order.
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub(crate) fn into_parts(self) -> (&'a dyn Endpoint, Vec<(String, String)>) {
        (self.endpoint, self.params)
    }
}

impl fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("route", &self.descriptor().route())
            .field("params", &self.params)
            .finish()
    }
}

impl Registry<Published> {
    /// Finds the endpoint for a concrete path and verb.
    ///
    /// Among matching templates the one with the most literal segments wins,
    /// then the one registered first.
    ///
    /// # Errors
    ///
    /// [`DispatchError::MethodNotAllowed`] when the path matches only other
    /// verbs; [`DispatchError::RouteNotFound`] when it matches nothing.
    pub fn resolve(&self, path: &str, method: HttpMethod) -> Result<RouteMatch<'_>, DispatchError> {
        // An equal shape is the most specific match there can be.
        let exact = self
            .index
            .get(&(RouteTemplate::literal_shape(path), method))
            .and_then(|&slot| self.endpoints.get(slot));
        if let Some(endpoint) = exact {
            if let Some(params) = endpoint.descriptor().template().matches(path) {
                return Ok(RouteMatch {
                    endpoint: endpoint.as_ref(),
                    params,
                });
            }
        }

        let mut other_verbs = false;
        let mut best: Option<(usize, &dyn Endpoint, Vec<(String, String)>)> = None;

        for endpoint in &self.endpoints {
            let descriptor = endpoint.descriptor();
            let Some(params) = descriptor.template().matches(path) else {
                continue;
            };
            if descriptor.method() != method {
                other_verbs = true;
                continue;
            }
            let specificity = descriptor.template().specificity();
            if best.as_ref().map_or(true, |(s, _, _)| specificity > *s) {
                best = Some((specificity, endpoint.as_ref(), params));
            }
        }

        match best {
            Some((_, endpoint, params)) => Ok(RouteMatch { endpoint, params }),
            None if other_verbs => Err(DispatchError::MethodNotAllowed {
                route: path.to_string(),
                method: method.to_string(),
            }),
            None => Err(DispatchError::RouteNotFound {
                route: path.to_string(),
            }),
        }
    }

    /// Every descriptor, in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &EndpointDescriptor> {
        self.endpoints.iter().map(|e| e.descriptor())
    }

    pub(crate) fn filter(&self, name: &str) -> Option<&Arc<dyn EndpointFilter>> {
        self.filters.get(name)
    }

    pub(crate) fn validators(&self) -> &ValidatorCatalog {
        &self.validators
    }
}

impl<S> Registry<S> {
    /// Number of registered endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl<S> fmt::Debug for Registry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("endpoints", &self.endpoints.len())
            .field("filters", &self.filters.len())
            .field("validators", &self.validators)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::binder::{Bind, BoundValue};
    use crate::descriptor::{BindingSpec, FieldType};
    use crate::error::{BindingError, HandlerError};
    use crate::filter::{FilterAction, FilterContext};
    use crate::redact::Redact;
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use tokio_util::sync::CancellationToken;

    #[derive(Debug, Default, Deserialize)]
    pub(crate) struct Noop;

    impl Bind for Noop {
        fn assign(&mut self, _field: &str, _value: BoundValue) -> Result<(), BindingError> {
            Ok(())
        }
    }

    #[derive(Debug, Serialize)]
    pub(crate) struct Ack;

    impl Redact for Ack {}

    impl Request for Noop {
        type Response = Ack;
    }

    struct AckHandler;

    #[async_trait]
    impl Handler<Noop> for AckHandler {
        async fn handle(&self, _request: Noop, _cancel: CancellationToken) -> Result<Ack, HandlerError> {
            Ok(Ack)
        }
    }

    fn ack() -> AckHandler {
        AckHandler
    }

    /// A checked descriptor for a request type with no fields.
    pub(crate) fn descriptor_for(route: &str, method: HttpMethod) -> EndpointDescriptor {
        EndpointDescriptor::builder(route, method)
            .build::<Noop>()
            .unwrap()
    }

    struct Pass;

    #[async_trait]
    impl EndpointFilter for Pass {
        async fn on_request(&self, _ctx: FilterContext<'_>) -> FilterAction {
            FilterAction::Continue
        }
    }

    #[test]
    fn same_route_and_verb_twice_is_rejected() {
        let err = Registry::builder()
            .register(EndpointDescriptor::builder("/role/{id}", HttpMethod::Get), ack())
            .unwrap()
            .register(EndpointDescriptor::builder("/Role/{key}/", HttpMethod::Get), ack())
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateRoute {
                route: "/Role/{key}/".to_string(),
                method: "GET".to_string(),
            }
        );
    }

    #[test]
    fn same_route_other_verb_is_fine() {
        let registry = Registry::builder()
            .register(EndpointDescriptor::builder("/role/{id}", HttpMethod::Get), ack())
            .unwrap()
            .register(EndpointDescriptor::builder("/role/{id}", HttpMethod::Delete), ack())
            .unwrap()
            .publish()
            .unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn resolve_distinguishes_missing_route_from_wrong_verb() {
        let registry = Registry::builder()
            .register(EndpointDescriptor::builder("/role/{id}", HttpMethod::Get), ack())
            .unwrap()
            .publish()
            .unwrap();

        assert!(matches!(
            registry.resolve("/role/1", HttpMethod::Post),
            Err(DispatchError::MethodNotAllowed { .. })
        ));
        assert!(matches!(
            registry.resolve("/company/1", HttpMethod::Get),
            Err(DispatchError::RouteNotFound { .. })
        ));
    }

    #[test]
    fn literal_templates_beat_placeholders() {
        let registry = Registry::builder()
            .register(EndpointDescriptor::builder("/role/{id}", HttpMethod::Get), ack())
            .unwrap()
            .register(EndpointDescriptor::builder("/role/all", HttpMethod::Get), ack())
            .unwrap()
            .publish()
            .unwrap();

        let matched = registry.resolve("/role/all", HttpMethod::Get).unwrap();
        assert_eq!(matched.descriptor().route(), "/role/all");
        assert!(matched.params().is_empty());

        let matched = registry.resolve("/role/7", HttpMethod::Get).unwrap();
        assert_eq!(matched.params(), &[("id".to_string(), "7".to_string())]);
    }

    #[test]
    fn literal_paths_take_the_shape_index() {
        let registry = Registry::builder()
            .register(EndpointDescriptor::builder("/role/{id}", HttpMethod::Get), ack())
            .unwrap()
            .register(EndpointDescriptor::builder("/role/Current", HttpMethod::Get), ack())
            .unwrap()
            .register(EndpointDescriptor::builder("/role/current", HttpMethod::Delete), ack())
            .unwrap()
            .publish()
            .unwrap();

        let matched = registry.resolve("//ROLE/current/", HttpMethod::Get).unwrap();
        assert_eq!(matched.descriptor().route(), "/role/Current");
        assert!(matched.params().is_empty());

        let matched = registry.resolve("/role/current", HttpMethod::Delete).unwrap();
        assert_eq!(matched.descriptor().method(), HttpMethod::Delete);

        assert!(matches!(
            registry.resolve("/role/current", HttpMethod::Put),
            Err(DispatchError::MethodNotAllowed { .. })
        ));
    }

    #[test]
    fn unknown_filter_fails_publish() {
        let err = Registry::builder()
            .register(
                EndpointDescriptor::builder("/role", HttpMethod::Get).filter("tenant"),
                ack(),
            )
            .unwrap()
            .publish()
            .unwrap_err();
        assert!(matches!(err, RegistryError::MalformedDescriptor { ref reason, .. } if reason.contains("tenant")));
    }

    #[test]
    fn registered_filters_are_found() {
        let registry = Registry::builder()
            .filter("tenant", Pass)
            .register(
                EndpointDescriptor::builder("/role", HttpMethod::Get).filter("tenant"),
                ack(),
            )
            .unwrap()
            .publish()
            .unwrap();
        assert!(registry.filter("tenant").is_some());
        assert!(registry.filter("other").is_none());
    }

    #[test]
    fn descriptors_keep_registration_order() {
        let registry = Registry::builder()
            .register(EndpointDescriptor::builder("/b", HttpMethod::Get).tag("B"), ack())
            .unwrap()
            .register(
                EndpointDescriptor::builder("/a/{id}", HttpMethod::Put)
                    .tag("A")
                    .bind(BindingSpec::route("id", FieldType::Int32)),
                ack(),
            )
            .unwrap()
            .publish()
            .unwrap();
        let routes: Vec<_> = registry.descriptors().map(|d| d.route()).collect();
        assert_eq!(routes, vec!["/b", "/a/{id}"]);
    }

    #[test]
    fn published_registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry<Published>>();
    }
}
