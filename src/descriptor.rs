//! Endpoint descriptors: the static metadata behind every route.
//!
//! A descriptor is declared once with [`EndpointDescriptor::builder`] and
//! checked when it is registered. Nothing about it changes afterwards.

use std::any::{type_name, TypeId};
use std::fmt;

use crate::error::RegistryError;
use crate::handler::Request;
use crate::method::HttpMethod;
use crate::registry::route::RouteTemplate;

/// Where a request field's raw value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingSource {
    /// A `{name}` placeholder of the route template.
    Route,
    /// The query string.
    Query,
    /// The decoded request body.
    Body,
}

impl fmt::Display for BindingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BindingSource::Route => "route",
            BindingSource::Query => "query",
            BindingSource::Body => "body",
        })
    }
}

/// The semantic type a raw string is converted to before assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// A UUID in any of its textual forms.
    Uuid,
    /// A signed 32-bit integer.
    Int32,
    /// A signed 64-bit integer.
    Int64,
    /// `true` or `false`, in any case.
    Bool,
    /// A UTC timestamp.
    Timestamp,
    /// One of a fixed set of variant names.
    Enum(&'static [&'static str]),
    /// Free text.
    Text,
    /// A 64-bit float.
    Float,
    /// Whatever the raw value parses to as JSON, else text.
    Any,
}

impl FieldType {
    /// Short name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Uuid => "uuid",
            FieldType::Int32 => "32-bit integer",
            FieldType::Int64 => "64-bit integer",
            FieldType::Bool => "boolean",
            FieldType::Timestamp => "timestamp",
            FieldType::Enum(_) => "enumerated value",
            FieldType::Text => "text",
            FieldType::Float => "number",
            FieldType::Any => "value",
        }
    }
}

/// Declared binding intent for one request field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingSpec {
    field: String,
    source: Option<BindingSource>,
    ty: FieldType,
}

impl BindingSpec {
    /// Binds `field` from the route placeholder of the same name.
    pub fn route(field: impl Into<String>, ty: FieldType) -> Self {
        Self::with_source(field, Some(BindingSource::Route), ty)
    }

    /// Binds `field` from the query string.
    pub fn query(field: impl Into<String>, ty: FieldType) -> Self {
        Self::with_source(field, Some(BindingSource::Query), ty)
    }

    /// Binds `field` from the body.
    pub fn body(field: impl Into<String>, ty: FieldType) -> Self {
        Self::with_source(field, Some(BindingSource::Body), ty)
    }

    /// Binds `field` from the verb's default source: body for POST, PUT and
    /// PATCH, query otherwise.
    pub fn inferred(field: impl Into<String>, ty: FieldType) -> Self {
        Self::with_source(field, None, ty)
    }

    fn with_source(field: impl Into<String>, source: Option<BindingSource>, ty: FieldType) -> Self {
        Self {
            field: field.into(),
            source,
            ty,
        }
    }

    /// Field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Declared source, if any.
    pub fn declared_source(&self) -> Option<BindingSource> {
        self.source
    }

    /// The source actually used for `method`.
    pub fn effective_source(&self, method: HttpMethod) -> BindingSource {
        match self.source {
            Some(source) => source,
            None if method.carries_body() => BindingSource::Body,
            None => BindingSource::Query,
        }
    }

    /// Declared semantic type.
    pub fn field_type(&self) -> FieldType {
        self.ty
    }
}

/// Who may call an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthRequirement {
    /// No requirement; the principal is not consulted.
    #[default]
    None,
    /// Any authenticated caller.
    Required,
    /// An authenticated caller that every listed policy grants, checked in order.
    Policies(Vec<String>),
    /// Explicitly open, overriding any other declaration.
    Anonymous,
}

/// Immutable metadata for one (route, verb) endpoint.
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    template: RouteTemplate,
    method: HttpMethod,
    tag: Option<String>,
    auth: AuthRequirement,
    filters: Vec<String>,
    bindings: Vec<BindingSpec>,
    request_type: &'static str,
    response_type: &'static str,
}

impl EndpointDescriptor {
    /// Starts declaring an endpoint.
    ///
    /// # Examples
    ///
    /// ```
    /// use dispatch_core::{BindingSpec, EndpointDescriptor, FieldType, HttpMethod};
    ///
    /// let declared = EndpointDescriptor::builder("/role/update/{Id}", HttpMethod::Put)
    ///     .tag("Roles")
    ///     .require_authenticated()
    ///     .bind(BindingSpec::route("Id", FieldType::Uuid));
    /// ```
    pub fn builder(route: impl Into<String>, method: HttpMethod) -> DescriptorBuilder {
        DescriptorBuilder {
            route: route.into(),
            method,
            tag: None,
            anonymous: false,
            auth: AuthRequirement::None,
            filters: Vec::new(),
            bindings: Vec::new(),
        }
    }

    /// Route template as declared.
    pub fn route(&self) -> &str {
        self.template.as_str()
    }

    /// Verb.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Grouping tag, if declared.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Authorization requirement.
    pub fn auth(&self) -> &AuthRequirement {
        &self.auth
    }

    /// Filter names in run order.
    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    /// Binding specs in declaration order.
    pub fn bindings(&self) -> &[BindingSpec] {
        &self.bindings
    }

    /// Rust type name of the request.
    pub fn request_type(&self) -> &'static str {
        self.request_type
    }

    /// Rust type name of the response.
    pub fn response_type(&self) -> &'static str {
        self.response_type
    }

    pub(crate) fn template(&self) -> &RouteTemplate {
        &self.template
    }
}

/// Builder returned by [`EndpointDescriptor::builder`].
#[derive(Debug, Clone)]
#[must_use = "a declared endpoint does nothing until it is registered"]
pub struct DescriptorBuilder {
    route: String,
    method: HttpMethod,
    tag: Option<String>,
    anonymous: bool,
    auth: AuthRequirement,
    filters: Vec<String>,
    bindings: Vec<BindingSpec>,
}

impl DescriptorBuilder {
    /// Sets the grouping tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Requires an authenticated caller.
    pub fn require_authenticated(mut self) -> Self {
        if self.auth == AuthRequirement::None {
            self.auth = AuthRequirement::Required;
        }
        self
    }

    /// Requires an authenticated caller granted by `policy`.
    ///
    /// Policies are checked in the order they are added. Adding the same
    /// policy twice checks it once.
    pub fn require_policy(mut self, policy: impl Into<String>) -> Self {
        let policy = policy.into();
        match &mut self.auth {
            AuthRequirement::Policies(policies) => {
                if !policies.contains(&policy) {
                    policies.push(policy);
                }
            }
            _ => self.auth = AuthRequirement::Policies(vec![policy]),
        }
        self
    }

    /// Opens the endpoint to anyone, whatever else was required.
    pub fn allow_anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// Appends a filter reference.
    pub fn filter(mut self, name: impl Into<String>) -> Self {
        self.filters.push(name.into());
        self
    }

    /// Adds a binding spec.
    pub fn bind(mut self, spec: BindingSpec) -> Self {
        self.bindings.push(spec);
        self
    }

    /// Checks the declaration against request type `R` and freezes it.
    pub(crate) fn build<R: Request>(self) -> Result<EndpointDescriptor, RegistryError> {
        let template =
            RouteTemplate::parse(&self.route).map_err(|reason| RegistryError::malformed(&self.route, reason))?;

        if TypeId::of::<R::Response>() == TypeId::of::<()>() {
            return Err(RegistryError::malformed(
                &self.route,
                format!("{} declares no result type", type_name::<R>()),
            ));
        }

        let bindings = check_bindings(&self.route, &template, self.method, self.bindings)?;

        let auth = if self.anonymous {
            AuthRequirement::Anonymous
        } else {
            self.auth
        };

        Ok(EndpointDescriptor {
            template,
            method: self.method,
            tag: self.tag,
            auth,
            filters: self.filters,
            bindings,
            request_type: type_name::<R>(),
            response_type: type_name::<R::Response>(),
        })
    }
}

fn check_bindings(
    route: &str,
    template: &RouteTemplate,
    method: HttpMethod,
    specs: Vec<BindingSpec>,
) -> Result<Vec<BindingSpec>, RegistryError> {
    let mut accepted: Vec<BindingSpec> = Vec::with_capacity(specs.len());

    for spec in specs {
        if spec.field.is_empty() {
            return Err(RegistryError::malformed(route, "binding field name is empty"));
        }

        if let Some(existing) = accepted.iter().find(|s| s.field == spec.field) {
            if *existing == spec {
                continue;
            }
            let reason = if existing.source != spec.source {
                format!("field '{}' declares more than one binding source", spec.field)
            } else {
                format!("field '{}' declares conflicting types", spec.field)
            };
            return Err(RegistryError::malformed(route, reason));
        }

        match spec.effective_source(method) {
            BindingSource::Route if !template.has_param(&spec.field) => {
                return Err(RegistryError::malformed(
                    route,
                    format!("route-bound field '{}' is not a placeholder", spec.field),
                ));
            }
            BindingSource::Body if !method.carries_body() => {
                return Err(RegistryError::malformed(
                    route,
                    format!("field '{}' is body-bound but {} carries no body", spec.field, method),
                ));
            }
            _ => {}
        }

        accepted.push(spec);
    }

    Ok(accepted)
}
