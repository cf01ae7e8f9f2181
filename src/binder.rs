//! The parameter binder.
//!
//! Reconstructs a typed request from a [`ValueSources`] bundle following the
//! descriptor's [`BindingSpec`](crate::BindingSpec)s:
//!
//! 1. For POST, PUT and PATCH with a non-blank body, the body is decoded as a
//!    whole into the request type. Otherwise the request starts from
//!    `Default`.
//! 2. Every route- or query-sourced spec is then overlaid. A value present in
//!    the URL always replaces what the body said; an absent one leaves the
//!    field untouched.

mod convert;
mod sources;
mod value;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::descriptor::{BindingSource, EndpointDescriptor};
use crate::error::BindingError;

pub use convert::convert;
pub use sources::ValueSources;
pub use value::{BoundValue, FromBoundValue};

/// A request type the binder can build.
///
/// `DeserializeOwned` covers the body; `Default` is the starting point when
/// there is none (mark the struct `#[serde(default)]` so a partial body
/// fills in the rest the same way). [`assign`](Self::assign) receives the
/// converted URL values.
///
/// # Examples
///
/// ```
/// use dispatch_core::{Bind, BindingError, BoundValue};
/// use serde::Deserialize;
/// use uuid::Uuid;
///
/// #[derive(Debug, Default, Deserialize)]
/// #[serde(default)]
/// struct GetCompany {
///     id: Uuid,
/// }
///
/// impl Bind for GetCompany {
///     fn assign(&mut self, field: &str, value: BoundValue) -> Result<(), BindingError> {
///         match field {
///             "id" => self.id = value.into_field(field)?,
///             other => return Err(BindingError::unknown_field(other)),
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Bind: DeserializeOwned + Default {
    /// Stores a converted value into `field`.
    ///
    /// Return [`BindingError::unknown_field`] for names the type does not
    /// have.
    fn assign(&mut self, field: &str, value: BoundValue) -> Result<(), BindingError>;
}

/// Decodes raw body bytes into a JSON document.
#[async_trait]
pub trait BodyDecoder: Send + Sync {
    /// Decodes `body`, or reports why it cannot be read.
    async fn decode(&self, body: &[u8]) -> Result<Value, BindingError>;
}

/// The default [`BodyDecoder`]: the body is JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBodyDecoder;

#[async_trait]
impl BodyDecoder for JsonBodyDecoder {
    async fn decode(&self, body: &[u8]) -> Result<Value, BindingError> {
        serde_json::from_slice(body).map_err(|e| BindingError::Body {
            reason: e.to_string(),
        })
    }
}

/// Builds request instances from descriptors and value sources.
#[derive(Clone)]
pub struct Binder {
    decoder: Arc<dyn BodyDecoder>,
}

impl std::fmt::Debug for Binder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binder").finish_non_exhaustive()
    }
}

impl Default for Binder {
    fn default() -> Self {
        Self::new(Arc::new(JsonBodyDecoder))
    }
}

impl Binder {
    /// Creates a binder over a body decoder.
    pub fn new(decoder: Arc<dyn BodyDecoder>) -> Self {
        Self { decoder }
    }

    /// Binds a request of type `R` for `descriptor` from `sources`.
    pub async fn bind<R: Bind>(
        &self,
        descriptor: &EndpointDescriptor,
        sources: &ValueSources,
    ) -> Result<R, BindingError> {
        let method = descriptor.method();

        let mut request = if method.carries_body() && sources.has_body() {
            let document = self.decoder.decode(sources.body()).await?;
            serde_json::from_value::<R>(document).map_err(|e| BindingError::Body {
                reason: e.to_string(),
            })?
        } else {
            R::default()
        };

        for spec in descriptor.bindings() {
            let source = spec.effective_source(method);
            if source == BindingSource::Body {
                continue;
            }
            let Some(raw) = sources.url_value(source, spec.field()) else {
                continue;
            };
            let value = convert(spec.field(), &raw, spec.field_type())?;
            request.assign(spec.field(), value)?;
        }

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{BindingSpec, FieldType};
    use crate::handler::Request;
    use crate::method::HttpMethod;
    use crate::redact::Redact;
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    #[serde(default, rename_all = "PascalCase")]
    struct UpdateRole {
        id: String,
        name: String,
        rank: i32,
    }

    impl Bind for UpdateRole {
        fn assign(&mut self, field: &str, value: BoundValue) -> Result<(), BindingError> {
            match field {
                "Id" => self.id = value.into_field(field)?,
                "Name" => self.name = value.into_field(field)?,
                "Rank" => self.rank = value.into_field(field)?,
                other => return Err(BindingError::unknown_field(other)),
            }
            Ok(())
        }
    }

    #[derive(Debug, Serialize)]
    struct Done;

    impl Redact for Done {}

    impl Request for UpdateRole {
        type Response = Done;
    }

    #[derive(Debug, Default, Deserialize)]
    struct FindCompany {
        id: Option<Uuid>,
    }

    impl Bind for FindCompany {
        fn assign(&mut self, field: &str, value: BoundValue) -> Result<(), BindingError> {
            match field {
                "id" => self.id = value.into_field(field)?,
                other => return Err(BindingError::unknown_field(other)),
            }
            Ok(())
        }
    }

    impl Request for FindCompany {
        type Response = Done;
    }

    fn update_descriptor() -> EndpointDescriptor {
        EndpointDescriptor::builder("/role/update/{Id}", HttpMethod::Put)
            .bind(BindingSpec::route("Id", FieldType::Text))
            .bind(BindingSpec::query("Rank", FieldType::Int32))
            .build::<UpdateRole>()
            .unwrap()
    }

    fn find_descriptor() -> EndpointDescriptor {
        EndpointDescriptor::builder("/company", HttpMethod::Get)
            .bind(BindingSpec::inferred("id", FieldType::Uuid))
            .build::<FindCompany>()
            .unwrap()
    }

    #[tokio::test]
    async fn route_value_overrides_body() {
        let sources = ValueSources::new()
            .with_route_value("Id", "abc123")
            .with_body(r#"{"Id":"ignored-value","Name":"Admin"}"#);

        let bound: UpdateRole = Binder::default()
            .bind(&update_descriptor(), &sources)
            .await
            .unwrap();

        assert_eq!(bound.id, "abc123");
        assert_eq!(bound.name, "Admin");
    }

    #[tokio::test]
    async fn empty_body_starts_from_default() {
        let sources = ValueSources::new()
            .with_route_value("Id", "r-1")
            .with_query_value("rank", "3");

        let bound: UpdateRole = Binder::default()
            .bind(&update_descriptor(), &sources)
            .await
            .unwrap();

        assert_eq!(
            bound,
            UpdateRole {
                id: "r-1".to_string(),
                name: String::new(),
                rank: 3,
            }
        );
    }

    #[tokio::test]
    async fn malformed_body_is_a_binding_error_on_body() {
        let sources = ValueSources::new().with_body("{not json");
        let err = Binder::default()
            .bind::<UpdateRole>(&update_descriptor(), &sources)
            .await
            .unwrap_err();
        assert_eq!(err.field(), "body");
    }

    #[tokio::test]
    async fn absent_query_value_leaves_none() {
        let bound: FindCompany = Binder::default()
            .bind(&find_descriptor(), &ValueSources::new())
            .await
            .unwrap();
        assert_eq!(bound.id, None);
    }

    #[tokio::test]
    async fn bad_guid_in_query_names_the_field() {
        let sources = ValueSources::new().with_query_value("id", "not-a-guid");
        let err = Binder::default()
            .bind::<FindCompany>(&find_descriptor(), &sources)
            .await
            .unwrap_err();
        assert_eq!(err.field(), "id");
    }

    #[tokio::test]
    async fn get_ignores_any_body() {
        let id = Uuid::new_v4();
        let sources = ValueSources::new()
            .with_query_value("ID", id.to_string())
            .with_body("garbage that would not decode");
        let bound: FindCompany = Binder::default()
            .bind(&find_descriptor(), &sources)
            .await
            .unwrap();
        assert_eq!(bound.id, Some(id));
    }

    #[tokio::test]
    async fn unknown_field_is_reported() {
        let descriptor = EndpointDescriptor::builder("/company", HttpMethod::Get)
            .bind(BindingSpec::query("size", FieldType::Int32))
            .build::<FindCompany>()
            .unwrap();
        let sources = ValueSources::new().with_query_value("size", "10");
        let err = Binder::default()
            .bind::<FindCompany>(&descriptor, &sources)
            .await
            .unwrap_err();
        assert_eq!(err, BindingError::unknown_field("size"));
    }

    struct RejectingDecoder;

    #[async_trait]
    impl BodyDecoder for RejectingDecoder {
        async fn decode(&self, _body: &[u8]) -> Result<Value, BindingError> {
            Err(BindingError::Body {
                reason: "unsupported media type".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn custom_decoder_is_used_for_bodies() {
        let binder = Binder::new(Arc::new(RejectingDecoder));
        let sources = ValueSources::new().with_body("{}");
        let err = binder
            .bind::<UpdateRole>(&update_descriptor(), &sources)
            .await
            .unwrap_err();
        assert!(matches!(err, BindingError::Body { ref reason } if reason == "unsupported media type"));
    }
}
