use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::error::BindingError;

/// A raw value after conversion to its declared [`FieldType`](crate::FieldType).
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// From [`FieldType::Uuid`](crate::FieldType::Uuid).
    Uuid(Uuid),
    /// From [`FieldType::Int32`](crate::FieldType::Int32).
    Int32(i32),
    /// From [`FieldType::Int64`](crate::FieldType::Int64).
    Int64(i64),
    /// From [`FieldType::Bool`](crate::FieldType::Bool).
    Bool(bool),
    /// From [`FieldType::Timestamp`](crate::FieldType::Timestamp).
    Timestamp(DateTime<Utc>),
    /// Canonical variant name from [`FieldType::Enum`](crate::FieldType::Enum).
    Enum(String),
    /// From [`FieldType::Text`](crate::FieldType::Text).
    Text(String),
    /// From [`FieldType::Float`](crate::FieldType::Float).
    Float(f64),
    /// From [`FieldType::Any`](crate::FieldType::Any).
    Json(Value),
}

impl BoundValue {
    /// Kind name used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            BoundValue::Uuid(_) => "uuid",
            BoundValue::Int32(_) => "32-bit integer",
            BoundValue::Int64(_) => "64-bit integer",
            BoundValue::Bool(_) => "boolean",
            BoundValue::Timestamp(_) => "timestamp",
            BoundValue::Enum(_) => "enumerated value",
            BoundValue::Text(_) => "text",
            BoundValue::Float(_) => "number",
            BoundValue::Json(_) => "value",
        }
    }

    /// Converts into the Rust type of the field being assigned.
    ///
    /// # Examples
    ///
    /// ```
    /// use dispatch_core::BoundValue;
    ///
    /// let page: i64 = BoundValue::Int32(3).into_field("page").unwrap();
    /// assert_eq!(page, 3);
    ///
    /// let name: Option<String> = BoundValue::Text("Admin".into()).into_field("name").unwrap();
    /// assert_eq!(name.as_deref(), Some("Admin"));
    /// ```
    pub fn into_field<T: FromBoundValue>(self, field: &str) -> Result<T, BindingError> {
        T::from_bound(field, self)
    }

    /// Converts an enumerated value into a serde-deserializable enum.
    pub fn into_enum<E: DeserializeOwned>(self, field: &str) -> Result<E, BindingError> {
        match self {
            BoundValue::Enum(name) | BoundValue::Text(name) => {
                serde_json::from_value(Value::String(name)).map_err(|_| mismatch(field, "text"))
            }
            other => Err(mismatch(field, other.kind())),
        }
    }
}

fn mismatch(field: &str, found: &'static str) -> BindingError {
    BindingError::TypeMismatch {
        field: field.to_string(),
        found,
    }
}

/// Field types a [`BoundValue`] can be assigned to.
pub trait FromBoundValue: Sized {
    /// Converts `value` for `field`, or reports a [`BindingError::TypeMismatch`].
    fn from_bound(field: &str, value: BoundValue) -> Result<Self, BindingError>;
}

macro_rules! from_bound {
    ($ty:ty, $($pat:pat => $out:expr),+ $(,)?) => {
        impl FromBoundValue for $ty {
            fn from_bound(field: &str, value: BoundValue) -> Result<Self, BindingError> {
                match value {
                    $($pat => Ok($out),)+
                    other => Err(mismatch(field, other.kind())),
                }
            }
        }
    };
}

from_bound!(Uuid, BoundValue::Uuid(v) => v);
from_bound!(i32, BoundValue::Int32(v) => v);
from_bound!(i64, BoundValue::Int64(v) => v, BoundValue::Int32(v) => i64::from(v));
from_bound!(bool, BoundValue::Bool(v) => v);
from_bound!(DateTime<Utc>, BoundValue::Timestamp(v) => v);
from_bound!(
    f64,
    BoundValue::Float(v) => v,
    BoundValue::Int32(v) => f64::from(v),
);

impl FromBoundValue for String {
    /// Every value has a textual form.
    fn from_bound(_field: &str, value: BoundValue) -> Result<Self, BindingError> {
        Ok(match value {
            BoundValue::Uuid(v) => v.to_string(),
            BoundValue::Int32(v) => v.to_string(),
            BoundValue::Int64(v) => v.to_string(),
            BoundValue::Bool(v) => v.to_string(),
            BoundValue::Timestamp(v) => v.to_rfc3339(),
            BoundValue::Enum(v) | BoundValue::Text(v) => v,
            BoundValue::Float(v) => v.to_string(),
            BoundValue::Json(Value::String(v)) => v,
            BoundValue::Json(v) => v.to_string(),
        })
    }
}

impl FromBoundValue for Value {
    fn from_bound(_field: &str, value: BoundValue) -> Result<Self, BindingError> {
        Ok(match value {
            BoundValue::Uuid(v) => Value::String(v.to_string()),
            BoundValue::Int32(v) => Value::from(v),
            BoundValue::Int64(v) => Value::from(v),
            BoundValue::Bool(v) => Value::Bool(v),
            BoundValue::Timestamp(v) => Value::String(v.to_rfc3339()),
            BoundValue::Enum(v) | BoundValue::Text(v) => Value::String(v),
            BoundValue::Float(v) => Value::from(v),
            BoundValue::Json(v) => v,
        })
    }
}

impl<T: FromBoundValue> FromBoundValue for Option<T> {
    fn from_bound(field: &str, value: BoundValue) -> Result<Self, BindingError> {
        T::from_bound(field, value).map(Some)
    }
}
