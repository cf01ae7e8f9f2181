//! Conversion of raw transport strings into typed values.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::descriptor::FieldType;
use crate::error::BindingError;

use super::BoundValue;

/// Converts `raw` for `field` according to its declared type.
///
/// Types are tried in a fixed order: UUID, 32-bit integer, 64-bit integer,
/// boolean, timestamp, enumerated value, then the generic fallbacks (text,
/// float, any). Surrounding whitespace is ignored for every type but text.
pub fn convert(field: &str, raw: &str, ty: FieldType) -> Result<BoundValue, BindingError> {
    let trimmed = raw.trim();
    let converted = match ty {
        FieldType::Uuid => Uuid::parse_str(trimmed).ok().map(BoundValue::Uuid),
        FieldType::Int32 => trimmed.parse().ok().map(BoundValue::Int32),
        FieldType::Int64 => trimmed.parse().ok().map(BoundValue::Int64),
        FieldType::Bool => parse_bool(trimmed).map(BoundValue::Bool),
        FieldType::Timestamp => parse_timestamp(trimmed).map(BoundValue::Timestamp),
        FieldType::Enum(variants) => parse_variant(trimmed, variants).map(BoundValue::Enum),
        FieldType::Text => Some(BoundValue::Text(raw.to_string())),
        FieldType::Float => trimmed
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(BoundValue::Float),
        FieldType::Any => Some(BoundValue::Json(
            serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(raw.to_string())),
        )),
    };

    converted.ok_or_else(|| BindingError::Conversion {
        field: field.to_string(),
        raw: raw.to_string(),
        expected: ty.name(),
    })
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// A variant name matches exactly; a decimal is an index into the variants.
fn parse_variant(s: &str, variants: &[&str]) -> Option<String> {
    if let Some(name) = variants.iter().find(|v| **v == s) {
        return Some((*name).to_string());
    }
    s.parse::<usize>()
        .ok()
        .and_then(|index| variants.get(index))
        .map(|name| (*name).to_string())
}
