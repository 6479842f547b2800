//! Raw text cell → typed value.
//!
//! Blank cells (absent or empty) are resolved from the field as a whole:
//! a schema default when `write_defaults` is on, the null branch of a
//! nullable union, an empty array. Anything else blank is an error.
//! Non-blank text is parsed against the declared type; unions try their
//! non-null branches in declared order and the first that parses wins.

use crate::config::ConvertOptions;
use crate::error::CoercionError;
use crate::schema::{SchemaField, SchemaType};
use crate::value::Value;

/// Coerces one raw cell against `field`.
pub fn coerce(
    raw: Option<&str>,
    field: &SchemaField,
    options: &ConvertOptions,
) -> Result<Value, CoercionError> {
    match raw.filter(|s| !s.is_empty()) {
        None => coerce_blank(field, options),
        Some(text) => coerce_text(text, &field.ty, options)
            .ok_or_else(|| CoercionError::new(&field.name, text, &field.ty)),
    }
}

/// Whether a blank cell for `field` resolves without error.
pub fn accepts_blank(field: &SchemaField, options: &ConvertOptions) -> bool {
    (options.write_defaults && field.default.is_some())
        || field.is_nullable()
        || matches!(field.ty, SchemaType::Array(_))
}

fn coerce_blank(field: &SchemaField, options: &ConvertOptions) -> Result<Value, CoercionError> {
    if options.write_defaults {
        if let Some(raw) = &field.default {
            return field
                .default_value()
                .ok()
                .flatten()
                .ok_or_else(|| CoercionError::new(&field.name, &raw.to_string(), &field.ty));
        }
    }

    match &field.ty {
        ty @ SchemaType::Union(_) => match ty.null_index() {
            Some(idx) => Ok(Value::Union(idx as u32, Box::new(Value::Null))),
            None => Err(CoercionError::new(&field.name, "", ty)),
        },
        SchemaType::Array(_) => Ok(Value::Array(Vec::new())),
        ty => Err(CoercionError::new(&field.name, "", ty)),
    }
}

fn coerce_text(text: &str, ty: &SchemaType, options: &ConvertOptions) -> Option<Value> {
    match ty {
        SchemaType::Null => None,
        SchemaType::Int => text.parse().ok().map(Value::Int),
        SchemaType::Long => text.parse().ok().map(Value::Long),
        // Decimal text only: "NaN" and "inf" spellings are rejected.
        SchemaType::Float => text.parse::<f32>().ok().filter(|f| f.is_finite()).map(Value::Float),
        SchemaType::Double => text.parse::<f64>().ok().filter(|d| d.is_finite()).map(Value::Double),
        SchemaType::Boolean => match text {
            "true" => Some(Value::Boolean(true)),
            "false" => Some(Value::Boolean(false)),
            _ => None,
        },
        SchemaType::String => Some(Value::String(text.to_string())),
        SchemaType::Bytes => Some(Value::Bytes(text.as_bytes().to_vec())),
        SchemaType::Array(item) => text
            .split(options.array_delimiter.as_str())
            .map(|piece| coerce_text(piece, item, options))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        SchemaType::Union(branches) => branches
            .iter()
            .enumerate()
            .filter(|(_, b)| **b != SchemaType::Null)
            .find_map(|(idx, b)| {
                coerce_text(text, b, options).map(|v| Value::Union(idx as u32, Box::new(v)))
            }),
    }
}
