//! Permissive ("weak") coercion of raw stored strings into schema types.
//!
//! Coercion exists to validate fields and to shape them for the element
//! hasher. The typed values are never written back: the store keeps the
//! original raw strings.

use attrstate_types::{CoercedFields, ElementFields, ElementSchema, FieldType, TypedValue};

/// Why one field failed coercion. Carries no collection/element context;
/// the caller attaches that when converting into a `MigrateError`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CoerceError {
    #[error("{field}: cannot parse {value:?} as {expected}: {reason}")]
    Parse {
        field: String,
        expected: FieldType,
        value: String,
        reason: String,
    },
    #[error("{field}: non-scalar type {field_type}")]
    NonScalarType {
        field: String,
        field_type: FieldType,
    },
    #[error("{field}: not declared in the target schema")]
    Undeclared { field: String },
}

/// Coerce every field of an element to the type `schema` declares for it.
///
/// Fails on the first field that does not parse. Fields the schema does not
/// declare, and declared types that are not scalars, are contract
/// violations reported as their own variants.
pub fn coerce_fields(
    fields: &ElementFields,
    schema: &ElementSchema,
) -> Result<CoercedFields, CoerceError> {
    let mut coerced = CoercedFields::new();
    for (field, raw) in fields {
        let declared = schema.field_type(field).ok_or_else(|| CoerceError::Undeclared {
            field: field.clone(),
        })?;
        let value = coerce_value(raw, declared).map_err(|reason| match reason {
            ValueError::NonScalar => CoerceError::NonScalarType {
                field: field.clone(),
                field_type: declared,
            },
            ValueError::Parse(reason) => CoerceError::Parse {
                field: field.clone(),
                expected: declared,
                value: raw.clone(),
                reason,
            },
        })?;
        coerced.insert(field.clone(), value);
    }
    Ok(coerced)
}

#[derive(Debug)]
enum ValueError {
    NonScalar,
    Parse(String),
}

fn coerce_value(raw: &str, declared: FieldType) -> Result<TypedValue, ValueError> {
    match declared {
        FieldType::Bool => weak_bool(raw).map(TypedValue::Bool).map_err(ValueError::Parse),
        FieldType::Int => weak_int(raw).map(TypedValue::Int).map_err(ValueError::Parse),
        FieldType::Float => weak_float(raw).map(TypedValue::Float).map_err(ValueError::Parse),
        FieldType::String => Ok(TypedValue::String(raw.to_string())),
        FieldType::List | FieldType::Map | FieldType::Set => Err(ValueError::NonScalar),
    }
}

/// Empty is `false`; otherwise the usual spellings of true and false.
pub fn weak_bool(raw: &str) -> Result<bool, String> {
    match raw {
        "" => Ok(false),
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err("invalid boolean syntax".to_string()),
    }
}

/// Empty is `0`; otherwise a signed 64-bit integer with optional base prefix
/// (`0x`, `0b`, `0o`, or a bare leading `0` for octal).
pub fn weak_int(raw: &str) -> Result<i64, String> {
    if raw.is_empty() {
        return Ok(0);
    }
    let (negative, body) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let (radix, digits) = split_radix(body);
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return Err("invalid integer syntax".to_string());
    }
    let magnitude = u64::from_str_radix(digits, radix).map_err(|e| e.to_string())?;

    if negative {
        if magnitude > i64::MIN.unsigned_abs() {
            return Err("number too small to fit in target type".to_string());
        }
        Ok((magnitude as i64).wrapping_neg())
    } else {
        i64::try_from(magnitude).map_err(|_| "number too large to fit in target type".to_string())
    }
}

fn split_radix(body: &str) -> (u32, &str) {
    if let Some(rest) = strip_either(body, "0x", "0X") {
        (16, rest)
    } else if let Some(rest) = strip_either(body, "0b", "0B") {
        (2, rest)
    } else if let Some(rest) = strip_either(body, "0o", "0O") {
        (8, rest)
    } else if body.len() > 1 && body.starts_with('0') {
        (8, &body[1..])
    } else {
        (10, body)
    }
}

fn strip_either<'a>(body: &'a str, lower: &str, upper: &str) -> Option<&'a str> {
    body.strip_prefix(lower).or_else(|| body.strip_prefix(upper))
}

/// Empty is `0.0`; otherwise decimal, exponent, `inf` or `nan` syntax.
pub fn weak_float(raw: &str) -> Result<f64, String> {
    if raw.is_empty() {
        return Ok(0.0);
    }
    raw.parse::<f64>().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrstate_types::AttributeSchema;

    fn schema() -> ElementSchema {
        ElementSchema::new()
            .with_attribute("encrypted", AttributeSchema::optional(FieldType::Bool))
            .with_attribute("iops", AttributeSchema::optional(FieldType::Int))
            .with_attribute("ratio", AttributeSchema::optional(FieldType::Float))
            .with_attribute("device_name", AttributeSchema::required(FieldType::String))
            .with_attribute("tags", AttributeSchema::optional(FieldType::Map))
    }

    fn element(pairs: &[(&str, &str)]) -> ElementFields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn bool_spellings() {
        for raw in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(weak_bool(raw), Ok(true), "{raw}");
        }
        for raw in ["", "0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(weak_bool(raw), Ok(false), "{raw}");
        }
        assert!(weak_bool("yes").is_err());
        assert!(weak_bool("tRUE").is_err());
    }

    #[test]
    fn int_decimal_and_sign() {
        assert_eq!(weak_int(""), Ok(0));
        assert_eq!(weak_int("0"), Ok(0));
        assert_eq!(weak_int("42"), Ok(42));
        assert_eq!(weak_int("+42"), Ok(42));
        assert_eq!(weak_int("-42"), Ok(-42));
        assert_eq!(weak_int("-0"), Ok(0));
    }

    #[test]
    fn int_base_prefixes() {
        assert_eq!(weak_int("0x1F"), Ok(31));
        assert_eq!(weak_int("0X1f"), Ok(31));
        assert_eq!(weak_int("0b101"), Ok(5));
        assert_eq!(weak_int("0o17"), Ok(15));
        assert_eq!(weak_int("017"), Ok(15));
        assert_eq!(weak_int("-0x10"), Ok(-16));
    }

    #[test]
    fn int_rejects_garbage_and_overflow() {
        assert!(weak_int("fast").is_err());
        assert!(weak_int("08").is_err());
        assert!(weak_int("0x").is_err());
        assert!(weak_int("--1").is_err());
        assert!(weak_int("+-1").is_err());
        assert!(weak_int("1.5").is_err());
        assert!(weak_int("9223372036854775808").is_err());
        assert_eq!(weak_int("-9223372036854775808"), Ok(i64::MIN));
        assert!(weak_int("-9223372036854775809").is_err());
    }

    #[test]
    fn int_rejects_digit_separators() {
        assert!(weak_int("1_000").is_err());
        assert!(weak_int("0x_1F").is_err());
        assert!(weak_int("0b1_0").is_err());
    }

    #[test]
    fn float_rejects_hex_notation() {
        assert!(weak_float("0x1p-2").is_err());
        assert!(weak_float("0x10").is_err());
        assert!(weak_float("1_000.5").is_err());
    }

    #[test]
    fn float_parsing() {
        assert_eq!(weak_float(""), Ok(0.0));
        assert_eq!(weak_float("1.5"), Ok(1.5));
        assert_eq!(weak_float("2"), Ok(2.0));
        assert_eq!(weak_float("-1e3"), Ok(-1000.0));
        assert!(weak_float("inf").unwrap().is_infinite());
        assert!(weak_float("one").is_err());
    }

    #[test]
    fn coerces_each_field_to_declared_type() {
        let coerced = coerce_fields(
            &element(&[
                ("encrypted", "false"),
                ("iops", "0"),
                ("ratio", ""),
                ("device_name", "/dev/sda2"),
            ]),
            &schema(),
        )
        .unwrap();
        assert_eq!(coerced["encrypted"], TypedValue::Bool(false));
        assert_eq!(coerced["iops"], TypedValue::Int(0));
        assert_eq!(coerced["ratio"], TypedValue::Float(0.0));
        assert_eq!(coerced["device_name"], TypedValue::String("/dev/sda2".into()));
    }

    #[test]
    fn parse_failure_identifies_field() {
        let err = coerce_fields(&element(&[("iops", "fast")]), &schema()).unwrap_err();
        match err {
            CoerceError::Parse {
                field,
                expected,
                value,
                ..
            } => {
                assert_eq!(field, "iops");
                assert_eq!(expected, FieldType::Int);
                assert_eq!(value, "fast");
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn non_scalar_declared_type_is_distinct_error() {
        let err = coerce_fields(&element(&[("tags", "")]), &schema()).unwrap_err();
        assert_eq!(
            err,
            CoerceError::NonScalarType {
                field: "tags".into(),
                field_type: FieldType::Map,
            }
        );
    }

    #[test]
    fn undeclared_field_is_distinct_error() {
        let err = coerce_fields(&element(&[("legacy", "x")]), &schema()).unwrap_err();
        assert_eq!(err, CoerceError::Undeclared { field: "legacy".into() });
    }
}
