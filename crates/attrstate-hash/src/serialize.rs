use std::fmt::Write;

use attrstate_types::{CoercedFields, ElementSchema, FieldType, TypedValue};

use crate::error::HashError;

/// Serialize an element into the canonical hash input.
///
/// For every schema attribute in ascending name order that is required or
/// optional, emits `name:` followed by the value and a `;`. Absent values
/// emit only the `;`. Fields that the schema does not declare are ignored.
///
/// ```text
/// device_name:/dev/sda2;encrypted:0;iops:0;snapshot_id:;
/// ```
pub fn serialize_for_hash(
    schema: &ElementSchema,
    fields: &CoercedFields,
) -> Result<String, HashError> {
    let mut buf = String::new();
    for (name, attribute) in schema.iter() {
        if !attribute.contributes_to_hash() {
            continue;
        }
        buf.push_str(name);
        buf.push(':');
        if let Some(value) = fields.get(name) {
            write_value(&mut buf, name, attribute.field_type, value)?;
        }
        buf.push(';');
    }
    Ok(buf)
}

fn write_value(
    buf: &mut String,
    name: &str,
    declared: FieldType,
    value: &TypedValue,
) -> Result<(), HashError> {
    match (declared, value) {
        (FieldType::Bool, TypedValue::Bool(b)) => buf.push(if *b { '1' } else { '0' }),
        (FieldType::Int, TypedValue::Int(n)) => {
            let _ = write!(buf, "{n}");
        }
        (FieldType::Float, TypedValue::Float(n)) => buf.push_str(&format_float(*n)),
        (FieldType::String, TypedValue::String(s)) => buf.push_str(s),
        (declared, _) if !declared.is_scalar() => {
            return Err(HashError::UnsupportedType {
                field: name.to_string(),
                field_type: declared,
            })
        }
        (declared, value) => {
            return Err(HashError::TypeMismatch {
                field: name.to_string(),
                declared,
                actual: value.field_type(),
            })
        }
    }
    Ok(())
}

/// Format a float with the shortest digits that round-trip, in `%g` style.
///
/// Exponent notation (`1.5e+06`, exponent at least two digits) is used when
/// the decimal exponent is below -4 or at least 6; plain notation otherwise.
/// Non-finite values are spelled `NaN`, `+Inf` and `-Inf`.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "+Inf" } else { "-Inf" }.to_string();
    }
    let sign = if value.is_sign_negative() { "-" } else { "" };
    if value == 0.0 {
        return format!("{sign}0");
    }
    match shortest_digits(value.abs()) {
        Some((digits, exp)) => format!("{sign}{}", layout(&digits, exp)),
        None => value.to_string(),
    }
}

/// Shortest round-trip decimal digits and the exponent of the first digit.
fn shortest_digits(value: f64) -> Option<(String, i32)> {
    // `{:e}` yields the shortest representation, e.g. "1.234567e6" or "5e-7".
    let sci = format!("{value:e}");
    let (mantissa, exp) = sci.split_once('e')?;
    let exp: i32 = exp.parse().ok()?;
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    Some((digits, exp))
}

fn layout(digits: &str, exp: i32) -> String {
    if exp < -4 || exp >= 6 {
        let (first, rest) = digits.split_at(1);
        let exp_sign = if exp < 0 { '-' } else { '+' };
        let mut out = String::from(first);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        let _ = write!(out, "e{exp_sign}{:02}", exp.unsigned_abs());
        return out;
    }

    // Position of the decimal point relative to the first digit.
    let point = exp + 1;
    let nd = digits.len() as i32;
    if point <= 0 {
        format!("0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
    } else if point >= nd {
        format!("{digits}{}", "0".repeat((point - nd) as usize))
    } else {
        let (int, frac) = digits.split_at(point as usize);
        format!("{int}.{frac}")
    }
}
