//! Type-directed assignment of loosely typed values into model fields.
//!
//! Used to write generated keys back after an insert and to apply
//! map-based writes onto a registered model.

use crate::error::{OrmError, OrmResult};
use crate::model::Model;
use crate::value::{Kind, Value};

/// Canonical text of a value: floats with 6 decimals, integers in decimal,
/// strings and bytes as-is. Anything else renders empty.
pub fn to_str(value: &Value) -> String {
    match value {
        Value::F32(v) => format!("{v:.6}"),
        Value::F64(v) => format!("{v:.6}"),
        Value::String(s) => s.clone(),
        Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        other => other
            .as_i128()
            .map(|v| v.to_string())
            .unwrap_or_default(),
    }
}

/// Convert `raw` to a value of `kind`.
pub fn coerce(kind: Kind, raw: &Value) -> OrmResult<Value> {
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let text = to_str(raw);
    let value = match kind {
        Kind::Bool => match raw {
            Value::Bool(b) => Value::Bool(*b),
            _ => match text.as_str() {
                "true" | "1" => Value::Bool(true),
                "false" | "0" | "" => Value::Bool(false),
                _ => return Err(invalid(kind, raw)),
            },
        },
        Kind::String => match raw {
            Value::String(_) | Value::Bytes(_) => Value::String(text),
            _ => return Err(invalid(kind, raw)),
        },
        Kind::I8 => Value::I8(parse_int(kind, raw, &text)?),
        Kind::I16 => Value::I16(parse_int(kind, raw, &text)?),
        Kind::I32 => Value::I32(parse_int(kind, raw, &text)?),
        Kind::I64 => Value::I64(parse_int(kind, raw, &text)?),
        Kind::Isize => Value::I64(parse_int::<isize>(kind, raw, &text)? as i64),
        Kind::U8 => Value::U8(parse_int(kind, raw, &text)?),
        Kind::U16 => Value::U16(parse_int(kind, raw, &text)?),
        Kind::U32 => Value::U32(parse_int(kind, raw, &text)?),
        Kind::U64 => Value::U64(parse_int(kind, raw, &text)?),
        Kind::Usize => Value::U64(parse_int::<usize>(kind, raw, &text)? as u64),
        Kind::F32 => Value::F32(text.trim().parse().map_err(|_| invalid(kind, raw))?),
        Kind::F64 => Value::F64(text.trim().parse().map_err(|_| invalid(kind, raw))?),
        // Non-scalar kinds only accept a value that already has their type.
        Kind::Bytes if matches!(raw, Value::Bytes(_)) => raw.clone(),
        Kind::Json if matches!(raw, Value::Json(_)) => raw.clone(),
        Kind::Uuid if matches!(raw, Value::Uuid(_)) => raw.clone(),
        Kind::Date if matches!(raw, Value::Date(_)) => raw.clone(),
        Kind::Timestamp if matches!(raw, Value::Timestamp(_)) => raw.clone(),
        Kind::TimestampTz if matches!(raw, Value::TimestampTz(_)) => raw.clone(),
        other => {
            return Err(OrmError::conversion(
                "",
                format!("unsupported field kind {other:?}"),
            ));
        }
    };
    Ok(value)
}

/// Assign `raw`, converted to the field's kind, into `target.key`.
///
/// A conversion that yields the zero value leaves the field untouched.
pub fn set_value(target: &mut dyn Model, key: &str, raw: Value) -> OrmResult<()> {
    let schema = target.schema();
    let field = schema.field(key).ok_or_else(|| {
        OrmError::conversion(key, format!("{} has no field `{key}`", schema.name))
    })?;

    let value = coerce(field.kind, &raw).map_err(|e| e.in_field(key))?;
    if value.is_zero() {
        return Ok(());
    }
    target.assign(key, value).map_err(|e| e.in_field(key))
}

fn parse_int<T>(kind: Kind, raw: &Value, text: &str) -> OrmResult<T>
where
    T: std::str::FromStr + TryFrom<i64>,
{
    let text = text.trim();
    if let Ok(v) = text.parse::<T>() {
        return Ok(v);
    }
    // Whole floats such as "42.000000" are accepted.
    match text.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
            T::try_from(f as i64).map_err(|_| invalid(kind, raw))
        }
        _ => Err(invalid(kind, raw)),
    }
}

fn invalid(kind: Kind, raw: &Value) -> OrmError {
    OrmError::conversion(
        "",
        format!("cannot convert {} `{}` to {kind:?}", raw.type_name(), to_str(raw)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_canonical_text() {
        assert_eq!(to_str(&Value::F64(1.5)), "1.500000");
        assert_eq!(to_str(&Value::F32(2.0)), "2.000000");
        assert_eq!(to_str(&Value::I64(-42)), "-42");
        assert_eq!(to_str(&Value::U64(42)), "42");
        assert_eq!(to_str(&Value::Bytes(b"abc".to_vec())), "abc");
        assert_eq!(to_str(&Value::Bool(true)), "");
    }

    #[test]
    fn coerces_across_numeric_kinds() {
        assert_eq!(coerce(Kind::I64, &Value::U64(42)).unwrap(), Value::I64(42));
        assert_eq!(coerce(Kind::I32, &Value::String("7".into())).unwrap(), Value::I32(7));
        assert_eq!(coerce(Kind::U16, &Value::F64(12.0)).unwrap(), Value::U16(12));
        assert_eq!(coerce(Kind::F64, &Value::I32(3)).unwrap(), Value::F64(3.0));
        assert_eq!(coerce(Kind::Usize, &Value::I64(5)).unwrap(), Value::U64(5));
        assert_eq!(
            coerce(Kind::String, &Value::Bytes(b"hi".to_vec())).unwrap(),
            Value::String("hi".into())
        );
        assert_eq!(coerce(Kind::Bool, &Value::String("1".into())).unwrap(), Value::Bool(true));
    }

    #[test]
    fn rejects_bad_input_and_unsupported_kinds() {
        assert!(coerce(Kind::I8, &Value::I64(300)).is_err());
        assert!(coerce(Kind::I64, &Value::String("abc".into())).is_err());
        assert!(coerce(Kind::I64, &Value::F64(1.5)).is_err());
        assert!(coerce(Kind::String, &Value::I64(1)).is_err());
        assert!(coerce(Kind::Uuid, &Value::String("x".into())).is_err());
        assert!(coerce(Kind::Json, &Value::String("{}".into())).is_err());
    }

    #[test]
    fn passes_through_values_of_the_target_type() {
        let id = uuid::Uuid::new_v4();
        assert_eq!(coerce(Kind::Uuid, &Value::Uuid(id)).unwrap(), Value::Uuid(id));
        let doc = serde_json::json!({"a": 1});
        assert_eq!(coerce(Kind::Json, &Value::Json(doc.clone())).unwrap(), Value::Json(doc));
    }

    #[test]
    fn null_coerces_to_null() {
        assert_eq!(coerce(Kind::I64, &Value::Null).unwrap(), Value::Null);
        assert_eq!(coerce(Kind::Uuid, &Value::Null).unwrap(), Value::Null);
    }
}
