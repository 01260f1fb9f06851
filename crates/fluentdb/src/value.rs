//! Dynamic values exchanged between models, the query builder and the drivers.
//!
//! [`Value`] is the single currency of the crate: reflected field values, bind
//! parameters and decoded columns are all `Value`s. [`FieldType`] bridges
//! concrete Rust field types to and from it, and [`Kind`] describes a field's
//! type at the schema level.

use crate::error::{OrmError, OrmResult};
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::error::Error;
use tokio_postgres::types::{FromSql, IsNull, ToSql, Type, to_sql_checked};
use uuid::Uuid;

/// A dynamically typed scalar.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
    Uuid(Uuid),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
}

impl Value {
    /// Whether this is the zero value of its type (`Null` included).
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(v) => !v,
            Value::I8(v) => *v == 0,
            Value::I16(v) => *v == 0,
            Value::I32(v) => *v == 0,
            Value::I64(v) => *v == 0,
            Value::U8(v) => *v == 0,
            Value::U16(v) => *v == 0,
            Value::U32(v) => *v == 0,
            Value::U64(v) => *v == 0,
            Value::F32(v) => *v == 0.0,
            Value::F64(v) => *v == 0.0,
            Value::String(v) => v.is_empty(),
            Value::Bytes(v) => v.is_empty(),
            Value::Json(v) => v.is_null(),
            Value::Uuid(v) => v.is_nil(),
            Value::Date(v) => *v == NaiveDate::default(),
            Value::Timestamp(v) => *v == NaiveDateTime::default(),
            Value::TimestampTz(v) => *v == DateTime::<Utc>::default(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Json(_) => "json",
            Value::Uuid(_) => "uuid",
            Value::Date(_) => "date",
            Value::Timestamp(_) => "timestamp",
            Value::TimestampTz(_) => "timestamptz",
        }
    }

    /// Integer view over every integer variant.
    pub(crate) fn as_i128(&self) -> Option<i128> {
        match *self {
            Value::I8(v) => Some(v.into()),
            Value::I16(v) => Some(v.into()),
            Value::I32(v) => Some(v.into()),
            Value::I64(v) => Some(v.into()),
            Value::U8(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::U64(v) => Some(v.into()),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v.into()),
            Value::F64(v) => Some(v),
            _ => self.as_i128().map(|v| v as f64),
        }
    }
}

/// Schema-level type of a model field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Bool,
    String,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    Bytes,
    Json,
    Uuid,
    Date,
    Timestamp,
    TimestampTz,
    /// Nested model or collection of models.
    Relation,
    /// The [`MetaData`](crate::MetaData) marker field.
    Metadata,
}

impl Kind {
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Kind::I8
                | Kind::I16
                | Kind::I32
                | Kind::I64
                | Kind::Isize
                | Kind::U8
                | Kind::U16
                | Kind::U32
                | Kind::U64
                | Kind::Usize
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, Kind::F32 | Kind::F64)
    }
}

/// Conversion between a concrete field type and [`Value`].
///
/// Implemented for the scalar types a `#[derive(Model)]` struct may hold, and
/// for `Option<T>` of any of them (`None` maps to [`Value::Null`]).
pub trait FieldType: Sized {
    const KIND: Kind;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> OrmResult<Self>;
}

fn mismatch<T>(expected: &str, got: &Value) -> OrmResult<T> {
    Err(OrmError::conversion(
        "",
        format!("expected {expected}, got {}", got.type_name()),
    ))
}

macro_rules! impl_int_field {
    ($($ty:ty => $kind:ident, $variant:ident, $wide:ty;)*) => {$(
        impl FieldType for $ty {
            const KIND: Kind = Kind::$kind;

            fn to_value(&self) -> Value {
                Value::$variant(*self as $wide)
            }

            fn from_value(value: Value) -> OrmResult<Self> {
                let wide = match &value {
                    Value::String(s) => s.trim().parse::<i128>().ok(),
                    Value::Bool(b) => Some(i128::from(*b)),
                    other => other.as_i128(),
                };
                match wide {
                    Some(v) => <$ty>::try_from(v).map_err(|_| {
                        OrmError::conversion("", format!("{v} out of range for {}", stringify!($ty)))
                    }),
                    None => mismatch(stringify!($ty), &value),
                }
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v as $wide)
            }
        }
    )*};
}

impl_int_field! {
    i8 => I8, I8, i8;
    i16 => I16, I16, i16;
    i32 => I32, I32, i32;
    i64 => I64, I64, i64;
    isize => Isize, I64, i64;
    u8 => U8, U8, u8;
    u16 => U16, U16, u16;
    u32 => U32, U32, u32;
    u64 => U64, U64, u64;
    usize => Usize, U64, u64;
}

impl FieldType for f32 {
    const KIND: Kind = Kind::F32;

    fn to_value(&self) -> Value {
        Value::F32(*self)
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match &value {
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| OrmError::conversion("", format!("invalid f32 `{s}`"))),
            other => match other.as_f64() {
                Some(v) => Ok(v as f32),
                None => mismatch("f32", &value),
            },
        }
    }
}

impl FieldType for f64 {
    const KIND: Kind = Kind::F64;

    fn to_value(&self) -> Value {
        Value::F64(*self)
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match &value {
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| OrmError::conversion("", format!("invalid f64 `{s}`"))),
            other => match other.as_f64() {
                Some(v) => Ok(v),
                None => mismatch("f64", &value),
            },
        }
    }
}

impl FieldType for bool {
    const KIND: Kind = Kind::Bool;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match &value {
            Value::Bool(b) => Ok(*b),
            Value::String(s) => match s.as_str() {
                "true" | "t" | "1" => Ok(true),
                "false" | "f" | "0" => Ok(false),
                _ => Err(OrmError::conversion("", format!("invalid bool `{s}`"))),
            },
            // MySQL reports BOOLEAN columns as TINYINT.
            other => match other.as_i128() {
                Some(v) => Ok(v != 0),
                None => mismatch("bool", &value),
            },
        }
    }
}

impl FieldType for String {
    const KIND: Kind = Kind::String;

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::String(s) => Ok(s),
            Value::Bytes(b) => String::from_utf8(b)
                .map_err(|e| OrmError::conversion("", format!("invalid utf-8: {e}"))),
            other => mismatch("string", &other),
        }
    }
}

impl FieldType for Vec<u8> {
    const KIND: Kind = Kind::Bytes;

    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::String(s) => Ok(s.into_bytes()),
            other => mismatch("bytes", &other),
        }
    }
}

impl FieldType for serde_json::Value {
    const KIND: Kind = Kind::Json;

    fn to_value(&self) -> Value {
        Value::Json(self.clone())
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Json(v) => Ok(v),
            Value::Null => Ok(serde_json::Value::Null),
            Value::String(s) => serde_json::from_str(&s)
                .map_err(|e| OrmError::conversion("", format!("invalid json: {e}"))),
            Value::Bytes(b) => serde_json::from_slice(&b)
                .map_err(|e| OrmError::conversion("", format!("invalid json: {e}"))),
            other => mismatch("json", &other),
        }
    }
}

impl FieldType for Uuid {
    const KIND: Kind = Kind::Uuid;

    fn to_value(&self) -> Value {
        Value::Uuid(*self)
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Uuid(v) => Ok(v),
            Value::String(s) => Uuid::parse_str(&s)
                .map_err(|e| OrmError::conversion("", format!("invalid uuid: {e}"))),
            Value::Bytes(b) => Uuid::from_slice(&b)
                .map_err(|e| OrmError::conversion("", format!("invalid uuid: {e}"))),
            other => mismatch("uuid", &other),
        }
    }
}

impl FieldType for NaiveDate {
    const KIND: Kind = Kind::Date;

    fn to_value(&self) -> Value {
        Value::Date(*self)
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Date(v) => Ok(v),
            Value::Timestamp(v) => Ok(v.date()),
            other => mismatch("date", &other),
        }
    }
}

impl FieldType for NaiveDateTime {
    const KIND: Kind = Kind::Timestamp;

    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Timestamp(v) => Ok(v),
            Value::TimestampTz(v) => Ok(v.naive_utc()),
            other => mismatch("timestamp", &other),
        }
    }
}

impl FieldType for DateTime<Utc> {
    const KIND: Kind = Kind::TimestampTz;

    fn to_value(&self) -> Value {
        Value::TimestampTz(*self)
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::TimestampTz(v) => Ok(v),
            Value::Timestamp(v) => Ok(v.and_utc()),
            other => mismatch("timestamptz", &other),
        }
    }
}

impl<T: FieldType> FieldType for Option<T> {
    const KIND: Kind = T::KIND;

    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> OrmResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::TimestampTz(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ==================== PostgreSQL wire conversions ====================

fn int_to_sql(
    v: i64,
    ty: &Type,
    out: &mut BytesMut,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    match *ty {
        Type::CHAR => i8::try_from(v)?.to_sql(ty, out),
        Type::INT2 => i16::try_from(v)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(v)?.to_sql(ty, out),
        Type::OID => u32::try_from(v)?.to_sql(ty, out),
        Type::FLOAT4 => (v as f32).to_sql(ty, out),
        Type::FLOAT8 => (v as f64).to_sql(ty, out),
        Type::BOOL => (v != 0).to_sql(ty, out),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR => v.to_string().to_sql(ty, out),
        _ => v.to_sql(ty, out),
    }
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            Value::I8(v) => int_to_sql(i64::from(*v), ty, out),
            Value::I16(v) => int_to_sql(i64::from(*v), ty, out),
            Value::I32(v) => int_to_sql(i64::from(*v), ty, out),
            Value::I64(v) => int_to_sql(*v, ty, out),
            Value::U8(v) => int_to_sql(i64::from(*v), ty, out),
            Value::U16(v) => int_to_sql(i64::from(*v), ty, out),
            Value::U32(v) => int_to_sql(i64::from(*v), ty, out),
            Value::U64(v) => int_to_sql(i64::try_from(*v)?, ty, out),
            Value::F32(v) => match *ty {
                Type::FLOAT8 => f64::from(*v).to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Value::F64(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Value::String(v) => match *ty {
                Type::JSON | Type::JSONB => {
                    serde_json::from_str::<serde_json::Value>(v)?.to_sql(ty, out)
                }
                Type::UUID => Uuid::parse_str(v)?.to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Value::Bytes(v) => v.to_sql(ty, out),
            Value::Json(v) => v.to_sql(ty, out),
            Value::Uuid(v) => match *ty {
                Type::TEXT | Type::VARCHAR | Type::BPCHAR => v.to_string().to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Value::Date(v) => v.to_sql(ty, out),
            Value::Timestamp(v) => match *ty {
                Type::TIMESTAMPTZ => v.and_utc().to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
            Value::TimestampTz(v) => match *ty {
                Type::TIMESTAMP => v.naive_utc().to_sql(ty, out),
                _ => v.to_sql(ty, out),
            },
        }
    }

    fn accepts(_: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

impl<'a> FromSql<'a> for Value {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let value = match *ty {
            Type::BOOL => Value::Bool(bool::from_sql(ty, raw)?),
            Type::CHAR => Value::I8(i8::from_sql(ty, raw)?),
            Type::INT2 => Value::I16(i16::from_sql(ty, raw)?),
            Type::INT4 => Value::I32(i32::from_sql(ty, raw)?),
            Type::INT8 => Value::I64(i64::from_sql(ty, raw)?),
            Type::OID => Value::U32(u32::from_sql(ty, raw)?),
            Type::FLOAT4 => Value::F32(f32::from_sql(ty, raw)?),
            Type::FLOAT8 => Value::F64(f64::from_sql(ty, raw)?),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
                Value::String(String::from_sql(ty, raw)?)
            }
            Type::BYTEA => Value::Bytes(Vec::<u8>::from_sql(ty, raw)?),
            Type::JSON | Type::JSONB => Value::Json(serde_json::Value::from_sql(ty, raw)?),
            Type::UUID => Value::Uuid(Uuid::from_sql(ty, raw)?),
            Type::DATE => Value::Date(NaiveDate::from_sql(ty, raw)?),
            Type::TIMESTAMP => Value::Timestamp(NaiveDateTime::from_sql(ty, raw)?),
            Type::TIMESTAMPTZ => Value::TimestampTz(DateTime::<Utc>::from_sql(ty, raw)?),
            _ => return Err(format!("unsupported column type `{ty}`").into()),
        };
        Ok(value)
    }

    fn from_sql_null(_: &Type) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(Value::Null)
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_values() {
        assert!(Value::Null.is_zero());
        assert!(Value::I64(0).is_zero());
        assert!(Value::String(String::new()).is_zero());
        assert!(!Value::Bool(true).is_zero());
        assert!(!Value::F64(0.5).is_zero());
        assert!(Value::Uuid(Uuid::nil()).is_zero());
    }

    #[test]
    fn integers_widen_and_narrow() {
        assert_eq!(i32::from_value(Value::I64(42)).unwrap(), 42);
        assert_eq!(u8::from_value(Value::I16(7)).unwrap(), 7);
        assert_eq!(i64::from_value(Value::String("12".into())).unwrap(), 12);
        assert!(i8::from_value(Value::I64(1000)).is_err());
        assert!(u32::from_value(Value::I32(-1)).is_err());
        assert!(i64::from_value(Value::F64(1.0)).is_err());
    }

    #[test]
    fn platform_width_integers_use_64_bit_values() {
        assert_eq!(5isize.to_value(), Value::I64(5));
        assert_eq!(5usize.to_value(), Value::U64(5));
        assert_eq!(<isize as FieldType>::KIND, Kind::Isize);
    }

    #[test]
    fn option_maps_null() {
        assert_eq!(Option::<String>::from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<String>::from_value(Value::String("a".into())).unwrap(),
            Some("a".to_string())
        );
        assert_eq!(None::<i32>.to_value(), Value::Null);
        assert_eq!(<Option<i32> as FieldType>::KIND, Kind::I32);
    }

    #[test]
    fn bool_accepts_tinyint() {
        assert!(bool::from_value(Value::I8(1)).unwrap());
        assert!(!bool::from_value(Value::I64(0)).unwrap());
        assert!(bool::from_value(Value::String("maybe".into())).is_err());
    }

    #[test]
    fn to_sql_narrows_to_column_type() {
        let mut buf = BytesMut::new();
        Value::I64(7).to_sql(&Type::INT4, &mut buf).unwrap();
        assert_eq!(&buf[..], &7i32.to_be_bytes());

        let mut buf = BytesMut::new();
        assert!(Value::I64(i64::MAX).to_sql(&Type::INT2, &mut buf).is_err());

        let mut buf = BytesMut::new();
        assert!(matches!(
            Value::Null.to_sql(&Type::TEXT, &mut buf).unwrap(),
            IsNull::Yes
        ));
    }

    #[test]
    fn from_sql_decodes_by_column_type() {
        let raw = 42i64.to_be_bytes();
        assert_eq!(Value::from_sql(&Type::INT8, &raw).unwrap(), Value::I64(42));
        assert_eq!(
            Value::from_sql(&Type::TEXT, b"ann").unwrap(),
            Value::String("ann".into())
        );
        assert_eq!(Value::from_sql_null(&Type::INT4).unwrap(), Value::Null);
    }
}
