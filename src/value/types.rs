//! ValueType trait for type-safe value conversions
//!
//! The `ValueType` trait maps Rust types to their corresponding `sea_query::Value` variant.
//! It is the write side of a scan destination: re-reading a populated record
//! field back into a `Value` goes through `into_value`.
//!
//! ```rust
//! use rowmap::value::ValueType;
//! use sea_query::Value;
//!
//! let value = ValueType::into_value(42i32);
//! assert!(matches!(value, Value::Int(Some(42))));
//!
//! let value = ValueType::into_value(None::<i32>);
//! assert!(matches!(value, Value::Int(None)));
//! ```

use sea_query::Value;

/// Trait for mapping Rust types to their corresponding `sea_query::Value` variant.
pub trait ValueType: Sized {
    /// Convert this value into a `sea_query::Value`.
    fn into_value(self) -> Value;

    /// Convert a `sea_query::Value` into this type, if possible.
    ///
    /// Returns `None` if the value doesn't match the expected variant or is null.
    fn from_value(value: Value) -> Option<Self>;

    /// Return the null variant for this type.
    ///
    /// Used by `Option<T>` to create the appropriate null `Value` variant
    /// when converting `None`.
    fn null_value() -> Value;
}

macro_rules! impl_value_type {
    ($type:ty, $variant:ident) => {
        impl ValueType for $type {
            fn into_value(self) -> Value {
                Value::$variant(Some(self))
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(Some(v)) => Some(v),
                    _ => None,
                }
            }

            fn null_value() -> Value {
                Value::$variant(None)
            }
        }
    };
}

impl_value_type!(bool, Bool);
impl_value_type!(i8, TinyInt);
impl_value_type!(i16, SmallInt);
impl_value_type!(i32, Int);
impl_value_type!(i64, BigInt);
impl_value_type!(u8, TinyUnsigned);
impl_value_type!(u16, SmallUnsigned);
impl_value_type!(u32, Unsigned);
impl_value_type!(u64, BigUnsigned);
impl_value_type!(f32, Float);
impl_value_type!(f64, Double);
impl_value_type!(String, String);
impl_value_type!(Vec<u8>, Bytes);

impl ValueType for serde_json::Value {
    fn into_value(self) -> Value {
        Value::Json(Some(Box::new(self)))
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Json(Some(v)) => Some(*v),
            _ => None,
        }
    }

    fn null_value() -> Value {
        Value::Json(None)
    }
}

// Types whose `Value` payload layout is owned by sea-query; conversion goes
// through its own `ValueType`/`Nullable` impls.
macro_rules! impl_value_type_via_sea_query {
    ($type:ty) => {
        impl ValueType for $type {
            fn into_value(self) -> Value {
                Value::from(self)
            }

            fn from_value(value: Value) -> Option<Self> {
                <$type as sea_query::ValueType>::try_from(value).ok()
            }

            fn null_value() -> Value {
                <$type as sea_query::Nullable>::null()
            }
        }
    };
}

impl_value_type_via_sea_query!(uuid::Uuid);
impl_value_type_via_sea_query!(chrono::NaiveDate);
impl_value_type_via_sea_query!(chrono::NaiveTime);
impl_value_type_via_sea_query!(chrono::NaiveDateTime);
impl_value_type_via_sea_query!(chrono::DateTime<chrono::Utc>);

impl<T: ValueType> ValueType for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => T::into_value(v),
            None => T::null_value(),
        }
    }

    fn from_value(value: Value) -> Option<Self> {
        if is_null(&value) {
            return Some(None);
        }
        T::from_value(value).map(Some)
    }

    fn null_value() -> Value {
        T::null_value()
    }
}

/// Whether `value` is SQL NULL, whatever variant carries it.
///
/// Drivers do not always know the declared type of a NULL column, so a null
/// arriving as `BigInt(None)` must still satisfy an `Option<String>` field.
pub fn is_null(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::String(None)
            | Value::Char(None)
            | Value::Bytes(None)
            | Value::Json(None)
            | Value::Uuid(None)
            | Value::ChronoDate(None)
            | Value::ChronoTime(None)
            | Value::ChronoDateTime(None)
            | Value::ChronoDateTimeUtc(None)
    )
}
