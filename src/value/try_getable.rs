//! TryGetable trait for safe value extraction
//!
//! Extraction from `sea_query::Value` that distinguishes NULL, type mismatch
//! and out-of-range conversions. Integer targets accept any integer variant
//! whose value fits, since drivers report integers at their own width.

use crate::value::types::is_null;
use crate::value::ValueType;
use sea_query::Value;

/// Error type for value extraction failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExtractionError {
    /// The value is null (None variant)
    NullValue,
    /// The value type doesn't match the expected type
    TypeMismatch { expected: String, actual: String },
    /// Value conversion failed (e.g., overflow, invalid format)
    ConversionError(String),
}

impl std::fmt::Display for ValueExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueExtractionError::NullValue => write!(f, "Value is null"),
            ValueExtractionError::TypeMismatch { expected, actual } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, actual)
            }
            ValueExtractionError::ConversionError(msg) => {
                write!(f, "Conversion error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ValueExtractionError {}

/// Trait for safe value extraction with error handling
///
/// ```rust
/// use rowmap::value::{TryGetable, ValueExtractionError};
/// use sea_query::Value;
///
/// let result: Result<i32, ValueExtractionError> = TryGetable::try_get(Value::Int(Some(42)));
/// assert_eq!(result, Ok(42));
///
/// let result: Result<i32, ValueExtractionError> = TryGetable::try_get(Value::Int(None));
/// assert!(matches!(result, Err(ValueExtractionError::NullValue)));
/// ```
pub trait TryGetable: ValueType {
    /// Try to extract a value from `sea_query::Value`, returning an error if extraction fails.
    fn try_get(value: Value) -> Result<Self, ValueExtractionError>;

    /// Try to extract a value, allowing null values to return `None`.
    fn try_get_opt(value: Value) -> Result<Option<Self>, ValueExtractionError> {
        match Self::try_get(value) {
            Ok(v) => Ok(Some(v)),
            Err(ValueExtractionError::NullValue) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn mismatch(expected: &str, value: &Value) -> ValueExtractionError {
    ValueExtractionError::TypeMismatch {
        expected: expected.to_string(),
        actual: format!("{:?}", value),
    }
}

fn integer_of(value: &Value) -> Option<i128> {
    match value {
        Value::TinyInt(Some(v)) => Some(i128::from(*v)),
        Value::SmallInt(Some(v)) => Some(i128::from(*v)),
        Value::Int(Some(v)) => Some(i128::from(*v)),
        Value::BigInt(Some(v)) => Some(i128::from(*v)),
        Value::TinyUnsigned(Some(v)) => Some(i128::from(*v)),
        Value::SmallUnsigned(Some(v)) => Some(i128::from(*v)),
        Value::Unsigned(Some(v)) => Some(i128::from(*v)),
        Value::BigUnsigned(Some(v)) => Some(i128::from(*v)),
        _ => None,
    }
}

macro_rules! impl_try_getable_int {
    ($type:ty) => {
        impl TryGetable for $type {
            fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
                if is_null(&value) {
                    return Err(ValueExtractionError::NullValue);
                }
                match integer_of(&value) {
                    Some(v) => <$type>::try_from(v).map_err(|_| {
                        ValueExtractionError::ConversionError(format!(
                            "{} is out of range for {}",
                            v,
                            stringify!($type)
                        ))
                    }),
                    None => Err(mismatch("integer", &value)),
                }
            }
        }
    };
}

impl_try_getable_int!(i8);
impl_try_getable_int!(i16);
impl_try_getable_int!(i32);
impl_try_getable_int!(i64);
impl_try_getable_int!(u8);
impl_try_getable_int!(u16);
impl_try_getable_int!(u32);
impl_try_getable_int!(u64);

macro_rules! impl_try_getable {
    ($type:ty, $variant:ident, $expected:expr) => {
        impl TryGetable for $type {
            fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
                match value {
                    Value::$variant(Some(v)) => Ok(v),
                    ref other if is_null(other) => Err(ValueExtractionError::NullValue),
                    other => Err(mismatch($expected, &other)),
                }
            }
        }
    };
}

impl_try_getable!(bool, Bool, "Bool");
impl_try_getable!(f32, Float, "Float");
impl_try_getable!(Vec<u8>, Bytes, "Bytes");

impl TryGetable for f64 {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Double(Some(v)) => Ok(v),
            Value::Float(Some(v)) => Ok(f64::from(v)),
            ref other if is_null(other) => Err(ValueExtractionError::NullValue),
            other => Err(mismatch("Double", &other)),
        }
    }
}

impl TryGetable for String {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::String(Some(v)) => Ok(v),
            Value::Char(Some(c)) => Ok(c.to_string()),
            ref other if is_null(other) => Err(ValueExtractionError::NullValue),
            other => Err(mismatch("String", &other)),
        }
    }
}

impl TryGetable for serde_json::Value {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        match value {
            Value::Json(Some(v)) => Ok(*v),
            ref other if is_null(other) => Err(ValueExtractionError::NullValue),
            other => Err(mismatch("Json", &other)),
        }
    }
}

macro_rules! impl_try_getable_via_sea_query {
    ($type:ty, $expected:expr) => {
        impl TryGetable for $type {
            fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
                if is_null(&value) {
                    return Err(ValueExtractionError::NullValue);
                }
                let actual = format!("{:?}", value);
                <$type as sea_query::ValueType>::try_from(value).map_err(|_| {
                    ValueExtractionError::TypeMismatch {
                        expected: $expected.to_string(),
                        actual,
                    }
                })
            }
        }
    };
}

impl_try_getable_via_sea_query!(uuid::Uuid, "Uuid");
impl_try_getable_via_sea_query!(chrono::NaiveDate, "ChronoDate");
impl_try_getable_via_sea_query!(chrono::NaiveTime, "ChronoTime");
impl_try_getable_via_sea_query!(chrono::NaiveDateTime, "ChronoDateTime");
impl_try_getable_via_sea_query!(chrono::DateTime<chrono::Utc>, "ChronoDateTimeUtc");

impl<T: TryGetable> TryGetable for Option<T> {
    fn try_get(value: Value) -> Result<Self, ValueExtractionError> {
        T::try_get_opt(value)
    }

    fn try_get_opt(value: Value) -> Result<Option<Self>, ValueExtractionError> {
        T::try_get_opt(value).map(Some)
    }
}
