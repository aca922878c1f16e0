//! Scan destinations.
//!
//! A `ColumnValue` is anything a single result column can be written into: a
//! leaf field of a record, or a caller-supplied custom target receiver.

use crate::value::{TryGetable, ValueExtractionError, ValueType};
use sea_query::Value;

/// A typed destination for one column value.
pub trait ColumnValue {
    /// Overwrite the destination with `value`.
    ///
    /// On error the destination is left unchanged.
    fn scan_value(&mut self, value: Value) -> Result<(), ValueExtractionError>;

    /// Read the destination back as a `sea_query::Value`.
    fn to_value(&self) -> Value;
}

impl<T: TryGetable + Clone> ColumnValue for T {
    fn scan_value(&mut self, value: Value) -> Result<(), ValueExtractionError> {
        *self = T::try_get(value)?;
        Ok(())
    }

    fn to_value(&self) -> Value {
        ValueType::into_value(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_into_option() {
        let mut dest: Option<i64> = Some(3);
        dest.scan_value(Value::Int(None)).unwrap();
        assert_eq!(dest, None);

        dest.scan_value(Value::Int(Some(9))).unwrap();
        assert_eq!(dest, Some(9));
        assert_eq!(dest.to_value(), Value::BigInt(Some(9)));
    }

    #[test]
    fn test_failed_scan_leaves_destination() {
        let mut dest = String::from("kept");
        let err = dest.scan_value(Value::Int(Some(1))).unwrap_err();
        assert!(matches!(err, ValueExtractionError::TypeMismatch { .. }));
        assert_eq!(dest, "kept");
    }

    #[test]
    fn test_dyn_destination() {
        let mut count = 0i64;
        {
            let dest: &mut dyn ColumnValue = &mut count;
            dest.scan_value(Value::BigInt(Some(25))).unwrap();
        }
        assert_eq!(count, 25);
    }
}
