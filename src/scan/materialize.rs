//! Row materialization: write one row's values into a fresh record and the
//! caller's custom receivers, in column order.

use super::descriptor::{leaf_mut, Record};
use super::resolve::{ResolvedMapping, Slot};
use crate::error::{CustomTargetError, MapError};
use crate::value::{ColumnValue, ValueExtractionError};
use sea_query::Value;

pub(crate) fn materialize<T: Record>(
    mapping: &ResolvedMapping,
    values: Vec<Value>,
    receivers: &mut [&mut dyn ColumnValue],
) -> Result<T, MapError> {
    mapping.check_receivers(receivers.len())?;

    let columns = mapping.columns();
    if values.len() != columns.len() {
        return Err(MapError::Decode {
            column: columns.get(values.len()).cloned().unwrap_or_default(),
            source: ValueExtractionError::ConversionError(format!(
                "row has {} values for {} columns",
                values.len(),
                columns.len()
            )),
        });
    }

    let mut record = T::default();
    for ((slot, value), column) in mapping.slots().iter().zip(values).zip(columns) {
        let decode = |source| MapError::Decode {
            column: column.clone(),
            source,
        };
        match slot {
            Slot::Field(path) => {
                let dest = leaf_mut(&mut record, path).ok_or_else(|| {
                    decode(ValueExtractionError::ConversionError(format!(
                        "field path {path:?} does not address a leaf of {}",
                        T::descriptor().type_name()
                    )))
                })?;
                dest.scan_value(value).map_err(decode)?;
            }
            Slot::Custom { ord } => {
                let receivers_len = receivers.len();
                let dest = receivers.get_mut(*ord).ok_or(CustomTargetError::InvalidOrdinal {
                    ord: *ord,
                    receivers: receivers_len,
                })?;
                dest.scan_value(value).map_err(decode)?;
            }
            Slot::Unmatched => {}
        }
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::descriptor::{
        FieldDescriptor, FieldMut, FieldRef, RecordDescriptor, RecordFields,
    };
    use crate::scan::resolve::build;
    use crate::scan::{CustomScanTarget, NameMatch};

    #[derive(Debug, Default, PartialEq)]
    struct Trader {
        id: i64,
        name: Option<String>,
    }

    impl RecordFields for Trader {
        fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>> {
            match index {
                0 => Some(FieldMut::Leaf(&mut self.id)),
                1 => Some(FieldMut::Leaf(&mut self.name)),
                _ => None,
            }
        }

        fn field_ref(&self, index: usize) -> Option<FieldRef<'_>> {
            match index {
                0 => Some(FieldRef::Leaf(&self.id)),
                1 => Some(FieldRef::Leaf(&self.name)),
                _ => None,
            }
        }
    }

    impl Record for Trader {
        fn describe() -> RecordDescriptor {
            RecordDescriptor::new(
                "Trader",
                vec![FieldDescriptor::leaf("id"), FieldDescriptor::leaf("name")],
            )
        }
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_materialize_with_receiver() {
        let mapping = build(
            Trader::descriptor(),
            &columns(&["id", "name", "row_count"]),
            &[CustomScanTarget::new("row_count", 0)],
            NameMatch::Exact,
        )
        .unwrap();

        let mut total = 0i64;
        let trader: Trader = materialize(
            &mapping,
            vec![
                Value::BigInt(Some(3)),
                Value::String(None),
                Value::BigInt(Some(42)),
            ],
            &mut [&mut total],
        )
        .unwrap();
        assert_eq!(trader, Trader { id: 3, name: None });
        assert_eq!(total, 42);
    }

    #[test]
    fn test_receiver_count_checked_before_scan() {
        let mapping = build(
            Trader::descriptor(),
            &columns(&["id", "row_count"]),
            &[CustomScanTarget::new("row_count", 0)],
            NameMatch::Exact,
        )
        .unwrap();

        let err = materialize::<Trader>(
            &mapping,
            vec![Value::BigInt(Some(1)), Value::BigInt(Some(1))],
            &mut [],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MapError::CustomTarget(CustomTargetError::ReceiverCount { expected: 1, actual: 0 })
        ));
    }

    #[test]
    fn test_out_of_range_ordinal() {
        let mapping = build(
            Trader::descriptor(),
            &columns(&["id", "row_count"]),
            &[CustomScanTarget::new("row_count", 3)],
            NameMatch::Exact,
        )
        .unwrap();

        let mut total = 0i64;
        let err = materialize::<Trader>(
            &mapping,
            vec![Value::BigInt(Some(1)), Value::BigInt(Some(1))],
            &mut [&mut total],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MapError::CustomTarget(CustomTargetError::InvalidOrdinal { ord: 3, receivers: 1 })
        ));
    }

    #[test]
    fn test_decode_error_names_column() {
        let mapping = build(Trader::descriptor(), &columns(&["id"]), &[], NameMatch::Exact).unwrap();
        let err = materialize::<Trader>(&mapping, vec![Value::String(Some("x".into()))], &mut [])
            .unwrap_err();
        assert!(matches!(err, MapError::Decode { ref column, .. } if column == "id"));
    }

    #[test]
    fn test_short_row_rejected() {
        let mapping =
            build(Trader::descriptor(), &columns(&["id", "name"]), &[], NameMatch::Exact).unwrap();
        let err = materialize::<Trader>(&mapping, vec![Value::BigInt(Some(1))], &mut [])
            .unwrap_err();
        assert!(matches!(err, MapError::Decode { ref column, .. } if column == "name"));
    }
}
