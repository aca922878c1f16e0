//! Custom scan targets: result columns written into caller-supplied receivers
//! instead of record fields.

use super::resolve::Slot;
use crate::error::{CustomTargetError, MapError};
use std::collections::BTreeSet;

/// Routes the result column named `column` into receiver number `ord`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomScanTarget {
    pub column: String,
    pub ord: usize,
}

impl CustomScanTarget {
    pub fn new(column: impl Into<String>, ord: usize) -> Self {
        Self {
            column: column.into(),
            ord,
        }
    }
}

/// Cache-key signature of a target list; order-sensitive.
pub(crate) fn signature(targets: &[CustomScanTarget]) -> String {
    let mut out = String::new();
    for target in targets {
        out.push_str(&target.column);
        out.push('\0');
        out.push_str(&target.ord.to_string());
        out.push('\0');
    }
    out
}

/// Claim result positions for `targets`. Returns the number of receivers a
/// scan has to supply.
///
/// Columns are bound one at a time: every position no record field holds goes
/// to the first target with its exact column name, so one target may feed
/// several same-named columns. A target that ends up with no column is an
/// error, reported as a duplicate when an earlier target already holds the
/// position it names.
pub(crate) fn assign(
    slots: &mut [Slot],
    columns: &[String],
    targets: &[CustomScanTarget],
) -> Result<usize, MapError> {
    let mut claimed = vec![None; targets.len()];

    for (position, (column, slot)) in columns.iter().zip(slots.iter_mut()).enumerate() {
        if *slot != Slot::Unmatched {
            continue;
        }
        let Some(index) = targets.iter().position(|t| t.column == *column) else {
            return Err(MapError::UnresolvedColumn {
                column: column.clone(),
            });
        };
        *slot = Slot::Custom {
            ord: targets[index].ord,
        };
        claimed[index].get_or_insert(position);
    }

    for (index, target) in targets.iter().enumerate() {
        if claimed[index].is_some() {
            continue;
        }
        let taken = targets[..index]
            .iter()
            .zip(&claimed)
            .find_map(|(earlier, position)| position.filter(|_| earlier.column == target.column));
        return Err(match taken {
            Some(position) => CustomTargetError::DuplicatePosition { position },
            None => CustomTargetError::Unconsumed {
                column: target.column.clone(),
            },
        }
        .into());
    }

    let ords: BTreeSet<usize> = targets.iter().map(|t| t.ord).collect();
    Ok(ords.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_assign_claims_unmatched_column() {
        let cols = columns(&["id", "row_count"]);
        let mut slots = vec![Slot::Field(vec![0]), Slot::Unmatched];
        let receivers = assign(&mut slots, &cols, &[CustomScanTarget::new("row_count", 0)]).unwrap();
        assert_eq!(receivers, 1);
        assert_eq!(slots[1], Slot::Custom { ord: 0 });
    }

    #[test]
    fn test_duplicate_position() {
        let cols = columns(&["id", "row_count"]);
        let mut slots = vec![Slot::Field(vec![0]), Slot::Unmatched];
        let err = assign(
            &mut slots,
            &cols,
            &[
                CustomScanTarget::new("row_count", 0),
                CustomScanTarget::new("row_count", 1),
            ],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            MapError::CustomTarget(CustomTargetError::DuplicatePosition { position: 1 })
        ));
    }

    #[test]
    fn test_unconsumed_target() {
        let cols = columns(&["id"]);
        let mut slots = vec![Slot::Field(vec![0])];
        let err = assign(&mut slots, &cols, &[CustomScanTarget::new("total", 0)]).unwrap_err();
        assert!(matches!(
            err,
            MapError::CustomTarget(CustomTargetError::Unconsumed { ref column }) if column == "total"
        ));
    }

    #[test]
    fn test_target_never_steals_field_column() {
        let cols = columns(&["id"]);
        let mut slots = vec![Slot::Field(vec![0])];
        let err = assign(&mut slots, &cols, &[CustomScanTarget::new("id", 0)]).unwrap_err();
        assert!(matches!(
            err,
            MapError::CustomTarget(CustomTargetError::Unconsumed { .. })
        ));
    }

    #[test]
    fn test_one_target_feeds_repeated_columns() {
        let cols = columns(&["id", "n", "n"]);
        let mut slots = vec![Slot::Field(vec![0]), Slot::Unmatched, Slot::Unmatched];
        let receivers = assign(&mut slots, &cols, &[CustomScanTarget::new("n", 0)]).unwrap();
        assert_eq!(receivers, 1);
        assert_eq!(slots[1], Slot::Custom { ord: 0 });
        assert_eq!(slots[2], Slot::Custom { ord: 0 });
    }

    #[test]
    fn test_leftover_column_is_unresolved() {
        let cols = columns(&["id", "row_count", "extra"]);
        let mut slots = vec![Slot::Field(vec![0]), Slot::Unmatched, Slot::Unmatched];
        let err = assign(&mut slots, &cols, &[CustomScanTarget::new("row_count", 0)]).unwrap_err();
        assert!(matches!(err, MapError::UnresolvedColumn { ref column } if column == "extra"));
    }

    #[test]
    fn test_signature_distinguishes_ordinals() {
        let a = signature(&[CustomScanTarget::new("c", 0)]);
        let b = signature(&[CustomScanTarget::new("c", 1)]);
        assert_ne!(a, b);
        assert_eq!(signature(&[]), "");
    }
}
