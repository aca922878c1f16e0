//! Column-to-field resolution.
//!
//! Flattens a record descriptor into its leaf columns and matches them
//! against the column list a query returned. The outcome is a
//! [`ResolvedMapping`]: one [`Slot`] per result column, in column order.

use super::custom::{self, CustomScanTarget};
use super::descriptor::{leaf_ref, ColumnTag, FieldKind, RecordDescriptor, RecordFields};
use super::NameMatch;
use crate::error::{CustomTargetError, MapError};
use sea_query::Value;

/// Destination of one result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// A record leaf, addressed by field indices from the root record
    Field(Vec<usize>),
    /// A custom scan target receiver
    Custom { ord: usize },
    /// No destination; skipped when scanning
    Unmatched,
}

/// Immutable resolution of one (record type, column list, custom targets) shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMapping {
    slots: Vec<Slot>,
    columns: Vec<String>,
    first_missing: Option<String>,
    receiver_count: usize,
}

impl ResolvedMapping {
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The first result column (in column order) with no destination.
    pub fn first_missing(&self) -> Option<&str> {
        self.first_missing.as_deref()
    }

    /// Number of receivers a scan must supply: one per distinct target ordinal.
    pub fn receiver_count(&self) -> usize {
        self.receiver_count
    }

    /// Validate a receiver list against the declared custom targets.
    pub fn check_receivers(&self, supplied: usize) -> Result<(), CustomTargetError> {
        if supplied != self.receiver_count {
            return Err(CustomTargetError::ReceiverCount {
                expected: self.receiver_count,
                actual: supplied,
            });
        }
        for slot in &self.slots {
            if let Slot::Custom { ord } = slot {
                if *ord >= supplied {
                    return Err(CustomTargetError::InvalidOrdinal {
                        ord: *ord,
                        receivers: supplied,
                    });
                }
            }
        }
        Ok(())
    }

    /// Read the mapped fields of `record` back as values, in column order.
    ///
    /// Columns without a record field yield `None`.
    pub fn field_values(&self, record: &dyn RecordFields) -> Vec<Option<Value>> {
        self.slots
            .iter()
            .map(|slot| match slot {
                Slot::Field(path) => leaf_ref(record, path).map(|leaf| leaf.to_value()),
                _ => None,
            })
            .collect()
    }
}

/// A leaf reachable from the root record, with its full column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LeafColumn {
    pub path: Vec<usize>,
    pub column: String,
}

/// Depth-first list of the leaves a record exposes to column matching.
pub(crate) fn leaf_columns(descriptor: &RecordDescriptor) -> Vec<LeafColumn> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    flatten(descriptor, "", &mut path, &mut out);
    out
}

fn flatten(
    descriptor: &RecordDescriptor,
    prefix: &str,
    path: &mut Vec<usize>,
    out: &mut Vec<LeafColumn>,
) {
    for (index, field) in descriptor.fields().iter().enumerate() {
        match field.kind {
            FieldKind::Leaf => {
                if !field.exported {
                    continue;
                }
                if let Some(column) = field.column_name() {
                    path.push(index);
                    out.push(LeafColumn {
                        path: path.clone(),
                        column: format!("{prefix}{column}"),
                    });
                    path.pop();
                }
            }
            // Embedding is structural: visibility does not stop the walk.
            FieldKind::Embedded(nested) => {
                let nested_prefix = match field.tag {
                    ColumnTag::Excluded => continue,
                    ColumnTag::Default => prefix.to_string(),
                    ColumnTag::Named(tag) => format!("{prefix}{tag}_"),
                };
                path.push(index);
                flatten(nested(), &nested_prefix, path, out);
                path.pop();
            }
            FieldKind::Indirect => {}
        }
    }
}

/// Resolve `columns` against `descriptor`, then route leftover columns to `targets`.
///
/// Strictness is not applied here: the mapping records the first column
/// without a destination and the caller decides whether that is fatal.
pub(crate) fn build(
    descriptor: &RecordDescriptor,
    columns: &[String],
    targets: &[CustomScanTarget],
    name_match: NameMatch,
) -> Result<ResolvedMapping, MapError> {
    let mut leaves: Vec<Option<LeafColumn>> =
        leaf_columns(descriptor).into_iter().map(Some).collect();

    let mut slots = Vec::with_capacity(columns.len());
    for column in columns {
        let claimed = leaves.iter_mut().find(|leaf| {
            leaf.as_ref()
                .is_some_and(|leaf| name_match.matches(&leaf.column, column))
        });
        match claimed.and_then(Option::take) {
            Some(leaf) => slots.push(Slot::Field(leaf.path)),
            None => slots.push(Slot::Unmatched),
        }
    }

    let receiver_count = if targets.is_empty() {
        0
    } else {
        custom::assign(&mut slots, columns, targets)?
    };

    let first_missing = slots
        .iter()
        .position(|slot| *slot == Slot::Unmatched)
        .map(|pos| columns[pos].clone());

    Ok(ResolvedMapping {
        slots,
        columns: columns.to_vec(),
        first_missing,
        receiver_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::descriptor::{FieldDescriptor, FieldMut, FieldRef, Record};

    #[derive(Default)]
    struct Address {
        street: String,
        city: String,
    }

    impl RecordFields for Address {
        fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>> {
            match index {
                0 => Some(FieldMut::Leaf(&mut self.street)),
                1 => Some(FieldMut::Leaf(&mut self.city)),
                _ => None,
            }
        }

        fn field_ref(&self, index: usize) -> Option<FieldRef<'_>> {
            match index {
                0 => Some(FieldRef::Leaf(&self.street)),
                1 => Some(FieldRef::Leaf(&self.city)),
                _ => None,
            }
        }
    }

    impl Record for Address {
        fn describe() -> RecordDescriptor {
            RecordDescriptor::new(
                "Address",
                vec![FieldDescriptor::leaf("street"), FieldDescriptor::leaf("city")],
            )
        }
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_flatten_prefixes_and_skips() {
        let descriptor = RecordDescriptor::new(
            "Person",
            vec![
                FieldDescriptor::leaf("id"),
                FieldDescriptor::leaf("secret").excluded(),
                FieldDescriptor::leaf("hidden").private(),
                FieldDescriptor::embedded::<Address>("home").prefix("addr"),
                FieldDescriptor::embedded::<Address>("work").private(),
                FieldDescriptor::embedded::<Address>("old").excluded(),
                FieldDescriptor::indirect("parent"),
            ],
        );
        let leaves = leaf_columns(&descriptor);
        let names: Vec<_> = leaves.iter().map(|l| l.column.as_str()).collect();
        assert_eq!(
            names,
            vec!["id", "addr_street", "addr_city", "street", "city"]
        );
        assert_eq!(leaves[1].path, vec![3, 0]);
        assert_eq!(leaves[4].path, vec![4, 1]);
    }

    #[test]
    fn test_excluded_field_never_matches() {
        let descriptor = RecordDescriptor::new(
            "Account",
            vec![
                FieldDescriptor::leaf("id"),
                FieldDescriptor::leaf("password").excluded(),
            ],
        );
        let mapping = build(
            &descriptor,
            &columns(&["id", "password"]),
            &[],
            NameMatch::Exact,
        )
        .unwrap();
        assert_eq!(mapping.slots()[1], Slot::Unmatched);
        assert_eq!(mapping.first_missing(), Some("password"));
    }

    #[test]
    fn test_first_field_wins_and_duplicates_spread() {
        let descriptor = RecordDescriptor::new(
            "Pair",
            vec![
                FieldDescriptor::leaf("id"),
                FieldDescriptor::leaf("other_id").column("id"),
            ],
        );
        let mapping = build(
            &descriptor,
            &columns(&["id", "id", "id"]),
            &[],
            NameMatch::Exact,
        )
        .unwrap();
        assert_eq!(
            mapping.slots(),
            &[Slot::Field(vec![0]), Slot::Field(vec![1]), Slot::Unmatched]
        );
    }

    #[test]
    fn test_normalized_matching() {
        let descriptor = RecordDescriptor::new("T", vec![FieldDescriptor::leaf("created_at")]);
        let exact = build(&descriptor, &columns(&["CreatedAt"]), &[], NameMatch::Exact).unwrap();
        assert_eq!(exact.first_missing(), Some("CreatedAt"));

        let normalized =
            build(&descriptor, &columns(&["CreatedAt"]), &[], NameMatch::Normalized).unwrap();
        assert_eq!(normalized.slots(), &[Slot::Field(vec![0])]);
        assert_eq!(normalized.first_missing(), None);
    }

    #[test]
    fn test_unfetched_fields_are_fine() {
        let mapping = build(
            Address::descriptor(),
            &columns(&["city"]),
            &[],
            NameMatch::Exact,
        )
        .unwrap();
        assert_eq!(mapping.slots(), &[Slot::Field(vec![1])]);
        assert_eq!(mapping.receiver_count(), 0);
        assert!(mapping.check_receivers(0).is_ok());
    }
}
